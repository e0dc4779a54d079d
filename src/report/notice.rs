/// Heading of the advisory comment. Also the idempotency marker: a PR with
/// any comment containing this string is never commented on again.
pub const MARKER: &str = "### Nova AsyncAction criada!";

/// Index naming convention referenced at the end of the advisory.
pub const DEFAULT_DOCS_URL: &str = "https://github.com/asaasdev/livro-de-elite/blob/3b5048d787332b170fe0403c70a6d1b65055b3c0/processes/asaas.md?plain=1#L818";

/// Render the advisory posted when a PR adds a new AsyncAction definition.
///
/// With `DEFAULT_DOCS_URL` the output is byte-identical to the comment earlier
/// versions of the hook posted, so existing comments keep matching `MARKER`.
pub fn render(docs_url: &str) -> String {
    format!(
        r#"
> [!WARNING]
> {MARKER}
>
> Um novo arquivo terminando com `AsyncAction.groovy` foi adicionado neste Pull Request.
>
> As AsyncAction não nascem com índices automaticamente, então é recomendado a criação via DBA dos índices para melhorar o desempenho nas consultas e evitar locks muito longos nas filas.
>
> Exemplo:
> ```sql
> ALTER TABLE queues.sua_nova_fila_async_actoin ADD INDEX status_action_data_hash_idx (status, action_data_hash) ALGORITHM = INPLACE, LOCK = NONE;
> ```
>
> Obs: Não esqueça da convenção de nomenclatura para criação de índices documentada no [livro de elite]({docs_url}).
"#
    )
}

/// Line of the checklist comment that names the class and file.
/// Used to recognize a checklist that was already posted.
pub fn mapping_checklist_key(class_name: &str, file_path: &str) -> String {
    format!(
        "A classe `{class_name}` no arquivo `{file_path}` foi modificada para usar `applyBaseMappingWithIndex` em vez de `applyBaseMapping`."
    )
}

/// Render the pre-deploy checklist for a BaseAsyncAction that switched to
/// `applyBaseMappingWithIndex`.
pub fn render_mapping_checklist(class_name: &str, file_path: &str) -> String {
    let key = mapping_checklist_key(class_name, file_path);
    format!(
        r#"
Troca de `applyBaseMapping` para `applyBaseMappingWithIndex`:

{key}

**Antes de realizar o deploy, por favor, garanta que realizou:**

- [ ] Script pré deploy adicionando via DBA os índices necessários para a `{class_name}`.

[!IMPORTANT]
Ao migrar de `applyBaseMapping` para `applyBaseMappingWithIndex`, é necessário garantir que os índices necessários estejam criados no banco de dados para evitar problemas de locks durante o deploy.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED_ADVISORY: &str = "\n> [!WARNING]\n> ### Nova AsyncAction criada!\n>\n> Um novo arquivo terminando com `AsyncAction.groovy` foi adicionado neste Pull Request.\n>\n> As AsyncAction não nascem com índices automaticamente, então é recomendado a criação via DBA dos índices para melhorar o desempenho nas consultas e evitar locks muito longos nas filas.\n>\n> Exemplo:\n> ```sql\n> ALTER TABLE queues.sua_nova_fila_async_actoin ADD INDEX status_action_data_hash_idx (status, action_data_hash) ALGORITHM = INPLACE, LOCK = NONE;\n> ```\n>\n> Obs: Não esqueça da convenção de nomenclatura para criação de índices documentada no [livro de elite](https://github.com/asaasdev/livro-de-elite/blob/3b5048d787332b170fe0403c70a6d1b65055b3c0/processes/asaas.md?plain=1#L818).\n";

    #[test]
    fn test_default_advisory_is_byte_identical() {
        assert_eq!(render(DEFAULT_DOCS_URL), EXPECTED_ADVISORY);
    }

    #[test]
    fn test_render_contains_marker_heading() {
        let body = render("https://docs.example.com/async");
        assert!(body.lines().any(|line| line == format!("> {MARKER}")));
        assert!(body.contains("[livro de elite](https://docs.example.com/async)"));
    }

    #[test]
    fn test_marker_is_stable() {
        assert_eq!(MARKER, "### Nova AsyncAction criada!");
    }

    #[test]
    fn test_mapping_checklist() {
        let body = render_mapping_checklist("PixRefundAsyncAction", "pix/PixRefundAsyncAction.groovy");
        assert!(body.starts_with("\nTroca de `applyBaseMapping` para `applyBaseMappingWithIndex`:\n\n"));
        assert!(body.contains(&mapping_checklist_key(
            "PixRefundAsyncAction",
            "pix/PixRefundAsyncAction.groovy"
        )));
        assert!(body.contains(
            "- [ ] Script pré deploy adicionando via DBA os índices necessários para a `PixRefundAsyncAction`."
        ));
        assert!(body.ends_with("durante o deploy.\n"));
    }
}
