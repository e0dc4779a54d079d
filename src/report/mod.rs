pub mod notice;

use colored::Colorize;

/// Sink for the single failure message of an invocation.
pub trait FailureReporter: Send + Sync {
    fn report_failure(&self, message: &str);
}

/// Marks the CI step as failed.
///
/// Inside GitHub Actions this emits an `::error::` workflow command on stdout;
/// anywhere else it prints a red `error:` line on stderr.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowReporter {
    in_actions: bool,
}

impl WorkflowReporter {
    pub fn new(in_actions: bool) -> Self {
        Self { in_actions }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("GITHUB_ACTIONS").as_deref() == Ok("true"))
    }
}

impl FailureReporter for WorkflowReporter {
    fn report_failure(&self, message: &str) {
        if self.in_actions {
            println!("{}", workflow_error_command(message));
        } else {
            eprintln!("{} {}", "error:".red().bold(), message);
        }
    }
}

/// Format `message` as a workflow `error` command, escaping the characters
/// the runner would otherwise treat as command syntax.
pub fn workflow_error_command(message: &str) -> String {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::error::{escaped}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_error_command_plain() {
        assert_eq!(workflow_error_command("boom"), "::error::boom");
    }

    #[test]
    fn test_workflow_error_command_escapes() {
        assert_eq!(
            workflow_error_command("50% done\r\nnext line"),
            "::error::50%25 done%0D%0Anext line"
        );
    }
}
