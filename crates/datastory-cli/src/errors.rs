use console::style;
use datastory_core::error::DatastoryError;
use std::fmt;

/// Enhanced error type with suggestions
#[derive(Clone)]
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create error for a command that needs an access token
pub fn missing_token() -> CliError {
    CliError::new("No access token")
        .with_context("This command talks to the analysis platform and needs an access token.")
        .with_suggestion("Pass it on the command line: datastory --token <TOKEN> ...")
        .with_suggestion("Or export DATASTORY_ACCESS_TOKEN=<TOKEN>")
        .with_suggestion("Or add access_token = \"<TOKEN>\" to datastory.toml")
        .with_help("Run: datastory config")
}

/// Create error for an unknown analysis type key
pub fn unknown_analysis(key: &str) -> CliError {
    CliError::new("Unknown analysis type")
        .with_context(format!("No analysis is registered under this key.\n\nKey: {}", key))
        .with_suggestion("List the available analyses: datastory analyses")
        .with_help("Run: datastory transcribe --help")
}

/// Create error for a resource missing from its dataset
pub fn resource_not_found(dataset: &str, resource: &str) -> CliError {
    CliError::new("Resource not found")
        .with_context(format!(
            "The dataset has no resource with this id.\n\nDataset: {}\nResource: {}",
            dataset, resource
        ))
        .with_suggestion(format!("List the dataset's resources: datastory datasets show {}", dataset))
        .with_help("Run: datastory datasets --help")
}

/// Create error for an unknown problem statement id
pub fn problem_not_found(id: &str) -> CliError {
    CliError::new("Problem statement not found")
        .with_context(format!("No problem statement has this id.\n\nId: {}", id))
        .with_suggestion("List problem statements: datastory problems list")
        .with_suggestion("Or create one: datastory problems create --help")
        .with_help("Run: datastory problems --help")
}

/// Create error for a rejected remote request
pub fn remote_request_failed(status: u16, body: &str) -> CliError {
    let error = CliError::new(format!("Remote request failed with status {}", status))
        .with_context(format!("Response body:\n{}", body));

    match status {
        401 | 403 => error
            .with_suggestion("Check that the access token is valid and not expired")
            .with_help("Run: datastory config"),
        404 => error.with_suggestion("Check the ids passed on the command line"),
        _ => error.with_suggestion("Retry later; the platform may be temporarily unavailable"),
    }
}

/// Create error for an unreachable service
pub fn service_unreachable(url: &str, reason: &str) -> CliError {
    CliError::new("Cannot reach service")
        .with_context(format!("The request could not be sent.\n\nURL: {}\nError: {}", url, reason))
        .with_suggestion("Check the service URL: datastory config")
        .with_suggestion("Override it with --api-url or --catalog-url")
        .with_help("Run: datastory --help")
}

/// Create error for polling that ran out of attempts
pub fn polling_timeout(max_attempts: u32) -> CliError {
    CliError::new(format!("Polling timeout: Maximum attempts ({}) reached", max_attempts))
        .with_context("No execution reached a terminal status in time. The analysis may still be running.")
        .with_suggestion("Check again later: datastory executions --problem <ID> --task <ID> --subtask <ID> --watch")
        .with_suggestion("Or raise poll_max_attempts in datastory.toml")
}

/// Create error for invalid configuration
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
        .with_suggestion("Check datastory.toml and DATASTORY_* environment variables")
        .with_help("Run: datastory config")
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    if let Some(cli_error) = error.downcast_ref::<CliError>() {
        return cli_error.clone();
    }

    let domain = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<DatastoryError>());

    match domain {
        Some(DatastoryError::MissingCredential) => missing_token(),
        Some(DatastoryError::UnknownAnalysisType { key }) => unknown_analysis(key),
        Some(DatastoryError::RemoteRequest { status, body }) => {
            remote_request_failed(*status, body)
        }
        Some(DatastoryError::Transport { url, reason }) => service_unreachable(url, reason),
        Some(DatastoryError::PollingTimeout { max_attempts }) => polling_timeout(*max_attempts),
        Some(DatastoryError::ConfigInvalid { key, reason }) => invalid_config(key, reason),
        Some(DatastoryError::ConfigMissing { key }) => invalid_config(key, "value is empty"),
        _ => CliError::new(format!("{:#}", error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_domain_errors_are_found_behind_context() {
        let error = Err::<(), _>(DatastoryError::RemoteRequest {
            status: 401,
            body: "expired".to_string(),
        })
        .context("Failed to list problem statements")
        .unwrap_err();

        let cli_error = from_anyhow(error);
        assert_eq!(cli_error.message, "Remote request failed with status 401");
        assert!(cli_error.context.unwrap().contains("expired"));
        assert_eq!(cli_error.help_command.as_deref(), Some("Run: datastory config"));
    }

    #[test]
    fn test_cli_errors_pass_through() {
        let error = anyhow::Error::new(problem_not_found("ps9"));
        let cli_error = from_anyhow(error);
        assert_eq!(cli_error.message, "Problem statement not found");
        assert_eq!(cli_error.suggestions.len(), 2);
    }

    #[test]
    fn test_unclassified_errors_keep_the_chain() {
        let error = anyhow::anyhow!("disk full").context("Failed to write output");
        assert_eq!(from_anyhow(error).message, "Failed to write output: disk full");
    }

    #[test]
    fn test_timeout_message_matches_poller() {
        let error = anyhow::Error::new(DatastoryError::PollingTimeout { max_attempts: 3 });
        assert_eq!(
            from_anyhow(error).message,
            "Polling timeout: Maximum attempts (3) reached"
        );
    }
}
