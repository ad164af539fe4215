//! Device query transports.
//!
//! Every transport is exposed through [`DeviceQuery`], which hides whether
//! structured output comes from NX-API, from `| json` over SSH, or from the
//! `| xml` rendering converted into the same shape. The variant is picked once
//! by [`connect`].

pub mod cli;
pub mod nxapi;
pub mod ssh;
#[cfg(feature = "xml")]
pub mod xml;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::{Config, SwitchTarget, TransportKind};

pub use cli::CliAdapter;
pub use nxapi::NxapiClient;
pub use ssh::SshExec;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// No structured output is available by any means
    #[error("Script is unsupported on this platform: {0}")]
    UnsupportedPlatform(String),
    #[error("Command {command} does not support structured output: {output}")]
    UnstructuredOutput { command: String, output: String },
    #[error("Command {command} failed ({code}): {message}")]
    Command {
        command: String,
        code: String,
        message: String,
    },
    #[error("{0}")]
    Transport(String),
    #[error("Could not parse output of {command}: {message}")]
    Parse { command: String, message: String },
}

/// Raw result of a command run over a shell channel: exit status plus text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: i32,
    pub output: String,
}

/// Uniform, read-mostly access to a single switch
#[async_trait]
pub trait DeviceQuery: Send + Sync {
    /// Run a show command and return its plain text
    async fn text_query(&self, command: &str) -> Result<String, QueryError>;

    /// Run a show command and return its structured rendering
    async fn structured_query(&self, command: &str) -> Result<Value, QueryError>;

    /// Apply configuration lines
    async fn configure(&self, commands: &[String]) -> Result<String, QueryError>;
}

/// Connect to `target` and select the transport variant once.
///
/// Any failure here means the transport is unusable and is reported as
/// [`QueryError::UnsupportedPlatform`].
pub async fn connect(target: &SwitchTarget, config: &Config) -> Result<Box<dyn DeviceQuery>, QueryError> {
    let device: Box<dyn DeviceQuery> = match config.transport {
        TransportKind::Nxapi => {
            let client = NxapiClient::new(target, config).map_err(unsupported)?;
            client.probe().await.map_err(unsupported)?;
            Box::new(client)
        }
        TransportKind::Ssh => {
            let exec = SshExec::new(target, config.ssh_port, config.timeout_secs);
            let adapter = CliAdapter::detect(exec).await.map_err(unsupported)?;
            tracing::debug!("Structured output via {:?}", adapter.mode());
            Box::new(adapter)
        }
    };
    tracing::debug!("Connected to {} via {:?}", target.host, config.transport);
    Ok(device)
}

fn unsupported(err: QueryError) -> QueryError {
    match err {
        QueryError::UnsupportedPlatform(_) => err,
        other => QueryError::UnsupportedPlatform(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_wraps_other_errors_once() {
        let err = unsupported(QueryError::Transport("TCP connection failed: refused".to_string()));
        assert_eq!(
            err,
            QueryError::UnsupportedPlatform("TCP connection failed: refused".to_string())
        );

        let err = unsupported(QueryError::UnsupportedPlatform("requires xml".to_string()));
        assert_eq!(err.to_string(), "Script is unsupported on this platform: requires xml");
    }
}
