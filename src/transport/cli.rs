use async_trait::async_trait;
use serde_json::Value;

use super::{CommandOutput, DeviceQuery, QueryError};

/// Anything that can run one CLI command and hand back status + text
#[async_trait]
pub trait ShellExec: Send + Sync {
    async fn exec(&self, command: &str) -> Result<CommandOutput, QueryError>;
}

/// How structured output is obtained over the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredMode {
    /// `<command> | json`
    Json,
    /// `<command> | xml`, readonly payload converted to JSON shape
    #[cfg(feature = "xml")]
    Xml,
}

#[cfg(feature = "xml")]
const NO_STRUCTURED_OUTPUT: &str = "switch returns neither JSON nor XML structured output";
#[cfg(not(feature = "xml"))]
const NO_STRUCTURED_OUTPUT: &str = "switch has no JSON output and XML support is not built in";

/// CliAdapter turns a raw CLI channel into a [`DeviceQuery`]
pub struct CliAdapter<E> {
    exec: E,
    mode: StructuredMode,
}

impl<E: ShellExec> CliAdapter<E> {
    pub fn with_mode(exec: E, mode: StructuredMode) -> Self {
        Self { exec, mode }
    }

    pub fn mode(&self) -> StructuredMode {
        self.mode
    }

    /// Probe the switch with `show version` and pick the structured mode.
    pub async fn detect(exec: E) -> Result<Self, QueryError> {
        let probe = exec.exec("show version | json").await?;
        if serde_json::from_str::<Value>(probe.output.trim()).is_ok() {
            tracing::debug!("Switch supports native JSON output");
            return Ok(Self::with_mode(exec, StructuredMode::Json));
        }

        #[cfg(feature = "xml")]
        {
            let probe = exec.exec("show version | xml").await?;
            if super::xml::extract_readonly(&probe.output).is_some() {
                tracing::debug!("Switch has no JSON output, falling back to XML");
                return Ok(Self::with_mode(exec, StructuredMode::Xml));
            }
        }

        Err(QueryError::UnsupportedPlatform(NO_STRUCTURED_OUTPUT.to_string()))
    }

    async fn run(&self, command: &str) -> Result<String, QueryError> {
        let CommandOutput { status, output } = self.exec.exec(command).await?;
        if status != 0 {
            tracing::debug!("'{}' exited with status {}", command, status);
        }
        Ok(output)
    }
}

#[async_trait]
impl<E: ShellExec> DeviceQuery for CliAdapter<E> {
    async fn text_query(&self, command: &str) -> Result<String, QueryError> {
        self.run(command).await
    }

    async fn structured_query(&self, command: &str) -> Result<Value, QueryError> {
        match self.mode {
            StructuredMode::Json => {
                let output = self.run(&format!("{} | json", command)).await?;
                // Empty tables render as no output at all
                if output.trim().is_empty() {
                    return Ok(Value::Null);
                }
                serde_json::from_str(output.trim()).map_err(|_| QueryError::UnstructuredOutput {
                    command: command.to_string(),
                    output: output.trim().to_string(),
                })
            }
            #[cfg(feature = "xml")]
            StructuredMode::Xml => {
                let output = self.run(&format!("{} | xml", command)).await?;
                let payload = super::xml::extract_readonly(&output).ok_or_else(|| QueryError::UnstructuredOutput {
                    command: command.to_string(),
                    output: output.trim().to_string(),
                })?;
                let mut doc = super::xml::to_value(payload).map_err(|message| QueryError::Parse {
                    command: command.to_string(),
                    message,
                })?;
                Ok(doc
                    .get_mut(super::xml::READONLY_TAG)
                    .map(Value::take)
                    .unwrap_or(Value::Null))
            }
        }
    }

    async fn configure(&self, commands: &[String]) -> Result<String, QueryError> {
        let mut line = String::from("configure terminal");
        for command in commands {
            line.push_str(" ; ");
            line.push_str(command);
        }
        self.run(&line).await
    }
}
