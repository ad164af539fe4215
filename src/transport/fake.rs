//! In-memory switch for tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{DeviceQuery, QueryError};

/// FakeDevice answers queries from tables and records every command
#[derive(Default)]
pub struct FakeDevice {
    structured: HashMap<String, Result<Value, QueryError>>,
    text: HashMap<String, Result<String, QueryError>>,
    issued: Mutex<Vec<String>>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, command: &str, body: Value) -> Self {
        self.structured.insert(command.to_string(), Ok(body));
        self
    }

    pub fn with_error(mut self, command: &str, err: QueryError) -> Self {
        self.structured.insert(command.to_string(), Err(err));
        self
    }

    pub fn with_text(mut self, command: &str, output: &str) -> Self {
        self.text.insert(command.to_string(), Ok(output.to_string()));
        self
    }

    pub fn with_text_error(mut self, command: &str, err: QueryError) -> Self {
        self.text.insert(command.to_string(), Err(err));
        self
    }

    /// Commands issued so far, in order
    pub fn issued(&self) -> Vec<String> {
        self.issued.lock().map(|i| i.clone()).unwrap_or_default()
    }

    fn record(&self, command: &str) {
        if let Ok(mut issued) = self.issued.lock() {
            issued.push(command.to_string());
        }
    }

    fn unknown(command: &str) -> QueryError {
        QueryError::Command {
            command: command.to_string(),
            code: "400".to_string(),
            message: "Input CLI command error".to_string(),
        }
    }
}

#[async_trait]
impl DeviceQuery for FakeDevice {
    async fn text_query(&self, command: &str) -> Result<String, QueryError> {
        self.record(command);
        self.text
            .get(command)
            .cloned()
            .unwrap_or_else(|| Err(Self::unknown(command)))
    }

    async fn structured_query(&self, command: &str) -> Result<Value, QueryError> {
        self.record(command);
        self.structured
            .get(command)
            .cloned()
            .unwrap_or_else(|| Err(Self::unknown(command)))
    }

    async fn configure(&self, commands: &[String]) -> Result<String, QueryError> {
        self.record(&commands.join(" ; "));
        Ok(String::new())
    }
}
