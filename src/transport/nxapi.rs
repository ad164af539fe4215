use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{DeviceQuery, QueryError};
use crate::config::{Config, SwitchTarget};

/// NX-API message types
pub mod message_type {
    pub const CLI_SHOW: &str = "cli_show";
    pub const CLI_SHOW_ASCII: &str = "cli_show_ascii";
    pub const CLI_CONF: &str = "cli_conf";
}

const CODE_SUCCESS: &str = "200";
const CODE_STRUCTURED_UNSUPPORTED: &str = "501";

#[derive(Debug, Serialize)]
struct InsRequest<'a> {
    ins_api: InsRequestBody<'a>,
}

#[derive(Debug, Serialize)]
struct InsRequestBody<'a> {
    version: &'a str,
    #[serde(rename = "type")]
    message_type: &'a str,
    chunk: &'a str,
    sid: &'a str,
    input: &'a str,
    output_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct InsResponse {
    ins_api: InsResponseBody,
}

#[derive(Debug, Deserialize)]
struct InsResponseBody {
    outputs: InsOutputs,
}

#[derive(Debug, Deserialize)]
struct InsOutputs {
    output: OneOrMany<InsOutput>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InsOutput {
    #[serde(default)]
    input: Option<String>,
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    body: Value,
    #[serde(default)]
    clierror: Option<String>,
}

/// NX-API client (the `/ins` endpoint)
pub struct NxapiClient {
    url: String,
    username: String,
    password: String,
    client: Client,
}

impl NxapiClient {
    pub fn new(target: &SwitchTarget, config: &Config) -> Result<Self, QueryError> {
        let port = config.nxapi_port.map(|p| format!(":{}", p)).unwrap_or_default();
        let base_url = format!("{}://{}{}", config.nxapi_scheme, target.host, port);
        Self::with_base_url(
            &base_url,
            &target.username,
            &target.password,
            config.timeout_secs,
            config.nxapi_insecure,
        )
    }

    pub fn with_base_url(
        base_url: &str,
        username: &str,
        password: &str,
        timeout_secs: u64,
        insecure: bool,
    ) -> Result<Self, QueryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|e| QueryError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: format!("{}/ins", base_url.trim_end_matches('/')),
            username: username.to_string(),
            password: password.to_string(),
            client,
        })
    }

    /// Check that NX-API answers and renders structured output
    pub async fn probe(&self) -> Result<(), QueryError> {
        self.structured_query("show version").await.map(|_| ())
    }

    async fn send(&self, message_type: &str, input: &str) -> Result<Vec<InsOutput>, QueryError> {
        let request = InsRequest {
            ins_api: InsRequestBody {
                version: "1.0",
                message_type,
                chunk: "0",
                sid: "1",
                input,
                output_format: "json",
            },
        };

        tracing::debug!("nxapi {} ({}): {}", self.url, message_type, input);
        let resp = self
            .client
            .post(&self.url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| QueryError::Transport(format!("NX-API request failed: {}", e)))?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();

        // Command errors come back inside the envelope, sometimes with a 500
        match serde_json::from_str::<InsResponse>(&text) {
            Ok(parsed) => Ok(parsed.ins_api.outputs.output.into_vec()),
            Err(_) if !status.is_success() => Err(QueryError::Transport(format!("NX-API error {}: {}", status, text))),
            Err(e) => Err(QueryError::Parse {
                command: input.to_string(),
                message: format!("unexpected NX-API response: {}", e),
            }),
        }
    }
}

fn check(command: &str, output: InsOutput) -> Result<Value, QueryError> {
    if output.code == CODE_SUCCESS {
        return Ok(output.body);
    }

    let command = output.input.unwrap_or_else(|| command.to_string());
    if output.code == CODE_STRUCTURED_UNSUPPORTED || output.msg.contains("Structured output unsupported") {
        return Err(QueryError::UnstructuredOutput {
            command,
            output: output.msg,
        });
    }

    let message = match output.clierror {
        Some(detail) if !detail.trim().is_empty() => format!("{} ({})", output.msg, detail.trim()),
        _ => output.msg,
    };
    Err(QueryError::Command {
        command,
        code: output.code,
        message,
    })
}

fn single(command: &str, outputs: Vec<InsOutput>) -> Result<Value, QueryError> {
    let mut last = Value::Null;
    for output in outputs {
        last = check(command, output)?;
    }
    Ok(last)
}

#[async_trait]
impl DeviceQuery for NxapiClient {
    async fn text_query(&self, command: &str) -> Result<String, QueryError> {
        let outputs = self.send(message_type::CLI_SHOW_ASCII, command).await?;
        match single(command, outputs)? {
            Value::String(text) => Ok(text),
            Value::Null => Ok(String::new()),
            other => Ok(other.to_string()),
        }
    }

    async fn structured_query(&self, command: &str) -> Result<Value, QueryError> {
        let outputs = self.send(message_type::CLI_SHOW, command).await?;
        match single(command, outputs)? {
            // Some releases hand back the JSON document as a string
            Value::String(text) if text.trim().is_empty() => Ok(Value::Null),
            Value::String(text) => serde_json::from_str(&text).map_err(|_| QueryError::UnstructuredOutput {
                command: command.to_string(),
                output: text,
            }),
            body => Ok(body),
        }
    }

    async fn configure(&self, commands: &[String]) -> Result<String, QueryError> {
        let input = commands.join(" ; ");
        let outputs = self.send(message_type::CLI_CONF, &input).await?;
        let mut messages = Vec::new();
        for output in outputs {
            let msg = output.msg.clone();
            check(&input, output)?;
            messages.push(msg);
        }
        Ok(messages.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn envelope(output: Value) -> Value {
        json!({"ins_api": {
            "type": "cli_show",
            "version": "1.0",
            "sid": "eoc",
            "outputs": {"output": output}
        }})
    }

    #[tokio::test]
    async fn test_structured_query_unwraps_envelope() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/ins")
                    .header("Authorization", "Basic YWRtaW46c2VjcmV0")
                    .json_body_partial(r#"{"ins_api": {"type": "cli_show", "input": "show version"}}"#);
                then.status(200).json_body(envelope(json!({
                    "input": "show version",
                    "msg": "Success",
                    "code": "200",
                    "body": {"host_name": "n9k-1", "kickstart_ver_str": "9.3(10)"}
                })));
            })
            .await;

        let client = NxapiClient::with_base_url(&server.base_url(), "admin", "secret", 5, false).unwrap();
        let body = client.structured_query("show version").await.unwrap();

        mock.assert_async().await;
        assert_eq!(body["host_name"], json!("n9k-1"));
    }

    #[tokio::test]
    async fn test_text_query_returns_ascii_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/ins")
                    .json_body_partial(r#"{"ins_api": {"type": "cli_show_ascii"}}"#);
                then.status(200).json_body(envelope(json!({
                    "msg": "Success",
                    "code": "200",
                    "body": "Capability Codes: R - Router\n"
                })));
            })
            .await;

        let client = NxapiClient::with_base_url(&server.base_url(), "admin", "secret", 5, false).unwrap();
        let text = client.text_query("show cdp neighbors").await.unwrap();
        assert_eq!(text, "Capability Codes: R - Router\n");
    }

    #[tokio::test]
    async fn test_structured_unsupported_maps_to_unstructured_output() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/ins");
                then.status(200).json_body(envelope(json!({
                    "input": "show mac address-table address aabb.ccdd.eeff",
                    "msg": "Structured output unsupported",
                    "code": "501"
                })));
            })
            .await;

        let client = NxapiClient::with_base_url(&server.base_url(), "admin", "secret", 5, false).unwrap();
        let err = client
            .structured_query("show mac address-table address aabb.ccdd.eeff")
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::UnstructuredOutput { .. }));
    }

    #[tokio::test]
    async fn test_command_error_inside_http_500() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/ins");
                then.status(500).json_body(envelope(json!({
                    "input": "show ip arpp",
                    "msg": "Input CLI command error",
                    "code": "400",
                    "clierror": "% Invalid command at '^' marker.\n"
                })));
            })
            .await;

        let client = NxapiClient::with_base_url(&server.base_url(), "admin", "secret", 5, false).unwrap();
        let err = client.structured_query("show ip arpp").await.unwrap_err();
        assert_eq!(
            err,
            QueryError::Command {
                command: "show ip arpp".to_string(),
                code: "400".to_string(),
                message: "Input CLI command error (% Invalid command at '^' marker.)".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_http_failure_without_envelope_is_transport_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/ins");
                then.status(401).body("Unauthorized");
            })
            .await;

        let client = NxapiClient::with_base_url(&server.base_url(), "admin", "wrong", 5, false).unwrap();
        let err = client.probe().await.unwrap_err();
        assert!(matches!(err, QueryError::Transport(_)));
    }

    #[tokio::test]
    async fn test_configure_checks_every_output() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/ins").json_body_partial(
                    r#"{"ins_api": {"type": "cli_conf", "input": "interface Eth1/1 ; description leaf-1 Ethernet1/49"}}"#,
                );
                then.status(200).json_body(envelope(json!([
                    {"code": "200", "msg": "Success", "body": {}},
                    {"code": "200", "msg": "Success", "body": {}}
                ])));
            })
            .await;

        let client = NxapiClient::with_base_url(&server.base_url(), "admin", "secret", 5, false).unwrap();
        let lines = vec!["interface Eth1/1".to_string(), "description leaf-1 Ethernet1/49".to_string()];
        let out = client.configure(&lines).await.unwrap();

        mock.assert_async().await;
        assert_eq!(out, "Success\nSuccess");
    }
}
