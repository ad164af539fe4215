use async_trait::async_trait;
use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::{cli::ShellExec, CommandOutput, QueryError};
use crate::config::SwitchTarget;

/// Keyboard-interactive prompt handler that always responds with the password
struct PasswordPrompt {
    password: String,
}

impl ssh2::KeyboardInteractivePrompt for PasswordPrompt {
    fn prompt<'a>(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt<'a>],
    ) -> Vec<String> {
        prompts.iter().map(|_| self.password.clone()).collect()
    }
}

/// Create an SSH session and authenticate with password + keyboard-interactive.
/// This is blocking, so call from a spawn_blocking context.
pub fn ssh_connect(host: &str, port: u16, user: &str, pass: &str, timeout_secs: u64) -> Result<ssh2::Session, QueryError> {
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|e| QueryError::Transport(format!("Invalid address {}:{}: {}", host, port, e)))?
        .next()
        .ok_or_else(|| QueryError::Transport(format!("No address found for {}", host)))?;

    let tcp = TcpStream::connect_timeout(&addr, Duration::from_secs(timeout_secs))
        .map_err(|e| QueryError::Transport(format!("TCP connection failed: {}", e)))?;

    tcp.set_read_timeout(Some(Duration::from_secs(timeout_secs))).ok();
    tcp.set_write_timeout(Some(Duration::from_secs(timeout_secs))).ok();

    let mut session = ssh2::Session::new()
        .map_err(|e| QueryError::Transport(format!("Failed to create SSH session: {}", e)))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(timeout_millis(timeout_secs));
    session
        .handshake()
        .map_err(|e| QueryError::Transport(format!("SSH handshake failed: {}", e)))?;

    match session.userauth_password(user, pass) {
        Ok(_) if session.authenticated() => return Ok(session),
        _ => {}
    }

    // NX-OS AAA setups often only offer keyboard-interactive
    let mut prompter = PasswordPrompt { password: pass.to_string() };
    let _ = session.userauth_keyboard_interactive(user, &mut prompter);

    if session.authenticated() {
        Ok(session)
    } else {
        Err(QueryError::Transport("SSH authentication failed: all methods exhausted".to_string()))
    }
}

/// Connect via SSH and run a single command, returning its exit status and output.
/// This is blocking, so call from a spawn_blocking context.
pub fn ssh_run_command(
    host: &str,
    port: u16,
    user: &str,
    pass: &str,
    timeout_secs: u64,
    command: &str,
) -> Result<CommandOutput, QueryError> {
    let session = ssh_connect(host, port, user, pass, timeout_secs)?;

    let mut channel = session
        .channel_session()
        .map_err(|e| QueryError::Transport(format!("Failed to open channel: {}", e)))?;

    channel
        .exec(command)
        .map_err(|e| QueryError::Transport(format!("Failed to execute command: {}", e)))?;

    let mut output = String::new();
    channel
        .read_to_string(&mut output)
        .map_err(|e| QueryError::Transport(format!("Failed to read output: {}", e)))?;

    channel
        .wait_close()
        .map_err(|e| QueryError::Transport(format!("Failed to close channel: {}", e)))?;

    let status = channel.exit_status().unwrap_or(-1);
    Ok(CommandOutput { status, output })
}

/// SshExec runs each command on a fresh SSH exec channel
#[derive(Debug, Clone)]
pub struct SshExec {
    host: String,
    port: u16,
    username: String,
    password: String,
    timeout_secs: u64,
}

impl SshExec {
    pub fn new(target: &SwitchTarget, port: u16, timeout_secs: u64) -> Self {
        Self {
            host: target.host.clone(),
            port,
            username: target.username.clone(),
            password: target.password.clone(),
            timeout_secs,
        }
    }
}

#[async_trait]
impl ShellExec for SshExec {
    async fn exec(&self, command: &str) -> Result<CommandOutput, QueryError> {
        let this = self.clone();
        let command = command.to_string();

        tracing::debug!("ssh {}: {}", this.host, command);
        tokio::task::spawn_blocking(move || {
            ssh_run_command(
                &this.host,
                this.port,
                &this.username,
                &this.password,
                this.timeout_secs,
                &command,
            )
        })
        .await
        .map_err(|e| QueryError::Transport(format!("Task join error: {}", e)))?
    }
}

/// libssh2 timeout in milliseconds, saturating at `u32::MAX`
fn timeout_millis(timeout_secs: u64) -> u32 {
    u32::try_from(timeout_secs.saturating_mul(1000)).unwrap_or(u32::MAX)
}
