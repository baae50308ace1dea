use std::collections::HashMap;
use std::io::Read;
use std::process::Command;
use std::process::Stdio;
use std::thread;

use thiserror::Error;

pub const EMPTY_OUTPUT_TEXT: &str = "Command executed successfully.";
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("failed to start shell: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Command failed: {command} ({status})")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("stdout exceeded {limit} bytes")]
    OutputTooLarge { limit: usize },

    #[error("reading command output failed: {0}")]
    Read(#[source] std::io::Error),
}

/// Runs one command line through the host shell and returns its stdout.
pub trait ShellRunner: Send + Sync {
    fn run(&self, command: &str) -> Result<String, ShellError>;
}

/// Converts a runner result into the text the terminal displays.
///
/// Failures prefer whatever the command wrote to stderr.
pub fn completion_text(result: Result<String, ShellError>) -> Result<String, String> {
    match result {
        Ok(stdout) if stdout.is_empty() => Ok(EMPTY_OUTPUT_TEXT.to_string()),
        Ok(stdout) => Ok(stdout),
        Err(ShellError::Failed { stderr, .. }) if !stderr.trim().is_empty() => Err(stderr),
        Err(err) => Err(err.to_string()),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProcessShellRunner {
    max_output_bytes: usize,
}

impl Default for ProcessShellRunner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OUTPUT_BYTES)
    }
}

impl ProcessShellRunner {
    pub fn new(max_output_bytes: usize) -> Self {
        Self { max_output_bytes }
    }

    pub fn max_output_bytes(&self) -> usize {
        self.max_output_bytes
    }

    fn command(command: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

impl ShellRunner for ProcessShellRunner {
    fn run(&self, command: &str) -> Result<String, ShellError> {
        let spawn = Self::command(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match spawn {
            Ok(child) => child,
            Err(err) => return Err(ShellError::Spawn(err)),
        };

        let limit = self.max_output_bytes;
        let stderr_handle = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut bytes = Vec::new();
                let _ = stderr.by_ref().take(limit as u64).read_to_end(&mut bytes);
                // Keep draining so the child never blocks on a full pipe.
                let _ = std::io::copy(&mut stderr, &mut std::io::sink());
                String::from_utf8_lossy(&bytes).into_owned()
            })
        });

        let mut stdout_bytes = Vec::new();
        let mut overflow = false;
        let mut read_error = None;
        if let Some(mut stdout) = child.stdout.take() {
            let mut buf = [0_u8; 4096];
            loop {
                match stdout.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if stdout_bytes.len() + n > limit {
                            overflow = true;
                            break;
                        }
                        stdout_bytes.extend_from_slice(&buf[..n]);
                    }
                    Err(err) => {
                        read_error = Some(err);
                        break;
                    }
                }
            }
        }

        if overflow {
            let _ = child.kill();
        }
        let status = child.wait();
        let stderr_text = stderr_handle
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        if overflow {
            tracing::warn!(command, limit, "command output exceeded limit");
            return Err(ShellError::OutputTooLarge { limit });
        }
        if let Some(err) = read_error {
            return Err(ShellError::Read(err));
        }
        match status {
            Ok(status) if status.success() => {
                Ok(strip_ansi_sequences(&String::from_utf8_lossy(&stdout_bytes)))
            }
            Ok(status) => Err(ShellError::Failed {
                command: command.to_string(),
                status: status.to_string(),
                stderr: stderr_text,
            }),
            Err(err) => Err(ShellError::Read(err)),
        }
    }
}

/// Canned outputs keyed by exact command line. Unknown commands fail.
#[derive(Debug, Default, Clone)]
pub struct ScriptedShellRunner {
    outputs: HashMap<String, Result<String, String>>,
}

impl ScriptedShellRunner {
    pub fn with_output(mut self, command: &str, stdout: &str) -> Self {
        self.outputs
            .insert(command.to_string(), Ok(stdout.to_string()));
        self
    }

    pub fn with_failure(mut self, command: &str, stderr: &str) -> Self {
        self.outputs
            .insert(command.to_string(), Err(stderr.to_string()));
        self
    }
}

impl ShellRunner for ScriptedShellRunner {
    fn run(&self, command: &str) -> Result<String, ShellError> {
        match self.outputs.get(command) {
            Some(Ok(stdout)) => Ok(stdout.clone()),
            Some(Err(stderr)) => Err(ShellError::Failed {
                command: command.to_string(),
                status: "exit status: 1".to_string(),
                stderr: stderr.clone(),
            }),
            None => Err(ShellError::Failed {
                command: command.to_string(),
                status: "exit status: 127".to_string(),
                stderr: String::new(),
            }),
        }
    }
}

fn strip_ansi_sequences(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            if chars.peek() == Some(&'[') {
                chars.next();
                // CSI final bytes are `@` through `~`.
                for next in chars.by_ref() {
                    if ('@'..='~').contains(&next) {
                        break;
                    }
                }
            }
            continue;
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn failed(stderr: &str) -> ShellError {
        ShellError::Failed {
            command: "x".to_string(),
            status: "exit status: 2".to_string(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn empty_stdout_reports_success_text() {
        assert_eq!(
            completion_text(Ok(String::new())),
            Ok(EMPTY_OUTPUT_TEXT.to_string())
        );
    }

    #[test]
    fn failure_prefers_stderr_over_error_message() {
        assert_eq!(
            completion_text(Err(failed("no such file\n"))),
            Err("no such file\n".to_string())
        );
        assert_eq!(
            completion_text(Err(failed("  "))),
            Err("Command failed: x (exit status: 2)".to_string())
        );
    }

    #[test]
    fn ansi_sequences_are_removed() {
        assert_eq!(strip_ansi_sequences("\u{1b}[31mred\u{1b}[0m ok"), "red ok");
    }

    #[test]
    fn ansi_sequences_with_symbol_terminators_keep_following_text() {
        assert_eq!(strip_ansi_sequences("\u{1b}[3~hello"), "hello");
        assert_eq!(strip_ansi_sequences("\u{1b}[2@x\u{1b}[1;5Ay"), "xy");
    }

    #[test]
    fn scripted_runner_fails_unknown_commands() {
        let runner = ScriptedShellRunner::default()
            .with_output("whoami", "ops\n")
            .with_failure("cat nope", "cat: nope: No such file or directory");
        assert_eq!(runner.run("whoami").unwrap(), "ops\n");
        assert_eq!(
            completion_text(runner.run("cat nope")),
            Err("cat: nope: No such file or directory".to_string())
        );
        assert!(matches!(
            runner.run("missing"),
            Err(ShellError::Failed { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn process_runner_captures_stdout() {
        let runner = ProcessShellRunner::default();
        assert_eq!(runner.run("printf 'a\\nb'").unwrap(), "a\nb");
    }

    #[cfg(unix)]
    #[test]
    fn process_runner_surfaces_stderr_on_failure() {
        let result = ProcessShellRunner::default().run("echo boom >&2; exit 3");
        assert_eq!(completion_text(result), Err("boom\n".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn process_runner_rejects_oversized_output() {
        let runner = ProcessShellRunner::new(16);
        assert!(matches!(
            runner.run("yes | head -c 4096"),
            Err(ShellError::OutputTooLarge { limit: 16 })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn process_runner_runs_in_a_real_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let command = format!("cd '{}' && pwd", dir.path().display());
        let out = ProcessShellRunner::default().run(&command).unwrap();
        let name = dir
            .path()
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        assert!(out.trim_end().ends_with(&name));
    }
}
