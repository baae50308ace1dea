use std::collections::BTreeSet;
use std::collections::VecDeque;

use serde::Deserialize;
use serde::Serialize;

use crate::gate::Builtin;
use crate::gate::ExecutionGate;
use crate::gate::GateDecision;
use crate::gate::Simulation;

pub const HISTORY_CAPACITY: usize = 50;
pub const DEFAULT_DIRECTORY: &str = "/home/user";
pub const BASH_PROMPT: &str = "user@devops:~$";
pub const WELCOME_TEXT: &str = "Welcome to the DevOps Helper terminal. Type 'help' for available commands.";
pub const CLEARED_TEXT: &str = "Terminal cleared. Ready for commands.";
pub const EXECUTING_TEXT: &str = "Executing command, please wait...";
pub const LISTING_TEXT: &str = "file1.txt  file2.txt  folder1/  folder2/";
pub const HELP_TEXT: &str = "Available commands:
cd <directory> - Change directory
ls, dir - List files and directories
pwd - Print working directory
clear, cls - Clear the terminal
echo <text> - Print text
help - Show this help message";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalType {
    #[default]
    Bash,
    PowerShell,
    Cmd,
}

impl TerminalType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Bash => "bash",
            Self::PowerShell => "powershell",
            Self::Cmd => "cmd",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Bash => Self::PowerShell,
            Self::PowerShell => Self::Cmd,
            Self::Cmd => Self::Bash,
        }
    }

    pub fn prompt(self, current_directory: &str) -> String {
        match self {
            Self::Bash => BASH_PROMPT.to_string(),
            Self::PowerShell => format!("PS {current_directory}>"),
            Self::Cmd => format!("C:\\>{current_directory}>"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOrigin {
    Typed,
    Suggestion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Command {
        prompt: String,
        origin: CommandOrigin,
    },
    Output,
    Info,
    Success,
    Welcome,
    Error,
    Pending {
        request_id: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalLine {
    pub kind: LineKind,
    pub text: String,
}

impl TerminalLine {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Bounded command history with up/down recall.
///
/// The cursor counts back from the most recent entry; `None` means the
/// user is not navigating and the input is empty.
#[derive(Debug, Clone)]
pub struct CommandHistory {
    cap: usize,
    entries: VecDeque<String>,
    cursor: Option<usize>,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl CommandHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            entries: VecDeque::with_capacity(cap),
            cursor: None,
        }
    }

    pub fn push(&mut self, command: impl Into<String>) {
        self.entries.push_back(command.into());
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
        self.cursor = None;
    }

    pub fn recall_previous(&mut self) -> String {
        let next = self.cursor.map_or(0, |idx| idx + 1);
        if next < self.entries.len() {
            self.cursor = Some(next);
        }
        self.current_input()
    }

    pub fn recall_next(&mut self) -> String {
        self.cursor = match self.cursor {
            Some(0) | None => None,
            Some(idx) => Some(idx - 1),
        };
        self.current_input()
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = None;
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current_input(&self) -> String {
        self.cursor
            .and_then(|idx| {
                let pos = self.entries.len().checked_sub(idx + 1)?;
                self.entries.get(pos).cloned()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ignored,
    Rendered,
    Cleared,
    PassThrough { request_id: u64, command: String },
}

#[derive(Debug, Clone)]
pub struct TerminalSession {
    pub terminal_type: TerminalType,
    gate: ExecutionGate,
    current_directory: String,
    history: CommandHistory,
    lines: Vec<TerminalLine>,
    pending: BTreeSet<u64>,
    next_request_id: u64,
}

impl Default for TerminalSession {
    fn default() -> Self {
        Self::new(ExecutionGate::default())
    }
}

impl TerminalSession {
    pub fn new(gate: ExecutionGate) -> Self {
        Self {
            terminal_type: TerminalType::default(),
            gate,
            current_directory: DEFAULT_DIRECTORY.to_string(),
            history: CommandHistory::default(),
            lines: vec![TerminalLine::new(LineKind::Welcome, WELCOME_TEXT)],
            pending: BTreeSet::new(),
            next_request_id: 1,
        }
    }

    pub fn prompt(&self) -> String {
        self.terminal_type.prompt(&self.current_directory)
    }

    pub fn current_directory(&self) -> &str {
        &self.current_directory
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn lines(&self) -> &[TerminalLine] {
        &self.lines
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, request_id: u64) -> bool {
        self.pending.contains(&request_id)
    }

    pub fn recall_previous(&mut self) -> String {
        self.history.recall_previous()
    }

    pub fn recall_next(&mut self) -> String {
        self.history.recall_next()
    }

    pub fn submit(
        &mut self,
        command: &str,
        origin: CommandOrigin,
        allow_real_execution: bool,
    ) -> SubmitOutcome {
        let command = command.trim();
        if command.is_empty() {
            return SubmitOutcome::Ignored;
        }

        self.history.push(command);
        let prompt = self.prompt();
        self.lines
            .push(TerminalLine::new(LineKind::Command { prompt, origin }, command));

        match self.gate.decide(command, allow_real_execution) {
            GateDecision::Deny(reason) => {
                self.lines.push(TerminalLine::new(LineKind::Error, reason));
                SubmitOutcome::Rendered
            }
            GateDecision::PassThrough => {
                let request_id = self.next_request_id;
                self.next_request_id += 1;
                self.pending.insert(request_id);
                self.lines.push(TerminalLine::new(
                    LineKind::Pending { request_id },
                    EXECUTING_TEXT,
                ));
                tracing::info!(request_id, command, "passing command to host");
                SubmitOutcome::PassThrough {
                    request_id,
                    command: command.to_string(),
                }
            }
            GateDecision::Simulate(Simulation::Builtin(Builtin::Clear)) => {
                self.clear();
                SubmitOutcome::Cleared
            }
            GateDecision::Simulate(simulation) => {
                self.render_simulation(command, simulation);
                SubmitOutcome::Rendered
            }
        }
    }

    fn render_simulation(&mut self, command: &str, simulation: Simulation) {
        let line = match simulation {
            Simulation::Builtin(Builtin::ChangeDirectory(dir)) => {
                let text = format!("Changed directory to {dir}");
                self.current_directory = dir;
                TerminalLine::new(LineKind::Success, text)
            }
            Simulation::Builtin(Builtin::List) => TerminalLine::new(LineKind::Output, LISTING_TEXT),
            Simulation::Builtin(Builtin::PrintDirectory) => {
                TerminalLine::new(LineKind::Output, self.current_directory.clone())
            }
            Simulation::Builtin(Builtin::Echo(text)) => TerminalLine::new(LineKind::Output, text),
            Simulation::Builtin(Builtin::Help) => TerminalLine::new(LineKind::Welcome, HELP_TEXT),
            Simulation::Builtin(Builtin::Clear) => {
                self.clear();
                return;
            }
            Simulation::Disabled => TerminalLine::new(
                LineKind::Info,
                format!(
                    "Command simulation: {command}\nReal command execution is disabled. Enable it in settings to run real commands."
                ),
            ),
            Simulation::NotFound => {
                TerminalLine::new(LineKind::Error, format!("Command not found: {command}"))
            }
        };
        self.lines.push(line);
    }

    /// Resets displayed output. History and in-flight requests survive.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.lines
            .push(TerminalLine::new(LineKind::Welcome, CLEARED_TEXT));
    }

    /// Replaces the request's placeholder with its result.
    ///
    /// Returns `false` for unknown or already completed requests.
    pub fn complete(&mut self, request_id: u64, result: Result<String, String>) -> bool {
        if !self.pending.remove(&request_id) {
            tracing::warn!(request_id, "completion for unknown terminal request");
            return false;
        }

        let replacement: Vec<TerminalLine> = match result {
            Ok(stdout) => stdout
                .split('\n')
                .map(|line| TerminalLine::new(LineKind::Output, line.trim_end()))
                .collect(),
            Err(message) => {
                tracing::debug!(request_id, %message, "terminal request failed");
                vec![TerminalLine::new(LineKind::Error, message)]
            }
        };

        let placeholder = self
            .lines
            .iter()
            .position(|line| line.kind == LineKind::Pending { request_id });
        match placeholder {
            Some(idx) => {
                self.lines.splice(idx..=idx, replacement);
            }
            // Cleared while in flight.
            None => self.lines.extend(replacement),
        }
        true
    }
}
