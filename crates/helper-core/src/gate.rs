//! Decides whether a terminal command is simulated locally, denied, or
//! handed to the host for real execution.

use std::sync::OnceLock;

/// Substrings that forbid real execution, matched case-insensitively.
pub const RESTRICTED_PATTERNS: &[&str] = &[
    "rm -rf",
    "format",
    "mkfs",
    "dd",
    "shutdown",
    "reboot",
    "halt",
    "poweroff",
    ":(){",
    "chmod 777 /",
    "> /dev/sda",
];

pub const RESTRICTED_MESSAGE: &str = "This command is restricted for security reasons.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Builtin {
    ChangeDirectory(String),
    List,
    PrintDirectory,
    Clear,
    Echo(String),
    Help,
}

impl Builtin {
    pub fn parse(command: &str) -> Option<Self> {
        if let Some(dir) = command.strip_prefix("cd ") {
            return Some(Self::ChangeDirectory(dir.to_string()));
        }
        if let Some(text) = command.strip_prefix("echo ") {
            return Some(Self::Echo(text.to_string()));
        }
        match command {
            "ls" | "dir" => Some(Self::List),
            "pwd" => Some(Self::PrintDirectory),
            "clear" | "cls" => Some(Self::Clear),
            "help" => Some(Self::Help),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Simulation {
    Builtin(Builtin),
    /// Looks like a real command, but real execution is switched off.
    Disabled,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Simulate(Simulation),
    Deny(String),
    PassThrough,
}

impl GateDecision {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Simulate(_) => "simulate",
            Self::Deny(_) => "deny",
            Self::PassThrough => "pass-through",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionGate {
    denylist: Vec<String>,
}

impl Default for ExecutionGate {
    fn default() -> Self {
        Self::with_denylist(RESTRICTED_PATTERNS.iter().copied())
    }
}

impl ExecutionGate {
    pub fn with_denylist<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            denylist: patterns
                .into_iter()
                .map(|pattern| pattern.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn restricted_pattern(&self, command: &str) -> Option<&str> {
        let lowered = command.to_lowercase();
        self.denylist
            .iter()
            .find(|pattern| lowered.contains(pattern.as_str()))
            .map(String::as_str)
    }

    pub fn decide(&self, command: &str, allow_real_execution: bool) -> GateDecision {
        if !allow_real_execution {
            return GateDecision::Simulate(simulate_offline(command));
        }

        if let Some(pattern) = self.restricted_pattern(command) {
            tracing::warn!(command, pattern, "command blocked by denylist");
            return GateDecision::Deny(RESTRICTED_MESSAGE.to_string());
        }

        match Builtin::parse(command) {
            Some(builtin) => GateDecision::Simulate(Simulation::Builtin(builtin)),
            None => GateDecision::PassThrough,
        }
    }
}

fn simulate_offline(command: &str) -> Simulation {
    if let Some(builtin) = Builtin::parse(command) {
        return Simulation::Builtin(builtin);
    }
    // A space after the first character suggests a real multi-token command.
    if command.find(' ').is_some_and(|idx| idx > 0) {
        Simulation::Disabled
    } else {
        Simulation::NotFound
    }
}

/// [`ExecutionGate::decide`] against the default denylist.
pub fn decide(command: &str, allow_real_execution: bool) -> GateDecision {
    static DEFAULT: OnceLock<ExecutionGate> = OnceLock::new();
    DEFAULT
        .get_or_init(ExecutionGate::default)
        .decide(command, allow_real_execution)
}
