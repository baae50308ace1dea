use crate::extract::Provenance;
use crate::extract::SuggestedCommand;

/// Suggested commands for the current chat turn.
///
/// Duplicates are kept; every extraction pass replaces the whole list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionRegistry {
    items: Vec<SuggestedCommand>,
}

impl SuggestionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, commands: Vec<SuggestedCommand>) {
        self.items = commands;
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn add(&mut self, command: impl Into<String>, explanation: impl Into<String>) {
        self.items.push(SuggestedCommand::new(
            command,
            explanation,
            Provenance::Manual,
        ));
    }

    pub fn get(&self, index: usize) -> Option<&SuggestedCommand> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&SuggestedCommand> {
        self.items.first()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SuggestedCommand> {
        self.items.iter()
    }
}

/// Button label shown under an assistant message that carries commands.
pub fn run_in_terminal_label(count: usize) -> Option<String> {
    match count {
        0 => None,
        1 => Some("Run Command in Terminal".to_string()),
        n => Some(format!("Run {n} Commands in Terminal")),
    }
}
