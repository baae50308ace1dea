//! Shell command extraction from free-form assistant text.
//!
//! Extraction runs a fixed sequence of [`ExtractionRule`]s over the whole
//! text and concatenates their results. Rules never see each other's output,
//! so a `$ cmd` line inside a fenced block is reported once per rule.

use std::fmt::Debug;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

pub const CODE_BLOCK_EXPLANATION: &str = "Extracted from code block";
pub const DOLLAR_LINE_EXPLANATION: &str = "Suggested command";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    CodeBlock,
    DollarLine,
    /// Added directly to the registry rather than extracted.
    Manual,
}

impl Provenance {
    pub fn label(self) -> &'static str {
        match self {
            Self::CodeBlock => "code-block",
            Self::DollarLine => "dollar-line",
            Self::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedCommand {
    pub command: String,
    pub explanation: String,
    pub provenance: Provenance,
}

impl SuggestedCommand {
    pub fn new(
        command: impl Into<String>,
        explanation: impl Into<String>,
        provenance: Provenance,
    ) -> Self {
        Self {
            command: command.into(),
            explanation: explanation.into(),
            provenance,
        }
    }
}

pub trait ExtractionRule: Debug + Send + Sync {
    fn provenance(&self) -> Provenance;

    fn extract_into(&self, text: &str, out: &mut Vec<SuggestedCommand>);
}

/// Fenced blocks that are untagged or tagged with a shell dialect.
#[derive(Debug)]
pub struct FencedBlockRule {
    pattern: Regex,
}

impl Default for FencedBlockRule {
    fn default() -> Self {
        Self {
            pattern: Regex::new(r"(?s)```(?:bash|shell|sh|cmd|powershell)?\s*\n(.*?)\n```")
                .expect("fenced block pattern"),
        }
    }
}

impl ExtractionRule for FencedBlockRule {
    fn provenance(&self) -> Provenance {
        Provenance::CodeBlock
    }

    fn extract_into(&self, text: &str, out: &mut Vec<SuggestedCommand>) {
        for captures in self.pattern.captures_iter(text) {
            let Some(body) = captures.get(1) else {
                continue;
            };
            for line in body.as_str().lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let command = match line.strip_prefix('$') {
                    Some(rest) => rest.trim(),
                    None => line,
                };
                if command.is_empty() {
                    continue;
                }
                out.push(SuggestedCommand::new(
                    command,
                    CODE_BLOCK_EXPLANATION,
                    self.provenance(),
                ));
            }
        }
    }
}

/// Any line of the text that starts with a `$` prompt marker.
#[derive(Debug)]
pub struct DollarLineRule {
    pattern: Regex,
}

impl Default for DollarLineRule {
    fn default() -> Self {
        Self {
            pattern: Regex::new(r"(?m)^\$\s*(.+)$").expect("dollar line pattern"),
        }
    }
}

impl ExtractionRule for DollarLineRule {
    fn provenance(&self) -> Provenance {
        Provenance::DollarLine
    }

    fn extract_into(&self, text: &str, out: &mut Vec<SuggestedCommand>) {
        for captures in self.pattern.captures_iter(text) {
            let Some(command) = captures.get(1) else {
                continue;
            };
            out.push(SuggestedCommand::new(
                command.as_str().trim(),
                DOLLAR_LINE_EXPLANATION,
                self.provenance(),
            ));
        }
    }
}

#[derive(Debug)]
pub struct CommandExtractor {
    rules: Vec<Box<dyn ExtractionRule>>,
}

impl Default for CommandExtractor {
    fn default() -> Self {
        Self::empty()
            .with_rule(FencedBlockRule::default())
            .with_rule(DollarLineRule::default())
    }
}

impl CommandExtractor {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Appends a rule; its matches follow those of every earlier rule.
    pub fn with_rule(mut self, rule: impl ExtractionRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn extract(&self, text: &str) -> Vec<SuggestedCommand> {
        let mut out = Vec::new();
        for rule in &self.rules {
            rule.extract_into(text, &mut out);
        }
        tracing::trace!(count = out.len(), "extracted suggested commands");
        out
    }
}

/// Runs the default fenced-block and dollar-line rules.
pub fn extract(text: &str) -> Vec<SuggestedCommand> {
    static DEFAULT: OnceLock<CommandExtractor> = OnceLock::new();
    DEFAULT.get_or_init(CommandExtractor::default).extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn commands(found: &[SuggestedCommand]) -> Vec<(&str, Provenance)> {
        found
            .iter()
            .map(|item| (item.command.as_str(), item.provenance))
            .collect()
    }

    #[test]
    fn fenced_bash_block_skips_comments_and_blank_lines() {
        let text = "Try these:\n\n```bash\n# List all running Docker containers\ndocker ps\n\n# Check disk space\ndf -h\n```\n\nDone.";
        assert_eq!(
            commands(&extract(text)),
            vec![
                ("docker ps", Provenance::CodeBlock),
                ("df -h", Provenance::CodeBlock),
            ]
        );
    }

    #[test]
    fn dollar_line_inside_fence_is_reported_by_both_rules() {
        let text = "```\n$ kubectl get pods\n```";
        let found = extract(text);
        assert_eq!(
            commands(&found),
            vec![
                ("kubectl get pods", Provenance::CodeBlock),
                ("kubectl get pods", Provenance::DollarLine),
            ]
        );
        assert_eq!(found[0].explanation, CODE_BLOCK_EXPLANATION);
        assert_eq!(found[1].explanation, DOLLAR_LINE_EXPLANATION);
    }

    #[test]
    fn code_block_results_precede_dollar_lines() {
        let text = "$ git status\n\n```sh\nls -la\n```";
        assert_eq!(
            commands(&extract(text)),
            vec![
                ("ls -la", Provenance::CodeBlock),
                ("git status", Provenance::DollarLine),
            ]
        );
    }

    #[test]
    fn dollar_marker_is_stripped_once_with_whitespace() {
        let text = "```shell\n  $   echo hi  \n$\n```";
        assert_eq!(
            commands(&extract(text))
                .into_iter()
                .filter(|(_, provenance)| *provenance == Provenance::CodeBlock)
                .collect::<Vec<_>>(),
            vec![("echo hi", Provenance::CodeBlock)]
        );
    }

    #[test]
    fn non_shell_language_block_is_ignored() {
        let text = "```json\n{\n  \"dns\": [\"8.8.8.8\"]\n}\n```";
        assert!(extract(text).is_empty());
    }

    #[test]
    fn shebang_line_is_treated_as_comment() {
        let text = "```bash\n#!/bin/bash\necho \"Done!\"\n```";
        assert_eq!(
            commands(&extract(text)),
            vec![("echo \"Done!\"", Provenance::CodeBlock)]
        );
    }

    #[test]
    fn extraction_is_repeatable_for_same_input() {
        let text = "```bash\ndocker ps\n```\n$ top\nplain text";
        assert_eq!(extract(text), extract(text));
    }

    #[test]
    fn odd_inputs_do_not_panic() {
        for text in ["", "$", "```", "``````", "$ \n$", "```bash\n", "\n\n```\n\n```\n"] {
            let _ = extract(text);
        }
    }

    #[derive(Debug)]
    struct SudoRule;

    impl ExtractionRule for SudoRule {
        fn provenance(&self) -> Provenance {
            Provenance::Manual
        }

        fn extract_into(&self, text: &str, out: &mut Vec<SuggestedCommand>) {
            for line in text.lines().filter(|line| line.starts_with("sudo ")) {
                out.push(SuggestedCommand::new(line, "sudo", self.provenance()));
            }
        }
    }

    #[test]
    fn custom_rules_append_after_defaults() {
        let extractor = CommandExtractor::default().with_rule(SudoRule);
        assert_eq!(extractor.rule_count(), 3);
        let found = extractor.extract("sudo systemctl status docker\n$ docker --version");
        assert_eq!(
            commands(&found),
            vec![
                ("docker --version", Provenance::DollarLine),
                ("sudo systemctl status docker", Provenance::Manual),
            ]
        );
    }
}
