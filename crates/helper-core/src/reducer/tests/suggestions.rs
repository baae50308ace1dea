use super::*;
use pretty_assertions::assert_eq;

#[test]
fn command_reply_populates_registry_and_flags_terminal_tab() {
    let mut state = state();
    let reply = send(&mut state, "which docker command?", at(1)).expect("reply");
    deliver(&mut state, reply, at(2));

    assert_eq!(
        suggestion_commands(&state),
        vec!["docker ps", "kubectl get pods", "top", "df -h"]
    );
    assert!(state.interaction.terminal_attention);

    run_user(&mut state, UserAction::SelectPanel(Panel::Terminal), at(3));
    assert!(!state.interaction.terminal_attention);
}

#[test]
fn keyword_message_flags_terminal_before_reply() {
    let mut state = state();
    send(&mut state, "open a Terminal please", at(1));
    assert!(state.interaction.terminal_attention);
}

#[test]
fn no_attention_while_terminal_is_visible() {
    let mut state = state();
    run_user(&mut state, UserAction::SelectPanel(Panel::Terminal), at(0));
    let reply = send(&mut state, "bash command for disk usage", at(1)).expect("reply");
    deliver(&mut state, reply, at(2));
    assert!(!state.interaction.terminal_attention);
    assert_eq!(state.suggestions.len(), 4);
}

#[test]
fn reply_without_commands_clears_previous_suggestions() {
    let mut state = state();
    let reply = send(&mut state, "a shell command", at(1)).expect("reply");
    deliver(&mut state, reply, at(2));
    assert!(!state.suggestions.is_empty());

    let ticket = state.replies.issue(state.sessions.current_id().expect("session"));
    deliver(&mut state, (ticket, "Nothing to run here.".to_string()), at(3));
    assert!(state.suggestions.is_empty());
}

#[test]
fn run_in_terminal_switches_panel_and_runs_first_suggestion() {
    let mut state = state();
    let reply = send(&mut state, "a shell command", at(1)).expect("reply");
    deliver(&mut state, reply, at(2));

    run_user(&mut state, UserAction::RunInTerminal, at(3));

    assert_eq!(state.interaction.panel, Panel::Terminal);
    assert!(!state.interaction.terminal_attention);
    let last = state.terminal.lines().last().expect("line");
    assert!(last.text.contains("docker ps"));
    assert!(state
        .terminal
        .lines()
        .iter()
        .any(|line| matches!(line.kind, LineKind::Command { .. }) && line.text == "docker ps"));
}

#[test]
fn run_suggestion_out_of_range_is_a_no_op() {
    let mut state = state();
    let before = line_texts(&state);
    assert!(run_user(&mut state, UserAction::RunSuggestion(3), at(1)).is_empty());
    assert_eq!(line_texts(&state), before);
}

#[test]
fn copy_actions_target_input_and_clipboard() {
    let mut state = state();
    let reply = send(&mut state, "a shell command", at(1)).expect("reply");
    deliver(&mut state, reply, at(2));

    let effects = run_user(&mut state, UserAction::CopySuggestionToClipboard(1), at(3));
    assert_eq!(
        effects,
        vec![HelperEffect::CopyToClipboard("kubectl get pods".to_string())]
    );

    run_user(&mut state, UserAction::CopySuggestionToInput(3), at(3));
    assert_eq!(state.interaction.panel, Panel::Terminal);
    assert_eq!(state.interaction.terminal_input, "df -h");
}

#[test]
fn suggestion_selection_wraps() {
    let mut state = state();
    let reply = send(&mut state, "a shell command", at(1)).expect("reply");
    deliver(&mut state, reply, at(2));

    run_user(&mut state, UserAction::PrevSuggestion, at(3));
    assert_eq!(state.interaction.selected_suggestion, 3);
    run_user(&mut state, UserAction::NextSuggestion, at(3));
    assert_eq!(state.interaction.selected_suggestion, 0);
}

#[test]
fn clearing_the_terminal_empties_the_registry() {
    let mut state = state();
    let reply = send(&mut state, "a shell command", at(1)).expect("reply");
    deliver(&mut state, reply, at(2));

    run_user(&mut state, UserAction::SubmitTerminal("clear".to_string()), at(3));
    assert!(state.suggestions.is_empty());
    assert_eq!(line_texts(&state), vec![crate::terminal::CLEARED_TEXT]);
}
