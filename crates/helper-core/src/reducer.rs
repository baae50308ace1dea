use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;

use super::actions::HelperAction;
use super::actions::RuntimeAction;
use super::actions::UserAction;
use super::config::StaleReplyPolicy;
use super::extract::extract;
use super::extract::SuggestedCommand;
use super::responder;
use super::session::Message;
use super::session::Session;
use super::session::SessionId;
use super::session::SessionStore;
use super::settings::Settings;
use super::state::HelperState;
use super::state::Overlay;
use super::state::Panel;
use super::state::ReplyTicket;
use super::state::SettingsItem;
use super::state::SETTINGS_ITEMS;
use super::terminal::CommandOrigin;
use super::terminal::SubmitOutcome;

#[derive(Debug, Clone, PartialEq)]
pub enum HelperEffect {
    RequestFrame,
    PersistSessions,
    PersistSettings,
    ScheduleReply {
        ticket: ReplyTicket,
        content: String,
        delay: Duration,
    },
    RunShell {
        request_id: u64,
        command: String,
    },
    CopyToClipboard(String),
}

pub fn reduce(state: &mut HelperState, action: HelperAction) -> Vec<HelperEffect> {
    reduce_at(state, action, Utc::now())
}

/// [`reduce`] with an explicit clock, for deterministic session dates.
pub fn reduce_at(
    state: &mut HelperState,
    action: HelperAction,
    now: DateTime<Utc>,
) -> Vec<HelperEffect> {
    match action {
        HelperAction::User(user) => reduce_user(state, user, now),
        HelperAction::Runtime(runtime) => reduce_runtime(state, runtime, now),
    }
}

fn reduce_user(state: &mut HelperState, action: UserAction, now: DateTime<Utc>) -> Vec<HelperEffect> {
    match action {
        UserAction::SelectPanel(panel) => {
            select_panel(state, panel);
            vec![HelperEffect::RequestFrame]
        }
        UserAction::NextPanel => {
            select_panel(state, state.interaction.panel.next());
            vec![HelperEffect::RequestFrame]
        }
        UserAction::InputChar(ch) => {
            active_input(state).push(ch);
            vec![HelperEffect::RequestFrame]
        }
        UserAction::InputBackspace => {
            active_input(state).pop();
            vec![HelperEffect::RequestFrame]
        }
        UserAction::InputPaste(text) => {
            active_input(state).push_str(&text);
            vec![HelperEffect::RequestFrame]
        }
        UserAction::InputSubmit => {
            if state.interaction.overlay.is_open() {
                return reduce_user(state, UserAction::OverlaySubmit, now);
            }
            match state.interaction.panel {
                Panel::Chat => {
                    let message = std::mem::take(&mut state.interaction.chat_input);
                    send_chat(state, &message, now)
                }
                Panel::Terminal => {
                    let command = std::mem::take(&mut state.interaction.terminal_input);
                    run_terminal(state, &command, CommandOrigin::Typed)
                }
            }
        }
        UserAction::ScrollChat(delta) => {
            let scroll = i32::from(state.interaction.chat_scroll) + i32::from(delta);
            state.interaction.chat_scroll = scroll.clamp(0, i32::from(u16::MAX)) as u16;
            vec![HelperEffect::RequestFrame]
        }
        UserAction::SendChat(message) => send_chat(state, &message, now),
        UserAction::StartNewSession => {
            state.sessions.start_new(now);
            state.suggestions.clear();
            state.interaction.selected_suggestion = 0;
            state.interaction.chat_scroll = 0;
            close_overlay(state);
            vec![HelperEffect::PersistSessions, HelperEffect::RequestFrame]
        }
        UserAction::SelectSession(id) => select_session(state, id),
        UserAction::RenameSession(title) => {
            if !state.sessions.rename_current(&title) {
                tracing::warn!("rename requested without a current session");
                return Vec::new();
            }
            vec![HelperEffect::PersistSessions, HelperEffect::RequestFrame]
        }
        UserAction::SubmitTerminal(command) => run_terminal(state, &command, CommandOrigin::Typed),
        UserAction::RecallPrevious => {
            state.interaction.terminal_input = state.terminal.recall_previous();
            vec![HelperEffect::RequestFrame]
        }
        UserAction::RecallNext => {
            state.interaction.terminal_input = state.terminal.recall_next();
            vec![HelperEffect::RequestFrame]
        }
        UserAction::ClearTerminal => {
            state.terminal.clear();
            state.suggestions.clear();
            state.interaction.selected_suggestion = 0;
            vec![HelperEffect::RequestFrame]
        }
        UserAction::CycleTerminalType => {
            state.terminal.terminal_type = state.terminal.terminal_type.next();
            vec![HelperEffect::RequestFrame]
        }
        UserAction::NextSuggestion => {
            let len = state.suggestions.len();
            if len > 0 {
                state.interaction.selected_suggestion =
                    (state.interaction.selected_suggestion + 1) % len;
            }
            vec![HelperEffect::RequestFrame]
        }
        UserAction::PrevSuggestion => {
            let len = state.suggestions.len();
            if len > 0 {
                let selected = state.interaction.selected_suggestion.min(len - 1);
                state.interaction.selected_suggestion =
                    if selected == 0 { len - 1 } else { selected - 1 };
            }
            vec![HelperEffect::RequestFrame]
        }
        UserAction::RunSuggestion(index) => {
            let Some(command) = suggestion_command(state, index) else {
                return Vec::new();
            };
            run_terminal(state, &command, CommandOrigin::Suggestion)
        }
        UserAction::RunInTerminal => {
            select_panel(state, Panel::Terminal);
            let Some(command) = state.suggestions.first().map(|item| item.command.clone()) else {
                return vec![HelperEffect::RequestFrame];
            };
            run_terminal(state, &command, CommandOrigin::Suggestion)
        }
        UserAction::CopySuggestionToInput(index) => {
            let Some(command) = suggestion_command(state, index) else {
                return Vec::new();
            };
            select_panel(state, Panel::Terminal);
            state.interaction.terminal_input = command;
            vec![HelperEffect::RequestFrame]
        }
        UserAction::CopySuggestionToClipboard(index) => {
            let Some(command) = suggestion_command(state, index) else {
                return Vec::new();
            };
            vec![HelperEffect::CopyToClipboard(command)]
        }
        UserAction::ToggleCommandExecution => update_settings(state, |settings| {
            settings.allow_command_execution = !settings.allow_command_execution;
        }),
        UserAction::ToggleTheme => update_settings(state, |settings| {
            settings.theme = settings.theme.toggle();
        }),
        UserAction::CycleModel => update_settings(state, Settings::cycle_model),
        UserAction::AdjustTemperature(delta) => update_settings(state, |settings| {
            let value = settings.temperature + delta;
            settings.set_temperature(value);
        }),
        UserAction::SetApiKey { provider, key } => update_settings(state, |settings| {
            settings.api_keys.set(provider, &key);
        }),
        UserAction::OpenSessions => {
            let selected = state
                .sessions
                .sorted_for_display()
                .iter()
                .position(|session| Some(session.id) == state.sessions.current_id())
                .unwrap_or(0);
            state.interaction.overlay = Overlay::Sessions { selected };
            vec![HelperEffect::RequestFrame]
        }
        UserAction::OpenSettings => {
            state.interaction.overlay = Overlay::Settings { selected: 0 };
            vec![HelperEffect::RequestFrame]
        }
        UserAction::OpenRename => {
            let draft = state
                .sessions
                .current()
                .map(|session| session.title.clone())
                .unwrap_or_default();
            state.interaction.overlay = Overlay::RenameSession { draft };
            vec![HelperEffect::RequestFrame]
        }
        UserAction::OpenHelp => {
            state.interaction.overlay = Overlay::Help;
            vec![HelperEffect::RequestFrame]
        }
        UserAction::CloseOverlay => {
            close_overlay(state);
            vec![HelperEffect::RequestFrame]
        }
        UserAction::OverlayMoveUp => {
            let len = overlay_len(state);
            match &mut state.interaction.overlay {
                Overlay::Sessions { selected } | Overlay::Settings { selected } if len > 0 => {
                    *selected = if *selected == 0 { len - 1 } else { *selected - 1 };
                    vec![HelperEffect::RequestFrame]
                }
                _ => Vec::new(),
            }
        }
        UserAction::OverlayMoveDown => {
            let len = overlay_len(state);
            match &mut state.interaction.overlay {
                Overlay::Sessions { selected } | Overlay::Settings { selected } if len > 0 => {
                    *selected = (*selected + 1) % len;
                    vec![HelperEffect::RequestFrame]
                }
                _ => Vec::new(),
            }
        }
        UserAction::OverlaySubmit => submit_overlay(state, now),
    }
}

fn reduce_runtime(
    state: &mut HelperState,
    action: RuntimeAction,
    now: DateTime<Utc>,
) -> Vec<HelperEffect> {
    match action {
        RuntimeAction::Restore { sessions, settings } => restore(state, sessions, settings, now),
        RuntimeAction::ReplyReady { ticket, content } => deliver_reply(state, ticket, content, now),
        RuntimeAction::ShellFinished { request_id, result } => {
            if state.terminal.complete(request_id, result) {
                vec![HelperEffect::RequestFrame]
            } else {
                Vec::new()
            }
        }
    }
}

fn select_panel(state: &mut HelperState, panel: Panel) {
    state.interaction.panel = panel;
    if panel == Panel::Terminal {
        state.interaction.terminal_attention = false;
    }
}

fn active_input(state: &mut HelperState) -> &mut String {
    let interaction = &mut state.interaction;
    match (&mut interaction.overlay, interaction.panel) {
        (Overlay::RenameSession { draft } | Overlay::ApiKey { draft, .. }, _) => draft,
        (_, Panel::Chat) => &mut interaction.chat_input,
        (_, Panel::Terminal) => &mut interaction.terminal_input,
    }
}

fn close_overlay(state: &mut HelperState) {
    state.interaction.overlay = Overlay::None;
}

fn overlay_len(state: &HelperState) -> usize {
    match state.interaction.overlay {
        Overlay::Sessions { .. } => state.sessions.len(),
        Overlay::Settings { .. } => SETTINGS_ITEMS.len(),
        _ => 0,
    }
}

fn suggestion_command(state: &HelperState, index: usize) -> Option<String> {
    let command = state.suggestions.get(index).map(|item| item.command.clone());
    if command.is_none() {
        tracing::warn!(index, "suggestion index out of range");
    }
    command
}

/// Replaces the registry and flags the terminal tab if it is hidden.
fn refresh_suggestions(state: &mut HelperState, commands: Vec<SuggestedCommand>) {
    let populated = !commands.is_empty();
    state.suggestions.set(commands);
    state.interaction.selected_suggestion = 0;
    if populated && state.interaction.panel != Panel::Terminal {
        state.interaction.terminal_attention = true;
    }
}

fn suggestions_from_last_reply(session: Option<&Session>) -> Vec<SuggestedCommand> {
    session
        .and_then(Session::last_assistant_message)
        .map(|message| extract(&message.content))
        .unwrap_or_default()
}

fn update_settings(
    state: &mut HelperState,
    change: impl FnOnce(&mut Settings),
) -> Vec<HelperEffect> {
    change(&mut state.settings);
    vec![HelperEffect::PersistSettings, HelperEffect::RequestFrame]
}

fn send_chat(state: &mut HelperState, message: &str, now: DateTime<Utc>) -> Vec<HelperEffect> {
    let message = message.trim();
    if message.is_empty() {
        return Vec::new();
    }

    let session_id = match state.sessions.current_id() {
        Some(id) => id,
        None => {
            state.suggestions.clear();
            state.sessions.start_new(now)
        }
    };
    state
        .sessions
        .append(session_id, Message::user(message), now);
    state.interaction.chat_scroll = 0;

    if responder::mentions_terminal(message) && state.interaction.panel != Panel::Terminal {
        state.interaction.terminal_attention = true;
    }

    let mut effects = vec![HelperEffect::PersistSessions, HelperEffect::RequestFrame];
    if !responder::can_reply(&state.settings) {
        state.sessions.append(
            session_id,
            Message::assistant(responder::MISSING_KEY_REPLY),
            now,
        );
        return effects;
    }

    let ticket = state.replies.issue(session_id);
    let content = responder::mock_reply(message, &mut state.rng);
    tracing::debug!(request_id = ticket.request_id, session_id, "reply scheduled");
    effects.push(HelperEffect::ScheduleReply {
        ticket,
        content,
        delay: state.config.reply_delay(),
    });
    effects
}

fn deliver_reply(
    state: &mut HelperState,
    ticket: ReplyTicket,
    content: String,
    now: DateTime<Utc>,
) -> Vec<HelperEffect> {
    if state.replies.resolve(ticket.request_id).is_none() {
        tracing::warn!(request_id = ticket.request_id, "reply for unknown request");
    }

    let current = state.sessions.current_id();
    let target: Option<SessionId> = if current == Some(ticket.session_id) {
        current
    } else {
        let policy = state.config.stale_reply_policy;
        tracing::info!(
            request_id = ticket.request_id,
            origin = ticket.session_id,
            policy = policy.label(),
            "reply arrived after session switch"
        );
        match policy {
            StaleReplyPolicy::ApplyToCurrent => current,
            StaleReplyPolicy::OriginSession => Some(ticket.session_id),
            StaleReplyPolicy::Discard => return vec![HelperEffect::RequestFrame],
        }
    };
    let Some(target) = target else {
        tracing::warn!(request_id = ticket.request_id, "no session to receive reply");
        return vec![HelperEffect::RequestFrame];
    };

    if Some(target) == current {
        refresh_suggestions(state, extract(&content));
    }
    if !state.sessions.append(target, Message::assistant(content), now) {
        return vec![HelperEffect::RequestFrame];
    }
    vec![HelperEffect::PersistSessions, HelperEffect::RequestFrame]
}

fn select_session(state: &mut HelperState, id: SessionId) -> Vec<HelperEffect> {
    if state.sessions.select(id).is_none() {
        return Vec::new();
    }
    close_overlay(state);
    state.interaction.chat_scroll = 0;
    let commands = suggestions_from_last_reply(state.sessions.current());
    refresh_suggestions(state, commands);
    vec![HelperEffect::RequestFrame]
}

fn restore(
    state: &mut HelperState,
    sessions: Vec<Session>,
    settings: Settings,
    now: DateTime<Utc>,
) -> Vec<HelperEffect> {
    state.settings = settings;
    state.sessions = SessionStore::from_sessions(sessions);
    state.suggestions.clear();

    match state.sessions.most_recent_id() {
        Some(id) => {
            tracing::info!(sessions = state.sessions.len(), "restored sessions");
            select_session(state, id)
        }
        None => {
            state.sessions.start_new(now);
            vec![HelperEffect::PersistSessions, HelperEffect::RequestFrame]
        }
    }
}

fn run_terminal(state: &mut HelperState, command: &str, origin: CommandOrigin) -> Vec<HelperEffect> {
    let allow = state.settings.allow_command_execution;
    match state.terminal.submit(command, origin, allow) {
        SubmitOutcome::Ignored => Vec::new(),
        SubmitOutcome::Rendered => vec![HelperEffect::RequestFrame],
        SubmitOutcome::Cleared => {
            state.suggestions.clear();
            state.interaction.selected_suggestion = 0;
            vec![HelperEffect::RequestFrame]
        }
        SubmitOutcome::PassThrough {
            request_id,
            command,
        } => vec![
            HelperEffect::RunShell {
                request_id,
                command,
            },
            HelperEffect::RequestFrame,
        ],
    }
}

fn submit_overlay(state: &mut HelperState, now: DateTime<Utc>) -> Vec<HelperEffect> {
    match std::mem::replace(&mut state.interaction.overlay, Overlay::None) {
        Overlay::None => Vec::new(),
        Overlay::Help => vec![HelperEffect::RequestFrame],
        Overlay::Sessions { selected } => {
            let id = state
                .sessions
                .sorted_for_display()
                .get(selected)
                .map(|session| session.id);
            match id {
                Some(id) => select_session(state, id),
                None => vec![HelperEffect::RequestFrame],
            }
        }
        Overlay::RenameSession { draft } => {
            reduce_user(state, UserAction::RenameSession(draft), now)
        }
        Overlay::ApiKey { provider, draft } => {
            let effects = reduce_user(
                state,
                UserAction::SetApiKey {
                    provider,
                    key: draft,
                },
                now,
            );
            state.interaction.overlay = Overlay::Settings {
                selected: SETTINGS_ITEMS
                    .iter()
                    .position(|item| *item == SettingsItem::ApiKey(provider))
                    .unwrap_or(0),
            };
            effects
        }
        Overlay::Settings { selected } => {
            state.interaction.overlay = Overlay::Settings { selected };
            match SETTINGS_ITEMS.get(selected).copied() {
                Some(SettingsItem::CommandExecution) => {
                    reduce_user(state, UserAction::ToggleCommandExecution, now)
                }
                Some(SettingsItem::Theme) => reduce_user(state, UserAction::ToggleTheme, now),
                Some(SettingsItem::Model) => reduce_user(state, UserAction::CycleModel, now),
                Some(SettingsItem::Temperature) => {
                    reduce_user(state, UserAction::AdjustTemperature(0.1), now)
                }
                Some(SettingsItem::ApiKey(provider)) => {
                    let draft = state
                        .settings
                        .api_keys
                        .get(provider)
                        .unwrap_or_default()
                        .to_string();
                    state.interaction.overlay = Overlay::ApiKey { provider, draft };
                    vec![HelperEffect::RequestFrame]
                }
                None => Vec::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests;
