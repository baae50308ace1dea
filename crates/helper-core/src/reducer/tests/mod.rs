use chrono::DateTime;
use chrono::TimeZone;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub(super) use super::reduce_at;
pub(super) use super::HelperEffect;
pub(super) use crate::actions::HelperAction;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::UserAction;
pub(super) use crate::config::AppConfig;
pub(super) use crate::config::StaleReplyPolicy;
pub(super) use crate::responder::COMMAND_REPLY;
pub(super) use crate::responder::MISSING_KEY_REPLY;
pub(super) use crate::session::Role;
pub(super) use crate::session::Session;
pub(super) use crate::session::SessionId;
pub(super) use crate::settings::Provider;
pub(super) use crate::settings::Settings;
pub(super) use crate::state::HelperState;
pub(super) use crate::state::Overlay;
pub(super) use crate::state::Panel;
pub(super) use crate::state::ReplyTicket;
pub(super) use crate::terminal::LineKind;

mod chat_flow;
mod suggestions;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0)
        .single()
        .expect("valid timestamp")
}

fn state_with(config: AppConfig) -> HelperState {
    HelperState::with_rng(config, StdRng::seed_from_u64(42))
}

/// Fresh state with one session and a chat key configured.
fn state() -> HelperState {
    let mut state = state_with(AppConfig::default());
    state.settings.api_keys.set(Provider::OpenAi, "sk-test");
    let settings = state.settings.clone();
    run_runtime(
        &mut state,
        RuntimeAction::Restore {
            sessions: Vec::new(),
            settings,
        },
        at(0),
    );
    state
}

fn run_user(state: &mut HelperState, action: UserAction, now: DateTime<Utc>) -> Vec<HelperEffect> {
    reduce_at(state, HelperAction::User(action), now)
}

fn run_runtime(
    state: &mut HelperState,
    action: RuntimeAction,
    now: DateTime<Utc>,
) -> Vec<HelperEffect> {
    reduce_at(state, HelperAction::Runtime(action), now)
}

/// Sends a chat message and returns the scheduled reply, if any.
fn send(state: &mut HelperState, message: &str, now: DateTime<Utc>) -> Option<(ReplyTicket, String)> {
    run_user(state, UserAction::SendChat(message.to_string()), now)
        .into_iter()
        .find_map(|effect| match effect {
            HelperEffect::ScheduleReply { ticket, content, .. } => Some((ticket, content)),
            _ => None,
        })
}

fn deliver(
    state: &mut HelperState,
    reply: (ReplyTicket, String),
    now: DateTime<Utc>,
) -> Vec<HelperEffect> {
    let (ticket, content) = reply;
    run_runtime(state, RuntimeAction::ReplyReady { ticket, content }, now)
}

fn current_messages(state: &HelperState) -> Vec<(Role, String)> {
    state
        .sessions
        .current()
        .map(|session| {
            session
                .messages
                .iter()
                .map(|message| (message.role, message.content.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn suggestion_commands(state: &HelperState) -> Vec<String> {
    state
        .suggestions
        .iter()
        .map(|item| item.command.clone())
        .collect()
}

fn line_texts(state: &HelperState) -> Vec<String> {
    state
        .terminal
        .lines()
        .iter()
        .map(|line| line.text.clone())
        .collect()
}

fn session_with_reply(id: SessionId, secs: i64, reply: &str) -> Session {
    Session {
        id,
        serial: 1,
        title: format!("session {id}"),
        date: at(secs),
        messages: vec![
            crate::session::Message::user("question"),
            crate::session::Message::assistant(reply),
        ],
    }
}
