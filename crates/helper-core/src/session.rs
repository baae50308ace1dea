use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

pub const DEFAULT_TITLE: &str = "Untitled Session";
pub const WELCOME_MESSAGE: &str = "Hello! I'm your DevOps Assistant. How can I help you today?";
pub const EMPTY_PREVIEW: &str = "No messages yet";
pub const PREVIEW_CHARS: usize = 60;

/// Creation timestamp in epoch milliseconds.
pub type SessionId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "you",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub serial: usize,
    pub title: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Session {
    /// Last user message, truncated for the session list.
    pub fn preview(&self) -> String {
        let Some(last) = self
            .messages
            .iter()
            .rev()
            .find(|message| message.role == Role::User)
        else {
            return EMPTY_PREVIEW.to_string();
        };
        if last.content.chars().count() > PREVIEW_CHARS {
            let head: String = last.content.chars().take(PREVIEW_CHARS).collect();
            format!("{head}...")
        } else {
            last.content.clone()
        }
    }

    pub fn last_assistant_message(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == Role::Assistant)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Vec<Session>,
    current: Option<SessionId>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores persisted sessions without choosing a current one.
    pub fn from_sessions(sessions: Vec<Session>) -> Self {
        Self {
            sessions,
            current: None,
        }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn current_id(&self) -> Option<SessionId> {
        self.current
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.and_then(|id| self.get(id))
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|session| session.id == id)
    }

    fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|session| session.id == id)
    }

    pub fn start_new(&mut self, now: DateTime<Utc>) -> SessionId {
        let mut id = now.timestamp_millis();
        // Two sessions started within the same millisecond.
        if let Some(max) = self.sessions.iter().map(|session| session.id).max() {
            if id <= max {
                id = max + 1;
            }
        }
        self.sessions.push(Session {
            id,
            serial: self.sessions.len() + 1,
            title: DEFAULT_TITLE.to_string(),
            date: now,
            messages: vec![Message::assistant(WELCOME_MESSAGE)],
        });
        self.current = Some(id);
        tracing::debug!(session_id = id, "started session");
        id
    }

    pub fn select(&mut self, id: SessionId) -> Option<&Session> {
        if self.get(id).is_none() {
            tracing::warn!(session_id = id, "select for unknown session");
            return None;
        }
        self.current = Some(id);
        self.get(id)
    }

    /// Appends a message and marks the session as active at `now`.
    pub fn append(&mut self, id: SessionId, message: Message, now: DateTime<Utc>) -> bool {
        let Some(session) = self.get_mut(id) else {
            tracing::warn!(session_id = id, "append to unknown session");
            return false;
        };
        session.messages.push(message);
        session.date = now;
        true
    }

    pub fn rename_current(&mut self, title: &str) -> bool {
        let Some(id) = self.current else {
            return false;
        };
        let title = title.trim();
        let title = if title.is_empty() { DEFAULT_TITLE } else { title };
        match self.get_mut(id) {
            Some(session) => {
                session.title = title.to_string();
                true
            }
            None => false,
        }
    }

    pub fn most_recent_id(&self) -> Option<SessionId> {
        self.sorted_for_display().first().map(|session| session.id)
    }

    /// Most recently active first. Storage order is left untouched.
    pub fn sorted_for_display(&self) -> Vec<&Session> {
        let mut sorted: Vec<&Session> = self.sessions.iter().collect();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted
    }
}
