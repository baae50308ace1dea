use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::AppConfig;
use crate::registry::SuggestionRegistry;
use crate::session::SessionId;
use crate::session::SessionStore;
use crate::settings::Provider;
use crate::settings::Settings;
use crate::terminal::TerminalSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Chat,
    Terminal,
}

impl Panel {
    pub fn next(self) -> Self {
        match self {
            Self::Chat => Self::Terminal,
            Self::Terminal => Self::Chat,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Chat => "Chat",
            Self::Terminal => "Terminal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsItem {
    CommandExecution,
    Theme,
    Model,
    Temperature,
    ApiKey(Provider),
}

pub const SETTINGS_ITEMS: [SettingsItem; 7] = [
    SettingsItem::CommandExecution,
    SettingsItem::Theme,
    SettingsItem::Model,
    SettingsItem::Temperature,
    SettingsItem::ApiKey(Provider::OpenAi),
    SettingsItem::ApiKey(Provider::Azure),
    SettingsItem::ApiKey(Provider::Claude),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    Sessions { selected: usize },
    Settings { selected: usize },
    RenameSession { draft: String },
    ApiKey { provider: Provider, draft: String },
    Help,
}

impl Overlay {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn draft(&self) -> Option<&str> {
        match self {
            Self::RenameSession { draft } | Self::ApiKey { draft, .. } => Some(draft),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Interaction {
    pub panel: Panel,
    pub overlay: Overlay,
    pub chat_input: String,
    pub terminal_input: String,
    /// Terminal tab badge: suggestions arrived while the terminal was hidden.
    pub terminal_attention: bool,
    pub selected_suggestion: usize,
    pub chat_scroll: u16,
}

impl Default for Interaction {
    fn default() -> Self {
        Self {
            panel: Panel::Chat,
            overlay: Overlay::None,
            chat_input: String::new(),
            terminal_input: String::new(),
            terminal_attention: false,
            selected_suggestion: 0,
            chat_scroll: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyTicket {
    pub request_id: u64,
    pub session_id: SessionId,
}

/// Chat replies that were scheduled but have not fired yet.
#[derive(Debug, Clone)]
pub struct ReplyQueue {
    pending: Vec<ReplyTicket>,
    next_request_id: u64,
}

impl Default for ReplyQueue {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            next_request_id: 1,
        }
    }
}

impl ReplyQueue {
    pub fn issue(&mut self, session_id: SessionId) -> ReplyTicket {
        let ticket = ReplyTicket {
            request_id: self.next_request_id,
            session_id,
        };
        self.next_request_id += 1;
        self.pending.push(ticket);
        ticket
    }

    pub fn resolve(&mut self, request_id: u64) -> Option<ReplyTicket> {
        let idx = self
            .pending
            .iter()
            .position(|ticket| ticket.request_id == request_id)?;
        Some(self.pending.remove(idx))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_waiting(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Everything the controller owns. Mutated only through `reduce`.
#[derive(Debug, Clone)]
pub struct HelperState {
    pub sessions: SessionStore,
    pub suggestions: SuggestionRegistry,
    pub terminal: TerminalSession,
    pub settings: Settings,
    pub interaction: Interaction,
    pub replies: ReplyQueue,
    pub config: AppConfig,
    pub(crate) rng: StdRng,
}

impl HelperState {
    pub fn new(config: AppConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: AppConfig, rng: StdRng) -> Self {
        Self {
            sessions: SessionStore::new(),
            suggestions: SuggestionRegistry::new(),
            terminal: TerminalSession::default(),
            settings: Settings::default(),
            interaction: Interaction::default(),
            replies: ReplyQueue::default(),
            config,
            rng,
        }
    }

    pub fn is_waiting_for_reply(&self) -> bool {
        self.replies.is_waiting()
    }
}
