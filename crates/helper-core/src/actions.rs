use crate::session::Session;
use crate::session::SessionId;
use crate::settings::Provider;
use crate::settings::Settings;
use crate::state::Panel;
use crate::state::ReplyTicket;

#[derive(Debug, Clone)]
pub enum HelperAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    SelectPanel(Panel),
    NextPanel,
    InputChar(char),
    InputBackspace,
    InputPaste(String),
    InputSubmit,
    ScrollChat(i16),

    SendChat(String),
    StartNewSession,
    SelectSession(SessionId),
    RenameSession(String),

    SubmitTerminal(String),
    RecallPrevious,
    RecallNext,
    ClearTerminal,
    CycleTerminalType,

    NextSuggestion,
    PrevSuggestion,
    RunSuggestion(usize),
    /// Switch to the terminal and run the first suggestion.
    RunInTerminal,
    CopySuggestionToInput(usize),
    CopySuggestionToClipboard(usize),

    ToggleCommandExecution,
    ToggleTheme,
    CycleModel,
    AdjustTemperature(f32),
    SetApiKey {
        provider: Provider,
        key: String,
    },

    OpenSessions,
    OpenSettings,
    OpenRename,
    OpenHelp,
    CloseOverlay,
    OverlayMoveUp,
    OverlayMoveDown,
    OverlaySubmit,
}

#[derive(Debug, Clone)]
pub enum RuntimeAction {
    /// Initial load from the flat store.
    Restore {
        sessions: Vec<Session>,
        settings: Settings,
    },
    ReplyReady {
        ticket: ReplyTicket,
        content: String,
    },
    ShellFinished {
        request_id: u64,
        result: Result<String, String>,
    },
}
