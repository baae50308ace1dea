//! Owns the state and performs the side effects the reducer asks for.

use std::sync::mpsc;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::Sender;
use std::thread;

use helper_core::actions::HelperAction;
use helper_core::actions::RuntimeAction;
use helper_core::persistence::FlatStore;
use helper_core::reducer::reduce;
use helper_core::reducer::HelperEffect;
use helper_core::state::HelperState;
use helper_exec::contracts::ShellCompletion;
use helper_exec::contracts::ShellRequest;
use helper_exec::dispatcher::ShellDispatcher;

pub enum UiEvent {
    Reply(RuntimeAction),
    Shell(ShellCompletion),
}

pub trait ClipboardSink {
    fn set_text(&mut self, text: String);
}

#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: String) {
        match arboard::Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(err) = clipboard.set_text(text) {
                    tracing::warn!(error = %err, "clipboard write failed");
                }
            }
            Err(err) => tracing::warn!(error = %err, "clipboard unavailable"),
        }
    }
}

pub struct Host {
    pub state: HelperState,
    store: FlatStore,
    dispatcher: ShellDispatcher,
    clipboard: Box<dyn ClipboardSink>,
    tx: Sender<UiEvent>,
    rx: Receiver<UiEvent>,
    dirty: bool,
}

impl Host {
    pub fn new(
        state: HelperState,
        store: FlatStore,
        dispatcher: ShellDispatcher,
        clipboard: Box<dyn ClipboardSink>,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            state,
            store,
            dispatcher,
            clipboard,
            tx,
            rx,
            dirty: true,
        }
    }

    pub fn store(&self) -> &FlatStore {
        &self.store
    }

    /// Loads the flat store into the state.
    pub fn restore(&mut self) {
        let sessions = self.store.load_sessions();
        let settings = self.store.load_settings();
        self.dispatch(HelperAction::Runtime(RuntimeAction::Restore {
            sessions,
            settings,
        }));
    }

    pub fn dispatch(&mut self, action: HelperAction) {
        let effects = reduce(&mut self.state, action);
        self.apply(effects);
    }

    /// Feeds finished background work back into the reducer. Returns how
    /// many events were handled.
    pub fn drain_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Blocks for one background event. Used by tests and scripted runs.
    pub fn wait_event(&mut self, timeout: std::time::Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => {
                self.handle_event(event);
                true
            }
            Err(_) => false,
        }
    }

    /// Whether something changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn handle_event(&mut self, event: UiEvent) {
        let action = match event {
            UiEvent::Reply(action) => action,
            UiEvent::Shell(done) => RuntimeAction::ShellFinished {
                request_id: done.request_id,
                result: done.result,
            },
        };
        self.dispatch(HelperAction::Runtime(action));
    }

    fn apply(&mut self, effects: Vec<HelperEffect>) {
        for effect in effects {
            match effect {
                HelperEffect::RequestFrame => self.dirty = true,
                HelperEffect::PersistSessions => {
                    if let Err(err) = self.store.save_sessions(self.state.sessions.sessions()) {
                        tracing::error!(error = %err, "failed to persist sessions");
                    }
                }
                HelperEffect::PersistSettings => {
                    if let Err(err) = self.store.save_settings(&self.state.settings) {
                        tracing::error!(error = %err, "failed to persist settings");
                    }
                }
                HelperEffect::ScheduleReply {
                    ticket,
                    content,
                    delay,
                } => {
                    let tx = self.tx.clone();
                    thread::spawn(move || {
                        thread::sleep(delay);
                        let _ = tx.send(UiEvent::Reply(RuntimeAction::ReplyReady {
                            ticket,
                            content,
                        }));
                    });
                }
                HelperEffect::RunShell {
                    request_id,
                    command,
                } => {
                    let tx = self.tx.clone();
                    self.dispatcher
                        .dispatch(ShellRequest::new(request_id, command), move |done| {
                            let _ = tx.send(UiEvent::Shell(done));
                        });
                }
                HelperEffect::CopyToClipboard(text) => self.clipboard.set_text(text),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::time::Duration;

    use helper_core::actions::UserAction;
    use helper_core::config::AppConfig;
    use helper_core::persistence::STORE_FILE_NAME;
    use helper_core::session::Role;
    use helper_core::settings::Provider;
    use helper_core::terminal::LineKind;
    use helper_exec::executor::ScriptedShellRunner;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use tempfile::TempDir;

    use super::*;

    #[derive(Default, Clone)]
    struct RecordingClipboard(Arc<Mutex<Vec<String>>>);

    impl ClipboardSink for RecordingClipboard {
        fn set_text(&mut self, text: String) {
            if let Ok(mut copied) = self.0.lock() {
                copied.push(text);
            }
        }
    }

    fn host_in(dir: &TempDir, runner: ScriptedShellRunner) -> (Host, RecordingClipboard) {
        let store = FlatStore::open(dir.path().join(STORE_FILE_NAME)).unwrap();
        let config = AppConfig {
            reply_delay_ms: 0,
            ..AppConfig::default()
        };
        let clipboard = RecordingClipboard::default();
        let mut host = Host::new(
            HelperState::new(config),
            store,
            ShellDispatcher::new(runner),
            Box::new(clipboard.clone()),
        );
        host.restore();
        (host, clipboard)
    }

    fn user(host: &mut Host, action: UserAction) {
        host.dispatch(HelperAction::User(action));
    }

    #[test]
    fn first_start_persists_a_welcome_session() {
        let dir = tempdir().unwrap();
        let (host, _) = host_in(&dir, ScriptedShellRunner::default());
        let stored = host.store().load_sessions();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].messages.len(), 1);
    }

    #[test]
    fn chat_reply_arrives_and_is_persisted() {
        let dir = tempdir().unwrap();
        let (mut host, _) = host_in(&dir, ScriptedShellRunner::default());
        user(
            &mut host,
            UserAction::SetApiKey {
                provider: Provider::OpenAi,
                key: "sk".to_string(),
            },
        );
        user(&mut host, UserAction::SendChat("any bash command?".to_string()));
        assert!(host.state.is_waiting_for_reply());

        assert!(host.wait_event(Duration::from_secs(5)));
        assert!(!host.state.is_waiting_for_reply());
        assert_eq!(host.state.suggestions.len(), 4);

        let stored = host.store().load_sessions();
        let last = stored[0].messages.last().map(|m| m.role);
        assert_eq!(last, Some(Role::Assistant));
        assert!(host.store().load_settings().api_keys.has_chat_provider());
    }

    #[test]
    fn passthrough_command_round_trips_through_the_runner() {
        let dir = tempdir().unwrap();
        let runner = ScriptedShellRunner::default().with_output("kubectl get ns", "default\nkube-system\n");
        let (mut host, _) = host_in(&dir, runner);
        user(&mut host, UserAction::ToggleCommandExecution);
        user(&mut host, UserAction::SubmitTerminal("kubectl get ns".to_string()));
        assert_eq!(host.state.terminal.pending_count(), 1);

        assert!(host.wait_event(Duration::from_secs(5)));
        let outputs: Vec<&str> = host
            .state
            .terminal
            .lines()
            .iter()
            .filter(|line| line.kind == LineKind::Output)
            .map(|line| line.text.as_str())
            .collect();
        assert_eq!(outputs, vec!["default", "kube-system", ""]);
        assert_eq!(host.state.terminal.pending_count(), 0);
    }

    #[test]
    fn clipboard_effect_reaches_the_sink() {
        let dir = tempdir().unwrap();
        let (mut host, clipboard) = host_in(&dir, ScriptedShellRunner::default());
        let ticket = host
            .state
            .replies
            .issue(host.state.sessions.current_id().unwrap());
        host.dispatch(HelperAction::Runtime(RuntimeAction::ReplyReady {
            ticket,
            content: "$ helm list".to_string(),
        }));
        user(&mut host, UserAction::CopySuggestionToClipboard(0));
        assert_eq!(*clipboard.0.lock().unwrap(), vec!["helm list".to_string()]);
    }

    #[test]
    fn restart_restores_the_most_recent_session() {
        let dir = tempdir().unwrap();
        let first_id = {
            let (mut host, _) = host_in(&dir, ScriptedShellRunner::default());
            user(&mut host, UserAction::RenameSession("infra".to_string()));
            host.state.sessions.current_id()
        };
        let (host, _) = host_in(&dir, ScriptedShellRunner::default());
        assert_eq!(host.state.sessions.current_id(), first_id);
        assert_eq!(
            host.state.sessions.current().map(|s| s.title.as_str()),
            Some("infra")
        );
    }
}
