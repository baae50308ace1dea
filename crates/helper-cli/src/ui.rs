use std::io;
use std::sync::OnceLock;
use std::time::Duration;

use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Terminal;

use helper_core::actions::{HelperAction, UserAction};
use helper_core::extract::extract;
use helper_core::registry::run_in_terminal_label;
use helper_core::session::{Role, Session};
use helper_core::settings::Theme;
use helper_core::state::{HelperState, Overlay, Panel, SettingsItem, SETTINGS_ITEMS};
use helper_core::terminal::{CommandOrigin, LineKind, TerminalLine};

use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;

use crate::app::Host;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn get_syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn get_theme_set() -> &'static ThemeSet {
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            io::stdout(),
            LeaveAlternateScreen,
            DisableBracketedPaste,
            crossterm::cursor::Show
        );
    }
}

pub fn run(mut host: Host) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableBracketedPaste,
        crossterm::cursor::Hide
    )?;
    let _guard = TuiGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    run_app(&mut terminal, &mut host).map_err(|e| e.into())
}

#[derive(Debug, PartialEq)]
enum KeyHandlerResult {
    Continue(Vec<UserAction>),
    Exit,
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, host: &mut Host) -> io::Result<()> {
    loop {
        host.drain_events();

        // Pending work animates the spinner, so keep redrawing while it runs.
        let busy = host.state.is_waiting_for_reply() || host.state.terminal.pending_count() > 0;
        if host.take_dirty() || busy {
            terminal.draw(|f| ui(f, &host.state))?;
        }

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let actions = match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                match handle_key_event(key, &host.state) {
                    KeyHandlerResult::Continue(actions) => actions,
                    KeyHandlerResult::Exit => return Ok(()),
                }
            }
            Event::Paste(text) => vec![UserAction::InputPaste(text)],
            Event::Resize(_, _) => {
                terminal.draw(|f| ui(f, &host.state))?;
                Vec::new()
            }
            _ => Vec::new(),
        };
        for action in actions {
            host.dispatch(HelperAction::User(action));
        }
    }
}

fn handle_key_event(key: KeyEvent, state: &HelperState) -> KeyHandlerResult {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        return KeyHandlerResult::Exit;
    }
    if state.interaction.overlay.is_open() {
        return handle_overlay_keys(key, state);
    }
    if let Some(action) = global_action(key) {
        return KeyHandlerResult::Continue(vec![action]);
    }
    match state.interaction.panel {
        Panel::Chat => handle_chat_keys(key),
        Panel::Terminal => handle_terminal_keys(key, state),
    }
}

fn global_action(key: KeyEvent) -> Option<UserAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let action = match key.code {
        KeyCode::Tab => UserAction::NextPanel,
        KeyCode::F(1) => UserAction::OpenHelp,
        KeyCode::Char('n') if ctrl => UserAction::StartNewSession,
        KeyCode::Char('o') if ctrl => UserAction::OpenSessions,
        KeyCode::Char('s') if ctrl => UserAction::OpenSettings,
        KeyCode::Char('r') if ctrl => UserAction::OpenRename,
        KeyCode::Char('e') if ctrl => UserAction::ToggleCommandExecution,
        KeyCode::Char('t') if ctrl => UserAction::ToggleTheme,
        KeyCode::Char('g') if ctrl => UserAction::RunInTerminal,
        _ => return None,
    };
    Some(action)
}

fn handle_overlay_keys(key: KeyEvent, state: &HelperState) -> KeyHandlerResult {
    let overlay = &state.interaction.overlay;
    let actions = match key.code {
        KeyCode::Esc => vec![UserAction::CloseOverlay],
        KeyCode::Enter => vec![UserAction::OverlaySubmit],
        KeyCode::Up => vec![UserAction::OverlayMoveUp],
        KeyCode::Down => vec![UserAction::OverlayMoveDown],
        KeyCode::Left | KeyCode::Right
            if selected_settings_item(overlay) == Some(SettingsItem::Temperature) =>
        {
            let delta = if key.code == KeyCode::Left { -0.1 } else { 0.1 };
            vec![UserAction::AdjustTemperature(delta)]
        }
        KeyCode::Backspace if overlay.draft().is_some() => vec![UserAction::InputBackspace],
        KeyCode::Char(c) if overlay.draft().is_some() => vec![UserAction::InputChar(c)],
        KeyCode::Char('q') | KeyCode::Char('?') if *overlay == Overlay::Help => {
            vec![UserAction::CloseOverlay]
        }
        _ => Vec::new(),
    };
    KeyHandlerResult::Continue(actions)
}

fn handle_chat_keys(key: KeyEvent) -> KeyHandlerResult {
    let actions = match key.code {
        KeyCode::Enter => vec![UserAction::InputSubmit],
        KeyCode::Backspace => vec![UserAction::InputBackspace],
        KeyCode::PageUp => vec![UserAction::ScrollChat(5)],
        KeyCode::PageDown => vec![UserAction::ScrollChat(-5)],
        KeyCode::Char(c) => vec![UserAction::InputChar(c)],
        _ => Vec::new(),
    };
    KeyHandlerResult::Continue(actions)
}

fn handle_terminal_keys(key: KeyEvent, state: &HelperState) -> KeyHandlerResult {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let selected = state.interaction.selected_suggestion;
    let actions = match key.code {
        KeyCode::Enter => vec![UserAction::InputSubmit],
        KeyCode::Backspace => vec![UserAction::InputBackspace],
        KeyCode::Up if shift => vec![UserAction::PrevSuggestion],
        KeyCode::Down if shift => vec![UserAction::NextSuggestion],
        KeyCode::Up => vec![UserAction::RecallPrevious],
        KeyCode::Down => vec![UserAction::RecallNext],
        KeyCode::F(5) => vec![UserAction::RunSuggestion(selected)],
        KeyCode::F(6) => vec![UserAction::CopySuggestionToInput(selected)],
        KeyCode::F(7) => vec![UserAction::CopySuggestionToClipboard(selected)],
        KeyCode::Char('l') if ctrl => vec![UserAction::ClearTerminal],
        KeyCode::Char('p') if ctrl => vec![UserAction::CycleTerminalType],
        KeyCode::Char(c) if !ctrl => vec![UserAction::InputChar(c)],
        _ => Vec::new(),
    };
    KeyHandlerResult::Continue(actions)
}

fn selected_settings_item(overlay: &Overlay) -> Option<SettingsItem> {
    match overlay {
        Overlay::Settings { selected } => SETTINGS_ITEMS.get(*selected).copied(),
        _ => None,
    }
}

#[derive(Clone, Copy)]
struct UiPalette {
    accent: Color,
    accent_alt: Color,
    success: Color,
    warning: Color,
    danger: Color,
    muted: Color,
    border: Color,
    text: Color,
    panel_bg: Color,
    selected_bg: Color,
}

fn palette_for(theme: Theme) -> UiPalette {
    match theme {
        Theme::Dark => UiPalette {
            accent: Color::Cyan,
            accent_alt: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::DarkGray,
            border: Color::Gray,
            text: Color::White,
            panel_bg: Color::Black,
            selected_bg: Color::DarkGray,
        },
        Theme::Light => UiPalette {
            accent: Color::Blue,
            accent_alt: Color::Magenta,
            success: Color::Green,
            warning: Color::Rgb(160, 110, 0),
            danger: Color::Red,
            muted: Color::Gray,
            border: Color::DarkGray,
            text: Color::Black,
            panel_bg: Color::White,
            selected_bg: Color::Rgb(220, 225, 235),
        },
    }
}

fn syntect_theme_name(theme: Theme) -> &'static str {
    match theme {
        Theme::Dark => "base16-ocean.dark",
        Theme::Light => "InspiredGitHub",
    }
}

fn get_spinner() -> &'static str {
    let frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    frames[(millis / 100) as usize % frames.len()]
}

fn ui(f: &mut ratatui::Frame, state: &HelperState) {
    let palette = palette_for(state.settings.theme);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Tabs
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Input
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    render_header(f, chunks[0], state, palette);
    render_tabs(f, chunks[1], state, palette);
    match state.interaction.panel {
        Panel::Chat => {
            render_chat(f, chunks[2], state, palette);
            render_chat_input(f, chunks[3], state, palette);
        }
        Panel::Terminal => {
            render_terminal(f, chunks[2], state, palette);
            render_terminal_input(f, chunks[3], state, palette);
        }
    }
    render_footer(f, chunks[4], state, palette);
    render_overlay(f, state, palette);
}

fn render_header(f: &mut ratatui::Frame, area: Rect, state: &HelperState, palette: UiPalette) {
    let session = state
        .sessions
        .current()
        .map(|s| format!("{} #{}", s.title, s.serial))
        .unwrap_or_else(|| "no session".to_string());
    let execution = if state.settings.allow_command_execution {
        Span::styled("exec:on", Style::default().fg(palette.warning))
    } else {
        Span::styled("exec:off", Style::default().fg(palette.muted))
    };
    let status = if state.is_waiting_for_reply() {
        format!("{} thinking", get_spinner())
    } else {
        "idle".to_string()
    };
    let line = Line::from(vec![
        Span::styled(
            "DevOps Helper",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" | {session} | "), Style::default().fg(palette.text)),
        execution,
        Span::styled(
            format!(
                " | {} | temp {:.1} | {} | {}",
                state.settings.model,
                state.settings.temperature,
                state.settings.theme.label(),
                status
            ),
            Style::default().fg(palette.text),
        ),
    ]);
    let header = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border)),
    );
    f.render_widget(header, area);
}

fn render_tabs(f: &mut ratatui::Frame, area: Rect, state: &HelperState, palette: UiPalette) {
    let terminal_title = if state.interaction.terminal_attention {
        Line::from(vec![
            Span::raw("Terminal "),
            Span::styled("●", Style::default().fg(palette.warning)),
        ])
    } else {
        Line::from("Terminal")
    };
    let titles = vec![Line::from("Chat"), terminal_title];
    let selected = match state.interaction.panel {
        Panel::Chat => 0,
        Panel::Terminal => 1,
    };
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border))
                .title("Views"),
        )
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

fn highlight_code(
    out: &mut Vec<Line<'static>>,
    lines: &[String],
    lang: &str,
    state: &HelperState,
    palette: UiPalette,
) {
    let ps = get_syntax_set();
    let ts = get_theme_set();
    let theme = ts
        .themes
        .get(syntect_theme_name(state.settings.theme))
        .or_else(|| ts.themes.values().next());
    let syntax = ps
        .find_syntax_by_token(if lang.is_empty() { "bash" } else { lang })
        .unwrap_or_else(|| ps.find_syntax_plain_text());

    out.push(Line::from(Span::styled(
        format!("  ```{lang}"),
        Style::default().fg(palette.muted),
    )));
    let mut highlighter = theme.map(|theme| HighlightLines::new(syntax, theme));
    for raw in lines {
        let mut spans = vec![Span::raw("  ")];
        let ranges = highlighter
            .as_mut()
            .and_then(|h| h.highlight_line(raw, ps).ok())
            .unwrap_or_default();
        if ranges.is_empty() {
            spans.push(Span::styled(
                raw.clone(),
                Style::default().fg(palette.accent_alt),
            ));
        }
        for (style, text) in ranges {
            let fg = Color::Rgb(style.foreground.r, style.foreground.g, style.foreground.b);
            spans.push(Span::styled(
                text.to_string(),
                Style::default().fg(fg).bg(palette.selected_bg),
            ));
        }
        out.push(Line::from(spans));
    }
    out.push(Line::from(Span::styled(
        "  ```".to_string(),
        Style::default().fg(palette.muted),
    )));
}

fn render_message(
    out: &mut Vec<Line<'static>>,
    role: Role,
    content: &str,
    state: &HelperState,
    palette: UiPalette,
) {
    let (label, color) = match role {
        Role::User => ("You", palette.accent),
        Role::Assistant => ("Assistant", palette.success),
    };
    out.push(Line::from(Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )));

    let mut in_code = false;
    let mut code_lang = String::new();
    let mut code_lines: Vec<String> = Vec::new();
    for raw in content.split('\n') {
        if let Some(rest) = raw.trim_start().strip_prefix("```") {
            if in_code {
                highlight_code(out, &code_lines, &code_lang, state, palette);
                code_lines.clear();
            } else {
                code_lang = rest.trim().to_string();
            }
            in_code = !in_code;
            continue;
        }
        if in_code {
            code_lines.push(raw.to_string());
        } else {
            out.push(Line::from(Span::styled(
                format!("  {raw}"),
                Style::default().fg(palette.text),
            )));
        }
    }
    if in_code {
        highlight_code(out, &code_lines, &code_lang, state, palette);
    }

    if role == Role::Assistant {
        if let Some(label) = run_in_terminal_label(extract(content).len()) {
            out.push(Line::from(vec![
                Span::styled("  [Ctrl+G] ", Style::default().fg(palette.muted)),
                Span::styled(
                    label,
                    Style::default()
                        .fg(palette.accent)
                        .add_modifier(Modifier::BOLD),
                ),
            ]));
        }
    }
    out.push(Line::default());
}

fn build_chat_lines(state: &HelperState, palette: UiPalette) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(session) = state.sessions.current() {
        for message in &session.messages {
            render_message(&mut lines, message.role, &message.content, state, palette);
        }
    }
    if state.is_waiting_for_reply() {
        lines.push(Line::from(Span::styled(
            format!("{} Assistant is typing...", get_spinner()),
            Style::default()
                .fg(palette.muted)
                .add_modifier(Modifier::ITALIC),
        )));
    }
    lines
}

/// Rows needed to show `lines` wrapped to `width` columns.
fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

/// Scroll offset that keeps the newest content visible, moved back by the
/// user's scroll-up distance.
fn bottom_scroll(total: u16, visible: u16, scrolled_up: u16) -> u16 {
    total.saturating_sub(visible).saturating_sub(scrolled_up)
}

fn render_chat(f: &mut ratatui::Frame, area: Rect, state: &HelperState, palette: UiPalette) {
    let lines = build_chat_lines(state, palette);
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    let scroll = bottom_scroll(
        wrapped_height(&lines, inner_width),
        inner_height,
        state.interaction.chat_scroll,
    );
    let title = state
        .sessions
        .current()
        .map(|s| s.title.clone())
        .unwrap_or_else(|| "Chat".to_string());
    let p = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().bg(palette.panel_bg))
                .border_style(Style::default().fg(palette.border))
                .title(title),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(p, area);
}

fn terminal_line(line: &TerminalLine, palette: UiPalette) -> Line<'static> {
    match &line.kind {
        LineKind::Command { prompt, origin } => {
            let mut spans = vec![
                Span::styled(
                    format!("{prompt} "),
                    Style::default()
                        .fg(palette.success)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(line.text.clone(), Style::default().fg(palette.text)),
            ];
            if *origin == CommandOrigin::Suggestion {
                spans.push(Span::styled(
                    "  (from suggestion)",
                    Style::default().fg(palette.muted),
                ));
            }
            Line::from(spans)
        }
        LineKind::Pending { .. } => Line::from(Span::styled(
            format!("{} {}", get_spinner(), line.text),
            Style::default()
                .fg(palette.muted)
                .add_modifier(Modifier::ITALIC),
        )),
        kind => {
            let color = match kind {
                LineKind::Info => palette.warning,
                LineKind::Success => palette.success,
                LineKind::Welcome => palette.accent,
                LineKind::Error => palette.danger,
                _ => palette.text,
            };
            Line::from(Span::styled(line.text.clone(), Style::default().fg(color)))
        }
    }
}

fn render_terminal(f: &mut ratatui::Frame, area: Rect, state: &HelperState, palette: UiPalette) {
    let sections = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(40)])
        .split(area);

    // Multi-line outputs are split into display rows.
    let lines: Vec<Line<'static>> = state
        .terminal
        .lines()
        .iter()
        .flat_map(|line| {
            line.text
                .split('\n')
                .map(|text| {
                    terminal_line(
                        &TerminalLine {
                            kind: line.kind.clone(),
                            text: text.to_string(),
                        },
                        palette,
                    )
                })
                .collect::<Vec<_>>()
        })
        .collect();
    let scroll = bottom_scroll(
        wrapped_height(&lines, sections[0].width.saturating_sub(2)),
        sections[0].height.saturating_sub(2),
        0,
    );
    let title = format!(
        "Terminal ({}){}",
        state.terminal.terminal_type.label(),
        if state.settings.allow_command_execution {
            ""
        } else {
            " - simulated"
        }
    );
    let output = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().bg(palette.panel_bg))
                .border_style(Style::default().fg(palette.border))
                .title(title),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(output, sections[0]);

    render_suggestions(f, sections[1], state, palette);
}

fn render_suggestions(f: &mut ratatui::Frame, area: Rect, state: &HelperState, palette: UiPalette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title("Suggested Commands");
    if state.suggestions.is_empty() {
        let empty = Paragraph::new("No suggestions yet. Ask the assistant for commands.")
            .style(Style::default().fg(palette.muted))
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = state
        .suggestions
        .iter()
        .map(|item| {
            ListItem::new(vec![
                Line::from(Span::styled(
                    item.command.clone(),
                    Style::default()
                        .fg(palette.accent)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("  {}", item.explanation),
                    Style::default().fg(palette.muted),
                )),
            ])
        })
        .collect();
    let mut list_state = ListState::default();
    list_state.select(Some(
        state
            .interaction
            .selected_suggestion
            .min(state.suggestions.len() - 1),
    ));
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(palette.selected_bg))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut list_state);
}

fn render_chat_input(f: &mut ratatui::Frame, area: Rect, state: &HelperState, palette: UiPalette) {
    let text = Line::from(vec![
        Span::styled("> ", Style::default().fg(palette.accent)),
        Span::styled(
            state.interaction.chat_input.clone(),
            Style::default().fg(palette.text),
        ),
        Span::styled("█", Style::default().fg(palette.muted)),
    ]);
    let input = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title("Message"),
    );
    f.render_widget(input, area);
}

fn render_terminal_input(
    f: &mut ratatui::Frame,
    area: Rect,
    state: &HelperState,
    palette: UiPalette,
) {
    let text = Line::from(vec![
        Span::styled(
            format!("{} ", state.terminal.prompt()),
            Style::default()
                .fg(palette.success)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            state.interaction.terminal_input.clone(),
            Style::default().fg(palette.text),
        ),
        Span::styled("█", Style::default().fg(palette.muted)),
    ]);
    let input = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title("Command"),
    );
    f.render_widget(input, area);
}

fn render_footer(f: &mut ratatui::Frame, area: Rect, state: &HelperState, palette: UiPalette) {
    let hints: &[(&str, &str)] = match state.interaction.panel {
        Panel::Chat => &[
            ("Tab", "terminal"),
            ("Ctrl+G", "run in terminal"),
            ("Ctrl+N", "new"),
            ("Ctrl+O", "sessions"),
            ("Ctrl+S", "settings"),
            ("F1", "help"),
            ("Ctrl+Q", "quit"),
        ],
        Panel::Terminal => &[
            ("Tab", "chat"),
            ("Up/Down", "history"),
            ("Shift+Up/Down", "pick"),
            ("F5", "run"),
            ("F6", "to input"),
            ("F7", "copy"),
            ("Ctrl+L", "clear"),
            ("Ctrl+P", "shell"),
        ],
    };
    let mut spans = Vec::new();
    for (key, label) in hints {
        spans.push(Span::styled(*key, Style::default().fg(palette.accent)));
        spans.push(Span::styled(
            format!(" {label}  "),
            Style::default().fg(palette.muted),
        ));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}

fn settings_item_line(item: SettingsItem, state: &HelperState) -> String {
    let settings = &state.settings;
    match item {
        SettingsItem::CommandExecution => format!(
            "Allow command execution: {}",
            if settings.allow_command_execution { "on" } else { "off" }
        ),
        SettingsItem::Theme => format!("Theme: {}", settings.theme.label()),
        SettingsItem::Model => format!("Model: {}", settings.model),
        SettingsItem::Temperature => format!("Temperature: {:.1}  (Left/Right)", settings.temperature),
        SettingsItem::ApiKey(provider) => format!(
            "{} API key: {}",
            provider.label(),
            if settings.api_keys.get(provider).is_some() {
                "set"
            } else {
                "not set"
            }
        ),
    }
}

fn session_item(session: &Session, current: bool, palette: UiPalette) -> ListItem<'static> {
    let marker = if current { "* " } else { "  " };
    ListItem::new(vec![
        Line::from(vec![
            Span::styled(marker, Style::default().fg(palette.accent)),
            Span::styled(
                session.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  #{}  {}", session.serial, session.date.format("%Y-%m-%d %H:%M")),
                Style::default().fg(palette.muted),
            ),
        ]),
        Line::from(Span::styled(
            format!("    {}", session.preview()),
            Style::default().fg(palette.muted),
        )),
    ])
}

fn render_list_overlay(
    f: &mut ratatui::Frame,
    title: &str,
    items: Vec<ListItem<'static>>,
    selected: usize,
    palette: UiPalette,
) {
    let area = centered_rect(70, 60, f.area());
    let mut list_state = ListState::default();
    list_state.select(Some(selected));
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent))
                .title(title.to_string()),
        )
        .highlight_style(Style::default().bg(palette.selected_bg))
        .highlight_symbol("> ");
    f.render_widget(Clear, area);
    f.render_stateful_widget(list, area, &mut list_state);
}

fn render_text_overlay(f: &mut ratatui::Frame, title: &str, text: String, palette: UiPalette) {
    let area = centered_rect(60, 20, f.area());
    let p = Paragraph::new(Line::from(vec![
        Span::raw(text),
        Span::styled("█", Style::default().fg(palette.muted)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.accent))
            .title(title.to_string()),
    );
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}

fn render_overlay(f: &mut ratatui::Frame, state: &HelperState, palette: UiPalette) {
    match &state.interaction.overlay {
        Overlay::None => {}
        Overlay::Sessions { selected } => {
            let current = state.sessions.current_id();
            let items = state
                .sessions
                .sorted_for_display()
                .into_iter()
                .map(|session| session_item(session, Some(session.id) == current, palette))
                .collect();
            render_list_overlay(f, "Sessions (Enter to open)", items, *selected, palette);
        }
        Overlay::Settings { selected } => {
            let items = SETTINGS_ITEMS
                .iter()
                .map(|item| ListItem::new(settings_item_line(*item, state)))
                .collect();
            render_list_overlay(f, "Settings (Enter to change)", items, *selected, palette);
        }
        Overlay::RenameSession { draft } => {
            render_text_overlay(f, "Rename Session", draft.clone(), palette);
        }
        Overlay::ApiKey { provider, draft } => {
            // Keys are never echoed in full.
            let masked: String = draft.chars().map(|_| '*').collect();
            render_text_overlay(f, &format!("{} API key", provider.label()), masked, palette);
        }
        Overlay::Help => {
            let area = centered_rect(70, 70, f.area());
            let lines = vec![
                Line::from("Chat: type a message and press Enter."),
                Line::from("Tab switches between Chat and Terminal."),
                Line::from("Ctrl+G runs the first suggested command in the terminal."),
                Line::from("Terminal: Up/Down recall history, Shift+Up/Down pick a suggestion."),
                Line::from("F5 run, F6 copy to input, F7 copy to clipboard."),
                Line::from("Ctrl+L clear, Ctrl+P cycle bash/powershell/cmd."),
                Line::from("Ctrl+E toggles real command execution, Ctrl+T toggles theme."),
                Line::from("Ctrl+N new session, Ctrl+O sessions, Ctrl+R rename, Ctrl+S settings."),
                Line::from("Ctrl+Q quits."),
            ];
            let p = Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(palette.accent))
                        .title("Help"),
                );
            f.render_widget(Clear, area);
            f.render_widget(p, area);
        }
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
