//! Core TUI application state and event loop.

use std::io;
use std::time::{Duration, Instant};

use amzwp_core::{
    AppStore, ConfigPanel, ConnectionOptions, ConnectionStatus, EditorResource, Notification,
    StateChange, View, back_to_sitemap, current_view, open_post, switch_post, test_connection,
};
use amzwp_discovery::{PostPreview, ScanOptions, load_preview, scan_sitemap};
use amzwp_shared::{BlogPost, Settings, SitemapState};
use amzwp_storage::FileStore;
use color_eyre::eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, info, warn};

use crate::screens::Action;
use crate::screens::config_panel::ConfigPanelScreen;
use crate::screens::editor::EditorScreen;
use crate::screens::landing::LandingScreen;
use crate::screens::scanner::ScannerScreen;
use crate::widgets::{Toast, centered_rect, status_bar, toast_bar};

/// Results of background work, delivered to the event loop.
#[derive(Debug)]
pub(crate) enum AppEvent {
    ScanFinished(std::result::Result<SitemapState, String>),
    PreviewLoaded {
        post_id: u64,
        result: std::result::Result<PostPreview, String>,
    },
    ConnectionTested(ConnectionStatus),
}

/// Application state.
pub(crate) struct App {
    store: AppStore<FileStore>,
    settings: Settings,
    runtime: Handle,
    events_tx: Sender<AppEvent>,
    events_rx: Receiver<AppEvent>,

    panel: ConfigPanel,
    panel_screen: ConfigPanelScreen,
    landing: LandingScreen,
    scanner: ScannerScreen,
    editor: EditorScreen,
    preview: EditorResource<PostPreview>,

    /// Status message shown in bottom bar.
    status: String,
    toast: Option<Toast>,
    show_help: bool,
    should_quit: bool,
}

impl App {
    pub(crate) fn new(store: AppStore<FileStore>, settings: Settings, runtime: Handle) -> Self {
        let initial_url = if store.sitemap().url.is_empty() {
            store.config().wp_url.clone()
        } else {
            store.sitemap().url.clone()
        };
        let (events_tx, events_rx) = mpsc::channel(64);

        Self {
            store,
            settings,
            runtime,
            events_tx,
            events_rx,
            panel: ConfigPanel::new(),
            panel_screen: ConfigPanelScreen::new(),
            landing: LandingScreen::new(),
            scanner: ScannerScreen::new(initial_url),
            editor: EditorScreen::new(),
            preview: EditorResource::default(),
            status: "Ready. Press ? for help, F2 for settings.".to_string(),
            toast: None,
            show_help: false,
            should_quit: false,
        }
    }

    /// Whether a text input has focus, so plain keys must not trigger
    /// global shortcuts.
    fn is_editing(&self) -> bool {
        if self.panel.is_open() {
            return self.panel_screen.is_editing();
        }
        matches!(current_view(&self.store), View::Scanner) && self.scanner.is_editing()
    }

    fn notify(&mut self, notification: Notification) {
        self.toast = Some(Toast::new(notification));
    }

    /// Surface store write failures; everything else is only logged.
    fn note(&mut self, changes: Vec<StateChange>) {
        for change in changes {
            match change {
                StateChange::PersistFailed(message) => {
                    self.notify(Notification::error(format!("Could not save state: {message}")));
                }
                other => debug!(change = ?other, "state changed"),
            }
        }
    }

    // -- Key handling -------------------------------------------------------

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        // Global keybindings (always active)
        if matches!(code, KeyCode::Char('q') | KeyCode::Char('c'))
            && modifiers.contains(KeyModifiers::CONTROL)
        {
            self.should_quit = true;
            return;
        }

        if self.panel.is_open() {
            let action = self.panel_screen.handle_key(code, modifiers, &mut self.panel);
            self.apply(action);
            return;
        }

        let editing = self.is_editing();
        if self.show_help {
            self.show_help = false;
            return;
        }
        match code {
            KeyCode::Char('q') if !editing => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('?') if !editing => {
                self.show_help = true;
                return;
            }
            KeyCode::F(2) => {
                self.open_panel();
                return;
            }
            KeyCode::Char('c') if !editing => {
                self.open_panel();
                return;
            }
            _ => {}
        }

        let action = match current_view(&self.store) {
            View::Landing => self.landing.handle_key(code, modifiers),
            View::Scanner => self.scanner.handle_key(code, modifiers, self.store.sitemap()),
            View::Editor(_) => self.editor.handle_key(code, modifiers),
        };
        self.apply(action);
    }

    fn open_panel(&mut self) {
        self.panel.open(self.store.config());
        self.panel_screen.reset();
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Enter => {
                let changes = self.store.enter();
                self.note(changes);
                let url = self.store.config().wp_url.clone();
                self.scanner.prefill(&url);
            }
            Action::StartScan(url) => self.start_scan(url),
            Action::OpenPost(post) => {
                let changes = open_post(&mut self.store, post);
                self.note(changes);
                self.editor.reset_scroll();
                self.ensure_preview();
            }
            Action::Back => {
                let changes = back_to_sitemap(&mut self.store);
                self.note(changes);
                self.preview.clear();
            }
            Action::SwitchPost(offset) => self.switch_post(offset),
            Action::ReloadPreview => {
                if let Some(post) = self.store.selected_post().cloned() {
                    self.preview.reload(post.id);
                    self.spawn_preview(post);
                }
            }
            Action::ClosePanel => {
                self.panel.close();
                self.panel_screen.reset();
            }
            Action::SavePanel => match self.panel.save(&mut self.store) {
                Ok(changes) => {
                    self.panel_screen.reset();
                    let url = self.store.config().wp_url.clone();
                    self.scanner.prefill(&url);
                    self.notify(Notification::success("Settings saved"));
                    self.note(changes);
                }
                Err(e) => self.notify(Notification::error(e.to_string())),
            },
            Action::TestConnection => self.start_connection_test(),
            Action::Error(message) => self.notify(Notification::error(message)),
        }
    }

    fn switch_post(&mut self, offset: isize) {
        let Some(current) = self.store.selected_post().map(|p| p.id) else {
            return;
        };
        match self.store.sitemap().neighbour(current, offset).cloned() {
            Some(post) => {
                let changes = switch_post(&mut self.store, post);
                self.note(changes);
                self.editor.reset_scroll();
                self.ensure_preview();
            }
            None => {
                self.status = if offset < 0 {
                    "Already at the first post.".to_string()
                } else {
                    "Already at the last post.".to_string()
                };
            }
        }
    }

    // -- Background work ----------------------------------------------------

    fn start_scan(&mut self, url: String) {
        self.scanner.scan_started();
        info!(%url, "starting sitemap scan");

        let opts = ScanOptions::from(&self.settings.network);
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let result = scan_sitemap(&url, &opts).await.map_err(|e| e.to_string());
            let _ = tx.send(AppEvent::ScanFinished(result)).await;
        });
    }

    /// Start loading the selected post's preview unless it is already
    /// loading or loaded.
    fn ensure_preview(&mut self) {
        let Some(post) = self.store.selected_post().cloned() else {
            return;
        };
        if self.preview.request(post.id) {
            self.spawn_preview(post);
        }
    }

    fn spawn_preview(&self, post: BlogPost) {
        let opts = ScanOptions::from(&self.settings.network);
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let result = load_preview(&post, &opts).await.map_err(|e| e.to_string());
            let _ = tx
                .send(AppEvent::PreviewLoaded {
                    post_id: post.id,
                    result,
                })
                .await;
        });
    }

    fn start_connection_test(&mut self) {
        let Some(draft) = self.panel.begin_test() else {
            debug!("connection test already running");
            return;
        };

        let opts = ConnectionOptions::from(&self.settings.network);
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let status = test_connection(&draft, &opts).await;
            let _ = tx.send(AppEvent::ConnectionTested(status)).await;
        });
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ScanFinished(Ok(sitemap)) => {
                let count = sitemap.posts.len();
                let changes = self.store.set_sitemap(sitemap);
                self.scanner.scan_finished(Ok(count));
                self.notify(Notification::success(format!("Found {count} posts")));
                self.note(changes);
            }
            AppEvent::ScanFinished(Err(message)) => {
                warn!(error = %message, "sitemap scan failed");
                self.scanner.scan_finished(Err(&message));
                self.notify(Notification::error(message));
            }
            AppEvent::PreviewLoaded { post_id, result } => {
                self.preview.resolve(post_id, result);
            }
            AppEvent::ConnectionTested(status) => {
                let notification = self.panel.finish_test(status);
                self.notify(notification);
            }
        }
    }

    /// Drain finished background work and expire the toast.
    fn tick(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }
        if self.toast.as_ref().is_some_and(|t| t.is_expired(Instant::now())) {
            self.toast = None;
        }
    }
}

/// Entry point: sets up terminal, runs event loop, restores terminal.
pub(crate) fn run(app: App) -> Result<()> {
    // Setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, app);

    // Restore terminal
    restore_terminal()?;
    terminal.show_cursor()?;

    result
}

/// Leave raw mode and the alternate screen. Safe to call more than once.
pub(crate) fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        app.tick();
        terminal.draw(|f| draw(f, &app))?;

        // Poll for events with 100ms timeout for responsive UI
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code, key.modifiers);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    info!("exiting");
    Ok(())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    let view = current_view(&app.store);
    draw_header(f, chunks[0], app, &view);

    match view {
        View::Landing => {
            let configured = !app.store.config().wp_url.is_empty();
            app.landing.draw(f, chunks[1], configured);
        }
        View::Scanner => app.scanner.draw(f, chunks[1], app.store.sitemap()),
        View::Editor(post) => {
            let sitemap = app.store.sitemap();
            let position = sitemap
                .posts
                .iter()
                .position(|p| p.id == post.id)
                .map(|idx| (idx, sitemap.posts.len()));
            app.editor.draw(f, chunks[1], post, &app.preview, position);
        }
    }

    match &app.toast {
        Some(toast) => f.render_widget(toast_bar(toast), chunks[2]),
        None => f.render_widget(status_bar(&app.status), chunks[2]),
    }

    if app.panel.is_open() {
        let area = centered_rect(80, 80, f.area());
        app.panel_screen.draw(f, area, &app.panel);
    }

    if app.show_help {
        draw_help_overlay(f);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App, view: &View<'_>) {
    let crumb = match view {
        View::Landing => "Welcome".to_string(),
        View::Scanner => "Posts".to_string(),
        View::Editor(post) => format!("Posts › {}", post.title),
    };
    let config = app.store.config();
    let site = if config.wp_url.is_empty() { "no site configured" } else { config.wp_url.as_str() };
    let ai = config.ai_settings();

    let line = Line::from(vec![
        Span::styled(crumb, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("   {site} · {} {}", ai.provider().label(), ai.model().unwrap_or("")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(" AmzWP "));
    f.render_widget(header, area);
}

fn draw_help_overlay(f: &mut Frame) {
    let area = centered_rect(60, 60, f.area());

    let help_text = vec![
        Line::from("Keybindings").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::from("  F2 / c       Open settings"),
        Line::from("  ?            Show this help"),
        Line::from("  q / Ctrl-C   Quit"),
        Line::from(""),
        Line::from("Posts:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  e            Edit site URL"),
        Line::from("  s            Scan sitemap"),
        Line::from("  ↑/↓ Enter    Select and open a post"),
        Line::from(""),
        Line::from("Editor:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  [ / ]        Previous / next post"),
        Line::from("  r            Reload preview"),
        Line::from("  Esc          Back to posts"),
        Line::from(""),
        Line::from("Settings:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  Tab          Next section"),
        Line::from("  t            Test WordPress connection"),
        Line::from("  Ctrl-S       Save"),
        Line::from("  Esc          Discard changes"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help (press any key to close) ")
                .style(Style::default().bg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));

    // Clear background
    f.render_widget(Clear, area);
    f.render_widget(help, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use amzwp_core::NotificationKind;
    use amzwp_shared::AppStep;
    use uuid::Uuid;

    fn test_app(runtime: &tokio::runtime::Runtime) -> App {
        let dir = std::env::temp_dir().join(format!("amzwp-tui-test-{}", Uuid::now_v7()));
        let store = AppStore::load(FileStore::new(dir));
        App::new(store, Settings::default(), runtime.handle().clone())
    }

    fn sitemap() -> SitemapState {
        SitemapState {
            url: "https://blog.example.com/".into(),
            posts: vec![
                BlogPost::new(1, "One", "http://127.0.0.1:1/one/"),
                BlogPost::new(2, "Two", "http://127.0.0.1:1/two/"),
            ],
            scanned_at: None,
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(code, KeyModifiers::NONE);
    }

    #[test]
    fn enter_then_open_and_switch_posts() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut app = test_app(&runtime);
        assert!(matches!(current_view(&app.store), View::Landing));

        press(&mut app, KeyCode::Enter);
        assert!(matches!(current_view(&app.store), View::Scanner));

        app.handle_event(AppEvent::ScanFinished(Ok(sitemap())));
        assert_eq!(app.store.sitemap().posts.len(), 2);

        press(&mut app, KeyCode::Enter);
        assert!(matches!(current_view(&app.store), View::Editor(p) if p.id == 1));
        assert!(app.preview.is_loading());

        press(&mut app, KeyCode::Char(']'));
        assert!(matches!(current_view(&app.store), View::Editor(p) if p.id == 2));
        assert_eq!(app.preview.post_id(), Some(2));

        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.status, "Already at the last post.");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.store.current_step(), AppStep::Sitemap);
        assert!(app.store.selected_post().is_none());

        let _ = std::fs::remove_dir_all(app.store.storage().dir());
    }

    #[test]
    fn stale_preview_is_ignored() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut app = test_app(&runtime);
        app.apply(Action::Enter);
        app.handle_event(AppEvent::ScanFinished(Ok(sitemap())));
        app.apply(Action::OpenPost(sitemap().posts[0].clone()));
        app.apply(Action::SwitchPost(1));

        app.handle_event(AppEvent::PreviewLoaded {
            post_id: 1,
            result: Err("late".into()),
        });
        assert_eq!(app.preview, EditorResource::Loading { post_id: 2 });

        let _ = std::fs::remove_dir_all(app.store.storage().dir());
    }

    #[test]
    fn panel_cancel_keeps_committed_provider() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut app = test_app(&runtime);

        press(&mut app, KeyCode::F(2));
        assert!(app.panel.is_open());
        app.panel.select_provider(amzwp_shared::AiProvider::OpenAi);
        press(&mut app, KeyCode::Esc);

        assert!(!app.panel.is_open());
        assert_eq!(app.store.config().ai_provider, amzwp_shared::AiProvider::Gemini);
    }

    #[test]
    fn connection_result_becomes_toast() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut app = test_app(&runtime);
        app.open_panel();
        assert!(app.panel.begin_test().is_some());

        app.handle_event(AppEvent::ConnectionTested(ConnectionStatus::failed("nope")));
        let toast = app.toast.as_ref().unwrap();
        assert_eq!(toast.notification.kind, NotificationKind::Error);
        assert_eq!(toast.notification.message, "nope");
    }

    #[test]
    fn q_types_into_url_while_editing() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut app = test_app(&runtime);
        app.apply(Action::Enter);
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        assert!(app.scanner.url().ends_with('q'));
    }
}
