//! Terminal user interface
//!
//! The TUI renders the full list on every pass and feeds key presses and
//! remote snapshots into the [`App`] state. With sync enabled, sign-in is
//! checked before the terminal is touched: a missing sign-in tears the
//! session down with an error instead of opening the screen.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use tido_core::{Auth, Config, RemoteCollection, RemoteSync, Snapshot, TodoStore, WsCollection};

mod app;
mod ui;

use app::App;

pub async fn run() -> Result<()> {
    let config = Config::load()?;
    init_tui_logging();

    let mut store = TodoStore::new();
    let mut sync: Option<RemoteSync> = None;
    let mut snapshots: Option<mpsc::UnboundedReceiver<Snapshot>> = None;

    if config.sync_enabled {
        if let Some(url) = &config.sync_url {
            let auth = Auth::with_config(config.clone());
            let session = auth.sign_in().map_err(|e| {
                anyhow!(
                    "{}. Run `tido signup` (first device) or `tido login <owner>` first.",
                    e
                )
            })?;

            let collection: Arc<dyn RemoteCollection> = Arc::new(
                WsCollection::connect(url)
                    .await
                    .with_context(|| format!("Failed to connect to sync server {}", url))?,
            );

            let mut remote = RemoteSync::new(collection);
            snapshots = Some(remote.subscribe());
            remote.attach(&session).await?;
            if let Some(pusher) = remote.pusher() {
                store.attach_remote(pusher);
            }
            sync = Some(remote);
        }
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, sync.is_some());
    let result = run_app(&mut terminal, &mut app, snapshots).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Some(mut remote) = sync {
        remote.detach();
    }

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mut snapshots: Option<mpsc::UnboundedReceiver<Snapshot>>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if app.should_quit {
            return Ok(());
        }

        tokio::select! {
            biased;

            Some(snapshot) = recv_snapshot(&mut snapshots) => {
                app.apply_remote(snapshot);
            }

            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                while event::poll(Duration::from_millis(0))? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind == KeyEventKind::Press {
                            app.handle_key(key);
                        }
                    }
                }
            }
        }
    }
}

/// Wait for the next remote snapshot, or forever when sync is off
async fn recv_snapshot(rx: &mut Option<mpsc::UnboundedReceiver<Snapshot>>) -> Option<Snapshot> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Log to a file when TIDO_LOG is set; stderr would corrupt the screen
fn init_tui_logging() {
    if std::env::var("TIDO_LOG").is_ok() {
        let path = std::env::temp_dir().join("tido-tui.log");
        if let Ok(file) = std::fs::File::create(path) {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_env("TIDO_LOG"))
                .with_writer(file)
                .with_ansi(false)
                .try_init();
        }
    }
}
