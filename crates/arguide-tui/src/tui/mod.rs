/*
[INPUT]:  FrontendUi over the scripted manager, terminal key events, log buffer
[OUTPUT]: Ratatui-based TUI driving the task workflow
[POS]:    TUI module for the arguide binary
[UPDATE]: When changing keybindings or the UI loop
*/

mod draw;
mod log_buffer;
mod terminal;

pub use log_buffer::{LOG_BUFFER_CAPACITY, LogBuffer, LogBufferHandle, LogWriterFactory};

use std::time::Duration;

use anyhow::Result;
use arguide_core::{FrontendUi, ManagerEvent, UiError};
use ratatui::crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEventKind};
use ratatui::widgets::ListState;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use terminal::AppTerminal;

const UI_TICK_INTERVAL: Duration = Duration::from_millis(250);
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(200);

pub(crate) struct TuiApp {
    ui: FrontendUi,
    selector: ListState,
    status_message: String,
    log_buffer: LogBufferHandle,
    ticks: u64,
}

impl TuiApp {
    pub(crate) fn new(ui: FrontendUi, log_buffer: LogBufferHandle) -> Self {
        let mut app = Self {
            ui,
            selector: ListState::default(),
            status_message: String::from("Ready"),
            log_buffer,
            ticks: 0,
        };
        app.sync_selector();
        app
    }

    pub(crate) fn apply(&mut self, event: ManagerEvent) {
        self.ui.handle_event(event);
        self.sync_selector();
    }

    /// Keep the selector cursor on a real option.
    fn sync_selector(&mut self) {
        let len = self.ui.tasks().len();
        match self.selector.selected() {
            _ if len == 0 => self.selector.select(None),
            Some(idx) if idx >= len => self.selector.select(Some(len - 1)),
            None => self.selector.select(Some(0)),
            Some(_) => {}
        }
    }

    fn move_selection(&mut self, forward: bool) {
        let len = self.ui.tasks().len();
        if len == 0 {
            return;
        }
        let current = self.selector.selected().unwrap_or(0);
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.selector.select(Some(next));
    }

    /// Returns true when the app should quit.
    pub(crate) fn handle_key(&mut self, code: KeyCode) -> bool {
        let outcome = match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                self.move_selection(false);
                return false;
            }
            KeyCode::Down => {
                self.move_selection(true);
                return false;
            }
            KeyCode::Enter => {
                let index = self.selector.selected().unwrap_or(0);
                self.ui.select_task(index).map(|handle| ("task selected", handle))
            }
            KeyCode::Char('s') => self.ui.start_tracking().map(|handle| ("tracking started", handle)),
            KeyCode::Char('c') => self.ui.capture().map(|handle| ("capture sent", handle)),
            KeyCode::Char('l') => self.ui.locate().map(|handle| ("locate sent", handle)),
            KeyCode::Char('b') => self.ui.back().map(|handle| ("back to task selection", handle)),
            _ => return false,
        };
        self.report(outcome);
        false
    }

    fn report(&mut self, outcome: Result<(&str, JoinHandle<bool>), UiError>) {
        match outcome {
            Ok((message, _handle)) => self.status_message = message.to_string(),
            Err(err) => {
                warn!(error = %err, "control rejected");
                self.status_message = err.to_string();
            }
        }
    }
}

pub async fn run_tui(
    ui: FrontendUi,
    log_buffer: LogBufferHandle,
    exit_after_ticks: Option<u64>,
) -> Result<()> {
    let mut terminal = AppTerminal::open()?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let input_shutdown = CancellationToken::new();
    let input_shutdown_clone = input_shutdown.clone();

    tokio::task::spawn_blocking(move || {
        while !input_shutdown_clone.is_cancelled() {
            if event::poll(INPUT_POLL_INTERVAL).unwrap_or(false) {
                if let Ok(event) = event::read() {
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
            }
        }
    });

    let mut app = TuiApp::new(ui, log_buffer);
    let mut busy = app.ui.busy().subscribe();
    let mut tick = tokio::time::interval(UI_TICK_INTERVAL);
    let mut should_quit = false;

    while !should_quit {
        tokio::select! {
            _ = tick.tick() => {
                app.ticks += 1;
                if exit_after_ticks.is_some_and(|limit| app.ticks >= limit) {
                    info!(ticks = app.ticks, "tick limit reached");
                    should_quit = true;
                }
            }
            maybe_input = event_rx.recv() => {
                if let Some(CrosstermEvent::Key(key)) = maybe_input {
                    if key.kind == KeyEventKind::Press && app.handle_key(key.code) {
                        should_quit = true;
                    }
                }
            }
            maybe_event = app.ui.next_event() => {
                if let Some(event) = maybe_event {
                    app.apply(event);
                }
            }
            Ok(()) = busy.changed() => {
                let is_busy = *busy.borrow_and_update();
                debug!(busy = is_busy, "busy indicator changed");
            }
        }

        terminal.render(&mut app)?;
    }

    input_shutdown.cancel();
    terminal.close()?;
    info!("tui exited");
    Ok(())
}
