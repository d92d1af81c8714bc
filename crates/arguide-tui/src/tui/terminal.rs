/*
[INPUT]:  TuiApp view state, stdout in raw mode
[OUTPUT]: AppTerminal - alternate-screen session that renders the workflow view
[POS]:    TUI terminal session
[UPDATE]: 2026-10-16 Own the frame callback and restore explicitly at session end
*/

use std::io;

use anyhow::{Context, Result};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::crossterm::{ExecutableCommand, cursor};
use tracing::{debug, warn};

use super::TuiApp;
use super::draw;

/// Raw-mode alternate screen for one workflow session.
///
/// `close` restores the terminal and reports failures; dropping an open
/// session restores it best-effort.
pub(super) struct AppTerminal {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    frames: u64,
    open: bool,
}

impl AppTerminal {
    pub(super) fn open() -> Result<Self> {
        terminal::enable_raw_mode().context("enable raw mode")?;
        let mut stdout = io::stdout();
        stdout
            .execute(EnterAlternateScreen)
            .context("enter alternate screen")?;
        stdout.execute(cursor::Hide).context("hide cursor")?;
        let mut terminal =
            Terminal::new(CrosstermBackend::new(stdout)).context("create terminal")?;
        terminal.clear().context("clear terminal")?;
        debug!("terminal session opened");
        Ok(Self {
            terminal,
            frames: 0,
            open: true,
        })
    }

    /// Draw the current workflow view.
    pub(super) fn render(&mut self, app: &mut TuiApp) -> Result<()> {
        self.terminal
            .draw(|frame| draw::draw_ui(frame, app))
            .context("draw frame")?;
        self.frames += 1;
        Ok(())
    }

    pub(super) fn close(mut self) -> Result<()> {
        self.restore()?;
        debug!(frames = self.frames, "terminal session closed");
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.terminal.show_cursor().context("show cursor")?;
        io::stdout()
            .execute(LeaveAlternateScreen)
            .context("leave alternate screen")?;
        terminal::disable_raw_mode().context("disable raw mode")?;
        Ok(())
    }
}

impl Drop for AppTerminal {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            warn!(error = %format!("{err:#}"), "terminal restore failed");
        }
    }
}
