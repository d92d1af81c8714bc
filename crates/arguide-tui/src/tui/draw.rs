/*
[INPUT]:  TuiApp (FrontendUi view state, selector, status, log buffer)
[OUTPUT]: Ratatui frame with header, selector/checklists, feedback, hotkeys, logs
[POS]:    TUI rendering
[UPDATE]: When changing TUI layout or region styling
*/

use arguide_core::{Region, RenderedText};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};

use super::TuiApp;
use super::log_buffer::lock_buffer;

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

pub(super) fn draw_ui(frame: &mut ratatui::Frame, app: &mut TuiApp) {
    let feedback_height = if app.ui.visible_feedback().is_some() {
        4
    } else {
        0
    };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(feedback_height),
            Constraint::Length(4),
            Constraint::Length(8),
        ])
        .split(frame.area());

    draw_header(frame, layout[0], app);
    draw_main(frame, layout[1], app);
    if let Some(text) = app.ui.visible_feedback() {
        draw_feedback(frame, layout[2], text);
    }
    draw_footer(frame, layout[3], app);
    draw_logs(frame, layout[4], app);
}

fn draw_header(frame: &mut ratatui::Frame, area: Rect, app: &TuiApp) {
    let busy = if app.ui.is_busy() {
        let frame_idx = usize::try_from(app.ticks).unwrap_or(0) % SPINNER.len();
        Span::styled(
            format!(" {} working", SPINNER[frame_idx]),
            Style::default().fg(Color::Yellow),
        )
    } else {
        Span::raw("")
    };
    let line = Line::from(vec![
        Span::raw("State: "),
        Span::styled(app.ui.state().label(), header_style()),
        busy,
    ]);
    let widget = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style())
            .title("AR Guide"),
    );
    frame.render_widget(widget, area);
}

fn draw_main(frame: &mut ratatui::Frame, area: Rect, app: &mut TuiApp) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    if app.ui.visibility().is_visible(Region::TaskSelector) {
        draw_selector(frame, columns[0], app);
    } else {
        draw_checklist(frame, columns[0], "Objects", app.ui.object_render());
    }
    draw_checklist(frame, columns[1], "Steps", app.ui.step_render());
}

fn draw_selector(frame: &mut ratatui::Frame, area: Rect, app: &mut TuiApp) {
    let titles = app.ui.task_titles();
    let items = if titles.is_empty() {
        vec![ListItem::new("Waiting for tasks")]
    } else {
        titles.into_iter().map(ListItem::new).collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style())
                .title("Tasks"),
        )
        .highlight_style(
            Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, area, &mut app.selector);
}

fn draw_checklist(frame: &mut ratatui::Frame, area: Rect, title: &str, render: &RenderedText) {
    let lines = render
        .lines()
        .iter()
        .map(|line| {
            let style = if line.completion.is_satisfied() {
                Style::default().fg(Color::LightGreen)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(line.to_string(), style))
        })
        .collect::<Vec<_>>();

    let widget = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style())
                .title(title.to_string()),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(widget, area);
}

fn draw_feedback(frame: &mut ratatui::Frame, area: Rect, text: &str) {
    let widget = Paragraph::new(text.to_string())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style())
                .title("Feedback"),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, area);
}

fn draw_footer(frame: &mut ratatui::Frame, area: Rect, app: &TuiApp) {
    let key_style = Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let visibility = app.ui.visibility();
    let mut keys = Vec::new();
    for (region, key, label) in [
        (Region::TaskSelector, "[Up/Down/Enter]", " Select task  "),
        (Region::StartControl, "[s]", " Start  "),
        (Region::CaptureControl, "[c]", " Capture  "),
        (Region::LocateControl, "[l]", " Locate  "),
        (Region::BackControl, "[b]", " Back  "),
    ] {
        if visibility.is_visible(region) {
            keys.push(Span::styled(key, key_style));
            keys.push(Span::raw(label));
        }
    }
    keys.push(Span::styled("[q]", key_style));
    keys.push(Span::raw(" Quit"));

    let status = Line::from(format!("Status: {}", app.status_message));
    let widget = Paragraph::new(Text::from(vec![Line::from(keys), status]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style())
                .title("Hotkeys"),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, area);
}

fn draw_logs(frame: &mut ratatui::Frame, area: Rect, app: &TuiApp) {
    let available = usize::from(area.height.saturating_sub(2));
    let lines = lock_buffer(&app.log_buffer)
        .tail(available)
        .into_iter()
        .map(Line::from)
        .collect::<Vec<_>>();

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style())
            .title("Logs"),
    );
    frame.render_widget(widget, area);
}

fn border_style() -> Style {
    Style::default().fg(Color::Magenta)
}

fn header_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}
