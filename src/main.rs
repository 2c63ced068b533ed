mod api;
mod app;
mod components;
mod config;
mod identity;
mod input;
mod list;
mod notify;
mod theme;
mod tui;

use std::sync::Arc;
use std::time::Duration;

use app::{App, InputMode};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};

use crate::list::SortDirection;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let config = config::AppConfig::load();
    let user_id = config.user_id.clone().unwrap_or_else(identity::device_id);
    tracing::debug!(%user_id, server_url = %config.server_url, "starting");

    let gateway = Arc::new(api::HttpGateway::new(config.server_url.clone()));
    let mut app = App::new(gateway, user_id);

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app);
    tui::restore()?;
    result
}

/// Log to a file under the data dir so the alternate screen stays clean.
/// Controlled by RUST_LOG; silent when unset.
fn init_tracing() {
    let Some(dir) = config::data_dir() else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::File::create(dir.join("reminder-tui.log")) else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
}

fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    while app.running {
        app.drain_completions();
        app.tick_reminders();

        terminal.draw(|frame| {
            let area = frame.area();

            // Main layout: list + status bar
            let layout = Layout::vertical([
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);

            components::EventList::render(frame, layout[0], &app.list, app.selected);

            // Form overlay
            if let Some(ref form) = app.form_state {
                components::EventForm::render(frame, area, form);
            }

            // Help overlay
            if app.show_help {
                render_help(frame, area);
            }

            render_status_bar(frame, layout[1], app, area.width);
        })?;

        if let Some(key) = input::next_key_event(Duration::from_millis(100))? {
            // Clear status message on any key
            app.status_message = None;

            // Help overlay takes priority
            if app.show_help {
                if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
                    app.show_help = false;
                }
                continue;
            }

            match app.input_mode() {
                InputMode::Form => handle_form_input(app, key.code),
                InputMode::Normal => handle_normal_input(app, key.code, key.modifiers),
            }
        }
    }

    Ok(())
}

fn handle_normal_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.running = false;
        }
        (KeyCode::Char('f'), _) => app.toggle_filter(),
        (KeyCode::Char('s'), _) => app.toggle_sort(),
        (KeyCode::Char('r'), _) => app.reload(),
        (KeyCode::Char('n'), _) => app.open_event_form(),
        (KeyCode::Char('d'), _) => app.delete_selected(),
        (KeyCode::Enter, _) => app.open_edit_form(),
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => app.select_prev(),
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => app.select_next(),
        (KeyCode::Char('?'), _) => app.show_help = true,
        _ => {}
    }
}

fn handle_form_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.close_event_form(),
        KeyCode::Enter => app.submit_event_form(),
        KeyCode::Tab => app.form_tab(),
        KeyCode::BackTab => app.form_backtab(),
        KeyCode::Backspace => app.form_backspace(),
        KeyCode::Char(c) => app.form_input_char(c),
        _ => {}
    }
}

fn render_status_bar(frame: &mut ratatui::Frame, area: Rect, app: &App, w: u16) {
    use ratatui::text::{Line, Span};
    use ratatui::widgets::Paragraph;

    let w = w as usize;

    let filter_str = match app.list.filter() {
        list::EventFilter::Upcoming => "[f]Upcoming",
        list::EventFilter::All => "[f]All",
    };
    let sort_str = match app.list.sort() {
        SortDirection::Asc => "[s]asc",
        SortDirection::Desc => "[s]desc",
    };
    let activity = if app.list.is_loading() {
        " loading..."
    } else if app.list.is_loading_more() {
        " more..."
    } else {
        ""
    };

    // Show status message if present, otherwise show context-aware hints
    let right_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if app.form_state.is_some() {
        " Tab:Next Enter:Save Esc:Cancel".to_string()
    } else if w >= 80 {
        " jk:Nav Enter:Edit n:New d:Del f:Filter s:Sort r:Reload ?:Help q:Quit".to_string()
    } else if w >= 50 {
        " jk:Nav n:New d:Del r:Reload q:Quit".to_string()
    } else {
        " ?:Help q:Quit".to_string()
    };

    let left = format!(" {} {}{} ", filter_str, sort_str, activity);
    let padding_len = w.saturating_sub(left.len() + right_text.len());
    let padding = " ".repeat(padding_len);

    let status = theme::current().status;
    let line = Line::from(vec![
        Span::styled(left, status),
        Span::styled(padding, status),
        Span::styled(right_text, status),
    ]);

    let bar = Paragraph::new(line).style(status);
    frame.render_widget(bar, area);
}

fn render_help(frame: &mut ratatui::Frame, area: Rect) {
    use ratatui::style::{Color, Modifier, Style};
    use ratatui::text::{Line, Span};
    use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

    let popup_w = area.width.min(46).max(30);
    let popup_h = area.height.min(18).max(12);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Keybindings ")
        .title_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let desc_style = Style::default();
    let section_style = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let lines = vec![
        Line::from(Span::styled("List", section_style)),
        Line::from(vec![
            Span::styled("  j/k ", key_style),
            Span::styled("or ", theme::DIM_STYLE),
            Span::styled("\u{2191}/\u{2193}  ", key_style),
            Span::styled("Move selection", desc_style),
        ]),
        Line::from(vec![
            Span::styled("  f         ", key_style),
            Span::styled("Upcoming / all events", desc_style),
        ]),
        Line::from(vec![
            Span::styled("  s         ", key_style),
            Span::styled("Sort ascending / descending", desc_style),
        ]),
        Line::from(vec![
            Span::styled("  r         ", key_style),
            Span::styled("Reload from server", desc_style),
        ]),
        Line::from(""),
        Line::from(Span::styled("Events", section_style)),
        Line::from(vec![
            Span::styled("  n         ", key_style),
            Span::styled("Create new event", desc_style),
        ]),
        Line::from(vec![
            Span::styled("  Enter     ", key_style),
            Span::styled("Edit selected event", desc_style),
        ]),
        Line::from(vec![
            Span::styled("  d         ", key_style),
            Span::styled("Delete selected event", desc_style),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  q", key_style),
            Span::styled(" / ", theme::DIM_STYLE),
            Span::styled("Esc     ", key_style),
            Span::styled("Quit / close popup", desc_style),
        ]),
    ];

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}
