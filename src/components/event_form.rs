use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormField {
    Title,
    Date,
    Time,
}

impl FormField {
    pub fn next(&self) -> Self {
        match self {
            FormField::Title => FormField::Date,
            FormField::Date => FormField::Time,
            FormField::Time => FormField::Title,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FormField::Title => FormField::Time,
            FormField::Date => FormField::Title,
            FormField::Time => FormField::Date,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Create,
    Edit { id: String },
}

#[derive(Debug, Clone)]
pub struct EventFormState {
    pub mode: FormMode,
    pub title: String,
    pub date: String,
    pub time: String,
    pub active_field: FormField,
}

impl EventFormState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            mode: FormMode::Create,
            title: String::new(),
            date: date.format("%Y-%m-%d").to_string(),
            time: "09:00".to_string(),
            active_field: FormField::Title,
        }
    }

    /// Prefill from an existing event for editing.
    pub fn edit(id: String, title: &str, event_time: DateTime<Utc>) -> Self {
        let local = event_time.with_timezone(&Local);
        Self {
            mode: FormMode::Edit { id },
            title: title.to_string(),
            date: local.format("%Y-%m-%d").to_string(),
            time: local.format("%H:%M").to_string(),
            active_field: FormField::Title,
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }

    pub fn parsed_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.time, "%H:%M").ok()
    }

    /// Date and time combined, interpreted in the local timezone.
    pub fn parsed_event_time(&self) -> Option<DateTime<Utc>> {
        let naive = self.parsed_date()?.and_time(self.parsed_time()?);
        Local
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn input_char(&mut self, c: char) {
        match self.active_field {
            FormField::Title => self.title.push(c),
            FormField::Date => self.date.push(c),
            FormField::Time => self.time.push(c),
        }
    }

    pub fn backspace(&mut self) {
        match self.active_field {
            FormField::Title => {
                self.title.pop();
            }
            FormField::Date => {
                self.date.pop();
            }
            FormField::Time => {
                self.time.pop();
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && self.parsed_event_time().is_some()
    }
}

pub struct EventForm;

impl EventForm {
    pub fn render(frame: &mut Frame, area: Rect, state: &EventFormState) {
        // Center the form popup
        let form_w = area.width.min(46).max(28);
        let form_h = area.height.min(10).max(8);
        let x = area.x + (area.width.saturating_sub(form_w)) / 2;
        let y = area.y + (area.height.saturating_sub(form_h)) / 2;
        let form_area = Rect::new(x, y, form_w, form_h);

        // Clear background
        frame.render_widget(Clear, form_area);

        let title = match state.mode {
            FormMode::Create => " New Event ",
            FormMode::Edit { .. } => " Edit Event ",
        };
        let accent = theme::current().accent;
        let block = Block::default()
            .title(title)
            .title_style(accent.add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_style(accent);

        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let rows = Layout::vertical([
            Constraint::Length(1), // title
            Constraint::Length(1), // date
            Constraint::Length(1), // time
            Constraint::Length(1), // spacer
            Constraint::Length(1), // help
            Constraint::Min(0),
        ])
        .split(inner);

        render_field(frame, rows[0], "Title:", &state.title, state.active_field == FormField::Title);
        render_field(frame, rows[1], "Date:", &state.date, state.active_field == FormField::Date);
        render_field(frame, rows[2], "Time:", &state.time, state.active_field == FormField::Time);

        let help = Line::from(vec![
            Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Next ", theme::current().dim),
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Save ", theme::current().dim),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Cancel", theme::current().dim),
        ]);
        frame.render_widget(Paragraph::new(help), rows[4]);
    }
}

fn render_field(frame: &mut Frame, area: Rect, label: &str, value: &str, active: bool) {
    let cursor = if active { "_" } else { "" };
    let style = if active {
        Style::default().fg(ratatui::style::Color::Cyan)
    } else {
        Style::default()
    };

    let spans = vec![
        Span::styled(format!("{:<7}", label), theme::current().dim),
        Span::styled(format!("{}{}", value, cursor), style),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_title_is_invalid() {
        let mut form = EventFormState::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(!form.is_valid());
        form.title = "dentist".to_string();
        assert!(form.is_valid());
    }

    #[test]
    fn malformed_date_or_time_is_invalid() {
        let mut form = EventFormState::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        form.title = "dentist".to_string();
        form.date = "01/01/2024".to_string();
        assert!(!form.is_valid());

        form.date = "2024-01-01".to_string();
        form.time = "9am".to_string();
        assert!(!form.is_valid());
    }

    #[test]
    fn edit_prefills_from_the_event() {
        let form = EventFormState::edit(
            "7".to_string(),
            "dentist",
            "2024-06-01T10:00:00Z".parse().unwrap(),
        );
        assert_eq!(form.mode, FormMode::Edit { id: "7".to_string() });
        assert_eq!(form.title, "dentist");
        assert!(form.is_valid());
    }
}
