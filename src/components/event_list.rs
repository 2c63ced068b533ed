use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::list::{EventFilter, ListController};
use crate::theme;

pub struct EventList;

impl EventList {
    pub fn render(frame: &mut Frame, area: Rect, list: &ListController, selected: usize) {
        let events = list.events();

        let title = match list.filter() {
            EventFilter::Upcoming => " Upcoming Events ",
            EventFilter::All => " All Events ",
        };

        let footer = if list.is_loading_more() {
            " loading more... ".to_string()
        } else if !events.is_empty() {
            let n = events.len();
            let more = if list.has_more() { ", more below" } else { "" };
            format!(" {} event{}{} ", n, if n == 1 { "" } else { "s" }, more)
        } else {
            String::new()
        };

        let block = Block::default()
            .title(title)
            .title_style(theme::current().header)
            .title_bottom(Line::from(Span::styled(footer, theme::current().dim)))
            .borders(Borders::ALL)
            .border_style(theme::current().border);

        if list.is_loading() && events.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let msg = Paragraph::new("Loading events...").style(theme::current().dim);
            frame.render_widget(msg, inner);
            return;
        }

        if events.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let msg = if list.error().is_some() {
                Paragraph::new("Failed to load events. Press r to retry.")
                    .style(theme::current().error)
            } else {
                let what = match list.filter() {
                    EventFilter::Upcoming => "No upcoming events",
                    EventFilter::All => "No events",
                };
                Paragraph::new(format!("{what}. Press n to add one.")).style(theme::current().dim)
            };
            frame.render_widget(msg, inner);
            return;
        }

        let items: Vec<ListItem> = events.iter().map(|ev| format_row(list, ev)).collect();

        let widget = List::new(items)
            .block(block)
            .highlight_style(theme::current().selected);
        let mut state = ListState::default().with_selected(Some(selected.min(events.len() - 1)));
        frame.render_stateful_widget(widget, area, &mut state);
    }
}

fn format_row(list: &ListController, ev: &crate::api::Event) -> ListItem<'static> {
    let time_span = Span::styled(
        format!(" {} ", ev.time_display()),
        theme::current().dim,
    );

    let mut title_style = ratatui::style::Style::default();
    if list.is_pending(&ev.id) {
        title_style = theme::current().pending;
        if list.is_pending_add(&ev.id) {
            title_style = title_style.add_modifier(Modifier::ITALIC);
        }
        if list.is_pending_delete(&ev.id) {
            title_style = title_style.add_modifier(Modifier::CROSSED_OUT);
        }
    }
    let title_span = Span::styled(ev.title.clone(), title_style);

    let mut spans = vec![time_span, title_span];
    if list.is_pending_delete(&ev.id) {
        spans.push(Span::styled(" (deleting)", theme::current().dim));
    } else if list.is_pending_add(&ev.id) {
        spans.push(Span::styled(" (saving)", theme::current().dim));
    }

    ListItem::new(Line::from(spans))
}
