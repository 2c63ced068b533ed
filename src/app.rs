use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::{ApiError, CreateEvent, Event, EventGateway, ListPage, UpdateEvent};
use crate::components::event_form::{EventFormState, FormMode};
use crate::list::{FetchPlan, FetchSnapshot, ListController};
use crate::notify::ReminderSchedule;

/// Selection this close to the end of the list triggers the next page.
const LOAD_MORE_THRESHOLD: usize = 3;

/// Completed gateway calls, reported back from spawned tasks and drained by
/// the UI loop between frames.
pub enum Completion {
    Page {
        snapshot: FetchSnapshot,
        result: Result<ListPage, ApiError>,
    },
    AddDone {
        temp_id: String,
        result: Result<Event, ApiError>,
    },
    DeleteDone {
        id: String,
        result: Result<(), ApiError>,
    },
    UpdateDone {
        result: Result<Event, ApiError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Form,
}

pub struct App {
    pub running: bool,
    pub list: ListController,
    pub selected: usize,
    pub form_state: Option<EventFormState>,
    pub show_help: bool,
    pub status_message: Option<String>,
    gateway: Arc<dyn EventGateway>,
    tx: UnboundedSender<Completion>,
    rx: UnboundedReceiver<Completion>,
    reminders: ReminderSchedule,
}

impl App {
    pub fn new(gateway: Arc<dyn EventGateway>, user_id: String) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut app = Self {
            running: true,
            list: ListController::new(user_id),
            selected: 0,
            form_state: None,
            show_help: false,
            status_message: None,
            gateway,
            tx,
            rx,
            reminders: ReminderSchedule::default(),
        };
        app.reload();
        app
    }

    pub fn input_mode(&self) -> InputMode {
        if self.form_state.is_some() {
            InputMode::Form
        } else {
            InputMode::Normal
        }
    }

    pub fn reload(&mut self) {
        let plan = self.list.reload();
        self.selected = 0;
        self.spawn_fetch(plan);
    }

    pub fn toggle_filter(&mut self) {
        if let Some(plan) = self.list.set_filter(self.list.filter().toggled()) {
            self.selected = 0;
            self.spawn_fetch(plan);
        }
    }

    pub fn toggle_sort(&mut self) {
        self.list.set_sort(self.list.sort().toggled());
    }

    pub fn select_next(&mut self) {
        let len = self.list.events().len();
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
        self.maybe_load_more();
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_event(&self) -> Option<&Event> {
        self.list.events().get(self.selected)
    }

    fn maybe_load_more(&mut self) {
        let len = self.list.events().len();
        if len == 0 || self.selected + LOAD_MORE_THRESHOLD < len {
            return;
        }
        if let Some(plan) = self.list.load_more() {
            self.spawn_fetch(plan);
        }
    }

    // ── Forms ──

    pub fn open_event_form(&mut self) {
        self.form_state = Some(EventFormState::new(Local::now().date_naive()));
    }

    /// Open the edit form for the selected event. Pending entries are not
    /// editable: their server id is unresolved.
    pub fn open_edit_form(&mut self) {
        let Some(event) = self.selected_event() else {
            return;
        };
        if self.list.is_pending(&event.id) {
            self.status_message = Some("Event is still syncing".to_string());
            return;
        }
        self.form_state = Some(EventFormState::edit(
            event.id.clone(),
            &event.title,
            event.event_time,
        ));
    }

    pub fn close_event_form(&mut self) {
        self.form_state = None;
    }

    pub fn submit_event_form(&mut self) {
        let Some(form) = self.form_state.clone() else {
            return;
        };
        // Client-side validation blocks submission before any request.
        if !form.is_valid() {
            self.status_message =
                Some("A title, date (YYYY-MM-DD) and time (HH:MM) are required".to_string());
            return;
        }
        let Some(event_time) = form.parsed_event_time() else {
            return;
        };

        match form.mode {
            FormMode::Create => self.add_event(form.title.trim().to_string(), event_time),
            FormMode::Edit { id } => {
                self.update_event(id, form.title.trim().to_string(), event_time)
            }
        }
        self.form_state = None;
    }

    pub fn form_tab(&mut self) {
        if let Some(form) = self.form_state.as_mut() {
            form.active_field = form.active_field.next();
        }
    }

    pub fn form_backtab(&mut self) {
        if let Some(form) = self.form_state.as_mut() {
            form.active_field = form.active_field.prev();
        }
    }

    pub fn form_input_char(&mut self, c: char) {
        if let Some(form) = self.form_state.as_mut() {
            form.input_char(c);
        }
    }

    pub fn form_backspace(&mut self) {
        if let Some(form) = self.form_state.as_mut() {
            form.backspace();
        }
    }

    // ── Intents ──

    pub fn add_event(&mut self, title: String, event_time: DateTime<Utc>) {
        let temp = self.list.begin_add(title.clone(), event_time, 0, Utc::now());
        let req = CreateEvent {
            user_id: temp.user_id.clone(),
            title,
            event_time,
        };
        let gateway = self.gateway.clone();
        let tx = self.tx.clone();
        let temp_id = temp.id;
        tokio::spawn(async move {
            let result = gateway.create(&req).await;
            let _ = tx.send(Completion::AddDone { temp_id, result });
        });
    }

    pub fn delete_selected(&mut self) {
        let Some(event) = self.selected_event() else {
            return;
        };
        let id = event.id.clone();
        if self.list.is_pending(&id) {
            self.status_message = Some("Event is still syncing".to_string());
            return;
        }
        if !self.list.request_delete(&id) {
            return;
        }
        let gateway = self.gateway.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = gateway.delete(&id).await;
            let _ = tx.send(Completion::DeleteDone { id, result });
        });
    }

    pub fn update_event(&mut self, id: String, title: String, event_time: DateTime<Utc>) {
        let patch = UpdateEvent {
            title: Some(title),
            event_time: Some(event_time),
        };
        let gateway = self.gateway.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = gateway.update(&id, &patch).await;
            let _ = tx.send(Completion::UpdateDone { result });
        });
    }

    fn spawn_fetch(&self, plan: FetchPlan) {
        let gateway = self.gateway.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = gateway.list(&plan.params).await;
            let _ = tx.send(Completion::Page {
                snapshot: plan.snapshot,
                result,
            });
        });
    }

    // ── Completions ──

    pub fn drain_completions(&mut self) {
        while let Ok(completion) = self.rx.try_recv() {
            self.apply(completion);
        }
        self.clamp_selection();
    }

    fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Page { snapshot, result } => {
                let failed = result.is_err();
                self.list.apply_list_result(&snapshot, result);
                if failed {
                    if let Some(err) = self.list.error() {
                        self.status_message = Some(format!("Failed to load events: {err}"));
                    }
                }
            }
            Completion::AddDone { temp_id, result } => match result {
                Ok(event) => {
                    self.list.confirm_add(&temp_id, event);
                    self.status_message = Some("Event added".to_string());
                    // Full refresh replaces the temp entry with server truth.
                    let plan = self.list.reload();
                    self.spawn_fetch(plan);
                }
                Err(err) => {
                    self.list.fail_add(&temp_id);
                    self.status_message = Some(format!("Failed to add event: {err}"));
                }
            },
            Completion::DeleteDone { id, result } => match result {
                Ok(()) => {
                    self.list.confirm_delete(&id);
                    self.status_message = Some("Event deleted".to_string());
                }
                Err(err) => {
                    self.list.fail_delete(&id);
                    self.status_message = Some(format!("Failed to delete event: {err}"));
                }
            },
            Completion::UpdateDone { result } => match result {
                Ok(_) => {
                    self.status_message = Some("Event updated".to_string());
                    let plan = self.list.reload();
                    self.spawn_fetch(plan);
                }
                Err(err) => {
                    self.status_message = Some(format!("Failed to update event: {err}"));
                }
            },
        }
    }

    pub fn tick_reminders(&mut self) {
        for notice in self.reminders.due(self.list.events(), Utc::now()) {
            self.status_message = Some(notice);
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.list.events().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}
