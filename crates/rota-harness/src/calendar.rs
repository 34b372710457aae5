#![forbid(unsafe_code)]

//! Fake calendar collaborator.
//!
//! Events live in a `BTreeMap` keyed by their generated id (`ev-1`,
//! `ev-2`, ...). The fake never retries and never fails on its own;
//! failures come from asking for events that are not there — which is
//! exactly what [`remove_out_of_band`](FakeCalendar::remove_out_of_band)
//! provokes for inverse-failure tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use rota_core::{
    AuthorizationStatus, CalendarError, CalendarEvent, CalendarPort, DateRange, EventUpdate,
};

const APP_CALENDAR_ID: &str = "rota-app-calendar";

/// In-memory [`CalendarPort`].
pub struct FakeCalendar {
    auth: Mutex<AuthorizationStatus>,
    grant_on_request: AtomicBool,
    events: Mutex<BTreeMap<String, CalendarEvent>>,
    next_id: AtomicU64,
}

impl Default for FakeCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCalendar {
    /// Fully authorized, empty calendar.
    #[must_use]
    pub fn new() -> Self {
        Self {
            auth: Mutex::new(AuthorizationStatus::FullAccess),
            grant_on_request: AtomicBool::new(true),
            events: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Override the reported authorization state.
    pub fn set_authorization(&self, status: AuthorizationStatus) {
        *self.auth.lock().expect("calendar auth poisoned") = status;
    }

    /// Whether a future `request_full_access` will be granted.
    pub fn set_grant_on_request(&self, grant: bool) {
        self.grant_on_request.store(grant, Ordering::SeqCst);
    }

    /// Look up an event directly, bypassing the port.
    #[must_use]
    pub fn event(&self, id: &str) -> Option<CalendarEvent> {
        self.events.lock().expect("calendar events poisoned").get(id).cloned()
    }

    /// Number of events currently held.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.lock().expect("calendar events poisoned").len()
    }

    /// Delete an event behind the engine's back, simulating another
    /// calendar client.
    pub fn remove_out_of_band(&self, id: &str) {
        self.events.lock().expect("calendar events poisoned").remove(id);
    }
}

impl CalendarPort for FakeCalendar {
    fn check_authorization_status(&self) -> AuthorizationStatus {
        *self.auth.lock().expect("calendar auth poisoned")
    }

    fn request_full_access(&self) -> Result<bool, CalendarError> {
        if self.grant_on_request.load(Ordering::SeqCst) {
            *self.auth.lock().expect("calendar auth poisoned") = AuthorizationStatus::FullAccess;
            Ok(true)
        } else {
            *self.auth.lock().expect("calendar auth poisoned") = AuthorizationStatus::Denied;
            Ok(false)
        }
    }

    fn get_or_create_app_calendar(&self) -> Result<String, CalendarError> {
        match self.check_authorization_status() {
            AuthorizationStatus::FullAccess => Ok(APP_CALENDAR_ID.to_string()),
            _ => Err(CalendarError::NotAuthorized),
        }
    }

    fn create_event(&self, event: &CalendarEvent) -> Result<String, CalendarError> {
        let id = format!("ev-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut stored = event.clone();
        stored.id = id.clone();
        self.events
            .lock()
            .expect("calendar events poisoned")
            .insert(id.clone(), stored);
        Ok(id)
    }

    fn fetch_events(&self, range: DateRange) -> Result<Vec<CalendarEvent>, CalendarError> {
        Ok(self
            .events
            .lock()
            .expect("calendar events poisoned")
            .values()
            .filter(|event| range.contains(event.date))
            .cloned()
            .collect())
    }

    fn update_event(&self, id: &str, update: &EventUpdate) -> Result<(), CalendarError> {
        let mut events = self.events.lock().expect("calendar events poisoned");
        let event = events
            .get_mut(id)
            .ok_or_else(|| CalendarError::EventNotFound(id.to_string()))?;
        event.title = update.title.clone();
        event.all_day = update.all_day;
        event.start = update.start;
        event.end = update.end;
        event.notes = update.notes.clone();
        Ok(())
    }

    fn delete_event(&self, id: &str) -> Result<(), CalendarError> {
        self.events
            .lock()
            .expect("calendar events poisoned")
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CalendarError::EventNotFound(id.to_string()))
    }
}
