use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::{DeskError, DeskResult};
use crate::storage::{get_json, put_json, KeyValueStore, KEY_CALENDAR_EVENTS};

/// A user-created calendar entry. Dates travel as RFC 3339 strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub title: String,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub category: Option<String>,
}

impl CalendarEvent {
    fn validate(&self) -> DeskResult<()> {
        if self.title.trim().is_empty() {
            return Err(DeskError::invalid_input("title", "must not be empty"));
        }
        if self.title.chars().count() > 200 {
            return Err(DeskError::invalid_input("title", "length must be <= 200"));
        }
        if let Some(end) = self.end {
            if end < self.start {
                return Err(DeskError::invalid_input("end", "must not precede start"));
            }
        }
        Ok(())
    }

    /// True when the event overlaps `[from, to]`.
    pub fn overlaps(&self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
        let end = self.end.unwrap_or(self.start);
        from.map(|f| end >= f).unwrap_or(true) && to.map(|t| self.start <= t).unwrap_or(true)
    }
}

/// Reads the stored events. Unreadable documents are reported and treated as
/// an empty calendar.
pub fn load_events(store: &dyn KeyValueStore) -> DeskResult<Vec<CalendarEvent>> {
    match get_json::<Vec<CalendarEvent>>(store, KEY_CALENDAR_EVENTS)? {
        None => Ok(Vec::new()),
        Some(Ok(mut events)) => {
            events.sort_by_key(|e| e.start);
            Ok(events)
        }
        Some(Err(e)) => {
            let e = DeskError::MalformedPersistedState {
                key: KEY_CALENDAR_EVENTS.into(),
                message: e.to_string(),
            };
            warn!(error = %e, "starting with an empty calendar");
            Ok(Vec::new())
        }
    }
}

fn save_events(store: &dyn KeyValueStore, events: &[CalendarEvent]) -> DeskResult<()> {
    put_json(store, KEY_CALENDAR_EVENTS, events)?;
    Ok(())
}

pub fn list_events(
    store: &dyn KeyValueStore,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> DeskResult<Vec<CalendarEvent>> {
    Ok(load_events(store)?
        .into_iter()
        .filter(|e| e.overlaps(from, to))
        .collect())
}

pub fn create_event(store: &dyn KeyValueStore, draft: EventDraft) -> DeskResult<CalendarEvent> {
    let event = CalendarEvent {
        id: Uuid::new_v4().to_string(),
        title: draft.title.trim().to_string(),
        start: draft.start,
        end: draft.end,
        all_day: draft.all_day,
        category: draft.category,
    };
    event.validate()?;
    let mut events = load_events(store)?;
    events.push(event.clone());
    save_events(store, &events)?;
    Ok(event)
}

pub fn update_event(
    store: &dyn KeyValueStore,
    id: &str,
    patch: &serde_json::Value,
) -> DeskResult<CalendarEvent> {
    let mut events = load_events(store)?;
    let Some(idx) = events.iter().position(|e| e.id == id) else {
        return Err(DeskError::NotFound {
            entity: "event".into(),
            id: id.to_string(),
        });
    };
    let updated = crate::repository::apply_json_patch(&events[idx], patch)?;
    updated.validate()?;
    events[idx] = updated.clone();
    save_events(store, &events)?;
    Ok(updated)
}

pub fn delete_event(store: &dyn KeyValueStore, id: &str) -> DeskResult<()> {
    let mut events = load_events(store)?;
    let before = events.len();
    events.retain(|e| e.id != id);
    if events.len() == before {
        return Err(DeskError::NotFound {
            entity: "event".into(),
            id: id.to_string(),
        });
    }
    save_events(store, &events)
}
