#![forbid(unsafe_code)]

//! The event-note text protocol.
//!
//! Each externally represented shift stores three newline-separated fields
//! in the calendar event's free-text notes:
//!
//! ```text
//! ShiftType ID: 3f2c9a6e-...-d41b
//! Managed by Rota
//! Early shift at Main Office
//! ```
//!
//! Round-trip mapping from an external event back to its shift type depends
//! on the first line matching the `ShiftType ID: ` prefix. An event without
//! such a line is not recognized as app-owned and is excluded from fetch
//! results. Parsing scans all lines and takes the first match, so notes
//! that were reordered or extended by another calendar client still map.

use uuid::Uuid;

use crate::shift::ShiftType;

/// Prefix of the line carrying the owning shift type's id.
pub const SHIFT_TYPE_ID_PREFIX: &str = "ShiftType ID: ";

/// Marker line identifying an event as created by this app.
pub const APP_MARKER: &str = "Managed by Rota";

/// Compose the notes text for an event backing the given shift type.
#[must_use]
pub fn compose(shift_type: &ShiftType) -> String {
    format!(
        "{}{}\n{}\n{} at {}",
        SHIFT_TYPE_ID_PREFIX,
        shift_type.id,
        APP_MARKER,
        shift_type.title,
        shift_type.location.name
    )
}

/// Extract the owning shift type id from an event's notes.
///
/// Returns the id parsed from the first `ShiftType ID: ` line, or `None`
/// when no line matches (the event is not app-owned) or the id text is not
/// a valid UUID.
#[must_use]
pub fn parse_shift_type_id(notes: &str) -> Option<Uuid> {
    notes
        .lines()
        .find_map(|line| line.strip_prefix(SHIFT_TYPE_ID_PREFIX))
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
}

/// Whether the notes identify an app-owned event.
#[must_use]
pub fn is_app_owned(notes: &str) -> bool {
    parse_shift_type_id(notes).is_some()
}

/// Prefix of the optional sick-day marker line.
///
/// The marker is an extension beyond the three protocol fields: absent for
/// a normal shift, one `Sick: <reason>` line (reason may be empty) while
/// the day is marked.
pub const SICK_PREFIX: &str = "Sick: ";

/// Append a sick marker, replacing any existing one.
#[must_use]
pub fn mark_sick(notes: &str, reason: Option<&str>) -> String {
    let mut cleared = clear_sick(notes);
    if !cleared.is_empty() {
        cleared.push('\n');
    }
    cleared.push_str(SICK_PREFIX);
    cleared.push_str(reason.unwrap_or_default());
    cleared
}

/// Remove the sick marker, keeping every other line intact.
#[must_use]
pub fn clear_sick(notes: &str) -> String {
    notes
        .lines()
        .filter(|line| !line.starts_with(SICK_PREFIX.trim_end()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether the notes carry a sick marker.
#[must_use]
pub fn is_sick(notes: &str) -> bool {
    notes.lines().any(|line| line.starts_with(SICK_PREFIX.trim_end()))
}

/// The sick reason, if the marker carries a non-empty one.
#[must_use]
pub fn sick_reason(notes: &str) -> Option<String> {
    notes
        .lines()
        .find_map(|line| line.strip_prefix(SICK_PREFIX))
        .map(str::trim)
        .filter(|reason| !reason.is_empty())
        .map(ToString::to_string)
}

// ============================================================================
// Tests
// ============================================================================
