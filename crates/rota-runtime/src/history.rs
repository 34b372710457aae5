#![forbid(unsafe_code)]

//! Undo/redo command history over shift mutations.
//!
//! Dual stacks of [`ChangeLogEntry`], most recent at the back. A new
//! command pushes onto the undo stack and clears the redo stack; `undo`
//! executes the entry's inverse and moves it to the redo stack; `redo`
//! mirrors. A failed inverse puts the entry back where it came from — both
//! stacks end up exactly as before the call, so the caller can retry.
//!
//! Entries carry everything their inverse needs: the mutation kind, the
//! day, and shift-type snapshots (with ids). Inverse operations address
//! the calendar by `(day, shift type)` rather than by event id, because
//! re-creating a deleted shift mints a new event id.
//!
//! Both stacks are persisted through the record store on every push and
//! pop and restored when the history is opened, before any new command is
//! accepted. Undo/redo themselves append `Undo`/`Redo` audit entries to
//! the change log; those never land on a stack.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::executor::{EventRef, ScheduleExecutor};
use rota_core::{
    ChangeKind, ChangeLogEntry, HistoryError, PersistenceError, ScheduleError, ShiftSnapshot,
    ShiftType, UserProfile,
};
use rota_sync::{ChangeLogStore, RecordStore};

const HISTORY_DOC: &str = "history";

/// Configuration for the command history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of entries kept on the undo stack; the oldest are
    /// evicted past it.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

/// A reversible shift mutation: the forward operation plus the data its
/// inverse needs (the original shift-type snapshot).
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleCommand {
    Create {
        shift_type: ShiftType,
        date: chrono::NaiveDate,
    },
    Switch {
        event_id: String,
        date: chrono::NaiveDate,
        from: ShiftType,
        to: ShiftType,
        reason: Option<String>,
    },
    Delete {
        event_id: String,
        date: chrono::NaiveDate,
        shift_type: ShiftType,
    },
    MarkSick {
        event_id: String,
        date: chrono::NaiveDate,
        shift_type: ShiftType,
        reason: Option<String>,
    },
    UnmarkSick {
        event_id: String,
        date: chrono::NaiveDate,
        shift_type: ShiftType,
    },
}

/// Collaborators a history operation works against.
pub struct HistoryContext<'a> {
    pub executor: &'a ScheduleExecutor,
    pub change_log: &'a ChangeLogStore,
    pub user: &'a UserProfile,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedHistory {
    undo: Vec<ChangeLogEntry>,
    redo: Vec<ChangeLogEntry>,
}

/// The undo/redo manager.
pub struct CommandHistory {
    undo_stack: VecDeque<ChangeLogEntry>,
    redo_stack: VecDeque<ChangeLogEntry>,
    config: HistoryConfig,
    store: RecordStore,
}

impl CommandHistory {
    /// Open the history, restoring persisted stacks before any new command
    /// is accepted.
    pub fn open(store: RecordStore, config: HistoryConfig) -> Result<Self, PersistenceError> {
        let mut history = Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            config,
            store,
        };
        history.restore_from_persistence()?;
        Ok(history)
    }

    /// Reload both stacks from the persisted document, discarding whatever
    /// is in memory. Runs automatically at open.
    pub fn restore_from_persistence(&mut self) -> Result<(), PersistenceError> {
        let persisted: PersistedHistory =
            self.store.load_document(HISTORY_DOC)?.unwrap_or_default();
        self.undo_stack = persisted.undo.into();
        self.redo_stack = persisted.redo.into();
        Ok(())
    }

    /// Whether there is anything to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether there is anything to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Undo stack depth.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Redo stack depth.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Drop both stacks. The change log keeps its entries: history is
    /// navigation state, the log is the record.
    pub fn clear(&mut self) -> Result<(), PersistenceError> {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.persist()
    }

    /// Execute a command, record it, and make it undoable.
    ///
    /// The forward operation runs first; only a successful one is logged
    /// and pushed. Pushing clears the redo stack.
    pub fn record_and_apply(
        &mut self,
        command: ScheduleCommand,
        cx: &HistoryContext<'_>,
    ) -> Result<ChangeLogEntry, HistoryError> {
        let entry = apply_command(&command, cx)?;
        cx.change_log.append(entry.clone())?;

        self.undo_stack.push_back(entry.clone());
        self.redo_stack.clear();
        while self.undo_stack.len() > self.config.max_depth {
            self.undo_stack.pop_front();
        }
        self.persist()?;

        tracing::debug!(
            target: "rota.history",
            kind = ?entry.kind,
            date = %entry.shift_date,
            undo_depth = self.undo_stack.len(),
            "command recorded"
        );
        Ok(entry)
    }

    /// Undo the most recent command. Returns the `Undo` audit entry.
    ///
    /// A failed inverse leaves both stacks unchanged and surfaces the
    /// failure; the caller can retry.
    pub fn undo(&mut self, cx: &HistoryContext<'_>) -> Result<ChangeLogEntry, HistoryError> {
        let entry = self.undo_stack.pop_back().ok_or(HistoryError::NothingToUndo)?;
        if let Err(err) = apply_inverse(&entry, cx) {
            self.undo_stack.push_back(entry);
            return Err(err.into());
        }

        let audit = ChangeLogEntry::new(
            cx.user,
            ChangeKind::Undo,
            entry.shift_date,
            entry.new.clone(),
            entry.old.clone(),
            None,
        );
        self.redo_stack.push_back(entry);
        self.persist()?;
        cx.change_log.append(audit.clone())?;

        tracing::debug!(
            target: "rota.history",
            redo_depth = self.redo_stack.len(),
            "undo applied"
        );
        Ok(audit)
    }

    /// Redo the most recently undone command. Returns the `Redo` audit
    /// entry. Mirror of [`undo`](Self::undo).
    pub fn redo(&mut self, cx: &HistoryContext<'_>) -> Result<ChangeLogEntry, HistoryError> {
        let entry = self.redo_stack.pop_back().ok_or(HistoryError::NothingToRedo)?;
        if let Err(err) = apply_forward(&entry, cx) {
            self.redo_stack.push_back(entry);
            return Err(err.into());
        }

        let audit = ChangeLogEntry::new(
            cx.user,
            ChangeKind::Redo,
            entry.shift_date,
            entry.old.clone(),
            entry.new.clone(),
            None,
        );
        self.undo_stack.push_back(entry);
        self.persist()?;
        cx.change_log.append(audit.clone())?;

        tracing::debug!(
            target: "rota.history",
            undo_depth = self.undo_stack.len(),
            "redo applied"
        );
        Ok(audit)
    }

    fn persist(&self) -> Result<(), PersistenceError> {
        let doc = PersistedHistory {
            undo: self.undo_stack.iter().cloned().collect(),
            redo: self.redo_stack.iter().cloned().collect(),
        };
        self.store.save_document(HISTORY_DOC, &doc)
    }
}

/// Execute the forward operation of a fresh command and build its entry.
fn apply_command(
    command: &ScheduleCommand,
    cx: &HistoryContext<'_>,
) -> Result<ChangeLogEntry, ScheduleError> {
    let (kind, date, old, new, reason) = match command {
        ScheduleCommand::Create { shift_type, date } => {
            cx.executor.create_shift(shift_type, *date)?;
            (
                ChangeKind::Created,
                *date,
                None,
                Some(ShiftSnapshot::of(shift_type)),
                None,
            )
        }
        ScheduleCommand::Switch {
            event_id,
            date,
            from,
            to,
            reason,
        } => {
            cx.executor
                .switch_shift(&EventRef::Id(event_id.clone()), *date, to)?;
            (
                ChangeKind::Switched,
                *date,
                Some(ShiftSnapshot::of(from)),
                Some(ShiftSnapshot::of(to)),
                reason.clone(),
            )
        }
        ScheduleCommand::Delete {
            event_id,
            date,
            shift_type,
        } => {
            cx.executor
                .delete_shift(&EventRef::Id(event_id.clone()), *date)?;
            (
                ChangeKind::Deleted,
                *date,
                Some(ShiftSnapshot::of(shift_type)),
                None,
                None,
            )
        }
        ScheduleCommand::MarkSick {
            event_id,
            date,
            shift_type,
            reason,
        } => {
            cx.executor
                .mark_sick(&EventRef::Id(event_id.clone()), *date, reason.as_deref())?;
            let snap = ShiftSnapshot::of(shift_type);
            (
                ChangeKind::MarkedAsSick,
                *date,
                Some(snap.clone()),
                Some(snap),
                reason.clone(),
            )
        }
        ScheduleCommand::UnmarkSick {
            event_id,
            date,
            shift_type,
        } => {
            cx.executor
                .unmark_sick(&EventRef::Id(event_id.clone()), *date)?;
            let snap = ShiftSnapshot::of(shift_type);
            (
                ChangeKind::UnmarkedAsSick,
                *date,
                Some(snap.clone()),
                Some(snap),
                None,
            )
        }
    };
    Ok(ChangeLogEntry::new(cx.user, kind, date, old, new, reason))
}

/// Execute the inverse of a recorded entry.
fn apply_inverse(entry: &ChangeLogEntry, cx: &HistoryContext<'_>) -> Result<(), ScheduleError> {
    match entry.kind {
        ChangeKind::Created => {
            let created = required(entry.new.as_ref())?;
            cx.executor
                .delete_shift(&EventRef::ByType(created.shift_type_id), entry.shift_date)
        }
        ChangeKind::Switched => {
            let old = required(entry.old.as_ref())?;
            let new = required(entry.new.as_ref())?;
            let from_type = cx.executor.shift_type(old.shift_type_id)?;
            cx.executor.switch_shift(
                &EventRef::ByType(new.shift_type_id),
                entry.shift_date,
                &from_type,
            )
        }
        ChangeKind::Deleted => {
            let deleted = required(entry.old.as_ref())?;
            let shift_type = cx.executor.shift_type(deleted.shift_type_id)?;
            cx.executor
                .create_shift(&shift_type, entry.shift_date)
                .map(|_| ())
        }
        ChangeKind::MarkedAsSick => {
            let snap = required(entry.new.as_ref())?;
            cx.executor
                .unmark_sick(&EventRef::ByType(snap.shift_type_id), entry.shift_date)
        }
        ChangeKind::UnmarkedAsSick => {
            let snap = required(entry.new.as_ref())?;
            cx.executor.mark_sick(
                &EventRef::ByType(snap.shift_type_id),
                entry.shift_date,
                entry.reason.as_deref(),
            )
        }
        // Audit entries never sit on a stack.
        ChangeKind::Undo | ChangeKind::Redo => Err(ScheduleError::SaveFailed(
            "audit entries are not reversible".into(),
        )),
    }
}

/// Re-execute the forward operation of a recorded entry (redo path).
fn apply_forward(entry: &ChangeLogEntry, cx: &HistoryContext<'_>) -> Result<(), ScheduleError> {
    match entry.kind {
        ChangeKind::Created => {
            let created = required(entry.new.as_ref())?;
            let shift_type = cx.executor.shift_type(created.shift_type_id)?;
            cx.executor
                .create_shift(&shift_type, entry.shift_date)
                .map(|_| ())
        }
        ChangeKind::Switched => {
            let old = required(entry.old.as_ref())?;
            let new = required(entry.new.as_ref())?;
            let to_type = cx.executor.shift_type(new.shift_type_id)?;
            cx.executor.switch_shift(
                &EventRef::ByType(old.shift_type_id),
                entry.shift_date,
                &to_type,
            )
        }
        ChangeKind::Deleted => {
            let deleted = required(entry.old.as_ref())?;
            cx.executor
                .delete_shift(&EventRef::ByType(deleted.shift_type_id), entry.shift_date)
        }
        ChangeKind::MarkedAsSick => {
            let snap = required(entry.new.as_ref())?;
            cx.executor.mark_sick(
                &EventRef::ByType(snap.shift_type_id),
                entry.shift_date,
                entry.reason.as_deref(),
            )
        }
        ChangeKind::UnmarkedAsSick => {
            let snap = required(entry.new.as_ref())?;
            cx.executor
                .unmark_sick(&EventRef::ByType(snap.shift_type_id), entry.shift_date)
        }
        ChangeKind::Undo | ChangeKind::Redo => Err(ScheduleError::SaveFailed(
            "audit entries are not reversible".into(),
        )),
    }
}

fn required(snapshot: Option<&ShiftSnapshot>) -> Result<&ShiftSnapshot, ScheduleError> {
    snapshot.ok_or_else(|| ScheduleError::SaveFailed("change-log entry missing snapshot".into()))
}

// ============================================================================
// Tests
// ============================================================================
