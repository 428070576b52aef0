//! Update actions triggered from the tables view.
//!
//! Each table row carries two controls. A control knows the table it acts
//! on (`data-id`) and its label; the label decides the update mode. The
//! dispatcher turns a pressed control into a `POST /update`, and the outcome
//! relabels every control of that table.

use std::sync::LazyLock;

use regex::Regex;

use crate::api::{ApiError, DashboardClient, TableEntry, UpdateMode, UpdateOutcome};

/// Legacy element ids: `update-tree-<table>` or `update-table-<table>`.
static ELEMENT_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^update-(tree|table)-(\S+)$").expect("element id regex must compile")
});

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

/// Labels a row control can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlLabel {
    UpdateTable,
    UpdateTree,
    Scheduled,
    Running,
    Removed,
}

impl ControlLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UpdateTable => "Update table",
            Self::UpdateTree => "Update tree",
            Self::Scheduled => "Scheduled",
            Self::Running => "Running",
            Self::Removed => "Removed",
        }
    }

    /// Parse a label as shown on screen (case-insensitive).
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "update table" => Some(Self::UpdateTable),
            "update tree" => Some(Self::UpdateTree),
            "scheduled" => Some(Self::Scheduled),
            "running" => Some(Self::Running),
            "removed" => Some(Self::Removed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ControlLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One action control of a table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub data_id: String,
    pub label: ControlLabel,
    pub disabled: bool,
}

impl Control {
    pub fn new(data_id: impl Into<String>, label: ControlLabel, disabled: bool) -> Self {
        Self {
            data_id: data_id.into(),
            label,
            disabled,
        }
    }
}

/// The pair of controls shown for a table, derived from its state flags.
pub fn controls_for(entry: &TableEntry) -> [Control; 2] {
    let id = entry.table_name.as_str();
    if entry.started {
        [
            Control::new(id, ControlLabel::Running, true),
            Control::new(id, ControlLabel::Running, true),
        ]
    } else if entry.deleted {
        [
            Control::new(id, ControlLabel::Removed, true),
            Control::new(id, ControlLabel::Removed, true),
        ]
    } else if entry.force {
        [
            Control::new(id, ControlLabel::Scheduled, false),
            Control::new(id, ControlLabel::UpdateTree, false),
        ]
    } else {
        [
            Control::new(id, ControlLabel::UpdateTable, false),
            Control::new(id, ControlLabel::UpdateTree, false),
        ]
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// A resolved update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAction {
    pub table: String,
    pub mode: UpdateMode,
}

impl UpdateAction {
    /// Resolve a control. Disabled controls yield `None`.
    pub fn from_control(control: &Control) -> Option<Self> {
        if control.disabled {
            return None;
        }
        let mode = match control.label {
            ControlLabel::UpdateTree => UpdateMode::Tree,
            _ => UpdateMode::Table,
        };
        Some(Self {
            table: control.data_id.clone(),
            mode,
        })
    }

    /// Resolve a legacy element id such as `update-tree-first.cities`.
    pub fn from_element_id(id: &str) -> Option<Self> {
        let caps = ELEMENT_ID_RE.captures(id)?;
        let mode = UpdateMode::from_tree_flag(&caps[1] == "tree");
        Some(Self {
            table: caps[2].to_string(),
            mode,
        })
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Something that can queue table updates. Implemented by the HTTP client.
pub trait UpdateSink {
    fn request_update(&self, table: &str, mode: UpdateMode) -> Result<UpdateOutcome, ApiError>;
}

impl UpdateSink for DashboardClient {
    fn request_update(&self, table: &str, mode: UpdateMode) -> Result<UpdateOutcome, ApiError> {
        DashboardClient::request_update(self, table, mode)
    }
}

impl<T: UpdateSink + ?Sized> UpdateSink for &T {
    fn request_update(&self, table: &str, mode: UpdateMode) -> Result<UpdateOutcome, ApiError> {
        (**self).request_update(table, mode)
    }
}

/// Result of pressing a control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The control was disabled; nothing was sent.
    Ignored,
    /// The request reached the server.
    Sent {
        action: UpdateAction,
        outcome: UpdateOutcome,
    },
}

/// Routes pressed controls to the update endpoint.
#[derive(Debug)]
pub struct ActionDispatcher<S> {
    sink: S,
}

impl<S: UpdateSink> ActionDispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Send the update a control asks for.
    pub fn press(&self, control: &Control) -> Result<Dispatch, ApiError> {
        match UpdateAction::from_control(control) {
            Some(action) => self.send(action),
            None => Ok(Dispatch::Ignored),
        }
    }

    /// Send an already resolved action.
    pub fn send(&self, action: UpdateAction) -> Result<Dispatch, ApiError> {
        let outcome = self.sink.request_update(&action.table, action.mode)?;
        Ok(Dispatch::Sent { action, outcome })
    }
}

/// Relabel the controls of a scheduled table. Returns how many changed.
pub fn apply_outcome(controls: &mut [Control], outcome: &UpdateOutcome) -> usize {
    let UpdateOutcome::Scheduled { table } = outcome else {
        return 0;
    };
    let mut changed = 0;
    for control in controls.iter_mut().filter(|c| &c.data_id == table) {
        control.label = ControlLabel::Scheduled;
        changed += 1;
    }
    changed
}
