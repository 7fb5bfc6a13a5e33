//! Batched position/size sync from the client drag layer
//!
//! A batch is a JSON object mapping button id to a partial update. Batches are
//! all-or-nothing: every entry is decoded and validated before the store is
//! locked, then the whole batch is applied under a single lock acquisition.

use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

use crate::constants::http;
use crate::store::{SharedStore, lock_store};
use crate::types::{ButtonId, ButtonPatch};

/// One rejected entry of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryError {
    /// Key exactly as the client sent it
    pub key: String,
    pub reason: String,
}

impl fmt::Display for EntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.reason)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Body missing, not JSON, not an object, or an entry is not an object
    #[error("{}", http::NO_DATA_MESSAGE)]
    NoData,
    #[error("invalid entries: {}", join_entries(.0))]
    InvalidEntries(Vec<EntryError>),
    #[error("{0}")]
    Fault(String),
}

fn join_entries(entries: &[EntryError]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Decoded batch, ready to apply
pub type Batch = Vec<(ButtonId, ButtonPatch)>;

/// Decode and validate a raw request body; entries keep body order
pub fn decode_batch(body: &[u8]) -> Result<Batch, SyncError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(SyncError::NoData);
    }
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "Sync body is not JSON");
        SyncError::NoData
    })?;
    let Value::Object(entries) = value else {
        return Err(SyncError::NoData);
    };

    let mut batch = Vec::with_capacity(entries.len());
    let mut errors = Vec::new();
    for (key, entry) in entries {
        let Value::Object(fields) = entry else {
            return Err(SyncError::NoData);
        };
        let decoded = key
            .parse::<ButtonId>()
            .map_err(|e| e.to_string())
            .and_then(|id| decode_patch(&fields).map(|patch| (id, patch)));
        match decoded {
            Ok(pair) => batch.push(pair),
            Err(reason) => errors.push(EntryError { key, reason }),
        }
    }

    if errors.is_empty() {
        Ok(batch)
    } else {
        Err(SyncError::InvalidEntries(errors))
    }
}

/// Apply a decoded batch under one lock acquisition; returns entries applied
pub fn apply_batch(store: &SharedStore, batch: &Batch) -> Result<usize, SyncError> {
    let mut store = lock_store(store).map_err(|e| SyncError::Fault(e.to_string()))?;
    for (id, patch) in batch {
        store.upsert(*id, patch);
    }
    Ok(batch.len())
}

/// Full sync path: decode, validate, apply
pub fn sync_positions(store: &SharedStore, body: &[u8]) -> Result<usize, SyncError> {
    let batch = decode_batch(body).inspect_err(|e| warn!(error = %e, "Rejected sync batch"))?;
    apply_batch(store, &batch)
}

fn decode_patch(fields: &Map<String, Value>) -> Result<ButtonPatch, String> {
    let patch = ButtonPatch {
        x: number_field(fields, "x")?,
        y: number_field(fields, "y")?,
        width: positive_field(fields, "width")?,
        height: positive_field(fields, "height")?,
        text: text_field(fields, "text")?,
        additional_text: match text_field(fields, "additionalText")? {
            Some(text) => Some(text),
            None => text_field(fields, "additional_text")?,
        },
    };
    Ok(patch)
}

/// `null` counts as "not supplied" (the drag layer serializes NaN as null)
fn number_field(fields: &Map<String, Value>, name: &str) -> Result<Option<f64>, String> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(format!("{name} is out of range")),
        },
        Some(_) => Err(format!("{name} must be a number")),
    }
}

fn positive_field(fields: &Map<String, Value>, name: &str) -> Result<Option<f64>, String> {
    match number_field(fields, name)? {
        Some(v) if v <= 0.0 => Err(format!("{name} must be positive")),
        other => Ok(other),
    }
}

fn text_field(fields: &Map<String, Value>, name: &str) -> Result<Option<String>, String> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(format!("{name} must be a string")),
    }
}
