//! Local reconciliation of a collection after a confirmed server change.
//!
//! Every function here takes the value the server returned and applies it
//! to the in-memory list. None of them touch the list when they fail.

use crate::error::Result;
use crate::record::{Record, RecordId, RecordPatch};

/// Where newly created records land in the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertPosition {
    #[default]
    Append,
    Prepend,
}

/// What happened to the list during a reconciliation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Inserted(usize),
    Replaced(usize),
    Removed(usize),
    Unchanged,
}

pub fn position<R: Record>(items: &[R], id: &RecordId) -> Option<usize> {
    items.iter().position(|item| &item.id() == id)
}

/// Add a freshly created record.
///
/// If the id is already present (a reload raced the create), the existing
/// entry is replaced in place instead of duplicated.
pub fn insert<R: Record>(items: &mut Vec<R>, record: R, at: InsertPosition) -> Change {
    if let Some(index) = position(items, &record.id()) {
        items[index] = record;
        return Change::Replaced(index);
    }
    match at {
        InsertPosition::Append => {
            items.push(record);
            Change::Inserted(items.len() - 1)
        }
        InsertPosition::Prepend => {
            items.insert(0, record);
            Change::Inserted(0)
        }
    }
}

/// Replace the record with the same id, or append it if missing locally.
pub fn upsert<R: Record>(items: &mut Vec<R>, record: R) -> Change {
    match position(items, &record.id()) {
        Some(index) => {
            items[index] = record;
            Change::Replaced(index)
        }
        None => {
            items.push(record);
            Change::Inserted(items.len() - 1)
        }
    }
}

pub fn remove<R: Record>(items: &mut Vec<R>, id: &RecordId) -> Change {
    match position(items, id) {
        Some(index) => {
            items.remove(index);
            Change::Removed(index)
        }
        None => Change::Unchanged,
    }
}

/// Merge server-confirmed fields into the record with `id`.
pub fn patch<R: Record>(items: &mut [R], id: &RecordId, patch: &RecordPatch) -> Result<Change> {
    let Some(index) = position(items, id) else {
        return Ok(Change::Unchanged);
    };
    let merged = items[index].apply_patch(patch)?;
    items[index] = merged;
    Ok(Change::Replaced(index))
}
