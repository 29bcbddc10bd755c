//! Partial-update merging: which fields a PUT actually writes.

use crate::schema::{Record, ResourceSchema};
use serde_json::Value;

pub struct UpdateMerger;

impl UpdateMerger {
    /// Turn a validated change set into the set of columns to write, adding derived fields
    /// (first publication stamp, update stamp). Returns `None` when there is nothing to write.
    pub fn merge(schema: &ResourceSchema, existing: &Record, mut changes: Record, now: &str) -> Option<Record> {
        if changes.is_empty() {
            return None;
        }
        if let Some(rule) = schema.publish {
            let publishing = changes.get(rule.flag) == Some(&Value::Bool(true));
            let stamped = existing.get(rule.stamp).map(|v| !v.is_null()).unwrap_or(false);
            if publishing && !stamped {
                changes.insert(rule.stamp.to_string(), Value::String(now.to_string()));
            }
        }
        if let Some(updated_at) = schema.updated_at {
            changes.insert(updated_at.to_string(), Value::String(now.to_string()));
        }
        Some(changes)
    }

    /// Apply a change set to a record. `null` clears the field (the key is dropped).
    pub fn apply(existing: &Record, changes: &Record) -> Record {
        let mut out = existing.clone();
        for (k, v) in changes {
            if v.is_null() {
                out.remove(k);
            } else {
                out.insert(k.clone(), v.clone());
            }
        }
        out
    }
}
