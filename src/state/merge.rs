//! Deep merge of freshly loaded platform definitions into persisted state.
//!
//! Persisted data always wins: a key already present in `existing` keeps its
//! value, nested objects are merged key by key, and only keys missing from
//! `existing` are filled in from `incoming`. This is what keeps `subnet`,
//! `ip` and port assignments stable when a definition is loaded again.

use serde_json::Value;

use super::types::GlobalState;

/// Merge `incoming` into `existing`, returning the merged value
///
/// # Examples
/// ```
/// use rtf::state::merge;
/// use serde_json::json;
///
/// let existing = json!({"ram": 2048, "ip": "192.168.0.5"});
/// let incoming = json!({"ram": 256});
/// assert_eq!(merge(&existing, &incoming), existing);
/// ```
pub fn merge(existing: &Value, incoming: &Value) -> Value {
    match (existing, incoming) {
        (Value::Object(current), Value::Object(fresh)) => {
            let mut merged = current.clone();
            for (key, value) in fresh {
                let entry = match current.get(key) {
                    Some(kept) => merge(kept, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), entry);
            }
            Value::Object(merged)
        }
        (kept, _) => kept.clone(),
    }
}

impl GlobalState {
    /// Merge loaded platforms into this state, existing data winning
    pub fn merged_with(&self, incoming: &GlobalState) -> serde_json::Result<GlobalState> {
        let existing = serde_json::to_value(self)?;
        let incoming = serde_json::to_value(incoming)?;
        serde_json::from_value(merge(&existing, &incoming))
    }
}
