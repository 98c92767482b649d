//! Parameter source abstraction.
//!
//! Parameter-file parsing lives in the surrounding application; the stage
//! only needs one boolean out of it. The trait mirrors that collaborator's
//! `readParameter(key, index)` shape.

use std::collections::HashMap;

/// Read-only view of the stage's configuration parameters.
pub trait ParameterSource: Send + Sync {
    /// Value for `key` at `index`, if present.
    fn read_parameter(&self, key: &str, index: usize) -> Option<&str>;
}

/// In-memory parameter map.
#[derive(Debug, Default, Clone)]
pub struct ParameterMap {
    entries: HashMap<String, Vec<String>>,
}

impl ParameterMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set all values for a key.
    pub fn set(&mut self, key: &str, values: &[&str]) {
        self.entries
            .insert(key.to_owned(), values.iter().map(|v| (*v).to_owned()).collect());
    }
}

impl ParameterSource for ParameterMap {
    fn read_parameter(&self, key: &str, index: usize) -> Option<&str> {
        self.entries.get(key)?.get(index).map(String::as_str)
    }
}

/// Whether GPU use is requested for a stage.
///
/// An absent parameter means enabled: opting out is the explicit act.
pub fn gpu_requested(source: &dyn ParameterSource, key: &str) -> bool {
    match source.read_parameter(key, 0) {
        Some(value) => matches!(value, "true" | "1" | "on"),
        None => true,
    }
}
