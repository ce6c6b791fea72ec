//! In-memory grid source.

use crate::error::{GridReadError, GridReadResult};
use crate::{GridSource, RawGrid};

/// A [`GridSource`] backed by variables held in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    variables: Vec<(String, RawGrid)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable(mut self, name: impl Into<String>, grid: RawGrid) -> Self {
        self.insert(name, grid);
        self
    }

    /// Add or replace a variable.
    pub fn insert(&mut self, name: impl Into<String>, grid: RawGrid) {
        let name = name.into();
        if let Some(slot) = self.variables.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = grid;
        } else {
            self.variables.push((name, grid));
        }
    }
}

impl GridSource for MemorySource {
    fn list_variables(&self) -> GridReadResult<Vec<String>> {
        Ok(self.variables.iter().map(|(n, _)| n.clone()).collect())
    }

    fn read_variable(&self, name: &str) -> GridReadResult<RawGrid> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, g)| g.clone())
            .ok_or_else(|| GridReadError::VariableNotFound(name.to_string()))
    }
}
