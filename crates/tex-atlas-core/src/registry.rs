use crate::error::{AtlasError, Result};
use crate::model::Rect;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a named input ended up.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placement {
    /// Index of the owning page.
    pub page: usize,
    /// Content rectangle within the page (stored orientation, edge offset applied).
    pub rect: Rect,
    pub rotated: bool,
}

/// Bidirectional name <-> id mapping plus per-id placement records.
///
/// Ids are assigned by enumerating names in the order given, so the same
/// input sequence always yields the same ids.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    names: Vec<String>,
    ids: HashMap<String, usize>,
    placements: Vec<Option<Placement>>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns ids `0..n` in iteration order. Fails on a repeated name.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut reg = Self::new();
        for name in names {
            reg.register(name)?;
        }
        Ok(reg)
    }

    /// Registers `name` and returns its new id.
    pub fn register<S: Into<String>>(&mut self, name: S) -> Result<usize> {
        let name = name.into();
        if self.ids.contains_key(&name) {
            return Err(AtlasError::DuplicateName(name));
        }
        let id = self.names.len();
        self.ids.insert(name.clone(), id);
        self.names.push(name);
        self.placements.push(None);
        Ok(id)
    }

    pub fn id(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// `(id, name)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().enumerate().map(|(i, n)| (i, n.as_str()))
    }

    /// Records the placement of `id`. Unknown ids are ignored.
    pub fn record(&mut self, id: usize, placement: Placement) {
        if let Some(slot) = self.placements.get_mut(id) {
            *slot = Some(placement);
        }
    }

    pub fn placement(&self, id: usize) -> Option<&Placement> {
        self.placements.get(id).and_then(Option::as_ref)
    }

    pub fn placement_by_name(&self, name: &str) -> Option<&Placement> {
        self.id(name).and_then(|id| self.placement(id))
    }
}
