//! Alias graph vertex
//!
//! A vertex stands for one abstract memory location. Its payload is the set
//! of program values currently known to denote that location; payloads only
//! grow as vertices are merged.

use super::edge_label::LabelId;
use crate::shared::models::ValueId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Vertex handle; the index doubles as creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(pub u32);

impl VertexId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// An equivalence class is named by its representative vertex
pub type ClassId = VertexId;

/// Labeled adjacency: label → ordered neighbour set
pub type Adjacency = BTreeMap<LabelId, BTreeSet<VertexId>>;

#[derive(Debug, Clone, Default)]
pub struct Vertex {
    pub name: Option<String>,
    pub(crate) outs: Adjacency,
    pub(crate) ins: Adjacency,
    pub(crate) values: BTreeSet<ValueId>,
    /// Absorbed vertices stay in the arena for parent lookups only
    pub(crate) live: bool,
}

impl Vertex {
    pub(crate) fn new(name: Option<String>) -> Self {
        Self {
            name,
            live: true,
            ..Default::default()
        }
    }

    #[inline]
    pub fn values(&self) -> &BTreeSet<ValueId> {
        &self.values
    }

    #[inline]
    pub fn outs(&self) -> &Adjacency {
        &self.outs
    }

    #[inline]
    pub fn ins(&self) -> &Adjacency {
        &self.ins
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Targets under one label
    pub fn targets(&self, label: LabelId) -> Option<&BTreeSet<VertexId>> {
        self.outs.get(&label)
    }

    #[inline]
    pub fn out_degree(&self, label: LabelId) -> usize {
        self.outs.get(&label).map_or(0, |s| s.len())
    }

    /// Total number of incident edges (both directions)
    pub fn degree(&self) -> usize {
        self.outs.values().map(|s| s.len()).sum::<usize>()
            + self.ins.values().map(|s| s.len()).sum::<usize>()
    }
}
