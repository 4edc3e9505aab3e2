//! Edge labels of the alias graph
//!
//! Three label kinds type the edges:
//! - `Dereference`: target is the content of the memory the source points to
//! - `ByteOffset(k)`: target is the source address plus `k` bytes
//! - `FieldIndex(k)`: target is the address of field `k` of the source object
//!
//! Labels are interned per session into [`LabelId`] handles, so two requests
//! for the same numeric label yield the same handle and label equality is
//! handle equality.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Interned edge label handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelId(pub u32);

impl LabelId {
    /// The dereference label is always the first interned label
    pub const DEREF: LabelId = LabelId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Edge label kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeLabel {
    Dereference,
    ByteOffset(i64),
    FieldIndex(i64),
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeLabel::Dereference => write!(f, "*"),
            EdgeLabel::ByteOffset(k) => write!(f, "+{}", k),
            EdgeLabel::FieldIndex(k) => write!(f, ".{}", k),
        }
    }
}

/// Session-wide label table
#[derive(Debug, Clone)]
pub struct LabelInterner {
    labels: Vec<EdgeLabel>,
    offsets: FxHashMap<i64, LabelId>,
    fields: FxHashMap<i64, LabelId>,
}

impl Default for LabelInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelInterner {
    pub fn new() -> Self {
        Self {
            labels: vec![EdgeLabel::Dereference],
            offsets: FxHashMap::default(),
            fields: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn deref(&self) -> LabelId {
        LabelId::DEREF
    }

    pub fn offset(&mut self, bytes: i64) -> LabelId {
        let labels = &mut self.labels;
        *self.offsets.entry(bytes).or_insert_with(|| {
            labels.push(EdgeLabel::ByteOffset(bytes));
            LabelId((labels.len() - 1) as u32)
        })
    }

    pub fn field(&mut self, index: i64) -> LabelId {
        let labels = &mut self.labels;
        *self.fields.entry(index).or_insert_with(|| {
            labels.push(EdgeLabel::FieldIndex(index));
            LabelId((labels.len() - 1) as u32)
        })
    }

    /// Intern any label kind
    pub fn intern(&mut self, label: EdgeLabel) -> LabelId {
        match label {
            EdgeLabel::Dereference => LabelId::DEREF,
            EdgeLabel::ByteOffset(k) => self.offset(k),
            EdgeLabel::FieldIndex(k) => self.field(k),
        }
    }

    /// Resolve a handle back to its label
    #[inline]
    pub fn get(&self, id: LabelId) -> Option<EdgeLabel> {
        self.labels.get(id.index()).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
