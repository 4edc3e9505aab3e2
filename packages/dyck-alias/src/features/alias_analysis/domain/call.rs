//! Call sites
//!
//! A call is either a `CommonCall` (the called value is syntactically a
//! function) or a `PointerCall` (anything else). Pointer calls accumulate
//! their possible callees while the inter-procedural fixpoint runs; the set
//! only ever grows.

use crate::shared::models::{FunctionId, InstRef, ValueId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Call handle, dense in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(pub u32);

impl CallId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call#{}", self.0)
    }
}

/// Where a call comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallOrigin {
    /// An ordinary call instruction
    Direct,
    /// Synthesized from a thread-spawn call: the routine argument is the
    /// called value and the payload is the only argument
    Spawn,
}

/// Kind-specific call payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    Common {
        callee: FunctionId,
    },
    Pointer {
        may_callees: BTreeSet<FunctionId>,
        /// The called value is a cast of a single known function
        must_alias: bool,
    },
}

/// One call site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub id: CallId,
    /// The call instruction
    pub site: InstRef,
    pub caller: FunctionId,
    pub called_value: ValueId,
    pub args: Vec<ValueId>,
    pub result: Option<ValueId>,
    pub origin: CallOrigin,
    pub kind: CallKind,
}

impl Call {
    #[inline]
    pub fn is_pointer_call(&self) -> bool {
        matches!(self.kind, CallKind::Pointer { .. })
    }

    /// Statically known callee of a common call
    #[inline]
    pub fn callee(&self) -> Option<FunctionId> {
        match self.kind {
            CallKind::Common { callee } => Some(callee),
            CallKind::Pointer { .. } => None,
        }
    }

    /// Every function this call may currently invoke
    pub fn targets(&self) -> Vec<FunctionId> {
        match &self.kind {
            CallKind::Common { callee } => vec![*callee],
            CallKind::Pointer { may_callees, .. } => may_callees.iter().copied().collect(),
        }
    }

    /// Pointer-call candidate set (empty for common calls)
    pub fn may_callees(&self) -> Option<&BTreeSet<FunctionId>> {
        match &self.kind {
            CallKind::Pointer { may_callees, .. } => Some(may_callees),
            CallKind::Common { .. } => None,
        }
    }

    /// Add resolved callees; returns the ones not seen before
    pub fn add_callees(
        &mut self,
        candidates: impl IntoIterator<Item = FunctionId>,
    ) -> Vec<FunctionId> {
        match &mut self.kind {
            CallKind::Pointer { may_callees, .. } => candidates
                .into_iter()
                .filter(|f| may_callees.insert(*f))
                .collect(),
            CallKind::Common { .. } => Vec::new(),
        }
    }
}
