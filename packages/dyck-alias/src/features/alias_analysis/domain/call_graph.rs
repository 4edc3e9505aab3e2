//! Call graph
//!
//! One node per analyzed function holding its formal parameters, return
//! values, vararg vertices, exception resume values and the call sites it
//! contains. The call graph owns every node and every `Call`.

use super::call::{Call, CallId, CallKind, CallOrigin};
use super::vertex::VertexId;
use crate::shared::models::{FunctionId, InstRef, ValueId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Per-function call graph node
#[derive(Debug, Clone)]
pub struct CallGraphNode {
    pub function: FunctionId,
    pub(crate) params: Vec<ValueId>,
    pub(crate) returns: BTreeSet<ValueId>,
    pub(crate) varargs: Vec<VertexId>,
    pub(crate) resumes: BTreeSet<ValueId>,
    pub(crate) common_calls: BTreeSet<CallId>,
    pub(crate) pointer_calls: BTreeSet<CallId>,
    site_index: FxHashMap<(InstRef, CallOrigin), CallId>,
}

impl CallGraphNode {
    fn new(function: FunctionId, params: Vec<ValueId>) -> Self {
        Self {
            function,
            params,
            returns: BTreeSet::new(),
            varargs: Vec::new(),
            resumes: BTreeSet::new(),
            common_calls: BTreeSet::new(),
            pointer_calls: BTreeSet::new(),
            site_index: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn params(&self) -> &[ValueId] {
        &self.params
    }

    #[inline]
    pub fn returns(&self) -> &BTreeSet<ValueId> {
        &self.returns
    }

    #[inline]
    pub fn varargs(&self) -> &[VertexId] {
        &self.varargs
    }

    #[inline]
    pub fn resumes(&self) -> &BTreeSet<ValueId> {
        &self.resumes
    }

    #[inline]
    pub fn common_calls(&self) -> &BTreeSet<CallId> {
        &self.common_calls
    }

    #[inline]
    pub fn pointer_calls(&self) -> &BTreeSet<CallId> {
        &self.pointer_calls
    }

    /// Call recorded for an instruction
    pub fn call_at(&self, site: InstRef, origin: CallOrigin) -> Option<CallId> {
        self.site_index.get(&(site, origin)).copied()
    }
}

/// Summary counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraphStats {
    pub functions: usize,
    pub common_calls: usize,
    pub pointer_calls: usize,
    /// Sum of candidate-set sizes over all pointer calls
    pub resolved_targets: usize,
    pub unresolved_pointer_calls: usize,
}

/// Data for a call about to be registered
#[derive(Debug, Clone)]
pub struct NewCall {
    pub site: InstRef,
    pub caller: FunctionId,
    pub called_value: ValueId,
    pub args: Vec<ValueId>,
    pub result: Option<ValueId>,
    pub origin: CallOrigin,
    pub kind: CallKind,
}

#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    nodes: BTreeMap<FunctionId, CallGraphNode>,
    calls: Vec<Call>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-insert the node for `function`
    pub fn node_or_insert(
        &mut self,
        function: FunctionId,
        params: &[ValueId],
    ) -> &mut CallGraphNode {
        self.nodes
            .entry(function)
            .or_insert_with(|| CallGraphNode::new(function, params.to_vec()))
    }

    #[inline]
    pub fn node(&self, function: FunctionId) -> Option<&CallGraphNode> {
        self.nodes.get(&function)
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, function: FunctionId) -> Option<&mut CallGraphNode> {
        self.nodes.get_mut(&function)
    }

    /// Functions in ascending handle order
    pub fn functions(&self) -> impl Iterator<Item = FunctionId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CallGraphNode> + '_ {
        self.nodes.values()
    }

    /// Register a call with its caller; the caller node must exist
    pub fn add_call(&mut self, call: NewCall) -> CallId {
        let id = CallId(self.calls.len() as u32);
        let pointer = matches!(call.kind, CallKind::Pointer { .. });
        let node = self
            .nodes
            .entry(call.caller)
            .or_insert_with(|| CallGraphNode::new(call.caller, Vec::new()));
        if pointer {
            node.pointer_calls.insert(id);
        } else {
            node.common_calls.insert(id);
        }
        node.site_index.insert((call.site, call.origin), id);

        self.calls.push(Call {
            id,
            site: call.site,
            caller: call.caller,
            called_value: call.called_value,
            args: call.args,
            result: call.result,
            origin: call.origin,
            kind: call.kind,
        });
        id
    }

    #[inline]
    pub fn call(&self, id: CallId) -> Option<&Call> {
        self.calls.get(id.index())
    }

    #[inline]
    pub(crate) fn call_mut(&mut self, id: CallId) -> Option<&mut Call> {
        self.calls.get_mut(id.index())
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Every pointer call, in creation order
    pub fn pointer_call_ids(&self) -> Vec<CallId> {
        self.calls
            .iter()
            .filter(|c| c.is_pointer_call())
            .map(|c| c.id)
            .collect()
    }

    pub fn stats(&self) -> CallGraphStats {
        let mut stats = CallGraphStats {
            functions: self.nodes.len(),
            ..Default::default()
        };
        for call in &self.calls {
            match &call.kind {
                CallKind::Common { .. } => stats.common_calls += 1,
                CallKind::Pointer { may_callees, .. } => {
                    stats.pointer_calls += 1;
                    stats.resolved_targets += may_callees.len();
                    if may_callees.is_empty() {
                        stats.unresolved_pointer_calls += 1;
                    }
                }
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(index: u32) -> InstRef {
        InstRef {
            function: FunctionId(0),
            block: 0,
            index,
        }
    }

    #[test]
    fn test_node_is_created_once() {
        let mut cg = CallGraph::new();
        cg.node_or_insert(FunctionId(0), &[ValueId(1)]);
        cg.node_or_insert(FunctionId(0), &[ValueId(9)]);
        assert_eq!(cg.node(FunctionId(0)).unwrap().params(), &[ValueId(1)]);
        assert_eq!(cg.functions().count(), 1);
    }

    #[test]
    fn test_calls_are_indexed_by_site_and_kind() {
        let mut cg = CallGraph::new();
        cg.node_or_insert(FunctionId(0), &[]);
        let common = cg.add_call(NewCall {
            site: site(1),
            caller: FunctionId(0),
            called_value: ValueId(5),
            args: vec![],
            result: None,
            origin: CallOrigin::Direct,
            kind: CallKind::Common {
                callee: FunctionId(1),
            },
        });
        let spawn = cg.add_call(NewCall {
            site: site(1),
            caller: FunctionId(0),
            called_value: ValueId(6),
            args: vec![ValueId(7)],
            result: None,
            origin: CallOrigin::Spawn,
            kind: CallKind::Pointer {
                may_callees: BTreeSet::new(),
                must_alias: false,
            },
        });

        let node = cg.node(FunctionId(0)).unwrap();
        assert!(node.common_calls().contains(&common));
        assert!(node.pointer_calls().contains(&spawn));
        assert_eq!(node.call_at(site(1), CallOrigin::Direct), Some(common));
        assert_eq!(node.call_at(site(1), CallOrigin::Spawn), Some(spawn));
        assert_eq!(cg.pointer_call_ids(), vec![spawn]);

        let stats = cg.stats();
        assert_eq!(stats.common_calls, 1);
        assert_eq!(stats.pointer_calls, 1);
        assert_eq!(stats.unresolved_pointer_calls, 1);
    }
}
