//! Dyck-CFL alias graph and its unification engine
//!
//! The graph encodes the Dyck alias language: two out-edges with the same
//! label leaving one vertex denote the same dereference, offset or field
//! access, so their targets must be the same abstract location. `unify`
//! merges such targets until every vertex has at most one target per label.
//!
//! # Algorithm
//! 1. Merge pending alias candidates queued by `make_alias`
//! 2. Seed a worklist with every (vertex, label) whose out-degree exceeds 1
//! 3. Pop (v, l), merge the two smallest-id targets of v under l
//! 4. Re-queue branching (vertex, label) pairs of the survivor
//!
//! Stale entries (absorbed vertex, or degree back to ≤ 1) are dropped on pop.
//!
//! # References
//! - Zhang, Q. et al. "Fast Algorithms for Dyck-CFL-Reachability with
//!   Applications to Alias Analysis" (PLDI 2013)

use super::union_find::UnionFind;
use crate::features::alias_analysis::domain::{
    Adjacency, EdgeLabel, LabelId, LabelInterner, Vertex, VertexId,
};
use crate::shared::models::ValueId;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use tracing::trace;

/// Engine counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifyStats {
    pub unify_calls: usize,
    pub merges: usize,
    pub worklist_pops: usize,
    pub stale_pops: usize,
    pub edges_rewired: usize,
    pub vertices: usize,
    pub live_vertices: usize,
}

/// FIFO of (vertex, label) pairs without duplicates
#[derive(Debug, Default)]
struct Worklist {
    queue: VecDeque<(VertexId, LabelId)>,
    queued: FxHashSet<(VertexId, LabelId)>,
}

impl Worklist {
    fn push(&mut self, entry: (VertexId, LabelId)) {
        if self.queued.insert(entry) {
            self.queue.push_back(entry);
        }
    }

    fn pop(&mut self) -> Option<(VertexId, LabelId)> {
        let entry = self.queue.pop_front()?;
        self.queued.remove(&entry);
        Some(entry)
    }
}

fn adjacency_remove(adjacency: &mut Adjacency, label: LabelId, vertex: VertexId) -> bool {
    let Some(set) = adjacency.get_mut(&label) else {
        return false;
    };
    let removed = set.remove(&vertex);
    if set.is_empty() {
        adjacency.remove(&label);
    }
    removed
}

/// Labeled multigraph over union-find vertices
#[derive(Debug, Default)]
pub struct DyckGraph {
    vertices: Vec<Vertex>,
    uf: UnionFind,
    /// Value → the vertex it was first bound to (resolve with `find`)
    bindings: FxHashMap<ValueId, VertexId>,
    labels: LabelInterner,
    pending: Vec<(VertexId, VertexId)>,
    /// A merge happened since the last `unify`
    dirty: bool,
    live: usize,
    stats: UnifyStats,
}

impl DyckGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Vertices
    // ═══════════════════════════════════════════════════════════════════════

    /// Get-or-create the vertex bound to `value`
    ///
    /// `None` always allocates a fresh unbound vertex. Returns the
    /// representative and whether the binding already existed.
    pub fn retrieve(&mut self, value: Option<ValueId>, name: Option<&str>) -> (VertexId, bool) {
        if let Some(value) = value {
            if let Some(&bound) = self.bindings.get(&value) {
                return (self.find(bound), true);
            }
        }

        let id = VertexId(self.uf.push());
        let mut vertex = Vertex::new(name.map(str::to_string));
        if let Some(value) = value {
            vertex.values.insert(value);
            self.bindings.insert(value, id);
        }
        self.vertices.push(vertex);
        self.live += 1;
        (id, false)
    }

    /// Shorthand for a fresh unbound vertex
    #[inline]
    pub fn fresh(&mut self, name: Option<&str>) -> VertexId {
        self.retrieve(None, name).0
    }

    /// Representative of `v`, compressing its path
    #[inline]
    pub fn find(&mut self, v: VertexId) -> VertexId {
        VertexId(self.uf.find(v.0))
    }

    /// Representative of `v` without touching the union-find
    #[inline]
    pub fn rep(&self, v: VertexId) -> VertexId {
        VertexId(self.uf.find_readonly(v.0))
    }

    /// Representative currently holding `value`
    pub fn vertex_of(&self, value: ValueId) -> Option<VertexId> {
        self.bindings.get(&value).map(|&v| self.rep(v))
    }

    #[inline]
    pub fn is_bound(&self, value: ValueId) -> bool {
        self.bindings.contains_key(&value)
    }

    /// Vertex data of `v`'s representative
    pub fn vertex(&self, v: VertexId) -> &Vertex {
        &self.vertices[self.rep(v).index()]
    }

    /// Equivalence payload of `v`'s class
    pub fn values(&self, v: VertexId) -> &BTreeSet<ValueId> {
        &self.vertex(v).values
    }

    /// Live representatives in ascending id order
    pub fn representatives(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.live)
            .map(|(i, _)| VertexId(i as u32))
    }

    /// Every live edge as (source, label, target)
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, LabelId, VertexId)> + '_ {
        self.representatives().flat_map(move |src| {
            self.vertices[src.index()]
                .outs
                .iter()
                .flat_map(move |(&label, targets)| {
                    targets.iter().map(move |&dst| (src, label, dst))
                })
        })
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.live
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Labels and edges
    // ═══════════════════════════════════════════════════════════════════════

    #[inline]
    pub fn labels(&self) -> &LabelInterner {
        &self.labels
    }

    #[inline]
    pub fn label(&mut self, label: EdgeLabel) -> LabelId {
        self.labels.intern(label)
    }

    /// Add `src -label-> dst` between the representatives; idempotent
    pub fn add_edge(&mut self, src: VertexId, dst: VertexId, label: LabelId) -> bool {
        let (src, dst) = (self.find(src), self.find(dst));
        self.link(src, dst, label)
    }

    /// Remove `src -label-> dst`; idempotent
    pub fn remove_edge(&mut self, src: VertexId, dst: VertexId, label: LabelId) -> bool {
        let (src, dst) = (self.find(src), self.find(dst));
        let removed = adjacency_remove(&mut self.vertices[src.index()].outs, label, dst);
        adjacency_remove(&mut self.vertices[dst.index()].ins, label, src);
        removed
    }

    fn link(&mut self, src: VertexId, dst: VertexId, label: LabelId) -> bool {
        let added = self.vertices[src.index()]
            .outs
            .entry(label)
            .or_default()
            .insert(dst);
        self.vertices[dst.index()]
            .ins
            .entry(label)
            .or_default()
            .insert(src);
        added
    }

    /// The unique `label` target of `v`'s class, if any
    ///
    /// Unique once `unify` has run; before that the smallest target wins.
    pub fn target(&self, v: VertexId, label: LabelId) -> Option<VertexId> {
        self.vertex(v)
            .targets(label)
            .and_then(|targets| targets.iter().next().copied())
    }

    /// Dereference target of `v`'s class
    #[inline]
    pub fn deref_target(&self, v: VertexId) -> Option<VertexId> {
        self.target(v, LabelId::DEREF)
    }

    /// Get-or-create the `label` target of `v`
    pub fn target_or_insert(&mut self, v: VertexId, label: LabelId) -> VertexId {
        if let Some(existing) = self.target(v, label) {
            return existing;
        }
        let fresh = self.fresh(None);
        self.add_edge(v, fresh, label);
        fresh
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Unification
    // ═══════════════════════════════════════════════════════════════════════

    /// Queue an unconditional merge consumed by the next `unify`
    pub fn make_alias(&mut self, x: VertexId, y: VertexId) {
        if x != y {
            self.pending.push((x, y));
        }
    }

    #[inline]
    pub fn pending_aliases(&self) -> usize {
        self.pending.len()
    }

    /// Merge the classes of `x` and `y`, returning the representative
    ///
    /// The higher-degree vertex survives; on a tie the lower id does.
    pub fn merge(&mut self, x: VertexId, y: VertexId) -> VertexId {
        let (x, y) = (self.find(x), self.find(y));
        if x == y {
            return x;
        }
        let (survivor, absorbed) = self.pick_survivor(x, y);

        let vertex = &mut self.vertices[absorbed.index()];
        let outs = std::mem::take(&mut vertex.outs);
        let ins = std::mem::take(&mut vertex.ins);
        let values = std::mem::take(&mut vertex.values);
        let name = vertex.name.take();
        vertex.live = false;

        let mut rewired = 0;
        for (label, targets) in outs {
            for target in targets {
                if target != absorbed {
                    adjacency_remove(&mut self.vertices[target.index()].ins, label, absorbed);
                }
                let target = if target == absorbed { survivor } else { target };
                self.link(survivor, target, label);
                rewired += 1;
            }
        }
        for (label, sources) in ins {
            for source in sources {
                if source != absorbed {
                    adjacency_remove(&mut self.vertices[source.index()].outs, label, absorbed);
                }
                let source = if source == absorbed { survivor } else { source };
                self.link(source, survivor, label);
                rewired += 1;
            }
        }

        let kept = &mut self.vertices[survivor.index()];
        kept.values.extend(values);
        if kept.name.is_none() {
            kept.name = name;
        }
        self.uf.union_into(absorbed.0, survivor.0);

        self.live -= 1;
        self.dirty = true;
        self.stats.merges += 1;
        self.stats.edges_rewired += rewired;
        trace!(%absorbed, %survivor, rewired, "merged vertices");
        survivor
    }

    fn pick_survivor(&self, x: VertexId, y: VertexId) -> (VertexId, VertexId) {
        let dx = self.vertices[x.index()].degree();
        let dy = self.vertices[y.index()].degree();
        if dx > dy || (dx == dy && x < y) {
            (x, y)
        } else {
            (y, x)
        }
    }

    fn enqueue_branching(&self, v: VertexId, worklist: &mut Worklist) {
        for (&label, targets) in &self.vertices[v.index()].outs {
            if targets.len() > 1 {
                worklist.push((v, label));
            }
        }
    }

    /// Run unification to a fixpoint
    ///
    /// Returns whether any merge happened since the previous call.
    pub fn unify(&mut self) -> bool {
        self.stats.unify_calls += 1;

        for (x, y) in std::mem::take(&mut self.pending) {
            self.merge(x, y);
        }

        let mut worklist = Worklist::default();
        let live: Vec<VertexId> = self.representatives().collect();
        for v in live {
            self.enqueue_branching(v, &mut worklist);
        }

        while let Some((v, label)) = worklist.pop() {
            self.stats.worklist_pops += 1;

            let vertex = &self.vertices[v.index()];
            let mut targets = vertex
                .targets(label)
                .into_iter()
                .flat_map(|set| set.iter().copied());
            let (first, second) = match (vertex.live, targets.next(), targets.next()) {
                (true, Some(first), Some(second)) => (first, second),
                _ => {
                    self.stats.stale_pops += 1;
                    continue;
                }
            };

            let survivor = self.merge(first, second);
            self.enqueue_branching(survivor, &mut worklist);

            let v = self.find(v);
            if self.vertices[v.index()].out_degree(label) > 1 {
                worklist.push((v, label));
            }
        }

        std::mem::take(&mut self.dirty)
    }

    pub fn stats(&self) -> UnifyStats {
        UnifyStats {
            vertices: self.vertices.len(),
            live_vertices: self.live,
            ..self.stats.clone()
        }
    }
}
