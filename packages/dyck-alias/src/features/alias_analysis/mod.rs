//! Unification-based (Dyck-CFL) alias analysis
//!
//! - `domain`: edge labels, vertices, calls, call graph, signature clusters
//! - `infrastructure`: union-find and the alias graph engine
//! - `application`: driver, query façade, diagnostics
//! - `ports`: consumer-facing query trait

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{AliasAnalysis, AliasDriver, AnalysisStats, FixpointStats};
pub use domain::{
    Call, CallGraph, CallGraphNode, CallGraphStats, CallId, CallKind, CallOrigin, ClassId,
    EdgeLabel, LabelId, VertexId,
};
pub use infrastructure::{DyckGraph, UnifyStats};
pub use ports::AliasQuery;
