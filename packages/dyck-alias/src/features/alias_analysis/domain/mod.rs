//! Alias analysis domain models

pub mod call;
pub mod call_graph;
pub mod edge_label;
pub mod function_type;
pub mod vertex;

pub use call::{Call, CallId, CallKind, CallOrigin};
pub use call_graph::{CallGraph, CallGraphNode, CallGraphStats, NewCall};
pub use edge_label::{EdgeLabel, LabelId, LabelInterner};
pub use function_type::{FunctionTypeIndex, FunctionTypeNode, SignatureKey, TypeClass};
pub use vertex::{Adjacency, ClassId, Vertex, VertexId};
