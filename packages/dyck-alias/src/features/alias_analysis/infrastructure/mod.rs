//! Alias graph engine

pub mod dyck_graph;
pub mod union_find;

pub use dyck_graph::{DyckGraph, UnifyStats};
pub use union_find::UnionFind;
