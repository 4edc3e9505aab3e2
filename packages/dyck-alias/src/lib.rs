/*
 * dyck-alias - Unification-based Alias Analysis
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Host IR model (Module, Function, Instruction, builders)
 * - features/    : alias_analysis (domain → infrastructure → application → ports)
 * - config/      : External function models (allocators, spawns, copies)
 * - errors       : AliasError / Result
 *
 * Whole-program, flow- and context-insensitive, field-sensitive through
 * static offset/index edge labels. One batch pass per module; queries run
 * against the final graph.
 */

// Crate-level lint configuration
#![allow(clippy::too_many_arguments)] // Translation helpers mirror instruction operands
#![allow(clippy::type_complexity)] // Nested adjacency maps
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::module_inception)] // Module naming intentional

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Host IR model and builders
pub mod shared;

/// Feature modules
pub mod features;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{AliasConfig, SpawnSignature};
pub use errors::{AliasError, Result};
pub use features::alias_analysis::{
    AliasAnalysis, AliasDriver, AliasQuery, AnalysisStats, Call, CallGraph, CallId, CallKind,
    CallOrigin, ClassId, EdgeLabel, VertexId,
};
pub use shared::models::{
    FunctionId, GepStep, Linkage, Module, ModuleBuilder, Signature, Type, ValueId,
};
