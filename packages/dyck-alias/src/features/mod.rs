//! Analysis features

pub mod alias_analysis;
