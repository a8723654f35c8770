//! Core types for the trellis system: issue records, the issue tree
//! engine, and the variable-source seam used for rendering.

pub mod issue;
pub mod kind;
pub mod tree;
pub mod vars;
