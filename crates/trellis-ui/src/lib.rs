//! Terminal UI components for the trellis system.
//!
//! Provides Ayu-themed color styling, terminal detection, and the tree
//! views used by CLI output.

pub mod styles;
pub mod terminal;
pub mod tree_view;
