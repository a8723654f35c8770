//! Template and variable file loading for the trellis system.
//!
//! Provides recursive template discovery ([`load_templates`]), variable
//! file loading ([`VariableFile`]), and the schema dialect used to check
//! variable files ([`Schema`]).

pub mod error;
pub mod schema;
pub mod templates;
pub mod variables;

// Re-exports for convenience.
pub use error::LoadError;
pub use schema::Schema;
pub use templates::load_templates;
pub use variables::VariableFile;
