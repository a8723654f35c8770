//! Jira reflection for the trellis system.
//!
//! The [`client`] module speaks the v2 REST API behind the
//! [`TicketService`] trait; the [`reflector`] module drives tree
//! creation against any implementation of it.

pub mod client;
pub mod reflector;

// Re-exports for convenience.
pub use client::{JiraApi, NewTicket, ServiceError, TicketService};
pub use reflector::{CreatedTicket, ReflectError, Reflector};
