//! Configuration management for the trellis system.
//!
//! This crate handles loading and saving `trellis.yaml` files and provides
//! typed access to Jira connection settings and field mappings.

pub mod config;
