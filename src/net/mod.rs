//! Networking modules for the conversation backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `types` defines the wire schema, `repository` the async seams the
//! view-model and session store depend on, and `api` the `reqwest`
//! implementations of those seams.

pub mod api;
pub mod repository;
pub mod types;
