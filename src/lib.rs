//! # convo-desk
//!
//! Client for a conversation-log backend: stored prompt/response pairs with
//! a category and timestamp, plus username/password sign-in.
//!
//! This crate contains the wire types, the repository seam and its HTTP
//! implementation, the persisted session store, and the conversation list
//! view-model that the `convo` binary renders.

pub mod config;
pub mod error;
pub mod net;
pub mod state;
pub mod util;
pub mod view;
