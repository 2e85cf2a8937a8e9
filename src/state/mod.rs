//! Client-side state.
//!
//! DESIGN
//! ======
//! `session` owns who is signed in; `conversations` owns what the list view
//! shows. The view-model never reads the session itself: the front-end
//! checks the session first and hands the view-model a token-bearing
//! repository.

pub mod conversations;
pub mod session;
