//! Small pure helpers shared by state and rendering.

pub mod pagination;
