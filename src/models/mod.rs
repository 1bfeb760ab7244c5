//! Typed records shared by the store, the dispatcher and the HTTP layer.

pub mod email;
pub mod log;
