//! Route handlers.

pub mod health;
pub mod stream;
pub mod tasks;
