//! Data models for CEDRIK entities

mod conversation;
mod labs;
mod user;

pub use conversation::*;
pub use labs::*;
pub use user::*;
