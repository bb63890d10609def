//! API client module for the CEDRIK backend and the labs service

pub mod auth;
pub mod chat;
pub mod client;
mod error;
pub mod kaligpt;
pub mod labs;
pub mod password;
pub mod sidebar;
#[cfg(test)]
mod testing;

pub use client::ApiClient;
pub use error::{ApiError, GENERIC_FAILURE};
