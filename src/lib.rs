//! startsync - start-page sync core
//!
//! Keeps a start page's search history and favorite sites consistent
//! between local storage and a Dropbox app folder, with an offline queue
//! and last-writer-wins merging.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Canonical records (`SearchHistoryEntry`, `FavoriteEntry`)
//! - [`sync`] - Normalize, merge, offline queue, snapshot cache, coordinator
//! - [`auth`] - Dropbox OAuth tokens behind the `AuthProvider` capability
//! - [`remote`] - Dropbox HTTP API behind the `RemoteStore` capability
//! - [`storage`] - SQLite key/value store behind the `LocalStore` capability
//! - [`net`] - Connectivity probing
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod net;
pub mod remote;
pub mod storage;
pub mod sync;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
