//! Library crate for user-directory.
//!
//! This crate exposes the building blocks of the TUI:
//! - Directory records and the signed-in account (`model`)
//! - Filtering, sorting and pagination helpers (`search`)
//! - The listing state engine (`directory`) and the profile state (`detail`)
//! - The HTTP users API client (`source`)
//! - Mock authentication over a key-value session store (`auth`, `store`)
//! - Settings and command-line parsing (`config`)
//! - Application state, update loop and rendering (`app`, `ui`)
//!
//! It is used by the `user-directory` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod app;
pub mod auth;
pub mod config;
pub mod detail;
pub mod directory;
pub mod error;
pub mod model;
pub mod search;
pub mod source;
pub mod store;
pub mod ui;

/// Convenient error and result types shared across the crate.
pub use error::{DynError, Result};
