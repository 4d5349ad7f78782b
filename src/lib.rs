//! Thread archiver library.
//!
//! Fetches Reddit threads with their full comment trees, stores them in
//! SQLite, and serves them back as browsable archive pages.

// Allow raw string hashes for safety - they're harmless and prevent issues if content changes
#![allow(clippy::needless_raw_string_hashes)]

pub mod admission;
pub mod archiver;
pub mod components;
pub mod config;
pub mod constants;
pub mod db;
pub mod reddit;
pub mod web;
