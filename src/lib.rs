//! Quillboard library.
//!
//! A small blog with threaded comments: posts and comments in SQLite, a
//! server-rendered web UI whose comment section is driven by a per-visitor
//! view state machine, and a Mermaid export of each discussion.

// Allow raw string hashes for safety - they're harmless and prevent issues if content changes
#![allow(clippy::needless_raw_string_hashes)]

pub mod auth;
pub mod comments;
pub mod components;
pub mod config;
pub mod constants;
pub mod db;
pub mod web;
