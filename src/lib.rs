//! Tasktrail data core.
//!
//! SQLite-backed repository for hierarchical tasks with tags, free-text
//! statuses, saved views, and an append-only change history, plus the
//! pure audit formatting and tree flattening shared by the terminal and
//! web front ends.

pub mod audit;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod tree;
pub mod types;
