// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling each task's `watch` / `exclude` globs into [`WatchBinding`]s.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Debouncing events per path and (optionally) dropping events whose file
//!   content did not change.
//!
//! It does **not** run tasks; it only turns filesystem changes into
//! `RuntimeEvent::FileChanged` for the dispatch loop.

pub mod debounce;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use debounce::Debouncer;
pub use hash::{ContentFilter, compute_file_hash};
pub use patterns::{WatchBinding, build_bindings_from_config};
pub use watcher::{PathFilter, WatchOptions, WatcherHandle, spawn_watcher};
