// src/dag/mod.rs

//! Composition graph of tasks.
//!
//! Composite tasks (`series` / `parallel`) point at their members. The graph
//! is used to register tasks members-first and to print the plan in
//! `--dry-run`; execution itself lives in [`crate::tasks`].

pub mod graph;

pub use graph::DagGraph;
