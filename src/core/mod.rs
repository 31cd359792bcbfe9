// FollowDiff - core/mod.rs
//
// Core business logic layer.
// Must NOT depend on: app, platform, or any filesystem I/O.

pub mod export;
pub mod filter;
pub mod importer;
pub mod model;
pub mod reconcile;
