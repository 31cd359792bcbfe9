// FollowDiff - platform/mod.rs
//
// Platform abstraction layer.
// Dependencies: util, directories crate.
// Must NOT depend on: core, app.

pub mod config;
pub mod fs;
