// FollowDiff - app/mod.rs
//
// Application layer: the session facade and background import orchestration.
// Dependencies: core layer, platform::fs for file reads.

pub mod import;
pub mod session;
