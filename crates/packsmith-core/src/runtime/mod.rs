//! Runtime detection for the languages policy packs are written in
//!
//! Used by the post-generate integration step to tell the user whether the
//! runtime a template declares is installed. Detection is advisory only.

pub mod check;

pub use check::{check_runtime, Runtime, RuntimeInfo};
