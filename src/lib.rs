//! Private file tracking support for git repositories.
//!
//! Keeps a managed section inside `.git/info/exclude` so that privately
//! tracked paths never show up in the main repository's status, and reports
//! the git state of individual files.

pub mod builders;
pub mod core;
pub mod utils;
