// This file is the module declaration file for the `core` module.
// It declares the submodules contained within `src/core/` and exposes
// them to the rest of the crate.

// `config` module:
// Defines `GitExcludeSettings` (marker comment, fallback behaviour, ...)
// and the `ConfigManager` that loads and saves them as TOML under `.git/`.
pub mod config;

// `engine` module:
// The `ExcludeEngine` drives every add/remove against `.git/info/exclude`,
// wiring together validation, parsing, integrity and conflict checks,
// the write itself and the fallback policy.
pub mod engine;

// `error` module:
// The `GitExcludeError` taxonomy shared by the engine and the classifier.
pub mod error;

// `git` module:
// The `GitClient` trait and its git2-backed implementation, which supply
// repository status snapshots.
pub mod git;

// `state` module:
// Turns a status snapshot plus the exclude lookup into a `GitFileState`.
pub mod state;
