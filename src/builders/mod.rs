// This file is the module declaration file for the `builders` module.
// It declares and makes public the building blocks the exclude engine is
// assembled from.

// `document` module:
// Parses `.git/info/exclude` into preamble, managed entries and trailing
// lines, and renders it back without disturbing unrelated content.
pub mod document;

// `integrity` module:
// Cheap heuristics (binary content, size, line count, line length) that
// flag a damaged or suspicious exclude file without blocking anything.
pub mod integrity;

// `patterns` module:
// Simple glob matching used to warn when a new entry overlaps existing
// managed entries.
pub mod patterns;

// `policy` module:
// The warn/silent/error fallback applied when exclude operations are
// disabled or the file cannot be accessed.
pub mod policy;

// `reporter` module:
// Console and export rendering of batch results, managed entries and file
// states for the command-line interface.
pub mod reporter;

// `storage` module:
// The `ExcludeStore` abstraction over the exclude file, with an on-disk
// implementation and an in-memory one.
pub mod storage;

// `validator` module:
// Pure path safety checks applied before anything is written.
pub mod validator;
