//! Output files written alongside (or instead of) the email digest.
//!
//! - [`json`]: one JSON file of postings per source, for `run --json-out`
//!
//! ```text
//! json_out/
//! ├── adp-2025-11-10.json
//! └── amazon-2025-11-10.json
//! ```

pub mod json;
