//! PDF merging.
//!
//! - [`accumulator`]: in-order combination of documents into one buffer
//! - [`orchestrator`]: merge, persist through a storage backend, resolve URL

pub mod accumulator;
pub mod orchestrator;

pub use accumulator::{MergeAccumulator, MergeSource};
pub use orchestrator::{
    IdentifierGenerator, MIN_MERGE_SOURCES, MergeResult, merge_files, merged_file_name,
    next_identifier,
};
