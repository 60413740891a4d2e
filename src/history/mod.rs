//! Analysis history: a JSONL record of every analyze attempt and the
//! aggregation behind `aihub history`.

pub mod logger;
pub mod reporter;

pub use logger::{HistoryEntry, HistoryLog};
