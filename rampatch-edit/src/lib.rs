//! Edit primitives shared by every ramdisk patch step.
//!
//! Responsibilities:
//! - Split entry contents into byte lines and join them back (`\n` only, no `\r` handling).
//! - Pattern-anchored insertion, removal and substitution over a line sequence.
//! - Reading and writing whole entries as lines, with the shared [`PatchError`] taxonomy.
//!   Contents need not be UTF-8.
//!
//! Nothing here treats "no line matched" as an error. Steps decide what absence means.

mod error;
mod lines;

pub use error::{ErrorKind, PatchError, PatchResult};
pub use lines::{
    Line, LineRule, append_lines, apply_rules, insert_after_match, join_lines, line_regex,
    read_lines, remove_matching, replace_matching, split_lines, write_lines,
};
