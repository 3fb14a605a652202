//! External I/O adapters: file load/save, the cursor-position cache, and
//! the git diff consumer.

pub mod biminfo;
pub mod file;
pub mod git;
