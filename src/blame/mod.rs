// src/blame/mod.rs

// Git blame extraction: the query adapter and the porcelain parser.

pub mod parser;
pub mod query;

pub use parser::{parse_porcelain, ParsedBlame};
pub use query::{BlameQuery, GitCliBlame};
