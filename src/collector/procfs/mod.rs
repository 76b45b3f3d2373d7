//! Parsers for the Linux `/proc` filesystem.
//!
//! Providers read the files through [`HostContext`](crate::collector::HostContext)
//! and hand the content to the pure functions in [`parser`].

pub mod parser;

pub use parser::ParseError;
