//! Parsers for the output of standard command-line tools.
//!
//! Every command is run with `LC_ALL=C`, so headers and number formats are
//! stable.

pub mod parser;
