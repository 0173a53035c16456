//! This crate turns `.bib` files into a paper shelf in pure, safe rust.
//!
//! `.bib` files are popular in reference management since many resources
//! allow to export metadata in a BibTeχ or BibLaTeχ file. One entry
//! in such a file can look like this:
//!
//! ```tex
//! @article{hopper1952,
//!     author = {Grace Hopper},
//!     title  = {The Education of a Computer},
//!     year   = {1952},
//!     file   = {:papers/hopper1952.pdf:application/pdf}
//! }
//! ```
//!
//! Files found in the wild are rarely that tidy. Exporters disagree on
//! quoting, hand-edited files carry unbalanced braces and stray prose,
//! and the formal grammar is not well-specified anyway. So this parser
//! is deliberately forgiving: whatever cannot be understood is skipped
//! (and tallied in [`SkipStats`]), never fatal. The records that do come
//! out are flat [`Paper`] values with cleaned-up titles and authors, a
//! best-effort year and the bare filename of the attached PDF, ready to
//! be matched against a folder of files via [`FileIndex`] and
//! [`attach_files`].
//!
//! The API is built around the idea of iterating over the file's
//! entries:
//!
//! ```rust
//! use bibshelf::Parser;
//! use std::str::FromStr;
//! fn main() -> Result<(), bibshelf::Error> {
//!     // let p = Parser::from_file("library.bib")?;
//!     let p = Parser::from_str(
//!         "@book{tolkien1937,\n  author = {J. R. R. Tolkien},\n  title = {The Hobbit},\n  year = {1937}\n}",
//!     )?;
//!     for result in p.papers("shelf:fantasy") {
//!         let paper = result?;
//!         println!("{} ({}) by {}", paper.title, paper.year, paper.authors.join(", "));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Around the parsing core there is just enough shelf bookkeeping for a
//! small frontend: read/to-read/favorite flags per paper
//! ([`StatusStore`]), remembered locations ([`Preferences`]) and
//! query matching plus title ordering ([`filter_papers`],
//! [`sort_by_title`]).

mod errors;
mod fields;
mod filter;
mod latex;
mod paper;
mod parser;
mod prefs;
mod resolve;
mod segment;
mod status;

pub use crate::errors::{Error, SkipStats};
pub use crate::filter::{filter_papers, matches_query, sort_by_title};
pub use crate::latex::clean_latex;
pub use crate::paper::Paper;
pub use crate::parser::{Papers, Parser};
pub use crate::prefs::Preferences;
pub use crate::resolve::{attach_files, attach_files_with_progress, FileIndex};
pub use crate::status::{StatusFlags, StatusKind, StatusStore};
