//! Output generation for stored articles.
//!
//! # Submodules
//!
//! - [`json`]: writes article records as a JSON array to stdout or a file

pub mod json;
