//! Rule-driven feed extraction
//!
//! Turns a parsed HTML document into feed data, driven by a declarative
//! rule set:
//! - Info: flat feed metadata, one value per rule
//! - Entries: ordered item records, aligned by index across field
//!   selectors or resolved inside one container selector per entry
//! - Rendering: a generic Atom layout, or any `Render` implementation
//! - FFI: JSON-in, JSON-out entry points for C callers

pub mod dates;
pub mod error;
pub mod extractors;
pub mod ffi;
pub mod render;
pub mod rules;

pub use dates::{ChronoDateParser, DateParser};
pub use error::{Error, Result};
pub use extractors::*;
pub use ffi::*;
pub use render::{AtomRenderer, Render};
pub use rules::*;
