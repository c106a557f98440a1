//! This module encapsulates all the wrapper code to bundle the forest search into a complete
//! binary.

mod config;
mod io;
mod logic;

pub use self::config::Config;
pub use self::io::{format_output, read_input, write_output};
pub use self::logic::{compute, Report};
