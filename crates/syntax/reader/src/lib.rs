//! Tendril source text to form trees.
//!
//! The [`Scanner`] splits text into tokens lazily; the reader parses the
//! tokens into [`Form`](rhizome_tendril_ir::Form)s.
//!
//! ```
//! use rhizome_tendril_ir::Form;
//! use rhizome_tendril_syntax_reader::read_form;
//!
//! assert_eq!(read_form("123").unwrap(), Form::Integer32(123));
//! ```

mod reader;
mod scanner;

pub use reader::{read_block, read_form, ParseError};
pub use scanner::{Scanner, Token};
