//! Form tree types for Tendril.
//!
//! This crate defines the tree the reader produces and the transpiler
//! consumes. Every parsed unit of source is a [`Form`]; a sequence of
//! top-level or body statements is a [`Block`].
//!
//! # Form syntax
//!
//! ```text
//! 42 -1.5 "text" true false none   ; atoms
//! name  console.log                ; symbols and property access
//! (plusF 1 2)                      ; call / list
//! [1 2 3]                          ; literal array
//! { a: 1 "b c": 2 shorthand }      ; key-values
//! ```

mod form;
mod print;

pub use form::{Block, CuSymbol, Form, Id, InvalidPropertyAccess, KeyValue, PropertyAccess};
