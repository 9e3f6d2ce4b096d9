//! Printing forms back to reader syntax.

use crate::form::{Form, KeyValue};
use std::fmt;

/// Quotes a string the way the reader unescapes it.
fn write_string(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in value.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '"' => f.write_str("\\\"")?,
            '\n' => f.write_str("\\n")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

fn write_spaced(f: &mut fmt::Formatter<'_>, forms: &[Form]) -> fmt::Result {
    for (idx, form) in forms.iter().enumerate() {
        if idx > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", form)?;
    }
    Ok(())
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Form::Integer32(v) => write!(f, "{}", v),
            // A float with no fractional part must keep one, or it reads back as Integer32.
            Form::Float64(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{}.0", v),
            Form::Float64(v) => write!(f, "{}", v),
            Form::String(s) => write_string(f, s),
            Form::Bool(b) => write!(f, "{}", b),
            Form::Undefined => f.write_str("none"),
            Form::Symbol(symbol) => write!(f, "{}", symbol),
            Form::PropertyAccess(access) => write!(f, "{}", access),
            Form::List(items) => {
                f.write_str("(")?;
                write_spaced(f, items)?;
                f.write_str(")")
            }
            Form::LiteralArray(items) => {
                f.write_str("[")?;
                write_spaced(f, items)?;
                f.write_str("]")
            }
            Form::KeyValues(entries) => {
                f.write_str("{")?;
                for entry in entries {
                    f.write_str(" ")?;
                    match entry {
                        KeyValue::Shorthand(symbol) => write!(f, "{}", symbol)?,
                        KeyValue::Pair { key, value } => match key {
                            Form::String(s) => {
                                write_string(f, s)?;
                                write!(f, " : {}", value)?;
                            }
                            // Other atoms print as one bare token, read back as `key:`.
                            key if key.is_atom() => write!(f, "{}: {}", key, value)?,
                            key => write!(f, "{} : {}", key, value)?,
                        },
                    }
                }
                f.write_str(" }")
            }
        }
    }
}
