use std::fmt;

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Numeric,
    Text,
    Date,
    Boolean,
}

impl SqlType {
    pub fn as_sql(self) -> &'static str {
        match self {
            SqlType::Integer => "integer",
            SqlType::Numeric => "numeric",
            SqlType::Text => "text",
            SqlType::Date => "date",
            SqlType::Boolean => "boolean",
        }
    }
}

/// A positional argument for a procedure or function call.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
    Int(i32),
    Numeric(f64),
    Text(String),
    Date(NaiveDate),
    Bool(bool),
    /// A typed SQL NULL for an absent optional input.
    Null(SqlType),
    /// Slot of an output parameter; rendered as a bare `NULL`.
    Out,
}

impl SqlArg {
    pub fn text(value: impl Into<String>) -> Self {
        SqlArg::Text(value.into())
    }

    pub fn opt_text(value: Option<String>) -> Self {
        value.map_or(SqlArg::Null(SqlType::Text), SqlArg::Text)
    }

    pub fn opt_numeric(value: Option<f64>) -> Self {
        value.map_or(SqlArg::Null(SqlType::Numeric), SqlArg::Numeric)
    }

    pub fn opt_bool(value: Option<bool>) -> Self {
        value.map_or(SqlArg::Null(SqlType::Boolean), SqlArg::Bool)
    }

    /// Whether the argument travels as a bind parameter rather than a literal.
    pub fn is_bound(&self) -> bool {
        !matches!(self, SqlArg::Null(_) | SqlArg::Out)
    }

    fn sql_type(&self) -> Option<SqlType> {
        match self {
            SqlArg::Int(_) => Some(SqlType::Integer),
            SqlArg::Numeric(_) => Some(SqlType::Numeric),
            SqlArg::Text(_) => Some(SqlType::Text),
            SqlArg::Date(_) => Some(SqlType::Date),
            SqlArg::Bool(_) => Some(SqlType::Boolean),
            SqlArg::Null(ty) => Some(*ty),
            SqlArg::Out => None,
        }
    }
}

impl fmt::Display for SqlArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlArg::Int(v) => write!(f, "{v}"),
            SqlArg::Numeric(v) => write!(f, "{v}"),
            SqlArg::Text(v) => write!(f, "'{v}'"),
            SqlArg::Date(v) => write!(f, "'{v}'"),
            SqlArg::Bool(v) => write!(f, "{v}"),
            SqlArg::Null(_) => f.write_str("NULL"),
            SqlArg::Out => f.write_str("OUT"),
        }
    }
}

/// Comma-separated rendering of call arguments for diagnostics.
pub fn render_params(args: &[SqlArg]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds the argument list of a `CALL`/`SELECT`, numbering bound arguments
/// `$1..$n` with explicit casts so overload resolution sees declared types.
pub(crate) fn placeholders(args: &[SqlArg]) -> String {
    let mut next = 0;
    args.iter()
        .map(|arg| match (arg, arg.sql_type()) {
            (SqlArg::Out, _) | (_, None) => "NULL".to_string(),
            (SqlArg::Null(ty), _) => format!("NULL::{}", ty.as_sql()),
            (_, Some(ty)) => {
                next += 1;
                format!("${next}::{}", ty.as_sql())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Procedure and function names are interpolated, so only plain
/// (optionally schema-qualified) identifiers are allowed.
pub(crate) fn validate_identifier(name: &str) -> Result<(), String> {
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() <= 2 && parts.iter().all(|part| valid_part(part)) {
        Ok(())
    } else {
        Err(format!("{name:?} is not a valid routine name"))
    }
}
