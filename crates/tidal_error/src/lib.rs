use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

/// Broad category of an error.
///
/// Every error is fatal to the plan that produced it. The kind exists so
/// callers (and tests) can tell failures apart without matching on message
/// text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Row or column index out of range.
    IndexError,
    /// Operands (or a value and its container) have different types.
    TypeMismatch,
    /// Operation isn't defined for the given type.
    UnsupportedType,
    /// Filter predicate didn't produce booleans.
    NonBooleanPredicate,
    /// Column name couldn't be resolved against a schema.
    SchemaResolution,
    /// Structural invariant broken, e.g. columns of differing lengths.
    InvariantViolation,
    NotImplemented,
    Io,
    Parse,
    Internal,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IndexError => "Index error",
            Self::TypeMismatch => "Type mismatch",
            Self::UnsupportedType => "Unsupported type",
            Self::NonBooleanPredicate => "Non-boolean predicate",
            Self::SchemaResolution => "Schema resolution error",
            Self::InvariantViolation => "Invariant violation",
            Self::NotImplemented => "Not implemented",
            Self::Io => "IO error",
            Self::Parse => "Parse error",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct DbError {
    /// Boxed to keep `Result<T>` small on the happy path.
    inner: Box<DbErrorInner>,
}

#[derive(Debug)]
struct DbErrorInner {
    kind: ErrorKind,
    msg: String,
    source: Option<Box<dyn Error + Send + Sync>>,
    /// Extra key/value pairs printed after the message.
    fields: Vec<(String, String)>,
    backtrace: Backtrace,
}

impl DbError {
    /// Create a new error with the `Internal` kind.
    pub fn new(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Internal, msg)
    }

    pub fn with_kind(kind: ErrorKind, msg: impl Into<String>) -> Self {
        DbError {
            inner: Box::new(DbErrorInner {
                kind,
                msg: msg.into(),
                source: None,
                fields: Vec::new(),
                backtrace: Backtrace::capture(),
            }),
        }
    }

    pub fn with_source(msg: impl Into<String>, source: Box<dyn Error + Send + Sync>) -> Self {
        let mut err = Self::new(msg);
        err.inner.source = Some(source);
        err
    }

    /// Attach a key/value pair that gets printed alongside the message.
    pub fn with_field(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.inner.fields.push((key.into(), value.to_string()));
        self
    }

    /// Replace the kind of this error.
    pub fn kind_of(mut self, kind: ErrorKind) -> Self {
        self.inner.kind = kind;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.inner.kind
    }

    pub fn message(&self) -> &str {
        &self.inner.msg
    }

    pub fn get_field(&self, key: &str) -> Option<&str> {
        self.inner
            .fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_backtrace(&self) -> Option<&Backtrace> {
        match self.inner.backtrace.status() {
            BacktraceStatus::Captured => Some(&self.inner.backtrace),
            _ => None,
        }
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.inner.kind, self.inner.msg)?;

        if !self.inner.fields.is_empty() {
            f.write_str(" (")?;
            for (idx, (k, v)) in self.inner.fields.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{k}: {v}")?;
            }
            f.write_str(")")?;
        }

        if let Some(source) = &self.inner.source {
            write!(f, "\nError source: {source}")?;
        }

        if let Some(bt) = self.get_backtrace() {
            write!(f, "\nBacktrace: {bt}")?;
        }

        Ok(())
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl From<fmt::Error> for DbError {
    fn from(value: fmt::Error) -> Self {
        DbError::with_source("Format error", Box::new(value))
    }
}

impl From<std::io::Error> for DbError {
    fn from(value: std::io::Error) -> Self {
        DbError::with_source("IO error", Box::new(value)).kind_of(ErrorKind::Io)
    }
}

/// Shorthand for returning a `NotImplemented` error.
#[macro_export]
macro_rules! not_implemented {
    ($($arg:tt)+) => {{
        let msg = format!($($arg)+);
        return Err($crate::DbError::with_kind(
            $crate::ErrorKind::NotImplemented,
            format!("Not yet implemented: {msg}"),
        ));
    }};
}

/// Extension for converting options into results.
pub trait OptionExt<T> {
    /// Errors with a message naming the missing field.
    fn required(self, field: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, field: &'static str) -> Result<T> {
        match self {
            Some(v) => Ok(v),
            None => Err(DbError::new(format!(
                "Missing field '{field}'"
            ))),
        }
    }
}

/// Extension for wrapping foreign errors with a message.
pub trait ResultExt<T, E> {
    fn context(self, msg: &'static str) -> Result<T>;
    fn context_fn<F: Fn() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Error + Send + Sync + 'static> ResultExt<T, E> for std::result::Result<T, E> {
    fn context(self, msg: &'static str) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(DbError::with_source(msg, Box::new(e))),
        }
    }

    fn context_fn<F: Fn() -> String>(self, f: F) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(DbError::with_source(f(), Box::new(e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_fields() {
        let err = DbError::with_kind(ErrorKind::TypeMismatch, "Cannot add")
            .with_field("left", "Int32")
            .with_field("right", "Float64");

        let s = err.to_string();
        assert!(s.starts_with("Type mismatch: Cannot add (left: Int32, right: Float64)"));
        assert_eq!(Some("Float64"), err.get_field("right"));
    }

    #[test]
    fn default_kind_is_internal() {
        let err = DbError::new("oops");
        assert_eq!(ErrorKind::Internal, err.kind());
        assert_eq!(ErrorKind::Parse, err.kind_of(ErrorKind::Parse).kind());
    }

    #[test]
    fn io_error_has_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err = DbError::from(io);
        assert_eq!(ErrorKind::Io, err.kind());
        assert!(err.source().is_some());
    }

    #[test]
    fn not_implemented_returns_early() {
        fn unimpl() -> Result<()> {
            not_implemented!("feature {}", 4);
        }

        let err = unimpl().unwrap_err();
        assert_eq!(ErrorKind::NotImplemented, err.kind());
        assert!(err.message().contains("feature 4"));
    }

    #[test]
    fn required_option() {
        let v: Option<i32> = None;
        assert!(v.required("value").is_err());
        assert_eq!(3, Some(3).required("value").unwrap());
    }
}
