//! Error types and result definitions for playlog operations.
//!
//! [`PlaylogError`] carries an [`ErrorKind`], a static description, optional dynamic detail, an
//! optional source error, the callsite location and a captured backtrace. Several errors can be
//! aggregated into one, which happens when a run fails and the operational log append fails too.
//!
//! Every kind belongs to exactly one [`ErrorClass`], the coarse taxonomy used for run reporting.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for playlog operations.
pub type PlaylogResult<T> = Result<T, PlaylogError>;

/// Detailed payload stored for single [`PlaylogError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type for playlog operations.
#[derive(Debug, Clone)]
pub struct PlaylogError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    Single(ErrorPayload),
    Many {
        errors: Vec<PlaylogError>,
        location: &'static Location<'static>,
    },
}

/// Specific categories of errors that can occur during a run.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Fetch Errors
    SourceConnectionFailed,
    SourceAuthenticationFailed,
    SourceRequestFailed,
    SourceResponseInvalid,

    // Schema Errors
    MissingField,
    InvalidTimestamp,

    // Merge Errors
    StoreReadFailed,
    StoreCorrupted,
    WatermarkUnavailable,

    // Persist Errors
    StoreWriteFailed,
    StoreVerificationFailed,

    // Log Errors
    LogAppendFailed,

    // Configuration Errors
    ConfigError,

    // IO & Decoding Errors
    IoError,
    DeserializationError,

    // Unknown / Uncategorized
    Unknown,
}

/// Coarse error taxonomy of a run.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
pub enum ErrorClass {
    /// The raw event window could not be obtained.
    Fetch,
    /// A raw event is missing required fields.
    Schema,
    /// The existing store could not be parsed or no watermark could be established.
    Merge,
    /// The store could not be written.
    Persist,
    /// The operational log could not be appended.
    Log,
    /// The process configuration is invalid.
    Config,
    /// Anything else.
    Other,
}

impl ErrorKind {
    /// Returns the [`ErrorClass`] this kind belongs to.
    pub fn class(&self) -> ErrorClass {
        match self {
            ErrorKind::SourceConnectionFailed
            | ErrorKind::SourceAuthenticationFailed
            | ErrorKind::SourceRequestFailed
            | ErrorKind::SourceResponseInvalid => ErrorClass::Fetch,
            ErrorKind::MissingField | ErrorKind::InvalidTimestamp => ErrorClass::Schema,
            ErrorKind::StoreReadFailed
            | ErrorKind::StoreCorrupted
            | ErrorKind::WatermarkUnavailable => ErrorClass::Merge,
            ErrorKind::StoreWriteFailed | ErrorKind::StoreVerificationFailed => {
                ErrorClass::Persist
            }
            ErrorKind::LogAppendFailed => ErrorClass::Log,
            ErrorKind::ConfigError => ErrorClass::Config,
            ErrorKind::IoError
            | ErrorKind::DeserializationError
            | ErrorKind::Unknown => ErrorClass::Other,
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorClass::Fetch => "fetch error",
            ErrorClass::Schema => "schema error",
            ErrorClass::Merge => "merge error",
            ErrorClass::Persist => "persist error",
            ErrorClass::Log => "log error",
            ErrorClass::Config => "configuration error",
            ErrorClass::Other => "error",
        };
        f.write_str(name)
    }
}

impl PlaylogError {
    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For aggregated errors, returns the kind of the first error or [`ErrorKind::Unknown`]
    /// if the error list is empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { ref errors, .. } => {
                errors.iter().flat_map(|err| err.kinds()).collect()
            }
        }
    }

    /// Returns the [`ErrorClass`] of [`PlaylogError::kind`].
    pub fn class(&self) -> ErrorClass {
        self.kind().class()
    }

    /// Returns the static description of this error.
    pub fn description(&self) -> &str {
        match self.repr {
            ErrorRepr::Single(ref payload) => &payload.description,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.description())
                .unwrap_or("multiple errors"),
        }
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Returns the aggregated errors, if this error is an aggregate.
    pub fn errors(&self) -> Option<&[PlaylogError]> {
        match self.repr {
            ErrorRepr::Single(_) => None,
            ErrorRepr::Many { ref errors, .. } => Some(errors),
        }
    }

    /// Returns the captured backtrace for this error.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self.repr {
            ErrorRepr::Single(ref payload) => Some(payload.backtrace.as_ref()),
            ErrorRepr::Many { .. } => None,
        }
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Renders a single line summary without location or backtrace.
    ///
    /// This is the form written to the operational log.
    pub fn summary(&self) -> String {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                let class = payload.kind.class();
                match payload.detail.as_deref() {
                    Some(detail) => format!(
                        "{class}: {} ({})",
                        payload.description,
                        detail.replace('\n', " ")
                    ),
                    None => format!("{class}: {}", payload.description),
                }
            }
            ErrorRepr::Many { errors, .. } => errors
                .iter()
                .map(PlaylogError::summary)
                .collect::<Vec<_>>()
                .join("; "),
        }
    }

    /// Attaches an originating error to this error and returns the modified instance.
    ///
    /// Has no effect on aggregated errors.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        PlaylogError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            }),
        }
    }
}

impl PartialEq for PlaylogError {
    fn eq(&self, other: &PlaylogError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (ErrorRepr::Many { errors: a, .. }, ErrorRepr::Many { errors: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for PlaylogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                let location = payload.location;
                write!(
                    f,
                    "[{:?}] {} @ {}:{}:{}",
                    payload.kind,
                    payload.description,
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                if let Some(detail) = payload.detail.as_deref() {
                    write!(f, "\n  Detail:")?;
                    for line in detail.lines() {
                        write!(f, "\n    {line}")?;
                    }
                }

                Ok(())
            }
            ErrorRepr::Many { errors, location } => {
                let count = errors.len();
                write!(
                    f,
                    "[Many] {} error{} aggregated @ {}:{}:{}",
                    count,
                    if count == 1 { "" } else { "s" },
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                for (index, error) in errors.iter().enumerate() {
                    let rendered = error.to_string();
                    let mut lines = rendered.lines();
                    if let Some(first_line) = lines.next() {
                        write!(f, "\n  {}. {}", index + 1, first_line)?;
                    }
                    for line in lines {
                        write!(f, "\n     {line}")?;
                    }
                }

                Ok(())
            }
        }
    }
}

impl error::Error for PlaylogError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source.as_ref() as &(dyn error::Error + 'static)),
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

/// Creates a [`PlaylogError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for PlaylogError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> PlaylogError {
        PlaylogError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`PlaylogError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for PlaylogError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> PlaylogError {
        PlaylogError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Aggregates several errors into one.
///
/// A vector with exactly one error yields that error unchanged.
impl<E> From<Vec<E>> for PlaylogError
where
    E: Into<PlaylogError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> PlaylogError {
        let location = Location::caller();
        let mut errors: Vec<PlaylogError> = errors.into_iter().map(Into::into).collect();

        if errors.len() == 1 {
            if let Some(error) = errors.pop() {
                return error;
            }
        }

        PlaylogError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

/// Converts [`std::io::Error`] to [`PlaylogError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for PlaylogError {
    #[track_caller]
    fn from(err: std::io::Error) -> PlaylogError {
        let detail = err.to_string();
        PlaylogError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`serde_json::Error`] to [`PlaylogError`].
///
/// Syntax and data errors map to [`ErrorKind::DeserializationError`], I/O errors to
/// [`ErrorKind::IoError`].
impl From<serde_json::Error> for PlaylogError {
    #[track_caller]
    fn from(err: serde_json::Error) -> PlaylogError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => {
                (ErrorKind::DeserializationError, "JSON deserialization failed")
            }
        };

        let detail = err.to_string();
        PlaylogError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}
