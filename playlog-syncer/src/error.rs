use playlog::error::PlaylogError;
use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

/// Returns whether terminal output should include backtraces.
fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

/// Result type for syncer operations.
pub type SyncerResult<T> = Result<T, SyncerError>;

/// Captured backtrace wrapper to avoid thiserror's unstable feature detection.
pub struct CapturedBacktrace(Backtrace);

impl CapturedBacktrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Debug for CapturedBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for the syncer process.
///
/// Wraps [`PlaylogError`] for failed runs and carries configuration and startup failures that
/// happen before a run can be attempted.
#[derive(Debug)]
pub enum SyncerError {
    /// The run failed.
    Playlog(PlaylogError),
    /// Configuration or process setup error.
    Config(Box<dyn Error + Send + Sync>, CapturedBacktrace),
}

impl SyncerError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> String {
        match self {
            SyncerError::Playlog(err) => err.class().to_string(),
            SyncerError::Config(_, _) => "configuration error".to_string(),
        }
    }

    /// Returns the backtrace for this error.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            SyncerError::Playlog(err) => err.backtrace(),
            SyncerError::Config(_, cb) => Some(&cb.0),
        }
    }

    /// Creates a configuration error from any source.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        SyncerError::Config(Box::new(err), CapturedBacktrace::capture())
    }

    /// Returns a user-oriented report for terminal output.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("syncer failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {}\n", self));

        if !matches!(self, SyncerError::Playlog(err) if err.errors().is_some()) {
            let mut source = Error::source(self);
            let mut idx = 1usize;
            while let Some(err) = source {
                out.push_str(&format!("cause {idx}: {err}\n"));
                source = err.source();
                idx += 1;
            }
        }

        if should_render_backtrace()
            && let Some(backtrace) = self.backtrace()
        {
            out.push_str("backtrace:\n");
            out.push_str(&backtrace.to_string());
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        out
    }
}

impl fmt::Display for SyncerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncerError::Playlog(err) => write!(f, "{err}"),
            SyncerError::Config(source, _) => write!(f, "configuration error: {source}"),
        }
    }
}

impl Error for SyncerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SyncerError::Playlog(err) => err.source(),
            SyncerError::Config(source, _) => Some(source.as_ref()),
        }
    }
}

impl From<PlaylogError> for SyncerError {
    fn from(err: PlaylogError) -> Self {
        SyncerError::Playlog(err)
    }
}
