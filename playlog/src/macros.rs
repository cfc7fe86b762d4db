//! Shorthands for building [`crate::error::PlaylogError`] values at the failure site.

/// Builds a [`crate::error::PlaylogError`] located at the call site.
///
/// The third argument, when present, becomes the detail shown in the operational log summary.
/// Anything implementing `Display` works; `detail = value` hands over an owned [`String`]
/// without formatting it again. A trailing `source: err` keeps the underlying error as cause.
///
/// ```ignore
/// playlog_error!(ErrorKind::StoreCorrupted, "Store has no header");
/// playlog_error!(ErrorKind::StoreWriteFailed, "Store write failed", path.display(), source: err);
/// ```
#[macro_export]
macro_rules! playlog_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::PlaylogError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::PlaylogError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, detail = $detail:expr) => {
        $crate::error::PlaylogError::from(($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, detail = $detail:expr, source: $source:expr) => {
        $crate::error::PlaylogError::from(($kind, $desc, $detail)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::PlaylogError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::PlaylogError::from(($kind, $desc, $detail.to_string())).with_source($source)
    };
}

/// Returns early with `Err` of a [`playlog_error!`] built from the same arguments.
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::playlog_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::playlog_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, detail = $detail:expr) => {
        return ::core::result::Result::Err($crate::playlog_error!($kind, $desc, detail = $detail))
    };
    ($kind:expr, $desc:expr, detail = $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::playlog_error!(
            $kind,
            $desc,
            detail = $detail,
            source: $source
        ))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::playlog_error!($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::playlog_error!(
            $kind,
            $desc,
            $detail,
            source: $source
        ))
    };
}
