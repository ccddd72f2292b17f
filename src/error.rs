//! Error handling.
//!
//! Failures inside the shim fall into three severities. *Fatal* conditions
//! (no usable GL visual, drawing before initialization, a window painted
//! without a display callback) print a labeled message and terminate the
//! process, because a legacy client has no way to recover from them.
//! *Warnings* (bogus ids, mutating an in-use menu, unsupported cursor)
//! are logged and the operation returns a harmless default. Everything
//! else is a silent no-op.
//!
//! Internal helpers return [`Result`]/[`Option`] and leave the
//! severity decision to the public surface.

use std::fmt;
use std::process;

/// A specialized [`Result`] type for toolkit and shim operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for operations crossing the toolkit boundary.
#[derive(Debug, Clone)]
pub struct Error {
    /// Extra context from the toolkit, when it could be obtained.
    detail: Option<String>,

    /// The simplified error kind to match on.
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self { detail: None, kind }
    }

    #[allow(dead_code)]
    pub(crate) fn with_detail(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self { detail: Some(detail.into()), kind }
    }

    /// The underlying error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail.as_ref() {
            Some(detail) => write!(f, "{}: {}", self.kind.as_str(), detail),
            None => f.write_str(self.kind.as_str()),
        }
    }
}

impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

/// General categories of failure at the toolkit boundary.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ErrorKind {
    /// No GL-capable visual matches the requested display mode.
    NoGlVisual,

    /// Direct rendering was mandated but only indirect is available.
    DirectRenderingUnavailable,

    /// The toolkit refused to bind the drawing surface for rendering.
    BadDrawable,

    /// The argument does not name a live window.
    BadWindow,

    /// The argument does not name a live menu.
    BadMenu,

    /// A structural menu edit was attempted while a popup is open.
    MenuInUse,

    /// The submenu graph exceeded the fixed nesting bound.
    MenuTooDeep,

    /// The platform lacks a required capability.
    NotSupported(&'static str),

    /// The toolkit reported a failure it could not classify.
    Platform,
}

impl ErrorKind {
    pub(crate) fn as_str(&self) -> &'static str {
        use ErrorKind::*;
        match *self {
            NoGlVisual => "no appropriate OpenGL-capable visual found",
            DirectRenderingUnavailable => "can't create direct OpenGL visual",
            BadDrawable => "can't begin drawing on the GL surface",
            BadWindow => "argument does not name a live window",
            BadMenu => "argument does not name a live menu",
            MenuInUse => "menu is in use",
            MenuTooDeep => "menu exceeds the maximal nesting depth",
            NotSupported(reason) => reason,
            Platform => "toolkit error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reports an unrecoverable condition and terminates the process.
///
/// Used for setup failures a GLUT-style client cannot observe, let alone
/// handle: the legacy API has no error return channel.
pub(crate) fn raise_fatal(func: &str, msg: fmt::Arguments<'_>) -> ! {
    log::error!("({func}): {msg}");
    eprintln!("glutk error ({func}): {msg}");
    process::exit(2)
}

macro_rules! fatal {
    ($func:expr, $($arg:tt)*) => {
        $crate::error::raise_fatal($func, format_args!($($arg)*))
    };
}

/// Reports a recoverable misuse; the caller returns a harmless default.
macro_rules! warning {
    ($func:expr, $($arg:tt)*) => {
        log::warn!("({}): {}", $func, format_args!($($arg)*))
    };
}

pub(crate) use {fatal, warning};
