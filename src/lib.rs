//! Remux media files into a different container format without re-encoding.
//!
//! The crate is built on top of a thin native wrapper around the FFmpeg
//! libraries (see the `format`, `codec`, `packet` and `time` modules). The
//! remux pipeline itself (`remux`) works with the container abstraction
//! defined in the `container` module, so it can be driven either by real
//! FFmpeg containers or by any other implementation of the container traits.

pub mod cli;
pub mod codec;
pub mod container;
pub mod format;
pub mod packet;
pub mod remux;
pub mod stream_map;
pub mod time;

use std::{
    ffi::CStr,
    fmt::{self, Display, Formatter},
    os::raw::{c_char, c_int},
    sync::RwLock,
};

use lazy_static::lazy_static;

pub use crate::remux::{RemuxReport, RemuxRequest, Remuxer};

lazy_static! {
    /// Log callback.
    static ref LOG_CALLBACK: RwLock<LogCallback> = {
        RwLock::new(LogCallback::new())
    };
}

extern "C" {
    fn ffw_set_log_callback(callback: extern "C" fn(c_int, *const c_char));

    fn ffw_error_eof() -> c_int;
    fn ffw_error_would_block() -> c_int;
    fn ffw_error_unknown() -> c_int;
    fn ffw_error_from_posix(error: c_int) -> c_int;
    fn ffw_error_get_error_string(error: c_int, buffer: *mut c_char, buffer_size: usize);
}

/// A C function passed to the native library as a log callback. The function
/// calls a closure saved in LOG_CALLBACK (if any).
extern "C" fn log_callback(level: c_int, message: *const c_char) {
    let msg = unsafe { CStr::from_ptr(message as _) };

    // messages above the FFmpeg log level are filtered out by the native side
    if let Ok(callback) = LOG_CALLBACK.read() {
        callback.call(level as _, msg.to_string_lossy().trim_end());
    }
}

/// Wrapper around a log closure.
struct LogCallback {
    callback: Option<Box<dyn Fn(i32, &str) + Send + Sync>>,
}

impl LogCallback {
    /// Create a new empty log callback.
    fn new() -> LogCallback {
        LogCallback { callback: None }
    }

    /// Store a log callback closure.
    fn set<F>(&mut self, callback: F)
    where
        F: 'static + Fn(i32, &str) + Send + Sync,
    {
        self.callback = Some(Box::new(callback));
    }

    /// Call the stored closure (if any).
    fn call(&self, level: i32, message: &str) {
        if let Some(callback) = self.callback.as_ref() {
            callback(level, message);
        }
    }
}

/// Set log callback for FFmpeg. All log messages from FFmpeg will be passed
/// to a given closure.
pub fn set_log_callback<F>(callback: F)
where
    F: 'static + Fn(i32, &str) + Send + Sync,
{
    // a poisoned lock still holds a usable callback slot
    let mut slot = match LOG_CALLBACK.write() {
        Ok(slot) => slot,
        Err(poisoned) => poisoned.into_inner(),
    };

    slot.set(callback);

    unsafe {
        ffw_set_log_callback(log_callback);
    }
}

/// Kind of an error.
///
/// Every kind has a stable numeric code that is part of the user-visible
/// error output.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Success,
    Failure,
    MissingArguments,
    InvalidArguments,
    FileError,
    AllocationError,
}

impl ErrorKind {
    /// Get the numeric code of this kind.
    pub const fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::MissingArguments => 2,
            Self::InvalidArguments => 3,
            Self::FileError => 4,
            Self::AllocationError => 5,
        }
    }

    /// Get a human-readable name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Failure => "Failure",
            Self::MissingArguments => "Missing arguments",
            Self::InvalidArguments => "Invalid arguments",
            Self::FileError => "File error",
            Self::AllocationError => "Allocation error",
        }
    }

    /// Check if this kind is related to command line arguments.
    pub const fn is_argument_error(self) -> bool {
        matches!(self, Self::MissingArguments | Self::InvalidArguments)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        f.write_str(self.name())
    }
}

/// An error.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{msg}")]
pub struct Error {
    kind: ErrorKind,
    msg: String,
    code: Option<c_int>,
}

impl Error {
    /// Create a new generic error.
    pub fn new<T>(msg: T) -> Error
    where
        T: ToString,
    {
        Self::with_kind(ErrorKind::Failure, msg)
    }

    /// Create a new error of a given kind.
    pub fn with_kind<T>(kind: ErrorKind, msg: T) -> Error
    where
        T: ToString,
    {
        Error {
            kind,
            msg: msg.to_string(),
            code: None,
        }
    }

    /// Create a new "missing arguments" error.
    pub fn missing_arguments<T>(msg: T) -> Error
    where
        T: ToString,
    {
        Self::with_kind(ErrorKind::MissingArguments, msg)
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments<T>(msg: T) -> Error
    where
        T: ToString,
    {
        Self::with_kind(ErrorKind::InvalidArguments, msg)
    }

    /// Create a new file error.
    pub fn file<T>(msg: T) -> Error
    where
        T: ToString,
    {
        Self::with_kind(ErrorKind::FileError, msg)
    }

    /// Create a new allocation error.
    pub fn allocation<T>(msg: T) -> Error
    where
        T: ToString,
    {
        Self::with_kind(ErrorKind::AllocationError, msg)
    }

    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Get the underlying FFmpeg error code (if any).
    pub fn raw_error_code(&self) -> Option<i32> {
        self.code.map(|code| code as i32)
    }

    /// Re-tag this error with a given kind and prefix its message with a
    /// given context. The native error code (if any) is preserved.
    pub fn context<T>(self, kind: ErrorKind, context: T) -> Error
    where
        T: Display,
    {
        Error {
            kind,
            msg: format!("{}: {}", context, self.msg),
            code: self.code,
        }
    }

    /// Create a new FFmpeg error from a given FFmpeg error code.
    pub(crate) fn from_raw_error_code(code: c_int) -> Error {
        let mut buffer = [0u8; 256];

        let buffer_ptr = buffer.as_mut_ptr();
        let buffer_len = buffer.len();

        let msg = unsafe {
            ffw_error_get_error_string(code, buffer_ptr as _, buffer_len as _);

            CStr::from_ptr(buffer.as_ptr() as _)
                .to_string_lossy()
                .into_owned()
        };

        Error {
            kind: ErrorKind::Failure,
            msg,
            code: Some(code),
        }
    }
}
