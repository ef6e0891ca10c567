//! Captured error occurrences.
//!
//! # Responsibilities
//! - Hold the message and backtrace frames of one error
//! - Capture Rust backtraces and reduce them to application frames
//! - Recover message and location from caught panics
//!
//! # Design Decisions
//! - Frames are plain strings, `"<file>:<line>:<column> in <function>"` when
//!   captured here, so callers may also supply their own
//! - Panic locations need a hook; installing it is opt-in and process-wide

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, PanicHookInfo};
use std::sync::Once;

/// One error occurrence to be reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    message: String,
    backtrace: Vec<String>,
}

impl Fault {
    /// A fault with no backtrace.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            backtrace: Vec::new(),
        }
    }

    /// Replace the backtrace with explicit frames, innermost first.
    pub fn with_backtrace<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backtrace = frames.into_iter().map(Into::into).collect();
        self
    }

    /// A fault carrying the backtrace of the current call site.
    ///
    /// Follows `RUST_BACKTRACE`/`RUST_LIB_BACKTRACE`: when capture is
    /// disabled the fault has no frames.
    pub fn capture(message: impl Into<String>) -> Self {
        Self::new(message).with_backtrace(application_frames(&Backtrace::capture()))
    }

    pub fn from_display<E: fmt::Display + ?Sized>(error: &E) -> Self {
        Self::new(error.to_string())
    }

    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        Self::new(error.to_string())
    }

    /// Build a fault from a payload caught with `catch_unwind`.
    ///
    /// When [`install_panic_hook`] is active, the location and backtrace the
    /// hook recorded on this thread are attached, provided they were recorded
    /// for a panic with the same message.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = panic_message(payload);
        let recorded = LAST_PANIC.with(|last| last.borrow_mut().take());
        match recorded {
            Some(recorded) if recorded.message == message => {
                Self::new(message).with_backtrace(recorded.frames)
            }
            _ => Self::new(message),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn backtrace(&self) -> &[String] {
        &self.backtrace
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl<E: std::error::Error> From<&E> for Fault {
    fn from(error: &E) -> Self {
        Self::from_display(error)
    }
}

/// Message carried by a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// What the hook saw of the last panic on this thread.
struct RecordedPanic {
    message: String,
    frames: Vec<String>,
}

thread_local! {
    static LAST_PANIC: RefCell<Option<RecordedPanic>> = const { RefCell::new(None) };
}

/// Forget the panic recorded on this thread, if any.
///
/// Called before running code whose panics get reported, and after catching
/// panics that never become a fault.
pub(crate) fn clear_recorded_panic() {
    LAST_PANIC.with(|last| last.borrow_mut().take());
}

static PANIC_HOOK: Once = Once::new();

/// Record the location and backtrace of every panic so that
/// [`Fault::from_panic`] can report where it happened.
///
/// Chains the previously installed hook. Calling it more than once is a no-op.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let recorded = RecordedPanic {
                message: panic_message(info.payload()),
                frames: panic_frames(info),
            };
            LAST_PANIC.with(|last| *last.borrow_mut() = Some(recorded));
            previous(info);
        }));
    });
}

fn panic_frames(info: &PanicHookInfo<'_>) -> Vec<String> {
    let mut frames = Vec::new();
    if let Some(location) = info.location() {
        frames.push(format!(
            "{}:{}:{} in <panic>",
            location.file(),
            location.line(),
            location.column()
        ));
    }
    frames.extend(application_frames(&Backtrace::force_capture()));
    frames
}

/// Symbols belonging to the runtime or to this crate rather than the
/// application.
const RUNTIME_PREFIXES: &[&str] = &[
    "std::",
    "core::",
    "alloc::",
    "test::",
    "<std::",
    "<core::",
    "<alloc::",
    "__rust",
    "rust_begin_unwind",
    "graylog_exceptions::",
    "<graylog_exceptions::",
];

/// Source paths of the standard library and of registry dependencies.
fn is_foreign_location(location: &str) -> bool {
    location.starts_with("/rustc/")
        || location.contains("/.cargo/registry/")
        || location.contains("/.cargo/git/")
        || location.contains("/library/std/src/")
        || location.contains("/library/core/src/")
}

/// Reduce a backtrace to frames that have a source location and do not
/// belong to the runtime, to dependencies, or to this crate.
pub(crate) fn application_frames(backtrace: &Backtrace) -> Vec<String> {
    keep_application_frames(parse_backtrace(&backtrace.to_string()))
}

fn keep_application_frames(frames: Vec<RawFrame>) -> Vec<String> {
    frames
        .into_iter()
        .filter(|frame| {
            !RUNTIME_PREFIXES
                .iter()
                .any(|prefix| frame.function.starts_with(prefix))
        })
        .filter_map(|frame| {
            let location = frame.location?;
            if is_foreign_location(&location) {
                return None;
            }
            Some(format!("{} in {}", location, frame.function))
        })
        .collect()
}

#[derive(Debug, PartialEq, Eq)]
struct RawFrame {
    function: String,
    location: Option<String>,
}

/// Parse the `Display` form of `std::backtrace::Backtrace`:
///
/// ```text
///    0: app::handler
///              at ./src/handler.rs:10:5
/// ```
fn parse_backtrace(rendered: &str) -> Vec<RawFrame> {
    let mut frames: Vec<RawFrame> = Vec::new();
    for line in rendered.lines() {
        let line = line.trim();
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                if frame.location.is_none() {
                    frame.location = Some(location.trim_start_matches("./").to_string());
                }
            }
            continue;
        }
        if let Some((index, function)) = line.split_once(": ") {
            if index.chars().all(|c| c.is_ascii_digit()) && !index.is_empty() {
                frames.push(RawFrame {
                    function: function.to_string(),
                    location: None,
                });
            }
        }
    }
    frames
}
