//! Caller context for high-severity records.
//!
//! The public entry points are `#[track_caller]`, so the call site arrives
//! here as a [`Location`]. The live stack is walked until the frame sitting at
//! that location is found; `skip` counts further frames outward from it.
//! Without debug info the walk finds nothing and the record goes out plain.

use std::{borrow::Cow, panic::Location, path::Path};

use crate::log::log_level::LogLevel;

const MAX_FILE_CHARS: usize = 20;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub file: String,
    pub line: u32,
    /// Bare function name, without module path; `None` when unresolved.
    pub function: Option<String>,
}

struct ResolvedFrame {
    file: Option<String>,
    line: Option<u32>,
    function: Option<String>,
}

impl ResolvedFrame {
    fn from_symbol(symbol: &backtrace::Symbol) -> Self {
        Self {
            file: symbol.filename().map(|p| p.display().to_string()),
            line: symbol.lineno(),
            function: symbol.name().map(|n| bare_function_name(&format!("{n:#}"))),
        }
    }

    fn is_at(&self, anchor: &Location<'_>) -> bool {
        self.line == Some(anchor.line())
            && self
                .file
                .as_deref()
                .is_some_and(|f| Path::new(f).ends_with(anchor.file()))
    }
}

impl CallerContext {
    fn at(anchor: &Location<'_>, function: Option<String>) -> Self {
        Self {
            file: anchor.file().to_owned(),
            line: anchor.line(),
            function,
        }
    }

    /// Resolves the frame `skip` levels out from `anchor`.
    ///
    /// `skip == 0` always succeeds (the anchor itself is known); larger values
    /// return `None` when the stack cannot be resolved that far.
    #[must_use]
    pub fn capture(skip: usize, anchor: &Location<'_>) -> Option<Self> {
        let mut frames: Vec<ResolvedFrame> = Vec::new();
        let mut anchor_at: Option<usize> = None;

        backtrace::trace(|frame| {
            backtrace::resolve_frame(frame, |symbol| {
                let resolved = ResolvedFrame::from_symbol(symbol);
                if anchor_at.is_none() && resolved.is_at(anchor) {
                    anchor_at = Some(frames.len());
                }
                frames.push(resolved);
            });
            anchor_at.is_none_or(|i| frames.len() <= i + skip)
        });

        match anchor_at {
            Some(i) if skip == 0 => {
                let function = frames.get(i).and_then(|f| f.function.clone());
                Some(Self::at(anchor, function))
            }
            Some(i) => {
                let frame = frames.into_iter().nth(i + skip)?;
                Some(Self {
                    file: frame.file?,
                    line: frame.line?,
                    function: frame.function,
                })
            }
            None if skip == 0 => Some(Self::at(anchor, None)),
            None => None,
        }
    }

    /// `[<file>:<line> <function>()] <msg>`
    #[must_use]
    pub fn render(&self, msg: &str) -> String {
        format!(
            "[{}:{} {}()] {}",
            truncate_file(&self.file),
            self.line,
            self.function.as_deref().unwrap_or("?"),
            msg
        )
    }
}

/// Prefixes `text` with caller context when `level` warrants it and the
/// stack can be resolved; otherwise returns `text` untouched.
#[must_use]
pub fn enrich(level: LogLevel, skip: usize, text: String, anchor: &Location<'_>) -> String {
    if !level.wants_caller_context() {
        return text;
    }
    match CallerContext::capture(skip, anchor) {
        Some(ctx) => ctx.render(&text),
        None => text,
    }
}

/// Keeps the last 20 characters of a long path behind an ellipsis.
#[must_use]
pub fn truncate_file(file: &str) -> Cow<'_, str> {
    if file.chars().count() <= MAX_FILE_CHARS {
        return Cow::Borrowed(file);
    }
    let start = file
        .char_indices()
        .rev()
        .nth(MAX_FILE_CHARS - 1)
        .map_or(0, |(i, _)| i);
    Cow::Owned(format!("{ELLIPSIS}{}", &file[start..]))
}

/// `crate::module::func::{{closure}}` -> `func`
fn bare_function_name(path: &str) -> String {
    path.rsplit("::")
        .find(|seg| !seg.starts_with("{{"))
        .unwrap_or(path)
        .to_owned()
}
