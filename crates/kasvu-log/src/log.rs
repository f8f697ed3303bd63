mod error;
pub mod fmt;

use std::{
    io::Write,
    sync::OnceLock,
};

use core::str::FromStr;

use termcolor::{WriteColor, StandardStream, ColorChoice};

pub use termcolor::{ColorSpec, Color};

use parking_lot::Mutex;

use rustc_hash::FxHashMap;

use compact_str::CompactString;

use crate::Result;

pub use error::LogError;
pub use fmt::{LogFmt, LogFmtBuilder, SegmentSpec, Style};

#[repr(i8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Level {
    Off = -1,
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl FromStr for Level {

    type Err = ();

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("off") {
            Ok(Self::Off)
        } else if s.eq_ignore_ascii_case("error") {
            Ok(Self::Error)
        } else if s.eq_ignore_ascii_case("warn") {
            Ok(Self::Warn)
        } else if s.eq_ignore_ascii_case("info") {
            Ok(Self::Info)
        } else if s.eq_ignore_ascii_case("debug") {
            Ok(Self::Debug)
        } else if s.eq_ignore_ascii_case("trace") {
            Ok(Self::Trace)
        } else {
            Err(())
        }
    }
}

/// Level filters parsed from a `RUST_LOG` style string.
///
/// Entries are separated by commas. A bare level sets the base level,
/// `target=level` sets the level of a module path and everything under
/// it. Unparseable entries are ignored and later entries win.
#[derive(Debug)]
pub struct Filters {
    base_level: Level,
    target_levels: FxHashMap<CompactString, Level>,
}

impl Filters {

    pub fn parse(spec: &str) -> Self {
        let mut filters = Self::default();
        for arg in spec.split(',') {
            let (target, level) = match arg.find('=') {
                Some(i) => (Some(arg[..i].trim()), arg[i + 1..].trim()),
                None => (None, arg.trim()),
            };
            let Ok(level) = Level::from_str(level) else {
                continue
            };
            match target {
                Some(target) if !target.is_empty() => {
                    filters.target_levels.insert(CompactString::new(target), level);
                },
                _ => filters.base_level = level,
            }
        }
        filters
    }

    fn from_env() -> Self {
        match std::env::var("RUST_LOG") {
            Ok(spec) => Self::parse(&spec),
            Err(_) => Self::default(),
        }
    }

    /// Level for `target`, falling back to its parent module paths and
    /// then to the base level.
    pub fn target_level(&self, target: &str) -> Level {
        let mut substr = target;
        if let Some(&level) = self.target_levels.get(substr) {
            return level
        }
        while let Some(i) = substr.rfind("::") {
            substr = &substr[0..i];
            if let Some(&level) = self.target_levels.get(substr) {
                return level
            }
        }
        self.base_level
    }
}

impl Default for Filters {

    fn default() -> Self {
        Self {
            base_level: Level::Error,
            target_levels: FxHashMap::default(),
        }
    }
}

struct Logger {
    stderr: StandardStream,
    error_fmt: LogFmt,
    warn_fmt: LogFmt,
    info_fmt: LogFmt,
    debug_fmt: LogFmt,
    trace_fmt: LogFmt,
    filters: Filters,
}

impl Logger {

    #[inline(always)]
    fn new() -> Self {
        Self {
            stderr: StandardStream::stderr(ColorChoice::Auto),
            error_fmt: LogFmt::labeled("ERROR", Color::Red),
            warn_fmt: LogFmt::labeled("WARN", Color::Yellow),
            info_fmt: LogFmt::labeled("INFO", Color::Green),
            debug_fmt: LogFmt::labeled("DEBUG", Color::Blue),
            trace_fmt: LogFmt::labeled("TRACE", Color::Magenta),
            filters: Filters::from_env(),
        }
    }

    fn fmt_mut(&mut self, level: Level) -> Option<&mut LogFmt> {
        match level {
            Level::Off => None,
            Level::Error => Some(&mut self.error_fmt),
            Level::Warn => Some(&mut self.warn_fmt),
            Level::Info => Some(&mut self.info_fmt),
            Level::Debug => Some(&mut self.debug_fmt),
            Level::Trace => Some(&mut self.trace_fmt),
        }
    }

    fn log(&mut self, target: &str, level: Level, msg: core::fmt::Arguments) -> Result<bool> {
        if level == Level::Off || self.filters.target_level(target) < level {
            return Ok(false)
        }
        let fmt = match level {
            Level::Error => &self.error_fmt,
            Level::Warn => &self.warn_fmt,
            Level::Info => &self.info_fmt,
            Level::Debug => &self.debug_fmt,
            _ => &self.trace_fmt,
        };
        write_line(&mut self.stderr, fmt, target, msg)?;
        Ok(true)
    }
}

/// Writes one log line laid out by `fmt`.
pub fn write_line<W: WriteColor>(
    out: &mut W,
    fmt: &LogFmt,
    target: &str,
    msg: core::fmt::Arguments,
) -> Result<()>
{
    for segment in fmt {
        let (style, text) = match segment {
            SegmentSpec::Message(style) => (style, None),
            SegmentSpec::Target(style) => (style, Some(target)),
            SegmentSpec::Text(text, style) => (style, Some(*text)),
        };
        let color_spec = style.color_spec();
        if let Some(color_spec) = &color_spec {
            out.set_color(color_spec)?;
        }
        match text {
            Some(text) => out.write_all(text.as_bytes())?,
            None => write!(out, "{}", msg)?,
        }
        if color_spec.is_some() {
            out.reset()?;
        }
    }
    out.write_all(b"\n")?;
    Ok(())
}

static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

/// Sets up the global logger. Later calls do nothing.
pub fn init() {
    LOGGER.get_or_init(|| Mutex::new(Logger::new()));
}

#[inline(always)]
pub fn is_init() -> bool {
    LOGGER.get().is_some()
}

/// Replaces the line format of `level` with the one built by `f`.
///
/// `f` runs without the logger locked, so it may log. If any segment
/// cannot be stored the previous format stays in place.
pub fn set_fmt(level: Level, f: impl FnOnce(&mut LogFmtBuilder)) -> Result<()> {
    let mut builder = LogFmtBuilder::new();
    f(&mut builder);
    let new_fmt = builder.finish()?;
    let mut logger = LOGGER.get_or_init(|| Mutex::new(Logger::new())).lock();
    if let Some(fmt) = logger.fmt_mut(level) {
        *fmt = new_fmt;
    }
    Ok(())
}

#[inline(always)]
pub fn error_fmt(f: impl FnOnce(&mut LogFmtBuilder)) -> Result<()> {
    set_fmt(Level::Error, f)
}

#[inline(always)]
pub fn warn_fmt(f: impl FnOnce(&mut LogFmtBuilder)) -> Result<()> {
    set_fmt(Level::Warn, f)
}

#[inline(always)]
pub fn info_fmt(f: impl FnOnce(&mut LogFmtBuilder)) -> Result<()> {
    set_fmt(Level::Info, f)
}

#[inline(always)]
pub fn debug_fmt(f: impl FnOnce(&mut LogFmtBuilder)) -> Result<()> {
    set_fmt(Level::Debug, f)
}

#[inline(always)]
pub fn trace_fmt(f: impl FnOnce(&mut LogFmtBuilder)) -> Result<()> {
    set_fmt(Level::Trace, f)
}

/// Logs `args` under `target`. Returns whether a line was written.
///
/// Nothing is written before [`init`].
#[inline(always)]
pub fn log(target: &str, level: Level, args: core::fmt::Arguments) -> Result<bool> {
    match LOGGER.get() {
        Some(logger) => logger.lock().log(target, level, args),
        None => Ok(false),
    }
}

#[macro_export]
macro_rules! error {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::log(module_path!(), $crate::Level::Error, format_args!($fmt, $($arg),*))
            .unwrap_or(false)
    };
}

#[macro_export]
macro_rules! warn {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::log(module_path!(), $crate::Level::Warn, format_args!($fmt, $($arg),*))
            .unwrap_or(false)
    };
}

#[macro_export]
macro_rules! info {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::log(module_path!(), $crate::Level::Info, format_args!($fmt, $($arg),*))
            .unwrap_or(false)
    };
}

#[macro_export]
macro_rules! debug {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::log(module_path!(), $crate::Level::Debug, format_args!($fmt, $($arg),*))
            .unwrap_or(false)
    };
}

#[macro_export]
macro_rules! trace {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::log(module_path!(), $crate::Level::Trace, format_args!($fmt, $($arg),*))
            .unwrap_or(false)
    };
}
