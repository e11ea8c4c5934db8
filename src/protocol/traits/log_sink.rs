//! Best-effort diagnostic sink. Implementations must never block; a line
//! that cannot be stored is dropped.
use core::fmt;

pub trait LogSink {
    /// Record one formatted line.
    fn line(&mut self, args: fmt::Arguments<'_>);
}

impl<L: LogSink> LogSink for &mut L {
    fn line(&mut self, args: fmt::Arguments<'_>) {
        (**self).line(args)
    }
}

/// Sink that discards every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLog;

impl LogSink for NoLog {
    fn line(&mut self, _args: fmt::Arguments<'_>) {}
}
