//! Log sinks for the engine's diagnostic lines.
//!
//! [`ChannelLog`] formats each line into a fixed-capacity string and pushes
//! it into a pre-allocated [`embassy_sync::channel::Channel`]; the console
//! task drains the other end. Nothing here blocks: a line that does not fit
//! the channel is counted and dropped, a line longer than
//! [`LOG_LINE_CAPACITY`] is cut.
use core::fmt::{self, Write};

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use heapless::String;

use crate::protocol::traits::log_sink::LogSink;

/// Characters kept per log line.
pub const LOG_LINE_CAPACITY: usize = 80;

/// One formatted log line.
pub type LogLine = String<LOG_LINE_CAPACITY>;

/// Queue between the engine and the console.
pub type LogChannel<const N: usize> = Channel<CriticalSectionRawMutex, LogLine, N>;

/// Format `args` into a [`LogLine`], truncating at capacity.
pub fn format_line(args: fmt::Arguments<'_>) -> LogLine {
    let mut line = LogLine::new();
    let _ = Truncating(&mut line).write_fmt(args);
    line
}

struct Truncating<'a>(&'a mut LogLine);

impl Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

//==================================================================================CHANNEL_LOG
/// Best-effort sink feeding a [`LogChannel`].
pub struct ChannelLog<'a, const N: usize> {
    channel: &'a LogChannel<N>,
    dropped: u32,
}

impl<'a, const N: usize> ChannelLog<'a, N> {
    pub fn new(channel: &'a LogChannel<N>) -> Self {
        Self {
            channel,
            dropped: 0,
        }
    }

    /// Lines lost because the channel was full.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl<const N: usize> LogSink for ChannelLog<'_, N> {
    fn line(&mut self, args: fmt::Arguments<'_>) {
        if self.channel.try_send(format_line(args)).is_err() {
            self.dropped = self.dropped.wrapping_add(1);
        }
    }
}

//==================================================================================DEFMT_LOG
/// Sink forwarding every line to `defmt`.
#[cfg(feature = "defmt")]
#[derive(Debug, Default, Clone, Copy)]
pub struct DefmtLog;

#[cfg(feature = "defmt")]
impl LogSink for DefmtLog {
    fn line(&mut self, args: fmt::Arguments<'_>) {
        let line = format_line(args);
        defmt::info!("{=str}", line.as_str());
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
