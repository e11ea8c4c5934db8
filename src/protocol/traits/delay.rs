//! Asynchronous delay used by the executor-driven poll loop.

/// Sleep primitive; the firmware picks the executor's timer.
pub trait Delay {
    /// Asynchronously wait for `millis` milliseconds.
    fn delay_ms<'a>(&'a mut self, millis: u32) -> impl core::future::Future<Output = ()> + 'a;
}
