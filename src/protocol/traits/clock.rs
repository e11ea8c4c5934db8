//! Tick clock abstraction used for the transmit retry back-off.
use crate::core::Tick;

/// Monotonic, wrapping tick source.
pub trait Clock {
    /// Current tick count.
    fn now(&self) -> Tick;

    /// `true` once the counter has moved strictly past `deadline`.
    fn has_elapsed(&self, deadline: Tick) -> bool {
        self.now().is_after(deadline)
    }
}

impl<C: Clock> Clock for &C {
    fn now(&self) -> Tick {
        (**self).now()
    }
}
