//! Latest calibrated sensor values, produced by the sampling pipeline.

pub trait SensorRepository {
    /// Most recent calibrated value of sensor `index`, in the unit the
    /// sensor's record describes before scaling.
    fn latest(&self, index: u8) -> i16;
}

impl<const N: usize> SensorRepository for [i16; N] {
    fn latest(&self, index: u8) -> i16 {
        self.get(index as usize).copied().unwrap_or(0)
    }
}
