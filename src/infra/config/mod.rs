//! Persisted board information block and its write guard.
//!
//! The block is read-only in normal operation. Writers go through
//! [`ConfigStore::unlock`], which hands out a [`ConfigWriter`]; dropping the
//! writer locks the store again.
use crate::error::ConfigError;

/// Address used when the information block was never programmed.
pub const DEFAULT_IPMI_ADDRESS: u8 = 0x20;
/// Length of the board serial number.
pub const SERIAL_NUMBER_LENGTH: usize = 8;

/// Per-board sensor calibration, linear `value = raw * m + b` per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorCalibration {
    pub temp_m: u16,
    pub temp_b: i16,
    pub volt_m: u16,
    pub volt_b: i16,
}

impl SensorCalibration {
    /// Apply the temperature calibration to a raw converter sample.
    pub fn temperature(&self, raw: u16) -> i16 {
        calibrate(raw, self.temp_m, self.temp_b)
    }

    /// Apply the supply-voltage calibration to a raw converter sample.
    pub fn voltage(&self, raw: u16) -> i16 {
        calibrate(raw, self.volt_m, self.volt_b)
    }
}

fn calibrate(raw: u16, m: u16, b: i16) -> i16 {
    let value = raw as i32 * m as i32 + b as i32;
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Board information block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardConfig {
    /// 8-bit IPMB slave address of this controller.
    pub ipmi_address: u8,
    pub serial_number: [u8; SERIAL_NUMBER_LENGTH],
    pub calibration: SensorCalibration,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            ipmi_address: DEFAULT_IPMI_ADDRESS,
            serial_number: [0; SERIAL_NUMBER_LENGTH],
            calibration: SensorCalibration::default(),
        }
    }
}

/// IPMB addresses are 8-bit slave addresses: even and non-zero.
pub fn validate_address(address: u8) -> Result<u8, ConfigError> {
    if address == 0 || address & 0x01 != 0 {
        return Err(ConfigError::InvalidAddress { address });
    }
    Ok(address)
}

//==================================================================================STORE
/// Read-mostly holder of the information block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    config: BoardConfig,
    unlocked: bool,
}

impl ConfigStore {
    /// Wrap a block read from persistent storage. An invalid stored address
    /// falls back to [`DEFAULT_IPMI_ADDRESS`].
    pub fn new(mut config: BoardConfig) -> Self {
        if validate_address(config.ipmi_address).is_err() {
            config.ipmi_address = DEFAULT_IPMI_ADDRESS;
        }
        Self {
            config,
            unlocked: false,
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn ipmi_address(&self) -> u8 {
        self.config.ipmi_address
    }

    pub fn calibration(&self) -> &SensorCalibration {
        &self.config.calibration
    }

    /// `true` while a [`ConfigWriter`] is alive.
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Open the block for writing until the returned guard is dropped.
    pub fn unlock(&mut self) -> ConfigWriter<'_> {
        self.unlocked = true;
        ConfigWriter { store: self }
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(BoardConfig::default())
    }
}

/// Write access to a [`ConfigStore`]; re-locks the store on drop.
#[derive(Debug)]
pub struct ConfigWriter<'a> {
    store: &'a mut ConfigStore,
}

impl ConfigWriter<'_> {
    pub fn set_ipmi_address(&mut self, address: u8) -> Result<(), ConfigError> {
        self.store.config.ipmi_address = validate_address(address)?;
        Ok(())
    }

    pub fn set_serial_number(&mut self, serial: [u8; SERIAL_NUMBER_LENGTH]) {
        self.store.config.serial_number = serial;
    }

    pub fn set_calibration(&mut self, calibration: SensorCalibration) {
        self.store.config.calibration = calibration;
    }

    pub fn config(&self) -> &BoardConfig {
        &self.store.config
    }
}

impl Drop for ConfigWriter<'_> {
    fn drop(&mut self) {
        self.store.unlocked = false;
    }
}
