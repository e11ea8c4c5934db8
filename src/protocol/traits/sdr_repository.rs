//! Read-only Sensor Data Record repository and the device identity that the
//! dispatcher streams back to the requester.

/// Length of the common SDR header (record id, version, type, length).
pub const SDR_HEADER_LENGTH: usize = 5;

//==================================================================================SDR_HEADER
/// Common header of every sensor data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SdrHeader {
    pub record_id: u16,
    pub sdr_version: u8,
    pub record_type: u8,
    /// Number of bytes following the header.
    pub record_length: u8,
}

impl SdrHeader {
    /// Decode the header at the start of a record image.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [id_lsb, id_msb, version, record_type, record_length, ..] => Some(Self {
                record_id: u16::from_le_bytes([*id_lsb, *id_msb]),
                sdr_version: *version,
                record_type: *record_type,
                record_length: *record_length,
            }),
            _ => None,
        }
    }

    /// Header plus body length.
    #[inline]
    pub fn total_len(&self) -> usize {
        SDR_HEADER_LENGTH + self.record_length as usize
    }
}

/// Borrowed view over one record image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdrRecord<'a> {
    pub header: SdrHeader,
    /// Full record image, header included.
    pub bytes: &'a [u8],
}

//==================================================================================SENSOR_SCALE
/// Linear conversion from a calibrated value to the 8-bit raw reading
/// described by the sensor's record: `(value - nominal) >> shift`, clamped to
/// the signed 8-bit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorScale {
    pub nominal: i16,
    pub shift: u8,
}

impl SensorScale {
    pub fn apply(&self, value: i16) -> i8 {
        let scaled = (value as i32 - self.nominal as i32) >> self.shift;
        scaled.clamp(i8::MIN as i32, i8::MAX as i32) as i8
    }
}

//==================================================================================DEVICE_ID
/// Body of the Get Device ID response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceId {
    pub device_id: u8,
    /// Bit 7 set when the device provides SDRs.
    pub revision: u8,
    pub firmware_major: u8,
    pub firmware_minor: u8,
    /// BCD-encoded IPMI version (0x51 = 1.5).
    pub ipmi_version: u8,
    pub capabilities: u8,
    /// IANA enterprise number, 20 bits used.
    pub manufacturer: u32,
    pub product: u16,
}

impl DeviceId {
    pub const ENCODED_LENGTH: usize = 11;

    pub fn to_bytes(&self) -> [u8; Self::ENCODED_LENGTH] {
        let manufacturer = self.manufacturer.to_le_bytes();
        let product = self.product.to_le_bytes();
        [
            self.device_id,
            self.revision,
            self.firmware_major,
            self.firmware_minor,
            self.ipmi_version,
            self.capabilities,
            manufacturer[0],
            manufacturer[1],
            manufacturer[2],
            product[0],
            product[1],
        ]
    }
}

//==================================================================================REPOSITORY
/// Source of the device-specific data behind the sensor and application
/// commands.
pub trait SdrRepository {
    /// Number of records; record ids run from `0` to `count() - 1`.
    fn count(&self) -> u16;

    /// Record with the given id.
    fn record(&self, record_id: u16) -> Option<SdrRecord<'_>>;

    /// Conversion for sensor `number`, `None` when no such sensor exists.
    fn sensor_scale(&self, number: u8) -> Option<SensorScale>;

    /// Identity returned by Get Device ID.
    fn device_id(&self) -> DeviceId;

    /// Re-stamp owner fields after the controller address changed.
    fn set_owner(&mut self, _address: u8) {}
}
