//! Board description served over IPMB: the Get Device ID identity, three
//! sensor data records (management controller locator, temperature and
//! supply voltage) and the scaling that turns calibrated readings into the
//! raw bytes those records describe.
//!
//! Record images live in memory as complete byte arrays so Get Device SDR can
//! stream any slice of them. Only the owner keys and the temperature `M`
//! factor are patched at start-up.
use crate::infra::config::SensorCalibration;
use crate::protocol::traits::sdr_repository::{
    DeviceId, SdrHeader, SdrRecord, SdrRepository, SensorScale,
};

/// IPMI 1.5, as used in the SDR version byte and Get Device ID.
pub const IPMI_VERSION: u8 = 0x51;
/// IANA enterprise number reported as manufacturer.
pub const IANA_ENTERPRISE_ID: u32 = 100;

/// Get Device ID capabilities bit: the board is a sensor device.
pub const SENSOR_DEVICE: u8 = 0x01;

/// Identity reported by Get Device ID.
pub const BOARD_DEVICE_ID: DeviceId = DeviceId {
    device_id: 0x01,
    // Device provides SDRs, revision 0.
    revision: 0x80,
    firmware_major: 0x01,
    firmware_minor: 0x00,
    ipmi_version: IPMI_VERSION,
    capabilities: SENSOR_DEVICE,
    manufacturer: IANA_ENTERPRISE_ID,
    product: 0x8000,
};

/// On-die temperature: calibrated value divided by four.
pub const TEMPERATURE_SCALE: SensorScale = SensorScale {
    nominal: 0,
    shift: 2,
};
/// Supply rail in millivolts: 3.3 V ± 512 mV mapped onto 256 steps.
pub const VOLTAGE_SCALE: SensorScale = SensorScale {
    nominal: 3300,
    shift: 2,
};

//==================================================================================RECORD_LAYOUT
pub const RECORD_COUNT: u16 = 3;
pub const MC_LOCATOR_LENGTH: usize = 24;
pub const SENSOR_RECORD_LENGTH: usize = 56;

const RECORD_TYPE_FULL_SENSOR: u8 = 0x01;
const RECORD_TYPE_MC_LOCATOR: u8 = 0x12;
/// 8-bit ASCII, eight characters.
const ID_TYPE_LENGTH: u8 = 0xC8;
const ENTITY_ID: u8 = 0x11;

/// Owner key byte (slave address), both record kinds.
const KEY_OWNER: usize = 5;
/// Owner LUN and sensor number keys of a full sensor record.
const KEY_OWNER_LUN: usize = 6;
const KEY_SENSOR_NUMBER: usize = 7;
/// `M` factor of the sensor description.
const DESCRIPTION_M: usize = 24;

const MC_LOCATOR_TEMPLATE: [u8; MC_LOCATOR_LENGTH] = [
    // header: id, version, type, length
    0x00, 0x00, IPMI_VERSION, RECORD_TYPE_MC_LOCATOR, (MC_LOCATOR_LENGTH - 5) as u8,
    // key: slave address, channel
    0x00, 0x00,
    // power state, capabilities, reserved (3)
    0x00, SENSOR_DEVICE, 0x00, 0x00, 0x00,
    // entity id, entity instance, OEM
    ENTITY_ID, 0x00, 0x00,
    // id string
    ID_TYPE_LENGTH, b'M', b'G', b'M', b'T', b' ', b'M', b'C', b' ',
];

const fn sensor_template(
    record_id: u8,
    sensor_type: u8,
    units: u8,
    m: u8,
    b: u8,
    rexp_bexp: u8,
    id: [u8; 8],
) -> [u8; SENSOR_RECORD_LENGTH] {
    [
        // header: id, version, type, length
        record_id, 0x00, IPMI_VERSION, RECORD_TYPE_FULL_SENSOR, (SENSOR_RECORD_LENGTH - 5) as u8,
        // key: owner address, owner LUN, sensor number
        0x00, 0x00, 0x00,
        // entity id, instance, initialization, capabilities, type, event/reading type
        ENTITY_ID, 0x00, 0x01, 0x03, sensor_type, 0x01,
        // threshold masks (lower, upper, settable)
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        // units (3), linearization, M, tolerance, B, accuracy, accuracy exp, R/B exponents
        0x40, units, 0x00, 0x00, m, 0x00, b, 0x00, 0x00, rexp_bexp,
        // analog flags, nominal, nominal max/min, sensor max/min
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        // thresholds and hysteresis
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        // reserved (2), OEM
        0x00, 0x00, 0x00,
        // id string
        ID_TYPE_LENGTH, id[0], id[1], id[2], id[3], id[4], id[5], id[6], id[7],
    ]
}

// Temperature: reading = value / 4, M from calibration, B = 30, R = -2, B exp = 2.
const TEMPERATURE_TEMPLATE: [u8; SENSOR_RECORD_LENGTH] =
    sensor_template(0x01, 0x01, 0x01, 0x00, 30, 0xE2, *b"MC_TEMP ");
// Voltage: reading = (mV - 3300) / 4, M = 4, B = 33, R = -3, B exp = 2.
const VOLTAGE_TEMPLATE: [u8; SENSOR_RECORD_LENGTH] =
    sensor_template(0x02, 0x02, 0x04, 0x04, 33, 0xD2, *b"MC_VOLT ");

//==================================================================================REPOSITORY
/// In-memory repository holding the three board records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardRepository {
    locator: [u8; MC_LOCATOR_LENGTH],
    temperature: [u8; SENSOR_RECORD_LENGTH],
    voltage: [u8; SENSOR_RECORD_LENGTH],
}

impl BoardRepository {
    /// Build the records for a controller at `own_address`, with the
    /// temperature slope taken from `calibration`.
    pub fn new(own_address: u8, calibration: &SensorCalibration) -> Self {
        let mut repository = Self {
            locator: MC_LOCATOR_TEMPLATE,
            temperature: TEMPERATURE_TEMPLATE,
            voltage: VOLTAGE_TEMPLATE,
        };
        repository.temperature[DESCRIPTION_M] = (calibration.temp_m << 2) as u8;
        repository.stamp_owner(own_address);
        repository
    }

    fn stamp_owner(&mut self, address: u8) {
        self.locator[KEY_OWNER] = address;
        for (number, record) in [&mut self.temperature, &mut self.voltage]
            .into_iter()
            .enumerate()
        {
            record[KEY_OWNER] = address;
            record[KEY_OWNER_LUN] = 0;
            record[KEY_SENSOR_NUMBER] = number as u8;
        }
    }

    fn image(&self, record_id: u16) -> Option<&[u8]> {
        match record_id {
            0 => Some(&self.locator),
            1 => Some(&self.temperature),
            2 => Some(&self.voltage),
            _ => None,
        }
    }
}

impl SdrRepository for BoardRepository {
    fn count(&self) -> u16 {
        RECORD_COUNT
    }

    fn record(&self, record_id: u16) -> Option<SdrRecord<'_>> {
        let bytes = self.image(record_id)?;
        let header = SdrHeader::parse(bytes)?;
        Some(SdrRecord { header, bytes })
    }

    fn sensor_scale(&self, number: u8) -> Option<SensorScale> {
        match number {
            0 => Some(TEMPERATURE_SCALE),
            1 => Some(VOLTAGE_SCALE),
            _ => None,
        }
    }

    fn device_id(&self) -> DeviceId {
        BOARD_DEVICE_ID
    }

    fn set_owner(&mut self, address: u8) {
        self.stamp_owner(address);
    }
}
