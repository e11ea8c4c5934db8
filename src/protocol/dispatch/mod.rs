//! Command routing for validated requests.
//!
//! The routing key is the 6-bit network function plus the responder LUN:
//! only LUN 0 is served. Sensor/Event and Application requests are answered
//! from the [`SdrRepository`] and [`SensorRepository`] collaborators;
//! everything else gets an `Invalid` completion with an empty payload.
use crate::core::{
    app_cmd, sensor_cmd, CompletionCode, NetFn, HEADER_LENGTH, MIN_MESSAGE_LENGTH, TX_BUFFER_MAX,
};
use crate::error::ResponseError;
use crate::protocol::frame::RequestHeader;
use crate::protocol::response::{PayloadWriter, ResponseFrame};
use crate::protocol::traits::{
    log_sink::LogSink, sdr_repository::SdrRepository, sensor_repository::SensorRepository,
};

/// Largest SDR slice returned by one Get Device SDR: the frame budget minus
/// header, check2, completion code and next record id.
pub const SDR_COPY_MAX: usize = TX_BUFFER_MAX - MIN_MESSAGE_LENGTH - 3;
/// Requested byte count meaning "the rest of the record".
pub const SDR_READ_ENTIRE_RECORD: u8 = 0xFF;
/// Next-record id returned with the last record.
pub const SDR_LAST_RECORD: u16 = 0xFFFF;
/// Repository flags of Get Device SDR Info.
pub const SDR_INFO_FLAGS: u8 = 0x01;
/// Reservation id handed out by Reserve SDR Repository.
pub const SDR_RESERVATION_ID: u16 = 0x0001;
/// Self test result bytes.
pub const SELF_TEST_RESULT: [u8; 2] = [0x56, 0x00];
/// Sensor reading state byte: scanning enabled.
pub const SENSOR_SCANNING_ENABLED: u8 = 0x40;

/// Collaborators a handler may consult while building its reply.
pub struct DispatchContext<'a, R, S, L> {
    pub repository: &'a R,
    pub sensors: &'a S,
    pub log: &'a mut L,
    pub own_address: u8,
}

/// Route `request` (validated, check2 included) and queue the reply in
/// `response`.
///
/// Returns `false` when no reply was generated: the frame was itself a
/// response, or it was too short to carry a command.
pub fn dispatch<R, S, L>(
    ctx: &mut DispatchContext<'_, R, S, L>,
    request: &[u8],
    response: &mut ResponseFrame,
) -> bool
where
    R: SdrRepository,
    S: SensorRepository,
    L: LogSink,
{
    if request.len() < MIN_MESSAGE_LENGTH {
        return false;
    }
    let Some(header) = RequestHeader::parse(request) else {
        return false;
    };
    if header.is_response() {
        return false;
    }
    let data = &request[HEADER_LENGTH..request.len() - 1];

    let mut writer = response.payload();
    let written = if header.lun() != 0 {
        handle_unknown(&mut writer)
    } else {
        match NetFn::from_code(header.netfn()) {
            NetFn::SensorEvent => handle_sensor_netfn(ctx, &header, data, &mut writer),
            NetFn::App => handle_app_netfn(ctx, &header, &mut writer),
            NetFn::Oem | NetFn::Other(_) => handle_unknown(&mut writer),
        }
    };
    let end = writer.end();

    let queued = match written {
        Ok(()) => response.respond(&header, ctx.own_address, end),
        Err(ResponseError::Overflow { .. }) => response.respond_with_code(
            &header,
            ctx.own_address,
            CompletionCode::CannotReturnNumberOfBytes,
        ),
    };
    queued.is_ok()
}

//==================================================================================APPLICATION
fn handle_app_netfn<R, S, L>(
    ctx: &mut DispatchContext<'_, R, S, L>,
    header: &RequestHeader,
    writer: &mut PayloadWriter<'_>,
) -> Result<(), ResponseError>
where
    R: SdrRepository,
    L: LogSink,
{
    match header.command {
        app_cmd::GET_DEVICE_ID => {
            ctx.log.line(format_args!("IPMI> GET_DEVICE_ID"));
            writer.completion(CompletionCode::Ok)?;
            writer.extend(&ctx.repository.device_id().to_bytes())
        }
        app_cmd::GET_SELF_TEST_RESULTS => {
            ctx.log.line(format_args!("IPMI> GET_SELF_TEST_RESULTS"));
            writer.completion(CompletionCode::Ok)?;
            writer.extend(&SELF_TEST_RESULT)
        }
        _ => handle_unknown(writer),
    }
}

//==================================================================================SENSOR_EVENT
fn handle_sensor_netfn<R, S, L>(
    ctx: &mut DispatchContext<'_, R, S, L>,
    header: &RequestHeader,
    data: &[u8],
    writer: &mut PayloadWriter<'_>,
) -> Result<(), ResponseError>
where
    R: SdrRepository,
    S: SensorRepository,
    L: LogSink,
{
    match header.command {
        sensor_cmd::GET_DEVICE_SDR_INFO => {
            // Operation 1 asks for the count over all LUNs; with a single
            // LUN both answers are the same.
            let operation = data.first().copied().unwrap_or(0);
            ctx.log
                .line(format_args!("IPMI> GET_DEVICE_SDR_INFO {:X}", operation));
            let count = ctx.repository.count().min(u8::MAX as u16) as u8;
            writer.completion(CompletionCode::Ok)?;
            writer.extend(&[count, SDR_INFO_FLAGS])
        }
        sensor_cmd::RESERVE_DEVICE_SDR_REPOSITORY => {
            ctx.log
                .line(format_args!("IPMI> RESERVE_DEVICE_SDR_REPOSITORY"));
            writer.completion(CompletionCode::Ok)?;
            writer.extend(&SDR_RESERVATION_ID.to_le_bytes())
        }
        sensor_cmd::GET_DEVICE_SDR => get_device_sdr(ctx, data, writer),
        sensor_cmd::GET_SENSOR_READING => get_sensor_reading(ctx, data, writer),
        _ => handle_unknown(writer),
    }
}

/// Request data: reservation id (2), record id (2, LE), offset, byte count.
fn get_device_sdr<R, S, L>(
    ctx: &mut DispatchContext<'_, R, S, L>,
    data: &[u8],
    writer: &mut PayloadWriter<'_>,
) -> Result<(), ResponseError>
where
    R: SdrRepository,
    L: LogSink,
{
    let &[_, _, id_lsb, id_msb, offset, requested, ..] = data else {
        return writer.completion(CompletionCode::InvalidDataField);
    };
    let record_id = u16::from_le_bytes([id_lsb, id_msb]);
    let offset = offset as usize;
    ctx.log.line(format_args!(
        "IPMI> GET_DEVICE_SDR {} {} {}",
        record_id, offset, requested
    ));

    let count = ctx.repository.count();
    let record = match ctx.repository.record(record_id) {
        Some(record) if record_id < count => record,
        _ => return writer.completion(CompletionCode::NotPresent),
    };
    let total = record.header.total_len().min(record.bytes.len());
    if offset >= total {
        return writer.completion(CompletionCode::ParameterOutOfRange);
    }

    let mut code = CompletionCode::Ok;
    let available = total - offset;
    let bytes = if requested == SDR_READ_ENTIRE_RECORD {
        available
    } else if requested as usize > available {
        code = CompletionCode::RequestDataTruncated;
        available
    } else {
        requested as usize
    };
    if bytes > SDR_COPY_MAX {
        return writer.completion(CompletionCode::CannotReturnNumberOfBytes);
    }

    let next_record = if record_id + 1 >= count {
        SDR_LAST_RECORD
    } else {
        record.header.record_id.wrapping_add(1)
    };
    writer.completion(code)?;
    writer.extend(&next_record.to_le_bytes())?;
    writer.extend(&record.bytes[offset..offset + bytes])
}

/// Request data: sensor number.
fn get_sensor_reading<R, S, L>(
    ctx: &mut DispatchContext<'_, R, S, L>,
    data: &[u8],
    writer: &mut PayloadWriter<'_>,
) -> Result<(), ResponseError>
where
    R: SdrRepository,
    S: SensorRepository,
    L: LogSink,
{
    let Some(&number) = data.first() else {
        return writer.completion(CompletionCode::InvalidDataField);
    };
    ctx.log
        .line(format_args!("IPMI> GET_SENSOR_READING {}", number));

    let Some(scale) = ctx.repository.sensor_scale(number) else {
        return writer.completion(CompletionCode::NotPresent);
    };
    let reading = scale.apply(ctx.sensors.latest(number));
    writer.completion(CompletionCode::Ok)?;
    // Reading, state, threshold status.
    writer.extend(&[reading as u8, SENSOR_SCANNING_ENABLED, 0x00])
}

//==================================================================================FALLBACK
fn handle_unknown(writer: &mut PayloadWriter<'_>) -> Result<(), ResponseError> {
    writer.completion(CompletionCode::Invalid)
}
