//! Channel sink: delivery, truncation and drop-on-full.
use super::*;

#[test]
/// Lines arrive in order on the receiving side.
fn test_lines_delivered_in_order() {
    let channel: LogChannel<4> = Channel::new();
    let mut log = ChannelLog::new(&channel);
    log.line(format_args!("IPMI> GET_DEVICE_ID"));
    log.line(format_args!("IPMI> tx {}/{} fail", 1, 3));

    assert_eq!(channel.try_receive().unwrap().as_str(), "IPMI> GET_DEVICE_ID");
    assert_eq!(channel.try_receive().unwrap().as_str(), "IPMI> tx 1/3 fail");
    assert!(channel.try_receive().is_err());
    assert_eq!(log.dropped(), 0);
}

#[test]
/// A full channel drops the new line without blocking.
fn test_full_channel_drops() {
    let channel: LogChannel<1> = Channel::new();
    let mut log = ChannelLog::new(&channel);
    log.line(format_args!("first"));
    log.line(format_args!("second"));
    log.line(format_args!("third"));

    assert_eq!(log.dropped(), 2);
    assert_eq!(channel.try_receive().unwrap().as_str(), "first");
}

#[test]
/// Overlong lines are cut at capacity.
fn test_long_line_truncated() {
    let line = format_line(format_args!("{:0>100}", 7));
    assert_eq!(line.len(), LOG_LINE_CAPACITY);
    assert!(line.as_str().starts_with("0000"));
}
