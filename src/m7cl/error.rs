use crate::bytes;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Channel {} out of range", .0)]
    ChannelOutOfRange(u16),

    #[error("Malformed metering frame: {}", .0)]
    MalformedMeteringFrame(bytes::Displayable<'static>),

    #[error("Unknown metering point {}", .0)]
    UnknownMeterPoint(u8),
}
