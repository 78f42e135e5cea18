use std::sync::Arc;

use super::Direction;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("MIDI is not supported on this platform")]
    CapabilityUnsupported,

    #[error("MIDI access request failed: {}", .0)]
    AccessDenied(Arc<str>),

    #[error("MIDI initialization failed")]
    Init(#[from] midir::InitError),

    #[error("Error connecting to MIDI port {}", .0)]
    Connection(Arc<str>),

    #[error("Couldn't retrieve a MIDI port name")]
    PortInfoError(#[from] midir::PortInfoError),

    #[error("Invalid MIDI port {}", .0)]
    PortNotFound(Arc<str>),

    #[error("No MIDI {} selected", .0)]
    NoDeviceSelected(Direction),

    #[error("Invalid u14: {}", .0)]
    InvalidU14(u16),

    #[error("Couldn't send MIDI message: {}", .0)]
    Send(#[from] midir::SendError),
}
