//! Yamaha M7CL remote control protocol.
//!
//! See the M7CL V3 Owner's Manual, MIDI data format (pp. 274 & 282).

pub mod error;
pub use error::Error;

pub mod level;

pub mod meter;
pub use meter::MeterPoint;

pub mod nrpn;

pub const YAMAHA_ID: u8 = 0x43;
pub const DIGITAL_MIXER: u8 = 0x3e;
pub const M7CL_ID: u8 = 0x11;

/// 48 mono input channels + 4 stereo inputs (L & R).
pub const INPUT_CHANNELS: u8 = 56;
