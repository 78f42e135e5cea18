//! Remote control & live metering for digital audio mixers.
//!
//! See [`connection::M7clConnection`] for the Yamaha M7CL over MIDI.

pub mod bytes;

pub mod connection;
pub use connection::{ChannelControl, Connection, ConnectionStatus, Event, State};

pub mod m7cl;

pub mod midi;
