//! Mixer connections.
//!
//! A connection drives a mixer over a given transport. All transports
//! expose the [`Connection`] interface and publish [`Event`]s to the
//! observer registered in the [`Context`] they are built with.

use crossbeam_channel as channel;
use std::{fmt, sync::Arc};

use crate::{m7cl, midi};

pub mod config;
pub use config::{ConnectionConfig, TransportDefaults, UserConfig};

pub mod factory;
pub use factory::{Current, FACTORY};

mod m7cl_midi;
pub use m7cl_midi::M7clConnection;

pub use m7cl::meter::ChannelLevelFrame;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{}", .0)]
    Midi(#[from] midi::Error),

    #[error("{}", .0)]
    Protocol(#[from] m7cl::Error),

    #[error("MIDI {} disconnected", .0)]
    HardwareDisconnect(midi::Direction),

    #[error("Not connected")]
    NotConnected,

    #[error("Unknown connection mode {}", .0)]
    UnknownMode(Arc<str>),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            State::Disconnected => "disconnected",
            State::Connecting => "connecting",
            State::Connected => "connected",
        })
    }
}

/// Connection state snapshot.
///
/// `address` is only set while `Connected`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectionStatus {
    state: State,
    address: Option<Arc<str>>,
}

impl ConnectionStatus {
    pub fn disconnected() -> Self {
        Self {
            state: State::Disconnected,
            address: None,
        }
    }

    pub fn connecting() -> Self {
        Self {
            state: State::Connecting,
            address: None,
        }
    }

    pub fn connected(address: impl Into<Arc<str>>) -> Self {
        Self {
            state: State::Connected,
            address: Some(address.into()),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.state == State::Connected
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::disconnected()
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address {
            Some(ref address) => write!(f, "{} to {address}", self.state),
            None => write!(f, "{}", self.state),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    Warn,
    Error,
}

/// Operator facing message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notification {
    pub level: Level,
    pub title: Arc<str>,
    pub message: Arc<str>,
}

impl Notification {
    pub fn warn(title: impl Into<Arc<str>>, message: impl Into<Arc<str>>) -> Self {
        Self {
            level: Level::Warn,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<Arc<str>>, message: impl Into<Arc<str>>) -> Self {
        Self {
            level: Level::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(&self.title)
        } else {
            write!(f, "{}: {}", self.title, self.message)
        }
    }
}

#[derive(Clone, Debug)]
pub enum Event {
    Status(ConnectionStatus),
    Levels(ChannelLevelFrame),
    Notification(Notification),
}

impl From<ConnectionStatus> for Event {
    fn from(status: ConnectionStatus) -> Self {
        Self::Status(status)
    }
}

impl From<Notification> for Event {
    fn from(notif: Notification) -> Self {
        Self::Notification(notif)
    }
}

/// Asks the operator whether to use the given endpoint.
pub type Confirm = Box<dyn FnMut(&midi::Endpoint) -> bool + Send + 'static>;

/// Collaborators a connection is built with.
pub struct Context {
    pub backend: Arc<dyn midi::Backend>,
    pub confirm: Confirm,
    pub evt_tx: channel::Sender<Event>,
}

/// A channel command from the operator.
///
/// `name` and `color` are not transmitted over MIDI.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelControl {
    /// 1-based channel number.
    pub channel: u16,
    /// `None` leaves the channel untouched.
    pub active: Option<bool>,
    pub name: Option<Arc<str>>,
    pub color: Option<Arc<str>>,
}

impl ChannelControl {
    pub fn new(channel: u16, active: impl Into<Option<bool>>) -> Self {
        Self {
            channel,
            active: active.into(),
            ..Default::default()
        }
    }
}

pub trait Connection: Send + 'static {
    /// Encodes & transmits `ctrl` right away.
    fn fire_channel(&self, ctrl: &ChannelControl) -> Result<(), Error>;

    fn status(&self) -> ConnectionStatus;

    /// Tears down the connection, whatever its current state.
    ///
    /// `ungraceful` hints the observer that the connection was lost
    /// rather than closed on purpose.
    fn close(&self, ungraceful: bool);
}
