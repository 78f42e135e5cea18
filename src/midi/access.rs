//! Platform MIDI capability.
//!
//! A [`Backend`] negotiates an [`Access`] session, which enumerates the
//! available [`Endpoint`]s and opens them. The session only lives as long
//! as the negotiation: the ports and listeners it hands out outlive it.

use super::{Endpoint, Error};

/// Inbound msg handler, called from the platform's MIDI thread.
pub type MsgHandler = Box<dyn FnMut(&[u8]) + Send + 'static>;

/// Hardware-disconnect handler, called at most once per listener.
pub type DisconnectHandler = Box<dyn FnOnce(&Endpoint) + Send + 'static>;

/// A registered listener. Dropping it unregisters the listener.
pub type Listener = Box<dyn Send>;

pub trait Backend: Send + Sync + 'static {
    fn is_supported(&self) -> bool;

    /// Negotiates access to the platform MIDI devices, including sysex.
    ///
    /// This may block for an unbounded amount of time,
    /// e.g. while the operator is asked for permission.
    fn request_access(&self) -> Result<Box<dyn Access>, Error>;
}

pub trait Access {
    fn inputs(&self) -> Vec<Endpoint>;
    fn outputs(&self) -> Vec<Endpoint>;

    fn open_output(&self, endpoint: &Endpoint) -> Result<Box<dyn OutputPort>, Error>;
    fn open_input(
        &self,
        endpoint: &Endpoint,
        on_msg: MsgHandler,
    ) -> Result<Box<dyn InputPort>, Error>;

    fn on_disconnect(
        &self,
        endpoint: &Endpoint,
        handler: DisconnectHandler,
    ) -> Result<Listener, Error>;
}

pub trait OutputPort: Send {
    fn endpoint(&self) -> &Endpoint;
    fn send(&mut self, msg: &[u8]) -> Result<(), Error>;
    fn close(self: Box<Self>);
}

pub trait InputPort: Send {
    fn endpoint(&self) -> &Endpoint;
    fn close(self: Box<Self>);
}
