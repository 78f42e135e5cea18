pub mod access;
pub use access::{Access, Backend, InputPort, Listener, OutputPort};

mod error;
pub use error::Error;

pub mod io;
pub use io::MidirBackend;

pub mod msg;
pub use msg::{Msg, MsgList};

pub mod port;
pub use port::{Direction, Endpoint};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Tag(u8);

impl Tag {
    pub const fn from(byte: u8) -> Self {
        Self(byte & 0xf0)
    }
}

impl From<Tag> for u8 {
    fn from(tag: Tag) -> u8 {
        tag.0
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Channel(u8);

impl Channel {
    pub const fn from(byte: u8) -> Self {
        Self(byte & 0x0f)
    }
}

impl From<Channel> for u8 {
    fn from(chan: Channel) -> u8 {
        chan.0
    }
}

impl std::ops::BitOr<Channel> for Tag {
    type Output = u8;

    fn bitor(self, chan: Channel) -> Self::Output {
        self.0 | chan.0
    }
}

pub mod control_change {
    use super::Tag;

    pub const TAG: Tag = Tag::from(0xb0);

    pub const DATA_ENTRY_MSB: u8 = 0x06;
    pub const DATA_ENTRY_LSB: u8 = 0x26;
    pub const NRPN_LSB: u8 = 0x62;
    pub const NRPN_MSB: u8 = 0x63;
}

pub mod sysex {
    pub const TAG: u8 = 0xf0;
    pub const END_TAG: u8 = 0xf7;
}

pub mod u14 {
    use super::Error;

    pub const MAX: u16 = 0x3fff;

    /// Splits a 14-bit value into its `[lsb, msb]` 7-bit halves.
    #[inline]
    pub fn to_lsb_msb(val: u16) -> Result<[u8; 2], Error> {
        if val > MAX {
            return Err(Error::InvalidU14(val));
        }

        Ok([val as u8 & 0x7f, (val >> 7) as u8 & 0x7f])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_chan() {
        assert_eq!(control_change::TAG | Channel::from(0x13), 0xb3);
        assert_eq!(u8::from(Tag::from(0xb5)), 0xb0);
    }

    #[test]
    fn u14_halves() {
        assert_eq!(u14::to_lsb_msb(0x05b6).unwrap(), [0x36, 0x0b]);
        assert!(u14::to_lsb_msb(0x4000).is_err());
        assert_eq!(u14::to_lsb_msb(u14::MAX).unwrap(), [0x7f, 0x7f]);
    }
}
