use super::sysex;
use crate::bytes;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Msg(Box<[u8]>);

impl Msg {
    pub fn inner(&self) -> &[u8] {
        self.0.as_ref()
    }

    pub fn display(&self) -> bytes::Displayable<'_> {
        bytes::Displayable::from(self.0.as_ref())
    }

    /// Wraps `data` between the sysex start & end tags.
    pub fn new_sysex(data: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(data.len() + 2);

        buf.push(sysex::TAG);
        buf.extend_from_slice(data);
        buf.push(sysex::END_TAG);

        Self(buf.into())
    }
}

impl<const S: usize> From<[u8; S]> for Msg {
    fn from(buf: [u8; S]) -> Self {
        Self(buf.into())
    }
}

impl std::ops::Deref for Msg {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MsgList(Vec<Msg>);

impl MsgList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn none() -> Self {
        Self(Vec::with_capacity(0))
    }

    pub fn push(&mut self, msg: impl Into<Msg>) {
        self.0.push(msg.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Msg> {
        self.0.iter()
    }

    /// Concatenates all the msgs, as they appear on the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|msg| msg.iter().copied()).collect()
    }
}
