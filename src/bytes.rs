use std::{borrow::Cow, fmt};

/// Hex rendering of a MIDI byte buffer, e.g. `(hex): f0, 43, 30, 3e, f7`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Displayable<'a>(Cow<'a, [u8]>);

impl<'a> From<&'a [u8]> for Displayable<'a> {
    fn from(buf: &'a [u8]) -> Self {
        Self(Cow::Borrowed(buf))
    }
}

impl From<Vec<u8>> for Displayable<'static> {
    fn from(buf: Vec<u8>) -> Self {
        Self(Cow::Owned(buf))
    }
}

impl<'a> Displayable<'a> {
    pub fn to_owned(&self) -> Displayable<'static> {
        Displayable(Cow::Owned(self.0.to_vec()))
    }
}

impl<'a> fmt::Display for Displayable<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (first, rest) = match self.0.split_first() {
            Some(split) => split,
            None => return Ok(()),
        };

        write!(f, "(hex): {first:02x}")?;
        for byte in rest {
            write!(f, ", {byte:02x}")?;
        }

        Ok(())
    }
}
