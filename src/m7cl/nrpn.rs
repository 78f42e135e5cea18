//! Channel on/off control through NRPN.

use super::Error;
use crate::midi::{
    self,
    control_change::{self, DATA_ENTRY_LSB, DATA_ENTRY_MSB, NRPN_LSB, NRPN_MSB},
    u14, MsgList,
};

/// NRPN address of input channel 1 on/off.
pub const CHANNEL_ON_BASE: u16 = 0x05b6;

/// First NRPN address past the addressable channels.
pub const CHANNEL_ON_LIMIT: u16 = 0x05ed;

pub const ON: u8 = 127;
pub const OFF: u8 = 0;

/// Number of channels which can be switched on / off.
pub const MAX_CHANNEL: u16 = CHANNEL_ON_LIMIT - CHANNEL_ON_BASE;

/// Returns the NRPN address for the 1-based `channel` on/off parameter.
pub fn channel_on_address(channel: u16) -> Result<u16, Error> {
    if channel == 0 {
        return Err(Error::ChannelOutOfRange(channel));
    }

    match CHANNEL_ON_BASE.checked_add(channel - 1) {
        Some(address) if address < CHANNEL_ON_LIMIT => Ok(address),
        _ => Err(Error::ChannelOutOfRange(channel)),
    }
}

/// Builds the msgs switching `channel` on or off.
///
/// No msgs are produced if `active` is `None`.
pub fn channel_on(channel: u16, active: Option<bool>) -> Result<MsgList, Error> {
    let address = channel_on_address(channel)?;

    let active = match active {
        Some(active) => active,
        None => return Ok(MsgList::none()),
    };

    let [addr_lsb, addr_msb] =
        u14::to_lsb_msb(address).map_err(|_| Error::ChannelOutOfRange(channel))?;
    let value = if active { ON } else { OFF };
    let tag_chan = control_change::TAG | midi::Channel::default();

    let mut list = MsgList::new();
    list.push([tag_chan, NRPN_LSB, addr_lsb]);
    list.push([tag_chan, NRPN_MSB, addr_msb]);
    list.push([tag_chan, DATA_ENTRY_MSB, value]);
    list.push([tag_chan, DATA_ENTRY_LSB, value]);

    Ok(list)
}
