//! Remote level metering.
//!
//! Request (host to console):
//!
//! `f0 43 30 3e 11 21 <category> <point> <start channel> <count H> <count L> f7`
//!
//! Response (console to host), one level code per channel:
//!
//! `f0 43 10 3e 11 21 <category> <point> <start channel> <level>... f7`
//!
//! The device byte differs between request (`0x30`) and response (`0x10`).
//! Responses are matched regardless of that byte.

use std::{fmt, sync::Arc};

use super::{level, Error, DIGITAL_MIXER, INPUT_CHANNELS, M7CL_ID, YAMAHA_ID};
use crate::{
    bytes,
    midi::{self, sysex},
};

pub const REQUEST_DEVICE: u8 = 0x30;
pub const RESPONSE_DEVICE: u8 = 0x10;
pub const REMOTE_LEVEL_METER: u8 = 0x21;
pub const CATEGORY_INPUT: u8 = 0x00;

/// Header length up to & including the start channel.
pub const HEADER_LEN: usize = 9;

/// Per-channel display levels, index 0 being channel 1.
pub type ChannelLevelFrame = Arc<[f32]>;

/// Signal path stage at which the console samples levels.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize)]
#[serde(try_from = "MeterPointRepr")]
pub enum MeterPoint {
    PreHpf = 0x00,
    PreAtt = 0x01,
    PostEq = 0x02,
    PostDyn1 = 0x03,
    PostDyn2 = 0x04,
    PostOn = 0x05,
    #[default]
    PreFader = 0x06,
    Dyn1GainReduction = 0x07,
    Dyn2GainReduction = 0x08,
}

impl MeterPoint {
    pub const ALL: [MeterPoint; 9] = [
        MeterPoint::PreHpf,
        MeterPoint::PreAtt,
        MeterPoint::PostEq,
        MeterPoint::PostDyn1,
        MeterPoint::PostDyn2,
        MeterPoint::PostOn,
        MeterPoint::PreFader,
        MeterPoint::Dyn1GainReduction,
        MeterPoint::Dyn2GainReduction,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        use MeterPoint::*;
        match self {
            PreHpf => "PRE_HPF",
            PreAtt => "PRE_ATT",
            PostEq => "POST_EQ",
            PostDyn1 => "POST_DYN1",
            PostDyn2 => "POST_DYN2",
            PostOn => "POST_ON",
            PreFader => "PRE_FADER",
            Dyn1GainReduction => "DYN1_GAIN_REDUCTION",
            Dyn2GainReduction => "DYN2_GAIN_REDUCTION",
        }
    }
}

impl fmt::Display for MeterPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for MeterPoint {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|point| point.code() == code)
            .ok_or(Error::UnknownMeterPoint(code))
    }
}

impl std::str::FromStr for MeterPoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(point) = Self::ALL
            .iter()
            .copied()
            .find(|point| point.as_str().eq_ignore_ascii_case(s))
        {
            return Ok(point);
        }

        s.parse::<u8>()
            .map_err(|_| format!("unknown metering point {s}"))
            .and_then(|code| MeterPoint::try_from(code).map_err(|err| err.to_string()))
    }
}

/// Accepts both the name & the numeric code of a metering point.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum MeterPointRepr {
    Code(u8),
    Name(String),
}

impl TryFrom<MeterPointRepr> for MeterPoint {
    type Error = String;

    fn try_from(repr: MeterPointRepr) -> Result<Self, Self::Error> {
        match repr {
            MeterPointRepr::Code(code) => MeterPoint::try_from(code).map_err(|err| err.to_string()),
            MeterPointRepr::Name(name) => name.parse(),
        }
    }
}

/// Builds the level metering request for all the input channels.
pub fn request(point: MeterPoint) -> midi::Msg {
    midi::Msg::new_sysex(&[
        YAMAHA_ID,
        REQUEST_DEVICE,
        DIGITAL_MIXER,
        M7CL_ID,
        REMOTE_LEVEL_METER,
        CATEGORY_INPUT,
        point.code(),
        0x00, // start channel
        0x00, // count H
        INPUT_CHANNELS,
    ])
}

/// Decodes a metering response.
///
/// Returns `Ok(None)` if `buf` is not a metering response:
/// unrelated sysex traffic is expected on the port.
pub fn decode(buf: &[u8]) -> Result<Option<ChannelLevelFrame>, Error> {
    let is_level_meter = matches!(
        buf,
        [sysex::TAG, YAMAHA_ID, _, DIGITAL_MIXER, M7CL_ID, REMOTE_LEVEL_METER, ..]
    );
    if !is_level_meter {
        return Ok(None);
    }

    let malformed = || Error::MalformedMeteringFrame(bytes::Displayable::from(buf).to_owned());

    if buf.last() != Some(&sysex::END_TAG) {
        return Err(malformed());
    }

    let payload = buf.get(HEADER_LEN..buf.len() - 1).unwrap_or_default();

    payload
        .iter()
        .map(|&code| level::level(code))
        .collect::<Option<ChannelLevelFrame>>()
        .map(Some)
        .ok_or_else(malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(codes: &[u8]) -> Vec<u8> {
        let mut buf = vec![
            sysex::TAG,
            YAMAHA_ID,
            RESPONSE_DEVICE,
            DIGITAL_MIXER,
            M7CL_ID,
            REMOTE_LEVEL_METER,
            CATEGORY_INPUT,
            MeterPoint::PreFader.code(),
            0x00,
        ];
        buf.extend_from_slice(codes);
        buf.push(sysex::END_TAG);

        buf
    }

    #[test]
    fn request_frame() {
        assert_eq!(
            request(MeterPoint::PreFader).inner(),
            [0xf0, 0x43, 0x30, 0x3e, 0x11, 0x21, 0x00, 0x06, 0x00, 0x00, 0x38, 0xf7]
        );
        assert_eq!(request(MeterPoint::PreHpf)[7], 0x00);
        assert_eq!(request(MeterPoint::Dyn2GainReduction)[7], 0x08);
    }

    #[test]
    fn full_frame() {
        let frame = decode(&response(&[level::ZERO_DB_CODE; 56]))
            .unwrap()
            .unwrap();

        assert_eq!(frame.len(), 56);
        assert!(frame.iter().all(|&lvl| lvl == 1.0));
    }

    #[test]
    fn request_then_response() {
        let req = request(MeterPoint::PostEq);
        let codes: Vec<u8> = (0..56).map(|idx| idx * 2).collect();

        let mut resp = response(&codes);
        resp[7] = req[7];

        let frame = decode(&resp).unwrap().unwrap();
        assert_eq!(frame.len(), 56);
        assert!(frame.iter().all(|lvl| (0.0..=1.0).contains(lvl)));
        assert_eq!(frame[0], 0.0);
    }

    #[test]
    fn short_frame() {
        let frame = decode(&response(&[0, 127, 126])).unwrap().unwrap();
        assert_eq!(&frame[..], &[0.0, 1.0, 1.0]);

        let frame = decode(&response(&[])).unwrap().unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn either_device_byte() {
        let mut resp = response(&[127; 4]);
        resp[2] = REQUEST_DEVICE;
        assert_eq!(decode(&resp).unwrap().unwrap().len(), 4);
    }

    #[test]
    fn unrelated_msgs() {
        assert!(decode(&[]).unwrap().is_none());
        assert!(decode(&[0xb0, 0x62, 0x36]).unwrap().is_none());
        // Mackie device query
        assert!(decode(&[0xf0, 0x00, 0x00, 0x66, 0x14, 0x00, 0xf7])
            .unwrap()
            .is_none());

        let mut other_mixer = response(&[127; 4]);
        other_mixer[4] = 0x12;
        assert!(decode(&other_mixer).unwrap().is_none());
    }

    #[test]
    fn malformed() {
        let mut resp = response(&[12, 0x80, 24]);
        assert!(matches!(
            decode(&resp),
            Err(Error::MalformedMeteringFrame(_))
        ));

        resp = response(&[12, 24]);
        resp.pop();
        assert!(matches!(
            decode(&resp),
            Err(Error::MalformedMeteringFrame(_))
        ));
    }

    #[test]
    fn meter_point_names() {
        assert_eq!("PRE_FADER".parse::<MeterPoint>().unwrap(), MeterPoint::PreFader);
        assert_eq!("post_eq".parse::<MeterPoint>().unwrap(), MeterPoint::PostEq);
        assert_eq!("3".parse::<MeterPoint>().unwrap(), MeterPoint::PostDyn1);
        assert!("9".parse::<MeterPoint>().is_err());
        assert!("POST_FADER".parse::<MeterPoint>().is_err());
        assert_eq!(MeterPoint::default(), MeterPoint::PreFader);
    }
}
