//! nom parsers for the fixed-layout payload structures.
//!
//! Multi-byte fields are little-endian on the wire; the frame checksum
//! trailer is the only big-endian quantity in the protocol. Trailing
//! payload bytes beyond a structure are left unparsed — each command
//! selects exactly one structure, and only its prefix matters.

use nom::combinator::map_opt;
use nom::number::complete::{le_u16, le_u32, u8};
use nom::sequence::tuple;
use nom::IResult;

use crate::types::{
    ButtonState, BuzzerAction, BuzzerTone, DeviceInfo, RelayState, ShutterAction, ShutterMotion,
    ShutterPosition,
};

type Buf = [u8];

pub(crate) fn device_info(buf: &Buf) -> IResult<&Buf, DeviceInfo> {
    let (buf, (flags, crc_type, protocol_version, cpu_type, sw_version, max_packet)) =
        tuple((u8, u8, u8, u8, u8, le_u16))(buf)?;
    Ok((
        buf,
        DeviceInfo {
            flags,
            crc_type,
            protocol_version,
            cpu_type,
            sw_version,
            max_packet,
        },
    ))
}

pub(crate) fn shutter_action(buf: &Buf) -> IResult<&Buf, ShutterAction> {
    let (buf, (shutter, motion, retries)) = tuple((u8, shutter_motion, u8))(buf)?;
    Ok((
        buf,
        ShutterAction {
            shutter,
            motion,
            retries,
        },
    ))
}

pub(crate) fn shutter_position(buf: &Buf) -> IResult<&Buf, ShutterPosition> {
    let (buf, (shutter, position)) = tuple((u8, u8))(buf)?;
    Ok((buf, ShutterPosition { shutter, position }))
}

pub(crate) fn buzzer_action(buf: &Buf) -> IResult<&Buf, BuzzerAction> {
    let (buf, (tone, volume, duration_ms)) = tuple((buzzer_tone, le_u32, le_u32))(buf)?;
    Ok((
        buf,
        BuzzerAction {
            tone,
            volume,
            duration_ms,
        },
    ))
}

pub(crate) fn relay_state(buf: &Buf) -> IResult<&Buf, RelayState> {
    map_opt(u8, RelayState::from_code)(buf)
}

pub(crate) fn button_state(buf: &Buf) -> IResult<&Buf, ButtonState> {
    map_opt(u8, ButtonState::from_code)(buf)
}

fn shutter_motion(buf: &Buf) -> IResult<&Buf, ShutterMotion> {
    map_opt(u8, ShutterMotion::from_code)(buf)
}

fn buzzer_tone(buf: &Buf) -> IResult<&Buf, BuzzerTone> {
    map_opt(u8, BuzzerTone::from_code)(buf)
}
