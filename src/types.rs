//! Commands, status codes and the fixed-layout structures carried as
//! frame payloads.
//!
//! The frame codec treats payloads as opaque bytes; these types give
//! them their meaning. Every structure has a `to_bytes` mirror of its
//! wire layout and a `parse` that accepts a payload prefix.

use crate::nom_parser;
use crate::MAX_PACKET;

/// The checksum algorithm identifier carried in [`DeviceInfo`].
pub const CRC_TYPE_MODBUS16: u8 = 0x01;
/// Protocol revision implemented by this crate.
pub const PROTOCOL_VERSION: u8 = 0x01;
/// CPU type identifier: ATmega328P at 8 MHz.
pub const CPU_TYPE_ATMEGA328P_8MHZ: u8 = 0x01;
/// CPU type identifier: ESP32-WROOM-02D.
pub const CPU_TYPE_ESP32_WROOM_02D: u8 = 0x02;

/// Protocol command byte. A reply always echoes the code of the
/// request it answers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Identification query: CPU type, versions and frame capacity.
    CpuQuery = 0x03,
    /// Drive a shutter (stop/up/down/open/close).
    SetShutterAction = 0x04,
    /// Move a shutter to an absolute position.
    SetShutterPosition = 0x05,
    /// Read back a shutter position.
    GetShutterPosition = 0x06,
    /// Switch the relay on or off.
    SetSwitchRelay = 0x07,
    /// Read the relay state.
    GetSwitchRelay = 0x08,
    /// Sound or silence the buzzer.
    SetBuzzerAction = 0x09,
    /// Read the switch-button state.
    GetSwitchButton = 0x0A,
}

impl Command {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Command> {
        Some(match code {
            0x03 => Command::CpuQuery,
            0x04 => Command::SetShutterAction,
            0x05 => Command::SetShutterPosition,
            0x06 => Command::GetShutterPosition,
            0x07 => Command::SetSwitchRelay,
            0x08 => Command::GetSwitchRelay,
            0x09 => Command::SetBuzzerAction,
            0x0A => Command::GetSwitchButton,
            _ => return None,
        })
    }
}

/// One-byte application result code, carried as the whole payload of a
/// write-command reply.
///
/// [`Status::Ok`] is the single defined success value. Everything else
/// is an application-level failure, not a protocol fault; codes outside
/// the catalog travel untouched as [`Status::Other`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// Recoverable application failure.
    Fail,
    /// Fatal application failure, or an argument that did not parse.
    Nok,
    /// The peer does not implement the command.
    NotSupported,
    /// Application-defined code outside the catalog.
    Other(u8),
}

impl Status {
    pub const fn code(self) -> u8 {
        match self {
            Status::Ok => 0x00,
            Status::Fail => 0x01,
            Status::Nok => 0x02,
            Status::NotSupported => 0x03,
            Status::Other(code) => code,
        }
    }

    pub const fn from_code(code: u8) -> Status {
        match code {
            0x00 => Status::Ok,
            0x01 => Status::Fail,
            0x02 => Status::Nok,
            0x03 => Status::NotSupported,
            other => Status::Other(other),
        }
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }
}

/// Shutter drive verb for [`Command::SetShutterAction`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum ShutterMotion {
    Stop = 0x01,
    Up = 0x02,
    Down = 0x03,
    Open = 0x04,
    Close = 0x05,
}

impl ShutterMotion {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<ShutterMotion> {
        Some(match code {
            0x01 => ShutterMotion::Stop,
            0x02 => ShutterMotion::Up,
            0x03 => ShutterMotion::Down,
            0x04 => ShutterMotion::Open,
            0x05 => ShutterMotion::Close,
            _ => return None,
        })
    }
}

/// Relay contact state; argument of [`Command::SetSwitchRelay`] and
/// reply of [`Command::GetSwitchRelay`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum RelayState {
    Off = 0x01,
    On = 0x02,
}

impl RelayState {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<RelayState> {
        Some(match code {
            0x01 => RelayState::Off,
            0x02 => RelayState::On,
            _ => return None,
        })
    }

    pub fn parse(payload: &[u8]) -> Option<RelayState> {
        nom_parser::relay_state(payload).ok().map(|(_, state)| state)
    }
}

/// Switch-button state, reply of [`Command::GetSwitchButton`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum ButtonState {
    Off = 0x01,
    On = 0x02,
}

impl ButtonState {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<ButtonState> {
        Some(match code {
            0x01 => ButtonState::Off,
            0x02 => ButtonState::On,
            _ => return None,
        })
    }

    pub fn parse(payload: &[u8]) -> Option<ButtonState> {
        nom_parser::button_state(payload)
            .ok()
            .map(|(_, state)| state)
    }
}

/// Buzzer tone switch for [`BuzzerAction`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum BuzzerTone {
    On = 0x01,
    Off = 0x02,
}

impl BuzzerTone {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<BuzzerTone> {
        Some(match code {
            0x01 => BuzzerTone::On,
            0x02 => BuzzerTone::Off,
            _ => return None,
        })
    }
}

/// Identification block, reply of [`Command::CpuQuery`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub flags: u8,
    /// Checksum algorithm in use; see [`CRC_TYPE_MODBUS16`].
    pub crc_type: u8,
    pub protocol_version: u8,
    pub cpu_type: u8,
    pub sw_version: u8,
    /// Largest whole packet (header, payload and checksum) the device
    /// accepts.
    pub max_packet: u16,
}

impl DeviceInfo {
    /// Identification with the standard flags, checksum and protocol
    /// fields already filled in.
    pub fn new(cpu_type: u8, sw_version: u8) -> DeviceInfo {
        DeviceInfo {
            flags: 0,
            crc_type: CRC_TYPE_MODBUS16,
            protocol_version: PROTOCOL_VERSION,
            cpu_type,
            sw_version,
            max_packet: MAX_PACKET as u16,
        }
    }

    pub fn to_bytes(self) -> [u8; 7] {
        let [len_lo, len_hi] = self.max_packet.to_le_bytes();
        [
            self.flags,
            self.crc_type,
            self.protocol_version,
            self.cpu_type,
            self.sw_version,
            len_lo,
            len_hi,
        ]
    }

    pub fn parse(payload: &[u8]) -> Option<DeviceInfo> {
        nom_parser::device_info(payload).ok().map(|(_, info)| info)
    }
}

/// Argument of [`Command::SetShutterAction`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ShutterAction {
    pub shutter: u8,
    pub motion: ShutterMotion,
    /// Drive attempts the slave should make before giving up.
    pub retries: u8,
}

impl ShutterAction {
    pub fn to_bytes(self) -> [u8; 3] {
        [self.shutter, self.motion.code(), self.retries]
    }

    pub fn parse(payload: &[u8]) -> Option<ShutterAction> {
        nom_parser::shutter_action(payload)
            .ok()
            .map(|(_, action)| action)
    }
}

/// Argument of [`Command::SetShutterPosition`] and reply of
/// [`Command::GetShutterPosition`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ShutterPosition {
    pub shutter: u8,
    /// Absolute position, 0 (closed) to 100 (open).
    pub position: u8,
}

impl ShutterPosition {
    pub fn to_bytes(self) -> [u8; 2] {
        [self.shutter, self.position]
    }

    pub fn parse(payload: &[u8]) -> Option<ShutterPosition> {
        nom_parser::shutter_position(payload)
            .ok()
            .map(|(_, position)| position)
    }
}

/// Argument of [`Command::SetBuzzerAction`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BuzzerAction {
    pub tone: BuzzerTone,
    pub volume: u32,
    pub duration_ms: u32,
}

impl BuzzerAction {
    pub fn to_bytes(self) -> [u8; 9] {
        let mut buf = [0; 9];
        buf[0] = self.tone.code();
        buf[1..5].copy_from_slice(&self.volume.to_le_bytes());
        buf[5..9].copy_from_slice(&self.duration_ms.to_le_bytes());
        buf
    }

    pub fn parse(payload: &[u8]) -> Option<BuzzerAction> {
        nom_parser::buzzer_action(payload)
            .ok()
            .map(|(_, action)| action)
    }
}

/// Fixed-layout structure answering one of the read commands.
///
/// Lets [`Master`](crate::Master) request and decode replies
/// generically; the slave side encodes per command arm instead.
pub trait ReadReply: Sized {
    /// Command whose reply carries this structure.
    const COMMAND: Command;
    /// Encoded payload size.
    const SIZE: usize;

    fn parse(payload: &[u8]) -> Option<Self>;
}

impl ReadReply for DeviceInfo {
    const COMMAND: Command = Command::CpuQuery;
    const SIZE: usize = 7;

    fn parse(payload: &[u8]) -> Option<DeviceInfo> {
        DeviceInfo::parse(payload)
    }
}

impl ReadReply for ShutterPosition {
    const COMMAND: Command = Command::GetShutterPosition;
    const SIZE: usize = 2;

    fn parse(payload: &[u8]) -> Option<ShutterPosition> {
        ShutterPosition::parse(payload)
    }
}

impl ReadReply for RelayState {
    const COMMAND: Command = Command::GetSwitchRelay;
    const SIZE: usize = 1;

    fn parse(payload: &[u8]) -> Option<RelayState> {
        RelayState::parse(payload)
    }
}

impl ReadReply for ButtonState {
    const COMMAND: Command = Command::GetSwitchButton;
    const SIZE: usize = 1;

    fn parse(payload: &[u8]) -> Option<ButtonState> {
        ButtonState::parse(payload)
    }
}
