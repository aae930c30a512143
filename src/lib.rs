//! Length-prefixed, CRC-protected command/reply framing for the RSCP
//! shutter-control bus.
//!
//! RSCP connects two roles over a byte-oriented link (originally an
//! inter-chip i2c bus): a [`Master`] that issues one request and blocks,
//! with a tick-based timeout, for exactly one matching reply, and a
//! [`Slave`] that waits for one request, dispatches it to the
//! application [`Handlers`] and answers it. The [`frame`] module turns
//! the raw byte stream into validated frames for both roles.
//!
//! On-wire layout of a frame:
//!
//! ```text
//! [preamble 0xAA] [length] [command] [payload 0..=26] [crc hi] [crc lo]
//!
//! length   = 2 + payload size (the checksum bytes are not counted)
//! checksum = CRC(length ‖ command ‖ payload)
//! ```
//!
//! The byte transport and the checksum algorithm are injected
//! capabilities; see [`Transport`] and [`Checksum`]. [`ModbusCrc16`] is
//! the checksum algorithm the identification reply advertises.
//!
//! # Example
//!
//! ```
//! use rscp_proto::{Master, ModbusCrc16, RelayState, Transport, TransportError};
//!
//! # struct Loopback(std::collections::VecDeque<u8>);
//! # impl Transport for Loopback {
//! #     fn try_read_byte(&mut self) -> Option<u8> { self.0.pop_front() }
//! #     fn write(&mut self, _frame: &[u8]) -> Result<(), TransportError> { Ok(()) }
//! # }
//! # fn connect_bus() -> Loopback { Loopback(Default::default()) }
//! let bus = connect_bus();
//! let mut master = Master::new(bus, ModbusCrc16);
//! // One request, one reply, 1000 poll ticks of patience.
//! match master.set_switch_relay(RelayState::On, 1000) {
//!     Ok(status) => println!("relay accepted: {:?}", status),
//!     Err(err) => eprintln!("exchange failed: {}", err),
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

use snafu::Snafu;

pub mod frame;
pub mod master;
mod nom_parser;
pub mod slave;
mod transport;
pub mod types;

pub use frame::Frame;
pub use master::Master;
pub use slave::{Handlers, Slave};
pub use transport::{Checksum, ModbusCrc16, Transport, TransportError};
pub use types::{
    ButtonState, BuzzerAction, BuzzerTone, Command, DeviceInfo, ReadReply, RelayState,
    ShutterAction, ShutterMotion, ShutterPosition, Status,
};

/// Bus idle/filler sentinel. Skipped while seeking the length byte and
/// therefore never a valid `length` value.
pub const PREAMBLE: u8 = 0xAA;

/// Payload capacity of a single frame.
pub const MAX_PAYLOAD: usize = 26;

/// Transmit buffer capacity, preamble and checksum included.
pub const MAX_FRAME: usize = 64;

/// Largest whole packet on the wire: header, payload and checksum.
pub const MAX_PACKET: usize = 2 + MAX_PAYLOAD + 2;

/// Cooperative timeout budget. One tick is consumed per failed byte
/// poll, so the effective wait time depends on the polling frequency,
/// not on wall-clock time.
pub type Ticks = u32;

/// Protocol-level failures.
///
/// All of these are terminal for the call that produced them; retry
/// policy, if any, belongs to the caller.
#[derive(Debug, Snafu, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The tick budget ran out before a complete frame was assembled.
    #[snafu(display("timed out waiting for the bus"))]
    Timeout,
    /// The frame did not fit the fixed buffers, on either side of the
    /// link. Usually the sign of a corrupt length field.
    #[snafu(display("frame does not fit the buffer"))]
    Overflow,
    /// Checksum verification failed; nothing in the frame can be
    /// trusted.
    #[snafu(display("frame checksum mismatch"))]
    Malformed,
    /// The dispatcher does not recognize the command code.
    #[snafu(display("command not supported"))]
    NotSupported,
    /// The reply does not answer the request that was sent.
    #[snafu(display("reply does not match the request"))]
    InvalidAnswer,
    /// The transport rejected the outgoing frame.
    #[snafu(display("transmit failed: {source}"))]
    TxFailed { source: TransportError },
    /// The transport rejected the reply-size reservation.
    #[snafu(display("reply reservation failed: {source}"))]
    RequestFailed { source: TransportError },
}
