//! Frame codec: wire encoding and the byte-stream synchronization
//! state machine.
//!
//! Decoding works one byte at a time so it can resynchronize on an
//! arbitrary stream: there is no out-of-band framing, only the preamble
//! filler convention and the length byte. The codec has no checksum
//! capability of its own — a decoded [`Frame`] has merely survived the
//! state machine, and the caller must run [`Frame::verify`] before
//! trusting any field.

use arrayvec::ArrayVec;
use log::{debug, trace, warn};
use snafu::{ensure, ResultExt};

use crate::transport::{Checksum, Transport};
use crate::{Error, OverflowSnafu, TimeoutSnafu, Ticks, TxFailedSnafu};
use crate::{MAX_FRAME, MAX_PAYLOAD, PREAMBLE};

/// Bytes covered by the `length` field besides the payload: the length
/// byte itself and the command byte. The checksum width plays no part
/// in this, even though it happens to be two bytes as well.
const HEADER_LEN: usize = 2;

const CRC_SPAN: usize = HEADER_LEN + MAX_PAYLOAD;

type PayloadBuf = ArrayVec<u8, MAX_PAYLOAD>;

/// An encoded frame ready for [`Transport::write`].
pub type TxBuffer = ArrayVec<u8, MAX_FRAME>;

/// One complete protocol message.
///
/// Constructed fresh by every [`recv`] call and discarded after the
/// exchange it belongs to; no state survives between frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    length: u8,
    command: u8,
    payload: PayloadBuf,
    checksum: u16,
}

impl Frame {
    /// The received length byte: payload size plus the two header
    /// bytes.
    pub fn length(&self) -> u8 {
        self.length
    }

    /// The command byte. Replies echo the code of their request.
    pub fn command(&self) -> u8 {
        self.command
    }

    /// Command-specific payload, `length - 2` bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The checksum received in the frame trailer.
    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    /// Recompute the checksum over `length ‖ command ‖ payload` and
    /// compare it with the received trailer. A mismatch invalidates the
    /// whole frame, however well-formed the fields look.
    pub fn verify<C: Checksum>(&self, crc: &C) -> bool {
        let mut covered = ArrayVec::<u8, CRC_SPAN>::new();
        covered.push(self.length);
        covered.push(self.command);
        covered
            .try_extend_from_slice(&self.payload)
            .expect("BUG: checksum buffer too small");
        // The covered range is `length` bytes starting at the length
        // field. A degenerate length byte below 2 shrinks it.
        let span = covered.len().min(usize::from(self.length));
        crc.checksum(&covered[..span]) == self.checksum
    }
}

/// Decoder state. One byte advances the machine by at most one step.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum RxState {
    /// Discard preamble filler until a length candidate appears.
    SeekLength,
    ReadCommand,
    ReadPayload { expected: usize },
    ReadChecksumHi,
    ReadChecksumLo,
}

/// Block until one whole frame has been assembled from the bus, or the
/// tick budget runs out.
///
/// The budget covers the entire frame: every failed poll costs one tick
/// and runs the transport's idle hook. At most [`MAX_PAYLOAD`] payload
/// bytes are ever stored; a length byte asking for more fails with
/// [`Error::Overflow`] once the buffer is exhausted.
pub fn recv<B: Transport>(bus: &mut B, mut timeout_ticks: Ticks) -> Result<Frame, Error> {
    let mut state = RxState::SeekLength;
    let mut frame = Frame {
        length: 0,
        command: 0,
        payload: PayloadBuf::new(),
        checksum: 0,
    };

    loop {
        let byte = next_byte(bus, &mut timeout_ticks)?;
        state = match state {
            RxState::SeekLength => {
                if byte == PREAMBLE {
                    trace!("skipping preamble filler");
                    RxState::SeekLength
                } else {
                    frame.length = byte;
                    RxState::ReadCommand
                }
            }
            RxState::ReadCommand => {
                frame.command = byte;
                if usize::from(frame.length) > HEADER_LEN {
                    RxState::ReadPayload {
                        expected: usize::from(frame.length) - HEADER_LEN,
                    }
                } else {
                    // Zero-payload frame: the next byte is already the
                    // checksum, not payload.
                    RxState::ReadChecksumHi
                }
            }
            RxState::ReadPayload { expected } => {
                frame.payload.push(byte);
                if frame.payload.len() == expected {
                    RxState::ReadChecksumHi
                } else if frame.payload.is_full() {
                    warn!("length byte {} exceeds the payload buffer", frame.length);
                    return OverflowSnafu.fail();
                } else {
                    RxState::ReadPayload { expected }
                }
            }
            RxState::ReadChecksumHi => {
                frame.checksum = u16::from(byte) << 8;
                RxState::ReadChecksumLo
            }
            RxState::ReadChecksumLo => {
                frame.checksum |= u16::from(byte);
                trace!(
                    "rx frame: command {:#04x}, {} payload bytes",
                    frame.command,
                    frame.payload.len()
                );
                return Ok(frame);
            }
        };
    }
}

/// Encode a frame into its on-wire form, delegating the checksum to
/// the injected algorithm.
///
/// Fails with [`Error::Overflow`] instead of truncating when the
/// payload exceeds the frame capacity.
pub fn encode<C: Checksum>(crc: &C, command: u8, payload: &[u8]) -> Result<TxBuffer, Error> {
    ensure!(payload.len() <= MAX_PAYLOAD, OverflowSnafu);

    let mut buf = TxBuffer::new();
    buf.push(PREAMBLE);
    buf.push((HEADER_LEN + payload.len()) as u8);
    buf.push(command);
    buf.try_extend_from_slice(payload)
        .expect("BUG: transmit buffer too small");

    // Everything after the preamble is covered.
    let checksum = crc.checksum(&buf[1..]);
    buf.push((checksum >> 8) as u8);
    buf.push(checksum as u8);
    Ok(buf)
}

/// Encode and transmit one frame.
pub fn send<B, C>(bus: &mut B, crc: &C, command: u8, payload: &[u8]) -> Result<(), Error>
where
    B: Transport,
    C: Checksum,
{
    let buf = encode(crc, command, payload)?;
    debug!(
        "tx frame: command {:#04x}, {} payload bytes",
        command,
        payload.len()
    );
    bus.write(&buf).context(TxFailedSnafu)
}

fn next_byte<B: Transport>(bus: &mut B, ticks: &mut Ticks) -> Result<u8, Error> {
    loop {
        ensure!(*ticks > 0, TimeoutSnafu);
        if let Some(byte) = bus.try_read_byte() {
            return Ok(byte);
        }
        *ticks -= 1;
        bus.on_rx_empty();
    }
}
