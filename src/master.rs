//! Master role: issues one request and blocks for exactly one matching
//! reply.
//!
//! There is no pipelining and no internal retry; each verb owns the bus
//! for the duration of one exchange and reports the first failure to
//! the caller.

use log::warn;
use snafu::{ensure, OptionExt, ResultExt};

use crate::frame;
use crate::transport::{Checksum, Transport};
use crate::types::{
    BuzzerAction, ButtonState, Command, DeviceInfo, ReadReply, RelayState, ShutterAction,
    ShutterPosition, Status,
};
use crate::{Error, InvalidAnswerSnafu, MalformedSnafu, RequestFailedSnafu, Ticks, MAX_PAYLOAD};

/// The requesting side of the bus.
///
/// ```
/// use rscp_proto::{Master, ModbusCrc16, Transport, TransportError};
/// # struct Bus;
/// # impl Transport for Bus {
/// #     fn try_read_byte(&mut self) -> Option<u8> { None }
/// #     fn write(&mut self, _frame: &[u8]) -> Result<(), TransportError> { Ok(()) }
/// # }
/// # let bus = Bus;
/// let mut master = Master::new(bus, ModbusCrc16);
/// assert!(master.query_device_info(10).is_err()); // nobody answers
/// ```
pub struct Master<B, C> {
    bus: B,
    crc: C,
}

impl<B, C> Master<B, C>
where
    B: Transport,
    C: Checksum,
{
    pub fn new(bus: B, crc: C) -> Master<B, C> {
        Master { bus, crc }
    }

    /// Hand the transport and checksum back to the caller.
    pub fn release(self) -> (B, C) {
        (self.bus, self.crc)
    }

    /// Request `reply.len()` bytes of data from the slave.
    ///
    /// Sends `command` with an empty payload, announces the expected
    /// reply size to the transport, then waits for one frame. The reply
    /// must pass checksum verification and echo `command`; exactly
    /// `reply.len()` payload bytes are copied out. A matching reply
    /// that carries fewer bytes than requested is refused as
    /// [`Error::InvalidAnswer`].
    pub fn request_data(
        &mut self,
        command: Command,
        reply: &mut [u8],
        timeout_ticks: Ticks,
    ) -> Result<(), Error> {
        frame::send(&mut self.bus, &self.crc, command.code(), &[])?;
        let answer = self.await_reply(command, reply.len(), timeout_ticks)?;
        ensure!(answer.payload().len() >= reply.len(), InvalidAnswerSnafu);
        reply.copy_from_slice(&answer.payload()[..reply.len()]);
        Ok(())
    }

    /// Send an action command and return the slave's result code.
    ///
    /// The single payload byte of a valid, command-matching reply is
    /// the application [`Status`], not data.
    pub fn send_action(
        &mut self,
        command: Command,
        payload: &[u8],
        timeout_ticks: Ticks,
    ) -> Result<Status, Error> {
        frame::send(&mut self.bus, &self.crc, command.code(), payload)?;
        let answer = self.await_reply(command, 1, timeout_ticks)?;
        let code = answer
            .payload()
            .first()
            .copied()
            .context(InvalidAnswerSnafu)?;
        Ok(Status::from_code(code))
    }

    /// Query the peer's identification block.
    pub fn query_device_info(&mut self, timeout_ticks: Ticks) -> Result<DeviceInfo, Error> {
        self.request(timeout_ticks)
    }

    pub fn get_shutter_position(&mut self, timeout_ticks: Ticks) -> Result<ShutterPosition, Error> {
        self.request(timeout_ticks)
    }

    pub fn get_switch_relay(&mut self, timeout_ticks: Ticks) -> Result<RelayState, Error> {
        self.request(timeout_ticks)
    }

    pub fn get_switch_button(&mut self, timeout_ticks: Ticks) -> Result<ButtonState, Error> {
        self.request(timeout_ticks)
    }

    pub fn set_shutter_action(
        &mut self,
        action: ShutterAction,
        timeout_ticks: Ticks,
    ) -> Result<Status, Error> {
        self.send_action(Command::SetShutterAction, &action.to_bytes(), timeout_ticks)
    }

    pub fn set_shutter_position(
        &mut self,
        position: ShutterPosition,
        timeout_ticks: Ticks,
    ) -> Result<Status, Error> {
        self.send_action(
            Command::SetShutterPosition,
            &position.to_bytes(),
            timeout_ticks,
        )
    }

    pub fn set_switch_relay(
        &mut self,
        state: RelayState,
        timeout_ticks: Ticks,
    ) -> Result<Status, Error> {
        self.send_action(Command::SetSwitchRelay, &[state.code()], timeout_ticks)
    }

    pub fn set_buzzer_action(
        &mut self,
        action: BuzzerAction,
        timeout_ticks: Ticks,
    ) -> Result<Status, Error> {
        self.send_action(Command::SetBuzzerAction, &action.to_bytes(), timeout_ticks)
    }

    fn request<R: ReadReply>(&mut self, timeout_ticks: Ticks) -> Result<R, Error> {
        let mut buf = [0u8; MAX_PAYLOAD];
        let reply = &mut buf[..R::SIZE];
        self.request_data(R::COMMAND, reply, timeout_ticks)?;
        R::parse(reply).context(InvalidAnswerSnafu)
    }

    /// Reserve the reply slot, receive one frame and validate it.
    fn await_reply(
        &mut self,
        command: Command,
        reply_len: usize,
        timeout_ticks: Ticks,
    ) -> Result<frame::Frame, Error> {
        // Preamble, length and command bytes, the payload, and the two
        // checksum bytes.
        self.bus
            .reserve_reply(1 + 2 + reply_len + 2)
            .context(RequestFailedSnafu)?;

        let answer = frame::recv(&mut self.bus, timeout_ticks)?;
        ensure!(answer.verify(&self.crc), MalformedSnafu);
        if answer.command() != command.code() {
            warn!(
                "reply command {:#04x} does not echo request {:#04x}",
                answer.command(),
                command.code()
            );
            return InvalidAnswerSnafu.fail();
        }
        Ok(answer)
    }
}
