//! Slave role: waits for one request, dispatches it to the application
//! and answers it.

use log::{debug, warn};
use snafu::ensure;

use crate::frame;
use crate::transport::{Checksum, Transport};
use crate::types::{
    BuzzerAction, ButtonState, Command, DeviceInfo, RelayState, ShutterAction, ShutterPosition,
    Status,
};
use crate::{Error, MalformedSnafu, NotSupportedSnafu, Ticks};

/// Application callbacks dispatched by [`Slave::handle`].
///
/// Getters produce the reply for the matching read command; the reply
/// payload *is* the answer, there is no separate status byte. Setters
/// consume the argument of the matching write command and report an
/// application [`Status`], which travels back as a one-byte reply.
pub trait Handlers {
    fn device_info(&mut self) -> DeviceInfo;
    fn shutter_position(&mut self) -> ShutterPosition;
    fn switch_relay(&mut self) -> RelayState;
    fn switch_button(&mut self) -> ButtonState;

    fn set_shutter_action(&mut self, action: ShutterAction) -> Status;
    fn set_shutter_position(&mut self, position: ShutterPosition) -> Status;
    fn set_switch_relay(&mut self, state: RelayState) -> Status;
    fn set_buzzer_action(&mut self, action: BuzzerAction) -> Status;
}

/// The responding side of the bus.
pub struct Slave<B, C, H> {
    bus: B,
    crc: C,
    handlers: H,
}

impl<B, C, H> Slave<B, C, H>
where
    B: Transport,
    C: Checksum,
    H: Handlers,
{
    pub fn new(bus: B, crc: C, handlers: H) -> Slave<B, C, H> {
        Slave { bus, crc, handlers }
    }

    pub fn handlers(&self) -> &H {
        &self.handlers
    }

    pub fn handlers_mut(&mut self) -> &mut H {
        &mut self.handlers
    }

    /// Hand the transport, checksum and handlers back to the caller.
    pub fn release(self) -> (B, C, H) {
        (self.bus, self.crc, self.handlers)
    }

    /// Service one request: receive, validate, dispatch, answer.
    ///
    /// A frame that fails checksum verification is dropped without any
    /// reply — not even its command byte can be trusted, so the
    /// requester is left to its own timeout. An unrecognized command is
    /// answered with a [`Status::NotSupported`] frame and reported as
    /// [`Error::NotSupported`] once that answer is on the wire.
    pub fn handle(&mut self, timeout_ticks: Ticks) -> Result<(), Error> {
        let request = frame::recv(&mut self.bus, timeout_ticks)?;
        ensure!(request.verify(&self.crc), MalformedSnafu);

        let command = match Command::from_code(request.command()) {
            Some(command) => command,
            None => {
                warn!("unsupported command {:#04x}", request.command());
                self.reply_status(request.command(), Status::NotSupported)?;
                return NotSupportedSnafu.fail();
            }
        };
        debug!("dispatching {:?}", command);

        // The payload is reinterpreted only after the command byte has
        // selected exactly one argument structure.
        match command {
            Command::CpuQuery => {
                let info = self.handlers.device_info();
                self.reply(command, &info.to_bytes())
            }
            Command::GetShutterPosition => {
                let position = self.handlers.shutter_position();
                self.reply(command, &position.to_bytes())
            }
            Command::GetSwitchRelay => {
                let state = self.handlers.switch_relay();
                self.reply(command, &[state.code()])
            }
            Command::GetSwitchButton => {
                let state = self.handlers.switch_button();
                self.reply(command, &[state.code()])
            }
            Command::SetShutterAction => {
                let status = ShutterAction::parse(request.payload())
                    .map(|action| self.handlers.set_shutter_action(action))
                    .unwrap_or(Status::Nok);
                self.reply_status(command.code(), status)
            }
            Command::SetShutterPosition => {
                let status = ShutterPosition::parse(request.payload())
                    .map(|position| self.handlers.set_shutter_position(position))
                    .unwrap_or(Status::Nok);
                self.reply_status(command.code(), status)
            }
            Command::SetSwitchRelay => {
                let status = RelayState::parse(request.payload())
                    .map(|state| self.handlers.set_switch_relay(state))
                    .unwrap_or(Status::Nok);
                self.reply_status(command.code(), status)
            }
            Command::SetBuzzerAction => {
                let status = BuzzerAction::parse(request.payload())
                    .map(|action| self.handlers.set_buzzer_action(action))
                    .unwrap_or(Status::Nok);
                self.reply_status(command.code(), status)
            }
        }
    }

    fn reply(&mut self, command: Command, payload: &[u8]) -> Result<(), Error> {
        frame::send(&mut self.bus, &self.crc, command.code(), payload)
    }

    fn reply_status(&mut self, command: u8, status: Status) -> Result<(), Error> {
        frame::send(&mut self.bus, &self.crc, command, &[status.code()])
    }
}
