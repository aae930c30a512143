//! Minimal slave node: services frames read from stdin and writes the
//! replies to stdout. Feed it a recorded bus capture to watch the
//! dispatch happen.

use std::error::Error;
use std::io::{self, Read, Write};

use rscp_proto::types::CPU_TYPE_ESP32_WROOM_02D;
use rscp_proto::{
    BuzzerAction, ButtonState, DeviceInfo, Handlers, ModbusCrc16, RelayState, ShutterAction,
    ShutterPosition, Slave, Status, Transport, TransportError,
};

struct StdioBus {
    stdin: io::Stdin,
    stdout: io::Stdout,
}

impl Transport for StdioBus {
    fn try_read_byte(&mut self) -> Option<u8> {
        let mut byte = [0];
        match self.stdin.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }

    fn write(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.stdout
            .write_all(frame)
            .and_then(|_| self.stdout.flush())
            .map_err(|_| TransportError)
    }
}

struct Panel {
    relay: RelayState,
    position: ShutterPosition,
}

impl Handlers for Panel {
    fn device_info(&mut self) -> DeviceInfo {
        DeviceInfo::new(CPU_TYPE_ESP32_WROOM_02D, 0x01)
    }

    fn shutter_position(&mut self) -> ShutterPosition {
        self.position
    }

    fn switch_relay(&mut self) -> RelayState {
        self.relay
    }

    fn switch_button(&mut self) -> ButtonState {
        ButtonState::Off
    }

    fn set_shutter_action(&mut self, action: ShutterAction) -> Status {
        eprintln!("shutter {} -> {:?}", action.shutter, action.motion);
        Status::Ok
    }

    fn set_shutter_position(&mut self, position: ShutterPosition) -> Status {
        eprintln!("shutter {} -> {}%", position.shutter, position.position);
        self.position = position;
        Status::Ok
    }

    fn set_switch_relay(&mut self, state: RelayState) -> Status {
        eprintln!("relay -> {:?}", state);
        self.relay = state;
        Status::Ok
    }

    fn set_buzzer_action(&mut self, action: BuzzerAction) -> Status {
        eprintln!("buzzer {:?} for {} ms", action.tone, action.duration_ms);
        Status::Ok
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let bus = StdioBus {
        stdin: io::stdin(),
        stdout: io::stdout(),
    };
    let panel = Panel {
        relay: RelayState::Off,
        position: ShutterPosition {
            shutter: 0,
            position: 0,
        },
    };

    let mut node = Slave::new(bus, ModbusCrc16, panel);
    loop {
        match node.handle(1000) {
            Ok(()) => {}
            // stdin drained
            Err(rscp_proto::Error::Timeout) => break,
            Err(rscp_proto::Error::NotSupported) => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
