//! Master and slave wired back-to-back over an in-memory link, running
//! the identification and relay exchanges. `RUST_LOG=trace` shows the
//! frame traffic.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::Result;

use rscp_proto::types::CPU_TYPE_ATMEGA328P_8MHZ;
use rscp_proto::{
    BuzzerAction, ButtonState, DeviceInfo, Handlers, Master, ModbusCrc16, RelayState,
    ShutterAction, ShutterMotion, ShutterPosition, Slave, Status, Transport, TransportError,
};

const TICKS: u32 = 5_000_000;

type Queue = Arc<Mutex<VecDeque<u8>>>;

/// One end of a duplex in-memory bus.
struct Wire {
    rx: Queue,
    tx: Queue,
}

impl Wire {
    fn pair() -> (Wire, Wire) {
        let a: Queue = Default::default();
        let b: Queue = Default::default();
        (
            Wire {
                rx: Arc::clone(&a),
                tx: Arc::clone(&b),
            },
            Wire { rx: b, tx: a },
        )
    }
}

impl Transport for Wire {
    fn try_read_byte(&mut self) -> Option<u8> {
        self.rx.lock().unwrap().pop_front()
    }

    fn on_rx_empty(&mut self) {
        thread::yield_now();
    }

    fn write(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.tx.lock().unwrap().extend(frame);
        Ok(())
    }
}

#[derive(Default)]
struct Panel {
    relay: Option<RelayState>,
}

impl Handlers for Panel {
    fn device_info(&mut self) -> DeviceInfo {
        DeviceInfo::new(CPU_TYPE_ATMEGA328P_8MHZ, 0x01)
    }

    fn shutter_position(&mut self) -> ShutterPosition {
        ShutterPosition {
            shutter: 0,
            position: 100,
        }
    }

    fn switch_relay(&mut self) -> RelayState {
        self.relay.unwrap_or(RelayState::Off)
    }

    fn switch_button(&mut self) -> ButtonState {
        ButtonState::Off
    }

    fn set_shutter_action(&mut self, action: ShutterAction) -> Status {
        println!("slave: drive shutter {} {:?}", action.shutter, action.motion);
        Status::Ok
    }

    fn set_shutter_position(&mut self, _position: ShutterPosition) -> Status {
        Status::Ok
    }

    fn set_switch_relay(&mut self, state: RelayState) -> Status {
        println!("slave: relay -> {:?}", state);
        self.relay = Some(state);
        Status::Ok
    }

    fn set_buzzer_action(&mut self, _action: BuzzerAction) -> Status {
        Status::Ok
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let (master_wire, slave_wire) = Wire::pair();

    let node = thread::spawn(move || -> Result<(), rscp_proto::Error> {
        let mut slave = Slave::new(slave_wire, ModbusCrc16, Panel::default());
        for _ in 0..4 {
            slave.handle(TICKS)?;
        }
        Ok(())
    });

    let mut master = Master::new(master_wire, ModbusCrc16);

    let info = master.query_device_info(TICKS)?;
    println!(
        "master: peer cpu {:#04x}, protocol v{}, sw v{}, max packet {}",
        info.cpu_type, info.protocol_version, info.sw_version, info.max_packet
    );

    let status = master.set_switch_relay(RelayState::On, TICKS)?;
    println!("master: relay on -> {:?}", status);

    let relay = master.get_switch_relay(TICKS)?;
    println!("master: relay reads back {:?}", relay);

    let status = master.set_shutter_action(
        ShutterAction {
            shutter: 1,
            motion: ShutterMotion::Open,
            retries: 2,
        },
        TICKS,
    )?;
    println!("master: open shutter -> {:?}", status);

    node.join().expect("slave thread panicked")?;
    Ok(())
}
