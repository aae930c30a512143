//! End-to-end exchanges: a master and a slave on separate threads,
//! talking through an in-memory duplex bus.

mod common;

use std::thread;

use common::DuplexBus;

use rscp_proto::types::{CPU_TYPE_ATMEGA328P_8MHZ, CRC_TYPE_MODBUS16, PROTOCOL_VERSION};
use rscp_proto::{
    BuzzerAction, BuzzerTone, ButtonState, DeviceInfo, Handlers, Master, ModbusCrc16, RelayState,
    ShutterAction, ShutterMotion, ShutterPosition, Slave, Status,
};

// Generous budget: every failed poll yields the thread, so the budget
// only has to outlast scheduling noise.
const TICKS: u32 = 5_000_000;

struct PanelSim {
    relay: RelayState,
    position: ShutterPosition,
    buzzes: Vec<BuzzerAction>,
}

impl PanelSim {
    fn new() -> PanelSim {
        PanelSim {
            relay: RelayState::Off,
            position: ShutterPosition {
                shutter: 0,
                position: 0,
            },
            buzzes: Vec::new(),
        }
    }
}

impl Handlers for PanelSim {
    fn device_info(&mut self) -> DeviceInfo {
        DeviceInfo::new(CPU_TYPE_ATMEGA328P_8MHZ, 0x01)
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
        if action.motion == ShutterMotion::Stop {
            return Status::Fail;
        }
        Status::Ok
    }

    fn set_shutter_position(&mut self, position: ShutterPosition) -> Status {
        self.position = position;
        Status::Ok
    }

    fn set_switch_relay(&mut self, state: RelayState) -> Status {
        self.relay = state;
        Status::Ok
    }

    fn set_buzzer_action(&mut self, action: BuzzerAction) -> Status {
        self.buzzes.push(action);
        Status::Ok
    }
}

#[test]
fn chat() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (master_io, slave_io) = DuplexBus::pair();

    let node = thread::spawn(move || {
        let mut slave = Slave::new(slave_io, ModbusCrc16, PanelSim::new());
        for _ in 0..7 {
            slave.handle(TICKS).expect("slave exchange failed");
        }
        slave.release()
    });

    let mut master = Master::new(master_io, ModbusCrc16);

    // Identification: 7-byte reply, checksum already verified by the
    // master before any field is surfaced.
    let info = master.query_device_info(TICKS).unwrap();
    assert_eq!(info.crc_type, CRC_TYPE_MODBUS16);
    assert_eq!(info.protocol_version, PROTOCOL_VERSION);
    assert_eq!(info.cpu_type, CPU_TYPE_ATMEGA328P_8MHZ);
    assert_eq!(info.max_packet, 30);

    // Relay write, then read back through the protocol.
    let status = master.set_switch_relay(RelayState::On, TICKS).unwrap();
    assert_eq!(status, Status::Ok);
    assert_eq!(master.get_switch_relay(TICKS).unwrap(), RelayState::On);

    // Shutter position round trip.
    let target = ShutterPosition {
        shutter: 2,
        position: 80,
    };
    assert_eq!(
        master.set_shutter_position(target, TICKS).unwrap(),
        Status::Ok
    );
    assert_eq!(master.get_shutter_position(TICKS).unwrap(), target);

    // Application-level failure is a status, not a protocol error.
    let status = master
        .set_shutter_action(
            ShutterAction {
                shutter: 2,
                motion: ShutterMotion::Stop,
                retries: 0,
            },
            TICKS,
        )
        .unwrap();
    assert_eq!(status, Status::Fail);

    // Multi-byte little-endian argument across the wire.
    let buzz = BuzzerAction {
        tone: BuzzerTone::On,
        volume: 123_456,
        duration_ms: 2500,
    };
    assert_eq!(master.set_buzzer_action(buzz, TICKS).unwrap(), Status::Ok);

    let (_, _, panel) = node.join().expect("slave thread panicked");
    assert_eq!(panel.relay, RelayState::On);
    assert_eq!(panel.position, target);
    assert_eq!(panel.buzzes, vec![buzz]);
}
