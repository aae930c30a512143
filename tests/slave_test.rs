mod common;

use common::FakeBus;

use rscp_proto::frame::encode;
use rscp_proto::types::CPU_TYPE_ESP32_WROOM_02D;
use rscp_proto::{
    BuzzerAction, BuzzerTone, ButtonState, DeviceInfo, Error, Handlers, ModbusCrc16, RelayState,
    ShutterAction, ShutterMotion, ShutterPosition, Slave, Status,
};

const TICKS: u32 = 100;

/// Records every dispatched call and answers with fixed state.
struct Recorder {
    relay: RelayState,
    button: ButtonState,
    position: ShutterPosition,
    respond: Status,
    seen_actions: Vec<ShutterAction>,
    seen_positions: Vec<ShutterPosition>,
    seen_relays: Vec<RelayState>,
    seen_buzzers: Vec<BuzzerAction>,
}

impl Recorder {
    fn new() -> Recorder {
        Recorder {
            relay: RelayState::Off,
            button: ButtonState::On,
            position: ShutterPosition {
                shutter: 1,
                position: 75,
            },
            respond: Status::Ok,
            seen_actions: Vec::new(),
            seen_positions: Vec::new(),
            seen_relays: Vec::new(),
            seen_buzzers: Vec::new(),
        }
    }
}

impl Handlers for Recorder {
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
        self.button
    }

    fn set_shutter_action(&mut self, action: ShutterAction) -> Status {
        self.seen_actions.push(action);
        self.respond
    }

    fn set_shutter_position(&mut self, position: ShutterPosition) -> Status {
        self.seen_positions.push(position);
        self.respond
    }

    fn set_switch_relay(&mut self, state: RelayState) -> Status {
        self.seen_relays.push(state);
        self.respond
    }

    fn set_buzzer_action(&mut self, action: BuzzerAction) -> Status {
        self.seen_buzzers.push(action);
        self.respond
    }
}

fn slave_with_request(command: u8, payload: &[u8]) -> Slave<FakeBus, ModbusCrc16, Recorder> {
    let mut bus = FakeBus::new();
    let wire = encode(&ModbusCrc16, command, payload).unwrap();
    bus.feed(&wire);
    Slave::new(bus, ModbusCrc16, Recorder::new())
}

#[test]
fn identification_query_replies_with_the_info_block() {
    let mut slave = slave_with_request(0x03, &[]);
    slave.handle(TICKS).unwrap();

    let expected = DeviceInfo::new(CPU_TYPE_ESP32_WROOM_02D, 0x01).to_bytes();
    let (bus, _, _) = slave.release();
    assert_eq!(
        bus.tx,
        encode(&ModbusCrc16, 0x03, &expected).unwrap().as_slice()
    );
}

#[test]
fn read_commands_reply_with_state_not_status() {
    let mut slave = slave_with_request(0x06, &[]);
    slave.handle(TICKS).unwrap();
    let (bus, _, _) = slave.release();
    // Payload is the position structure itself, no status byte.
    assert_eq!(
        bus.tx,
        encode(&ModbusCrc16, 0x06, &[1, 75]).unwrap().as_slice()
    );

    let mut slave = slave_with_request(0x0A, &[]);
    slave.handle(TICKS).unwrap();
    let (bus, _, _) = slave.release();
    assert_eq!(
        bus.tx,
        encode(&ModbusCrc16, 0x0A, &[ButtonState::On.code()])
            .unwrap()
            .as_slice()
    );
}

#[test]
fn set_relay_invokes_the_callback_and_acks() {
    let mut slave = slave_with_request(0x07, &[RelayState::On.code()]);
    slave.handle(TICKS).unwrap();

    let (bus, _, recorder) = slave.release();
    assert_eq!(recorder.seen_relays, vec![RelayState::On]);
    assert_eq!(
        bus.tx,
        encode(&ModbusCrc16, 0x07, &[Status::Ok.code()])
            .unwrap()
            .as_slice()
    );
}

#[test]
fn callback_status_travels_verbatim() {
    let mut slave = slave_with_request(
        0x04,
        &ShutterAction {
            shutter: 0,
            motion: ShutterMotion::Up,
            retries: 1,
        }
        .to_bytes(),
    );
    slave.handlers_mut().respond = Status::Other(0x55);
    slave.handle(TICKS).unwrap();

    let (bus, _, _) = slave.release();
    assert_eq!(
        bus.tx,
        encode(&ModbusCrc16, 0x04, &[0x55]).unwrap().as_slice()
    );
}

#[test]
fn buzzer_argument_arrives_decoded() {
    let buzzer = BuzzerAction {
        tone: BuzzerTone::On,
        volume: 70_000,
        duration_ms: 1200,
    };
    let mut slave = slave_with_request(0x09, &buzzer.to_bytes());
    slave.handle(TICKS).unwrap();

    let (_, _, recorder) = slave.release();
    assert_eq!(recorder.seen_buzzers, vec![buzzer]);
}

#[test]
fn malformed_request_is_dropped_silently() {
    let mut bus = FakeBus::new();
    let mut wire = encode(&ModbusCrc16, 0x07, &[RelayState::On.code()]).unwrap();
    wire[2] ^= 0xFF; // corrupt the command byte
    bus.feed(&wire);

    let mut slave = Slave::new(bus, ModbusCrc16, Recorder::new());
    assert_eq!(slave.handle(TICKS).unwrap_err(), Error::Malformed);

    let (bus, _, recorder) = slave.release();
    // No reply of any kind: the requester runs into its own timeout.
    assert!(bus.tx.is_empty());
    assert!(recorder.seen_relays.is_empty());
}

#[test]
fn unknown_command_answers_not_supported() {
    let mut slave = slave_with_request(0x42, &[0x01, 0x02]);
    assert_eq!(slave.handle(TICKS).unwrap_err(), Error::NotSupported);

    let (bus, _, _) = slave.release();
    assert_eq!(
        bus.tx,
        encode(&ModbusCrc16, 0x42, &[Status::NotSupported.code()])
            .unwrap()
            .as_slice()
    );
}

#[test]
fn unparseable_argument_answers_nok_without_dispatch() {
    // One byte where the shutter action needs three.
    let mut slave = slave_with_request(0x04, &[0x01]);
    slave.handle(TICKS).unwrap();

    let (bus, _, recorder) = slave.release();
    assert!(recorder.seen_actions.is_empty());
    assert_eq!(
        bus.tx,
        encode(&ModbusCrc16, 0x04, &[Status::Nok.code()])
            .unwrap()
            .as_slice()
    );
}

#[test]
fn out_of_range_relay_code_answers_nok() {
    let mut slave = slave_with_request(0x07, &[0x07]);
    slave.handle(TICKS).unwrap();

    let (bus, _, recorder) = slave.release();
    assert!(recorder.seen_relays.is_empty());
    assert_eq!(
        bus.tx,
        encode(&ModbusCrc16, 0x07, &[Status::Nok.code()])
            .unwrap()
            .as_slice()
    );
}

#[test]
fn idle_bus_times_out() {
    let bus = FakeBus::new();
    let mut slave = Slave::new(bus, ModbusCrc16, Recorder::new());
    assert_eq!(slave.handle(TICKS).unwrap_err(), Error::Timeout);
}
