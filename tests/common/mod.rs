#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;

use rscp_proto::{Transport, TransportError};

/// Scripted single-ended bus: reads come from a pre-loaded queue,
/// writes and reservations are recorded for inspection, and failures
/// can be triggered per call site.
pub struct FakeBus {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    pub polls: usize,
    pub reservations: Vec<usize>,
    pub fail_write: bool,
    pub fail_reserve: bool,
}

impl FakeBus {
    pub fn new() -> FakeBus {
        FakeBus {
            rx: VecDeque::new(),
            tx: Vec::new(),
            polls: 0,
            reservations: Vec::new(),
            fail_write: false,
            fail_reserve: false,
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }
}

impl Transport for FakeBus {
    fn try_read_byte(&mut self) -> Option<u8> {
        self.polls += 1;
        self.rx.pop_front()
    }

    fn write(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if self.fail_write {
            return Err(TransportError);
        }
        self.tx.extend_from_slice(frame);
        Ok(())
    }

    fn reserve_reply(&mut self, max_len: usize) -> Result<(), TransportError> {
        if self.fail_reserve {
            return Err(TransportError);
        }
        self.reservations.push(max_len);
        Ok(())
    }
}

type Queue = Arc<Mutex<VecDeque<u8>>>;

/// In-memory duplex bus for running a master and a slave against each
/// other on two threads.
pub struct DuplexBus;

impl DuplexBus {
    pub fn pair() -> (BusEndpoint, BusEndpoint) {
        let a: Queue = Default::default();
        let b: Queue = Default::default();
        (
            BusEndpoint {
                rx: Arc::clone(&a),
                tx: Arc::clone(&b),
            },
            BusEndpoint { rx: b, tx: a },
        )
    }
}

pub struct BusEndpoint {
    rx: Queue,
    tx: Queue,
}

impl Transport for BusEndpoint {
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
