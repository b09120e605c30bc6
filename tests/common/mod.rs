//! Host-side stand-ins for the board: a microsecond clock, a one-wire line with a scripted
//! slave, and a two-node IR channel stepped in half beats.

#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    convert::Infallible,
    rc::Rc,
};

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use irthermo::{
    config::LinkConfig,
    ir::{self, CarrierGate, DebounceBank, PeerStateHolder, Receiver, RxHardware, Transmitter},
    onewire::{crc::crc8, Line, LineRole},
};

/// Shared simulated time in microseconds
#[derive(Clone, Default)]
pub struct SimClock(Rc<Cell<u64>>);

impl SimClock {
    pub fn now(&self) -> u64 {
        self.0.get()
    }
}

impl DelayUs<u32> for SimClock {
    fn delay_us(&mut self, us: u32) {
        self.0.set(self.0.get() + u64::from(us));
    }
}

impl DelayMs<u32> for SimClock {
    fn delay_ms(&mut self, ms: u32) {
        self.0.set(self.0.get() + u64::from(ms) * 1_000);
    }
}

/// Slave side of the simulated bus, fed with decoded slots
pub trait Slave {
    /// Reset pulse seen; returns whether to answer with a presence pulse
    fn on_reset(&mut self) -> bool;

    /// The master wrote a bit
    fn on_write(&mut self, bit: bool);

    /// A slot is starting. `Some` claims it as a read slot with the bit to send.
    fn on_read_slot(&mut self) -> Option<bool>;
}

/// Nothing attached
pub struct Silent;

impl Slave for Silent {
    fn on_reset(&mut self) -> bool {
        false
    }

    fn on_write(&mut self, _bit: bool) {}

    fn on_read_slot(&mut self) -> Option<bool> {
        None
    }
}

/// Echoes written bits back once switched to replay
#[derive(Default)]
pub struct Loopback {
    bits: VecDeque<bool>,
    pub replay: bool,
}

impl Slave for Loopback {
    fn on_reset(&mut self) -> bool {
        true
    }

    fn on_write(&mut self, bit: bool) {
        self.bits.push_back(bit);
    }

    fn on_read_slot(&mut self) -> Option<bool> {
        if self.replay {
            Some(self.bits.pop_front().unwrap_or(true))
        } else {
            None
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Phase {
    Rom,
    Function,
    WriteScratchpad(usize),
    Transmit,
    Done,
}

/// DS18B20 behind skip ROM
pub struct SimDs18b20 {
    phase: Phase,
    shift: u8,
    bits: u8,
    tx: VecDeque<bool>,
    pub rom: [u8; 8],
    pub scratchpad: [u8; 9],
    pub parasite: bool,
    pub commands: Vec<u8>,
    pub conversions: u32,
}

impl SimDs18b20 {
    pub fn new(raw: u16) -> Self {
        let mut rom = [0x28, 0xFF, 0x64, 0x1E, 0x0F, 0x83, 0xFB, 0x00];
        rom[7] = crc8(&rom[..7]);

        let mut sensor = Self {
            phase: Phase::Done,
            shift: 0,
            bits: 0,
            tx: VecDeque::new(),
            rom,
            scratchpad: [0x50, 0x05, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x00],
            parasite: false,
            commands: Vec::new(),
            conversions: 0,
        };
        sensor.set_raw(raw);
        sensor
    }

    pub fn set_raw(&mut self, raw: u16) {
        let [lo, hi] = raw.to_le_bytes();
        self.scratchpad[0] = lo;
        self.scratchpad[1] = hi;
        self.seal();
    }

    fn seal(&mut self) {
        self.scratchpad[8] = crc8(&self.scratchpad[..8]);
    }

    fn load(&mut self, bytes: &[u8]) {
        self.tx = bytes
            .iter()
            .flat_map(|byte| (0..8).map(move |i| (byte >> i) & 1 == 1))
            .collect();
        self.phase = Phase::Transmit;
    }

    fn on_byte(&mut self, byte: u8) {
        self.commands.push(byte);
        match self.phase {
            Phase::Rom => match byte {
                0xCC => self.phase = Phase::Function,
                0x33 => {
                    let rom = self.rom;
                    self.load(&rom);
                }
                _ => self.phase = Phase::Done,
            },
            Phase::Function => match byte {
                0x44 => {
                    self.conversions += 1;
                    self.phase = Phase::Done;
                }
                0xBE => {
                    let pad = self.scratchpad;
                    self.load(&pad);
                }
                0x4E => self.phase = Phase::WriteScratchpad(2),
                0xB4 => {
                    self.tx = VecDeque::from([!self.parasite]);
                    self.phase = Phase::Transmit;
                }
                _ => self.phase = Phase::Done,
            },
            Phase::WriteScratchpad(i) => {
                self.scratchpad[i] = byte;
                self.seal();
                self.phase = if i < 4 {
                    Phase::WriteScratchpad(i + 1)
                } else {
                    Phase::Done
                };
            }
            Phase::Transmit | Phase::Done => {}
        }
    }
}

impl Slave for SimDs18b20 {
    fn on_reset(&mut self) -> bool {
        self.phase = Phase::Rom;
        self.shift = 0;
        self.bits = 0;
        self.tx.clear();
        true
    }

    fn on_write(&mut self, bit: bool) {
        self.shift |= u8::from(bit) << self.bits;
        self.bits += 1;
        if self.bits == 8 {
            let byte = self.shift;
            self.shift = 0;
            self.bits = 0;
            self.on_byte(byte);
        }
    }

    fn on_read_slot(&mut self) -> Option<bool> {
        if self.phase == Phase::Transmit {
            Some(self.tx.pop_front().unwrap_or(true))
        } else {
            None
        }
    }
}

struct Inner<S> {
    clock: SimClock,
    slave: S,
    role: LineRole,
    roles: Vec<LineRole>,
    stuck: bool,
    low_since: u64,
    read_slot: bool,
    /// Interval during which the slave holds the line low
    slave_low: Option<(u64, u64)>,
}

/// One-wire line shared between the bus master under test and the test body
pub struct SimLine<S>(Rc<RefCell<Inner<S>>>);

impl<S> Clone for SimLine<S> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<S: Slave> SimLine<S> {
    pub fn new(clock: &SimClock, slave: S) -> Self {
        Self(Rc::new(RefCell::new(Inner {
            clock: clock.clone(),
            slave,
            role: LineRole::Released,
            roles: Vec::new(),
            stuck: false,
            low_since: 0,
            read_slot: false,
            slave_low: None,
        })))
    }

    /// A line shorted to ground
    pub fn stuck(clock: &SimClock, slave: S) -> Self {
        let line = Self::new(clock, slave);
        line.0.borrow_mut().stuck = true;
        line
    }

    pub fn with_slave<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.0.borrow_mut().slave)
    }

    pub fn roles(&self) -> Vec<LineRole> {
        self.0.borrow().roles.clone()
    }
}

impl<S: Slave> Line for SimLine<S> {
    type Error = Infallible;

    fn set_role(&mut self, role: LineRole) -> Result<(), Infallible> {
        let mut inner = self.0.borrow_mut();
        let inner = &mut *inner;
        let now = inner.clock.now();
        let was_low = inner.role == LineRole::DriveLow;
        let is_low = role == LineRole::DriveLow;

        if is_low && !was_low {
            inner.low_since = now;
            inner.read_slot = false;
            if let Some(bit) = inner.slave.on_read_slot() {
                inner.read_slot = true;
                if !bit {
                    inner.slave_low = Some((now, now + 30));
                }
            }
        } else if was_low && !is_low {
            let held = now - inner.low_since;
            if held >= 480 {
                if inner.slave.on_reset() {
                    inner.slave_low = Some((now + 30, now + 150));
                }
            } else if !inner.read_slot {
                inner.slave.on_write(held < 15);
            }
        }

        inner.role = role;
        inner.roles.push(role);
        Ok(())
    }

    fn is_high(&mut self) -> Result<bool, Infallible> {
        let inner = self.0.borrow();
        let now = inner.clock.now();
        let slave_low = inner
            .slave_low
            .is_some_and(|(from, until)| (from..until).contains(&now));
        Ok(!(inner.stuck || inner.role == LineRole::DriveLow || slave_low))
    }
}

/// Sampler timer and edge interrupt of one node, in half-beat ticks
#[derive(Debug, Default)]
pub struct SlotTimer {
    now: u64,
    pub due: Option<u64>,
    pub edge: bool,
}

impl RxHardware for SlotTimer {
    fn start_sampling(&mut self) {
        self.due = Some(self.now + 1);
    }

    fn stop_sampling(&mut self) {
        self.due = None;
    }

    fn enable_edge(&mut self) {
        self.edge = true;
    }

    fn disable_edge(&mut self) {
        self.edge = false;
    }
}

pub struct Node {
    pub tx: Transmitter,
    pub debounce: DebounceBank,
    pub peer: PeerStateHolder,
    pub rx: Receiver,
    pub hw: SlotTimer,
    pub gate: CarrierGate,
    pub outcomes: Vec<Result<ir::State, ir::FrameError>>,
}

impl Node {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            tx: Transmitter::new(config),
            debounce: DebounceBank::new(config),
            peer: PeerStateHolder::new(config),
            rx: Receiver::new(),
            hw: SlotTimer {
                edge: true,
                ..SlotTimer::default()
            },
            gate: CarrierGate::new(),
            outcomes: Vec::new(),
        }
    }

    fn beat(&mut self) {
        let transmit = ir::beat(&mut self.tx, &mut self.debounce, &mut self.peer);
        self.gate.set(transmit);
    }
}

/// `sender`'s emitter shines on `receiver`'s detector. Beats land on even ticks, samples on
/// odd ones.
pub struct Channel {
    pub sender: Node,
    pub receiver: Node,
    pub tick: u64,
    detector_high: bool,
    /// Ticks at which a sample reads the detector as high regardless of the carrier
    pub dropouts: Vec<u64>,
    /// Carrier level of every beat the sender ran
    pub sent: Vec<bool>,
    /// Sender's TX indicator after every beat
    pub framing: Vec<bool>,
    /// Receiver's RX indicator after every sample
    pub receiving: Vec<bool>,
}

impl Channel {
    pub fn new(sender: &LinkConfig, receiver: &LinkConfig) -> Self {
        Self {
            sender: Node::new(sender),
            receiver: Node::new(receiver),
            tick: 0,
            detector_high: true,
            dropouts: Vec::new(),
            sent: Vec::new(),
            framing: Vec::new(),
            receiving: Vec::new(),
        }
    }

    pub fn step(&mut self) {
        let rx = &mut self.receiver;
        rx.hw.now = self.tick;

        if self.tick % 2 == 0 {
            self.sender.beat();
            rx.beat();
            self.sent.push(self.sender.gate.is_on());
            self.framing.push(self.sender.tx.is_framing());

            let high = !self.sender.gate.is_on();
            if self.detector_high && !high && rx.hw.edge {
                rx.rx.on_edge(&mut rx.hw);
            }
            self.detector_high = high;
        }

        if rx.hw.due == Some(self.tick) {
            let level = self.detector_high || self.dropouts.contains(&self.tick);
            rx.hw.due = Some(self.tick + 2);
            if let Some(outcome) = ir::sample(&mut rx.rx, &mut rx.peer, level, &mut rx.hw) {
                rx.outcomes.push(outcome);
            }
            self.receiving.push(rx.rx.is_receiving());
        }

        self.tick += 1;
    }

    pub fn run_until(&mut self, tick: u64) {
        while self.tick < tick {
            self.step();
        }
    }
}
