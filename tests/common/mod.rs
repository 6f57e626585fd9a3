//! recording peripherals shared by the test suites
#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    rc::Rc,
    };
use embedded_hal::delay::DelayNs;

use uart485::{
    Rs485, Pins,
    frame::FrameConfig,
    hal::{Uart, Gpio, PinId, PinMode, Level},
    };


/// everything the controller did to its peripherals, in order
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Mode(PinId, PinMode),
    Pin(PinId, Level),
    DelayUs(u32),
    DelayMs(u32),
    Open(u32, FrameConfig),
    Close,
    Flush,
    Write(u8),
}

pub type Log = Rc<RefCell<Vec<Event>>>;

pub struct MockUart {
    pub log: Log,
    /// bytes waiting on the receive side
    pub rx: Rc<RefCell<VecDeque<u8>>>,
    /// when false, writes are refused like a full or closed peripheral
    pub accept: bool,
}
impl Uart for MockUart {
    fn open(&mut self, baud_rate: u32, frame: FrameConfig) {self.log.borrow_mut().push(Event::Open(baud_rate, frame))}
    fn close(&mut self) {self.log.borrow_mut().push(Event::Close)}
    fn available(&mut self) -> usize {self.rx.borrow().len()}
    fn peek(&mut self) -> Option<u8> {self.rx.borrow().front().copied()}
    fn read(&mut self) -> Option<u8> {self.rx.borrow_mut().pop_front()}
    fn write(&mut self, byte: u8) -> usize {
        if !self.accept
            {return 0}
        self.log.borrow_mut().push(Event::Write(byte));
        1
    }
    fn flush(&mut self) {self.log.borrow_mut().push(Event::Flush)}
}

pub struct MockGpio {
    pub log: Log,
}
impl Gpio for MockGpio {
    fn set_mode(&mut self, pin: PinId, mode: PinMode) {self.log.borrow_mut().push(Event::Mode(pin, mode))}
    fn write(&mut self, pin: PinId, level: Level) {self.log.borrow_mut().push(Event::Pin(pin, level))}
}

pub struct MockDelay {
    pub log: Log,
}
impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {self.log.borrow_mut().push(Event::DelayUs(ns / 1000))}
    fn delay_us(&mut self, us: u32) {self.log.borrow_mut().push(Event::DelayUs(us))}
    fn delay_ms(&mut self, ms: u32) {self.log.borrow_mut().push(Event::DelayMs(ms))}
}

pub type MockBus = Rs485<MockUart, MockGpio, MockDelay>;

/// a controller on recording peripherals, with its event log and receive queue
pub struct Bench {
    pub bus: MockBus,
    pub log: Log,
    pub rx: Rc<RefCell<VecDeque<u8>>>,
}
impl Bench {
    pub fn new(pins: Pins) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let log = Log::default();
        let rx = Rc::new(RefCell::new(VecDeque::new()));
        let bus = Rs485::new(
            MockUart {log: log.clone(), rx: rx.clone(), accept: true},
            MockGpio {log: log.clone()},
            MockDelay {log: log.clone()},
            pins,
            );
        Self {bus, log, rx}
    }
    /// events recorded so far, the log is emptied
    pub fn take(&self) -> Vec<Event> {
        self.log.take()
    }
    pub fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }
    /// last level driven on each pin
    pub fn levels(&self) -> HashMap<PinId, Level> {
        levels(&self.log)
    }
    pub fn touches_gpio(&self) -> bool {
        self.log.borrow().iter().any(|event| matches!(event, Event::Mode(..) | Event::Pin(..)))
    }
}

/// last level driven on each pin
pub fn levels(log: &Log) -> HashMap<PinId, Level> {
    let mut levels = HashMap::new();
    for event in log.borrow().iter() {
        if let &Event::Pin(pin, level) = event {
            levels.insert(pin, level);
        }
    }
    levels
}

/// tx on 1, DE on 2, RE on 3
pub const WIRED: Pins = Pins::new(Some(1), Some(2), Some(3));
