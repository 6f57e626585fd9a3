/*!
    backends for running the controller on a computer, through a usb to RS-485 adapter

    most adapters switch their transceiver direction by themselves, so the controller usually runs there with [crate::Pins::unwired] and a gpio that does nothing.
*/

use std::{
    io,
    path::PathBuf,
    time::Duration,
    };
use serial2::{SerialPort, CharSize, StopBits, Parity};
use embedded_hal::delay::DelayNs;
use log::*;

use crate::{
    frame::{self, FrameConfig},
    hal::Uart,
    };


/// received bytes buffered ahead of [Uart::read]
const LOOKAHEAD: usize = 64;

/**
    uart backed by an operating system serial port

    the port is opened on [Uart::open] and dropped on [Uart::close]. An open failure is logged and leaves the port closed, reads then see nothing and writes report 0 bytes.
*/
pub struct HostSerial {
    path: PathBuf,
    port: Option<SerialPort>,
    pending: heapless::Deque<u8, LOOKAHEAD>,
}
impl HostSerial {
    /// the serial port file, nothing is opened yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            port: None,
            pending: heapless::Deque::new(),
        }
    }
    pub fn is_open(&self) -> bool {self.port.is_some()}

    /// move whatever the port already received into the lookahead, without blocking
    fn fill(&mut self) {
        let Some(port) = &self.port
            else {return};
        let mut receive = [0u8; LOOKAHEAD];
        let free = LOOKAHEAD - self.pending.len();
        if free == 0
            {return}
        match port.read(&mut receive[.. free]) {
            Ok(count) => for &byte in &receive[.. count] {
                // cannot overflow, at most `free` bytes were read
                let _ = self.pending.push_back(byte);
            },
            Err(err) if matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {},
            Err(err) => warn!("serial port read failed: {}", err),
        }
    }
}

impl Uart for HostSerial {
    fn open(&mut self, baud_rate: u32, frame: FrameConfig) {
        self.pending.clear();
        let port = SerialPort::open(&self.path, |mut settings: serial2::Settings| -> io::Result<serial2::Settings> {
                settings.set_raw();
                settings.set_baud_rate(baud_rate)?;
                settings.set_char_size(match frame.data_bits {
                    frame::DataBits::Five => CharSize::Bits5,
                    frame::DataBits::Six => CharSize::Bits6,
                    frame::DataBits::Seven => CharSize::Bits7,
                    frame::DataBits::Eight => CharSize::Bits8,
                    });
                settings.set_stop_bits(match frame.stop_bits {
                    frame::StopBits::One => StopBits::One,
                    frame::StopBits::Two => StopBits::Two,
                    });
                settings.set_parity(match frame.parity {
                    frame::Parity::None => Parity::None,
                    frame::Parity::Even => Parity::Even,
                    frame::Parity::Odd => Parity::Odd,
                    });
                Ok(settings)
                })
            .and_then(|mut port| {
                port.set_read_timeout(Duration::ZERO)?;
                Ok(port)
                });
        self.port = match port {
            Ok(port) => {
                debug!("opened {} at {} bauds", self.path.display(), baud_rate);
                Some(port)
            },
            Err(err) => {
                error!("cannot open {}: {}", self.path.display(), err);
                None
            },
        };
    }
    fn close(&mut self) {
        self.port = None;
        self.pending.clear();
    }
    fn available(&mut self) -> usize {
        self.fill();
        self.pending.len()
    }
    fn peek(&mut self) -> Option<u8> {
        if self.pending.is_empty()
            {self.fill()}
        self.pending.front().copied()
    }
    fn read(&mut self) -> Option<u8> {
        if self.pending.is_empty()
            {self.fill()}
        self.pending.pop_front()
    }
    fn write(&mut self, byte: u8) -> usize {
        let Some(port) = &self.port
            else {return 0};
        match port.write(&[byte]) {
            Ok(count) => count,
            Err(err) => {
                warn!("serial port write failed: {}", err);
                0
            },
        }
    }
    fn flush(&mut self) {
        if let Some(port) = &self.port {
            if let Err(err) = port.flush() {
                warn!("serial port flush failed: {}", err);
            }
        }
    }
}

/// blocking delay sleeping the current thread
#[derive(Copy, Clone, Debug, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns.into()));
    }
    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(us.into()));
    }
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms.into()));
    }
}
