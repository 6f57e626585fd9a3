use core::ops::{Deref, DerefMut};
use embedded_hal::delay::DelayNs;
use log::*;

use crate::{
    Error,
    frame::{FrameConfig, turnaround_micros},
    hal::{Uart, Gpio, PinId, PinMode, Level},
    };


/// turnaround used until the first [Rs485::begin], in microseconds
pub const DEFAULT_TURNAROUND_MICROS: u32 = 650;
/// guard time between the end of the last stop bit and releasing the bus driver, in microseconds
pub const TRAILING_GUARD_MICROS: u32 = 50;

/// pins wired to the transceiver, `None` for a line that is not connected
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Pins {
    /// uart transmit pin, only driven by hand to produce a break
    pub tx: Option<PinId>,
    /// driver enable, active high
    pub de: Option<PinId>,
    /// receiver enable, active low
    pub re: Option<PinId>,
}
impl Pins {
    pub const fn new(tx: Option<PinId>, de: Option<PinId>, re: Option<PinId>) -> Self {
        Self {tx, de, re}
    }
    /// no direction control at all, the transceiver is hardwired
    pub const fn unwired() -> Self {
        Self {tx: None, de: None, re: None}
    }
}

/// uart settings recorded by [Rs485::begin], reused to reopen the uart after a break
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LineConfig {
    pub baud_rate: u32,
    pub frame: FrameConfig,
}

/**
    half-duplex RS-485 transceiver controller

    wraps a byte stream uart `U`, the gpio bank `G` holding the enable lines and a blocking delay `D`.

    the controller has two states: receiving or idle, and transmitting. Bytes can only be written while transmitting, see [Self::begin_transmission] or [Self::transmission]
*/
pub struct Rs485<U, G, D> {
    uart: U,
    gpio: G,
    delay: D,
    pins: Pins,
    line: Option<LineConfig>,
    /// uart opened and not closed since
    open: bool,
    transmitting: bool,
    turnaround: u32,
}

impl<U: Uart, G: Gpio, D: DelayNs> Rs485<U, G, D> {
    /// bind a controller to its peripherals, nothing is touched until [Self::begin]
    pub fn new(uart: U, gpio: G, delay: D, pins: Pins) -> Self {
        Self {
            uart,
            gpio,
            delay,
            pins,
            line: None,
            open: false,
            transmitting: false,
            turnaround: DEFAULT_TURNAROUND_MICROS,
        }
    }
    /// give back the peripherals
    pub fn release(self) -> (U, G, D) {
        (self.uart, self.gpio, self.delay)
    }

    pub fn pins(&self) -> Pins {self.pins}
    /// settings of the last [Self::begin], if any
    pub fn line_config(&self) -> Option<LineConfig> {self.line}
    /// settling time applied after enabling the bus driver
    pub fn turnaround_micros(&self) -> u32 {self.turnaround}
    /// true strictly between [Self::begin_transmission] and [Self::end_transmission]
    pub fn is_transmitting(&self) -> bool {self.transmitting}

    /// same as [Self::begin_with] in 8N1
    pub fn begin(&mut self, baud_rate: u32) -> Result<(), Error> {
        self.begin_with(baud_rate, FrameConfig::SERIAL_8N1)
    }
    /**
        open the uart and put the transceiver in its safe idle state

        the driver is disabled and so is the receiver: call [Self::receive] to start listening.
    */
    pub fn begin_with(&mut self, baud_rate: u32, frame: FrameConfig) -> Result<(), Error> {
        let turnaround = turnaround_micros(baud_rate, frame)
            .ok_or(Error::InvalidBaudRate)?;
        self.line = Some(LineConfig {baud_rate, frame});

        if let Some(de) = self.pins.de {
            self.gpio.set_mode(de, PinMode::Output);
            self.gpio.write(de, Level::Low);
        }
        if let Some(re) = self.pins.re {
            self.gpio.set_mode(re, PinMode::Output);
            self.gpio.write(re, Level::High);
        }
        self.transmitting = false;
        self.turnaround = turnaround;
        debug!("begin at {} bauds {:?}, turnaround {}us", baud_rate, frame, turnaround);

        self.uart.open(baud_rate, frame);
        self.open = true;
        Ok(())
    }
    /// close the uart and release the enable lines to high impedance
    pub fn end(&mut self) {
        debug!("end");
        self.uart.flush();
        self.uart.close();
        self.open = false;

        if let Some(re) = self.pins.re {
            self.gpio.write(re, Level::Low);
            self.gpio.set_mode(re, PinMode::Input);
        }
        if let Some(de) = self.pins.de {
            self.gpio.write(de, Level::Low);
            self.gpio.set_mode(de, PinMode::Input);
        }
    }
    /// rebind the transceiver lines, the wired enable lines are set as outputs driven low
    pub fn set_pins(&mut self, tx: Option<PinId>, de: Option<PinId>, re: Option<PinId>) {
        self.pins = Pins::new(tx, de, re);

        if let Some(de) = self.pins.de {
            self.gpio.set_mode(de, PinMode::Output);
            self.gpio.write(de, Level::Low);
        }
        if let Some(re) = self.pins.re {
            self.gpio.set_mode(re, PinMode::Output);
            self.gpio.write(re, Level::Low);
        }
    }

    pub fn available(&mut self) -> usize {self.uart.available()}
    pub fn peek(&mut self) -> Option<u8> {self.uart.peek()}
    pub fn read(&mut self) -> Option<u8> {self.uart.read()}
    pub fn flush(&mut self) {self.uart.flush()}
    /**
        send one byte on the bus

        fails without consuming the byte if no transmission is in progress, so a node in receive mode can never garble the line
    */
    pub fn write(&mut self, byte: u8) -> Result<usize, Error> {
        if !self.transmitting {
            warn!("dropped byte {:#04x} written outside of a transmission", byte);
            return Err(Error::WriteOutsideTransmission);
        }
        Ok(self.uart.write(byte))
    }

    /// enable the bus driver and wait for it to settle, must be called before any write
    pub fn begin_transmission(&mut self) {
        if let Some(de) = self.pins.de {
            self.gpio.write(de, Level::High);
            self.delay.delay_us(self.turnaround);
        }
        self.transmitting = true;
        trace!("transmitting");
    }
    /// wait for the last byte to leave and disable the bus driver
    pub fn end_transmission(&mut self) {
        // dropping DE before the last stop bit corrupts the frame
        self.uart.flush();
        if let Some(de) = self.pins.de {
            self.delay.delay_us(TRAILING_GUARD_MICROS);
            self.gpio.write(de, Level::Low);
        }
        self.transmitting = false;
        trace!("transmission done");
    }
    /**
        begin a transmission ended when the returned guard drops

        ```ignore
        let mut tx = bus.transmission();
        tx.write(0x41)?;
        // driver disabled here
        ```
    */
    pub fn transmission(&mut self) -> Transmission<'_, U, G, D> {
        Transmission::new(self)
    }

    /// enable the receiver
    pub fn receive(&mut self) {
        if let Some(re) = self.pins.re {
            self.gpio.write(re, Level::Low);
            trace!("receiving");
        }
    }
    /// disable the receiver, for instance to not hear our own transmission
    pub fn no_receive(&mut self) {
        if let Some(re) = self.pins.re {
            self.gpio.write(re, Level::High);
            trace!("not receiving");
        }
    }

    /// hold the line low for the given number of milliseconds
    pub fn send_break(&mut self, duration: u32) {
        self.hold_break(|delay| delay.delay_ms(duration));
    }
    /// hold the line low for the given number of microseconds
    pub fn send_break_micros(&mut self, duration: u32) {
        self.hold_break(|delay| delay.delay_us(duration));
    }
    /**
        stop the uart framing, drive tx low by hand for the time `wait` takes, then restart the uart

        the transmission state is left untouched
    */
    fn hold_break(&mut self, wait: impl FnOnce(&mut D)) {
        debug!("sending break");
        self.uart.flush();
        self.uart.close();
        self.open = false;
        match self.pins.tx {
            Some(tx) => {
                self.gpio.set_mode(tx, PinMode::Output);
                self.gpio.write(tx, Level::Low);
            },
            None => warn!("no tx pin wired, break line level is left to the uart"),
        }
        wait(&mut self.delay);
        match self.line {
            Some(line) => {
                self.uart.open(line.baud_rate, line.frame);
                self.open = true;
            },
            None => warn!("break sent before begin, uart left closed"),
        }
    }
}


/**
    a transmission in progress, ended on drop

    dereferences to the controller so bytes can be written through it
*/
pub struct Transmission<'b, U: Uart, G: Gpio, D: DelayNs> {
    bus: &'b mut Rs485<U, G, D>,
}
impl<'b, U: Uart, G: Gpio, D: DelayNs> Transmission<'b, U, G, D> {
    fn new(bus: &'b mut Rs485<U, G, D>) -> Self {
        bus.begin_transmission();
        Self {bus}
    }
}
impl<U: Uart, G: Gpio, D: DelayNs> Deref for Transmission<'_, U, G, D> {
    type Target = Rs485<U, G, D>;
    fn deref(&self) -> &Self::Target {
        self.bus
    }
}
impl<U: Uart, G: Gpio, D: DelayNs> DerefMut for Transmission<'_, U, G, D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.bus
    }
}
impl<U: Uart, G: Gpio, D: DelayNs> Drop for Transmission<'_, U, G, D> {
    fn drop(&mut self) {
        // already ended by hand through the guard
        if self.bus.transmitting {
            self.bus.end_transmission();
        }
    }
}


impl<U, G, D> embedded_io::ErrorType for Rs485<U, G, D> {
    type Error = Error;
}
impl<U: Uart, G: Gpio, D: DelayNs> embedded_io::Write for Rs485<U, G, D> {
    /// write as many bytes as the uart accepts, the bracket rule of [Rs485::write] applies
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        if buf.is_empty()
            {return Ok(0)}
        if !self.transmitting {
            warn!("dropped {} bytes written outside of a transmission", buf.len());
            return Err(Error::WriteOutsideTransmission);
        }
        let mut written = 0;
        for &byte in buf {
            if self.uart.write(byte) == 0
                {break}
            written += 1;
        }
        if written == 0 {
            error!("uart refused to send");
            return Err(Error::WriteZero);
        }
        Ok(written)
    }
    fn flush(&mut self) -> Result<(), Error> {
        self.uart.flush();
        Ok(())
    }
}
impl<U: Uart, G: Gpio, D: DelayNs> embedded_io::Read for Rs485<U, G, D> {
    /**
        busy wait for at least one byte, then take what is already received

        returns `Ok(0)` as end of stream once nothing is left to read and the uart is closed, before [Rs485::begin] or after [Rs485::end]. A backend that failed to open without telling is still waited on forever.
    */
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let Some((first, rest)) = buf.split_first_mut()
            else {return Ok(0)};
        *first = loop {
            if let Some(byte) = self.uart.read()
                {break byte}
            if !self.open
                {return Ok(0)}
        };
        let mut count = 1;
        for slot in rest {
            if self.uart.available() == 0
                {break}
            let Some(byte) = self.uart.read()
                else {break};
            *slot = byte;
            count += 1;
        }
        Ok(count)
    }
}
impl<U: Uart, G: Gpio, D: DelayNs> embedded_io::ReadReady for Rs485<U, G, D> {
    fn read_ready(&mut self) -> Result<bool, Error> {
        Ok(self.uart.available() != 0)
    }
}
