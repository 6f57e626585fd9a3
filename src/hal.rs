/*!
    peripherals the transceiver controller drives

    Blocking delays are taken from [embedded_hal::delay::DelayNs], so any hal delay or timer can be passed.
*/

use crate::frame::FrameConfig;

/// hardware pin index
pub type PinId = u8;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PinMode {
    Input,
    Output,
}

/**
    blocking byte stream uart

    faults are reported through return values only: a failed write reports 0 bytes, an empty or closed receiver reads `None`
*/
pub trait Uart {
    /// start the peripheral with the given line settings
    fn open(&mut self, baud_rate: u32, frame: FrameConfig);
    /// stop the peripheral, the tx pin is released to general purpose use
    fn close(&mut self);
    /// number of received bytes ready to read
    fn available(&mut self) -> usize;
    /// next received byte, without consuming it
    fn peek(&mut self) -> Option<u8>;
    fn read(&mut self) -> Option<u8>;
    /// queue one byte for sending, returns the number of bytes accepted
    fn write(&mut self, byte: u8) -> usize;
    /// block until every queued byte has physically left the shift register
    fn flush(&mut self);
}

/// pin addressed gpio bank
pub trait Gpio {
    fn set_mode(&mut self, pin: PinId, mode: PinMode);
    fn write(&mut self, pin: PinId, level: Level);
}

impl<T: Uart + ?Sized> Uart for &mut T {
    fn open(&mut self, baud_rate: u32, frame: FrameConfig) {(**self).open(baud_rate, frame)}
    fn close(&mut self) {(**self).close()}
    fn available(&mut self) -> usize {(**self).available()}
    fn peek(&mut self) -> Option<u8> {(**self).peek()}
    fn read(&mut self) -> Option<u8> {(**self).read()}
    fn write(&mut self, byte: u8) -> usize {(**self).write(byte)}
    fn flush(&mut self) {(**self).flush()}
}

impl<T: Gpio + ?Sized> Gpio for &mut T {
    fn set_mode(&mut self, pin: PinId, mode: PinMode) {(**self).set_mode(pin, mode)}
    fn write(&mut self, pin: PinId, level: Level) {(**self).write(pin, level)}
}
