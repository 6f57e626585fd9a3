/*!
    half-duplex RS-485 over a plain uart

    An RS-485 transceiver has a driver enable line (DE) and a receiver enable line (RE). Only one node may drive the bus at a time, so the direction has to be switched around every transmission, with settling delays on both edges.

    - [Rs485] is the controller, wrapping any [hal::Uart] plus a [hal::Gpio] for the enable lines
    - bytes can only be written between [Rs485::begin_transmission] and [Rs485::end_transmission], or while a [Transmission] guard is alive
    - [frame] holds the uart frame description and the turnaround delay computation
*/
#![no_std]
#[cfg(feature = "std")]
extern crate std;

pub mod hal;
pub mod frame;
mod transceiver;
#[cfg(feature = "std")]
pub mod host;

pub use frame::{FrameConfig, turnaround_micros};
pub use transceiver::*;

use thiserror::Error;

/// error regarding the transceiver direction control
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("byte written outside of a transmission")]
    WriteOutsideTransmission,
    #[error("baud rate must not be zero")]
    InvalidBaudRate,
    /// only reported through [embedded_io::Write], whose contract forbids writing nothing
    #[error("uart accepted no byte")]
    WriteZero,
}
impl embedded_io::Error for Error {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::Other
    }
}
