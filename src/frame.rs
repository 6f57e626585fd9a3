/*!
    uart frame description and the timings derived from it
*/

/// bus silence required around a transmission, in characters
const TURNAROUND_CHARS_X10: u64 = 35;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    #[default]
    Eight,
}
impl DataBits {
    pub const fn count(self) -> u32 {
        match self {
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum StopBits {
    #[default]
    One,
    Two,
}

/// uart framing, defaults to 8 data bits, no parity and 1 stop bit
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct FrameConfig {
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
}
impl FrameConfig {
    pub const SERIAL_8N1: Self = Self::new(DataBits::Eight, Parity::None, StopBits::One);
    pub const SERIAL_8N2: Self = Self::new(DataBits::Eight, Parity::None, StopBits::Two);
    pub const SERIAL_8E1: Self = Self::new(DataBits::Eight, Parity::Even, StopBits::One);
    pub const SERIAL_8O1: Self = Self::new(DataBits::Eight, Parity::Odd, StopBits::One);

    pub const fn new(data_bits: DataBits, parity: Parity, stop_bits: StopBits) -> Self {
        Self {data_bits, parity, stop_bits}
    }
    /**
        bit times occupied by one character on the line

        counts the start bit, data, parity and stop bits, plus one bit of margin. 8N1 gives 11.
    */
    pub const fn bits_per_frame(&self) -> u32 {
        let parity = match self.parity {
            Parity::None => 0,
            Parity::Even | Parity::Odd => 1,
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        1 + self.data_bits.count() + parity + stop + 1
    }
}

/**
    time in microseconds to wait after enabling the bus driver before sending

    this is 3.5 characters at the given baud rate, rounded to the nearest microsecond. `None` for a zero baud rate.
*/
pub const fn turnaround_micros(baud_rate: u32, frame: FrameConfig) -> Option<u32> {
    if baud_rate == 0
        {return None}
    let baud = baud_rate as u64;
    let scaled = 100_000 * TURNAROUND_CHARS_X10 * frame.bits_per_frame() as u64;
    let micros = (scaled + baud/2) / baud;
    if micros > u32::MAX as u64
        {Some(u32::MAX)}
    else
        {Some(micros as u32)}
}
