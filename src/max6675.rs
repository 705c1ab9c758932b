// max6675.rs

use std::fmt;

use embedded_hal::{
    delay::DelayNs,
    digital::{Error, ErrorKind, InputPin, OutputPin},
};

use crate::TemperatureReading;

// the chip needs some time after CS goes low before the first clock edge
const SELECT_SETTLE_US: u32 = 10;
const CLOCK_HALF_PERIOD_US: u32 = 1;
const WORD_BITS: u32 = 16;

// D2 goes high when the thermocouple input is open
const OPEN_CIRCUIT: u16 = 0x4;
const TEMP_SHIFT: u16 = 3;
const TEMP_MASK: u16 = 0xFFF;
const DEGREES_PER_COUNT: f64 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorFault {
    /// Open thermocouple input, reported by the chip itself.
    Disconnected,
    /// One of the bus lines could not be driven or sampled.
    Line(ErrorKind),
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorFault::Disconnected => write!(f, "Thermocouple is not connected."),
            SensorFault::Line(kind) => write!(f, "Thermocouple bus line error: {kind:?}"),
        }
    }
}

impl std::error::Error for SensorFault {}

fn line<E: Error>(err: E) -> SensorFault {
    SensorFault::Line(err.kind())
}

/// Anything the acquisition loop can take a temperature from.
pub trait Thermometer {
    fn read(&mut self) -> Result<TemperatureReading, SensorFault>;
}

/// Turns a raw 16-bit MAX6675 word into a temperature.
///
/// Bit 2 flags an open thermocouple. Bits 14..3 are the temperature in
/// quarter degrees; the sign bit is not used by this chip.
pub fn decode(raw: u16) -> Result<TemperatureReading, SensorFault> {
    if raw & OPEN_CIRCUIT != 0 {
        return Err(SensorFault::Disconnected);
    }
    let counts = (raw >> TEMP_SHIFT) & TEMP_MASK;
    Ok(TemperatureReading::from_celsius(
        f64::from(counts) * DEGREES_PER_COUNT,
    ))
}

/// Bit-banged MAX6675 thermocouple converter.
///
/// `sck` and `cs` are push-pull outputs, `so` is the chip's serial output.
/// The delay must be a busy wait; nothing else may run while a word is
/// being clocked in.
pub struct Max6675<SCK, CS, SO, D> {
    sck: SCK,
    cs: CS,
    so: SO,
    delay: D,
}

impl<SCK, CS, SO, D> Max6675<SCK, CS, SO, D>
where
    SCK: OutputPin,
    CS: OutputPin,
    SO: InputPin,
    D: DelayNs,
{
    /// Takes the lines and parks the chip deselected.
    pub fn new(sck: SCK, mut cs: CS, so: SO, delay: D) -> Result<Self, SensorFault> {
        cs.set_high().map_err(line)?;
        Ok(Max6675 { sck, cs, so, delay })
    }

    /// One complete bus transaction. CS is released even if clocking fails.
    pub fn read_raw(&mut self) -> Result<u16, SensorFault> {
        self.cs.set_low().map_err(line)?;
        let word = self.clock_in_word();
        let released = self.cs.set_high().map_err(line);
        let word = word?;
        released?;
        Ok(word)
    }

    fn clock_in_word(&mut self) -> Result<u16, SensorFault> {
        self.delay.delay_us(SELECT_SETTLE_US);

        let mut word: u16 = 0;
        for _ in 0..WORD_BITS {
            self.sck.set_high().map_err(line)?;
            self.delay.delay_us(CLOCK_HALF_PERIOD_US);
            let bit = self.so.is_high().map_err(line)?;
            word = (word << 1) | u16::from(bit);
            self.sck.set_low().map_err(line)?;
            self.delay.delay_us(CLOCK_HALF_PERIOD_US);
        }
        Ok(word)
    }
}

impl<SCK, CS, SO, D> Thermometer for Max6675<SCK, CS, SO, D>
where
    SCK: OutputPin,
    CS: OutputPin,
    SO: InputPin,
    D: DelayNs,
{
    fn read(&mut self) -> Result<TemperatureReading, SensorFault> {
        decode(self.read_raw()?)
    }
}

// EOF
