// units.rs

use std::fmt;

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// One thermocouple reading, both scales.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemperatureReading {
    pub celsius: f64,
    pub fahrenheit: f64,
}

impl TemperatureReading {
    pub fn from_celsius(celsius: f64) -> Self {
        TemperatureReading {
            celsius,
            fahrenheit: celsius_to_fahrenheit(celsius),
        }
    }

    /// Feed payload: the Celsius value as the shortest decimal that reads
    /// back to the same number, always with a fractional part ("24.0", "12.5").
    pub fn payload(&self) -> String {
        format!("{:?}", self.celsius)
    }
}

impl fmt::Display for TemperatureReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}\u{00B0}C, {:.2}\u{00B0}F",
            self.celsius, self.fahrenheit
        )
    }
}


// EOF
