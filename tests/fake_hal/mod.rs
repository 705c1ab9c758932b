#![allow(dead_code)]

use std::{cell::RefCell, convert::Infallible, rc::Rc};

use embedded_hal::{
    delay::DelayNs,
    digital::{Error, ErrorKind, ErrorType, InputPin, OutputPin},
};
use grillmon::Max6675;

/// Everything that happened on the bus, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Low(&'static str),
    High(&'static str),
    Sample(bool),
    DelayNs(u32),
}

pub type Trace = Rc<RefCell<Vec<Event>>>;

pub struct OutPin {
    name: &'static str,
    trace: Trace,
}

impl OutPin {
    pub fn new(name: &'static str, trace: &Trace) -> OutPin {
        OutPin {
            name,
            trace: trace.clone(),
        }
    }
}

impl ErrorType for OutPin {
    type Error = Infallible;
}

impl OutputPin for OutPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.trace.borrow_mut().push(Event::Low(self.name));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.trace.borrow_mut().push(Event::High(self.name));
        Ok(())
    }
}

/// Shifts out `word` MSB first, one bit per sample.
pub struct DataPin {
    word: u16,
    sampled: u32,
    trace: Trace,
}

impl DataPin {
    pub fn new(word: u16, trace: &Trace) -> DataPin {
        DataPin {
            word,
            sampled: 0,
            trace: trace.clone(),
        }
    }

    fn next_bit(&mut self) -> bool {
        let bit = (self.word >> (15 - self.sampled % 16)) & 1 == 1;
        self.sampled += 1;
        self.trace.borrow_mut().push(Event::Sample(bit));
        bit
    }
}

impl ErrorType for DataPin {
    type Error = Infallible;
}

impl InputPin for DataPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.next_bit())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.next_bit())
    }
}

#[derive(Debug)]
pub struct LineError;

impl Error for LineError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// A data line that reads fine for `good` samples and then fails.
pub struct BrokenDataPin {
    good: u32,
    trace: Trace,
}

impl BrokenDataPin {
    pub fn new(good: u32, trace: &Trace) -> BrokenDataPin {
        BrokenDataPin {
            good,
            trace: trace.clone(),
        }
    }
}

impl ErrorType for BrokenDataPin {
    type Error = LineError;
}

impl InputPin for BrokenDataPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.good == 0 {
            return Err(LineError);
        }
        self.good -= 1;
        self.trace.borrow_mut().push(Event::Sample(false));
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

pub struct Delay {
    trace: Trace,
}

impl Delay {
    pub fn new(trace: &Trace) -> Delay {
        Delay {
            trace: trace.clone(),
        }
    }
}

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        self.trace.borrow_mut().push(Event::DelayNs(ns));
    }
}

pub type FakeThermocouple = Max6675<OutPin, OutPin, DataPin, Delay>;

/// A MAX6675 wired to fake lines that will answer with `word`.
pub fn thermocouple(word: u16) -> (FakeThermocouple, Trace) {
    let trace = Trace::default();
    let sensor = Max6675::new(
        OutPin::new("sck", &trace),
        OutPin::new("cs", &trace),
        DataPin::new(word, &trace),
        Delay::new(&trace),
    )
    .unwrap();
    (sensor, trace)
}
