//! Physical quantities given on the command line as `"<value> <unit>"`.
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A value with its unit, e.g. `10 Hz` or `5 ms`.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

impl Quantity {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self { value, unit: unit.into() }
    }

    /// Value in Hz. Accepts `Hz`, `kHz`, `MHz`.
    pub fn to_hz(&self) -> Result<f64> {
        let scale = match self.unit.as_str() {
            "Hz" | "hz" => 1.0,
            "kHz" | "khz" => 1e3,
            "MHz" => 1e6,
            _ => return Err(self.unit_error("a frequency unit (Hz, kHz, MHz)")),
        };
        Ok(self.value * scale)
    }

    /// Value in seconds. Accepts `s`, `ms`, `us`/`µs`, `min`.
    pub fn to_seconds(&self) -> Result<f64> {
        let scale = match self.unit.as_str() {
            "s" | "sec" => 1.0,
            "ms" => 1e-3,
            "us" | "µs" => 1e-6,
            "min" => 60.0,
            _ => return Err(self.unit_error("a time unit (s, ms, us, min)")),
        };
        Ok(self.value * scale)
    }

    fn unit_error(&self, expected: &str) -> Error {
        Error::InvalidQuantity {
            input: self.to_string(),
            reason: format!("expected {expected}, got '{}'", self.unit),
        }
    }
}

impl FromStr for Quantity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidQuantity {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        let mut parts = s.split_whitespace();
        let (Some(value), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid("expected '<value> <unit>'"));
        };
        let value: f64 = value.parse().map_err(|_| invalid("value is not a number"))?;
        if !value.is_finite() {
            return Err(invalid("value must be finite"));
        }
        Ok(Quantity::new(value, unit))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_value_and_unit() {
        let q: Quantity = "10 mV".parse().unwrap();
        assert_eq!(q, Quantity::new(10.0, "mV"));
        let q: Quantity = "  2.5   kHz ".parse().unwrap();
        assert_eq!(q.to_hz().unwrap(), 2500.0);
    }

    #[test]
    fn converts_time() {
        let q: Quantity = "5 ms".parse().unwrap();
        approx::assert_abs_diff_eq!(q.to_seconds().unwrap(), 0.005, epsilon = 1e-12);
        assert!(q.to_hz().is_err());
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "10", "10 Hz extra", "ten Hz", "inf Hz"] {
            assert!(bad.parse::<Quantity>().is_err(), "{bad:?}");
        }
    }
}
