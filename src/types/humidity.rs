//! Target humidity.

use serde::{Deserialize, Serialize};

use super::parse_or_zero;

/// Target relative humidity in percent, or automatic.
///
/// # Examples
///
/// ```
/// use daikin_rs::Humidity;
///
/// assert_eq!(Humidity::from(-1), Humidity::Auto);
/// assert_eq!(Humidity::from(40), Humidity::Percent(40));
/// assert_eq!(Humidity::from(250), Humidity::Percent(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Humidity {
    Auto,
    Percent(u8),
}

impl Default for Humidity {
    fn default() -> Self {
        Humidity::Percent(0)
    }
}

impl Humidity {
    /// Highest target most units accept.
    pub const MAX_TARGET: u8 = 50;

    pub(crate) fn clamp(self, max: u8) -> Self {
        match self {
            Humidity::Percent(h) => Humidity::Percent(h.min(max)),
            Humidity::Auto => Humidity::Auto,
        }
    }

    pub(crate) fn from_wire(value: &str) -> Self {
        if value == "AUTO" {
            return Humidity::Auto;
        }
        Humidity::from(parse_or_zero::<i32>(value))
    }

    /// Format an already-clamped humidity for the `shum` family of fields.
    pub(crate) fn to_wire(self) -> String {
        match self {
            Humidity::Auto => "AUTO".to_string(),
            Humidity::Percent(h) => h.to_string(),
        }
    }
}

impl From<i32> for Humidity {
    fn from(value: i32) -> Self {
        if value < 0 {
            Humidity::Auto
        } else {
            Humidity::Percent(value.min(100) as u8)
        }
    }
}
