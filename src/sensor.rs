//! Sensor readings.

use serde::{Deserialize, Serialize};

use crate::wire::WireFields;

/// Readings reported by `get_sensor_info`.
///
/// Units without an outdoor sensor report `otemp=-`, which decodes to
/// `None` rather than zero.
///
/// # Examples
///
/// ```
/// use daikin_rs::{SensorState, WireFields};
///
/// let sensor = SensorState::from(&WireFields::parse("ret=OK,htemp=23.5,hhum=-,otemp=-"));
/// assert_eq!(sensor.inside_temperature, 23.5);
/// assert_eq!(sensor.outside_temperature, None);
/// ```
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorState {
    pub inside_temperature: f64,
    pub outside_temperature: Option<f64>,
    pub inside_humidity: Option<f64>,
    pub compressor_frequency: Option<u32>,
}

impl From<&WireFields> for SensorState {
    fn from(fields: &WireFields) -> Self {
        SensorState {
            inside_temperature: parse_reading(fields.get("htemp")).unwrap_or(0.0),
            outside_temperature: parse_reading(fields.get("otemp")),
            inside_humidity: parse_reading(fields.get("hhum")),
            compressor_frequency: fields.get("cmpfreq").trim().parse().ok(),
        }
    }
}

fn parse_reading(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
