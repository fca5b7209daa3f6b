//! Value types for aircon control parameters.

mod fan;
mod humidity;
mod mode;
mod temperature;

pub use fan::{FanDirection, FanRate};
pub use humidity::Humidity;
pub use mode::Mode;
pub use temperature::{Temperature, TemperatureRange};

/// Parse a numeric wire value, treating anything unparsable as zero.
pub(crate) fn parse_or_zero<T>(value: &str) -> T
where
    T: std::str::FromStr + Default,
{
    value.trim().parse().unwrap_or_default()
}
