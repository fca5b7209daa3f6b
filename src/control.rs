//! Control state and its wire codec.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::types::{FanDirection, FanRate, Humidity, Mode, Temperature, TemperatureRange};
use crate::wire::WireFields;

/// Settings a unit remembers for a mode it is not currently running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModeSettings {
    pub temperature: Temperature,
    pub humidity: Humidity,
    pub fan_rate: FanRate,
    pub fan_direction: FanDirection,
}

/// What an air conditioner is doing, or should be doing.
///
/// Equality follows the unit's view of the world: every powered-off state
/// equals every other powered-off state, and powered-on states compare
/// after clamping with the default [`ControlCodec`]. `other_modes` never
/// takes part in equality.
///
/// # Example
///
/// ```
/// use daikin_rs::{ControlState, FanRate, Mode, Temperature};
///
/// let mut state = ControlState::on(Mode::Cool, Temperature::Celsius(24.0));
/// state.fan_rate = FanRate::Quiet;
///
/// assert_eq!(ControlState::off(), ControlState { mode: Mode::Heat, ..ControlState::off() });
/// assert_ne!(state, ControlState::off());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlState {
    pub power: bool,
    pub mode: Mode,
    pub temperature: Temperature,
    pub humidity: Humidity,
    pub fan_rate: FanRate,
    pub fan_direction: FanDirection,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other_modes: BTreeMap<Mode, ModeSettings>,
}

impl ControlState {
    /// A powered-off state.
    pub fn off() -> Self {
        Self::default()
    }

    /// A powered-on state in `mode` targeting `temperature`.
    pub fn on(mode: Mode, temperature: Temperature) -> Self {
        ControlState {
            power: true,
            mode,
            temperature,
            ..Self::default()
        }
    }
}

impl PartialEq for ControlState {
    fn eq(&self, other: &Self) -> bool {
        ControlCodec::default().same_state(self, other)
    }
}

impl From<&WireFields> for ControlState {
    fn from(fields: &WireFields) -> Self {
        ControlCodec::default().decode(fields)
    }
}

/// Converts [`ControlState`] to and from wire fields.
///
/// The codec carries the limits of the target unit; both default to the
/// values most firmware accepts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlCodec {
    range: TemperatureRange,
    max_humidity: u8,
}

impl Default for ControlCodec {
    fn default() -> Self {
        Self {
            range: TemperatureRange::default(),
            max_humidity: Humidity::MAX_TARGET,
        }
    }
}

impl ControlCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_range(mut self, range: TemperatureRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_max_humidity(mut self, max_humidity: u8) -> Self {
        self.max_humidity = max_humidity;
        self
    }

    pub fn range(&self) -> TemperatureRange {
        self.range
    }

    /// Encode a state as `set_control_info` parameters.
    ///
    /// Mode, temperature and humidity are always sent. Fan settings are
    /// only sent while powered on.
    ///
    /// # Examples
    ///
    /// ```
    /// use daikin_rs::{ControlCodec, ControlState, Humidity, Mode, Temperature};
    ///
    /// let mut state = ControlState::on(Mode::Cool, Temperature::Celsius(50.0));
    /// state.humidity = Humidity::Auto;
    ///
    /// let fields = ControlCodec::default().encode(&state);
    /// assert_eq!(fields.get("pow"), "1");
    /// assert_eq!(fields.get("mode"), "3");
    /// assert_eq!(fields.get("stemp"), "41.0");
    /// assert_eq!(fields.get("shum"), "AUTO");
    /// ```
    pub fn encode(&self, state: &ControlState) -> WireFields {
        let mut fields = WireFields::new();

        fields.set("mode", state.mode.code().to_string());
        fields.set("stemp", self.range.clamp(state.temperature).to_wire());
        fields.set("shum", state.humidity.clamp(self.max_humidity).to_wire());

        if !state.power {
            fields.set("pow", "0");
            return fields;
        }
        fields.set("pow", "1");

        if let Some(rate) = state.fan_rate.to_wire() {
            fields.set("f_rate", rate);
        }
        if let Some(dir) = state.fan_direction.to_wire() {
            fields.set("f_dir", dir);
        }
        fields
    }

    /// Decode a `get_control_info` reply.
    ///
    /// Unparsable numbers decode as zero rather than failing.
    pub fn decode(&self, fields: &WireFields) -> ControlState {
        let mode = fields
            .get("mode")
            .trim()
            .parse::<u8>()
            .ok()
            .and_then(Mode::from_code)
            .unwrap_or_default();

        ControlState {
            power: fields.get("pow") == "1",
            mode,
            temperature: Temperature::from_wire(fields.get("stemp")),
            humidity: Humidity::from_wire(fields.get("shum")),
            fan_rate: FanRate::from_wire(fields.get("f_rate")),
            fan_direction: FanDirection::from_wire(fields.get("f_dir")),
            other_modes: decode_other_modes(fields, mode),
        }
    }

    /// Compare two states the way the unit would see them after encoding.
    pub fn same_state(&self, a: &ControlState, b: &ControlState) -> bool {
        match (a.power, b.power) {
            (false, false) => true,
            (true, true) => {
                a.mode == b.mode
                    && self.range.clamp(a.temperature) == self.range.clamp(b.temperature)
                    && a.humidity.clamp(self.max_humidity) == b.humidity.clamp(self.max_humidity)
                    && a.fan_rate.normalized() == b.fan_rate.normalized()
                    && a.fan_direction.normalized() == b.fan_direction.normalized()
            }
            _ => false,
        }
    }
}

fn decode_other_modes(fields: &WireFields, current: Mode) -> BTreeMap<Mode, ModeSettings> {
    let mut out = BTreeMap::new();
    for mode in Mode::iter().filter(|m| *m != current) {
        let n = mode.memory_index();
        let keys = [
            format!("dt{n}"),
            format!("dh{n}"),
            format!("dfr{n}"),
            format!("dfd{n}"),
        ];
        if !keys.iter().any(|k| fields.contains(k)) {
            continue;
        }
        let [dt, dh, dfr, dfd] = keys.map(|k| fields.get(&k));
        out.insert(
            mode,
            ModeSettings {
                temperature: Temperature::from_wire(dt),
                humidity: Humidity::from_wire(dh),
                fan_rate: FanRate::from_wire(dfr),
                fan_direction: FanDirection::from_wire(dfd),
            },
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(state: &ControlState) -> ControlState {
        let codec = ControlCodec::default();
        codec.decode(&codec.encode(state))
    }

    #[test]
    fn test_powered_on_round_trip() {
        let states = [
            ControlState {
                power: true,
                mode: Mode::Heat,
                temperature: Temperature::Celsius(22.5),
                humidity: Humidity::Percent(10),
                fan_rate: FanRate::Auto,
                fan_direction: FanDirection::None,
                ..ControlState::default()
            },
            ControlState {
                power: true,
                mode: Mode::Auto,
                temperature: Temperature::Celsius(20.0),
                fan_rate: FanRate::Quiet,
                ..ControlState::default()
            },
            ControlState::on(Mode::Cool, Temperature::Celsius(18.0)),
            ControlState {
                power: true,
                mode: Mode::Dehumidify,
                temperature: Temperature::Manual,
                humidity: Humidity::Auto,
                fan_rate: FanRate::Level(3),
                fan_direction: FanDirection::Both,
                ..ControlState::default()
            },
            ControlState::on(Mode::Fan, Temperature::Unset),
        ];

        for state in &states {
            assert_eq!(
                &round_trip(state),
                state,
                "fields {}",
                ControlCodec::default().encode(state)
            );
        }
    }

    #[test]
    fn test_every_powered_on_state_round_trips() {
        let temperatures = [
            Temperature::Unset,
            Temperature::Manual,
            Temperature::Celsius(5.0),
            Temperature::Celsius(18.0),
            Temperature::Celsius(22.74),
            Temperature::Celsius(41.0),
            Temperature::Celsius(45.0),
        ];
        let humidities = [
            Humidity::Auto,
            Humidity::Percent(0),
            Humidity::Percent(35),
            Humidity::Percent(80),
        ];
        let fan_rates = [
            FanRate::Unset,
            FanRate::Quiet,
            FanRate::Auto,
            FanRate::Level(1),
            FanRate::Level(3),
            FanRate::Level(5),
            FanRate::Level(9),
        ];
        let fan_directions = [
            FanDirection::Unset,
            FanDirection::None,
            FanDirection::Vertical,
            FanDirection::Horizontal,
            FanDirection::Both,
            FanDirection::Unknown(3),
        ];

        let codec = ControlCodec::default();
        let mut checked = 0;
        for mode in Mode::iter() {
            for temperature in temperatures {
                for humidity in humidities {
                    for fan_rate in fan_rates {
                        for fan_direction in fan_directions {
                            let state = ControlState {
                                power: true,
                                mode,
                                temperature,
                                humidity,
                                fan_rate,
                                fan_direction,
                                ..ControlState::default()
                            };
                            let fields = codec.encode(&state);
                            assert!(
                                codec.same_state(&codec.decode(&fields), &state),
                                "{state:?} encoded as {fields}"
                            );
                            checked += 1;
                        }
                    }
                }
            }
        }
        assert_eq!(checked, 5 * 7 * 4 * 7 * 6);
    }

    #[test]
    fn test_round_trip_compares_clamped_temperature() {
        let state = ControlState::on(Mode::Heat, Temperature::Celsius(22.74));
        let decoded = round_trip(&state);
        assert_eq!(decoded.temperature, Temperature::Celsius(22.5));
        assert_eq!(decoded, state);
    }

    #[test]
    fn test_powered_off_round_trip() {
        let off = ControlState {
            power: false,
            mode: Mode::Auto,
            temperature: Temperature::Celsius(18.0),
            ..ControlState::default()
        };
        let decoded = round_trip(&off);
        assert!(!decoded.power);
        assert_eq!(decoded, ControlState::off());
        assert_eq!(
            decoded,
            ControlState {
                mode: Mode::Fan,
                fan_rate: FanRate::Level(2),
                ..ControlState::off()
            }
        );
        assert_ne!(decoded, ControlState::on(Mode::Auto, Temperature::Celsius(18.0)));
    }

    #[test]
    fn test_powered_off_omits_fan_fields() {
        let off = ControlState {
            fan_rate: FanRate::Auto,
            fan_direction: FanDirection::Vertical,
            ..ControlState::off()
        };
        let fields = ControlCodec::default().encode(&off);
        assert_eq!(fields.get("pow"), "0");
        assert!(!fields.contains("f_rate"));
        assert!(!fields.contains("f_dir"));
        assert!(fields.contains("mode"));
    }

    #[test]
    fn test_temperature_encoding() {
        let codec = ControlCodec::default();
        let stemp = |t: f64| {
            let state = ControlState::on(Mode::Cool, Temperature::from(t));
            codec.encode(&state).get("stemp").to_string()
        };
        assert_eq!(stemp(4.0), "10.0");
        assert_eq!(stemp(45.0), "41.0");
        assert_eq!(stemp(23.9), "23.5");
        assert_eq!(stemp(-5.0), "M");
        assert_eq!(stemp(0.0), "");

        let decoded = codec.decode(&WireFields::parse("ret=OK,pow=1,mode=3,stemp=M"));
        assert_eq!(decoded.temperature, Temperature::Manual);
    }

    #[test]
    fn test_configurable_range() {
        let codec = ControlCodec::default().with_range(TemperatureRange::NARROW);
        let state = ControlState::on(Mode::Cool, Temperature::Celsius(30.0));
        assert_eq!(codec.encode(&state).get("stemp"), "25.0");
        let stored = ControlState::on(Mode::Cool, Temperature::Celsius(25.0));
        assert!(codec.same_state(&state, &stored));
    }

    #[test]
    fn test_humidity_encoding() {
        let codec = ControlCodec::default();
        for h in [0u8, 25, 50] {
            let mut state = ControlState::on(Mode::Dehumidify, Temperature::Unset);
            state.humidity = Humidity::Percent(h);
            let fields = codec.encode(&state);
            assert_eq!(fields.get("shum"), h.to_string());
            assert_eq!(codec.decode(&fields).humidity, Humidity::Percent(h));
        }

        let mut state = ControlState::on(Mode::Dehumidify, Temperature::Unset);
        state.humidity = Humidity::from(-1);
        let fields = codec.encode(&state);
        assert_eq!(fields.get("shum"), "AUTO");
        assert_eq!(codec.decode(&fields).humidity, Humidity::Auto);

        state.humidity = Humidity::Percent(80);
        assert_eq!(codec.encode(&state).get("shum"), "50");
    }

    #[test]
    fn test_fan_rate_clamps_on_encode() {
        let mut state = ControlState::on(Mode::Fan, Temperature::Unset);
        state.fan_rate = FanRate::Level(6);
        let fields = ControlCodec::default().encode(&state);
        assert_eq!(fields.get("f_rate"), "7");
        assert_eq!(ControlState::from(&fields).fan_rate, FanRate::Level(5));
        assert_eq!(ControlState::from(&fields), state);
    }

    #[test]
    fn test_lenient_decode() {
        let fields = WireFields::parse("ret=OK,pow=1,mode=x,stemp=hot,shum=--,f_rate=9,f_dir=12");
        let state = ControlState::from(&fields);
        assert!(state.power);
        assert_eq!(state.mode, Mode::Auto);
        assert_eq!(state.temperature, Temperature::Unset);
        assert_eq!(state.humidity, Humidity::Percent(0));
        assert_eq!(state.fan_rate, FanRate::Unset);
        assert_eq!(state.fan_direction, FanDirection::Unknown(13));
    }

    #[test]
    fn test_decode_other_modes() {
        let fields = WireFields::parse(
            "ret=OK,pow=1,mode=4,stemp=25.0,shum=0,f_rate=A,f_dir=0,\
             dt1=25.0,dt2=M,dt3=22.0,dt4=25.0,dt5=25.0,dt7=25.0,\
             dh1=AUTO,dh2=50,dh3=0,dh4=0,dh5=0,dh7=AUTO,\
             dfr1=5,dfr3=B,dfr4=A,dfr6=3,dfd1=0,dfd3=3,dfd4=0,dfd6=1",
        );
        let state = ControlState::from(&fields);
        assert_eq!(state.mode, Mode::Heat);
        assert!(!state.other_modes.contains_key(&Mode::Heat));

        let cool = state.other_modes[&Mode::Cool];
        assert_eq!(cool.temperature, Temperature::Celsius(22.0));
        assert_eq!(cool.humidity, Humidity::Percent(0));
        assert_eq!(cool.fan_rate, FanRate::Quiet);
        assert_eq!(cool.fan_direction, FanDirection::Both);

        let auto = state.other_modes[&Mode::Auto];
        assert_eq!(auto.humidity, Humidity::Auto);
        assert_eq!(auto.fan_rate, FanRate::Level(3));

        let dehum = state.other_modes[&Mode::Dehumidify];
        assert_eq!(dehum.temperature, Temperature::Manual);
        assert_eq!(dehum.fan_rate, FanRate::Unset);
        assert_eq!(dehum.fan_direction, FanDirection::Unset);

        let fan = state.other_modes[&Mode::Fan];
        assert_eq!(fan.temperature, Temperature::Unset);
        assert_eq!(fan.fan_rate, FanRate::Level(1));
        assert_eq!(fan.fan_direction, FanDirection::Vertical);
    }

    #[test]
    fn test_other_modes_ignored_by_equality() {
        let fields = WireFields::parse("pow=1,mode=3,stemp=24.0,shum=0,dt4=20.0");
        let decoded = ControlState::from(&fields);
        assert_eq!(decoded.other_modes.len(), 1);
        assert_eq!(decoded, ControlState::on(Mode::Cool, Temperature::Celsius(24.0)));
    }

    #[test]
    fn test_serialize_mode_names() {
        let state = ControlState::on(Mode::Dehumidify, Temperature::Celsius(21.0));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["mode"], "dehumidify");
        assert_eq!(json["temperature"]["celsius"], 21.0);
        assert!(json.get("other_modes").is_none());
    }
}
