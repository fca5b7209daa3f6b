//! Individual unit control.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::control::{ControlCodec, ControlState};
use crate::errors::Error;
use crate::sensor::SensorState;
use crate::transport::Transport;

type Result<T> = std::result::Result<T, Error>;

/// Control and sensor state fetched together from a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    pub control: ControlState,
    pub sensor: SensorState,
}

/// A single Daikin unit reachable over HTTP.
///
/// A `Device` is a cheap handle: it holds the unit's address, the transport
/// used to reach it, and the [`ControlCodec`] describing its limits. It
/// caches nothing.
///
/// # Example
///
/// ```ignore
/// use daikin_rs::{ControlState, Device, HttpTransport, Mode, Temperature};
///
/// let device = Device::new("192.168.1.50", HttpTransport::new()?);
/// device
///     .set_control(&ControlState::on(Mode::Cool, Temperature::Celsius(24.0)))
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Device<T> {
    address: String,
    transport: T,
    codec: ControlCodec,
}

impl<T: Transport> Device<T> {
    pub const GET_CONTROL_INFO: &'static str = "aircon/get_control_info";
    pub const SET_CONTROL_INFO: &'static str = "aircon/set_control_info";
    pub const GET_SENSOR_INFO: &'static str = "aircon/get_sensor_info";

    pub fn new(address: impl Into<String>, transport: T) -> Self {
        Device {
            address: address.into(),
            transport,
            codec: ControlCodec::default(),
        }
    }

    /// Use `codec` for this unit's temperature and humidity limits.
    pub fn with_codec(mut self, codec: ControlCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn codec(&self) -> &ControlCodec {
        &self.codec
    }

    /// Queries the unit for its current control state (live network call).
    pub async fn get_control(&self) -> Result<ControlState> {
        let fields = self
            .transport
            .get(&self.address, Self::GET_CONTROL_INFO)
            .await?;
        Ok(self.codec.decode(&fields))
    }

    /// Applies a control state.
    pub async fn set_control(&self, state: &ControlState) -> Result<()> {
        let params = self.codec.encode(state);
        let response = self
            .transport
            .post(&self.address, Self::SET_CONTROL_INFO, &params)
            .await?;
        debug!("set_control_info response from {}: {}", self.address, response);
        Ok(())
    }

    pub async fn get_sensor(&self) -> Result<SensorState> {
        let fields = self
            .transport
            .get(&self.address, Self::GET_SENSOR_INFO)
            .await?;
        Ok(SensorState::from(&fields))
    }

    /// Fetch control and sensor state; both requests must succeed.
    pub async fn fetch(&self) -> Result<DeviceState> {
        let (control, sensor) = futures::try_join!(self.get_control(), self.get_sensor())?;
        Ok(DeviceState { control, sensor })
    }

    /// Returns diagnostics including the live state or the error hit fetching it.
    pub async fn diagnostics(&self) -> Value {
        let mut diag = json!({
            "address": self.address,
            "codec": {
                "min_temperature": self.codec.range().min(),
                "max_temperature": self.codec.range().max(),
            },
        });

        match self.fetch().await {
            Ok(state) => {
                diag["state"] = serde_json::to_value(&state).unwrap_or(Value::Null);
            }
            Err(e) => {
                diag["error"] = json!(e.to_string());
            }
        }
        diag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpTransport;
    use crate::types::{FanRate, Mode, Temperature};
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_get(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch() {
        let server = MockServer::start().await;
        mount_get(
            &server,
            "/aircon/get_control_info",
            "ret=OK,pow=1,mode=3,adv=,stemp=24.0,shum=0,f_rate=B,f_dir=0",
        )
        .await;
        mount_get(&server, "/aircon/get_sensor_info", "ret=OK,htemp=26.0,otemp=31.0").await;

        let device = Device::new(server.address().to_string(), HttpTransport::new().unwrap());
        let state = device.fetch().await.unwrap();

        let mut expected = ControlState::on(Mode::Cool, Temperature::Celsius(24.0));
        expected.fan_rate = FanRate::Quiet;
        expected.fan_direction = crate::types::FanDirection::None;
        assert_eq!(state.control, expected);
        assert_eq!(state.sensor.inside_temperature, 26.0);
        assert_eq!(state.sensor.outside_temperature, Some(31.0));
    }

    #[tokio::test]
    async fn test_fetch_fails_when_sensor_rejected() {
        let server = MockServer::start().await;
        mount_get(&server, "/aircon/get_control_info", "ret=OK,pow=0,mode=3").await;
        mount_get(&server, "/aircon/get_sensor_info", "ret=PARAM NG").await;

        let device = Device::new(server.address().to_string(), HttpTransport::new().unwrap());
        let err = device.fetch().await.unwrap_err();
        assert_eq!(err, Error::StatusNotOk("PARAM NG".to_string()));
    }

    #[tokio::test]
    async fn test_set_control_posts_encoded_state() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/aircon/set_control_info"))
            .and(body_string_contains("mode=4"))
            .and(body_string_contains("stemp=25.0"))
            .and(body_string_contains("pow=1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ret=OK,adv="))
            .expect(1)
            .mount(&server)
            .await;

        let codec = ControlCodec::default().with_range(crate::types::TemperatureRange::NARROW);
        let device = Device::new(server.address().to_string(), HttpTransport::new().unwrap())
            .with_codec(codec);
        device
            .set_control(&ControlState::on(Mode::Heat, Temperature::Celsius(28.0)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_diagnostics_reports_error() {
        let transport = HttpTransport::with_timeout(std::time::Duration::from_millis(500)).unwrap();
        let device = Device::new("127.0.0.1:1", transport);
        let diag = device.diagnostics().await;
        assert_eq!(diag["address"], "127.0.0.1:1");
        assert!(diag["error"].is_string());
        assert!(diag.get("state").is_none());
    }
}
