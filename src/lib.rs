//! # daikin_rs
//!
//! An async Rust library for discovering and controlling Daikin air
//! conditioners with a wireless adapter.
//!
//! Units answer a UDP broadcast probe with their identity and accept
//! commands over plain HTTP. Both directions use the same ad-hoc
//! comma-separated `key=value` encoding, handled by [`WireFields`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use daikin_rs::{ControlState, Device, HttpTransport, Mode, Temperature};
//!
//! async fn cool_down() -> Result<(), Box<dyn std::error::Error>> {
//!     let device = Device::new("192.168.1.50", HttpTransport::new()?);
//!
//!     let sensor = device.get_sensor().await?;
//!     println!("inside: {:.1}°C", sensor.inside_temperature);
//!
//!     device
//!         .set_control(&ControlState::on(Mode::Cool, Temperature::Celsius(24.0)))
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Discovery**: Find units on your network with [`discover`] or keep a
//!   long-lived [`Discovery`] socket
//! - **Control**: Read and write power, mode, temperature, humidity, fan
//!   rate and fan direction through [`ControlState`]
//! - **Sensors**: Inside and outside temperature via [`SensorState`]
//! - **Tracking**: Keep an up-to-date view of every unit with [`Registry`]
//! - **Metrics**: Render registry state as text with [`Varz`]
//!
//! ## Communication
//!
//! Discovery uses UDP port 30050. Commands are HTTP requests to
//! `http://{unit}/aircon/...`; every reply carries `ret=OK` on success.
//! Units must be on the same local network as the host.

mod control;
mod device;
mod discovery;
mod errors;
mod registry;
mod sensor;
mod transport;
mod types;
mod varz;
mod wire;

// Re-export public API
pub use control::{ControlCodec, ControlState, ModeSettings};
pub use device::{Device, DeviceState};
pub use discovery::{
    DISCOVERY_PORT, DiscoveredDevice, Discovery, DiscoveryConfig, PROBE, discover,
};
pub use errors::Error;
pub use registry::{
    DeviceSnapshot, FetchKind, FetchOutcome, Input, Registry, RegistryConfig, RegistryEvent,
};
pub use sensor::SensorState;
pub use transport::{HttpTransport, Transport, check_status, process_body};
pub use types::{FanDirection, FanRate, Humidity, Mode, Temperature, TemperatureRange};
pub use varz::{Varz, VarzValue};
pub use wire::WireFields;
