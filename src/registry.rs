//! Tracking of known units.
//!
//! The [`Registry`] owns the map of known units. Everything that could
//! change it (discovery replies, poll ticks, fetch results) arrives as an
//! [`Input`] and is applied by [`Registry::handle`] on a single task, so the
//! map is never locked. Fetches themselves run as separate tasks and report
//! back through a channel.
//!
//! ```text
//!  discovery listener ──┐
//!  poll interval ───────┼──> Registry::run ──> RegistryEvent
//!  fetch tasks ─────────┘         │
//!      ^──────── spawn ───────────┘
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::control::{ControlCodec, ControlState};
use crate::device::{Device, DeviceState};
use crate::discovery::{DiscoveredDevice, Discovery};
use crate::errors::Error;
use crate::sensor::SensorState;
use crate::transport::Transport;

type Result<T> = std::result::Result<T, Error>;

/// Timers and limits for the registry loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistryConfig {
    /// Time between polls of every known unit
    pub poll_interval: Duration,
    /// Time between discovery probes
    pub announce_interval: Duration,
    /// Codec applied to every unit's control state
    pub codec: ControlCodec,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            announce_interval: Duration::from_secs(30),
            codec: ControlCodec::default(),
        }
    }
}

impl RegistryConfig {
    /// Shortest poll or announce interval the loop will run with.
    pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

    /// Set the poll interval, raised to at least [`Self::MIN_INTERVAL`].
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Self::MIN_INTERVAL);
        self
    }

    /// Set the announce interval, raised to at least [`Self::MIN_INTERVAL`].
    pub fn with_announce_interval(mut self, interval: Duration) -> Self {
        self.announce_interval = interval.max(Self::MIN_INTERVAL);
        self
    }

    pub fn with_codec(mut self, codec: ControlCodec) -> Self {
        self.codec = codec;
        self
    }
}

/// The last known state of a tracked unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub info: DiscoveredDevice,
    pub control: ControlState,
    pub sensor: SensorState,
}

impl DeviceSnapshot {
    pub fn mac(&self) -> &str {
        &self.info.mac
    }
}

/// Emitted whenever the registry's view of a unit changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum RegistryEvent {
    /// A unit was registered or successfully polled.
    Updated(DeviceSnapshot),
    /// A unit failed a poll and was forgotten.
    Removed { mac: String },
}

/// Which fetch produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// First fetch after discovering an unknown MAC
    Initial,
    /// Fetch triggered by a poll tick
    Poll,
}

/// Result of a fetch task, funneled back to the owning task.
#[derive(Debug)]
pub struct FetchOutcome {
    pub kind: FetchKind,
    pub info: DiscoveredDevice,
    pub result: Result<DeviceState>,
}

/// Everything the owning task reacts to.
#[derive(Debug)]
pub enum Input {
    Discovered(DiscoveredDevice),
    Tick,
    Fetched(FetchOutcome),
}

/// Owner of the map of known units.
///
/// # Example
///
/// ```ignore
/// use daikin_rs::{Discovery, DiscoveryConfig, HttpTransport, Registry, RegistryConfig};
///
/// let discovery = Discovery::bind(&DiscoveryConfig::default()).await?;
/// let (registry, mut events) = Registry::new(RegistryConfig::default(), HttpTransport::new()?);
/// tokio::spawn(registry.run(discovery));
/// while let Some(event) = events.recv().await {
///     println!("{event:?}");
/// }
/// ```
pub struct Registry<T> {
    config: RegistryConfig,
    transport: T,
    devices: HashMap<String, DeviceSnapshot>,
    /// MACs with an initial fetch outstanding
    pending: HashSet<String>,
    /// Known MACs with a poll fetch outstanding
    in_flight: HashSet<String>,
    events: mpsc::UnboundedSender<RegistryEvent>,
    outcomes_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcomes_rx: mpsc::UnboundedReceiver<FetchOutcome>,
}

impl<T: Transport> Registry<T> {
    /// Create a registry and the receiver its events are delivered to.
    pub fn new(
        config: RegistryConfig,
        transport: T,
    ) -> (Self, mpsc::UnboundedReceiver<RegistryEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let registry = Registry {
            config,
            transport,
            devices: HashMap::new(),
            pending: HashSet::new(),
            in_flight: HashSet::new(),
            events,
            outcomes_tx,
            outcomes_rx,
        };
        (registry, events_rx)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn get(&self, mac: &str) -> Option<&DeviceSnapshot> {
        self.devices.get(mac)
    }

    /// Snapshot of every known unit.
    pub fn devices(&self) -> Vec<DeviceSnapshot> {
        self.devices.values().cloned().collect()
    }

    /// Run the registry until discovery fails.
    ///
    /// Spawns the discovery listener and the announce timer, then applies
    /// inputs on the calling task. Only returns on an unrecoverable socket
    /// error; the embedding program is expected to exit with it.
    pub async fn run(mut self, discovery: Discovery) -> Result<()> {
        let discovery = Arc::new(discovery);
        let (found_tx, mut found_rx) = mpsc::unbounded_channel();
        let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel::<Error>();

        let listener = {
            let discovery = Arc::clone(&discovery);
            let fatal_tx = fatal_tx.clone();
            tokio::spawn(async move {
                loop {
                    match discovery.next().await {
                        Ok((address, fields)) => {
                            let info = DiscoveredDevice::from_reply(address, &fields);
                            if found_tx.send(info).is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            error!("couldn't read next discovery reply: {e}");
                            let _ = fatal_tx.send(e);
                            return;
                        }
                    }
                }
            })
        };

        let announcer = {
            let discovery = Arc::clone(&discovery);
            let interval = self.config.announce_interval.max(RegistryConfig::MIN_INTERVAL);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if let Err(e) = discovery.announce().await {
                        error!("couldn't send discovery probe: {e}");
                        let _ = fatal_tx.send(e);
                        return;
                    }
                }
            })
        };

        let mut poll =
            tokio::time::interval(self.config.poll_interval.max(RegistryConfig::MIN_INTERVAL));
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; nothing is known yet.
        poll.tick().await;

        let result = loop {
            let input = tokio::select! {
                Some(e) = fatal_rx.recv() => break Err(e),
                Some(info) = found_rx.recv() => Input::Discovered(info),
                _ = poll.tick() => Input::Tick,
                Some(outcome) = self.outcomes_rx.recv() => Input::Fetched(outcome),
            };
            self.handle(input);
        };

        listener.abort();
        announcer.abort();
        result
    }

    /// Apply one input to the device map.
    ///
    /// Must be called from within a tokio runtime; fetches are spawned as
    /// tasks and report back through [`Registry::next_outcome`].
    pub fn handle(&mut self, input: Input) {
        match input {
            Input::Discovered(info) => self.on_discovered(info),
            Input::Tick => self.on_tick(),
            Input::Fetched(outcome) => self.on_fetched(outcome),
        }
    }

    /// Wait for the next fetch outcome.
    pub async fn next_outcome(&mut self) -> Option<FetchOutcome> {
        self.outcomes_rx.recv().await
    }

    fn on_discovered(&mut self, info: DiscoveredDevice) {
        if info.mac.is_empty() {
            warn!("ignoring discovery reply without mac from {}", info.address);
            return;
        }
        if !info.is_aircon() {
            warn!("unexpected device type {:?} (mac={})", info.device_type, info.mac);
        }

        if let Some(known) = self.devices.get_mut(&info.mac) {
            known.info.last_seen = info.last_seen;
            return;
        }
        if !self.pending.insert(info.mac.clone()) {
            return;
        }
        debug!("new unit mac={} addr={}, fetching", info.mac, info.address);
        self.spawn_fetch(FetchKind::Initial, info);
    }

    fn on_tick(&mut self) {
        let due: Vec<DiscoveredDevice> = self
            .devices
            .values()
            .filter(|d| !self.in_flight.contains(d.mac()))
            .map(|d| d.info.clone())
            .collect();

        for info in due {
            self.in_flight.insert(info.mac.clone());
            self.spawn_fetch(FetchKind::Poll, info);
        }
    }

    fn on_fetched(&mut self, outcome: FetchOutcome) {
        let FetchOutcome { kind, info, result } = outcome;
        let mac = info.mac.clone();

        match kind {
            FetchKind::Initial => {
                self.pending.remove(&mac);
                match result {
                    Ok(state) => {
                        info!(
                            "got addr={} mac={} name={}",
                            info.address, info.mac, info.name
                        );
                        self.store(info, state);
                    }
                    Err(e) => {
                        warn!("failed to fetch initial update (mac={mac}): {e}");
                    }
                }
            }
            FetchKind::Poll => {
                self.in_flight.remove(&mac);
                let Some(known) = self.devices.get(&mac) else {
                    debug!("dropping poll result for unknown mac={mac}");
                    return;
                };
                match result {
                    Ok(state) => {
                        let mut info = known.info.clone();
                        info.last_seen = SystemTime::now();
                        self.store(info, state);
                    }
                    Err(e) => {
                        warn!("device err (mac={mac}): {e}");
                        self.devices.remove(&mac);
                        self.emit(RegistryEvent::Removed { mac });
                    }
                }
            }
        }
    }

    fn store(&mut self, info: DiscoveredDevice, state: DeviceState) {
        let snapshot = DeviceSnapshot {
            info,
            control: state.control,
            sensor: state.sensor,
        };
        self.devices.insert(snapshot.info.mac.clone(), snapshot.clone());
        self.emit(RegistryEvent::Updated(snapshot));
    }

    fn emit(&self, event: RegistryEvent) {
        if self.events.send(event).is_err() {
            debug!("registry event dropped; no receiver");
        }
    }

    fn spawn_fetch(&self, kind: FetchKind, info: DiscoveredDevice) {
        let device = Device::new(info.host(), self.transport.clone()).with_codec(self.config.codec);
        let outcomes = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let result = device.fetch().await;
            let _ = outcomes.send(FetchOutcome { kind, info, result });
        });
    }
}
