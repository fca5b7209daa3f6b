//! Device discovery via UDP broadcast.
//!
//! Units listen on UDP port 30050 for the probe `DAIKIN_UDP/common/basic_info`
//! and answer the sender with their basic info in the wire encoding.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, SystemTime};

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use tokio::net::UdpSocket;
use tokio::time::Instant;

use crate::device::Device;
use crate::errors::Error;
use crate::transport::Transport;
use crate::wire::WireFields;

type Result<T> = std::result::Result<T, Error>;

/// Payload that asks every unit on the network to reply.
pub const PROBE: &[u8] = b"DAIKIN_UDP/common/basic_info";

/// Well-known port units listen on for [`PROBE`].
pub const DISCOVERY_PORT: u16 = 30050;

/// Where to listen and where to send probes.
///
/// Tests point `target` at a loopback socket instead of the broadcast address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    pub bind: SocketAddr,
    pub target: SocketAddr,
    pub buffer_size: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            target: SocketAddr::from((Ipv4Addr::BROADCAST, DISCOVERY_PORT)),
            buffer_size: 8192,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_target(mut self, target: SocketAddr) -> Self {
        self.target = target;
        self
    }
}

/// A unit that answered a discovery probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    /// IP address the reply came from
    pub address: IpAddr,
    /// MAC address; the unit's stable identity
    pub mac: String,
    pub name: String,
    pub group: String,
    pub firmware_version: String,
    /// `aircon` for air conditioners
    pub device_type: String,
    /// Power state advertised in the reply
    pub power: bool,
    pub last_seen: SystemTime,
}

impl DiscoveredDevice {
    /// Extract identity fields from a discovery reply.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::net::{IpAddr, Ipv4Addr};
    /// use daikin_rs::{DiscoveredDevice, WireFields};
    ///
    /// let fields = WireFields::parse(
    ///     "ret=OK,type=aircon,mac=A0B1C2D3E4F5,name=%4b%69%74%63%68%65%6e,pow=1",
    /// );
    /// let device = DiscoveredDevice::from_reply(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)), &fields);
    /// assert_eq!(device.name, "Kitchen");
    /// assert!(device.power);
    /// assert!(device.is_aircon());
    /// ```
    pub fn from_reply(address: IpAddr, fields: &WireFields) -> Self {
        DiscoveredDevice {
            address,
            mac: fields.get("mac").to_string(),
            name: fields.get("name").to_string(),
            group: fields.get("grp_name").to_string(),
            firmware_version: fields.get("ver").to_string(),
            device_type: fields.get("type").to_string(),
            power: !matches!(fields.get("pow"), "" | "0"),
            last_seen: SystemTime::now(),
        }
    }

    /// Whether the reply looks like a well-formed air conditioner.
    pub fn is_aircon(&self) -> bool {
        self.device_type == "aircon" && !self.mac.is_empty()
    }

    /// The `host` part used to reach this unit over HTTP.
    pub fn host(&self) -> String {
        match self.address {
            IpAddr::V4(ip) => ip.to_string(),
            IpAddr::V6(ip) => format!("[{ip}]"),
        }
    }

    /// Convert this discovered unit into a [`Device`] handle.
    pub fn into_device<T: Transport>(self, transport: T) -> Device<T> {
        Device::new(self.host(), transport)
    }
}

/// A UDP socket that sends discovery probes and receives the replies.
///
/// [`Discovery::next`] is meant for a single consumer; [`Discovery::announce`]
/// may be called concurrently from elsewhere.
#[derive(Debug)]
pub struct Discovery {
    socket: UdpSocket,
    target: SocketAddr,
    buffer_size: usize,
}

impl Discovery {
    /// Bind the discovery socket described by `config`.
    pub async fn bind(config: &DiscoveryConfig) -> Result<Self> {
        let socket = UdpSocket::bind(config.bind)
            .await
            .map_err(|e| Error::socket("bind", e))?;

        socket
            .set_broadcast(true)
            .map_err(|e| Error::socket("set_broadcast", e))?;

        Ok(Self {
            socket,
            target: config.target,
            buffer_size: config.buffer_size,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|e| Error::socket("local_addr", e))
    }

    /// Ask units on the network to reply.
    pub async fn announce(&self) -> Result<()> {
        trace!("sending probe to {}", self.target);
        self.socket
            .send_to(PROBE, self.target)
            .await
            .map_err(|e| Error::socket("send_to", e))?;
        Ok(())
    }

    /// Wait for the next reply. There is no timeout.
    ///
    /// Replies are returned whether or not they look like an aircon; the
    /// caller decides what to do with them.
    pub async fn next(&self) -> Result<(IpAddr, WireFields)> {
        let mut buffer = vec![0u8; self.buffer_size];
        let (size, addr) = self
            .socket
            .recv_from(&mut buffer)
            .await
            .map_err(|e| Error::socket("recv_from", e))?;

        let payload = String::from_utf8_lossy(&buffer[..size]);
        debug!("discovery reply from {addr}: {payload}");
        Ok((addr.ip(), WireFields::parse(&payload)))
    }
}

/// Discover units on the local network.
///
/// Sends a single probe and collects replies, one per MAC address, until
/// `discovery_timeout` has elapsed. Replies without a MAC are dropped.
///
/// # Examples
///
/// ```ignore
/// use std::time::Duration;
/// use daikin_rs::{DiscoveryConfig, discover};
///
/// let units = discover(&DiscoveryConfig::default(), Duration::from_secs(3)).await?;
/// for unit in units {
///     println!("  {} - {} ({})", unit.address, unit.mac, unit.name);
/// }
/// ```
pub async fn discover(
    config: &DiscoveryConfig,
    discovery_timeout: Duration,
) -> Result<Vec<DiscoveredDevice>> {
    let discovery = Discovery::bind(config).await?;
    discovery.announce().await?;

    let mut discovered: HashMap<String, DiscoveredDevice> = HashMap::new();
    let deadline = Instant::now() + discovery_timeout;

    while let Ok(reply) = tokio::time::timeout_at(deadline, discovery.next()).await {
        let (address, fields) = reply?;
        let device = DiscoveredDevice::from_reply(address, &fields);
        if device.mac.is_empty() {
            debug!("ignoring reply without mac from {address}");
            continue;
        }
        discovered.insert(device.mac.clone(), device);
    }

    Ok(discovered.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = "ret=OK,type=aircon,reg=au,dst=1,ver=1_2_51,pow=0,\
                         err=0,location=0,name=%4c%69%76%69%6e%67,icon=0,\
                         method=home only,port=30050,id=,pw=,lpw_flag=0,\
                         adp_kind=3,pv=2,cpv=2,cpv_minor=00,led=1,en_setzone=1,\
                         mac=A0B1C2D3E4F5,adp_mode=run,en_hol=0,grp_name=%55%70,en_grp=1";

    fn loopback() -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, 0))
    }

    #[tokio::test]
    async fn test_announce_and_next() {
        let unit = UdpSocket::bind(loopback()).await.unwrap();
        let config = DiscoveryConfig::default()
            .with_bind(loopback())
            .with_target(unit.local_addr().unwrap());
        let discovery = Discovery::bind(&config).await.unwrap();

        discovery.announce().await.unwrap();
        let mut buf = [0u8; 64];
        let (n, from) = unit.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], PROBE);

        unit.send_to(REPLY.as_bytes(), from).await.unwrap();
        let (address, fields) = discovery.next().await.unwrap();
        assert_eq!(address, IpAddr::V4(Ipv4Addr::LOCALHOST));

        let device = DiscoveredDevice::from_reply(address, &fields);
        assert_eq!(device.mac, "A0B1C2D3E4F5");
        assert_eq!(device.name, "Living");
        assert_eq!(device.group, "Up");
        assert_eq!(device.firmware_version, "1_2_51");
        assert!(!device.power);
        assert!(device.is_aircon());
    }

    #[tokio::test]
    async fn test_next_returns_malformed_replies() {
        let unit = UdpSocket::bind(loopback()).await.unwrap();
        let config = DiscoveryConfig::default().with_bind(loopback());
        let discovery = Discovery::bind(&config).await.unwrap();

        unit.send_to(b"ret=OK,type=light", discovery.local_addr().unwrap())
            .await
            .unwrap();
        let (address, fields) = discovery.next().await.unwrap();
        let device = DiscoveredDevice::from_reply(address, &fields);
        assert!(!device.is_aircon());
        assert_eq!(device.mac, "");
    }

    #[tokio::test]
    async fn test_discover_dedups_by_mac() {
        let unit = UdpSocket::bind(loopback()).await.unwrap();
        let config = DiscoveryConfig::default()
            .with_bind(loopback())
            .with_target(unit.local_addr().unwrap());

        let responder = tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let (_, from) = unit.recv_from(&mut buf).await.unwrap();
            unit.send_to(REPLY.as_bytes(), from).await.unwrap();
            unit.send_to(REPLY.as_bytes(), from).await.unwrap();
            unit.send_to(b"ret=OK,type=aircon", from).await.unwrap();
        });

        let devices = discover(&config, Duration::from_millis(300)).await.unwrap();
        responder.await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].mac, "A0B1C2D3E4F5");
    }

    #[test]
    fn test_ipv6_host_is_bracketed() {
        let fields = WireFields::parse("mac=AA");
        let device = DiscoveredDevice::from_reply("fe80::1".parse().unwrap(), &fields);
        assert_eq!(device.host(), "[fe80::1]");
    }

    #[test]
    fn test_default_target_is_broadcast() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.target.to_string(), "255.255.255.255:30050");
    }
}
