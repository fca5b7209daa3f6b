//! HTTP command transport.
//!
//! Every unit exposes a small HTTP server answering requests such as
//! `GET /aircon/get_control_info`. Bodies use the [`WireFields`] encoding
//! and always carry a `ret` status field.

use std::future::Future;
use std::time::Duration;

use log::{debug, trace};
use reqwest::header::CONTENT_TYPE;

use crate::errors::Error;
use crate::wire::WireFields;

type Result<T> = std::result::Result<T, Error>;

/// Trait for issuing commands to a unit.
///
/// Implementations return the decoded body only when the unit answered
/// with `ret=OK`; see [`check_status`].
pub trait Transport: Clone + Send + Sync + 'static {
    /// Issue a GET request for `command` on the unit at `address`.
    fn get(
        &self,
        address: &str,
        command: &str,
    ) -> impl Future<Output = Result<WireFields>> + Send;

    /// Issue a POST request for `command`, sending `params` as a form body.
    fn post(
        &self,
        address: &str,
        command: &str,
        params: &WireFields,
    ) -> impl Future<Output = Result<WireFields>> + Send;
}

/// [`Transport`] over plain HTTP using reqwest.
///
/// # Example
///
/// ```ignore
/// use daikin_rs::{HttpTransport, Transport};
///
/// let transport = HttpTransport::new()?;
/// let fields = transport.get("192.168.1.50", "aircon/get_sensor_info").await?;
/// println!("inside: {}", fields.get("htemp"));
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Per-request deadline used by [`HttpTransport::new`].
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new() -> Result<Self> {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    /// Build a transport whose requests fail after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http("build client", e))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (caller manages timeouts and proxies).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    async fn get(&self, address: &str, command: &str) -> Result<WireFields> {
        let target = target_for(address, command);
        debug!("GET {target}");

        let resp = self
            .client
            .get(&target)
            .send()
            .await
            .map_err(|e| Error::http("get", e))?;
        let body = resp.text().await.map_err(|e| Error::http("read", e))?;
        process_body(&body)
    }

    async fn post(&self, address: &str, command: &str, params: &WireFields) -> Result<WireFields> {
        let target = target_for(address, command);
        let form = params.to_form_string();
        debug!("POST {target} {form}");

        let resp = self
            .client
            .post(&target)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await
            .map_err(|e| Error::http("post", e))?;
        let body = resp.text().await.map_err(|e| Error::http("read", e))?;
        process_body(&body)
    }
}

/// Decode a response body and validate its status.
pub fn process_body(body: &str) -> Result<WireFields> {
    trace!("response body: {body}");
    check_status(WireFields::parse(body))
}

/// Validate the `ret` field of decoded response fields.
///
/// # Examples
///
/// ```
/// use daikin_rs::{Error, WireFields, check_status};
///
/// assert!(check_status(WireFields::parse("ret=OK,pow=1")).is_ok());
/// assert!(matches!(
///     check_status(WireFields::parse("ret=PARAM NG")),
///     Err(Error::StatusNotOk(_))
/// ));
/// assert!(matches!(
///     check_status(WireFields::parse("pow=1")),
///     Err(Error::InvalidResponse)
/// ));
/// ```
pub fn check_status(fields: WireFields) -> Result<WireFields> {
    match fields.get("ret") {
        "" => Err(Error::InvalidResponse),
        "OK" => Ok(fields),
        other => Err(Error::StatusNotOk(other.to_string())),
    }
}

fn target_for(address: &str, command: &str) -> String {
    format!("http://{address}/{command}")
}
