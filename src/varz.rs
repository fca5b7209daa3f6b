//! A small metrics store rendered as `key value` text.
//!
//! The store is shared between whatever writes metrics (typically a task
//! applying [`RegistryEvent`]s) and whatever serves them, so it guards its
//! map with a read/write lock.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::registry::RegistryEvent;
use crate::types::Temperature;

/// A single metric value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VarzValue {
    Float(f64),
    Int(i64),
    Bool(bool),
}

impl VarzValue {
    /// Floats always render with one decimal place, booleans as 0/1.
    ///
    /// # Examples
    ///
    /// ```
    /// use daikin_rs::VarzValue;
    ///
    /// assert_eq!(VarzValue::Float(21.0).render(), "21.0");
    /// assert_eq!(VarzValue::Int(3).render(), "3");
    /// assert_eq!(VarzValue::Bool(true).render(), "1");
    /// ```
    pub fn render(&self) -> String {
        match self {
            VarzValue::Float(v) => format!("{v:.1}"),
            VarzValue::Int(v) => v.to_string(),
            VarzValue::Bool(true) => "1".to_string(),
            VarzValue::Bool(false) => "0".to_string(),
        }
    }
}

impl From<f64> for VarzValue {
    fn from(v: f64) -> Self {
        VarzValue::Float(v)
    }
}

impl From<i64> for VarzValue {
    fn from(v: i64) -> Self {
        VarzValue::Int(v)
    }
}

impl From<bool> for VarzValue {
    fn from(v: bool) -> Self {
        VarzValue::Bool(v)
    }
}

/// Locked `key → value` metrics store.
///
/// # Examples
///
/// ```
/// use daikin_rs::Varz;
///
/// let varz = Varz::new();
/// varz.update("b.temp", Some(21.46.into()));
/// varz.update("a.on", Some(true.into()));
/// assert_eq!(varz.to_string(), "a.on 1\nb.temp 21.5\n");
///
/// varz.update("a.on", None);
/// assert_eq!(varz.render("a.on"), "0");
/// ```
#[derive(Debug, Default)]
pub struct Varz {
    values: RwLock<BTreeMap<String, VarzValue>>,
}

impl Varz {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, or remove it when `value` is `None`.
    pub fn update(&self, key: &str, value: Option<VarzValue>) {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        match value {
            Some(value) => {
                values.insert(key.to_string(), value);
            }
            None => {
                values.remove(key);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<VarzValue> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }

    /// Render one key; missing keys render as `0`.
    pub fn render(&self, key: &str) -> String {
        self.get(key)
            .map(|v| v.render())
            .unwrap_or_else(|| "0".to_string())
    }

    pub fn len(&self) -> usize {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record the temperatures carried by a registry event.
    ///
    /// Writes `aircon.{mac}.target`, `aircon.{mac}.temp` and
    /// `aircon.{mac}.world`; a removal clears all three.
    pub fn apply(&self, event: &RegistryEvent) {
        let key = |mac: &str, part: &str| format!("aircon.{mac}.{part}");
        match event {
            RegistryEvent::Updated(snapshot) => {
                let mac = snapshot.mac();
                let target = match (snapshot.control.power, snapshot.control.temperature) {
                    (true, Temperature::Celsius(t)) => Some(VarzValue::Float(t)),
                    _ => None,
                };
                self.update(&key(mac, "target"), target);
                self.update(
                    &key(mac, "temp"),
                    Some(VarzValue::Float(snapshot.sensor.inside_temperature)),
                );
                self.update(
                    &key(mac, "world"),
                    snapshot.sensor.outside_temperature.map(VarzValue::Float),
                );
            }
            RegistryEvent::Removed { mac } => {
                for part in ["target", "temp", "world"] {
                    self.update(&key(mac, part), None);
                }
            }
        }
    }
}

impl fmt::Display for Varz {
    /// One `key value` line per metric, sorted by key.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in values.iter() {
            writeln!(f, "{} {}", key, value.render())?;
        }
        Ok(())
    }
}
