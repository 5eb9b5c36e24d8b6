use crate::domain::TelemetryReading;
use chrono::{DateTime, Utc};

/// A telemetry reading bound to a device and an ingestion instant.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySample {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub indoor_temperature: f64,
    pub probe_temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub ec_a: f64,
    pub ec_b: f64,
    pub ph_a: f64,
    pub ph_b: f64,
    pub tank_a: f64,
    pub tank_b: f64,
}

impl TelemetrySample {
    pub fn from_reading(
        device_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        reading: &TelemetryReading,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp,
            indoor_temperature: f64::from(reading.temp_indoor),
            probe_temperature: f64::from(reading.temp_probe),
            humidity: f64::from(reading.humidity),
            pressure: f64::from(reading.pressure),
            ec_a: f64::from(reading.ec_a),
            ec_b: f64::from(reading.ec_b),
            ph_a: f64::from(reading.ph_a),
            ph_b: f64::from(reading.ph_b),
            tank_a: f64::from(reading.tank_a),
            tank_b: f64::from(reading.tank_b),
        }
    }

    /// Second-resolution key shared by both stores.
    pub fn unix_timestamp(&self) -> i64 {
        self.timestamp.timestamp()
    }

    /// Named measurement fields as they appear in a snapshot document.
    pub fn measurements(&self) -> [(&'static str, f64); 10] {
        [
            ("temp_indoor", self.indoor_temperature),
            ("temp_probe", self.probe_temperature),
            ("humidity", self.humidity),
            ("pressure", self.pressure),
            ("ec_a", self.ec_a),
            ("ec_b", self.ec_b),
            ("ph_a", self.ph_a),
            ("ph_b", self.ph_b),
            ("tank_a", self.tank_a),
            ("tank_b", self.tank_b),
        ]
    }
}
