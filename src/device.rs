//! Device statistics returned by the Powerpal readings API.

use serde::{Deserialize, Serialize};

/// Summary statistics for a single Powerpal device.
///
/// Every field is required. A payload missing any of them, or carrying a
/// value of the wrong type, is rejected as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStats {
    /// Device serial number.
    pub serial_number: String,
    /// Total number of meter readings recorded.
    pub total_meter_reading_count: i64,
    /// Total watt hours recorded.
    pub total_watt_hours: i64,
    /// Total cost recorded.
    pub total_cost: f64,
    /// Timestamp of the first reading, in epoch seconds.
    pub first_reading_timestamp: i64,
    /// Timestamp of the last reading, in epoch seconds.
    pub last_reading_timestamp: i64,
    /// Watt hours at the last reading.
    pub last_reading_watt_hours: i64,
    /// Cost at the last reading.
    pub last_reading_cost: f64,
    /// Days of data available for the device.
    pub available_days: i64,
}

impl DeviceStats {
    /// Decodes a response body.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"serial_number":"PP123","total_meter_reading_count":10,"total_watt_hours":5000,"total_cost":12.5,"first_reading_timestamp":1000,"last_reading_timestamp":2000,"last_reading_watt_hours":50,"last_reading_cost":0.12,"available_days":30}"#;

    #[test]
    fn test_decode_sample() {
        let stats = DeviceStats::from_json(SAMPLE.as_bytes()).unwrap();
        assert_eq!(stats.serial_number, "PP123");
        assert_eq!(stats.total_meter_reading_count, 10);
        assert_eq!(stats.total_watt_hours, 5000);
        assert_eq!(stats.total_cost, 12.5);
        assert_eq!(stats.first_reading_timestamp, 1000);
        assert_eq!(stats.last_reading_timestamp, 2000);
        assert_eq!(stats.last_reading_watt_hours, 50);
        assert_eq!(stats.last_reading_cost, 0.12);
        assert_eq!(stats.available_days, 30);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let body = SAMPLE.replace('}', r#","firmware":"1.2.3"}"#);
        assert!(DeviceStats::from_json(body.as_bytes()).is_ok());
    }

    #[test]
    fn test_missing_field_rejected() {
        let body = SAMPLE.replace(r#""available_days":30"#, r#""other":1"#);
        assert!(DeviceStats::from_json(body.as_bytes()).is_err());
    }

    #[test]
    fn test_wrong_type_rejected() {
        let body = SAMPLE.replace(r#""total_watt_hours":5000"#, r#""total_watt_hours":"5000""#);
        assert!(DeviceStats::from_json(body.as_bytes()).is_err());
    }

    #[test]
    fn test_fractional_integer_rejected() {
        let body = SAMPLE.replace(r#""available_days":30"#, r#""available_days":30.5"#);
        assert!(DeviceStats::from_json(body.as_bytes()).is_err());
    }

    #[test]
    fn test_truncated_rejected() {
        let body = &SAMPLE.as_bytes()[..SAMPLE.len() / 2];
        assert!(DeviceStats::from_json(body).is_err());
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(DeviceStats::from_json(b"unknown").is_err());
        assert!(DeviceStats::from_json(b"[]").is_err());
        assert!(DeviceStats::from_json(b"").is_err());
    }
}
