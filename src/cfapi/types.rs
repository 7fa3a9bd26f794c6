//! # Request/Response Types
//!
//! JSON payloads exchanged with the Cloudflare Origin CA API.
//!
//! API Reference: https://developers.cloudflare.com/api/resources/origin_ca_certificates/methods/create/

use super::error::ApiError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request body for creating an Origin CA certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignRequest {
    /// Hostnames the certificate is valid for, in request order
    pub hostnames: Vec<String>,
    /// PEM encoded certificate signing request
    pub csr: String,
    /// Requested validity in days
    #[serde(rename = "requested_validity")]
    pub validity: u32,
    /// Signature algorithm, e.g. `origin-ecc`
    #[serde(rename = "request_type")]
    pub request_type: String,
}

/// Certificate returned by a successful signing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignResponse {
    pub id: String,
    /// PEM encoded certificate, possibly a chain
    pub certificate: String,
    pub hostnames: Vec<String>,
    #[serde(rename = "expires_on", with = "expiration")]
    pub expiration: DateTime<Utc>,
    #[serde(rename = "request_type")]
    pub request_type: String,
    #[serde(rename = "requested_validity")]
    pub validity: u32,
    pub csr: String,
}

/// Standard Cloudflare API response envelope
///
/// `result` is kept as raw JSON: failed calls return `{}` there, which only
/// becomes a [`SignResponse`] once `success` has been checked.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiError>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

/// `expires_on` encodings.
///
/// The API has returned both Go's `time.Time.String()` rendering
/// (`2020-12-25 06:27:00 +0000 UTC`) and RFC3339 (`2020-12-25T06:27:00Z`).
/// They are tried in that order.
pub mod expiration {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const GO_TIME_STRING: &str = "%Y-%m-%d %H:%M:%S%.f %z";

    /// Parse an `expires_on` value in either supported encoding.
    pub fn parse(value: &str) -> Result<DateTime<Utc>, String> {
        let trimmed = value.trim();

        if let Some(parsed) = parse_go_time_string(trimmed) {
            return Ok(parsed);
        }

        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| format!("unable to parse expires_on {value:?}: {e}"))
    }

    fn parse_go_time_string(value: &str) -> Option<DateTime<Utc>> {
        // Drop the monotonic clock reading ("m=+0.000") Go appends to local times.
        let value = value.split(" m=").next().unwrap_or(value);
        // The trailing zone name duplicates the numeric offset.
        let (without_zone, zone) = value.rsplit_once(' ')?;
        if !is_zone_name(zone) {
            return None;
        }

        DateTime::parse_from_str(without_zone, GO_TIME_STRING)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// `UTC`, `CEST`, or for zones without an abbreviation a numeric name
    /// such as `+03` or `+0530`.
    fn is_zone_name(zone: &str) -> bool {
        if let Some(digits) = zone.strip_prefix(['+', '-']) {
            return matches!(digits.len(), 2 | 4) && digits.bytes().all(|b| b.is_ascii_digit());
        }
        !zone.is_empty() && zone.bytes().all(|b| b.is_ascii_alphabetic())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn expected_response() -> SignResponse {
        SignResponse {
            id: "9001".to_string(),
            certificate: "-----BEGIN CERTIFICATE-----\n-----END CERTIFICATE-----\n".to_string(),
            hostnames: vec!["example.com".to_string()],
            expiration: Utc.with_ymd_and_hms(2020, 12, 25, 6, 27, 0).unwrap(),
            request_type: "origin-ecc".to_string(),
            validity: 7,
            csr: "-----BEGIN CERTIFICATE REQUEST-----\n-----END CERTIFICATE REQUEST-----"
                .to_string(),
        }
    }

    fn payload(expires_on: &str) -> String {
        serde_json::json!({
            "id": "9001",
            "certificate": "-----BEGIN CERTIFICATE-----\n-----END CERTIFICATE-----\n",
            "expires_on": expires_on,
            "request_type": "origin-ecc",
            "hostnames": ["example.com"],
            "csr": "-----BEGIN CERTIFICATE REQUEST-----\n-----END CERTIFICATE REQUEST-----",
            "requested_validity": 7
        })
        .to_string()
    }

    #[test]
    fn test_sign_response_accepts_go_time_string() {
        let resp: SignResponse =
            serde_json::from_str(&payload("2020-12-25 06:27:00 +0000 UTC")).unwrap();
        assert_eq!(resp, expected_response());
    }

    #[test]
    fn test_sign_response_accepts_rfc3339() {
        let resp: SignResponse = serde_json::from_str(&payload("2020-12-25T06:27:00Z")).unwrap();
        assert_eq!(resp, expected_response());
    }

    #[test]
    fn test_go_time_string_with_offset_and_fraction() {
        let parsed = expiration::parse("2020-12-25 07:27:00.5 +0100 CET").unwrap();
        assert_eq!(
            parsed,
            Utc.with_ymd_and_hms(2020, 12, 25, 6, 27, 0).unwrap()
                + chrono::Duration::milliseconds(500)
        );
    }

    #[test]
    fn test_go_time_string_with_numeric_zone_name() {
        let expected = Utc.with_ymd_and_hms(2020, 12, 25, 6, 27, 0).unwrap();
        assert_eq!(expiration::parse("2020-12-25 11:57:00 +0530 +0530").unwrap(), expected);
        assert_eq!(expiration::parse("2020-12-25 09:27:00 +0300 +03").unwrap(), expected);
        assert_eq!(expiration::parse("2020-12-25 03:27:00 -0300 -03").unwrap(), expected);
    }

    #[test]
    fn test_go_time_string_rejects_malformed_zone_name() {
        assert!(matches!(expiration::parse("2020-12-25 09:27:00 +0300 +3"), Err(_)));
        assert!(matches!(expiration::parse("2020-12-25 09:27:00 +0300 U7C"), Err(_)));
    }

    #[test]
    fn test_go_time_string_with_monotonic_suffix() {
        let parsed = expiration::parse("2020-12-25 06:27:00 +0000 UTC m=+0.000123").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2020, 12, 25, 6, 27, 0).unwrap());
    }

    #[test]
    fn test_unparsable_expiration_is_a_decode_error() {
        let err = serde_json::from_str::<SignResponse>(&payload("Christmas morning")).unwrap_err();
        assert!(err.to_string().contains("unable to parse expires_on"));
    }

    #[test]
    fn test_sign_request_wire_names() {
        let request = SignRequest {
            hostnames: vec!["example.com".to_string()],
            csr: "csr".to_string(),
            validity: 3600,
            request_type: "MD4".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "hostnames": ["example.com"],
                "csr": "csr",
                "requested_validity": 3600,
                "request_type": "MD4"
            })
        );
    }
}
