//! Small shared helpers: address validation and on-chain time conversion

use chrono::{DateTime, Utc};

use crate::{Address, TnsError, TnsResult};

/// Whether a string is a well-formed hex address
pub fn is_valid_address(s: &str) -> bool {
    s.parse::<Address>().is_ok()
}

/// Parse an address, surfacing a typed input error
pub fn parse_address(s: &str) -> TnsResult<Address> {
    s.parse::<Address>().map_err(|_| TnsError::InvalidAddress(s.to_string()))
}

/// Convert an on-chain timestamp (seconds since epoch) to a UTC instant
pub fn to_datetime(timestamp: u64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp as i64, 0).unwrap_or_default()
}

/// First label of a dotted name
pub fn first_label(name: &str) -> TnsResult<&str> {
    let label = name.split('.').next().unwrap_or("");
    if label.is_empty() {
        return Err(TnsError::InvalidName(format!("{name:?} has no leading label")));
    }
    Ok(label)
}
