//! Client identification utilities
//!
//! Resolves the identity used as the admission-table key.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Key used for requests whose source address cannot be determined
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Extract client IP address from headers
///
/// When `trust_forwarded_for` is set (the service runs behind a reverse
/// proxy), the first entry of `X-Forwarded-For` wins. Otherwise the header is
/// ignored, since any client could set it to dodge rate limiting.
///
/// ## Arguments
/// * `headers` - HTTP request headers
/// * `direct_ip` - Direct connection IP address
/// * `trust_forwarded_for` - Whether to honor `X-Forwarded-For`
pub fn extract_client_ip(
    headers: &HeaderMap,
    direct_ip: Option<IpAddr>,
    trust_forwarded_for: bool,
) -> Option<IpAddr> {
    if trust_forwarded_for {
        if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
            if let Some(first_ip) = xff.split(',').next() {
                if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                    return Some(ip);
                }
            }
        }
    }
    direct_ip
}

/// Admission-table key for a resolved client address
pub fn client_key(ip: Option<IpAddr>) -> String {
    match ip {
        Some(ip) => ip.to_string(),
        None => UNKNOWN_CLIENT.to_string(),
    }
}
