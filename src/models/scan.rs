use chrono::{DateTime, Utc};
use http::HeaderMap;
use serde::Serialize;

pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct QrScan {
    pub id: i64,
    pub product_id: i32,
    pub scanned_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
}

/// Best-effort identity of whoever opened a product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}

impl ClientInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ip_address = header_value(headers, "x-forwarded-for")
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .unwrap_or(UNKNOWN_CLIENT)
            .to_string();

        let user_agent = header_value(headers, http::header::USER_AGENT.as_str())
            .unwrap_or(UNKNOWN_CLIENT)
            .to_string();

        Self {
            ip_address,
            user_agent,
        }
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
