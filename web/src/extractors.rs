//! Custom Axum extractors.
//!
//! - `ClientIp`: client address from proxy headers or the connection
//!
//! # Examples
//!
//! ```ignore
//! use pipeline_web::extractors::ClientIp;
//!
//! async fn handler(client_ip: ClientIp) -> String {
//!     format!("Client IP: {}", client_ip.0)
//! }
//! ```

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Client IP address.
///
/// # Priority
///
/// 1. `X-Forwarded-For` (first IP in the list)
/// 2. `X-Real-IP`
/// 3. Connection IP (when the router was served with connect info)
/// 4. `127.0.0.1`
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(client_ip(&parts.headers, parts.extensions.get())))
    }
}

/// Extract the client IP from headers or connection info.
#[must_use]
pub fn client_ip(headers: &HeaderMap, connect_info: Option<&ConnectInfo<SocketAddr>>) -> IpAddr {
    let forwarded = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());
    if let Some(ip) = forwarded {
        return ip;
    }

    let real = headers
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<IpAddr>().ok());
    if let Some(ip) = real {
        return ip;
    }

    connect_info.map_or(IpAddr::V4(Ipv4Addr::LOCALHOST), |ConnectInfo(addr)| addr.ip())
}
