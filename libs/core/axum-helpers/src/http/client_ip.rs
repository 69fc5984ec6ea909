//! Client address resolution behind a reverse proxy.

use axum::extract::{ConnectInfo, Request};
use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Extract client IP address from proxy headers.
///
/// `trusted_hops` is the number of reverse proxies in front of the server.
/// Each one appends the address it saw to `X-Forwarded-For`, so the client
/// is the entry `trusted_hops` places from the right. Anything further left
/// was written by the client and is ignored. `X-Real-IP` is used when there
/// is no `X-Forwarded-For`. With zero trusted hops the headers are not read.
pub fn extract_ip_from_headers(headers: &HeaderMap, trusted_hops: usize) -> Option<IpAddr> {
    if trusted_hops == 0 {
        return None;
    }

    match headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        Some(forwarded) => {
            let hops: Vec<&str> = forwarded.split(',').map(str::trim).collect();
            let index = hops.len().saturating_sub(trusted_hops);
            hops.get(index).and_then(|s| s.parse().ok())
        }
        None => headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok()),
    }
}

/// Best known address of the caller: trusted proxy headers first, then the
/// socket peer recorded by `into_make_service_with_connect_info`.
pub fn client_ip(request: &Request, trusted_hops: usize) -> Option<IpAddr> {
    extract_ip_from_headers(request.headers(), trusted_hops).or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use std::net::Ipv4Addr;

    fn forwarded(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", value.parse().unwrap());
        headers
    }

    #[test]
    fn test_one_proxy_uses_last_hop() {
        let headers = forwarded("10.9.9.9, 203.0.113.7");

        assert_eq!(
            extract_ip_from_headers(&headers, 1),
            Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)))
        );
    }

    #[test]
    fn test_two_proxies_skip_the_inner_one() {
        let headers = forwarded("10.9.9.9, 203.0.113.7, 172.16.0.4");

        assert_eq!(
            extract_ip_from_headers(&headers, 2),
            Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)))
        );
    }

    #[test]
    fn test_short_chain_uses_leftmost_entry() {
        let headers = forwarded("203.0.113.7");

        assert_eq!(
            extract_ip_from_headers(&headers, 3),
            Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)))
        );
    }

    #[test]
    fn test_real_ip_fallback_and_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "198.51.100.2".parse().unwrap());
        assert_eq!(
            extract_ip_from_headers(&headers, 1),
            Some(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 2)))
        );

        assert_eq!(extract_ip_from_headers(&forwarded("unknown"), 1), None);
        assert_eq!(extract_ip_from_headers(&HeaderMap::new(), 1), None);
    }

    #[test]
    fn test_headers_ignored_without_trusted_proxy() {
        let mut request = Request::new(Body::empty());
        request
            .headers_mut()
            .insert("x-forwarded-for", "203.0.113.7".parse().unwrap());
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

        assert_eq!(client_ip(&request, 0), Some(IpAddr::V4(Ipv4Addr::LOCALHOST)));
    }

    #[test]
    fn test_socket_address_is_last_resort() {
        let mut request = Request::new(Body::empty());
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

        assert_eq!(client_ip(&request, 1), Some(IpAddr::V4(Ipv4Addr::LOCALHOST)));
    }
}
