// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::net::IpAddr;
use tokio::net::lookup_host;
use url::Url;

/// 验证 URL 是否安全 (防止 SSRF)
///
/// 检查解析后的 IP 是否为私有地址、环回地址、链路本地或组播地址
pub async fn validate_url(url_str: &str) -> anyhow::Result<()> {
    let url = Url::parse(url_str)?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("Missing host"))?;

    if host.eq_ignore_ascii_case("localhost") {
        return Err(anyhow::anyhow!("localhost is not allowed"));
    }

    // IPv6 literals arrive bracketed
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = bare.parse::<IpAddr>() {
        return check_ip(ip);
    }

    let port = url.port_or_known_default().unwrap_or(80);
    let addrs = lookup_host((host, port)).await?;

    for addr in addrs {
        check_ip(addr.ip())?;
    }

    Ok(())
}

fn check_ip(ip: IpAddr) -> anyhow::Result<()> {
    if is_private_ip(ip) {
        return Err(anyhow::anyhow!("Private IP access is not allowed: {}", ip));
    }
    Ok(())
}

pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            // 10.0.0.0/8
            octets[0] == 10
                // 172.16.0.0/12
                || (octets[0] == 172 && (16..=31).contains(&octets[1]))
                // 192.168.0.0/16
                || (octets[0] == 192 && octets[1] == 168)
                || ipv4.is_loopback()
                || ipv4.is_link_local()
                || ipv4.is_unspecified()
                // 224.0.0.0/4
                || (224..=239).contains(&octets[0])
        }
        IpAddr::V6(ipv6) => {
            let first = ipv6.segments()[0];
            if let Some(mapped) = ipv6.to_ipv4_mapped() {
                return is_private_ip(IpAddr::V4(mapped));
            }
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                // fc00::/7
                || (first & 0xfe00) == 0xfc00
                // fe80::/10
                || (first & 0xffc0) == 0xfe80
                // ff00::/8
                || (first & 0xff00) == 0xff00
        }
    }
}
