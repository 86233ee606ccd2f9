//! nmap capability: external process invocation plus XML output parsing.
//! Grounded on `util::net::ping_host`'s `tokio::process::Command` pattern.

use super::NmapResult;
use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::net::Ipv4Addr;
use std::process::Stdio;
use tracing::debug;

/// Arguments used for nmap >= 5.30, which supports `-PP`.
const ARGS_MODERN: &[&str] = &[
    "-sP",
    "-PP",
    "--system-dns",
    "--max-retries",
    "1",
    "--max-rtt-timeout",
    "1000ms",
];

/// Arguments for older nmap releases.
const ARGS_LEGACY: &[&str] = &[
    "-sP",
    "--system-dns",
    "--max-retries",
    "1",
    "--max-rtt-timeout",
    "1000",
];

/// Probe a single address; returns `None` if nmap is not installed or the
/// scan produced no usable host record.
pub async fn scan(ip: Ipv4Addr) -> Option<NmapResult> {
    let version = detect_version().await;
    if version.is_none() {
        debug!("nmap not installed, skipping nmap stage for {ip}");
        return None;
    }
    let args = args_for_version(version);

    let output = tokio::process::Command::new("nmap")
        .args(args)
        .arg(ip.to_string())
        .arg("-oX")
        .arg("-")
        .stdin(Stdio::null())
        .output()
        .await;

    let output = match output {
        Ok(o) if o.status.success() => o,
        Ok(o) => {
            debug!("nmap exited with failure status for {ip}: {:?}", o.status);
            return None;
        }
        Err(e) => {
            debug!("failed to spawn nmap for {ip}: {e}");
            return None;
        }
    };

    let xml = String::from_utf8_lossy(&output.stdout);
    match parse_host(&xml) {
        Ok(result) => result,
        Err(e) => {
            debug!("failed to parse nmap XML for {ip}: {e}");
            None
        }
    }
}

/// Parse `nmap --version` output for a `(major, minor)` pair.
async fn detect_version() -> Option<(u32, u32)> {
    let output = tokio::process::Command::new("nmap")
        .arg("--version")
        .output()
        .await
        .ok()?;
    let text = String::from_utf8_lossy(&output.stdout);
    parse_version(&text)
}

fn parse_version(text: &str) -> Option<(u32, u32)> {
    let line = text.lines().find(|l| l.contains("Nmap version"))?;
    let version_str = line.split("Nmap version").nth(1)?.trim();
    let version_str = version_str.split_whitespace().next()?;
    let mut parts = version_str.split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = parts.next()?.chars().take_while(|c| c.is_ascii_digit()).collect::<String>().parse().ok()?;
    Some((major, minor))
}

fn args_for_version(version: Option<(u32, u32)>) -> &'static [&'static str] {
    match version {
        Some((major, minor)) if (major, minor) >= (5, 30) => ARGS_MODERN,
        Some(_) => ARGS_LEGACY,
        None => ARGS_LEGACY,
    }
}

/// Parse the first `<host>` entry of nmap's `-oX -` output: first MAC
/// address (and its vendor) plus the first hostname.
fn parse_host(xml: &str) -> Result<Option<NmapResult>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut result = NmapResult::default();
    let mut seen_host = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).context("malformed nmap XML")? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) => {
                let name = e.name();
                let local = String::from_utf8_lossy(name.as_ref()).to_string();
                match local.as_str() {
                    "host" => seen_host = true,
                    "address" if seen_host => {
                        let mut addrtype = String::new();
                        let mut addr = String::new();
                        let mut vendor = String::new();
                        for attr in e.attributes().flatten() {
                            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                            let value = attr.unescape_value().unwrap_or_default().to_string();
                            match key.as_str() {
                                "addrtype" => addrtype = value,
                                "addr" => addr = value,
                                "vendor" => vendor = value,
                                _ => {}
                            }
                        }
                        if addrtype == "mac" && result.mac.is_none() {
                            result.mac = Some(addr);
                            if !vendor.is_empty() {
                                result.vendor = Some(vendor);
                            }
                        }
                    }
                    "hostname" if seen_host && result.hostname.is_none() => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"name" {
                                result.hostname =
                                    Some(attr.unescape_value().unwrap_or_default().to_string());
                            }
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
        buf.clear();
    }

    if !seen_host {
        return Ok(None);
    }
    Ok(Some(result))
}
