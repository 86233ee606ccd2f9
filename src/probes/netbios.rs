//! NetBIOS capability: a real NBSTAT (NetBIOS Name Service node status)
//! query over raw UDP. Packet construction follows the manual BER-style
//! building in `snmp/client.rs` — a fixed header plus payload over
//! `std::net::UdpSocket`, with a bounded read timeout.

use super::{NetbiosRecord, NetbiosStatus};
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;
use tracing::debug;

const NBNS_PORT: u16 = 137;
const QUERY_TIMEOUT: Duration = Duration::from_millis(1000);

/// Query `ip`'s NetBIOS name table. Returns `None` if the host does not
/// answer or the library's UDP socket cannot be opened.
pub fn query(ip: Ipv4Addr) -> Option<NetbiosStatus> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.set_read_timeout(Some(QUERY_TIMEOUT)).ok()?;

    let request = build_node_status_request();
    let target = SocketAddr::from((ip, NBNS_PORT));
    socket.send_to(&request, target).ok()?;

    let mut buf = [0u8; 2048];
    let (len, _) = match socket.recv_from(&mut buf) {
        Ok(v) => v,
        Err(e) => {
            debug!("no NetBIOS response from {ip}: {e}");
            return None;
        }
    };

    parse_node_status_response(&buf[..len])
}

/// Build a NetBIOS Name Service NODE STATUS request for the wildcard name
/// `*` (16 bytes, space-padded, trailing 0x00 suffix), querying `NBSTAT`
/// (qtype 0x21) in the IN class.
fn build_node_status_request() -> Vec<u8> {
    let mut packet = Vec::with_capacity(50);
    // Transaction ID.
    packet.extend_from_slice(&[0x29, 0x67]);
    // Flags: standard query.
    packet.extend_from_slice(&[0x00, 0x00]);
    // QDCOUNT=1, ANCOUNT=0, NSCOUNT=0, ARCOUNT=0.
    packet.extend_from_slice(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

    // Encoded name: length byte 0x20 (32, first-level-encoded 16-byte name),
    // then the "*" name padded to 16 bytes and first-level-encoded.
    let mut name = [0x20u8; 16];
    name[0] = b'*';
    packet.push(0x20);
    for byte in encode_netbios_name(&name) {
        packet.push(byte);
    }
    packet.push(0x00); // name terminator

    // QTYPE = NBSTAT (0x0021), QCLASS = IN (0x0001).
    packet.extend_from_slice(&[0x00, 0x21, 0x00, 0x01]);
    packet
}

/// First-level NetBIOS name encoding: each byte split into two nibbles,
/// each nibble added to 'A' (0x41).
fn encode_netbios_name(name: &[u8; 16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(32);
    for &b in name {
        out.push((b >> 4) + b'A');
        out.push((b & 0x0f) + b'A');
    }
    out
}

/// Suffix byte 0x00 at GROUP flag => workgroup name.
/// Suffix byte 0x03 at UNIQUE flag => logged-in user session name.
/// Suffix byte 0x00 at UNIQUE flag => the machine's own NetBIOS name.
fn parse_node_status_response(data: &[u8]) -> Option<NetbiosStatus> {
    // Header (12 bytes) + name field + type(2) + class(2) + ttl(4) + rdlength(2)
    // then rdata: 1 byte name count, then 18-byte entries (16 name + suffix +
    // 2 flag bytes), then a 6-byte MAC unit id (the adapter's own address).
    if data.len() < 12 {
        return None;
    }
    let mut offset = 12;
    // Skip the echoed question name: first-level encoded length byte is 0x20,
    // so name occupies 1 (length) + 32 (encoded) + 1 (terminator) = 34 bytes,
    // then qtype(2) + qclass(2).
    offset += 34 + 4;
    if offset >= data.len() {
        return None;
    }
    // Answer resource record: name pointer (2, compressed) + type(2) +
    // class(2) + ttl(4) + rdlength(2).
    offset += 2 + 2 + 2 + 4 + 2;
    if offset >= data.len() {
        return None;
    }
    let num_names = *data.get(offset)? as usize;
    offset += 1;

    let mut records = Vec::with_capacity(num_names);
    for _ in 0..num_names {
        if offset + 18 > data.len() {
            break;
        }
        let raw_name = &data[offset..offset + 15];
        let suffix = data[offset + 15];
        let flags = data[offset + 16];
        let name = String::from_utf8_lossy(raw_name).trim_end().to_string();
        let is_group = flags & 0x80 != 0;
        records.push(NetbiosRecord {
            name,
            suffix,
            is_group,
        });
        offset += 18;
    }

    let mac = data.get(offset..offset + 6).map(|unit_id| {
        unit_id
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(":")
    });

    Some(NetbiosStatus { records, mac })
}
