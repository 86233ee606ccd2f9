//! MAC address canonicalization used by the probe pipeline and SNMP
//! classifier.

/// Canonical lowercase `aa:bb:cc:dd:ee:ff` form, or `None` if the input
/// does not carry exactly 12 hex digits.
pub fn canonicalize(mac: &str) -> Option<String> {
    let clean: String = mac.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    if clean.len() != 12 {
        return None;
    }
    Some(
        clean
            .as_bytes()
            .chunks(2)
            .map(|chunk| std::str::from_utf8(chunk).unwrap_or("00"))
            .collect::<Vec<&str>>()
            .join(":")
            .to_lowercase(),
    )
}

pub fn is_canonical(mac: &str) -> bool {
    let re = regex::Regex::new(r"^[0-9a-f]{2}(:[0-9a-f]{2}){5}$").expect("static regex");
    re.is_match(mac)
}

pub fn is_zero(mac: &str) -> bool {
    matches!(mac, "00:00:00:00:00:00" | "0:0:0:0:0:0")
}
