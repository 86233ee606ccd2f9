//! Shared string sanitizer used by the probe pipeline on all text fields
//! pulled from NetBIOS/SNMP/nmap output.

/// Trim and strip control characters; empty after trimming becomes `None`.
pub fn sanitize(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_whitespace() {
        assert_eq!(sanitize("  HOST1  "), Some("HOST1".to_string()));
    }

    #[test]
    fn strips_control_characters() {
        assert_eq!(sanitize("SN123\r\n"), Some("SN123".to_string()));
    }

    #[test]
    fn empty_after_trim_is_none() {
        assert_eq!(sanitize("   \r\n  "), None);
    }
}
