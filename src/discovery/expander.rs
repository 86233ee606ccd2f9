//! Address Expander: flattens inclusive IP ranges into an ordered sequence
//! of address work items, applying the configured only/no ACLs.

use crate::model::device::AddressItem;
use crate::model::range::Range;
use crate::util::acl::is_permitted;
use ipnetwork::IpNetwork;
use std::net::Ipv4Addr;

/// Expand every range into its addresses, in ascending order, skipping
/// ranges that don't parse and addresses excluded by `only`/`no`.
pub fn expand(ranges: &[Range], only: &[String], no: &[String]) -> Vec<AddressItem> {
    let mut out = Vec::new();
    for range in ranges {
        let Some((start, end)) = range.bounds() else {
            continue;
        };
        let mut cur = u32::from(start);
        let last = u32::from(end);
        while cur <= last {
            let ip = Ipv4Addr::from(cur);
            if permitted(ip, only, no) {
                out.push(AddressItem {
                    ip,
                    entity: range.entity.clone(),
                });
            }
            if cur == last {
                break;
            }
            cur += 1;
        }
    }
    out
}

fn permitted(ip: Ipv4Addr, only: &[String], no: &[String]) -> bool {
    let Ok(net) = format!("{ip}/32").parse::<IpNetwork>() else {
        return true;
    };
    is_permitted(&net, only, no)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_inclusive_range_in_order() {
        let ranges = vec![Range::new("10.0.0.1", "10.0.0.3", "e1")];
        let items = expand(&ranges, &[], &[]);
        let ips: Vec<String> = items.iter().map(|a| a.ip.to_string()).collect();
        assert_eq!(ips, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        assert!(items.iter().all(|a| a.entity == "e1"));
    }

    #[test]
    fn single_address_range_yields_one_item() {
        let ranges = vec![Range::new("10.0.0.1", "10.0.0.1", "e1")];
        assert_eq!(expand(&ranges, &[], &[]).len(), 1);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(expand(&[], &[], &[]).is_empty());
    }

    #[test]
    fn skips_range_with_missing_endpoint() {
        let bad = Range {
            start: None,
            end: Some("10.0.0.1".into()),
            entity: "e1".into(),
        };
        assert!(expand(&[bad], &[], &[]).is_empty());
    }

    #[test]
    fn overlapping_ranges_are_not_deduplicated() {
        let ranges = vec![
            Range::new("10.0.0.1", "10.0.0.2", "e1"),
            Range::new("10.0.0.2", "10.0.0.3", "e1"),
        ];
        assert_eq!(expand(&ranges, &[], &[]).len(), 4);
    }

    #[test]
    fn no_list_excludes_matching_address() {
        let ranges = vec![Range::new("10.0.0.1", "10.0.0.3", "e1")];
        let items = expand(&ranges, &[], &["10.0.0.2/32".to_string()]);
        let ips: Vec<String> = items.iter().map(|a| a.ip.to_string()).collect();
        assert_eq!(ips, vec!["10.0.0.1", "10.0.0.3"]);
    }

    #[test]
    fn only_list_restricts_to_matching_address() {
        let ranges = vec![Range::new("10.0.0.1", "10.0.0.3", "e1")];
        let items = expand(&ranges, &["10.0.0.2/32".to_string()], &[]);
        let ips: Vec<String> = items.iter().map(|a| a.ip.to_string()).collect();
        assert_eq!(ips, vec!["10.0.0.2"]);
    }
}
