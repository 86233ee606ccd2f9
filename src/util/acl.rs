//! only/no CIDR matching, used by the Address Expander to let an operator
//! exclude ranges the server nonetheless listed.

use ipnetwork::IpNetwork;

pub fn acl_matches(ip: &IpNetwork, acl: &[String]) -> bool {
    for entry in acl {
        if entry == "group:__ANY__" || entry == "0.0.0.0/0" || entry == "::/0" {
            return true;
        }
        if let Ok(network) = entry.parse::<IpNetwork>() {
            if network.contains(ip.ip()) {
                return true;
            }
        }
        if entry == &ip.ip().to_string() {
            return true;
        }
    }
    false
}

pub fn acl_matches_only(ip: &IpNetwork, only: &[String]) -> bool {
    if only.is_empty() {
        return true;
    }
    acl_matches(ip, only)
}

pub fn acl_matches_no(ip: &IpNetwork, no: &[String]) -> bool {
    if no.is_empty() {
        return false;
    }
    acl_matches(ip, no)
}

pub fn is_permitted(ip: &IpNetwork, only: &[String], no: &[String]) -> bool {
    if acl_matches_no(ip, no) {
        return false;
    }
    acl_matches_only(ip, only)
}
