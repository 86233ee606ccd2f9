//! Integration coverage across the config loader, address expander and
//! spool: the pieces a single job wires together before any worker runs.

use netdiscovery_agent::config::DiscoveryConfig;
use netdiscovery_agent::discovery::expander;
use netdiscovery_agent::discovery::spool::{Spool, DICTIONARY_KEY};
use netdiscovery_agent::model::{Dictionary, Range};
use std::collections::HashMap;

#[tokio::test]
async fn dictionary_survives_a_spool_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spool.sqlite");

    {
        let spool = Spool::open(&path).await.unwrap();
        let dico = Dictionary::new(HashMap::new(), "H1");
        spool.save(DICTIONARY_KEY, &dico).await.unwrap();
    }

    let reopened = Spool::open(&path).await.unwrap();
    let restored: Dictionary = reopened.restore(DICTIONARY_KEY).await.unwrap().unwrap();
    assert_eq!(restored.hash, "H1");
}

#[test]
fn config_discover_acls_feed_directly_into_expansion() {
    let mut config = DiscoveryConfig::default();
    config.discover_no = vec!["10.0.0.5/32".to_string()];

    let ranges = vec![Range::new("10.0.0.1", "10.0.0.6", "site1")];
    let items = expander::expand(&ranges, &config.discover_only, &config.discover_no);

    assert_eq!(items.len(), 5);
    assert!(items.iter().all(|i| i.ip.to_string() != "10.0.0.5"));
}
