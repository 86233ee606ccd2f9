//! Dictionary Resolver: negotiates which model dictionary is in force
//! using a hash-equality handshake against the spool's cached copy.

use crate::discovery::spool::{Spool, DICTIONARY_KEY};
use crate::model::Dictionary;
use anyhow::Result;

/// Outcome of resolving the dictionary for a job.
pub enum Resolution {
    /// Dictionary resolved and (if server-supplied) persisted; proceed.
    Ready(Dictionary),
    /// The server's expected hash did not match; a refresh request must be
    /// sent and the job aborted without a START/NBIP sequence.
    RefreshRequired,
}

/// Resolve the dictionary in force for this job.
///
/// `server_dico` is the dictionary payload the server sent this cycle, if
/// any. `expected_hash` is the server's `DICOHASH`, if it sent one.
pub async fn resolve(
    spool: &Spool,
    server_dico: Option<Dictionary>,
    expected_hash: Option<&str>,
) -> Result<Resolution> {
    let dictionary = if let Some(dico) = server_dico {
        spool.save(DICTIONARY_KEY, &dico).await?;
        dico
    } else if let Some(cached) = spool.restore::<Dictionary>(DICTIONARY_KEY).await? {
        cached
    } else {
        Dictionary::built_in()
    };

    if let Some(expected) = expected_hash {
        if expected != dictionary.hash {
            return Ok(Resolution::RefreshRequired);
        }
    }

    Ok(Resolution::Ready(dictionary))
}
