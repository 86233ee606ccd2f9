//! Standard SNMP OID constants used by the classifier. The hand-rolled
//! BER session client that used to live here has been replaced by the
//! `snmp` crate (see `probes::snmp`); its response parsers never actually
//! decoded a GETNEXT/GETBULK reply.

pub mod oids;

pub use oids::*;
