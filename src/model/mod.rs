//! Data model for a discovery job: ranges and credentials supplied by the
//! server, the dictionary used to classify SNMP devices, and the device
//! records produced by the probe pipeline.

pub mod range;
pub mod credential;
pub mod dictionary;
pub mod device;
pub mod process_number;

pub use credential::{Credential, SnmpVersion};
pub use device::{AddressItem, Batch, Device};
pub use dictionary::{Dictionary, Model};
pub use process_number::ProcessNumber;
pub use range::Range;
