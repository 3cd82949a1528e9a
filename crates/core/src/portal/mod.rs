//! Case portal collaborators: case and redesign listings, status reporting,
//! and the named-constant store used for the cycle lock and watermark.

mod error;
mod http_client;
mod traits;
mod types;

pub use error::PortalError;
pub use http_client::PortalClient;
pub use traits::{CaseSource, KeyValueStore, RedesignSource, StatusReporter};
pub use types::{
    display_value, CaseActivity, CaseDetails, CaseRecord, CaseStatusReport, KvEntry,
    RedesignRecord, INSTANCE_DETAILS_FIELD, TOOTH_NUMBERS_FIELD,
};
