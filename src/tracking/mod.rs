pub mod attribution;
pub mod ingester;

pub use attribution::{roas, Attribution, AttributionLedger, DEFAULT_BID_CAPACITY};
pub use ingester::EventIngester;
