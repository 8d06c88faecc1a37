use crate::store::Collection;
use std::fmt;

/// Non-2xx answer from the CRM store. Kept as a concrete type so callers can
/// `downcast_ref` it out of an `anyhow::Error` and map the status.
#[derive(Debug, Clone)]
pub struct StoreHttpError {
    pub collection: Collection,
    pub method: &'static str,
    pub status: u16,
    pub body: String,
}

impl fmt::Display for StoreHttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CRM store error ({} /{}): HTTP {}: {}",
            self.method,
            self.collection.path(),
            self.status,
            self.body
        )
    }
}

impl std::error::Error for StoreHttpError {}
