pub mod client;
pub mod dns;

use crate::cert::bundle::CertificateBundle;
use crate::utils::errors::Result;
use async_trait::async_trait;

/// Opaque certificate issuance capability: a domain and the caller's
/// terms acceptance in, a finished certificate bundle out. How the
/// certificate is obtained is entirely the implementation's concern.
#[async_trait]
pub trait IssuanceProvider: Send + Sync {
    async fn obtain(&self, domain: &str, terms_accepted: bool) -> Result<CertificateBundle>;
}
