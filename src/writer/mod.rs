pub mod archive;
pub mod s3;

pub use s3::S3Writer;

use crate::cert::bundle::CertificateBundle;
use crate::utils::errors::Result;
use async_trait::async_trait;
use std::io::Write;

/// Delivers a finalized certificate bundle to its destination.
///
/// Exactly two production implementations exist: `StdoutWriter` and
/// `S3Writer`. A new destination means a new implementation, not changes
/// at the call sites.
#[async_trait]
pub trait ResultWriter: Send + Sync {
    async fn write(&self, bundle: &CertificateBundle) -> Result<()>;
}

/// Prints the certificate chain and private key to standard output.
pub struct StdoutWriter;

/// Fixed human-readable rendering used by `StdoutWriter`
pub fn render_text(bundle: &CertificateBundle) -> String {
    format!(
        "\nCERTIFICATE, CHAIN AND PRIVATE KEY\n----------------------------------\n\n{}\n{}\n",
        String::from_utf8_lossy(&bundle.certificate),
        String::from_utf8_lossy(&bundle.private_key)
    )
}

#[async_trait]
impl ResultWriter for StdoutWriter {
    async fn write(&self, bundle: &CertificateBundle) -> Result<()> {
        let mut stdout = std::io::stdout();
        stdout.write_all(render_text(bundle).as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::bundle::testing::test_bundle;

    #[test]
    fn test_render_text_contains_chain_and_key() {
        let bundle = test_bundle("example.com", 2099);
        let text = render_text(&bundle);

        assert!(text.starts_with("\nCERTIFICATE, CHAIN AND PRIVATE KEY\n"));
        assert!(text.contains("-----BEGIN CERTIFICATE-----"));
        assert!(text.contains("PRIVATE KEY-----"));
    }
}
