use crate::utils::errors::{CertshipError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One issued certificate and its supporting material.
///
/// Created once per successful issuance and never mutated; reissuance
/// produces a new bundle. The JSON field names double as the on-disk cache
/// format, so changing them invalidates previously written cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateBundle {
    pub domain: String,
    pub cert_url: String,
    pub cert_stable_url: String,
    #[serde(with = "base64_bytes")]
    pub private_key: Vec<u8>,
    /// Full PEM chain as returned by the CA, leaf first
    #[serde(with = "base64_bytes")]
    pub certificate: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub issuer_certificate: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub csr: Vec<u8>,
}

impl CertificateBundle {
    /// A bundle is only worth caching or delivering when it actually
    /// carries certificate and key material.
    pub fn is_valid(&self) -> bool {
        !self.certificate.is_empty() && !self.private_key.is_empty()
    }

    /// Expiry of the leaf certificate
    pub fn not_after(&self) -> Result<DateTime<Utc>> {
        let (_, der) = x509_parser::pem::parse_x509_pem(&self.certificate)
            .map_err(|e| CertshipError::CertParsing(e.to_string()))?;
        let cert = der
            .parse_x509()
            .map_err(|e| CertshipError::CertParsing(e.to_string()))?;
        let timestamp = cert.validity().not_after.timestamp();
        DateTime::<Utc>::from_timestamp(timestamp, 0).ok_or_else(|| {
            CertshipError::CertParsing(format!("notAfter timestamp {timestamp} out of range"))
        })
    }
}

/// Split a PEM stream into its `CERTIFICATE` blocks, re-encoded one block
/// per element. Blocks of any other type are skipped.
pub fn decode_certificate_blocks(bundle: &[u8]) -> Result<Vec<String>> {
    let config = pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF);
    Ok(pem::parse_many(bundle)?
        .iter()
        .filter(|block| block.tag() == "CERTIFICATE")
        .map(|block| pem::encode_config(block, config))
        .collect())
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_field_names() {
        let bundle = testing::test_bundle("example.com", 2099);
        let json = serde_json::to_string(&bundle).unwrap();

        for field in [
            "domain",
            "certUrl",
            "certStableUrl",
            "privateKey",
            "certificate",
            "issuerCertificate",
            "csr",
        ] {
            assert!(json.contains(&format!("\"{field}\"")), "missing {field}");
        }
    }

    #[test]
    fn test_serde_round_trip() {
        let bundle = testing::test_bundle("example.com", 2099);
        let json = serde_json::to_string(&bundle).unwrap();
        let parsed: CertificateBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, bundle);
    }

    #[test]
    fn test_decode_skips_non_certificate_blocks() {
        let bundle = testing::test_bundle("example.com", 2099);
        let mixed = format!(
            "{}{}",
            String::from_utf8(bundle.certificate.clone()).unwrap(),
            String::from_utf8(bundle.private_key.clone()).unwrap()
        );

        let blocks = decode_certificate_blocks(mixed.as_bytes()).unwrap();
        assert_eq!(blocks.len(), 2);
        for block in &blocks {
            assert!(block.starts_with("-----BEGIN CERTIFICATE-----"));
        }
    }

    #[test]
    fn test_decode_single_certificate_with_other_block_type() {
        let cert = pem::Pem::new("CERTIFICATE", vec![1, 2, 3]);
        let other = pem::Pem::new("EC PRIVATE KEY", vec![4, 5, 6]);
        let stream = format!("{}{}", pem::encode(&cert), pem::encode(&other));

        let blocks = decode_certificate_blocks(stream.as_bytes()).unwrap();
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_not_after() {
        let bundle = testing::test_bundle("example.com", 2099);
        let not_after = bundle.not_after().unwrap();
        assert_eq!(not_after.format("%Y").to_string(), "2099");
    }

    #[test]
    fn test_not_after_rejects_garbage() {
        let mut bundle = testing::test_bundle("example.com", 2099);
        bundle.certificate = b"not pem at all".to_vec();
        assert!(bundle.not_after().is_err());
    }

    #[test]
    fn test_is_valid() {
        let mut bundle = testing::test_bundle("example.com", 2099);
        assert!(bundle.is_valid());
        bundle.private_key.clear();
        assert!(!bundle.is_valid());
    }
}
