use crate::cert::bundle::CertificateBundle;
use crate::utils::errors::Result;
use crate::utils::paths::CertshipPaths;
use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Certificates due to expire within this margin are reissued instead of
/// served from the cache.
const RENEWAL_MARGIN_DAYS: i64 = 30;

/// One cached bundle, as reported by `entries()`
pub struct CacheListing {
    pub domain: String,
    pub not_after: Option<DateTime<Utc>>,
    pub path: PathBuf,
}

/// File-backed certificate bundle cache, one JSON file per domain.
///
/// Reads are fail-open: a missing, unreadable or corrupted entry is a cache
/// miss, never an error, so a broken cache can only cost an extra issuance
/// call. Writes are fatal on failure since they happen after a certificate
/// was obtained and losing it silently is worse.
pub struct CertificateCache {
    project_dir: PathBuf,
}

impl CertificateCache {
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        CertshipPaths::ensure_private_dir(&project_dir)?;
        Ok(Self { project_dir })
    }

    /// Get the cache file path for a domain: dots become underscores
    fn cache_file_path(&self, domain: &str) -> PathBuf {
        self.project_dir
            .join(format!("{}.json", domain.replace('.', "_")))
    }

    /// Load the cached bundle for a domain, or `None` if there is none,
    /// it cannot be read or parsed, or the certificate is due for renewal.
    pub fn lookup(&self, domain: &str) -> Option<CertificateBundle> {
        let path = self.cache_file_path(domain);
        if !path.exists() {
            return None;
        }

        let content = fs::read_to_string(&path).ok()?;
        let bundle: CertificateBundle = match serde_json::from_str(&content) {
            Ok(bundle) => bundle,
            Err(e) => {
                tracing::warn!("Cache parsing error for '{domain}': {e}. Ignoring cached entry.");
                return None;
            }
        };

        if !bundle.is_valid() {
            tracing::warn!("Cached bundle for '{domain}' has empty certificate or key, ignoring");
            return None;
        }

        match bundle.not_after() {
            Ok(not_after) if expires_soon(not_after) => {
                tracing::info!(
                    "Cached certificate for '{domain}' expires at {not_after}, reissuing"
                );
                None
            }
            Ok(_) => Some(bundle),
            Err(e) => {
                tracing::warn!("Cached certificate for '{domain}' is unparseable: {e}");
                None
            }
        }
    }

    /// Serialize the bundle to its deterministic path, overwriting any
    /// previous entry for the domain.
    pub fn store(&self, domain: &str, bundle: &CertificateBundle) -> Result<()> {
        CertshipPaths::ensure_private_dir(&self.project_dir)?;
        let path = self.cache_file_path(domain);
        let content = serde_json::to_string_pretty(bundle)?;
        fs::write(&path, content)?;
        restrict_to_owner(&path)?;
        tracing::debug!("Cached certificate bundle for '{domain}' at {}", path.display());
        Ok(())
    }

    /// List all cached bundles, sorted by domain
    pub fn entries(&self) -> Result<Vec<CacheListing>> {
        let mut listings = Vec::new();
        for entry in fs::read_dir(&self.project_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            let Ok(bundle) = serde_json::from_str::<CertificateBundle>(&content) else {
                continue;
            };
            listings.push(CacheListing {
                not_after: bundle.not_after().ok(),
                domain: bundle.domain,
                path,
            });
        }
        listings.sort_by(|a, b| a.domain.cmp(&b.domain));
        Ok(listings)
    }

    /// Remove the entry for one domain, or every entry. Returns the number
    /// of files removed.
    pub fn clear(&self, domain: Option<&str>) -> Result<usize> {
        match domain {
            Some(domain) => {
                let path = self.cache_file_path(domain);
                if path.exists() {
                    fs::remove_file(path)?;
                    Ok(1)
                } else {
                    Ok(0)
                }
            }
            None => {
                let mut removed = 0;
                for entry in fs::read_dir(&self.project_dir)? {
                    let path = entry?.path();
                    if path.extension().and_then(|e| e.to_str()) == Some("json") {
                        fs::remove_file(path)?;
                        removed += 1;
                    }
                }
                Ok(removed)
            }
        }
    }
}

fn expires_soon(not_after: DateTime<Utc>) -> bool {
    not_after - Duration::days(RENEWAL_MARGIN_DAYS) <= Utc::now()
}

fn restrict_to_owner(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::bundle::testing::test_bundle;

    fn test_cache() -> (tempfile::TempDir, CertificateCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = CertificateCache::new(dir.path().join("project")).unwrap();
        (dir, cache)
    }

    #[test]
    fn test_store_then_lookup_round_trip() {
        let (_dir, cache) = test_cache();
        let bundle = test_bundle("example.com", 2099);

        cache.store("example.com", &bundle).unwrap();
        let loaded = cache.lookup("example.com").unwrap();
        assert_eq!(loaded, bundle);
    }

    #[test]
    fn test_cache_file_name_replaces_dots() {
        let (_dir, cache) = test_cache();
        let bundle = test_bundle("example.com", 2099);

        cache.store("example.com", &bundle).unwrap();
        assert!(cache.project_dir.join("example_com.json").exists());
    }

    #[test]
    fn test_lookup_without_store_is_none() {
        let (_dir, cache) = test_cache();
        assert!(cache.lookup("example.com").is_none());
    }

    #[test]
    fn test_lookup_corrupted_entry_is_none() {
        let (_dir, cache) = test_cache();
        fs::write(cache.cache_file_path("example.com"), "{ truncated").unwrap();
        assert!(cache.lookup("example.com").is_none());
    }

    #[test]
    fn test_lookup_expired_certificate_is_none() {
        let (_dir, cache) = test_cache();
        let bundle = test_bundle("example.com", 2020);

        cache.store("example.com", &bundle).unwrap();
        assert!(cache.lookup("example.com").is_none());
    }

    #[test]
    fn test_store_overwrites_previous_entry() {
        let (_dir, cache) = test_cache();
        let first = test_bundle("example.com", 2099);
        let second = test_bundle("example.com", 2098);

        cache.store("example.com", &first).unwrap();
        cache.store("example.com", &second).unwrap();
        assert_eq!(cache.lookup("example.com").unwrap(), second);
    }

    #[test]
    fn test_entries_and_clear() {
        let (_dir, cache) = test_cache();
        cache
            .store("example.com", &test_bundle("example.com", 2099))
            .unwrap();
        cache
            .store("other.org", &test_bundle("other.org", 2099))
            .unwrap();

        let entries = cache.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].domain, "example.com");
        assert_eq!(entries[1].domain, "other.org");

        assert_eq!(cache.clear(Some("example.com")).unwrap(), 1);
        assert_eq!(cache.clear(Some("example.com")).unwrap(), 0);
        assert_eq!(cache.clear(None).unwrap(), 1);
        assert!(cache.entries().unwrap().is_empty());
    }
}
