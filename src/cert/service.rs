use crate::acme::IssuanceProvider;
use crate::cert::bundle::CertificateBundle;
use crate::cert::cache::CertificateCache;
use crate::utils::errors::Result;

/// Cache-aware certificate issuance.
///
/// Checks the cache first (unless forced), delegates to the issuance
/// provider on a miss, and records the fresh bundle before returning it.
pub struct CertificateService<'a> {
    cache: &'a CertificateCache,
    issuer: &'a dyn IssuanceProvider,
}

impl<'a> CertificateService<'a> {
    pub fn new(cache: &'a CertificateCache, issuer: &'a dyn IssuanceProvider) -> Self {
        Self { cache, issuer }
    }

    pub async fn obtain(
        &self,
        domain: &str,
        terms_accepted: bool,
        force: bool,
    ) -> Result<CertificateBundle> {
        if !force {
            if let Some(bundle) = self.cache.lookup(domain) {
                tracing::info!("Using cached certificate bundle for '{domain}'");
                return Ok(bundle);
            }
        }

        let bundle = self.issuer.obtain(domain, terms_accepted).await?;
        self.cache.store(domain, &bundle)?;
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::bundle::testing::test_bundle;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingIssuer {
        calls: AtomicUsize,
    }

    impl CountingIssuer {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IssuanceProvider for CountingIssuer {
        async fn obtain(&self, domain: &str, _terms_accepted: bool) -> Result<CertificateBundle> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(test_bundle(domain, 2099))
        }
    }

    fn test_cache() -> (tempfile::TempDir, CertificateCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = CertificateCache::new(dir.path().join("project")).unwrap();
        (dir, cache)
    }

    #[tokio::test]
    async fn test_miss_issues_and_stores() {
        let (_dir, cache) = test_cache();
        let issuer = CountingIssuer::new();
        let service = CertificateService::new(&cache, &issuer);

        let bundle = service.obtain("example.com", true, false).await.unwrap();
        assert_eq!(bundle.domain, "example.com");
        assert_eq!(issuer.call_count(), 1);
        assert!(cache.lookup("example.com").is_some());
    }

    #[tokio::test]
    async fn test_second_run_hits_cache() {
        let (_dir, cache) = test_cache();
        let issuer = CountingIssuer::new();
        let service = CertificateService::new(&cache, &issuer);

        let first = service.obtain("example.com", true, false).await.unwrap();
        let second = service.obtain("example.com", true, false).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(issuer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_force_bypasses_lookup_but_still_stores() {
        let (_dir, cache) = test_cache();
        let issuer = CountingIssuer::new();
        let service = CertificateService::new(&cache, &issuer);

        service.obtain("example.com", true, false).await.unwrap();
        let forced = service.obtain("example.com", true, true).await.unwrap();
        assert_eq!(issuer.call_count(), 2);

        // The forced bundle replaced the cached one
        assert_eq!(cache.lookup("example.com").unwrap(), forced);
    }
}
