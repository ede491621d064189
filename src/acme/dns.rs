use crate::utils::errors::{CertshipError, Result};
use async_trait::async_trait;
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use std::time::Duration;
use trust_dns_resolver::TokioAsyncResolver;

const CHALLENGE_RECORD_TTL: i64 = 60;
const PROPAGATION_ATTEMPTS: u32 = 24;
const PROPAGATION_INTERVAL: Duration = Duration::from_secs(10);

/// Publishes and removes the TXT records that satisfy DNS-01 challenges.
#[async_trait]
pub trait DnsSolver: Send + Sync {
    async fn set_record(&self, fqdn: &str, value: &str) -> Result<()>;
    async fn remove_record(&self, fqdn: &str, value: &str) -> Result<()>;
}

/// DNS-01 solver backed by AWS Route 53
pub struct Route53Solver {
    client: aws_sdk_route53::Client,
}

impl Route53Solver {
    pub async fn new() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: aws_sdk_route53::Client::new(&config),
        }
    }

    /// Find the hosted zone responsible for a record name: the zone with
    /// the longest name that is a suffix of the record.
    async fn hosted_zone_id(&self, fqdn: &str) -> Result<String> {
        let name = fqdn.trim_end_matches('.');
        let zones = self.client.list_hosted_zones().send().await?;

        let mut best: Option<(usize, String)> = None;
        for zone in zones.hosted_zones() {
            let zone_name = zone.name().trim_end_matches('.');
            let matches = name == zone_name || name.ends_with(&format!(".{zone_name}"));
            if matches && best.as_ref().map_or(true, |(len, _)| zone_name.len() > *len) {
                best = Some((zone_name.len(), zone.id().to_string()));
            }
        }

        best.map(|(_, id)| id)
            .ok_or_else(|| CertshipError::Dns(format!("No hosted zone found for '{fqdn}'")))
    }

    async fn change_record(&self, action: ChangeAction, fqdn: &str, value: &str) -> Result<()> {
        let zone_id = self.hosted_zone_id(fqdn).await?;

        let build_err = |e: aws_sdk_route53::error::BuildError| CertshipError::Dns(e.to_string());
        let record = ResourceRecord::builder()
            .value(format!("\"{value}\""))
            .build()
            .map_err(build_err)?;
        let record_set = ResourceRecordSet::builder()
            .name(fqdn)
            .r#type(RrType::Txt)
            .ttl(CHALLENGE_RECORD_TTL)
            .resource_records(record)
            .build()
            .map_err(build_err)?;
        let change = Change::builder()
            .action(action.clone())
            .resource_record_set(record_set)
            .build()
            .map_err(build_err)?;
        let batch = ChangeBatch::builder()
            .changes(change)
            .build()
            .map_err(build_err)?;

        self.client
            .change_resource_record_sets()
            .hosted_zone_id(&zone_id)
            .change_batch(batch)
            .send()
            .await?;
        tracing::debug!("Applied {action:?} for TXT record {fqdn} in zone {zone_id}");
        Ok(())
    }
}

#[async_trait]
impl DnsSolver for Route53Solver {
    async fn set_record(&self, fqdn: &str, value: &str) -> Result<()> {
        self.change_record(ChangeAction::Upsert, fqdn, value).await
    }

    async fn remove_record(&self, fqdn: &str, value: &str) -> Result<()> {
        self.change_record(ChangeAction::Delete, fqdn, value).await
    }
}

/// Poll public DNS until the challenge TXT record is visible, with a
/// bounded number of attempts so a stuck zone cannot hang the run forever.
pub async fn wait_for_propagation(fqdn: &str, value: &str) -> Result<()> {
    for attempt in 1..=PROPAGATION_ATTEMPTS {
        tokio::time::sleep(PROPAGATION_INTERVAL).await;

        // Fresh resolver each attempt so negative caching from an earlier
        // lookup does not mask a record that has since appeared
        let resolver = TokioAsyncResolver::tokio_from_system_conf()
            .map_err(|e| CertshipError::Dns(format!("Failed to create DNS resolver: {e}")))?;

        match resolver.txt_lookup(fqdn).await {
            Ok(response) => {
                if response.iter().any(|txt| txt.to_string() == value) {
                    tracing::debug!("TXT record {fqdn} visible after {attempt} attempt(s)");
                    return Ok(());
                }
                tracing::trace!("TXT record {fqdn} present but value not yet propagated");
            }
            Err(e) => tracing::trace!("TXT lookup for {fqdn} not ready: {e}"),
        }
    }

    Err(CertshipError::Dns(format!(
        "Timed out waiting for TXT record {fqdn} to propagate"
    )))
}
