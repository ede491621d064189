use crate::acme::dns::{self, DnsSolver};
use crate::acme::IssuanceProvider;
use crate::cert::bundle::{decode_certificate_blocks, CertificateBundle};
use crate::utils::errors::{CertshipError, Result};
use async_trait::async_trait;
use instant_acme::{
    Account, AuthorizationStatus, Challenge, ChallengeType, Identifier, NewAccount, NewOrder,
    Order, OrderStatus,
};
use std::time::Duration;

pub const LETS_ENCRYPT_PRODUCTION: &str = "https://acme-v02.api.letsencrypt.org/directory";
pub const LETS_ENCRYPT_STAGING: &str = "https://acme-staging-v02.api.letsencrypt.org/directory";

const AUTHORIZATION_ATTEMPTS: u32 = 30;
const ORDER_ATTEMPTS: u32 = 30;
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Issuance provider speaking the ACME protocol through `instant-acme`,
/// with DNS-01 validation delegated to a pluggable solver.
pub struct AcmeIssuer {
    email: String,
    directory_url: String,
    solver: Box<dyn DnsSolver>,
}

impl AcmeIssuer {
    pub fn new(email: &str, directory_url: &str, solver: Box<dyn DnsSolver>) -> Self {
        Self {
            email: email.to_string(),
            directory_url: directory_url.to_string(),
            solver,
        }
    }

    async fn register_account(&self, terms_accepted: bool) -> Result<Account> {
        let contact = format!("mailto:{}", self.email);
        let (account, _credentials) = Account::create(
            &NewAccount {
                contact: &[&contact],
                terms_of_service_agreed: terms_accepted,
                only_return_existing: false,
            },
            &self.directory_url,
            None,
        )
        .await?;
        tracing::info!("Registered ACME account for {}", self.email);
        Ok(account)
    }

    async fn solve_authorizations(&self, order: &mut Order) -> Result<()> {
        let authorizations = order.authorizations().await?;

        for authz in authorizations {
            match authz.status {
                AuthorizationStatus::Valid => continue,
                AuthorizationStatus::Pending => {}
                status => {
                    return Err(CertshipError::Challenge(format!(
                        "Authorization for {:?} is in unexpected state {status:?}",
                        authz.identifier
                    )))
                }
            }

            let challenge = authz
                .challenges
                .iter()
                .find(|c| c.r#type == ChallengeType::Dns01)
                .ok_or_else(|| {
                    CertshipError::Challenge(format!(
                        "No DNS-01 challenge offered for {:?}",
                        authz.identifier
                    ))
                })?;

            let Identifier::Dns(domain) = &authz.identifier;
            let fqdn = format!("_acme-challenge.{domain}");
            let value = order.key_authorization(challenge).dns_value();

            tracing::info!("Publishing challenge record {fqdn}");
            self.solver.set_record(&fqdn, &value).await?;

            let outcome = validate_challenge(order, challenge, &authz.identifier, &fqdn, &value).await;

            // Best-effort cleanup; a leftover TXT record is harmless
            if let Err(e) = self.solver.remove_record(&fqdn, &value).await {
                tracing::warn!("Failed to remove challenge record {fqdn}: {e}");
            }
            outcome?;
        }
        Ok(())
    }

    async fn finalize_order(&self, order: &mut Order, domain: &str) -> Result<CertificateBundle> {
        let mut params = rcgen::CertificateParams::new(vec![domain.to_string()])?;
        params.distinguished_name = rcgen::DistinguishedName::new();
        let key_pair = rcgen::KeyPair::generate()?;
        let csr = params.serialize_request(&key_pair)?;

        order.finalize(csr.der()).await?;

        for _ in 0..ORDER_ATTEMPTS {
            tokio::time::sleep(POLL_INTERVAL).await;
            let status = order.refresh().await?.status;

            match status {
                OrderStatus::Valid => {
                    let cert_url = order.state().certificate.clone().unwrap_or_default();
                    let chain = order.certificate().await?.ok_or_else(|| {
                        CertshipError::Challenge(
                            "CA returned no certificate for a valid order".to_string(),
                        )
                    })?;
                    let issuer_certificate = issuer_chain(&chain)?;

                    return Ok(CertificateBundle {
                        domain: domain.to_string(),
                        cert_url: cert_url.clone(),
                        cert_stable_url: cert_url,
                        private_key: key_pair.serialize_pem().into_bytes(),
                        certificate: chain.into_bytes(),
                        issuer_certificate,
                        csr: csr.pem()?.into_bytes(),
                    });
                }
                OrderStatus::Invalid => {
                    return Err(CertshipError::Challenge(
                        "Order became invalid during finalization".to_string(),
                    ))
                }
                _ => {}
            }
        }

        Err(CertshipError::Challenge(
            "Timed out waiting for order finalization".to_string(),
        ))
    }
}

#[async_trait]
impl IssuanceProvider for AcmeIssuer {
    async fn obtain(&self, domain: &str, terms_accepted: bool) -> Result<CertificateBundle> {
        tracing::info!(
            "Requesting certificate for '{domain}' from {}",
            self.directory_url
        );

        let account = self.register_account(terms_accepted).await?;
        let identifiers = [Identifier::Dns(domain.to_string())];
        let mut order = account
            .new_order(&NewOrder {
                identifiers: &identifiers,
            })
            .await?;

        self.solve_authorizations(&mut order).await?;
        self.finalize_order(&mut order, domain).await
    }
}

async fn validate_challenge(
    order: &mut Order,
    challenge: &Challenge,
    identifier: &Identifier,
    fqdn: &str,
    value: &str,
) -> Result<()> {
    dns::wait_for_propagation(fqdn, value).await?;
    order.set_challenge_ready(&challenge.url).await?;

    for _ in 0..AUTHORIZATION_ATTEMPTS {
        tokio::time::sleep(POLL_INTERVAL).await;
        let authorizations = order.authorizations().await?;
        let authz = authorizations
            .iter()
            .find(|a| &a.identifier == identifier)
            .ok_or_else(|| {
                CertshipError::Challenge("Authorization disappeared from order".to_string())
            })?;

        match authz.status {
            AuthorizationStatus::Valid => return Ok(()),
            AuthorizationStatus::Invalid => {
                return Err(CertshipError::Challenge(format!(
                    "Authorization failed for {identifier:?}"
                )))
            }
            _ => {}
        }
    }

    Err(CertshipError::Challenge(format!(
        "Timed out waiting for authorization of {identifier:?}"
    )))
}

/// Everything after the leaf in a CA-returned chain, re-encoded as PEM
fn issuer_chain(chain: &str) -> Result<Vec<u8>> {
    let blocks = decode_certificate_blocks(chain.as_bytes())?;
    Ok(blocks.iter().skip(1).flat_map(|b| b.bytes()).collect())
}
