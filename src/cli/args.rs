use crate::acme::client::LETS_ENCRYPT_PRODUCTION;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "certship")]
#[command(version = "1.0.0")]
#[command(about = "Obtain TLS certificates over ACME, cache them locally, print or ship to S3")]
#[command(long_about = None)]
pub struct Cli {
    /// Enable verbose logging (repeat for more verbosity: -v INFO, -vv DEBUG, -vvv TRACE)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Obtain a certificate for a domain
    Obtain(ObtainArgs),
    /// Cache management
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Args)]
pub struct ObtainArgs {
    /// Domain to request a certificate for (a leading wildcard label is allowed)
    pub domain: String,

    /// Contact email used to register the ACME account
    #[arg(short, long, env = "CERTSHIP_EMAIL")]
    pub email: String,

    /// Accept the CA terms of service <https://letsencrypt.org/repository/>
    #[arg(short, long, env = "CERTSHIP_ACCEPT_TERMS")]
    pub accept_terms: bool,

    /// Ignore any cached bundle and request a fresh certificate
    #[arg(short, long)]
    pub force: bool,

    /// Upload the packaged bundle to S3 instead of printing it
    #[arg(long)]
    pub to_s3: bool,

    /// Destination bucket (required with --to-s3)
    #[arg(short, long, env = "CERTSHIP_BUCKET")]
    pub bucket: Option<String>,

    /// Directory holding cached certificate bundles (default: ~/.certship)
    #[arg(long, env = "CERTSHIP_PROJECT_DIR")]
    pub project_dir: Option<PathBuf>,

    /// ACME directory URL
    #[arg(long, env = "CERTSHIP_DIRECTORY_URL", default_value = LETS_ENCRYPT_PRODUCTION)]
    pub directory_url: String,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// List cached certificate bundles
    List,
    /// Remove cached bundles (all of them, or a single domain)
    Clear {
        /// Domain whose cache entry should be removed
        domain: Option<String>,
    },
}
