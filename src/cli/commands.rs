use crate::acme::client::AcmeIssuer;
use crate::acme::dns::Route53Solver;
use crate::cert::cache::CertificateCache;
use crate::cert::service::CertificateService;
use crate::cli::args::{CacheCommands, Cli, Commands, ObtainArgs};
use crate::cli::completions::handle_completion_command;
use crate::utils::errors::{CertshipError, Result};
use crate::utils::paths::CertshipPaths;
use crate::utils::validate;
use crate::writer::{ResultWriter, S3Writer, StdoutWriter};
use std::io;
use std::path::PathBuf;

/// Validated run configuration for `obtain`, built once from the parsed
/// CLI and passed explicitly; business logic never reads the environment.
pub struct ObtainOptions {
    pub domain: String,
    pub email: String,
    pub terms_accepted: bool,
    pub force: bool,
    pub to_s3: bool,
    pub bucket: Option<String>,
    pub project_dir: PathBuf,
    pub directory_url: String,
}

impl ObtainOptions {
    /// Validate raw CLI input. Runs before any cache or network access.
    pub fn from_args(args: ObtainArgs) -> Result<Self> {
        validate::validate_domain(&args.domain)?;
        validate::validate_email(&args.email)?;

        if !args.accept_terms {
            return Err(CertshipError::InvalidInput(
                "you must accept the terms of service in order to use certship".to_string(),
            ));
        }
        if args.to_s3 && args.bucket.is_none() {
            return Err(CertshipError::InvalidInput(
                "--bucket is required when --to-s3 is set".to_string(),
            ));
        }

        let project_dir = match args.project_dir {
            Some(dir) => dir,
            None => CertshipPaths::project_dir()?,
        };

        Ok(Self {
            domain: args.domain,
            email: args.email,
            terms_accepted: args.accept_terms,
            force: args.force,
            to_s3: args.to_s3,
            bucket: args.bucket,
            project_dir,
            directory_url: args.directory_url,
        })
    }
}

pub async fn handle_command(cli: Cli) -> Result<()> {
    // Initialize logging - always to stderr
    if !cli.quiet {
        let log_level = match cli.verbose {
            0 => "certship=warn",  // Default: warnings only
            1 => "certship=info",  // -v: info level
            2 => "certship=debug", // -vv: debug level
            _ => "certship=trace", // -vvv+: trace level
        };

        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(log_level)
            .init();
    }

    match cli.command {
        Commands::Obtain(args) => handle_obtain(args).await,
        Commands::Cache { command } => handle_cache_command(command),
        Commands::Completion { shell } => handle_completion_command(shell),
    }
}

async fn handle_obtain(args: ObtainArgs) -> Result<()> {
    let opts = ObtainOptions::from_args(args)?;
    let cache = CertificateCache::new(opts.project_dir.clone())?;

    let solver = Route53Solver::new().await;
    let issuer = AcmeIssuer::new(&opts.email, &opts.directory_url, Box::new(solver));
    let service = CertificateService::new(&cache, &issuer);

    let bundle = service
        .obtain(&opts.domain, opts.terms_accepted, opts.force)
        .await?;

    let writer: Box<dyn ResultWriter> = match opts.bucket {
        Some(ref bucket) if opts.to_s3 => Box::new(S3Writer::new(bucket.clone()).await),
        _ => Box::new(StdoutWriter),
    };
    writer.write(&bundle).await
}

fn handle_cache_command(command: CacheCommands) -> Result<()> {
    let cache = CertificateCache::new(CertshipPaths::project_dir()?)?;

    match command {
        CacheCommands::List => {
            for entry in cache.entries()? {
                let expiry = entry
                    .not_after
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                println!("{}\t{}\t{}", entry.domain, expiry, entry.path.display());
            }
            Ok(())
        }
        CacheCommands::Clear { domain } => {
            let removed = cache.clear(domain.as_deref())?;
            println!("Removed {removed} cached bundle(s)");
            Ok(())
        }
    }
}
