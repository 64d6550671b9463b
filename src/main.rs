//! AWS Regions CLI
//!
//! Lists the AWS regions usable with a set of credentials, or checks a single
//! region. Credentials come from flags/environment, from Google Secret Manager
//! (feature `gsm`), or the default AWS credential chain.
//!
//! # Usage
//! ```bash
//! # Regions usable with the default credential chain
//! aws-regions list
//!
//! # Check a region with explicit keys
//! AWS_REGIONS_ACCESS_KEY_ID=AKIA... AWS_REGIONS_SECRET_ACCESS_KEY=... \
//!     aws-regions check ap-east-1
//!
//! # Skip the API entirely
//! aws-regions --fixed eu-west-1,ap-southeast-1 check eu-west-1
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::future::Future;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use aws_regions::{AwsCredentialSet, Ec2ListerConfig, RegionAccessor, RequestContext};

// ============================================================
// CLI Definition
// ============================================================

#[derive(Parser)]
#[command(name = "aws-regions")]
#[command(about = "List the AWS regions usable with a set of credentials", long_about = None)]
#[command(version)]
struct Cli {
    /// Use this comma separated region list instead of calling AWS
    #[arg(long, value_delimiter = ',', global = true)]
    fixed: Option<Vec<String>>,

    /// Identifier the credentials are registered under
    #[arg(long, default_value = "cli", env = "AWS_REGIONS_CREDENTIAL_ID")]
    credential_id: String,

    /// AWS access key id (default credential chain when omitted)
    #[arg(long, env = "AWS_REGIONS_ACCESS_KEY_ID")]
    access_key_id: Option<String>,

    /// AWS secret access key
    #[arg(long, env = "AWS_REGIONS_SECRET_ACCESS_KEY", hide_env_values = true)]
    secret_access_key: Option<String>,

    /// AWS session token for temporary credentials
    #[arg(long, env = "AWS_REGIONS_SESSION_TOKEN", hide_env_values = true)]
    session_token: Option<String>,

    /// Region whose EC2 endpoint is queried
    #[arg(long, env = "AWS_REGIONS_ENDPOINT_REGION")]
    endpoint_region: Option<String>,

    /// Named profile from the shared AWS config
    #[arg(long, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// GCP Project ID for Secret Manager
    #[cfg(feature = "gsm")]
    #[arg(long, env = "GCP_PROJECT_ID", requires = "secret_name")]
    gcp_project: Option<String>,

    /// Secret holding the AWS credential set as JSON
    #[cfg(feature = "gsm")]
    #[arg(long, requires = "gcp_project")]
    secret_name: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List usable regions
    List {
        /// Print as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Check whether a region is usable (exit code 1 when it is not)
    Check {
        /// Region name (e.g., eu-west-1)
        region: String,
    },
}

impl Cli {
    async fn credential_set(&self) -> Result<AwsCredentialSet> {
        #[cfg(feature = "gsm")]
        if let (Some(project), Some(secret)) = (&self.gcp_project, &self.secret_name) {
            info!("🔐 Fetching AWS credentials from GSM (project: {})", project);
            let sm = aws_regions::SecretManager::new(project).await?;
            return sm
                .load_credential_set(secret)
                .await
                .context("Failed to load AWS credentials from GSM");
        }

        let set = match (&self.access_key_id, &self.secret_access_key) {
            (Some(key), Some(secret)) => {
                AwsCredentialSet::new(&self.credential_id, key, secret)
            }
            (None, None) => {
                debug!("No static keys supplied, using the default credential chain");
                AwsCredentialSet::default_chain(&self.credential_id)
            }
            _ => bail!("--access-key-id and --secret-access-key must be given together"),
        };

        Ok(match &self.session_token {
            Some(token) => set.session_token(token),
            None => set,
        })
    }
}

/// Cancel `token` once `signal` completes
fn cancel_on<F>(token: CancellationToken, signal: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        signal.await;
        token.cancel();
    });
}

// ============================================================
// Main Entry Point
// ============================================================

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let accessor = RegionAccessor::ec2(Ec2ListerConfig {
        endpoint_region: cli.endpoint_region.clone(),
        profile: cli.profile.clone(),
    });

    let token = CancellationToken::new();
    cancel_on(token.clone(), async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => warn!("Interrupted, cancelling"),
            // No handler means no interrupt, never cancel
            Err(_) => std::future::pending::<()>().await,
        }
    });
    let root = RequestContext::with_cancellation(token);
    let ctx = match &cli.fixed {
        Some(regions) => {
            info!("📌 Using {} fixed regions", regions.len());
            accessor.with_fixed_regions(&root, regions.iter().cloned()).await
        }
        None => {
            let set = cli.credential_set().await?;
            accessor
                .with_credentials(&root, set)
                .await
                .context("Failed to register AWS credentials")?
        }
    };

    match &cli.command {
        Commands::List { json } => {
            let regions = accessor.usable_regions(&ctx).await?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&regions)?);
            } else {
                for region in &regions {
                    println!("{}", region);
                }
            }

            info!("✅ {} usable regions", regions.len());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Check { region } => {
            if accessor.is_usable(&ctx, region).await? {
                println!("✅ {} is usable", region);
                Ok(ExitCode::SUCCESS)
            } else {
                println!("❌ {} is not usable", region);
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
