//! phpIPAM network automation CLI
//!
//! # Usage
//!
//! ```bash
//! phpipam-netops landing-zone eu-west-1 templates/landingzone.yaml --cvpn yes
//! phpipam-netops spoke us-east-1 payments-prod templates/spoke.yaml --size 21
//! phpipam-netops locations export --output locations.csv
//! phpipam-netops locations import locations.csv
//! phpipam-netops --format yaml regions
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use phpipam_netops::commands::{self, Session};
use phpipam_netops::topology::SPOKE_PREFIX;
use phpipam_netops::{Config, Envelope, OutputFormat};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "phpipam-netops")]
#[command(version)]
#[command(about = "Subnet provisioning and location sync against phpIPAM", long_about = None)]
struct Cli {
    /// Config file (default: ./config.json, then /etc/netops/phpipam/config.json)
    #[arg(long, env = "PHPIPAM_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate shared services and vEdge VPCs for a region
    LandingZone {
        region: String,
        /// CloudFormation template rendered into `yaml`
        template: Option<PathBuf>,
        /// Add the CVPN subnet to shared services
        #[arg(long, value_enum, default_value_t = Toggle::No)]
        cvpn: Toggle,
    },
    /// Allocate a spoke VPC for an account
    Spoke {
        region: String,
        account: String,
        /// Buildspec template rendered into `buildspec`
        template: Option<PathBuf>,
        /// VPC prefix length
        #[arg(long, default_value_t = SPOKE_PREFIX, value_parser = clap::value_parser!(u8).range(16..=24))]
        size: u8,
    },
    /// Sync location records with CSV
    Locations {
        #[command(subcommand)]
        action: LocationCommands,
    },
    /// Show the known region table
    Regions,
}

#[derive(Subcommand)]
enum LocationCommands {
    /// Write every location to CSV
    Export {
        #[arg(short, long, default_value = commands::locations::DEFAULT_EXPORT_FILE)]
        output: PathBuf,
    },
    /// Create a location per CSV row
    Import { infile: PathBuf },
    /// Patch existing locations by id
    Update { infile: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Toggle {
    Yes,
    No,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let started = Instant::now();
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            cli.format.print(&Envelope::from_error(&e));
            std::process::exit(1);
        }
    };
    let session = Session::new(&config);

    let result = match cli.command {
        Commands::LandingZone { region, template, cvpn } => {
            commands::landing_zone::run(&session, &region, template.as_deref(), cvpn == Toggle::Yes).await
        }
        Commands::Spoke { region, account, template, size } => {
            commands::spoke::run(&session, &region, &account, template.as_deref(), size).await
        }
        Commands::Locations { action } => match action {
            LocationCommands::Export { output } => commands::locations::export(&session, &output).await,
            LocationCommands::Import { infile } => commands::locations::import(&session, &infile).await,
            LocationCommands::Update { infile } => commands::locations::update(&session, &infile).await,
        },
        Commands::Regions => Ok(commands::regions::run(&session)),
    };

    let envelope = result.unwrap_or_else(|e| {
        tracing::error!("{}", e);
        Envelope::from_error(&e)
    });
    let fatal = envelope.fatal;
    cli.format.print(&envelope.timed(started));
    if fatal {
        std::process::exit(1);
    }
}
