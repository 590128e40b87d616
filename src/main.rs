use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url_shortener::config::{Config, Overrides};
use url_shortener::server;

/// URL shortener service.
///
/// Every flag overrides the environment variable named in its help.
#[derive(Parser)]
#[command(name = "url-shortener", version, about)]
struct Args {
    /// Bind address, host:port (SERVER_ADDRESS)
    #[arg(short = 'a', long)]
    address: Option<String>,

    /// Prefix of returned short URLs (BASE_URL)
    #[arg(short = 'b', long)]
    base_url: Option<String>,

    /// Append-only storage file (FILE_STORAGE_PATH)
    #[arg(short = 'f', long)]
    file_storage_path: Option<PathBuf>,

    /// PostgreSQL connection string (DATABASE_URL)
    #[arg(short = 'd', long)]
    database_dsn: Option<String>,
}

impl From<Args> for Overrides {
    fn from(args: Args) -> Self {
        Self {
            server_address: args.address,
            base_url: args.base_url,
            file_storage_path: args.file_storage_path,
            database_url: args.database_dsn,
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = Config::from_env()?;
    config.apply(args.into());
    config.validate()?;

    init_tracing(&config);
    config.print_summary();

    server::run(config).await
}
