//! FinFlow main entry point

use clap::Parser;
use finflow_api::start_server;
use finflow_config::Config;
use std::path::PathBuf;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "finflow")]
#[command(author = "FinFlow Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Bookkeeping web frontend: sign-in, dashboard and statement upload", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let rt = Runtime::new()?;

    rt.block_on(async {
        let config = match Config::load_async(args.config.clone()).await {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}:\n{}", args.config.display(), e.to_details());
                std::process::exit(1);
            }
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.logging.level))
            .init();

        log::info!(
            "Config loaded: auth={}, api={}, transactions from {}",
            config.auth.url,
            config.api.base_url,
            config.transactions.source
        );

        start_server(config).await
    })
}
