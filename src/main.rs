//! Binary entrypoint for the StarMUD world server.
//!
//! Commands:
//! - `start` - load the world, run the simulation tick until Ctrl-C, then save
//! - `init` - write a starter `config.toml` and create the world directory skeleton
//! - `status` - load the world and print collection counts as JSON
//!
//! See the library crate docs for module-level details: `starmud::`.
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use starmud::config::Config;
use starmud::world::{spawn_tick_loop, AccountStore, WorldStore, WorldStoreBuilder, YamlGateway};

#[derive(Parser)]
#[command(name = "starmud")]
#[command(about = "Authoritative world store and simulation tick for a space-opera MUD")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the world and run the simulation
    Start,
    /// Write a default configuration and world layout
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
    /// Load the world and print collection counts
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            info!("Starting StarMUD v{}", env!("CARGO_PKG_VERSION"));

            let accounts = AccountStore::open(&config.accounts.db_path)?;
            info!("{} accounts on record", accounts.len());

            let store = Arc::new(build_store(&config));
            let loader = Arc::clone(&store);
            let counts = tokio::task::spawn_blocking(move || loader.load())
                .await
                .map_err(|e| anyhow!("world load task failed: {}", e))??;
            info!(
                "world loaded: {} areas, {} rooms, {} mobs, {} items, {} ships",
                counts.areas, counts.rooms, counts.mobs, counts.items, counts.ships
            );
            store.reset_all();

            let ticker = spawn_tick_loop(Arc::clone(&store), config.tick.settings());
            tokio::signal::ctrl_c().await?;
            info!("Received shutdown signal");
            let ticks = ticker.shutdown().await;
            info!("simulation stopped after {} ticks", ticks);

            let saver = Arc::clone(&store);
            let report = tokio::task::spawn_blocking(move || saver.save())
                .await
                .map_err(|e| anyhow!("final save task failed: {}", e))?;
            if !report.is_clean() {
                warn!(
                    "final save left {} objects unwritten: {}",
                    report.failed.len(),
                    report.failed.join(", ")
                );
            }
        }
        Commands::Init { force } => {
            init_logging(&None, cli.verbose);
            if !force && tokio::fs::try_exists(&cli.config).await.unwrap_or(false) {
                return Err(anyhow!(
                    "{} already exists (use --force to overwrite)",
                    cli.config
                ));
            }
            info!("Initializing new StarMUD configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);

            let config = Config::default();
            YamlGateway::new(&config.world.data_dir, &config.world.docs_dir).init_layout()?;
            AccountStore::open(&config.accounts.db_path)?;
            info!("World layout created under {}", config.world.data_dir);
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            let store = build_store(&config);
            let counts = store.load()?;
            let accounts = AccountStore::open(&config.accounts.db_path)?;
            let payload = serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "world": counts,
                "accounts": accounts.len(),
                "metrics": starmud::metrics::snapshot(),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }

    Ok(())
}

fn build_store(config: &Config) -> WorldStore {
    let gateway = YamlGateway::new(&config.world.data_dir, &config.world.docs_dir);
    WorldStoreBuilder::new(Arc::new(gateway))
        .damage_rules(config.rules.damage_rules())
        .corpse_decay(config.tick.corpse_decay())
        .build()
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let configured = config
        .as_ref()
        .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    let base_level = match verbosity {
        0 => configured,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Echo to the console only when attached to a terminal
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
