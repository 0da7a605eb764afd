pub mod cli;
pub mod core;
pub mod store;

use anyhow::Result;
use tracing::{debug, info};

use cli::Command;
use core::config::AppConfig;
use store::Store;
use store::repository::Repositories;

pub async fn run_command(command: Command, config_path: Option<&str>) -> Result<()> {
    info!("Creamery starting...");

    if let Command::Setup = command {
        return cli::setup::setup();
    }

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let data_path = config.default_data_path()?;
    let store = Store::open(&data_path)?;
    let repos = Repositories::open(&store)?;

    match command {
        Command::Setup => unreachable!("Setup is handled before the store opens"),
        Command::Inventory => cli::inventory::run(&repos, &config.currency).await,
        Command::Product(cmd) => cli::products::run(&repos, cmd).await,
        Command::Group(cmd) => cli::groups::run(&repos, cmd).await,
        Command::Rate(cmd) => cli::rates::run(&repos, cmd).await,
        Command::Order(cmd) => cli::orders::run(&repos, &config.currency, cmd).await,
        Command::Expense(cmd) => cli::expenses::run(&repos, &config.currency, cmd).await,
        Command::Config(cmd) => cli::configure::run(&repos, &config, cmd).await,
        Command::Backup(cmd) => cli::backup::run(&repos, cmd).await,
    }
}
