use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::BackupCommand;
use crate::core::catalog::{Group, Product};
use crate::core::expense::Expense;
use crate::core::order::Order;
use crate::core::rate::RateEntry;
use crate::store::repository::Repositories;

/// Whole-store snapshot, treated as an opaque backup.
///
/// Orders inside a snapshot may still carry legacy-shaped items; they are
/// imported untouched and expanded by `order migrate`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BackupFile {
    pub products: Vec<Product>,
    pub groups: Vec<Group>,
    pub orders: Vec<Order>,
    pub expenses: Vec<Expense>,
    pub rates: Vec<RateEntry>,
    pub config: BTreeMap<String, String>,
}

pub async fn run(repos: &Repositories, command: BackupCommand) -> Result<()> {
    match command {
        BackupCommand::Export { file } => export(repos, &file).await,
        BackupCommand::Import { file } => import(repos, &file).await,
    }
}

async fn export(repos: &Repositories, file: &Path) -> Result<()> {
    let backup = BackupFile {
        products: repos.products.all().await?,
        groups: repos.groups.all().await?,
        orders: repos.orders.all().await?,
        expenses: repos.expenses.all().await?,
        rates: repos.rates.all().await?,
        config: repos.config.entries().await?.into_iter().collect(),
    };

    let json = serde_json::to_string_pretty(&backup)?;
    fs::write(file, json)
        .with_context(|| format!("Failed to write backup to {}", file.display()))?;
    println!(
        "Exported {} product(s), {} group(s), {} order(s), {} expense(s), {} rate entries to {}",
        backup.products.len(),
        backup.groups.len(),
        backup.orders.len(),
        backup.expenses.len(),
        backup.rates.len(),
        file.display()
    );
    Ok(())
}

async fn import(repos: &Repositories, file: &Path) -> Result<()> {
    let json = fs::read_to_string(file)
        .with_context(|| format!("Failed to read backup from {}", file.display()))?;
    let backup: BackupFile = serde_json::from_str(&json)
        .with_context(|| format!("Not a valid backup file: {}", file.display()))?;

    let config: Vec<(String, String)> = backup
        .config
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    repos.products.restore(&backup.products).await?;
    repos.groups.restore(&backup.groups).await?;
    repos.orders.restore(&backup.orders).await?;
    repos.expenses.restore(&backup.expenses).await?;
    repos.rates.restore(&backup.rates).await?;
    repos.config.restore(&config).await?;
    println!(
        "Imported {} product(s), {} group(s), {} order(s), {} expense(s), {} rate entries",
        backup.products.len(),
        backup.groups.len(),
        backup.orders.len(),
        backup.expenses.len(),
        backup.rates.len(),
    );
    Ok(())
}
