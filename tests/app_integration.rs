use std::fs;
use std::path::Path;

use creamery::cli::{
    BackupCommand, Command, ConfigCommand, ExpenseCommand, GroupCommand, ItemArg, OrderCommand,
    ProductCommand, RateCommand,
};
use creamery::core::order::{OrderItems, OrderStatus, OrderTotals};
use creamery::store::Store;
use creamery::store::repository::Repositories;
use tracing::info;

mod test_utils {
    use std::fs;
    use std::path::Path;

    /// Writes a config file pointing the store at a directory-local data
    /// path and returns the config path.
    pub fn write_config(dir: &Path) -> String {
        let data_path = dir.join("data");
        let config_path = dir.join("config.yaml");
        fs::write(
            &config_path,
            format!(
                "currency: \"VES\"\ndata_path: \"{}\"\n",
                data_path.display()
            ),
        )
        .expect("Failed to write config file");
        config_path.to_str().unwrap().to_string()
    }
}

/// Opens the store for direct inspection. The handle must be dropped
/// before the next `run_command` call re-opens the keyspace.
fn open_repos(dir: &Path) -> Repositories {
    let store = Store::open(&dir.join("data")).expect("Failed to open store");
    Repositories::open(&store).expect("Failed to open repositories")
}

async fn run(config_path: &str, command: Command) -> anyhow::Result<()> {
    creamery::run_command(command, Some(config_path)).await
}

#[test_log::test(tokio::test)]
async fn test_full_retail_flow() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = test_utils::write_config(dir.path());

    // Seed catalog, rate and delivery fee through the CLI surface
    run(
        &config_path,
        Command::Group(GroupCommand::Add {
            name: "Tropical".to_string(),
            price: 5.0,
            cost: 2.0,
        }),
    )
    .await
    .unwrap();
    run(
        &config_path,
        Command::Product(ProductCommand::Add {
            id: 1,
            name: "Barquilla".to_string(),
            group: "Tropical".to_string(),
            stock: 5,
            image: None,
        }),
    )
    .await
    .unwrap();
    run(
        &config_path,
        Command::Rate(RateCommand::Set {
            rate: 40.0,
            date: Some("2024-05-01".parse().unwrap()),
        }),
    )
    .await
    .unwrap();
    run(
        &config_path,
        Command::Config(ConfigCommand::SetDelivery { fee: 1.0 }),
    )
    .await
    .unwrap();

    // Create the worked-example order: 3 units with delivery applied
    run(
        &config_path,
        Command::Order(OrderCommand::Create {
            items: vec![ItemArg {
                product_id: 1,
                quantity: 3,
            }],
            number: None,
            date: Some("2024-05-02".parse().unwrap()),
            no_delivery: false,
        }),
    )
    .await
    .unwrap();

    {
        let repos = open_repos(dir.path());
        let order = repos.orders.get(1).await.unwrap().unwrap();
        info!(?order.totals, "created order");
        assert_eq!(order.totals.investment_usd, 7.0);
        assert_eq!(order.totals.sale_usd, 15.0);
        assert_eq!(order.totals.profit_usd, 8.0);
        assert_eq!(order.totals.profit_local, Some(320.0));
        assert_eq!(order.status, OrderStatus::Active);
        assert_eq!(order.rate, 40.0);
    }

    // The inventory report runs against the same data
    run(&config_path, Command::Inventory).await.unwrap();

    // Receive the order: stock 5 -> 8, order closed
    run(&config_path, Command::Order(OrderCommand::Receive { id: 1 }))
        .await
        .unwrap();
    {
        let repos = open_repos(dir.path());
        assert_eq!(repos.products.get(1).await.unwrap().unwrap().stock, 8);
        let order = repos.orders.get(1).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Closed);
        assert!(order.received_at.is_some());
    }

    // A second receive is rejected and never double-increments
    let second = run(&config_path, Command::Order(OrderCommand::Receive { id: 1 })).await;
    assert!(second.is_err(), "receiving a closed order must fail");
    {
        let repos = open_repos(dir.path());
        assert_eq!(repos.products.get(1).await.unwrap().unwrap().stock, 8);
    }
}

#[test_log::test(tokio::test)]
async fn test_legacy_order_migration_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = test_utils::write_config(dir.path());

    run(
        &config_path,
        Command::Group(GroupCommand::Add {
            name: "Tropical".to_string(),
            price: 5.0,
            cost: 2.0,
        }),
    )
    .await
    .unwrap();
    run(
        &config_path,
        Command::Product(ProductCommand::Add {
            id: 1,
            name: "Barquilla".to_string(),
            group: "Tropical".to_string(),
            stock: 0,
            image: None,
        }),
    )
    .await
    .unwrap();

    // Seed a mapping-shaped order the way an old backup would have stored it
    {
        let repos = open_repos(dir.path());
        let legacy = creamery::core::order::Order {
            id: 1,
            number: "ORD-0001".to_string(),
            date: "2023-09-15".parse().unwrap(),
            rate: 35.0,
            status: OrderStatus::Active,
            delivery_applied: true,
            delivery_fee: 1.0,
            items: OrderItems::Legacy(std::collections::BTreeMap::from([(
                "1".to_string(),
                3,
            )])),
            totals: OrderTotals::zero(),
            received_at: None,
            migrated_at: None,
        };
        repos.orders.put(&legacy).await.unwrap();
    }

    run(&config_path, Command::Order(OrderCommand::Migrate))
        .await
        .unwrap();

    let after_first = {
        let repos = open_repos(dir.path());
        let order = repos.orders.get(1).await.unwrap().unwrap();
        assert!(!order.items.is_legacy());
        assert_eq!(order.items.lines().unwrap().len(), 1);
        // Re-priced at migration time, local totals at the stored rate
        assert_eq!(order.totals.investment_usd, 7.0);
        assert_eq!(order.totals.profit_usd, 8.0);
        assert_eq!(order.totals.profit_local, Some(8.0 * 35.0));
        assert!(order.migrated_at.is_some());
        serde_json::to_string(&order).unwrap()
    };

    // A second run must change nothing
    run(&config_path, Command::Order(OrderCommand::Migrate))
        .await
        .unwrap();
    {
        let repos = open_repos(dir.path());
        let order = repos.orders.get(1).await.unwrap().unwrap();
        assert_eq!(serde_json::to_string(&order).unwrap(), after_first);
    }
}

#[test_log::test(tokio::test)]
async fn test_inventory_report_with_orphans_and_missing_rate() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = test_utils::write_config(dir.path());

    // A product whose group does not exist, with stock
    run(
        &config_path,
        Command::Product(ProductCommand::Add {
            id: 9,
            name: "Suelto".to_string(),
            group: "Fantasma".to_string(),
            stock: 4,
            image: None,
        }),
    )
    .await
    .unwrap();

    // No rate configured anywhere: the report still renders USD totals
    run(&config_path, Command::Inventory).await.unwrap();

    let repos = open_repos(dir.path());
    assert_eq!(repos.current_rate().await.unwrap(), None);
}

#[test_log::test(tokio::test)]
async fn test_expense_entry_shares_rate_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = test_utils::write_config(dir.path());

    run(&config_path, Command::Rate(RateCommand::Fallback { rate: 40.0 }))
        .await
        .unwrap();
    run(
        &config_path,
        Command::Expense(ExpenseCommand::Add {
            description: "gas refill".to_string(),
            amount: 400.0,
            category: "utilities".to_string(),
            method: "cash".to_string(),
            date: Some("2024-05-01".parse().unwrap()),
        }),
    )
    .await
    .unwrap();

    let repos = open_repos(dir.path());
    let expenses = repos.expenses.all().await.unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].amount_usd, Some(10.0));
}

#[test_log::test(tokio::test)]
async fn test_backup_round_trip_between_stores() {
    let source_dir = tempfile::tempdir().unwrap();
    let target_dir = tempfile::tempdir().unwrap();
    let source_config = test_utils::write_config(source_dir.path());
    let target_config = test_utils::write_config(target_dir.path());
    let backup_file = source_dir.path().join("backup.json");

    run(
        &source_config,
        Command::Group(GroupCommand::Add {
            name: "Tropical".to_string(),
            price: 5.0,
            cost: 2.0,
        }),
    )
    .await
    .unwrap();
    run(
        &source_config,
        Command::Product(ProductCommand::Add {
            id: 1,
            name: "Barquilla".to_string(),
            group: "Tropical".to_string(),
            stock: 5,
            image: None,
        }),
    )
    .await
    .unwrap();
    run(
        &source_config,
        Command::Rate(RateCommand::Set {
            rate: 36.5,
            date: Some("2024-05-01".parse().unwrap()),
        }),
    )
    .await
    .unwrap();

    run(
        &source_config,
        Command::Backup(BackupCommand::Export {
            file: backup_file.clone(),
        }),
    )
    .await
    .unwrap();
    assert!(fs::read_to_string(&backup_file).unwrap().contains("Barquilla"));

    run(
        &target_config,
        Command::Backup(BackupCommand::Import { file: backup_file }),
    )
    .await
    .unwrap();

    let repos = open_repos(target_dir.path());
    assert_eq!(repos.products.all().await.unwrap().len(), 1);
    assert_eq!(repos.groups.all().await.unwrap().len(), 1);
    assert_eq!(repos.current_rate().await.unwrap(), Some(36.5));
}
