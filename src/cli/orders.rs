use super::{ItemArg, OrderCommand, ui};
use crate::core::error::ValidationError;
use crate::core::order::{Order, OrderItems, OrderStatus};
use crate::core::valuation::{DeliveryCharge, build_order_lines, totals_from_lines};
use crate::store::repository::Repositories;
use anyhow::Result;
use chrono::{Local, NaiveDate, Utc};
use comfy_table::Cell;

pub async fn run(repos: &Repositories, currency: &str, command: OrderCommand) -> Result<()> {
    match command {
        OrderCommand::Create {
            items,
            number,
            date,
            no_delivery,
        } => create(repos, currency, &items, number, date, !no_delivery).await,
        OrderCommand::List => list(repos).await,
        OrderCommand::Show { id } => show(repos, currency, id).await,
        OrderCommand::Receive { id } => {
            let order = repos.receive_order(id, Utc::now()).await?;
            println!(
                "Order {} received; stock updated for {} line(s)",
                order.number,
                order.items.lines().map_or(0, |lines| lines.len())
            );
            Ok(())
        }
        OrderCommand::Migrate => migrate(repos).await,
    }
}

async fn create(
    repos: &Repositories,
    currency: &str,
    items: &[ItemArg],
    number: Option<String>,
    date: Option<NaiveDate>,
    delivery_applied: bool,
) -> Result<()> {
    let (products, groups, rate, delivery_fee) = futures::try_join!(
        repos.products.all(),
        repos.groups.all(),
        repos.current_rate(),
        repos.delivery_fee(),
    )?;

    let selections: Vec<(u32, u32)> = items.iter().map(|i| (i.product_id, i.quantity)).collect();
    let lines = build_order_lines(&selections, &products, &groups);
    if lines.is_empty() {
        return Err(ValidationError::new(
            "items",
            "no selection resolved to a product with positive quantity",
        )
        .into());
    }

    if delivery_applied && delivery_fee.is_none() {
        println!(
            "{}",
            ui::style_text("No delivery fee configured; none applied", ui::StyleType::Subtle)
        );
    }
    let delivery = DeliveryCharge {
        applied: delivery_applied,
        fee: delivery_fee,
    };
    let totals = totals_from_lines(&lines, rate, delivery);

    let id = repos.orders.next_id().await?;
    let order = Order {
        id,
        number: number.unwrap_or_else(|| format!("ORD-{id:04}")),
        date: date.unwrap_or_else(|| Local::now().date_naive()),
        rate: rate.unwrap_or(0.0),
        status: OrderStatus::Active,
        delivery_applied,
        delivery_fee: delivery_fee.unwrap_or(0.0),
        items: OrderItems::Canonical(lines),
        totals,
        received_at: None,
        migrated_at: None,
    };
    repos.orders.put(&order).await?;

    println!("Created order {}\n", order.number);
    print_order(&order, currency);
    Ok(())
}

async fn list(repos: &Repositories) -> Result<()> {
    let orders = repos.orders.all().await?;
    if orders.is_empty() {
        println!("No orders recorded.");
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Number"),
        ui::header_cell("Date"),
        ui::header_cell("Status"),
        ui::header_cell("Sale ($)"),
        ui::header_cell("Profit ($)"),
    ]);
    for order in &orders {
        let status = match order.status {
            OrderStatus::Active => "active",
            OrderStatus::Closed => "closed",
        };
        table.add_row(vec![
            Cell::new(order.id),
            Cell::new(&order.number),
            Cell::new(order.date),
            Cell::new(status),
            ui::money_cell(order.totals.sale_usd),
            ui::profit_cell(order.totals.profit_usd),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn show(repos: &Repositories, currency: &str, id: u64) -> Result<()> {
    let order = repos
        .orders
        .get(id)
        .await?
        .ok_or(crate::core::error::StoreError::OrderNotFound { id })?;
    print_order(&order, currency);
    Ok(())
}

async fn migrate(repos: &Repositories) -> Result<()> {
    let legacy_count = repos
        .orders
        .all()
        .await?
        .iter()
        .filter(|o| o.items.is_legacy())
        .count();
    if legacy_count == 0 {
        println!("No legacy orders to migrate.");
        return Ok(());
    }

    let pb = ui::new_progress_bar(legacy_count as u64, true);
    pb.set_message("Migrating orders...");
    let outcome = repos.migrate_orders(Utc::now(), &|| pb.inc(1)).await?;
    pb.finish_and_clear();

    println!(
        "Migrated {} order(s); {} already in canonical form",
        outcome.migrated, outcome.skipped
    );
    Ok(())
}

fn print_order(order: &Order, currency: &str) {
    println!(
        "Order {} - {} ({})",
        ui::style_text(&order.number, ui::StyleType::Title),
        order.date,
        match order.status {
            OrderStatus::Active => "active",
            OrderStatus::Closed => "closed",
        }
    );

    match &order.items {
        OrderItems::Canonical(lines) => {
            let mut table = ui::new_styled_table();
            table.set_header(vec![
                ui::header_cell("Product"),
                ui::header_cell("Group"),
                ui::header_cell("Qty"),
                ui::header_cell("Unit price ($)"),
                ui::header_cell("Line sale ($)"),
            ]);
            for line in lines {
                table.add_row(vec![
                    Cell::new(&line.product_name),
                    Cell::new(&line.group_name),
                    Cell::new(line.quantity),
                    ui::money_cell(line.unit_price),
                    ui::money_cell(line.line_sale_usd),
                ]);
            }
            println!("{table}");
        }
        OrderItems::Legacy(map) => {
            println!(
                "{}",
                ui::style_text(
                    &format!(
                        "{} legacy item(s); run `order migrate` to expand them",
                        map.len()
                    ),
                    ui::StyleType::Warning
                )
            );
        }
    }

    if order.delivery_applied {
        println!("Delivery: ${:.2}", order.delivery_fee);
    }

    let totals = &order.totals;
    println!(
        "Investment: {}  Sale: {}  Profit: {}",
        ui::style_text(&format!("${:.2}", totals.investment_usd), ui::StyleType::TotalLabel),
        ui::style_text(&format!("${:.2}", totals.sale_usd), ui::StyleType::TotalLabel),
        ui::style_text(&format!("${:.2}", totals.profit_usd), ui::StyleType::TotalValue),
    );
    match totals.profit_local {
        Some(profit) => println!(
            "Profit ({currency}): {}",
            ui::style_text(&format!("{profit:.2}"), ui::StyleType::TotalValue)
        ),
        None => println!(
            "{}",
            ui::style_text(
                "Local-currency totals unavailable (rate not configured)",
                ui::StyleType::Error
            )
        ),
    }
}
