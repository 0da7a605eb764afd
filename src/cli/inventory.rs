use super::ui;
use crate::core::inventory::{InventoryReport, valuate_inventory};
use crate::store::repository::Repositories;
use anyhow::Result;

/// Warnings shown before the rest is summarized into an overflow count.
const MAX_WARNINGS_SHOWN: usize = 3;

pub async fn run(repos: &Repositories, currency: &str) -> Result<()> {
    let (products, groups, rate) = futures::try_join!(
        repos.products.all(),
        repos.groups.all(),
        repos.current_rate(),
    )?;

    let report = valuate_inventory(&products, &groups, rate);
    print_report(&report, currency, rate);
    Ok(())
}

fn print_report(report: &InventoryReport, currency: &str, rate: Option<f64>) {
    println!(
        "{}\n",
        ui::style_text("Inventory valuation", ui::StyleType::Title)
    );

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell(""), ui::header_cell("Amount")]);
    table.add_row(vec![
        comfy_table::Cell::new("Investment (cost, USD)"),
        ui::money_cell(report.total_cost_usd),
    ]);
    table.add_row(vec![
        comfy_table::Cell::new("Estimated sale (USD)"),
        ui::money_cell(report.total_sale_usd),
    ]);
    table.add_row(vec![
        comfy_table::Cell::new("Potential profit (USD)"),
        ui::profit_cell(report.profit_usd),
    ]);
    table.add_row(vec![
        comfy_table::Cell::new(format!("Potential profit ({currency})")),
        ui::format_optional_cell(report.profit_local, |v| format!("{v:.2}")),
    ]);
    println!("{table}");

    match rate {
        Some(rate) => println!(
            "{}",
            ui::style_text(&format!("Rate applied: {rate:.2}"), ui::StyleType::Subtle)
        ),
        None => println!(
            "{}",
            ui::style_text(
                "Exchange rate not configured; local-currency totals unavailable",
                ui::StyleType::Warning
            )
        ),
    }

    println!(
        "{}",
        ui::style_text(
            &format!(
                "{} product(s) counted, {} hidden, {} orphaned",
                report.counted_products, report.hidden_count, report.orphan_count
            ),
            ui::StyleType::Subtle
        )
    );

    if !report.warnings.is_empty() {
        println!();
        for warning in report.warnings.iter().take(MAX_WARNINGS_SHOWN) {
            println!("{}", ui::style_text(&format!("⚠ {warning}"), ui::StyleType::Warning));
        }
        let overflow = report.warnings.len().saturating_sub(MAX_WARNINGS_SHOWN);
        if overflow > 0 {
            println!(
                "{}",
                ui::style_text(&format!("… and {overflow} more"), ui::StyleType::Subtle)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Product;
    use chrono::Utc;

    fn product(id: u32, group: &str, stock: u32) -> Product {
        Product {
            id,
            name: format!("product-{id}"),
            group: group.to_string(),
            stock,
            visible: true,
            image_path: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_run_against_seeded_store() {
        let repos = Repositories::in_memory();
        repos.groups.create("A", 5.0, 2.0).await.unwrap();
        repos.products.insert(&product(1, "A", 5)).await.unwrap();
        repos.config.set("tasa", "40").await.unwrap();

        // Worked example: cost 10, sale 25, profit 15, local 600
        let (products, groups, rate) = futures::try_join!(
            repos.products.all(),
            repos.groups.all(),
            repos.current_rate(),
        )
        .unwrap();
        let report = valuate_inventory(&products, &groups, rate);

        assert_eq!(report.total_cost_usd, 10.0);
        assert_eq!(report.profit_local, Some(600.0));

        run(&repos, "VES").await.unwrap();
    }
}
