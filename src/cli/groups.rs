use super::{GroupCommand, ui, validate_money};
use crate::store::repository::Repositories;
use anyhow::Result;
use comfy_table::Cell;

pub async fn run(repos: &Repositories, command: GroupCommand) -> Result<()> {
    match command {
        GroupCommand::Add { name, price, cost } => {
            let price = validate_money("price", price)?;
            let cost = validate_money("cost", cost)?;
            if cost > price {
                // Soft invariant: warned, never enforced
                println!(
                    "{}",
                    ui::style_text(
                        &format!("Warning: cost {cost:.2} exceeds price {price:.2}"),
                        ui::StyleType::Warning
                    )
                );
            }
            let group = repos.groups.create(&name, price, cost).await?;
            println!("Added group {} \"{}\"", group.id, group.name);
        }
        GroupCommand::List => {
            let groups = repos.groups.all().await?;
            if groups.is_empty() {
                println!("No pricing groups defined.");
                return Ok(());
            }

            let mut table = ui::new_styled_table();
            table.set_header(vec![
                ui::header_cell("Id"),
                ui::header_cell("Name"),
                ui::header_cell("Unit price ($)"),
                ui::header_cell("Unit cost ($)"),
                ui::header_cell("Margin ($)"),
            ]);
            for group in &groups {
                table.add_row(vec![
                    Cell::new(group.id),
                    Cell::new(&group.name),
                    ui::money_cell(group.unit_price),
                    ui::money_cell(group.unit_cost),
                    ui::profit_cell(group.unit_price - group.unit_cost),
                ]);
            }
            println!("{table}");
        }
        GroupCommand::Set { name, price, cost } => {
            let mut group = repos
                .groups
                .find_by_name(&name)
                .await?
                .ok_or_else(|| crate::core::error::StoreError::GroupNotFound { name })?;
            if let Some(price) = price {
                group.unit_price = validate_money("price", price)?;
            }
            if let Some(cost) = cost {
                group.unit_cost = validate_money("cost", cost)?;
            }
            if group.unit_cost > group.unit_price {
                println!(
                    "{}",
                    ui::style_text(
                        &format!(
                            "Warning: cost {:.2} exceeds price {:.2}",
                            group.unit_cost, group.unit_price
                        ),
                        ui::StyleType::Warning
                    )
                );
            }
            repos.groups.update(&group).await?;
            println!(
                "Group \"{}\" now sells at ${:.2} (cost ${:.2})",
                group.name, group.unit_price, group.unit_cost
            );
        }
        GroupCommand::Rm { name } => {
            let group = repos.delete_group(&name).await?;
            println!("Deleted group \"{}\"", group.name);
        }
    }
    Ok(())
}
