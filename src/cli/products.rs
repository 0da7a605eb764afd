use super::{ProductCommand, ui};
use crate::core::catalog::Product;
use crate::store::repository::Repositories;
use anyhow::Result;
use chrono::Utc;
use comfy_table::Cell;

pub async fn run(repos: &Repositories, command: ProductCommand) -> Result<()> {
    match command {
        ProductCommand::Add {
            id,
            name,
            group,
            stock,
            image,
        } => {
            if repos.groups.find_by_name(&group).await?.is_none() {
                // Allowed, but the operator should know the product will be
                // orphaned until the group exists
                println!(
                    "{}",
                    ui::style_text(
                        &format!("Note: no group named \"{group}\" exists yet"),
                        ui::StyleType::Warning
                    )
                );
            }
            let product = Product {
                id,
                name,
                group,
                stock,
                visible: true,
                image_path: image,
                created_at: Utc::now(),
            };
            repos.products.insert(&product).await?;
            println!("Added product {} \"{}\"", product.id, product.name);
        }
        ProductCommand::List => {
            let products = repos.products.all().await?;
            if products.is_empty() {
                println!("No products in the catalog.");
                return Ok(());
            }

            let mut table = ui::new_styled_table();
            table.set_header(vec![
                ui::header_cell("Id"),
                ui::header_cell("Name"),
                ui::header_cell("Group"),
                ui::header_cell("Stock"),
                ui::header_cell("Visible"),
            ]);
            for product in &products {
                table.add_row(vec![
                    Cell::new(product.id),
                    Cell::new(&product.name),
                    Cell::new(&product.group),
                    Cell::new(product.stock),
                    Cell::new(if product.visible { "yes" } else { "no" }),
                ]);
            }
            println!("{table}");
        }
        ProductCommand::Hide { id } => {
            let product = repos.products.set_visible(id, false).await?;
            println!("Product {} \"{}\" hidden from the inventory report", id, product.name);
        }
        ProductCommand::Show { id } => {
            let product = repos.products.set_visible(id, true).await?;
            println!("Product {} \"{}\" visible again", id, product.name);
        }
        ProductCommand::Rm { id } => {
            let product = repos.delete_product(id).await?;
            println!("Deleted product {} \"{}\"", id, product.name);
        }
    }
    Ok(())
}
