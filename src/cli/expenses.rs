use super::{ExpenseCommand, ui, validate_positive};
use crate::core::expense::{Expense, ExpenseCategory, PaymentMethod};
use crate::store::repository::Repositories;
use anyhow::Result;
use chrono::Local;
use comfy_table::Cell;

pub async fn run(repos: &Repositories, currency: &str, command: ExpenseCommand) -> Result<()> {
    match command {
        ExpenseCommand::Add {
            description,
            amount,
            category,
            method,
            date,
        } => {
            let amount = validate_positive("amount", amount)?;
            let category: ExpenseCategory = category.parse()?;
            let method: PaymentMethod = method.parse()?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());

            let rate = repos.current_rate().await?;
            if rate.is_none() {
                println!(
                    "{}",
                    ui::style_text(
                        "Exchange rate not configured; USD amount left unset",
                        ui::StyleType::Warning
                    )
                );
            }

            let id = repos.expenses.next_id().await?;
            let expense = Expense::new(id, description, amount, category, date, method, rate);
            repos.expenses.put(&expense).await?;
            println!("Recorded expense {} \"{}\"", expense.id, expense.description);
        }
        ExpenseCommand::List => {
            let expenses = repos.expenses.all().await?;
            if expenses.is_empty() {
                println!("No expenses recorded.");
                return Ok(());
            }

            let mut table = ui::new_styled_table();
            table.set_header(vec![
                ui::header_cell("Id"),
                ui::header_cell("Date"),
                ui::header_cell("Description"),
                ui::header_cell("Category"),
                ui::header_cell("Method"),
                ui::header_cell(&format!("Amount ({currency})")),
                ui::header_cell("Amount ($)"),
            ]);
            let mut total_local = 0.0;
            for expense in &expenses {
                total_local += expense.amount_local;
                table.add_row(vec![
                    Cell::new(expense.id),
                    Cell::new(expense.date),
                    Cell::new(&expense.description),
                    Cell::new(expense.category.to_string()),
                    Cell::new(expense.payment_method.to_string()),
                    ui::money_cell(expense.amount_local),
                    ui::format_optional_cell(expense.amount_usd, |v| format!("{v:.2}")),
                ]);
            }
            println!("{table}");
            println!(
                "\nTotal ({}): {}",
                ui::style_text(currency, ui::StyleType::TotalLabel),
                ui::style_text(&format!("{total_local:.2}"), ui::StyleType::TotalValue)
            );
        }
    }
    Ok(())
}
