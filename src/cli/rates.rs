use super::{RateCommand, ui, validate_positive};
use crate::store::repository::{Repositories, TASA_KEY};
use anyhow::Result;
use chrono::Local;
use comfy_table::Cell;

pub async fn run(repos: &Repositories, command: RateCommand) -> Result<()> {
    match command {
        RateCommand::Set { rate, date } => {
            let rate = validate_positive("rate", rate)?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let entry = repos.rates.add(date, rate).await?;
            println!("Recorded rate {:.2} for {}", entry.rate, entry.date);
        }
        RateCommand::Fallback { rate } => {
            let rate = validate_positive("rate", rate)?;
            repos.config.set(TASA_KEY, &rate.to_string()).await?;
            println!("Fallback rate set to {rate:.2}");
        }
        RateCommand::List => {
            let mut entries = repos.rates.all().await?;
            if entries.is_empty() {
                println!("No rate history recorded.");
                return Ok(());
            }
            entries.sort_by(|a, b| (b.date, b.id).cmp(&(a.date, a.id)));

            let mut table = ui::new_styled_table();
            table.set_header(vec![ui::header_cell("Date"), ui::header_cell("Rate")]);
            for entry in &entries {
                table.add_row(vec![
                    Cell::new(entry.date),
                    ui::money_cell(entry.rate),
                ]);
            }
            println!("{table}");
        }
        RateCommand::Current => match repos.current_rate().await? {
            Some(rate) => println!(
                "Current rate: {}",
                ui::style_text(&format!("{rate:.2}"), ui::StyleType::TotalValue)
            ),
            None => println!(
                "{}",
                ui::style_text("Exchange rate not configured", ui::StyleType::Warning)
            ),
        },
    }
    Ok(())
}
