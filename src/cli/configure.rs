use super::{ConfigCommand, ui, validate_money};
use crate::core::config::AppConfig;
use crate::store::repository::{DELIVERY_KEY, Repositories, TASA_KEY};
use anyhow::Result;
use comfy_table::Cell;

pub async fn run(repos: &Repositories, config: &AppConfig, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::SetDelivery { fee } => {
            let fee = validate_money("delivery fee", fee)?;
            repos.config.set(DELIVERY_KEY, &fee.to_string()).await?;
            println!("Delivery fee set to ${fee:.2}");
        }
        ConfigCommand::Show => {
            let delivery = repos.config.get_f64(DELIVERY_KEY).await?;
            let fallback = repos.config.get_f64(TASA_KEY).await?;
            let rate = repos.current_rate().await?;

            let mut table = ui::new_styled_table();
            table.set_header(vec![ui::header_cell("Setting"), ui::header_cell("Value")]);
            table.add_row(vec![
                Cell::new("Local currency"),
                Cell::new(&config.currency),
            ]);
            table.add_row(vec![
                Cell::new("Delivery fee ($)"),
                ui::format_optional_cell(delivery, |v| format!("{v:.2}")),
            ]);
            table.add_row(vec![
                Cell::new("Fallback rate"),
                ui::format_optional_cell(fallback, |v| format!("{v:.2}")),
            ]);
            table.add_row(vec![
                Cell::new("Resolved rate"),
                ui::format_optional_cell(rate, |v| format!("{v:.2}")),
            ]);
            println!("{table}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ValidationError;

    #[tokio::test]
    async fn test_set_delivery_round_trips() {
        let repos = Repositories::in_memory();

        run(&repos, &AppConfig::default(), ConfigCommand::SetDelivery { fee: 1.5 })
            .await
            .unwrap();

        assert_eq!(repos.delivery_fee().await.unwrap(), Some(1.5));
    }

    #[tokio::test]
    async fn test_negative_delivery_fee_is_rejected() {
        let repos = Repositories::in_memory();

        let err = run(
            &repos,
            &AppConfig::default(),
            ConfigCommand::SetDelivery { fee: -2.0 },
        )
        .await
        .unwrap_err();

        assert!(err.downcast_ref::<ValidationError>().is_some());
        assert_eq!(repos.delivery_fee().await.unwrap(), None);
    }
}
