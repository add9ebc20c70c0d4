use super::ui;
use crate::core::{ConversionEngine, CurrencyOption, RateProvider, Theme};
use anyhow::Result;
use comfy_table::Cell;

pub fn render_currencies(currencies: &[CurrencyOption], theme: Theme) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code", theme),
        ui::header_cell("Currency", theme),
    ]);
    for currency in currencies {
        table.add_row(vec![Cell::new(&currency.code), Cell::new(&currency.name)]);
    }
    table.to_string()
}

/// Loads the full currency list and prints it. A failed load prints the common
/// currencies together with a notice.
pub async fn run(
    engine: &mut ConversionEngine,
    provider: &(dyn RateProvider + Send + Sync),
) -> Result<()> {
    let pb = ui::new_spinner("Fetching currencies...");
    let result = provider.list_currencies().await;
    pb.finish_and_clear();

    engine.apply_currency_list(result);
    if let Some(notice) = engine.notice() {
        println!(
            "{}\n",
            ui::style_text(&notice.to_string(), ui::StyleType::Notice, engine.theme())
        );
    }
    println!("{}", render_currencies(engine.currencies(), engine.theme()));
    Ok(())
}
