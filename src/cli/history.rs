use super::ui;
use crate::core::{History, Theme};
use chrono::Local;
use comfy_table::Cell;

/// Renders the history list, newest first.
pub fn render_history(history: &History, theme: Theme) -> String {
    if history.is_empty() {
        return ui::style_text("No conversions yet.", ui::StyleType::Subtle, theme);
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("When", theme),
        ui::header_cell("Amount", theme),
        ui::header_cell("Pair", theme),
        ui::header_cell("Rate", theme),
        ui::header_cell("Result", theme),
    ]);

    for entry in history.entries() {
        table.add_row(vec![
            Cell::new(
                entry
                    .timestamp
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
            ),
            ui::number_cell(ui::format_amount(entry.amount)),
            Cell::new(format!("{} → {}", entry.from, entry.to)),
            ui::number_cell(ui::format_rate(entry.rate)),
            ui::number_cell(ui::format_amount(entry.result)),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Recent conversions", ui::StyleType::Title, theme),
        table
    )
}
