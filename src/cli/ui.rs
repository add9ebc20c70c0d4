use crate::core::Theme;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
#[derive(Debug, Clone, Copy)]
pub enum StyleType {
    Title,
    Label,
    Value,
    Error,
    Notice,
    Subtle,
}

/// Applies a consistent style to a string. Dark terminals get the bright variants.
pub fn style_text(text: &str, style_type: StyleType, theme: Theme) -> String {
    let styled = match (style_type, theme) {
        (StyleType::Title, _) => style(text).bold().underlined(),
        (StyleType::Label, _) => style(text).bold(),
        (StyleType::Value, Theme::Light) => style(text).green().bold(),
        (StyleType::Value, Theme::Dark) => style(text).green().bright().bold(),
        (StyleType::Error, Theme::Light) => style(text).red(),
        (StyleType::Error, Theme::Dark) => style(text).red().bright(),
        (StyleType::Notice, Theme::Light) => style(text).yellow(),
        (StyleType::Notice, Theme::Dark) => style(text).yellow().bright(),
        (StyleType::Subtle, _) => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str, theme: Theme) -> Cell {
    let color = match theme {
        Theme::Light => Color::DarkCyan,
        Theme::Dark => Color::Cyan,
    };
    Cell::new(text).fg(color).add_attribute(Attribute::Bold)
}

/// Right-aligned numeric cell.
pub fn number_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

pub fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

/// Rates below 1 keep more precision so small quotes stay readable.
pub fn format_rate(rate: f64) -> String {
    if rate.abs() >= 1.0 {
        format!("{rate:.4}")
    } else {
        format!("{rate:.6}")
    }
}

/// Creates a spinner shown while a request is outstanding.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
