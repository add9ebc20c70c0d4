use super::ui;
use crate::core::{ConversionEngine, Theme};
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeAction {
    Show,
    Set(Theme),
    Toggle,
}

/// Applies `action` and returns the resulting theme.
pub fn apply(engine: &mut ConversionEngine, action: ThemeAction) -> Theme {
    match action {
        ThemeAction::Show => engine.theme(),
        ThemeAction::Set(theme) => {
            engine.set_theme(theme);
            theme
        }
        ThemeAction::Toggle => engine.toggle_theme(),
    }
}

pub fn run(engine: &mut ConversionEngine, action: ThemeAction) -> Result<()> {
    let theme = apply(engine, action);
    println!(
        "Theme: {}",
        ui::style_text(&theme.to_string(), ui::StyleType::Label, theme)
    );
    Ok(())
}
