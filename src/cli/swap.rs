use super::ui;
use crate::core::ConversionEngine;
use anyhow::Result;

/// Swaps the stored pair and prints the new direction.
pub fn run(engine: &mut ConversionEngine) -> Result<()> {
    engine.swap();
    println!(
        "Now converting {} → {}",
        ui::style_text(engine.from(), ui::StyleType::Label, engine.theme()),
        ui::style_text(engine.to(), ui::StyleType::Label, engine.theme()),
    );
    Ok(())
}
