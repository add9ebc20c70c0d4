use super::ui;
use crate::core::{ConversionEngine, RateProvider, Trigger};
use anyhow::Result;
use futures::future::join;

/// Describes the current conversion result, error and notice lines.
pub fn render_conversion(engine: &ConversionEngine) -> String {
    let theme = engine.theme();
    let mut lines = Vec::new();

    if let Some(notice) = engine.notice() {
        lines.push(ui::style_text(
            &notice.to_string(),
            ui::StyleType::Notice,
            theme,
        ));
    }

    if let Some(error) = engine.error() {
        lines.push(ui::style_text(&error.to_string(), ui::StyleType::Error, theme));
    } else if let (Some(converted), Some(rate)) = (engine.converted_amount(), engine.rate()) {
        lines.push(format!(
            "{} {} = {} {}",
            ui::format_amount(engine.numeric_amount()),
            engine.from(),
            ui::style_text(&ui::format_amount(converted), ui::StyleType::Value, theme),
            ui::style_text(engine.to(), ui::StyleType::Label, theme),
        ));
        lines.push(ui::style_text(
            &format!(
                "1 {} = {} {} (rate for {}, updated {})",
                engine.from(),
                ui::format_rate(rate.rate),
                engine.to(),
                rate.effective_date,
                rate.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
            ),
            ui::StyleType::Subtle,
            theme,
        ));
    } else if engine.in_flight() {
        lines.push(ui::style_text("Converting...", ui::StyleType::Subtle, theme));
    }

    lines.join("\n")
}

/// Converts once on behalf of the user and prints the outcome.
///
/// Codes given on the command line must appear in the currency list, so the list
/// is loaded before them. Without codes the list is fetched alongside the rate.
/// A rejected code is returned as an error and the saved pair is left as it was.
pub async fn run(
    engine: &mut ConversionEngine,
    provider: &(dyn RateProvider + Send + Sync),
    amount: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<()> {
    if let Some(amount) = amount {
        engine.set_amount(amount);
    }

    if from.is_none() && to.is_none() {
        let pb = ui::new_spinner(&format!("Converting {} to {}...", engine.from(), engine.to()));
        let (currencies, _) = join(
            provider.list_currencies(),
            engine.convert(provider, Trigger::User),
        )
        .await;
        pb.finish_and_clear();
        engine.apply_currency_list(currencies);
    } else {
        let pb = ui::new_spinner("Loading currencies...");
        let currencies = provider.list_currencies().await;
        pb.finish_and_clear();
        engine.apply_currency_list(currencies);

        if let Some(from) = from {
            engine.set_from(from)?;
        }
        if let Some(to) = to {
            engine.set_to(to)?;
        }

        let pb = ui::new_spinner(&format!("Converting {} to {}...", engine.from(), engine.to()));
        engine.convert(provider, Trigger::User).await;
        pb.finish_and_clear();
    }

    println!("{}", render_conversion(engine));

    for code in [engine.from(), engine.to()] {
        if engine.error().is_some() && !engine.is_known_currency(code) {
            println!(
                "{}",
                ui::style_text(
                    &format!("Unknown currency code: {code}"),
                    ui::StyleType::Subtle,
                    engine.theme()
                )
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        ConversionError, CurrencyOption, CurrencyPair, PreferenceStore, RateError, RateQuote,
    };
    use crate::store::memory::MemoryCollection;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    struct FixedRateProvider;

    #[async_trait]
    impl RateProvider for FixedRateProvider {
        async fn list_currencies(&self) -> Result<BTreeMap<String, String>, RateError> {
            Err(RateError::Network("offline".to_string()))
        }

        async fn get_rate(&self, from: &str, to: &str) -> Result<RateQuote, RateError> {
            if to == "XYZ" {
                return Err(RateError::UnsupportedPair {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
            Ok(RateQuote {
                rate: 0.92,
                effective_date: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
            })
        }
    }

    fn engine() -> ConversionEngine {
        let prefs = PreferenceStore::new(Arc::new(MemoryCollection::new()));
        ConversionEngine::new(prefs, CurrencyPair::default())
    }

    #[tokio::test]
    async fn test_render_successful_conversion() {
        let mut engine = engine();
        engine.set_amount("100");
        engine.convert(&FixedRateProvider, Trigger::User).await;

        let output = console::strip_ansi_codes(&render_conversion(&engine)).to_string();
        assert!(output.contains("100.00 USD = 92.00 EUR"));
        assert!(output.contains("1 USD = 0.920000 EUR (rate for 2024-05-03"));
    }

    #[tokio::test]
    async fn test_render_error_and_notice() {
        let mut engine = engine().with_currencies(vec![
            CurrencyOption::new("USD", "United States Dollar"),
            CurrencyOption::new("XYZ", "Test Currency"),
        ]);
        engine.set_to("XYZ").unwrap();
        engine.convert(&FixedRateProvider, Trigger::User).await;
        engine.apply_currency_list(FixedRateProvider.list_currencies().await);

        let output = console::strip_ansi_codes(&render_conversion(&engine)).to_string();
        assert!(output.contains("Could not load the full currency list"));
        assert!(output.contains("Conversion from USD to XYZ is not supported"));
        assert!(!output.contains(" = "));
    }

    #[tokio::test]
    async fn test_run_records_history() {
        let mut engine = engine();
        run(
            &mut engine,
            &FixedRateProvider,
            Some("1,000"),
            Some("usd"),
            Some("eur"),
        )
        .await
        .unwrap();

        assert_eq!(engine.history().len(), 1);
        assert_eq!(engine.history().entries()[0].amount, 1000.0);
        assert_eq!(engine.currencies().len(), 20);
    }

    #[tokio::test]
    async fn test_run_rejects_unknown_code() {
        let mut engine = engine();
        let err = run(
            &mut engine,
            &FixedRateProvider,
            Some("10"),
            None,
            Some("eur&from=gbp"),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.downcast_ref::<ConversionError>(),
            Some(&ConversionError::UnknownCurrency("EUR&FROM=GBP".to_string()))
        );
        assert_eq!(engine.pair(), &CurrencyPair::default());
        assert!(engine.history().is_empty());
    }
}
