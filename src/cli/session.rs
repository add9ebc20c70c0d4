//! Interactive, line-oriented converter.
//!
//! Input lines and provider responses are handled on a single task. Rate and
//! currency list requests run on spawned tasks and report back over a channel, so
//! several rate requests may be outstanding at once; the engine keeps only the
//! latest one. A `convert` overtaken by a later request is reported and not
//! recorded.

use super::{convert, currencies, history, theme::ThemeAction, ui};
use crate::core::{
    ConversionEngine, ConversionStep, Effect, RateError, RateProvider, RateQuote, RateRequest,
    Theme, Trigger,
};
use anyhow::Result;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, warn};

const HELP: &str = "\
Commands:
  amount <value>          set the amount to convert
  from <code>             set the source currency
  to <code>               set the target currency
  swap                    swap source and target
  convert                 convert and record in history
  theme [light|dark]      set or toggle the theme
  history                 show recent conversions
  currencies              list available currencies
  show                    show the current state
  help                    show this help
  quit                    leave the session";

#[derive(Debug)]
enum SessionEvent {
    CurrenciesLoaded(Result<BTreeMap<String, String>, RateError>),
    RateResolved(RateRequest, Result<RateQuote, RateError>),
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, PartialEq)]
enum Command {
    Amount(String),
    From(String),
    To(String),
    Swap,
    Convert,
    Theme(ThemeAction),
    History,
    Currencies,
    Show,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (line, ""),
    };

    match (name.to_lowercase().as_str(), arg) {
        ("", _) => Command::Empty,
        ("amount" | "a", arg) => Command::Amount(arg.to_string()),
        ("from" | "f", code) if !code.is_empty() => Command::From(code.to_string()),
        ("to" | "t", code) if !code.is_empty() => Command::To(code.to_string()),
        ("swap" | "s", "") => Command::Swap,
        ("convert" | "c", "") => Command::Convert,
        ("theme", "") | ("theme", "toggle") => Command::Theme(ThemeAction::Toggle),
        ("theme", value) => match value.parse::<Theme>() {
            Ok(theme) => Command::Theme(ThemeAction::Set(theme)),
            Err(_) => Command::Unknown(line.to_string()),
        },
        ("history" | "h", "") => Command::History,
        ("currencies", "") => Command::Currencies,
        ("show", "") => Command::Show,
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit" | "q", _) => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

pub struct Session<W: Write> {
    engine: ConversionEngine,
    provider: Arc<dyn RateProvider>,
    out: W,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    currency_task: Option<JoinHandle<()>>,
    rate_tasks: JoinSet<()>,
    pending_rates: usize,
}

impl<W: Write> Session<W> {
    pub fn new(engine: ConversionEngine, provider: Arc<dyn RateProvider>, out: W) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            engine,
            provider,
            out,
            events_tx,
            events_rx,
            currency_task: None,
            rate_tasks: JoinSet::new(),
            pending_rates: 0,
        }
    }

    /// Runs until `quit` or end of input and hands back the final engine state.
    ///
    /// `quit` abandons the currency list request if it is still running. End of
    /// input waits for outstanding requests first.
    pub async fn run<R: AsyncBufRead + Unpin>(mut self, input: R) -> Result<ConversionEngine> {
        self.start_currency_fetch();
        writeln!(
            self.out,
            "Converting {} → {}. Type 'help' for commands.",
            self.engine.from(),
            self.engine.to()
        )?;
        self.sync_inputs()?;

        let mut lines = input.lines();
        loop {
            tokio::select! {
                biased;
                Some(event) = self.events_rx.recv() => self.handle_event(event)?,
                line = lines.next_line() => match line? {
                    Some(line) => {
                        if self.handle_line(&line)? == Flow::Quit {
                            self.shutdown();
                            break;
                        }
                    }
                    None => {
                        self.drain().await?;
                        break;
                    }
                },
            }
        }

        Ok(self.engine)
    }

    fn start_currency_fetch(&mut self) {
        let provider = Arc::clone(&self.provider);
        let tx = self.events_tx.clone();
        self.currency_task = Some(tokio::spawn(async move {
            let result = provider.list_currencies().await;
            // The session may already be gone.
            let _ = tx.send(SessionEvent::CurrenciesLoaded(result));
        }));
    }

    fn spawn_rate_fetch(&mut self, request: RateRequest) {
        let provider = Arc::clone(&self.provider);
        let tx = self.events_tx.clone();
        self.pending_rates += 1;
        debug!(seq = request.seq, "Fetching {}/{}", request.from, request.to);
        self.rate_tasks.spawn(async move {
            let result = provider.get_rate(&request.from, &request.to).await;
            let _ = tx.send(SessionEvent::RateResolved(request, result));
        });
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.currency_task.take() {
            if !handle.is_finished() {
                debug!("Abandoning currency list request");
            }
            handle.abort();
        }
    }

    async fn drain(&mut self) -> Result<()> {
        loop {
            while let Ok(event) = self.events_rx.try_recv() {
                self.handle_event(event)?;
            }

            if let Some(handle) = self.currency_task.take() {
                // A task that finished normally has already queued its event.
                if let Err(e) = handle.await {
                    warn!("Currency list task failed: {e}");
                    self.handle_event(SessionEvent::CurrenciesLoaded(Err(RateError::Network(
                        format!("Currency list task failed: {e}"),
                    ))))?;
                }
            } else if self.pending_rates > 0 {
                tokio::select! {
                    biased;
                    Some(event) = self.events_rx.recv() => self.handle_event(event)?,
                    Some(joined) = self.rate_tasks.join_next() => self.rate_task_joined(joined),
                    else => break,
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    /// A rate task that panicked never reports back, so it stops counting here.
    fn rate_task_joined(&mut self, joined: Result<(), JoinError>) {
        if let Err(e) = joined {
            warn!("Rate task failed: {e}");
            self.pending_rates = self.pending_rates.saturating_sub(1);
        }
    }

    fn handle_event(&mut self, event: SessionEvent) -> Result<()> {
        match event {
            SessionEvent::CurrenciesLoaded(result) => {
                self.currency_task = None;
                let failed = result.is_err();
                self.engine.apply_currency_list(result);
                if failed {
                    self.print_notice()?;
                }
                self.sync_inputs()?;
            }
            SessionEvent::RateResolved(request, result) => {
                self.pending_rates = self.pending_rates.saturating_sub(1);
                while let Some(joined) = self.rate_tasks.try_join_next() {
                    self.rate_task_joined(joined);
                }
                if self.engine.complete_conversion(&request, result) {
                    self.print_conversion()?;
                } else if request.trigger == Trigger::User {
                    writeln!(
                        self.out,
                        "{}",
                        ui::style_text(
                            &format!(
                                "Conversion of {} {} → {} was superseded by a newer request. \
                                 Type 'convert' to record it.",
                                ui::format_amount(request.amount),
                                request.from,
                                request.to
                            ),
                            ui::StyleType::Subtle,
                            self.engine.theme()
                        )
                    )?;
                }
            }
        }
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> Result<Flow> {
        match parse_command(line) {
            Command::Empty => {}
            Command::Amount(text) => {
                self.engine.set_amount(&text);
                if self.engine.rate().is_some() {
                    self.print_conversion()?;
                }
            }
            Command::From(code) => match self.engine.set_from(&code) {
                Ok(()) => self.sync_inputs()?,
                Err(e) => self.print_error(&e.to_string())?,
            },
            Command::To(code) => match self.engine.set_to(&code) {
                Ok(()) => self.sync_inputs()?,
                Err(e) => self.print_error(&e.to_string())?,
            },
            Command::Swap => {
                self.engine.swap();
                writeln!(
                    self.out,
                    "Now converting {} → {}",
                    self.engine.from(),
                    self.engine.to()
                )?;
                self.sync_inputs()?;
            }
            Command::Convert => self.start_conversion(Trigger::User)?,
            Command::Theme(action) => {
                let theme = super::theme::apply(&mut self.engine, action);
                writeln!(
                    self.out,
                    "Theme: {}",
                    ui::style_text(&theme.to_string(), ui::StyleType::Label, theme)
                )?;
            }
            Command::History => {
                writeln!(
                    self.out,
                    "{}",
                    history::render_history(self.engine.history(), self.engine.theme())
                )?;
            }
            Command::Currencies => {
                writeln!(
                    self.out,
                    "{}",
                    currencies::render_currencies(self.engine.currencies(), self.engine.theme())
                )?;
            }
            Command::Show => {
                writeln!(
                    self.out,
                    "Amount: {}  Pair: {} → {}",
                    self.engine.amount_input(),
                    self.engine.from(),
                    self.engine.to()
                )?;
                self.print_conversion()?;
            }
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
            Command::Unknown(line) => {
                self.print_error(&format!("Unknown command: {line}. Type 'help' for commands."))?;
            }
        }
        Ok(Flow::Continue)
    }

    fn print_error(&mut self, message: &str) -> Result<()> {
        writeln!(
            self.out,
            "{}",
            ui::style_text(message, ui::StyleType::Error, self.engine.theme())
        )?;
        Ok(())
    }

    fn sync_inputs(&mut self) -> Result<()> {
        if self.engine.on_inputs_changed() == Effect::FetchRate {
            self.start_conversion(Trigger::Auto)?;
        }
        Ok(())
    }

    fn start_conversion(&mut self, trigger: Trigger) -> Result<()> {
        match self.engine.begin_conversion(trigger) {
            ConversionStep::Resolved => self.print_conversion(),
            ConversionStep::Fetch(request) => {
                self.spawn_rate_fetch(request);
                Ok(())
            }
        }
    }

    fn print_conversion(&mut self) -> Result<()> {
        let text = convert::render_conversion(&self.engine);
        if !text.is_empty() {
            writeln!(self.out, "{text}")?;
        }
        Ok(())
    }

    fn print_notice(&mut self) -> Result<()> {
        if let Some(notice) = self.engine.notice() {
            writeln!(
                self.out,
                "{}",
                ui::style_text(
                    &notice.to_string(),
                    ui::StyleType::Notice,
                    self.engine.theme()
                )
            )?;
        }
        Ok(())
    }
}
