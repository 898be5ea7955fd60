//! The viewer event loop.
//!
//! [`App::run`] multiplexes the poll ticker, finished scrapes and keyboard
//! input into [`Event`]s, one at a time, and carries out whatever
//! [`Operation`] the state machine answers with. Scrapes run as spawned tasks
//! and report back over a channel, so a slow endpoint never blocks input.

use std::{io, time::Duration};

use crossterm::event::{
    Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use futures::{Stream, StreamExt};
use metrics::{counter, gauge};
use ratatui::{Terminal, backend::Backend};
use tokio::{
    sync::mpsc,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::{
    config::Settings,
    project::Projection,
    render::{self, Banner},
    sample::Batch,
    scrape::{self, Scraper},
    view::{Event, Navigation, Operation, View},
};

#[derive(thiserror::Error, Debug)]
/// Errors produced by [`App`]
pub enum Error {
    /// Terminal IO failed
    #[error("Terminal IO error: {0}")]
    Io(#[from] io::Error),
}

/// The viewer: state machine, scraper and screen furniture.
#[derive(Debug)]
pub struct App {
    view: View,
    scraper: Scraper,
    interval: Duration,
    banner: Banner,
}

impl App {
    /// Create a new [`App`] instance
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        let banner = Banner::new(&settings.endpoint, settings.interval);
        let scraper = Scraper::new(settings.endpoint, settings.scrape_timeout);
        let view = View::new(
            settings.filter,
            settings.delta_policy,
            settings.page_size,
            settings.show_graph,
        );
        Self {
            view,
            scraper,
            interval: settings.interval,
            banner,
        }
    }

    /// The viewer state.
    #[must_use]
    pub fn view(&self) -> &View {
        &self.view
    }

    /// Run until the user quits or `input` ends.
    ///
    /// # Errors
    ///
    /// Function will error if drawing to the terminal or reading input fails.
    /// Scrape failures are not errors here, they are shown on screen.
    pub async fn run<B, S>(&mut self, terminal: &mut Terminal<B>, mut input: S) -> Result<(), Error>
    where
        B: Backend,
        S: Stream<Item = io::Result<TermEvent>> + Unpin,
    {
        info!(
            uri = self.scraper.uri(),
            interval = %humantime::format_duration(self.interval),
            "polling"
        );
        let (scraped_tx, mut scraped_rx) = mpsc::channel::<Result<Batch, scrape::Error>>(1);
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.draw(terminal)?;
        loop {
            let event = tokio::select! {
                _ = ticker.tick() => Event::Tick,
                Some(result) = scraped_rx.recv() => Event::Scraped(result),
                term = input.next() => match term {
                    Some(Ok(term)) => match navigation(&term) {
                        Some(nav) => Event::Input(nav),
                        None => {
                            // Resizes and unbound keys only need a redraw.
                            self.draw(terminal)?;
                            continue;
                        }
                    },
                    Some(Err(err)) => return Err(Error::Io(err)),
                    None => {
                        debug!("input stream closed");
                        Event::Input(Navigation::Quit)
                    }
                },
            };

            let observed = Observed::of(&event);
            let operation = self.view.next(event);
            record(observed, operation, &self.view);

            match operation {
                Operation::Scrape => {
                    let scraper = self.scraper.clone();
                    let scraped_tx = scraped_tx.clone();
                    tokio::spawn(async move {
                        let result = scraper.scrape().await;
                        // A closed channel means the loop is gone.
                        let _ = scraped_tx.send(result).await;
                    });
                }
                Operation::Wait => {}
                Operation::Quit => {
                    info!("quit requested");
                    return Ok(());
                }
            }
            self.draw(terminal)?;
        }
    }

    fn draw<B: Backend>(&self, terminal: &mut Terminal<B>) -> io::Result<()> {
        terminal.draw(|frame| render::draw(frame, &self.banner, &Projection::of(&self.view)))?;
        Ok(())
    }
}

/// Map a terminal event to navigation. `None` for anything unbound.
fn navigation(event: &TermEvent) -> Option<Navigation> {
    let TermEvent::Key(KeyEvent {
        code,
        modifiers,
        kind: KeyEventKind::Press,
        ..
    }) = event
    else {
        return None;
    };
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Navigation::Quit),
        KeyCode::Char('q') | KeyCode::Esc => Some(Navigation::Quit),
        KeyCode::Up | KeyCode::Char('k') => Some(Navigation::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(Navigation::Down),
        KeyCode::PageUp => Some(Navigation::PageUp),
        KeyCode::PageDown => Some(Navigation::PageDown),
        _ => None,
    }
}

/// What kind of event was fed to the state machine, kept past the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observed {
    Tick,
    Scraped { ok: bool },
    Input,
}

impl Observed {
    fn of(event: &Event) -> Self {
        match event {
            Event::Tick => Observed::Tick,
            Event::Scraped(result) => Observed::Scraped { ok: result.is_ok() },
            Event::Input(_) => Observed::Input,
        }
    }
}

fn record(observed: Observed, operation: Operation, view: &View) {
    match observed {
        Observed::Tick if operation == Operation::Wait => {
            counter!("met.scrapes_skipped").increment(1);
        }
        Observed::Scraped { ok: true } => {
            counter!("met.scrapes", "outcome" => "success").increment(1);
            counter!("met.counter_resets").increment(view.last_pass().resets as u64);
            gauge!("met.series").set(view.table().len() as f64);
        }
        Observed::Scraped { ok: false } => {
            counter!("met.scrapes", "outcome" => "error").increment(1);
        }
        Observed::Tick | Observed::Input => {}
    }
}
