//! In-process provider double with per-ticker scripted responses.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::watch;

use crate::models::{CompanyMetadata, PriceBar};
use crate::provider::{MarketDataProvider, ProviderError};
use crate::ticker::Ticker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Empty,
    Fail,
    RateLimited,
    Panic,
}

/// Answers every ticker with a complete profile and two daily bars unless
/// told otherwise.
pub(crate) struct ScriptedProvider {
    profiles: HashMap<String, Script>,
    histories: HashMap<String, Script>,
    delay: Duration,
    gate: Option<watch::Receiver<bool>>,
    profile_calls: AtomicUsize,
    history_calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    seen: Mutex<HashSet<String>>,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self {
            profiles: HashMap::new(),
            histories: HashMap::new(),
            delay: Duration::ZERO,
            gate: None,
            profile_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            seen: Mutex::new(HashSet::new()),
        }
    }

    pub(crate) fn fail_profile(mut self, ticker: &str) -> Self {
        self.profiles.insert(ticker.to_string(), Script::Fail);
        self
    }

    pub(crate) fn empty_profile(mut self, ticker: &str) -> Self {
        self.profiles.insert(ticker.to_string(), Script::Empty);
        self
    }

    pub(crate) fn rate_limit_profile(mut self, ticker: &str) -> Self {
        self.profiles.insert(ticker.to_string(), Script::RateLimited);
        self
    }

    pub(crate) fn panic_on_profile(mut self, ticker: &str) -> Self {
        self.profiles.insert(ticker.to_string(), Script::Panic);
        self
    }

    pub(crate) fn fail_history(mut self, ticker: &str) -> Self {
        self.histories.insert(ticker.to_string(), Script::Fail);
        self
    }

    pub(crate) fn empty_history(mut self, ticker: &str) -> Self {
        self.histories.insert(ticker.to_string(), Script::Empty);
        self
    }

    pub(crate) fn panic_on_history(mut self, ticker: &str) -> Self {
        self.histories.insert(ticker.to_string(), Script::Panic);
        self
    }

    /// Each history call sleeps this long while counted as active.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// History calls block until the returned sender publishes `true`.
    pub(crate) fn gated(mut self) -> (Self, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        self.gate = Some(rx);
        (self, tx)
    }

    pub(crate) fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    /// Most history calls observed running at the same time.
    pub(crate) fn peak_active(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub(crate) fn saw(&self, ticker: &str) -> bool {
        self.seen
            .lock()
            .map(|seen| seen.contains(ticker))
            .unwrap_or(false)
    }

    fn note(&self, ticker: &Ticker) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.insert(ticker.to_string());
        }
    }
}

fn scripted_error(script: Script, ticker: &Ticker) -> ProviderError {
    match script {
        Script::RateLimited => ProviderError::Api(fmp_api::Error::RateLimited),
        _ => ProviderError::Api(fmp_api::Error::HttpStatus {
            status: 503,
            body: format!("scripted failure for {}", ticker),
        }),
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    async fn fetch_profile(&self, ticker: &Ticker) -> Result<Option<CompanyMetadata>, ProviderError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.note(ticker);
        match self.profiles.get(ticker.as_str()).copied() {
            None => Ok(Some(CompanyMetadata {
                company_name: Some(format!("{} Inc.", ticker)),
                sector: Some("Technology".to_string()),
                industry: Some("Software".to_string()),
                market_cap: Some(1_000_000_000),
            })),
            Some(Script::Empty) => Ok(None),
            Some(Script::Panic) => panic!("scripted profile panic for {}", ticker),
            Some(script) => Err(scripted_error(script, ticker)),
        }
    }

    async fn fetch_price_history(&self, ticker: &Ticker) -> Result<Vec<PriceBar>, ProviderError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.note(ticker);

        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_active, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let mut gate = gate.clone();
            let _ = gate.wait_for(|open| *open).await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        match self.histories.get(ticker.as_str()).copied() {
            None => Ok(bars()),
            Some(Script::Empty) => Ok(Vec::new()),
            Some(Script::Panic) => panic!("scripted history panic for {}", ticker),
            Some(script) => Err(scripted_error(script, ticker)),
        }
    }
}

fn bars() -> Vec<PriceBar> {
    [(2024, 3, 14, 173.0), (2024, 3, 15, 172.6)]
        .iter()
        .filter_map(|&(y, m, d, close)| {
            Some(PriceBar {
                date: NaiveDate::from_ymd_opt(y, m, d)?,
                open: close - 1.0,
                high: close + 1.5,
                low: close - 2.0,
                close,
                volume: 52_000_000,
            })
        })
        .collect()
}
