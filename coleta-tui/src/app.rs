use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Local};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use coleta_core::{
    AddressCandidate, AggregatedSchedule, ColetaService, Debouncer, GeographicPoint, LookupError,
    LookupResponse, QuerySequencer, Sequenced,
};

type LookupOutcome = Result<LookupResponse, LookupError>;

/// What the result panel shows.
#[derive(Debug, Clone)]
pub(crate) enum ResultState {
    /// No lookup executed yet.
    Idle,
    Loading,
    Found {
        response: LookupResponse,
        schedule: AggregatedSchedule,
        looked_up_at: DateTime<Local>,
    },
    /// Lookup ran but no zone covers the point.
    NoZone { resolved_address: String },
    DatasetUnavailable(String),
}

impl ResultState {
    pub(crate) fn from_lookup<F>(outcome: LookupOutcome, aggregate: F, now: DateTime<Local>) -> Self
    where
        F: FnOnce(&LookupResponse) -> AggregatedSchedule,
    {
        match outcome {
            Ok(response) if response.is_empty() => Self::NoZone {
                resolved_address: response.resolved_address,
            },
            Ok(response) => Self::Found {
                schedule: aggregate(&response),
                response,
                looked_up_at: now,
            },
            Err(LookupError::DatasetUnavailable(reason)) => Self::DatasetUnavailable(reason),
        }
    }
}

pub(crate) struct App {
    pub service: Arc<ColetaService>,

    pub input: String,
    pub suggestions: Vec<AddressCandidate>,
    pub suggestion_index: usize,
    pub is_searching: bool,

    pub result: ResultState,
    pub status_message: Option<String>,

    min_query_chars: usize,
    suggest: Debouncer<Vec<AddressCandidate>>,
    suggest_rx: UnboundedReceiver<Sequenced<Vec<AddressCandidate>>>,
    lookups: Arc<QuerySequencer>,
    lookup_tx: UnboundedSender<Sequenced<LookupOutcome>>,
    lookup_rx: UnboundedReceiver<Sequenced<LookupOutcome>>,
}

impl App {
    pub(crate) fn new(service: Arc<ColetaService>, debounce: Duration, min_query_chars: usize) -> Self {
        let (suggest_tx, suggest_rx) = mpsc::unbounded_channel();
        let (lookup_tx, lookup_rx) = mpsc::unbounded_channel();

        Self {
            service,
            input: String::new(),
            suggestions: Vec::new(),
            suggestion_index: 0,
            is_searching: false,
            result: ResultState::Idle,
            status_message: None,
            min_query_chars,
            suggest: Debouncer::new(debounce, Arc::new(QuerySequencer::new()), suggest_tx),
            suggest_rx,
            lookups: Arc::new(QuerySequencer::new()),
            lookup_tx,
            lookup_rx,
        }
    }

    /// Schedule a debounced suggestion request for the current input.
    pub(crate) fn on_input_changed(&mut self) {
        self.status_message = None;

        let text = self.input.trim();
        if GeographicPoint::parse(text).is_some() || text.chars().count() < self.min_query_chars {
            self.drop_pending_suggestions();
            self.suggestions.clear();
            self.suggestion_index = 0;
            return;
        }

        let service = Arc::clone(&self.service);
        let raw = text.to_owned();
        self.is_searching = true;
        self.suggest.schedule(async move { service.suggest(&raw).await });
    }

    /// Look up the typed coordinates or the highlighted suggestion.
    pub(crate) fn submit(&mut self) {
        if let Some(point) = GeographicPoint::parse(&self.input) {
            let service = Arc::clone(&self.service);
            self.start_lookup(async move { service.lookup_point(point).await });
            return;
        }

        let Some(candidate) = self
            .suggestions
            .get(self.suggestion_index)
            .or_else(|| self.suggestions.first())
            .cloned()
        else {
            self.status_message = Some("No suggestion to look up yet; keep typing or enter `lat, lon`".into());
            return;
        };

        self.input.clone_from(&candidate.display_label);
        self.suggestions.clear();
        self.suggestion_index = 0;

        let service = Arc::clone(&self.service);
        self.start_lookup(async move { service.lookup_candidate(&candidate).await });
    }

    pub(crate) fn select_previous(&mut self) {
        self.suggestion_index = self.suggestion_index.saturating_sub(1);
    }

    pub(crate) fn select_next(&mut self) {
        if self.suggestion_index + 1 < self.suggestions.len() {
            self.suggestion_index += 1;
        }
    }

    /// Apply finished background work, ignoring anything superseded.
    pub(crate) fn poll_background(&mut self) {
        while let Ok(response) = self.suggest_rx.try_recv() {
            if let Some(suggestions) = self.suggest.sequencer().accept(response) {
                debug!(count = suggestions.len(), "suggestions ready");
                self.suggestions = suggestions;
                self.suggestion_index = 0;
                self.is_searching = false;
            }
        }

        while let Ok(response) = self.lookup_rx.try_recv() {
            if let Some(outcome) = self.lookups.accept(response) {
                let service = Arc::clone(&self.service);
                self.result = ResultState::from_lookup(outcome, |found| service.aggregate(found), Local::now());
            }
        }
    }

    fn start_lookup<F>(&mut self, lookup: F)
    where
        F: Future<Output = LookupOutcome> + Send + 'static,
    {
        // a lookup overrides any suggestion still in flight
        self.drop_pending_suggestions();
        self.status_message = None;
        self.result = ResultState::Loading;

        let ticket = self.lookups.issue();
        let sender = self.lookup_tx.clone();
        tokio::spawn(async move {
            let value = lookup.await;
            if sender.send(Sequenced { ticket, value }).is_err() {
                debug!("lookup result dropped, ui closed");
            }
        });
    }

    fn drop_pending_suggestions(&mut self) {
        self.suggest.cancel();
        self.suggest.sequencer().supersede();
        self.is_searching = false;
    }
}
