use std::sync::Arc;

use log::{debug, error, info, warn};
use thiserror::Error;

use crate::chain::{
    Chain, NetworkGraph, NetworkQuery, NetworkSource, NormalizeError, Transaction, normalize,
};

use super::layout::LayoutMode;
use super::pagination::Pagination;

pub(super) const MAX_DEPTH: u8 = 3;

#[derive(Clone, Debug, Error, PartialEq)]
pub(super) enum ExplorerError {
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Malformed(#[from] NormalizeError),
    #[error("API request failed: {0}")]
    Api(String),
}

impl ExplorerError {
    fn api(error: anyhow::Error) -> Self {
        Self::Api(format!("{error:#}"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum ViewPhase {
    Idle,
    Loading,
    Displayed,
    DrillDown,
    Failed,
}

/// Visual-only selection state. Never triggers a fetch on its own.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(super) struct InteractionState {
    pub(super) focused: Option<String>,
    pub(super) hovered: Option<String>,
}

/// Work for a background thread. Carries everything needed to decide staleness later.
#[derive(Clone, Debug, PartialEq)]
pub(super) enum FetchJob {
    Search {
        generation: u64,
        query: NetworkQuery,
    },
    /// `generation` is the search that produced the root of `query`.
    DrillDown {
        generation: u64,
        target: String,
        query: NetworkQuery,
    },
    Transactions {
        generation: u64,
        query: NetworkQuery,
    },
}

pub(super) struct SearchPayload {
    graph: Result<Arc<NetworkGraph>, ExplorerError>,
    transactions: Result<Vec<Transaction>, ExplorerError>,
}

pub(super) struct DrillPayload {
    /// `None` when the subgraph did not normalize; the current graph stays on screen.
    graph: Option<Arc<NetworkGraph>>,
    transactions: Vec<Transaction>,
}

pub(super) enum FetchOutcome {
    Search {
        generation: u64,
        payload: SearchPayload,
    },
    DrillDown {
        generation: u64,
        target: String,
        result: Result<DrillPayload, ExplorerError>,
    },
    Transactions {
        generation: u64,
        query: NetworkQuery,
        result: Result<Vec<Transaction>, ExplorerError>,
    },
}

impl FetchJob {
    pub(super) fn run(self, source: &dyn NetworkSource) -> FetchOutcome {
        match self {
            Self::Search { generation, query } => FetchOutcome::Search {
                generation,
                payload: run_search(source, &query),
            },
            Self::DrillDown {
                generation,
                target,
                query,
            } => {
                let result = run_drill_down(source, &query, &target);
                FetchOutcome::DrillDown {
                    generation,
                    target,
                    result,
                }
            }
            Self::Transactions { generation, query } => {
                let result = source
                    .transactions(query.chain, &query.address, query.range)
                    .map_err(ExplorerError::api);
                FetchOutcome::Transactions {
                    generation,
                    query,
                    result,
                }
            }
        }
    }
}

/// Root transactions are fetched even when the network is unusable, so the table
/// still fills for addresses without network data.
fn run_search(source: &dyn NetworkSource, query: &NetworkQuery) -> SearchPayload {
    let graph = fetch_network(source, query);
    let transactions = source
        .transactions(query.chain, &query.address, query.range)
        .map_err(ExplorerError::api);

    SearchPayload {
        graph,
        transactions,
    }
}

fn fetch_network(
    source: &dyn NetworkSource,
    query: &NetworkQuery,
) -> Result<Arc<NetworkGraph>, ExplorerError> {
    let raw = source.network(query).map_err(ExplorerError::api)?;
    let graph = normalize(&raw, Some(&query.address))?;
    info!(
        "network for {}: {} nodes, {} links",
        query.address,
        graph.node_count(),
        graph.link_count()
    );
    Ok(Arc::new(graph))
}

fn run_drill_down(
    source: &dyn NetworkSource,
    query: &NetworkQuery,
    target: &str,
) -> Result<DrillPayload, ExplorerError> {
    let transactions = source
        .transactions_between(query.chain, &query.address, target, query.range)
        .map_err(ExplorerError::api)?;
    let raw = source
        .network_between(query, target)
        .map_err(ExplorerError::api)?;

    let graph = match normalize(&raw, Some(&query.address)) {
        Ok(graph) => Some(Arc::new(graph)),
        Err(error) => {
            warn!("keeping current graph, subgraph to {target} is unusable: {error}");
            None
        }
    };

    Ok(DrillPayload {
        graph,
        transactions,
    })
}

fn validate(query: &NetworkQuery) -> Result<(), ExplorerError> {
    let invalid = |message: &str| Err(ExplorerError::InvalidInput(message.to_owned()));

    if query.address.trim().is_empty() {
        return invalid("Enter a wallet address");
    }
    if !(1..=MAX_DEPTH).contains(&query.depth) {
        return invalid("Depth must be between 1 and 3");
    }
    if !query.range.is_ordered() {
        return invalid("Start date must not be after end date");
    }
    if let Some(min_amount) = query.min_amount
        && (!min_amount.is_finite() || min_amount < 0.0)
    {
        return invalid("Minimum amount must be a non-negative number");
    }
    Ok(())
}

/// Transactions listed for one address. Independent of the network on screen.
struct Ledger {
    chain: Chain,
    address: String,
    transactions: Vec<Transaction>,
}

impl Ledger {
    fn new(query: &NetworkQuery, transactions: Vec<Transaction>) -> Self {
        Self {
            chain: query.chain,
            address: query.address.clone(),
            transactions,
        }
    }
}

/// Explorer state machine: search, loading, displayed or drill-down, failed.
pub(super) struct Controller {
    phase: ViewPhase,
    generation: u64,
    /// Search that produced `root_query`. Drill-downs from an older root are stale.
    root_generation: u64,
    display_revision: u64,
    layout_mode: LayoutMode,
    root_query: Option<NetworkQuery>,
    pending_query: Option<NetworkQuery>,
    full_graph: Option<Arc<NetworkGraph>>,
    displayed: Option<Arc<NetworkGraph>>,
    ledger: Option<Ledger>,
    drill_transactions: Vec<Transaction>,
    pending_drill: Option<String>,
    interaction: InteractionState,
    pagination: Pagination,
    error: Option<String>,
}

impl Controller {
    pub(super) fn new(layout_mode: LayoutMode) -> Self {
        Self {
            phase: ViewPhase::Idle,
            generation: 0,
            root_generation: 0,
            display_revision: 0,
            layout_mode,
            root_query: None,
            pending_query: None,
            full_graph: None,
            displayed: None,
            ledger: None,
            drill_transactions: Vec::new(),
            pending_drill: None,
            interaction: InteractionState::default(),
            pagination: Pagination::default(),
            error: None,
        }
    }

    pub(super) fn search(&mut self, mut query: NetworkQuery) -> Result<FetchJob, ExplorerError> {
        query.address = query.address.trim().to_owned();
        if let Err(error) = validate(&query) {
            self.error = Some(error.to_string());
            return Err(error);
        }

        self.generation += 1;
        self.error = None;
        self.interaction = InteractionState::default();
        self.drill_transactions.clear();
        self.pending_drill = None;
        self.pagination.reset();
        if let Some(full) = self.full_graph.clone() {
            self.display(full);
        }
        self.phase = ViewPhase::Loading;

        info!(
            "search #{} for {} on {}",
            self.generation,
            query.address,
            query.chain.as_str()
        );
        self.pending_query = Some(query.clone());
        Ok(FetchJob::Search {
            generation: self.generation,
            query,
        })
    }

    /// Lists the transactions of an address without fetching its network.
    pub(super) fn lookup_transactions(
        &mut self,
        mut query: NetworkQuery,
    ) -> Result<FetchJob, ExplorerError> {
        query.address = query.address.trim().to_owned();
        if let Err(error) = validate(&query) {
            self.error = Some(error.to_string());
            return Err(error);
        }

        self.generation += 1;
        self.error = None;
        self.pending_query = None;
        self.reset_focus();
        self.phase = ViewPhase::Loading;

        info!(
            "transaction lookup #{} for {} on {}",
            self.generation,
            query.address,
            query.chain.as_str()
        );
        Ok(FetchJob::Transactions {
            generation: self.generation,
            query,
        })
    }

    pub(super) fn on_node_click(&mut self, id: &str) -> Option<FetchJob> {
        if self.phase == ViewPhase::Loading {
            debug!("ignoring click on {id} while a search is loading");
            return None;
        }
        if self.interaction.focused.as_deref() == Some(id) {
            self.reset_focus();
            return None;
        }

        let root_query = self.root_query.clone()?;
        let full = self.full_graph.clone()?;

        self.interaction.focused = Some(id.to_owned());
        self.pagination.reset();

        if full.source().is_some_and(|source| source.id == id) || id == root_query.address {
            self.pending_drill = None;
            self.drill_transactions.clear();
            self.show_full_graph();
            return None;
        }

        self.pending_drill = Some(id.to_owned());
        info!("drill-down {} -> {id}", root_query.address);
        Some(FetchJob::DrillDown {
            generation: self.root_generation,
            target: id.to_owned(),
            query: root_query,
        })
    }

    pub(super) fn on_node_hover(&mut self, id: Option<&str>) {
        if self.interaction.hovered.as_deref() != id {
            self.interaction.hovered = id.map(str::to_owned);
        }
    }

    pub(super) fn reset_focus(&mut self) {
        self.interaction.focused = None;
        self.pending_drill = None;
        self.drill_transactions.clear();
        self.pagination.reset();
        self.show_full_graph();
    }

    fn show_full_graph(&mut self) {
        let Some(full) = self.full_graph.clone() else {
            return;
        };
        self.display(full);
        if self.phase == ViewPhase::DrillDown {
            self.phase = ViewPhase::Displayed;
        }
    }

    /// Puts `graph` on screen. A graph that is already displayed keeps its layout.
    fn display(&mut self, graph: Arc<NetworkGraph>) {
        let unchanged = self
            .displayed
            .as_ref()
            .is_some_and(|displayed| Arc::ptr_eq(displayed, &graph));
        if unchanged {
            return;
        }
        self.displayed = Some(graph);
        self.interaction.hovered = None;
        self.display_revision += 1;
    }

    pub(super) fn set_layout_mode(&mut self, mode: LayoutMode) {
        if self.layout_mode != mode {
            self.layout_mode = mode;
            self.display_revision += 1;
        }
    }

    /// Applies a finished fetch unless a newer search or focus change superseded it.
    /// Returns whether any visible state changed.
    pub(super) fn apply(&mut self, outcome: FetchOutcome) -> bool {
        match outcome {
            FetchOutcome::Search {
                generation,
                payload,
            } => {
                if generation != self.generation {
                    debug!("dropping stale search #{generation}, current is #{}", self.generation);
                    return false;
                }
                self.apply_search(generation, payload);
                true
            }
            FetchOutcome::DrillDown {
                generation,
                target,
                result,
            } => {
                if generation != self.root_generation
                    || self.phase == ViewPhase::Loading
                    || self.interaction.focused.as_deref() != Some(target.as_str())
                {
                    debug!("dropping stale drill-down to {target}");
                    return false;
                }
                self.apply_drill_down(target, result);
                true
            }
            FetchOutcome::Transactions {
                generation,
                query,
                result,
            } => {
                if generation != self.generation {
                    debug!("dropping stale transaction lookup for {}", query.address);
                    return false;
                }
                self.apply_transactions(query, result);
                true
            }
        }
    }

    fn apply_search(&mut self, generation: u64, payload: SearchPayload) {
        let SearchPayload {
            graph,
            transactions,
        } = payload;
        let query = self.pending_query.take();
        self.pending_drill = None;
        self.drill_transactions.clear();

        let graph = match graph {
            Ok(graph) => graph,
            Err(failure) => {
                error!("search failed: {failure}");
                self.error = Some(failure.to_string());
                match (query, transactions) {
                    (Some(query), Ok(transactions)) => {
                        info!(
                            "listing {} transactions for {} without a network",
                            transactions.len(),
                            query.address
                        );
                        self.ledger = Some(Ledger::new(&query, transactions));
                    }
                    (_, Err(failure)) => warn!("transaction fetch failed too: {failure}"),
                    (None, Ok(_)) => {}
                }
                self.phase = if self.full_graph.is_some() {
                    ViewPhase::Displayed
                } else {
                    ViewPhase::Failed
                };
                return;
            }
        };

        let transactions = transactions.unwrap_or_else(|failure| {
            error!("transaction fetch failed: {failure}");
            self.error = Some(failure.to_string());
            Vec::new()
        });

        if let Some(query) = query {
            self.ledger = Some(Ledger::new(&query, transactions));
            self.root_query = Some(query);
            self.root_generation = generation;
        }
        self.interaction.focused = graph.source().map(|source| source.id.clone());
        self.full_graph = Some(Arc::clone(&graph));
        self.display(graph);
        self.pagination.reset();
        self.phase = ViewPhase::Displayed;
    }

    fn apply_drill_down(&mut self, target: String, result: Result<DrillPayload, ExplorerError>) {
        if self.pending_drill.as_deref() == Some(target.as_str()) {
            self.pending_drill = None;
        }

        match result {
            Ok(DrillPayload {
                graph,
                transactions,
            }) => {
                if let Some(graph) = graph {
                    self.display(graph);
                }
                info!("drill-down to {target}: {} transactions", transactions.len());
                self.drill_transactions = transactions;
                self.phase = ViewPhase::DrillDown;
            }
            Err(failure) => {
                error!("drill-down to {target} failed: {failure}");
                self.error = Some(failure.to_string());
            }
        }
    }

    fn apply_transactions(
        &mut self,
        query: NetworkQuery,
        result: Result<Vec<Transaction>, ExplorerError>,
    ) {
        match result {
            Ok(transactions) => {
                info!("{} transactions for {}", transactions.len(), query.address);
                self.ledger = Some(Ledger::new(&query, transactions));
                self.pagination.reset();
            }
            Err(failure) => {
                error!("transaction lookup for {} failed: {failure}", query.address);
                self.error = Some(failure.to_string());
            }
        }
        self.phase = if self.full_graph.is_some() {
            ViewPhase::Displayed
        } else {
            ViewPhase::Idle
        };
    }

    /// Surfaces a form error that never reached `search`.
    pub(super) fn reject_input(&mut self, error: &ExplorerError) {
        self.error = Some(error.to_string());
    }

    pub(super) fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub(super) fn phase(&self) -> ViewPhase {
        self.phase
    }

    pub(super) fn is_loading(&self) -> bool {
        self.phase == ViewPhase::Loading || self.pending_drill.is_some()
    }

    pub(super) fn display_revision(&self) -> u64 {
        self.display_revision
    }

    pub(super) fn layout_mode(&self) -> LayoutMode {
        self.layout_mode
    }

    pub(super) fn displayed_graph(&self) -> Option<&Arc<NetworkGraph>> {
        self.displayed.as_ref()
    }

    pub(super) fn full_graph(&self) -> Option<&Arc<NetworkGraph>> {
        self.full_graph.as_ref()
    }

    pub(super) fn root_query(&self) -> Option<&NetworkQuery> {
        self.root_query.as_ref()
    }

    /// Drill-down target, when the table shows transactions between two addresses.
    pub(super) fn drill_target(&self) -> Option<&str> {
        match self.phase {
            ViewPhase::DrillDown => self.interaction.focused.as_deref(),
            _ => None,
        }
    }

    /// Address and chain the transaction table is listed for.
    pub(super) fn table_subject(&self) -> Option<(&str, Chain)> {
        if self.drill_target().is_some() {
            return self
                .root_query
                .as_ref()
                .map(|query| (query.address.as_str(), query.chain));
        }
        self.ledger
            .as_ref()
            .map(|ledger| (ledger.address.as_str(), ledger.chain))
    }

    pub(super) fn transactions(&self) -> &[Transaction] {
        if self.drill_target().is_some() {
            return &self.drill_transactions;
        }
        match &self.ledger {
            Some(ledger) => &ledger.transactions,
            None => &[],
        }
    }

    pub(super) fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub(super) fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub(super) fn set_pagination(&mut self, pagination: Pagination) {
        self.pagination = pagination;
    }

    pub(super) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
