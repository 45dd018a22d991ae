mod client;
mod graph;
mod normalize;
mod transactions;

pub use client::{ApiClient, DATE_FORMAT, DateRange, NetworkQuery, NetworkSource};
pub use graph::{Chain, NetworkGraph, Node, NodeKind};
pub use normalize::{NormalizeError, normalize};
pub use transactions::{Transaction, TransactionFilter, TransactionStats};
