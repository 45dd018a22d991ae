use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use log::warn;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Transaction {
    pub txid: String,
    pub from_address: String,
    pub to_address: String,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub value: f64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub is_contract_interaction: bool,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub contract_method: Option<String>,
    #[serde(default)]
    pub block_number: Option<u64>,
}

impl Transaction {
    pub fn is_sent_by(&self, address: &str) -> bool {
        self.from_address.eq_ignore_ascii_case(address)
    }

    pub fn is_received_by(&self, address: &str) -> bool {
        self.to_address.eq_ignore_ascii_case(address)
    }
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.filter(|amount| amount.is_finite()).unwrap_or(0.0))
}

/// Accepts RFC 3339 (`2024-05-01T10:00:00Z`) and naive ISO (`2024-05-01T10:00:00`) forms.
pub(crate) fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid transaction timestamp: {raw}")))
}

/// Decodes a transaction list. Records that do not parse are skipped.
pub(crate) fn decode_transactions(raw: Value) -> Result<Vec<Transaction>, serde_json::Error> {
    let records: Vec<Value> = serde_json::from_value(raw)?;
    let mut transactions = Vec::with_capacity(records.len());
    for (position, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Transaction>(record) {
            Ok(transaction) => transactions.push(transaction),
            Err(error) => warn!("skipping transaction #{position}: {error}"),
        }
    }
    Ok(transactions)
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransactionStats {
    pub total_transactions: usize,
    pub sent_transactions: usize,
    pub received_transactions: usize,
    pub total_sent: f64,
    pub total_received: f64,
    pub balance: f64,
    pub unique_senders: usize,
    pub unique_receivers: usize,
    pub first_transaction: NaiveDateTime,
    pub last_transaction: NaiveDateTime,
}

impl TransactionStats {
    /// Summary from the point of view of `address`. `None` for an empty list.
    pub fn compute(transactions: &[Transaction], address: &str) -> Option<Self> {
        let first_transaction = transactions.iter().map(|tx| tx.timestamp).min()?;
        let last_transaction = transactions.iter().map(|tx| tx.timestamp).max()?;

        let sent = transactions
            .iter()
            .filter(|tx| tx.is_sent_by(address))
            .collect::<Vec<_>>();
        let received = transactions
            .iter()
            .filter(|tx| tx.is_received_by(address))
            .collect::<Vec<_>>();

        let total_sent = sent.iter().map(|tx| tx.value).sum::<f64>();
        let total_received = received.iter().map(|tx| tx.value).sum::<f64>();
        let unique_senders = received
            .iter()
            .map(|tx| tx.from_address.as_str())
            .collect::<HashSet<_>>()
            .len();
        let unique_receivers = sent
            .iter()
            .map(|tx| tx.to_address.as_str())
            .collect::<HashSet<_>>()
            .len();

        Some(Self {
            total_transactions: transactions.len(),
            sent_transactions: sent.len(),
            received_transactions: received.len(),
            total_sent,
            total_received,
            balance: total_received - total_sent,
            unique_senders,
            unique_receivers,
            first_transaction,
            last_transaction,
        })
    }
}

/// Row filter for the transaction table.
#[derive(Clone, Debug, Default)]
pub struct TransactionFilter {
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub address_query: String,
}

impl TransactionFilter {
    pub fn is_active(&self) -> bool {
        self.min_amount.is_some() || self.max_amount.is_some() || !self.address_query.trim().is_empty()
    }

    pub fn apply<'a>(&self, transactions: &'a [Transaction]) -> Vec<&'a Transaction> {
        let query = self.address_query.trim();
        let matcher = SkimMatcherV2::default();

        transactions
            .iter()
            .filter(|tx| self.min_amount.is_none_or(|min| tx.value >= min))
            .filter(|tx| self.max_amount.is_none_or(|max| tx.value <= max))
            .filter(|tx| {
                query.is_empty()
                    || matcher.fuzzy_match(&tx.from_address, query).is_some()
                    || matcher.fuzzy_match(&tx.to_address, query).is_some()
                    || matcher.fuzzy_match(&tx.txid, query).is_some()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn tx(txid: &str, from: &str, to: &str, value: f64, timestamp: &str) -> Transaction {
        Transaction {
            txid: txid.to_owned(),
            from_address: from.to_owned(),
            to_address: to.to_owned(),
            value,
            timestamp: parse_timestamp(timestamp).unwrap(),
            is_contract_interaction: false,
            contract_address: None,
            contract_method: None,
            block_number: None,
        }
    }

    #[test]
    fn deserializes_backend_records() {
        let raw = json!([
            {
                "txid": "abc",
                "from_address": "0xAAA",
                "to_address": "0xBBB",
                "value": 1.25,
                "timestamp": "2024-05-01T10:00:00",
                "is_contract_interaction": true,
                "contract_address": "0xCCC",
                "contract_method": "transfer"
            },
            {
                "txid": "def",
                "from_address": "0xBBB",
                "to_address": "0xAAA",
                "value": null,
                "timestamp": "2024-05-02T11:30:00Z",
                "block_number": 19000000
            }
        ]);

        let parsed: Vec<Transaction> = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].is_contract_interaction);
        assert_eq!(parsed[0].contract_method.as_deref(), Some("transfer"));
        assert_eq!(parsed[1].value, 0.0);
        assert_eq!(parsed[1].block_number, Some(19_000_000));
        assert_eq!(parsed[1].timestamp.to_string(), "2024-05-02 11:30:00");
    }

    #[test]
    fn rejects_unparseable_timestamps() {
        let raw = json!({
            "txid": "abc",
            "from_address": "a",
            "to_address": "b",
            "value": 1.0,
            "timestamp": "yesterday"
        });
        assert!(serde_json::from_value::<Transaction>(raw).is_err());
    }

    #[test]
    fn bad_records_are_skipped_not_fatal() {
        let raw = json!([
            { "txid": "ok1", "from_address": "a", "to_address": "b", "value": 1.0, "timestamp": "2024-05-01T10:00:00" },
            { "txid": "bad", "from_address": "a", "to_address": "b", "value": 1.0, "timestamp": "yesterday" },
            { "txid": "nofrom", "to_address": "b", "timestamp": "2024-05-01T10:00:00" },
            { "txid": "ok2", "from_address": "b", "to_address": "a", "value": 2.0, "timestamp": "2024-05-03T09:00:00Z" }
        ]);

        let parsed = decode_transactions(raw).unwrap();
        let ids = parsed.iter().map(|tx| tx.txid.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["ok1", "ok2"]);

        assert!(decode_transactions(json!({ "detail": "not a list" })).is_err());
    }

    #[test]
    fn stats_compare_addresses_case_insensitively() {
        let transactions = vec![
            tx("1", "0xMe", "0xA", 2.0, "2024-05-03T00:00:00"),
            tx("2", "0xA", "0xme", 5.0, "2024-05-01T00:00:00"),
            tx("3", "0xB", "0xME", 1.0, "2024-05-02T00:00:00"),
            tx("4", "0xme", "0xA", 0.5, "2024-05-04T00:00:00"),
        ];

        let stats = TransactionStats::compute(&transactions, "0xME").unwrap();
        assert_eq!(stats.total_transactions, 4);
        assert_eq!(stats.sent_transactions, 2);
        assert_eq!(stats.received_transactions, 2);
        assert_eq!(stats.total_sent, 2.5);
        assert_eq!(stats.total_received, 6.0);
        assert_eq!(stats.balance, 3.5);
        assert_eq!(stats.unique_senders, 2);
        assert_eq!(stats.unique_receivers, 1);
        assert_eq!(stats.first_transaction.to_string(), "2024-05-01 00:00:00");
        assert_eq!(stats.last_transaction.to_string(), "2024-05-04 00:00:00");
    }

    #[test]
    fn stats_are_absent_for_empty_lists() {
        assert_eq!(TransactionStats::compute(&[], "0xme"), None);
    }

    #[test]
    fn filter_applies_amount_bounds_and_address_query() {
        let transactions = vec![
            tx("1", "bc1qalpha", "bc1qbeta", 0.1, "2024-05-01T00:00:00"),
            tx("2", "bc1qalpha", "bc1qgamma", 2.0, "2024-05-01T00:00:00"),
            tx("3", "bc1qdelta", "bc1qbeta", 7.0, "2024-05-01T00:00:00"),
        ];

        let filter = TransactionFilter {
            min_amount: Some(1.0),
            max_amount: Some(5.0),
            address_query: String::new(),
        };
        let ids = filter
            .apply(&transactions)
            .iter()
            .map(|tx| tx.txid.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["2"]);

        let filter = TransactionFilter {
            address_query: "delta".to_owned(),
            ..TransactionFilter::default()
        };
        let ids = filter
            .apply(&transactions)
            .iter()
            .map(|tx| tx.txid.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["3"]);
        assert!(filter.is_active());
    }
}
