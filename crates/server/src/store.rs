//! In-memory exchange between the message composer and the sending extension.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Staged outgoing message plus the search parameters the extension polls
/// for. Field names follow the extension's wire casing; unset prices
/// serialize as `null` rather than disappearing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessagePayload {
    pub message: String,
    pub search_keyword: String,
    pub max_price: Option<f64>,
    pub min_price: Option<f64>,
}

/// One message the extension reports as sent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    pub conversation_id: Option<String>,
    pub listing: Option<serde_json::Value>,
    pub message: Option<String>,
    pub timestamp: i64,
}

/// Shared state for the exchange endpoints: a single staged payload slot
/// and a bounded log of sent messages. The log evicts its oldest entries
/// once `log_capacity` is reached.
#[derive(Debug)]
pub struct ExchangeStore {
    payload: RwLock<MessagePayload>,
    send_log: RwLock<VecDeque<SentMessage>>,
    log_capacity: usize,
}

impl ExchangeStore {
    pub fn new(log_capacity: usize) -> Self {
        let log_capacity = log_capacity.max(1);
        Self {
            payload: RwLock::new(MessagePayload::default()),
            send_log: RwLock::new(VecDeque::with_capacity(log_capacity.min(64))),
            log_capacity,
        }
    }

    /// Replace the staged payload wholesale. Fields absent from the new
    /// payload reset to their defaults; there is no merging.
    pub async fn replace(&self, payload: MessagePayload) {
        *self.payload.write().await = payload;
    }

    pub async fn latest(&self) -> MessagePayload {
        self.payload.read().await.clone()
    }

    pub async fn record_sent(&self, entry: SentMessage) {
        let mut log = self.send_log.write().await;
        while log.len() >= self.log_capacity {
            log.pop_front();
        }
        log.push_back(entry);
    }

    /// Most recent entries in insertion order; `None` returns everything
    /// still retained.
    pub async fn recent(&self, limit: Option<usize>) -> Vec<SentMessage> {
        let log = self.send_log.read().await;
        let skip = match limit {
            Some(limit) => log.len().saturating_sub(limit),
            None => 0,
        };
        log.iter().skip(skip).cloned().collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.send_log.read().await.len()
    }

    pub fn capacity(&self) -> usize {
        self.log_capacity
    }
}
