//! WebSocket `blockSubscribe` client (spec §4.3, §6): subscribes once per
//! connection, forwards every transaction in every notified block to the
//! dispatcher, and reconnects on any error.

use crate::dispatcher::Dispatcher;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

const PING_INTERVAL: Duration = Duration::from_secs(20);
const READ_TIMEOUT: Duration = Duration::from_secs(30);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub struct StreamListener {
    wss_endpoint: String,
    pump_program: String,
    dispatcher: Arc<Dispatcher>,
}

impl StreamListener {
    pub fn new(wss_endpoint: String, pump_program: String, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            wss_endpoint,
            pump_program,
            dispatcher,
        }
    }

    pub async fn run(self) {
        loop {
            info!(endpoint = %self.wss_endpoint, "connecting to block stream");
            if let Err(e) = self.connect_and_listen().await {
                warn!(error = %e, "block stream disconnected, reconnecting in {:?}", RECONNECT_DELAY);
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    async fn connect_and_listen(&self) -> Result<(), String> {
        let (ws, _response) = tokio_tungstenite::connect_async(&self.wss_endpoint)
            .await
            .map_err(|e| e.to_string())?;
        let (mut write, mut read) = ws.split();

        let subscribe = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "blockSubscribe",
            "params": [
                { "mentionsAccountOrProgram": self.pump_program },
                {
                    "commitment": "confirmed",
                    "encoding": "base64",
                    "showRewards": false,
                    "transactionDetails": "full",
                    "maxSupportedTransactionVersion": 0,
                },
            ],
        });
        write
            .send(Message::Text(subscribe.to_string()))
            .await
            .map_err(|e| e.to_string())?;

        let mut ping_ticker = tokio::time::interval(PING_INTERVAL);
        ping_ticker.tick().await;

        loop {
            tokio::select! {
                _ = ping_ticker.tick() => {
                    write.send(Message::Ping(Vec::new())).await.map_err(|e| e.to_string())?;
                }
                frame = tokio::time::timeout(READ_TIMEOUT, read.next()) => {
                    match frame {
                        Ok(Some(Ok(Message::Text(text)))) => {
                            self.handle_message(&text).await;
                        }
                        Ok(Some(Ok(_))) => {}
                        Ok(Some(Err(e))) => return Err(e.to_string()),
                        Ok(None) => return Err("stream closed by server".to_string()),
                        Err(_) => {
                            write.send(Message::Ping(Vec::new())).await.map_err(|e| e.to_string())?;
                        }
                    }
                }
            }
        }
    }

    async fn handle_message(&self, text: &str) {
        let notification: BlockNotification = match serde_json::from_str(text) {
            Ok(n) => n,
            Err(_) => {
                debug!("ignoring non-block-notification frame");
                return;
            }
        };

        let Some(params) = notification.params else {
            return;
        };
        let Some(block) = params.result.value.block else {
            return;
        };
        let Some(transactions) = block.transactions else {
            return;
        };

        for tx in transactions {
            if tx.meta.as_ref().and_then(|m| m.err.as_ref()).is_some() {
                continue;
            }
            let Some(raw) = tx.transaction.into_iter().next() else {
                continue;
            };
            self.dispatcher.dispatch_transaction(&raw).await;
        }
    }
}

#[derive(Debug, Deserialize)]
struct BlockNotification {
    method: Option<String>,
    params: Option<BlockParams>,
}

#[derive(Debug, Deserialize)]
struct BlockParams {
    result: BlockResult,
}

#[derive(Debug, Deserialize)]
struct BlockResult {
    value: BlockValue,
}

#[derive(Debug, Deserialize)]
struct BlockValue {
    block: Option<Block>,
}

#[derive(Debug, Deserialize)]
struct Block {
    transactions: Option<Vec<BlockTransaction>>,
}

#[derive(Debug, Deserialize)]
struct BlockTransaction {
    transaction: Vec<String>,
    meta: Option<TransactionMeta>,
}

#[derive(Debug, Deserialize)]
struct TransactionMeta {
    err: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_block_notification_envelope() {
        let text = r#"{
            "jsonrpc": "2.0",
            "method": "blockNotification",
            "params": {
                "result": {
                    "value": {
                        "block": {
                            "transactions": [
                                { "transaction": ["base64data"], "meta": { "err": null } }
                            ]
                        }
                    }
                }
            }
        }"#;
        let notification: BlockNotification = serde_json::from_str(text).unwrap();
        assert_eq!(notification.method.as_deref(), Some("blockNotification"));
        let block = notification.params.unwrap().result.value.block.unwrap();
        assert_eq!(block.transactions.unwrap().len(), 1);
    }

    #[test]
    fn skips_transactions_with_an_error() {
        let tx: BlockTransaction = serde_json::from_str(
            r#"{ "transaction": ["base64data"], "meta": { "err": {"InstructionError": [0, "Custom"]} } }"#,
        )
        .unwrap();
        assert!(tx.meta.unwrap().err.is_some());
    }
}
