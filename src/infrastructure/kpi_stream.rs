// Live update channel - WebSocket client for the KPI stream
use crate::domain::kpi::LiveUpdate;
use crate::infrastructure::config::ReconnectSettings;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::watch;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

/// One persistent socket per dashboard session, surfaced as a stream of
/// typed updates. Only `KPI_UPDATE` messages come out of `next()`;
/// malformed and unknown payloads are dropped at the source. Dropping
/// the channel closes the socket, and nothing buffered survives a
/// reconnect.
pub struct KpiStream {
    updates: Pin<Box<dyn Stream<Item = LiveUpdate> + Send>>,
    state: watch::Receiver<ChannelState>,
}

impl KpiStream {
    pub fn open(url: &str, reconnect: ReconnectSettings) -> Self {
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);
        let url = url.to_string();

        let updates = async_stream::stream! {
            let mut delay = Duration::from_secs(reconnect.initial_delay_secs.max(1));

            loop {
                let _ = state_tx.send(ChannelState::Connecting);

                match connect_async(url.as_str()).await {
                    Ok((mut socket, _)) => {
                        tracing::info!("connected to KPI stream at {url}");
                        let _ = state_tx.send(ChannelState::Open);
                        delay = Duration::from_secs(reconnect.initial_delay_secs.max(1));

                        while let Some(frame) = socket.next().await {
                            match frame {
                                Ok(Message::Text(text)) => {
                                    if let Some(update) = parse_update(&text) {
                                        yield update;
                                    }
                                }
                                Ok(Message::Close(_)) => {
                                    tracing::info!("KPI stream closed by server");
                                    break;
                                }
                                Ok(_) => {}
                                Err(e) => {
                                    tracing::warn!("KPI stream read error: {e}");
                                    break;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!("KPI stream connect to {url} failed: {e}");
                    }
                }

                let _ = state_tx.send(ChannelState::Closed);
                if !reconnect.enabled {
                    return;
                }

                tracing::debug!("reconnecting KPI stream in {}s", delay.as_secs());
                tokio::time::sleep(delay).await;
                delay = next_delay(delay, &reconnect);
            }
        };

        Self {
            updates: Box::pin(updates),
            state: state_rx,
        }
    }

    /// Next live update, or None once the channel is closed for good.
    pub async fn next(&mut self) -> Option<LiveUpdate> {
        self.updates.next().await
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Tear the channel down; dropping the stream closes the socket.
    pub fn close(self) {}
}

/// Parse one text frame. Malformed payloads are dropped with a log line;
/// well-formed messages of an unknown type are ignored.
fn parse_update(text: &str) -> Option<LiveUpdate> {
    match serde_json::from_str::<LiveUpdate>(text) {
        Ok(LiveUpdate::Unknown) => {
            tracing::debug!("ignoring unknown stream message type");
            None
        }
        Ok(update) => Some(update),
        Err(e) => {
            tracing::warn!("dropping malformed stream message: {e}");
            None
        }
    }
}

/// Capped exponential backoff between reconnect attempts.
fn next_delay(current: Duration, settings: &ReconnectSettings) -> Duration {
    let doubled = current.saturating_mul(2);
    doubled.min(Duration::from_secs(settings.max_delay_secs.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kpi_update() {
        let update = parse_update(
            r#"{"type":"KPI_UPDATE","payload":{"total_revenue":58000,"active_orders":140}}"#,
        );
        match update {
            Some(LiveUpdate::KpiUpdate { payload }) => {
                assert_eq!(payload.total_revenue, Some(58000.0));
            }
            other => panic!("unexpected parse result: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_payload_dropped() {
        assert_eq!(parse_update("not json at all"), None);
        assert_eq!(parse_update(r#"{"payload":{}}"#), None);
    }

    #[test]
    fn test_unknown_type_ignored() {
        assert_eq!(
            parse_update(r#"{"type":"INVENTORY_UPDATE","payload":{"sku":"A-1"}}"#),
            None
        );
    }

    #[test]
    fn test_backoff_doubles_to_cap() {
        let settings = ReconnectSettings {
            enabled: true,
            initial_delay_secs: 1,
            max_delay_secs: 8,
        };

        let mut delay = Duration::from_secs(settings.initial_delay_secs);
        let mut observed = Vec::new();
        for _ in 0..5 {
            delay = next_delay(delay, &settings);
            observed.push(delay.as_secs());
        }
        assert_eq!(observed, [2, 4, 8, 8, 8]);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_without_reconnect_ends_stream() {
        // Port 9 is discard; connection should fail fast and, with
        // reconnect disabled, the stream ends instead of retrying.
        let mut stream = KpiStream::open(
            "ws://127.0.0.1:9/ws/kpi-stream",
            ReconnectSettings::default(),
        );
        assert_eq!(stream.next().await, None);
        assert_eq!(stream.state(), ChannelState::Closed);
    }
}
