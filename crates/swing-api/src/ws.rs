//! Swing detection WebSocket endpoint.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use swing_models::{ProtocolError, ServerMessage};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::detection::{FrameIngestor, SharedSession};
use crate::metrics;
use crate::state::AppState;

const ENDPOINT: &str = "swing_detection";

const WS_SEND_BUFFER_SIZE: usize = 32;
const WS_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Queue a status message on the bounded outbound channel.
///
/// Returns `Ok(false)` once the client is gone.
async fn send_message(tx: &mpsc::Sender<Message>, message: &ServerMessage) -> anyhow::Result<bool> {
    let json = serde_json::to_string(message)?;
    let status = message.status();

    let delivered = match tx.try_send(Message::Text(json)) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(msg)) => {
            debug!("WebSocket send buffer full, applying backpressure");
            tx.send(msg).await.is_ok()
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    };

    if delivered {
        metrics::record_ws_message_sent(ENDPOINT, status.as_str());
    }
    Ok(delivered)
}

/// `GET /ws/swing-detection`
pub async fn ws_swing_detection(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    metrics::record_ws_connection(ENDPOINT);

    ws.max_message_size(state.config.ws_max_message_size)
        .on_upgrade(move |socket| handle_swing_socket(socket, state))
}

/// Drive one client connection: one session, one reply per frame message.
async fn handle_swing_socket(socket: WebSocket, state: AppState) {
    let (ws_sender, receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(WS_SEND_BUFFER_SIZE);

    let send_task = tokio::spawn(async move {
        let mut ws_sender = ws_sender;
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    let (session_id, session) = state.sessions.create_session().await;
    info!(session_id = %session_id, "Swing detection session started");

    // Unregister however the connection ends
    let sessions = state.sessions.clone();
    let cleanup_id = session_id.clone();
    let _guard = scopeguard::guard((), move |_| {
        tokio::spawn(async move {
            sessions.remove_session(&cleanup_id).await;
        });
    });

    let connected = ServerMessage::connected(
        session_id.clone(),
        state.detection.submission_threshold_seconds,
        state.detection.post_detection_cooldown_seconds,
    );

    let outcome = match send_message(&tx, &connected).await {
        Ok(true) => run_ingestion_loop(receiver, &tx, &session, &state.ingestor).await,
        Ok(false) => Ok(()),
        Err(e) => Err(e),
    };

    if let Err(e) = outcome {
        error!(session_id = %session_id, "Swing detection session failed: {:#}", e);
        let _ = send_message(&tx, &ServerMessage::error(format!("Internal server error: {}", e))).await;
    }

    let summary = session.lock().await.summary();
    info!(
        session_id = %session_id,
        frames = summary.frames_received,
        analyses = summary.analyses_run,
        swings = summary.total_swings,
        "Swing detection session ended"
    );

    drop(tx);
    let _ = send_task.await;
}

async fn run_ingestion_loop(
    mut receiver: SplitStream<WebSocket>,
    tx: &mpsc::Sender<Message>,
    session: &SharedSession,
    ingestor: &FrameIngestor,
) -> anyhow::Result<()> {
    let mut heartbeat = interval(WS_HEARTBEAT_INTERVAL);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let reply = match incoming {
                    Some(Ok(Message::Text(text))) => {
                        metrics::record_ws_message_received(ENDPOINT);
                        let mut session = session.lock().await;
                        ingestor.handle_text(&mut session, &text).await
                    }
                    Some(Ok(Message::Binary(_))) => {
                        metrics::record_ws_message_received(ENDPOINT);
                        ServerMessage::error(ProtocolError::UnsupportedMessage.to_string())
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Client closed connection");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket receive failed: {}", e);
                        break;
                    }
                };

                if !send_message(tx, &reply).await? {
                    debug!("Client disconnected before reply");
                    break;
                }
            }
            _ = heartbeat.tick() => {
                if tx.send(Message::Ping(Vec::new())).await.is_err() {
                    debug!("Heartbeat failed, client disconnected");
                    break;
                }
            }
        }
    }

    Ok(())
}
