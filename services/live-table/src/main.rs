use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State as AxumState;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use spindle_engine::{
    BetReceipt, MemoryStore, OutcomeGenerator, RoundSnapshot, Table, TableConfig, TableError,
    TableEvent,
};
use spindle_types::{Account, BetKind, Outcome, PlayerSettlement, SettlementResult};
use tokio::sync::{broadcast, mpsc};
use tokio::time;
use tracing::{info, warn};

#[derive(Clone, Debug)]
struct ServiceConfig {
    table: TableConfig,
    tick_ms: u64,
    wheel_seed: Option<u64>,
}

impl ServiceConfig {
    fn from_env() -> Self {
        Self {
            table: TableConfig {
                betting_ms: read_u64("SPINDLE_BETTING_MS", 20_000),
                spin_ms: read_u64("SPINDLE_SPIN_MS", 6_000),
                min_bet: read_u64("SPINDLE_MIN_BET", 1),
                max_bet: read_u64("SPINDLE_MAX_BET", 1_000),
                max_bets_per_round: read_u8("SPINDLE_MAX_BETS", 16),
            },
            // interval() panics on a zero period.
            tick_ms: read_u64("SPINDLE_TICK_MS", 250).max(1),
            wheel_seed: std::env::var("SPINDLE_WHEEL_SEED")
                .ok()
                .and_then(|raw| raw.parse::<u64>().ok()),
        }
    }
}

fn read_u64(key: &str, fallback: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(fallback)
}

fn read_u8(key: &str, fallback: u8) -> u8 {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<u8>().ok())
        .unwrap_or(fallback)
}

/// Milliseconds on the table clock, anchored at service start.
#[derive(Clone)]
struct TableClock {
    start: Instant,
}

impl TableClock {
    fn new() -> Self {
        Self { start: Instant::now() }
    }

    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

#[derive(Clone)]
struct AppState {
    table: Arc<Mutex<Table<MemoryStore, OutcomeGenerator>>>,
    broadcaster: broadcast::Sender<OutboundEvent>,
    clock: TableClock,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum InboundMessage {
    Join {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "playerId")]
        player_id: String,
    },
    Leave {
        #[serde(rename = "requestId")]
        request_id: Option<String>,
        #[serde(rename = "playerId")]
        player_id: String,
    },
    Bet {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "playerId")]
        player_id: String,
        #[serde(rename = "betType")]
        kind: BetKind,
        #[serde(default)]
        numbers: Vec<u8>,
        amount: u64,
    },
    Snapshot {
        #[serde(rename = "requestId")]
        request_id: String,
    },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum OutboundEvent {
    /// Table-wide view, broadcast on every tick and after phase changes.
    State { payload: RoundSnapshot },
    /// Per-player settlement line, broadcast at the end of each round.
    /// Clients filter on `playerId`.
    Result {
        #[serde(rename = "playerId")]
        player_id: String,
        #[serde(rename = "roundId")]
        round_id: u64,
        outcome: Outcome,
        payload: PlayerSettlement,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum OutboundResponse {
    Ack {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        account: Option<Account>,
        #[serde(skip_serializing_if = "Option::is_none")]
        receipt: Option<BetReceipt>,
        #[serde(skip_serializing_if = "Option::is_none")]
        snapshot: Option<RoundSnapshot>,
    },
    Error {
        #[serde(rename = "requestId")]
        request_id: String,
        code: &'static str,
        message: String,
    },
}

impl OutboundResponse {
    fn ack(request_id: String) -> Self {
        OutboundResponse::Ack {
            request_id,
            account: None,
            receipt: None,
            snapshot: None,
        }
    }
}

fn broadcast_events(
    broadcaster: &broadcast::Sender<OutboundEvent>,
    events: Vec<TableEvent>,
    snapshot: RoundSnapshot,
) {
    for event in events {
        if let TableEvent::Settled { result } = event {
            broadcast_settlement(broadcaster, &result);
        }
    }
    let _ = broadcaster.send(OutboundEvent::State { payload: snapshot });
}

fn broadcast_settlement(broadcaster: &broadcast::Sender<OutboundEvent>, result: &SettlementResult) {
    for settled in &result.per_player {
        let _ = broadcaster.send(OutboundEvent::Result {
            player_id: settled.player.clone(),
            round_id: result.round_id,
            outcome: result.outcome,
            payload: settled.clone(),
        });
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    AxumState(state): AxumState<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let mut broadcast_rx = state.broadcaster.subscribe();

    let write_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let broadcast_task = {
        let tx = tx.clone();
        tokio::spawn(async move {
            while let Ok(event) = broadcast_rx.recv().await {
                if let Ok(payload) = serde_json::to_string(&event) {
                    let _ = tx.send(Message::Text(payload));
                }
            }
        })
    };

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<InboundMessage>(&text) {
                Ok(inbound) => handle_inbound(inbound, &state, &tx),
                Err(err) => {
                    warn!(?err, "invalid inbound message");
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    write_task.abort();
    broadcast_task.abort();
}

fn handle_inbound(inbound: InboundMessage, state: &AppState, tx: &mpsc::UnboundedSender<Message>) {
    let now_ms = state.clock.now_ms();
    match inbound {
        InboundMessage::Join { request_id, player_id } => {
            let response = {
                let mut table = state.table.lock().unwrap();
                match table.join(&player_id) {
                    Ok(account) => {
                        let snapshot = table.snapshot(now_ms);
                        OutboundResponse::Ack {
                            request_id,
                            account: Some(account),
                            receipt: None,
                            snapshot: Some(snapshot),
                        }
                    }
                    Err(err) => error_response(request_id, err),
                }
            };
            send_response(tx, response);
        }
        InboundMessage::Leave { request_id, player_id } => {
            {
                let mut table = state.table.lock().unwrap();
                table.leave(&player_id);
            }
            if let Some(request_id) = request_id {
                send_response(tx, OutboundResponse::ack(request_id));
            }
        }
        InboundMessage::Bet {
            request_id,
            player_id,
            kind,
            numbers,
            amount,
        } => {
            let response = {
                let mut table = state.table.lock().unwrap();
                match table.place_bet(&player_id, kind, &numbers, amount, now_ms) {
                    Ok(receipt) => OutboundResponse::Ack {
                        request_id,
                        account: None,
                        receipt: Some(receipt),
                        snapshot: None,
                    },
                    Err(err) => error_response(request_id, err),
                }
            };
            send_response(tx, response);
        }
        InboundMessage::Snapshot { request_id } => {
            let snapshot = {
                let table = state.table.lock().unwrap();
                table.snapshot(now_ms)
            };
            send_response(
                tx,
                OutboundResponse::Ack {
                    request_id,
                    account: None,
                    receipt: None,
                    snapshot: Some(snapshot),
                },
            );
        }
    }
}

fn send_response(tx: &mpsc::UnboundedSender<Message>, response: OutboundResponse) {
    if let Ok(payload) = serde_json::to_string(&response) {
        let _ = tx.send(Message::Text(payload));
    }
}

fn error_response(request_id: String, err: TableError) -> OutboundResponse {
    OutboundResponse::Error {
        request_id,
        code: err.code(),
        message: err.to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let host = std::env::var("SPINDLE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("SPINDLE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(9123);

    let config = ServiceConfig::from_env();
    let wheel = match config.wheel_seed {
        Some(seed) => OutcomeGenerator::from_seed(seed),
        None => OutcomeGenerator::from_entropy(),
    };
    let clock = TableClock::new();
    let table = Table::new(config.table, wheel, MemoryStore::new(), clock.now_ms())
        .map_err(|err| anyhow::anyhow!("table failed to open: {err}"))?;
    let table = Arc::new(Mutex::new(table));
    let (broadcaster, _) = broadcast::channel::<OutboundEvent>(1024);

    let state = AppState {
        table: table.clone(),
        broadcaster: broadcaster.clone(),
        clock: clock.clone(),
    };

    // Tick loop
    let tick_table = table.clone();
    let tick_broadcaster = broadcaster.clone();
    let tick_clock = clock.clone();
    let tick_ms = config.tick_ms;
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_millis(tick_ms));
        loop {
            interval.tick().await;
            let now_ms = tick_clock.now_ms();
            let (events, snapshot) = {
                let mut table = tick_table.lock().unwrap();
                match table.tick(now_ms) {
                    Ok(events) => (events, table.snapshot(now_ms)),
                    Err(err) => {
                        warn!(?err, "tick failed");
                        continue;
                    }
                }
            };
            broadcast_events(&tick_broadcaster, events, snapshot);
        }
    });

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(healthz))
        .with_state(state);

    let addr: SocketAddr = format!("{host}:{port}").parse().context("invalid listen addr")?;
    info!(%addr, "spindle live table listening");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}
