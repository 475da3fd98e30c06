//! End-to-end tests for the telemetry listener.
//!
//! Run with: cargo test --test live_listener

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use lcu_bridge::live::{EventLog, Team};
use lcu_bridge::{
    AllGameData, Callback, GameEvent, GameEventKind, LiveClientApi, LiveListener, SnapshotSource,
};

// ============================================================================
// Helpers
// ============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn record(id: u64, name: &str) -> Value {
    json!({ "EventID": id, "EventName": name, "EventTime": id as f64 * 10.0 })
}

fn snapshot_body(records: &[Value]) -> String {
    json!({
        "allPlayers": [{ "championName": "Ryze", "team": "ORDER" }],
        "events": { "Events": records },
        "gameData": { "gameMode": "CLASSIC", "gameTime": 120.0 }
    })
    .to_string()
}

/// Serves each scripted body on its own connection, then 404 forever.
async fn serve_snapshots(bodies: Vec<String>) -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base = format!("http://{}/liveclientdata/", listener.local_addr()?);
    let mut bodies: VecDeque<String> = bodies.into();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = vec![0u8; 4096];
            let _ = stream.read(&mut buf).await;

            let (status, body) = match bodies.pop_front() {
                Some(body) => ("200 OK", body),
                None => ("404 Not Found", "{}".to_string()),
            };
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    Ok(base)
}

/// Plays back snapshots, then never answers.
struct Playback {
    frames: Mutex<VecDeque<Option<AllGameData>>>,
}

#[async_trait]
impl SnapshotSource for Playback {
    async fn snapshot(&self) -> lcu_bridge::Result<Option<AllGameData>> {
        let next = self.frames.lock().pop_front();
        match next {
            Some(frame) => Ok(frame),
            None => std::future::pending().await,
        }
    }
}

fn match_snapshot(ids: &[u64]) -> Option<AllGameData> {
    let events = ids
        .iter()
        .map(|&id| GameEvent::from_value(record(id, "ChampionKill")))
        .collect::<Result<Vec<_>, _>>()
        .ok()?;

    Some(AllGameData {
        events: EventLog { events },
        ..AllGameData::default()
    })
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_polls_http_api_until_game_closes() -> anyhow::Result<()> {
    init_tracing();

    let base = serve_snapshots(vec![
        snapshot_body(&[record(0, "GameStart"), record(1, "MinionsSpawning")]),
        snapshot_body(&[record(0, "GameStart"), record(1, "MinionsSpawning")]),
        snapshot_body(&[
            record(0, "GameStart"),
            record(1, "MinionsSpawning"),
            record(2, "FirstBrick"),
        ]),
    ])
    .await?;

    let api = LiveClientApi::builder().base_url(base).build()?;
    let listener = LiveListener::builder()
        .api(api)
        .poll_interval(Duration::from_millis(10))
        .stop_on_connection_lost(true)
        .build()?;

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    listener
        .on_game_event()
        .add(Callback::new(move |event: &GameEvent| {
            sink.lock().push((event.id, event.name.clone()));
        }));

    let updates = Arc::new(AtomicUsize::new(0));
    let teams = Arc::new(Mutex::new(Vec::new()));
    let (counter, team_sink) = (Arc::clone(&updates), Arc::clone(&teams));
    listener
        .on_data_updated()
        .add(Callback::new(move |data: &AllGameData| {
            team_sink.lock().extend(data.all_players.iter().map(|p| p.team));
            counter.fetch_add(1, Ordering::SeqCst);
        }));

    let lost = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&lost);
    listener.on_connection_lost().add(Callback::new(move |_: &()| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    listener.start(None)?;
    tokio::time::timeout(Duration::from_secs(10), listener.wait()).await??;

    assert_eq!(
        *events.lock(),
        vec![
            (0, "GameStart".to_string()),
            (1, "MinionsSpawning".to_string()),
            (2, "FirstBrick".to_string()),
        ]
    );
    assert_eq!(updates.load(Ordering::SeqCst), 3);
    assert_eq!(*teams.lock(), vec![Team::Order; 3]);
    assert_eq!(lost.load(Ordering::SeqCst), 1);
    assert!(!listener.is_running());

    Ok(())
}

#[tokio::test]
async fn test_new_match_replays_from_start() -> anyhow::Result<()> {
    init_tracing();

    let source = Arc::new(Playback {
        frames: Mutex::new(
            vec![
                match_snapshot(&[0, 1, 2]),
                None,
                match_snapshot(&[0]),
                match_snapshot(&[0, 1]),
            ]
            .into(),
        ),
    });

    let listener = LiveListener::builder()
        .source(source)
        .poll_interval(Duration::from_millis(1))
        .build()?;

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    listener
        .on_game_event()
        .add(Callback::new(move |event: &GameEvent| {
            if matches!(event.kind, GameEventKind::ChampionKill(_)) {
                sink.lock().push(event.id);
            }
        }));

    listener.start(None)?;
    for _ in 0..400 {
        if events.lock().len() == 5 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(*events.lock(), vec![0, 1, 2, 0, 1]);
    assert_eq!(listener.cursor(), 2);
    assert!(listener.is_running());

    listener.stop()?;
    listener.wait().await?;
    assert!(listener.snapshot().is_none());

    Ok(())
}
