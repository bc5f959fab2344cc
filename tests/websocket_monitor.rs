//! Connection monitors against real local sockets.

mod common;

use std::time::Duration;

use liveprobe::backends::{RedisConnector, TcpConnector, WebSocketConnector};
use liveprobe::health::{ConnectionMonitor, ConnectionPhase, HeartbeatConfig, MonitorError};
use liveprobe::resilience::BackoffPolicy;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use common::{closed_addr, wait_for, FakeRedis, WsServer};

fn heartbeat(tolerance: u32) -> HeartbeatConfig {
    HeartbeatConfig::new(Duration::from_millis(50), tolerance, Duration::from_millis(500))
}

#[tokio::test]
async fn test_websocket_monitor_reconnects_after_server_restart() {
    let server = WsServer::start().await;
    let monitor = ConnectionMonitor::new(
        "websocket",
        WebSocketConnector::new(server.url()),
        BackoffPolicy::new(20, Duration::from_millis(50)),
        heartbeat(2),
    );
    let state = monitor.state();
    let (tx, rx) = broadcast::channel(1);
    let task = tokio::spawn(monitor.run(rx));

    assert!(wait_for(|| state.is_connected(), Duration::from_secs(2)).await);

    // Pings keep the session alive.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(state.is_connected());

    let addr = server.stop().await;
    assert!(wait_for(|| !state.is_connected(), Duration::from_secs(2)).await);
    assert_eq!(state.phase(), ConnectionPhase::Reconnecting);

    let _server = WsServer::bind(addr).await;
    assert!(wait_for(|| state.is_connected(), Duration::from_secs(5)).await);

    tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
    assert!(result.is_ok());
    assert_eq!(state.phase(), ConnectionPhase::Disconnected);
}

#[tokio::test]
async fn test_websocket_monitor_gives_up_when_server_stays_down() {
    let server = WsServer::start().await;
    let monitor = ConnectionMonitor::new(
        "websocket",
        WebSocketConnector::new(server.url()),
        BackoffPolicy::new(3, Duration::from_millis(20)),
        heartbeat(1),
    );
    let state = monitor.state();
    let (_tx, rx) = broadcast::channel(1);
    let task = tokio::spawn(monitor.run(rx));

    assert!(wait_for(|| state.is_connected(), Duration::from_secs(2)).await);
    server.stop().await;

    let result = tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    match result {
        Err(MonitorError::RetriesExhausted { backend, attempts, .. }) => {
            assert_eq!(backend, "websocket");
            assert_eq!(attempts, 3);
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(()) => panic!("monitor should have failed"),
    }
    assert_eq!(state.phase(), ConnectionPhase::Failed);
}

#[tokio::test]
async fn test_websocket_connect_to_closed_port_fails() {
    let addr = closed_addr().await;
    let mut monitor = ConnectionMonitor::new(
        "websocket",
        WebSocketConnector::new(format!("ws://{}", addr)),
        BackoffPolicy::new(2, Duration::from_millis(10)),
        heartbeat(3),
    );

    let err = monitor.connect().await.unwrap_err();
    assert_eq!(err.backend(), "websocket");
    assert!(!monitor.is_connected());
}

#[tokio::test]
async fn test_cache_monitor_flips_on_first_failed_ping() {
    let redis = FakeRedis::start().await;
    let mut monitor = ConnectionMonitor::new(
        "cache",
        RedisConnector::new(&redis.url()).unwrap(),
        BackoffPolicy::new(1, Duration::from_millis(10)),
        heartbeat(1),
    );

    monitor.connect().await.unwrap();
    assert!(monitor.is_connected());
    monitor.tick().await.unwrap();
    assert!(monitor.is_connected());

    redis.stop().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // One failed ping is enough; the single reconnect attempt is refused.
    let err = monitor.tick().await.unwrap_err();
    assert_eq!(err.backend(), "cache");
    assert!(!monitor.is_connected());
}

#[tokio::test]
async fn test_broker_monitor_tracks_listener() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let mut monitor = ConnectionMonitor::new(
        "kafka",
        TcpConnector::new(vec![addr]),
        BackoffPolicy::new(1, Duration::from_millis(10)),
        heartbeat(1),
    );

    monitor.connect().await.unwrap();
    monitor.tick().await.unwrap();
    assert!(monitor.is_connected());

    drop(listener);
    assert!(monitor.tick().await.is_err());
    assert!(!monitor.is_connected());
}
