use std::time::Duration;

use edocs_backend::push::{Backoff, PushSettings, spawn_connection};
use edocs_bridge::connection::ConnectionState;
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::{
    net::TcpListener,
    sync::{mpsc, oneshot, watch},
    time::timeout,
};
use tokio_tungstenite::{accept_async, tungstenite::Message};

const WAIT: Duration = Duration::from_secs(5);

fn fast_settings() -> PushSettings {
    PushSettings {
        keepalive_interval: Duration::from_millis(50),
        connect_timeout: Duration::from_secs(2),
        backoff: Backoff::new(Duration::from_millis(20), Duration::from_millis(100)),
        max_attempts: None,
    }
}

async fn bind() -> (TcpListener, Url) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let url = Url::parse(&format!("ws://{address}/ws/unread")).unwrap();
    (listener, url)
}

async fn wait_for_state(
    state_rx: &mut watch::Receiver<ConnectionState>,
    predicate: impl FnMut(&ConnectionState) -> bool,
) -> ConnectionState {
    let state = timeout(WAIT, state_rx.wait_for(predicate))
        .await
        .expect("connection state was not reached in time")
        .expect("connection loop ended");
    *state
}

#[tokio::test]
async fn forwards_events_in_order_and_drops_control_frames() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = accept_async(stream).await.unwrap();
        socket.send(Message::Text("ping".into())).await.unwrap();
        socket.send(Message::Text("pong".into())).await.unwrap();
        socket
            .send(Message::Text(r#"{"event":"document_read","user_id":1}"#.into()))
            .await
            .unwrap();
        socket
            .send(Message::Binary(
                br#"{"event":"document_read","user_id":2}"#.to_vec().into(),
            ))
            .await
            .unwrap();
        while let Some(Ok(message)) = socket.next().await {
            if message.is_close() {
                break;
            }
        }
    });

    let (payload_tx, mut payload_rx) = mpsc::channel(16);
    let handle = spawn_connection(url, fast_settings(), payload_tx);

    let first = timeout(WAIT, payload_rx.recv()).await.unwrap().unwrap();
    let second = timeout(WAIT, payload_rx.recv()).await.unwrap().unwrap();
    assert_eq!(first, r#"{"event":"document_read","user_id":1}"#);
    assert_eq!(second, r#"{"event":"document_read","user_id":2}"#);

    handle.close().await;
    timeout(WAIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn sends_keepalive_pings_while_connected() {
    let (listener, url) = bind().await;
    let (ping_tx, ping_rx) = oneshot::channel();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = accept_async(stream).await.unwrap();
        let mut ping_tx = Some(ping_tx);
        while let Some(Ok(message)) = socket.next().await {
            if message.to_text().ok() == Some("ping") {
                if let Some(ping_tx) = ping_tx.take() {
                    let _ = ping_tx.send(());
                }
            }
        }
    });

    let (payload_tx, _payload_rx) = mpsc::channel(16);
    let handle = spawn_connection(url, fast_settings(), payload_tx);

    timeout(WAIT, ping_rx)
        .await
        .expect("no keepalive ping received")
        .unwrap();
    assert_eq!(handle.state(), ConnectionState::Connected);
    handle.close().await;
}

#[tokio::test]
async fn zero_keepalive_interval_disables_pings() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = accept_async(stream).await.unwrap();
        socket
            .send(Message::Text(r#"{"event":"document_read","user_id":1}"#.into()))
            .await
            .unwrap();

        let mut pinged = false;
        while let Some(Ok(message)) = socket.next().await {
            if message.is_close() {
                break;
            }
            pinged |= message.to_text().ok() == Some("ping");
        }
        pinged
    });

    let settings = PushSettings {
        keepalive_interval: Duration::ZERO,
        ..fast_settings()
    };
    let (payload_tx, mut payload_rx) = mpsc::channel(16);
    let handle = spawn_connection(url, settings, payload_tx);

    let payload = timeout(WAIT, payload_rx.recv()).await.unwrap().unwrap();
    assert_eq!(payload, r#"{"event":"document_read","user_id":1}"#);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(handle.state(), ConnectionState::Connected);

    let mut state_rx = handle.subscribe();
    handle.close().await;
    assert_eq!(*state_rx.borrow_and_update(), ConnectionState::Disconnected);

    let pinged = timeout(WAIT, server).await.unwrap().unwrap();
    assert!(!pinged, "pings were sent with keepalives disabled");
}

#[tokio::test]
async fn reconnects_after_the_server_drops_the_connection() {
    let (listener, url) = bind().await;
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = accept_async(stream).await.unwrap();
        socket.close(None).await.unwrap();

        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = accept_async(stream).await.unwrap();
        socket
            .send(Message::Text(r#"{"event":"second_connection"}"#.into()))
            .await
            .unwrap();
        while socket.next().await.is_some() {}
    });

    let (payload_tx, mut payload_rx) = mpsc::channel(16);
    let handle = spawn_connection(url, fast_settings(), payload_tx);

    let payload = timeout(WAIT, payload_rx.recv()).await.unwrap().unwrap();
    assert_eq!(payload, r#"{"event":"second_connection"}"#);
    assert_eq!(handle.state(), ConnectionState::Connected);
    handle.close().await;
}

#[tokio::test]
async fn close_sends_a_close_frame_and_stops_reconnecting() {
    let (listener, url) = bind().await;
    let (stream_tx, stream_rx) = oneshot::channel();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = accept_async(stream).await.unwrap();
        let _ = stream_tx.send(());

        let mut saw_close = false;
        while let Some(Ok(message)) = socket.next().await {
            if message.is_close() {
                saw_close = true;
                break;
            }
        }

        let reconnected = timeout(Duration::from_millis(300), listener.accept())
            .await
            .is_ok();
        (saw_close, reconnected)
    });

    let (payload_tx, _payload_rx) = mpsc::channel(16);
    let handle = spawn_connection(url, fast_settings(), payload_tx);
    let mut state_rx = handle.subscribe();

    timeout(WAIT, stream_rx).await.unwrap().unwrap();
    wait_for_state(&mut state_rx, ConnectionState::is_connected).await;

    handle.close().await;
    assert_eq!(*state_rx.borrow(), ConnectionState::Disconnected);

    let (saw_close, reconnected) = timeout(WAIT, server).await.unwrap().unwrap();
    assert!(saw_close, "server never saw a close frame");
    assert!(!reconnected, "client reconnected after close");
}

#[tokio::test]
async fn backs_off_while_the_server_is_unreachable() {
    let (listener, url) = bind().await;
    drop(listener);

    let (payload_tx, _payload_rx) = mpsc::channel(16);
    let handle = spawn_connection(url, fast_settings(), payload_tx);
    let mut state_rx = handle.subscribe();

    let state = wait_for_state(&mut state_rx, |state| {
        matches!(state, ConnectionState::BackingOff { attempt, .. } if *attempt >= 2)
    })
    .await;
    match state {
        ConnectionState::BackingOff { delay, .. } => {
            assert!(delay <= Duration::from_millis(100));
            assert!(delay >= Duration::from_millis(20));
        }
        other => panic!("unexpected state {other:?}"),
    }

    handle.close().await;
    assert_eq!(*state_rx.borrow(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let (listener, url) = bind().await;
    drop(listener);

    let settings = PushSettings {
        max_attempts: Some(2),
        ..fast_settings()
    };
    let (payload_tx, _payload_rx) = mpsc::channel(16);
    let handle = spawn_connection(url, settings, payload_tx);
    let mut state_rx = handle.subscribe();

    timeout(WAIT, async {
        while state_rx.changed().await.is_ok() {}
    })
    .await
    .expect("connection loop did not stop");
    assert_eq!(*state_rx.borrow(), ConnectionState::Disconnected);
    assert_eq!(handle.state(), ConnectionState::Disconnected);
}
