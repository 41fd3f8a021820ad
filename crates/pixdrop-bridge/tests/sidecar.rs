// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! BridgeTransport against an in-process WebSocket sidecar.

use futures::{SinkExt, StreamExt};
use pixdrop_bridge::BridgeTransport;
use pixdrop_config::model::BridgeConfig;
use pixdrop_core::{
    CloseReason, Credentials, InboundEvent, MediaSource, MessagingTransport, TransportEvent,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Handle to a fake sidecar: frames the client sent, and a channel to push frames.
struct Sidecar {
    url: String,
    received: mpsc::UnboundedReceiver<Value>,
    outgoing: mpsc::UnboundedSender<WsMessage>,
}

impl Sidecar {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let (received_tx, received) = mpsc::unbounded_channel();
        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<WsMessage>();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let (mut write, mut read) = ws.split();
            loop {
                tokio::select! {
                    Some(frame) = outgoing_rx.recv() => {
                        if write.send(frame).await.is_err() {
                            break;
                        }
                    }
                    incoming = read.next() => match incoming {
                        Some(Ok(WsMessage::Text(text))) => {
                            let value: Value = serde_json::from_str(text.as_str()).unwrap();
                            let _ = received_tx.send(value);
                        }
                        Some(Ok(_)) => {}
                        _ => break,
                    },
                }
            }
        });

        Self {
            url,
            received,
            outgoing,
        }
    }

    fn push(&self, frame: Value) {
        self.outgoing
            .send(WsMessage::Text(frame.to_string().into()))
            .unwrap();
    }

    async fn next_received(&mut self) -> Value {
        self.received.recv().await.unwrap()
    }
}

fn transport_for(sidecar: &Sidecar) -> BridgeTransport {
    BridgeTransport::new(&BridgeConfig {
        url: sidecar.url.clone(),
        connect_timeout_secs: 5,
    })
}

#[tokio::test]
async fn hello_carries_stored_credentials() {
    let mut sidecar = Sidecar::start().await;
    let transport = transport_for(&sidecar);

    let creds = Credentials(json!({"device": "pixdrop-1"}));
    transport.connect(&creds).await.unwrap();

    let hello = sidecar.next_received().await;
    assert_eq!(hello["type"], "hello");
    assert_eq!(hello["credentials"]["device"], "pixdrop-1");
}

#[tokio::test]
async fn frames_become_transport_events() {
    let sidecar = Sidecar::start().await;
    let transport = transport_for(&sidecar);
    transport.connect(&Credentials::default()).await.unwrap();

    sidecar.push(json!({"type": "open"}));
    sidecar.push(json!({"type": "presence", "who": "alice"}));
    sidecar.push(json!({
        "type": "message",
        "id": "m1",
        "sender": "alice",
        "timestamp": 1_700_000_000,
        "kind": "image",
        "mime_type": "image/png",
        "caption": "cat",
        "data": "AQID",
    }));
    sidecar.push(json!({"type": "close", "reason": "logged_out"}));

    assert_eq!(transport.next_event().await, Some(TransportEvent::Open));

    // The unknown frame is skipped.
    match transport.next_event().await {
        Some(TransportEvent::Message(InboundEvent::Image(image))) => {
            assert_eq!(image.message_id, "m1");
            assert_eq!(image.sender, "alice");
            assert_eq!(image.content_type(), "image/png");
            assert_eq!(image.caption.as_deref(), Some("cat"));
            assert_eq!(image.media, MediaSource::Inline(vec![1, 2, 3]));
            assert_eq!(image.timestamp.unwrap().timestamp(), 1_700_000_000);
        }
        other => panic!("expected image event, got {other:?}"),
    }

    assert_eq!(
        transport.next_event().await,
        Some(TransportEvent::Closed(CloseReason::LoggedOut))
    );
}

#[tokio::test]
async fn websocket_close_without_reason_is_connection_lost() {
    let sidecar = Sidecar::start().await;
    let transport = transport_for(&sidecar);
    transport.connect(&Credentials::default()).await.unwrap();

    sidecar.outgoing.send(WsMessage::Close(None)).unwrap();

    assert_eq!(
        transport.next_event().await,
        Some(TransportEvent::Closed(CloseReason::ConnectionLost))
    );
}

#[tokio::test]
async fn send_text_writes_a_request_frame() {
    let mut sidecar = Sidecar::start().await;
    let transport = transport_for(&sidecar);
    transport.connect(&Credentials::default()).await.unwrap();
    let _hello = sidecar.next_received().await;

    let id = transport
        .send_text("alice", "could not save image")
        .await
        .unwrap();

    let frame = sidecar.next_received().await;
    assert_eq!(frame["type"], "send_text");
    assert_eq!(frame["to"], "alice");
    assert_eq!(frame["text"], "could not save image");
    assert_eq!(frame["request_id"], id.0.as_str());
}

#[tokio::test]
async fn unreachable_sidecar_is_a_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = BridgeTransport::new(&BridgeConfig {
        url: format!("ws://{addr}"),
        connect_timeout_secs: 2,
    });
    assert!(transport.connect(&Credentials::default()).await.is_err());
}
