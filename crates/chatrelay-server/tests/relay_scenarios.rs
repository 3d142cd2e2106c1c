//! End-to-end relay behaviour over loopback TCP.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;

use chatrelay_core::error::Result;
use chatrelay_core::{JsonRecordCodec, Record, WireRecord};
use chatrelay_server::config::{RelayConfig, ServerSection};
use chatrelay_server::{supervisor, AppState};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const SILENCE: Duration = Duration::from_millis(200);

struct Relay {
    addr: SocketAddr,
    app: AppState,
    shutdown: CancellationToken,
    task: JoinHandle<Result<()>>,
}

async fn start(mut cfg: RelayConfig) -> Relay {
    cfg.server.listen = "127.0.0.1:0".into();
    let listener = supervisor::bind(&cfg.server).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = AppState::new(cfg);
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(supervisor::serve(listener, app.clone(), shutdown.clone()));
    Relay {
        addr,
        app,
        shutdown,
        task,
    }
}

struct Peer {
    framed: Framed<TcpStream, JsonRecordCodec<Record>>,
}

impl Peer {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let mut peer = Self {
            framed: Framed::new(stream, JsonRecordCodec::default()),
        };
        assert_eq!(peer.recv().await, Record::RequestUsername);
        peer
    }

    async fn register(addr: SocketAddr, name: &str) -> Self {
        let mut peer = Self::connect(addr).await;
        peer.send_wire("request_username", name, "").await;
        peer
    }

    async fn send_wire(&mut self, kind: &str, username: &str, message: &str) {
        self.framed
            .send(WireRecord {
                kind: kind.into(),
                username: username.into(),
                message: message.into(),
            })
            .await
            .unwrap();
    }

    async fn say(&mut self, message: &str) {
        self.send_wire("message", "", message).await;
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.framed.get_mut().write_all(bytes).await.unwrap();
    }

    async fn recv(&mut self) -> Record {
        tokio::time::timeout(RECV_TIMEOUT, self.framed.next())
            .await
            .expect("timed out waiting for a record")
            .expect("stream closed")
            .expect("decode failed")
    }

    async fn expect_silence(&mut self) {
        if let Ok(Some(rec)) = tokio::time::timeout(SILENCE, self.framed.next()).await {
            panic!("unexpected record: {rec:?}");
        }
    }
}

/// alice, bob, carol registered in that order, with every join observed.
async fn three_peers(addr: SocketAddr) -> (Peer, Peer, Peer) {
    let mut alice = Peer::register(addr, "alice").await;
    let mut bob = Peer::register(addr, "bob").await;
    assert_eq!(alice.recv().await, Record::user_joined("bob"));
    let carol = Peer::register(addr, "carol").await;
    assert_eq!(alice.recv().await, Record::user_joined("carol"));
    assert_eq!(bob.recv().await, Record::user_joined("carol"));
    (alice, bob, carol)
}

#[tokio::test]
async fn alice_bob_carol_scenario() {
    let relay = start(RelayConfig::default()).await;
    let (mut alice, mut bob, mut carol) = three_peers(relay.addr).await;

    alice.say("hi").await;
    assert_eq!(bob.recv().await, Record::message("alice", "hi"));
    assert_eq!(carol.recv().await, Record::message("alice", "hi"));
    alice.expect_silence().await;

    drop(bob);
    assert_eq!(alice.recv().await, Record::user_left("bob"));
    assert_eq!(carol.recv().await, Record::user_left("bob"));
    alice.expect_silence().await;
    carol.expect_silence().await;
}

#[tokio::test]
async fn registered_name_is_authoritative() {
    let relay = start(RelayConfig::default()).await;
    let (mut alice, mut bob, _carol) = three_peers(relay.addr).await;

    bob.send_wire("user_left", "alice", "forged").await;
    assert_eq!(alice.recv().await, Record::message("bob", "forged"));
}

#[tokio::test]
async fn unregistered_disconnect_is_silent() {
    let relay = start(RelayConfig::default()).await;
    let mut alice = Peer::register(relay.addr, "alice").await;

    let eve = Peer::connect(relay.addr).await;
    drop(eve);
    alice.expect_silence().await;

    let _bob = Peer::register(relay.addr, "bob").await;
    assert_eq!(alice.recv().await, Record::user_joined("bob"));
}

#[tokio::test]
async fn malformed_record_drops_only_its_session() {
    let relay = start(RelayConfig::default()).await;
    let (mut alice, mut bob, mut carol) = three_peers(relay.addr).await;

    carol.send_raw(b"{oops}\n").await;
    assert_eq!(alice.recv().await, Record::user_left("carol"));
    assert_eq!(bob.recv().await, Record::user_left("carol"));

    // The relay closes carol's transport.
    let closed = tokio::time::timeout(RECV_TIMEOUT, carol.framed.next()).await.unwrap();
    assert!(closed.is_none());

    alice.say("still here").await;
    assert_eq!(bob.recv().await, Record::message("alice", "still here"));
    assert_eq!(relay.app.registry().usernames().await, vec!["alice", "bob"]);
}

#[tokio::test]
async fn registry_drains_as_peers_leave() {
    let relay = start(RelayConfig::default()).await;
    let (mut alice, bob, carol) = three_peers(relay.addr).await;
    assert_eq!(relay.app.registry().len().await, 3);

    drop(bob);
    assert_eq!(alice.recv().await, Record::user_left("bob"));
    drop(carol);
    assert_eq!(alice.recv().await, Record::user_left("carol"));
    assert_eq!(relay.app.registry().usernames().await, vec!["alice"]);
}

#[tokio::test]
async fn shutdown_stops_accepting_and_drains() {
    let mut cfg = RelayConfig::default();
    cfg.session.interrupt_reads_on_shutdown = true;
    cfg.shutdown.drain_timeout_ms = 2000;
    let relay = start(cfg).await;
    let (mut alice, _bob, _carol) = three_peers(relay.addr).await;

    relay.shutdown.cancel();
    relay.task.await.unwrap().unwrap();

    assert!(relay.app.registry().is_empty().await);
    // No user_left on shutdown, just a closed transport.
    let end = tokio::time::timeout(RECV_TIMEOUT, alice.framed.next()).await.unwrap();
    assert!(end.is_none());
}

#[tokio::test]
async fn bind_failure_is_reported() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let cfg = ServerSection {
        listen: taken.local_addr().unwrap().to_string(),
        ..ServerSection::default()
    };
    let err = supervisor::bind(&cfg).await.unwrap_err();
    assert_eq!(err.code(), "IO");
}
