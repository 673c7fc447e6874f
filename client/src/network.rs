//! Connection manager for the game socket.
//!
//! [`Connection`] owns exactly one transport at a time. It decodes inbound
//! frames, answers server liveness probes, hands each message to the handler
//! registered for its kind, runs the client latency probe and reports the
//! end of the connection exactly once through the error channel.
//!
//! The socket itself sits behind [`Connector`]: production code uses
//! [`WebSocketConnector`], tests wire a [`transport_pair`] and play the
//! server by hand.

use crate::error::ClientError;
use crate::timer::{Clock, Ticker};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::protocol::{self, Message, MessageKind};
use std::collections::{HashMap, VecDeque};
use std::future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Probes older than this many unanswered pings are forgotten.
const MAX_PENDING_PROBES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closing,
    Closed,
}

/// What the transport reports back to the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Frame(String),
    Closed { clean: bool, reason: String },
    Failed(String),
}

/// Connection side of a transport: frames out, events in.
///
/// Dropping `outgoing` asks the transport to close.
#[derive(Debug)]
pub struct TransportHandle {
    pub outgoing: mpsc::UnboundedSender<String>,
    pub incoming: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Socket side of a transport: frames the connection sent, and the channel
/// to report socket activity on.
#[derive(Debug)]
pub struct RemoteEnd {
    pub sent: mpsc::UnboundedReceiver<String>,
    pub events: mpsc::UnboundedSender<TransportEvent>,
}

pub fn transport_pair() -> (TransportHandle, RemoteEnd) {
    let (outgoing, sent) = mpsc::unbounded_channel();
    let (events, incoming) = mpsc::unbounded_channel();
    (
        TransportHandle { outgoing, incoming },
        RemoteEnd { sent, events },
    )
}

pub trait Connector {
    /// Starts connecting in the background and returns immediately.
    fn connect(&mut self, url: &str) -> TransportHandle;
}

/// Text-frame WebSocket transport on a spawned tokio task.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    fn connect(&mut self, url: &str) -> TransportHandle {
        let (handle, remote) = transport_pair();
        tokio::spawn(run_websocket(url.to_string(), remote));
        handle
    }
}

async fn run_websocket(url: String, remote: RemoteEnd) {
    let RemoteEnd { mut sent, events } = remote;

    let (stream, _response) = match connect_async(url.as_str()).await {
        Ok(connected) => connected,
        Err(e) => {
            let _ = events.send(TransportEvent::Failed(e.to_string()));
            return;
        }
    };

    if events.send(TransportEvent::Opened).is_err() {
        return;
    }

    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            frame = sent.recv() => match frame {
                Some(text) => {
                    if let Err(e) = sink.send(WsMessage::Text(text)).await {
                        let _ = events.send(TransportEvent::Failed(e.to_string()));
                        return;
                    }
                }
                None => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    let _ = sink.close().await;
                    let _ = events.send(TransportEvent::Closed {
                        clean: true,
                        reason: "closed by client".to_string(),
                    });
                    return;
                }
            },
            incoming = source.next() => match incoming {
                Some(Ok(WsMessage::Text(text))) => {
                    let _ = events.send(TransportEvent::Frame(text));
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    let reason = frame
                        .map(|frame| frame.reason.into_owned())
                        .unwrap_or_default();
                    let _ = events.send(TransportEvent::Closed { clean: true, reason });
                    return;
                }
                // Control frames are answered by tungstenite; binary frames are not part of the protocol.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = events.send(TransportEvent::Failed(e.to_string()));
                    return;
                }
                None => {
                    let _ = events.send(TransportEvent::Closed {
                        clean: false,
                        reason: "stream ended".to_string(),
                    });
                    return;
                }
            },
        }
    }
}

/// Outcome of one [`Connection::process_next`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Opened,
    Received(MessageKind),
    /// An inbound frame that did not decode.
    Dropped,
    /// A latency probe went out (or failed to).
    Probed,
    Closed,
}

type Handler = Box<dyn FnMut(&Message) + Send>;
type LatencyObserver = Box<dyn FnMut(i64) + Send>;

enum Wake {
    Transport(Option<TransportEvent>),
    Probe,
}

pub struct Connection {
    url: String,
    connector: Box<dyn Connector>,
    clock: Arc<dyn Clock>,
    errors: mpsc::UnboundedSender<ClientError>,
    state: ConnectionState,
    outgoing: Option<mpsc::UnboundedSender<String>>,
    incoming: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    handlers: HashMap<MessageKind, Handler>,
    ping: Ticker,
    ping_period: Duration,
    pending_probes: VecDeque<i64>,
    latency_ms: Option<i64>,
    latency_observer: Option<LatencyObserver>,
}

impl Connection {
    pub fn new(
        url: impl Into<String>,
        connector: Box<dyn Connector>,
        clock: Arc<dyn Clock>,
        errors: mpsc::UnboundedSender<ClientError>,
    ) -> Self {
        Self {
            url: url.into(),
            connector,
            clock,
            errors,
            state: ConnectionState::Idle,
            outgoing: None,
            incoming: None,
            handlers: HashMap::new(),
            ping: Ticker::stopped(),
            ping_period: crate::config::DEFAULT_PING_PERIOD,
            pending_probes: VecDeque::new(),
            latency_ms: None,
            latency_observer: None,
        }
    }

    pub fn with_ping_period(mut self, period: Duration) -> Self {
        self.ping_period = period;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn latency_ms(&self) -> Option<i64> {
        self.latency_ms
    }

    pub fn is_pinging(&self) -> bool {
        self.ping.is_running()
    }

    /// Starts connecting. Calling this on a connection that is not idle is a
    /// caller bug and is not guarded against.
    pub fn open(&mut self) {
        info!("Connecting to {}", self.url);

        let handle = self.connector.connect(&self.url);
        self.outgoing = Some(handle.outgoing);
        self.incoming = Some(handle.incoming);
        self.state = ConnectionState::Connecting;
    }

    /// Registers the callback for one message kind, replacing any earlier one.
    pub fn register_handler<F>(&mut self, kind: MessageKind, handler: F)
    where
        F: FnMut(&Message) + Send + 'static,
    {
        self.handlers.insert(kind, Box::new(handler));
    }

    pub fn set_latency_observer<F>(&mut self, observer: F)
    where
        F: FnMut(i64) + Send + 'static,
    {
        self.latency_observer = Some(Box::new(observer));
    }

    pub fn send(&mut self, message: &Message) -> Result<(), ClientError> {
        match self.state {
            ConnectionState::Idle | ConnectionState::Connecting => Err(ClientError::NotOpen),
            ConnectionState::Closing | ConnectionState::Closed => Err(ClientError::LostConnection),
            ConnectionState::Open => {
                let outgoing = self.outgoing.as_ref().ok_or(ClientError::LostConnection)?;
                outgoing
                    .send(protocol::encode(message))
                    .map_err(|_| ClientError::LostConnection)
            }
        }
    }

    /// Starts the once-per-period latency probe. A no-op while it is running.
    pub fn run_ping(&mut self) {
        if self.ping.is_running() {
            return;
        }

        debug!("Starting latency probe every {:?}", self.ping_period);
        self.ping.start(self.ping_period);
    }

    /// Closes the transport from our side. Not reported as a failure.
    pub fn close(&mut self) {
        if matches!(self.state, ConnectionState::Closing | ConnectionState::Closed) {
            return;
        }

        info!("Closing connection to {}", self.url);
        self.ping.stop();
        self.outgoing = None;
        self.state = if self.incoming.is_some() {
            ConnectionState::Closing
        } else {
            ConnectionState::Closed
        };
    }

    /// Waits for the next transport event or probe tick and handles it.
    ///
    /// Cancel-safe: nothing is consumed unless it is also handled. Pending
    /// forever once the connection is closed.
    pub async fn process_next(&mut self) -> ConnectionEvent {
        let wake = {
            let incoming = &mut self.incoming;
            let ping = &mut self.ping;

            tokio::select! {
                event = recv_event(incoming) => Wake::Transport(event),
                _ = ping.tick() => Wake::Probe,
            }
        };

        match wake {
            Wake::Transport(Some(event)) => self.handle_transport_event(event),
            Wake::Transport(None) => {
                self.incoming = None;
                if self.state == ConnectionState::Closing {
                    self.finish(None)
                } else {
                    self.finish(Some(ClientError::LostConnection))
                }
            }
            Wake::Probe => {
                self.send_probe();
                ConnectionEvent::Probed
            }
        }
    }

    /// Applies one transport event. Exposed so that embedders driving their
    /// own loop can feed events directly.
    pub fn handle_transport_event(&mut self, event: TransportEvent) -> ConnectionEvent {
        match event {
            TransportEvent::Opened => {
                if self.state != ConnectionState::Connecting {
                    warn!("Ignoring open notification in state {:?}", self.state);
                    return ConnectionEvent::Dropped;
                }
                info!("Connection open");
                self.state = ConnectionState::Open;
                ConnectionEvent::Opened
            }
            TransportEvent::Frame(frame) => self.handle_frame(&frame),
            TransportEvent::Closed { clean, reason } => {
                if self.state == ConnectionState::Closing {
                    info!("Connection closed");
                    return self.finish(None);
                }
                if clean {
                    warn!("Server closed connection: {}", reason);
                    self.finish(Some(ClientError::ServerClosed { reason }))
                } else {
                    error!("Connection to server lost: {}", reason);
                    self.finish(Some(ClientError::LostConnection))
                }
            }
            TransportEvent::Failed(detail) => {
                if self.state == ConnectionState::Closing {
                    debug!("Transport error while closing: {}", detail);
                    return self.finish(None);
                }
                error!("Connection error: {}", detail);
                self.finish(Some(ClientError::LostConnection))
            }
        }
    }

    fn handle_frame(&mut self, frame: &str) -> ConnectionEvent {
        let Some(message) = protocol::decode(frame) else {
            debug!("Dropping unrecognised frame {:?}", frame);
            return ConnectionEvent::Dropped;
        };

        match &message {
            Message::Ping { stamp: Some(stamp) } => {
                // Liveness answer goes out before anyone else sees the probe.
                if let Err(e) = self.send(&Message::Pong {
                    timestamp: stamp.timestamp,
                }) {
                    self.report(e);
                }
                if let Some(latency) = stamp.latency {
                    self.record_latency(latency);
                }
            }
            Message::Pong { timestamp } => self.observe_pong(*timestamp),
            _ => {}
        }

        let kind = message.kind();
        if let Some(handler) = self.handlers.get_mut(&kind) {
            handler(&message);
        }

        ConnectionEvent::Received(kind)
    }

    fn send_probe(&mut self) {
        match self.send(&Message::Ping { stamp: None }) {
            Ok(()) => {
                if self.pending_probes.len() == MAX_PENDING_PROBES {
                    self.pending_probes.pop_front();
                }
                self.pending_probes.push_back(self.clock.now_ms());
            }
            Err(e) => {
                warn!("Latency probe stopped: {}", e);
                self.ping.stop();
                self.report(e);
            }
        }
    }

    /// Reports latency for a Pong answering one of our outstanding probes.
    /// A Pong matches when some probe left at or before its timestamp.
    fn observe_pong(&mut self, timestamp: i64) {
        let now = self.clock.now_ms();
        if timestamp > now {
            debug!("Ignoring pong from the future ({} > {})", timestamp, now);
            return;
        }
        if !self.pending_probes.iter().any(|sent_at| *sent_at <= timestamp) {
            debug!("Ignoring pong {} with no matching probe", timestamp);
            return;
        }
        let Some(latency) = now.checked_sub(timestamp) else {
            debug!("Ignoring pong with out-of-range timestamp {}", timestamp);
            return;
        };

        self.pending_probes.retain(|sent_at| *sent_at > timestamp);
        self.record_latency(latency);
    }

    fn record_latency(&mut self, latency: i64) {
        debug!("Latency {}ms", latency);
        self.latency_ms = Some(latency);
        if let Some(observer) = self.latency_observer.as_mut() {
            observer(latency);
        }
    }

    fn finish(&mut self, failure: Option<ClientError>) -> ConnectionEvent {
        let already_closed = self.state == ConnectionState::Closed;

        self.state = ConnectionState::Closed;
        self.ping.stop();
        self.outgoing = None;
        self.incoming = None;
        self.pending_probes.clear();

        if let Some(failure) = failure {
            if !already_closed {
                self.report(failure);
            }
        }

        ConnectionEvent::Closed
    }

    fn report(&self, error: ClientError) {
        if self.errors.send(error).is_err() {
            debug!("Error channel closed, dropping report");
        }
    }
}

async fn recv_event(
    incoming: &mut Option<mpsc::UnboundedReceiver<TransportEvent>>,
) -> Option<TransportEvent> {
    match incoming.as_mut() {
        Some(incoming) => incoming.recv().await,
        None => future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::RuntimeClock;
    use shared::protocol::PingStamp;
    use std::sync::Mutex;
    use tokio::time::{advance, timeout};
    use tokio_test::{assert_err, assert_ok};

    struct PairConnector {
        remote: Arc<Mutex<Option<RemoteEnd>>>,
    }

    impl Connector for PairConnector {
        fn connect(&mut self, _url: &str) -> TransportHandle {
            let (handle, remote) = transport_pair();
            *self.remote.lock().unwrap() = Some(remote);
            handle
        }
    }

    struct Harness {
        connection: Connection,
        remote: RemoteEnd,
        errors: mpsc::UnboundedReceiver<ClientError>,
    }

    impl Harness {
        fn open() -> Self {
            let slot = Arc::new(Mutex::new(None));
            let (errors_tx, errors) = mpsc::unbounded_channel();
            let mut connection = Connection::new(
                "ws://localhost:3001/ws",
                Box::new(PairConnector {
                    remote: Arc::clone(&slot),
                }),
                Arc::new(RuntimeClock::new()),
                errors_tx,
            );
            connection.open();
            let remote = slot.lock().unwrap().take().expect("connector was used");
            Self {
                connection,
                remote,
                errors,
            }
        }

        async fn opened() -> Self {
            let mut harness = Self::open();
            harness.push(TransportEvent::Opened);
            assert_eq!(harness.connection.process_next().await, ConnectionEvent::Opened);
            harness
        }

        fn push(&self, event: TransportEvent) {
            self.remote.events.send(event).unwrap();
        }

        fn sent(&mut self) -> Vec<String> {
            let mut frames = Vec::new();
            while let Ok(frame) = self.remote.sent.try_recv() {
                frames.push(frame);
            }
            frames
        }

        fn errors(&mut self) -> Vec<ClientError> {
            let mut errors = Vec::new();
            while let Ok(error) = self.errors.try_recv() {
                errors.push(error);
            }
            errors
        }
    }

    #[tokio::test]
    async fn test_send_before_open_is_not_open() {
        let mut harness = Harness::open();
        assert_eq!(harness.connection.state(), ConnectionState::Connecting);

        let result = harness.connection.send(&Message::Queue);
        assert_eq!(assert_err!(result), ClientError::NotOpen);
        assert!(harness.sent().is_empty());
    }

    #[tokio::test]
    async fn test_send_when_open_encodes_frame() {
        let mut harness = Harness::opened().await;
        assert_ok!(harness.connection.send(&Message::Queue));
        assert_eq!(harness.sent(), vec!["QUEUE".to_string()]);
    }

    #[tokio::test]
    async fn test_send_after_close_is_lost_connection() {
        let mut harness = Harness::opened().await;
        harness.push(TransportEvent::Closed {
            clean: false,
            reason: "reset".to_string(),
        });
        assert_eq!(harness.connection.process_next().await, ConnectionEvent::Closed);

        let result = harness.connection.send(&Message::Queue);
        assert_eq!(assert_err!(result), ClientError::LostConnection);
        assert_eq!(harness.errors(), vec![ClientError::LostConnection]);
    }

    #[tokio::test]
    async fn test_clean_close_reports_reason_once() {
        let mut harness = Harness::opened().await;
        harness.push(TransportEvent::Closed {
            clean: true,
            reason: "maintenance".to_string(),
        });
        harness.push(TransportEvent::Failed("late".to_string()));
        harness.connection.process_next().await;

        assert_eq!(harness.connection.state(), ConnectionState::Closed);
        assert_eq!(
            harness.errors(),
            vec![ClientError::ServerClosed {
                reason: "maintenance".to_string()
            }]
        );

        // Closed connections stop listening to the transport entirely.
        let next = timeout(Duration::from_millis(50), harness.connection.process_next()).await;
        assert!(next.is_err());
        assert!(harness.errors().is_empty());
    }

    #[tokio::test]
    async fn test_transport_dropping_counts_as_lost() {
        let mut harness = Harness::opened().await;
        drop(harness.remote.events);
        harness.remote.events = mpsc::unbounded_channel().0;

        assert_eq!(harness.connection.process_next().await, ConnectionEvent::Closed);
        assert_eq!(harness.errors(), vec![ClientError::LostConnection]);
    }

    #[tokio::test]
    async fn test_local_close_is_not_a_failure() {
        let mut harness = Harness::opened().await;
        harness.connection.close();
        assert_eq!(harness.connection.state(), ConnectionState::Closing);

        harness.push(TransportEvent::Closed {
            clean: true,
            reason: "closed by client".to_string(),
        });
        harness.connection.process_next().await;

        assert_eq!(harness.connection.state(), ConnectionState::Closed);
        assert!(harness.errors().is_empty());
        assert_eq!(
            assert_err!(harness.connection.send(&Message::Queue)),
            ClientError::LostConnection
        );
    }

    #[tokio::test]
    async fn test_handlers_receive_decoded_messages() {
        let mut harness = Harness::opened().await;
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        harness
            .connection
            .register_handler(MessageKind::Online, move |message| {
                sink.lock().unwrap().push(message.clone());
            });

        harness.push(TransportEvent::Frame("ONLINE:7".to_string()));
        assert_eq!(
            harness.connection.process_next().await,
            ConnectionEvent::Received(MessageKind::Online)
        );
        assert_eq!(*seen.lock().unwrap(), vec![Message::Online { count: 7 }]);
    }

    #[tokio::test]
    async fn test_registering_again_replaces_handler() {
        let mut harness = Harness::opened().await;
        let first = Arc::new(Mutex::new(0));
        let second = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&first);
        harness
            .connection
            .register_handler(MessageKind::Game, move |_| *counter.lock().unwrap() += 1);
        let counter = Arc::clone(&second);
        harness
            .connection
            .register_handler(MessageKind::Game, move |_| *counter.lock().unwrap() += 1);

        harness.push(TransportEvent::Frame("GAME:room".to_string()));
        harness.connection.process_next().await;

        assert_eq!(*first.lock().unwrap(), 0);
        assert_eq!(*second.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_garbage_frames_are_dropped_silently() {
        let mut harness = Harness::opened().await;
        for frame in ["", "BOGUS:1", "WORLD:1:2:3"] {
            harness.push(TransportEvent::Frame(frame.to_string()));
            assert_eq!(harness.connection.process_next().await, ConnectionEvent::Dropped);
        }

        assert_eq!(harness.connection.state(), ConnectionState::Open);
        assert!(harness.errors().is_empty());
        assert!(harness.sent().is_empty());
    }

    #[tokio::test]
    async fn test_server_ping_is_answered_before_handler_runs() {
        let mut harness = Harness::opened().await;
        let observed = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&observed);
        harness
            .connection
            .register_handler(MessageKind::Ping, move |message| {
                sink.lock().unwrap().push(message.clone());
            });

        harness.push(TransportEvent::Frame("PING:1700000000000:35".to_string()));
        harness.connection.process_next().await;

        assert_eq!(harness.sent(), vec!["PONG:1700000000000".to_string()]);
        assert_eq!(
            *observed.lock().unwrap(),
            vec![Message::Ping {
                stamp: Some(PingStamp {
                    timestamp: 1_700_000_000_000,
                    latency: Some(35),
                })
            }]
        );
        assert_eq!(harness.connection.latency_ms(), Some(35));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pong_reports_round_trip() {
        let mut harness = Harness::opened().await;
        let reported = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reported);
        harness
            .connection
            .set_latency_observer(move |latency| sink.lock().unwrap().push(latency));

        harness.connection.run_ping();
        assert_eq!(harness.connection.process_next().await, ConnectionEvent::Probed);
        assert_eq!(harness.sent(), vec!["PING".to_string()]);

        // The probe left at t0 = 1000ms on the connection clock.
        advance(Duration::from_millis(37)).await;
        harness.push(TransportEvent::Frame("PONG:1000".to_string()));
        harness.connection.process_next().await;

        assert_eq!(harness.connection.latency_ms(), Some(37));
        assert_eq!(*reported.lock().unwrap(), vec![37]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmatched_pong_reports_nothing() {
        let mut harness = Harness::opened().await;
        advance(Duration::from_millis(500)).await;

        harness.push(TransportEvent::Frame("PONG:0".to_string()));
        assert_eq!(
            harness.connection.process_next().await,
            ConnectionEvent::Received(MessageKind::Pong)
        );
        assert_eq!(harness.connection.latency_ms(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_extreme_pong_timestamp_is_ignored() {
        let mut harness = Harness::opened().await;
        harness.connection.run_ping();
        assert_eq!(harness.connection.process_next().await, ConnectionEvent::Probed);

        harness.push(TransportEvent::Frame(format!("PONG:{}", i64::MIN)));
        assert_eq!(
            harness.connection.process_next().await,
            ConnectionEvent::Received(MessageKind::Pong)
        );
        assert_eq!(harness.connection.latency_ms(), None);
        assert_eq!(harness.connection.state(), ConnectionState::Open);
    }

    #[test]
    fn test_pong_latency_out_of_range() {
        struct Fixed(i64);
        impl Clock for Fixed {
            fn now_ms(&self) -> i64 {
                self.0
            }
        }

        let (errors, _) = mpsc::unbounded_channel();
        let mut connection = Connection::new(
            "ws://localhost:3001/ws",
            Box::new(PairConnector {
                remote: Arc::new(Mutex::new(None)),
            }),
            Arc::new(Fixed(i64::MAX)),
            errors,
        );
        // A probe stamped at the minimum cannot produce a representable delay.
        connection.pending_probes.push_back(i64::MIN);
        connection.observe_pong(i64::MIN);
        assert_eq!(connection.latency_ms(), None);

        connection.pending_probes.push_back(i64::MAX - 5);
        connection.observe_pong(i64::MAX - 5);
        assert_eq!(connection.latency_ms(), Some(5));
        assert!(connection.pending_probes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ping_twice_keeps_one_probe_loop() {
        let mut harness = Harness::opened().await;
        harness.connection.run_ping();
        harness.connection.run_ping();

        let window = async {
            while harness.connection.state() == ConnectionState::Open {
                harness.connection.process_next().await;
            }
        };
        let _ = timeout(Duration::from_millis(5_500), window).await;

        let pings = harness.sent().iter().filter(|f| *f == "PING").count();
        assert_eq!(pings, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_failure_stops_loop_and_reports_once() {
        let mut harness = Harness::open();
        harness.connection.run_ping();

        assert_eq!(harness.connection.process_next().await, ConnectionEvent::Probed);
        assert!(!harness.connection.is_pinging());

        let _ = timeout(Duration::from_secs(5), harness.connection.process_next()).await;
        assert_eq!(harness.errors(), vec![ClientError::NotOpen]);
        assert!(harness.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_stops_probe_loop() {
        let mut harness = Harness::opened().await;
        harness.connection.run_ping();
        harness.push(TransportEvent::Failed("socket error".to_string()));
        harness.connection.process_next().await;

        assert!(!harness.connection.is_pinging());
        assert_eq!(harness.errors(), vec![ClientError::LostConnection]);
    }
}
