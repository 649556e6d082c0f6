// src/stream.rs
//
// Live-stream session lifecycle manager. At most one video session is ever
// bound to the sink: every attach tears the previous session down first
// (detach transport, release it, clear the sink source), and readiness
// callbacks carry a generation ticket so a late signal from a replaced
// session cannot start playback.
//
// The manager is the only writer to its sink. Nothing here exposes the sink
// for external mutation.

use crate::types::StreamSource;
use tracing::{debug, info, warn};

// ============================================================================
// STATES & OUTCOMES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session bound.
    Idle,
    /// Source assigned, waiting for manifest / metadata readiness.
    Attaching,
    /// Playback requested. A rejected playback start stays here, paused.
    Streaming,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "IDLE",
            SessionState::Attaching => "ATTACHING",
            SessionState::Streaming => "STREAMING",
        }
    }
}

/// What a `select` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// A new session is attaching; the ticket identifies it in readiness
    /// callbacks.
    Attaching { generation: u64 },
    /// Selection cleared; any previous session was torn down.
    Cleared,
    /// Neither the adaptive transport nor native playback is available.
    Unsupported,
}

// ============================================================================
// COLLABORATOR SEAMS
// ============================================================================

/// The display sink the session plays into (a video element, in the hosting
/// view). Exclusively owned by the manager.
pub trait MediaSink {
    fn set_source(&mut self, url: Option<&str>);
    /// Whether the sink can play the streaming mime type natively.
    fn supports_native_hls(&self) -> bool;
    /// Ask playback to start. May be rejected (autoplay policy); the manager
    /// swallows the rejection.
    fn request_play(&mut self) -> Result<(), String>;
}

/// One adaptive-bitrate transport instance, created per session and released
/// on teardown.
pub trait AdaptiveTransport {
    fn load_source(&mut self, url: &str);
    fn attach(&mut self);
    fn destroy(&mut self);
}

/// Runtime capability probe plus per-session transport construction.
pub trait TransportFactory {
    type Transport: AdaptiveTransport;

    fn is_supported(&self) -> bool;
    fn create(&mut self) -> Self::Transport;
}

// ============================================================================
// MANAGER
// ============================================================================

enum SessionBinding<T> {
    Adaptive(T),
    Native,
}

struct ActiveSession<T> {
    source: StreamSource,
    generation: u64,
    binding: SessionBinding<T>,
}

pub struct StreamSessionManager<S: MediaSink, F: TransportFactory> {
    sink: S,
    factory: F,
    state: SessionState,
    generation: u64,
    session: Option<ActiveSession<F::Transport>>,
}

impl<S: MediaSink, F: TransportFactory> StreamSessionManager<S, F> {
    pub fn new(sink: S, factory: F) -> Self {
        Self {
            sink,
            factory,
            state: SessionState::Idle,
            generation: 0,
            session: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_source(&self) -> Option<&StreamSource> {
        self.session.as_ref().map(|s| &s.source)
    }

    /// Replace or clear the active session. Teardown always runs first, so
    /// two sessions are never simultaneously bound to the sink.
    pub fn select(&mut self, source: Option<StreamSource>) -> SelectOutcome {
        self.teardown();

        let Some(source) = source else {
            return SelectOutcome::Cleared;
        };

        self.generation += 1;
        let generation = self.generation;

        if self.factory.is_supported() {
            let mut transport = self.factory.create();
            transport.load_source(&source.url);
            transport.attach();
            info!("🎥 Attaching stream '{}' (adaptive)", source.name);
            self.session = Some(ActiveSession {
                source,
                generation,
                binding: SessionBinding::Adaptive(transport),
            });
            self.state = SessionState::Attaching;
            return SelectOutcome::Attaching { generation };
        }

        if self.sink.supports_native_hls() {
            self.sink.set_source(Some(&source.url));
            info!("🎥 Attaching stream '{}' (native)", source.name);
            self.session = Some(ActiveSession {
                source,
                generation,
                binding: SessionBinding::Native,
            });
            self.state = SessionState::Attaching;
            return SelectOutcome::Attaching { generation };
        }

        warn!("No playable source for '{}': adaptive transport and native playback both unavailable", source.name);
        SelectOutcome::Unsupported
    }

    /// Adaptive transport reports the manifest parsed.
    pub fn manifest_ready(&mut self, generation: u64) {
        self.playback_ready(generation, "manifest");
    }

    /// Native playback reports metadata loaded.
    pub fn metadata_loaded(&mut self, generation: u64) {
        self.playback_ready(generation, "metadata");
    }

    fn playback_ready(&mut self, generation: u64, signal: &str) {
        if generation != self.generation || self.state != SessionState::Attaching {
            // Expected and frequent when sessions are replaced quickly.
            debug!(
                "stale {} signal (ticket {}, current {}), discarding",
                signal, generation, self.generation
            );
            return;
        }

        self.state = SessionState::Streaming;
        if let Err(e) = self.sink.request_play() {
            // Autoplay rejection is not an error state; playback stays paused.
            debug!("playback start rejected ({}), leaving paused", e);
        }
    }

    fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            info!("⏹️ Tearing down stream '{}'", session.source.name);
            if let SessionBinding::Adaptive(mut transport) = session.binding {
                transport.destroy();
            }
        }
        self.sink.set_source(None);
        self.state = SessionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type OpLog = Rc<RefCell<Vec<String>>>;

    struct MockSink {
        log: OpLog,
        native: bool,
        play_ok: bool,
    }

    impl MediaSink for MockSink {
        fn set_source(&mut self, url: Option<&str>) {
            self.log
                .borrow_mut()
                .push(format!("sink:set_source:{}", url.unwrap_or("-")));
        }

        fn supports_native_hls(&self) -> bool {
            self.native
        }

        fn request_play(&mut self) -> Result<(), String> {
            self.log.borrow_mut().push("sink:play".to_string());
            if self.play_ok {
                Ok(())
            } else {
                Err("autoplay blocked".to_string())
            }
        }
    }

    struct MockTransport {
        id: usize,
        log: OpLog,
    }

    impl AdaptiveTransport for MockTransport {
        fn load_source(&mut self, url: &str) {
            self.log.borrow_mut().push(format!("t{}:load:{}", self.id, url));
        }

        fn attach(&mut self) {
            self.log.borrow_mut().push(format!("t{}:attach", self.id));
        }

        fn destroy(&mut self) {
            self.log.borrow_mut().push(format!("t{}:destroy", self.id));
        }
    }

    struct MockFactory {
        log: OpLog,
        supported: bool,
        created: usize,
    }

    impl TransportFactory for MockFactory {
        type Transport = MockTransport;

        fn is_supported(&self) -> bool {
            self.supported
        }

        fn create(&mut self) -> MockTransport {
            self.created += 1;
            MockTransport {
                id: self.created,
                log: Rc::clone(&self.log),
            }
        }
    }

    fn manager(
        native: bool,
        adaptive: bool,
        play_ok: bool,
    ) -> (StreamSessionManager<MockSink, MockFactory>, OpLog) {
        let log: OpLog = Rc::new(RefCell::new(Vec::new()));
        let sink = MockSink {
            log: Rc::clone(&log),
            native,
            play_ok,
        };
        let factory = MockFactory {
            log: Rc::clone(&log),
            supported: adaptive,
            created: 0,
        };
        (StreamSessionManager::new(sink, factory), log)
    }

    fn source(name: &str) -> StreamSource {
        StreamSource {
            url: format!("https://cctv.example/{}.m3u8", name),
            name: name.to_string(),
        }
    }

    fn attach_ticket(outcome: SelectOutcome) -> u64 {
        match outcome {
            SelectOutcome::Attaching { generation } => generation,
            other => panic!("expected Attaching, got {:?}", other),
        }
    }

    #[test]
    fn test_adaptive_attach_then_manifest_starts_streaming() {
        let (mut mgr, log) = manager(false, true, true);

        let ticket = attach_ticket(mgr.select(Some(source("a"))));
        assert_eq!(mgr.state(), SessionState::Attaching);

        mgr.manifest_ready(ticket);
        assert_eq!(mgr.state(), SessionState::Streaming);
        assert_eq!(mgr.current_source().unwrap().name, "a");

        let ops = log.borrow();
        assert!(ops.contains(&"t1:load:https://cctv.example/a.m3u8".to_string()));
        assert!(ops.contains(&"sink:play".to_string()));
    }

    #[test]
    fn test_replacement_before_manifest_keeps_only_newest_session() {
        let (mut mgr, log) = manager(false, true, true);

        let ticket_a = attach_ticket(mgr.select(Some(source("a"))));
        let ticket_b = attach_ticket(mgr.select(Some(source("b"))));

        // A's late manifest must produce no observable playback
        mgr.manifest_ready(ticket_a);
        assert_eq!(mgr.state(), SessionState::Attaching);
        assert!(!log.borrow().contains(&"sink:play".to_string()));

        mgr.manifest_ready(ticket_b);
        assert_eq!(mgr.state(), SessionState::Streaming);
        assert_eq!(mgr.current_source().unwrap().name, "b");
        assert_eq!(
            log.borrow().iter().filter(|op| *op == "sink:play").count(),
            1
        );
    }

    #[test]
    fn test_teardown_runs_before_attach() {
        let (mut mgr, log) = manager(false, true, true);

        mgr.select(Some(source("a")));
        mgr.select(Some(source("b")));

        let ops = log.borrow();
        let destroy_idx = ops.iter().position(|op| op == "t1:destroy").unwrap();
        let load_idx = ops
            .iter()
            .position(|op| op.starts_with("t2:load"))
            .unwrap();
        assert!(destroy_idx < load_idx, "old session must be released first");
    }

    #[test]
    fn test_replace_while_streaming_tears_down_first() {
        let (mut mgr, log) = manager(false, true, true);

        let ticket_a = attach_ticket(mgr.select(Some(source("a"))));
        mgr.manifest_ready(ticket_a);
        assert_eq!(mgr.state(), SessionState::Streaming);

        let ticket_b = attach_ticket(mgr.select(Some(source("b"))));
        assert_eq!(mgr.state(), SessionState::Attaching);
        assert!(log.borrow().contains(&"t1:destroy".to_string()));

        mgr.manifest_ready(ticket_b);
        assert_eq!(mgr.current_source().unwrap().name, "b");
    }

    #[test]
    fn test_clearing_selection_goes_idle() {
        let (mut mgr, log) = manager(false, true, true);

        mgr.select(Some(source("a")));
        assert_eq!(mgr.select(None), SelectOutcome::Cleared);
        assert_eq!(mgr.state(), SessionState::Idle);
        assert!(mgr.current_source().is_none());
        assert!(log.borrow().contains(&"t1:destroy".to_string()));
        assert!(log.borrow().contains(&"sink:set_source:-".to_string()));
    }

    #[test]
    fn test_native_fallback_plays_on_metadata() {
        let (mut mgr, log) = manager(true, false, true);

        let ticket = attach_ticket(mgr.select(Some(source("a"))));
        assert!(log
            .borrow()
            .contains(&"sink:set_source:https://cctv.example/a.m3u8".to_string()));

        mgr.metadata_loaded(ticket);
        assert_eq!(mgr.state(), SessionState::Streaming);
    }

    #[test]
    fn test_no_capability_stays_idle() {
        let (mut mgr, _log) = manager(false, false, true);

        assert_eq!(mgr.select(Some(source("a"))), SelectOutcome::Unsupported);
        assert_eq!(mgr.state(), SessionState::Idle);
        assert!(mgr.current_source().is_none());
    }

    #[test]
    fn test_playback_rejection_is_swallowed() {
        let (mut mgr, _log) = manager(false, true, false);

        let ticket = attach_ticket(mgr.select(Some(source("a"))));
        mgr.manifest_ready(ticket);

        // still STREAMING, just paused
        assert_eq!(mgr.state(), SessionState::Streaming);
    }

    #[test]
    fn test_duplicate_manifest_signal_is_ignored() {
        let (mut mgr, log) = manager(false, true, true);

        let ticket = attach_ticket(mgr.select(Some(source("a"))));
        mgr.manifest_ready(ticket);
        mgr.manifest_ready(ticket);

        assert_eq!(
            log.borrow().iter().filter(|op| *op == "sink:play").count(),
            1
        );
    }
}
