use crate::Error;
use crate::controller::session::Session;
use crate::controller::{ControllerEvent, NegotiationState, Role};
use crate::engine::{EngineEvent, EngineEventKind, EngineEventSink, EngineFactory, PeerEngine};
use duet_core::{
    CandidateSignal, IceCandidate, IceServerConfig, NegotiationSignal, PeerId, SessionDescription,
    SignalMessage,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

pub type EngineOf<F> = <F as EngineFactory>::Engine;
pub type TrackOf<F> = <EngineOf<F> as PeerEngine>::Track;
pub type RemoteTrackOf<F> = <EngineOf<F> as PeerEngine>::RemoteTrack;

const EVENT_CAPACITY: usize = 64;

/// Drives one engine per remote participant through offer/answer/ICE.
///
/// Signals from the server and engine callbacks are handled one at a time,
/// so no two handlers ever touch the same session concurrently.
pub struct Controller<F: EngineFactory> {
    factory: F,
    local_id: Option<PeerId>,
    ice_servers: Vec<IceServerConfig>,
    local_tracks: Vec<TrackOf<F>>,
    sessions: HashMap<PeerId, Session<EngineOf<F>>>,
    next_generation: u64,
    outbound: mpsc::UnboundedSender<SignalMessage>,
    engine_tx: mpsc::UnboundedSender<EngineEvent<RemoteTrackOf<F>>>,
    engine_rx: mpsc::UnboundedReceiver<EngineEvent<RemoteTrackOf<F>>>,
    events: broadcast::Sender<ControllerEvent<RemoteTrackOf<F>>>,
}

impl<F: EngineFactory> Controller<F> {
    pub fn new(
        factory: F,
        local_tracks: Vec<TrackOf<F>>,
        outbound: mpsc::UnboundedSender<SignalMessage>,
    ) -> Self {
        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            factory,
            local_id: None,
            ice_servers: Vec::new(),
            local_tracks,
            sessions: HashMap::new(),
            next_generation: 0,
            outbound,
            engine_tx,
            engine_rx,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent<RemoteTrackOf<F>>> {
        self.events.subscribe()
    }

    pub fn local_id(&self) -> Option<&PeerId> {
        self.local_id.as_ref()
    }

    pub fn ice_servers(&self) -> &[IceServerConfig] {
        &self.ice_servers
    }

    pub fn state_of(&self, remote: &PeerId) -> Option<NegotiationState> {
        self.sessions.get(remote).map(|s| s.state)
    }

    pub fn role_of(&self, remote: &PeerId) -> Option<Role> {
        self.sessions.get(remote).map(|s| s.role)
    }

    pub fn sessions(&self) -> Vec<PeerId> {
        self.sessions.keys().cloned().collect()
    }

    pub async fn run(mut self, mut inbound: mpsc::UnboundedReceiver<SignalMessage>) {
        info!("Negotiation controller started");

        loop {
            tokio::select! {
                msg = inbound.recv() => {
                    match msg {
                        Some(m) => self.handle_signal(m).await,
                        None => {
                            info!("Signaling channel closed. Shutting down controller.");
                            break;
                        }
                    }
                }

                Some(event) = self.engine_rx.recv() => {
                    self.handle_engine_event(event).await;
                }
            }
        }

        self.shutdown().await;
        info!("Negotiation controller finished");
    }

    /// Handles every engine callback queued so far and returns how many there were.
    pub async fn drain_engine_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.engine_rx.try_recv() {
            self.handle_engine_event(event).await;
            handled += 1;
        }
        handled
    }

    pub async fn shutdown(&mut self) {
        let remotes: Vec<PeerId> = self.sessions.keys().cloned().collect();
        for remote in remotes {
            self.close_session(&remote).await;
        }
    }

    pub async fn handle_signal(&mut self, message: SignalMessage) {
        match message {
            SignalMessage::Welcome { peer_id } => {
                info!("Assigned local id {}", peer_id);
                self.local_id = Some(peer_id.clone());
                self.emit(ControllerEvent::LocalId(peer_id));
            }
            SignalMessage::IceConfig { ice_servers } => {
                debug!("Received {} ICE server entries", ice_servers.len());
                self.ice_servers = ice_servers;
            }
            SignalMessage::OtherUser(remote) => self.on_other_user(remote),
            SignalMessage::UserJoined(remote) => self.on_user_joined(remote).await,
            SignalMessage::UserLeft(remote) => {
                info!("User {} left", remote);
                self.close_session(&remote).await;
            }
            SignalMessage::Offer(signal) => self.on_offer(signal).await,
            SignalMessage::Answer(signal) => self.on_answer(signal).await,
            SignalMessage::IceCandidate(signal) => self.on_remote_candidate(signal).await,
            SignalMessage::Join => warn!("Ignoring join echoed by the server"),
        }
    }

    pub async fn handle_engine_event(&mut self, event: EngineEvent<RemoteTrackOf<F>>) {
        let EngineEvent {
            remote,
            generation,
            kind,
        } = event;

        let Some(session) = self.sessions.get(&remote) else {
            debug!("Dropping engine event for closed session {}", remote);
            return;
        };
        if session.generation != generation {
            debug!(
                "Dropping stale engine event for {} (generation {} != {})",
                remote, generation, session.generation
            );
            return;
        }

        match kind {
            EngineEventKind::NegotiationNeeded => self.on_negotiation_needed(&remote).await,
            EngineEventKind::IceCandidate(candidate) => {
                self.send_local_candidate(&remote, candidate)
            }
            EngineEventKind::Track(track) => {
                self.emit(ControllerEvent::RemoteTrack { remote, track });
            }
            EngineEventKind::Failed => {
                warn!("Connection with {} failed", remote);
                self.close_session(&remote).await;
            }
        }
    }

    fn on_other_user(&mut self, remote: PeerId) {
        if self.is_local(&remote) || self.sessions.contains_key(&remote) {
            return;
        }
        info!("Waiting for an offer from {}", remote);
        let generation = self.next_generation();
        self.sessions.insert(
            remote.clone(),
            Session::new(remote.clone(), Role::Callee, generation),
        );
        self.emit(ControllerEvent::StateChanged {
            remote,
            state: NegotiationState::Idle,
        });
    }

    async fn on_user_joined(&mut self, remote: PeerId) {
        if self.is_local(&remote) {
            return;
        }
        if self
            .sessions
            .get(&remote)
            .is_some_and(|s| s.engine.is_some())
        {
            warn!("Already negotiating with {}, ignoring join", remote);
            return;
        }

        info!("User {} joined, calling", remote);
        let generation = self.next_generation();
        let mut session = self
            .sessions
            .remove(&remote)
            .unwrap_or_else(|| Session::new(remote.clone(), Role::Caller, generation));
        session.role = Role::Caller;
        session.generation = generation;

        let engine = match self.create_engine(&remote, generation).await {
            Ok(engine) => engine,
            Err(e) => {
                error!("Failed to create engine for {}: {}", remote, e);
                self.emit_closed(remote);
                return;
            }
        };
        session.engine = Some(engine.clone());
        self.sessions.insert(remote.clone(), session);
        self.set_state(&remote, NegotiationState::NegotiatingOffer);

        if self.local_tracks.is_empty() {
            self.send_offer(&remote).await;
            return;
        }

        for track in self.local_tracks.clone() {
            if let Err(e) = engine.add_track(track).await {
                self.fail_session(&remote, e.into()).await;
                return;
            }
        }
    }

    async fn on_offer(&mut self, signal: NegotiationSignal) {
        let remote = signal.caller;
        let offer = match SessionDescription::from_payload(&signal.sdp) {
            Ok(offer) => offer,
            Err(e) => {
                warn!("Malformed offer from {}: {}", remote, e);
                return;
            }
        };

        match self.state_of(&remote) {
            None | Some(NegotiationState::Idle) => self.accept_offer(&remote, offer).await,
            Some(NegotiationState::Connected) => {
                info!("Renegotiation offer from {}", remote);
                self.answer_offer(&remote, offer, false).await;
            }
            Some(NegotiationState::NegotiatingOffer) => {
                if self.is_polite_towards(&remote) {
                    info!("Offer collision with {}, yielding", remote);
                    self.close_session(&remote).await;
                    self.accept_offer(&remote, offer).await;
                } else {
                    info!("Offer collision with {}, keeping our offer", remote);
                }
            }
            Some(state) => warn!("Ignoring offer from {} in state {}", remote, state),
        }
    }

    async fn accept_offer(&mut self, remote: &PeerId, offer: SessionDescription) {
        let generation = self.next_generation();
        let mut session = self
            .sessions
            .remove(remote)
            .unwrap_or_else(|| Session::new(remote.clone(), Role::Callee, generation));
        session.role = Role::Callee;
        session.generation = generation;

        match self.create_engine(remote, generation).await {
            Ok(engine) => session.engine = Some(engine),
            Err(e) => {
                error!("Failed to create engine for {}: {}", remote, e);
                self.emit_closed(remote.clone());
                return;
            }
        }
        self.sessions.insert(remote.clone(), session);
        self.answer_offer(remote, offer, true).await;
    }

    async fn answer_offer(
        &mut self,
        remote: &PeerId,
        offer: SessionDescription,
        attach_tracks: bool,
    ) {
        let Some(engine) = self.sessions.get(remote).and_then(Session::engine) else {
            return;
        };
        self.set_state(remote, NegotiationState::NegotiatingAnswer);

        if let Err(e) = engine.set_remote_description(offer).await {
            self.fail_session(remote, e.into()).await;
            return;
        }
        self.on_remote_description_set(remote).await;

        if attach_tracks {
            for track in self.local_tracks.clone() {
                if let Err(e) = engine.add_track(track).await {
                    self.fail_session(remote, e.into()).await;
                    return;
                }
            }
        }

        let Some(caller) = self.local_id.clone() else {
            self.fail_session(remote, Error::Unregistered).await;
            return;
        };
        match make_answer(engine.as_ref()).await {
            Ok(sdp) => {
                self.send(SignalMessage::Answer(NegotiationSignal {
                    target: remote.clone(),
                    caller,
                    sdp,
                }));
                self.set_state(remote, NegotiationState::Connected);
            }
            Err(e) => self.fail_session(remote, e).await,
        }
    }

    async fn on_answer(&mut self, signal: NegotiationSignal) {
        let remote = signal.caller;
        if self.state_of(&remote) != Some(NegotiationState::NegotiatingOffer) {
            warn!(
                "Ignoring answer from {} in state {:?}",
                remote,
                self.state_of(&remote)
            );
            return;
        }
        let answer = match SessionDescription::from_payload(&signal.sdp) {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Malformed answer from {}: {}", remote, e);
                return;
            }
        };
        let Some(engine) = self.sessions.get(&remote).and_then(Session::engine) else {
            return;
        };

        if let Err(e) = engine.set_remote_description(answer).await {
            self.fail_session(&remote, e.into()).await;
            return;
        }
        self.on_remote_description_set(&remote).await;
        self.set_state(&remote, NegotiationState::Connected);
    }

    async fn on_remote_candidate(&mut self, signal: CandidateSignal) {
        let Some(remote) = signal.caller else {
            warn!("Dropping ICE candidate without a sender");
            return;
        };
        let candidate = match IceCandidate::from_payload(&signal.candidate) {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("Malformed ICE candidate from {}: {}", remote, e);
                return;
            }
        };

        if !self.sessions.contains_key(&remote) {
            let generation = self.next_generation();
            self.sessions.insert(
                remote.clone(),
                Session::new(remote.clone(), Role::Callee, generation),
            );
            self.emit(ControllerEvent::StateChanged {
                remote: remote.clone(),
                state: NegotiationState::Idle,
            });
        }
        let Some(session) = self.sessions.get_mut(&remote) else {
            return;
        };

        match (session.remote_description_set, session.engine()) {
            (true, Some(engine)) => add_candidate(engine.as_ref(), &remote, candidate).await,
            _ => {
                debug!("Buffering ICE candidate from {}", remote);
                session.buffer_candidate(candidate);
            }
        }
    }

    async fn on_negotiation_needed(&mut self, remote: &PeerId) {
        match self.state_of(remote) {
            Some(NegotiationState::NegotiatingOffer) => self.send_offer(remote).await,
            Some(NegotiationState::Connected) => {
                info!("Renegotiating with {}", remote);
                self.set_state(remote, NegotiationState::NegotiatingOffer);
                self.send_offer(remote).await;
            }
            state => debug!(
                "Ignoring negotiation-needed for {} in state {:?}",
                remote, state
            ),
        }
    }

    async fn send_offer(&mut self, remote: &PeerId) {
        let Some(engine) = self.sessions.get(remote).and_then(Session::engine) else {
            return;
        };
        let Some(caller) = self.local_id.clone() else {
            self.fail_session(remote, Error::Unregistered).await;
            return;
        };

        match make_offer(engine.as_ref()).await {
            Ok(sdp) => {
                debug!("Sending offer to {}", remote);
                self.send(SignalMessage::Offer(NegotiationSignal {
                    target: remote.clone(),
                    caller,
                    sdp,
                }));
            }
            Err(e) => self.fail_session(remote, e).await,
        }
    }

    fn send_local_candidate(&self, remote: &PeerId, candidate: IceCandidate) {
        let payload = match candidate.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to encode local candidate for {}: {}", remote, e);
                return;
            }
        };
        self.send(SignalMessage::IceCandidate(CandidateSignal {
            target: remote.clone(),
            caller: self.local_id.clone(),
            candidate: payload,
        }));
    }

    async fn on_remote_description_set(&mut self, remote: &PeerId) {
        let Some(session) = self.sessions.get_mut(remote) else {
            return;
        };
        session.remote_description_set = true;
        let pending = session.take_pending_candidates();
        let Some(engine) = session.engine() else {
            return;
        };

        if !pending.is_empty() {
            debug!("Applying {} buffered candidates from {}", pending.len(), remote);
        }
        for candidate in pending {
            add_candidate(engine.as_ref(), remote, candidate).await;
        }
    }

    async fn create_engine(
        &self,
        remote: &PeerId,
        generation: u64,
    ) -> Result<Arc<EngineOf<F>>, Error> {
        let sink = EngineEventSink::new(remote.clone(), generation, self.engine_tx.clone());
        let engine = self
            .factory
            .create_connection(&self.ice_servers, sink)
            .await?;
        Ok(Arc::new(engine))
    }

    async fn fail_session(&mut self, remote: &PeerId, err: Error) {
        error!("Negotiation with {} failed: {}", remote, err);
        self.close_session(remote).await;
    }

    async fn close_session(&mut self, remote: &PeerId) {
        let Some(session) = self.sessions.remove(remote) else {
            return;
        };
        if let Some(engine) = session.engine
            && let Err(e) = engine.close().await
        {
            warn!("Failed to close engine for {}: {}", remote, e);
        }
        info!("Session with {} closed", remote);
        self.emit_closed(remote.clone());
    }

    fn set_state(&mut self, remote: &PeerId, state: NegotiationState) {
        let Some(session) = self.sessions.get_mut(remote) else {
            return;
        };
        if session.state == state {
            return;
        }
        info!("Session with {}: {} -> {}", remote, session.state, state);
        session.state = state;
        self.emit(ControllerEvent::StateChanged {
            remote: remote.clone(),
            state,
        });
    }

    fn emit_closed(&self, remote: PeerId) {
        self.emit(ControllerEvent::StateChanged {
            remote,
            state: NegotiationState::Closed,
        });
    }

    fn emit(&self, event: ControllerEvent<RemoteTrackOf<F>>) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn send(&self, message: SignalMessage) {
        if self.outbound.send(message).is_err() {
            warn!("Signaling channel closed, dropping outbound message");
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    fn is_local(&self, remote: &PeerId) -> bool {
        self.local_id.as_ref() == Some(remote)
    }

    /// The side with the smaller id yields when both offer at once.
    fn is_polite_towards(&self, remote: &PeerId) -> bool {
        self.local_id.as_ref().is_none_or(|local| local < remote)
    }
}

async fn make_offer<E: PeerEngine>(engine: &E) -> Result<Value, Error> {
    let offer = engine.create_offer().await?;
    engine.set_local_description(offer.clone()).await?;
    Ok(offer.to_payload()?)
}

async fn make_answer<E: PeerEngine>(engine: &E) -> Result<Value, Error> {
    let answer = engine.create_answer().await?;
    engine.set_local_description(answer.clone()).await?;
    Ok(answer.to_payload()?)
}

async fn add_candidate<E: PeerEngine>(engine: &E, remote: &PeerId, candidate: IceCandidate) {
    if let Err(e) = engine.add_ice_candidate(candidate).await {
        warn!("Failed to add ICE candidate from {}: {}", remote, e);
    }
}
