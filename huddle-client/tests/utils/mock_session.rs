use anyhow::Result;
use async_trait::async_trait;
use huddle_client::negotiation::{
    PeerSession, PeerSessionFactory, SessionEvent, SessionEventSender, SessionId, SessionState,
};
use huddle_core::{IceCandidate, PeerId, SdpKind, SessionDescription};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// A call made on a [`MockSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCall {
    CreateOffer,
    CreateAnswer,
    SetRemote(SdpKind),
    AddIce(String),
    /// Candidate refused because no remote description was set yet.
    RejectedIce(String),
    Close,
}

/// Test-side view of one session created by [`MockSessionFactory`].
#[derive(Clone)]
pub struct SessionHandle {
    pub peer_id: PeerId,
    pub session_id: SessionId,
    pub events: SessionEventSender,
    calls: Arc<Mutex<Vec<SessionCall>>>,
}

impl SessionHandle {
    pub async fn calls(&self) -> Vec<SessionCall> {
        self.calls.lock().await.clone()
    }

    pub async fn has_call(&self, call: &SessionCall) -> bool {
        self.calls.lock().await.contains(call)
    }

    /// Pretend the transport reached `state`.
    pub async fn report_state(&self, state: SessionState) {
        self.events.send(SessionEvent::StateChanged(state)).await;
    }

    pub async fn report_candidate(&self, candidate: &str) {
        self.events
            .send(SessionEvent::IceCandidate(IceCandidate::new(candidate)))
            .await;
    }
}

/// SDP-free stand-in for a WebRTC session that records every call.
///
/// Like a browser, it refuses ICE candidates until a remote description is set.
pub struct MockSession {
    peer_id: PeerId,
    calls: Arc<Mutex<Vec<SessionCall>>>,
    has_remote: AtomicBool,
    fail_remote: bool,
}

#[async_trait]
impl PeerSession for MockSession {
    async fn create_offer(&self) -> Result<SessionDescription> {
        self.calls.lock().await.push(SessionCall::CreateOffer);
        Ok(SessionDescription::offer(format!("v=0 offer for {}", self.peer_id)))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        self.calls.lock().await.push(SessionCall::CreateAnswer);
        Ok(SessionDescription::answer(format!("v=0 answer for {}", self.peer_id)))
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.calls
            .lock()
            .await
            .push(SessionCall::SetRemote(description.kind));
        if self.fail_remote {
            anyhow::bail!("Malformed SDP");
        }
        self.has_remote.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        if !self.has_remote.load(Ordering::SeqCst) {
            self.calls
                .lock()
                .await
                .push(SessionCall::RejectedIce(candidate.candidate));
            anyhow::bail!("No remote description");
        }
        self.calls
            .lock()
            .await
            .push(SessionCall::AddIce(candidate.candidate));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.calls.lock().await.push(SessionCall::Close);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockSessionFactory {
    sessions: Arc<Mutex<Vec<SessionHandle>>>,
    fail_remote: bool,
}

impl MockSessionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every session created by this factory rejects remote descriptions.
    pub fn failing_remote_description() -> Self {
        Self {
            fail_remote: true,
            ..Self::default()
        }
    }

    pub async fn sessions(&self) -> Vec<SessionHandle> {
        self.sessions.lock().await.clone()
    }

    pub async fn sessions_for(&self, peer_id: &PeerId) -> Vec<SessionHandle> {
        self.sessions
            .lock()
            .await
            .iter()
            .filter(|s| &s.peer_id == peer_id)
            .cloned()
            .collect()
    }

    /// Latest session created for `peer_id`.
    pub async fn session_for(&self, peer_id: &PeerId) -> Option<SessionHandle> {
        self.sessions_for(peer_id).await.pop()
    }

    /// All calls of the given kind across every session.
    pub async fn count_calls(&self, call: &SessionCall) -> usize {
        let sessions = self.sessions().await;
        let mut count = 0;
        for session in sessions {
            count += session
                .calls()
                .await
                .iter()
                .filter(|c| *c == call)
                .count();
        }
        count
    }

    pub async fn wait_for_call(&self, call: &SessionCall, timeout_ms: u64) -> bool {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            if self.count_calls(call).await > 0 {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl PeerSessionFactory for MockSessionFactory {
    async fn create(
        &self,
        peer_id: &PeerId,
        events: SessionEventSender,
    ) -> Result<Box<dyn PeerSession>> {
        tracing::debug!("[MockSessionFactory] create session for {}", peer_id);

        let calls = Arc::new(Mutex::new(Vec::new()));
        self.sessions.lock().await.push(SessionHandle {
            peer_id: peer_id.clone(),
            session_id: events.session_id(),
            events,
            calls: Arc::clone(&calls),
        });

        Ok(Box::new(MockSession {
            peer_id: peer_id.clone(),
            calls,
            has_remote: AtomicBool::new(false),
            fail_remote: self.fail_remote,
        }))
    }
}
