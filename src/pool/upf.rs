use crate::Load;
use crate::Millis;
use crate::SessionId;
use crate::UpfId;
use crate::traffic::session::Session;

/// one UPF instance and the sessions it currently hosts. slot and
/// throughput capacities are enforced by the placement and
/// migration policies, not here. the running demand sum is only
/// meaningful in the throughput-aware variant.
#[derive(Debug, Clone)]
pub struct Upf {
    id: UpfId,
    sessions: Vec<Session>,
    throughput: Load,
}

impl Upf {
    pub fn id(&self) -> UpfId {
        self.id
    }
    pub fn count(&self) -> usize {
        self.sessions.len()
    }
    pub fn is_busy(&self) -> bool {
        !self.sessions.is_empty()
    }
    pub fn throughput(&self) -> Load {
        self.throughput
    }
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn add(&mut self, session: Session) {
        self.throughput += session.throughput().unwrap_or(0.);
        self.sessions.push(session);
    }

    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        let i = self.sessions.iter().position(|s| s.id() == id)?;
        let session = self.sessions.remove(i);
        self.throughput -= session.throughput().unwrap_or(0.);
        Some(session)
    }

    /// take every remaining session, leaving the instance idle
    pub fn drain(&mut self) -> Vec<Session> {
        self.throughput = 0.;
        self.sessions.drain(..).collect()
    }

    /// the session ending at exactly this instant, if any
    pub fn ending_at(&self, time: Millis) -> Option<SessionId> {
        self.sessions.iter().find(|s| s.end() == time).map(|s| s.id())
    }

    /// headroom check for the throughput-aware variant
    pub fn fits(&self, demand: Load, capacity: Load) -> bool {
        self.throughput + demand <= capacity
    }
}

impl From<UpfId> for Upf {
    fn from(id: UpfId) -> Self {
        Self {
            id,
            sessions: Vec::new(),
            throughput: 0.,
        }
    }
}
