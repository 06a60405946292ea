use crate::Load;
use crate::Millis;
use crate::SessionId;

/// a PDU session pinned to some UPF for its lifetime. immutable
/// after creation: migration moves the whole record to another
/// instance without touching its identity or end time, which is
/// what lets the queued termination event still find it.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    id: SessionId,
    start: Millis,
    duration: Millis,
    end: Millis,
    throughput: Option<Load>,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }
    pub fn start(&self) -> Millis {
        self.start
    }
    pub fn duration(&self) -> Millis {
        self.duration
    }
    pub fn end(&self) -> Millis {
        self.end
    }
    pub fn throughput(&self) -> Option<Load> {
        self.throughput
    }
}

impl From<(SessionId, Millis, Millis)> for Session {
    fn from((id, start, duration): (SessionId, Millis, Millis)) -> Self {
        Self {
            id,
            start,
            duration,
            end: start + duration,
            throughput: None,
        }
    }
}

/// throughput-aware variant: the session carries its demand
impl From<(SessionId, Millis, Millis, Load)> for Session {
    fn from((id, start, duration, throughput): (SessionId, Millis, Millis, Load)) -> Self {
        Self {
            throughput: Some(throughput),
            ..Self::from((id, start, duration))
        }
    }
}
