use super::upf::Upf;
use crate::Load;
use crate::Millis;
use crate::SessionId;
use crate::UpfId;

/// the live set of UPF instances in launch order. ids come from a
/// monotonic allocator and are never reused; removal preserves the
/// relative order of the survivors. the pool owns the per-instance
/// capacities so every derived counter can be recomputed from
/// primary state alone.
#[derive(Debug, Clone)]
pub struct Pool {
    upfs: Vec<Upf>,
    next: UpfId,
    capacity: usize,
    throughput_capacity: Option<Load>,
}

impl Pool {
    pub fn new(capacity: usize, throughput_capacity: Option<Load>) -> Self {
        Self {
            upfs: Vec::new(),
            next: 0,
            capacity,
            throughput_capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.upfs.len()
    }
    pub fn is_empty(&self) -> bool {
        self.upfs.is_empty()
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    /// how many instances have ever been launched
    pub fn next_id(&self) -> UpfId {
        self.next
    }
    pub fn iter(&self) -> impl Iterator<Item = &Upf> {
        self.upfs.iter()
    }
    pub fn get(&self, id: UpfId) -> Option<&Upf> {
        self.upfs.iter().find(|u| u.id() == id)
    }
    pub fn get_mut(&mut self, id: UpfId) -> Option<&mut Upf> {
        self.upfs.iter_mut().find(|u| u.id() == id)
    }

    /// scale-out: append a fresh instance and hand back its id
    pub fn launch(&mut self) -> UpfId {
        let id = self.next;
        self.next += 1;
        self.upfs.push(Upf::from(id));
        id
    }

    /// scale-in: remove an instance by id
    pub fn retire(&mut self, id: UpfId) -> Option<Upf> {
        let i = self.upfs.iter().position(|u| u.id() == id)?;
        Some(self.upfs.remove(i))
    }

    /// instances with a free slot, and throughput headroom when
    /// the variant is active, in launch order
    pub fn vacancies(&self, demand: Option<Load>) -> Vec<&Upf> {
        self.upfs
            .iter()
            .filter(|u| u.count() < self.capacity)
            .filter(|u| match (demand, self.throughput_capacity) {
                (Some(demand), Some(capacity)) => u.fits(demand, capacity),
                _ => true,
            })
            .collect()
    }

    /// locate the unique session ending at this instant
    pub fn ending_at(&self, time: Millis) -> Option<(UpfId, SessionId)> {
        self.upfs
            .iter()
            .find_map(|u| u.ending_at(time).map(|s| (u.id(), s)))
    }

    /// move every session off one instance onto another, preserving
    /// identity and end times
    pub fn transfer(&mut self, from: UpfId, into: UpfId) -> Vec<SessionId> {
        assert!(from != into, "an instance cannot absorb itself");
        let sessions = match self.get_mut(from) {
            Some(source) => source.drain(),
            None => return Vec::new(),
        };
        let moved = sessions.iter().map(|s| s.id()).collect();
        let target = self.get_mut(into).expect("migration target is live");
        for session in sessions {
            target.add(session);
        }
        moved
    }

    // derived counters, always recomputed from primary state

    pub fn active_sessions(&self) -> usize {
        self.upfs.iter().map(Upf::count).sum()
    }
    pub fn free_slots(&self) -> usize {
        self.upfs.iter().map(|u| self.capacity - u.count()).sum()
    }
    pub fn busy(&self) -> usize {
        self.upfs.iter().filter(|u| u.is_busy()).count()
    }
    pub fn idle(&self) -> usize {
        self.len() - self.busy()
    }

    /// mean per-instance occupancy across the live pool; undefined
    /// while the pool is empty
    pub fn utilization(&self) -> Option<f64> {
        match self.len() {
            0 => None,
            n => Some(
                self.upfs
                    .iter()
                    .map(|u| u.count() as f64 / (n * self.capacity) as f64)
                    .sum(),
            ),
        }
    }

    /// debug-build consistency checks, run after every state change
    pub fn audit(&self) {
        #[cfg(debug_assertions)]
        {
            let mut seen = std::collections::BTreeSet::new();
            for upf in self.upfs.iter() {
                debug_assert!(
                    upf.count() <= self.capacity,
                    "instance {} exceeds its session capacity",
                    upf.id()
                );
                debug_assert!(
                    upf.id() < self.next,
                    "instance id {} outruns the allocator",
                    upf.id()
                );
                for session in upf.sessions() {
                    debug_assert!(
                        seen.insert(session.id()),
                        "session {} is bound to two instances",
                        session.id()
                    );
                }
            }
            debug_assert!(
                self.upfs.windows(2).all(|w| w[0].id() < w[1].id()),
                "pool order no longer follows launch order"
            );
            debug_assert!(
                self.active_sessions() + self.free_slots() == self.len() * self.capacity,
                "slot accounting out of balance"
            );
        }
    }
}
