use crate::Millis;
use crate::Seconds;
use crate::SessionId;
use crate::pool::pool::Pool;
use serde::Serialize;

/// one observation in a per-instant series. times sit on the
/// ceiling-quantized millisecond grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point<T> {
    pub time: u64,
    pub value: T,
}

/// the counter manifold and its append-only output streams. one
/// row lands in every series at each event dequeue and again after
/// each state change; rendering the streams to CSV or anything
/// else is a collaborator's concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trace {
    /// cumulative arrivals, accepted or not
    pub pdus: Vec<Point<usize>>,
    /// cumulative instance launches
    pub upfs: Vec<Point<usize>>,
    pub active_pdus: Vec<Point<usize>>,
    pub free_slots: Vec<Point<usize>>,
    pub busy_upfs: Vec<Point<usize>>,
    pub idle_upfs: Vec<Point<usize>>,
    /// live pool size snapshots
    pub deployed_upfs: Vec<Point<usize>>,
    /// mean per-instance occupancy; no rows while the pool is empty
    pub utilization: Vec<Point<f64>>,
    /// quantized gaps between consecutive scheduled arrivals
    pub inter_arrivals: Vec<Millis>,
    /// raw sampled duration per placed session, in seconds
    pub durations: Vec<(SessionId, Seconds)>,
    /// instant and id of every arrival turned away
    pub rejections: Vec<(u64, SessionId)>,
}

impl Trace {
    /// recompute every derived counter from primary state and
    /// append one row per series
    pub fn observe(&mut self, time: Millis, pool: &Pool, arrivals: usize) {
        pool.audit();
        let time = time.ceil() as u64;
        self.pdus.push(Point { time, value: arrivals });
        self.upfs.push(Point { time, value: pool.next_id() });
        self.active_pdus.push(Point { time, value: pool.active_sessions() });
        self.free_slots.push(Point { time, value: pool.free_slots() });
        self.busy_upfs.push(Point { time, value: pool.busy() });
        self.idle_upfs.push(Point { time, value: pool.idle() });
        self.deployed_upfs.push(Point { time, value: pool.len() });
        if let Some(value) = pool.utilization() {
            self.utilization.push(Point { time, value });
        }
    }
}

/// end-of-run accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub rejected: usize,
    pub accepted: usize,
    /// instances ever launched, not the final pool size
    pub deployed: usize,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "simulation complete: {} sessions processed, {} rejected, {} accepted, {} UPFs deployed",
            self.total, self.rejected, self.accepted, self.deployed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traffic::session::Session;

    #[test]
    fn observation_covers_every_series() {
        let mut trace = Trace::default();
        let mut pool = Pool::new(2, None);
        let id = pool.launch();
        pool.get_mut(id).unwrap().add(Session::from((0, 0., 10.)));
        trace.observe(3.2, &pool, 1);
        assert!(trace.pdus == vec![Point { time: 4, value: 1 }]);
        assert!(trace.active_pdus == vec![Point { time: 4, value: 1 }]);
        assert!(trace.free_slots == vec![Point { time: 4, value: 1 }]);
        assert!(trace.busy_upfs == vec![Point { time: 4, value: 1 }]);
        assert!(trace.idle_upfs == vec![Point { time: 4, value: 0 }]);
        assert!(trace.deployed_upfs == vec![Point { time: 4, value: 1 }]);
        assert!(trace.utilization == vec![Point { time: 4, value: 0.5 }]);
    }

    #[test]
    fn empty_pool_omits_the_utilization_row() {
        let mut trace = Trace::default();
        let pool = Pool::new(2, None);
        trace.observe(0., &pool, 0);
        assert!(trace.pdus.len() == 1);
        assert!(trace.deployed_upfs == vec![Point { time: 0, value: 0 }]);
        assert!(trace.utilization.is_empty());
    }

    #[test]
    fn summary_accounting_reads_back() {
        let summary = Summary {
            total: 10,
            rejected: 3,
            accepted: 7,
            deployed: 4,
        };
        let line = summary.to_string();
        assert!(line.contains("10 sessions"));
        assert!(line.contains("3 rejected"));
        assert!(line.contains("7 accepted"));
        assert!(line.contains("4 UPFs"));
    }
}
