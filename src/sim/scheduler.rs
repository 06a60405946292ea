use super::config::Config;
use super::trace::Summary;
use super::trace::Trace;
use crate::Load;
use crate::Millis;
use crate::UpfId;
use crate::events::event::Event;
use crate::events::event::Kind;
use crate::events::queue::Queue;
use crate::pool::pool::Pool;
use crate::traffic::sampler::Sampler;
use crate::traffic::session::Session;
use std::collections::BTreeSet;

/// what a run leaves behind
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub trace: Trace,
    pub summary: Summary,
}

/// the event-driven controller loop. owns every piece of mutable
/// state and serializes all of it through the queue: an arrival
/// consults the placement policy (possibly scaling out), binds the
/// session, and schedules its termination; a termination retires
/// the session and hands the emptied instance to the migration
/// regime, which may consolidate survivors and scale the pool in.
/// everything between two dequeues is atomic with respect to the
/// simulated world.
pub struct Scheduler {
    config: Config,
    pool: Pool,
    queue: Queue,
    sampler: Sampler,
    trace: Trace,
    clock: Millis,
    /// every arrival ever processed, accepted or not
    arrivals: usize,
    rejected: usize,
    /// instant of the most recently scheduled arrival
    last_arrival: Millis,
}

impl Scheduler {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            pool: Pool::new(config.capacity, config.throughput.map(|t| t.capacity)),
            queue: Queue::default(),
            sampler: Sampler::from(config.seed),
            trace: Trace::default(),
            clock: 0.,
            arrivals: 0,
            rejected: 0,
            last_arrival: 0.,
            config,
        })
    }

    /// drive the queue until it drains or the horizon passes
    pub fn run(mut self) -> anyhow::Result<Outcome> {
        log::info!(
            "run {}: {} placement, {} migration, envelope {}..={} x {} slots",
            self.config.run_id,
            self.config.placement,
            self.config.migration,
            self.config.min_upfs,
            self.config.max_upfs,
            self.config.capacity,
        );
        self.queue.push(Event::from((Kind::Arrival, 0.)));
        while let Some(event) = self.next() {
            self.clock = event.time();
            self.trace.observe(self.clock, &self.pool, self.arrivals);
            match event.kind() {
                Kind::Arrival => self.arrival(),
                Kind::Termination => self.termination()?,
            }
        }
        for upf in self.pool.iter() {
            log::debug!("time {}, compute node terminates UPF {}", self.grid(), upf.id());
        }
        let summary = Summary {
            total: self.arrivals,
            rejected: self.rejected,
            accepted: self.arrivals - self.rejected,
            deployed: self.pool.next_id(),
        };
        log::info!("{}", summary);
        Ok(Outcome {
            trace: self.trace,
            summary,
        })
    }

    /// pop the next event unless the horizon has passed
    fn next(&mut self) -> Option<Event> {
        match (self.clock.ceil() as u64) < self.config.simulation_time {
            true => self.queue.pop(),
            false => None,
        }
    }

    /// the current instant on the millisecond observation grid
    fn grid(&self) -> u64 {
        self.clock.ceil() as u64
    }

    /// admit one session if anywhere will take it, pre-warm the
    /// pool if occupancy just crossed the scale-out margin, and
    /// schedule the next arrival either way
    fn arrival(&mut self) {
        log::debug!("time {}, UE generates PDU session", self.grid());
        let id = self.arrivals;
        self.arrivals += 1;
        let duration = self.sampler.expo_ms(self.config.mu);
        let demand = self.config.throughput.map(|t| self.sampler.expo(t.rate));
        match self.admit(demand) {
            Some(host) => {
                let start = self.grid() as Millis;
                let session = match demand {
                    Some(demand) => Session::from((id, start, duration, demand)),
                    None => Session::from((id, start, duration)),
                };
                let end = session.end();
                self.pool
                    .get_mut(host)
                    .expect("admitted host is live")
                    .add(session);
                self.trace.durations.push((id, duration / 1000.));
                self.trace.observe(self.clock, &self.pool, self.arrivals);
                log::debug!("time {}, PDU session {} started on UPF {}", self.grid(), id, host);
                self.prewarm();
                self.queue.push(Event::from((Kind::Termination, end)));
            }
            None => {
                self.rejected += 1;
                self.trace.rejections.push((self.grid(), id));
                self.trace.observe(self.clock, &self.pool, self.arrivals);
                log::debug!(
                    "time {}, cannot scale out past {} instances, rejecting PDU session {}",
                    self.grid(),
                    self.config.max_upfs,
                    id,
                );
            }
        }
        self.next_arrival();
    }

    /// find a host per the placement policy, scaling out when no
    /// instance qualifies and the envelope still has room. the
    /// fresh instance takes the session unconditionally.
    fn admit(&mut self, demand: Option<Load>) -> Option<UpfId> {
        match self.config.placement.select(&self.pool, demand, &mut self.sampler) {
            Some(host) => Some(host),
            None if self.pool.len() < self.config.max_upfs => Some(self.scale_out()),
            None => None,
        }
    }

    /// launch one instance when occupancy lands exactly on the
    /// pre-warm margin. placements add one session at a time, so
    /// the strict equality is always passed through; it is not
    /// re-evaluated after migrations.
    fn prewarm(&mut self) {
        let brink = (self.pool.len() * self.config.capacity).checked_sub(self.config.scale_out + 1);
        if Some(self.pool.active_sessions()) == brink && self.pool.len() < self.config.max_upfs {
            self.scale_out();
        }
    }

    fn scale_out(&mut self) -> UpfId {
        let id = self.pool.launch();
        self.trace.observe(self.clock, &self.pool, self.arrivals);
        log::debug!("time {}, compute node launches UPF {}", self.grid(), id);
        id
    }

    fn scale_in(&mut self, id: UpfId) {
        self.pool.retire(id).expect("retired instance is live");
        self.trace.observe(self.clock, &self.pool, self.arrivals);
        log::debug!("time {}, compute node terminates UPF {}", self.grid(), id);
    }

    /// retire the session ending now, then apply the migration
    /// regime to its host
    fn termination(&mut self) -> anyhow::Result<()> {
        let (host, session) = self
            .pool
            .ending_at(self.clock)
            .ok_or_else(|| {
                anyhow::anyhow!("termination event at t={} matches no live session", self.clock)
            })?;
        self.pool
            .get_mut(host)
            .and_then(|u| u.remove(session))
            .expect("located session is removable");
        self.trace.observe(self.clock, &self.pool, self.arrivals);
        log::debug!(
            "time {}, PDU session {} terminated on UPF {}",
            self.grid(),
            session,
            host,
        );
        self.consolidate(host);
        Ok(())
    }

    /// one termination step's worth of migration policy: move the
    /// survivors to a single best-effort target, then decide
    /// whether the source instance retires
    fn consolidate(&mut self, source: UpfId) {
        let mut quarantined = BTreeSet::new();
        if self.config.migration.migrates() {
            if let Some(target) = self.config.migration.target(&self.pool, source, &quarantined) {
                for session in self.pool.transfer(source, target) {
                    log::debug!(
                        "time {}, PDU session {} migrated from UPF {} to UPF {}",
                        self.grid(),
                        session,
                        source,
                        target,
                    );
                }
                if self.config.migration.quarantines() {
                    quarantined.insert(source);
                }
                self.trace.observe(self.clock, &self.pool, self.arrivals);
            }
        }
        if self.config.migration.retires(
            &self.pool,
            source,
            self.config.min_upfs,
            self.config.scale_in,
        ) {
            self.scale_in(source);
        }
    }

    /// draw the inter-arrival gap and schedule the next arrival if
    /// it lands within the horizon. the draw happens after the
    /// termination event is scheduled, which pins the stream order
    /// that reproducibility depends on.
    fn next_arrival(&mut self) {
        let gap = self.sampler.expo_ms(self.config.arrival_rate);
        let next = (self.clock + gap).ceil();
        if next as u64 <= self.config.simulation_time {
            self.queue.push(Event::from((Kind::Arrival, next)));
            self.trace.inter_arrivals.push(next - self.last_arrival);
            self.last_arrival = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::migration::Migration;
    use crate::policy::placement::Placement;
    use crate::sim::config::Throughput;

    fn config() -> Config {
        Config {
            run_id: 0,
            placement: Placement::FirstFit,
            migration: Migration::Threshold,
            max_upfs: 2,
            min_upfs: 1,
            capacity: 2,
            scale_out: 0,
            scale_in: 0,
            simulation_time: 1000,
            arrival_rate: 5.,
            mu: 10.,
            seed: Some(1),
            throughput: None,
        }
    }

    #[test]
    fn first_arrival_scales_out_the_empty_pool() {
        let mut scheduler = Scheduler::new(config()).unwrap();
        scheduler.arrival();
        assert!(scheduler.arrivals == 1);
        assert!(scheduler.rejected == 0);
        assert!(scheduler.pool.next_id() >= 1);
        assert!(scheduler.pool.active_sessions() == 1);
        assert!(scheduler.trace.durations.len() == 1);
    }

    #[test]
    fn prewarm_fires_on_the_exact_margin() {
        // with C = 2 and T1 = 0 the first placement leaves occupancy
        // at 2*1 - 0 - 1 = 1, so a second instance launches at once
        let mut scheduler = Scheduler::new(config()).unwrap();
        scheduler.arrival();
        assert!(scheduler.pool.len() == 2);
        assert!(scheduler.pool.active_sessions() == 1);
    }

    #[test]
    fn saturated_envelope_rejects() {
        let mut config = config();
        config.max_upfs = 1;
        config.capacity = 1;
        config.min_upfs = 0;
        let mut scheduler = Scheduler::new(config).unwrap();
        scheduler.arrival();
        scheduler.arrival();
        assert!(scheduler.arrivals == 2);
        assert!(scheduler.rejected == 1);
        assert!(scheduler.trace.rejections.len() == 1);
        // the rejected session was never placed and never scheduled
        assert!(scheduler.trace.durations.len() == 1);
        assert!(scheduler.pool.active_sessions() == 1);
    }

    #[test]
    fn equal_seeds_replay_the_whole_run() {
        let mut config = config();
        config.max_upfs = 4;
        config.capacity = 3;
        config.placement = Placement::LeastLoaded;
        config.migration = Migration::Consolidate;
        config.seed = Some(7);
        let one = Scheduler::new(config.clone()).unwrap().run().unwrap();
        let two = Scheduler::new(config).unwrap().run().unwrap();
        assert!(one.summary == two.summary);
        assert!(one.trace == two.trace);
    }

    #[test]
    fn accounting_identity_holds() {
        let outcome = Scheduler::new(config()).unwrap().run().unwrap();
        let summary = outcome.summary;
        assert!(summary.total == summary.accepted + summary.rejected);
        assert!(outcome.trace.durations.len() == summary.accepted);
        assert!(outcome.trace.rejections.len() == summary.rejected);
        assert!(summary.total >= 1);
        assert!(summary.deployed >= 1);
    }

    #[test]
    fn envelope_bounds_the_pool_for_the_whole_run() {
        for case in [
            Migration::Threshold,
            Migration::Immediate,
            Migration::Consolidate,
            Migration::Drain,
            Migration::Quarantine,
            Migration::QuarantineDrain,
        ] {
            let mut config = config();
            config.max_upfs = 3;
            config.migration = case;
            let outcome = Scheduler::new(config).unwrap().run().unwrap();
            assert!(outcome.trace.deployed_upfs.iter().all(|p| p.value <= 3));
            // the pool never drops below the floor once warmed up
            assert!(outcome.trace.deployed_upfs.last().unwrap().value >= 1);
        }
    }

    #[test]
    fn cumulative_series_never_decrease() {
        let outcome = Scheduler::new(config()).unwrap().run().unwrap();
        let pdus = &outcome.trace.pdus;
        assert!(pdus.windows(2).all(|w| w[0].value <= w[1].value));
        let upfs = &outcome.trace.upfs;
        assert!(upfs.windows(2).all(|w| w[0].value <= w[1].value));
        let times = &outcome.trace.free_slots;
        assert!(times.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn observation_grid_starts_at_zero() {
        let outcome = Scheduler::new(config()).unwrap().run().unwrap();
        assert!(outcome.trace.pdus.first().unwrap().time == 0);
        // the very first dequeue observes an empty pool
        assert!(outcome.trace.deployed_upfs.first().unwrap().value == 0);
    }

    #[test]
    fn migrated_sessions_still_terminate() {
        // force a consolidation by hand, then let the queued
        // termination events find the sessions on their new host
        let mut config = config();
        config.capacity = 3;
        config.max_upfs = 3;
        config.migration = Migration::Drain;
        let mut scheduler = Scheduler::new(config).unwrap();
        let a = scheduler.pool.launch();
        let b = scheduler.pool.launch();
        scheduler.pool.get_mut(a).unwrap().add(Session::from((0, 0., 10.)));
        scheduler.pool.get_mut(a).unwrap().add(Session::from((1, 0., 20.)));
        scheduler.pool.get_mut(b).unwrap().add(Session::from((2, 0., 30.)));
        scheduler.queue.push(Event::from((Kind::Termination, 10.)));
        scheduler.queue.push(Event::from((Kind::Termination, 20.)));
        scheduler.queue.push(Event::from((Kind::Termination, 30.)));

        // session 0 ends; session 1 migrates onto b; a retires
        scheduler.clock = 10.;
        scheduler.termination().unwrap();
        assert!(scheduler.pool.len() == 1);
        assert!(scheduler.pool.get(b).unwrap().count() == 2);

        // the queued events still find their sessions by end time
        scheduler.clock = 20.;
        scheduler.termination().unwrap();
        scheduler.clock = 30.;
        scheduler.termination().unwrap();
        assert!(scheduler.pool.active_sessions() == 0);
    }

    #[test]
    fn orphan_termination_is_fatal() {
        let mut scheduler = Scheduler::new(config()).unwrap();
        scheduler.clock = 17.;
        assert!(scheduler.termination().is_err());
    }

    #[test]
    fn throughput_variant_binds_demand() {
        let mut config = config();
        config.throughput = Some(Throughput {
            rate: 2.,
            capacity: 100.,
        });
        let mut scheduler = Scheduler::new(config).unwrap();
        scheduler.arrival();
        let demand = scheduler
            .pool
            .iter()
            .flat_map(|u| u.sessions())
            .find_map(|s| s.throughput());
        assert!(demand.unwrap_or(0.) > 0.);
    }

    #[test]
    fn rejected_arrivals_still_schedule_the_next_one() {
        let mut config = config();
        config.max_upfs = 1;
        config.capacity = 1;
        config.min_upfs = 0;
        // a horizon no exponential draw can overshoot, so both
        // arrivals are guaranteed to schedule a successor
        config.simulation_time = u32::MAX as u64;
        let mut scheduler = Scheduler::new(config).unwrap();
        scheduler.arrival();
        let queued = scheduler.queue.len();
        scheduler.arrival();
        // one termination is never scheduled for the rejection, but
        // the arrival stream keeps flowing
        assert!(scheduler.rejected == 1);
        assert!(scheduler.queue.len() == queued + 1);
    }
}
