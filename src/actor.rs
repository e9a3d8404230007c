//! The simulator as an asynchronix model.
//!
//! `CoherenceActor` owns a `Simulator`; inside an asynchronix `Simulation` its
//! replier inputs are the only way in, so every request runs to completion
//! before the next one is taken from the mailbox. After each request the
//! resulting snapshot is sent on `o_snapshot` for whoever is connected.

use asynchronix::model::{Model, Output};
use asynchronix::simulation::{Address, Mailbox, SimInit, Simulation};
use asynchronix::time::MonotonicTime;
use log::warn;

use crate::moesi::*;

pub struct CoherenceActor {
    sim: Simulator,
    pub o_snapshot: Output<Snapshot>,
}

impl CoherenceActor {
    pub fn new(sim: Simulator) -> Self {
        CoherenceActor { sim, o_snapshot: Output::new() }
    }

    async fn publish(&mut self) {
        self.o_snapshot.send(self.sim.snapshot()).await;
    }

    // inputs

    pub async fn on_read(&mut self, (proc, addr): (usize, Addr)) -> SimResult<Byte> {
        let res = self.sim.read(proc, addr);
        if res.is_ok() {
            self.publish().await;
        }
        res
    }
    pub async fn on_write(&mut self, (proc, addr, data): (usize, Addr, Byte)) -> SimResult<()> {
        let res = self.sim.write(proc, addr, data);
        if res.is_ok() {
            self.publish().await;
        }
        res
    }
    pub async fn on_invalidate(&mut self, addr: Addr) -> SimResult<()> {
        let res = self.sim.invalidate(addr);
        if res.is_ok() {
            self.publish().await;
        }
        res
    }
    pub async fn on_snapshot(&mut self, _: ()) -> Snapshot {
        self.sim.snapshot()
    }
}

impl Model for CoherenceActor {}

/// Owns a running simulation with one `CoherenceActor` and offers the same
/// request/observation API as `Simulator`.
pub struct SimHandle {
    sim: Simulation,
    addr: Address<CoherenceActor>,
}

impl SimHandle {
    pub fn new(sim: Simulator) -> Self {
        let mbox = Mailbox::<CoherenceActor>::new();
        let addr = mbox.address();
        let sim = SimInit::new()
            .add_model(CoherenceActor::new(sim), mbox)
            .init(MonotonicTime::EPOCH);
        SimHandle { sim, addr }
    }

    /// Wraps a simulation the caller assembled, e.g. with observers
    /// connected to the actor's `o_snapshot`.
    pub fn from_parts(sim: Simulation, addr: Address<CoherenceActor>) -> Self {
        SimHandle { sim, addr }
    }

    pub fn read(&mut self, proc: usize, addr: Addr) -> SimResult<Byte> {
        self.sim
            .send_query(CoherenceActor::on_read, (proc, addr), &self.addr)
            .map_err(lost)?
    }

    pub fn write(&mut self, proc: usize, addr: Addr, data: Byte) -> SimResult<()> {
        self.sim
            .send_query(CoherenceActor::on_write, (proc, addr, data), &self.addr)
            .map_err(lost)?
    }

    pub fn invalidate(&mut self, addr: Addr) -> SimResult<()> {
        self.sim
            .send_query(CoherenceActor::on_invalidate, addr, &self.addr)
            .map_err(lost)?
    }

    pub fn apply(&mut self, req: Request) -> SimResult<Option<Byte>> {
        match req {
            Request::Read { proc, addr } => self.read(proc, addr).map(Some),
            Request::Write { proc, addr, data } => self.write(proc, addr, data).map(|_| None),
        }
    }

    pub fn snapshot(&mut self) -> SimResult<Snapshot> {
        self.sim
            .send_query(CoherenceActor::on_snapshot, (), &self.addr)
            .map_err(lost)
    }
}

fn lost<E: std::fmt::Debug>(e: E) -> SimError {
    warn!("coherence actor query failed: {:?}", e);
    SimError::ActorUnavailable
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Observer {
        seen: Vec<Snapshot>,
    }

    impl Observer {
        async fn on_snapshot(&mut self, snap: Snapshot) {
            self.seen.push(snap);
        }
        async fn on_collect(&mut self, _: ()) -> Vec<Snapshot> {
            std::mem::take(&mut self.seen)
        }
    }

    impl Model for Observer {}

    #[test]
    fn handle_matches_direct_simulator() {
        let spec = SystemSpec::default();
        let mut direct = Simulator::new(spec).unwrap();
        let mut handle = SimHandle::new(Simulator::new(spec).unwrap());
        let reqs = [
            Request::Write { proc: 0, addr: Addr(5), data: 42 },
            Request::Read { proc: 1, addr: Addr(5) },
            Request::Read { proc: 2, addr: Addr(9) },
            Request::Write { proc: 2, addr: Addr(5), data: 1 },
            Request::Read { proc: 0, addr: Addr(16) },
        ];
        for req in reqs {
            assert_eq!(handle.apply(req), direct.apply(req));
            assert_eq!(handle.snapshot().unwrap(), direct.snapshot());
        }
    }

    #[test]
    fn observer_gets_one_snapshot_per_successful_request() {
        let mut actor = CoherenceActor::new(Simulator::new(SystemSpec::default()).unwrap());
        let actor_mbox = Mailbox::<CoherenceActor>::new();
        let obs_mbox = Mailbox::<Observer>::new();
        actor.o_snapshot.connect(Observer::on_snapshot, &obs_mbox);
        let actor_addr = actor_mbox.address();
        let obs_addr = obs_mbox.address();
        let sim = SimInit::new()
            .add_model(actor, actor_mbox)
            .add_model(Observer::default(), obs_mbox)
            .init(MonotonicTime::EPOCH);
        let mut handle = SimHandle::from_parts(sim, actor_addr);

        handle.write(0, Addr(3), 9).unwrap();
        assert!(handle.read(0, Addr(99)).is_err());
        handle.invalidate(Addr(3)).unwrap();

        let seen = handle
            .sim
            .send_query(Observer::on_collect, (), &obs_addr)
            .unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].state_of(0, 3), CoherenceState::Modified);
        assert_eq!(seen[1].state_of(0, 3), CoherenceState::Invalid);
    }
}
