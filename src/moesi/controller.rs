use log::{debug, trace};

use super::cache::{Cache, LogicalClock, WriteBack};
use super::common::*;
use super::error::{SimError, SimResult};
use super::memory::Memory;

/// The single authority over all caches and main memory.
///
/// Every access is arbitrated here. There is no directory: on a miss the
/// controller snoops every other cache for the address, applies the MOESI
/// transitions and moves data between caches and memory. Requests are
/// processed one at a time to completion, which is what makes the bus atomic.
pub struct CoherenceController {
    memory: Memory,
    caches: Vec<Cache>,
    clock: LogicalClock,
}

impl CoherenceController {
    /// Cache `i` serves processor `i`; ids are renumbered to match.
    pub fn new(memory: Memory, mut caches: Vec<Cache>) -> Self {
        for (i, cache) in caches.iter_mut().enumerate() {
            cache.id = i;
        }
        CoherenceController { memory, caches, clock: 0 }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }
    pub fn caches(&self) -> &[Cache] {
        &self.caches
    }
    pub fn clock(&self) -> LogicalClock {
        self.clock
    }
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.caches.iter().map(Cache::view).collect())
    }

    // helper functions

    /// Validates a request and returns the tag it refers to.
    fn admit(&self, requester: usize, addr: Addr) -> SimResult<usize> {
        if requester >= self.caches.len() {
            return Err(SimError::NoSuchProcessor { id: requester, count: self.caches.len() });
        }
        self.memory.index_of(addr)
    }
    fn tick(&mut self) -> LogicalClock {
        self.clock += 1;
        self.clock
    }
    fn signal(&self, from: Option<usize>, sig: BusSignal) {
        match from {
            Some(id) => debug!("bus: {:?} from cache {}", sig, id),
            None => debug!("bus: {:?}", sig),
        }
    }
    fn flush(&mut self, from: usize, wb: WriteBack) {
        self.signal(Some(from), BusSignal::Flush(wb.tag));
        trace!("memory[{}] <- {}", wb.tag, wb.data);
        self.memory.store(wb.tag, wb.data);
    }
    /// Puts `tag` into a free or victim line of `id`'s cache, writing the
    /// victim back first if it was dirty.
    fn fill(&mut self, id: usize, tag: usize, data: Byte, state: CoherenceState, now: LogicalClock) {
        let cache = &mut self.caches[id];
        let index = cache.choose_victim();
        if let Some(wb) = cache.install_line(index, tag, data, state, now) {
            self.flush(id, wb);
        }
    }
    /// Invalidates `tag` in every cache but `except`, flushing dirty copies.
    fn invalidate_all(&mut self, tag: usize, except: Option<usize>) {
        for id in 0..self.caches.len() {
            if Some(id) == except {
                continue;
            }
            if let Some(wb) = self.caches[id].invalidate(tag) {
                self.flush(id, wb);
            }
        }
    }

    // requests

    pub fn on_read(&mut self, requester: usize, addr: Addr) -> SimResult<Byte> {
        let tag = self.admit(requester, addr)?;
        let now = self.tick();
        debug!("P{} read {}", requester, tag);

        if let Some(data) = self.caches[requester].read_hit(tag, now) {
            trace!("cache {}: read hit {}", requester, tag);
            return Ok(data);
        }

        self.signal(Some(requester), BusSignal::BusRd(tag));
        let owner = self
            .caches
            .iter()
            .enumerate()
            .find(|(id, c)| *id != requester && c.state_of(tag).is_dirty())
            .map(|(id, _)| id);

        let (data, state) = match owner {
            Some(owner) => {
                // the owner supplies the data and keeps responsibility for it
                let cache = &mut self.caches[owner];
                let data = cache.lookup(tag).map_or(0, |l| l.data);
                cache.set_state(tag, CoherenceState::Owned);
                cache.touch(tag, now);
                (data, CoherenceState::Shared)
            }
            None => {
                let mut shared = false;
                for (id, cache) in self.caches.iter_mut().enumerate() {
                    if id == requester {
                        continue;
                    }
                    match cache.state_of(tag) {
                        CoherenceState::Exclusive => {
                            cache.set_state(tag, CoherenceState::Shared);
                            cache.touch(tag, now);
                            shared = true;
                        }
                        CoherenceState::Shared => shared = true,
                        _ => (),
                    }
                }
                let state = if shared { CoherenceState::Shared } else { CoherenceState::Exclusive };
                (self.memory.load(tag), state)
            }
        };

        self.fill(requester, tag, data, state, now);
        Ok(data)
    }

    pub fn on_write(&mut self, requester: usize, addr: Addr, data: Byte) -> SimResult<()> {
        let tag = self.admit(requester, addr)?;
        let now = self.tick();
        debug!("P{} write {} <- {}", requester, tag, data);

        // a Modified line is the only copy, nobody to tell
        if self.caches[requester].state_of(tag) != CoherenceState::Modified {
            self.signal(Some(requester), BusSignal::BusRdX(tag));
            self.invalidate_all(tag, Some(requester));
        }

        if !self.caches[requester].write_hit(tag, data, now) {
            self.fill(requester, tag, data, CoherenceState::Modified, now);
        }
        Ok(())
    }

    /// Drops every cached copy of `addr`, writing dirty data back first.
    pub fn handle_invalidate(&mut self, addr: Addr) -> SimResult<()> {
        let tag = self.memory.index_of(addr)?;
        let _ = self.tick();
        self.signal(None, BusSignal::Invalidate(tag));
        self.invalidate_all(tag, None);
        Ok(())
    }
}
