use log::trace;

use super::common::*;
use super::error::{SimError, SimResult};
use super::replacement::VictimSource;

pub type LogicalClock = u64;

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub struct CacheLine {
    pub tag: Option<usize>,     // None iff Invalid
    pub data: Byte,
    pub state: CoherenceState,
    pub last_access: LogicalClock,
}

impl CacheLine {
    pub fn view(&self) -> LineView {
        LineView { tag: self.tag, state: self.state }
    }
}

/// Dirty data handed back by a cache when a line is evicted or invalidated,
/// to be written to memory before it is lost.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct WriteBack {
    pub tag: usize,
    pub data: Byte,
}

/// A fully associative cache belonging to one processor.
pub struct Cache {
    pub id: usize,
    lines: Vec<CacheLine>,
    victims: Box<dyn VictimSource>,
}

impl Cache {
    /// A cache with `capacity` lines, all `Invalid`. A cache without lines
    /// could never hold anything, so zero capacity is rejected.
    pub fn new(id: usize, capacity: usize, victims: Box<dyn VictimSource>) -> SimResult<Self> {
        if capacity == 0 {
            return Err(SimError::InvalidSpec("caches need at least one line"));
        }
        Ok(Cache {
            id,
            lines: vec![CacheLine::default(); capacity],
            victims,
        })
    }

    pub fn capacity(&self) -> usize {
        self.lines.len()
    }
    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }
    pub fn view(&self) -> Vec<LineView> {
        self.lines.iter().map(CacheLine::view).collect()
    }

    // helper functions
    fn position(&self, tag: usize) -> Option<usize> {
        self.lines
            .iter()
            .position(|l| l.tag == Some(tag) && l.state.is_valid())
    }
    fn line_mut(&mut self, tag: usize) -> Option<&mut CacheLine> {
        let i = self.position(tag)?;
        Some(&mut self.lines[i])
    }

    /// The valid line caching `tag`, if any.
    pub fn lookup(&self, tag: usize) -> Option<&CacheLine> {
        self.position(tag).map(|i| &self.lines[i])
    }

    pub fn state_of(&self, tag: usize) -> CoherenceState {
        self.lookup(tag).map_or(CoherenceState::Invalid, |l| l.state)
    }

    /// Picks the line a new tag goes into: the first free line, or a uniformly
    /// random one when the cache is full.
    pub fn choose_victim(&mut self) -> usize {
        match self.lines.iter().position(|l| !l.state.is_valid()) {
            Some(free) => free,
            None => self.victims.pick(self.lines.len()),
        }
    }

    /// Overwrites line `index`. If the old content was dirty it is returned
    /// and must be written back by the caller.
    #[must_use]
    pub fn install_line(
        &mut self,
        index: usize,
        tag: usize,
        data: Byte,
        state: CoherenceState,
        now: LogicalClock,
    ) -> Option<WriteBack> {
        let old = self.lines[index];
        let evicted = match old.tag {
            Some(old_tag) if old.state.is_dirty() => Some(WriteBack { tag: old_tag, data: old.data }),
            _ => None,
        };
        if let Some(old_tag) = old.tag {
            trace!("cache {}: evict {} ({}) from line {}", self.id, old_tag, old.state, index);
        }
        debug_assert!(state.is_valid(), "installed lines must be valid");
        trace!("cache {}: install {} as {} in line {}", self.id, tag, state, index);
        self.lines[index] = CacheLine {
            tag: Some(tag),
            data,
            state,
            last_access: now,
        };
        evicted
    }

    /// Changes the state of the line holding `tag`; no-op if there is none.
    /// Moving to `Invalid` frees the line, dropping its data without a
    /// write-back (use `invalidate` for that).
    pub fn set_state(&mut self, tag: usize, state: CoherenceState) {
        let id = self.id;
        if let Some(line) = self.line_mut(tag) {
            trace!("cache {}: {} {} -> {}", id, tag, line.state, state);
            if state.is_valid() {
                line.state = state;
            } else {
                *line = CacheLine { last_access: line.last_access, ..CacheLine::default() };
            }
        }
    }

    /// Records an access to the line holding `tag` without changing it.
    pub fn touch(&mut self, tag: usize, now: LogicalClock) {
        if let Some(line) = self.line_mut(tag) {
            line.last_access = now;
        }
    }

    /// Drops the line holding `tag`, returning its data if it was dirty.
    #[must_use]
    pub fn invalidate(&mut self, tag: usize) -> Option<WriteBack> {
        let line = self.lookup(tag).copied()?;
        self.set_state(tag, CoherenceState::Invalid);
        line.state.is_dirty().then_some(WriteBack { tag, data: line.data })
    }

    /// Writes into an already cached line, which becomes `Modified`.
    /// Returns false if `tag` is not cached.
    pub fn write_hit(&mut self, tag: usize, data: Byte, now: LogicalClock) -> bool {
        let id = self.id;
        match self.line_mut(tag) {
            Some(line) => {
                trace!("cache {}: write hit {} ({} -> M)", id, tag, line.state);
                line.data = data;
                line.state = CoherenceState::Modified;
                line.last_access = now;
                true
            }
            None => false,
        }
    }

    /// Reads a cached line, recording the access.
    pub fn read_hit(&mut self, tag: usize, now: LogicalClock) -> Option<Byte> {
        self.line_mut(tag).map(|line| {
            line.last_access = now;
            line.data
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moesi::replacement::ScriptedVictims;
    use CoherenceState::*;

    fn cache(lines: usize, victims: &[usize]) -> Cache {
        Cache::new(0, lines, Box::new(ScriptedVictims::new(victims.to_vec()))).unwrap()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let res = Cache::new(3, 0, Box::new(ScriptedVictims::default()));
        assert!(matches!(res, Err(SimError::InvalidSpec(_))));
        assert_eq!(cache(3, &[]).capacity(), 3);
    }

    #[test]
    fn touch_only_stamps() {
        let mut c = cache(2, &[]);
        let _ = c.install_line(1, 5, 9, Owned, 1);
        c.touch(5, 7);
        c.touch(6, 8);
        assert_eq!(c.lines()[1], CacheLine { tag: Some(5), data: 9, state: Owned, last_access: 7 });
        assert_eq!(c.lines()[0], CacheLine::default());
    }

    #[test]
    fn empty_cache_misses() {
        let c = cache(4, &[]);
        assert!(c.lookup(3).is_none());
        assert!(c.lines().iter().all(|l| l.tag.is_none() && l.state == Invalid));
    }

    #[test]
    fn free_lines_are_used_first() {
        let mut c = cache(2, &[1]);
        assert_eq!(c.choose_victim(), 0);
        assert_eq!(c.install_line(0, 5, 1, Exclusive, 1), None);
        assert_eq!(c.choose_victim(), 1);
        assert_eq!(c.install_line(1, 6, 2, Shared, 2), None);
        // full: the scripted victim decides
        assert_eq!(c.choose_victim(), 1);
    }

    #[test]
    fn evicting_dirty_line_yields_write_back() {
        let mut c = cache(1, &[0, 0, 0]);
        assert_eq!(c.install_line(0, 5, 9, Modified, 1), None);
        let victim = c.choose_victim();
        assert_eq!(c.install_line(victim, 6, 1, Owned, 2), Some(WriteBack { tag: 5, data: 9 }));
        assert_eq!(c.install_line(0, 7, 1, Shared, 3), Some(WriteBack { tag: 6, data: 1 }));
        // clean lines vanish silently
        assert_eq!(c.install_line(0, 8, 1, Exclusive, 4), None);
        assert!(c.lookup(5).is_none());
        assert_eq!(c.lookup(8).map(|l| l.last_access), Some(4));
    }

    #[test]
    fn set_state_to_invalid_clears_tag() {
        let mut c = cache(2, &[]);
        let _ = c.install_line(0, 5, 1, Exclusive, 1);
        c.set_state(5, Shared);
        assert_eq!(c.state_of(5), Shared);
        c.set_state(5, Invalid);
        assert_eq!(c.lines()[0].tag, None);
        assert_eq!(c.lines()[0].state, Invalid);
        // absent tag: no-op
        c.set_state(42, Modified);
        assert!(c.lookup(42).is_none());
    }

    #[test]
    fn invalidate_returns_dirty_data_only() {
        let mut c = cache(2, &[]);
        let _ = c.install_line(0, 1, 10, Owned, 1);
        let _ = c.install_line(1, 2, 20, Shared, 1);
        assert_eq!(c.invalidate(1), Some(WriteBack { tag: 1, data: 10 }));
        assert_eq!(c.invalidate(2), None);
        assert_eq!(c.invalidate(3), None);
        assert!(c.view().iter().all(|l| *l == LineView::default()));
    }

    #[test]
    fn write_hit_upgrades_to_modified() {
        let mut c = cache(2, &[]);
        assert!(!c.write_hit(4, 1, 1));
        let _ = c.install_line(0, 4, 0, Shared, 1);
        assert!(c.write_hit(4, 77, 2));
        let line = c.lookup(4).copied().unwrap();
        assert_eq!((line.state, line.data, line.last_access), (Modified, 77, 2));
        assert_eq!(c.read_hit(4, 3), Some(77));
        assert_eq!(c.read_hit(9, 3), None);
    }
}
