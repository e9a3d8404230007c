//! Victim selection for full caches.
//!
//! Replacement is uniformly random over all lines. The source of randomness
//! is injected so runs can be reproduced and tests can dictate victims.

use std::collections::VecDeque;

pub trait VictimSource: Send {
    /// Picks one of `lines` line indices (`0..lines`).
    fn pick(&mut self, lines: usize) -> usize;
}

/// Seedable xorshift64 generator.
#[derive(Clone, Debug)]
pub struct XorShift {
    state: u64,
}

impl XorShift {
    pub fn new(seed: u64) -> Self {
        // an all-zero state would be a fixed point
        let state = if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed };
        XorShift { state }
    }

    /// Generator for the cache of processor `id`, derived from one system seed.
    pub fn for_cache(seed: u64, id: usize) -> Self {
        Self::new(seed ^ (id as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15))
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

impl VictimSource for XorShift {
    fn pick(&mut self, lines: usize) -> usize {
        (self.next_u64() % lines as u64) as usize
    }
}

/// Hands out a fixed sequence of victims, then falls back to line 0.
#[derive(Clone, Debug, Default)]
pub struct ScriptedVictims {
    script: VecDeque<usize>,
}

impl ScriptedVictims {
    pub fn new(victims: impl IntoIterator<Item = usize>) -> Self {
        ScriptedVictims { script: victims.into_iter().collect() }
    }
}

impl VictimSource for ScriptedVictims {
    fn pick(&mut self, lines: usize) -> usize {
        self.script.pop_front().unwrap_or(0) % lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_victims() {
        let mut a = XorShift::new(42);
        let mut b = XorShift::new(42);
        let va: Vec<_> = (0..32).map(|_| a.pick(4)).collect();
        let vb: Vec<_> = (0..32).map(|_| b.pick(4)).collect();
        assert_eq!(va, vb);
    }

    #[test]
    fn victims_stay_in_range_and_cover_all_lines() {
        let mut rng = XorShift::new(0);
        let mut seen = [false; 4];
        for _ in 0..256 {
            let v = rng.pick(4);
            assert!(v < 4);
            seen[v] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn caches_get_distinct_streams() {
        let mut a = XorShift::for_cache(7, 0);
        let mut b = XorShift::for_cache(7, 1);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn scripted_victims() {
        let mut s = ScriptedVictims::new([2, 5]);
        assert_eq!(s.pick(4), 2);
        assert_eq!(s.pick(4), 1);
        assert_eq!(s.pick(4), 0);
    }
}
