use std::fmt;

use super::error::{SimError, SimResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemSpec {         // unit         reasonable defaults
    pub num_procs: usize,       // processors   4
    pub mem_size: usize,        // bytes        16
    pub cache_lines: usize,     // lines        4
    pub seed: u64,              // replacement  0x2545_f491
}

impl Default for SystemSpec {
    fn default() -> Self {
        SystemSpec {
            num_procs: 4,
            mem_size: 16,
            cache_lines: 4,
            seed: 0x2545_f491,
        }
    }
}

impl SystemSpec {
    pub fn validate(&self) -> SimResult<()> {
        if self.num_procs == 0 {
            return Err(SimError::InvalidSpec("at least one processor is required"));
        }
        if self.mem_size == 0 {
            return Err(SimError::InvalidSpec("memory size must be non-zero"));
        }
        if self.cache_lines == 0 {
            return Err(SimError::InvalidSpec("caches need at least one line"));
        }
        Ok(())
    }
}

/// An address as supplied by a caller. It is signed so that negative
/// requests can be represented and rejected instead of wrapping.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Addr(pub i64);

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type Byte = u8;

/// MOESI line state.
///
/// <pre>
///   M O E S I     (may another cache hold the same address in ...?)
/// M ✗ ✗ ✗ ✗ ✓
/// O ✗ ✗ ✗ ✓ ✓
/// E ✗ ✗ ✗ ✗ ✓
/// S ✗ ✓ ✗ ✓ ✓
/// I ✓ ✓ ✓ ✓ ✓
/// </pre>
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum CoherenceState {
    Modified,
    Owned,
    Exclusive,
    Shared,
    #[default]
    Invalid,
}

impl CoherenceState {
    /// the line holds data memory does not have yet
    pub fn is_dirty(self) -> bool {
        matches!(self, CoherenceState::Modified | CoherenceState::Owned)
    }
    pub fn is_valid(self) -> bool {
        self != CoherenceState::Invalid
    }
    pub fn letter(self) -> char {
        match self {
            CoherenceState::Modified => 'M',
            CoherenceState::Owned => 'O',
            CoherenceState::Exclusive => 'E',
            CoherenceState::Shared => 'S',
            CoherenceState::Invalid => 'I',
        }
    }
}

impl fmt::Display for CoherenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

// the bus signals the controller issues on behalf of a cache
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BusSignal {
    BusRd(usize),
    BusRdX(usize),
    Flush(usize),
    Invalidate(usize),
}

// requests

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Request {
    Read { proc: usize, addr: Addr },
    Write { proc: usize, addr: Addr, data: Byte },
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Read { proc, addr } => write!(f, "P{proc} read  [{addr}]"),
            Request::Write { proc, addr, data } => write!(f, "P{proc} write [{addr}] <- {data}"),
        }
    }
}

pub type Insts = Vec<Request>;

// observation

/// What a front end gets to see of a single cache line.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct LineView {
    pub tag: Option<usize>,
    pub state: CoherenceState,
}

/// State of every line of every cache, indexed `[processor][line]`.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Snapshot(pub Vec<Vec<LineView>>);

impl Snapshot {
    pub fn procs(&self) -> usize {
        self.0.len()
    }
    pub fn lines(&self, proc: usize) -> &[LineView] {
        self.0.get(proc).map(Vec::as_slice).unwrap_or(&[])
    }
    /// state of `tag` in the cache of `proc`, `Invalid` if not cached
    pub fn state_of(&self, proc: usize, tag: usize) -> CoherenceState {
        self.lines(proc)
            .iter()
            .find(|l| l.tag == Some(tag))
            .map(|l| l.state)
            .unwrap_or(CoherenceState::Invalid)
    }
    /// (processor, state) of every valid line holding `tag`
    pub fn holders(&self, tag: usize) -> Vec<(usize, CoherenceState)> {
        self.0
            .iter()
            .enumerate()
            .flat_map(|(p, lines)| {
                lines
                    .iter()
                    .filter(move |l| l.tag == Some(tag) && l.state.is_valid())
                    .map(move |l| (p, l.state))
            })
            .collect()
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (p, lines) in self.0.iter().enumerate() {
            write!(f, "P{p}:")?;
            for l in lines {
                match l.tag {
                    Some(tag) => write!(f, " [{tag:>3} {}]", l.state)?,
                    None => write!(f, " [  - {}]", l.state)?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
