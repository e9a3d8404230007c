use thiserror::Error;

/// Errors surfaced by the simulator to its caller.
///
/// None of these leave a trace in the simulated system: a rejected request
/// changes no cache line, no memory cell and not the logical clock.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    #[error("address {addr} out of range for memory of size {size}")]
    OutOfRange { addr: i64, size: usize },

    #[error("no processor {id} (system has {count})")]
    NoSuchProcessor { id: usize, count: usize },

    #[error("invalid system spec: {0}")]
    InvalidSpec(&'static str),

    #[error("coherence actor did not answer")]
    ActorUnavailable,
}

pub type SimResult<T> = Result<T, SimError>;
