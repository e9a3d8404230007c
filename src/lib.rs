//! A MOESI cache coherence simulator.
//!
//! `P` processors, each with a private fully associative cache, share one
//! byte-addressable memory. A directory-less coherence controller snoops all
//! caches on every access and applies the MOESI transitions, so after each
//! request the state of every cache line can be observed.

pub mod actor;
pub mod moesi;
pub mod trace;

pub use moesi::*;
