mod cache;
mod common;
mod controller;
mod error;
mod memory;
mod processor;
mod replacement;
mod system;

pub use cache::{Cache, CacheLine, LogicalClock, WriteBack};
pub use common::*;
pub use controller::CoherenceController;
pub use error::{SimError, SimResult};
pub use memory::Memory;
pub use processor::Processor;
pub use replacement::{ScriptedVictims, VictimSource, XorShift};
pub use system::Simulator;
