use log::info;

use super::cache::Cache;
use super::common::*;
use super::controller::CoherenceController;
use super::error::{SimError, SimResult};
use super::memory::Memory;
use super::processor::Processor;
use super::replacement::{VictimSource, XorShift};

/// The whole simulated machine: `P` processors with one cache each, sharing
/// one memory through the coherence controller.
pub struct Simulator {
    spec: SystemSpec,
    controller: CoherenceController,
}

impl Simulator {
    /// Builds a system whose caches replace lines using xorshift generators
    /// derived from `spec.seed`.
    pub fn new(spec: SystemSpec) -> SimResult<Self> {
        Self::with_victims(spec, |id| {
            Box::new(XorShift::for_cache(spec.seed, id)) as Box<dyn VictimSource>
        })
    }

    /// Builds a system with a caller-provided victim source for each cache.
    pub fn with_victims<F>(spec: SystemSpec, mut victims: F) -> SimResult<Self>
    where
        F: FnMut(usize) -> Box<dyn VictimSource>,
    {
        spec.validate()?;
        info!(
            "system: {} processors, {} bytes of memory, {} lines per cache",
            spec.num_procs, spec.mem_size, spec.cache_lines
        );
        let caches = (0..spec.num_procs)
            .map(|id| Cache::new(id, spec.cache_lines, victims(id)))
            .collect::<SimResult<Vec<_>>>()?;
        Ok(Simulator {
            spec,
            controller: CoherenceController::new(Memory::new(spec.mem_size), caches),
        })
    }

    pub fn spec(&self) -> &SystemSpec {
        &self.spec
    }

    pub fn processor(&mut self, id: usize) -> SimResult<Processor<'_>> {
        if id >= self.spec.num_procs {
            return Err(SimError::NoSuchProcessor { id, count: self.spec.num_procs });
        }
        Ok(Processor::new(id, &mut self.controller))
    }

    // request API

    pub fn read(&mut self, proc: usize, addr: Addr) -> SimResult<Byte> {
        self.processor(proc)?.read(addr)
    }

    pub fn write(&mut self, proc: usize, addr: Addr, data: Byte) -> SimResult<()> {
        self.processor(proc)?.write(addr, data)
    }

    pub fn invalidate(&mut self, addr: Addr) -> SimResult<()> {
        self.controller.handle_invalidate(addr)
    }

    /// Executes one request, returning the byte read for reads.
    pub fn apply(&mut self, req: Request) -> SimResult<Option<Byte>> {
        match req {
            Request::Read { proc, addr } => self.read(proc, addr).map(Some),
            Request::Write { proc, addr, data } => self.write(proc, addr, data).map(|_| None),
        }
    }

    // observation API

    pub fn snapshot(&self) -> Snapshot {
        self.controller.snapshot()
    }

    pub fn cache(&self, id: usize) -> Option<&Cache> {
        self.controller.caches().get(id)
    }

    pub fn memory(&self) -> &Memory {
        self.controller.memory()
    }

    pub fn clock(&self) -> u64 {
        self.controller.clock()
    }
}
