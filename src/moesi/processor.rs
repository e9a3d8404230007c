use super::cache::Cache;
use super::common::*;
use super::controller::CoherenceController;
use super::error::SimResult;

/// One processor, bound to its own cache and, through the controller, to
/// every other cache and main memory.
pub struct Processor<'a> {
    pub id: usize,
    controller: &'a mut CoherenceController,
}

impl<'a> Processor<'a> {
    pub(crate) fn new(id: usize, controller: &'a mut CoherenceController) -> Self {
        Processor { id, controller }
    }

    pub fn cache(&self) -> &Cache {
        &self.controller.caches()[self.id]
    }

    pub fn read(&mut self, addr: Addr) -> SimResult<Byte> {
        self.controller.on_read(self.id, addr)
    }

    pub fn write(&mut self, addr: Addr, data: Byte) -> SimResult<()> {
        self.controller.on_write(self.id, addr, data)
    }
}
