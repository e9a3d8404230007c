use super::common::*;
use super::error::{SimError, SimResult};

/// Flat, byte-addressable main memory.
#[derive(Clone, Debug)]
pub struct Memory {
    cells: Vec<Byte>,
}

impl Memory {
    pub fn new(size: usize) -> Self {
        Memory { cells: vec![0; size] }
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Validates `addr` and returns it as a cell index.
    pub fn index_of(&self, addr: Addr) -> SimResult<usize> {
        usize::try_from(addr.0)
            .ok()
            .filter(|&i| i < self.cells.len())
            .ok_or(SimError::OutOfRange { addr: addr.0, size: self.cells.len() })
    }

    pub fn read(&self, addr: Addr) -> SimResult<Byte> {
        let i = self.index_of(addr)?;
        Ok(self.cells[i])
    }

    pub fn write(&mut self, addr: Addr, data: Byte) -> SimResult<()> {
        let i = self.index_of(addr)?;
        self.cells[i] = data;
        Ok(())
    }

    // indices reaching these have been validated by `index_of`

    pub(crate) fn load(&self, index: usize) -> Byte {
        self.cells[index]
    }
    pub(crate) fn store(&mut self, index: usize, data: Byte) {
        self.cells[index] = data;
    }
}
