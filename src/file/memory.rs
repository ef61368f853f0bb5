//! Owned byte buffer source, used for containers produced in memory and for written output that
//! is opened again.

use super::Backend;

/// Container bytes owned by the process.
#[derive(Debug)]
pub struct Memory(Vec<u8>);

impl Memory {
    /// Takes ownership of `bytes`.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Memory {
        Memory(bytes)
    }
}

impl Backend for Memory {
    fn bytes(&self) -> &[u8] {
        &self.0
    }
}
