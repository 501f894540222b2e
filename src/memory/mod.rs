/// Error returned by [`Memory::read`] and [`Memory::write`] when an address
/// is out of the representable range.
///
/// This only models the part of a [`Fault`](crate::processor::Fault) that
/// `Memory` itself can detect; the processor attaches the program counter
/// and other context before surfacing it to callers.
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum AddressError {
    #[error("negative address {0}")]
    Negative(i64),
}

/// The flat, unbounded IntCode address space.
///
/// Backed by a growable `Vec<i64>`. Reading past the end of the backing
/// vector yields `0` without growing it; writing past the end grows the
/// vector (zero-filling the gap) just far enough to hold the new cell.
/// Negative addresses are never valid and are rejected by both operations.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    cells: Vec<i64>,
}

impl Memory {
    /// Constructs an empty memory.
    pub fn new() -> Memory {
        Memory::default()
    }

    /// Constructs a memory pre-loaded with `program` starting at address 0.
    pub fn from_program(program: &[i64]) -> Memory {
        Memory {
            cells: program.to_vec(),
        }
    }

    /// Number of cells currently allocated. Not the same as "highest address
    /// ever touched by a read" — reads past this length are still valid and
    /// return `0`.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reads the cell at `address`, defaulting to `0` past the end.
    ///
    /// # Errors
    /// Returns [`AddressError::Negative`] if `address` is negative.
    pub fn read(&self, address: i64) -> Result<i64, AddressError> {
        if address < 0 {
            return Err(AddressError::Negative(address));
        }
        Ok(self.cells.get(address as usize).copied().unwrap_or(0))
    }

    /// Writes `value` at `address`, growing the backing storage if needed.
    ///
    /// # Errors
    /// Returns [`AddressError::Negative`] if `address` is negative.
    pub fn write(&mut self, address: i64, value: i64) -> Result<(), AddressError> {
        if address < 0 {
            return Err(AddressError::Negative(address));
        }
        let index = address as usize;
        if index >= self.cells.len() {
            // Writing a zero past the end would have no observable effect
            // (reads past the end already default to zero), so don't grow
            // the backing storage for it.
            if value == 0 {
                return Ok(());
            }
            self.cells.resize(index + 1, 0);
        }
        self.cells[index] = value;
        Ok(())
    }

    /// A snapshot of the currently allocated cells, in address order.
    pub fn as_slice(&self) -> &[i64] {
        &self.cells
    }
}
