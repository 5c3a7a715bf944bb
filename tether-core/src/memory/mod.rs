//! Memory access module.
//!
//! Handles reading and writing to target memory. Addresses come straight from
//! the debugger and are trusted; no implementation validates them.

/// Direct, absolute-address access to the memory of the debugged program.
pub trait TargetMemory {
    /// Read a single 8-bit byte from memory.
    fn read_8(&mut self, address: u32) -> u8;

    /// Write a single 8-bit byte to memory.
    fn write_8(&mut self, address: u32, value: u8);

    /// Read a single little-endian 32-bit word from memory.
    fn read_32(&mut self, address: u32) -> u32 {
        let mut bytes = [0u8; 4];
        for (offset, byte) in (0u32..).zip(bytes.iter_mut()) {
            *byte = self.read_8(address.wrapping_add(offset));
        }
        u32::from_le_bytes(bytes)
    }

    /// Write a single little-endian 32-bit word to memory.
    fn write_32(&mut self, address: u32, value: u32) {
        for (offset, byte) in (0u32..).zip(value.to_le_bytes()) {
            self.write_8(address.wrapping_add(offset), byte);
        }
    }
}

impl<M: TargetMemory + ?Sized> TargetMemory for &mut M {
    fn read_8(&mut self, address: u32) -> u8 {
        (**self).read_8(address)
    }

    fn write_8(&mut self, address: u32, value: u8) {
        (**self).write_8(address, value);
    }

    fn read_32(&mut self, address: u32) -> u32 {
        (**self).read_32(address)
    }

    fn write_32(&mut self, address: u32, value: u32) {
        (**self).write_32(address, value);
    }
}

#[cfg(feature = "std")]
pub use sparse::SparseMemory;

#[cfg(feature = "std")]
mod sparse {
    use super::TargetMemory;
    use std::collections::BTreeMap;

    /// Byte-addressed memory covering the full 32-bit space. Bytes never
    /// written read back as zero.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct SparseMemory {
        bytes: BTreeMap<u32, u8>,
    }

    impl SparseMemory {
        pub fn new() -> Self {
            Self::default()
        }

        /// Copy an image into memory starting at `base`.
        pub fn load(&mut self, base: u32, image: &[u8]) {
            for (offset, &byte) in (0u32..).zip(image) {
                self.bytes.insert(base.wrapping_add(offset), byte);
            }
        }

        /// Read a block of memory without going through the trait.
        pub fn read_block(&self, base: u32, len: u32) -> Vec<u8> {
            (0..len)
                .map(|offset| {
                    self.bytes
                        .get(&base.wrapping_add(offset))
                        .copied()
                        .unwrap_or(0)
                })
                .collect()
        }

        /// Number of bytes that have ever been written.
        pub fn populated(&self) -> usize {
            self.bytes.len()
        }
    }

    impl TargetMemory for SparseMemory {
        fn read_8(&mut self, address: u32) -> u8 {
            self.bytes.get(&address).copied().unwrap_or(0)
        }

        fn write_8(&mut self, address: u32, value: u8) {
            self.bytes.insert(address, value);
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn test_words_are_little_endian() {
        let mut mem = SparseMemory::new();
        mem.write_32(0x1000, 0xefaa_aaaa);
        assert_eq!(mem.read_block(0x1000, 4), vec![0xaa, 0xaa, 0xaa, 0xef]);
        assert_eq!(mem.read_32(0x1000), 0xefaa_aaaa);
    }

    #[test]
    fn test_unwritten_memory_reads_zero() {
        let mut mem = SparseMemory::new();
        assert_eq!(mem.read_8(0xffff_ffff), 0);
        assert_eq!(mem.read_32(0x2000), 0);
        assert_eq!(mem.populated(), 0);
    }

    #[test]
    fn test_load_image() {
        let mut mem = SparseMemory::new();
        mem.load(0x8000, &[1, 2, 3, 4]);
        assert_eq!(mem.read_32(0x8000), 0x0403_0201);
        assert_eq!(mem.populated(), 4);
    }

    #[test]
    fn test_word_access_wraps_at_top_of_address_space() {
        let mut mem = SparseMemory::new();
        mem.write_32(0xffff_fffe, 0x4433_2211);
        assert_eq!(mem.read_8(0xffff_ffff), 0x22);
        assert_eq!(mem.read_8(0x0000_0001), 0x44);
    }

    #[test]
    fn test_mut_ref_forwards() {
        fn poke<M: TargetMemory>(mut memory: M) {
            memory.write_32(0x10, 7);
        }

        let mut mem = SparseMemory::new();
        poke(&mut mem);
        assert_eq!(mem.read_32(0x10), 7);
    }
}
