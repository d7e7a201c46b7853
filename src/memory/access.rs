//! The byte-level seam between the engine and a target's memory

use crate::core::types::Address;
use std::collections::BTreeMap;

/// Best-effort positional access to another address space.
///
/// Both calls may transfer fewer bytes than asked. Readers zero-fill or
/// skip what is missing; writers must treat a short count as failure.
pub trait MemoryAccess {
    /// Reads up to `buf.len()` bytes at `address`, returning how many arrived
    fn read_at(&mut self, address: Address, buf: &mut [u8]) -> usize;

    /// Writes up to `data.len()` bytes at `address`, returning how many landed
    fn write_at(&mut self, address: Address, data: &[u8]) -> usize;

    /// Reads into `buf`, zero-filling whatever could not be read
    fn read_zero_filled(&mut self, address: Address, buf: &mut [u8]) -> usize {
        let n = self.read_at(address, buf).min(buf.len());
        buf[n..].fill(0);
        n
    }
}

impl<A: MemoryAccess + ?Sized> MemoryAccess for &mut A {
    fn read_at(&mut self, address: Address, buf: &mut [u8]) -> usize {
        (**self).read_at(address, buf)
    }

    fn write_at(&mut self, address: Address, data: &[u8]) -> usize {
        (**self).write_at(address, data)
    }
}

/// An address space held in local buffers.
///
/// Mirrors the short-transfer behaviour of `/proc/<pid>/mem`: an access
/// stops at the first byte not covered by a mapped block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryImage {
    blocks: BTreeMap<u64, Vec<u8>>,
}

impl MemoryImage {
    pub fn new() -> Self {
        MemoryImage::default()
    }

    /// Maps a zeroed block of `size` bytes at `base`
    pub fn map_zeroed(&mut self, base: Address, size: usize) {
        self.blocks.insert(base.as_u64(), vec![0; size]);
    }

    /// Maps a block holding `bytes` at `base`
    pub fn map_bytes(&mut self, base: Address, bytes: Vec<u8>) {
        self.blocks.insert(base.as_u64(), bytes);
    }

    /// The bytes of the block mapped exactly at `base`
    pub fn block(&self, base: Address) -> Option<&[u8]> {
        self.blocks.get(&base.as_u64()).map(Vec::as_slice)
    }

    // Block containing `address`, and the offset of `address` inside it.
    fn locate(&self, address: u64) -> Option<(u64, usize)> {
        let (&base, block) = self.blocks.range(..=address).next_back()?;
        let offset = usize::try_from(address - base).ok()?;
        (offset < block.len()).then_some((base, offset))
    }
}

impl MemoryAccess for MemoryImage {
    fn read_at(&mut self, address: Address, buf: &mut [u8]) -> usize {
        let mut done = 0;
        while done < buf.len() {
            let Some((base, offset)) = self.locate(address.as_u64() + done as u64) else {
                break;
            };
            let block = &self.blocks[&base];
            let n = (block.len() - offset).min(buf.len() - done);
            buf[done..done + n].copy_from_slice(&block[offset..offset + n]);
            done += n;
        }
        done
    }

    fn write_at(&mut self, address: Address, data: &[u8]) -> usize {
        let mut done = 0;
        while done < data.len() {
            let Some((base, offset)) = self.locate(address.as_u64() + done as u64) else {
                break;
            };
            let Some(block) = self.blocks.get_mut(&base) else {
                break;
            };
            let n = (block.len() - offset).min(data.len() - done);
            block[offset..offset + n].copy_from_slice(&data[done..done + n]);
            done += n;
        }
        done
    }
}
