//! Write-buffer recycling keyed by byte-length tiers.
//!
//! Borrowing is non-blocking: the smallest tier that fits is tried first,
//! optionally falling back to a smaller tier. Borrowers are responsible for
//! giving buffers back; a missed return is a slow leak, not a safety bug.

/// Capacity tiers, smallest first.
pub const POOL_TIERS: [usize; 5] = [512, 1024, 2048, 3072, 4096];

const MAX_PER_TIER: usize = 8;

pub struct BufferPool {
    tiers: Vec<(usize, Vec<Vec<u8>>)>,
}

impl Default for BufferPool {
    fn default() -> Self {
        BufferPool {
            tiers: POOL_TIERS.iter().map(|&size| (size, Vec::new())).collect(),
        }
    }
}

impl BufferPool {
    pub fn new() -> BufferPool {
        BufferPool::default()
    }

    /// Takes a cleared buffer with capacity >= `size` from the smallest
    /// adequate tier. With `allow_smaller`, a buffer from a smaller tier may
    /// be returned instead (it will grow on use); otherwise a fresh
    /// allocation is made when no tier fits.
    pub fn borrow(&mut self, size: usize, allow_smaller: bool) -> Vec<u8> {
        for (tier_size, stack) in self.tiers.iter_mut() {
            if *tier_size >= size {
                if let Some(buf) = stack.pop() {
                    return buf;
                }
            }
        }
        if allow_smaller {
            for (_, stack) in self.tiers.iter_mut().rev() {
                if let Some(buf) = stack.pop() {
                    return buf;
                }
            }
        }
        Vec::with_capacity(size)
    }

    /// Returns a buffer to the largest tier its capacity covers. Buffers
    /// smaller than the smallest tier, and overflow beyond the per-tier cap,
    /// are dropped.
    pub fn give_back(&mut self, mut buf: Vec<u8>) {
        buf.clear();
        let capacity = buf.capacity();
        for (tier_size, stack) in self.tiers.iter_mut().rev() {
            if capacity >= *tier_size {
                if stack.len() < MAX_PER_TIER {
                    stack.push(buf);
                }
                return;
            }
        }
    }

    pub fn pooled_count(&self) -> usize {
        self.tiers.iter().map(|(_, stack)| stack.len()).sum()
    }
}
