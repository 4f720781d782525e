use std::collections::HashSet;

/// Index into the pool's block arena. Handles are only meaningful between
/// `acquire` and the matching `release`.
pub type BlockHandle = usize;

/// Free-list arena of fixed-length sample blocks. All blocks share one
/// length, set at construction to the host's audio quantum, so the
/// processing path never allocates.
pub struct BlockPool {
    pub blocks: Vec<Vec<i16>>,
    block_size: usize,
    available: Vec<usize>,
    in_use: HashSet<usize>,
}

impl BlockPool {
    pub fn new(block_size: usize, initial_capacity: usize) -> Self {
        let mut blocks = Vec::with_capacity(initial_capacity);
        let mut available = Vec::with_capacity(initial_capacity);
        let in_use = HashSet::with_capacity(initial_capacity);

        // Initialize all blocks as available
        for i in 0..initial_capacity {
            blocks.push(vec![0; block_size]);
            available.push(i);
        }

        Self {
            blocks,
            block_size,
            available,
            in_use,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn acquire(&mut self) -> BlockHandle {
        let index = if let Some(index) = self.available.pop() {
            index
        } else {
            let index = self.blocks.len();
            self.blocks.push(vec![0; self.block_size]);
            index
        };
        self.in_use.insert(index);
        index
    }

    pub fn release(&mut self, handle: BlockHandle) {
        if self.in_use.remove(&handle) {
            self.available.push(handle);
        }
    }

    pub fn is_in_use(&self, handle: BlockHandle) -> bool {
        self.in_use.contains(&handle)
    }

    pub fn in_use_count(&self) -> usize {
        self.in_use.len()
    }

    pub fn block(&self, handle: BlockHandle) -> &[i16] {
        &self.blocks[handle]
    }

    pub fn block_mut(&mut self, handle: BlockHandle) -> &mut [i16] {
        &mut self.blocks[handle]
    }

    /// Borrows two distinct blocks mutably at once. Panics if both handles
    /// name the same block.
    pub fn block_pair_mut(
        &mut self,
        first: BlockHandle,
        second: BlockHandle,
    ) -> (&mut [i16], &mut [i16]) {
        assert_ne!(first, second, "duplicate mutable block handle requested");
        if first < second {
            let (lo, hi) = self.blocks.split_at_mut(second);
            (lo[first].as_mut_slice(), hi[0].as_mut_slice())
        } else {
            let (lo, hi) = self.blocks.split_at_mut(first);
            (hi[0].as_mut_slice(), lo[second].as_mut_slice())
        }
    }

    pub fn fill(&mut self, handle: BlockHandle, value: i16) {
        self.blocks[handle].fill(value);
    }

    pub fn copy_in(&mut self, handle: BlockHandle, data: &[i16]) {
        let block = &mut self.blocks[handle];
        block[..data.len()].copy_from_slice(data);
    }

    pub fn copy_out(&self, handle: BlockHandle) -> &[i16] {
        &self.blocks[handle]
    }

    pub fn clear(&mut self, handle: BlockHandle) {
        self.blocks[handle].fill(0);
    }

    pub fn release_all(&mut self) {
        // Clear the in-use set and mark all blocks as available
        self.in_use.clear();
        self.available.clear();
        for i in 0..self.blocks.len() {
            self.available.push(i);
        }
    }
}
