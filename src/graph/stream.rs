use super::block_pool::{BlockHandle, BlockPool};

pub const NUM_CHANNELS: usize = 2;

/// One processing cycle's view of the host boundary: the blocks queued on
/// each input port and the blocks handed downstream on each output port.
///
/// The host queues input blocks before calling the node's `update`, then
/// drains the output slots afterwards and eventually releases those blocks
/// back to the pool. Within the cycle the node owns every block it has
/// received; each received handle must be passed to exactly one of
/// `transmit` or `release`.
pub struct UpdateContext<'a> {
    pool: &'a mut BlockPool,
    inputs: [Option<BlockHandle>; NUM_CHANNELS],
    outputs: [Option<BlockHandle>; NUM_CHANNELS],
}

impl<'a> UpdateContext<'a> {
    pub fn new(pool: &'a mut BlockPool) -> Self {
        Self {
            pool,
            inputs: [None; NUM_CHANNELS],
            outputs: [None; NUM_CHANNELS],
        }
    }

    /// Host side: stages a block on an input port for the coming cycle.
    pub fn queue_input(&mut self, input: usize, handle: BlockHandle) {
        self.inputs[input] = Some(handle);
    }

    /// Takes ownership of the block queued on `input`, if the host supplied
    /// one this cycle.
    pub fn receive_writable(&mut self, input: usize) -> Option<BlockHandle> {
        self.inputs[input].take()
    }

    pub fn block(&self, handle: BlockHandle) -> &[i16] {
        self.pool.block(handle)
    }

    pub fn block_mut(&mut self, handle: BlockHandle) -> &mut [i16] {
        self.pool.block_mut(handle)
    }

    pub fn block_pair(&self, first: BlockHandle, second: BlockHandle) -> (&[i16], &[i16]) {
        (self.pool.block(first), self.pool.block(second))
    }

    pub fn block_pair_mut(
        &mut self,
        first: BlockHandle,
        second: BlockHandle,
    ) -> (&mut [i16], &mut [i16]) {
        self.pool.block_pair_mut(first, second)
    }

    /// Hands a block downstream on `output`. Ownership moves to the host,
    /// which releases the block once the downstream consumer is done.
    pub fn transmit(&mut self, handle: BlockHandle, output: usize) {
        debug_assert!(
            self.outputs[output].is_none(),
            "output port transmitted twice in one cycle"
        );
        self.outputs[output] = Some(handle);
    }

    /// Returns a block to the pool without producing output.
    pub fn release(&mut self, handle: BlockHandle) {
        self.pool.release(handle);
    }

    /// Host side: drains the block transmitted on `output` this cycle.
    pub fn take_output(&mut self, output: usize) -> Option<BlockHandle> {
        self.outputs[output].take()
    }
}
