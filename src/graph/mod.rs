mod block_pool;
mod stream;
#[cfg(test)]
mod tests;

pub use block_pool::{BlockHandle, BlockPool};
pub use stream::UpdateContext;
