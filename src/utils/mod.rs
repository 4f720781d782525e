pub mod block_ops;

pub use block_ops::*;
