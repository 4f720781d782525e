pub mod correction;
pub mod imbalance_detector;
pub mod iq_preprocessor;

pub use correction::*;
pub use imbalance_detector::*;
pub use iq_preprocessor::*;
