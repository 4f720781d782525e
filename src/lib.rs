pub mod config;
pub mod graph;
pub mod nodes;
pub mod spectrum;
pub mod traits;
pub mod utils;

pub use config::PreprocessorConfig;
pub use graph::{BlockHandle, BlockPool, UpdateContext};
pub use nodes::{
    CorrectionConfig, CorrectionDirection, CorrectionTracker, DetectorConfig, ImbalanceDetector,
    IqPreprocessor, Verdict, FFT_SIZE,
};
pub use spectrum::{RustFftAnalyzer, SpectrumAnalyzer};
pub use traits::{AudioNode, PortId};
pub use utils::*;
