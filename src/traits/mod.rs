use std::any::Any;

use rustc_hash::FxHashMap;

use crate::graph::UpdateContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortId {
    AudioInput0,
    AudioInput1,
    AudioOutput0,
    AudioOutput1,
}

impl PortId {
    pub fn is_audio_input(&self) -> bool {
        matches!(self, PortId::AudioInput0 | PortId::AudioInput1)
    }

    pub fn is_audio_output(&self) -> bool {
        matches!(self, PortId::AudioOutput0 | PortId::AudioOutput1)
    }

    pub fn to_input_index(&self) -> Option<usize> {
        match self {
            PortId::AudioInput0 => Some(0),
            PortId::AudioInput1 => Some(1),
            _ => None,
        }
    }

    pub fn to_output_index(&self) -> Option<usize> {
        match self {
            PortId::AudioOutput0 => Some(0),
            PortId::AudioOutput1 => Some(1),
            _ => None,
        }
    }

    pub fn from_input_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(PortId::AudioInput0),
            1 => Some(PortId::AudioInput1),
            _ => None,
        }
    }

    pub fn from_output_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(PortId::AudioOutput0),
            1 => Some(PortId::AudioOutput1),
            _ => None,
        }
    }
}

pub trait AudioNode: Any {
    fn get_ports(&self) -> FxHashMap<PortId, bool>;

    /// Runs one processing cycle against the host's block queues.
    /// Every block received from `ctx` must end up either transmitted
    /// or released before this returns.
    fn update(&mut self, ctx: &mut UpdateContext);

    fn reset(&mut self);

    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn as_any(&self) -> &dyn Any;

    // Active state management
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);

    // Optional method to handle state changes
    fn on_active_changed(&mut self) {}

    // Helper to determine if node should be processed
    fn should_process(&self) -> bool {
        self.is_active()
    }

    fn name(&self) -> &'static str;

    fn node_type(&self) -> &str;
}
