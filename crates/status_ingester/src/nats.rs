mod status_envelope_processor;

pub use status_envelope_processor::*;
