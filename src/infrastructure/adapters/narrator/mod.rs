//! Narrator Adapter - 占位正弦波合成实现

mod sine_narrator;

pub use sine_narrator::{SineWaveNarrator, SineWaveNarratorConfig};
