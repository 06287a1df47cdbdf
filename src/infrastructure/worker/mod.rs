//! Worker Layer - Background Task Processing
//!
//! 实现 NarrationWorker，处理语音合成任务

mod narration_worker;
mod queue;

pub use narration_worker::{NarrationWorker, NarrationWorkerConfig};
pub use queue::{narration_channel, NarrationQueue};
