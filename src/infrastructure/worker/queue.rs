//! Narration Queue - 合成任务队列
//!
//! 入队失败（队列满）只记录日志，项目保持 pending，不阻塞请求

use tokio::sync::mpsc;
use uuid::Uuid;

/// 队列发送端
#[derive(Clone)]
pub struct NarrationQueue {
    sender: mpsc::Sender<Uuid>,
}

impl NarrationQueue {
    /// 提交项目到合成队列
    pub fn enqueue(&self, project_id: Uuid) {
        if let Err(e) = self.sender.try_send(project_id) {
            tracing::warn!(project_id = %project_id, error = %e, "Failed to enqueue project");
        }
    }
}

/// 创建队列，返回发送端与 Worker 消费端
pub fn narration_channel(capacity: usize) -> (NarrationQueue, mpsc::Receiver<Uuid>) {
    let (sender, receiver) = mpsc::channel(capacity);
    (NarrationQueue { sender }, receiver)
}
