//! # Dispatcher
//!
//! 输出分发模块。
//!
//! 负责：
//! - 每个输出目标一个无界队列 (`OutputQueue`)
//! - 每个队列一个消费者 (`OutputDispatcher`)，按入队顺序交给 sender
//! - 发送失败只记录并丢弃该数据包，不影响后续数据包
//! - 提供 APRS-IS / KISS / 日志三种 sender

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod queue;
pub mod senders;

pub use contracts::{EncodedPacket, PacketSender};
pub use dispatcher::{DispatcherOutcome, DispatcherReport, DispatcherState, OutputDispatcher};
pub use error::DispatcherError;
pub use metrics::{DispatcherCounters, DispatcherMetrics};
pub use queue::{output_queue, OutputQueue, QueueItem, QueueReceiver};
pub use senders::{
    ax25_ui_frame, kiss_encode, AprsIsSender, AprsIsSenderConfig, Ax25Address, ConfiguredSender,
    KissPath, KissSender, KissSenderConfig, LogSender,
};
