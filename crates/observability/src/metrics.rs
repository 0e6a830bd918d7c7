//! 管道指标
//!
//! 通过 `metrics` facade 记录；未安装 recorder 时为空操作。

use metrics::{counter, gauge, histogram};

/// 记录消息接收
pub fn record_message_received(topic: &str) {
    counter!(
        "mqtt2aprs_messages_received_total",
        "topic" => topic.to_string()
    )
    .increment(1);
}

/// 记录消息丢弃
///
/// `reason`: decode / extract / position / encode / queue_closed
pub fn record_message_dropped(topic: &str, reason: &'static str) {
    counter!(
        "mqtt2aprs_messages_dropped_total",
        "topic" => topic.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// 记录数据包入队
pub fn record_packet_enqueued(target: &str) {
    counter!(
        "mqtt2aprs_packets_enqueued_total",
        "target" => target.to_string()
    )
    .increment(1);
}

/// 记录数据包发送结果
///
/// `status`: success / failure / discarded
pub fn record_packet_sent(target: &str, status: &'static str) {
    counter!(
        "mqtt2aprs_packets_sent_total",
        "target" => target.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录单次发送耗时
pub fn record_send_latency_ms(target: &str, latency_ms: f64) {
    histogram!(
        "mqtt2aprs_send_latency_ms",
        "target" => target.to_string()
    )
    .record(latency_ms);
}

/// 记录队列深度 (尚未交给 sender 的数据包)
pub fn record_queue_depth(target: &str, depth: usize) {
    gauge!(
        "mqtt2aprs_queue_depth",
        "target" => target.to_string()
    )
    .set(depth as f64);
}
