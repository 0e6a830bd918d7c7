//! Ingestion 错误类型

use contracts::ContractError;
use encoder::EncodeError;
use extractor::ExtractError;
use thiserror::Error;

/// 单条消息处理错误 (记录日志后跳过该消息)
#[derive(Debug, Error)]
pub enum MessageError {
    /// 负载解码失败
    #[error("failed to decode payload: {message}")]
    Decode {
        /// 错误消息
        message: String,
    },

    /// 字段提取失败
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// 消息与配置均未提供位置
    #[error("no position: message has no latitude/longitude and no default location is set")]
    NoPosition,

    /// 编码失败
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl MessageError {
    /// 指标标签
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode",
            Self::Extract(_) => "extract",
            Self::NoPosition => "position",
            Self::Encode(_) => "encode",
        }
    }

    /// 转换为共享错误类型
    pub fn into_contract(self, topic: &str) -> ContractError {
        match self {
            Self::Decode { message } => ContractError::PayloadDecode {
                topic: topic.to_string(),
                message,
            },
            Self::Extract(e) => e.into(),
            Self::NoPosition => ContractError::Encoding {
                topic: topic.to_string(),
                message: "no position available".to_string(),
            },
            Self::Encode(e) => e.into_contract(topic),
        }
    }
}

/// Router 错误 (终止该 router)
#[derive(Debug, Error)]
pub enum RouterError {
    /// 订阅失败
    #[error("failed to subscribe to topic {topic}: {source}")]
    Subscribe {
        /// Topic
        topic: String,
        #[source]
        source: ContractError,
    },

    /// 消息源连接丢失
    #[error("message source for topic {topic} failed: {source}")]
    SourceLost {
        /// Topic
        topic: String,
        #[source]
        source: ContractError,
    },

    /// 输出队列已关闭
    #[error("output queue closed while routing topic {topic}")]
    QueueClosed {
        /// Topic
        topic: String,
    },
}

impl From<RouterError> for ContractError {
    fn from(err: RouterError) -> Self {
        match err {
            RouterError::Subscribe { source, .. } | RouterError::SourceLost { source, .. } => {
                source
            }
            RouterError::QueueClosed { topic } => {
                ContractError::Other(format!("output queue closed for topic {topic}"))
            }
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, RouterError>;
