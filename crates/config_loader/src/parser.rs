//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。
//! 两种格式都先解析为 `serde_json::Value`，以便叠加环境变量后再反序列化。

use contracts::{BridgeConfig, ContractError};
use serde_json::Value;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 文本为通用文档
pub fn parse_toml_document(content: &str) -> Result<Value, ContractError> {
    let document: toml::Table = toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })?;
    serde_json::to_value(document).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML conversion error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 文本为通用文档
pub fn parse_json_document(content: &str) -> Result<Value, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析为通用文档
pub fn parse_document(content: &str, format: ConfigFormat) -> Result<Value, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml_document(content),
        ConfigFormat::Json => parse_json_document(content),
    }
}

/// 将通用文档反序列化为 `BridgeConfig`
pub fn into_config(document: Value) -> Result<BridgeConfig, ContractError> {
    serde_json::from_value(document).map_err(|e| ContractError::ConfigParse {
        message: format!("invalid configuration: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<BridgeConfig, ContractError> {
    into_config(parse_document(content, format)?)
}
