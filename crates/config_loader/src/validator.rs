//! 配置校验模块
//!
//! 校验规则：
//! - topic 唯一且非空
//! - 每个 route 至少配置一个字段路径
//! - callsign 非空，ssid 位于 0-15
//! - 默认位置经纬度范围合法
//! - `is` 目标需要 `[aprs]`，`kiss` 目标需要 `kiss.path` 与 `[aprs]` 呼号
//! - drain_timeout_secs > 0
//!
//! 路径表达式的语法在 route 构建时编译校验 (见 extractor crate)。

use std::collections::HashSet;

use contracts::{BridgeConfig, ContractError, OutputTarget};

/// 校验 BridgeConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &BridgeConfig) -> Result<(), ContractError> {
    validate_topics(config)?;
    validate_aprs(config)?;
    validate_location(config)?;
    validate_targets(config)?;
    validate_pipeline(config)?;
    Ok(())
}

/// 校验 topic 唯一性与字段配置
fn validate_topics(config: &BridgeConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, route) in config.mqtt.topics.iter().enumerate() {
        if route.topic.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("mqtt.topics[{idx}].topic"),
                "topic cannot be empty",
            ));
        }
        if !seen.insert(route.topic.as_str()) {
            return Err(ContractError::config_validation(
                format!("mqtt.topics[topic={}]", route.topic),
                "duplicate topic",
            ));
        }
        if route.fields.is_empty() {
            return Err(ContractError::config_validation(
                format!("mqtt.topics[topic={}].fields", route.topic),
                "at least one field path must be configured",
            ));
        }
    }
    Ok(())
}

/// 校验 APRS 身份
fn validate_aprs(config: &BridgeConfig) -> Result<(), ContractError> {
    let Some(aprs) = &config.aprs else {
        return Ok(());
    };
    if aprs.callsign.trim().is_empty() {
        return Err(ContractError::config_validation(
            "aprs.callsign",
            "callsign cannot be empty",
        ));
    }
    if let Some(ssid) = aprs.ssid {
        if ssid > 15 {
            return Err(ContractError::config_validation(
                "aprs.ssid",
                format!("ssid must be in 0..=15, got {ssid}"),
            ));
        }
    }
    Ok(())
}

/// 校验默认位置
fn validate_location(config: &BridgeConfig) -> Result<(), ContractError> {
    if let Some(lat) = config.location.latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ContractError::config_validation(
                "location.latitude",
                format!("latitude must be within [-90, 90], got {lat}"),
            ));
        }
    }
    if let Some(lon) = config.location.longitude {
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ContractError::config_validation(
                "location.longitude",
                format!("longitude must be within [-180, 180], got {lon}"),
            ));
        }
    }
    Ok(())
}

/// 校验输出目标所需的传输配置
fn validate_targets(config: &BridgeConfig) -> Result<(), ContractError> {
    for target in config.active_targets() {
        match target {
            OutputTarget::Internet => {
                if config.aprs.is_none() {
                    return Err(ContractError::config_validation(
                        "aprs",
                        "routes target 'is' but no [aprs] section is configured",
                    ));
                }
            }
            OutputTarget::Kiss => {
                if config.kiss.as_ref().and_then(|k| k.path()).is_none() {
                    return Err(ContractError::config_validation(
                        "kiss.path",
                        "routes target 'kiss' but no KISS path is configured",
                    ));
                }
                if config.aprs.is_none() {
                    return Err(ContractError::config_validation(
                        "aprs.callsign",
                        "routes target 'kiss' but no source callsign is configured in [aprs]",
                    ));
                }
            }
        }
    }
    Ok(())
}

/// 校验管道参数
fn validate_pipeline(config: &BridgeConfig) -> Result<(), ContractError> {
    if config.pipeline.drain_timeout_secs == 0 {
        return Err(ContractError::config_validation(
            "pipeline.drain_timeout_secs",
            "drain_timeout_secs must be > 0",
        ));
    }
    if config.pipeline.send_timeout_secs == 0 {
        return Err(ContractError::config_validation(
            "pipeline.send_timeout_secs",
            "send_timeout_secs must be > 0",
        ));
    }
    Ok(())
}
