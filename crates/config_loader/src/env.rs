//! 环境变量叠加
//!
//! 对每个已知配置键，读取 `<SECTION>_<KEY>` 形式的环境变量
//! (例如 `APRS_CALLSIGN`, `MQTT_PORT`)。
//! 仅在配置文件未设置该键时生效：文件中的值优先。

use serde_json::{Map, Number, Value};

/// 环境变量值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyKind {
    Text,
    Integer,
    Float,
}

/// 已知配置键 (section, key, kind)
const KNOWN_KEYS: &[(&str, &str, KeyKind)] = &[
    ("logging", "log_level", KeyKind::Text),
    ("logging", "log_format", KeyKind::Text),
    ("logging", "log_path", KeyKind::Text),
    ("aprs", "callsign", KeyKind::Text),
    ("aprs", "ssid", KeyKind::Integer),
    ("aprs", "password", KeyKind::Integer),
    ("aprs", "host", KeyKind::Text),
    ("aprs", "port", KeyKind::Integer),
    ("kiss", "path", KeyKind::Text),
    ("location", "latitude", KeyKind::Float),
    ("location", "longitude", KeyKind::Float),
    ("pipeline", "software_suffix", KeyKind::Text),
    ("pipeline", "drain_timeout_secs", KeyKind::Integer),
    ("pipeline", "send_timeout_secs", KeyKind::Integer),
    ("mqtt", "host", KeyKind::Text),
    ("mqtt", "port", KeyKind::Integer),
    ("mqtt", "username", KeyKind::Text),
    ("mqtt", "password", KeyKind::Text),
    ("mqtt", "client_id", KeyKind::Text),
    ("mqtt", "keep_alive_secs", KeyKind::Integer),
];

/// 环境变量来源
pub struct EnvOverlay {
    lookup: Box<dyn Fn(&str) -> Option<String>>,
}

impl EnvOverlay {
    /// 使用进程环境变量
    pub fn from_process() -> Self {
        Self::from_fn(|name| std::env::var(name).ok())
    }

    /// 使用自定义查找函数 (用于测试)
    pub fn from_fn(lookup: impl Fn(&str) -> Option<String> + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }

    /// 环境变量名
    pub fn variable_name(section: &str, key: &str) -> String {
        format!("{section}_{key}").to_uppercase()
    }

    /// 将环境变量叠加到文档上
    ///
    /// 无法按类型解析的值会原样保留为字符串，由反序列化阶段报告错误。
    pub fn apply(&self, document: &mut Value) {
        let Some(root) = document.as_object_mut() else {
            return;
        };

        for (section, key, kind) in KNOWN_KEYS {
            let Some(raw) = (self.lookup)(&Self::variable_name(section, key)) else {
                continue;
            };
            if raw.is_empty() {
                continue;
            }

            let table = root
                .entry(section.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            let Some(table) = table.as_object_mut() else {
                continue;
            };
            if !table.contains_key(*key) {
                table.insert(key.to_string(), typed_value(&raw, *kind));
            }
        }
    }
}

fn typed_value(raw: &str, kind: KeyKind) -> Value {
    let trimmed = raw.trim();
    match kind {
        KeyKind::Text => Value::String(raw.to_string()),
        KeyKind::Integer => trimmed
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        KeyKind::Float => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn overlay(vars: &[(&str, &str)]) -> EnvOverlay {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvOverlay::from_fn(move |name| vars.get(name).cloned())
    }

    #[test]
    fn fills_missing_keys_with_typed_values() {
        let mut doc = json!({ "mqtt": { "host": "file-host" } });
        overlay(&[
            ("MQTT_PORT", "1884"),
            ("LOCATION_LATITUDE", "40.5"),
            ("APRS_CALLSIGN", "N0CALL"),
            ("MQTT_PASSWORD", "1234"),
        ])
        .apply(&mut doc);

        assert_eq!(doc["mqtt"]["port"], json!(1884));
        assert_eq!(doc["location"]["latitude"], json!(40.5));
        assert_eq!(doc["aprs"]["callsign"], json!("N0CALL"));
        assert_eq!(doc["mqtt"]["password"], json!("1234"));
    }

    #[test]
    fn file_values_win() {
        let mut doc = json!({ "mqtt": { "host": "file-host" } });
        overlay(&[("MQTT_HOST", "env-host")]).apply(&mut doc);
        assert_eq!(doc["mqtt"]["host"], json!("file-host"));
    }

    #[test]
    fn unparsable_number_is_kept_as_text() {
        let mut doc = json!({});
        overlay(&[("MQTT_PORT", "eighteen")]).apply(&mut doc);
        assert_eq!(doc["mqtt"]["port"], json!("eighteen"));
    }

    #[test]
    fn variable_name_is_upper_snake() {
        assert_eq!(
            EnvOverlay::variable_name("location", "longitude"),
            "LOCATION_LONGITUDE"
        );
    }
}
