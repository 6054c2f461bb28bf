use serde_json::{json, Map, Value};

use crate::error::{DeskError, DeskResult};
use crate::storage::{KeyValueStore, KEY_UI_PREFERENCES};

const MAX_SYSTEM_NAME: usize = 80;
const MAX_LOGO_BYTES: usize = 512 * 1024;

pub fn default_preferences() -> Value {
    json!({
        "theme": "system",
        "primaryColor": "#1e40af",
        "systemName": "SchoolDesk",
        "logo": null
    })
}

fn as_object_mut(value: &mut Value) -> Result<&mut Map<String, Value>, String> {
    value
        .as_object_mut()
        .ok_or_else(|| "internal preferences object must be a JSON object".to_string())
}

fn parse_string_max(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.chars().count() > max_len {
        return Err(format!("{} length must be <= {}", key, max_len));
    }
    Ok(s.to_string())
}

fn parse_color(v: &Value, key: &str) -> Result<String, String> {
    let s = parse_string_max(v, key, 7)?.to_ascii_lowercase();
    let hex = s.strip_prefix('#').unwrap_or("");
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("{} must look like #rrggbb", key));
    }
    Ok(s)
}

fn merge_patch(current: &mut Value, patch: &Map<String, Value>) -> Result<(), String> {
    let obj = as_object_mut(current)?;
    for (k, v) in patch {
        match k.as_str() {
            "theme" => {
                let s = parse_string_max(v, k, 16)?.to_ascii_lowercase();
                if s != "light" && s != "dark" && s != "system" {
                    return Err("theme must be one of: light, dark, system".into());
                }
                obj.insert(k.clone(), Value::String(s));
            }
            "primaryColor" => {
                obj.insert(k.clone(), Value::String(parse_color(v, k)?));
            }
            "systemName" => {
                let s = parse_string_max(v, k, MAX_SYSTEM_NAME)?;
                if s.is_empty() {
                    return Err("systemName must not be empty".into());
                }
                obj.insert(k.clone(), Value::String(s));
            }
            "logo" => {
                if v.is_null() {
                    obj.insert(k.clone(), Value::Null);
                    continue;
                }
                let s = v.as_str().ok_or("logo must be a data URL or null")?;
                if !s.starts_with("data:image/") {
                    return Err("logo must be a data:image/ URL".into());
                }
                if s.len() > MAX_LOGO_BYTES {
                    return Err(format!("logo must be <= {} bytes", MAX_LOGO_BYTES));
                }
                obj.insert(k.clone(), Value::String(s.to_string()));
            }
            _ => return Err(format!("unknown preference: {}", k)),
        }
    }
    Ok(())
}

/// Defaults overlaid with whatever stored fields still validate.
pub fn load_preferences(store: &dyn KeyValueStore) -> DeskResult<Value> {
    let mut current = default_preferences();
    let saved = store
        .get(KEY_UI_PREFERENCES)?
        .and_then(|text| serde_json::from_str::<Value>(&text).ok());
    if let Some(Value::Object(saved)) = saved {
        // Apply field by field so one bad value keeps the rest.
        for (k, v) in saved {
            let mut single = Map::new();
            single.insert(k, v);
            let _ = merge_patch(&mut current, &single);
        }
    }
    Ok(current)
}

pub fn update_preferences(store: &dyn KeyValueStore, patch: &Value) -> DeskResult<Value> {
    let Some(patch) = patch.as_object() else {
        return Err(DeskError::invalid_input("patch", "must be an object"));
    };
    let mut current = load_preferences(store)?;
    merge_patch(&mut current, patch).map_err(|reason| DeskError::invalid_input("patch", reason))?;
    store.set(KEY_UI_PREFERENCES, &serde_json::to_string(&current).map_err(anyhow::Error::from)?)?;
    Ok(current)
}
