use uuid::Uuid;

use crate::config;

/// Stable per-device identifier used as the event owner id: read from disk
/// when present, otherwise generated once and persisted best-effort.
pub fn device_id() -> String {
    if let Some(id) = stored_id() {
        return id;
    }
    let id = Uuid::new_v4().to_string();
    store_id(&id);
    id
}

fn stored_id() -> Option<String> {
    let path = config::config_dir()?.join("device_id");
    let id = std::fs::read_to_string(path).ok()?;
    let id = id.trim().to_string();
    (!id.is_empty()).then_some(id)
}

fn store_id(id: &str) {
    let Some(dir) = config::config_dir() else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_ok() {
        let _ = std::fs::write(dir.join("device_id"), id);
    }
}
