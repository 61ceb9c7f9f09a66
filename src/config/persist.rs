//! Settings persistence using toml_edit to preserve formatting and comments
//! of the rest of the config file.

use super::AppSettings;
use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use toml_edit::DocumentMut;

/// Update just the `[settings]` table of the config file, creating the file
/// if it does not exist yet.
pub fn save_settings(path: &Path, settings: &AppSettings) -> Result<()> {
    let content = if path.exists() {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?
    } else {
        String::new()
    };

    let mut doc: DocumentMut = content
        .parse()
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    let settings_toml =
        toml::to_string(&SettingsWrapper { settings }).with_context(|| "Failed to serialize settings")?;
    let settings_doc: DocumentMut = settings_toml
        .parse()
        .with_context(|| "Failed to parse serialized settings")?;

    if let Some(item) = settings_doc.get("settings") {
        doc["settings"] = item.clone();
    }

    std::fs::write(path, doc.to_string())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}

#[derive(serde::Serialize)]
struct SettingsWrapper<'a> {
    settings: &'a AppSettings,
}

/// In-memory view of [`AppSettings`] backed by the config file.
///
/// Without a path the store is memory-only, which is what tests and
/// config-less runs use.
pub struct SettingsStore {
    current: RwLock<AppSettings>,
    path: Option<PathBuf>,
}

impl SettingsStore {
    pub fn new(initial: AppSettings, path: Option<PathBuf>) -> Self {
        Self {
            current: RwLock::new(initial),
            path,
        }
    }

    pub fn load(&self) -> AppSettings {
        self.current.read().clone()
    }

    /// Persist first, then swap the in-memory copy, so a failed write leaves
    /// both unchanged. The write lock is held across both steps so
    /// concurrent saves land in the file and in memory in the same order.
    pub fn save(&self, settings: AppSettings) -> Result<AppSettings> {
        let mut current = self.current.write();
        if let Some(ref path) = self.path {
            save_settings(path, &settings)?;
        }
        *current = settings.clone();
        drop(current);
        tracing::info!(
            download_dir = %settings.download_dir,
            ffmpeg_preset = %settings.ffmpeg_preset,
            "Settings updated"
        );
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_preserves_other_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mediahub.toml");
        std::fs::write(
            &path,
            "# dispatcher settings\n[server]\nport = 9000\n\n[settings]\ndownload_dir = \"/old\"\n",
        )
        .unwrap();

        let settings = AppSettings {
            download_dir: "/new".into(),
            ffmpeg_preset: "slow".into(),
        };
        save_settings(&path, &settings).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("# dispatcher settings"));
        assert!(content.contains("port = 9000"));

        let config: crate::config::Config = toml::from_str(&content).unwrap();
        assert_eq!(config.settings, settings);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn save_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.toml");

        save_settings(&path, &AppSettings::default()).unwrap();

        let config: crate::config::Config =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.settings, AppSettings::default());
    }

    #[test]
    fn store_load_reflects_save() {
        let store = SettingsStore::new(AppSettings::default(), None);
        assert_eq!(store.load().ffmpeg_preset, "fast");

        store
            .save(AppSettings {
                download_dir: "/media".into(),
                ffmpeg_preset: "veryslow".into(),
            })
            .unwrap();
        assert_eq!(store.load().download_dir, "/media");
        assert_eq!(store.load().ffmpeg_preset, "veryslow");
    }

    #[test]
    fn failed_save_keeps_previous_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("mediahub.toml");
        let store = SettingsStore::new(AppSettings::default(), Some(path));

        let result = store.save(AppSettings {
            download_dir: "/elsewhere".into(),
            ffmpeg_preset: "slow".into(),
        });
        assert!(result.is_err());
        assert_eq!(store.load(), AppSettings::default());
    }

    #[test]
    fn concurrent_saves_keep_file_and_memory_in_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mediahub.toml");
        let store = std::sync::Arc::new(SettingsStore::new(
            AppSettings::default(),
            Some(path.clone()),
        ));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for round in 0..10 {
                        store
                            .save(AppSettings {
                                download_dir: format!("/media/{i}"),
                                ffmpeg_preset: format!("preset-{i}-{round}"),
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let config: crate::config::Config =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.settings, store.load());
    }
}
