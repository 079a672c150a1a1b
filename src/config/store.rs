use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::{ConfigFormat, ConfigValue, PowerModeOptions};
use crate::error::{PowerModeError, PowerModeResult};

/// Options together with the version they were published under
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    pub version: u64,
    pub options: Arc<PowerModeOptions>,
}

impl ConfigSnapshot {
    /// Re-read from the store only if a newer version was published.
    /// Returns true when the snapshot changed.
    pub fn refresh(&mut self, store: &ConfigStore) -> bool {
        if !self.is_stale(store) {
            return false;
        }
        *self = store.snapshot();
        true
    }

    pub fn is_stale(&self, store: &ConfigStore) -> bool {
        self.version != store.version()
    }
}

impl std::ops::Deref for ConfigSnapshot {
    type Target = PowerModeOptions;

    fn deref(&self) -> &PowerModeOptions {
        &self.options
    }
}

/// Live configuration shared by every component.
///
/// Readers clone an `Arc` of the current options; writers build a new copy,
/// validate it and publish it together with a bumped version. Readers never
/// observe a partially applied write.
pub struct ConfigStore {
    /// Current options and the version they were published under
    current: RwLock<ConfigSnapshot>,

    /// Mirror of the published version for cheap staleness checks
    version: AtomicU64,

    /// Serializes writers so read-modify-write cycles never lose updates
    write_lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(options: PowerModeOptions) -> PowerModeResult<Self> {
        options.validate()?;
        Ok(Self {
            current: RwLock::new(ConfigSnapshot {
                version: 0,
                options: Arc::new(options),
            }),
            version: AtomicU64::new(0),
            write_lock: Mutex::new(()),
        })
    }

    /// Load options from a JSON or TOML file
    pub fn from_file(path: impl AsRef<Path>) -> PowerModeResult<Self> {
        Self::new(read_options(path.as_ref())?)
    }

    /// Current published version; bumped on every mutation
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        self.current.read().clone()
    }

    /// Shorthand for the current options
    pub fn options(&self) -> Arc<PowerModeOptions> {
        Arc::clone(&self.current.read().options)
    }

    /// Apply `f` to a copy of the current options and publish it if it validates
    pub fn update(&self, f: impl FnOnce(&mut PowerModeOptions)) -> PowerModeResult<u64> {
        let _writer = self.write_lock.lock();
        let mut next = (*self.options()).clone();
        f(&mut next);
        next.validate()?;
        Ok(self.publish(next))
    }

    /// Named write used by settings surfaces
    pub fn set_option(&self, name: &str, value: impl Into<ConfigValue>) -> PowerModeResult<u64> {
        let value = value.into();
        let _writer = self.write_lock.lock();
        let mut next = (*self.options()).clone();
        next.set(name, value)
            .and_then(|_| next.validate())
            .map_err(|e| {
                log::warn!("[ConfigStore] Rejected write to '{}': {}", name, e);
                e
            })?;
        Ok(self.publish(next))
    }

    pub fn get_option(&self, name: &str) -> PowerModeResult<ConfigValue> {
        self.options().get(name)
    }

    /// Replace every option with the contents of a JSON or TOML file
    pub fn load_file(&self, path: impl AsRef<Path>) -> PowerModeResult<u64> {
        let path = path.as_ref();
        let next = read_options(path)?;
        next.validate()?;

        let _writer = self.write_lock.lock();
        let version = self.publish(next);
        log::info!("[ConfigStore] Loaded {} (version {})", path.display(), version);
        Ok(version)
    }

    fn publish(&self, options: PowerModeOptions) -> u64 {
        let mut current = self.current.write();
        let version = current.version + 1;
        *current = ConfigSnapshot {
            version,
            options: Arc::new(options),
        };
        self.version.store(version, Ordering::Release);
        log::debug!("[ConfigStore] Published options version {}", version);
        version
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self {
            current: RwLock::new(ConfigSnapshot {
                version: 0,
                options: Arc::new(PowerModeOptions::default()),
            }),
            version: AtomicU64::new(0),
            write_lock: Mutex::new(()),
        }
    }
}

fn read_options(path: &Path) -> PowerModeResult<PowerModeOptions> {
    let format = ConfigFormat::from_path(path)
        .ok_or_else(|| PowerModeError::UnknownConfigFormat(path.to_path_buf()))?;
    let raw = std::fs::read_to_string(path)?;

    let parse_error = |error: String| PowerModeError::ConfigParse {
        format: format.name(),
        error,
    };
    match format {
        ConfigFormat::Json => serde_json::from_str(&raw).map_err(|e| parse_error(e.to_string())),
        ConfigFormat::Toml => toml::from_str(&raw).map_err(|e| parse_error(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_every_mutation_bumps_version() {
        let store = ConfigStore::default();
        assert_eq!(store.version(), 0);

        store.set_option("gravity", 0.5).unwrap();
        assert_eq!(store.version(), 1);

        store.update(|o| o.particles_enabled = false).unwrap();
        assert_eq!(store.version(), 2);
        assert!(!store.options().particles_enabled);
    }

    #[test]
    fn test_rejected_write_keeps_version() {
        let store = ConfigStore::default();

        assert!(store.set_option("alpha_remove_amount", -1.0).is_err());
        assert!(store.update(|o| o.start_alpha = 0.0).is_err());
        assert!(store.update(|o| o.alpha_remove_amount = 1e-20).is_err());
        assert!(store.set_option("particles_per_press", i64::from(u32::MAX)).is_err());
        assert_eq!(store.version(), 0);
        assert_eq!(*store.options(), PowerModeOptions::default());
    }

    #[test]
    fn test_snapshot_refresh_only_when_stale() {
        let store = ConfigStore::default();
        let mut snapshot = store.snapshot();

        assert!(!snapshot.refresh(&store));

        store.set_option("max_up_velocity", 4.0).unwrap();
        assert!(snapshot.is_stale(&store));
        assert!(snapshot.refresh(&store));
        assert_eq!(snapshot.max_up_velocity, 4.0);
        assert_eq!(snapshot.version, 1);
    }

    #[test]
    fn test_old_snapshots_are_untouched_by_writes() {
        let store = ConfigStore::default();
        let before = store.snapshot();

        store.set_option("particles_per_press", 3i64).unwrap();

        assert_eq!(before.particles_per_press, 10);
        assert_eq!(store.options().particles_per_press, 3);
    }

    #[test]
    fn test_load_toml_and_json() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory for config test");
        let toml_path = temp_dir.path().join("power.toml");
        fs::write(&toml_path, "combo_threshold = 4\nshake_enabled = false\n").unwrap();
        let json_path = temp_dir.path().join("power.json");
        fs::write(&json_path, r#"{ "random_color": true, "frame_delay_ms": 20 }"#).unwrap();

        let store = ConfigStore::from_file(&toml_path).unwrap();
        assert_eq!(store.options().combo_threshold, 4);
        assert!(!store.options().shake_enabled);

        let version = store.load_file(&json_path).unwrap();
        assert_eq!(version, 1);
        assert!(store.options().random_color);
        assert_eq!(store.options().frame_delay_ms, 20);
        // Whole-file replace: fields absent from the JSON return to defaults
        assert_eq!(store.options().combo_threshold, 0);
    }

    #[test]
    fn test_load_errors() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory for config test");
        let store = ConfigStore::default();

        let ini = temp_dir.path().join("power.ini");
        fs::write(&ini, "gravity=1").unwrap();
        assert!(matches!(store.load_file(&ini), Err(PowerModeError::UnknownConfigFormat(_))));

        let broken = temp_dir.path().join("power.toml");
        fs::write(&broken, "gravity = [").unwrap();
        assert!(matches!(store.load_file(&broken), Err(PowerModeError::ConfigParse { .. })));

        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(store.load_file(&missing), Err(PowerModeError::ConfigIo(_))));

        assert_eq!(store.version(), 0);
    }
}
