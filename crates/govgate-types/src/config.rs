//! Gateway configuration.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{GatewayError, Result, constants};

/// Server-held MAC secret. Never serialized, redacted in `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    /// Wrap raw key bytes.
    ///
    /// # Errors
    /// Returns [`GatewayError::Configuration`] if `bytes` is empty.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(GatewayError::Configuration(
                "signing secret must not be empty".to_string(),
            ));
        }
        Ok(Self(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(<{} bytes redacted>)", self.0.len())
    }
}

/// Directory layout and limits for one gateway instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Root of all on-disk state.
    pub data_dir: PathBuf,
    /// Where accepted uploads are stored.
    pub upload_dir: PathBuf,
    /// Where export artifacts are published.
    pub export_dir: PathBuf,
    /// Where the rail/audit log lives.
    pub log_dir: PathBuf,
    /// The JSON order store file.
    pub store_path: PathBuf,
    /// Upload size bound in bytes.
    pub max_upload_bytes: u64,
    /// MAC secret. Supplied at startup, never persisted.
    #[serde(skip)]
    pub secret: Option<SecretKey>,
}

impl GatewayConfig {
    /// Standard layout under `data_dir`, without a secret.
    #[must_use]
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            upload_dir: data_dir.join("uploads"),
            export_dir: data_dir.join("exports"),
            log_dir: data_dir.join("logs"),
            store_path: data_dir.join(constants::STORE_FILE),
            max_upload_bytes: constants::DEFAULT_MAX_UPLOAD_BYTES,
            secret: None,
            data_dir,
        }
    }

    /// Builder-style secret setter.
    #[must_use]
    pub fn secret(mut self, secret: SecretKey) -> Self {
        self.secret = Some(secret);
        self
    }

    /// Load from `GOVGATE_DATA_DIR` / `GOVGATE_SECRET`.
    ///
    /// # Errors
    /// Returns [`GatewayError::Configuration`] if the secret is missing or empty.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    ///
    /// An empty data dir falls back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = lookup(constants::ENV_DATA_DIR)
            .filter(|dir| !dir.is_empty())
            .unwrap_or_else(|| constants::DEFAULT_DATA_DIR.to_string());
        let secret = lookup(constants::ENV_SECRET).ok_or_else(|| {
            GatewayError::Configuration(format!("{} is not set", constants::ENV_SECRET))
        })?;
        Ok(Self::with_data_dir(data_dir).secret(SecretKey::new(secret.into_bytes())?))
    }

    /// The secret, or a configuration error if none was supplied.
    pub fn require_secret(&self) -> Result<&SecretKey> {
        self.secret.as_ref().ok_or_else(|| {
            GatewayError::Configuration("no signing secret configured".to_string())
        })
    }

    /// Create every directory the gateway writes into.
    pub fn ensure_dirs(&self) -> Result<()> {
        let store_dir = self.store_path.parent().unwrap_or(&self.data_dir);
        for dir in [
            self.upload_dir.as_path(),
            self.export_dir.as_path(),
            self.log_dir.as_path(),
            store_dir,
        ] {
            std::fs::create_dir_all(dir).map_err(|e| GatewayError::storage(dir, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_under_data_dir() {
        let cfg = GatewayConfig::with_data_dir("/srv/gg");
        assert_eq!(cfg.export_dir, PathBuf::from("/srv/gg/exports"));
        assert_eq!(cfg.upload_dir, PathBuf::from("/srv/gg/uploads"));
        assert_eq!(cfg.store_path, PathBuf::from("/srv/gg/tmp/session_store.json"));
        assert_eq!(cfg.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn missing_secret_is_configuration_error() {
        let cfg = GatewayConfig::with_data_dir("/srv/gg");
        assert!(matches!(
            cfg.require_secret(),
            Err(GatewayError::Configuration(_))
        ));
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    #[test]
    fn from_lookup_reads_both_variables() {
        let cfg = GatewayConfig::from_lookup(env(&[
            ("GOVGATE_DATA_DIR", "/srv/gg"),
            ("GOVGATE_SECRET", "demo-secret"),
        ]))
        .unwrap();
        assert_eq!(cfg.export_dir, PathBuf::from("/srv/gg/exports"));
        assert_eq!(cfg.require_secret().unwrap().as_bytes(), b"demo-secret");
    }

    #[test]
    fn from_lookup_defaults_data_dir() {
        let cfg = GatewayConfig::from_lookup(env(&[("GOVGATE_SECRET", "s")])).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from(constants::DEFAULT_DATA_DIR));

        let cfg = GatewayConfig::from_lookup(env(&[
            ("GOVGATE_DATA_DIR", ""),
            ("GOVGATE_SECRET", "s"),
        ]))
        .unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from(constants::DEFAULT_DATA_DIR));
    }

    #[test]
    fn from_lookup_requires_secret() {
        let err =
            GatewayConfig::from_lookup(env(&[("GOVGATE_DATA_DIR", "/srv/gg")])).unwrap_err();
        assert!(
            matches!(err, GatewayError::Configuration(ref m) if m.contains("GOVGATE_SECRET")),
            "Got: {err:?}"
        );

        let err = GatewayConfig::from_lookup(env(&[("GOVGATE_SECRET", "")])).unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)), "Got: {err:?}");
    }

    #[test]
    fn empty_secret_rejected() {
        assert!(SecretKey::new(Vec::new()).is_err());
    }

    #[test]
    fn secret_debug_is_redacted() {
        let key = SecretKey::new(b"demo-secret".to_vec()).unwrap();
        let dbg = format!("{key:?}");
        assert!(!dbg.contains("demo-secret"));
        assert!(dbg.contains("11 bytes"));
    }

    #[test]
    fn secret_is_not_serialized() {
        let cfg = GatewayConfig::with_data_dir("/srv/gg")
            .secret(SecretKey::new(b"demo-secret".to_vec()).unwrap());
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("demo-secret"));
        assert!(!json.contains("secret"));
    }
}
