use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::errors::ControlError;

const TMP_SUFFIX: &str = "tmp";

/// Operator configuration for the credit control tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sender address stamped on outgoing reminder emails.
    pub sender_email: String,
    /// Whether this installation may create and generate runs. Stands in
    /// for the host platform's credit control manager group.
    #[serde(default)]
    pub manager: bool,
    /// Book the operator worked on last; used as the default when a
    /// command names none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_opened_book: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sender_email: "credit-control@example.com".into(),
            manager: false,
            last_opened_book: None,
        }
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn with_base_dir(base: impl Into<PathBuf>) -> Result<Self, ControlError> {
        let base = base.into();
        ensure_dir(&base)?;
        Ok(Self {
            path: base.join("config.json"),
        })
    }

    pub fn load(&self) -> Result<Config, ControlError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ControlError> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        let mut file = File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn ensure_dir(path: &Path) -> Result<(), ControlError> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}
