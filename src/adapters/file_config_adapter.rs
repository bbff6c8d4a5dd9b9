//! INI file configuration adapter.

use crate::domain::error::{BenchError, Result};
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| BenchError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| BenchError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| strip_inline_comment(&v).to_string())
            .filter(|v| !v.is_empty())
    }

    fn has_section(&self, section: &str) -> bool {
        self.config
            .sections()
            .iter()
            .any(|s| s.eq_ignore_ascii_case(section))
    }
}

/// `model = dca ; buy_once | dca` reads as `dca`.
fn strip_inline_comment(value: &str) -> &str {
    value
        .split([';', '#'])
        .next()
        .unwrap_or_default()
        .trim()
}
