//! Optional JSON configuration for the command-line front end.
//! 命令列工具的選用 JSON 設定檔。

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use partcat_store::WorkspaceLayout;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Workspace used when `--workspace` is not given.
    pub workspace: Option<PathBuf>,
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub log_filter: Option<String>,
    pub layout: WorkspaceLayout,
}

impl CliConfig {
    /// Reads `path`; a missing file yields the defaults.
    /// 讀取設定檔；檔案不存在時使用預設值。
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("read config '{}'", path.display()))
            }
        };
        serde_json::from_str(&text).with_context(|| format!("parse config '{}'", path.display()))
    }
}
