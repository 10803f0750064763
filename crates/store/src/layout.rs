use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Names of every directory and file that make up a workspace on disk.  
/// 工作區在磁碟上的目錄與檔案名稱配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceLayout {
    pub components_dir: String,
    pub assets_dir: String,
    pub images_dir: String,
    pub manifest_file: String,
    pub quantity_file: String,
    pub image_file: String,
    pub notes_file: String,
    pub datasheet_file: String,
    pub spice_model_file: String,
}

impl Default for WorkspaceLayout {
    fn default() -> Self {
        Self {
            components_dir: "components".into(),
            assets_dir: "assets".into(),
            images_dir: "images".into(),
            manifest_file: "MANIFEST".into(),
            quantity_file: "QUANTITY".into(),
            image_file: "IMAGE".into(),
            notes_file: "notes.txt".into(),
            datasheet_file: "datasheet.pdf".into(),
            spice_model_file: "model.mod".into(),
        }
    }
}

impl WorkspaceLayout {
    /// Directory holding one sub-directory per component.  
    /// 存放各零件資料夾的目錄。
    pub fn components_root(&self, root: &Path) -> PathBuf {
        root.join(&self.components_dir)
    }

    /// Shared image pool of the workspace.  
    /// 工作區共用的圖片目錄。
    pub fn images_root(&self, root: &Path) -> PathBuf {
        root.join(&self.assets_dir).join(&self.images_dir)
    }
}

/// Resolved locations a component needs, captured by value when it is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorkspacePaths {
    pub components_root: PathBuf,
    pub images_root: PathBuf,
    pub layout: WorkspaceLayout,
}

impl WorkspacePaths {
    pub fn new(root: &Path, layout: &WorkspaceLayout) -> Self {
        Self {
            components_root: layout.components_root(root),
            images_root: layout.images_root(root),
            layout: layout.clone(),
        }
    }

    pub fn component_dir(&self, name: &str) -> PathBuf {
        self.components_root.join(name)
    }
}
