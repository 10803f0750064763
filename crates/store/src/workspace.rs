//! Workspace: the root directory plus the components scanned from it.
//! 工作區：根目錄與從中掃描出的零件集合。

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::category::{self, ComponentCategory};
use crate::component::Component;
use crate::error::{StoreError, StoreResult};
use crate::layout::{WorkspaceLayout, WorkspacePaths};
use crate::tree::ComponentTree;

/// An opened (or closed) PartCat workspace.
/// PartCat 工作區；開啟後持有掃描到的零件。
#[derive(Debug, Default)]
pub struct Workspace {
    root: Option<PathBuf>,
    layout: WorkspaceLayout,
    components: Vec<Component>,
    opened: bool,
}

impl Workspace {
    /// A closed workspace with the default layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the workspace rooted at `path` and scans its components.
    /// 開啟指定路徑的工作區並掃描零件。
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_layout(path, WorkspaceLayout::default())
    }

    pub fn open_with_layout(path: impl AsRef<Path>, layout: WorkspaceLayout) -> StoreResult<Self> {
        let mut workspace = Self {
            layout,
            ..Self::default()
        };
        workspace.open_path(path)?;
        Ok(workspace)
    }

    /// Points this instance at `path` and rescans. Leaves the workspace closed on failure.
    /// 切換到指定路徑並重新掃描；失敗時維持關閉狀態。
    pub fn open_path(&mut self, path: impl AsRef<Path>) -> StoreResult<()> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(StoreError::WorkspaceNotFound(path.to_path_buf()));
        }
        self.root = Some(path.to_path_buf());
        self.opened = true;
        if let Err(err) = self.populate_components() {
            self.close();
            return Err(err);
        }
        info!(
            root = %path.display(),
            components = self.components.len(),
            "opened workspace"
        );
        Ok(())
    }

    /// Provisions the directory skeleton at `root` and opens it.
    /// 在指定位置建立工作區目錄結構並開啟。
    pub fn create_new(root: impl AsRef<Path>) -> StoreResult<Self> {
        Self::create_new_with_layout(root, WorkspaceLayout::default())
    }

    pub fn create_new_with_layout(
        root: impl AsRef<Path>,
        layout: WorkspaceLayout,
    ) -> StoreResult<Self> {
        let root = root.as_ref();
        for dir in [layout.components_root(root), layout.images_root(root)] {
            fs::create_dir_all(&dir).map_err(|err| StoreError::io(&dir, err))?;
        }
        info!(root = %root.display(), "created workspace");
        Self::open_with_layout(root, layout)
    }

    /// Closes the workspace, dropping every loaded component.
    pub fn close(&mut self) {
        if let Some(root) = self.root.take() {
            info!(root = %root.display(), "closed workspace");
        }
        self.opened = false;
        self.components.clear();
    }

    /// Closes and reopens the same root, picking up external changes.
    /// 重新整理：關閉後重新開啟同一個根目錄。
    pub fn reopen(&mut self) -> StoreResult<()> {
        let root = self.root.clone().ok_or(StoreError::WorkspaceNotOpen)?;
        self.close();
        self.open_path(root)
    }

    /// Rescans `components/`, replacing the in-memory collection. Folders that fail
    /// to load are skipped with a warning.
    /// 重新掃描零件目錄；載入失敗的資料夾會記錄警告後略過。
    pub fn populate_components(&mut self) -> StoreResult<()> {
        let paths = self.paths()?;
        self.components.clear();

        let entries = fs::read_dir(&paths.components_root)
            .map_err(|err| StoreError::io(&paths.components_root, err))?;
        for entry in entries {
            let entry = entry.map_err(|err| StoreError::io(&paths.components_root, err))?;
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                warn!(path = %dir.display(), "skipping component folder with a non UTF-8 name");
                continue;
            };
            match Component::load_from(paths.clone(), &name) {
                Ok(component) => self.components.push(component),
                Err(err) => {
                    warn!(component = %name, error = %err, "skipping unreadable component")
                }
            }
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    pub fn components_dir(&self) -> Option<PathBuf> {
        self.root
            .as_deref()
            .map(|root| self.layout.components_root(root))
    }

    pub fn images_dir(&self) -> Option<PathBuf> {
        self.root.as_deref().map(|root| self.layout.images_root(root))
    }

    pub(crate) fn paths(&self) -> StoreResult<WorkspacePaths> {
        match (&self.root, self.opened) {
            (Some(root), true) => Ok(WorkspacePaths::new(root, &self.layout)),
            _ => Err(StoreError::WorkspaceNotOpen),
        }
    }

    /// Whether a component folder named `name` exists on disk.
    pub fn exists(&self, name: &str) -> bool {
        Component::exists(self, name)
    }

    /// Loaded components in directory-listing order. Deleted components are skipped.
    /// 依目錄列舉順序回傳已載入且未刪除的零件。
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components
            .iter()
            .filter(|component| !component.is_deleted())
    }

    pub fn component(&self, name: &str) -> StoreResult<&Component> {
        self.components()
            .find(|component| component.name() == Some(name))
            .ok_or_else(|| StoreError::ComponentNotFound(name.to_string()))
    }

    pub fn component_mut(&mut self, name: &str) -> StoreResult<&mut Component> {
        self.components
            .iter_mut()
            .find(|component| !component.is_deleted() && component.name() == Some(name))
            .ok_or_else(|| StoreError::ComponentNotFound(name.to_string()))
    }

    pub fn components_by_category(&self, category: &ComponentCategory) -> Vec<&Component> {
        category::components_in_category(&self.components, category)
    }

    /// Categories in use, each populated with its sub-categories.
    /// 取得使用中的分類（含子分類）。
    pub fn component_categories(&self) -> Vec<ComponentCategory> {
        category::build_category_tree(&self.components)
    }

    /// Presentation tree, optionally filtered by component name.
    pub fn component_tree(&self, filter: &str) -> ComponentTree {
        ComponentTree::build(&self.components, filter)
    }
}
