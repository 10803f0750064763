//! The component entity: one directory of well-known files per inventory record.
//! 零件實體：每個零件對應工作區中的一個資料夾。

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::category::ComponentCategory;
use crate::component_image::ComponentImage;
use crate::error::{StoreError, StoreResult};
use crate::layout::WorkspacePaths;
use crate::manifest::{load_manifest, save_manifest, PropertyMap, SUB_CATEGORY_KEY};
use crate::util::{copy_dir_recursive, write_atomic};
use crate::workspace::Workspace;

/// An inventory record backed by `components/<name>/`.
/// 以 `components/<name>/` 資料夾保存的庫存零件。
#[derive(Debug, Clone)]
pub struct Component {
    paths: WorkspacePaths,
    path: Option<PathBuf>,
    name: Option<String>,
    quantity: u32,
    properties: PropertyMap,
    notes: Option<String>,
    image: ComponentImage,
    newly_created: bool,
    deleted: bool,
}

impl Component {
    /// Unnamed, unsaved component for "new component" flows.
    /// 建立尚未命名、尚未儲存的空白零件。
    pub fn empty(workspace: &Workspace) -> StoreResult<Self> {
        Ok(Self::blank(workspace.paths()?))
    }

    /// Loads an existing component directory.
    /// 從磁碟載入既有零件。
    pub fn load(workspace: &Workspace, name: &str) -> StoreResult<Self> {
        Self::load_from(workspace.paths()?, name)
    }

    /// New in-memory component under a name not used in the workspace yet.
    /// 以尚未使用的名稱建立新零件（僅存在於記憶體，需呼叫 save）。
    pub fn create(workspace: &Workspace, name: &str) -> StoreResult<Self> {
        let paths = workspace.paths()?;
        validate_name(name)?;
        if paths.component_dir(name).is_dir() {
            return Err(StoreError::ComponentExists(name.to_string()));
        }
        let mut component = Self::blank(paths);
        component.name = Some(name.to_string());
        Ok(component)
    }

    /// Loads `name` when it exists on disk, otherwise starts a new component.
    pub fn open(workspace: &Workspace, name: &str) -> StoreResult<Self> {
        if Self::exists(workspace, name) {
            Self::load(workspace, name)
        } else {
            Self::create(workspace, name)
        }
    }

    /// Whether a component directory named `name` exists in an open workspace.
    /// 檢查工作區中是否已有同名零件資料夾。
    pub fn exists(workspace: &Workspace, name: &str) -> bool {
        workspace
            .paths()
            .map(|paths| paths.component_dir(name).is_dir())
            .unwrap_or(false)
    }

    pub(crate) fn blank(paths: WorkspacePaths) -> Self {
        let image = ComponentImage::placeholder(paths.images_root.clone());
        Self {
            paths,
            path: None,
            name: None,
            quantity: 0,
            properties: PropertyMap::new(),
            notes: None,
            image,
            newly_created: true,
            deleted: false,
        }
    }

    pub(crate) fn load_from(paths: WorkspacePaths, name: &str) -> StoreResult<Self> {
        let dir = paths.component_dir(name);
        if !dir.is_dir() {
            return Err(StoreError::ComponentNotFound(name.to_string()));
        }
        let layout = &paths.layout;
        let properties = load_manifest(&dir.join(&layout.manifest_file))?;
        let image = ComponentImage::resolve(
            paths.images_root.clone(),
            &dir.join(&layout.image_file),
            &properties,
        );
        let quantity = read_quantity(&dir.join(&layout.quantity_file));
        let notes = read_notes(&dir.join(&layout.notes_file));

        Ok(Self {
            paths,
            path: Some(dir),
            name: Some(name.to_string()),
            quantity,
            properties,
            notes,
            image,
            newly_created: false,
            deleted: false,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Names an unnamed component. A name can only be set once; use [`Component::rename`].
    /// 設定名稱（僅能設定一次，之後請改用 rename）。
    pub fn set_name(&mut self, name: &str) -> StoreResult<()> {
        if let Some(existing) = &self.name {
            return Err(StoreError::NameAlreadySet(existing.clone()));
        }
        validate_name(name)?;
        self.name = Some(name.to_string());
        Ok(())
    }

    /// Renames the component, moving its directory when it has been saved.
    /// 重新命名；已儲存的零件會一併搬移資料夾。
    pub fn rename(&mut self, new_name: &str) -> StoreResult<()> {
        self.ensure_not_deleted()?;
        validate_name(new_name)?;
        if self.name.as_deref() == Some(new_name) {
            return Ok(());
        }
        if let Some(current) = self.path.clone() {
            let target = self.paths.component_dir(new_name);
            if target.exists() {
                return Err(StoreError::ComponentExists(new_name.to_string()));
            }
            fs::rename(&current, &target).map_err(|err| StoreError::io(&current, err))?;
            info!(from = %current.display(), to = %target.display(), "renamed component");
            self.path = Some(target);
        }
        self.name = Some(new_name.to_string());
        Ok(())
    }

    /// Component directory; `None` until a new component is saved.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    pub fn has_notes(&self) -> bool {
        self.notes.is_some()
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyMap {
        &mut self.properties
    }

    pub fn set_properties(&mut self, properties: PropertyMap) {
        self.properties = properties;
    }

    pub fn image(&self) -> &ComponentImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut ComponentImage {
        &mut self.image
    }

    /// Assigns an image file, importing it into the pool under this component's name.
    /// 指定圖片檔；若需匯入則以零件名稱命名。
    pub fn set_image_path(&mut self, path: Option<&Path>) {
        let hint = self.name.clone();
        self.image.set_path(path, hint.as_deref());
    }

    /// Re-runs image resolution against the current on-disk state.
    pub fn reload_image(&mut self) {
        self.image = match &self.path {
            Some(dir) => ComponentImage::resolve(
                self.paths.images_root.clone(),
                &dir.join(&self.paths.layout.image_file),
                &self.properties,
            ),
            None => ComponentImage::placeholder(self.paths.images_root.clone()),
        };
    }

    pub fn datasheet_path(&self) -> Option<PathBuf> {
        self.file_path(&self.paths.layout.datasheet_file)
    }

    /// Checked against the disk on every call.
    pub fn has_datasheet(&self) -> bool {
        self.datasheet_path().is_some_and(|path| path.is_file())
    }

    pub fn spice_model_path(&self) -> Option<PathBuf> {
        self.file_path(&self.paths.layout.spice_model_file)
    }

    pub fn has_spice_model(&self) -> bool {
        self.spice_model_path().is_some_and(|path| path.is_file())
    }

    /// Copies a local datasheet into the component directory.
    /// 將本機的規格書檔案複製到零件資料夾。
    pub fn attach_datasheet(&self, source: &Path) -> StoreResult<PathBuf> {
        let file = self.paths.layout.datasheet_file.clone();
        self.attach_file(source, &file)
    }

    /// Copies a local SPICE model into the component directory.
    pub fn attach_spice_model(&self, source: &Path) -> StoreResult<PathBuf> {
        let file = self.paths.layout.spice_model_file.clone();
        self.attach_file(source, &file)
    }

    pub fn category(&self) -> ComponentCategory {
        ComponentCategory::from_properties(&self.properties, false)
    }

    pub fn sub_category(&self) -> ComponentCategory {
        ComponentCategory::from_properties(&self.properties, true)
    }

    pub fn has_sub_category(&self) -> bool {
        self.properties.contains_key(SUB_CATEGORY_KEY)
    }

    pub fn is_newly_created(&self) -> bool {
        self.newly_created
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Writes quantity, notes, manifest and (for explicit images) the image declaration.
    /// 儲存數量、備註、屬性檔，以及使用者明確指定的圖片名稱。
    pub fn save(&mut self) -> StoreResult<()> {
        self.ensure_not_deleted()?;
        let name = self
            .name
            .clone()
            .ok_or_else(|| StoreError::InvalidName(String::new()))?;

        let existing = if self.newly_created {
            None
        } else {
            self.path.clone()
        };
        let dir = match existing {
            Some(dir) => dir,
            None => {
                let dir = self.paths.component_dir(&name);
                fs::create_dir(&dir).map_err(|err| StoreError::io(&dir, err))?;
                self.path = Some(dir.clone());
                self.newly_created = false;
                dir
            }
        };

        let layout = &self.paths.layout;
        write_file(
            &dir.join(&layout.quantity_file),
            self.quantity.to_string().as_bytes(),
        )?;
        if let Some(notes) = &self.notes {
            write_file(&dir.join(&layout.notes_file), notes.as_bytes())?;
        }
        save_manifest(&dir.join(&layout.manifest_file), &self.properties)?;
        if !self.image.is_using_defaults() {
            if let Some(image_name) = self.image.name() {
                write_file(&dir.join(&layout.image_file), image_name.as_bytes())?;
            }
        }

        info!(component = %name, path = %dir.display(), "saved component");
        Ok(())
    }

    /// Saves a copy under `new_name`; the original directory is left untouched.
    /// 另存新檔：先複製原資料夾到新名稱，再將此實體指向新資料夾並儲存。
    pub fn save_as(&mut self, new_name: &str) -> StoreResult<()> {
        self.ensure_not_deleted()?;
        if self.name.as_deref() == Some(new_name) {
            return self.save();
        }
        validate_name(new_name)?;
        let target = self.paths.component_dir(new_name);
        if target.exists() {
            return Err(StoreError::ComponentExists(new_name.to_string()));
        }

        if !self.newly_created {
            if let Some(current) = self.path.clone() {
                copy_dir_recursive(&current, &target)
                    .map_err(|err| StoreError::io(&target, err))?;
                debug!(from = %current.display(), to = %target.display(), "copied component");
                self.path = Some(target);
            }
        }
        self.name = Some(new_name.to_string());
        self.save()
    }

    /// Removes the component directory. The entity is marked deleted even on failure.
    /// 刪除零件資料夾；即使刪除失敗也會標記為已刪除。
    pub fn delete(&mut self) -> StoreResult<()> {
        self.deleted = true;
        let Some(dir) = &self.path else {
            return Ok(());
        };
        if let Err(err) = fs::remove_dir_all(dir) {
            warn!(path = %dir.display(), error = %err, "component directory only partially removed");
            return Err(StoreError::io(dir, err));
        }
        info!(path = %dir.display(), "deleted component");
        Ok(())
    }

    fn ensure_not_deleted(&self) -> StoreResult<()> {
        if self.deleted {
            return Err(StoreError::ComponentDeleted(
                self.name.clone().unwrap_or_default(),
            ));
        }
        Ok(())
    }

    fn file_path(&self, file_name: &str) -> Option<PathBuf> {
        self.path.as_ref().map(|dir| dir.join(file_name))
    }

    fn attach_file(&self, source: &Path, file_name: &str) -> StoreResult<PathBuf> {
        self.ensure_not_deleted()?;
        let dir = match (&self.path, self.newly_created) {
            (Some(dir), false) => dir,
            _ => {
                return Err(StoreError::ComponentNotSaved(
                    self.name.clone().unwrap_or_default(),
                ))
            }
        };
        let dest = dir.join(file_name);
        fs::copy(source, &dest).map_err(|err| StoreError::io(source, err))?;
        Ok(dest)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name.as_deref().unwrap_or("(unnamed)"))?;
        match &self.path {
            Some(path) => writeln!(f, "Path: {}", path.display())?,
            None => writeln!(f, "Path: (not saved)")?,
        }
        writeln!(f, "Newly Created: {}", self.newly_created)?;
        writeln!(f, "Quantity: {}", self.quantity)?;
        for (key, value) in self.properties.iter() {
            writeln!(f, "{key}: {value}")?;
        }
        write!(f, "Notes: {}", self.notes.as_deref().unwrap_or(""))
    }
}

fn validate_name(name: &str) -> StoreResult<()> {
    let valid = !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).components().count() == 1;
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

fn read_quantity(path: &Path) -> u32 {
    match fs::read_to_string(path) {
        Ok(text) => text.trim().parse().unwrap_or_else(|err| {
            debug!(path = %path.display(), error = %err, "unreadable quantity; using 0");
            0
        }),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "missing quantity; using 0");
            0
        }
    }
}

fn read_notes(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "no readable notes");
            None
        }
    }
}

fn write_file(path: &Path, data: &[u8]) -> StoreResult<()> {
    write_atomic(path, data).map_err(|err| StoreError::io(path, err))
}
