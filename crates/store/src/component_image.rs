//! Image resolution against the workspace's shared image pool.
//! 零件圖片解析：於工作區共用圖片目錄中依名稱尋找，或匯入外部圖片。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::manifest::{PropertyMap, PACKAGE_KEY};
use crate::util::{extension_with_dot, strip_extension};

/// The image attached to a component, or the placeholder when none resolves.
/// 零件的圖片；無法解析時使用預設占位圖。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentImage {
    images_root: PathBuf,
    path: Option<PathBuf>,
    name: Option<String>,
    using_default: bool,
}

impl ComponentImage {
    /// No image; consumers render a placeholder.
    pub fn placeholder(images_root: impl Into<PathBuf>) -> Self {
        Self {
            images_root: images_root.into(),
            path: None,
            name: None,
            using_default: true,
        }
    }

    /// Resolves a component's image: explicit declaration first, then its package.
    /// Never fails; any lookup error yields the placeholder.
    /// 解析零件圖片：先看 IMAGE 宣告，其次依封裝名稱；任何錯誤都退回占位圖。
    pub fn resolve(
        images_root: impl Into<PathBuf>,
        declaration: &Path,
        properties: &PropertyMap,
    ) -> Self {
        let images_root = images_root.into();
        let attempt = if declaration.exists() {
            fs::read_to_string(declaration).and_then(|text| {
                let name = text.trim().to_string();
                Ok(find_by_name(&images_root, &name)?.map(|path| (path, name, false)))
            })
        } else if let Some(package) = properties.get(PACKAGE_KEY) {
            find_by_name(&images_root, package)
                .map(|found| found.map(|path| (path, package.to_string(), true)))
        } else {
            Ok(None)
        };

        match attempt {
            Ok(Some((path, name, using_default))) => {
                debug!(path = %path.display(), using_default, "resolved component image");
                Self {
                    images_root,
                    path: Some(path),
                    name: Some(name),
                    using_default,
                }
            }
            Ok(None) => Self::placeholder(images_root),
            Err(err) => {
                debug!(error = %err, "image lookup failed; using placeholder");
                Self::placeholder(images_root)
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn images_root(&self) -> &Path {
        &self.images_root
    }

    /// `false` only for an image the user explicitly chose.
    /// 僅在使用者明確指定圖片時為 `false`。
    pub fn is_using_defaults(&self) -> bool {
        self.using_default
    }

    /// Points the image at `path`, importing it into the pool when it lives elsewhere.
    /// A failed import falls back to the placeholder.
    /// 設定圖片路徑；若位於圖片目錄之外則複製匯入，失敗時退回占位圖。
    pub fn set_path(&mut self, path: Option<&Path>, name_hint: Option<&str>) {
        let resolved = match path {
            Some(source) if !self.contains(source) => {
                match self.import(source, name_hint) {
                    Ok(dest) => Some(dest),
                    Err(err) => {
                        warn!(
                            source = %source.display(),
                            error = %err,
                            "failed to import image into workspace"
                        );
                        None
                    }
                }
            }
            Some(inside) => Some(inside.to_path_buf()),
            None => None,
        };

        self.name = resolved
            .as_deref()
            .and_then(|path| path.file_name())
            .and_then(|name| name.to_str())
            .map(|name| strip_extension(name).to_string());
        self.using_default = resolved.is_none();
        self.path = resolved;
    }

    /// Selects an image already in the pool by name.
    /// 依名稱選用圖片目錄中既有的圖片。
    pub fn set_name(&mut self, name: &str) -> StoreResult<()> {
        let found = find_by_name(&self.images_root, name)
            .map_err(|err| StoreError::io(&self.images_root, err))?;
        match found {
            Some(path) => {
                self.path = Some(path);
                self.name = Some(name.to_string());
                self.using_default = false;
                Ok(())
            }
            None => Err(StoreError::ImageNotFound(name.to_string())),
        }
    }

    /// Raw bytes of the image file, `None` for the placeholder.
    pub fn read_bytes(&self) -> StoreResult<Option<Vec<u8>>> {
        match &self.path {
            Some(path) => fs::read(path)
                .map(Some)
                .map_err(|err| StoreError::io(path, err)),
            None => Ok(None),
        }
    }

    pub fn decode(&self) -> StoreResult<Option<DynamicImage>> {
        match &self.path {
            Some(path) => image::open(path)
                .map(Some)
                .map_err(|source| StoreError::ImageDecode {
                    path: path.clone(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Decoded image resized to fit within `bounds` (width, height).
    /// 將圖片縮放至指定範圍內，可選擇維持長寬比。
    pub fn thumbnail(
        &self,
        bounds: (u32, u32),
        maintain_aspect: bool,
    ) -> StoreResult<Option<DynamicImage>> {
        let Some(image) = self.decode()? else {
            return Ok(None);
        };
        let (width, height) = if maintain_aspect {
            scaled_dimensions(image.dimensions(), bounds)
        } else {
            bounds
        };
        Ok(Some(image.resize_exact(
            width.max(1),
            height.max(1),
            FilterType::Triangle,
        )))
    }

    fn import(&self, source: &Path, name_hint: Option<&str>) -> io::Result<PathBuf> {
        let stem = match name_hint {
            Some(hint) => hint.to_string(),
            None => source
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| strip_extension(name).to_string())
                .ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "image path has no file name")
                })?,
        };
        let dest = self
            .images_root
            .join(format!("{stem}{}", extension_with_dot(source)));
        fs::create_dir_all(&self.images_root)?;
        if same_file(source, &dest) {
            return Ok(dest);
        }
        fs::copy(source, &dest)?;
        let metadata = fs::metadata(source)?;
        filetime::set_file_times(
            &dest,
            FileTime::from_last_access_time(&metadata),
            FileTime::from_last_modification_time(&metadata),
        )?;
        Ok(dest)
    }

    /// Whether `path` lies inside the image pool, comparing canonical paths when both resolve.
    fn contains(&self, path: &Path) -> bool {
        match (fs::canonicalize(path), fs::canonicalize(&self.images_root)) {
            (Ok(path), Ok(root)) => path.starts_with(root),
            _ => path.starts_with(&self.images_root),
        }
    }
}

fn same_file(lhs: &Path, rhs: &Path) -> bool {
    match (fs::canonicalize(lhs), fs::canonicalize(rhs)) {
        (Ok(lhs), Ok(rhs)) => lhs == rhs,
        _ => false,
    }
}

/// First file in `images_root` whose name without extension equals `name`.
/// 在圖片目錄中尋找去除副檔名後與名稱相同的第一個檔案。
pub fn find_by_name(images_root: &Path, name: &str) -> io::Result<Option<PathBuf>> {
    if name.is_empty() {
        return Ok(None);
    }
    for entry in fs::read_dir(images_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        if file_name
            .to_str()
            .is_some_and(|file_name| strip_extension(file_name) == name)
        {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}

/// Fits `original` inside `bounds` keeping its aspect ratio. Never enlarges.
/// 在不放大的前提下，依原始長寬比計算縮放後尺寸。
pub fn scaled_dimensions(original: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (original_width, original_height) = (u64::from(original.0), u64::from(original.1));
    let (bound_width, bound_height) = (u64::from(bounds.0), u64::from(bounds.1));
    let mut width = original_width;
    let mut height = original_height;

    if original_width > bound_width {
        width = bound_width;
        height = width * original_height / original_width;
    }
    if height > bound_height {
        height = bound_height;
        width = height * original_width / original_height;
    }

    (width as u32, height as u32)
}
