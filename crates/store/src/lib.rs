//! Filesystem-backed component repository for PartCat inventories.
//! PartCat 零件庫存的檔案系統儲存層：工作區掃描、零件實體、屬性檔與圖片解析。

mod util;

pub mod category;
pub mod component;
pub mod component_image;
pub mod error;
pub mod layout;
pub mod manifest;
pub mod tree;
pub mod workspace;

pub use category::{sort_categories, sort_components, ComponentCategory, UNCATEGORIZED};
pub use component::Component;
pub use component_image::{scaled_dimensions, ComponentImage};
pub use error::{StoreError, StoreResult};
pub use layout::WorkspaceLayout;
pub use manifest::{
    load_manifest, parse, save_manifest, serialize, PropertyMap, CATEGORY_KEY, PACKAGE_KEY,
    SUB_CATEGORY_KEY, VALUE_KEY,
};
pub use tree::{CategoryNode, ComponentTree, SubCategoryNode};
pub use workspace::Workspace;
