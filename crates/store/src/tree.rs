//! Filtered category tree handed to presentation layers.
//! 供介面顯示的分類樹，可依零件名稱篩選。

use serde::Serialize;

use crate::category::{build_category_tree, components_in_category, ComponentCategory};
use crate::component::Component;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComponentTree {
    pub categories: Vec<CategoryNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryNode {
    pub name: String,
    pub sub_categories: Vec<SubCategoryNode>,
    /// Members without a recognised sub-category.
    pub components: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubCategoryNode {
    pub name: String,
    pub components: Vec<String>,
}

impl ComponentTree {
    /// Groups `components` into categories and sub-categories.
    ///
    /// A non-empty `filter` keeps components whose name contains it, ignoring case.
    /// Deleted components and empty nodes are left out.
    /// 建立分類樹；篩選字串不分大小寫比對零件名稱，並略過已刪除的零件與空節點。
    pub fn build(components: &[Component], filter: &str) -> Self {
        let needle = filter.to_lowercase();
        let keep = |component: &Component| -> Option<String> {
            if component.is_deleted() {
                return None;
            }
            let name = component.name()?;
            (needle.is_empty() || name.to_lowercase().contains(&needle)).then(|| name.to_string())
        };

        let mut categories = Vec::new();
        for category in build_category_tree(components) {
            let members = components_in_category(components, &category);

            let mut sub_categories = Vec::new();
            for sub in category.sub_categories() {
                let names: Vec<String> = members
                    .iter()
                    .filter(|component| component.sub_category() == *sub)
                    .filter_map(|component| keep(*component))
                    .collect();
                if let (Some(name), false) = (sub.name(), names.is_empty()) {
                    sub_categories.push(SubCategoryNode {
                        name: name.to_string(),
                        components: names,
                    });
                }
            }

            let direct: Vec<String> = members
                .iter()
                .filter(|component| !belongs_to_any(&component.sub_category(), &category))
                .filter_map(|component| keep(*component))
                .collect();

            if sub_categories.is_empty() && direct.is_empty() {
                continue;
            }
            categories.push(CategoryNode {
                name: category.to_string(),
                sub_categories,
                components: direct,
            });
        }
        Self { categories }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Total number of component entries in the tree.
    pub fn component_count(&self) -> usize {
        self.categories
            .iter()
            .map(|category| {
                category.components.len()
                    + category
                        .sub_categories
                        .iter()
                        .map(|sub| sub.components.len())
                        .sum::<usize>()
            })
            .sum()
    }
}

fn belongs_to_any(sub: &ComponentCategory, category: &ComponentCategory) -> bool {
    category.sub_categories().iter().any(|known| known == sub)
}
