//! Category and sub-category grouping derived from component properties.
//! 依零件屬性推導的分類與子分類。

use std::cmp::Ordering;
use std::fmt;

use crate::component::Component;
use crate::manifest::{PropertyMap, CATEGORY_KEY, SUB_CATEGORY_KEY};

/// Label shown for primary categories without a backing `Category` property.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A (sub-)category label plus, for primary categories, its sub-categories.
/// 分類節點；主分類會附帶其子分類清單。
#[derive(Debug, Clone, Default)]
pub struct ComponentCategory {
    name: Option<String>,
    is_sub_category: bool,
    sub_categories: Vec<ComponentCategory>,
}

impl ComponentCategory {
    /// Primary category with an explicit name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            is_sub_category: false,
            sub_categories: Vec::new(),
        }
    }

    /// Derives the (sub-)category of a property set. The last matching entry wins.
    /// 從屬性推導分類；若有多筆相符則以最後一筆為準。
    pub fn from_properties(properties: &PropertyMap, is_sub_category: bool) -> Self {
        let wanted = if is_sub_category {
            SUB_CATEGORY_KEY
        } else {
            CATEGORY_KEY
        };
        let name = properties
            .iter()
            .filter(|(key, _)| *key == wanted)
            .last()
            .map(|(_, value)| value.to_string());
        Self {
            name,
            is_sub_category,
            sub_categories: Vec::new(),
        }
    }

    /// Display name; primary categories default to `"Uncategorized"`.
    /// 顯示名稱；主分類未設定時為 "Uncategorized"，子分類則為 `None`。
    pub fn name(&self) -> Option<&str> {
        match (&self.name, self.is_sub_category) {
            (Some(name), _) => Some(name),
            (None, false) => Some(UNCATEGORIZED),
            (None, true) => None,
        }
    }

    pub fn is_sub_category(&self) -> bool {
        self.is_sub_category
    }

    pub fn sub_categories(&self) -> &[ComponentCategory] {
        &self.sub_categories
    }

    pub fn set_sub_categories(&mut self, sub_categories: Vec<ComponentCategory>) {
        self.sub_categories = sub_categories;
    }
}

/// Categories are equal when their display names are; a nameless sub-category equals nothing.
impl PartialEq for ComponentCategory {
    fn eq(&self, other: &Self) -> bool {
        match (self.name(), other.name()) {
            (Some(lhs), Some(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().unwrap_or_default())
    }
}

/// Live (not deleted) members of `category` among `components`, in collection order.
/// 取得屬於指定分類且未刪除的零件。
pub fn components_in_category<'a>(
    components: &'a [Component],
    category: &ComponentCategory,
) -> Vec<&'a Component> {
    components
        .iter()
        .filter(|component| !component.is_deleted() && component.category() == *category)
        .collect()
}

/// Primary categories in first-seen order, each populated with its sub-categories.
/// 建立兩層分類：主分類依首次出現順序去重，再附上各自的子分類。
pub fn build_category_tree(components: &[Component]) -> Vec<ComponentCategory> {
    let mut categories = dedupe(
        components
            .iter()
            .filter(|component| !component.is_deleted())
            .map(Component::category),
    );
    for category in &mut categories {
        let members = components_in_category(components, category);
        let subs = dedupe(members.into_iter().map(Component::sub_category));
        category.set_sub_categories(subs);
    }
    categories
}

fn dedupe(candidates: impl Iterator<Item = ComponentCategory>) -> Vec<ComponentCategory> {
    let mut unique: Vec<ComponentCategory> = Vec::new();
    for candidate in candidates {
        if candidate.name().is_some() && !unique.contains(&candidate) {
            unique.push(candidate);
        }
    }
    unique
}

fn cmp_ignore_case(lhs: &str, rhs: &str) -> Ordering {
    lhs.to_lowercase().cmp(&rhs.to_lowercase())
}

/// Sorts categories (and their sub-categories) alphabetically, ignoring case.
/// 依字母順序（不分大小寫）排序分類與子分類。
pub fn sort_categories(categories: &mut [ComponentCategory]) {
    categories.sort_by(|lhs, rhs| match (lhs.name(), rhs.name()) {
        (Some(lhs), Some(rhs)) => cmp_ignore_case(lhs, rhs),
        _ => Ordering::Equal,
    });
    for category in categories.iter_mut() {
        sort_categories(&mut category.sub_categories);
    }
}

/// Sorts components alphabetically by name, ignoring case.
pub fn sort_components(components: &mut [&Component]) {
    components.sort_by(|lhs, rhs| match (lhs.name(), rhs.name()) {
        (Some(lhs), Some(rhs)) => cmp_ignore_case(lhs, rhs),
        _ => Ordering::Equal,
    });
}
