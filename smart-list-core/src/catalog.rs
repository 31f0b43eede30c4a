//! Catalog of common grocery items, grouped by category.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCategory {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub items: Vec<CatalogEntry>,
}

/// A flat catalog row, ordered by category, as the catalog query returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub category_id: i64,
    pub category_name: String,
    #[serde(default)]
    pub category_icon: Option<String>,
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub categories: Vec<CatalogCategory>,
}

/// Visibility of one entry under the current search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryView {
    pub id: i64,
    pub name: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryView {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
    pub visible: bool,
    pub expanded: bool,
    pub entries: Vec<EntryView>,
}

impl CategoryView {
    pub fn visible_entries(&self) -> impl Iterator<Item = &EntryView> {
        self.entries.iter().filter(|e| e.visible)
    }
}

/// Result of filtering the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogView {
    pub term: String,
    pub categories: Vec<CategoryView>,
}

impl CatalogView {
    pub fn match_count(&self) -> usize {
        self.categories
            .iter()
            .map(|c| c.visible_entries().count())
            .sum()
    }
}

impl Catalog {
    pub fn new(categories: Vec<CatalogCategory>) -> Self {
        Self { categories }
    }

    /// Group consecutive rows sharing a category id.
    pub fn from_rows(rows: impl IntoIterator<Item = CatalogRow>) -> Self {
        let mut categories: Vec<CatalogCategory> = Vec::new();
        for row in rows {
            let start_new = categories
                .last()
                .map_or(true, |cur| cur.id != row.category_id);
            if start_new {
                categories.push(CatalogCategory {
                    id: row.category_id,
                    name: row.category_name,
                    icon: row.category_icon.filter(|i| !i.is_empty()),
                    items: Vec::with_capacity(8),
                });
            }
            if let Some(cur) = categories.last_mut() {
                cur.items.push(CatalogEntry {
                    id: row.id,
                    name: row.name,
                });
            }
        }
        Self { categories }
    }

    /// Common items shipped with the client.
    pub fn builtin() -> Self {
        let groups: [(&str, &str, &[&str]); 6] = [
            (
                "Produce",
                "🥦",
                &["Apples", "Bananas", "Carrots", "Lettuce", "Onions", "Potatoes", "Tomatoes"],
            ),
            (
                "Dairy",
                "🥛",
                &["Milk", "Butter", "Cheese", "Eggs", "Yogurt"],
            ),
            ("Bakery", "🍞", &["Bread", "Bagels", "Tortillas"]),
            (
                "Meat & Fish",
                "🍗",
                &["Chicken breast", "Ground beef", "Salmon"],
            ),
            (
                "Pantry",
                "🥫",
                &["Rice", "Pasta", "Flour", "Sugar", "Olive oil", "Coffee"],
            ),
            (
                "Household",
                "🧻",
                &["Paper towels", "Toilet paper", "Dish soap", "Trash bags"],
            ),
        ];

        let mut next_id = 1;
        let categories = groups
            .iter()
            .enumerate()
            .map(|(i, (name, icon, items))| CatalogCategory {
                id: i as i64 + 1,
                name: name.to_string(),
                icon: Some(icon.to_string()),
                items: items
                    .iter()
                    .map(|item| {
                        let entry = CatalogEntry {
                            id: next_id,
                            name: item.to_string(),
                        };
                        next_id += 1;
                        entry
                    })
                    .collect(),
            })
            .collect();

        Self { categories }
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.categories.iter().flat_map(|c| c.items.iter())
    }

    /// Look up an entry by exact (case-insensitive) name.
    pub fn find(&self, name: &str) -> Option<&CatalogEntry> {
        let name = name.trim().to_lowercase();
        self.entries().find(|e| e.name.to_lowercase() == name)
    }

    /// Show entries whose name contains `term`, ignoring case.
    ///
    /// Categories with a match are expanded and those without are hidden.
    /// A blank term shows everything with all categories collapsed.
    pub fn filter(&self, term: &str) -> CatalogView {
        let term = term.trim().to_lowercase();

        let categories = self
            .categories
            .iter()
            .map(|category| {
                let entries: Vec<EntryView> = category
                    .items
                    .iter()
                    .map(|entry| EntryView {
                        id: entry.id,
                        name: entry.name.clone(),
                        visible: term.is_empty() || entry.name.to_lowercase().contains(&term),
                    })
                    .collect();
                let any_match = entries.iter().any(|e| e.visible);

                CategoryView {
                    id: category.id,
                    name: category.name.clone(),
                    icon: category.icon.clone(),
                    visible: term.is_empty() || any_match,
                    expanded: !term.is_empty() && any_match,
                    entries,
                }
            })
            .collect();

        CatalogView { term, categories }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category_id: i64, category: &str, id: i64, name: &str) -> CatalogRow {
        CatalogRow {
            category_id,
            category_name: category.to_string(),
            category_icon: None,
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_from_rows_groups_consecutive_categories() {
        let catalog = Catalog::from_rows(vec![
            row(1, "Dairy", 10, "Milk"),
            row(1, "Dairy", 11, "Cheese"),
            row(2, "Bakery", 20, "Bread"),
        ]);

        assert_eq!(catalog.categories.len(), 2);
        assert_eq!(catalog.categories[0].items.len(), 2);
        assert_eq!(catalog.categories[1].items[0].name, "Bread");
    }

    #[test]
    fn test_filter_matches_substring_and_expands() {
        let view = Catalog::builtin().filter("MIL");

        assert_eq!(view.match_count(), 1);
        let dairy = view.categories.iter().find(|c| c.name == "Dairy").unwrap();
        assert!(dairy.visible);
        assert!(dairy.expanded);
        assert_eq!(
            dairy.visible_entries().map(|e| e.name.as_str()).collect::<Vec<_>>(),
            vec!["Milk"]
        );

        let bakery = view.categories.iter().find(|c| c.name == "Bakery").unwrap();
        assert!(!bakery.visible);
        assert!(!bakery.expanded);
    }

    #[test]
    fn test_empty_term_resets() {
        let catalog = Catalog::builtin();
        let view = catalog.filter("");

        assert_eq!(view.match_count(), catalog.entries().count());
        assert!(view.categories.iter().all(|c| c.visible && !c.expanded));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.filter("to"), catalog.filter("to"));
    }

    #[test]
    fn test_find_ignores_case() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.find("paper TOWELS").unwrap().name, "Paper towels");
        assert!(catalog.find("caviar").is_none());
    }

    #[test]
    fn test_builtin_ids_are_unique() {
        let catalog = Catalog::builtin();
        let mut ids: Vec<i64> = catalog.entries().map(|e| e.id).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }
}
