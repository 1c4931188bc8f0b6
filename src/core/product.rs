//! Product records: the rows shown in the table, the validated output of
//! the add-product form, and catalog file loading.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::catalog::{Category, Color, Size};
use super::image::ImageRef;
use super::table::{CellValue, Column, DeleteError, DeleteHandler, TableRecord};

/// One existing product, as listed in the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub short_description: String,
    pub price: f64,
    pub category: Category,
    #[serde(default)]
    pub sizes: Vec<Size>,
    #[serde(default)]
    pub colors: Vec<Color>,
}

impl TableRecord for Product {
    type Id = u64;

    fn row_id(&self) -> u64 {
        self.id
    }
}

/// A validated product produced by the add-product form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub sizes: Vec<Size>,
    pub colors: Vec<Color>,
    pub images: BTreeMap<Color, ImageRef>,
}

/// Column set of the products table.
pub fn columns() -> Vec<Column<Product>> {
    vec![
        Column::new("id", "ID", |p: &Product| CellValue::Unsigned(p.id)).width(6),
        Column::new("name", "Name", |p: &Product| CellValue::Text(p.name.clone())).width(22),
        Column::new("category", "Category", |p: &Product| {
            CellValue::Text(p.category.as_str().to_string())
        })
        .width(12),
        Column::new("price", "Price", |p: &Product| CellValue::Number(p.price)).width(10),
        Column::new("sizes", "Sizes", |p: &Product| CellValue::Text(join_tokens(&p.sizes)))
            .width(18)
            .unsortable(),
        Column::new("colors", "Colors", |p: &Product| CellValue::Text(join_tokens(&p.colors)))
            .width(20)
            .unsortable(),
    ]
}

fn join_tokens<T: std::fmt::Display>(tokens: &[T]) -> String {
    tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ───────────────────────────────────────── catalog file ──────

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("cannot read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog {path} lists product id {id} more than once")]
    DuplicateId { path: PathBuf, id: u64 },
}

/// Load a JSON array of products.  Row ids must be unique since selection
/// is keyed by them.
pub fn load_catalog(path: &Path) -> Result<Vec<Product>, CatalogError> {
    let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let products: Vec<Product> =
        serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut seen = HashSet::new();
    for p in &products {
        if !seen.insert(p.id) {
            return Err(CatalogError::DuplicateId {
                path: path.to_path_buf(),
                id: p.id,
            });
        }
    }
    info!(path = %path.display(), rows = products.len(), "catalog loaded");
    Ok(products)
}

fn save_catalog(path: &Path, products: &[Product]) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(products)?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Delete handler backing the table's bulk-delete action.
///
/// With a catalog file the deletion is written back to disk; without one
/// the rows only leave the in-memory table.
pub struct CatalogDeleter {
    path: Option<PathBuf>,
}

impl CatalogDeleter {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Catalog file this deleter writes to, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl DeleteHandler<Product> for CatalogDeleter {
    fn delete(&mut self, ids: &[u64]) -> Result<(), DeleteError<u64>> {
        let Some(path) = &self.path else {
            info!(?ids, "products deleted (in memory)");
            return Ok(());
        };

        let mut products =
            load_catalog(path).map_err(|e| DeleteError::Failed(e.to_string()))?;
        let on_disk: HashSet<u64> = products.iter().map(|p| p.id).collect();
        let (present, missing): (Vec<u64>, Vec<u64>) =
            ids.iter().copied().partition(|id| on_disk.contains(id));

        products.retain(|p| !present.contains(&p.id));
        if let Err(e) = save_catalog(path, &products) {
            warn!(error = %e, "catalog write failed");
            return Err(DeleteError::Failed(e.to_string()));
        }
        info!(path = %path.display(), deleted = ?present, "products deleted");

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DeleteError::Partial {
                deleted: present,
                failed: missing
                    .into_iter()
                    .map(|id| (id, "not present in catalog file".to_string()))
                    .collect(),
            })
        }
    }
}

/// Built-in catalog used when no `--data` file is given.
pub fn sample_catalog() -> Vec<Product> {
    use Category::*;
    let rows: &[(u64, &str, &str, f64, Category, &[Size], &[Color])] = &[
        (1, "Adidas CoreFit T-Shirt", "Breathable cotton tee", 39.9, TShirts, &[Size::S, Size::M, Size::L], &[Color::Gray, Color::Purple, Color::Green]),
        (2, "Puma Ultra Warm Zip", "Fleece-lined zip jacket", 59.9, Jackets, &[Size::M, Size::L, Size::Xl], &[Color::Gray, Color::Green]),
        (3, "Nike Air Essentials Pullover", "Soft pullover hoodie", 69.9, Jackets, &[Size::S, Size::M, Size::L], &[Color::Green, Color::Blue, Color::Black]),
        (4, "Nike Dri Flex T-Shirt", "Moisture-wicking training tee", 29.9, TShirts, &[Size::S, Size::M, Size::L], &[Color::White, Color::Pink]),
        (5, "Under Armour StormFleece", "Water-resistant fleece", 49.9, Jackets, &[Size::S, Size::M, Size::L], &[Color::Red, Color::Orange, Color::Black]),
        (6, "Nike Air Max 270", "Cushioned everyday sneaker", 59.9, Shoes, &[Size::Eu40, Size::Eu42, Size::Eu43, Size::Eu44], &[Color::Gray, Color::White]),
        (7, "Nike Ultraboost Pulse", "Responsive running shoe", 69.9, Shoes, &[Size::Eu40, Size::Eu42, Size::Eu43], &[Color::Gray, Color::Pink]),
        (8, "Levi's Classic Denim", "Straight-fit denim jacket", 59.9, Jackets, &[Size::S, Size::M, Size::L], &[Color::Blue, Color::Green]),
        (9, "Leather Travel Bag", "Full-grain leather weekender", 129.0, Bags, &[], &[Color::Brown, Color::Black]),
        (10, "Wool Winter Gloves", "Knitted merino gloves", 19.5, Gloves, &[Size::S, Size::M, Size::L], &[Color::Gray, Color::Red]),
        (11, "Summer Linen Dress", "Lightweight linen dress", 79.0, Dresses, &[Size::Xs, Size::S, Size::M], &[Color::White, Color::Yellow]),
        (12, "Canvas Belt", "Adjustable canvas belt", 14.0, Accessories, &[], &[Color::Black, Color::Orange]),
    ];
    rows.iter()
        .map(|&(id, name, short, price, category, sizes, colors)| Product {
            id,
            name: name.to_string(),
            short_description: short.to_string(),
            price,
            category,
            sizes: sizes.to_vec(),
            colors: colors.to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::{DataTable, DeleteOutcome};
    use pretty_assertions::assert_eq;

    const CATALOG: &str = r#"[
        {"id": 7, "name": "Tee", "shortDescription": "Soft", "price": 12.5,
         "category": "T-shirts", "sizes": ["s", "34"], "colors": ["red"]},
        {"id": 9, "name": "Bag", "price": 80, "category": "Bags"}
    ]"#;

    fn write_catalog(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join("products.json");
        std::fs::write(&path, text).expect("write catalog");
        path
    }

    #[test]
    fn loads_catalog_with_tokens_and_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let products = load_catalog(&write_catalog(dir.path(), CATALOG)).expect("load");
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].category, Category::TShirts);
        assert_eq!(products[0].sizes, vec![Size::S, Size::Eu34]);
        assert_eq!(products[1].short_description, "");
        assert!(products[1].colors.is_empty());
    }

    #[test]
    fn rejects_unknown_tokens_and_duplicate_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bad_token = r#"[{"id": 1, "name": "x", "price": 1, "category": "Hats"}]"#;
        assert!(matches!(
            load_catalog(&write_catalog(dir.path(), bad_token)),
            Err(CatalogError::Parse { .. })
        ));

        let dup = r#"[{"id": 1, "name": "x", "price": 1, "category": "Bags"},
                      {"id": 1, "name": "y", "price": 2, "category": "Bags"}]"#;
        assert!(matches!(
            load_catalog(&write_catalog(dir.path(), dup)),
            Err(CatalogError::DuplicateId { id: 1, .. })
        ));
    }

    #[test]
    fn ids_beyond_i64_display_and_sort_as_unsigned() {
        let mut big = sample_catalog().remove(0);
        big.id = u64::MAX;
        let mut small = sample_catalog().remove(1);
        small.id = 1;

        let id_cell = columns()[0].cell;
        assert_eq!(id_cell(&big).display(), "18446744073709551615");

        let mut table = DataTable::new(columns(), vec![big, small]);
        table.toggle_sort(0);
        let order: Vec<u64> = table
            .sorted_indices()
            .into_iter()
            .map(|i| table.data()[i].id)
            .collect();
        assert_eq!(order, vec![1, u64::MAX]);
    }

    #[test]
    fn sample_catalog_has_unique_ids() {
        let products = sample_catalog();
        let ids: HashSet<u64> = products.iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), products.len());
    }

    #[test]
    fn deleter_writes_remaining_rows_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_catalog(dir.path(), CATALOG);
        let mut table = DataTable::new(columns(), load_catalog(&path).unwrap());
        let mut deleter = CatalogDeleter::new(Some(path.clone()));

        table.toggle_row(&7);
        let outcome = table.delete_selected(Some(&mut deleter));
        assert_eq!(outcome, DeleteOutcome::Deleted(vec![7]));

        let on_disk: Vec<u64> = load_catalog(&path).unwrap().iter().map(|p| p.id).collect();
        assert_eq!(on_disk, vec![9]);
    }

    #[test]
    fn deleter_reports_rows_missing_from_file_as_partial() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_catalog(dir.path(), CATALOG);
        let mut table = DataTable::new(columns(), load_catalog(&path).unwrap());
        // Someone else removed id 9 from the file in the meantime.
        std::fs::write(
            &path,
            r#"[{"id": 7, "name": "Tee", "price": 12.5, "category": "T-shirts"}]"#,
        )
        .unwrap();

        table.toggle_row(&7);
        table.toggle_row(&9);
        let mut deleter = CatalogDeleter::new(Some(path));
        match table.delete_selected(Some(&mut deleter)) {
            DeleteOutcome::Partial { deleted, failed } => {
                assert_eq!(deleted, vec![7]);
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].0, 9);
            }
            other => panic!("expected partial delete, got {other:?}"),
        }
        assert_eq!(table.selected_ids(), vec![9]);
    }

    #[test]
    fn in_memory_deleter_always_succeeds() {
        let mut table = DataTable::new(columns(), sample_catalog());
        let mut deleter = CatalogDeleter::new(None);
        table.toggle_row(&3);
        assert_eq!(
            table.delete_selected(Some(&mut deleter)),
            DeleteOutcome::Deleted(vec![3])
        );
        assert_eq!(table.data().len(), 11);
    }

    #[test]
    fn new_product_serialises_with_schema_keys() {
        let p = NewProduct {
            name: "Tee".into(),
            short_description: "Soft".into(),
            description: "A soft tee".into(),
            price: 10.0,
            category: Category::TShirts,
            sizes: vec![Size::M],
            colors: vec![Color::Blue],
            images: BTreeMap::new(),
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["shortDescription"], "Soft");
        assert_eq!(json["category"], "T-shirts");
        assert_eq!(json["sizes"][0], "m");
    }
}
