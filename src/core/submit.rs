//! Submission hook for validated products.
//!
//! Creating the product (and uploading its images) belongs to an external
//! service; the form only calls a [`SubmitHandler`] after validation passed.

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use super::product::NewProduct;

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("cannot write submission to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot encode submission: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait SubmitHandler {
    fn submit(&mut self, product: &NewProduct) -> Result<(), SubmitError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionRecord<'a> {
    submitted_at: String,
    product: &'a NewProduct,
}

/// Appends one JSON object per submitted product to a file.
pub struct JsonLinesSubmitter {
    path: PathBuf,
}

impl JsonLinesSubmitter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SubmitHandler for JsonLinesSubmitter {
    fn submit(&mut self, product: &NewProduct) -> Result<(), SubmitError> {
        let record = SubmissionRecord {
            submitted_at: chrono::Utc::now().to_rfc3339(),
            product,
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let io_err = |source| SubmitError::Io {
            path: self.path.clone(),
            source,
        };
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        file.write_all(line.as_bytes()).map_err(io_err)?;
        info!(path = %self.path.display(), name = %product.name, "product submitted");
        Ok(())
    }
}

/// Used when no submission target is configured: records the product in
/// the diagnostics log only.
pub struct LogSubmitter;

impl SubmitHandler for LogSubmitter {
    fn submit(&mut self, product: &NewProduct) -> Result<(), SubmitError> {
        let json = serde_json::to_string(product)?;
        info!(product = %json, "product submitted (no submission target)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{Category, Color, Size};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn product(name: &str) -> NewProduct {
        NewProduct {
            name: name.into(),
            short_description: "short".into(),
            description: "long".into(),
            price: 10.0,
            category: Category::Shoes,
            sizes: vec![Size::M],
            colors: vec![Color::Blue],
            images: BTreeMap::new(),
        }
    }

    #[test]
    fn appends_one_line_per_submission() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.jsonl");
        let mut s = JsonLinesSubmitter::new(path.clone());
        s.submit(&product("first")).unwrap();
        s.submit(&product("second")).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let names: Vec<String> = text
            .lines()
            .map(|l| {
                let v: serde_json::Value = serde_json::from_str(l).unwrap();
                assert!(v["submittedAt"].is_string());
                v["product"]["name"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn unwritable_target_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut s = JsonLinesSubmitter::new(dir.path().join("missing").join("out.jsonl"));
        assert!(matches!(s.submit(&product("x")), Err(SubmitError::Io { .. })));
    }
}
