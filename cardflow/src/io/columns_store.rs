//! Base columns and filter state written by the loader and filter stages.
//!
//! Both files are produced outside cardflow. A missing file is not an error:
//! the editor simply starts with no base columns or no active filters.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use super::atomic::write_json_atomic;
use crate::core::filters::FilterState;
use crate::core::types::ColumnDescriptor;

pub fn load_columns(path: &Path) -> Result<Vec<ColumnDescriptor>> {
    load_or_default(path, "columns")
}

pub fn write_columns(path: &Path, columns: &[ColumnDescriptor]) -> Result<()> {
    write_json_atomic(path, columns)
}

pub fn load_filters(path: &Path) -> Result<FilterState> {
    load_or_default(path, "filters")
}

pub fn write_filters(path: &Path, filters: &FilterState) -> Result<()> {
    write_json_atomic(path, filters)
}

fn load_or_default<T: DeserializeOwned + Default>(path: &Path, what: &str) -> Result<T> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "{} file missing, using empty", what);
        return Ok(T::default());
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {} {}", what, path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {} {}", what, path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filters::Interval;
    use crate::core::types::ColumnKind;
    use serde_json::json;

    #[test]
    fn loader_metadata_parses_kinds_and_summaries() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("columns.json");
        fs::write(
            &path,
            json!([
                {"name": "age", "type": "numerical", "summary": {"min": 0, "max": 90, "step": 1}},
                {"name": "region", "type": "categorical", "summary": ["north", "south"]},
                {"name": "note"}
            ])
            .to_string(),
        )
        .expect("write");

        let columns = load_columns(&path).expect("load");
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].kind, Some(ColumnKind::Numerical));
        assert_eq!(columns[1].kind, Some(ColumnKind::Categorical));
        assert_eq!(columns[2], ColumnDescriptor::named("note"));
    }

    #[test]
    fn missing_files_load_as_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(load_columns(&temp.path().join("columns.json")).expect("columns").is_empty());
        assert_eq!(
            load_filters(&temp.path().join("filters.json")).expect("filters"),
            FilterState::default()
        );
    }

    #[test]
    fn filters_round_trip() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("filters.json");
        let mut state = FilterState::default();
        state
            .numerical
            .insert("age".to_string(), Some(Interval { min: 1.0, max: 2.0 }));
        state.categorical.insert("region".to_string(), None);
        write_filters(&path, &state).expect("write");
        assert_eq!(load_filters(&path).expect("load"), state);
    }

    #[test]
    fn malformed_columns_report_the_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("columns.json");
        fs::write(&path, "{not json").expect("write");
        let err = load_columns(&path).unwrap_err();
        assert!(err.to_string().starts_with("parse columns"));
    }
}
