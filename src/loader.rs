//! Catalog loading from files and strings.

use std::path::Path;

use crate::catalog::{CatalogDocument, TypeCatalog};
use crate::error::CatalogError;

/// Load a type catalog from a JSON file.
///
/// # Errors
///
/// Returns `CatalogError::FileNotFound` if the file doesn't exist,
/// `CatalogError::InvalidJson` if the file isn't a valid catalog, or a
/// consistency error if it references unknown types.
pub fn load_catalog(path: &Path) -> Result<TypeCatalog, CatalogError> {
    let content = read_file(path)?;
    load_catalog_str(&content)
}

/// Load a type catalog from a JSON string.
///
/// # Errors
///
/// Returns `CatalogError::InvalidJson` if the string isn't a valid catalog.
pub fn load_catalog_str(content: &str) -> Result<TypeCatalog, CatalogError> {
    let document: CatalogDocument =
        serde_json::from_str(content).map_err(|source| CatalogError::InvalidJson { source })?;
    TypeCatalog::from_document(document)
}

/// Load a JSON document (e.g. a payload to check).
///
/// # Errors
///
/// Returns `CatalogError::FileNotFound`, `CatalogError::ReadError` or
/// `CatalogError::InvalidJson`.
pub fn load_json(path: &Path) -> Result<serde_json::Value, CatalogError> {
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|source| CatalogError::InvalidJson { source })
}

pub(crate) fn read_file(path: &Path) -> Result<String, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| CatalogError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::TypeIntrospector;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_catalog_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"types":[{{"name":"com.example.Pair"}}]}}"#).unwrap();

        let catalog = load_catalog(file.path()).unwrap();
        assert!(catalog.resolve("Pair").is_ok());
    }

    #[test]
    fn load_missing_file() {
        let err = load_catalog(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, CatalogError::FileNotFound { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn load_invalid_json() {
        let err = load_catalog_str("{ not json").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidJson { .. }));
    }

    #[test]
    fn load_rejects_bad_type_expression() {
        let err = load_catalog_str(
            r#"{"types":[{"name":"A","fields":[{"name":"x","type":"List<"}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidJson { .. }));
    }
}
