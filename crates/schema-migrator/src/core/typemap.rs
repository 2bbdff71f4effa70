//! Size-bounded type templates.
//!
//! Each dialect registers, per [`DbType`], a default SQL type and any
//! number of templates bounded by a maximum size. A lookup picks the
//! smallest bound that fits the requested size and substitutes the
//! `$size` and `$precision` placeholders:
//!
//! ```rust
//! use schema_migrator::core::{DbType, TypeMap};
//!
//! let mut map = TypeMap::new();
//! map.set(DbType::String, "NVARCHAR(255)");
//! map.set_sized(DbType::String, "NVARCHAR($size)", 4000);
//! map.set_sized(DbType::String, "NVARCHAR(MAX)", TypeMap::MAX_SIZE);
//!
//! assert_eq!(map.get(DbType::String, None, None).unwrap(), "NVARCHAR(255)");
//! assert_eq!(map.get(DbType::String, Some(50), None).unwrap(), "NVARCHAR(50)");
//! assert_eq!(map.get(DbType::String, Some(9000), None).unwrap(), "NVARCHAR(MAX)");
//! ```

use std::collections::{BTreeMap, HashMap};

use crate::error::{MigrateError, Result};

use super::schema::DbType;

/// Registered templates for one type.
#[derive(Debug, Clone, Default)]
struct Templates {
    default: Option<String>,
    sized: BTreeMap<u32, String>,
}

/// Lookup table from neutral types to dialect SQL types.
#[derive(Debug, Clone, Default)]
pub struct TypeMap {
    templates: HashMap<DbType, Templates>,
}

impl TypeMap {
    /// Upper bound used for "unlimited" templates such as `VARCHAR(MAX)`.
    pub const MAX_SIZE: u32 = i32::MAX as u32;

    /// Create an empty type map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the template used when no size is requested.
    pub fn set(&mut self, db_type: DbType, template: impl Into<String>) -> &mut Self {
        self.templates.entry(db_type).or_default().default = Some(template.into());
        self
    }

    /// Register a template for sizes up to and including `max_size`.
    pub fn set_sized(
        &mut self,
        db_type: DbType,
        template: impl Into<String>,
        max_size: u32,
    ) -> &mut Self {
        self.templates
            .entry(db_type)
            .or_default()
            .sized
            .insert(max_size, template.into());
        self
    }

    /// True when the type has any template registered.
    pub fn supports(&self, db_type: DbType) -> bool {
        self.templates.contains_key(&db_type)
    }

    /// Resolve a type to SQL.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError::Generation` when the type is not registered or
    /// the size exceeds every registered bound.
    pub fn get(&self, db_type: DbType, size: Option<u32>, precision: Option<u32>) -> Result<String> {
        let templates = self.templates.get(&db_type).ok_or_else(|| {
            MigrateError::Generation(format!("Unsupported DbType '{:?}'", db_type))
        })?;

        let template = match size {
            None => templates
                .default
                .as_ref()
                .or_else(|| templates.sized.values().next()),
            Some(_) if templates.sized.is_empty() => templates.default.as_ref(),
            Some(size) => templates
                .sized
                .range(size..)
                .next()
                .map(|(_, template)| template),
        };

        let template = template.ok_or_else(|| {
            MigrateError::Generation(format!(
                "Unsupported DbType '{:?}' with size {}",
                db_type,
                size.unwrap_or_default()
            ))
        })?;

        Ok(substitute(template, size, precision))
    }
}

fn substitute(template: &str, size: Option<u32>, precision: Option<u32>) -> String {
    let mut sql = template.to_string();
    if let Some(size) = size {
        sql = sql.replace("$size", &size.to_string());
    }
    sql.replace("$precision", &precision.unwrap_or(0).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decimal_map() -> TypeMap {
        let mut map = TypeMap::new();
        map.set(DbType::Decimal, "DECIMAL(19,5)")
            .set_sized(DbType::Decimal, "DECIMAL($size,$precision)", 38);
        map.set(DbType::Int32, "INT");
        map
    }

    #[test]
    fn test_default_template() {
        let map = decimal_map();
        assert_eq!(map.get(DbType::Decimal, None, None).unwrap(), "DECIMAL(19,5)");
    }

    #[test]
    fn test_size_and_precision_substitution() {
        let map = decimal_map();
        assert_eq!(
            map.get(DbType::Decimal, Some(10), Some(2)).unwrap(),
            "DECIMAL(10,2)"
        );
        assert_eq!(map.get(DbType::Decimal, Some(38), None).unwrap(), "DECIMAL(38,0)");
    }

    #[test]
    fn test_oversize_is_error() {
        let map = decimal_map();
        let err = map.get(DbType::Decimal, Some(39), Some(2)).unwrap_err();
        assert!(err.to_string().contains("size 39"));
    }

    #[test]
    fn test_unsized_type_ignores_size() {
        let map = decimal_map();
        assert_eq!(map.get(DbType::Int32, Some(4), None).unwrap(), "INT");
    }

    #[test]
    fn test_unregistered_type() {
        let map = decimal_map();
        let err = map.get(DbType::Xml, None, None).unwrap_err();
        assert!(err.to_string().contains("Unsupported DbType 'Xml'"));
        assert!(!map.supports(DbType::Xml));
    }

    #[test]
    fn test_smallest_fitting_bound_wins() {
        let mut map = TypeMap::new();
        map.set(DbType::Binary, "LONGBLOB")
            .set_sized(DbType::Binary, "TINYBLOB", 255)
            .set_sized(DbType::Binary, "BLOB", 65_535)
            .set_sized(DbType::Binary, "MEDIUMBLOB", 16_777_215);
        assert_eq!(map.get(DbType::Binary, Some(255), None).unwrap(), "TINYBLOB");
        assert_eq!(map.get(DbType::Binary, Some(256), None).unwrap(), "BLOB");
        assert_eq!(map.get(DbType::Binary, Some(70_000), None).unwrap(), "MEDIUMBLOB");
        assert_eq!(map.get(DbType::Binary, None, None).unwrap(), "LONGBLOB");
    }
}
