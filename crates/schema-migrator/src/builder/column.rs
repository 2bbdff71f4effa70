//! Column type and constraint syntax shared by every column-producing chain.

use crate::core::{ColumnDefinition, ColumnModification, DbType, DefaultValue, SystemMethod, Value};
use crate::expressions::{AlterColumn, CreateColumn, Expression, TableRef};

use super::Pending;

/// Fluent column syntax. Implementors expose the column being described;
/// every other method is provided.
pub trait ColumnSyntax: Sized {
    /// The column the next call applies to.
    fn current_column(&mut self) -> &mut ColumnDefinition;

    fn modify(mut self, f: impl FnOnce(&mut ColumnDefinition)) -> Self {
        f(self.current_column());
        self
    }

    fn as_type(self, db_type: DbType) -> Self {
        self.modify(|c| {
            c.db_type = Some(db_type);
            c.custom_type = None;
        })
    }

    fn as_sized(self, db_type: DbType, size: Option<u32>) -> Self {
        self.as_type(db_type).modify(|c| c.size = size)
    }

    /// Dialect type string emitted verbatim.
    fn as_custom(self, sql_type: &str) -> Self {
        self.modify(|c| {
            c.custom_type = Some(sql_type.to_string());
            c.db_type = None;
        })
    }

    fn as_ansi_string(self, size: impl Into<Option<u32>>) -> Self {
        self.as_sized(DbType::AnsiString, size.into())
    }

    fn as_fixed_ansi_string(self, size: u32) -> Self {
        self.as_sized(DbType::AnsiStringFixedLength, Some(size))
    }

    fn as_string(self, size: impl Into<Option<u32>>) -> Self {
        self.as_sized(DbType::String, size.into())
    }

    fn as_fixed_string(self, size: u32) -> Self {
        self.as_sized(DbType::StringFixedLength, Some(size))
    }

    fn as_binary(self, size: impl Into<Option<u32>>) -> Self {
        self.as_sized(DbType::Binary, size.into())
    }

    fn as_boolean(self) -> Self {
        self.as_type(DbType::Boolean)
    }

    fn as_byte(self) -> Self {
        self.as_type(DbType::Byte)
    }

    fn as_int16(self) -> Self {
        self.as_type(DbType::Int16)
    }

    fn as_int32(self) -> Self {
        self.as_type(DbType::Int32)
    }

    fn as_int64(self) -> Self {
        self.as_type(DbType::Int64)
    }

    fn as_float(self) -> Self {
        self.as_type(DbType::Single)
    }

    fn as_double(self) -> Self {
        self.as_type(DbType::Double)
    }

    fn as_currency(self) -> Self {
        self.as_type(DbType::Currency)
    }

    fn as_decimal(self, size: u32, precision: u32) -> Self {
        self.as_sized(DbType::Decimal, Some(size))
            .modify(|c| c.precision = Some(precision))
    }

    fn as_date(self) -> Self {
        self.as_type(DbType::Date)
    }

    fn as_time(self) -> Self {
        self.as_type(DbType::Time)
    }

    fn as_datetime(self) -> Self {
        self.as_type(DbType::DateTime)
    }

    fn as_datetime2(self) -> Self {
        self.as_type(DbType::DateTime2)
    }

    fn as_datetime_offset(self) -> Self {
        self.as_type(DbType::DateTimeOffset)
    }

    fn as_guid(self) -> Self {
        self.as_type(DbType::Guid)
    }

    fn as_xml(self) -> Self {
        self.as_type(DbType::Xml)
    }

    fn as_json(self) -> Self {
        self.as_type(DbType::Json)
    }

    fn nullable(self) -> Self {
        self.modify(|c| c.is_nullable = Some(true))
    }

    fn not_nullable(self) -> Self {
        self.modify(|c| c.is_nullable = Some(false))
    }

    fn primary_key(self) -> Self {
        self.modify(|c| {
            c.is_primary_key = true;
            c.is_nullable = Some(false);
        })
    }

    fn primary_key_named(self, name: &str) -> Self {
        self.primary_key()
            .modify(|c| c.primary_key_name = Some(name.to_string()))
    }

    fn identity(self) -> Self {
        self.modify(|c| c.is_identity = true)
    }

    fn identity_with(self, seed: i64, increment: i64) -> Self {
        self.modify(|c| {
            c.is_identity = true;
            c.identity_seed = Some(seed);
            c.identity_increment = Some(increment);
        })
    }

    fn unique(self) -> Self {
        self.modify(|c| c.is_unique = true)
    }

    fn indexed(self) -> Self {
        self.modify(|c| c.is_indexed = true)
    }

    fn with_default(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.modify(|c| c.default = DefaultValue::Value(value))
    }

    fn with_default_method(self, method: SystemMethod) -> Self {
        self.modify(|c| c.default = DefaultValue::Method(method))
    }

    fn with_collation(self, collation: &str) -> Self {
        self.modify(|c| c.collation = Some(collation.to_string()))
    }

    fn with_description(self, description: &str) -> Self {
        self.modify(|c| c.description = Some(description.to_string()))
    }
}

/// Last column of a list, adding an unnamed one (caught by validation)
/// when the chain has not named a column yet.
pub(crate) fn last_column(columns: &mut Vec<ColumnDefinition>) -> &mut ColumnDefinition {
    if columns.is_empty() {
        columns.push(ColumnDefinition::default());
    }
    let last = columns.len() - 1;
    &mut columns[last]
}

/// `create().column(..)`: add one column to an existing table.
pub struct CreateColumnBuilder<'a>(Pending<'a, CreateColumn>);

impl<'a> CreateColumnBuilder<'a> {
    pub(crate) fn new(sink: &'a mut Vec<Expression>, name: &str) -> Self {
        Self(Pending::new(
            sink,
            CreateColumn {
                table: TableRef::default(),
                column: ColumnDefinition::new(name),
                if_not_exists: false,
            },
        ))
    }

    pub fn on_table(mut self, table: &str) -> Self {
        let e = self.0.item();
        e.table.name = table.to_string();
        e.column.table_name = table.to_string();
        self
    }

    pub fn in_schema(mut self, schema: &str) -> Self {
        self.0.item().table.schema = Some(schema.to_string());
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.0.item().if_not_exists = true;
        self
    }
}

impl ColumnSyntax for CreateColumnBuilder<'_> {
    fn current_column(&mut self) -> &mut ColumnDefinition {
        &mut self.0.item().column
    }
}

/// `alter().column(..)`: restate a column's full definition.
pub struct AlterColumnBuilder<'a>(Pending<'a, AlterColumn>);

impl<'a> AlterColumnBuilder<'a> {
    pub(crate) fn new(sink: &'a mut Vec<Expression>, name: &str) -> Self {
        Self(Pending::new(
            sink,
            AlterColumn {
                table: TableRef::default(),
                column: ColumnDefinition {
                    modification: ColumnModification::Alter,
                    ..ColumnDefinition::new(name)
                },
            },
        ))
    }

    pub fn on_table(mut self, table: &str) -> Self {
        let e = self.0.item();
        e.table.name = table.to_string();
        e.column.table_name = table.to_string();
        self
    }

    pub fn in_schema(mut self, schema: &str) -> Self {
        self.0.item().table.schema = Some(schema.to_string());
        self
    }
}

impl ColumnSyntax for AlterColumnBuilder<'_> {
    fn current_column(&mut self) -> &mut ColumnDefinition {
        &mut self.0.item().column
    }
}
