use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::{Map, Value};

use super::value::SqlValue;

/// Ordered column/value pairs. Used both for result rows and for the
/// caller-supplied data of insert/update, where column order is significant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, SqlValue)>,
}

/// Column/value pairs supplied for insert and update.
pub type Record = Row;

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from a JSON object, keeping the object's key order.
    pub fn from_json_object(obj: Map<String, Value>) -> Self {
        obj.into_iter().map(|(k, v)| (k, SqlValue::from(v))).collect()
    }

    /// Appends a cell. A repeated column name replaces the earlier value in place.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(c, _)| *c == column) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.cells.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(c, _)| c.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.cells.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.cells.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (c, v) in &self.cells {
            map.serialize_entry(c, v)?;
        }
        map.end()
    }
}

/// One row of `PRAGMA table_info`, serialized as the engine reports it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMeta {
    pub cid: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub decl_type: String,
    /// 1 when declared NOT NULL, else 0.
    pub notnull: i64,
    #[serde(rename = "dflt_value")]
    pub default_value: Option<String>,
    /// 1-based position in the primary key, 0 when not part of it.
    pub pk: i64,
}

impl ColumnMeta {
    pub fn nullable(&self) -> bool {
        self.notnull == 0
    }

    pub fn is_pk(&self) -> bool {
        self.pk > 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnMeta>,
}

/// User tables in catalog order with their column metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDescription {
    pub tables: Vec<TableSchema>,
}

impl SchemaDescription {
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// `{ "<table>": [columns...] }`, the bare shape HTTP and MCP return.
    pub fn tables_json(&self) -> Value {
        let mut out = Map::with_capacity(self.tables.len());
        for t in &self.tables {
            out.insert(
                t.name.clone(),
                serde_json::to_value(&t.columns).unwrap_or(Value::Null),
            );
        }
        Value::Object(out)
    }
}

impl Serialize for SchemaDescription {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Tables<'a>(&'a [TableSchema]);

        impl Serialize for Tables<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for t in self.0 {
                    map.serialize_entry(&t.name, &t.columns)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("tables", &Tables(&self.tables))?;
        map.serialize_entry("tableCount", &self.tables.len())?;
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowSet {
    pub rows: Vec<Row>,
    #[serde(rename = "rowCount")]
    pub row_count: usize,
    /// Total matching rows ignoring LIMIT/OFFSET; only set for table selects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl RowSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            row_count: rows.len(),
            rows,
            total: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Mutation {
    pub changes: u64,
    #[serde(rename = "insertedId")]
    pub inserted_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    Rows(RowSet),
    Mutation(Mutation),
    Schema(SchemaDescription),
}

impl OperationResult {
    pub fn rows(&self) -> Option<&RowSet> {
        match self {
            OperationResult::Rows(r) => Some(r),
            _ => None,
        }
    }

    pub fn mutation(&self) -> Option<Mutation> {
        match self {
            OperationResult::Mutation(m) => Some(*m),
            _ => None,
        }
    }

    pub fn schema(&self) -> Option<&SchemaDescription> {
        match self {
            OperationResult::Schema(s) => Some(s),
            _ => None,
        }
    }
}
