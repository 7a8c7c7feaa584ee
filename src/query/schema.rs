use sea_orm::{
    ColumnTrait, ColumnType, EntityName, EntityTrait, IdenStatic, Iterable, PrimaryKeyToColumn,
    Value,
};

/// How a column's bound values are coerced from query-string text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Float,
    Boolean,
    Text,
}

impl ValueKind {
    /// Coerce raw text for this column. Text that does not parse is bound as a
    /// string and left for the database to judge.
    #[must_use]
    pub fn coerce(self, raw: &str) -> Value {
        let trimmed = raw.trim();
        match self {
            Self::Integer => trimmed
                .parse::<i64>()
                .map_or_else(|_| text(raw), |v| Value::BigInt(Some(v))),
            Self::Float => trimmed
                .parse::<f64>()
                .map_or_else(|_| text(raw), |v| Value::Double(Some(v))),
            Self::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" => Value::Bool(Some(true)),
                "false" | "0" => Value::Bool(Some(false)),
                _ => text(raw),
            },
            Self::Text => text(raw),
        }
    }
}

impl From<&ColumnType> for ValueKind {
    fn from(column_type: &ColumnType) -> Self {
        match column_type {
            ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned
            | ColumnType::BigUnsigned => Self::Integer,
            ColumnType::Float | ColumnType::Double | ColumnType::Decimal(_) | ColumnType::Money(_) => {
                Self::Float
            }
            ColumnType::Boolean => Self::Boolean,
            _ => Self::Text,
        }
    }
}

fn text(raw: &str) -> Value {
    Value::String(Some(Box::new(raw.to_string())))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ValueKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// A relation that can be joined by name.
///
/// The join condition is `parent.from_column = child.to_column`.
#[derive(Debug, Clone)]
pub struct RelationDescriptor {
    pub name: &'static str,
    pub cardinality: Cardinality,
    pub from_column: String,
    pub to_column: String,
    target: fn() -> Schema,
}

impl RelationDescriptor {
    /// Describe a relation by its columns.
    ///
    /// ```rust,ignore
    /// RelationDescriptor::new(
    ///     "team",
    ///     Cardinality::One,
    ///     person::Column::TeamId,
    ///     team::Column::Id,
    ///     || Schema::of::<team::Entity>(vec![]),
    /// )
    /// ```
    pub fn new(
        name: &'static str,
        cardinality: Cardinality,
        from: impl IdenStatic,
        to: impl IdenStatic,
        target: fn() -> Schema,
    ) -> Self {
        Self::with_columns(name, cardinality, from.as_str(), to.as_str(), target)
    }

    /// Same as [`RelationDescriptor::new`] with plain column names.
    #[must_use]
    pub fn with_columns(
        name: &'static str,
        cardinality: Cardinality,
        from_column: &str,
        to_column: &str,
        target: fn() -> Schema,
    ) -> Self {
        Self {
            name,
            cardinality,
            from_column: from_column.to_string(),
            to_column: to_column.to_string(),
            target,
        }
    }

    /// Schema of the related entity, built on demand so relations may be
    /// cyclic.
    #[must_use]
    pub fn target(&self) -> Schema {
        (self.target)()
    }
}

/// Table, columns and relations of one entity.
#[derive(Debug, Clone)]
pub struct Schema {
    pub table: String,
    pub primary_key: String,
    pub columns: Vec<ColumnInfo>,
    pub relations: Vec<RelationDescriptor>,
}

impl Schema {
    /// Read table, primary key and column kinds off a Sea-ORM entity.
    #[must_use]
    pub fn of<E: EntityTrait>(relations: Vec<RelationDescriptor>) -> Self {
        let table = E::default().table_name().to_string();

        let columns = E::Column::iter()
            .map(|column| ColumnInfo {
                name: column.as_str().to_string(),
                kind: ValueKind::from(column.def().get_column_type()),
            })
            .collect();

        let primary_key = E::PrimaryKey::iter()
            .next()
            .map_or_else(|| "id".to_string(), |pk| pk.into_column().as_str().to_string());

        Self {
            table,
            primary_key,
            columns,
            relations,
        }
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|column| column.name == name)
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }
}
