use sea_orm::sea_query::Order as SqlOrder;

/// Sort direction of an [`Order`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl From<Direction> for SqlOrder {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Asc => SqlOrder::Asc,
            Direction::Desc => SqlOrder::Desc,
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub property: String,
    pub direction: Direction,
}

impl Order {
    pub fn new(property: impl Into<String>, direction: Direction) -> Self {
        Self {
            property: property.into(),
            direction,
        }
    }

    /// Parse the `sort` parameter: `name,-age` sorts by name ascending, then
    /// age descending. Keys keep their given order; empty segments are
    /// skipped.
    #[must_use]
    pub fn parse_list(raw: &str) -> Vec<Self> {
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty() && *part != "-")
            .map(|part| match part.strip_prefix('-') {
                Some(property) => Self::new(property, Direction::Desc),
                None => Self::new(part, Direction::Asc),
            })
            .collect()
    }

    #[must_use]
    pub fn has_prefix(&self) -> bool {
        self.property.contains('.')
    }

    pub fn add_prefix(&mut self, alias: &str) {
        self.property = format!("{alias}.{}", self.property);
    }
}
