use sea_orm::JoinType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
}

impl From<JoinKind> for JoinType {
    fn from(kind: JoinKind) -> Self {
        match kind {
            JoinKind::Inner => JoinType::InnerJoin,
            JoinKind::Left => JoinType::LeftJoin,
        }
    }
}

/// A relation to join, addressed as `<parent alias>.<relation>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub path: String,
    pub alias: String,
    pub kind: JoinKind,
}

impl Join {
    /// Parse one token of the `join` parameter.
    ///
    /// `team` joins the root's `team` relation as alias `team`;
    /// `team.members-l` left joins `members` of the already joined `team`
    /// alias as `members`. Only the `-l` suffix selects a left join.
    #[must_use]
    pub fn parse(token: &str, root_alias: &str) -> Option<Self> {
        let token = token.trim();
        let (name, suffix) = match token.split_once('-') {
            Some((name, suffix)) => (name, Some(suffix)),
            None => (token, None),
        };
        if name.is_empty() {
            return None;
        }

        let kind = if suffix == Some("l") {
            JoinKind::Left
        } else {
            JoinKind::Inner
        };

        let (path, alias) = match name.rsplit_once('.') {
            Some((_, alias)) => (name.to_string(), alias.to_string()),
            None => (format!("{root_alias}.{name}"), name.to_string()),
        };

        Some(Self { path, alias, kind })
    }

    /// Parse a comma-separated `join` value, skipping empty segments.
    #[must_use]
    pub fn parse_list(raw: &str, root_alias: &str) -> Vec<Self> {
        raw.split(',')
            .filter_map(|token| Self::parse(token, root_alias))
            .collect()
    }

    /// Parent alias and relation name of the path
    #[must_use]
    pub fn parent_and_relation(&self) -> Option<(&str, &str)> {
        self.path.split_once('.')
    }
}
