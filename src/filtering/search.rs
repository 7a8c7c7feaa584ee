use sea_orm::sea_query::{Alias, Condition, Expr, Func, LikeExpr};

// Basic safety limits
const MAX_SEARCH_QUERY_LENGTH: usize = 10_000;

/// Escape LIKE wildcards so user text matches literally.
/// Escapes: % (match any), _ (match single char) and the escape char itself
#[must_use]
pub fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\") // Escape backslash first
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Build the free-text condition: an OR group of
/// `UPPER(alias.col) LIKE '%QUERY%' ESCAPE '\'` over `columns`.
///
/// Returns `None` for a blank query or when nothing is searchable.
#[must_use]
pub fn build_free_text_condition(alias: &str, columns: &[String], query: &str) -> Option<Condition> {
    let truncated: String = query.chars().take(MAX_SEARCH_QUERY_LENGTH).collect();
    let trimmed = truncated.trim();
    if trimmed.is_empty() || columns.is_empty() {
        return None;
    }

    let pattern = format!("%{}%", escape_like_wildcards(trimmed).to_uppercase());

    let condition = columns.iter().fold(Condition::any(), |condition, column| {
        condition.add(
            Expr::expr(Func::upper(Expr::col((Alias::new(alias), Alias::new(column)))))
                .like(LikeExpr::new(pattern.clone()).escape('\\')),
        )
    });

    Some(condition)
}
