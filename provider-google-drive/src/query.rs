//! Drive `q=` search expressions

use crate::backend::{NodeKind, NodeQuery, FOLDER_MIME_TYPE};

/// Escape a value for use inside a single-quoted query string literal.
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Build the search expression for a scoped child lookup.
///
/// ```
/// use provider_google_drive::backend::{NodeId, NodeQuery};
/// use provider_google_drive::query::build_query;
///
/// let q = build_query(&NodeQuery::new("it's", NodeId::root()).folders_only());
/// assert_eq!(
///     q,
///     "name = 'it\\'s' and 'root' in parents and trashed = false \
///      and mimeType = 'application/vnd.google-apps.folder'"
/// );
/// ```
pub fn build_query(query: &NodeQuery) -> String {
    let mut q = format!(
        "name = '{}' and '{}' in parents and trashed = false",
        escape_literal(&query.name),
        escape_literal(query.parent_id.as_str())
    );
    if query.kind == Some(NodeKind::Folder) {
        q.push_str(&format!(" and mimeType = '{}'", FOLDER_MIME_TYPE));
    }
    q
}
