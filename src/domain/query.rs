// Query/filter composition for visualization queries (PPL)
use chrono::{DateTime, Utc};

use super::datemath::to_query_timestamp;
use super::panel::TimeRange;

/// Build the effective `where` expression for a visualization.
///
/// Every non-blank base filter becomes a clause, the free-text query is
/// appended as one more, and the time window is scoped to `time_field`.
/// Clauses are AND-combined in that order. A blank `time_field` means the
/// visualization is not time-based and gets no time clause. Bound ordering
/// is never checked here.
pub fn compose_effective_query(
    base_filters: &[String],
    free_text: &str,
    range: &TimeRange,
    time_field: &str,
    now: DateTime<Utc>,
) -> String {
    let mut clauses: Vec<String> = base_filters
        .iter()
        .filter_map(|f| clause(f))
        .collect();

    if let Some(free) = clause(free_text) {
        clauses.push(free);
    }

    if let Some(time_clause) = time_clause(range, time_field, now) {
        clauses.push(time_clause);
    }

    match clauses.len() {
        0 => String::new(),
        1 => clauses.remove(0),
        _ => clauses
            .iter()
            .map(|c| format!("({})", c))
            .collect::<Vec<_>>()
            .join(" and "),
    }
}

/// Time window only, for previews that must ignore ad-hoc filters
pub fn compose_time_only(range: &TimeRange, time_field: &str, now: DateTime<Utc>) -> String {
    compose_effective_query(&[], "", range, time_field, now)
}

/// Splice a `where` expression right after the `source=...` command of a
/// query, leaving the rest of the pipeline intact.
pub fn apply_where(base_query: &str, expression: &str) -> String {
    let base_query = base_query.trim();
    if expression.is_empty() {
        return base_query.to_string();
    }

    match base_query.split_once('|') {
        Some((source, rest)) => format!(
            "{} | where {} | {}",
            source.trim_end(),
            expression,
            rest.trim_start()
        ),
        None => format!("{} | where {}", base_query, expression),
    }
}

fn time_clause(range: &TimeRange, time_field: &str, now: DateTime<Utc>) -> Option<String> {
    let field = time_field.trim();
    if field.is_empty() {
        return None;
    }
    Some(format!(
        "{field} >= '{}' and {field} <= '{}'",
        to_query_timestamp(&range.from, false, now),
        to_query_timestamp(&range.to, true, now),
    ))
}

/// Normalize a filter fragment, dropping a leading `where` keyword
fn clause(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('|').trim_start();
    let body = match trimmed.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("where ") => &trimmed[6..],
        _ => trimmed,
    };
    let body = body.trim();
    (!body.is_empty()).then(|| body.to_string())
}
