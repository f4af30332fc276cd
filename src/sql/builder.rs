//! Builds parameterized SELECT, INSERT, UPDATE, DELETE for a catalog resource.
//!
//! Identifiers come from the validated catalog only; values are always parameters. Rows are
//! returned as a single `jsonb` column so the store never maps columns by hand.

use crate::config::{PkType, ResourceConfig};
use crate::pagination::SortDirection;
use crate::store::{Filter, Scope};

const ALIAS: &str = "t";
const DELETED_AT: &str = "deleted_at";
const UPDATED_AT: &str = "updated_at";

/// Quote identifier for PostgreSQL (safe: only from config).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
fn qualified_table(r: &ResourceConfig) -> String {
    format!("{}.{}", quoted(&r.schema), quoted(&r.table))
}

/// `FROM schema.table t`.
fn from_clause(r: &ResourceConfig) -> String {
    format!("{} {}", qualified_table(r), ALIAS)
}

fn column(name: &str) -> String {
    format!("{}.{}", ALIAS, quoted(name))
}

/// Id parameter cast to the key type; ids are bound as text.
fn id_param(r: &ResourceConfig, n: u32) -> String {
    match r.pk_type {
        PkType::Int => format!("${}::bigint", n),
        PkType::Uuid => format!("${}::uuid", n),
    }
}

/// SQL text plus its text parameters, numbered after any fixed leading ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<String>,
}

/// `ILIKE` pattern matching `text` anywhere, with wildcards in `text` taken literally.
pub fn contains_pattern(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Visibility for `scope` and every `filter` condition, with parameters from `$first` on.
fn conditions(r: &ResourceConfig, scope: Scope, filter: &Filter, first: usize) -> (String, Vec<String>) {
    let mut parts = vec![visibility(r, scope)];
    let mut params: Vec<String> = Vec::new();
    let next = |value: String, params: &mut Vec<String>| {
        params.push(value);
        format!("${}", first + params.len() - 1)
    };

    for (col, values) in &filter.equals {
        let placeholders: Vec<String> = values.iter().map(|v| next(v.clone(), &mut params)).collect();
        parts.push(match placeholders.as_slice() {
            [one] => format!("{}::text = {}", column(col), one),
            many => format!("{}::text IN ({})", column(col), many.join(", ")),
        });
    }
    if let Some((cols, text)) = &filter.search {
        let p = next(contains_pattern(text), &mut params);
        let any: Vec<String> = cols
            .iter()
            .map(|c| format!("{}::text ILIKE {}", column(c), p))
            .collect();
        parts.push(format!("({})", any.join(" OR ")));
    }
    if let Some(range) = &filter.range {
        if let Some(min) = range.min {
            let p = next(min.to_string(), &mut params);
            parts.push(format!("{} >= {}::numeric", column(&range.column), p));
        }
        if let Some(max) = range.max {
            let p = next(max.to_string(), &mut params);
            parts.push(format!("{} <= {}::numeric", column(&range.column), p));
        }
    }
    (parts.join(" AND "), params)
}

/// Visibility predicates for `scope`; `TRUE` when nothing applies.
fn visibility(r: &ResourceConfig, scope: Scope) -> String {
    let mut parts = Vec::new();
    if r.soft_delete {
        parts.push(format!("{} IS NULL", column(DELETED_AT)));
    }
    if let (Scope::Active, Some(active)) = (scope, r.active_column.as_deref()) {
        parts.push(format!("{} IS TRUE", column(active)));
    }
    if parts.is_empty() {
        "TRUE".into()
    } else {
        parts.join(" AND ")
    }
}

/// Page query. `$1` = limit, `$2` = offset, filter parameters from `$3`. The primary key breaks
/// ties so pages are stable.
pub fn select_page(
    r: &ResourceConfig,
    scope: Scope,
    filter: &Filter,
    sort_column: &str,
    direction: SortDirection,
) -> Statement {
    let (conds, params) = conditions(r, scope, filter, 3);
    let sql = format!(
        "SELECT to_jsonb({a}) FROM {from} WHERE {conds} ORDER BY {sort} {dir}, {pk} {dir} LIMIT $1 OFFSET $2",
        a = ALIAS,
        from = from_clause(r),
        sort = column(sort_column),
        dir = direction.as_sql(),
        pk = column(&r.primary_key),
    );
    Statement { sql, params }
}

pub fn count(r: &ResourceConfig, scope: Scope, filter: &Filter) -> Statement {
    let (conds, params) = conditions(r, scope, filter, 1);
    Statement {
        sql: format!("SELECT COUNT(*) FROM {} WHERE {}", from_clause(r), conds),
        params,
    }
}

/// Every matching row in the resource's default order.
pub fn select_all(r: &ResourceConfig, scope: Scope, filter: &Filter) -> Statement {
    let (conds, params) = conditions(r, scope, filter, 1);
    let sql = format!(
        "SELECT to_jsonb({a}) FROM {from} WHERE {conds} ORDER BY {sort} {dir}, {pk} {dir}",
        a = ALIAS,
        from = from_clause(r),
        sort = column(r.sort_column("")),
        dir = r.default_order.as_sql(),
        pk = column(&r.primary_key),
    );
    Statement { sql, params }
}

/// `$1` = value, compared as text.
pub fn select_by_column(r: &ResourceConfig, scope: Scope, col: &str) -> String {
    format!(
        "SELECT to_jsonb({a}) FROM {from} WHERE {col}::text = $1 AND {vis} ORDER BY {pk} LIMIT 1",
        a = ALIAS,
        from = from_clause(r),
        col = column(col),
        vis = visibility(r, scope),
        pk = column(&r.primary_key),
    )
}

/// `$1` = id.
pub fn select_by_id(r: &ResourceConfig, scope: Scope) -> String {
    format!(
        "SELECT to_jsonb({a}) FROM {from} WHERE {pk} = {id} AND {vis}",
        a = ALIAS,
        from = from_clause(r),
        pk = column(&r.primary_key),
        id = id_param(r, 1),
        vis = visibility(r, scope),
    )
}

/// `$1` = JSON object; columns are typed by the table's own row type.
pub fn insert(r: &ResourceConfig, columns: &[&str]) -> String {
    let target: Vec<String> = columns.iter().map(|c| quoted(c)).collect();
    let source: Vec<String> = columns.iter().map(|c| format!("src.{}", quoted(c))).collect();
    format!(
        "INSERT INTO {table} AS {a} ({target}) SELECT {source} FROM jsonb_populate_record(NULL::{table}, $1) AS src RETURNING to_jsonb({a}.*)",
        table = qualified_table(r),
        a = ALIAS,
        target = target.join(", "),
        source = source.join(", "),
    )
}

/// `$1` = id, `$2` = JSON object with the columns to set.
pub fn update(r: &ResourceConfig, columns: &[&str]) -> String {
    let mut sets: Vec<String> = columns
        .iter()
        .map(|c| format!("{} = src.{}", quoted(c), quoted(c)))
        .collect();
    if r.timestamps {
        sets.push(format!("{} = NOW()", quoted(UPDATED_AT)));
    }
    format!(
        "UPDATE {table} AS {a} SET {sets} FROM jsonb_populate_record(NULL::{table}, $2) AS src WHERE {pk} = {id} AND {vis} RETURNING to_jsonb({a}.*)",
        table = qualified_table(r),
        a = ALIAS,
        sets = sets.join(", "),
        pk = column(&r.primary_key),
        id = id_param(r, 1),
        vis = visibility(r, Scope::All),
    )
}

/// `$1` = id. Soft delete stamps `deleted_at`; otherwise the row is removed.
pub fn delete(r: &ResourceConfig) -> String {
    if r.soft_delete {
        format!(
            "UPDATE {table} AS {a} SET {deleted} = NOW() WHERE {pk} = {id} AND {col} IS NULL",
            table = qualified_table(r),
            a = ALIAS,
            deleted = quoted(DELETED_AT),
            pk = column(&r.primary_key),
            id = id_param(r, 1),
            col = column(DELETED_AT),
        )
    } else {
        format!(
            "DELETE FROM {} WHERE {} = {}",
            from_clause(r),
            column(&r.primary_key),
            id_param(r, 1)
        )
    }
}

/// `$1` = id. Only meaningful for soft-deleting resources.
pub fn restore(r: &ResourceConfig) -> String {
    format!(
        "UPDATE {table} AS {a} SET {deleted} = NULL WHERE {pk} = {id} AND {col} IS NOT NULL",
        table = qualified_table(r),
        a = ALIAS,
        deleted = quoted(DELETED_AT),
        pk = column(&r.primary_key),
        id = id_param(r, 1),
        col = column(DELETED_AT),
    )
}
