//! Admin list query planning
//!
//! The admin tables send free-text search, filters, sort and paging as loose
//! query-string values. [`ListPlan`] normalizes them once, independent of the
//! backend, and the `push_*` functions render the plan into a sqlx
//! [`QueryBuilder`] for whichever driver the repository is running on.
//! Columns only ever come from the allow-lists below; user text is always
//! bound.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sqlx::{Database, Encode, QueryBuilder, Type};

use crate::models::{parse_flag, ContactListQuery, ContactSource, ModelListQuery, PageRequest};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `asc` (any case) is ascending, everything else descending
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "asc" => Self::Asc,
            _ => Self::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A sortable column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortColumn {
    pub column: &'static str,
    /// Text columns sort case-insensitively
    pub text: bool,
}

const CREATED_AT: SortColumn = SortColumn {
    column: "created_at",
    text: false,
};

/// `(accepted names, column)` for models
const MODEL_SORTS: &[(&[&str], SortColumn)] = &[
    (&["created_at", "fecha", "createdat"], CREATED_AT),
    (&["name", "nombre"], SortColumn { column: "name", text: true }),
    (&["surname", "apellido"], SortColumn { column: "surname", text: true }),
    (&["city", "ciudad"], SortColumn { column: "city", text: true }),
    (&["age", "edad"], SortColumn { column: "age", text: false }),
];

/// `(accepted names, column)` for contacts
const CONTACT_SORTS: &[(&[&str], SortColumn)] = &[
    (&["created_at", "fecha", "createdat"], CREATED_AT),
    (&["name", "nombre"], SortColumn { column: "name", text: true }),
    (&["email"], SortColumn { column: "email", text: true }),
    (&["company", "empresa"], SortColumn { column: "company", text: true }),
];

/// Columns searched by `q`
pub const MODEL_SEARCH_COLUMNS: &[&str] = &["name", "surname", "email", "phone", "city"];
pub const CONTACT_SEARCH_COLUMNS: &[&str] = &["name", "email", "phone", "company", "message"];

fn resolve_sort(table: &[(&[&str], SortColumn)], raw: Option<&str>) -> SortColumn {
    let Some(raw) = raw else {
        return CREATED_AT;
    };
    let key = raw.trim().to_ascii_lowercase();
    table
        .iter()
        .find(|(names, _)| names.contains(&key.as_str()))
        .map(|(_, col)| *col)
        .unwrap_or(CREATED_AT)
}

/// A normalized WHERE condition
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Case-insensitive substring match OR'd across columns. `pattern` is
    /// already escaped and wrapped in `%`.
    Search {
        columns: &'static [&'static str],
        pattern: String,
    },
    /// Case-insensitive equality
    TextEquals { column: &'static str, value: String },
    /// Exact equality on a stored keyword
    Keyword { column: &'static str, value: String },
    Flag { column: &'static str, value: bool },
    /// `column >= value`
    Since { column: &'static str, value: DateTime<Utc> },
    /// `column < value`
    Before { column: &'static str, value: DateTime<Utc> },
}

/// Backend-neutral admin list query
#[derive(Debug, Clone, PartialEq)]
pub struct ListPlan {
    pub filters: Vec<Filter>,
    pub sort: SortColumn,
    pub direction: SortDirection,
    pub page: PageRequest,
}

impl ListPlan {
    /// Plan for `GET /api/admin/modelos`
    pub fn for_models(query: &ModelListQuery) -> Self {
        let mut filters = Vec::new();

        if let Some(pattern) = query.q.as_deref().and_then(like_pattern) {
            filters.push(Filter::Search {
                columns: MODEL_SEARCH_COLUMNS,
                pattern,
            });
        }
        if let Some(city) = non_blank(query.ciudad.as_deref()) {
            filters.push(Filter::TextEquals {
                column: "city",
                value: city.to_string(),
            });
        }
        if let Some(active) = query.activa.as_deref().and_then(parse_flag) {
            filters.push(Filter::Flag {
                column: "active",
                value: active,
            });
        }

        Self {
            filters,
            sort: resolve_sort(MODEL_SORTS, query.sort_by.as_deref()),
            direction: SortDirection::parse(query.sort_dir.as_deref()),
            page: PageRequest::from_raw(query.page.as_deref(), query.page_size.as_deref()),
        }
    }

    /// Plan for `GET /api/admin/contactos`
    pub fn for_contacts(query: &ContactListQuery) -> Self {
        let mut filters = Vec::new();

        if let Some(pattern) = query.q.as_deref().and_then(like_pattern) {
            filters.push(Filter::Search {
                columns: CONTACT_SEARCH_COLUMNS,
                pattern,
            });
        }
        if let Some(source) = query.origen.as_deref().and_then(ContactSource::parse) {
            filters.push(Filter::Keyword {
                column: "source",
                value: source.as_str().to_string(),
            });
        }
        if let Some(from) = query.from.as_deref().and_then(day_start) {
            filters.push(Filter::Since {
                column: "created_at",
                value: from,
            });
        }
        if let Some(to) = query.to.as_deref().and_then(day_end_exclusive) {
            filters.push(Filter::Before {
                column: "created_at",
                value: to,
            });
        }

        Self {
            filters,
            sort: resolve_sort(CONTACT_SORTS, query.sort_by.as_deref()),
            direction: SortDirection::parse(query.sort_dir.as_deref()),
            page: PageRequest::from_raw(query.page.as_deref(), query.page_size.as_deref()),
        }
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// `%text%` with LIKE metacharacters escaped by `\`. Blank input means no
/// search.
pub fn like_pattern(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let mut pattern = String::with_capacity(raw.len() + 2);
    pattern.push('%');
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Midnight UTC at the start of the day
fn day_start(raw: &str) -> Option<DateTime<Utc>> {
    let day = parse_day(raw)?;
    Some(Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0)?))
}

/// Midnight UTC at the start of the following day
fn day_end_exclusive(raw: &str) -> Option<DateTime<Utc>> {
    let next = parse_day(raw)?.succ_opt()?;
    Some(Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0)?))
}

/// Append ` WHERE ...` for the plan's filters (nothing when there are none)
pub fn push_filters<'args, DB>(qb: &mut QueryBuilder<'args, DB>, filters: &[Filter])
where
    DB: Database,
    String: Encode<'args, DB> + Type<DB>,
    bool: Encode<'args, DB> + Type<DB>,
    DateTime<Utc>: Encode<'args, DB> + Type<DB>,
{
    for (i, filter) in filters.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        match filter {
            Filter::Search { columns, pattern } => {
                qb.push("(");
                for (j, column) in columns.iter().enumerate() {
                    if j > 0 {
                        qb.push(" OR ");
                    }
                    qb.push(format_args!("LOWER({}) LIKE LOWER(", column));
                    qb.push_bind(pattern.clone());
                    qb.push(") ESCAPE '\\'");
                }
                qb.push(")");
            }
            Filter::TextEquals { column, value } => {
                qb.push(format_args!("LOWER({}) = LOWER(", column));
                qb.push_bind(value.clone());
                qb.push(")");
            }
            Filter::Keyword { column, value } => {
                qb.push(format_args!("{} = ", column));
                qb.push_bind(value.clone());
            }
            Filter::Flag { column, value } => {
                qb.push(format_args!("{} = ", column));
                qb.push_bind(*value);
            }
            Filter::Since { column, value } => {
                qb.push(format_args!("{} >= ", column));
                qb.push_bind(*value);
            }
            Filter::Before { column, value } => {
                qb.push(format_args!("{} < ", column));
                qb.push_bind(*value);
            }
        }
    }
}

/// Append ` ORDER BY ...`. NULLs sort last in both directions and `id DESC`
/// breaks ties so pages never overlap.
pub fn push_order_by<'args, DB>(qb: &mut QueryBuilder<'args, DB>, plan: &ListPlan)
where
    DB: Database,
{
    let SortColumn { column, text } = plan.sort;
    if text {
        qb.push(format_args!(" ORDER BY LOWER({})", column));
    } else {
        qb.push(format_args!(" ORDER BY {}", column));
    }
    qb.push(format_args!(" {} NULLS LAST, id DESC", plan.direction.as_sql()));
}

/// Append ` LIMIT .. OFFSET ..` for the plan's page
pub fn push_page<'args, DB>(qb: &mut QueryBuilder<'args, DB>, plan: &ListPlan)
where
    DB: Database,
    i64: Encode<'args, DB> + Type<DB>,
{
    qb.push(" LIMIT ");
    qb.push_bind(plan.page.limit());
    qb.push(" OFFSET ");
    qb.push_bind(plan.page.offset());
}
