use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::page::{Labels, Page, PageRequest};
use super::query::{take, Total};
use super::{Database, Record, Result, Table};

/// A projected column, `expr AS alias`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub expr: &'static str,
    pub alias: &'static str,
}

impl Field {
    pub const fn new(expr: &'static str, alias: &'static str) -> Self {
        Self { expr, alias }
    }

    /// A column selected under its own name.
    pub const fn plain(name: &'static str) -> Self {
        Self::new(name, name)
    }

    fn render(&self) -> String {
        if self.expr == self.alias {
            self.expr.to_string()
        } else {
            format!("{} AS {}", self.expr, self.alias)
        }
    }
}

/// Match stage. Every value is bound as a parameter, only field and table names are inlined.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equals { field: &'static str, value: Value },
    Links { field: &'static str, table: &'static str, id: String },
    /// Case-insensitive substring match over any of `fields`.
    Search { fields: &'static [&'static str], needle: String },
    Any(Vec<Filter>),
}

impl Filter {
    pub fn equals(field: &'static str, value: impl Into<Value>) -> Self {
        Filter::Equals {
            field,
            value: value.into(),
        }
    }

    pub fn links<T: Table>(field: &'static str, record: &Record<T>) -> Self {
        Filter::Links {
            field,
            table: T::table(),
            id: record.key(),
        }
    }

    pub fn search(fields: &'static [&'static str], needle: &str) -> Self {
        Filter::Search {
            fields,
            needle: needle.to_lowercase(),
        }
    }

    fn render(&self, params: &mut Params) -> String {
        match self {
            Filter::Equals { field, value } => {
                let name = params.push(value.clone());
                format!("{field} = ${name}")
            }
            Filter::Links { field, table, id } => {
                let name = params.push(Value::String(id.clone()));
                format!("{field} = type::thing('{table}', ${name})")
            }
            Filter::Search { fields, needle } => {
                let name = params.push(Value::String(needle.clone()));
                let clauses: Vec<_> = fields
                    .iter()
                    .map(|field| format!("string::contains(string::lowercase({field}), ${name})"))
                    .collect();
                format!("({})", clauses.join(" OR "))
            }
            Filter::Any(filters) if filters.is_empty() => "false".to_string(),
            Filter::Any(filters) => {
                let clauses: Vec<_> = filters.iter().map(|filter| filter.render(params)).collect();
                format!("({})", clauses.join(" OR "))
            }
        }
    }
}

/// Join stage: replaces a `users` link with the embedded summary `{id, username, fullName, avatar}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    field: &'static str,
    alias: &'static str,
}

impl Lookup {
    pub const fn user(field: &'static str, alias: &'static str) -> Self {
        Self { field, alias }
    }

    pub const fn owner() -> Self {
        Self::user("owner", "owner")
    }

    fn render(&self) -> String {
        let Lookup { field, alias } = self;
        format!(
            "{{ id: meta::id({field}), username: {field}.username, fullName: {field}.full_name, avatar: {field}.avatar }} AS {alias}"
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Accepts `asc`/`1` and `desc`/`-1`, anything else is descending.
    pub fn parse(input: Option<&str>) -> Self {
        match input.map(str::trim) {
            Some(order) if order.eq_ignore_ascii_case("asc") || order == "1" => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: &'static str,
    pub order: SortOrder,
}

impl Default for Sort {
    fn default() -> Self {
        Self::new("createdAt", SortOrder::Desc)
    }
}

impl Sort {
    pub const fn new(field: &'static str, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Picks `requested` out of `allowed`. Unknown or missing keys fall back to [Sort::default].
    pub fn resolve(requested: Option<&str>, order: SortOrder, allowed: &[&'static str]) -> Self {
        requested
            .and_then(|key| allowed.iter().find(|field| **field == key.trim()))
            .map(|field| Self::new(*field, order))
            .unwrap_or_default()
    }

    fn render(&self) -> String {
        format!("ORDER BY {} {}, id {}", self.field, self.order.keyword(), self.order.keyword())
    }
}

#[derive(Debug, Default)]
struct Params {
    values: BTreeMap<String, Value>,
}

impl Params {
    fn push(&mut self, value: Value) -> String {
        let name = format!("p{}", self.values.len());
        self.values.insert(name.clone(), value);
        name
    }
}

/// A read pipeline over one table: match, lookup, project, sort, then either paginate or fetch everything.
///
/// ```ignore
/// let page: Page<VideoView> = Pipeline::new("videos", VIDEO_FIELDS)
///     .filter(Filter::equals("is_published", true))
///     .lookup(Lookup::owner())
///     .sort(Sort::default())
///     .paginate(request, Labels::VIDEOS, &db)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    table: &'static str,
    fields: &'static [Field],
    filters: Vec<Filter>,
    lookups: Vec<Lookup>,
    sort: Sort,
}

impl Pipeline {
    pub fn new(table: &'static str, fields: &'static [Field]) -> Self {
        Self {
            table,
            fields,
            filters: Vec::new(),
            lookups: Vec::new(),
            sort: Sort::default(),
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn lookup(mut self, lookup: Lookup) -> Self {
        self.lookups.push(lookup);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// The projection, usable on its own for sources other than the table (record lists, subqueries).
    pub fn select_clause(&self) -> String {
        self.fields
            .iter()
            .map(Field::render)
            .chain(self.lookups.iter().map(Lookup::render))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn where_clause(&self, params: &mut Params) -> String {
        if self.filters.is_empty() {
            return String::new();
        }

        let clauses: Vec<_> = self.filters.iter().map(|filter| filter.render(params)).collect();
        format!(" WHERE {}", clauses.join(" AND "))
    }

    fn render_page(&self) -> (String, Params) {
        let mut params = Params::default();
        let condition = self.where_clause(&mut params);
        let query = format!(
            "SELECT {select} FROM {table}{condition} {sort} LIMIT $limit START $start;\
             SELECT count() AS total FROM {table}{condition} GROUP ALL;",
            select = self.select_clause(),
            table = self.table,
            sort = self.sort.render(),
        );
        (query, params)
    }

    fn render_all(&self) -> (String, Params) {
        let mut params = Params::default();
        let condition = self.where_clause(&mut params);
        let query = format!(
            "SELECT {select} FROM {table}{condition} {sort};",
            select = self.select_clause(),
            table = self.table,
            sort = self.sort.render(),
        );
        (query, params)
    }

    /// Runs the page and the matching count as one query.
    #[tracing::instrument(skip(self, db), fields(table = self.table))]
    pub async fn paginate<T: DeserializeOwned>(
        &self, request: PageRequest, labels: Labels, db: &Database,
    ) -> Result<Page<T>> {
        let (query, params) = self.render_page();
        let mut response = db
            .sql(query)
            .bind(params.values)
            .bind(("limit", request.limit))
            .bind(("start", request.start()))
            .execute()
            .await?;

        let items: Vec<T> = take(&mut response, 0)?;
        let total = Total::of(take(&mut response, 1)?);
        tracing::debug!(items = items.len(), total, "paginated");

        Ok(Page::new(items, total, request, labels))
    }

    #[tracing::instrument(skip(self, db), fields(table = self.table))]
    pub async fn fetch_all<T: DeserializeOwned>(&self, db: &Database) -> Result<Vec<T>> {
        let (query, params) = self.render_all();
        db.sql(query).bind(params.values).fetch_first().await
    }

    /// Projects a single record, ignoring the filters and sort.
    #[tracing::instrument(skip(self, db), fields(table = self.table))]
    pub async fn fetch_record<T: DeserializeOwned, R: Table>(
        &self, record: &Record<R>, db: &Database,
    ) -> Result<Option<T>> {
        let query = format!(
            "SELECT {select} FROM type::thing('{table}', $record);",
            select = self.select_clause(),
            table = self.table,
        );
        db.sql(query).bind(("record", record.key())).fetch_first().await
    }
}
