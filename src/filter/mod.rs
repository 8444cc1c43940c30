//! Wine list query filtering.
//!
//! Parses the list endpoint's query parameters into typed bounds and
//! compiles them to a SQL clause with numbered placeholders and a typed
//! bind list. The rating aggregate is formed by grouping the review join
//! before any rating bound applies, so duplicate join rows can never skew
//! the average and the result set needs no separate de-duplication.

use std::collections::HashMap;

use thiserror::Error;

use crate::config;

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("invalid number for {param}: '{value}'")]
    InvalidNumber { param: String, value: String },
}

/// A value bound to a `$n` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Float(f64),
    Int(i64),
}

/// Parsed list-endpoint filters. Every bound is independently optional;
/// absent bounds impose no constraint and present bounds are ANDed.
#[derive(Debug, Clone, Default)]
pub struct WineFilters {
    pub title: Option<String>,
    pub wine_type: Option<String>,
    pub grape: Option<String>,
    pub country: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_abv: Option<f64>,
    pub max_abv: Option<f64>,
    pub min_capacity: Option<f64>,
    pub max_capacity: Option<f64>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Compiled list query: SQL text plus binds in placeholder order
#[derive(Debug)]
pub struct CompiledQuery {
    pub sql: String,
    pub binds: Vec<BindValue>,
}

fn parse_float(params: &HashMap<String, String>, key: &str) -> Result<Option<f64>, FilterError> {
    match params.get(key) {
        None => Ok(None),
        Some(raw) => raw.parse::<f64>().map(Some).map_err(|_| FilterError::InvalidNumber {
            param: key.to_string(),
            value: raw.clone(),
        }),
    }
}

fn parse_int(params: &HashMap<String, String>, key: &str) -> Result<Option<i64>, FilterError> {
    match params.get(key) {
        None => Ok(None),
        Some(raw) => raw.parse::<i64>().map(Some).map_err(|_| FilterError::InvalidNumber {
            param: key.to_string(),
            value: raw.clone(),
        }),
    }
}

impl WineFilters {
    /// Parse from raw query parameters. Unknown parameters are ignored;
    /// malformed numeric values are a client error, never a silent ignore.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, FilterError> {
        Ok(Self {
            title: params.get("title").cloned(),
            wine_type: params.get("wine_type").cloned(),
            grape: params.get("grape").cloned(),
            country: params.get("country").cloned(),
            min_price: parse_float(params, "min_price")?,
            max_price: parse_float(params, "max_price")?,
            min_abv: parse_float(params, "min_abv")?,
            max_abv: parse_float(params, "max_abv")?,
            min_capacity: parse_float(params, "min_capacity")?,
            max_capacity: parse_float(params, "max_capacity")?,
            min_rating: parse_float(params, "min_rating")?,
            max_rating: parse_float(params, "max_rating")?,
            limit: parse_int(params, "limit")?,
            offset: parse_int(params, "offset")?,
        })
    }

    /// Page size after applying the configured default and ceiling
    pub fn page_limit(&self) -> i64 {
        let api = &config::config().api;
        self.limit
            .unwrap_or(api.default_page_size)
            .clamp(1, api.max_page_size)
    }

    pub fn page_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Compile to the list query. Bounds are inclusive; rating bounds go in
    /// HAVING because they constrain the aggregate, not a stored column.
    pub fn compile(&self) -> CompiledQuery {
        let mut builder = ClauseBuilder::new();

        if let Some(title) = &self.title {
            let p = builder.bind(BindValue::Text(format!("%{}%", title)));
            builder.where_clause(format!("w.title ILIKE {}", p));
        }
        if let Some(wine_type) = &self.wine_type {
            let p = builder.bind(BindValue::Text(wine_type.clone()));
            builder.where_clause(format!("LOWER(w.wine_type) = LOWER({})", p));
        }
        if let Some(grape) = &self.grape {
            let p = builder.bind(BindValue::Text(format!("%{}%", grape)));
            builder.where_clause(format!("w.grape ILIKE {}", p));
        }
        if let Some(country) = &self.country {
            let p = builder.bind(BindValue::Text(country.clone()));
            builder.where_clause(format!("LOWER(w.country) = LOWER({})", p));
        }

        builder.bound("w.price", ">=", self.min_price);
        builder.bound("w.price", "<=", self.max_price);
        builder.bound("w.abv", ">=", self.min_abv);
        builder.bound("w.abv", "<=", self.max_abv);
        builder.bound("w.capacity", ">=", self.min_capacity);
        builder.bound("w.capacity", "<=", self.max_capacity);

        if let Some(min_rating) = self.min_rating {
            let p = builder.bind(BindValue::Float(min_rating));
            builder.having_clause(format!("AVG(r.rating) >= {}", p));
        }
        if let Some(max_rating) = self.max_rating {
            let p = builder.bind(BindValue::Float(max_rating));
            builder.having_clause(format!("AVG(r.rating) <= {}", p));
        }

        let limit = builder.bind(BindValue::Int(self.page_limit()));
        let offset = builder.bind(BindValue::Int(self.page_offset()));

        let mut sql = String::from(
            "SELECT w.id, w.title, w.vintage, w.price, w.image, \
             AVG(r.rating)::float8 AS average_rating \
             FROM wines w \
             LEFT JOIN wine_reviews r ON r.wine_id = w.id",
        );
        if !builder.where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&builder.where_clauses.join(" AND "));
        }
        sql.push_str(" GROUP BY w.id");
        if !builder.having_clauses.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&builder.having_clauses.join(" AND "));
        }
        sql.push_str(&format!(" ORDER BY w.title, w.id LIMIT {} OFFSET {}", limit, offset));

        CompiledQuery {
            sql,
            binds: builder.binds,
        }
    }
}

/// Accumulates conditions and numbered binds in placeholder order
struct ClauseBuilder {
    where_clauses: Vec<String>,
    having_clauses: Vec<String>,
    binds: Vec<BindValue>,
}

impl ClauseBuilder {
    fn new() -> Self {
        Self {
            where_clauses: vec![],
            having_clauses: vec![],
            binds: vec![],
        }
    }

    fn bind(&mut self, value: BindValue) -> String {
        self.binds.push(value);
        format!("${}", self.binds.len())
    }

    fn where_clause(&mut self, clause: String) {
        self.where_clauses.push(clause);
    }

    fn having_clause(&mut self, clause: String) {
        self.having_clauses.push(clause);
    }

    fn bound(&mut self, column: &str, op: &str, value: Option<f64>) {
        if let Some(value) = value {
            let p = self.bind(BindValue::Float(value));
            self.where_clauses.push(format!("{} {} {}", column, op, p));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn no_filters_compiles_to_plain_aggregate_query() {
        let filters = WineFilters::from_params(&params(&[])).unwrap();
        let q = filters.compile();

        assert!(!q.sql.contains("WHERE"));
        assert!(!q.sql.contains("HAVING"));
        assert!(q.sql.contains("LEFT JOIN wine_reviews"));
        assert!(q.sql.contains("GROUP BY w.id"));
        // Only limit and offset are bound
        assert_eq!(q.binds.len(), 2);
    }

    #[test]
    fn title_is_case_insensitive_substring() {
        let filters = WineFilters::from_params(&params(&[("title", "Laurent")])).unwrap();
        let q = filters.compile();

        assert!(q.sql.contains("w.title ILIKE $1"));
        assert_eq!(q.binds[0], BindValue::Text("%Laurent%".to_string()));
    }

    #[test]
    fn country_and_type_are_exact_case_insensitive() {
        let filters =
            WineFilters::from_params(&params(&[("country", "France"), ("wine_type", "Red")]))
                .unwrap();
        let q = filters.compile();

        assert!(q.sql.contains("LOWER(w.wine_type) = LOWER($1)"));
        assert!(q.sql.contains("LOWER(w.country) = LOWER($2)"));
        assert_eq!(q.binds[1], BindValue::Text("France".to_string()));
    }

    #[test]
    fn price_bounds_are_inclusive_and_anded() {
        let filters =
            WineFilters::from_params(&params(&[("min_price", "10"), ("max_price", "20")])).unwrap();
        let q = filters.compile();

        assert!(q.sql.contains("w.price >= $1 AND w.price <= $2"));
        assert_eq!(q.binds[0], BindValue::Float(10.0));
        assert_eq!(q.binds[1], BindValue::Float(20.0));
    }

    #[test]
    fn rating_bounds_constrain_the_aggregate_not_a_column() {
        let filters =
            WineFilters::from_params(&params(&[("min_rating", "3"), ("max_rating", "5")])).unwrap();
        let q = filters.compile();

        assert!(q.sql.contains("HAVING AVG(r.rating) >= $1 AND AVG(r.rating) <= $2"));
        // Rating bounds must come after GROUP BY
        let group = q.sql.find("GROUP BY").unwrap();
        let having = q.sql.find("HAVING").unwrap();
        assert!(having > group);
    }

    #[test]
    fn all_bounds_combine_with_sequential_placeholders() {
        let filters = WineFilters::from_params(&params(&[
            ("title", "test"),
            ("grape", "cabernet"),
            ("min_abv", "11.5"),
            ("max_capacity", "1.5"),
            ("min_rating", "4"),
        ]))
        .unwrap();
        let q = filters.compile();

        for i in 1..=7 {
            assert!(q.sql.contains(&format!("${}", i)), "missing ${} in {}", i, q.sql);
        }
        assert_eq!(q.binds.len(), 7);
    }

    #[test]
    fn malformed_number_is_an_error_not_a_silent_ignore() {
        let err = WineFilters::from_params(&params(&[("min_price", "cheap")])).unwrap_err();
        assert_eq!(
            err,
            FilterError::InvalidNumber {
                param: "min_price".to_string(),
                value: "cheap".to_string(),
            }
        );
    }

    #[test]
    fn unknown_params_are_ignored() {
        let filters = WineFilters::from_params(&params(&[("page", "notanumber")])).unwrap();
        assert!(filters.title.is_none());
    }

    #[test]
    fn limit_is_clamped_to_configured_ceiling() {
        let filters = WineFilters::from_params(&params(&[("limit", "999999")])).unwrap();
        assert!(filters.page_limit() <= crate::config::config().api.max_page_size);

        let filters = WineFilters::from_params(&params(&[("limit", "-3")])).unwrap();
        assert_eq!(filters.page_limit(), 1);
    }

    #[test]
    fn negative_offset_is_floored_at_zero() {
        let filters = WineFilters::from_params(&params(&[("offset", "-10")])).unwrap();
        assert_eq!(filters.page_offset(), 0);
    }
}
