//! Filters
//!
//! A filter is bound to one record class for its lifetime. It owns a
//! condition tree plus window, sort and access-check settings, and compiles
//! them into SELECT statements. Execution lives in `execute.rs`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::error::FilterError;
use crate::core::constants::MAX_SUBFILTER_DEPTH;
use crate::data::Datastore;
use crate::record::RecordClass;

fn default_ascending() -> bool {
    true
}

/// ORDER BY on a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: String,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

#[derive(Clone)]
pub struct Filter {
    store: Arc<Datastore>,
    class: Arc<RecordClass>,
    base_condition: Option<Condition>,
    limit_results: Option<usize>,
    start_at_result: usize,
    sort: Option<SortOrder>,
    perform_access_check: bool,
    filter_after_sql: bool,
    max_scan_rows: Option<usize>,
    errors: Vec<String>,
}

impl Filter {
    /// New filter over the registered class `class_name`, matching everything
    pub fn new(store: &Arc<Datastore>, class_name: &str) -> Result<Self, FilterError> {
        let class = store
            .class(class_name)
            .ok_or_else(|| FilterError::UnknownClass(class_name.to_string()))?;
        Ok(Self {
            store: Arc::clone(store),
            class,
            base_condition: None,
            limit_results: None,
            start_at_result: 0,
            sort: None,
            perform_access_check: false,
            filter_after_sql: false,
            max_scan_rows: store.settings().max_scan_rows,
            errors: Vec::new(),
        })
    }

    pub fn class(&self) -> &Arc<RecordClass> {
        &self.class
    }

    pub fn store(&self) -> &Arc<Datastore> {
        &self.store
    }

    pub fn base_condition(&self) -> Option<&Condition> {
        self.base_condition.as_ref()
    }

    // -------------------------------------------------------------------------
    // Condition assembly
    // -------------------------------------------------------------------------

    /// AND a condition onto the root (or make it the root)
    pub fn add_condition(&mut self, condition: Condition) -> &mut Self {
        self.combine(condition, Condition::And)
    }

    /// OR a condition onto the root (or make it the root)
    pub fn add_condition_or(&mut self, condition: Condition) -> &mut Self {
        self.combine(condition, Condition::Or)
    }

    fn combine(
        &mut self,
        mut condition: Condition,
        join: fn(Box<Condition>, Box<Condition>) -> Condition,
    ) -> &mut Self {
        condition.attach(&self.class);
        let root = match self.base_condition.take() {
            None => condition,
            Some(root) => join(Box::new(root), Box::new(condition)),
        };
        self.filter_after_sql = root.no_sql();
        self.base_condition = Some(root);
        self
    }

    /// Decode a serialized condition and AND it onto the root.
    ///
    /// Unknown `type` discriminators fail here rather than at validation.
    pub fn add_condition_from_json(&mut self, json: &str) -> Result<&mut Self, FilterError> {
        let condition = Condition::from_json(&self.store, json)?;
        Ok(self.add_condition(condition))
    }

    // -------------------------------------------------------------------------
    // Settings
    // -------------------------------------------------------------------------

    pub fn set_order_column(&mut self, field: &str, ascending: bool) -> &mut Self {
        self.sort = Some(SortOrder {
            field: field.to_string(),
            ascending,
        });
        self
    }

    /// Maximum number of results; 0 removes the limit
    pub fn set_result_limit(&mut self, limit: usize) -> &mut Self {
        self.limit_results = (limit > 0).then_some(limit);
        self
    }

    /// Number of logical results to skip
    pub fn set_result_start(&mut self, start: usize) -> &mut Self {
        self.start_at_result = start;
        self
    }

    pub fn set_perform_access_check(&mut self, check: bool) -> &mut Self {
        self.perform_access_check = check;
        self
    }

    /// Cap on rows fetched by one reconciliation run; `None` or 0 = unbounded
    pub fn set_max_scan_rows(&mut self, max: Option<usize>) -> &mut Self {
        self.max_scan_rows = max.filter(|max| *max > 0);
        self
    }

    pub fn result_limit(&self) -> Option<usize> {
        self.limit_results
    }

    pub fn result_start(&self) -> usize {
        self.start_at_result
    }

    pub fn sort(&self) -> Option<&SortOrder> {
        self.sort.as_ref()
    }

    pub fn performs_access_check(&self) -> bool {
        self.perform_access_check
    }

    pub fn max_scan_rows(&self) -> Option<usize> {
        self.max_scan_rows
    }

    /// True when part of the condition tree is evaluated in memory
    pub fn filter_after_sql(&self) -> bool {
        self.filter_after_sql
    }

    /// True when fetched rows may still be dropped after SQL
    pub(crate) fn needs_post_filtering(&self) -> bool {
        self.filter_after_sql || self.perform_access_check
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    /// Validate the condition tree and settings, recording every problem
    pub fn is_valid(&mut self) -> bool {
        self.errors = self.validation_errors(0);
        self.errors.is_empty()
    }

    /// Problems found by the last [`Self::is_valid`] call
    pub fn get_errors(&self) -> &[String] {
        &self.errors
    }

    pub(crate) fn validation_errors(&self, depth: usize) -> Vec<String> {
        let mut errors = Vec::new();
        if depth > MAX_SUBFILTER_DEPTH {
            errors.push(format!(
                "Sub-filters nested deeper than {} levels",
                MAX_SUBFILTER_DEPTH
            ));
            return errors;
        }
        if let Some(condition) = &self.base_condition {
            condition.collect_errors(depth, &mut errors);
        }
        if let Some(sort) = &self.sort
            && self.sort_column(sort).is_none()
        {
            errors.push(format!(
                "Cannot sort by '{}': not a column of class '{}'",
                sort.field, self.class.name
            ));
        }
        errors
    }

    // -------------------------------------------------------------------------
    // SQL generation
    // -------------------------------------------------------------------------

    /// WHERE clause for the condition tree; `TRUE` without conditions
    pub fn get_sql_where(&self) -> String {
        self.base_condition
            .as_ref()
            .map_or_else(|| "TRUE".to_string(), Condition::to_sql_fragment)
    }

    fn sort_column<'a>(&'a self, sort: &SortOrder) -> Option<&'a str> {
        self.class.field_definition(&sort.field)?.column()
    }

    /// ORDER BY clause, always ending with the primary key so windows are
    /// stable across round trips
    fn order_by(&self) -> String {
        let pk = self.class.primary_key();
        match self.sort.as_ref().and_then(|sort| Some((self.sort_column(sort)?, sort.ascending))) {
            Some((column, ascending)) if column == pk => {
                format!("ORDER BY {} {}", pk, direction(ascending))
            }
            Some((column, ascending)) => {
                format!("ORDER BY {} {} NULLS LAST, {} ASC", column, direction(ascending), pk)
            }
            None => format!("ORDER BY {} ASC", pk),
        }
    }

    pub(crate) fn select_sql(&self, start: usize, limit: Option<usize>) -> String {
        let mut sql = format!(
            "SELECT {} FROM {} WHERE {} {}",
            self.class.select_list(),
            self.class.table,
            self.get_sql_where(),
            self.order_by()
        );
        // LIMIT and OFFSET are BIGINT
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit.min(MAX_SQL_ROWS)));
        }
        if start > 0 {
            sql.push_str(&format!(" OFFSET {}", start.min(MAX_SQL_ROWS)));
        }
        sql
    }

    pub(crate) fn count_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            self.class.table,
            self.get_sql_where()
        )
    }

    /// SELECT for the filter's own window, as the fast path would run it
    pub fn get_sql(&self) -> String {
        self.select_sql(self.start_at_result, self.limit_results)
    }
}

const MAX_SQL_ROWS: usize = i64::MAX as usize;

fn direction(ascending: bool) -> &'static str {
    if ascending { "ASC" } else { "DESC" }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("class", &self.class.name)
            .field("base_condition", &self.base_condition)
            .field("limit_results", &self.limit_results)
            .field("start_at_result", &self.start_at_result)
            .field("sort", &self.sort)
            .field("perform_access_check", &self.perform_access_check)
            .field("filter_after_sql", &self.filter_after_sql)
            .field("max_scan_rows", &self.max_scan_rows)
            .finish()
    }
}
