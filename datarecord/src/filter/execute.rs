//! Filter execution
//!
//! Without post-filtering a filter is a single SELECT with LIMIT/OFFSET. Once
//! part of the condition tree is manual, or records must pass the class's
//! access policy, SQL row numbers no longer match the logical result, so the
//! reconciliation loop fetches from row 0 with a growing window, re-checks
//! every row in memory and applies the requested offset to the survivors.

use rustc_hash::FxHashSet;

use super::condition::MatchContext;
use super::engine::Filter;
use super::error::FilterError;
use crate::core::constants::RECONCILE_MIN_WINDOW;
use crate::record::{Collection, Record};

impl Filter {
    /// Execute with the filter's own window.
    ///
    /// Fails with [`FilterError::Invalid`] when validation finds problems.
    /// Start and limit are read, never modified, so repeated calls return the
    /// same result.
    pub fn execute(&self) -> Result<Collection, FilterError> {
        self.ensure_valid()?;
        self.reconcile(self.result_start(), self.result_limit())
    }

    /// First matching record, or an empty record of the class when none match
    pub fn execute_and_get_first(&self) -> Result<Record, FilterError> {
        self.ensure_valid()?;
        Ok(self
            .reconcile(0, Some(1))?
            .into_iter()
            .next()
            .unwrap_or_else(|| Record::empty(self.class())))
    }

    /// Number of matching records, ignoring the window.
    ///
    /// Fails with [`FilterError::Truncated`] when the scan limit stops the
    /// count before every row was checked.
    pub fn execute_and_count(&self) -> Result<usize, FilterError> {
        self.ensure_valid()?;
        if !self.needs_post_filtering() {
            return Ok(self.store().count(&self.count_sql())?);
        }
        let records = self.reconcile(0, None)?;
        if records.is_truncated() {
            return Err(FilterError::Truncated {
                counted: records.len(),
            });
        }
        Ok(records.len())
    }

    /// Execute and delete every record in the result
    pub fn delete(&self) -> Result<usize, FilterError> {
        let records = self.execute()?;
        Ok(records.delete_all(self.store())?)
    }

    /// Evaluate the condition tree against a record without touching SQL
    pub fn matches(&self, record: &Record) -> Result<bool, FilterError> {
        let Some(condition) = self.base_condition() else {
            return Ok(true);
        };
        let mut ctx = MatchContext::new();
        let matched = condition.matches(record, false, &mut ctx)?;
        if ctx.is_truncated() {
            tracing::warn!(
                class = %self.class().name,
                "Sub-filter scan limit reached, match used a partial key set"
            );
        }
        Ok(matched)
    }

    /// Values of `column` over the whole unwindowed result, and whether that
    /// result was truncated by the scan limit
    pub(crate) fn reference_keys(
        &self,
        column: &str,
    ) -> Result<(FxHashSet<i64>, bool), FilterError> {
        let records = self.reconcile(0, None)?;
        let keys = records
            .iter()
            .filter_map(|record| record.get(column).as_i64())
            .collect();
        Ok((keys, records.is_truncated()))
    }

    fn ensure_valid(&self) -> Result<(), FilterError> {
        let errors = self.validation_errors(0);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(FilterError::Invalid(errors))
        }
    }

    fn reconcile(&self, start: usize, limit: Option<usize>) -> Result<Collection, FilterError> {
        let class = self.class();
        if !self.needs_post_filtering() {
            let sql = self.select_sql(start, limit);
            tracing::debug!(class = %class.name, sql = %sql, "Executing filter");
            return Ok(self.store().query(class, &sql)?);
        }

        let manual = self.base_condition().filter(|_| self.filter_after_sql());
        let check_access = self.performs_access_check();
        let mut ctx = MatchContext::new();
        let mut result = Collection::new();
        let mut skipped = 0;
        let mut scanned = 0;
        let mut sql_start = 0;
        let mut sql_limit = limit.map(|limit| start.saturating_add(limit));

        loop {
            let budget = self.max_scan_rows().map(|max| max.saturating_sub(scanned));
            if budget == Some(0) {
                // A full last window may have ended exactly at the table's end
                if self.store().query(class, &self.select_sql(sql_start, Some(1)))?.is_empty() {
                    break;
                }
                tracing::warn!(
                    class = %class.name,
                    scanned,
                    found = result.len(),
                    "Filter scan limit reached, result truncated"
                );
                result.mark_truncated();
                break;
            }
            let window = match (sql_limit, budget) {
                (Some(limit), Some(budget)) => Some(limit.min(budget)),
                (limit, None) => limit,
                (None, budget) => budget,
            };

            let sql = self.select_sql(sql_start, window);
            tracing::debug!(class = %class.name, sql_start, window = ?window, sql = %sql, "Reconciliation round");
            let rows = self.store().query(class, &sql)?;
            let fetched = rows.len();
            scanned += fetched;

            for record in rows {
                if let Some(condition) = manual
                    && !condition.matches(&record, true, &mut ctx)?
                {
                    continue;
                }
                if check_access && !class.can_access(&record) {
                    continue;
                }
                if skipped < start {
                    skipped += 1;
                    continue;
                }
                result.add(record);
                if limit.is_some_and(|limit| result.len() >= limit) {
                    break;
                }
            }

            let exhausted = window.is_none_or(|window| fetched < window);
            if exhausted || limit.is_some_and(|limit| result.len() >= limit) {
                break;
            }
            sql_start += fetched;
            sql_limit = sql_limit.map(|current| {
                if current < RECONCILE_MIN_WINDOW {
                    RECONCILE_MIN_WINDOW
                } else {
                    current.saturating_mul(2)
                }
            });
        }

        if ctx.is_truncated() && !result.is_truncated() {
            tracing::warn!(
                class = %class.name,
                "Sub-filter scan limit reached, result may be incomplete"
            );
            result.mark_truncated();
        }

        tracing::debug!(
            class = %class.name,
            scanned,
            skipped,
            returned = result.len(),
            "Reconciliation finished"
        );
        Ok(result)
    }
}
