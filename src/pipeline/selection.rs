use std::collections::HashSet;
use tracing::info;

use crate::db::JobStore;

/// Fallback row count when no explicit criterion is given
pub const DEFAULT_MISSING_LIMIT: i64 = 100;

/// How a pipeline run decides which job IDs to scrape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCriteria {
    /// Scrape exactly these IDs
    ExplicitIds(Vec<String>),
    /// Scrape jobs whose surrogate key falls in `start..=end`
    InternalIdRange { start: i32, end: i32 },
    /// Scrape up to `limit` jobs still lacking a usable description;
    /// `retry_attempted` also re-selects sentinel-marked rows
    MissingDescription { limit: i64, retry_attempted: bool },
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        SelectionCriteria::MissingDescription {
            limit: DEFAULT_MISSING_LIMIT,
            retry_attempted: false,
        }
    }
}

/// Resolve a criterion into a deduplicated, order-preserving job ID list.
///
/// An empty result means there is nothing to scrape; callers treat it as a
/// no-op, not a failure. Store errors abort the run and surface here.
pub async fn select_job_ids<S>(
    store: &S,
    criterion: &SelectionCriteria,
) -> Result<Vec<String>, sqlx::Error>
where
    S: JobStore + ?Sized,
{
    let ids = match criterion {
        SelectionCriteria::ExplicitIds(ids) => ids.clone(),
        SelectionCriteria::InternalIdRange { start, end } => {
            let ids = store.job_ids_by_internal_range(*start, *end).await?;
            info!("Found {} job IDs in range {}-{} to scrape", ids.len(), start, end);
            ids
        }
        SelectionCriteria::MissingDescription { limit, retry_attempted } => {
            let ids = store
                .job_ids_missing_description(*limit, *retry_attempted)
                .await?;
            info!(
                "Found {} jobs with missing descriptions to scrape (limit: {})",
                ids.len(),
                limit
            );
            ids
        }
    };

    let mut seen = HashSet::new();
    Ok(ids.into_iter().filter(|id| seen.insert(id.clone())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::MockStore;

    #[tokio::test]
    async fn explicit_ids_deduplicated_preserving_order() {
        let store = MockStore::default();
        let criterion = SelectionCriteria::ExplicitIds(vec![
            "b".to_string(),
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "a".to_string(),
        ]);

        let ids = select_job_ids(&store, &criterion).await.unwrap();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn missing_description_uses_store_query() {
        let store = MockStore::with_selectable(vec!["j3", "j2", "j1"]);
        let criterion = SelectionCriteria::MissingDescription {
            limit: 10,
            retry_attempted: false,
        };

        let ids = select_job_ids(&store, &criterion).await.unwrap();
        assert_eq!(ids, vec!["j3", "j2", "j1"]);
    }

    #[tokio::test]
    async fn internal_range_uses_store_query() {
        let store = MockStore::with_selectable(vec!["j1", "j2"]);
        let criterion = SelectionCriteria::InternalIdRange { start: 1, end: 2 };

        let ids = select_job_ids(&store, &criterion).await.unwrap();
        assert_eq!(ids, vec!["j1", "j2"]);
    }

    #[tokio::test]
    async fn store_duplicates_are_collapsed() {
        let store = MockStore::with_selectable(vec!["j1", "j1", "j2"]);
        let criterion = SelectionCriteria::MissingDescription {
            limit: 10,
            retry_attempted: false,
        };

        let ids = select_job_ids(&store, &criterion).await.unwrap();
        assert_eq!(ids, vec!["j1", "j2"]);
    }

    #[tokio::test]
    async fn selection_error_surfaces_to_caller() {
        let store = MockStore::failing_selection();
        let criterion = SelectionCriteria::default();

        let result = select_job_ids(&store, &criterion).await;
        assert!(result.is_err());
    }

    #[test]
    fn default_criterion_is_recent_missing_descriptions() {
        assert_eq!(
            SelectionCriteria::default(),
            SelectionCriteria::MissingDescription {
                limit: DEFAULT_MISSING_LIMIT,
                retry_attempted: false,
            }
        );
    }
}
