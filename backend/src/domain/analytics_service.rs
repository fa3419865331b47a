//! Read-only analytics over a repository scan.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use super::analytics::{AggregateQuery, AggregateReport, aggregate};
use super::content::ContentEntity;
use super::content_service::map_repository_error;
use super::error::Error;
use super::ports::ContentRepository;

/// Aggregates every stored entity of type `E`.
///
/// Scans take no locks; a report may interleave with concurrent writes.
pub struct AnalyticsService<E, R> {
    repo: Arc<R>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, R> Clone for AnalyticsService<E, R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            _entity: PhantomData,
        }
    }
}

impl<E, R> AnalyticsService<E, R>
where
    E: ContentEntity,
    R: ContentRepository<E>,
{
    /// Aggregate over everything `repo` holds.
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            _entity: PhantomData,
        }
    }

    /// Run `query` against the current contents of the repository.
    pub async fn aggregate(&self, query: &AggregateQuery) -> Result<AggregateReport, Error> {
        let entities = self.repo.scan().await.map_err(map_repository_error)?;
        let report = aggregate(&entities, query)?;
        debug!(
            kind = E::KIND.as_str(),
            scanned = entities.len(),
            matched = report.matched,
            "aggregate computed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::sync::Arc;

    use async_trait::async_trait;
    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::analytics::presets::product_stats;
    use crate::domain::ids::ContentId;
    use crate::domain::ports::{ContentQuery, ContentRepositoryError, FixtureContentRepository};
    use crate::domain::product::{Product, ProductStatus};
    use crate::domain::test_support::{fixture_now, sample_product};

    mockall::mock! {
        ProductRepo {}

        #[async_trait]
        impl ContentRepository<Product> for ProductRepo {
            async fn create(&self, entity: &Product) -> Result<(), ContentRepositoryError>;
            async fn find_by_id(
                &self,
                id: &ContentId,
            ) -> Result<Option<Product>, ContentRepositoryError>;
            async fn find_by_slug(
                &self,
                slug: &str,
            ) -> Result<Option<Product>, ContentRepositoryError>;
            async fn save(
                &self,
                entity: &Product,
                expected_revision: u32,
            ) -> Result<(), ContentRepositoryError>;
            async fn find(
                &self,
                query: &ContentQuery<ProductStatus>,
            ) -> Result<Vec<Product>, ContentRepositoryError>;
            async fn scan(&self) -> Result<Vec<Product>, ContentRepositoryError>;
        }
    }

    #[rstest]
    #[tokio::test]
    async fn aggregates_the_scanned_collection() {
        let mut repo = MockProductRepo::new();
        repo.expect_scan()
            .times(1)
            .returning(|| Ok(vec![sample_product(fixture_now())]));
        let service = AnalyticsService::new(Arc::new(repo));

        let report = service
            .aggregate(&product_stats())
            .await
            .expect("aggregate succeeds");

        assert_eq!(report.matched, 1);
        let automation = report.groups.get("automation").expect("category group");
        assert_eq!(automation.sum, Some(0.0));
        assert_eq!(automation.average, Some(0.0));
    }

    #[rstest]
    #[tokio::test]
    async fn scan_failures_are_mapped() {
        let mut repo = MockProductRepo::new();
        repo.expect_scan()
            .returning(|| Err(ContentRepositoryError::query("cursor lost")));
        let service = AnalyticsService::new(Arc::new(repo));

        let err = service
            .aggregate(&AggregateQuery::new())
            .await
            .expect_err("scan fails");

        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_store_reports_nothing() {
        let service: AnalyticsService<Product, _> =
            AnalyticsService::new(Arc::new(FixtureContentRepository));

        let report = service
            .aggregate(&AggregateQuery::new().sum("demos"))
            .await
            .expect("aggregate succeeds");

        assert_eq!(report.matched, 0);
        assert_eq!(report.sum, Some(0.0));
    }
}
