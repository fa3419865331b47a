//! Tests for the content service.

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local};
use mockable::MockClock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::blog::{BlogPatch, BlogStatus};
use crate::domain::job::ApplicationSource;
use crate::domain::test_support::{blog_draft, fixture_now, job_draft, sample_blog};
use crate::outbound::memory::InMemoryContentRepository;

mockall::mock! {
    BlogRepo {}

    #[async_trait]
    impl ContentRepository<Blog> for BlogRepo {
        async fn create(&self, entity: &Blog) -> Result<(), ContentRepositoryError>;
        async fn find_by_id(&self, id: &ContentId) -> Result<Option<Blog>, ContentRepositoryError>;
        async fn find_by_slug(&self, slug: &str) -> Result<Option<Blog>, ContentRepositoryError>;
        async fn save(
            &self,
            entity: &Blog,
            expected_revision: u32,
        ) -> Result<(), ContentRepositoryError>;
        async fn find(
            &self,
            query: &ContentQuery<BlogStatus>,
        ) -> Result<Vec<Blog>, ContentRepositoryError>;
        async fn scan(&self) -> Result<Vec<Blog>, ContentRepositoryError>;
    }
}

/// Clock whose time tests can move forward.
struct MutableClock {
    now: StdMutex<DateTime<Utc>>,
}

impl MutableClock {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: StdMutex::new(now),
        }
    }

    fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

#[fixture]
fn clock() -> Arc<MutableClock> {
    Arc::new(MutableClock::new(fixture_now()))
}

fn fixed_clock() -> MockClock {
    let mut clock = MockClock::new();
    clock.expect_utc().return_const(fixture_now());
    clock
}

fn mock_service(repo: MockBlogRepo) -> ContentService<Blog, MockBlogRepo> {
    ContentService::new(Arc::new(repo), Arc::new(fixed_clock()))
}

fn memory_service(
    clock: Arc<MutableClock>,
) -> ContentService<Blog, InMemoryContentRepository<Blog>> {
    ContentService::new(Arc::new(InMemoryContentRepository::new()), clock)
}

#[rstest]
#[tokio::test]
async fn invalid_draft_never_reaches_the_repository() {
    let mut repo = MockBlogRepo::new();
    repo.expect_create().times(0);
    let mut draft = blog_draft();
    draft.title = String::new();

    let err = mock_service(repo)
        .create(draft)
        .await
        .expect_err("title required");

    assert_eq!(err.code(), ErrorCode::ValidationFailed);
    let fields = err
        .details()
        .and_then(|details| details.get("fields"))
        .and_then(|fields| fields.as_array())
        .map(Vec::len);
    assert_eq!(fields, Some(1));
}

#[rstest]
#[tokio::test]
async fn duplicate_slug_maps_to_duplicate_key() {
    let mut repo = MockBlogRepo::new();
    repo.expect_create()
        .times(1)
        .return_once(|blog| Err(ContentRepositoryError::duplicate_slug(blog.header().slug())));

    let err = mock_service(repo)
        .create(blog_draft())
        .await
        .expect_err("slug taken");

    assert_eq!(err.code(), ErrorCode::DuplicateKey);
}

#[rstest]
#[tokio::test]
async fn connection_failures_are_service_unavailable() {
    let mut repo = MockBlogRepo::new();
    repo.expect_find_by_id()
        .return_once(|_| Err(ContentRepositoryError::connection("refused")));

    let err = mock_service(repo)
        .get(&ContentId::random())
        .await
        .expect_err("store down");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn missing_entity_is_not_found() {
    let mut repo = MockBlogRepo::new();
    repo.expect_find_by_id().return_once(|_| Ok(None));
    repo.expect_save().times(0);

    let err = mock_service(repo)
        .record_view(&ContentId::random())
        .await
        .expect_err("unknown id");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn lost_revision_race_is_retried() {
    let blog = sample_blog(fixture_now());
    let mut repo = MockBlogRepo::new();
    repo.expect_find_by_id()
        .times(2)
        .returning(move |_| Ok(Some(blog.clone())));
    let mut seq = mockall::Sequence::new();
    repo.expect_save()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Err(ContentRepositoryError::revision_mismatch(1_u32, 2_u32)));
    repo.expect_save()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|blog, expected| *expected == 1 && blog.header().revision() == 2)
        .returning(|_, _| Ok(()));

    let views = mock_service(repo)
        .record_view(&ContentId::random())
        .await
        .expect("second attempt wins");

    assert_eq!(views, 1);
}

#[rstest]
#[tokio::test]
async fn persistent_races_surface_as_conflict() {
    let blog = sample_blog(fixture_now());
    let mut repo = MockBlogRepo::new();
    repo.expect_find_by_id()
        .returning(move |_| Ok(Some(blog.clone())));
    repo.expect_save()
        .times(3)
        .returning(|_, _| Err(ContentRepositoryError::revision_mismatch(1_u32, 9_u32)));
    let service: ContentService<Blog, _> = ContentService::with_settings(
        Arc::new(repo),
        Arc::new(fixed_clock()),
        ContentServiceSettings {
            max_write_attempts: 3,
            ..ContentServiceSettings::default()
        },
    );

    let err = service
        .record_like(&ContentId::random())
        .await
        .expect_err("never wins");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn republishing_does_not_write() {
    let mut blog = sample_blog(fixture_now());
    lifecycle::publish(&mut blog, fixture_now()).expect("publish");
    let mut repo = MockBlogRepo::new();
    repo.expect_find_by_id()
        .return_once(move |_| Ok(Some(blog)));
    repo.expect_save().times(0);

    let view = mock_service(repo)
        .publish(&ContentId::random())
        .await
        .expect("no-op publish");

    assert_eq!(view.entity.header().published_at(), Some(fixture_now()));
}

#[rstest]
#[case(None, 20)]
#[case(Some(0), 1)]
#[case(Some(7), 7)]
#[case(Some(500), 100)]
#[tokio::test]
async fn list_limit_is_clamped(#[case] requested: Option<usize>, #[case] expected: usize) {
    let mut repo = MockBlogRepo::new();
    repo.expect_find()
        .withf(move |query| query.limit == expected)
        .times(1)
        .returning(|_| Ok(Vec::new()));

    let listed = mock_service(repo)
        .list(ListRequest {
            limit: requested,
            ..ListRequest::default()
        })
        .await
        .expect("list succeeds");

    assert!(listed.is_empty());
}

#[rstest]
#[tokio::test]
async fn update_bumps_revision_and_keeps_slug(clock: Arc<MutableClock>) {
    let service = memory_service(clock);
    let created = service.create(blog_draft()).await.expect("create");
    let id = created.entity.header().id();

    let updated = service
        .update(
            &id,
            BlogPatch {
                title: Some("Reducing Claim Denials in 2026".to_owned()),
                ..BlogPatch::default()
            },
            &UserId::random(),
        )
        .await
        .expect("update");

    assert_eq!(updated.entity.header().slug(), "reducing-claim-denials");
    assert_eq!(updated.entity.header().revision(), 2);
    assert_eq!(updated.entity.revisions().len(), 1);
}

#[rstest]
#[tokio::test]
async fn empty_update_does_not_write() {
    let blog = sample_blog(fixture_now());
    let id = blog.header().id();
    let mut repo = MockBlogRepo::new();
    repo.expect_find_by_id().return_once(move |_| Ok(Some(blog)));
    repo.expect_save().times(0);

    let view = mock_service(repo)
        .update(&id, BlogPatch::default(), &UserId::random())
        .await
        .expect("empty patch");

    assert_eq!(view.entity.header().revision(), 1);
    assert!(view.entity.revisions().is_empty());
}

#[rstest]
#[tokio::test]
async fn scheduled_blogs_publish_when_due(clock: Arc<MutableClock>) {
    let service = memory_service(Arc::clone(&clock));
    let created = service.create(blog_draft()).await.expect("create");
    let id = created.entity.header().id();
    service
        .schedule(&id, fixture_now() + Duration::hours(2))
        .await
        .expect("schedule");

    assert!(service.publish_due().await.expect("sweep").is_empty());

    clock.advance(Duration::hours(3));
    let published = service.publish_due().await.expect("sweep");

    assert_eq!(published, vec![id]);
    let view = service.get(&id).await.expect("get");
    assert_eq!(view.entity.header().status(), BlogStatus::Published);
    assert_eq!(view.entity.header().scheduled_for(), None);
}

#[rstest]
#[tokio::test]
async fn approved_comments_raise_engagement(clock: Arc<MutableClock>) {
    let service = memory_service(clock);
    let created = service.create(blog_draft()).await.expect("create");
    let id = created.entity.header().id();
    for _ in 0..4 {
        service.record_view(&id).await.expect("view");
    }
    let comment_id = service
        .add_comment(
            &id,
            CommentDraft {
                author_name: "Ada".to_owned(),
                author_email: None,
                body: "Great walkthrough.".to_owned(),
            },
        )
        .await
        .expect("comment");

    let view = service
        .approve_comment(&id, comment_id)
        .await
        .expect("approve");

    assert_eq!(view.derived_metrics.engagement_rate, 25.0);

    let err = service
        .approve_comment(&id, CommentId::random())
        .await
        .expect_err("unknown comment");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn job_applications_track_sources(clock: Arc<MutableClock>) {
    let service: ContentService<Job, _> =
        ContentService::new(Arc::new(InMemoryContentRepository::new()), clock);
    let created = service.create(job_draft()).await.expect("create");
    let id = created.entity.header().id();
    service.publish(&id).await.expect("open");

    service
        .record_application(&id, "linkedin")
        .await
        .expect("application");
    let total = service
        .record_application(&id, "billboard")
        .await
        .expect("application");

    assert_eq!(total, 2);
    let view = service.get(&id).await.expect("get");
    assert_eq!(
        view.entity.applications_by_source().get(&ApplicationSource::Linkedin),
        Some(&1)
    );

    let err = service
        .schedule(&id, fixture_now() + Duration::days(1))
        .await
        .expect_err("jobs cannot be scheduled");
    assert_eq!(err.code(), ErrorCode::InvalidTransition);
}

#[rstest]
#[tokio::test]
async fn relating_twice_saves_once(clock: Arc<MutableClock>) {
    let service = memory_service(clock);
    let created = service.create(blog_draft()).await.expect("create");
    let id = created.entity.header().id();
    let target = ContentRef {
        kind: crate::domain::ContentKind::Product,
        id: ContentId::random(),
    };

    service.relate(&id, target).await.expect("relate");
    let view = service.relate(&id, target).await.expect("relate again");

    assert_eq!(view.entity.header().related(), [target]);
    assert_eq!(view.entity.header().revision(), 2);
}

#[rstest]
#[tokio::test]
async fn write_locks_are_released_after_each_write(clock: Arc<MutableClock>) {
    let service = memory_service(clock);
    let created = service.create(blog_draft()).await.expect("create");
    let id = created.entity.header().id();

    for _ in 0..50 {
        let err = service
            .record_view(&ContentId::random())
            .await
            .expect_err("unknown id");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
    service.record_view(&id).await.expect("view");

    assert!(service.locks.lock().await.is_empty());
}

#[rstest]
#[tokio::test]
async fn concurrent_views_all_land_and_release_the_lock(clock: Arc<MutableClock>) {
    let service = memory_service(clock);
    let created = service.create(blog_draft()).await.expect("create");
    let id = created.entity.header().id();

    let (first, second, third, fourth) = tokio::join!(
        service.record_view(&id),
        service.record_view(&id),
        service.record_view(&id),
        service.record_view(&id),
    );
    for result in [first, second, third, fourth] {
        result.expect("view recorded");
    }

    let view = service.get(&id).await.expect("get");
    assert_eq!(view.entity.header().counters().get(CounterKind::Views), 4);
    assert!(service.locks.lock().await.is_empty());
}
