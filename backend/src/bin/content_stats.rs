//! Print an aggregate report for a JSON export of one content type.
//!
//! # Examples
//! ```sh
//! cargo run --manifest-path backend/Cargo.toml --bin content-stats -- \
//!     --kind blog --input exports/blogs.json --preset
//! cargo run --manifest-path backend/Cargo.toml --bin content-stats -- \
//!     --kind job --input exports/jobs.json --group-by department --sum applications \
//!     --filter '{"comparison": {"field": "status", "op": {"eq": "open"}}}'
//! ```
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cap_std::{ambient_authority, fs::Dir};
use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use content_backend::config::EngineSettings;
use content_backend::domain::analytics::{AggregateQuery, AggregateReport, FilterExpr, presets};
use content_backend::domain::blog::Blog;
use content_backend::domain::case_study::CaseStudy;
use content_backend::domain::job::Job;
use content_backend::domain::product::Product;
use content_backend::domain::service::ServiceOffering;
use content_backend::domain::{AnalyticsService, ContentEntity};
use content_backend::outbound::memory::InMemoryContentRepository;
use content_backend::telemetry::init_tracing;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::info;

/// Content type held by the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Blog,
    CaseStudy,
    Job,
    Product,
    Service,
}

impl KindArg {
    fn preset(self) -> AggregateQuery {
        match self {
            Self::Blog => presets::blog_stats(),
            Self::CaseStudy => presets::case_study_stats(),
            Self::Job => presets::hiring_stats(),
            Self::Product => presets::product_stats(),
            Self::Service => presets::service_stats(),
        }
    }
}

/// `content-stats` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "content-stats",
    about = "Aggregate a JSON export of blog posts, case studies, jobs, products, or services",
    version
)]
struct CliArgs {
    /// Entity type stored in the export.
    #[arg(long, value_enum)]
    kind: KindArg,
    /// Path to a JSON array of entities.
    #[arg(long, value_name = "path")]
    input: PathBuf,
    /// Start from the stats preset for the entity type.
    #[arg(long)]
    preset: bool,
    /// Field to group by.
    #[arg(long = "group-by", value_name = "field")]
    group_by: Option<String>,
    /// Field to sum.
    #[arg(long, value_name = "field")]
    sum: Option<String>,
    /// Field to average.
    #[arg(long = "avg", value_name = "field")]
    average: Option<String>,
    /// Filter expression as JSON.
    #[arg(long, value_name = "json")]
    filter: Option<String>,
}

impl CliArgs {
    fn query(&self) -> Result<AggregateQuery> {
        let mut query = if self.preset {
            self.kind.preset()
        } else {
            AggregateQuery::new()
        };
        if let Some(field) = &self.group_by {
            query = query.group_by(field);
        }
        if let Some(field) = &self.sum {
            query = query.sum(field);
        }
        if let Some(field) = &self.average {
            query = query.average(field);
        }
        if let Some(raw) = &self.filter {
            let filter: FilterExpr =
                serde_json::from_str(raw).wrap_err("failed to parse --filter expression")?;
            query = query.filter(filter);
        }
        Ok(query)
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = CliArgs::parse();
    let settings = EngineSettings::load_from_iter([OsString::from("content-stats")])
        .map_err(|error| eyre!("failed to load engine settings: {error}"))?;
    init_tracing(settings.json_logs());

    let query = args.query()?;
    let export = read_export(&args.input)?;

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build content-stats runtime")?;
    let report = runtime.block_on(async {
        match args.kind {
            KindArg::Blog => report_for::<Blog>(&export, &query).await,
            KindArg::CaseStudy => report_for::<CaseStudy>(&export, &query).await,
            KindArg::Job => report_for::<Job>(&export, &query).await,
            KindArg::Product => report_for::<Product>(&export, &query).await,
            KindArg::Service => report_for::<ServiceOffering>(&export, &query).await,
        }
    })?;

    let rendered = serde_json::to_string_pretty(&report).wrap_err("failed to render report")?;
    println!("{rendered}");
    Ok(())
}

fn read_export(path: &Path) -> Result<String> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| eyre!("input path {} has no file name", path.display()))?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .with_context(|| format!("failed to open {}", parent.display()))?;
    dir.read_to_string(file_name)
        .with_context(|| format!("failed to read {}", path.display()))
}

async fn report_for<E: ContentEntity>(export: &str, query: &AggregateQuery) -> Result<AggregateReport> {
    let entities: Vec<E> = serde_json::from_str(export)
        .with_context(|| format!("failed to parse {} export", E::KIND))?;
    let loaded = entities.len();
    let repo = InMemoryContentRepository::with_entities(entities)
        .wrap_err("export contains conflicting entities")?;
    info!(kind = E::KIND.as_str(), loaded, "export loaded");

    AnalyticsService::new(Arc::new(repo))
        .aggregate(query)
        .await
        .wrap_err("aggregation failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use content_backend::domain::UserId;
    use content_backend::domain::blog::{BlogDraft, SeoFields};
    use rstest::rstest;

    fn blog(title: &str) -> Blog {
        let draft = BlogDraft {
            title: title.to_owned(),
            slug: None,
            author: UserId::random(),
            excerpt: None,
            content: "Short post.".to_owned(),
            category: Some("denials".to_owned()),
            tags: Vec::new(),
            seo: SeoFields::default(),
            table_of_contents: Vec::new(),
            sections: Vec::new(),
        };
        Blog::from_draft(draft, Utc::now()).expect("valid blog")
    }

    fn write_export(blogs: &[Blog]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("blogs.json");
        let json = serde_json::to_string(blogs).expect("blogs serialise");
        std::fs::write(&path, json).expect("export written");
        (dir, path)
    }

    #[rstest]
    fn explicit_flags_override_the_preset() {
        let args = CliArgs::try_parse_from([
            "content-stats",
            "--kind",
            "job",
            "--input",
            "jobs.json",
            "--preset",
            "--sum",
            "views",
        ])
        .expect("arguments parse");

        let query = args.query().expect("query builds");
        assert_eq!(query.group_by.as_deref(), Some("department"));
        assert_eq!(query.sum_field.as_deref(), Some("views"));
        assert_eq!(query.avg_field.as_deref(), Some("conversionRate"));
    }

    #[rstest]
    fn malformed_filters_are_reported() {
        let args = CliArgs::try_parse_from([
            "content-stats",
            "--kind",
            "blog",
            "--input",
            "blogs.json",
            "--filter",
            "{\"between\": 3}",
        ])
        .expect("arguments parse");

        assert!(args.query().is_err());
    }

    #[rstest]
    #[tokio::test]
    async fn exports_are_read_and_aggregated() {
        let (_dir, path) = write_export(&[blog("Reducing Claim Denials"), blog("Appeal Letters")]);

        let export = read_export(&path).expect("export readable");
        let report = report_for::<Blog>(&export, &presets::blog_stats())
            .await
            .expect("report computed");

        assert_eq!(report.matched, 2);
        assert_eq!(report.groups.get("denials").map(|group| group.count), Some(2));
    }

    #[rstest]
    #[tokio::test]
    async fn repeated_slugs_in_an_export_are_rejected() {
        let (_dir, path) = write_export(&[blog("Appeal Letters"), blog("Appeal Letters")]);

        let export = read_export(&path).expect("export readable");
        let result = report_for::<Blog>(&export, &AggregateQuery::new()).await;

        assert!(result.is_err());
    }
}
