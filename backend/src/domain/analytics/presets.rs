//! Ready-made queries for the per-type stats views.

use super::AggregateQuery;

/// Blog posts per category with total views and mean quality score.
pub fn blog_stats() -> AggregateQuery {
    AggregateQuery::new()
        .group_by("category")
        .sum("views")
        .average("qualityScore")
}

/// Case studies per industry with total inquiries and mean ROI.
pub fn case_study_stats() -> AggregateQuery {
    AggregateQuery::new()
        .group_by("industry")
        .sum("inquiries")
        .average("roi")
}

/// Job postings per department with total applications and mean conversion.
pub fn hiring_stats() -> AggregateQuery {
    AggregateQuery::new()
        .group_by("department")
        .sum("applications")
        .average("conversionRate")
}

/// Products per category with total trials and mean trial conversion.
pub fn product_stats() -> AggregateQuery {
    AggregateQuery::new()
        .group_by("category")
        .sum("trials")
        .average("conversionRate")
}

/// Service offerings per category with total inquiries and mean conversion.
pub fn service_stats() -> AggregateQuery {
    AggregateQuery::new()
        .group_by("category")
        .sum("inquiries")
        .average("conversionRate")
}
