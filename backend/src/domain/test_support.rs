//! Builders for valid drafts and entities shared by the domain unit tests.

use chrono::{DateTime, TimeZone, Utc};

use super::blog::{Blog, BlogDraft, SeoFields};
use super::case_study::{CaseStudy, CaseStudyDraft, CaseStudyResults};
use super::content::ContentEntity;
use super::ids::UserId;
use super::job::{EmploymentType, Job, JobDraft};
use super::product::{Product, ProductDraft};
use super::service::{ServiceDraft, ServiceOffering};

/// Fixed instant used where a test does not care about the exact time.
pub(crate) fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub(crate) fn blog_draft() -> BlogDraft {
    BlogDraft {
        title: "Reducing Claim Denials".to_owned(),
        slug: None,
        author: UserId::random(),
        excerpt: None,
        content: "Front-end eligibility checks prevent most denials.".to_owned(),
        category: Some("denials".to_owned()),
        tags: vec!["rcm".to_owned()],
        seo: SeoFields::default(),
        table_of_contents: Vec::new(),
        sections: Vec::new(),
    }
}

pub(crate) fn case_study_draft() -> CaseStudyDraft {
    CaseStudyDraft {
        title: "Regional Clinic Turnaround".to_owned(),
        slug: None,
        client_name: "Lakeside Family Clinic".to_owned(),
        industry: Some("primary care".to_owned()),
        challenge: "Denial rate above twelve percent.".to_owned(),
        solution: "Automated claim scrubbing and payer follow-up.".to_owned(),
        results: CaseStudyResults::default(),
        created_by: UserId::random(),
    }
}

pub(crate) fn job_draft() -> JobDraft {
    JobDraft {
        title: "Senior Billing Specialist".to_owned(),
        slug: None,
        department: "Billing".to_owned(),
        location: "Remote".to_owned(),
        employment_type: EmploymentType::FullTime,
        description: "Own payer follow-up for a portfolio of clinics.".to_owned(),
        hiring_manager: UserId::random(),
    }
}

pub(crate) fn product_draft() -> ProductDraft {
    ProductDraft {
        name: "ClaimScrub Pro".to_owned(),
        slug: None,
        category: Some("automation".to_owned()),
        tagline: Some("Catch claim errors before payers do".to_owned()),
        description: "Rules engine for pre-submission claim review.".to_owned(),
        features: vec!["Payer rule library".to_owned()],
        created_by: UserId::random(),
    }
}

pub(crate) fn service_draft() -> ServiceDraft {
    ServiceDraft {
        name: "Credentialing Support".to_owned(),
        slug: None,
        category: Some("credentialing".to_owned()),
        summary: "Provider enrolment handled end to end.".to_owned(),
        description: None,
        deliverables: vec!["CAQH maintenance".to_owned()],
        created_by: UserId::random(),
    }
}

pub(crate) fn sample_blog(now: DateTime<Utc>) -> Blog {
    Blog::from_draft(blog_draft(), now).expect("valid blog draft")
}

pub(crate) fn sample_case_study(now: DateTime<Utc>) -> CaseStudy {
    CaseStudy::from_draft(case_study_draft(), now).expect("valid case study draft")
}

pub(crate) fn sample_job(now: DateTime<Utc>) -> Job {
    Job::from_draft(job_draft(), now).expect("valid job draft")
}

pub(crate) fn sample_product(now: DateTime<Utc>) -> Product {
    Product::from_draft(product_draft(), now).expect("valid product draft")
}

pub(crate) fn sample_service(now: DateTime<Utc>) -> ServiceOffering {
    ServiceOffering::from_draft(service_draft(), now).expect("valid service draft")
}
