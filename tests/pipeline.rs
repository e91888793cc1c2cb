//! End-to-end pipeline runs over saved portal pages

use async_trait::async_trait;
use kodegen_tools_jobscrape::acquirer::select_context;
use kodegen_tools_jobscrape::{
    AcquiredPage, ExtractionPipeline, FieldSource, HtmlDocument, PageSource, ScrapeError,
};

const METADATA_COMPLETE: &str = include_str!("fixtures/metadata_complete.html");
const METADATA_MALFORMED: &str = include_str!("fixtures/metadata_malformed.html");
const TWO_BLOCKS: &str = include_str!("fixtures/two_blocks.html");
const PORTAL_TOP: &str = include_str!("fixtures/portal_top.html");

const POSTING_URL: &str =
    "https://careers-aeieng.icims.com/jobs/5417/engineering-data-analyst/job?mobile=false";

/// Stands in for the browser: serves canned HTML or a canned failure
enum Fixture {
    Page(&'static str),
    /// The configured frame selectors matched nothing on this page
    FramelessPortal(&'static str),
    Timeout,
}

#[async_trait(?Send)]
impl PageSource for Fixture {
    async fn acquire(&self, url: &str) -> Result<AcquiredPage, ScrapeError> {
        match self {
            Fixture::Page(html) => Ok(AcquiredPage {
                document: HtmlDocument::parse(html),
                url: url.to_string(),
                frame_switched: false,
            }),
            Fixture::FramelessPortal(html) => Ok(select_context(
                url.to_string(),
                html.to_string(),
                Err(ScrapeError::FrameNotFound {
                    selectors: vec!["#icims_content_iframe".to_string()],
                }),
            )),
            Fixture::Timeout => Err(ScrapeError::LoadTimeout {
                url: url.to_string(),
                condition: "body".to_string(),
                timeout_ms: 15_000,
            }),
        }
    }
}

#[tokio::test]
async fn complete_metadata_fills_every_field_but_salary() {
    let extraction = ExtractionPipeline::new(Fixture::Page(METADATA_COMPLETE))
        .with_debug(true)
        .run(POSTING_URL)
        .await
        .unwrap();
    let posting = &extraction.posting;

    assert!(extraction.trace.structured_found);
    assert_eq!(posting.job_title(), Some("Engineering Data Analyst"));
    assert_eq!(posting.company(), Some("AEI Engineering"));
    assert_eq!(posting.location(), Some("Pittsburgh, PA"));
    assert_eq!(posting.employment_type(), Some("Full-time"));
    assert_eq!(posting.posted_date(), Some("2025-10-06T00:00:00Z"));
    assert_eq!(posting.salary(), None);
    assert_eq!(posting.job_id(), Some("5417"));

    let description = posting.description().unwrap();
    assert!(description.contains("seeking an Engineering Data Analyst"));
    assert!(!description.contains('<'));

    // identifier is kept as information, never used as the job id
    assert_eq!(posting.additional_info()["identifier"], "2025-5417");
    assert_eq!(posting.additional_info()["industry"], "Engineering");

    for field in ["job_title", "company", "location", "description", "posted_date"] {
        assert_eq!(extraction.trace.source_of(field), Some(FieldSource::Structured));
    }
    assert_eq!(extraction.trace.source_of("salary"), Some(FieldSource::NotFound));

    let json = serde_json::to_value(posting).unwrap();
    assert!(json["salary"].is_null());
}

#[tokio::test]
async fn malformed_metadata_falls_back_to_visible_page() {
    let extraction = ExtractionPipeline::new(Fixture::Page(METADATA_MALFORMED))
        .run(POSTING_URL)
        .await
        .unwrap();
    let posting = &extraction.posting;

    assert!(!extraction.trace.structured_found);
    assert_eq!(posting.job_title(), Some("Senior Structural Engineer"));
    assert_eq!(posting.location(), Some("US-OH-Columbus"));
    assert_eq!(posting.employment_type(), Some("Full-time"));
    assert_eq!(extraction.trace.source_of("job_title"), Some(FieldSource::Fallback));
    assert_eq!(posting.company(), None);
}

#[tokio::test]
async fn load_timeout_produces_no_record_and_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("job_posting.json");

    let err = ExtractionPipeline::new(Fixture::Timeout)
        .run_to_file(POSTING_URL, &path)
        .await
        .unwrap_err();

    let scrape_err = err.downcast_ref::<ScrapeError>().unwrap();
    assert!(matches!(scrape_err, ScrapeError::LoadTimeout { .. }));
    assert!(scrape_err.is_fatal());
    assert!(!path.exists());
}

#[tokio::test]
async fn missing_frame_still_completes_on_top_level_page() {
    let extraction = ExtractionPipeline::new(Fixture::FramelessPortal(PORTAL_TOP))
        .run(POSTING_URL)
        .await
        .unwrap();
    let posting = &extraction.posting;

    assert!(!extraction.trace.frame_switched);
    assert_eq!(
        posting.job_title(),
        Some("Engineering Data Analyst at AEI Engineering")
    );
    assert_eq!(posting.description(), None);
    assert_eq!(posting.job_id(), Some("5417"));
}

#[tokio::test]
async fn second_block_is_used_when_first_is_not_a_job() {
    let url = "https://careers-aeieng.icims.com/jobs/5420/mechanical-designer/job";
    let extraction = ExtractionPipeline::new(Fixture::Page(TWO_BLOCKS))
        .run(url)
        .await
        .unwrap();
    let posting = &extraction.posting;

    assert!(extraction.trace.structured_found);
    assert_eq!(posting.job_title(), Some("Mechanical Designer"));
    assert_eq!(posting.job_id(), Some("5420"));

    let salary = posting.salary().unwrap();
    assert_eq!((salary.min, salary.max), (60_000.0, 72_000.0));
    assert_eq!(salary.currency.as_deref(), Some("USD"));

    let info = posting.additional_info();
    // Job block keys come first; the organization block only adds new keys
    assert_eq!(info["url"], "https://careers-aeieng.icims.com/jobs/5420/job");
    assert_eq!(info["foundingDate"], "1986");
    assert!(!info.contains_key("@type"));
}

#[tokio::test]
async fn metadata_is_never_overwritten_by_page_text() {
    let html = r#"
        <script type="application/ld+json">
          {"@type": "JobPosting", "title": "Title From Metadata", "datePosted": "2025-01-02"}
        </script>
        <h1>Title From Heading</h1>
        <dl><dt>Posted Date</dt><dd>03/04/2025</dd></dl>
    "#;
    let extraction = ExtractionPipeline::new(Fixture::Page(html))
        .run(POSTING_URL)
        .await
        .unwrap();

    assert_eq!(extraction.posting.job_title(), Some("Title From Metadata"));
    assert_eq!(
        extraction.posting.posted_date(),
        Some("2025-01-02T00:00:00Z")
    );
}

#[tokio::test]
async fn job_id_depends_only_on_the_url() {
    let first = ExtractionPipeline::new(Fixture::Page(METADATA_COMPLETE))
        .run(POSTING_URL)
        .await
        .unwrap();
    let second = ExtractionPipeline::new(Fixture::Page(TWO_BLOCKS))
        .run(POSTING_URL)
        .await
        .unwrap();
    assert_eq!(first.posting.job_id(), second.posting.job_id());

    let listing = ExtractionPipeline::new(Fixture::Page(METADATA_COMPLETE))
        .run("https://careers-aeieng.icims.com/jobs/search?ss=1")
        .await
        .unwrap();
    assert_eq!(listing.posting.job_id(), None);
    assert_eq!(listing.trace.source_of("job_id"), Some(FieldSource::NotFound));
}
