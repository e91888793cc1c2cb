use url::Url;

/// Path segment that precedes the posting identifier, e.g. `/jobs/5417/engineering-data-analyst/job`
const ID_ANCHOR_SEGMENT: &str = "jobs";

/// Extract the portal's job identifier from the posting URL
///
/// The identifier is the segment right after `/jobs/`. It must be
/// alphanumeric and contain at least one digit so listing paths such as
/// `/jobs/search` do not yield an id.
pub fn job_id_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let mut segments = parsed.path_segments()?;

    segments.find(|segment| segment.eq_ignore_ascii_case(ID_ANCHOR_SEGMENT))?;
    let candidate = segments.next()?;

    let valid = !candidate.is_empty()
        && candidate.chars().all(|c| c.is_ascii_alphanumeric())
        && candidate.chars().any(|c| c.is_ascii_digit());

    valid.then(|| candidate.to_string())
}
