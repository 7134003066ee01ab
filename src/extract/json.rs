//! JSON search-API extraction.
//!
//! Search endpoints return a list of result objects under a key that varies
//! between sites and versions. We probe a fixed list of likely container keys
//! and fall back to the first top-level array of objects.
//!
//! Records often carry both a canonical job path and an "apply" or "next
//! step" URL. The latter usually lands on a sign-in gate, so path fields are
//! always tried first.

use super::{ExtractContext, SourceProfile, dedupe, matches_keywords};
use crate::dates::parse_posted_at;
use crate::models::JobPosting;
use crate::utils::collapse_whitespace;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

const CONTAINER_KEYS: [&str; 6] = ["jobs", "results", "hits", "items", "postings", "data"];
const TITLE_KEYS: [&str; 3] = ["title", "job_title", "name"];
const PATH_KEYS: [&str; 6] = ["job_path", "path", "job_url", "url", "absolute_url", "link"];
const APPLY_KEYS: [&str; 2] = ["apply_url", "url_next_step"];
const LOCATION_KEYS: [&str; 4] = ["normalized_location", "location", "city", "location_name"];
const DATE_KEYS: [&str; 5] = [
    "posted_date",
    "posted_at",
    "date_posted",
    "updated_time",
    "created_at",
];

/// Locate the list of result records in a search response.
pub fn find_records(value: &Value) -> &[Value] {
    let Some(object) = value.as_object() else {
        return value.as_array().map(Vec::as_slice).unwrap_or(&[]);
    };
    if let Some(records) = CONTAINER_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_array))
    {
        return records;
    }
    object
        .values()
        .filter_map(Value::as_array)
        .find(|list| !list.is_empty() && list.iter().all(Value::is_object))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Extract postings from one search response.
#[instrument(level = "info", skip_all, fields(%base_url, company = %profile.company))]
pub fn extract(
    value: &Value,
    base_url: &str,
    profile: &SourceProfile,
    ctx: &ExtractContext,
) -> Vec<JobPosting> {
    let records = find_records(value);
    let postings = dedupe(
        records
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|record| posting_from_record(record, profile, ctx))
            .collect(),
    );
    info!(records = records.len(), count = postings.len(), "Extracted postings from JSON");
    postings
}

fn first_string(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| record.get(*key).and_then(Value::as_str))
        .map(collapse_whitespace)
        .find(|s| !s.is_empty())
}

/// Some APIs nest the location as `{"name": "..."}`.
fn nested_location(record: &Map<String, Value>) -> Option<String> {
    LOCATION_KEYS
        .iter()
        .filter_map(|key| record.get(*key)?.get("name")?.as_str())
        .map(collapse_whitespace)
        .find(|s| !s.is_empty())
}

fn posting_from_record(
    record: &Map<String, Value>,
    profile: &SourceProfile,
    ctx: &ExtractContext,
) -> Option<JobPosting> {
    let title = first_string(record, &TITLE_KEYS)?;
    if !matches_keywords(&title, &ctx.keywords) {
        return None;
    }

    let link = PATH_KEYS
        .iter()
        .chain(APPLY_KEYS.iter())
        .filter_map(|key| record.get(*key).and_then(Value::as_str))
        .find_map(|href| profile.links.normalize(href));
    let Some(link) = link else {
        debug!(%title, "No canonical job link in record");
        return None;
    };

    let location = first_string(record, &LOCATION_KEYS)
        .or_else(|| nested_location(record))
        .unwrap_or_default();
    let posted = DATE_KEYS
        .iter()
        .filter_map(|key| record.get(*key).and_then(Value::as_str))
        .find_map(|raw| parse_posted_at(raw, ctx.now));

    Some(JobPosting {
        location,
        company: profile.company.clone(),
        posted_text: posted.as_ref().map(|p| p.text.clone()).unwrap_or_default(),
        posted_at: posted.map(|p| p.at),
        title,
        link,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::links::LinkPolicy;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn profile() -> SourceProfile {
        let amazon = SourceConfig::amazon();
        SourceProfile {
            company: amazon.company.clone(),
            location_tokens: amazon.location_tokens.clone(),
            links: LinkPolicy::from_config(&amazon.name, &amazon.links).unwrap(),
        }
    }

    fn ctx() -> ExtractContext {
        let keywords = ["software", "developer", "engineer"].map(String::from);
        ExtractContext::new(&keywords, Utc.with_ymd_and_hms(2025, 11, 10, 12, 0, 0).unwrap())
    }

    const BASE: &str = "https://www.amazon.jobs/en/search.json";

    #[test]
    fn test_job_path_wins_over_apply_url() {
        let value = json!({
            "hits": 1,
            "jobs": [{
                "title": "Software Development Engineer II",
                "apply_url": "https://account.amazon.com/jobs/2990001/apply",
                "job_path": "/en/jobs/2990001/software-development-engineer-ii",
                "normalized_location": "Seattle, WA, USA",
                "posted_date": "October 30, 2025"
            }]
        });
        let jobs = extract(&value, BASE, &profile(), &ctx());
        assert_eq!(jobs.len(), 1);
        assert_eq!(
            jobs[0].link,
            "https://www.amazon.jobs/en/jobs/2990001/software-development-engineer-ii"
        );
        assert_eq!(jobs[0].location, "Seattle, WA, USA");
        assert_eq!(jobs[0].posted_text, "October 30, 2025");
        assert_eq!(
            jobs[0].posted_at,
            Some(Utc.with_ymd_and_hms(2025, 10, 30, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_apply_url_only_is_rejected_when_not_a_job_page() {
        let value = json!({"jobs": [{
            "title": "Software Engineer",
            "url_next_step": "https://account.amazon.com/jobs/1/apply"
        }]});
        assert!(extract(&value, BASE, &profile(), &ctx()).is_empty());
    }

    #[test]
    fn test_keyword_filter_applies() {
        let value = json!({"results": [
            {"title": "Account Manager", "job_path": "/en/jobs/1/account-manager"},
            {"title": "Frontend Developer", "job_path": "/en/jobs/2/frontend-developer"}
        ]});
        let jobs = extract(&value, BASE, &profile(), &ctx());
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Frontend Developer");
        assert_eq!(jobs[0].posted_at, None);
    }

    #[test]
    fn test_container_key_probe_order() {
        let value = json!({
            "results": [{"title": "a"}],
            "jobs": [{"title": "b"}]
        });
        assert_eq!(find_records(&value)[0]["title"], "b");
    }

    #[test]
    fn test_container_fallback_scans_values() {
        let value = json!({
            "count": 2,
            "facets": [],
            "tags": ["x", "y"],
            "openings": [{"title": "Data Engineer", "job_path": "/en/jobs/5/data-engineer"}]
        });
        assert_eq!(find_records(&value).len(), 1);
        let jobs = extract(&value, BASE, &profile(), &ctx());
        assert_eq!(jobs[0].title, "Data Engineer");
    }

    #[test]
    fn test_timestamp_date_fields() {
        let value = json!({"jobs": [{
            "title": "Backend Engineer",
            "job_path": "/en/jobs/31/backend-engineer",
            "created_at": "2025-10-31T08:00:00Z"
        }]});
        let jobs = extract(&value, BASE, &profile(), &ctx());
        assert_eq!(jobs[0].posted_text, "2025-10-31");
        assert_eq!(
            jobs[0].posted_at,
            Some(Utc.with_ymd_and_hms(2025, 10, 31, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_location_object_uses_name() {
        let value = json!({"jobs": [
            {
                "title": "Software Engineer",
                "job_path": "/en/jobs/40/se",
                "location": {"name": "Seattle, WA", "country": "USA"}
            },
            {
                "title": "Software Developer",
                "job_path": "/en/jobs/41/sd",
                "location": {"country": "USA"},
                "city": "Austin"
            }
        ]});
        let jobs = extract(&value, BASE, &profile(), &ctx());
        assert_eq!(jobs[0].location, "Seattle, WA");
        assert_eq!(jobs[1].location, "Austin");
    }

    #[test]
    fn test_no_records() {
        assert!(find_records(&json!({"hits": 0})).is_empty());
        assert!(find_records(&json!("nope")).is_empty());
        assert!(extract(&json!({"jobs": []}), BASE, &profile(), &ctx()).is_empty());
    }

    #[test]
    fn test_duplicate_records_collapse() {
        let record = json!({"title": "Software Engineer", "job_path": "/en/jobs/9/se"});
        let value = json!({"jobs": [record.clone(), record]});
        assert_eq!(extract(&value, BASE, &profile(), &ctx()).len(), 1);
    }
}
