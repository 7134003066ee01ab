//! HTML listing-page extraction.
//!
//! Career pages rarely share markup, so candidate job titles are found with
//! loose, pluggable [`CandidatePredicate`]s rather than fixed selectors. The
//! default, [`AttributeHint`], accepts any element whose attribute values
//! mention "job" or "title". When nothing on the page matches, every link is
//! a candidate and the keyword filter and link policy do the sorting.

use super::{ExtractContext, SourceProfile, dedupe, find_location, matches_keywords};
use crate::config::CandidateConfig;
use crate::dates::parse_posted_at;
use crate::error::ConfigError;
use crate::models::JobPosting;
use crate::utils::collapse_whitespace;
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use tracing::{debug, info, instrument};

/// Decides whether an element is a candidate job-title container.
pub trait CandidatePredicate: fmt::Debug + Send + Sync {
    fn is_candidate(&self, element: &ElementRef<'_>) -> bool;
}

/// Matches elements whose joined attribute values contain any hint.
#[derive(Debug, Clone)]
pub struct AttributeHint {
    hints: Vec<String>,
}

impl AttributeHint {
    pub fn new<S: AsRef<str>>(hints: &[S]) -> Self {
        Self {
            hints: hints.iter().map(|h| h.as_ref().to_lowercase()).collect(),
        }
    }
}

impl CandidatePredicate for AttributeHint {
    fn is_candidate(&self, element: &ElementRef<'_>) -> bool {
        let attrs = element
            .value()
            .attrs()
            .map(|(_, value)| value.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        !attrs.is_empty() && self.hints.iter().any(|h| attrs.contains(h.as_str()))
    }
}

/// Matches elements selected by a CSS selector.
#[derive(Debug, Clone)]
pub struct SelectorMatch {
    selector: Selector,
}

impl SelectorMatch {
    pub fn parse(css: &str) -> Result<Self, String> {
        Selector::parse(css)
            .map(|selector| Self { selector })
            .map_err(|e| format!("{css}: {e}"))
    }
}

impl CandidatePredicate for SelectorMatch {
    fn is_candidate(&self, element: &ElementRef<'_>) -> bool {
        self.selector.matches(element)
    }
}

/// Heuristic extractor for one source's listing pages.
#[derive(Debug)]
pub struct HtmlExtractor {
    predicates: Vec<Box<dyn CandidatePredicate>>,
    anchor: Selector,
}

impl HtmlExtractor {
    pub fn new(predicates: Vec<Box<dyn CandidatePredicate>>) -> Self {
        Self {
            predicates,
            anchor: Selector::parse("a[href]").expect("static selector"),
        }
    }

    /// Build the predicate set described by a source's configuration.
    pub fn from_config(source_name: &str, cfg: &CandidateConfig) -> Result<Self, ConfigError> {
        let mut predicates: Vec<Box<dyn CandidatePredicate>> = Vec::new();
        if !cfg.attribute_hints.is_empty() {
            predicates.push(Box::new(AttributeHint::new(&cfg.attribute_hints)));
        }
        for css in &cfg.selectors {
            let matcher = SelectorMatch::parse(css).map_err(|reason| ConfigError::Selector {
                source_name: source_name.to_string(),
                reason,
            })?;
            predicates.push(Box::new(matcher));
        }
        Ok(Self::new(predicates))
    }

    /// Extract postings from one HTML document.
    #[instrument(level = "info", skip_all, fields(%base_url, company = %profile.company))]
    pub fn extract(
        &self,
        html: &str,
        base_url: &str,
        profile: &SourceProfile,
        ctx: &ExtractContext,
    ) -> Vec<JobPosting> {
        let document = Html::parse_document(html);

        let mut anchors = self.candidate_anchors(&document);
        if anchors.is_empty() {
            debug!("No candidate title elements; falling back to every link");
            anchors = document.select(&self.anchor).collect();
        }
        let candidates = anchors.len();

        let postings = dedupe(
            anchors
                .into_iter()
                .filter_map(|anchor| posting_from_anchor(anchor, profile, ctx))
                .collect(),
        );
        info!(candidates, count = postings.len(), "Extracted postings from HTML");
        postings
    }

    fn candidate_anchors<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| self.predicates.iter().any(|p| p.is_candidate(el)))
            .filter_map(|el| {
                if el.value().name() == "a" && el.value().attr("href").is_some() {
                    Some(el)
                } else {
                    el.select(&self.anchor).next()
                }
            })
            .filter(|a| !visible_text(a).is_empty())
            .collect()
    }
}

fn visible_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn posting_from_anchor(
    anchor: ElementRef<'_>,
    profile: &SourceProfile,
    ctx: &ExtractContext,
) -> Option<JobPosting> {
    let title = visible_text(&anchor);
    if title.is_empty() || !matches_keywords(&title, &ctx.keywords) {
        return None;
    }

    let href = anchor.value().attr("href")?;
    let Some(link) = profile.links.normalize(href) else {
        debug!(%title, %href, "Rejected link");
        return None;
    };

    let context = anchor
        .parent()
        .and_then(ElementRef::wrap)
        .map(|parent| visible_text(&parent))
        .unwrap_or_else(|| title.clone());

    let posted = parse_posted_at(&context, ctx.now);
    Some(JobPosting {
        location: find_location(&context, &profile.location_tokens),
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
    use chrono::{Duration, TimeZone, Utc};

    fn profile() -> SourceProfile {
        let adp = SourceConfig::adp();
        SourceProfile {
            company: adp.company.clone(),
            location_tokens: adp.location_tokens.clone(),
            links: LinkPolicy::from_config(&adp.name, &adp.links).unwrap(),
        }
    }

    fn ctx() -> ExtractContext {
        let keywords = ["software", "developer", "engineer"].map(String::from);
        ExtractContext::new(&keywords, Utc.with_ymd_and_hms(2025, 11, 10, 12, 0, 0).unwrap())
    }

    fn extractor() -> HtmlExtractor {
        HtmlExtractor::from_config("adp", &CandidateConfig::default()).unwrap()
    }

    const BASE: &str = "https://jobs.adp.com/en/jobs/";

    #[test]
    fn test_extracts_title_link_location_and_date() {
        let html = r#"
            <ul>
              <li class="job-card">
                <a href="/en/jobs/12345/senior-software-engineer">Senior Software Engineer</a>
                <span>Roseland, NJ, United States</span>
                <span>Posted 3 days ago</span>
              </li>
            </ul>"#;
        let jobs = extractor().extract(html, BASE, &profile(), &ctx());
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.title, "Senior Software Engineer");
        assert_eq!(job.company, "ADP");
        assert_eq!(job.link, "https://jobs.adp.com/en/jobs/12345/senior-software-engineer");
        assert_eq!(job.location, "United States");
        assert_eq!(job.posted_text, "3 days ago");
        assert_eq!(job.posted_at, Some(ctx().now - Duration::days(3)));
    }

    #[test]
    fn test_duplicate_anchors_in_different_markup_yield_one_posting() {
        let html = r#"
            <div class="job-tile">
              <h3 class="job-title"><a href="/en/jobs/777/developer">Java Developer</a></h3>
            </div>
            <section>
              <p data-role="title-link"><a href="/en/jobs/777/developer">Java Developer</a> Remote</p>
            </section>"#;
        let jobs = extractor().extract(html, BASE, &profile(), &ctx());
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Java Developer");
    }

    #[test]
    fn test_non_matching_titles_are_excluded() {
        let html = r#"
            <div class="job"><a href="/en/jobs/1/account-manager">Account Manager</a></div>
            <div class="job"><a href="/en/jobs/2/qa-engineer">QA Engineer</a></div>"#;
        let jobs = extractor().extract(html, BASE, &profile(), &ctx());
        let titles: Vec<_> = jobs.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["QA Engineer"]);
    }

    #[test]
    fn test_rejected_links_drop_the_candidate() {
        let html = r#"
            <div class="job"><a href="https://login.adp.com/apply?job=5">Software Engineer</a></div>
            <div class="job"><a href="/en/about/engineering">Engineering at ADP</a></div>"#;
        assert!(extractor().extract(html, BASE, &profile(), &ctx()).is_empty());
    }

    #[test]
    fn test_falls_back_to_all_anchors() {
        let html = r#"
            <table><tr>
              <td><a href="/en/jobs/88/platform-engineer">Platform Engineer</a></td>
              <td>Hybrid 2025-10-31</td>
            </tr></table>"#;
        let cfg = CandidateConfig {
            attribute_hints: vec!["opening".to_string()],
            selectors: Vec::new(),
        };
        let extractor = HtmlExtractor::from_config("adp", &cfg).unwrap();
        let jobs = extractor.extract(html, BASE, &profile(), &ctx());
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].location, "");
        assert_eq!(jobs[0].posted_text, "");
        assert_eq!(jobs[0].link, "https://jobs.adp.com/en/jobs/88/platform-engineer");
    }

    #[test]
    fn test_container_uses_first_descendant_anchor() {
        let html = r#"
            <div data-automation="jobTitle">
              <a href="/en/jobs/9/devops-engineer">  DevOps
                 Engineer </a>
              <a href="/en/jobs/10/other-engineer">Other Engineer</a>
            </div>"#;
        let jobs = extractor().extract(html, BASE, &profile(), &ctx());
        assert!(jobs.iter().any(|j| j.title == "DevOps Engineer"));
    }

    #[test]
    fn test_selector_predicate() {
        let cfg = CandidateConfig {
            attribute_hints: Vec::new(),
            selectors: vec!["li.opening".to_string()],
        };
        let extractor = HtmlExtractor::from_config("adp", &cfg).unwrap();
        let html = r#"
            <ul><li class="opening"><a href="/en/jobs/3/software-developer">Software Developer</a> India</li></ul>"#;
        let jobs = extractor.extract(html, BASE, &profile(), &ctx());
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].location, "India");
    }

    #[test]
    fn test_bad_selector_is_config_error() {
        let cfg = CandidateConfig {
            attribute_hints: Vec::new(),
            selectors: vec!["li[".to_string()],
        };
        let err = HtmlExtractor::from_config("adp", &cfg).unwrap_err();
        assert!(matches!(err, ConfigError::Selector { .. }));
    }

    #[test]
    fn test_attribute_hint_ignores_attribute_names() {
        let html = Html::parse_fragment(r#"<div title="x" class="card">a</div>"#);
        let div = html
            .select(&Selector::parse("div").unwrap())
            .next()
            .unwrap();
        assert!(!AttributeHint::new(&["title"]).is_candidate(&div));
        assert!(AttributeHint::new(&["card"]).is_candidate(&div));
    }
}
