//! Email digest rendering.
//!
//! One digest per source run: an HTML table, a plain-text fallback with the
//! same rows, and a CSV attachment body. A run with no postings still renders
//! a "No matches found" digest so the recipient knows the watch ran.

use crate::models::JobPosting;
use crate::utils::{csv_field, escape_html};

pub const CSV_HEADER: &str = "title,company,location,link,posted_text";
pub const CSV_FILENAME: &str = "jobs.csv";

/// A rendered digest, ready to be addressed and sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub subject: String,
    pub html: String,
    pub text: String,
    /// CSV body, present only when there is at least one row.
    pub csv: Option<String>,
}

/// Render the digest for `company`'s postings.
pub fn render(company: &str, keywords: &[String], postings: &[JobPosting]) -> Digest {
    let filter = keywords.join(", ");
    Digest {
        subject: subject(company, postings.len()),
        html: render_html(company, &filter, postings),
        text: render_text(company, &filter, postings),
        csv: (!postings.is_empty()).then(|| render_csv(postings)),
    }
}

pub fn subject(company: &str, count: usize) -> String {
    format!("[Job Watch] {company}: {count} matching role(s)")
}

fn render_html(company: &str, filter: &str, postings: &[JobPosting]) -> String {
    let company = escape_html(company);
    let filter = escape_html(filter);
    if postings.is_empty() {
        return format!("<h2>No matches found for {company}</h2><p>Filter: {filter}</p>");
    }

    let rows: String = postings
        .iter()
        .map(|job| {
            format!(
                "<tr><td><a href=\"{}\">{}</a></td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&job.link),
                escape_html(&job.title),
                escape_html(&job.location),
                escape_html(&job.posted_text),
            )
        })
        .collect();

    format!(
        "<h2>{company} careers</h2>\n\
         <p>Filter: {filter}</p>\n\
         <table border=\"1\" cellpadding=\"6\" cellspacing=\"0\">\n\
         <tr><th>Title</th><th>Location</th><th>Posted</th></tr>\n\
         {rows}</table>\n\
         <p>Total: {}</p>\n",
        postings.len()
    )
}

fn render_text(company: &str, filter: &str, postings: &[JobPosting]) -> String {
    if postings.is_empty() {
        return format!("No matches found for {company}\nFilter: {filter}\n");
    }
    let mut out = format!("{company} careers\nFilter: {filter}\n\n");
    for job in postings {
        out.push_str(&format!("- {}\n  {}\n", job.title, job.link));
        let details: Vec<&str> = [job.location.as_str(), job.posted_text.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        if !details.is_empty() {
            out.push_str(&format!("  {}\n", details.join(" | ")));
        }
    }
    out.push_str(&format!("\nTotal: {}\n", postings.len()));
    out
}

fn render_csv(postings: &[JobPosting]) -> String {
    let mut out = format!("{CSV_HEADER}\r\n");
    for job in postings {
        let fields = [
            &job.title,
            &job.company,
            &job.location,
            &job.link,
            &job.posted_text,
        ];
        let line = fields
            .iter()
            .map(|f| csv_field(f))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push_str("\r\n");
    }
    out
}
