//! Placeholder substitution of a `Resume` into a fixed template.
//!
//! Placeholders are `{{name}}`. The body knows `name`, `email`, `balance`,
//! `credit_avg`, `debit_avg` and `months`; the month row knows `month`,
//! `month_number` and `count`. `months` expands to one month row per bucket.

use super::stats::{MonthBucket, Resume};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Deserialize;
use thiserror::Error;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_]+)\s*\}\}").expect("valid placeholder regex")
});

pub const DEFAULT_BODY: &str = "<html>
<body>
<h2>Hi {{name}}, this is the resume of your transactions</h2>
<p>Total balance is {{balance}}</p>
<p>Average debit amount: {{debit_avg}}</p>
<p>Average credit amount: {{credit_avg}}</p>
<ul>
{{months}}</ul>
</body>
</html>
";

pub const DEFAULT_MONTH_ROW: &str = "<li>Number of transactions in {{month}}: {{count}}</li>\n";

/// Template is unusable. A configuration fault, never a data fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unknown placeholder `{name}` in {section} template")]
    UnknownPlaceholder { section: &'static str, name: String },
    #[error("unbalanced braces at byte {offset} in {section} template")]
    Malformed { section: &'static str, offset: usize },
}

/// Resume template pair: document body plus per-month row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResumeTemplate {
    pub body: String,
    pub month_row: String,
}

impl Default for ResumeTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_BODY, DEFAULT_MONTH_ROW)
    }
}

impl ResumeTemplate {
    pub fn new(body: impl Into<String>, month_row: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            month_row: month_row.into(),
        }
    }

    /// Checks both sections without any resume data.
    pub fn validate(&self) -> Result<(), RenderError> {
        substitute("month_row", &self.month_row, |name| {
            month_field(&MonthBucket { month: 1, count: 0 }, name)
        })?;
        substitute("body", &self.body, |name| match name {
            "name" | "email" | "balance" | "credit_avg" | "debit_avg" | "months" => {
                Some(String::new())
            }
            _ => None,
        })?;
        Ok(())
    }
}

/// Renders `resume` through `template`.
///
/// User-supplied text is HTML-escaped; numbers and month names are not.
pub fn render(resume: &Resume, template: &ResumeTemplate) -> Result<String, RenderError> {
    let mut months = String::new();
    for bucket in &resume.month_breakdown {
        months.push_str(&substitute("month_row", &template.month_row, |name| {
            month_field(bucket, name)
        })?);
    }

    substitute("body", &template.body, |name| match name {
        "name" => Some(escape_html(&resume.user.name)),
        "email" => Some(escape_html(&resume.user.email)),
        "balance" => Some(resume.balance.clone()),
        "credit_avg" => Some(resume.credit_avg.clone()),
        "debit_avg" => Some(resume.debit_avg.clone()),
        "months" => Some(months.clone()),
        _ => None,
    })
}

fn month_field(bucket: &MonthBucket, name: &str) -> Option<String> {
    match name {
        "month" => Some(bucket.name().to_string()),
        "month_number" => Some(bucket.month.to_string()),
        "count" => Some(bucket.count.to_string()),
        _ => None,
    }
}

fn substitute(
    section: &'static str,
    template: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, RenderError> {
    let mut rendered = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let (whole, name) = placeholder_parts(&caps);
        let literal = &template[last..whole.0];
        ensure_no_stray_braces(section, literal, last)?;
        rendered.push_str(literal);

        let value = lookup(name).ok_or_else(|| RenderError::UnknownPlaceholder {
            section,
            name: name.to_string(),
        })?;
        rendered.push_str(&value);
        last = whole.1;
    }

    let tail = &template[last..];
    ensure_no_stray_braces(section, tail, last)?;
    rendered.push_str(tail);
    Ok(rendered)
}

fn placeholder_parts<'t>(caps: &Captures<'t>) -> ((usize, usize), &'t str) {
    // group 0 and group 1 always participate in a match of PLACEHOLDER_RE
    let whole = caps.get(0).map_or((0, 0), |m| (m.start(), m.end()));
    let name = caps.get(1).map_or("", |m| m.as_str());
    (whole, name)
}

fn ensure_no_stray_braces(
    section: &'static str,
    literal: &str,
    base_offset: usize,
) -> Result<(), RenderError> {
    let stray = [literal.find("{{"), literal.find("}}")]
        .into_iter()
        .flatten()
        .min();
    match stray {
        Some(offset) => Err(RenderError::Malformed {
            section,
            offset: base_offset + offset,
        }),
        None => Ok(()),
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
