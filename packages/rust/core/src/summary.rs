//! Notes text written back to the account: a company-info block and an
//! enrichment summary, both as HTML fragments with fixed labels.

use chrono::{DateTime, Utc};
use rolodex_shared::{CompanyFacts, ScoredContact};

/// Placeholder for any company fact the provider did not supply.
pub const NOT_FOUND: &str = "Not found";

/// Summary used when no contacts were selected.
pub const NO_CONTACTS: &str = "No contacts available for enrichment.";

/// Separator between the company-info block and the summary.
pub const NOTES_SEPARATOR: &str = "<br><br>";

/// Render the company-info block. Returns an empty string when `facts` is `None`.
pub fn format_company_info(facts: Option<&CompanyFacts>, generated_at: DateTime<Utc>) -> String {
    let Some(facts) = facts else {
        return String::new();
    };

    let overview = facts
        .description
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(escape_html)
        .unwrap_or_else(|| NOT_FOUND.to_string());

    let headquarters = facts
        .location
        .as_ref()
        .map(|loc| {
            [&loc.city, &loc.state_province_region, &loc.country_name]
                .into_iter()
                .filter_map(|part| part.as_deref().map(str::trim).filter(|s| !s.is_empty()))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|s| !s.is_empty())
        .map(|s| escape_html(&s))
        .unwrap_or_else(|| NOT_FOUND.to_string());

    let size = render_fact(facts.num_employees.as_ref());
    let revenue = render_fact(facts.revenue());

    [
        "<b>Company Info</b>".to_string(),
        format!("<b>Generated:</b> {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        format!("<b>Overview:</b> {overview}"),
        format!("<b>Headquarters:</b> {headquarters}"),
        format!("<b>Company Size:</b> {size}"),
        format!("<b>Revenue:</b> {revenue}"),
    ]
    .join("<br>")
}

/// Render the enrichment summary.
///
/// `existing` and `candidates` are the counts seen before deduplication;
/// `selected` is the final ranked list written back.
pub fn format_enrichment_summary(
    existing: usize,
    candidates: usize,
    selected: &[ScoredContact],
) -> String {
    if selected.is_empty() {
        return NO_CONTACTS.to_string();
    }

    let names = selected
        .iter()
        .map(|s| escape_html(&s.contact.name))
        .collect::<Vec<_>>()
        .join(", ");

    [
        "<b>Enrichment Summary</b>".to_string(),
        format!("<b>Contacts Before:</b> {existing}"),
        format!("<b>Candidates Found:</b> {candidates}"),
        format!("<b>New Contacts:</b> {}", selected.len()),
        format!("<b>Contacts After:</b> {}", existing + selected.len()),
        format!(
            "<b>Average Rating:</b> {}",
            format_average(average(selected.iter().map(|s| s.rating)))
        ),
        format!(
            "<b>Average Priority:</b> {}",
            format_average(average(selected.iter().map(|s| s.priority)))
        ),
        format!("<b>Contacts Added:</b> {names}"),
    ]
    .join("<br>")
}

/// Join the two blocks into the account notes. The separator is always
/// present, even when the company block is empty.
pub fn compose_notes(company_info: &str, summary: &str) -> String {
    format!("{company_info}{NOTES_SEPARATOR}{summary}")
}

/// Arithmetic mean, `None` for an empty sequence.
pub fn average(values: impl Iterator<Item = usize>) -> Option<f64> {
    let (sum, count) = values.fold((0usize, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum as f64 / count as f64)
}

fn format_average(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

fn render_fact(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => NOT_FOUND.to_string(),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => NOT_FOUND.to_string(),
        Some(serde_json::Value::String(s)) => escape_html(s.trim()),
        Some(other) => escape_html(&other.to_string()),
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
