//! CSV export for event signups.
//!
//! Produces the admin-panel download format: a fixed five-column header and
//! one row per signup, every field double-quoted with embedded quotes
//! doubled. The format is small and fixed, so the writer is hand-rolled
//! rather than pulling in a CSV crate that would fight the always-quote
//! convention.

/// One exported signup row, already rendered to strings.
#[derive(Debug, Clone)]
pub struct SignupRow {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Empty string when no phone was given.
    pub phone: String,
    /// RFC 3339 timestamp, or empty.
    pub signed_up_at: String,
}

/// Header row, in column order.
const HEADERS: [&str; 5] = ["First Name", "Last Name", "Email", "Phone", "Signed Up At"];

/// Render signups as a CSV document.
///
/// The first line is always the header; an empty input produces a
/// header-only document. Rows are joined by `\n` with no trailing newline.
pub fn signups_to_csv(rows: &[SignupRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(csv_line(HEADERS.iter().copied()));
    for row in rows {
        lines.push(csv_line(
            [
                row.first_name.as_str(),
                row.last_name.as_str(),
                row.email.as_str(),
                row.phone.as_str(),
                row.signed_up_at.as_str(),
            ]
            .into_iter(),
        ));
    }
    lines.join("\n")
}

/// Derive a download filename from an event title: non-alphanumerics become
/// `-`, suffixed with `-signups.csv`.
pub fn export_filename(event_title: &str) -> String {
    let slug: String = event_title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("{slug}-signups.csv")
}

fn csv_line<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    fields
        .map(|field| format!("\"{}\"", field.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}
