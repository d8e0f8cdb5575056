use super::DocumentEntry;
use crate::config::{IndexConfig, Labels};
use pct_str::{Encoder, PctString};

/// Renders the entries as a four-column Markdown table: date, title, format, link.
pub fn render_table(entries: &[DocumentEntry], labels: &Labels, link_prefix: &str) -> String {
    let mut out = format!(
        "| {} | {} | {} | {} |\n|---|---|---|---|\n",
        escape_cell(&labels.date),
        escape_cell(&labels.title),
        escape_cell(&labels.format),
        escape_cell(&labels.link)
    );
    for entry in entries {
        out.push_str(&format!(
            "| {} | {} | {} | [{}]({}{}) |\n",
            escape_cell(&entry.date_text()),
            escape_cell(entry.title()),
            entry.extension(),
            escape_label(entry.link().label()),
            link_prefix,
            link_target(entry.link().path())
        ));
    }
    out
}

/// Renders the complete index page: front matter followed by the table.
pub fn render_page(entries: &[DocumentEntry], config: &IndexConfig) -> String {
    format!(
        "---\nlayout: {}\ntitle: {}\n---\n\n{}",
        yaml_string(&config.layout),
        yaml_string(&config.title),
        render_table(entries, &config.labels, &config.link_prefix)
    )
}

/// Everything but the RFC 3986 unreserved characters.
struct NotUnreserved;

impl Encoder for NotUnreserved {
    fn encode(&self, c: char) -> bool {
        !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
    }
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

fn escape_cell(text: &str) -> String {
    single_line(text).replace('|', "\\|")
}

fn escape_label(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in single_line(text).chars() {
        if matches!(c, '|' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// Each `/`-separated segment is percent-encoded on its own so the separators survive.
fn link_target(path: &str) -> String {
    path.split('/')
        .map(|segment| PctString::encode(segment.chars(), NotUnreserved).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn yaml_string(text: &str) -> String {
    format!(
        "\"{}\"",
        single_line(text).replace('\\', "\\\\").replace('"', "\\\"")
    )
}
