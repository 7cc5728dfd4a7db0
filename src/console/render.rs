use colored::Colorize;
use tracing::debug;

use crate::traversal::{Speaker, TranscriptEntry};

/// Formats one transcript entry for the terminal. Only the latest bot entry
/// lists its options, numbered from 1.
pub fn format_entry(entry: &TranscriptEntry, show_options: bool) -> String {
    let mut out = String::new();

    match entry.speaker {
        Speaker::Bot => {
            out.push_str(&format!("{} {}\n", "bot>".cyan().bold(), entry.text));
            if let Some(html) = entry.html_content.as_deref() {
                let body = html_to_text(html);
                if !body.is_empty() {
                    for line in body.lines() {
                        out.push_str(&format!("     {}\n", line));
                    }
                }
            }
            if show_options {
                for (index, option) in entry.options.iter().enumerate() {
                    out.push_str(&format!(
                        "  {} {}\n",
                        format!("[{}]", index + 1).yellow(),
                        option.text
                    ));
                }
            }
        }
        Speaker::User => {
            out.push_str(&format!("{} {}\n", "you>".green().bold(), entry.text));
        }
    }

    out
}

/// Terminal width used when wrapping rich bodies.
const RENDER_WIDTH: usize = 80;

/// Renders author HTML as plain text and drops blank lines. Falls back to the
/// raw markup when the document cannot be rendered.
pub fn html_to_text(html: &str) -> String {
    let rendered = match html2text::from_read(html.as_bytes(), RENDER_WIDTH) {
        Ok(text) => text,
        Err(e) => {
            debug!("Could not render html content: {}", e);
            html.to_string()
        }
    };

    rendered
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_is_stripped() {
        let html = "<h3>Resetting</h3>\n<ol>\n  <li>Click <strong>Forgot</strong></li>\n</ol>";
        let text = html_to_text(html);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Resetting"));
        assert!(lines[1].contains("Click") && lines[1].contains("Forgot"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn entities_are_decoded() {
        let text = html_to_text("<p>Terms &amp; conditions</p>");
        assert_eq!(text, "Terms & conditions");
    }

    #[test]
    fn quoted_attributes_do_not_leak_into_text() {
        let text = html_to_text(r#"<p>Please <a title="a > b">call</a> us</p>"#);
        assert!(text.contains("call"));
        assert!(text.contains("us"));
        assert!(!text.contains("b\">"));
        assert!(!text.contains("title"));
    }

    #[test]
    fn rendered_body_is_indented_under_the_message() {
        colored::control::set_override(false);
        let entry = TranscriptEntry {
            speaker: Speaker::Bot,
            scenario_id: Some("terms".to_string()),
            text: "Our terms".to_string(),
            html_content: Some("<p>Terms &amp; conditions</p>".to_string()),
            options: Vec::new(),
        };
        assert_eq!(
            format_entry(&entry, true),
            "bot> Our terms\n     Terms & conditions\n"
        );
    }

    #[test]
    fn user_entries_have_no_options() {
        colored::control::set_override(false);
        let entry = TranscriptEntry {
            speaker: Speaker::User,
            scenario_id: None,
            text: "go".to_string(),
            html_content: None,
            options: Vec::new(),
        };
        assert_eq!(format_entry(&entry, true), "you> go\n");
    }
}
