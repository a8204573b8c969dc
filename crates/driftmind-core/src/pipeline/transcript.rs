//! Transcript extractor (C3).
//!
//! Reduces a raw transcript log to salient text under a character budget.
//! Two input shapes are accepted: newline-delimited JSON (structured
//! streaming) and plain text.

const NOISE_PREFIXES: &[&str] = &["[tool_use]", "[tool_result]", "Tokens:", "---", "==="];
const SYSTEM_REMINDER_PREFIX: &str = "<system-reminder>";
const ELISION_MARKER: &str = "\n\n[...elided...]\n\n";

#[derive(Debug, serde::Deserialize)]
struct StructuredLine {
    #[serde(rename = "type")]
    role: String,
    message: Option<StructuredMessage>,
}

#[derive(Debug, serde::Deserialize)]
struct StructuredMessage {
    content: Vec<StructuredBlock>,
}

#[derive(Debug, serde::Deserialize)]
struct StructuredBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

/// Extract salient text from `raw`, sampling proportionally if the result
/// would exceed `max_chars`. Empty input yields empty output.
pub fn extract(raw: &str, max_chars: usize) -> String {
    let meaningful = if is_structured(raw) {
        extract_structured(raw)
    } else {
        extract_plain(raw)
    };
    let trimmed = meaningful.trim().to_string();
    if trimmed.chars().count() <= max_chars {
        return trimmed;
    }
    proportional_sample(&trimmed, max_chars)
}

fn is_structured(raw: &str) -> bool {
    raw.trim_start().starts_with('{')
}

fn extract_plain(raw: &str) -> String {
    raw.lines()
        .filter(|line| !NOISE_PREFIXES.iter().any(|p| line.trim_start().starts_with(p)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn extract_structured(raw: &str) -> String {
    let mut out = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed: Result<StructuredLine, _> = serde_json::from_str(line);
        let Ok(parsed) = parsed else { continue };
        if parsed.role != "assistant" && parsed.role != "human" {
            continue;
        }
        let Some(message) = parsed.message else { continue };
        for block in message.content {
            if block.block_type != "text" {
                continue;
            }
            let Some(text) = block.text else { continue };
            if parsed.role == "human" && text.trim_start().starts_with(SYSTEM_REMINDER_PREFIX) {
                continue;
            }
            out.push(text);
        }
    }
    out.join("\n")
}

/// First 40%, middle 20%, last 40% of `text`'s characters, joined by
/// elision markers, truncated to fit within `max_chars` total.
fn proportional_sample(text: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    if total == 0 {
        return String::new();
    }

    let budget = max_chars.max(3);
    let head_budget = (budget as f64 * 0.4) as usize;
    let mid_budget = (budget as f64 * 0.2) as usize;
    let tail_budget = budget.saturating_sub(head_budget + mid_budget);

    let head_len = head_budget.min(total);
    let tail_len = tail_budget.min(total);
    let mid_start = total / 2 - mid_budget.min(total) / 2;
    let mid_len = mid_budget.min(total.saturating_sub(mid_start));

    let head: String = chars[..head_len].iter().collect();
    let mid: String = chars[mid_start..mid_start + mid_len].iter().collect();
    let tail: String = chars[total - tail_len..].iter().collect();

    format!("{head}{ELISION_MARKER}{mid}{ELISION_MARKER}{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(extract("", 10_000), "");
        assert_eq!(extract("   \n  ", 10_000), "");
    }

    #[test]
    fn plain_text_drops_noise_lines() {
        let raw = "human: hello\n--- tool ---\n[tool_use] foo\nTokens: 42\nassistant: hi there";
        let out = extract(raw, 10_000);
        assert!(out.contains("hello"));
        assert!(out.contains("hi there"));
        assert!(!out.contains("tool_use"));
        assert!(!out.contains("Tokens"));
    }

    #[test]
    fn structured_stream_filters_system_reminders() {
        let raw = concat!(
            r#"{"type":"human","message":{"content":[{"type":"text","text":"<system-reminder>ignore me</system-reminder>"}]}}"#,
            "\n",
            r#"{"type":"human","message":{"content":[{"type":"text","text":"real question"}]}}"#,
            "\n",
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"real answer"}]}}"#,
        );
        let out = extract(raw, 10_000);
        assert!(!out.contains("ignore me"));
        assert!(out.contains("real question"));
        assert!(out.contains("real answer"));
    }

    #[test]
    fn long_input_is_proportionally_sampled_within_budget() {
        let raw = "x".repeat(20_000);
        let out = extract(&raw, 1_000);
        assert!(out.chars().count() <= 1_000 + ELISION_MARKER.len() * 2);
        assert!(out.starts_with('x'));
        assert!(out.ends_with('x'));
    }

    #[test]
    fn ordering_is_preserved_in_sampled_output() {
        let raw: String = (0..10_000).map(|i| char::from((b'a' + (i % 26) as u8))).collect();
        let out = extract(&raw, 500);
        let head_idx = out.find(ELISION_MARKER).unwrap();
        let tail_idx = out.rfind(ELISION_MARKER).unwrap();
        assert!(head_idx < tail_idx);
    }
}
