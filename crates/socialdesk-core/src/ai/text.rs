//! Post-processing of model output into platform-ready captions.

use socialdesk_types::post::{extract_hashtags, normalize_hashtag};

/// Truncate `text` to at most `limit` characters, cutting at the last word
/// boundary and appending an ellipsis when anything was removed.
pub fn truncate_at_word(text: &str, limit: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= limit {
        return text.to_string();
    }
    if limit == 0 {
        return String::new();
    }

    let budget: String = text.chars().take(limit - 1).collect();
    let cut = match budget.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => &budget[..idx],
        _ => budget.as_str(),
    };
    format!("{}…", cut.trim_end())
}

/// Split model output into caption body and hashtags.
///
/// Trailing lines made only of hashtags are moved into the tag list; tags
/// inside sentences stay in the body but are also reported. Surrounding
/// quotes and markdown emphasis that models like to add are stripped.
pub fn split_caption(raw: &str) -> (String, Vec<String>) {
    let cleaned = strip_wrapping(raw);
    let mut lines: Vec<&str> = cleaned.lines().collect();

    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    let mut trailing_tags: Vec<String> = Vec::new();
    while let Some(last) = lines.last() {
        let words: Vec<&str> = last.split_whitespace().collect();
        if !words.is_empty() && words.iter().all(|w| w.starts_with('#')) {
            let mut tags: Vec<String> = words.iter().filter_map(|w| normalize_hashtag(w)).collect();
            tags.append(&mut trailing_tags);
            trailing_tags = tags;
            lines.pop();
            while lines.last().is_some_and(|l| l.trim().is_empty()) {
                lines.pop();
            }
        } else {
            break;
        }
    }

    let body = lines.join("\n").trim().to_string();
    let mut hashtags = extract_hashtags(&body);
    for tag in trailing_tags {
        if !hashtags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            hashtags.push(tag);
        }
    }
    (body, hashtags)
}

/// Fit a caption body and its hashtags into `limit` characters once they are
/// joined as `body\n\n#tag #tag`.
///
/// Tags already in the body are left there. The trailing tag line is capped
/// at half the limit by dropping its last tags, and the body gets the rest.
pub fn fit_caption(body: &str, hashtags: &[String], limit: usize) -> (String, Vec<String>) {
    let in_body: Vec<String> = extract_hashtags(body).iter().map(|t| t.to_lowercase()).collect();
    let mut extra: Vec<String> = hashtags
        .iter()
        .filter(|t| !in_body.contains(&t.to_lowercase()))
        .cloned()
        .collect();

    while !extra.is_empty() && tag_line_len(&extra) > limit / 2 {
        extra.pop();
    }
    let body = truncate_at_word(body, limit - tag_line_len(&extra));
    (body, extra)
}

/// Characters taken by `"\n\n" + tags.join(" ")`.
fn tag_line_len(tags: &[String]) -> usize {
    if tags.is_empty() {
        return 0;
    }
    2 + tags.iter().map(|t| t.chars().count()).sum::<usize>() + tags.len() - 1
}

/// Parse a list of hashtags from free-form model output (comma, newline, or
/// space separated, with or without `#`).
pub fn parse_hashtag_list(raw: &str) -> Vec<String> {
    let words: Vec<String> = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|w| w.trim_matches(|c: char| c == '*' || c == '-' || c == '.' || c == '"'))
        .filter(|w| !w.is_empty() && !w.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect();
    socialdesk_types::post::normalize_hashtags(&words)
}

fn strip_wrapping(raw: &str) -> String {
    let mut s = raw.trim();
    for (open, close) in [("\"", "\""), ("“", "”"), ("**", "**")] {
        if s.len() > open.len() + close.len() && s.starts_with(open) && s.ends_with(close) {
            s = s[open.len()..s.len() - close.len()].trim();
        }
    }
    s.to_string()
}
