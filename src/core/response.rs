//! Chat message size utilities
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 2.0.0: Telegram limits, line-aware truncation with a truncation notice
//! - 1.0.0: Chunking helpers

/// Telegram message text limit
pub const MESSAGE_LIMIT: usize = 4096;
/// Formatted query responses are kept under this size
pub const MAX_RESPONSE_LENGTH: usize = 4000;

const TRUNCATION_NOTICE: &str = "\n\n...(message truncated due to length)";

/// Chunk text into pieces that fit `max_size` bytes (UTF-8 safe, line-aware)
pub fn chunk_text(text: &str, max_size: usize) -> Vec<String> {
    if text.len() <= max_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let line_with_newline = format!("{line}\n");
        if current.len() + line_with_newline.len() > max_size {
            if !current.is_empty() {
                chunks.push(current.trim_end().to_string());
                current = String::new();
            }
            if line_with_newline.len() > max_size {
                chunks.extend(chunk_long_line(line, max_size));
            } else {
                current = line_with_newline;
            }
        } else {
            current.push_str(&line_with_newline);
        }
    }
    if !current.is_empty() {
        chunks.push(current.trim_end().to_string());
    }
    chunks
}

fn chunk_long_line(line: &str, max_size: usize) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();

    for ch in line.chars() {
        if current.len() + ch.len_utf8() > max_size && !current.is_empty() {
            result.push(current);
            current = String::new();
        }
        current.push(ch);
    }

    if !current.is_empty() {
        result.push(current);
    }

    result
}

/// Chunk text for Telegram messages
pub fn chunk_for_message(text: &str) -> Vec<String> {
    chunk_text(text, MESSAGE_LIMIT)
}

/// Truncate a formatted response to [`MAX_RESPONSE_LENGTH`]
pub fn truncate_response(text: &str) -> String {
    truncate_with_notice(text, MAX_RESPONSE_LENGTH)
}

/// Cut `text` to `max_length - 100` bytes, backing up to the last newline when
/// it falls within the final 200 bytes, and append a truncation notice.
pub fn truncate_with_notice(text: &str, max_length: usize) -> String {
    if text.len() <= max_length {
        return text.to_string();
    }

    let mut end = max_length.saturating_sub(100);
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    let mut truncated = &text[..end];

    if let Some(last_newline) = truncated.rfind('\n') {
        if last_newline > max_length.saturating_sub(200) {
            truncated = &truncated[..last_newline];
        }
    }

    format!("{truncated}{TRUNCATION_NOTICE}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_no_chunk() {
        assert_eq!(chunk_text("hello", 100), vec!["hello"]);
    }

    #[test]
    fn test_chunk_respects_lines() {
        let result = chunk_text("line1\nline2\nline3", 12);
        assert!(result.len() >= 2);
        for chunk in &result {
            assert!(!chunk.ends_with('\n'));
        }
    }

    #[test]
    fn test_chunk_handles_long_lines() {
        let result = chunk_text(&"a".repeat(100), 30);
        assert!(result.len() >= 3);
        for chunk in &result {
            assert!(chunk.len() <= 30);
        }
    }

    #[test]
    fn test_message_limit() {
        let result = chunk_for_message(&"a".repeat(5000));
        assert_eq!(result.len(), 2);
        assert!(result[0].len() <= MESSAGE_LIMIT);
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_response("short"), "short");
    }

    #[test]
    fn test_truncate_long_text_without_newlines() {
        let text = "a".repeat(5000);
        let result = truncate_response(&text);
        assert!(result.ends_with("...(message truncated due to length)"));
        assert_eq!(result.len(), 3900 + TRUNCATION_NOTICE.len());
    }

    #[test]
    fn test_truncate_backs_up_to_late_newline() {
        // Newline at byte 3850 lies beyond max - 200 (3800)
        let text = format!("{}\n{}", "a".repeat(3850), "b".repeat(1000));
        let result = truncate_response(&text);
        assert!(result.starts_with(&"a".repeat(3850)));
        assert!(!result.contains('b'));
    }

    #[test]
    fn test_truncate_ignores_early_newline() {
        let text = format!("{}\n{}", "a".repeat(100), "b".repeat(5000));
        let result = truncate_response(&text);
        // Early newline is kept, cut happens at 3900 bytes
        assert_eq!(result.len(), 3900 + TRUNCATION_NOTICE.len());
    }

    #[test]
    fn test_truncate_utf8_safe() {
        let text = "世界".repeat(2000);
        let result = truncate_response(&text);
        assert!(result.len() <= 3900 + TRUNCATION_NOTICE.len());
        assert!(result.ends_with("...(message truncated due to length)"));
    }
}
