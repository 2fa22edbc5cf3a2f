use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Truncate to at most `max_width` display columns, appending "..." when
/// anything was cut. Counts columns, not bytes, so wide CJK glyphs do not
/// overflow list rows.
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let budget = max_width.saturating_sub(3);
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(1);
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str("...");
    out
}

/// Display column of a cursor sitting after `cursor_chars` characters.
/// Used to place the terminal cursor inside single-line input prompts.
pub fn cursor_column(text: &str, cursor_chars: usize) -> u16 {
    text.chars()
        .take(cursor_chars)
        .map(|ch| ch.width().unwrap_or(1))
        .sum::<usize>() as u16
}
