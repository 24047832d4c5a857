//! Chat moderation

/// Words masked when no blocklist is configured
pub const DEFAULT_BLOCKLIST: &[&str] = &["fuck", "shit", "bitch", "asshole", "bastard", "cunt"];

/// Pluggable text moderation applied before a chat line is broadcast
pub trait ProfanityFilter: Send + Sync {
    fn clean(&self, text: &str) -> String;
}

/// Masks whole blocklisted words with asterisks, ignoring case
#[derive(Debug, Clone)]
pub struct WordListFilter {
    words: Vec<String>,
}

impl WordListFilter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    fn is_blocked(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        self.words.iter().any(|w| *w == lower)
    }
}

impl Default for WordListFilter {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKLIST.iter().copied())
    }
}

impl ProfanityFilter for WordListFilter {
    fn clean(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut word = String::new();

        for c in text.chars() {
            if c.is_alphanumeric() {
                word.push(c);
                continue;
            }
            self.flush_word(&mut word, &mut out);
            out.push(c);
        }
        self.flush_word(&mut word, &mut out);

        out
    }
}

impl WordListFilter {
    fn flush_word(&self, word: &mut String, out: &mut String) {
        if word.is_empty() {
            return;
        }
        if self.is_blocked(word) {
            out.extend(std::iter::repeat('*').take(word.chars().count()));
        } else {
            out.push_str(word);
        }
        word.clear();
    }
}

/// Cut raw input to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Truncate, moderate and prefix with the sender's name
pub fn format_chat_line(
    filter: &dyn ProfanityFilter,
    name: &str,
    raw: &str,
    max_chars: usize,
) -> String {
    let cleaned = filter.clean(truncate_chars(raw, max_chars));
    format!("{name}: {cleaned}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_blocked_words_case_insensitive() {
        let filter = WordListFilter::new(["darn", "heck"]);
        assert_eq!(filter.clean("Darn it, HECK!"), "**** it, ****!");
    }

    #[test]
    fn test_keeps_words_containing_blocked_substring() {
        let filter = WordListFilter::new(["ass"]);
        assert_eq!(filter.clean("classic pass ass"), "classic pass ***");
    }

    #[test]
    fn test_truncates_on_char_boundary() {
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
        assert_eq!(truncate_chars("short", 18), "short");
        assert_eq!(truncate_chars("", 18), "");
    }

    #[test]
    fn test_chat_line_format() {
        let filter = WordListFilter::new(["darn"]);
        let line = format_chat_line(&filter, "Ana", "darn this is a very long message", 18);
        assert_eq!(line, "Ana: **** this is a ver");
    }

    #[test]
    fn test_default_filter_masks() {
        let filter = WordListFilter::default();
        assert_eq!(filter.clean("oh shit"), "oh ****");
    }
}
