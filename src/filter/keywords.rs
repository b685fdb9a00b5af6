/// Keyword-based content filter
///
/// Case-insensitive phrase matching on word boundaries against built-in
/// category lists, with config-supplied extra blocked words layered on
/// top.
use crate::filter::{ContentFilter, FilterVerdict, Severity};
use async_trait::async_trait;

struct FilterCategory {
    name: &'static str,
    severity: Severity,
    phrases: Vec<String>,
}

pub struct KeywordFilter {
    categories: Vec<FilterCategory>,
}

impl KeywordFilter {
    pub fn new() -> Self {
        Self::with_extra_blocked(&[])
    }

    /// Built-in lists plus additional blocked words from configuration
    pub fn with_extra_blocked(extra: &[String]) -> Self {
        let mut categories = vec![
            FilterCategory {
                name: "profanity",
                severity: Severity::Block,
                phrases: to_phrases(&["fuck", "shit", "bitch", "asshole", "bastard"]),
            },
            FilterCategory {
                name: "harassment",
                severity: Severity::Block,
                phrases: to_phrases(&["kill yourself", "kys", "go die", "nobody likes you"]),
            },
            FilterCategory {
                name: "spam",
                severity: Severity::Warn,
                phrases: to_phrases(&[
                    "free followers",
                    "click this link",
                    "buy now",
                    "limited offer",
                ]),
            },
            FilterCategory {
                name: "personal_info",
                severity: Severity::Flag,
                phrases: to_phrases(&["phone number", "home address", "password"]),
            },
        ];

        if !extra.is_empty() {
            categories.push(FilterCategory {
                name: "custom",
                severity: Severity::Block,
                phrases: extra.iter().map(|s| s.to_lowercase()).collect(),
            });
        }

        Self { categories }
    }
}

impl Default for KeywordFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentFilter for KeywordFilter {
    async fn check(&self, text: &str) -> FilterVerdict {
        let lowered = text.to_lowercase();
        let mut violations = Vec::new();
        let mut categories: Vec<String> = Vec::new();
        let mut max_severity: Option<Severity> = None;

        for category in &self.categories {
            let mut hit = false;
            for phrase in &category.phrases {
                if contains_phrase(&lowered, phrase) {
                    violations.push(phrase.clone());
                    hit = true;
                }
            }
            if hit {
                categories.push(category.name.to_string());
                max_severity = Some(match max_severity {
                    Some(current) => current.max(category.severity),
                    None => category.severity,
                });
            }
        }

        match max_severity {
            None => FilterVerdict::clean(),
            Some(severity) => FilterVerdict {
                is_clean: false,
                should_block: severity == Severity::Block,
                should_warn: severity >= Severity::Warn,
                should_flag: true,
                violations,
                categories,
            },
        }
    }
}

fn to_phrases(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Phrase match on word boundaries. `haystack` must already be lowercased.
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(phrase) {
        let at = start + pos;
        let end = at + phrase.len();
        let before_ok = at == 0
            || haystack[..at]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = end >= haystack.len()
            || haystack[end..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = end;
    }
    false
}
