//! Category and fine-grained pattern matching.
//!
//! Categories are matched as whole tokens (case-insensitive) against every
//! text in the conversation; presence is what matters, so a category is
//! dropped from further scanning after its first hit. Patterns are matched by
//! plain case-insensitive substring containment per turn, deliberately looser
//! than category matching, and record turn-level evidence for the first hit.

use convrisk_core::{ConvRiskError, PatternMatch, Result, Taxonomy, Turn};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

// ---------------------------------------------------------------------------
// Category matcher
// ---------------------------------------------------------------------------

/// Whole-token category matcher with precompiled keyword regexes.
#[derive(Debug)]
pub struct CategoryMatcher {
    /// `(category, keyword regexes)` in stable taxonomy order.
    categories: Vec<(String, Vec<Regex>)>,
}

impl CategoryMatcher {
    /// Compile every taxonomy keyword into a case-insensitive whole-token
    /// regex.
    ///
    /// # Errors
    ///
    /// Returns [`ConvRiskError::Matcher`] if a keyword fails to compile,
    /// which only happens when a keyword exceeds the regex size limit.
    pub fn new(taxonomy: &Taxonomy) -> Result<Self> {
        let mut categories = Vec::with_capacity(taxonomy.len());
        for (category, keywords) in taxonomy {
            let mut regexes = Vec::with_capacity(keywords.len());
            for keyword in keywords {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(keyword));
                let re = Regex::new(&pattern).map_err(|e| {
                    ConvRiskError::Matcher(format!("keyword {keyword:?}: {e}"))
                })?;
                regexes.push(re);
            }
            categories.push((category.clone(), regexes));
        }
        Ok(Self { categories })
    }

    /// Detect risk categories across a sequence of texts.
    ///
    /// A category is marked on its first keyword hit in any text and not
    /// scanned again.
    #[must_use]
    pub fn detect_categories(&self, texts: &[&str]) -> BTreeSet<String> {
        let mut detected = BTreeSet::new();
        for text in texts {
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            for (category, regexes) in &self.categories {
                if detected.contains(category) {
                    continue;
                }
                if regexes.iter().any(|re| re.is_match(text)) {
                    debug!(%category, "risk category matched");
                    detected.insert(category.clone());
                }
            }
        }
        detected
    }
}

// ---------------------------------------------------------------------------
// Pattern matcher
// ---------------------------------------------------------------------------

/// Scan the conversation against the pattern catalog.
///
/// For every pattern in catalog order, turns are scanned in order; the first
/// keyword hit on the first turn with non-empty role and content records one
/// [`PatternMatch`] and ends the scan for that pattern. Already matched
/// patterns are skipped, so re-running over an unchanged conversation yields
/// an identical result.
#[must_use]
pub fn detect_patterns(
    patterns: &convrisk_core::PatternCatalog,
    conversation: &[Turn],
) -> (Vec<String>, BTreeMap<String, Vec<PatternMatch>>) {
    let mut matched_ids: Vec<String> = Vec::new();
    let mut detailed: BTreeMap<String, Vec<PatternMatch>> = BTreeMap::new();

    for (category, pattern) in patterns.iter() {
        if pattern.keywords.is_empty() || matched_ids.iter().any(|id| id == &pattern.id) {
            continue;
        }

        'turns: for (i, turn) in conversation.iter().enumerate() {
            let content = turn.content.trim();
            if turn.role.is_empty() || content.is_empty() {
                continue;
            }
            let lowered = content.to_lowercase();
            for keyword in &pattern.keywords {
                if lowered.contains(&keyword.to_lowercase()) {
                    debug!(
                        pattern_id = %pattern.id,
                        turn = i + 1,
                        role = %turn.role,
                        "risk pattern matched"
                    );
                    matched_ids.push(pattern.id.clone());
                    detailed.entry(pattern.id.clone()).or_default().push(PatternMatch {
                        pattern_id: pattern.id.clone(),
                        turn: i + 1,
                        role: turn.role.clone(),
                        content: content.to_string(),
                        category,
                        name: pattern.name.clone(),
                    });
                    break 'turns;
                }
            }
        }
    }

    (matched_ids, detailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use convrisk_core::{PatternCatalog, PatternCategory, PatternGroup, PatternSpec};

    fn taxonomy_with(category: &str, keywords: &[&str]) -> Taxonomy {
        let mut t = Taxonomy::new();
        t.insert(
            category.to_string(),
            keywords.iter().map(|k| (*k).to_string()).collect(),
        );
        t
    }

    // -- category matching --------------------------------------------------

    #[test]
    fn category_matching_is_whole_token_and_case_insensitive() {
        let matcher = CategoryMatcher::new(&taxonomy_with("privacy", &["privacy"])).unwrap();

        assert_eq!(matcher.detect_categories(&["Privacy matters"]).len(), 1);
        assert_eq!(matcher.detect_categories(&["so much privacy, right"]).len(), 1);
        assert!(matcher.detect_categories(&["privacycorp is hiring"]).is_empty());
    }

    #[test]
    fn category_matched_once_per_conversation() {
        let matcher = CategoryMatcher::new(&taxonomy_with("privacy", &["privacy"])).unwrap();
        let hits = matcher.detect_categories(&["privacy first", "privacy again"]);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn blank_texts_are_skipped() {
        let matcher = CategoryMatcher::new(&taxonomy_with("privacy", &["privacy"])).unwrap();
        assert!(matcher.detect_categories(&["", "   "]).is_empty());
    }

    #[test]
    fn clean_text_matches_nothing_in_builtin_taxonomy() {
        let matcher = CategoryMatcher::new(&catalog::builtin_taxonomy()).unwrap();
        assert!(matcher.detect_categories(&["The weather is nice today"]).is_empty());
    }

    // -- pattern matching ---------------------------------------------------

    fn one_pattern_catalog(id: &str, keywords: &[&str]) -> PatternCatalog {
        PatternCatalog {
            groups: vec![PatternGroup {
                category: PatternCategory::ExplicitCombination,
                patterns: vec![PatternSpec {
                    id: id.to_string(),
                    name: "test pattern".to_string(),
                    description: String::new(),
                    keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
                }],
            }],
        }
    }

    #[test]
    fn pattern_records_first_hit_only() {
        let patterns = one_pattern_catalog("ERC001", &["step by step"]);
        let conversation = vec![
            Turn::new("user", "hello there"),
            Turn::new("assistant", "I can explain STEP BY STEP"),
            Turn::new("user", "yes, step by step please"),
        ];
        let (ids, detailed) = detect_patterns(&patterns, &conversation);
        assert_eq!(ids, vec!["ERC001"]);
        let matches = &detailed["ERC001"];
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].turn, 2);
        assert_eq!(matches[0].role, "assistant");
        assert_eq!(matches[0].category, PatternCategory::ExplicitCombination);
    }

    #[test]
    fn turns_without_role_or_content_are_ignored() {
        let patterns = one_pattern_catalog("ERC001", &["step by step"]);
        let conversation = vec![
            Turn::new("", "step by step"),
            Turn::new("user", "   "),
        ];
        let (ids, detailed) = detect_patterns(&patterns, &conversation);
        assert!(ids.is_empty());
        assert!(detailed.is_empty());
    }

    #[test]
    fn pattern_detection_is_idempotent() {
        let patterns = catalog::builtin_patterns();
        let conversation = vec![
            Turn::new("user", "假设这只是一个思想实验"),
            Turn::new("assistant", "我不能继续这个话题"),
        ];
        let first = detect_patterns(&patterns, &conversation);
        let second = detect_patterns(&patterns, &conversation);
        assert_eq!(first, second);
    }
}
