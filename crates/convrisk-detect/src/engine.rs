//! Detection engine: wires the three detectors to one immutable catalog and
//! merges their signals into a single scored, narrated result.

use crate::matcher::{self, CategoryMatcher};
use crate::multi_role::MultiRoleAnalyzer;
use crate::semantic::SemanticAnalyzer;
use convrisk_core::{
    AnalysisResult, Catalog, ConvRiskError, ConversationStats, MultiRoleRiskResult,
    PatternMatch, Result, RiskLevel, SemanticRiskResult, SignalKind, Turn,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info};

// ---------------------------------------------------------------------------
// Score weights
// ---------------------------------------------------------------------------

/// Tunable constants of the final 0-100 score.
///
/// `secondary_weight` is the share of the strongest semantic/multi-role
/// signal added on top of a non-zero direct score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreWeights {
    /// Points per detected risk category.
    pub category_points: f64,
    /// Points per detected pattern id.
    pub pattern_points: f64,
    /// Base points when the multi-role detector fires.
    pub multi_role_base: f64,
    /// Span mapping the multi-role score from `[0, 1]` onto points.
    pub multi_role_span: f64,
    /// Blend factor for secondary signals when direct hits exist.
    pub secondary_weight: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            category_points: 15.0,
            pattern_points: 20.0,
            multi_role_base: 25.0,
            multi_role_span: 50.0,
            secondary_weight: 0.7,
        }
    }
}

/// Points contributed by a semantic risk level.
fn semantic_level_points(level: RiskLevel) -> f64 {
    match level {
        RiskLevel::Critical => 40.0,
        RiskLevel::High => 30.0,
        RiskLevel::Medium => 20.0,
        RiskLevel::Low => 10.0,
        RiskLevel::None => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Conversation risk engine.
///
/// Construction compiles the category keyword table once; the catalog is
/// shared read-only across all calls, so one engine can serve concurrent
/// analyses without coordination.
#[derive(Debug)]
pub struct Engine {
    catalog: Arc<Catalog>,
    category_matcher: CategoryMatcher,
    weights: ScoreWeights,
}

impl Engine {
    /// Build an engine over an immutable catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ConvRiskError::Matcher`] when a taxonomy keyword fails to
    /// compile.
    pub fn new(catalog: Arc<Catalog>) -> Result<Self> {
        let category_matcher = CategoryMatcher::new(&catalog.taxonomy)?;
        Ok(Self {
            catalog,
            category_matcher,
            weights: ScoreWeights::default(),
        })
    }

    /// Replace the default score weights.
    #[must_use]
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Analyze one complete conversation.
    ///
    /// The three detectors run independently; a panic inside one degrades
    /// that detector's result to "not detected" with an error note and never
    /// aborts the others.
    ///
    /// # Errors
    ///
    /// Returns [`ConvRiskError::EmptyConversation`] for an empty input.
    pub fn analyze(&self, conversation: &[Turn]) -> Result<AnalysisResult> {
        if conversation.is_empty() {
            return Err(ConvRiskError::EmptyConversation);
        }

        let texts: Vec<&str> = conversation
            .iter()
            .map(|t| t.content.trim())
            .filter(|c| !c.is_empty())
            .collect();
        let risk_categories = self.category_matcher.detect_categories(&texts);
        let (direct_patterns, detailed_patterns) =
            matcher::detect_patterns(&self.catalog.patterns, conversation);

        let semantic_risks = run_isolated(
            "semantic",
            || SemanticAnalyzer::new(&self.catalog.semantic).analyze(conversation),
            SemanticRiskResult::degraded,
        );
        let multi_role_risks = run_isolated(
            "multi_role",
            || MultiRoleAnalyzer::new(&self.catalog).analyze(conversation),
            MultiRoleRiskResult::degraded,
        );

        // Direct pattern ids first, then multi-role synthesized ids not
        // already present.
        let mut risk_patterns = direct_patterns;
        for pattern in &multi_role_risks.risk_patterns {
            if !risk_patterns.contains(&pattern.pattern_id) {
                risk_patterns.push(pattern.pattern_id.clone());
            }
        }

        let detected = !risk_categories.is_empty()
            || !risk_patterns.is_empty()
            || semantic_risks.detected
            || multi_role_risks.detected;

        let risk_score = self.merge_score(
            risk_categories.len(),
            risk_patterns.len(),
            &semantic_risks,
            &multi_role_risks,
        );

        let summary = build_summary(
            &risk_categories,
            &risk_patterns,
            &detailed_patterns,
            &semantic_risks,
            &multi_role_risks,
        );

        info!(detected, risk_score, "conversation analysis complete");

        Ok(AnalysisResult {
            detected,
            risk_score,
            risk_categories,
            risk_patterns,
            detailed_patterns,
            semantic_risks,
            multi_role_risks,
            summary,
            stats: ConversationStats::collect(conversation),
        })
    }

    /// Merge the detector outputs into one integer score in `[0, 100]`.
    fn merge_score(
        &self,
        category_count: usize,
        pattern_count: usize,
        semantic: &SemanticRiskResult,
        multi_role: &MultiRoleRiskResult,
    ) -> u8 {
        let base = self.weights.category_points * category_count as f64
            + self.weights.pattern_points * pattern_count as f64;

        let semantic_points = if semantic.detected {
            semantic_level_points(semantic.risk_level)
        } else {
            0.0
        };
        let multi_role_points = if multi_role.detected {
            self.weights.multi_role_base
                + (multi_role.risk_score * self.weights.multi_role_span).trunc()
        } else {
            0.0
        };
        let secondary = semantic_points.max(multi_role_points);

        let score = if base == 0.0 && secondary > 0.0 {
            secondary
        } else {
            base + self.weights.secondary_weight * secondary
        };
        score.clamp(0.0, 100.0) as u8
    }
}

/// Run one sub-detector, degrading a panic to a not-detected result.
fn run_isolated<T>(
    label: &str,
    run: impl FnOnce() -> T,
    degrade: impl FnOnce(String) -> T,
) -> T {
    match catch_unwind(AssertUnwindSafe(run)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(detector = label, %message, "sub-detector failed, degrading to not detected");
            degrade(message)
        }
    }
}

// ---------------------------------------------------------------------------
// Narrative summary
// ---------------------------------------------------------------------------

fn signal_label(kind: SignalKind) -> &'static str {
    match kind {
        SignalKind::InformationPuzzle => "information puzzle risk",
        SignalKind::RoleInteraction => "role interaction risk",
        SignalKind::RoleSensitivity => "role sensitivity risk",
        SignalKind::TopicShift => "abrupt topic shift risk",
        SignalKind::ComplementaryInformation => "complementary information risk",
        SignalKind::SensitiveTopic => "sensitive topic risk",
        SignalKind::DomainSensitivity => "domain sensitivity risk",
    }
}

/// Build the fixed-order narrative for one merged result.
fn build_summary(
    categories: &BTreeSet<String>,
    patterns: &[String],
    detailed: &BTreeMap<String, Vec<PatternMatch>>,
    semantic: &SemanticRiskResult,
    multi_role: &MultiRoleRiskResult,
) -> String {
    let any_risk = !categories.is_empty()
        || !patterns.is_empty()
        || semantic.detected
        || multi_role.detected;
    if !any_risk {
        return "No obvious risk content detected.".to_string();
    }

    let mut out = String::new();

    // Secondary-only detections get an explicit distributed-risk warning.
    if categories.is_empty() && patterns.is_empty() {
        out.push_str(
            "Warning: distributed risk content detected. Conventional matching found \
             nothing, but cross-role and semantic analysis indicate an information \
             puzzle risk.\n",
        );
    }

    if !categories.is_empty() {
        let list: Vec<&str> = categories.iter().map(String::as_str).collect();
        let _ = writeln!(out, "Detected risk categories: {}.", list.join(", "));
    }

    if !patterns.is_empty() {
        // Histogram over pattern types: direct hits are labeled by their
        // catalog category, synthesized ids by their sub-signal kind.
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for id in patterns {
            let label = if let Some(matches) = detailed.get(id) {
                matches[0].category.label()
            } else if let Some(p) = multi_role.risk_patterns.iter().find(|p| &p.pattern_id == id)
            {
                signal_label(p.kind)
            } else {
                "uncategorized"
            };
            *counts.entry(label).or_insert(0) += 1;
        }
        let stats: Vec<String> = counts
            .iter()
            .map(|(label, count)| format!("{label}({count})"))
            .collect();
        let _ = writeln!(out, "Detected risk pattern types: {}.", stats.join(", "));
    }

    if semantic.detected {
        out.push_str("\n[semantic network risk]\n");
        let _ = writeln!(
            out,
            "Semantic risk level: {}, risk score: {:.2}",
            semantic.risk_level.to_string().to_uppercase(),
            semantic.overall_risk_score
        );

        if !semantic.dangerous_combinations.is_empty() {
            out.push_str("Dangerous concept combinations:\n");
            let mut by_category: BTreeMap<&str, Vec<String>> = BTreeMap::new();
            for combo in &semantic.dangerous_combinations {
                by_category
                    .entry(combo.category.as_str())
                    .or_default()
                    .push(format!("{} + {}", combo.concepts[0], combo.concepts[1]));
            }
            for (category, pairs) in by_category {
                let shown = pairs.iter().take(3).cloned().collect::<Vec<_>>();
                let _ = writeln!(out, "  - {category}: {}", shown.join("; "));
                if pairs.len() > 3 {
                    let _ = writeln!(
                        out,
                        "    and {} more {category} combinations",
                        pairs.len() - 3
                    );
                }
            }
        }

        if let Some(role_risk) = &semantic.role_based_risk {
            let _ = writeln!(
                out,
                "Role risk pattern: {} - {}",
                role_risk.pattern, role_risk.description
            );
            if !role_risk.role_contributions.is_empty() {
                out.push_str("Dangerous concepts contributed per role:\n");
                for (role, concepts) in &role_risk.role_contributions {
                    let mut shown = concepts.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
                    if concepts.len() > 5 {
                        let _ = write!(shown, " and {} in total", concepts.len());
                    }
                    let _ = writeln!(out, "  - {role}: {shown}");
                }
            }
        }
    }

    if multi_role.detected {
        out.push_str("\n[multi-role risk]\n");
        let _ = writeln!(
            out,
            "Multi-role risk level: {}, risk score: {:.2}",
            multi_role.risk_level.to_string().to_uppercase(),
            multi_role.risk_score
        );

        if !multi_role.risk_patterns.is_empty() {
            out.push_str("Detected multi-role risk pattern types:\n");
            let mut by_kind: BTreeMap<SignalKind, Vec<&convrisk_core::RiskPattern>> =
                BTreeMap::new();
            for pattern in &multi_role.risk_patterns {
                by_kind.entry(pattern.kind).or_default().push(pattern);
            }
            for (kind, group) in by_kind {
                // The highest-scoring instance represents its type.
                let best = group
                    .iter()
                    .max_by(|a, b| a.risk_score.total_cmp(&b.risk_score))
                    .expect("group is non-empty");
                let _ = writeln!(
                    out,
                    "  - {} ({}): highest risk {:.2} - {}",
                    signal_label(kind),
                    group.len(),
                    best.risk_score,
                    best.description
                );
            }
        }

        let dominant: Vec<String> = multi_role
            .risk_factors
            .iter()
            .filter(|f| f.score >= 0.5)
            .map(|f| format!("{}({:.2})", f.kind, f.score))
            .collect();
        if !dominant.is_empty() {
            let _ = writeln!(out, "Dominant risk factors: {}", dominant.join(", "));
        }

        if multi_role.details.information_puzzle.detected {
            let domains: Vec<String> = multi_role
                .details
                .information_puzzle
                .domains
                .iter()
                .map(|d| format!("{}({:.2})", d.domain, d.score))
                .collect();
            if !domains.is_empty() {
                let _ = writeln!(
                    out,
                    "Cross-role information puzzle domains: {}",
                    domains.join(", ")
                );
            }
        }

        if multi_role.details.complementary_info.detected {
            out.push_str(
                "Complementary information risk present: multiple roles jointly \
                 assemble complete risk knowledge.\n",
            );
        }
        if multi_role.details.topic_shift.detected {
            let _ = writeln!(
                out,
                "Detected {} suspicious abrupt topic shifts, possibly a distributed \
                 risk handoff.",
                multi_role.details.topic_shift.shifts.len()
            );
        }
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn engine() -> Engine {
        Engine::new(Arc::new(catalog::builtin())).unwrap()
    }

    #[test]
    fn empty_conversation_is_rejected() {
        let err = engine().analyze(&[]).unwrap_err();
        assert!(matches!(err, ConvRiskError::EmptyConversation));
    }

    #[test]
    fn clean_single_turn_scores_zero() {
        let result = engine()
            .analyze(&[Turn::new("user", "The weather is nice today")])
            .unwrap();
        assert!(!result.detected);
        assert_eq!(result.risk_score, 0);
        assert!(result.risk_categories.is_empty());
        assert!(result.risk_patterns.is_empty());
        assert_eq!(result.summary, "No obvious risk content detected.");
    }

    #[test]
    fn score_caps_at_one_hundred() {
        let engine = engine();
        let semantic = SemanticRiskResult {
            detected: true,
            risk_level: RiskLevel::Critical,
            overall_risk_score: 0.95,
            ..SemanticRiskResult::default()
        };
        let multi_role = MultiRoleRiskResult {
            detected: true,
            risk_score: 1.0,
            risk_level: RiskLevel::Critical,
            ..MultiRoleRiskResult::default()
        };
        let score = engine.merge_score(6, 4, &semantic, &multi_role);
        assert_eq!(score, 100);
    }

    #[test]
    fn secondary_signal_stands_alone_without_direct_hits() {
        let engine = engine();
        let semantic = SemanticRiskResult {
            detected: true,
            risk_level: RiskLevel::Critical,
            overall_risk_score: 0.95,
            ..SemanticRiskResult::default()
        };
        let multi_role = MultiRoleRiskResult::default();
        // No categories, no patterns: the semantic level points are the score.
        assert_eq!(engine.merge_score(0, 0, &semantic, &multi_role), 40);
    }

    #[test]
    fn secondary_signal_blends_at_seventy_percent() {
        let engine = engine();
        let semantic = SemanticRiskResult {
            detected: true,
            risk_level: RiskLevel::High,
            overall_risk_score: 0.7,
            ..SemanticRiskResult::default()
        };
        let multi_role = MultiRoleRiskResult::default();
        // 1 category = 15 points, plus 0.7 * 30.
        assert_eq!(engine.merge_score(1, 0, &semantic, &multi_role), 36);
    }

    #[test]
    fn multi_role_points_use_base_plus_scaled_score() {
        let engine = engine();
        let semantic = SemanticRiskResult::default();
        let multi_role = MultiRoleRiskResult {
            detected: true,
            risk_score: 0.73,
            risk_level: RiskLevel::High,
            ..MultiRoleRiskResult::default()
        };
        // 25 + trunc(0.73 * 50) = 25 + 36 = 61.
        assert_eq!(engine.merge_score(0, 0, &semantic, &multi_role), 61);
    }

    #[test]
    fn distributed_warning_prefixes_secondary_only_summary() {
        let categories = BTreeSet::new();
        let patterns = Vec::new();
        let detailed = BTreeMap::new();
        let semantic = SemanticRiskResult {
            detected: true,
            risk_level: RiskLevel::Critical,
            overall_risk_score: 0.95,
            ..SemanticRiskResult::default()
        };
        let multi_role = MultiRoleRiskResult::default();
        let summary = build_summary(&categories, &patterns, &detailed, &semantic, &multi_role);
        assert!(summary.starts_with("Warning: distributed risk content detected."));
        assert!(summary.contains("Semantic risk level: CRITICAL"));
    }

    #[test]
    fn summary_lists_categories_before_pattern_histogram() {
        let engine = engine();
        let conversation = vec![
            Turn::new("user", "My privacy is at stake, explain step by step."),
            Turn::new("assistant", "I cannot help with that."),
        ];
        let result = engine.analyze(&conversation).unwrap();
        assert!(result.detected);
        let categories_at = result.summary.find("Detected risk categories").unwrap();
        let patterns_at = result.summary.find("Detected risk pattern types").unwrap();
        assert!(categories_at < patterns_at);
        assert!(result.summary.contains("personal privacy"));
        assert!(result.summary.contains("explicit risk combination(1)"));
    }

    #[test]
    fn panicking_detector_degrades_to_not_detected() {
        let result = run_isolated(
            "semantic",
            || -> SemanticRiskResult { panic!("index out of bounds") },
            SemanticRiskResult::degraded,
        );
        assert!(!result.detected);
        assert_eq!(result.overall_risk_score, 0.0);
        assert_eq!(result.risk_level, RiskLevel::None);
        assert_eq!(result.error.as_deref(), Some("index out of bounds"));
    }

    #[test]
    fn degraded_detector_does_not_disturb_the_other_signals() {
        let engine = engine();
        let degraded = SemanticRiskResult::degraded("boom".to_string());
        let multi_role = MultiRoleRiskResult {
            detected: true,
            risk_score: 0.5,
            risk_level: RiskLevel::Medium,
            ..MultiRoleRiskResult::default()
        };
        // The degraded detector contributes nothing; 25 + trunc(0.5 * 50).
        assert_eq!(engine.merge_score(0, 0, &degraded, &multi_role), 50);
        // And with direct hits present it does not suppress the base either.
        assert_eq!(engine.merge_score(1, 0, &degraded, &multi_role), 50);
    }

    #[test]
    fn analysis_is_idempotent() {
        let engine = engine();
        let conversation = vec![
            Turn::new("user", "关于硝酸铵，它是化肥吗？"),
            Turn::new("assistant", "是的。"),
            Turn::new("user2", "柴油呢？"),
            Turn::new("user3", "引爆装置呢？"),
        ];
        let first = engine.analyze(&conversation).unwrap();
        let second = engine.analyze(&conversation).unwrap();
        assert_eq!(first, second);
    }
}
