//! Core types, tables, and errors for convrisk
//!
//! This crate contains the foundational data structures shared across all
//! convrisk components: conversation turns, the immutable configuration
//! catalog (taxonomies, pattern specs, domain and role tables, dangerous
//! combinations), and the typed result records produced by the detectors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Conversation types
// ---------------------------------------------------------------------------

/// A single turn in a multi-role conversation.
///
/// Both fields default to the empty string on deserialization; an absent
/// `role` or `content` is treated as empty, never as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Free-form speaker identifier (e.g. "user", "assistant", "user2").
    #[serde(default)]
    pub role: String,
    /// Free-form message text.
    #[serde(default)]
    pub content: String,
}

impl Turn {
    /// Create a turn from role and content.
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

/// Per-conversation statistics attached to every analysis result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationStats {
    /// Total number of turns.
    pub total_turns: usize,
    /// Number of distinct non-empty roles.
    pub distinct_roles: usize,
    /// Turn count per role.
    pub role_turns: BTreeMap<String, usize>,
    /// Mean content length in characters across all turns.
    pub avg_turn_chars: f64,
}

impl ConversationStats {
    /// Collect statistics from a conversation.
    pub fn collect(conversation: &[Turn]) -> Self {
        let total_turns = conversation.len();
        let mut role_turns: BTreeMap<String, usize> = BTreeMap::new();
        let mut char_sum = 0usize;
        for turn in conversation {
            char_sum += turn.content.chars().count();
            if !turn.role.trim().is_empty() {
                *role_turns.entry(turn.role.trim().to_string()).or_insert(0) += 1;
            }
        }
        let avg_turn_chars = if total_turns == 0 {
            0.0
        } else {
            char_sum as f64 / total_turns as f64
        };
        Self {
            total_turns,
            distinct_roles: role_turns.len(),
            role_turns,
            avg_turn_chars,
        }
    }
}

// ---------------------------------------------------------------------------
// Risk levels
// ---------------------------------------------------------------------------

/// Four-tier risk level derived from a score in `[0, 1]`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Below every threshold.
    #[default]
    None,
    /// Score in `[0.2, 0.4)`.
    Low,
    /// Score in `[0.4, 0.6)`.
    Medium,
    /// Score in `[0.6, 0.8)`.
    High,
    /// Score `>= 0.8`.
    Critical,
}

impl RiskLevel {
    /// Map a score in `[0, 1]` to the highest threshold it reaches.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::Critical
        } else if score >= 0.6 {
            Self::High
        } else if score >= 0.4 {
            Self::Medium
        } else if score >= 0.2 {
            Self::Low
        } else {
            Self::None
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pattern catalog types
// ---------------------------------------------------------------------------

/// The six fixed big categories of fine-grained risk patterns.
///
/// Declaration order is the catalog scan order. Every [`PatternSpec`] and
/// [`PatternMatch`] carries this tag explicitly so no component ever needs
/// to parse a category out of a pattern-id prefix.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    /// Multiple risk ingredients named together in the open.
    ExplicitCombination,
    /// Risk content hidden behind metaphor or analogy.
    MetaphoricalCollaboration,
    /// Sensitive information assembled piecewise across turns.
    InformationPuzzle,
    /// Risk that escalates as the conversation progresses.
    TemporalDependency,
    /// Role-play or impersonated authority used to carry risk.
    RoleExploitation,
    /// Language or cultural framing used to dodge detection.
    CulturalEvasion,
}

impl PatternCategory {
    /// All categories in fixed catalog order.
    pub const ALL: [PatternCategory; 6] = [
        Self::ExplicitCombination,
        Self::MetaphoricalCollaboration,
        Self::InformationPuzzle,
        Self::TemporalDependency,
        Self::RoleExploitation,
        Self::CulturalEvasion,
    ];

    /// Human-readable label used in summaries.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::ExplicitCombination => "explicit risk combination",
            Self::MetaphoricalCollaboration => "metaphorical collaboration",
            Self::InformationPuzzle => "information puzzle",
            Self::TemporalDependency => "temporal dependency",
            Self::RoleExploitation => "role exploitation",
            Self::CulturalEvasion => "cultural evasion",
        }
    }
}

impl std::fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single fine-grained risk pattern definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSpec {
    /// Stable pattern identifier (e.g. "ERC001").
    pub id: String,
    /// Short human-readable name.
    pub name: String,
    /// Longer description of the behavior this pattern flags.
    #[serde(default)]
    pub description: String,
    /// Keywords matched by case-insensitive substring containment.
    pub keywords: Vec<String>,
}

/// All patterns belonging to one big category, in scan order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternGroup {
    /// The big category every pattern in this group belongs to.
    pub category: PatternCategory,
    /// Ordered pattern definitions.
    pub patterns: Vec<PatternSpec>,
}

/// Ordered pattern catalog: the six category groups in fixed order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternCatalog {
    /// Category groups in catalog scan order.
    pub groups: Vec<PatternGroup>,
}

impl PatternCatalog {
    /// Iterate over `(category, spec)` pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (PatternCategory, &PatternSpec)> {
        self.groups
            .iter()
            .flat_map(|g| g.patterns.iter().map(move |p| (g.category, p)))
    }

    /// Total number of pattern specs across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.patterns.len()).sum()
    }

    /// Whether the catalog contains no patterns at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Domain and role tables
// ---------------------------------------------------------------------------

/// Category keyword table: category identifier to keyword set.
///
/// `BTreeMap` keeps iteration order stable across runs, which the category
/// matcher relies on.
pub type Taxonomy = BTreeMap<String, Vec<String>>;

/// Topical keyword buckets used to attribute subject matter to roles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainTable {
    /// Domain name to keyword set.
    pub domain_keywords: BTreeMap<String, Vec<String>>,
    /// The eight fixed broad sensitive topics and their keyword sets.
    pub sensitive_topics: BTreeMap<String, Vec<String>>,
}

/// A configured risk score for a specific pair of roles.
///
/// The two role names are explicit fields; lookup is direction-insensitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolePairRisk {
    /// One role of the pair.
    pub first: String,
    /// The other role of the pair.
    pub second: String,
    /// Risk score in `[0, 1]` when both roles interact.
    pub score: f64,
}

impl RolePairRisk {
    /// Whether this entry covers the given pair, in either order.
    #[must_use]
    pub fn matches(&self, a: &str, b: &str) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }
}

/// A configured high-risk combination of role names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleCombination {
    /// Role names that must all be present.
    pub roles: Vec<String>,
    /// Risk score in `[0, 1]` when the full combination appears.
    pub score: f64,
}

/// Role-related risk configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleTables {
    /// High-risk role-pair interaction scores.
    pub pair_risks: Vec<RolePairRisk>,
    /// Individually sensitive role names and their sensitivity scores.
    pub sensitive_roles: BTreeMap<String, f64>,
    /// High-risk role combinations.
    pub high_risk_combinations: Vec<RoleCombination>,
}

impl RoleTables {
    /// Look up the configured risk for a role pair, in either order.
    #[must_use]
    pub fn pair_risk(&self, a: &str, b: &str) -> Option<f64> {
        self.pair_risks
            .iter()
            .find(|p| p.matches(a, b))
            .map(|p| p.score)
    }
}

// ---------------------------------------------------------------------------
// Dangerous combinations / semantic table
// ---------------------------------------------------------------------------

/// A set of concept keywords whose joint presence indicates elevated risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DangerousCombination {
    /// Concept keywords (matched case-insensitively).
    pub keywords: Vec<String>,
    /// Severity score in `[0, 1]`.
    pub score: f64,
}

/// Configuration for the semantic network analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticTable {
    /// Dangerous-combination entries grouped by category.
    pub dangerous_combinations: BTreeMap<String, Vec<DangerousCombination>>,
    /// Technical terms recognized as concepts in turn content.
    pub technical_terms: Vec<String>,
}

impl SemanticTable {
    /// Union of every dangerous-combination keyword across all categories.
    #[must_use]
    pub fn all_dangerous_keywords(&self) -> std::collections::BTreeSet<String> {
        self.dangerous_combinations
            .values()
            .flatten()
            .flat_map(|c| c.keywords.iter().cloned())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// One immutable value bundling every configuration table.
///
/// Constructed once at engine initialization (from the config store or the
/// built-in defaults) and shared read-only by reference into every detector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Risk category keyword table.
    pub taxonomy: Taxonomy,
    /// Fine-grained pattern catalog.
    pub patterns: PatternCatalog,
    /// Domain keyword and sensitive-topic tables.
    pub domains: DomainTable,
    /// Role risk tables.
    pub roles: RoleTables,
    /// Dangerous combinations and technical terms.
    pub semantic: SemanticTable,
}

// ---------------------------------------------------------------------------
// Matcher result records
// ---------------------------------------------------------------------------

/// Evidence for one fine-grained pattern hit in a single turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    /// Identifier of the matched pattern.
    pub pattern_id: String,
    /// 1-based turn number where the hit occurred.
    pub turn: usize,
    /// Role that spoke the matching turn.
    pub role: String,
    /// Full content of the matching turn.
    pub content: String,
    /// Big category of the matched pattern, tagged at creation time.
    pub category: PatternCategory,
    /// Human-readable pattern name.
    pub name: String,
}

// ---------------------------------------------------------------------------
// Semantic analyzer result records
// ---------------------------------------------------------------------------

/// One detected dangerous concept pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DangerousLink {
    /// The two linked concept names.
    pub concepts: [String; 2],
    /// Category of the combination entry that produced the link.
    pub category: String,
    /// Severity score of the combination entry.
    pub score: f64,
}

/// Cross-role information-puzzle contribution record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleBasedRisk {
    /// Name of the detected pattern ("multi-role information puzzle").
    pub pattern: String,
    /// Human-readable description.
    pub description: String,
    /// Dangerous concepts contributed per role.
    pub role_contributions: BTreeMap<String, Vec<String>>,
}

/// An information-flow risk entry attached to the semantic result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InformationFlowRisk {
    /// Flow risk kind (e.g. "cross_role_information_puzzle").
    pub kind: String,
    /// Human-readable description.
    pub description: String,
    /// Severity label.
    pub severity: String,
    /// Roles participating in the flow.
    pub roles_involved: Vec<String>,
}

/// Result of the semantic network analysis for one conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticRiskResult {
    /// Whether any semantic risk was found.
    pub detected: bool,
    /// Maximum dangerous-combination score (0 when none).
    pub overall_risk_score: f64,
    /// Four-tier level derived from the overall score.
    pub risk_level: RiskLevel,
    /// All detected dangerous concept links.
    pub dangerous_combinations: Vec<DangerousLink>,
    /// Information-flow risks (cross-role puzzles).
    pub information_flow_risks: Vec<InformationFlowRisk>,
    /// Cross-role contribution record, when present.
    pub role_based_risk: Option<RoleBasedRisk>,
    /// Error note when the analyzer degraded instead of completing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SemanticRiskResult {
    /// A degraded not-detected result carrying an error note.
    #[must_use]
    pub fn degraded(error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Multi-role analyzer result records
// ---------------------------------------------------------------------------

/// Kind tag for multi-role sub-signals and their synthesized patterns.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Multiple roles each supply a piece of one sensitive domain.
    InformationPuzzle,
    /// Risky role-to-role interaction topology.
    RoleInteraction,
    /// Sensitive role names or combinations.
    RoleSensitivity,
    /// Abrupt lexical topic shifts.
    TopicShift,
    /// Roles jointly covering a large share of a domain vocabulary.
    ComplementaryInformation,
    /// A broad sensitive topic present in the conversation text.
    SensitiveTopic,
    /// Overall conversation-level sensitive-topic density.
    DomainSensitivity,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InformationPuzzle => "information_puzzle",
            Self::RoleInteraction => "role_interaction",
            Self::RoleSensitivity => "role_sensitivity",
            Self::TopicShift => "topic_shift",
            Self::ComplementaryInformation => "complementary_information",
            Self::SensitiveTopic => "sensitive_topic",
            Self::DomainSensitivity => "domain_sensitivity",
        };
        f.write_str(s)
    }
}

/// One synthesized multi-role risk pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPattern {
    /// Stable synthesized identifier (e.g. "IPP-MULTI-EXPLOSIVES").
    pub pattern_id: String,
    /// Sub-signal kind this pattern came from.
    pub kind: SignalKind,
    /// Human-readable description.
    pub description: String,
    /// Score of this specific instance.
    pub risk_score: f64,
    /// Roles participating in the instance (may be empty).
    #[serde(default)]
    pub roles_involved: Vec<String>,
}

/// Raw per-signal score with its aggregation weight, kept for traceability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    /// The sub-signal this factor belongs to.
    pub kind: SignalKind,
    /// Raw score of the sub-signal in `[0, 1]`.
    pub score: f64,
    /// Weight applied in the aggregate.
    pub weight: f64,
}

/// Score for one broad sensitive topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicScore {
    /// Topic name.
    pub topic: String,
    /// Topic score in `[0, 1]`.
    pub score: f64,
}

/// Conversation-level sensitive-topic signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainSensitivityRisk {
    /// Whether the maximum topic score passed the threshold.
    pub detected: bool,
    /// Maximum topic score.
    pub score: f64,
    /// All topics with at least one keyword hit.
    pub topics: Vec<TopicScore>,
}

/// A sensitive domain flagged by the information-puzzle signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleDomain {
    /// Domain name.
    pub domain: String,
    /// Combined domain risk score.
    pub score: f64,
    /// Number of roles that touched the domain.
    pub role_count: usize,
    /// Total keyword hits across all roles.
    pub keyword_count: usize,
    /// Roles that touched the domain.
    pub roles: Vec<String>,
}

/// Cross-role information-puzzle signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InformationPuzzleRisk {
    /// Whether any domain passed the threshold.
    pub detected: bool,
    /// Maximum domain score.
    pub score: f64,
    /// Flagged domains.
    pub domains: Vec<PuzzleDomain>,
}

/// Kind of flagged role-interaction pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// A configured high-risk role pair appeared as a transition edge.
    HighRiskPair,
    /// A role whose in-degree centrality marks it as an information collector.
    InformationCollector,
}

impl InteractionKind {
    /// Fragment used when synthesizing a pattern id for this kind.
    #[must_use]
    pub fn id_fragment(&self) -> &'static str {
        match self {
            Self::HighRiskPair => "CUSTOM",
            Self::InformationCollector => "INFORMATION_COLLECTOR",
        }
    }
}

/// One flagged role-interaction pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionPattern {
    /// What was flagged.
    pub kind: InteractionKind,
    /// Roles involved.
    pub roles: Vec<String>,
    /// Risk score of this pattern.
    pub score: f64,
    /// Human-readable description.
    pub description: String,
}

/// Role-transition topology signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleInteractionRisk {
    /// Whether any interaction pattern was flagged.
    pub detected: bool,
    /// Maximum pattern score.
    pub score: f64,
    /// Flagged interaction patterns.
    pub patterns: Vec<InteractionPattern>,
}

/// One matched high-risk role combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitiveCombination {
    /// Role names of the combination.
    pub roles: Vec<String>,
    /// Configured score of the combination.
    pub score: f64,
    /// Human-readable description.
    pub description: String,
}

/// One individually sensitive role found in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitiveRoleHit {
    /// Role name.
    pub role: String,
    /// Configured sensitivity score.
    pub sensitivity: f64,
}

/// Role-name sensitivity signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleSensitivityRisk {
    /// Whether any combination or sensitive role matched.
    pub detected: bool,
    /// Maximum matched score.
    pub score: f64,
    /// Matched high-risk combinations.
    pub combinations: Vec<SensitiveCombination>,
    /// Matched sensitive roles.
    pub sensitive_roles: Vec<SensitiveRoleHit>,
}

/// One detected abrupt topic shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicShift {
    /// 0-based turn index where the shift occurred.
    pub turn_index: usize,
    /// Role that spoke the shifting turn.
    pub role: String,
    /// Lexical similarity against the previous window.
    pub similarity: f64,
    /// Roles of the three preceding turns.
    pub previous_roles: Vec<String>,
}

/// Abrupt-topic-shift signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicShiftRisk {
    /// Whether the shift score passed the threshold.
    pub detected: bool,
    /// Shift score in `[0, 1]`.
    pub score: f64,
    /// Individual shifts found.
    pub shifts: Vec<TopicShift>,
}

/// A domain whose vocabulary multiple roles jointly covered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplementaryDomain {
    /// Domain name.
    pub domain: String,
    /// Share of the domain vocabulary jointly covered.
    pub coverage: f64,
    /// Contributing roles.
    pub roles: Vec<String>,
    /// Risk score derived from the coverage.
    pub score: f64,
}

/// Complementary-information signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplementaryInfoRisk {
    /// Whether any domain passed the threshold.
    pub detected: bool,
    /// Maximum domain score.
    pub score: f64,
    /// Flagged domains.
    pub domains: Vec<ComplementaryDomain>,
}

/// Raw per-signal details kept on the multi-role result for traceability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiRoleDetails {
    pub domain_sensitivity: DomainSensitivityRisk,
    pub information_puzzle: InformationPuzzleRisk,
    pub role_interaction: RoleInteractionRisk,
    pub role_sensitivity: RoleSensitivityRisk,
    pub topic_shift: TopicShiftRisk,
    pub complementary_info: ComplementaryInfoRisk,
}

/// Result of the multi-role interaction analysis for one conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiRoleRiskResult {
    /// Whether the weighted aggregate passed the detection threshold.
    pub detected: bool,
    /// Weighted aggregate score in `[0, 1]`.
    pub risk_score: f64,
    /// Four-tier level derived from the aggregate.
    pub risk_level: RiskLevel,
    /// Synthesized patterns, one per flagged sub-signal instance.
    pub risk_patterns: Vec<RiskPattern>,
    /// Raw per-signal scores and weights.
    pub risk_factors: Vec<RiskFactor>,
    /// Full per-signal details.
    pub details: MultiRoleDetails,
    /// Error note when the analyzer degraded instead of completing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MultiRoleRiskResult {
    /// A degraded not-detected result carrying an error note.
    #[must_use]
    pub fn degraded(error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Final analysis result
// ---------------------------------------------------------------------------

/// Merged result of one full conversation analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Whether any detector fired.
    pub detected: bool,
    /// Merged risk score, an integer in `[0, 100]`.
    pub risk_score: u8,
    /// Detected risk categories.
    pub risk_categories: std::collections::BTreeSet<String>,
    /// Deduplicated pattern ids (direct hits first, then multi-role ids).
    pub risk_patterns: Vec<String>,
    /// Evidence records per directly matched pattern.
    pub detailed_patterns: BTreeMap<String, Vec<PatternMatch>>,
    /// Semantic network analysis result.
    pub semantic_risks: SemanticRiskResult,
    /// Multi-role interaction analysis result.
    pub multi_role_risks: MultiRoleRiskResult,
    /// Structured narrative summary.
    pub summary: String,
    /// Conversation statistics.
    pub stats: ConversationStats,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Core error types.
#[derive(thiserror::Error, Debug)]
pub enum ConvRiskError {
    /// The conversation to analyze was empty.
    #[error("conversation is empty")]
    EmptyConversation,

    /// A matcher keyword failed to compile into a regex.
    #[error("matcher error: {0}")]
    Matcher(String),

    /// Configuration loading or persistence error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization / deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while reading or writing configuration.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for `std::result::Result<T, ConvRiskError>`.
pub type Result<T> = std::result::Result<T, ConvRiskError>;

// ===========================================================================
// Tests
// ===========================================================================
