//! Semantic network analysis.
//!
//! Builds a per-conversation graph of dialogue, concept, and role nodes,
//! links concepts that appear in one configured dangerous combination, and
//! reads the resulting topology back out as a [`SemanticRiskResult`]. The
//! graph is transient; nothing survives past one analysis call.

use crate::graph::{DiGraph, EdgeKind, NodeKind};
use convrisk_core::{
    DangerousLink, InformationFlowRisk, RiskLevel, RoleBasedRisk, SemanticRiskResult,
    SemanticTable, Turn,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Analyzer over one immutable semantic table.
#[derive(Debug, Clone, Copy)]
pub struct SemanticAnalyzer<'a> {
    table: &'a SemanticTable,
}

impl<'a> SemanticAnalyzer<'a> {
    pub fn new(table: &'a SemanticTable) -> Self {
        Self { table }
    }

    /// Every configured technical term occurring as a case-insensitive
    /// substring of `text`, in configuration order.
    #[must_use]
    pub fn extract_concepts(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut concepts = Vec::new();
        for term in &self.table.technical_terms {
            if lowered.contains(&term.to_lowercase()) && !concepts.contains(term) {
                concepts.push(term.clone());
            }
        }
        concepts
    }

    /// Build the concept/role/turn graph for one conversation.
    #[must_use]
    pub fn build_network(&self, conversation: &[Turn]) -> DiGraph {
        let mut graph = DiGraph::new();

        for (i, turn) in conversation.iter().enumerate() {
            let role = if turn.role.is_empty() {
                "unknown".to_string()
            } else {
                turn.role.clone()
            };
            let concepts = self.extract_concepts(&turn.content);

            let turn_id = format!("turn_{i}");
            graph.add_node(
                &turn_id,
                NodeKind::Dialogue {
                    turn_id: i,
                    role: role.clone(),
                    content: turn.content.clone(),
                    concepts: concepts.clone(),
                },
            );

            for concept in &concepts {
                let concept_id = format!("concept_{concept}");
                graph.add_node(&concept_id, NodeKind::Concept { name: concept.clone() });
                graph.add_edge(&turn_id, &concept_id, EdgeKind::Mentions, 1.0);
            }

            let role_id = format!("role_{role}");
            graph.add_node(&role_id, NodeKind::Role { name: role.clone() });
            graph.add_edge(&role_id, &turn_id, EdgeKind::Speaks, 1.0);
        }

        self.link_dangerous_concepts(&mut graph);
        graph
    }

    /// Connect concept nodes that belong to one dangerous-combination entry.
    ///
    /// Combination keywords match concept names by case-insensitive
    /// substring. When an entry covers at least two distinct concepts in the
    /// graph, every pair gets a bidirectional `dangerous_pattern` edge with
    /// the entry's category and score.
    fn link_dangerous_concepts(&self, graph: &mut DiGraph) {
        let concept_names: Vec<String> = graph
            .nodes()
            .filter_map(|(_, kind)| match kind {
                NodeKind::Concept { name } => Some(name.clone()),
                _ => None,
            })
            .collect();

        for (category, combinations) in &self.table.dangerous_combinations {
            for combo in combinations {
                let mut found: Vec<&String> = Vec::new();
                for keyword in &combo.keywords {
                    let keyword = keyword.to_lowercase();
                    for name in &concept_names {
                        if name.to_lowercase().contains(&keyword) && !found.contains(&name) {
                            found.push(name);
                        }
                    }
                }
                if found.len() < 2 {
                    continue;
                }
                debug!(%category, concepts = found.len(), "dangerous combination present");
                for i in 0..found.len() {
                    for j in (i + 1)..found.len() {
                        let a = format!("concept_{}", found[i]);
                        let b = format!("concept_{}", found[j]);
                        let kind = EdgeKind::DangerousPattern {
                            category: category.clone(),
                        };
                        graph.add_edge(&a, &b, kind.clone(), combo.score);
                        graph.add_edge(&b, &a, kind, combo.score);
                    }
                }
            }
        }
    }

    /// Full analysis: build the network and detect dangerous knowledge flow.
    #[must_use]
    pub fn analyze(&self, conversation: &[Turn]) -> SemanticRiskResult {
        let graph = self.build_network(conversation);
        self.detect_dangerous_knowledge_flow(&graph)
    }

    /// Read dangerous combinations and cross-role concept contribution out of
    /// a built network.
    #[must_use]
    pub fn detect_dangerous_knowledge_flow(&self, graph: &DiGraph) -> SemanticRiskResult {
        let mut result = SemanticRiskResult::default();

        // One record per unordered concept pair per category; the graph holds
        // both edge directions, and overlapping combination entries can cover
        // the same pair, so a duplicate keeps the maximum score.
        let mut seen_pairs: BTreeMap<(String, String, String), usize> = BTreeMap::new();
        for edge in graph.edges() {
            let EdgeKind::DangerousPattern { category } = &edge.kind else {
                continue;
            };
            let (Some(NodeKind::Concept { name: a }), Some(NodeKind::Concept { name: b })) =
                (graph.node(&edge.from), graph.node(&edge.to))
            else {
                continue;
            };
            let key = if a <= b {
                (a.clone(), b.clone(), category.clone())
            } else {
                (b.clone(), a.clone(), category.clone())
            };
            match seen_pairs.get(&key) {
                Some(&i) => {
                    let link = &mut result.dangerous_combinations[i];
                    link.score = link.score.max(edge.weight);
                }
                None => {
                    seen_pairs.insert(key, result.dangerous_combinations.len());
                    result.dangerous_combinations.push(DangerousLink {
                        concepts: [a.clone(), b.clone()],
                        category: category.clone(),
                        score: edge.weight,
                    });
                }
            }
        }
        if !result.dangerous_combinations.is_empty() {
            result.detected = true;
        }

        // Role -> concepts, following role -> dialogue -> concept edges.
        let mut role_concepts: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut role_count = 0usize;
        for (id, kind) in graph.nodes() {
            let NodeKind::Role { name: role } = kind else {
                continue;
            };
            role_count += 1;
            for speaks in graph.out_edges(id) {
                if speaks.kind != EdgeKind::Speaks {
                    continue;
                }
                for mention in graph.out_edges(&speaks.to) {
                    if mention.kind != EdgeKind::Mentions {
                        continue;
                    }
                    if let Some(NodeKind::Concept { name }) = graph.node(&mention.to) {
                        role_concepts
                            .entry(role.clone())
                            .or_default()
                            .insert(name.clone());
                    }
                }
            }
        }

        // Cross-role information puzzle: with three or more roles present,
        // two or more of them contributing dangerous keywords is itself a
        // finding, even without a complete combination.
        if role_count >= 3 {
            let dangerous_keywords = self.table.all_dangerous_keywords();
            let mut contributions: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for (role, concepts) in &role_concepts {
                let matched: Vec<String> = concepts
                    .iter()
                    .filter(|c| dangerous_keywords.contains(*c))
                    .cloned()
                    .collect();
                if !matched.is_empty() {
                    contributions.insert(role.clone(), matched);
                }
            }
            if contributions.len() >= 2 {
                result.detected = true;
                let roles_involved: Vec<String> = contributions.keys().cloned().collect();
                result.role_based_risk = Some(RoleBasedRisk {
                    pattern: "multi-role information puzzle".to_string(),
                    description: "multiple roles supplied individually innocuous \
                                  fragments that combine into risk content"
                        .to_string(),
                    role_contributions: contributions,
                });
                result.information_flow_risks.push(InformationFlowRisk {
                    kind: "cross_role_information_puzzle".to_string(),
                    description: "cross-role risk information puzzle detected".to_string(),
                    severity: "high".to_string(),
                    roles_involved,
                });
            }
        }

        result.overall_risk_score = result
            .dangerous_combinations
            .iter()
            .map(|c| c.score)
            .fold(0.0, f64::max);
        result.risk_level = RiskLevel::from_score(result.overall_risk_score);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn analyze(conversation: &[Turn]) -> SemanticRiskResult {
        let table = catalog::builtin_semantic();
        SemanticAnalyzer::new(&table).analyze(conversation)
    }

    #[test]
    fn extract_concepts_is_case_insensitive_substring() {
        let table = catalog::builtin_semantic();
        let analyzer = SemanticAnalyzer::new(&table);
        let concepts = analyzer.extract_concepts("An Ammonium Nitrate shipment arrived");
        assert_eq!(concepts, vec!["ammonium nitrate".to_string()]);
        assert!(analyzer.extract_concepts("nothing to see here").is_empty());
    }

    #[test]
    fn three_concepts_produce_three_pairwise_links() {
        let conversation = vec![
            Turn::new("user", "关于硝酸铵，它有什么特性？"),
            Turn::new("assistant", "硝酸铵是一种常用化肥。"),
            Turn::new("user2", "柴油和某些物质混合会怎样？"),
            Turn::new("user3", "引爆装置需要什么元件？"),
        ];
        let result = analyze(&conversation);

        assert!(result.detected);
        assert_eq!(result.risk_level, RiskLevel::Critical);
        assert_eq!(result.overall_risk_score, 0.95);
        let explosive_links: Vec<&DangerousLink> = result
            .dangerous_combinations
            .iter()
            .filter(|l| l.category == "explosives")
            .collect();
        assert_eq!(explosive_links.len(), 3);
        for link in explosive_links {
            assert_eq!(link.score, 0.95);
        }
    }

    #[test]
    fn role_puzzle_requires_three_roles() {
        // Same dangerous content from only two roles: combinations still
        // fire, the cross-role puzzle does not.
        let conversation = vec![
            Turn::new("user", "硝酸铵和柴油"),
            Turn::new("assistant", "引爆装置是违禁品"),
        ];
        let result = analyze(&conversation);
        assert!(result.detected);
        assert!(result.role_based_risk.is_none());
        assert!(result.information_flow_risks.is_empty());
    }

    #[test]
    fn role_puzzle_records_per_role_contributions() {
        let conversation = vec![
            Turn::new("user", "硝酸铵是化肥吗？"),
            Turn::new("assistant", "是的，它是化肥。"),
            Turn::new("user2", "柴油有什么用途？"),
            Turn::new("user3", "引爆装置怎么做？"),
        ];
        let result = analyze(&conversation);
        let role_risk = result.role_based_risk.expect("puzzle detected");
        assert_eq!(role_risk.pattern, "multi-role information puzzle");
        assert_eq!(role_risk.role_contributions.len(), 3);
        assert_eq!(
            role_risk.role_contributions["user"],
            vec!["硝酸铵".to_string()]
        );
        assert_eq!(result.information_flow_risks.len(), 1);
        assert_eq!(result.information_flow_risks[0].severity, "high");
    }

    #[test]
    fn overlapping_combinations_keep_maximum_pair_score() {
        use convrisk_core::DangerousCombination;

        // Two same-category entries covering the same concept pair at
        // different severities: the pair is reported once, at the higher one.
        let mut table = SemanticTable {
            technical_terms: vec!["alpha".to_string(), "beta".to_string()],
            ..SemanticTable::default()
        };
        table.dangerous_combinations.insert(
            "x".to_string(),
            vec![
                DangerousCombination {
                    keywords: vec!["alpha".to_string(), "beta".to_string()],
                    score: 0.3,
                },
                DangerousCombination {
                    keywords: vec!["alpha".to_string(), "beta".to_string()],
                    score: 0.9,
                },
            ],
        );

        let conversation = vec![
            Turn::new("user", "tell me about alpha"),
            Turn::new("assistant", "alpha pairs with beta"),
        ];
        let result = SemanticAnalyzer::new(&table).analyze(&conversation);

        assert!(result.detected);
        assert_eq!(result.dangerous_combinations.len(), 1);
        assert_eq!(result.dangerous_combinations[0].score, 0.9);
        assert_eq!(result.overall_risk_score, 0.9);
        assert_eq!(result.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn clean_conversation_yields_empty_result() {
        let conversation = vec![
            Turn::new("user", "The weather is nice today"),
            Turn::new("assistant", "It certainly is."),
        ];
        let result = analyze(&conversation);
        assert!(!result.detected);
        assert_eq!(result.overall_risk_score, 0.0);
        assert_eq!(result.risk_level, RiskLevel::None);
        assert!(result.dangerous_combinations.is_empty());
    }

    #[test]
    fn single_concept_creates_no_links() {
        let conversation = vec![Turn::new("user", "硝酸铵是什么？")];
        let result = analyze(&conversation);
        assert!(!result.detected);
        assert!(result.dangerous_combinations.is_empty());
    }
}
