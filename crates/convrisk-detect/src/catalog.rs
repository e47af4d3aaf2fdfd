//! Built-in default configuration tables.
//!
//! These defaults are materialized to disk by [`crate::store::ConfigStore`]
//! on first run so operators can edit them as plain JSON afterwards. The
//! keyword sets are bilingual (English and Chinese) because the risk content
//! the engine targets routinely mixes both.

use convrisk_core::{
    Catalog, DangerousCombination, DomainTable, PatternCatalog, PatternCategory,
    PatternGroup, PatternSpec, RoleCombination, RolePairRisk, RoleTables, SemanticTable,
    Taxonomy,
};
use std::collections::BTreeMap;

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn spec(id: &str, name: &str, description: &str, keywords: &[&str]) -> PatternSpec {
    PatternSpec {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        keywords: words(keywords),
    }
}

/// Default risk category keyword table.
///
/// Category keywords are matched as whole tokens, so multi-word phrases are
/// legitimate entries here.
pub fn builtin_taxonomy() -> Taxonomy {
    let mut taxonomy = Taxonomy::new();
    taxonomy.insert(
        "personal privacy".into(),
        words(&[
            "privacy",
            "personal information",
            "identity theft",
            "个人信息",
            "隐私",
            "身份证号",
            "家庭住址",
        ]),
    );
    taxonomy.insert(
        "trade confidentiality".into(),
        words(&[
            "trade secret",
            "confidential",
            "商业机密",
            "内部资料",
            "保密协议",
        ]),
    );
    taxonomy.insert(
        "regional discrimination".into(),
        words(&["discrimination", "hate", "racist", "地域歧视", "歧视", "仇恨言论"]),
    );
    taxonomy.insert(
        "cyber security".into(),
        words(&[
            "hacking",
            "sql injection",
            "phishing",
            "malware",
            "网络攻击",
            "漏洞利用",
            "木马",
        ]),
    );
    taxonomy.insert(
        "fraud".into(),
        words(&["fraud", "scam", "诈骗", "洗钱", "传销", "假冒"]),
    );
    taxonomy.insert(
        "illegal activity".into(),
        words(&["illegal", "contraband", "非法交易", "走私", "违禁品"]),
    );
    taxonomy
}

/// Default fine-grained pattern catalog, six fixed category groups.
pub fn builtin_patterns() -> PatternCatalog {
    PatternCatalog {
        groups: vec![
            PatternGroup {
                category: PatternCategory::ExplicitCombination,
                patterns: vec![
                    spec(
                        "ERC001",
                        "stepwise harmful instruction",
                        "Requests for step-by-step instructions on harmful procedures",
                        &["step by step", "详细步骤", "具体做法", "教我做"],
                    ),
                    spec(
                        "ERC002",
                        "ingredient assembly",
                        "Turns that assemble ingredient lists or mixing ratios",
                        &["mix ratio", "原料清单", "混合比例", "配比"],
                    ),
                ],
            },
            PatternGroup {
                category: PatternCategory::MetaphoricalCollaboration,
                patterns: vec![
                    spec(
                        "MCP001",
                        "fictional framing",
                        "Risk content wrapped in a hypothetical or game frame",
                        &["hypothetically", "in a story", "假设这只是", "只是一个游戏"],
                    ),
                    spec(
                        "MCP002",
                        "recipe disguise",
                        "Harmful synthesis disguised as a special recipe",
                        &["special recipe", "特殊配方", "秘方"],
                    ),
                ],
            },
            PatternGroup {
                category: PatternCategory::InformationPuzzle,
                patterns: vec![
                    spec(
                        "IPP001",
                        "incremental probing",
                        "Sensitive detail gathered through casual follow-up questions",
                        &["one more question", "顺便问一下", "再补充一个问题"],
                    ),
                    spec(
                        "IPP002",
                        "fragment collection",
                        "Speaker signals that partial information is being assembled",
                        &["这部分就够了", "剩下的我知道", "the rest i already know"],
                    ),
                ],
            },
            PatternGroup {
                category: PatternCategory::TemporalDependency,
                patterns: vec![spec(
                    "TDP001",
                    "escalating requests",
                    "Requests that escalate in specificity as the conversation proceeds",
                    &["now tell me more", "现在告诉我更多", "进一步说明"],
                )],
            },
            PatternGroup {
                category: PatternCategory::RoleExploitation,
                patterns: vec![
                    spec(
                        "REP001",
                        "authority impersonation",
                        "Claimed authority used to extract restricted content",
                        &["as an administrator", "作为管理员", "我是执法人员"],
                    ),
                    spec(
                        "REP002",
                        "expert roleplay",
                        "Asking the counterpart to impersonate an unrestricted expert",
                        &["pretend you are", "扮演专家", "假装你是"],
                    ),
                ],
            },
            PatternGroup {
                category: PatternCategory::CulturalEvasion,
                patterns: vec![spec(
                    "CEP001",
                    "code word substitution",
                    "Slang or agreed code words standing in for restricted terms",
                    &["code word", "行话", "暗语"],
                )],
            },
        ],
    }
}

/// Default domain keyword buckets and the eight fixed sensitive topics.
pub fn builtin_domains() -> DomainTable {
    let mut domain_keywords = BTreeMap::new();
    domain_keywords.insert(
        "explosives".to_string(),
        words(&[
            "硝酸铵",
            "柴油",
            "引爆装置",
            "雷管",
            "炸药",
            "ammonium nitrate",
            "fuel oil",
            "detonator",
        ]),
    );
    domain_keywords.insert(
        "drugs".to_string(),
        words(&[
            "麻黄草",
            "红磷",
            "冰毒",
            "提纯",
            "ephedrine",
            "red phosphorus",
            "methamphetamine",
        ]),
    );
    domain_keywords.insert(
        "intrusion".to_string(),
        words(&[
            "sql注入",
            "sql injection",
            "phishing",
            "提权",
            "渗透",
            "exploit",
            "brute force",
            "社交工程",
        ]),
    );
    domain_keywords.insert(
        "surveillance".to_string(),
        words(&["定位", "跟踪", "窃听", "监控", "tracking", "wiretap", "geolocation"]),
    );

    let mut sensitive_topics = BTreeMap::new();
    sensitive_topics.insert(
        "violence".to_string(),
        words(&["暴力", "攻击", "伤害", "杀害", "殴打", "斗殴", "武力", "violence", "assault"]),
    );
    sensitive_topics.insert(
        "drugs".to_string(),
        words(&["毒品", "吸毒", "贩毒", "成瘾", "戒毒", "药物滥用", "narcotics"]),
    );
    sensitive_topics.insert(
        "explicit_content".to_string(),
        words(&["色情", "露骨", "性行为", "情色", "成人内容", "pornographic"]),
    );
    sensitive_topics.insert(
        "discrimination".to_string(),
        words(&["歧视", "种族", "性别", "仇恨", "偏见", "刻板印象", "racism", "bigotry"]),
    );
    sensitive_topics.insert(
        "extremism".to_string(),
        words(&["极端", "激进", "恐怖", "煽动", "暴乱", "extremist", "radicalization"]),
    );
    sensitive_topics.insert(
        "fraud".to_string(),
        words(&["欺诈", "诈骗", "骗局", "假冒", "盗用", "非法", "fraudulent"]),
    );
    sensitive_topics.insert(
        "self_harm".to_string(),
        words(&["自杀", "自残", "轻生", "结束生命", "suicide", "self-harm"]),
    );
    sensitive_topics.insert(
        "abuse".to_string(),
        words(&["虐待", "侵犯", "骚扰", "霸凌", "威胁", "恐吓", "强迫", "harassment", "bullying"]),
    );

    DomainTable {
        domain_keywords,
        sensitive_topics,
    }
}

/// Default role risk tables.
pub fn builtin_roles() -> RoleTables {
    let pair = |first: &str, second: &str, score: f64| RolePairRisk {
        first: first.to_string(),
        second: second.to_string(),
        score,
    };
    let combo = |roles: &[&str], score: f64| RoleCombination {
        roles: words(roles),
        score,
    };

    let mut sensitive_roles = BTreeMap::new();
    sensitive_roles.insert("chemistry_student".to_string(), 0.5);
    sensitive_roles.insert("mining_engineer".to_string(), 0.6);
    sensitive_roles.insert("hobbyist".to_string(), 0.4);
    sensitive_roles.insert("anonymous".to_string(), 0.7);

    RoleTables {
        pair_risks: vec![
            pair("chemistry_student", "electronics_expert", 0.8),
            pair("mining_engineer", "electronics_expert", 0.9),
        ],
        sensitive_roles,
        high_risk_combinations: vec![
            combo(&["chemistry_student", "electronics_expert"], 0.8),
            combo(&["chemistry_student", "mechanical_engineer"], 0.7),
            combo(&["mining_engineer", "electronics_expert"], 0.9),
            combo(&["chemistry_teacher", "hobbyist"], 0.6),
        ],
    }
}

/// Default dangerous combinations and technical-term vocabulary.
pub fn builtin_semantic() -> SemanticTable {
    let combo = |keywords: &[&str], score: f64| DangerousCombination {
        keywords: words(keywords),
        score,
    };

    let mut dangerous_combinations = BTreeMap::new();
    dangerous_combinations.insert(
        "explosives".to_string(),
        vec![
            combo(
                &["硝酸铵", "柴油", "引爆装置", "雷管", "ammonium nitrate", "fuel oil", "detonator"],
                0.95,
            ),
            combo(&["高锰酸钾", "甘油"], 0.6),
        ],
    );
    dangerous_combinations.insert(
        "drugs".to_string(),
        vec![
            combo(&["麻黄草", "红磷", "碘"], 0.9),
            combo(&["ephedrine", "red phosphorus", "iodine"], 0.9),
        ],
    );
    dangerous_combinations.insert(
        "intrusion".to_string(),
        vec![
            combo(&["sql注入", "社交工程", "绕过两因素认证"], 0.75),
            combo(&["sql injection", "social engineering", "2fa bypass"], 0.75),
        ],
    );

    let technical_terms = words(&[
        "硝酸铵",
        "柴油",
        "引爆装置",
        "雷管",
        "高锰酸钾",
        "甘油",
        "麻黄草",
        "红磷",
        "碘",
        "冷却系统",
        "sql注入",
        "社交工程",
        "绕过两因素认证",
        "ammonium nitrate",
        "fuel oil",
        "detonator",
        "ephedrine",
        "red phosphorus",
        "iodine",
        "sql injection",
        "social engineering",
        "2fa bypass",
    ]);

    SemanticTable {
        dangerous_combinations,
        technical_terms,
    }
}

/// The complete built-in catalog.
#[must_use]
pub fn builtin() -> Catalog {
    Catalog {
        taxonomy: builtin_taxonomy(),
        patterns: builtin_patterns(),
        domains: builtin_domains(),
        roles: builtin_roles(),
        semantic: builtin_semantic(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_all_six_pattern_groups() {
        let catalog = builtin();
        let categories: Vec<PatternCategory> =
            catalog.patterns.groups.iter().map(|g| g.category).collect();
        assert_eq!(categories, PatternCategory::ALL.to_vec());
        assert!(!catalog.patterns.is_empty());
    }

    #[test]
    fn builtin_domains_carry_eight_sensitive_topics() {
        let domains = builtin_domains();
        assert_eq!(domains.sensitive_topics.len(), 8);
        assert!(domains.sensitive_topics.contains_key("violence"));
        assert!(domains.sensitive_topics.contains_key("self_harm"));
    }

    #[test]
    fn builtin_semantic_terms_cover_combination_keywords() {
        let semantic = builtin_semantic();
        // Every dangerous-combination keyword must be extractable as a
        // concept, otherwise the combination can never fire.
        let terms: Vec<String> = semantic
            .technical_terms
            .iter()
            .map(|t| t.to_lowercase())
            .collect();
        for keyword in semantic.all_dangerous_keywords() {
            assert!(
                terms.iter().any(|t| t.contains(&keyword.to_lowercase())),
                "no technical term covers keyword {keyword}"
            );
        }
    }

    #[test]
    fn builtin_catalog_round_trips_through_json() {
        let catalog = builtin();
        let json = serde_json::to_string(&catalog).unwrap();
        let back: Catalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, catalog);
    }
}
