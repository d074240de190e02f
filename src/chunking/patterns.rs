//! Heading Pattern Registry
//!
//! Each publishing institution lays out its headings its own way. Rules are
//! line-anchored regular expressions, tried in order; the generic set covers
//! every institution without a dedicated one.
//!
//! Observed conventions:
//!
//! Cour des comptes
//!   chapter     `CHAPITRE I  LA PHASE 2018-2022 DE LA STRATÉGIE...`
//!   major       `I - LA PREMIÈRE PHASE DE LA SNIA...`  (upper case)
//!   sub         `A - Les objectifs retenus pour...`     (capitalized)
//!   unnumbered  `SYNTHÈSE`, `RÉCAPITULATIF DES RECOMMANDATIONS`
//!
//! IGF
//!   major       `1.    LES JETONS CONSTITUENT UNE INNOVATION...` (upper case, 2+ spaces)
//!   sub         `1.1.  Les jetons à vocation commerciale...`
//!   sub-sub     `1.1.1. Les JVC se développent...`
//!   unnumbered  `INTRODUCTION`, `SYNTHÈSE`

use crate::config::CustomRuleSet;
use crate::error::{RapportsError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;

/// Unnumbered all-caps heading, 4 to 80 characters.
const ALL_CAPS: &str = r"^[A-ZÀÂÉÈÊËÎÏÔÙÛÜ][A-ZÀÂÉÈÊËÎÏÔÙÛÜ\s\-–:]{3,79}$";

const COUR_DES_COMPTES: &[(HeadingLevel, &str)] = &[
    (
        HeadingLevel::Chapter,
        r"^(CHAPITRE|PARTIE|TITRE|SECTION)\s+[IVXLC]+\s+.{3,}",
    ),
    // At least two capitals after the dash: upper-case titles only
    (
        HeadingLevel::Major,
        r"^[IVX]{1,4}\s*[\-–]\s+[A-ZÀÂÉÈÊËÎÏÔÙÛÜ]{2,}.{5,}",
    ),
    // A lower-case second letter separates this level from the one above
    (
        HeadingLevel::Sub,
        r"^[A-Z]\s*[\-–]\s+[A-ZÀÂÉÈÊËÎÏÔÙÛÜ][a-zàâéèêëîïôùûü].{5,}",
    ),
    (HeadingLevel::Unnumbered, ALL_CAPS),
];

const IGF: &[(HeadingLevel, &str)] = &[
    (
        HeadingLevel::Major,
        r"^\d+\.\s{2,}[A-ZÀÂÉÈÊËÎÏÔÙÛÜ]{2}.{5,}",
    ),
    (
        HeadingLevel::Sub,
        r"^\d+\.\d+\.\s+[A-ZÀÂÉÈÊËÎÏÔÙÛÜ][a-zàâéèêëîïôùûü].{5,}",
    ),
    (
        HeadingLevel::SubSub,
        r"^\d+\.\d+\.\d+\.\s+[A-ZÀÂÉÈÊËÎÏÔÙÛÜ][a-zàâéèêëîïôùûü].{5,}",
    ),
    (HeadingLevel::Unnumbered, ALL_CAPS),
];

// Looser than the dedicated sets, so more false positives.
const GENERIC: &[(HeadingLevel, &str)] = &[
    (
        HeadingLevel::Chapter,
        r"^(CHAPITRE|PARTIE|TITRE|SECTION)\s+[0-9IVXLC]+[\s\-–:]+.{3,}",
    ),
    (
        HeadingLevel::Major,
        r"^[IVX]{1,4}[\.\s]*[\-–\.]\s+[A-ZÀÂÉÈÊËÎÏÔÙÛÜ].{3,}",
    ),
    (
        HeadingLevel::Sub,
        r"^[A-Z][\.\s]*[\-–\.]\s+[A-ZÀÂÉÈÊËÎÏÔÙÛÜ].{3,}",
    ),
    (
        HeadingLevel::Numbered,
        r"^\d+(\.\d+)*\.?\s+[A-ZÀÂÉÈÊËÎÏÔÙÛÜ].{3,}",
    ),
    (HeadingLevel::Unnumbered, ALL_CAPS),
];

/// Publishing institutions with a known heading convention or catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Institution {
    CourDesComptes,
    /// Inspection générale des finances
    Igf,
    /// Conseil général de l'économie
    Cge,
    /// Inspection générale des affaires sociales
    Igas,
    /// Inspection générale de l'administration
    Iga,
    /// Conseil général de l'environnement
    Cgedd,
    Senat,
    AssembleeNationale,
    /// Any other publisher, keyed by its normalized name
    Other(String),
}

impl Institution {
    /// Resolve a free-form name (trimmed, case-folded).
    pub fn parse(name: &str) -> Self {
        let key = name.trim().to_lowercase();
        match key.as_str() {
            "cour des comptes" => Self::CourDesComptes,
            "igf" => Self::Igf,
            "cge" => Self::Cge,
            "igas" => Self::Igas,
            "iga" => Self::Iga,
            "cgedd" => Self::Cgedd,
            "sénat" | "senat" => Self::Senat,
            "assemblée nationale" | "assemblee nationale" => Self::AssembleeNationale,
            _ => Self::Other(key),
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        match self {
            Self::CourDesComptes => "Cour des comptes",
            Self::Igf => "IGF",
            Self::Cge => "CGE",
            Self::Igas => "IGAS",
            Self::Iga => "IGA",
            Self::Cgedd => "CGEDD",
            Self::Senat => "Sénat",
            Self::AssembleeNationale => "Assemblée nationale",
            Self::Other(name) => name,
        }
    }

    /// Built-in rule set used for this institution's reports.
    pub fn rule_set(&self) -> RuleSet {
        match self {
            Self::CourDesComptes => RuleSet::CourDesComptes,
            Self::Igf => RuleSet::Igf,
            // Sample documents not yet collected for these
            Self::Cge | Self::Igas | Self::Iga => RuleSet::Generic,
            Self::Cgedd | Self::Senat | Self::AssembleeNationale | Self::Other(_) => {
                RuleSet::Generic
            }
        }
    }

    /// Get all known institutions
    pub fn all() -> Vec<Self> {
        vec![
            Self::CourDesComptes,
            Self::Igf,
            Self::Cge,
            Self::Igas,
            Self::Iga,
            Self::Cgedd,
            Self::Senat,
            Self::AssembleeNationale,
        ]
    }
}

impl fmt::Display for Institution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Built-in heading rule sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleSet {
    CourDesComptes,
    Igf,
    Generic,
}

impl RuleSet {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CourDesComptes => "cour-des-comptes",
            Self::Igf => "igf",
            Self::Generic => "generic",
        }
    }

    fn patterns(&self) -> &'static [(HeadingLevel, &'static str)] {
        match self {
            Self::CourDesComptes => COUR_DES_COMPTES,
            Self::Igf => IGF,
            Self::Generic => GENERIC,
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::CourDesComptes, Self::Igf, Self::Generic]
    }
}

/// Heading depth a rule recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    /// CHAPITRE / PARTIE / TITRE / SECTION
    Chapter,
    Major,
    Sub,
    SubSub,
    /// Decimal numbering at any depth
    Numbered,
    /// All-caps title without numbering
    Unnumbered,
    /// From a custom rule set; level unknown
    Custom,
}

/// One compiled heading rule.
#[derive(Debug, Clone)]
pub struct HeadingRule {
    pub level: HeadingLevel,
    pub regex: Regex,
}

impl HeadingRule {
    /// True when the rule matches at the start of `line`, whether or not
    /// the pattern begins with `^`.
    pub fn matches(&self, line: &str) -> bool {
        self.regex.find(line).is_some_and(|m| m.start() == 0)
    }
}

/// An ordered, non-empty list of compiled rules.
#[derive(Debug, Clone)]
pub struct HeadingRules {
    name: String,
    rules: Vec<HeadingRule>,
}

impl HeadingRules {
    /// Compile a built-in rule set.
    pub fn builtin(set: RuleSet) -> Result<Self> {
        let rules = set
            .patterns()
            .iter()
            .map(|(level, pattern)| compile(set.name(), *level, pattern))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: set.name().to_string(),
            rules,
        })
    }

    /// Compile a caller-supplied rule set. Empty sets are rejected.
    pub fn custom(name: &str, patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Err(RapportsError::EmptyRuleSet(name.to_string()));
        }
        let rules = patterns
            .iter()
            .map(|pattern| compile(name, HeadingLevel::Custom, pattern))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: name.to_string(),
            rules,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[HeadingRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn compile(rule_set: &str, level: HeadingLevel, pattern: &str) -> Result<HeadingRule> {
    let regex = Regex::new(pattern).map_err(|source| RapportsError::InvalidPattern {
        rule_set: rule_set.to_string(),
        pattern: pattern.to_string(),
        source,
    })?;
    Ok(HeadingRule { level, regex })
}

/// Compiled rule sets, immutable once loaded and safe to share between threads.
#[derive(Debug, Clone)]
pub struct HeadingRegistry {
    builtin: HashMap<RuleSet, HeadingRules>,
    overrides: HashMap<Institution, HeadingRules>,
}

impl HeadingRegistry {
    /// Compile the built-in rule sets.
    pub fn new() -> Result<Self> {
        Self::with_custom(&[])
    }

    /// Compile the built-in rule sets plus per-institution overrides.
    ///
    /// Any pattern that fails to compile fails the whole load.
    pub fn with_custom(custom: &[CustomRuleSet]) -> Result<Self> {
        let mut builtin = HashMap::new();
        for set in RuleSet::all() {
            builtin.insert(set, HeadingRules::builtin(set)?);
        }

        let mut overrides = HashMap::new();
        for rule_set in custom {
            let institution = Institution::parse(&rule_set.institution);
            let rules = HeadingRules::custom(institution.name(), &rule_set.patterns)?;
            overrides.insert(institution, rules);
        }

        Ok(Self { builtin, overrides })
    }

    /// Rules for an institution: its override if configured, else its built-in set.
    pub fn resolve(&self, institution: &Institution) -> &HeadingRules {
        if let Some(rules) = self.overrides.get(institution) {
            return rules;
        }
        self.builtin_rules(institution.rule_set())
    }

    /// Rules for a free-form institution name.
    pub fn resolve_name(&self, institution: &str) -> &HeadingRules {
        self.resolve(&Institution::parse(institution))
    }

    fn builtin_rules(&self, set: RuleSet) -> &HeadingRules {
        // Every RuleSet is compiled in `with_custom`
        &self.builtin[&set]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_match<'a>(rules: &'a HeadingRules, line: &str) -> Option<&'a HeadingRule> {
        rules.rules().iter().find(|r| r.matches(line))
    }

    #[test]
    fn test_institution_parse_normalizes() {
        assert_eq!(Institution::parse("  Cour des Comptes "), Institution::CourDesComptes);
        assert_eq!(Institution::parse("igf"), Institution::Igf);
        assert_eq!(Institution::parse("Sénat"), Institution::Senat);
        assert_eq!(
            Institution::parse("Unknown Agency"),
            Institution::Other("unknown agency".to_string())
        );
    }

    #[test]
    fn test_rule_set_resolution() {
        assert_eq!(Institution::CourDesComptes.rule_set(), RuleSet::CourDesComptes);
        assert_eq!(Institution::Igf.rule_set(), RuleSet::Igf);
        assert_eq!(Institution::Igas.rule_set(), RuleSet::Generic);
        assert_eq!(Institution::parse("Unknown Agency").rule_set(), RuleSet::Generic);
    }

    #[test]
    fn test_builtin_sets_compile_and_are_non_empty() {
        let registry = HeadingRegistry::new().unwrap();
        for institution in Institution::all() {
            assert!(!registry.resolve(&institution).is_empty());
        }
        assert_eq!(registry.resolve_name("whoever").name(), "generic");
    }

    #[test]
    fn test_cour_des_comptes_conformance() {
        let rules = HeadingRules::builtin(RuleSet::CourDesComptes).unwrap();
        let cases = [
            ("CHAPITRE I LA PHASE 2018-2022 DE LA STRATÉGIE", Some(HeadingLevel::Chapter)),
            ("PARTIE II Les moyens", Some(HeadingLevel::Chapter)),
            ("I - LA PREMIÈRE PHASE DE LA SNIA", Some(HeadingLevel::Major)),
            ("IV – UNE GOUVERNANCE À RENFORCER", Some(HeadingLevel::Major)),
            ("A - Les objectifs retenus pour la première phase", Some(HeadingLevel::Sub)),
            ("SYNTHÈSE", Some(HeadingLevel::Unnumbered)),
            ("RÉCAPITULATIF DES RECOMMANDATIONS", Some(HeadingLevel::Unnumbered)),
            // Too short for the all-caps band
            ("ABC", None),
            // Lower-case body text
            ("La Cour a examiné les comptes.", None),
            // Capitalized title after a roman numeral falls through to the letter rule
            ("I - La première phase", Some(HeadingLevel::Sub)),
            // Decimal numbering is not a Cour des comptes convention
            ("1. Introduction générale", None),
        ];
        for (line, expected) in cases {
            assert_eq!(first_match(&rules, line).map(|r| r.level), expected, "{line}");
        }
    }

    #[test]
    fn test_igf_conformance() {
        let rules = HeadingRules::builtin(RuleSet::Igf).unwrap();
        let cases = [
            ("1.  LES JETONS CONSTITUENT UNE INNOVATION", Some(HeadingLevel::Major)),
            ("1.1. Les jetons à vocation commerciale", Some(HeadingLevel::Sub)),
            ("1.1.1. Les JVC se développent dans le secteur", Some(HeadingLevel::SubSub)),
            ("INTRODUCTION", Some(HeadingLevel::Unnumbered)),
            // Single space after the number is body-text enumeration
            ("1. LES JETONS", None),
            ("1.1. les jetons en minuscules", None),
            ("Le présent rapport porte sur les jetons.", None),
        ];
        for (line, expected) in cases {
            assert_eq!(first_match(&rules, line).map(|r| r.level), expected, "{line}");
        }
    }

    #[test]
    fn test_generic_conformance() {
        let rules = HeadingRules::builtin(RuleSet::Generic).unwrap();
        let cases = [
            ("CHAPITRE 2 - Le contexte", Some(HeadingLevel::Chapter)),
            ("II. Les constats", Some(HeadingLevel::Major)),
            ("B. Une gouvernance fragmentée", Some(HeadingLevel::Sub)),
            ("1. OVERVIEW", Some(HeadingLevel::Numbered)),
            ("3.2.1 Les effectifs", Some(HeadingLevel::Numbered)),
            ("CONCLUSION", Some(HeadingLevel::Unnumbered)),
            ("Some body.", None),
            ("12 communes concernées", None),
        ];
        for (line, expected) in cases {
            assert_eq!(first_match(&rules, line).map(|r| r.level), expected, "{line}");
        }
    }

    #[test]
    fn test_all_caps_length_band() {
        let rules = HeadingRules::builtin(RuleSet::Generic).unwrap();
        let at_max = "A".repeat(80);
        let too_long = "A".repeat(81);
        assert!(first_match(&rules, "ABCD").is_some());
        assert!(first_match(&rules, &at_max).is_some());
        assert!(first_match(&rules, &too_long).is_none());
    }

    #[test]
    fn test_custom_override() {
        let custom = vec![CustomRuleSet {
            institution: "IGAS".to_string(),
            patterns: vec![r"^Partie \d+".to_string()],
        }];
        let registry = HeadingRegistry::with_custom(&custom).unwrap();
        let rules = registry.resolve(&Institution::Igas);
        assert_eq!(rules.name(), "IGAS");
        assert_eq!(rules.len(), 1);
        // Other institutions keep their built-in set
        assert_eq!(registry.resolve(&Institution::Iga).name(), "generic");
    }

    #[test]
    fn test_custom_pattern_only_matches_at_line_start() {
        let custom = vec![CustomRuleSet {
            institution: "IGAS".to_string(),
            patterns: vec![r"Partie \d+".to_string()],
        }];
        let registry = HeadingRegistry::with_custom(&custom).unwrap();
        let rules = registry.resolve(&Institution::Igas);
        assert!(first_match(
            rules,
            "Comme indiqué dans la Partie 2 du présent rapport, les crédits baissent."
        )
        .is_none());
        assert!(first_match(rules, "Partie 2 Les crédits").is_some());
    }

    #[test]
    fn test_invalid_custom_pattern_fails_load() {
        let custom = vec![CustomRuleSet {
            institution: "IGAS".to_string(),
            patterns: vec![r"^(CHAPITRE".to_string()],
        }];
        let err = HeadingRegistry::with_custom(&custom).unwrap_err();
        assert!(matches!(err, RapportsError::InvalidPattern { .. }));
    }

    #[test]
    fn test_empty_custom_set_fails_load() {
        let custom = vec![CustomRuleSet {
            institution: "CGE".to_string(),
            patterns: Vec::new(),
        }];
        let err = HeadingRegistry::with_custom(&custom).unwrap_err();
        assert!(matches!(err, RapportsError::EmptyRuleSet(_)));
    }
}
