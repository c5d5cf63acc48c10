//! Tool and model name canonicalization.
//!
//! Manifests are hand-written, so the same tool shows up as `Llama‑3.2`,
//! `llama-3.2` or `LLAMA–3.2`. Every lookup (registry, detection, install
//! command, warnings) goes through [`AliasTable::normalize`] so one tool is
//! never treated as two.
//!
//! The alias table is data, not logic. The built-in entries can be extended
//! or replaced from the config file.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::StackupConfig;
use crate::error::{Result, StackupError};

/// Built-in aliases, applied after folding.
///
/// `gemma3 → gemma2` tracks the Ollama library lagging behind upstream
/// naming; override it in config once the tag exists.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("smolagent", "smolagents"),
    ("automodelforquestionanswering", "transformers"),
    ("gemma3", "gemma2"),
    ("meta-llama/llama-3.2-1b-instruct", "llama3.2:1b"),
    ("meta-llama/llama-3.2-3b-instruct", "llama3.2:3b"),
    ("meta-llama/meta-llama-3.1-8b-instruct", "llama3.1:8b"),
    ("mistralai/mistral-7b-instruct-v0.3", "mistral:7b"),
    ("google/gemma-2-9b-it", "gemma2:9b"),
    ("microsoft/phi-3-mini-4k-instruct", "phi3:mini"),
    ("qwen/qwen2.5-7b-instruct", "qwen2.5:7b"),
];

/// Canonical form of a tool or model name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedName(String);

impl NormalizedName {
    /// The canonical string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part before a `:tag` suffix (the whole name if untagged).
    pub fn base(&self) -> &str {
        self.0.split_once(':').map_or(&self.0, |(base, _)| base)
    }

    /// Tag after `:`, if any.
    pub fn tag(&self) -> Option<&str> {
        self.0.split_once(':').map(|(_, tag)| tag)
    }
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fold unicode dashes, trim and lowercase. No alias lookup.
pub fn fold(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '\u{2011}' | '\u{2013}' => '-',
            other => other,
        })
        .collect::<String>()
        .to_lowercase()
}

/// One-to-one name replacements.
///
/// Invariant: every value is final, neither a key (unless it maps to
/// itself) nor a tagged name whose base is a key, so normalizing an
/// already-normalized name is a no-op.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    map: BTreeMap<String, String>,
}

impl AliasTable {
    /// An empty table: normalization only folds.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in table.
    pub fn builtin() -> Self {
        let pairs = BUILTIN_ALIASES
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()));
        // The built-in table is flat by construction.
        Self::from_pairs(pairs).unwrap_or_default()
    }

    /// Built-in table extended (or replaced) by the config's `aliases`.
    pub fn from_config(config: &StackupConfig) -> Result<Self> {
        let builtin = if config.settings.replace_default_aliases {
            Vec::new()
        } else {
            BUILTIN_ALIASES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect()
        };
        let extra = config.aliases.iter().map(|(k, v)| (k.clone(), v.clone()));
        Self::from_pairs(builtin.into_iter().chain(extra))
    }

    /// Build a table from raw pairs; later pairs win on duplicate keys.
    ///
    /// Every target is resolved with the same rules [`Self::normalize`]
    /// applies, tagged bases included, so `a → b:9b` with `b → c` stores
    /// `a → c:9b`. A cycle is a configuration error.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Result<Self> {
        let raw: BTreeMap<String, String> = pairs
            .into_iter()
            .map(|(from, to)| (fold(&from), fold(&to)))
            .filter(|(from, to)| !from.is_empty() && !to.is_empty())
            .collect();

        let mut map = BTreeMap::new();
        for (from, to) in &raw {
            let mut target = to.clone();
            let mut hops = 0;
            while let Some(next) = alias_step(&raw, &target) {
                hops += 1;
                if hops > raw.len() {
                    return Err(StackupError::ConfigValidationError {
                        message: format!("alias cycle involving '{}'", from),
                    });
                }
                target = next;
            }
            map.insert(from.clone(), target);
        }

        Ok(Self { map })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Canonicalize a raw name.
    ///
    /// Total and pure: unmapped names come back folded. A tagged name whose
    /// full form is unmapped has its base aliased and keeps its tag
    /// (`gemma3:4b → gemma2:4b`).
    pub fn normalize(&self, raw: &str) -> NormalizedName {
        let folded = fold(raw);

        if let Some(target) = self.map.get(&folded) {
            return NormalizedName(target.clone());
        }

        if let Some((base, tag)) = folded.split_once(':') {
            if let Some(target) = self.map.get(base) {
                let composed = with_tag(target, tag);
                let resolved = self.map.get(&composed).cloned().unwrap_or(composed);
                return NormalizedName(resolved);
            }
        }

        NormalizedName(folded)
    }
}

/// A target that already carries a tag keeps it; otherwise the name's tag
/// is appended.
fn with_tag(target: &str, tag: &str) -> String {
    if target.contains(':') {
        target.to_string()
    } else {
        format!("{}:{}", target, tag)
    }
}

/// One rewrite of `name` by `map`, or `None` if it is already final.
fn alias_step(map: &BTreeMap<String, String>, name: &str) -> Option<String> {
    if let Some(target) = map.get(name) {
        return (target != name).then(|| target.clone());
    }
    let (base, tag) = name.split_once(':')?;
    let target = map.get(base)?;
    let composed = with_tag(target, tag);
    (composed != name).then_some(composed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AliasTable {
        AliasTable::builtin()
    }

    #[test]
    fn folds_both_dash_variants() {
        assert_eq!(fold("llama\u{2011}3"), "llama-3");
        assert_eq!(fold("llama\u{2013}3"), "llama-3");
        // Em dash is not folded.
        assert_eq!(fold("a\u{2014}b"), "a\u{2014}b");
    }

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(table().normalize("  Ollama ").as_str(), "ollama");
        assert_eq!(table().normalize("Open WebUI").as_str(), "open webui");
    }

    #[test]
    fn applies_builtin_aliases() {
        let t = table();
        assert_eq!(t.normalize("SmolAgent").as_str(), "smolagents");
        assert_eq!(t.normalize("gemma3").as_str(), "gemma2");
        assert_eq!(
            t.normalize("AutoModelForQuestionAnswering").as_str(),
            "transformers"
        );
        assert_eq!(
            t.normalize("meta-llama/Llama-3.2-3B-Instruct").as_str(),
            "llama3.2:3b"
        );
    }

    #[test]
    fn aliases_base_of_tagged_name() {
        let name = table().normalize("gemma3:4b");
        assert_eq!(name.as_str(), "gemma2:4b");
        assert_eq!(name.base(), "gemma2");
        assert_eq!(name.tag(), Some("4b"));
    }

    #[test]
    fn unmapped_name_is_folded_only() {
        assert_eq!(table().normalize("Llama3.2").as_str(), "llama3.2");
        assert_eq!(table().normalize("llama3.2").tag(), None);
    }

    #[test]
    fn normalization_is_idempotent() {
        let t = table();
        let samples = [
            "Ollama",
            "Open WebUI",
            "gemma3",
            "gemma3:27b",
            "GEMMA3:latest",
            "smolagent",
            "smolagents",
            "meta-llama/Llama-3.2-1B-Instruct",
            "llama\u{2011}3.2",
            "Mistral\u{2013}7B",
            "",
            "  spaced name  ",
            "transformers",
        ];
        for raw in samples {
            let once = t.normalize(raw);
            let twice = t.normalize(once.as_str());
            assert_eq!(once, twice, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn chains_are_collapsed() {
        let t = AliasTable::from_pairs(vec![
            ("a".to_string(), "b".to_string()),
            ("b".to_string(), "c".to_string()),
        ])
        .unwrap();
        assert_eq!(t.normalize("a").as_str(), "c");
        assert_eq!(t.normalize(t.normalize("a").as_str()).as_str(), "c");
    }

    #[test]
    fn cycles_are_rejected() {
        let err = AliasTable::from_pairs(vec![
            ("a".to_string(), "b".to_string()),
            ("b".to_string(), "a".to_string()),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn identity_entry_is_allowed() {
        let t = AliasTable::from_pairs(vec![("x".to_string(), "x".to_string())]).unwrap();
        assert_eq!(t.normalize("X").as_str(), "x");
    }

    #[test]
    fn config_extends_builtin() {
        let mut config = StackupConfig::default();
        config.aliases.insert("Phi".into(), "phi3".into());
        let t = AliasTable::from_config(&config).unwrap();
        assert_eq!(t.normalize("phi").as_str(), "phi3");
        assert_eq!(t.normalize("gemma3").as_str(), "gemma2");
    }

    #[test]
    fn config_alias_on_tagged_base_stays_idempotent() {
        let mut config = StackupConfig::default();
        config.aliases.insert("gemma2".into(), "gemma2-custom".into());
        let t = AliasTable::from_config(&config).unwrap();

        let once = t.normalize("google/gemma-2-9b-it");
        assert_eq!(once.as_str(), "gemma2-custom:9b");
        assert_eq!(t.normalize(once.as_str()), once);

        assert_eq!(t.normalize("gemma3").as_str(), "gemma2-custom");
        assert_eq!(t.normalize("gemma3:4b").as_str(), "gemma2-custom:4b");
        for raw in ["gemma2:9b", "gemma3:27b", "Gemma2"] {
            let once = t.normalize(raw);
            assert_eq!(t.normalize(once.as_str()), once, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn tagged_target_cycle_is_rejected() {
        let err = AliasTable::from_pairs(vec![
            ("a".to_string(), "b:1".to_string()),
            ("b".to_string(), "a".to_string()),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn config_can_override_stale_mapping() {
        let mut config = StackupConfig::default();
        config.aliases.insert("gemma3".into(), "gemma3".into());
        let t = AliasTable::from_config(&config).unwrap();
        assert_eq!(t.normalize("gemma3").as_str(), "gemma3");
    }

    #[test]
    fn config_can_replace_builtin() {
        let mut config = StackupConfig::default();
        config.settings.replace_default_aliases = true;
        let t = AliasTable::from_config(&config).unwrap();
        assert!(t.is_empty());
        assert_eq!(t.normalize("gemma3").as_str(), "gemma3");
    }

    #[test]
    fn builtin_table_is_populated() {
        assert_eq!(table().len(), BUILTIN_ALIASES.len());
    }
}
