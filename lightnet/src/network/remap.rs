use crate::common::*;
use regex::Regex;

/// A pattern and replacement pair that renames a parameter key.
///
/// The rule applies when the pattern matches at the start of the key. All
/// occurrences of the pattern are then substituted. Replacements use the
/// `${1}` syntax to refer to capture groups.
#[derive(Debug, Clone)]
pub struct RemapRule {
    pattern: Regex,
    replacement: String,
}

impl RemapRule {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .with_context(|| format!("invalid remap pattern '{}'", pattern))?;
        Ok(Self {
            pattern,
            replacement: replacement.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn matches(&self, key: &str) -> bool {
        matches!(self.pattern.find(key), Some(m) if m.start() == 0)
    }

    pub fn remap(&self, key: &str) -> Option<String> {
        self.matches(key).then(|| {
            self.pattern
                .replace_all(key, self.replacement.as_str())
                .into_owned()
        })
    }
}

/// Ordered list of [RemapRule]s used to export weights to another network.
///
/// Rules are tried in order and the first matching rule renames the key.
/// Keys matching no rule are dropped. Append `("", "")` to keep every key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<(String, String)>", into = "Vec<(String, String)>")]
pub struct RemapRules {
    rules: Vec<RemapRule>,
}

impl RemapRules {
    pub fn new<I, P, R>(rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, R)>,
        P: AsRef<str>,
        R: Into<String>,
    {
        let rules: Vec<_> = rules
            .into_iter()
            .map(|(pattern, replacement)| RemapRule::new(pattern.as_ref(), replacement))
            .try_collect()?;
        Ok(Self { rules })
    }

    /// Rules that keep every key unchanged.
    pub fn identity() -> Self {
        Self::new([("", "")]).unwrap_or_default()
    }

    pub fn push(&mut self, rule: RemapRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemapRule> {
        self.rules.iter()
    }

    /// Renames `key` with the first matching rule.
    pub fn remap(&self, key: &str) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.remap(key))
    }

    /// Renames all named values, dropping those that match no rule.
    pub fn apply<T>(&self, named: impl IntoIterator<Item = (String, T)>) -> IndexMap<String, T> {
        named
            .into_iter()
            .filter_map(|(key, value)| Some((self.remap(&key)?, value)))
            .collect()
    }
}

impl TryFrom<Vec<(String, String)>> for RemapRules {
    type Error = Error;

    fn try_from(rules: Vec<(String, String)>) -> Result<Self, Self::Error> {
        Self::new(rules)
    }
}

impl From<RemapRules> for Vec<(String, String)> {
    fn from(rules: RemapRules) -> Self {
        rules
            .rules
            .into_iter()
            .map(|rule| {
                let RemapRule {
                    pattern,
                    replacement,
                } = rule;
                (pattern.as_str().to_owned(), replacement)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_match_wins() {
        let rules = RemapRules::new([
            (r"^layers\.0\.", "backbone."),
            (r"^layers\.", "head."),
        ])
        .unwrap();

        assert_eq!(
            rules.remap("layers.0.conv.weight").as_deref(),
            Some("backbone.conv.weight")
        );
        assert_eq!(
            rules.remap("layers.1.conv.weight").as_deref(),
            Some("head.1.conv.weight")
        );
    }

    #[test]
    fn unmatched_keys_are_dropped() {
        let rules = RemapRules::new([(r"^layers\.0\.", "layers.0.")]).unwrap();
        let named = vec![
            ("layers.0.a".to_owned(), 1),
            ("layers.1.b".to_owned(), 2),
            ("other.layers.0.c".to_owned(), 3),
        ];
        let remapped = rules.apply(named);
        assert_eq!(remapped.len(), 1);
        assert_eq!(remapped["layers.0.a"], 1);
    }

    #[test]
    fn pattern_must_match_at_start() {
        let rule = RemapRule::new("conv", "xx").unwrap();
        assert!(rule.remap("layers.conv").is_none());
        assert_eq!(rule.remap("conv.conv").as_deref(), Some("xx.xx"));
    }

    #[test]
    fn identity_keeps_all_keys() {
        let rules = RemapRules::identity();
        let named = vec![("a.b".to_owned(), 1), ("c".to_owned(), 2)];
        let remapped = rules.apply(named);
        assert_eq!(remapped.keys().collect::<Vec<_>>(), ["a.b", "c"]);
    }

    #[test]
    fn rules_deserialize_from_pairs() {
        let rules: RemapRules =
            serde_json::from_str(r#"[["^layers\\.0\\.([0-9]+)_", "layers.1.${1}_"]]"#).unwrap();
        assert_eq!(
            rules.remap("layers.0.13_convbatch.layers.0.weight").as_deref(),
            Some("layers.1.13_convbatch.layers.0.weight")
        );
        assert!(serde_json::from_str::<RemapRules>(r#"[["(", ""]]"#).is_err());
    }
}
