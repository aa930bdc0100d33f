//! Ordered rule registry, resolved once at pipeline construction.

use tracing::debug;

use crate::{ConfigurationError, RuleDescriptor};

/// Fixed ordered list of rules. Registration order decides both the
/// detection order and which rule wins an edit conflict
/// (first-registered wins).
#[derive(Debug, Default, Clone)]
pub struct RuleRegistry {
    rules: Vec<RuleDescriptor>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All builtin rules in their canonical order.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for rule in crate::builtin::all() {
            registry
                .register(rule)
                .expect("builtin rule ids are unique");
        }
        registry
    }

    pub fn register(&mut self, rule: RuleDescriptor) -> Result<(), ConfigurationError> {
        if rule.id.is_empty() {
            return Err(ConfigurationError::EmptyRuleId);
        }
        if self.rules.iter().any(|r| r.id == rule.id) {
            return Err(ConfigurationError::DuplicateRuleId(rule.id.to_string()));
        }
        debug!(rule = rule.id, fixers = rule.fixers.len(), "rule registered");
        self.rules.push(rule);
        Ok(())
    }

    pub fn rules(&self) -> &[RuleDescriptor] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&RuleDescriptor> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Registration position, used to resolve edit conflicts.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfigurationError, Severity};

    fn noop_rule(id: &'static str) -> RuleDescriptor {
        RuleDescriptor {
            id,
            default_severity: Severity::Info,
            detector: |_| Vec::new(),
            fixers: Vec::new(),
        }
    }

    #[test]
    fn duplicate_ids_fail_fast() {
        let mut reg = RuleRegistry::new();
        reg.register(noop_rule("a")).unwrap();
        let err = reg.register(noop_rule("a")).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateRuleId(_)));
    }

    #[test]
    fn empty_id_fails_fast() {
        let mut reg = RuleRegistry::new();
        assert!(matches!(
            reg.register(noop_rule("")),
            Err(ConfigurationError::EmptyRuleId)
        ));
    }

    #[test]
    fn registration_order_is_preserved() {
        let mut reg = RuleRegistry::new();
        reg.register(noop_rule("b")).unwrap();
        reg.register(noop_rule("a")).unwrap();
        assert_eq!(reg.position("b"), Some(0));
        assert_eq!(reg.position("a"), Some(1));
    }

    #[test]
    fn builtin_registry_is_valid() {
        let reg = RuleRegistry::builtin();
        assert!(reg.len() >= 6);
        assert!(reg.get("alias-usage").is_some());
    }
}
