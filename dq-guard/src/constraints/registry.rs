//! Lookup from configured rule names to rule implementations.

use crate::config::RuleFamily;
use crate::error::{QualityError, Result};

use super::rules::{NumericRule, RuleKind, StringRule};

/// Resolves rule names per family.
///
/// Both families share names such as `eq` and `is_in`, which resolve to
/// different implementations depending on the column's datatype.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintRegistry;

impl ConstraintRegistry {
    /// Resolves `name` in `family`, or fails with `UnsupportedRule`.
    pub fn resolve(name: &str, family: RuleFamily) -> Result<RuleKind> {
        let rule = match family {
            RuleFamily::Numeric => NumericRule::from_name(name).map(RuleKind::Numeric),
            RuleFamily::String => StringRule::from_name(name).map(RuleKind::String),
        };
        rule.ok_or_else(|| QualityError::unsupported_rule(name, family))
    }

    /// Rule names available to `family`, in declaration order.
    pub fn supported_rules(family: RuleFamily) -> Vec<&'static str> {
        match family {
            RuleFamily::Numeric => NumericRule::ALL.iter().map(NumericRule::name).collect(),
            RuleFamily::String => StringRule::ALL.iter().map(StringRule::name).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_per_family() {
        assert_eq!(
            ConstraintRegistry::resolve("eq", RuleFamily::Numeric).unwrap(),
            RuleKind::Numeric(NumericRule::Eq)
        );
        assert_eq!(
            ConstraintRegistry::resolve("eq", RuleFamily::String).unwrap(),
            RuleKind::String(StringRule::Eq)
        );
    }

    #[test]
    fn test_unknown_rule() {
        let err = ConstraintRegistry::resolve("between", RuleFamily::String).unwrap_err();
        match err {
            QualityError::UnsupportedRule { rule, family } => {
                assert_eq!(rule, "between");
                assert_eq!(family, "string");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(ConstraintRegistry::resolve("nt_eq", RuleFamily::Numeric).is_err());
    }

    #[test]
    fn test_supported_rules() {
        let numeric = ConstraintRegistry::supported_rules(RuleFamily::Numeric);
        assert_eq!(numeric.len(), 10);
        assert!(numeric.contains(&"not_between"));

        let string = ConstraintRegistry::supported_rules(RuleFamily::String);
        assert_eq!(string.len(), 11);
        assert!(string.contains(&"regex"));
        assert!(!string.contains(&"lt"));
    }
}
