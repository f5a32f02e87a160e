//! Predicates over a [`TargetContext`] used by conditional rule blocks.

use serde::Deserialize;

use crate::target::{Configuration, LinkType, Platform, PlatformGroup, TargetContext, TargetType};

/// A conjunction of target checks. Unset fields match any target; list
/// fields match when the target's value is any of the listed ones, except
/// `features`, which requires all listed features.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub platform: Option<Vec<Platform>>,
    pub platform_group: Option<Vec<PlatformGroup>>,
    pub configuration: Option<Vec<Configuration>>,
    pub target_type: Option<Vec<TargetType>>,
    pub link_type: Option<LinkType>,
    pub build_editor: Option<bool>,
    pub compile_against_engine: Option<bool>,
    pub build_developer_tools: Option<bool>,
    pub features: Vec<String>,
    /// Invert the result of all other checks.
    pub negate: bool,
}

fn any_of<T: PartialEq>(allowed: &Option<Vec<T>>, value: &T) -> bool {
    allowed.as_ref().is_none_or(|allowed| allowed.contains(value))
}

fn flag(expected: Option<bool>, actual: bool) -> bool {
    expected.is_none_or(|expected| expected == actual)
}

impl Condition {
    /// A condition that holds for every target.
    pub fn always() -> Self {
        Self::default()
    }

    pub fn is_unconditional(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, target: &TargetContext) -> bool {
        let platform_group = self.platform_group.as_ref().is_none_or(|groups| {
            groups.iter().any(|group| target.platform.in_group(*group))
        });

        let holds = any_of(&self.platform, &target.platform)
            && platform_group
            && any_of(&self.configuration, &target.configuration)
            && any_of(&self.target_type, &target.target_type)
            && self.link_type.is_none_or(|link| link == target.link_type)
            && flag(self.build_editor, target.build_editor)
            && flag(self.compile_against_engine, target.compile_against_engine)
            && flag(self.build_developer_tools, target.build_developer_tools)
            && self.features.iter().all(|feature| target.has_feature(feature));

        holds != self.negate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_condition_matches_everything() {
        let condition = Condition::always();
        assert!(condition.is_unconditional());
        assert!(condition.matches(&TargetContext::default()));
        assert!(condition.matches(&TargetContext::for_editor(Platform::Mac)));
    }

    #[test]
    fn test_fields_combine_with_and() {
        let condition = Condition {
            platform: Some(vec![Platform::Win64, Platform::Linux]),
            build_editor: Some(true),
            ..Condition::default()
        };

        assert!(condition.matches(&TargetContext::for_editor(Platform::Win64)));
        assert!(!condition.matches(&TargetContext::for_editor(Platform::Mac)));
        assert!(!condition.matches(&TargetContext::default()));
    }

    #[test]
    fn test_link_and_build_flags() {
        let monolithic_engine = Condition {
            link_type: Some(LinkType::Monolithic),
            compile_against_engine: Some(true),
            ..Condition::default()
        };
        let modular = TargetContext::default();
        let monolithic = TargetContext::default().with_link_type(LinkType::Monolithic);
        assert!(!monolithic_engine.matches(&modular));
        assert!(monolithic_engine.matches(&monolithic));
        assert!(!monolithic_engine.matches(&monolithic.clone().with_compile_against_engine(false)));

        let tools = Condition {
            build_developer_tools: Some(true),
            ..Condition::default()
        };
        assert!(!tools.matches(&modular));
        assert!(tools.matches(&modular.clone().with_developer_tools(true)));
        assert!(tools.matches(&TargetContext::for_editor(Platform::Linux)));
    }

    #[test]
    fn test_platform_group() {
        let condition = Condition {
            platform_group: Some(vec![PlatformGroup::Apple]),
            ..Condition::default()
        };
        let ios = TargetContext::new(Platform::IOS, Configuration::Shipping, TargetType::Game);
        assert!(condition.matches(&ios));
        assert!(!condition.matches(&TargetContext::default()));
    }

    #[test]
    fn test_features_require_all() {
        let condition = Condition {
            features: vec!["trace".into(), "stats".into()],
            ..Condition::default()
        };
        let target = TargetContext::default().with_feature("trace");
        assert!(!condition.matches(&target));
        assert!(condition.matches(&target.with_feature("stats")));
    }

    #[test]
    fn test_negate() {
        let condition = Condition {
            configuration: Some(vec![Configuration::Shipping]),
            negate: true,
            ..Condition::default()
        };
        assert!(condition.matches(&TargetContext::default()));
        let shipping = TargetContext::new(Platform::Linux, Configuration::Shipping, TargetType::Game);
        assert!(!condition.matches(&shipping));
    }
}
