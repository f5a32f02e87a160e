//! Build target parameters that module rules are evaluated against.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Route serde through the strum `FromStr`/`Display` impls so that names in
/// rule files and configs parse case-insensitively and print canonically.
macro_rules! serde_via_str {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl TryFrom<String> for $ty {
                type Error = ::strum::ParseError;

                fn try_from(value: String) -> ::std::result::Result<Self, Self::Error> {
                    value.parse()
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> Self {
                    value.to_string()
                }
            }
        )+
    };
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum Platform {
    Win64,
    Linux,
    LinuxArm64,
    Mac,
    IOS,
    TVOS,
    Android,
    VisionOS,
}

/// Families of platforms that rules commonly branch on as a whole.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum PlatformGroup {
    Windows,
    Microsoft,
    Unix,
    Linux,
    Apple,
    Android,
    Desktop,
    Mobile,
}

impl Platform {
    /// Groups this platform belongs to.
    pub fn groups(&self) -> &'static [PlatformGroup] {
        use PlatformGroup as G;
        match self {
            Platform::Win64 => &[G::Windows, G::Microsoft, G::Desktop],
            Platform::Linux | Platform::LinuxArm64 => &[G::Unix, G::Linux, G::Desktop],
            Platform::Mac => &[G::Apple, G::Unix, G::Desktop],
            Platform::IOS | Platform::TVOS | Platform::VisionOS => &[G::Apple, G::Mobile],
            Platform::Android => &[G::Android, G::Unix, G::Mobile],
        }
    }

    pub fn in_group(&self, group: PlatformGroup) -> bool {
        self.groups().contains(&group)
    }

    pub fn is_desktop(&self) -> bool {
        self.in_group(PlatformGroup::Desktop)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum Configuration {
    Debug,
    DebugGame,
    #[default]
    Development,
    Test,
    Shipping,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum TargetType {
    #[default]
    Game,
    Client,
    Server,
    Editor,
    Program,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum LinkType {
    Monolithic,
    #[default]
    Modular,
}

serde_via_str!(Platform, PlatformGroup, Configuration, TargetType, LinkType);

/// The build parameters a module's rules are evaluated against.
///
/// Supplied once per build invocation and only read during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetContext {
    pub platform: Platform,
    pub configuration: Configuration,
    pub target_type: TargetType,
    pub link_type: LinkType,
    pub build_editor: bool,
    pub compile_against_engine: bool,
    pub build_developer_tools: bool,
    pub features: BTreeSet<String>,
}

impl Default for TargetContext {
    fn default() -> Self {
        Self {
            platform: Platform::Linux,
            configuration: Configuration::default(),
            target_type: TargetType::default(),
            link_type: LinkType::default(),
            build_editor: false,
            compile_against_engine: true,
            build_developer_tools: false,
            features: BTreeSet::new(),
        }
    }
}

impl TargetContext {
    pub fn new(platform: Platform, configuration: Configuration, target_type: TargetType) -> Self {
        Self {
            platform,
            configuration,
            target_type,
            ..Self::default()
        }
    }

    /// An editor build for `platform`: modular, with editor and developer tools.
    pub fn for_editor(platform: Platform) -> Self {
        Self {
            platform,
            target_type: TargetType::Editor,
            link_type: LinkType::Modular,
            build_editor: true,
            build_developer_tools: true,
            ..Self::default()
        }
    }

    pub fn with_link_type(mut self, link_type: LinkType) -> Self {
        self.link_type = link_type;
        self
    }

    pub fn with_build_editor(mut self, build_editor: bool) -> Self {
        self.build_editor = build_editor;
        self
    }

    pub fn with_compile_against_engine(mut self, compile_against_engine: bool) -> Self {
        self.compile_against_engine = compile_against_engine;
        self
    }

    pub fn with_developer_tools(mut self, build_developer_tools: bool) -> Self {
        self.build_developer_tools = build_developer_tools;
        self
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.insert(feature.into());
        self
    }

    pub fn is_monolithic(&self) -> bool {
        self.link_type == LinkType::Monolithic
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }
}
