//! Build context - the fixed flags a build is resolved against.
//!
//! A BuildContext is an immutable value object. Conditional rules are
//! evaluated against it during graph building; nothing mutates it during
//! resolution, so independent resolutions can share one freely.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::Name;

/// A concrete platform a build can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    Win64,
    Linux,
    LinuxArm64,
    Mac,
    Android,
    Ios,
}

impl PlatformId {
    /// The groups this platform belongs to.
    pub fn groups(&self) -> &'static [PlatformGroup] {
        use PlatformGroup::*;
        match self {
            PlatformId::Win64 => &[Windows, Microsoft, Desktop],
            PlatformId::Linux => &[Linux, Desktop],
            PlatformId::LinuxArm64 => &[Linux, Desktop],
            PlatformId::Mac => &[Apple, Desktop],
            PlatformId::Android => &[Mobile],
            PlatformId::Ios => &[Apple, Mobile],
        }
    }

    /// Check membership in a platform group.
    pub fn is_in_group(&self, group: PlatformGroup) -> bool {
        self.groups().contains(&group)
    }

    /// Parse a platform name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "win64" => Some(PlatformId::Win64),
            "linux" => Some(PlatformId::Linux),
            "linuxarm64" => Some(PlatformId::LinuxArm64),
            "mac" => Some(PlatformId::Mac),
            "android" => Some(PlatformId::Android),
            "ios" => Some(PlatformId::Ios),
            _ => None,
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlatformId::Win64 => "win64",
            PlatformId::Linux => "linux",
            PlatformId::LinuxArm64 => "linuxarm64",
            PlatformId::Mac => "mac",
            PlatformId::Android => "android",
            PlatformId::Ios => "ios",
        })
    }
}

/// A named family of platforms that rules can match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformGroup {
    Windows,
    Microsoft,
    Linux,
    Apple,
    Desktop,
    Mobile,
}

impl PlatformGroup {
    /// Parse a group name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "windows" => Some(PlatformGroup::Windows),
            "microsoft" => Some(PlatformGroup::Microsoft),
            "linux" => Some(PlatformGroup::Linux),
            "apple" => Some(PlatformGroup::Apple),
            "desktop" => Some(PlatformGroup::Desktop),
            "mobile" => Some(PlatformGroup::Mobile),
            _ => None,
        }
    }
}

impl fmt::Display for PlatformGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlatformGroup::Windows => "windows",
            PlatformGroup::Microsoft => "microsoft",
            PlatformGroup::Linux => "linux",
            PlatformGroup::Apple => "apple",
            PlatformGroup::Desktop => "desktop",
            PlatformGroup::Mobile => "mobile",
        })
    }
}

/// Build configuration, from most to least instrumented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Configuration {
    Debug,
    Development,
    Test,
    Shipping,
}

impl Configuration {
    /// Parse a configuration name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Some(Configuration::Debug),
            "development" => Some(Configuration::Development),
            "test" => Some(Configuration::Test),
            "shipping" => Some(Configuration::Shipping),
            _ => None,
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Configuration::Debug => "debug",
            Configuration::Development => "development",
            Configuration::Test => "test",
            Configuration::Shipping => "shipping",
        })
    }
}

/// Whether the build links against shared engine binaries or its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildEnvironment {
    Shared,
    Unique,
}

impl BuildEnvironment {
    /// Parse an environment name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "shared" => Some(BuildEnvironment::Shared),
            "unique" => Some(BuildEnvironment::Unique),
            _ => None,
        }
    }
}

impl fmt::Display for BuildEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildEnvironment::Shared => "shared",
            BuildEnvironment::Unique => "unique",
        })
    }
}

/// The full set of flags conditional rules are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildContext {
    /// Target platform
    pub platform: PlatformId,

    /// Build configuration
    pub configuration: Configuration,

    /// Whether this is an editor build
    #[serde(default)]
    pub editor_build: bool,

    /// Enabled sanitizers (e.g. "thread", "address")
    #[serde(default)]
    pub sanitizers: BTreeSet<Name>,

    /// Shared or unique build environment
    #[serde(default = "default_environment")]
    pub build_environment: BuildEnvironment,
}

fn default_environment() -> BuildEnvironment {
    BuildEnvironment::Shared
}

impl BuildContext {
    /// Create a context with no editor flag, no sanitizers, shared environment.
    pub fn new(platform: PlatformId, configuration: Configuration) -> Self {
        BuildContext {
            platform,
            configuration,
            editor_build: false,
            sanitizers: BTreeSet::new(),
            build_environment: BuildEnvironment::Shared,
        }
    }

    /// Set the editor flag.
    pub fn with_editor(mut self, editor: bool) -> Self {
        self.editor_build = editor;
        self
    }

    /// Enable a sanitizer.
    pub fn with_sanitizer(mut self, sanitizer: impl Into<Name>) -> Self {
        self.sanitizers.insert(sanitizer.into());
        self
    }

    /// Set the build environment.
    pub fn with_environment(mut self, env: BuildEnvironment) -> Self {
        self.build_environment = env;
        self
    }

    /// Check whether a sanitizer is enabled.
    pub fn has_sanitizer(&self, sanitizer: &str) -> bool {
        self.sanitizers.iter().any(|s| s.as_str() == sanitizer)
    }
}

impl fmt::Display for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.platform, self.configuration)?;
        if self.editor_build {
            write!(f, "+editor")?;
        }
        for san in &self.sanitizers {
            write!(f, "+{}san", san)?;
        }
        if self.build_environment == BuildEnvironment::Unique {
            write!(f, "+unique")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_groups() {
        assert!(PlatformId::Linux.is_in_group(PlatformGroup::Linux));
        assert!(PlatformId::LinuxArm64.is_in_group(PlatformGroup::Linux));
        assert!(PlatformId::Win64.is_in_group(PlatformGroup::Desktop));
        assert!(!PlatformId::Android.is_in_group(PlatformGroup::Desktop));
        assert!(PlatformId::Ios.is_in_group(PlatformGroup::Apple));
    }

    #[test]
    fn test_context_display() {
        let ctx = BuildContext::new(PlatformId::Linux, Configuration::Development)
            .with_editor(true)
            .with_sanitizer("thread");
        assert_eq!(ctx.to_string(), "linux/development+editor+threadsan");
    }

    #[test]
    fn test_sanitizer_lookup() {
        let ctx = BuildContext::new(PlatformId::Win64, Configuration::Shipping)
            .with_sanitizer("address");
        assert!(ctx.has_sanitizer("address"));
        assert!(!ctx.has_sanitizer("thread"));
    }
}
