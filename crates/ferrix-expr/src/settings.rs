//! Evaluator settings and experimental feature flags.
//!
//! Settings are plain data passed to [`EvalState::new`](crate::EvalState::new).
//! They can be built in code or read from the environment:
//!
//! - `FERRIX_EXPERIMENTAL_FEATURES`: feature names separated by commas or
//!   whitespace, e.g. `"flakes fetch-tree"`
//! - `FERRIX_ENABLE_NATIVE_CODE`: `true/false/1/0/yes/no`

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use ferrix_mem::DEFAULT_CHUNK_SIZE;

use crate::error::SettingsError;

/// Environment variable listing enabled experimental features.
pub const FEATURES_ENV: &str = "FERRIX_EXPERIMENTAL_FEATURES";

/// Environment variable enabling the native-code primops.
pub const NATIVE_CODE_ENV: &str = "FERRIX_ENABLE_NATIVE_CODE";

/// Opt-in language and evaluator features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExperimentalFeature {
    Flakes,
    FetchClosure,
    FetchTree,
    CaDerivations,
    ImpureDerivations,
    RecursiveNix,
    DynamicDerivations,
    NoUrlLiterals,
    ParseTomlTimestamps,
    PipeOperators,
}

impl ExperimentalFeature {
    /// Every feature, in declaration order.
    pub const ALL: [ExperimentalFeature; 10] = [
        Self::Flakes,
        Self::FetchClosure,
        Self::FetchTree,
        Self::CaDerivations,
        Self::ImpureDerivations,
        Self::RecursiveNix,
        Self::DynamicDerivations,
        Self::NoUrlLiterals,
        Self::ParseTomlTimestamps,
        Self::PipeOperators,
    ];

    /// Returns the kebab-case name used on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Flakes => "flakes",
            Self::FetchClosure => "fetch-closure",
            Self::FetchTree => "fetch-tree",
            Self::CaDerivations => "ca-derivations",
            Self::ImpureDerivations => "impure-derivations",
            Self::RecursiveNix => "recursive-nix",
            Self::DynamicDerivations => "dynamic-derivations",
            Self::NoUrlLiterals => "no-url-literals",
            Self::ParseTomlTimestamps => "parse-toml-timestamps",
            Self::PipeOperators => "pipe-operators",
        }
    }
}

impl fmt::Display for ExperimentalFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExperimentalFeature {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|feature| feature.name() == s)
            .ok_or_else(|| SettingsError::UnknownFeature(s.to_string()))
    }
}

/// Configuration consumed by the evaluator at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalSettings {
    /// Features whose primops are exposed.
    pub experimental_features: BTreeSet<ExperimentalFeature>,
    /// Exposes `importNative` and `exec` in the top-level scope.
    pub enable_native_code: bool,
    /// Value cells per arena chunk.
    pub value_chunk_size: usize,
}

impl Default for EvalSettings {
    fn default() -> Self {
        EvalSettings {
            experimental_features: BTreeSet::new(),
            enable_native_code: false,
            value_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl EvalSettings {
    /// Creates the default settings: no features, no native code.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads settings from the process environment.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        if let Some(raw) = lookup(FEATURES_ENV) {
            settings.experimental_features = parse_feature_list(&raw)?;
        }
        if let Some(raw) = lookup(NATIVE_CODE_ENV) {
            settings.enable_native_code = parse_bool(NATIVE_CODE_ENV, &raw)?;
        }

        log::debug!(
            "settings: features={:?} native_code={}",
            settings.experimental_features,
            settings.enable_native_code
        );
        Ok(settings)
    }

    /// Enables `feature`.
    #[must_use]
    pub fn with_feature(mut self, feature: ExperimentalFeature) -> Self {
        self.experimental_features.insert(feature);
        self
    }

    /// Enables every feature in `features`.
    #[must_use]
    pub fn with_features(mut self, features: impl IntoIterator<Item = ExperimentalFeature>) -> Self {
        self.experimental_features.extend(features);
        self
    }

    #[must_use]
    pub fn enable_native_code(mut self, enabled: bool) -> Self {
        self.enable_native_code = enabled;
        self
    }

    #[must_use]
    pub fn value_chunk_size(mut self, cells: usize) -> Self {
        self.value_chunk_size = cells;
        self
    }

    /// Returns true if `feature` is enabled.
    #[must_use]
    pub fn is_enabled(&self, feature: ExperimentalFeature) -> bool {
        self.experimental_features.contains(&feature)
    }
}

/// Parses a comma- or whitespace-separated feature list.
///
/// # Examples
///
/// ```
/// use ferrix_expr::settings::{parse_feature_list, ExperimentalFeature};
///
/// let features = parse_feature_list("flakes, fetch-tree").unwrap();
/// assert!(features.contains(&ExperimentalFeature::FetchTree));
/// assert!(parse_feature_list("").unwrap().is_empty());
/// ```
pub fn parse_feature_list(raw: &str) -> Result<BTreeSet<ExperimentalFeature>, SettingsError> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|name| !name.is_empty())
        .map(ExperimentalFeature::from_str)
        .collect()
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, SettingsError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(SettingsError::InvalidBool {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}
