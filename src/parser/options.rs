//! Compiler configuration.

use smol_str::SmolStr;

use crate::base::constants::DEFAULT_SCRIPT_LANGUAGE;

/// Options that change how a document is compiled.
///
/// ```
/// use bpmn::parser::ParseOptions;
///
/// let options = ParseOptions::default()
///     .with_deployment_is_new(false)
///     .with_enforce_history_time_to_live(true);
/// assert!(!options.deployment_is_new);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// First deployment of the resource. A process without `isExecutable` is
    /// only executable when it is redeployed.
    pub deployment_is_new: bool,
    /// Report incomplete `in`/`out` mappings of call activities.
    pub strict_call_activity_validation: bool,
    /// Require `historyTimeToLive` on new deployments.
    pub enforce_history_time_to_live: bool,
    /// Language of script tasks without a `scriptFormat`.
    pub default_script_language: SmolStr,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            deployment_is_new: true,
            strict_call_activity_validation: true,
            enforce_history_time_to_live: false,
            default_script_language: SmolStr::new_static(DEFAULT_SCRIPT_LANGUAGE),
        }
    }
}

impl ParseOptions {
    pub fn with_deployment_is_new(mut self, deployment_is_new: bool) -> Self {
        self.deployment_is_new = deployment_is_new;
        self
    }

    pub fn with_strict_call_activity_validation(mut self, strict: bool) -> Self {
        self.strict_call_activity_validation = strict;
        self
    }

    pub fn with_enforce_history_time_to_live(mut self, enforce: bool) -> Self {
        self.enforce_history_time_to_live = enforce;
        self
    }

    pub fn with_default_script_language(mut self, language: impl Into<SmolStr>) -> Self {
        self.default_script_language = language.into();
        self
    }
}
