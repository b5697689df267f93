//! Per-call render options.
//!
//! Options are plain values. Callers that want to tweak a shared configuration build a new value
//! with [`RenderOptions::merge`] instead of mutating the shared one.
use std::path::Path;

use serde::Deserialize;

use crate::{
    error::ConfigError,
    parser::{DEFAULT_MAX_DEPTH, MAX_SUPPORTED_DEPTH},
};

/// How `[color]` values are validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorCheck {
    /// Only `#rgb` and `#rrggbb` hex colors are accepted.
    #[default]
    Strict,
    /// Every `#` value is replaced with `#000000` and bare words pass through, as older forum
    /// software did.
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Prefix put in front of every generated CSS class.
    #[serde(alias = "classPrefix")]
    pub class_prefix: String,
    /// Turn `\n` and `\r\n` into `<br>`.
    #[serde(alias = "newLine")]
    pub convert_newlines: bool,
    /// Emit `data-*` attributes given on tags.
    #[serde(alias = "allowData")]
    pub allow_data_attributes: bool,
    /// Emit `class=` values given on tags.
    #[serde(alias = "allowClasses")]
    pub allow_custom_classes: bool,
    pub color_check: ColorCheck,
    /// Keep the bodies of code tags as typed instead of expanding tags inside them.
    pub verbatim_code: bool,
    /// Skip the URL scheme allow-list on `url`, `email`, `img` and `video`.
    pub allow_unsafe_urls: bool,
    /// Elements nested deeper than this stay literal. Clamped to
    /// [`MAX_SUPPORTED_DEPTH`] when rendering.
    pub max_depth: usize,
    /// Upper bound on input length, checked by [`try_render`][crate::try_render].
    pub max_input_len: Option<usize>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            class_prefix: "bbcode".to_owned(),
            convert_newlines: false,
            allow_data_attributes: false,
            allow_custom_classes: false,
            color_check: ColorCheck::Strict,
            verbatim_code: false,
            allow_unsafe_urls: false,
            max_depth: DEFAULT_MAX_DEPTH,
            max_input_len: None,
        }
    }
}

/// A partial set of options. Only `Some` fields override the base when merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOverrides {
    pub class_prefix: Option<String>,
    pub convert_newlines: Option<bool>,
    pub allow_data_attributes: Option<bool>,
    pub allow_custom_classes: Option<bool>,
    pub color_check: Option<ColorCheck>,
    pub verbatim_code: Option<bool>,
    pub allow_unsafe_urls: Option<bool>,
    pub max_depth: Option<usize>,
    pub max_input_len: Option<usize>,
}

impl RenderOptions {
    /// Returns a new set of options with `overrides` applied on top of `self`.
    #[must_use]
    pub fn merge(&self, overrides: RenderOverrides) -> RenderOptions {
        RenderOptions {
            class_prefix: overrides
                .class_prefix
                .unwrap_or_else(|| self.class_prefix.clone()),
            convert_newlines: overrides.convert_newlines.unwrap_or(self.convert_newlines),
            allow_data_attributes: overrides
                .allow_data_attributes
                .unwrap_or(self.allow_data_attributes),
            allow_custom_classes: overrides
                .allow_custom_classes
                .unwrap_or(self.allow_custom_classes),
            color_check: overrides.color_check.unwrap_or(self.color_check),
            verbatim_code: overrides.verbatim_code.unwrap_or(self.verbatim_code),
            allow_unsafe_urls: overrides.allow_unsafe_urls.unwrap_or(self.allow_unsafe_urls),
            max_depth: overrides.max_depth.unwrap_or(self.max_depth),
            max_input_len: overrides.max_input_len.or(self.max_input_len),
        }
    }

    /// Parse options from TOML. Keys may sit at the top level or inside a `[render]` table.
    ///
    /// # Examples
    ///
    /// ```
    /// use bbfilter::RenderOptions;
    ///
    /// let opts = RenderOptions::from_toml_str("[render]\nclass_prefix = \"post\"\nnewLine = true").unwrap();
    /// assert_eq!(opts.class_prefix, "post");
    /// assert!(opts.convert_newlines);
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut table: toml::Table = toml::from_str(content)?;
        let value = match table.remove("render") {
            Some(render) => render,
            None => toml::Value::Table(table),
        };
        let options: RenderOptions = value.try_into()?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check values that deserialize fine but would produce broken output.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix_ok = !self.class_prefix.is_empty()
            && self
                .class_prefix
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !prefix_ok {
            return Err(ConfigError::Validation(format!(
                "class_prefix must be a non-empty CSS identifier, got {:?}",
                self.class_prefix
            )));
        }
        if self.max_depth == 0 || self.max_depth > MAX_SUPPORTED_DEPTH {
            return Err(ConfigError::Validation(format!(
                "max_depth must be between 1 and {MAX_SUPPORTED_DEPTH}, got {}",
                self.max_depth
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_leaves_base_untouched() {
        let base = RenderOptions::default();
        let merged = base.merge(RenderOverrides {
            convert_newlines: Some(true),
            class_prefix: Some("post".into()),
            ..Default::default()
        });

        assert!(merged.convert_newlines);
        assert_eq!(merged.class_prefix, "post");
        assert!(!merged.allow_data_attributes);
        assert_eq!(base, RenderOptions::default());
    }

    #[test]
    fn toml_top_level_with_legacy_names() {
        let opts = RenderOptions::from_toml_str(
            "allowData = true\nallowClasses = true\ncolor_check = \"legacy\"\nmax_input_len = 100",
        )
        .unwrap();
        assert!(opts.allow_data_attributes);
        assert!(opts.allow_custom_classes);
        assert_eq!(opts.color_check, ColorCheck::Legacy);
        assert_eq!(opts.max_input_len, Some(100));
        assert_eq!(opts.class_prefix, "bbcode");
    }

    #[test]
    fn toml_rejects_bad_prefix() {
        let err = RenderOptions::from_toml_str("class_prefix = \"a b\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn toml_rejects_zero_depth() {
        let err = RenderOptions::from_toml_str("[render]\nmax_depth = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn toml_rejects_depth_past_ceiling() {
        let err = RenderOptions::from_toml_str("max_depth = 10000").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(RenderOptions::from_toml_str("max_depth = 256").is_ok());
    }

    #[test]
    fn toml_syntax_error() {
        let err = RenderOptions::from_toml_str("class_prefix = ").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn toml_file_round() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bbfilter.toml");
        std::fs::write(&path, "[render]\nverbatim_code = true\n").unwrap();
        let opts = RenderOptions::from_toml_file(&path).unwrap();
        assert!(opts.verbatim_code);

        let missing = RenderOptions::from_toml_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::NotFound(_)));
    }
}
