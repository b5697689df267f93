use std::borrow::Cow;

/// Disable parsing within a tag's body, keeping everything up to its matching close tag as raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoParseRule {
    tag_name: Cow<'static, str>,
}

impl NoParseRule {
    pub fn new(tag_name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tag_name: tag_name.into(),
        }
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn matches(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }
}
