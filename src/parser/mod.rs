use bitflags::bitflags;

pub mod attrs;
pub mod rules;
pub mod tree;

/// Nesting depth past which tags are left as literal text.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Hard ceiling on [`ParserConfig::max_depth`]; larger values are clamped to it.
pub const MAX_SUPPORTED_DEPTH: usize = 256;

pub struct ParserConfig {
    pub feature_flags: ParserFeature,
    /// Elements nested deeper than this are kept as literal text. Never more than
    /// [`MAX_SUPPORTED_DEPTH`].
    pub max_depth: usize,
    /// Tags whose bodies are kept as raw text instead of being parsed.
    pub no_parse: Vec<rules::NoParseRule>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            feature_flags: ParserFeature::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            no_parse: vec![],
        }
    }
}

impl ParserConfig {
    pub fn is_no_parse(&self, tag: &str) -> bool {
        self.no_parse.iter().any(|r| r.matches(tag))
    }
}

bitflags! {
    /// Optional tokenizer syntax.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct ParserFeature: u32 {
        /// Recognize the `[*]` list item marker as a tag name.
        const ITEM_MARKERS = 1 << 0;
    }
}

impl Default for ParserFeature {
    fn default() -> Self {
        ParserFeature::ITEM_MARKERS
    }
}

#[doc(alias = "parser")]
pub struct BBParser<'a> {
    input: &'a str,
    config: ParserFeature,
    loc: usize,
}

impl<'a> BBParser<'a> {
    pub fn new(input: &'a str) -> BBParser<'a> {
        Self::with_features(input, ParserFeature::default())
    }

    pub fn with_features(input: &'a str, config: ParserFeature) -> BBParser<'a> {
        Self {
            input,
            config,
            loc: 0,
        }
    }

    /// Returns all input text left to parse
    pub fn remaining(&self) -> &'a str {
        &self.input[self.loc..]
    }

    /// Try to read a tag starting at `self.loc`, which must point at a `[`.
    /// Returns the byte length of the tag and its kind.
    fn read_tag(&self) -> Option<(usize, TokenKind<'a>)> {
        let rem = self.remaining();
        let inner = &rem["[".len()..];

        if let Some(after_slash) = inner.strip_prefix('/') {
            let name_len = self.name_len(after_slash);
            if name_len == 0 || !after_slash[name_len..].starts_with(']') {
                return None;
            }
            let len = "[/".len() + name_len + "]".len();
            return Some((
                len,
                TokenKind::CloseBBTag(BBTag {
                    tag: &after_slash[..name_len],
                    args: "",
                }),
            ));
        }

        let name_len = self.name_len(inner);
        if name_len == 0 {
            return None;
        }
        let tag = &inner[..name_len];
        let after = &inner[name_len..];

        let sep = after.chars().next()?;
        if sep == ']' {
            return Some(("[]".len() + name_len, TokenKind::OpenBBTag(BBTag { tag, args: "" })));
        }
        if sep != '=' && !sep.is_whitespace() {
            return None;
        }

        let args_end = after.find(']')?;
        // `=` stays on the args so the positional shorthand survives.
        let args = if sep == '=' {
            &after[..args_end]
        } else {
            &after[sep.len_utf8()..args_end]
        };
        if args.trim_start_matches('=').trim().is_empty() {
            return None;
        }

        Some((
            "[]".len() + name_len + args_end,
            TokenKind::OpenBBTag(BBTag { tag, args }),
        ))
    }

    fn name_len(&self, s: &str) -> usize {
        if self.config.contains(ParserFeature::ITEM_MARKERS) && s.starts_with('*') {
            return 1;
        }
        s.bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count()
    }
}

impl<'a> Iterator for BBParser<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        const TAG_OPENER: char = '[';

        if self.loc >= self.input.len() {
            return None;
        }

        let start = self.loc;

        if self.remaining().starts_with(TAG_OPENER) {
            if let Some((len, kind)) = self.read_tag() {
                self.loc += len;
                return Some(Token {
                    span: &self.input[start..self.loc],
                    start,
                    kind,
                });
            }
        }

        // Text runs to the next opener, skipping the one we may be sitting on.
        let skip = if self.remaining().starts_with(TAG_OPENER) {
            TAG_OPENER.len_utf8()
        } else {
            0
        };
        let segment_end = self.remaining()[skip..]
            .find(TAG_OPENER)
            .map(|x| x + skip)
            .unwrap_or(self.remaining().len());

        self.loc += segment_end;
        Some(Token {
            span: &self.input[start..self.loc],
            start,
            kind: TokenKind::Text,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub span: &'a str,
    pub start: usize,
    pub kind: TokenKind<'a>,
}

impl<'a> Token<'a> {
    /// Byte offset one past the end of this token.
    pub fn end(&self) -> usize {
        self.start + self.span.len()
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, TokenKind::Text)
    }

    pub fn is_open(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::OpenBBTag(t) if t.tag.eq_ignore_ascii_case(name))
    }

    pub fn is_open_argless(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::OpenBBTag(t) if t.tag.eq_ignore_ascii_case(name) && t.args.is_empty())
    }

    pub fn is_close(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::CloseBBTag(t) if t.tag.eq_ignore_ascii_case(name))
    }

    pub fn tag_name(&self) -> Option<&'a str> {
        match &self.kind {
            TokenKind::OpenBBTag(t) | TokenKind::CloseBBTag(t) => Some(t.tag),
            TokenKind::Text => None,
        }
    }

    pub fn args(&self) -> Option<&'a str> {
        match &self.kind {
            TokenKind::OpenBBTag(t) if !t.args.is_empty() => Some(t.args),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BBTag<'a> {
    pub tag: &'a str,
    pub args: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind<'a> {
    OpenBBTag(BBTag<'a>),
    CloseBBTag(BBTag<'a>),
    Text,
}

#[cfg(test)]
mod tests;
