//! Attribute grammar for open tags.
//!
//! `[tag=value key=value key2='quoted value' data-x=1 class=foo]`
//!
//! Input is already HTML-escaped, so a double quote arrives as `&quot;` and is treated as a quote,
//! and any `<` is the start of a converted line break. Line breaks separate attributes like spaces do
//! and never end up inside a value.
use std::collections::BTreeMap;

const ESCAPED_QUOTE: &str = "&quot;";
const LINE_BREAK: &str = "<br>";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet<'a> {
    tag: &'a str,
    /// The value given through the `[tag=value]` shorthand.
    pub positional: Option<&'a str>,
    pub named: BTreeMap<String, &'a str>,
    pub data: BTreeMap<String, &'a str>,
    pub classes: Vec<&'a str>,
}

impl<'a> AttributeSet<'a> {
    /// Parse the raw argument text of an open tag. Fragments that are not `key=value` are skipped.
    pub fn parse(tag: &'a str, args: &'a str) -> AttributeSet<'a> {
        let mut set = AttributeSet {
            tag,
            ..Default::default()
        };

        let mut rest = args;
        if let Some(after_eq) = rest.strip_prefix('=') {
            let (value, after) = take_value(skip_separators(after_eq));
            if !value.is_empty() {
                set.positional = Some(value);
            }
            rest = after;
        }

        loop {
            rest = skip_separators(rest);
            if rest.is_empty() {
                break;
            }

            let key_end = rest
                .find(|c: char| c == '=' || c.is_whitespace())
                .unwrap_or(rest.len());
            let key = &rest[..key_end];
            rest = &rest[key_end..];

            let Some(after_eq) = rest.strip_prefix('=') else {
                continue;
            };
            let (value, after) = take_value(after_eq);
            rest = after;

            if is_valid_key(key) && !value.is_empty() {
                set.insert(key, value);
            }
        }

        set
    }

    fn insert(&mut self, key: &str, value: &'a str) {
        let key = key.to_ascii_lowercase();
        if key == "class" {
            self.classes.extend(value.split_whitespace());
        } else if key.starts_with("data-") {
            self.data.insert(key, value);
        } else {
            self.named.insert(key, value);
        }
    }

    /// Look up a named attribute. Asking for the tag's own name falls back to the positional value,
    /// so `[size=120]` and `[size size=120]` read the same.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.named.get(key).copied().or_else(|| {
            if key.eq_ignore_ascii_case(self.tag) {
                self.positional
            } else {
                None
            }
        })
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '<'
}

fn skip_separators(mut s: &str) -> &str {
    loop {
        s = s.trim_start();
        match s.strip_prefix(LINE_BREAK) {
            Some(after) => s = after,
            None => return s,
        }
    }
}

/// Split one value off the front of `s`, stripping a surrounding quote pair if present.
fn take_value(s: &str) -> (&str, &str) {
    for quote in [ESCAPED_QUOTE, "'"] {
        if let Some(inner) = s.strip_prefix(quote) {
            if let Some(end) = inner.find(quote) {
                let value = &inner[..end];
                let value = &value[..value.find('<').unwrap_or(value.len())];
                return (value, &inner[end + quote.len()..]);
            }
            // Unterminated, take the bare word without its opening quote.
            let end = inner.find(is_separator).unwrap_or(inner.len());
            return (&inner[..end], &inner[end..]);
        }
    }

    let end = s.find(is_separator).unwrap_or(s.len());
    (&s[..end], &s[end..])
}
