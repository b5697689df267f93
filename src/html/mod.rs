//! HTML serialization of BBCode.
//!
//! The input is escaped once, up front, so tag syntax is the only markup left in it. The escaped
//! text is then parsed into a tree and every recognized element is expanded through its
//! [`TagRule`], innermost first. Anything unrecognized is emitted exactly as typed.
use std::{collections::HashMap, fmt::Write, sync::LazyLock};

use static_assertions::{assert_impl_all, assert_obj_safe};
use tracing::{debug, trace_span};

use crate::{
    error::RenderError,
    parser::{
        attrs::AttributeSet,
        rules::NoParseRule,
        tree::{Document, Element, Node},
        ParserConfig, ParserFeature, MAX_SUPPORTED_DEPTH,
    },
};

pub mod builtins;
mod options;

pub use options::{ColorCheck, RenderOptions, RenderOverrides};

/// The primary trait for converting BBCode tags to HTML.
pub trait TagRule: Send + Sync {
    /// Lowercase tag names this rule handles.
    fn names(&self) -> &'static [&'static str];

    /// Produce the HTML for a whole element, given its rendered body.
    /// Returning `None` leaves the element exactly as typed.
    fn render(&self, cx: &RuleContext<'_>, body: &str) -> Option<String>;

    /// Item tags (like `[*]`) that become valid for this element's descendants.
    /// `None` keeps whatever the parent allowed.
    fn item_scope(&self) -> Option<&'static [&'static str]> {
        None
    }

    /// Whether this tag only renders inside a container that put it in scope.
    fn is_item(&self) -> bool {
        false
    }

    /// Whether this tag's body is kept as typed when [`RenderOptions::verbatim_code`] is set.
    fn verbatim(&self) -> bool {
        false
    }
}

assert_obj_safe!(TagRule);

/// Everything a [`TagRule`] gets to look at.
pub struct RuleContext<'a> {
    pub options: &'a RenderOptions,
    pub element: &'a Element<'a>,
    pub attrs: &'a AttributeSet<'a>,
}

impl<'a> RuleContext<'a> {
    /// The lowercased tag name.
    pub fn name(&self) -> &'a str {
        &self.element.name
    }

    /// ` data-x="y"` pairs, or nothing when data attributes are disabled.
    pub fn data_attrs(&self) -> String {
        if !self.options.allow_data_attributes {
            return String::new();
        }
        let mut out = String::new();
        for (key, value) in &self.attrs.data {
            let _ = write!(out, " {key}=\"{value}\"");
        }
        out
    }

    /// ` class="prefix [custom..] [suffix]"`.
    pub fn class_attr(&self, suffix: Option<&str>) -> String {
        let mut classes: Vec<&str> = vec![self.options.class_prefix.as_str()];
        if self.options.allow_custom_classes {
            classes.extend(self.attrs.classes.iter().copied());
        }
        classes.extend(suffix);
        classes.retain(|c| !c.is_empty());
        format!(" class=\"{}\"", classes.join(" "))
    }
}

/// Serializes BBCode to HTML using the registered tag rules.
pub struct HtmlSerializer {
    tag_impls: Vec<Box<dyn TagRule>>,
    tag_cache: HashMap<&'static str, usize>,
}

assert_impl_all!(HtmlSerializer: Send, Sync);
assert_impl_all!(RenderOptions: Send, Sync);

impl Default for HtmlSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlSerializer {
    /// Construct a new serializer with every built-in tag.
    pub fn new() -> Self {
        Self::with_tags(builtins::all_tags())
    }

    /// Construct a new serializer with no tags. Everything passes through escaped.
    pub fn empty() -> Self {
        Self::with_tags(vec![])
    }

    /// Construct a new serializer with the given tags.
    pub fn with_tags(tags: Vec<Box<dyn TagRule>>) -> Self {
        let mut serializer = Self {
            tag_impls: Vec::with_capacity(tags.len()),
            tag_cache: HashMap::new(),
        };
        for tag in tags {
            serializer.register_tag(tag);
        }
        serializer
    }

    /// Register the provided tag. It replaces any earlier rule for the same names.
    pub fn register_tag(&mut self, tag: Box<dyn TagRule>) {
        let idx = self.tag_impls.len();
        for name in tag.names() {
            self.tag_cache.insert(*name, idx);
        }
        self.tag_impls.push(tag);
    }

    /// Attempt to locate the rule for the given (lowercase) tag name.
    pub fn get_rule_for_tag(&self, tag_name: &str) -> Option<&dyn TagRule> {
        self.tag_cache
            .get(tag_name)
            .map(|idx| self.tag_impls[*idx].as_ref())
    }

    fn parser_config(&self, options: &RenderOptions) -> ParserConfig {
        let no_parse = if options.verbatim_code {
            self.tag_cache
                .iter()
                .filter(|(_, idx)| self.tag_impls[**idx].verbatim())
                .map(|(name, _)| NoParseRule::new(*name))
                .collect()
        } else {
            vec![]
        };

        ParserConfig {
            feature_flags: ParserFeature::ITEM_MARKERS,
            max_depth: options.max_depth.min(MAX_SUPPORTED_DEPTH),
            no_parse,
        }
    }

    /// Serialize the given BBCode to HTML.
    pub fn serialize(&self, content: &str, options: &RenderOptions) -> String {
        let _span = trace_span!("serialize", len = content.len()).entered();

        let escaped = escape(content, options.convert_newlines);
        let doc = Document::parse(&escaped, &self.parser_config(options));

        let mut out = String::with_capacity(escaped.len());
        self.write_nodes(&doc.nodes, &[], options, &mut out);
        out
    }

    fn write_nodes(
        &self,
        nodes: &[Node<'_>],
        scope: &[&str],
        options: &RenderOptions,
        out: &mut String,
    ) {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(el) => self.write_element(el, scope, options, out),
            }
        }
    }

    fn write_element(
        &self,
        el: &Element<'_>,
        scope: &[&str],
        options: &RenderOptions,
        out: &mut String,
    ) {
        let Some(rule) = self.get_rule_for_tag(&el.name) else {
            debug!(tag = %el.name, "unknown tag left as text");
            out.push_str(el.span);
            return;
        };

        if rule.is_item() && !scope.contains(&el.name.as_str()) {
            out.push_str(el.span);
            return;
        }

        let child_scope = rule.item_scope().unwrap_or(scope);
        let mut body = String::with_capacity(el.body.len());
        self.write_nodes(&el.children, child_scope, options, &mut body);

        let attrs = AttributeSet::parse(&el.name, el.args);
        let cx = RuleContext {
            options,
            element: el,
            attrs: &attrs,
        };

        match rule.render(&cx, &body) {
            Some(html) => out.push_str(&html),
            None => out.push_str(el.span),
        }
    }
}

/// Escape `&`, `<`, `>` and `"`, then optionally turn line breaks into `<br>`.
pub fn escape(content: &str, convert_newlines: bool) -> String {
    let escaped = html_escape::encode_double_quoted_attribute(content);
    if convert_newlines {
        escaped.replace("\r\n", "<br>").replace('\n', "<br>")
    } else {
        escaped.into_owned()
    }
}

static DEFAULT_SERIALIZER: LazyLock<HtmlSerializer> = LazyLock::new(HtmlSerializer::new);

/// Render BBCode to HTML with the built-in tags.
///
/// # Examples
///
/// ```
/// use bbfilter::{render, RenderOptions};
///
/// let html = render("[b]hi[/b] <there>", &RenderOptions::default());
/// assert_eq!(html, "<strong >hi</strong> &lt;there&gt;");
/// ```
pub fn render(content: &str, options: &RenderOptions) -> String {
    DEFAULT_SERIALIZER.serialize(content, options)
}

/// [`render`] with default options.
pub fn render_default(content: &str) -> String {
    static DEFAULTS: LazyLock<RenderOptions> = LazyLock::new(RenderOptions::default);
    render(content, &DEFAULTS)
}

/// [`render`], refusing input longer than [`RenderOptions::max_input_len`].
pub fn try_render(content: &str, options: &RenderOptions) -> Result<String, RenderError> {
    if let Some(max) = options.max_input_len {
        if content.len() > max {
            return Err(RenderError::InputTooLong {
                len: content.len(),
                max,
            });
        }
    }
    Ok(render(content, options))
}
