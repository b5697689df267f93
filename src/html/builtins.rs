//! Built-in tag rules.
//!
//! Every rule gets its parsed attributes and its already rendered body, and returns the HTML for the
//! whole element. Returning `None` leaves the element as typed.
use std::fmt::Write;

use tracing::debug;

use super::{ColorCheck, RuleContext, TagRule};

const DEFAULT_COLOR: &str = "#000000";
const DEFAULT_HIGHLIGHT: &str = "yellow";
const SIZE_MIN: f64 = 50.0;
const SIZE_MAX: f64 = 200.0;
const SIZE_DIVISOR: f64 = 5.0;
const VIDEO_EMBED: &str = "https://www.youtube.com/embed/";

/// Tags that render as a fixed open/close pair around the body, plus data attributes.
macro_rules! simple_tag {
    ($doc:expr, $name:ident, $tags:expr, $open:expr, $close:expr) => {
        #[derive(Copy, Clone, Debug, Default)]
        #[doc = $doc]
        #[doc = ""]
        #[doc = "This matches the following BBCode tags: `"]
        #[doc = stringify!($tags)]
        #[doc = "`"]
        pub struct $name;

        impl TagRule for $name {
            fn names(&self) -> &'static [&'static str] {
                &$tags
            }

            fn render(&self, cx: &RuleContext<'_>, body: &str) -> Option<String> {
                Some(format!(concat!($open, "{}", " >{}", $close), cx.data_attrs(), body))
            }
        }
    };
}

simple_tag! {
    "Bold text, as `<strong>`.",
    BoldTag, ["b"], "<strong", "</strong>"
}
simple_tag! {
    "Italic text, as `<em>`.",
    ItalicTag, ["i"], "<em", "</em>"
}
simple_tag! {
    "Underlined text.",
    UnderlineTag, ["u"], "<span style=\"text-decoration:underline\"", "</span>"
}
simple_tag! {
    "Struck through text.",
    StrikeTag, ["s"], "<span style=\"text-decoration:line-through\"", "</span>"
}
simple_tag! {
    "An indented block, as `<blockquote>`.",
    IndentTag, ["indent"], "<blockquote", "</blockquote>"
}

/// Tags that map one to one onto the HTML element of the same name.
#[derive(Copy, Clone, Debug, Default)]
pub struct PassthroughTag;

impl TagRule for PassthroughTag {
    fn names(&self) -> &'static [&'static str] {
        &["span", "h1", "h2", "h3", "h4", "h5", "h6"]
    }

    fn render(&self, cx: &RuleContext<'_>, body: &str) -> Option<String> {
        let tag = cx.name();
        Some(format!("<{tag}{}>{body}</{tag}>", cx.data_attrs()))
    }
}

/// `[quote name=Someone author=id]`, with a "Someone wrote:" caption when a name is given.
#[derive(Copy, Clone, Debug, Default)]
pub struct QuoteTag;

impl TagRule for QuoteTag {
    fn names(&self) -> &'static [&'static str] {
        &["quote"]
    }

    fn render(&self, cx: &RuleContext<'_>, body: &str) -> Option<String> {
        let name = cx.attrs.get("name").or(cx.attrs.positional);

        let mut out = format!("<div{}{}", cx.class_attr(Some("quote")), cx.data_attrs());
        if let Some(author) = cx.attrs.get("author") {
            let _ = write!(out, " data-author=\"{author}\"");
        }
        if let Some(name) = name {
            let _ = write!(out, " data-name=\"{name}\"");
        }
        out.push('>');
        if let Some(name) = name {
            let _ = write!(out, "{name} wrote:");
        }
        let _ = write!(out, "<blockquote>{body}</blockquote></div>");
        Some(out)
    }
}

/// `[url=target]text[/url]` or `[url]target[/url]`.
#[derive(Copy, Clone, Debug, Default)]
pub struct UrlTag;

impl TagRule for UrlTag {
    fn names(&self) -> &'static [&'static str] {
        &["url"]
    }

    fn render(&self, cx: &RuleContext<'_>, body: &str) -> Option<String> {
        let href = cx.attrs.get("url").unwrap_or_else(|| cx.element.body.trim());
        if !cx.options.allow_unsafe_urls && !is_safe_url(href) {
            debug!(href, "rejected link target");
            return None;
        }

        Some(format!(
            "<a{}{}{} target=\"_blank\" href=\"{href}\" rel=\"nofollow\">{body}</a>",
            cx.class_attr(Some("link")),
            cx.data_attrs(),
            optional_attr("alt", cx.attrs.get("alt")),
        ))
    }
}

/// `[email=addr]text[/email]`. The address goes into `href` as given.
#[derive(Copy, Clone, Debug, Default)]
pub struct EmailTag;

impl TagRule for EmailTag {
    fn names(&self) -> &'static [&'static str] {
        &["email"]
    }

    fn render(&self, cx: &RuleContext<'_>, body: &str) -> Option<String> {
        let href = cx.attrs.get("email").unwrap_or_else(|| cx.element.body.trim());
        if !cx.options.allow_unsafe_urls && !is_safe_email(href) {
            debug!(href, "rejected email target");
            return None;
        }

        Some(format!(
            "<a{}{}{} target=\"_blank\" href=\"{href}\">{body}</a>",
            cx.class_attr(Some("link")),
            cx.data_attrs(),
            optional_attr("alt", cx.attrs.get("alt")),
        ))
    }
}

/// `[list]`, `[ul]` and `[ol]`. `[list=1]` (any value) gives an ordered list.
#[derive(Copy, Clone, Debug, Default)]
pub struct ListTag;

impl TagRule for ListTag {
    fn names(&self) -> &'static [&'static str] {
        &["list", "ul", "ol"]
    }

    fn item_scope(&self) -> Option<&'static [&'static str]> {
        Some(&["*"])
    }

    fn render(&self, cx: &RuleContext<'_>, body: &str) -> Option<String> {
        let tag = if cx.name() == "ol" || cx.attrs.has("list") {
            "ol"
        } else {
            "ul"
        };
        Some(format!(
            "<{tag}{}{}>{body}</{tag}>",
            cx.data_attrs(),
            cx.class_attr(None)
        ))
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct TableTag;

impl TagRule for TableTag {
    fn names(&self) -> &'static [&'static str] {
        &["table"]
    }

    fn item_scope(&self) -> Option<&'static [&'static str]> {
        Some(&["tr", "td"])
    }

    fn render(&self, cx: &RuleContext<'_>, body: &str) -> Option<String> {
        Some(format!(
            "<table{}{}>{body}</table>",
            cx.data_attrs(),
            cx.class_attr(None)
        ))
    }
}

/// `[*]`, `[tr]` and `[td]`. Only rendered inside the container that owns them.
#[derive(Copy, Clone, Debug, Default)]
pub struct ItemTag;

impl TagRule for ItemTag {
    fn names(&self) -> &'static [&'static str] {
        &["*", "tr", "td"]
    }

    fn is_item(&self) -> bool {
        true
    }

    fn render(&self, cx: &RuleContext<'_>, body: &str) -> Option<String> {
        let tag = match cx.name() {
            "*" => "li",
            other => other,
        };
        Some(format!("<{tag}>{}</{tag}>", body.trim()))
    }
}

/// Code blocks. `[code]` gets the plain class, language tags get `code_<lang>`.
#[derive(Copy, Clone, Debug, Default)]
pub struct CodeTag;

impl TagRule for CodeTag {
    fn names(&self) -> &'static [&'static str] {
        &["code", "php", "java", "javascript", "cpp", "ruby", "python"]
    }

    fn verbatim(&self) -> bool {
        true
    }

    fn render(&self, cx: &RuleContext<'_>, body: &str) -> Option<String> {
        let suffix = match cx.name() {
            "code" => "code".to_owned(),
            lang => format!("code_{lang}"),
        };
        Some(format!(
            "<pre{}{} >{body}</pre>",
            cx.class_attr(Some(suffix.as_str())),
            cx.data_attrs()
        ))
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct HighlightTag;

impl TagRule for HighlightTag {
    fn names(&self) -> &'static [&'static str] {
        &["highlight"]
    }

    fn render(&self, cx: &RuleContext<'_>, body: &str) -> Option<String> {
        let color = cx
            .attrs
            .get("color")
            .or(cx.attrs.positional)
            .filter(|c| is_css_word(c))
            .unwrap_or(DEFAULT_HIGHLIGHT);
        Some(format!(
            "<span{} style=\"background-color: {color}\"{} >{body}</span>",
            cx.class_attr(Some("highlight")),
            cx.data_attrs()
        ))
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct ColorTag;

impl TagRule for ColorTag {
    fn names(&self) -> &'static [&'static str] {
        &["color"]
    }

    fn render(&self, cx: &RuleContext<'_>, body: &str) -> Option<String> {
        let color = check_color(cx.attrs.get("color"), cx.options.color_check);
        Some(format!(
            "<span{} style=\"color: {color};\"{}>{body}</span>",
            cx.class_attr(Some("color")),
            cx.data_attrs()
        ))
    }
}

/// `[size=N]`, N clamped to 50..=200 and divided by 5 to give pixels.
#[derive(Copy, Clone, Debug, Default)]
pub struct SizeTag;

impl TagRule for SizeTag {
    fn names(&self) -> &'static [&'static str] {
        &["size"]
    }

    fn render(&self, cx: &RuleContext<'_>, body: &str) -> Option<String> {
        let px = font_size_px(cx.attrs.get("size"));
        Some(format!(
            "<span{} style=\"font-size: {px}px;\"{}>{body}</span>",
            cx.class_attr(Some("size")),
            cx.data_attrs()
        ))
    }
}

/// `[img width=100 height=50 title=.. alt=..]src[/img]`.
#[derive(Copy, Clone, Debug, Default)]
pub struct ImageTag;

impl TagRule for ImageTag {
    fn names(&self) -> &'static [&'static str] {
        &["img"]
    }

    fn render(&self, cx: &RuleContext<'_>, _body: &str) -> Option<String> {
        let src = cx.element.body.trim();
        if src.is_empty() || (!cx.options.allow_unsafe_urls && !is_safe_url(src)) {
            debug!(src, "rejected image source");
            return None;
        }

        let mut out = format!(
            "<img{} src=\"{src}\"{}",
            cx.class_attr(Some("image")),
            cx.data_attrs()
        );
        for dim in ["width", "height"] {
            if let Some(n) = cx.attrs.get(dim).and_then(|v| v.parse::<u32>().ok()) {
                let _ = write!(out, " {dim}=\"{n}px\"");
            }
        }
        out.push_str(&optional_attr("title", cx.attrs.get("title")));
        out.push_str(&optional_attr("alt", cx.attrs.get("alt")));
        out.push('>');
        Some(out)
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct AlignTag;

impl TagRule for AlignTag {
    fn names(&self) -> &'static [&'static str] {
        &["center", "left", "right"]
    }

    fn render(&self, cx: &RuleContext<'_>, body: &str) -> Option<String> {
        Some(format!(
            "<div style=\"text-align: {};\"{}{}>{body}</div>",
            cx.name(),
            cx.data_attrs(),
            cx.class_attr(None)
        ))
    }
}

/// `[sup]` and `[sub]`.
#[derive(Copy, Clone, Debug, Default)]
pub struct VerticalAlignTag;

impl TagRule for VerticalAlignTag {
    fn names(&self) -> &'static [&'static str] {
        &["sup", "sub"]
    }

    fn render(&self, cx: &RuleContext<'_>, body: &str) -> Option<String> {
        let align = if cx.name() == "sup" { "super" } else { "sub" };
        Some(format!(
            "<span style=\"vertical-align: {align};\"{}{}>{body}</span>",
            cx.data_attrs(),
            cx.class_attr(None)
        ))
    }
}

/// `[video]id[/video]`, embedded as a fixed size YouTube player.
#[derive(Copy, Clone, Debug, Default)]
pub struct VideoTag;

impl TagRule for VideoTag {
    fn names(&self) -> &'static [&'static str] {
        &["video"]
    }

    fn render(&self, cx: &RuleContext<'_>, _body: &str) -> Option<String> {
        let id = cx.element.body.trim();
        let id_ok = !id.is_empty()
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if !cx.options.allow_unsafe_urls && !id_ok {
            debug!(id, "rejected video id");
            return None;
        }

        Some(format!(
            "<iframe src=\"{VIDEO_EMBED}{id}\"{}{} width=\"640\" height=\"480\" frameborder=\"0\"></iframe>",
            cx.data_attrs(),
            cx.class_attr(None)
        ))
    }
}

fn optional_attr(name: &str, value: Option<&str>) -> String {
    value.map(|v| format!(" {name}=\"{v}\"")).unwrap_or_default()
}

/// Letters, digits, `_` and `#`: what can safely go inside a `style` value.
fn is_css_word(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'#')
}

pub(crate) fn check_color(value: Option<&str>, mode: ColorCheck) -> &str {
    let Some(value) = value else {
        return DEFAULT_COLOR;
    };

    let ok = match mode {
        ColorCheck::Strict => value.strip_prefix('#').is_some_and(|hex| {
            (hex.len() == 3 || hex.len() == 6) && hex.bytes().all(|b| b.is_ascii_hexdigit())
        }),
        // Legacy length check could never pass, so every hex value fell back.
        ColorCheck::Legacy => !value.starts_with('#') && is_css_word(value),
    };

    if ok {
        value
    } else {
        debug!(value, ?mode, "rejected color");
        DEFAULT_COLOR
    }
}

pub(crate) fn font_size_px(value: Option<&str>) -> f64 {
    let size = value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(SIZE_MIN);
    size.clamp(SIZE_MIN, SIZE_MAX) / SIZE_DIVISOR
}

const SAFE_SCHEMES: &[&str] = &["http", "https", "ftp"];

/// Relative targets and the allow-listed schemes pass.
/// Input is escaped before tags are read, so a `<` can only be a converted line break.
pub(crate) fn is_safe_url(url: &str) -> bool {
    if url.contains('<') {
        return false;
    }
    match url_scheme(url) {
        Some(scheme) => SAFE_SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)),
        None => true,
    }
}

pub(crate) fn is_safe_email(addr: &str) -> bool {
    if addr.contains('<') {
        return false;
    }
    match url_scheme(addr) {
        Some(scheme) => scheme.eq_ignore_ascii_case("mailto"),
        None => addr.contains('@'),
    }
}

/// The part before the first `:`, unless a path, query or fragment starts first.
fn url_scheme(url: &str) -> Option<&str> {
    let colon = url.find(':')?;
    let scheme = &url[..colon];
    if scheme.contains(['/', '?', '#']) {
        None
    } else {
        Some(scheme)
    }
}

macro_rules! tag_list {
    ($($tag:ident),*) => {
        {
            let v: Vec<Box<dyn TagRule>> = vec![
                $(
                    Box::new($tag::default()),
                )*
            ];

            v
        }
    };
}

/// Returns every built-in tag rule.
/// # Included tags
/// - [QuoteTag], [UrlTag], [EmailTag]
/// - [BoldTag], [ItalicTag], [UnderlineTag], [StrikeTag], [IndentTag]
/// - [ListTag], [TableTag], [ItemTag]
/// - [CodeTag], [HighlightTag], [ColorTag], [SizeTag]
/// - [PassthroughTag], [ImageTag], [AlignTag], [VerticalAlignTag], [VideoTag]
pub fn all_tags() -> Vec<Box<dyn TagRule>> {
    tag_list! {
        QuoteTag,
        UrlTag,
        EmailTag,
        BoldTag,
        ItalicTag,
        UnderlineTag,
        StrikeTag,
        IndentTag,
        ListTag,
        TableTag,
        ItemTag,
        CodeTag,
        HighlightTag,
        ColorTag,
        SizeTag,
        PassthroughTag,
        ImageTag,
        AlignTag,
        VerticalAlignTag,
        VideoTag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_strict() {
        assert_eq!(check_color(Some("#fff"), ColorCheck::Strict), "#fff");
        assert_eq!(check_color(Some("#A0b1C2"), ColorCheck::Strict), "#A0b1C2");
        assert_eq!(check_color(Some("#ff"), ColorCheck::Strict), DEFAULT_COLOR);
        assert_eq!(check_color(Some("#gggggg"), ColorCheck::Strict), DEFAULT_COLOR);
        assert_eq!(check_color(Some("red"), ColorCheck::Strict), DEFAULT_COLOR);
        assert_eq!(check_color(None, ColorCheck::Strict), DEFAULT_COLOR);
    }

    #[test]
    fn color_legacy() {
        assert_eq!(check_color(Some("#ff0000"), ColorCheck::Legacy), DEFAULT_COLOR);
        assert_eq!(check_color(Some("notahex"), ColorCheck::Legacy), "notahex");
        assert_eq!(check_color(Some("red;x:y"), ColorCheck::Legacy), DEFAULT_COLOR);
    }

    #[test]
    fn size_clamps() {
        assert_eq!(font_size_px(Some("500")), 40.0);
        assert_eq!(font_size_px(Some("1")), 10.0);
        assert_eq!(font_size_px(Some("123")), 24.6);
        assert_eq!(font_size_px(Some("big")), 10.0);
        assert_eq!(font_size_px(None), 10.0);
    }

    #[test]
    fn url_schemes() {
        assert!(is_safe_url("http://example.com"));
        assert!(is_safe_url("HTTPS://example.com"));
        assert!(is_safe_url("/relative/path"));
        assert!(is_safe_url("page?x=a:b"));
        assert!(!is_safe_url("javascript:alert(1)"));
        assert!(!is_safe_url("data:text/html,x"));
        assert!(!is_safe_url("java\tscript:alert(1)"));
        assert!(!is_safe_url("http://a<br>b"));
    }

    #[test]
    fn email_targets() {
        assert!(is_safe_email("someone@example.com"));
        assert!(is_safe_email("mailto:someone@example.com"));
        assert!(!is_safe_email("javascript:alert(1)"));
        assert!(!is_safe_email("nobody"));
        assert!(!is_safe_email("a@b<br>c"));
    }

    #[test]
    fn tag_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for rule in all_tags() {
            for name in rule.names() {
                assert!(seen.insert(*name), "duplicate tag {name}");
            }
        }
    }
}
