use crate::parser::{
    rules::NoParseRule,
    tree::{Document, Node},
    BBParser, ParserConfig, ParserFeature, Token, TokenKind, MAX_SUPPORTED_DEPTH,
};

const LOREM_IPSUM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. In lorem quam, fermentum id porttitor ac, iaculis eu arcu. Aliquam vulputate tempus felis consequat elementum. Cras auctor nunc a cursus lobortis.";

#[test]
pub fn just_text() {
    let mut parser = BBParser::new(LOREM_IPSUM);
    let tok = parser.next().unwrap();
    assert!(tok.is_text());
    assert!(tok.args().is_none());
    assert!(parser.next().is_none())
}

const SIMPLE: &str = "[b]This is a test![/b] and it's very cool.";

#[test]
pub fn simple_tags() {
    let mut parser = BBParser::new(SIMPLE);
    let bold_tag = parser.next().unwrap();
    assert!(bold_tag.is_open("b"));
    assert!(bold_tag.is_open("B"));
    assert!(bold_tag.is_open_argless("b"));
    assert!(!bold_tag.is_close("b"));

    assert!(matches!(
        parser.next(),
        Some(Token {
            kind: TokenKind::Text,
            ..
        })
    ));

    let close = parser.next().unwrap();
    assert!(close.is_close("b"));
    assert_eq!(close.span, "[/b]");

    assert!(matches!(
        parser.next(),
        Some(Token {
            kind: TokenKind::Text,
            ..
        })
    ));

    assert!(parser.next().is_none());
}

const TAG_KINDS: &str = "[open_argless][open args][open=args][/close_argless][*]";

#[test]
pub fn tag_kinds() {
    let mut parser = BBParser::new(TAG_KINDS);
    // [open_argless]
    let tag = parser.next().unwrap();
    assert!(tag.is_open_argless("open_argless"));
    // [open args]
    let tag = parser.next().unwrap();
    assert!(!tag.is_open_argless("open"));
    assert!(tag.is_open("open"));
    assert_eq!(tag.args(), Some("args"));
    // [open=args]
    let tag = parser.next().unwrap();
    assert!(tag.is_open("open"));
    assert_eq!(tag.args(), Some("=args"));
    // [/close_argless]
    let tag = parser.next().unwrap();
    assert!(tag.is_close("close_argless"));
    // [*]
    let tag = parser.next().unwrap();
    assert!(tag.is_open_argless("*"));
    assert!(parser.next().is_none());
}

#[test]
pub fn item_markers_can_be_disabled() {
    let mut parser = BBParser::with_features("[*]", ParserFeature::empty());
    let tok = parser.next().unwrap();
    assert!(tok.is_text());
    assert_eq!(tok.span, "[*]");
}

const NOT_TAGS: &str = "[ bar ] [/close args] [b=] [x-y] [";

#[test]
pub fn malformed_tags_are_text() {
    let parser = BBParser::new(NOT_TAGS);
    let spans: Vec<_> = parser.inspect(|t| assert!(t.is_text())).map(|t| t.span).collect();
    assert_eq!(spans.concat(), NOT_TAGS);
}

const UNCLOSED_TAG: &str = "[not_a_tag=real ";

#[test]
pub fn unclosed_tag() {
    let mut parser = BBParser::new(UNCLOSED_TAG);

    assert!(parser.next().unwrap().is_text());
    assert!(parser.next().is_none());
}

#[test]
pub fn bracket_before_tag() {
    let tokens: Vec<_> = BBParser::new("[[b]x[/b]").collect();
    assert_eq!(tokens[0].span, "[");
    assert!(tokens[1].is_open("b"));
    assert_eq!(tokens[1].start, 1);
}

fn element_names(nodes: &[Node<'_>]) -> Vec<String> {
    nodes
        .iter()
        .filter_map(|n| match n {
            Node::Element(e) => Some(e.name.clone()),
            Node::Text(_) => None,
        })
        .collect()
}

#[test]
pub fn tree_nests_inside_out() {
    let doc = Document::parse("[b][i]hello[/i][/b]", &ParserConfig::default());
    assert_eq!(doc.nodes.len(), 1);
    let Node::Element(b) = &doc.nodes[0] else {
        panic!("expected element");
    };
    assert_eq!(b.name, "b");
    assert_eq!(b.body, "[i]hello[/i]");
    assert_eq!(element_names(&b.children), vec!["i"]);
}

#[test]
pub fn tree_mismatched_close_is_text() {
    let doc = Document::parse("[b]bold[/i]", &ParserConfig::default());
    assert!(doc.nodes.iter().all(|n| matches!(n, Node::Text(_))));
}

#[test]
pub fn tree_crossed_tags() {
    let doc = Document::parse("[b][i]x[/b][/i]", &ParserConfig::default());
    let Node::Element(b) = &doc.nodes[0] else {
        panic!("expected element");
    };
    assert!(element_names(&b.children).is_empty());
    assert_eq!(doc.nodes[1], Node::Text("[/i]"));
}

#[test]
pub fn tree_stray_inner_tag_keeps_outer_pair() {
    let doc = Document::parse("[b][i][b]x[/i][/b]", &ParserConfig::default());
    assert_eq!(doc.nodes.len(), 1);
    let Node::Element(b) = &doc.nodes[0] else {
        panic!("expected element");
    };
    assert_eq!(b.body, "[i][b]x[/i]");
    let Node::Element(i) = &b.children[0] else {
        panic!("expected element");
    };
    assert_eq!(i.children, vec![Node::Text("[b]"), Node::Text("x")]);

    let doc = Document::parse("[b]a[i]b[b]c[/i]d[/b]", &ParserConfig::default());
    assert_eq!(element_names(&doc.nodes), vec!["b"]);
}

#[test]
pub fn tree_case_insensitive_pairing() {
    let doc = Document::parse("[URL=x]y[/url]", &ParserConfig::default());
    assert_eq!(element_names(&doc.nodes), vec!["url"]);
}

#[test]
pub fn tree_same_name_nesting() {
    let doc = Document::parse("[quote][quote]a[/quote]b[/quote]", &ParserConfig::default());
    let Node::Element(outer) = &doc.nodes[0] else {
        panic!("expected element");
    };
    assert_eq!(outer.body, "[quote]a[/quote]b");
    assert_eq!(element_names(&outer.children), vec!["quote"]);
}

#[test]
pub fn tree_depth_limit() {
    let config = ParserConfig {
        max_depth: 2,
        ..Default::default()
    };
    let doc = Document::parse("[b][i][u]x[/u][/i][/b]", &config);
    let Node::Element(b) = &doc.nodes[0] else {
        panic!("expected element");
    };
    let Node::Element(i) = &b.children[0] else {
        panic!("expected element");
    };
    assert_eq!(i.depth, 2);
    assert_eq!(i.children, vec![Node::Text("[u]x[/u]")]);
}

#[test]
pub fn tree_no_parse_rule() {
    let config = ParserConfig {
        no_parse: vec![NoParseRule::new("code")],
        ..Default::default()
    };
    let doc = Document::parse("[code][b]x[/b][/code][b]y[/b]", &config);
    let Node::Element(code) = &doc.nodes[0] else {
        panic!("expected element");
    };
    assert_eq!(code.children, vec![Node::Text("[b]x[/b]")]);
    assert_eq!(element_names(&doc.nodes), vec!["code", "b"]);
}

#[test]
pub fn tree_unclosed_raw_tag_is_text() {
    let config = ParserConfig {
        no_parse: vec![NoParseRule::new("code")],
        ..Default::default()
    };
    let doc = Document::parse("[code][b]x[/b]", &config);
    assert_eq!(doc.nodes[0], Node::Text("[code]"));
    assert_eq!(element_names(&doc.nodes), vec!["b"]);
}

#[test]
pub fn tree_deep_input_is_linear() {
    let input = "[b]".repeat(20_000);
    let doc = Document::parse(&input, &ParserConfig::default());
    assert_eq!(doc.nodes.len(), 20_000);

    let input = format!("{}{}", "[b]".repeat(20_000), "[/i]".repeat(20_000));
    let doc = Document::parse(&input, &ParserConfig::default());
    assert_eq!(doc.nodes.len(), 40_000);
}

#[test]
pub fn tree_depth_is_capped() {
    let config = ParserConfig {
        max_depth: usize::MAX,
        ..Default::default()
    };
    let n = MAX_SUPPORTED_DEPTH + 10;
    let input = format!("{}x{}", "[b]".repeat(n), "[/b]".repeat(n));
    let doc = Document::parse(&input, &config);

    let mut depth = 0;
    let mut nodes = &doc.nodes;
    while let Some(Node::Element(el)) = nodes.first() {
        depth = el.depth;
        nodes = &el.children;
    }
    assert_eq!(depth, MAX_SUPPORTED_DEPTH);
    assert!(matches!(nodes[0], Node::Text(t) if t.starts_with("[b]")));
}
