//! Document builder on top of [BBParser].
//!
//! Tokens are folded into a tree in one pass over a stack of open tags. A close tag pairs with the
//! nearest open tag of the same name; tags opened after it that are still unclosed cross it and stay
//! literal. Anything that does not pair up stays as literal text, and the stack is never recursed, so
//! arbitrarily deep input builds in linear time.
use std::collections::HashMap;

use tracing::debug;

use super::{BBParser, ParserConfig, Token, TokenKind, MAX_SUPPORTED_DEPTH};

/// A parsed BBCode document.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    pub nodes: Vec<Node<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<'a> {
    /// Literal text, including any tag syntax that failed to pair up.
    Text(&'a str),
    Element(Element<'a>),
}

/// A matched `[name ...]body[/name]` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element<'a> {
    /// Lowercased tag name.
    pub name: String,
    /// Raw argument text, as given to [`AttributeSet::parse`][super::attrs::AttributeSet::parse].
    pub args: &'a str,
    /// The whole element, open tag to close tag.
    pub span: &'a str,
    /// Raw text between the open and close tags.
    pub body: &'a str,
    pub depth: usize,
    pub children: Vec<Node<'a>>,
}

impl<'a> Document<'a> {
    pub fn parse(input: &'a str, config: &ParserConfig) -> Document<'a> {
        let tokens: Vec<Token<'a>> = BBParser::with_features(input, config.feature_flags).collect();

        let mut builder = Builder {
            input,
            max_depth: config.max_depth.min(MAX_SUPPORTED_DEPTH),
            root: Vec::new(),
            stack: Vec::new(),
            open_counts: HashMap::new(),
        };
        let raw_closes = no_parse_closes(&tokens, config);

        let mut idx = 0;
        while idx < tokens.len() {
            let tk = &tokens[idx];
            idx += 1;

            match &tk.kind {
                TokenKind::Text => builder.push(Node::Text(tk.span)),
                TokenKind::OpenBBTag(tag) => {
                    let name = tag.tag.to_ascii_lowercase();
                    if !config.is_no_parse(&name) {
                        builder.open(name, tk, tag.args);
                        continue;
                    }

                    match raw_closes[idx - 1] {
                        Some(close_idx) => {
                            builder.raw_element(name, tk, tag.args, &tokens[close_idx]);
                            idx = close_idx + 1;
                        }
                        None => builder.push(Node::Text(tk.span)),
                    }
                }
                TokenKind::CloseBBTag(tag) => builder.close(&tag.tag.to_ascii_lowercase(), tk),
            }
        }

        Document {
            nodes: builder.finish(),
        }
    }
}

/// For every open tag with a no-parse rule, the index of the first close tag of the same name after it.
fn no_parse_closes(tokens: &[Token<'_>], config: &ParserConfig) -> Vec<Option<usize>> {
    let mut closes = vec![None; tokens.len()];
    if config.no_parse.is_empty() {
        return closes;
    }

    let mut next_close: HashMap<String, usize> = HashMap::new();
    for (idx, tk) in tokens.iter().enumerate().rev() {
        match &tk.kind {
            TokenKind::CloseBBTag(t) if config.is_no_parse(t.tag) => {
                next_close.insert(t.tag.to_ascii_lowercase(), idx);
            }
            TokenKind::OpenBBTag(t) if config.is_no_parse(t.tag) => {
                closes[idx] = next_close.get(&t.tag.to_ascii_lowercase()).copied();
            }
            _ => {}
        }
    }

    closes
}

/// An open tag still waiting for its close tag.
struct Frame<'a> {
    name: String,
    args: &'a str,
    open: Token<'a>,
    depth: usize,
    children: Vec<Node<'a>>,
}

struct Builder<'a> {
    input: &'a str,
    max_depth: usize,
    root: Vec<Node<'a>>,
    stack: Vec<Frame<'a>>,
    /// How many frames of each name are on the stack.
    open_counts: HashMap<String, usize>,
}

impl<'a> Builder<'a> {
    fn push(&mut self, node: Node<'a>) {
        match self.stack.last_mut() {
            Some(frame) => frame.children.push(node),
            None => self.root.push(node),
        }
    }

    fn open(&mut self, name: String, tk: &Token<'a>, args: &'a str) {
        *self.open_counts.entry(name.clone()).or_default() += 1;
        self.stack.push(Frame {
            name,
            args,
            open: tk.clone(),
            depth: self.stack.len() + 1,
            children: Vec::new(),
        });
    }

    fn close(&mut self, name: &str, close: &Token<'a>) {
        if self.open_counts.get(name).copied().unwrap_or(0) == 0 {
            self.push(Node::Text(close.span));
            return;
        }
        let Some(pos) = self.stack.iter().rposition(|f| f.name == name) else {
            self.push(Node::Text(close.span));
            return;
        };

        // Everything opened after the match crosses this close tag.
        let crossed = self.stack.split_off(pos + 1);
        let Some(mut frame) = self.stack.pop() else {
            return;
        };
        for inner in crossed {
            self.forget(&inner.name);
            frame.children.push(Node::Text(inner.open.span));
            frame.children.extend(inner.children);
        }
        self.forget(&frame.name);

        let span = &self.input[frame.open.start..close.end()];
        let node = if frame.depth > self.max_depth {
            debug!(tag = %frame.name, depth = frame.depth, "nesting limit reached, keeping tag literal");
            Node::Text(span)
        } else {
            Node::Element(Element {
                body: &self.input[frame.open.end()..close.start],
                name: frame.name,
                args: frame.args,
                span,
                depth: frame.depth,
                children: frame.children,
            })
        };
        self.push(node);
    }

    /// An element whose body is kept as typed.
    fn raw_element(&mut self, name: String, open: &Token<'a>, args: &'a str, close: &Token<'a>) {
        let depth = self.stack.len() + 1;
        let span = &self.input[open.start..close.end()];
        if depth > self.max_depth {
            debug!(tag = %name, depth, "nesting limit reached, keeping tag literal");
            self.push(Node::Text(span));
            return;
        }

        let body = &self.input[open.end()..close.start];
        let children = if body.is_empty() {
            vec![]
        } else {
            vec![Node::Text(body)]
        };
        self.push(Node::Element(Element {
            name,
            args,
            span,
            body,
            depth,
            children,
        }));
    }

    fn forget(&mut self, name: &str) {
        if let Some(count) = self.open_counts.get_mut(name) {
            *count = count.saturating_sub(1);
        }
    }

    /// Unclosed tags at the end of input are literal; each frame holds the nodes up to the next one.
    fn finish(mut self) -> Vec<Node<'a>> {
        for frame in std::mem::take(&mut self.stack) {
            self.root.push(Node::Text(frame.open.span));
            self.root.extend(frame.children);
        }
        self.root
    }
}
