//! Lightweight element tree built from HTML
//!
//! `lol_html` tokenizes the markup as a stream; this module folds the stream
//! into a small owned tree that the table extractor can query (text content,
//! inner HTML, class and tag lookups). Text is stored entity-decoded and
//! re-escaped on serialization.

use std::cell::RefCell;
use std::rc::Rc;

use lol_html::errors::RewritingError;
use lol_html::html_content::EndTag;
use lol_html::{doc_text, element, HandlerResult, HtmlRewriter, Settings};
use thiserror::Error;

/// Name of the synthetic root element returned by [`parse_fragment`]
pub const DOCUMENT: &str = "#document";

const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Markup could not be tokenized
#[derive(Debug, Error)]
pub enum DomError {
    #[error("Malformed HTML: {0}")]
    Rewrite(#[from] RewritingError),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    /// Lower-cased tag name
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn is(&self, tag: &str) -> bool {
        self.name == tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// All descendant elements in document order
    pub fn descendants(&self) -> Vec<&Element> {
        fn walk<'a>(el: &'a Element, out: &mut Vec<&'a Element>) {
            for child in el.child_elements() {
                out.push(child);
                walk(child, out);
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }

    /// First descendant matching `pred`
    pub fn find(&self, pred: impl Fn(&Element) -> bool) -> Option<&Element> {
        self.descendants().into_iter().find(|e| pred(e))
    }

    pub fn find_all(&self, pred: impl Fn(&Element) -> bool) -> Vec<&Element> {
        self.descendants().into_iter().filter(|e| pred(e)).collect()
    }

    /// Concatenated text of all descendant text nodes
    pub fn text(&self) -> String {
        fn collect(el: &Element, out: &mut String) {
            for child in &el.children {
                match child {
                    Node::Text(t) => out.push_str(t),
                    Node::Element(e) => collect(e, out),
                }
            }
        }
        let mut out = String::new();
        collect(self, &mut out);
        out
    }

    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            write_node(child, &mut out);
        }
        out
    }

    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(t) => out.push_str(&htmlize::escape_text(t.as_str())),
        Node::Element(e) => write_element(e, out),
    }
}

fn write_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.name);
    for (name, value) in &el.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&htmlize::escape_attribute(value.as_str()));
        out.push('"');
    }
    out.push('>');
    if VOID_ELEMENTS.contains(&el.name.as_str()) {
        return;
    }
    for child in &el.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

/// Folds the token stream into a tree.
///
/// Open elements carry an id so that end tags close the right element even
/// after implied end tags have already popped it.
struct TreeBuilder {
    stack: Vec<(usize, Element)>,
    pending_text: String,
    next_id: usize,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![(0, Element::new(DOCUMENT))],
            pending_text: String::new(),
            next_id: 1,
        }
    }

    fn flush_text(&mut self) {
        if self.pending_text.is_empty() {
            return;
        }
        let text = htmlize::unescape(self.pending_text.as_str()).into_owned();
        self.pending_text.clear();
        if let Some((_, parent)) = self.stack.last_mut() {
            parent.children.push(Node::Text(text));
        }
    }

    fn open(&mut self, el: Element) -> usize {
        self.flush_text();
        self.close_implied(&el.name);
        let id = self.next_id;
        self.next_id += 1;
        self.stack.push((id, el));
        id
    }

    fn leaf(&mut self, el: Element) {
        self.flush_text();
        if let Some((_, parent)) = self.stack.last_mut() {
            parent.children.push(Node::Element(el));
        }
    }

    fn close(&mut self, id: usize) {
        self.flush_text();
        if let Some(pos) = self.stack.iter().position(|(i, _)| *i == id) {
            while self.stack.len() > pos.max(1) {
                self.pop_into_parent();
            }
        }
    }

    fn text(&mut self, raw: &str) {
        self.pending_text.push_str(raw);
    }

    fn pop_into_parent(&mut self) {
        if self.stack.len() < 2 {
            return;
        }
        if let Some((_, el)) = self.stack.pop() {
            if let Some((_, parent)) = self.stack.last_mut() {
                parent.children.push(Node::Element(el));
            }
        }
    }

    /// Close a still-open sibling for tags whose end tag HTML lets authors omit
    fn close_implied(&mut self, tag: &str) {
        let (closes, scope): (&[&str], &[&str]) = match tag {
            "td" | "th" => (&["td", "th"], &["tr", "table"]),
            "tr" => (&["tr"], &["thead", "tbody", "tfoot", "table"]),
            "thead" | "tbody" | "tfoot" => (&["thead", "tbody", "tfoot"], &["table"]),
            _ => return,
        };
        let open = self
            .stack
            .iter()
            .rposition(|(_, el)| closes.contains(&el.name.as_str()) || scope.contains(&el.name.as_str()));
        if let Some(pos) = open {
            if closes.contains(&self.stack[pos].1.name.as_str()) {
                while self.stack.len() > pos.max(1) {
                    self.pop_into_parent();
                }
            }
        }
    }

    fn finish(mut self) -> Element {
        self.flush_text();
        while self.stack.len() > 1 {
            self.pop_into_parent();
        }
        self.stack
            .pop()
            .map(|(_, el)| el)
            .unwrap_or_else(|| Element::new(DOCUMENT))
    }
}

/// Parse an HTML fragment into a tree rooted at a [`DOCUMENT`] element
pub fn parse_fragment(html: &str) -> Result<Element, DomError> {
    let builder = Rc::new(RefCell::new(TreeBuilder::new()));
    let on_element = Rc::clone(&builder);
    let on_text = Rc::clone(&builder);

    {
        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![element!("*", move |el| {
                    let node = Element {
                        name: el.tag_name().to_ascii_lowercase(),
                        attrs: el
                            .attributes()
                            .iter()
                            .map(|a| {
                                let value = htmlize::unescape(a.value()).into_owned();
                                (a.name().to_ascii_lowercase(), value)
                            })
                            .collect(),
                        children: Vec::new(),
                    };
                    match el.end_tag_handlers() {
                        Some(handlers) => {
                            let id = on_element.borrow_mut().open(node);
                            let closer = Rc::clone(&on_element);
                            let handler: lol_html::EndTagHandler<'static> =
                                Box::new(move |_end: &mut EndTag<'_>| -> HandlerResult {
                                    closer.borrow_mut().close(id);
                                    Ok(())
                                });
                            handlers.push(handler);
                        }
                        None => on_element.borrow_mut().leaf(node),
                    }
                    Ok(())
                })],
                document_content_handlers: vec![doc_text!(move |chunk| {
                    on_text.borrow_mut().text(chunk.as_str());
                    Ok(())
                })],
                ..Settings::new()
            },
            |_: &[u8]| {},
        );
        rewriter.write(html.as_bytes())?;
        rewriter.end()?;
    }

    let builder = Rc::try_unwrap(builder)
        .map(RefCell::into_inner)
        .unwrap_or_else(|shared| {
            let mut taken = TreeBuilder::new();
            std::mem::swap(&mut taken, &mut shared.borrow_mut());
            taken
        });
    Ok(builder.finish())
}
