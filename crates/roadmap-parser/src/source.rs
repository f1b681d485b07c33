//! Table content sources
//!
//! A table on the page may still be filled in by another macro after the
//! roadmap starts parsing. Each table is therefore read through a
//! [`TableSource`], which always shows the latest content and can wait for
//! the next change. The filling side holds the matching [`TablePopulator`].

use tokio::sync::watch;

use crate::dom::{parse_fragment, DomError, Element, Node};

/// Read side of one table's content
#[derive(Clone, Debug)]
pub struct TableSource {
    rx: watch::Receiver<Element>,
}

/// Write side of one table's content
#[derive(Debug)]
pub struct TablePopulator {
    tx: watch::Sender<Element>,
}

impl TableSource {
    /// A table whose content will never change
    pub fn fixed(table: Element) -> Self {
        let (_tx, rx) = watch::channel(table);
        Self { rx }
    }

    /// A table that can still be populated through the returned populator
    pub fn channel(initial: Element) -> (TablePopulator, TableSource) {
        let (tx, rx) = watch::channel(initial);
        (TablePopulator { tx }, TableSource { rx })
    }

    /// Latest content, without marking it as seen
    pub fn current(&self) -> Element {
        self.rx.borrow().clone()
    }

    /// Latest content, marked as seen for [`TableSource::changed`]
    pub(crate) fn snapshot(&mut self) -> Element {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next content change. `false` once no populator is left.
    pub(crate) async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

impl TablePopulator {
    /// Replace the whole table
    pub fn replace(&self, table: Element) {
        self.tx.send_replace(table);
    }

    /// Append `<tr>` rows to the table body, creating the body if needed
    pub fn append_rows(&self, rows_html: &str) -> Result<usize, DomError> {
        let fragment = parse_fragment(rows_html)?;
        let rows: Vec<Node> = fragment
            .children
            .into_iter()
            .filter(|n| matches!(n, Node::Element(e) if e.is("tr")))
            .collect();
        let added = rows.len();

        self.tx.send_modify(|table| {
            let body = table.children.iter_mut().find_map(|n| match n {
                Node::Element(e) if e.is("tbody") => Some(e),
                _ => None,
            });
            match body {
                Some(body) => body.children.extend(rows),
                None => {
                    let mut body = Element::new("tbody");
                    body.children = rows;
                    table.children.push(Node::Element(body));
                }
            }
        });
        Ok(added)
    }
}

/// Every table found in a region of a page
#[derive(Clone, Debug, Default)]
pub struct DocumentRegion {
    tables: Vec<TableSource>,
}

impl DocumentRegion {
    pub fn new(tables: Vec<TableSource>) -> Self {
        Self { tables }
    }

    /// Static region: all tables (nested ones included) with fixed content
    pub fn from_html(html: &str) -> Result<Self, DomError> {
        let doc = parse_fragment(html)?;
        let tables = doc
            .find_all(|e| e.is("table"))
            .into_iter()
            .map(|t| TableSource::fixed(t.clone()))
            .collect();
        Ok(Self { tables })
    }

    /// Region whose tables can still be populated, one populator per table
    pub fn from_html_live(html: &str) -> Result<(Self, Vec<TablePopulator>), DomError> {
        let doc = parse_fragment(html)?;
        let (populators, tables) = doc
            .find_all(|e| e.is("table"))
            .into_iter()
            .map(|t| TableSource::channel(t.clone()))
            .unzip();
        Ok((Self { tables }, populators))
    }

    pub fn push(&mut self, table: TableSource) {
        self.tables.push(table);
    }

    pub fn tables(&self) -> &[TableSource] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
