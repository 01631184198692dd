use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::table::{ColumnKey, GroupedTable, RawTable};

static TABLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("static selector"));

static HEAD_ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("thead > tr").expect("static selector"));

static BODY_ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody > tr").expect("static selector"));

static CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td").expect("static selector"));

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlCell {
    pub text: String,
    pub href: Option<String>,
}

/// One `<table>` as found on the page: header rows with colspans expanded,
/// body rows with cell text and the first link of each cell.
#[derive(Debug, Clone, Default)]
pub struct HtmlTable {
    pub header_rows: Vec<Vec<String>>,
    pub rows: Vec<Vec<HtmlCell>>,
}

impl HtmlTable {
    /// Single-level view using the innermost header row. Duplicate names get a
    /// `.1`, `.2`... suffix so every column stays addressable.
    pub fn to_raw_table(&self) -> RawTable {
        let names = self.header_rows.last().cloned().unwrap_or_default();
        RawTable::new(dedup_names(names), self.text_rows())
    }

    /// Two-level view using the two innermost header rows. A table with a
    /// single header row gets empty group labels.
    pub fn to_grouped_table(&self) -> GroupedTable {
        let names = self.header_rows.last().cloned().unwrap_or_default();
        let groups = if self.header_rows.len() >= 2 {
            self.header_rows[self.header_rows.len() - 2].clone()
        } else {
            Vec::new()
        };
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| ColumnKey::new(groups.get(i).cloned().unwrap_or_default(), name))
            .collect();
        GroupedTable::new(columns, self.text_rows())
    }

    pub fn column_links(&self, col: usize) -> Vec<Option<String>> {
        self.rows
            .iter()
            .map(|row| row.get(col).and_then(|c| c.href.clone()))
            .collect()
    }

    fn text_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|c| c.text.clone()).collect())
            .collect()
    }
}

/// Extracts every table in document order. FBref ships some tables inside
/// HTML comments, so comment markers are removed before parsing.
pub fn extract_tables(html: &str) -> Vec<HtmlTable> {
    let unwrapped = html.replace("<!--", "").replace("-->", "");
    let doc = Html::parse_document(&unwrapped);
    doc.select(&TABLE_SELECTOR).map(parse_table).collect()
}

fn parse_table(table: ElementRef) -> HtmlTable {
    let mut header_rows: Vec<Vec<String>> = table
        .select(&HEAD_ROW_SELECTOR)
        .filter(|tr| belongs_to(tr, &table))
        .map(expand_header_row)
        .collect();

    let mut rows: Vec<Vec<HtmlCell>> = table
        .select(&BODY_ROW_SELECTOR)
        .filter(|tr| belongs_to(tr, &table))
        .map(|tr| tr.select(&CELL_SELECTOR).map(parse_cell).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect();

    if header_rows.is_empty() && !rows.is_empty() {
        let first = rows.remove(0);
        header_rows.push(first.into_iter().map(|c| c.text).collect());
    }

    HtmlTable { header_rows, rows }
}

// Nested tables would otherwise leak their rows into the outer one.
fn belongs_to(tr: &ElementRef, table: &ElementRef) -> bool {
    tr.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
        .is_some_and(|el| el.id() == table.id())
}

fn expand_header_row(tr: ElementRef) -> Vec<String> {
    let mut out = Vec::new();
    for th in tr.select(&CELL_SELECTOR) {
        let span = th
            .value()
            .attr("colspan")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        let text = cell_text(th);
        for _ in 0..span {
            out.push(text.clone());
        }
    }
    out
}

fn parse_cell(el: ElementRef) -> HtmlCell {
    let href = el
        .select(&LINK_SELECTOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|s| s.to_string());
    HtmlCell {
        text: cell_text(el),
        href,
    }
}

fn cell_text(el: ElementRef) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Repeated names get `.1`, `.2`, ... suffixes, skipping any name the header
/// already carries.
fn dedup_names(names: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = names.iter().cloned().collect();
    let mut kept: HashSet<String> = HashSet::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .map(|name| {
            if kept.insert(name.clone()) {
                return name;
            }
            let count = counts.entry(name.clone()).or_insert(0);
            let renamed = loop {
                *count += 1;
                let candidate = format!("{name}.{count}");
                if !taken.contains(&candidate) {
                    break candidate;
                }
            };
            taken.insert(renamed.clone());
            kept.insert(renamed.clone());
            renamed
        })
        .collect()
}
