//! A tree of table of contents entries, rendered either as the `<ol>` of a
//! navigation document or as the `navPoint`s of an epub 2 ncx file.
use bookpacker_common::escape_to_xml;
use std::borrow::Cow;

#[derive(Debug, PartialEq)]
struct TocNode<'a> {
    href: Cow<'a, str>,
    level: usize,
    text: String,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Entries are kept in an arena in order of addition;
/// parents and children refer to each other by index.
#[derive(Debug, Default)]
pub(crate) struct TocTree<'a> {
    entries: Vec<TocNode<'a>>,
}

impl<'a> TocTree<'a> {
    pub(crate) fn new() -> Self {
        TocTree::default()
    }

    /// An entry becomes the child of the most recent entry with a lower level
    pub(crate) fn add_entry(&mut self, href: Cow<'a, str>, level: usize, text: &str) {
        let idx = self.entries.len();
        let parent = self.entries.iter().rposition(|e| e.level < level);
        if let Some(p) = parent {
            self.entries[p].children.push(idx);
        }
        self.entries.push(TocNode {
            href,
            level,
            text: text.to_string(),
            parent,
            children: Vec::new(),
        });
    }

    fn top_level(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.parent.is_none())
            .map(|(i, _)| i)
    }

    /// the number of levels of nesting
    pub(crate) fn depth(&self) -> usize {
        (0..self.entries.len())
            .map(|i| self.depth_of(i))
            .max()
            .unwrap_or(0)
    }

    fn depth_of(&self, idx: usize) -> usize {
        let mut depth = 1;
        let mut current = self.entries[idx].parent;
        while let Some(p) = current {
            depth += 1;
            current = self.entries[p].parent;
        }
        depth
    }

    pub(crate) fn render_list(&self) -> String {
        let mut output = String::from("\t\t\t<ol>");
        for i in self.top_level() {
            self.render_list_item(i, 4, &mut output);
        }
        output.push_str("\n\t\t\t</ol>");
        output
    }

    fn render_list_item(&self, idx: usize, indent: usize, output: &mut String) {
        let entry = &self.entries[idx];
        let tabs = "\t".repeat(indent);
        output.push('\n');
        output.push_str(&tabs);
        output.push_str(&format!(
            "<li><a href=\"{}\">{}</a>",
            escape_to_xml(entry.href.as_ref()),
            escape_to_xml(entry.text.as_str())
        ));
        if !entry.children.is_empty() {
            output.push('\n');
            output.push_str(&tabs);
            output.push_str("\t<ol>");
            for child in entry.children.iter() {
                self.render_list_item(*child, indent + 2, output);
            }
            output.push('\n');
            output.push_str(&tabs);
            output.push_str("\t</ol>\n");
            output.push_str(&tabs);
        }
        output.push_str("</li>");
    }

    pub(crate) fn render_ncx_points(&self) -> String {
        let mut output = String::new();
        let mut play_order = 0;
        for i in self.top_level() {
            self.render_nav_point(i, 2, &mut play_order, &mut output);
        }
        output
    }

    fn render_nav_point(
        &self,
        idx: usize,
        indent: usize,
        play_order: &mut usize,
        output: &mut String,
    ) {
        let entry = &self.entries[idx];
        *play_order += 1;
        let pad = "  ".repeat(indent);
        output.push_str(&format!(
            "{}<navPoint id=\"navpoint-{}\" playOrder=\"{}\">\n",
            pad, play_order, play_order
        ));
        output.push_str(&format!(
            "{}  <navLabel><text>{}</text></navLabel>\n",
            pad,
            escape_to_xml(entry.text.as_str())
        ));
        output.push_str(&format!(
            "{}  <content src=\"{}\"/>\n",
            pad,
            escape_to_xml(entry.href.as_ref())
        ));
        for child in entry.children.iter() {
            self.render_nav_point(*child, indent + 1, play_order, output);
        }
        output.push_str(&pad);
        output.push_str("</navPoint>\n");
    }
}
