//! Assemble the reading order: the navigation document, the cover page and the spine items.
use crate::packager::PackageBuilder;
use crate::postprocess::postprocess_xhtml;
use crate::sanitize::{sanitized_title, TitleContext};
use crate::{Document, PackagingError, SpineItem, TargetFormat};
use bookpacker_common::escape_to_xml;
use epub_bundler::EpubContent;
use std::fmt::Debug;

pub(crate) const NAV_PATH: &str = "nav.xhtml";
pub(crate) const COVER_PAGE_PATH: &str = "cover.xhtml";
pub(crate) const COVER_PAGE_ID: &str = "cover";

/// Turns spine items into xhtml, and builds the navigation document
pub trait Converter: Debug {
    /// The xhtml content document for `item`
    fn convert(&self, item: &SpineItem) -> String;
    /// A navigation document for `spine`, with a table of contents and landmarks
    fn navigation_document(&self, document: &Document, spine: &[SpineItem]) -> String;
}

/// A converter for items whose content is already xhtml.
///
/// Complete documents are used unchanged; fragments are wrapped in a
/// document that links the theme stylesheets.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughConverter;

fn is_complete_document(content: &str) -> bool {
    let start = content.trim_start();
    start.starts_with("<?xml") || start.starts_with("<!DOCTYPE") || start.starts_with("<html")
}

impl Converter for PassthroughConverter {
    fn convert(&self, item: &SpineItem) -> String {
        if is_complete_document(&item.content) {
            return item.content.clone();
        }
        let title = sanitized_title(&item.title, TitleContext::Element);
        let mut xhtml = String::from("<!DOCTYPE html>\n");
        xhtml.push_str(
            "<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\">\n",
        );
        xhtml.push_str("<head>\n<meta charset=\"UTF-8\"/>\n");
        xhtml.push_str(&format!("<title>{}</title>\n", title));
        xhtml.push_str("<link rel=\"stylesheet\" type=\"text/css\" href=\"styles/epub3.css\"/>\n");
        xhtml.push_str(
            "<link rel=\"stylesheet\" type=\"text/css\" href=\"styles/epub3-css3-only.css\"/>\n",
        );
        xhtml.push_str("</head>\n");
        xhtml.push_str(&format!(
            "<body>\n<section class=\"chapter\" title=\"{}\" epub:type=\"chapter\" id=\"{}\">\n",
            sanitized_title(&item.title, TitleContext::Attribute),
            escape_to_xml(item.docname.as_str())
        ));
        if !title.is_empty() {
            xhtml.push_str(&format!("<h1 class=\"chapter-title\">{}</h1>\n", title));
        }
        xhtml.push_str(&item.content);
        xhtml.push_str("\n</section>\n</body>\n</html>\n");
        xhtml
    }

    fn navigation_document(&self, document: &Document, spine: &[SpineItem]) -> String {
        let lang = escape_to_xml(document.lang_or_default());
        let mut nav = String::from("<!DOCTYPE html>\n");
        nav.push_str(&format!(
            "<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\" xml:lang=\"{}\" lang=\"{}\">\n",
            lang, lang
        ));
        nav.push_str("<head>\n<meta charset=\"UTF-8\"/>\n");
        nav.push_str(&format!(
            "<title>{}</title>\n",
            sanitized_title(&document.title, TitleContext::Element)
        ));
        nav.push_str("<link rel=\"stylesheet\" type=\"text/css\" href=\"styles/epub3.css\"/>\n");
        nav.push_str("</head>\n<body>\n");
        nav.push_str("<h1>Table of Contents</h1>\n");
        nav.push_str("<nav epub:type=\"toc\" id=\"toc\">\n<ol>\n");
        for item in spine.iter() {
            nav.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                escape_to_xml(item.output_path()),
                sanitized_title(&item.title, TitleContext::Element)
            ));
        }
        nav.push_str("</ol>\n</nav>\n");
        nav.push_str("<nav epub:type=\"landmarks\" id=\"landmarks\" hidden=\"hidden\">\n<ol>\n");
        nav.push_str(&format!(
            "<li><a epub:type=\"toc\" href=\"{}\">Table of Contents</a></li>\n",
            NAV_PATH
        ));
        if let Some(first) = spine.first() {
            nav.push_str(&format!(
                "<li><a epub:type=\"bodymatter\" href=\"{}\">Start Reading</a></li>\n",
                escape_to_xml(first.output_path())
            ));
        }
        nav.push_str("</ol>\n</nav>\n</body>\n</html>\n");
        nav
    }
}

impl<'a> PackageBuilder<'a> {
    /// A page showing the cover image, scaled within a fixed view box
    fn cover_page(&self) -> Option<EpubContent> {
        let cover = self.cover.as_ref()?;
        let lang = escape_to_xml(self.document.lang_or_default());
        let xhtml = format!(
            r#"<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="{lang}" lang="{lang}">
<head>
<meta charset="UTF-8"/>
<title>{title}</title>
<style type="text/css">
@page {{
  margin: 0;
}}
html {{
  margin: 0 !important;
  padding: 0 !important;
}}
body {{
  margin: 0;
  padding: 0 !important;
  text-align: center;
}}
body > svg {{
  display: block;
}}
</style>
</head>
<body epub:type="cover"><svg version="1.1" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"
  width="100%" height="100%" viewBox="0 0 {width} {height}" preserveAspectRatio="xMidYMid meet">
<image width="{width}" height="{height}" xlink:href="{href}"/>
</svg></body>
</html>
"#,
            lang = lang,
            title = sanitized_title(&self.document.title, TitleContext::Element),
            width = cover.width,
            height = cover.height,
            href = escape_to_xml(cover.href.as_str()),
        );
        let mut page = EpubContent::new(COVER_PAGE_PATH, xhtml).with_id(COVER_PAGE_ID);
        let _ = page.does_include_svg();
        Some(page)
    }

    /// Add the navigation document, then one content document per spine item.
    /// Except in the legacy format, the cover page leads the reading order.
    pub(crate) fn add_content(&mut self, converter: &dyn Converter) -> Result<(), PackagingError> {
        let spine = self.spine;
        let format = self.format;

        let nav = converter.navigation_document(self.document, spine);
        let nav = postprocess_xhtml(&nav, format);
        self.epub.set_nav(EpubContent::new(NAV_PATH, nav))?;

        for item in spine.iter() {
            let xhtml = converter.convert(item);
            let xhtml = postprocess_xhtml(&xhtml, format);
            let mut content = EpubContent::new(item.output_path(), xhtml);
            // the ncx needs a plain text heading
            content.set_toc_title(sanitized_title(&item.title, TitleContext::Plain), 1)?;
            if item.has_property("svg") {
                let _ = content.does_include_svg();
            }
            self.epub.add_content(content)?;
        }

        if format != TargetFormat::Legacy {
            match self.cover_page() {
                Some(page) => {
                    self.epub.insert_content(0, page)?;
                }
                None => self.warn(String::from(
                    "No cover image was registered; omitting the cover page.",
                )),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spine() -> Vec<SpineItem> {
        vec![
            SpineItem::new("intro", "Intro &amp; <em>Welcome</em>", "<p>Hi</p>"),
            SpineItem::new("ch1", "Chapter \"One\"", "<?xml version=\"1.0\"?>\n<html/>"),
        ]
    }

    #[test]
    fn test_passthrough_convert() {
        let spine = spine();
        let converter = PassthroughConverter;
        let intro = converter.convert(&spine[0]);
        assert!(intro.contains("<meta charset=\"UTF-8\"/>"));
        assert!(intro.contains("<title>Intro &amp; Welcome</title>"));
        assert!(intro.contains("title=\"Intro &amp; Welcome\""));
        assert!(intro.contains("<h1 class=\"chapter-title\">Intro &amp; Welcome</h1>\n<p>Hi</p>\n</section>"));
        assert_eq!(converter.convert(&spine[1]), spine[1].content);
    }

    #[test]
    fn test_navigation_document() {
        let mut document = Document::new("book", "My Book");
        document.lang = Some("fr".into());
        let nav = PassthroughConverter.navigation_document(&document, &spine());
        assert!(nav.contains("xml:lang=\"fr\""));
        assert!(nav.contains("<li><a href=\"intro.xhtml\">Intro &amp; Welcome</a></li>"));
        assert!(nav.contains("<li><a href=\"ch1.xhtml\">Chapter \"One\"</a></li>"));
        assert!(nav.contains("<a epub:type=\"bodymatter\" href=\"intro.xhtml\">"));
        assert!(nav.contains("<nav epub:type=\"toc\" id=\"toc\">"));
    }
}
