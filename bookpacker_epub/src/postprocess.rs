//! Textual fixes applied to css and xhtml for the legacy Kindle engine.
//! Nothing is changed when producing a standard package.
use crate::TargetFormat;
use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

lazy_static! {
    static ref COLUMN_BREAK_RX: Regex = Regex::new(r"(?m)^  -webkit-column-break-.*\n").unwrap();
    static ref MAX_WIDTH_RX: Regex = Regex::new(r"(?m)^  max-width: .*\n").unwrap();
    static ref META_CHARSET_RX: Regex = Regex::new(r#"<meta charset="(.+?)"/>"#).unwrap();
    static ref IMG_WIDTH_RX: Regex = Regex::new(r#"<img([^>]+) style="width: (\d\d)%;""#).unwrap();
    // a self-closing script must not be read as an opening tag
    static ref SCRIPT_RX: Regex =
        Regex::new(r"(?s)<script\b(?:[^>]*/>|[^>]*>.*?</script>)\n?").unwrap();
}

/// apply `rx` only if it matches, so untouched input stays borrowed
fn replace_in<'a>(content: Cow<'a, str>, rx: &Regex, replacement: &str) -> Cow<'a, str> {
    if rx.is_match(&content) {
        Cow::Owned(rx.replace_all(&content, replacement).into_owned())
    } else {
        content
    }
}

/// Remove the column break and `max-width` declarations the legacy engine mishandles
pub fn postprocess_css(content: &str, format: TargetFormat) -> Cow<'_, str> {
    match format {
        TargetFormat::Standard => Cow::Borrowed(content),
        TargetFormat::Legacy => {
            let content = replace_in(Cow::Borrowed(content), &COLUMN_BREAK_RX, "");
            replace_in(content, &MAX_WIDTH_RX, "")
        }
    }
}

/// For the legacy engine:
/// 1. spell out the charset as an `http-equiv` meta element;
/// 2. give percentage width images an equal percentage height;
/// 3. remove scripts.
pub fn postprocess_xhtml(content: &str, format: TargetFormat) -> Cow<'_, str> {
    match format {
        TargetFormat::Standard => Cow::Borrowed(content),
        TargetFormat::Legacy => {
            let content = replace_in(
                Cow::Borrowed(content),
                &META_CHARSET_RX,
                r#"<meta http-equiv="Content-Type" content="application/xml+xhtml; charset=${1}"/>"#,
            );
            let content = replace_in(
                content,
                &IMG_WIDTH_RX,
                r#"<img${1} style="width: ${2}%; height: ${2}%;""#,
            );
            replace_in(content, &SCRIPT_RX, "")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static XHTML: &str = "<html><head>\n<meta charset=\"UTF-8\"/>\n<script type=\"text/javascript\">\nvar a = 1;\n</script>\n</head><body><img src=\"a.png\" alt=\"a\" style=\"width: 50%;\"/></body></html>";

    #[test]
    fn test_standard_is_untouched() {
        assert_eq!(
            postprocess_xhtml(XHTML, TargetFormat::Standard),
            Cow::Borrowed(XHTML)
        );
        let css = "img {\n  max-width: 100%;\n}\n";
        assert_eq!(postprocess_css(css, TargetFormat::Standard), Cow::Borrowed(css));
    }

    #[test]
    fn test_legacy_xhtml() {
        let processed = postprocess_xhtml(XHTML, TargetFormat::Legacy);
        let expected = "<html><head>\n<meta http-equiv=\"Content-Type\" content=\"application/xml+xhtml; charset=UTF-8\"/>\n</head><body><img src=\"a.png\" alt=\"a\" style=\"width: 50%; height: 50%;\"/></body></html>";
        assert_eq!(processed, expected);
    }

    #[test]
    fn test_self_closing_scripts() {
        let xhtml = "<head><script src=\"a.js\"/>\n</head><body><p>Keep me</p><script>var x;</script></body>";
        assert_eq!(
            postprocess_xhtml(xhtml, TargetFormat::Legacy),
            "<head></head><body><p>Keep me</p></body>"
        );
        let xhtml = "<head><script type=\"text/javascript\" src=\"a.js\"/></head><body><p>Keep me</p></body>";
        assert_eq!(
            postprocess_xhtml(xhtml, TargetFormat::Legacy),
            "<head></head><body><p>Keep me</p></body>"
        );
    }

    #[test]
    fn test_legacy_xhtml_is_idempotent() {
        let once = postprocess_xhtml(XHTML, TargetFormat::Legacy).into_owned();
        let twice = postprocess_xhtml(&once, TargetFormat::Legacy);
        assert_eq!(once, twice);
        assert!(matches!(twice, Cow::Borrowed(_)));
    }

    #[test]
    fn test_untargeted_images() {
        // only two digit percentages, set alone, are rewritten
        let xhtml = "<img src=\"a.png\" style=\"width: 5%;\"/><img src=\"b.png\" style=\"width: 50%; float: left\"/>";
        assert_eq!(postprocess_xhtml(xhtml, TargetFormat::Legacy), xhtml);
    }

    #[test]
    fn test_legacy_css() {
        let css = "h1 {\n  page-break-after: avoid;\n  -webkit-column-break-after: avoid;\n}\nimg {\n  max-width: 100%;\n  width: auto;\n}\n";
        let expected = "h1 {\n  page-break-after: avoid;\n}\nimg {\n  width: auto;\n}\n";
        assert_eq!(postprocess_css(css, TargetFormat::Legacy), expected);
    }
}
