use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

lazy_static! {
    static ref LATIN_SUFFIX_RX: Regex = Regex::new(r"-latin\.ttf\)").unwrap();
    static ref FONT_URL_RX: Regex = Regex::new(r"(?m)url\(\.\./(.+\.ttf)\);$").unwrap();
}

/// The fonts a font stylesheet refers to, and the stylesheet itself
#[derive(Debug, Clone, PartialEq)]
pub struct FontSelection {
    /// paths relative to the data directory, e.g. `fonts/dejavuserif-regular-latin.ttf`
    pub fonts: Vec<String>,
    /// the stylesheet, referring to the selected fonts
    pub css: String,
}

/// Swap the fonts in `css` for those covering `scripts`, then list the fonts it uses.
/// Fonts for the `latin` scripts are referred to as given.
pub fn select_fonts_from_str(css: &str, scripts: &str) -> FontSelection {
    let css = if scripts == "latin" {
        css.to_string()
    } else {
        let replacement = format!("-{}.ttf)", scripts);
        LATIN_SUFFIX_RX
            .replace_all(css, regex::NoExpand(&replacement))
            .into_owned()
    };
    let fonts = FONT_URL_RX
        .captures_iter(&css)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect();
    FontSelection { fonts, css }
}

/// Read the font stylesheet at `css_path` and select fonts for `scripts`
pub fn select_fonts<P: AsRef<Path>>(
    css_path: P,
    scripts: &str,
) -> Result<FontSelection, std::io::Error> {
    let css = std::fs::read_to_string(css_path)?;
    Ok(select_fonts_from_str(&css, scripts))
}
