//! This crate collates the standardised terms used when describing an epub package
//! and makes them available to use as Rust enums.
//! It is primarily a library structure to let tagged metadata be used across different crates and includes
//! little functionality of its own.

#![deny(dead_code)]
#![deny(unreachable_patterns)]
#![deny(unused_extern_crates)]
#![deny(unused_imports)]
#![deny(unused_qualifications)]
#![deny(clippy::all)]
#![deny(missing_debug_implementations)]
#![deny(unused_results)]
#![deny(variant_size_differences)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Sources:
// dc          dublin core elements
// marc        http://id.loc.gov/vocabulary/relators
// epub        https://www.w3.org/publishing/epub32/epub-packages.html#app-item-properties-vocab

/// The subset of Marc relators (<http://id.loc.gov/vocabulary/relators.html/>)
/// which a packaged document can assign to its creators and contributors
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MarcRelator {
    /// Author: A person, family, or organization responsible for creating a work that is primarily textual in content
    Aut,
    /// Book producer: A person or organization responsible for the production of books and other print media
    Bkp,
    /// Contributor: A person, family or organization responsible for making contributions to the resource
    Ctb,
    /// Creator: A person or organization responsible for the intellectual or artistic content of a resource
    Cre,
    /// Editor: A person, family, or organization contributing to a resource by revising or elucidating the content
    Edt,
    /// Illustrator: A person, family, or organization contributing to a resource by supplementing the primary content with drawings, diagrams, photographs, etc.
    Ill,
    /// Provider: A person or organization who produces, publishes, manufactures, or distributes a resource
    Prv,
    /// Publisher: A person or organization responsible for publishing, releasing, or issuing a resource
    Pbl,
    /// Translator: A person or organization who renders a text from one language into another
    Trl,
}

impl MarcRelator {
    /// the three-letter code as written into a `role` refinement
    pub const fn code(&self) -> &'static str {
        use MarcRelator::*;
        match self {
            Aut => "aut",
            Bkp => "bkp",
            Ctb => "ctb",
            Cre => "cre",
            Edt => "edt",
            Ill => "ill",
            Prv => "prv",
            Pbl => "pbl",
            Trl => "trl",
        }
    }
}

impl fmt::Display for MarcRelator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for MarcRelator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "author" | "aut" => Ok(MarcRelator::Aut),
            "book producer" | "bkp" => Ok(MarcRelator::Bkp),
            "contributor" | "ctb" => Ok(MarcRelator::Ctb),
            "creator" | "cre" => Ok(MarcRelator::Cre),
            "editor" | "edt" => Ok(MarcRelator::Edt),
            "illustrator" | "ill" => Ok(MarcRelator::Ill),
            "provider" | "prv" => Ok(MarcRelator::Prv),
            "publisher" | "pbl" => Ok(MarcRelator::Pbl),
            "translator" | "trl" => Ok(MarcRelator::Trl),
            _ => Err(()),
        }
    }
}

/// Dublin Core elements (<https://www.dublincore.org/specifications/dublin-core/dcmi-terms/#section-3>)
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DublinCoreElement {
    Contributor,
    Coverage,
    Creator,
    Date,
    Description,
    Format,
    Identifier,
    Language,
    Publisher,
    Relation,
    Rights,
    Source,
    Subject,
    Title,
    Type,
}

impl DublinCoreElement {
    pub fn as_tagname(&self) -> String {
        format!("dc:{:?}", self).to_lowercase()
    }
}

/// Properties which can be attached to an item in the package manifest
/// (<https://www.w3.org/publishing/epub32/epub-packages.html#app-item-properties-vocab>)
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ItemProperty {
    /// the publication's cover image
    CoverImage,
    /// embeds MathML
    Mathml,
    /// the navigation document
    Nav,
    /// references resources outside the container
    RemoteResources,
    /// contains scripting
    Scripted,
    /// embeds SVG
    Svg,
}

impl ItemProperty {
    pub const fn as_str(&self) -> &'static str {
        use ItemProperty::*;
        match self {
            CoverImage => "cover-image",
            Mathml => "mathml",
            Nav => "nav",
            RemoteResources => "remote-resources",
            Scripted => "scripted",
            Svg => "svg",
        }
    }
}

impl FromStr for ItemProperty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use ItemProperty::*;
        match s {
            "cover-image" => Ok(CoverImage),
            "mathml" => Ok(Mathml),
            "nav" => Ok(Nav),
            "remote-resources" => Ok(RemoteResources),
            "scripted" => Ok(Scripted),
            "svg" => Ok(Svg),
            _ => Err(()),
        }
    }
}
