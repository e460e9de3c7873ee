use crate::toc::TocTree;
use crate::{Contributor, EpubContent, EpubSource};
use bookpacker_common::{escape_to_xml, MimeType};
use epub_metadata::{DublinCoreElement, ItemProperty};
use std::borrow::Cow;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;
use zip::ZipWriter;

static IDENTIFIER_ID: &str = "pub-identifier";
static TITLE_ID: &str = "pub-title";
static LANGUAGE_ID: &str = "pub-language";
static OPF_PATH: &str = "package.opf";
static NAV_PATH: &str = "nav.xhtml";
static NAV_ID: &str = "nav";
static NCX_PATH: &str = "toc.ncx";
static NCX_ID: &str = "ncx";
static COVER_IMAGE_ID: &str = "cover-image";

#[derive(Debug, Error)]
pub enum EpubBundlingError {
    #[error("error writing zip container: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("error writing container: {0}")]
    Write(#[from] std::io::Error),
    #[error("error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("nothing to write to the container")]
    EmptyContainer,
    #[error("no content documents in the spine")]
    EmptySpine,
    #[error("no items in the manifest")]
    EmptyManifest,
    #[error("path is not valid unicode: {}", .0.display())]
    NonUnicodeFilePath(PathBuf),
    #[error("not a resource which can be included in an epub: {}", .0.display())]
    UnsupportedResource(PathBuf),
    #[error("manifest identifier used more than once: {0}")]
    DuplicateIdentifier(String),
}

// metadata based around a dublin core element -- i.e. a dc:[element] tag in an opf file
struct DcMetadata<'a> {
    core: DublinCoreElement,
    id: Option<Cow<'a, str>>,
    value: Cow<'a, str>,
}

// generic metadata -- i.e. a `meta` tag in an opf file
struct MetaMetadata<'a> {
    property: &'static str,
    refines: Option<String>,
    scheme: Option<&'static str>,
    value: Cow<'a, str>,
}

impl<'a> MetaMetadata<'a> {
    fn from_last_modified_date(date: &time::Tm) -> Self {
        // the format is a constant, so this cannot fail
        let date = time::strftime("%Y-%m-%dT%H:%M:%SZ", date).unwrap_or_default();
        MetaMetadata {
            property: "dcterms:modified",
            refines: None,
            scheme: None,
            value: Cow::Owned(date),
        }
    }

    fn from_identifier_scheme(scheme: &'a str, target: &str) -> Self {
        MetaMetadata {
            property: "identifier-type",
            refines: Some(format!("#{}", target)),
            scheme: None,
            value: Cow::Borrowed(scheme),
        }
    }

    fn from_contributor_role(contributor: &Contributor, target: &str) -> Option<Self> {
        contributor.role.map(|role| MetaMetadata {
            property: "role",
            refines: Some(format!("#{}", target)),
            scheme: Some("marc:relators"),
            value: Cow::Borrowed(role.code()),
        })
    }
}

impl<'a> DcMetadata<'a> {
    fn plain(core: DublinCoreElement, value: &'a str) -> Self {
        DcMetadata {
            core,
            id: None,
            value: Cow::Borrowed(value),
        }
    }
}

/// An entry in the manifest
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestItem<'a> {
    pub href: Cow<'a, str>,
    pub id: Cow<'a, str>,
    pub media_type: &'static str,
    pub properties: Vec<&'static str>,
}

impl<'a> ManifestItem<'a> {
    fn new(
        href: Cow<'a, str>,
        id: Cow<'a, str>,
        media_type: MimeType,
        properties: &[ItemProperty],
    ) -> Self {
        ManifestItem {
            href,
            id,
            media_type: media_type.to_str(),
            properties: properties.iter().map(|p| p.as_str()).collect(),
        }
    }
}

/// An itemref in the spine
#[derive(Debug, Clone, PartialEq)]
pub struct SpineElement<'a> {
    pub idref: Cow<'a, str>,
    /// `Some(false)` for content outside the default reading order
    pub linear: Option<bool>,
}

fn path_to_href(p: &Path) -> Result<Cow<'_, str>, EpubBundlingError> {
    match p.to_str() {
        Some(s) if s.contains('\\') => Ok(Cow::Owned(s.replace('\\', "/"))),
        Some(s) => Ok(Cow::Borrowed(s)),
        None => Err(EpubBundlingError::NonUnicodeFilePath(p.to_path_buf())),
    }
}

fn content_id(content: &EpubContent, i: usize) -> Cow<'_, str> {
    match content.id {
        Some(ref id) => Cow::Borrowed(id.as_str()),
        None => Cow::Owned(format!("contents_{}", i)),
    }
}

// representation of an abstract epub container
struct Container<'a> {
    files: Vec<(Cow<'a, str>, &'a [u8])>,
}

impl<'a> Container<'a> {
    fn to_epub(&self) -> Result<Vec<u8>, EpubBundlingError> {
        if self.files.is_empty() {
            return Err(EpubBundlingError::EmptyContainer);
        }
        let buf = Vec::new();
        let w = Cursor::new(buf);
        let mut zipper = ZipWriter::new(w);
        let uncompressed =
            zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let compressed = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        // first add an uncompressed mimetype file so this can be recognised
        zipper.start_file("mimetype", uncompressed)?;
        zipper.write_all(MimeType::Epub.to_str().as_bytes())?;

        // now add the container file to point reading systems to the package document
        zipper.add_directory("META-INF", compressed)?;

        let c = ContainerInfo {
            document_path: OPF_PATH,
        };
        zipper.start_file("META-INF/container.xml", compressed)?;
        zipper.write_all(c.render().as_bytes())?;

        for (filepath, contents) in self.files.iter() {
            zipper.start_file(filepath.as_ref(), compressed)?;
            zipper.write_all(contents)?;
        }

        let result = zipper.finish().map(|cursor| cursor.into_inner())?;
        Ok(result)
    }
}

// information for the container file
struct ContainerInfo<'a> {
    document_path: &'a str,
}

impl<'a> ContainerInfo<'a> {
    fn render(&self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0"?>"#,
                "\n",
                r#"<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">"#,
                "\n\t<rootfiles>",
                "\n\t\t<rootfile full-path=\"{}\" media-type=\"application/oebps-package+xml\" />",
                "\n\t</rootfiles>",
                "\n</container>"
            ),
            self.document_path
        )
    }
}

// for an autogenerated nav document
struct NavInfo<'a> {
    toc_title: &'a str,
    entry_list: String,
}

impl<'a> NavInfo<'a> {
    fn render(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n");
        out.push_str(
            r#"<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">"#,
        );
        out.push_str("\n\t<head>\n");
        out.push_str(&format!("\t\t<title>{}</title>\n", self.toc_title));
        out.push_str("\t\t<meta charset=\"utf-8\"/>\n");
        out.push_str("\t</head>\n");
        out.push_str("\t<body>\n");
        out.push_str("\t\t<nav epub:type=\"toc\">\n");
        out.push_str("\t\t\t<h1>");
        out.push_str(self.toc_title);
        out.push_str("</h1>\n");
        out.push_str(&self.entry_list);
        out.push_str("\n\t\t</nav>\n");
        out.push_str("\t</body>\n");
        out.push_str("</html>");
        out
    }
}

pub(crate) trait EpubBundler {
    fn bundle_epub(&self) -> Result<Vec<u8>, EpubBundlingError>;
    fn get_manifest_items(&self) -> Result<Vec<ManifestItem<'_>>, EpubBundlingError>;
    fn get_spine_items<'a>(
        &'a self,
        manifest: &[ManifestItem<'a>],
    ) -> Result<Vec<SpineElement<'a>>, EpubBundlingError>;
    fn generate_opf(&self) -> Result<String, EpubBundlingError>;
}

impl EpubSource {
    fn resolved_identifier(&self) -> Cow<'_, str> {
        match self.identifier {
            Some(ref i) => Cow::Borrowed(i.text.as_str()),
            None => Cow::Owned(Uuid::new_v4().to_urn().to_string()),
        }
    }

    fn toc_tree(&self) -> Result<TocTree, EpubBundlingError> {
        let mut tree = TocTree::new();
        for content in self.contents.iter() {
            if let Some(ref entry) = content.toc_entry {
                let href = path_to_href(&content.output_path)?;
                tree.add_entry(href, entry.level, &entry.title);
            }
        }
        Ok(tree)
    }

    fn generated_nav(&self) -> Result<String, EpubBundlingError> {
        let n = NavInfo {
            toc_title: "Contents",
            entry_list: self.toc_tree()?.render_list(),
        };
        Ok(n.render())
    }

    fn generate_ncx(&self, uid: &str) -> Result<String, EpubBundlingError> {
        let tree = self.toc_tree()?;
        let mut ncx = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        ncx.push_str(r#"<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">"#);
        ncx.push_str("\n  <head>\n");
        ncx.push_str(&format!(
            "    <meta name=\"dtb:uid\" content=\"{}\"/>\n",
            escape_to_xml(uid)
        ));
        ncx.push_str(&format!(
            "    <meta name=\"dtb:depth\" content=\"{}\"/>\n",
            tree.depth().max(1)
        ));
        ncx.push_str("    <meta name=\"dtb:totalPageCount\" content=\"0\"/>\n");
        ncx.push_str("    <meta name=\"dtb:maxPageNumber\" content=\"0\"/>\n");
        ncx.push_str("  </head>\n");
        ncx.push_str(&format!(
            "  <docTitle><text>{}</text></docTitle>\n",
            escape_to_xml(self.title.as_deref().unwrap_or("Untitled"))
        ));
        ncx.push_str("  <navMap>\n");
        ncx.push_str(&tree.render_ncx_points());
        ncx.push_str("  </navMap>\n");
        ncx.push_str("</ncx>");
        Ok(ncx)
    }

    fn nav_href(&self) -> Result<Cow<'_, str>, EpubBundlingError> {
        match self.nav {
            Some(ref nav) => path_to_href(&nav.output_path),
            None => Ok(Cow::Borrowed(NAV_PATH)),
        }
    }

    fn get_metadata(&self, uid: &str) -> (Vec<DcMetadata<'_>>, Vec<MetaMetadata<'_>>) {
        let mut dc = Vec::new();
        let mut meta = Vec::new();

        dc.push(DcMetadata {
            core: DublinCoreElement::Identifier,
            id: Some(Cow::Borrowed(IDENTIFIER_ID)),
            value: Cow::Owned(uid.to_string()),
        });
        if let Some(scheme) = self.identifier.as_ref().and_then(|i| i.scheme.as_deref()) {
            meta.push(MetaMetadata::from_identifier_scheme(scheme, IDENTIFIER_ID));
        }

        dc.push(DcMetadata {
            core: DublinCoreElement::Title,
            id: Some(Cow::Borrowed(TITLE_ID)),
            value: Cow::Borrowed(self.title.as_deref().unwrap_or("Untitled")),
        });

        dc.push(DcMetadata {
            core: DublinCoreElement::Language,
            id: Some(Cow::Borrowed(LANGUAGE_ID)),
            value: Cow::Borrowed(self.lang.as_deref().unwrap_or("en")),
        });

        for (i, creator) in self.creators.iter().enumerate() {
            let id = format!("creator{}", i);
            if let Some(role) = MetaMetadata::from_contributor_role(creator, &id) {
                meta.push(role);
            }
            dc.push(DcMetadata {
                core: DublinCoreElement::Creator,
                id: Some(Cow::Owned(id)),
                value: Cow::Borrowed(&creator.name),
            });
        }
        for (i, contributor) in self.contributors.iter().enumerate() {
            let id = format!("contributor{}", i);
            if let Some(role) = MetaMetadata::from_contributor_role(contributor, &id) {
                meta.push(role);
            }
            dc.push(DcMetadata {
                core: DublinCoreElement::Contributor,
                id: Some(Cow::Owned(id)),
                value: Cow::Borrowed(&contributor.name),
            });
        }

        if let Some(ref publisher) = self.publisher {
            dc.push(DcMetadata::plain(DublinCoreElement::Publisher, publisher));
        }
        if let Some(ref date) = self.date {
            dc.push(DcMetadata::plain(DublinCoreElement::Date, date));
        }
        if let Some(ref description) = self.description {
            dc.push(DcMetadata::plain(DublinCoreElement::Description, description));
        }
        for subject in self.subjects.iter() {
            dc.push(DcMetadata::plain(DublinCoreElement::Subject, subject));
        }
        if let Some(ref source) = self.source {
            dc.push(DcMetadata::plain(DublinCoreElement::Source, source));
        }
        if let Some(ref rights) = self.rights {
            dc.push(DcMetadata::plain(DublinCoreElement::Rights, rights));
        }

        let modified = match self.last_modification {
            Some(ref m) => MetaMetadata::from_last_modified_date(m),
            None => MetaMetadata::from_last_modified_date(&time::now_utc()),
        };
        meta.push(modified);

        (dc, meta)
    }

    fn render_opf(&self, uid: &str) -> Result<String, EpubBundlingError> {
        let (dc_metadata, meta_metadata) = self.get_metadata(uid);
        let manifest_elements = self.get_manifest_items()?;
        let spine_elements = self.get_spine_items(&manifest_elements)?;

        let mut opf = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        opf.push_str(r#"<package version="3.0" unique-identifier=""#);
        opf.push_str(IDENTIFIER_ID);
        opf.push_str(r#"" xmlns="http://www.idpf.org/2007/opf" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/">"#);
        opf.push_str("\n  <metadata>\n");
        for item in dc_metadata.iter() {
            let tagname = item.core.as_tagname();
            opf.push_str("    <");
            opf.push_str(&tagname);
            if let Some(ref id) = item.id {
                opf.push_str(&format!(" id=\"{}\"", id));
            }
            opf.push('>');
            opf.push_str(&escape_to_xml(item.value.as_ref()));
            opf.push_str(&format!("</{}>\n", tagname));
        }
        for item in meta_metadata.iter() {
            opf.push_str("    <meta property=\"");
            opf.push_str(item.property);
            opf.push('"');
            if let Some(ref refines) = item.refines {
                opf.push_str(&format!(" refines=\"{}\"", refines));
            }
            if let Some(scheme) = item.scheme {
                opf.push_str(&format!(" scheme=\"{}\"", scheme));
            }
            opf.push('>');
            opf.push_str(&escape_to_xml(item.value.as_ref()));
            opf.push_str("</meta>\n");
        }
        if self.backward_compatible && self.cover_image.is_some() {
            opf.push_str(&format!(
                "    <meta name=\"cover\" content=\"{}\"/>\n",
                COVER_IMAGE_ID
            ));
        }
        opf.push_str("  </metadata>\n");
        opf.push_str("  <manifest>");
        for item in manifest_elements.iter() {
            opf.push_str(&format!("\n    <item id=\"{}\"", escape_to_xml(item.id.as_ref())));
            opf.push_str(&format!(" media-type=\"{}\"", item.media_type));
            opf.push_str(&format!(" href=\"{}\"", escape_to_xml(item.href.as_ref())));
            if !item.properties.is_empty() {
                opf.push_str(&format!(" properties=\"{}\"", item.properties.join(" ")));
            }
            opf.push_str("/>");
        }
        opf.push_str("\n  </manifest>");
        if self.backward_compatible {
            opf.push_str(&format!("\n  <spine toc=\"{}\">", NCX_ID));
        } else {
            opf.push_str("\n  <spine>");
        }
        for item in spine_elements.iter() {
            opf.push_str(&format!(
                "\n    <itemref idref=\"{}\"",
                escape_to_xml(item.idref.as_ref())
            ));
            if let Some(false) = item.linear {
                opf.push_str(" linear=\"no\"");
            }
            opf.push_str("/>");
        }
        opf.push_str("\n  </spine>\n");
        opf.push_str("</package>");
        Ok(opf)
    }
}

impl EpubBundler for EpubSource {
    fn bundle_epub(&self) -> Result<Vec<u8>, EpubBundlingError> {
        let uid = self.resolved_identifier();
        let opf = self.render_opf(&uid)?;
        let nav = match self.nav {
            Some(ref nav) => Cow::Borrowed(nav.data.as_str()),
            None => Cow::Owned(self.generated_nav()?),
        };
        let ncx = if self.backward_compatible {
            Some(self.generate_ncx(&uid)?)
        } else {
            None
        };

        let mut files = vec![
            (Cow::Borrowed(OPF_PATH), opf.as_bytes()),
            (self.nav_href()?, nav.as_bytes()),
        ];
        if let Some(ref ncx) = ncx {
            files.push((Cow::Borrowed(NCX_PATH), ncx.as_bytes()));
        }
        for item in self.contents.iter() {
            files.push((path_to_href(&item.output_path)?, item.data.as_bytes()));
        }
        for item in self.resources.iter() {
            files.push((path_to_href(&item.output_path)?, item.data.as_slice()));
        }
        if let Some(ref ci) = self.cover_image {
            files.push((path_to_href(&ci.output_path)?, ci.data.as_slice()));
        }

        let container = Container { files };
        container.to_epub()
    }

    fn get_manifest_items(&self) -> Result<Vec<ManifestItem<'_>>, EpubBundlingError> {
        let mut items = Vec::new();

        let (nav_id, nav_properties) = match self.nav {
            Some(ref nav) => (
                nav.id.as_deref().unwrap_or(NAV_ID),
                nav.properties.as_slice(),
            ),
            None => (NAV_ID, &[ItemProperty::Nav][..]),
        };
        items.push(ManifestItem::new(
            self.nav_href()?,
            Cow::Borrowed(nav_id),
            MimeType::Xhtml,
            nav_properties,
        ));

        for (i, item) in self.contents.iter().enumerate() {
            items.push(ManifestItem::new(
                path_to_href(&item.output_path)?,
                content_id(item, i),
                MimeType::Xhtml,
                &item.properties,
            ));
        }
        if self.backward_compatible {
            items.push(ManifestItem::new(
                Cow::Borrowed(NCX_PATH),
                Cow::Borrowed(NCX_ID),
                MimeType::Ncx,
                &[],
            ));
        }
        for (i, item) in self.resources.iter().enumerate() {
            items.push(ManifestItem::new(
                path_to_href(&item.output_path)?,
                Cow::Owned(format!("resource_{}", i)),
                item.mimetype,
                &item.properties,
            ));
        }
        if let Some(ref item) = self.cover_image {
            items.push(ManifestItem::new(
                path_to_href(&item.output_path)?,
                Cow::Borrowed(COVER_IMAGE_ID),
                item.mimetype,
                &item.properties,
            ));
        }

        let mut seen = HashSet::new();
        for item in items.iter() {
            if !seen.insert(item.id.as_ref()) {
                return Err(EpubBundlingError::DuplicateIdentifier(item.id.to_string()));
            }
        }
        Ok(items)
    }

    fn get_spine_items<'a>(
        &'a self,
        manifest: &[ManifestItem<'a>],
    ) -> Result<Vec<SpineElement<'a>>, EpubBundlingError> {
        if self.contents.is_empty() {
            return Err(EpubBundlingError::EmptySpine);
        }
        // the nav document always heads the manifest
        let nav = manifest.first().ok_or(EpubBundlingError::EmptyManifest)?;
        let mut items = vec![SpineElement {
            idref: nav.id.clone(),
            linear: None,
        }];
        for (i, item) in self.contents.iter().enumerate() {
            items.push(SpineElement {
                idref: content_id(item, i),
                linear: if item.linear { None } else { Some(false) },
            });
        }
        Ok(items)
    }

    fn generate_opf(&self) -> Result<String, EpubBundlingError> {
        let uid = self.resolved_identifier();
        self.render_opf(&uid)
    }
}
