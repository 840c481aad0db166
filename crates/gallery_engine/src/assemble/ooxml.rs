//! Minimal Office Open XML packaging shared by the docx and pptx writers.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::AssembleError;

pub(crate) const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub(crate) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const REL_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
pub(crate) const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub(crate) const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub(crate) const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
pub(crate) const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub(crate) const REL_THEME: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";

const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
const CT_CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";

pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Relationship part builder handing out sequential `rIdN` identifiers.
#[derive(Debug, Default)]
pub(crate) struct Relationships {
    entries: Vec<(String, &'static str, String)>,
}

impl Relationships {
    pub(crate) fn push(&mut self, rel_type: &'static str, target: impl Into<String>) -> String {
        let id = format!("rId{}", self.entries.len() + 1);
        self.entries.push((id.clone(), rel_type, target.into()));
        id
    }

    pub(crate) fn to_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (id, rel_type, target) in &self.entries {
            let _ = write!(
                xml,
                r#"<Relationship Id="{id}" Type="{rel_type}" Target="{}"/>"#,
                escape_xml(target)
            );
        }
        xml.push_str("</Relationships>");
        xml
    }
}

/// Collects package parts in memory and zips them with `[Content_Types].xml` first.
pub(crate) struct PackageBuilder {
    parts: Vec<(String, Vec<u8>)>,
    defaults: BTreeMap<String, String>,
    overrides: Vec<(String, String)>,
}

impl PackageBuilder {
    pub(crate) fn new() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels".to_string(), CT_RELATIONSHIPS.to_string());
        defaults.insert("xml".to_string(), "application/xml".to_string());
        Self {
            parts: Vec::new(),
            defaults,
            overrides: Vec::new(),
        }
    }

    /// Adds an XML part with an explicit content type override.
    pub(crate) fn add_xml(&mut self, name: &str, content_type: &str, xml: String) {
        self.overrides
            .push((format!("/{name}"), content_type.to_string()));
        self.parts.push((name.to_string(), xml.into_bytes()));
    }

    /// Adds a relationships part; covered by the `rels` default.
    pub(crate) fn add_relationships(&mut self, name: &str, rels: &Relationships) {
        self.parts.push((name.to_string(), rels.to_xml().into_bytes()));
    }

    pub(crate) fn add_media(&mut self, name: &str, extension: &str, mime: &str, bytes: Vec<u8>) {
        self.defaults
            .entry(extension.to_ascii_lowercase())
            .or_insert_with(|| mime.to_string());
        self.parts.push((name.to_string(), bytes));
    }

    pub(crate) fn add_core_properties(&mut self, name: &str, title: &str) {
        let xml = format!(
            concat!(
                "{decl}",
                r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
                r#"xmlns:dc="http://purl.org/dc/elements/1.1/" "#,
                r#"xmlns:dcterms="http://purl.org/dc/terms/" "#,
                r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
                "<dc:title>{title}</dc:title>",
                "</cp:coreProperties>"
            ),
            decl = XML_DECLARATION,
            title = escape_xml(title)
        );
        self.add_xml(name, CT_CORE_PROPERTIES, xml);
    }

    pub(crate) fn finish(self) -> Result<Vec<u8>, AssembleError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(self.content_types_xml().as_bytes())?;
        for (name, bytes) in &self.parts {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    fn content_types_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        xml.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        for (extension, content_type) in &self.defaults {
            let _ = write!(
                xml,
                r#"<Default Extension="{extension}" ContentType="{content_type}"/>"#
            );
        }
        for (part, content_type) in &self.overrides {
            let _ = write!(
                xml,
                r#"<Override PartName="{part}" ContentType="{content_type}"/>"#
            );
        }
        xml.push_str("</Types>");
        xml
    }
}
