use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::persist::AtomicFileWriter;
use crate::progress::ProgressSink;
use crate::{DocumentKind, DownloadedImage};

use super::layout::{emu_to_twips, fit_to_width, round_emu, PageGeometry};
use super::ooxml::{
    PackageBuilder, Relationships, REL_CORE_PROPERTIES, REL_IMAGE, REL_OFFICE_DOCUMENT,
    XML_DECLARATION,
};
use super::probe::{DecoderProbe, ImageProbe};
use super::{
    display_name, output_filename, AssembleError, AssembledDocument, AssemblyOutcome,
    DocumentAssembler,
};

const CT_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

/// Word document with every image inline at full content width.
pub struct PagedAssembler {
    geometry: PageGeometry,
    probe: Arc<dyn ImageProbe>,
}

struct PlacedImage {
    media_name: String,
    extension: &'static str,
    mime: &'static str,
    bytes: Vec<u8>,
    width: i64,
    height: i64,
}

impl PagedAssembler {
    pub fn new(geometry: PageGeometry) -> Self {
        Self::with_probe(geometry, Arc::new(DecoderProbe))
    }

    pub fn with_probe(geometry: PageGeometry, probe: Arc<dyn ImageProbe>) -> Self {
        Self { geometry, probe }
    }

    fn place(&self, image: &DownloadedImage, ordinal: usize) -> Result<PlacedImage, String> {
        let info = self
            .probe
            .probe(&image.local_path)
            .map_err(|err| err.to_string())?;
        let (width, height) = fit_to_width(self.geometry.content_width(), info.width, info.height)
            .ok_or_else(|| format!("image has zero size ({}x{})", info.width, info.height))?;
        let bytes = fs::read(&image.local_path).map_err(|err| err.to_string())?;
        let extension = info.media_extension();
        Ok(PlacedImage {
            media_name: format!("image{ordinal}.{extension}"),
            extension,
            mime: info.mime_type(),
            bytes,
            width: round_emu(width),
            height: round_emu(height),
        })
    }

    fn build_package(&self, prefix: &str, placed: Vec<PlacedImage>) -> Result<Vec<u8>, AssembleError> {
        let mut package = PackageBuilder::new();
        let mut root_rels = Relationships::default();
        root_rels.push(REL_OFFICE_DOCUMENT, "word/document.xml");
        root_rels.push(REL_CORE_PROPERTIES, "docProps/core.xml");

        let mut doc_rels = Relationships::default();
        let mut body = String::new();
        for (position, image) in placed.into_iter().enumerate() {
            let rel_id = doc_rels.push(REL_IMAGE, format!("media/{}", image.media_name));
            body.push_str(&inline_picture_xml(position + 1, &rel_id, image.width, image.height));
            package.add_media(
                &format!("word/media/{}", image.media_name),
                image.extension,
                image.mime,
                image.bytes,
            );
        }

        package.add_relationships("_rels/.rels", &root_rels);
        package.add_xml("word/document.xml", CT_DOCUMENT, self.document_xml(&body));
        package.add_relationships("word/_rels/document.xml.rels", &doc_rels);
        package.add_core_properties("docProps/core.xml", prefix);
        package.finish()
    }

    fn document_xml(&self, body: &str) -> String {
        let g = &self.geometry;
        format!(
            concat!(
                "{decl}",
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
                r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
                r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
                r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
                r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                "<w:body>{body}",
                r#"<w:sectPr><w:pgSz w:w="{w}" w:h="{h}"/>"#,
                r#"<w:pgMar w:top="{top}" w:right="{right}" w:bottom="{bottom}" w:left="{left}" w:header="0" w:footer="0" w:gutter="0"/>"#,
                "</w:sectPr></w:body></w:document>"
            ),
            decl = XML_DECLARATION,
            body = body,
            w = emu_to_twips(g.width),
            h = emu_to_twips(g.height),
            top = emu_to_twips(g.margin_top),
            right = emu_to_twips(g.margin_right),
            bottom = emu_to_twips(g.margin_bottom),
            left = emu_to_twips(g.margin_left),
        )
    }
}

fn inline_picture_xml(id: usize, rel_id: &str, cx: i64, cy: i64) -> String {
    let mut xml = String::new();
    let _ = write!(
        xml,
        concat!(
            r#"<w:p><w:pPr><w:spacing w:before="0" w:after="0"/></w:pPr><w:r><w:drawing>"#,
            r#"<wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
            r#"<wp:docPr id="{id}" name="Picture {id}"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="{id}" name="Picture {id}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
            r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
        ),
        id = id,
        rel_id = rel_id,
        cx = cx,
        cy = cy,
    );
    xml
}

impl DocumentAssembler for PagedAssembler {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Paged
    }

    fn assemble(
        &self,
        images: &[DownloadedImage],
        output_dir: &Path,
        prefix: &str,
        sink: &dyn ProgressSink,
    ) -> Result<AssemblyOutcome, AssembleError> {
        if images.is_empty() {
            sink.status("No images available for the Word document".to_string());
            return Ok(AssemblyOutcome::NothingToAssemble);
        }

        sink.status("Building Word document...".to_string());
        let total = images.len();
        let mut placed = Vec::with_capacity(total);
        let mut placed_images = Vec::with_capacity(total);
        let mut skipped = 0;
        for (position, image) in images.iter().enumerate() {
            let name = display_name(image);
            sink.status(format!(
                "Adding image to Word document ({}/{}): {}",
                position + 1,
                total,
                name
            ));
            match self.place(image, placed.len() + 1) {
                Ok(entry) => {
                    placed.push(entry);
                    placed_images.push(image.clone());
                }
                Err(reason) => {
                    skipped += 1;
                    sink.warn(format!("Could not add {name} to the Word document: {reason}"));
                }
            }
        }

        if placed.is_empty() {
            sink.warn("None of the images could be placed; Word document not written".to_string());
            return Ok(AssemblyOutcome::NothingToAssemble);
        }

        let bytes = self.build_package(prefix, placed)?;
        let filename = output_filename(prefix, DocumentKind::Paged);
        let output_path = AtomicFileWriter::new(output_dir.to_path_buf()).write(&filename, bytes)?;
        sink.status(format!("Word document saved to {}", output_path.display()));

        Ok(AssemblyOutcome::Saved(AssembledDocument {
            kind: DocumentKind::Paged,
            prefix: prefix.to_string(),
            output_path,
            images: placed_images,
            skipped,
        }))
    }
}
