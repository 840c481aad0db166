use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::persist::AtomicFileWriter;
use crate::progress::ProgressSink;
use crate::{DocumentKind, DownloadedImage};

use super::layout::{fit_centered, round_emu, Placement, SlideGeometry};
use super::ooxml::{
    PackageBuilder, Relationships, REL_CORE_PROPERTIES, REL_IMAGE, REL_OFFICE_DOCUMENT,
    REL_SLIDE, REL_SLIDE_LAYOUT, REL_SLIDE_MASTER, REL_THEME, XML_DECLARATION,
};
use super::probe::{DecoderProbe, ImageProbe};
use super::{
    display_name, output_filename, AssembleError, AssembledDocument, AssemblyOutcome,
    DocumentAssembler,
};

const CT_PRESENTATION: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const CT_SLIDE_MASTER: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const CT_SLIDE_LAYOUT: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";

const PML_NAMESPACES: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);

const EMPTY_SHAPE_TREE: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
);

/// Slide deck with one centred, aspect-preserving image per slide.
pub struct SlideAssembler {
    geometry: SlideGeometry,
    probe: Arc<dyn ImageProbe>,
}

struct SlideImage {
    media_name: String,
    extension: &'static str,
    mime: &'static str,
    bytes: Vec<u8>,
    placement: Placement,
}

impl SlideAssembler {
    pub fn new(geometry: SlideGeometry) -> Self {
        Self::with_probe(geometry, Arc::new(DecoderProbe))
    }

    pub fn with_probe(geometry: SlideGeometry, probe: Arc<dyn ImageProbe>) -> Self {
        Self { geometry, probe }
    }

    fn place(&self, image: &DownloadedImage, ordinal: usize) -> Result<SlideImage, String> {
        let info = self
            .probe
            .probe(&image.local_path)
            .map_err(|err| err.to_string())?;
        let placement = fit_centered(&self.geometry, info.width, info.height)
            .ok_or_else(|| format!("image has zero size ({}x{})", info.width, info.height))?;
        let bytes = fs::read(&image.local_path).map_err(|err| err.to_string())?;
        let extension = info.media_extension();
        Ok(SlideImage {
            media_name: format!("image{ordinal}.{extension}"),
            extension,
            mime: info.mime_type(),
            bytes,
            placement,
        })
    }

    fn build_package(&self, prefix: &str, slides: Vec<SlideImage>) -> Result<Vec<u8>, AssembleError> {
        let mut package = PackageBuilder::new();

        let mut root_rels = Relationships::default();
        root_rels.push(REL_OFFICE_DOCUMENT, "ppt/presentation.xml");
        root_rels.push(REL_CORE_PROPERTIES, "docProps/core.xml");
        package.add_relationships("_rels/.rels", &root_rels);

        let mut presentation_rels = Relationships::default();
        let master_rel = presentation_rels.push(REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml");
        presentation_rels.push(REL_THEME, "theme/theme1.xml");

        let mut slide_ids = String::new();
        for (position, slide) in slides.into_iter().enumerate() {
            let number = position + 1;
            let rel_id = presentation_rels.push(REL_SLIDE, format!("slides/slide{number}.xml"));
            slide_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="{rel_id}"/>"#, 255 + number));

            let mut slide_rels = Relationships::default();
            slide_rels.push(REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml");
            let image_rel = slide_rels.push(REL_IMAGE, format!("../media/{}", slide.media_name));

            package.add_xml(
                &format!("ppt/slides/slide{number}.xml"),
                CT_SLIDE,
                slide_xml(number, &image_rel, &slide.placement),
            );
            package.add_relationships(&format!("ppt/slides/_rels/slide{number}.xml.rels"), &slide_rels);
            package.add_media(
                &format!("ppt/media/{}", slide.media_name),
                slide.extension,
                slide.mime,
                slide.bytes,
            );
        }

        package.add_xml(
            "ppt/presentation.xml",
            CT_PRESENTATION,
            self.presentation_xml(&master_rel, &slide_ids),
        );
        package.add_relationships("ppt/_rels/presentation.xml.rels", &presentation_rels);

        let mut master_rels = Relationships::default();
        let layout_rel = master_rels.push(REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml");
        master_rels.push(REL_THEME, "../theme/theme1.xml");
        package.add_xml(
            "ppt/slideMasters/slideMaster1.xml",
            CT_SLIDE_MASTER,
            slide_master_xml(&layout_rel),
        );
        package.add_relationships("ppt/slideMasters/_rels/slideMaster1.xml.rels", &master_rels);

        let mut layout_rels = Relationships::default();
        layout_rels.push(REL_SLIDE_MASTER, "../slideMasters/slideMaster1.xml");
        package.add_xml("ppt/slideLayouts/slideLayout1.xml", CT_SLIDE_LAYOUT, slide_layout_xml());
        package.add_relationships("ppt/slideLayouts/_rels/slideLayout1.xml.rels", &layout_rels);

        package.add_xml("ppt/theme/theme1.xml", CT_THEME, theme_xml());
        package.add_core_properties("docProps/core.xml", prefix);
        package.finish()
    }

    fn presentation_xml(&self, master_rel: &str, slide_ids: &str) -> String {
        format!(
            concat!(
                "{decl}<p:presentation {ns} saveSubsetFonts=\"1\">",
                r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="{master_rel}"/></p:sldMasterIdLst>"#,
                "<p:sldIdLst>{slide_ids}</p:sldIdLst>",
                r#"<p:sldSz cx="{cx}" cy="{cy}"/><p:notesSz cx="6858000" cy="9144000"/>"#,
                "</p:presentation>"
            ),
            decl = XML_DECLARATION,
            ns = PML_NAMESPACES,
            master_rel = master_rel,
            slide_ids = slide_ids,
            cx = round_emu(self.geometry.width),
            cy = round_emu(self.geometry.height),
        )
    }
}

fn slide_xml(number: usize, image_rel: &str, placement: &Placement) -> String {
    format!(
        concat!(
            "{decl}<p:sld {ns}><p:cSld><p:spTree>{tree}",
            "<p:pic><p:nvPicPr>",
            r#"<p:cNvPr id="2" name="Picture {number}"/>"#,
            r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
            r#"<p:blipFill><a:blip r:embed="{image_rel}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
            r#"<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
            "</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"
        ),
        decl = XML_DECLARATION,
        ns = PML_NAMESPACES,
        tree = EMPTY_SHAPE_TREE,
        number = number,
        image_rel = image_rel,
        x = round_emu(placement.left),
        y = round_emu(placement.top),
        cx = round_emu(placement.width),
        cy = round_emu(placement.height),
    )
}

fn slide_master_xml(layout_rel: &str) -> String {
    format!(
        concat!(
            "{decl}<p:sldMaster {ns}><p:cSld><p:bg><p:bgRef idx=\"1001\"><a:schemeClr val=\"bg1\"/></p:bgRef></p:bg>",
            "<p:spTree>{tree}</p:spTree></p:cSld>",
            r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
            r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="{layout_rel}"/></p:sldLayoutIdLst>"#,
            "</p:sldMaster>"
        ),
        decl = XML_DECLARATION,
        ns = PML_NAMESPACES,
        tree = EMPTY_SHAPE_TREE,
        layout_rel = layout_rel,
    )
}

fn slide_layout_xml() -> String {
    format!(
        concat!(
            "{decl}<p:sldLayout {ns} type=\"blank\" preserve=\"1\">",
            "<p:cSld name=\"Blank\"><p:spTree>{tree}</p:spTree></p:cSld>",
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"
        ),
        decl = XML_DECLARATION,
        ns = PML_NAMESPACES,
        tree = EMPTY_SHAPE_TREE,
    )
}

fn theme_xml() -> String {
    let colors = [
        ("dk1", r#"<a:sysClr val="windowText" lastClr="000000"/>"#),
        ("lt1", r#"<a:sysClr val="window" lastClr="FFFFFF"/>"#),
        ("dk2", r#"<a:srgbClr val="44546A"/>"#),
        ("lt2", r#"<a:srgbClr val="E7E6E6"/>"#),
        ("accent1", r#"<a:srgbClr val="4472C4"/>"#),
        ("accent2", r#"<a:srgbClr val="ED7D31"/>"#),
        ("accent3", r#"<a:srgbClr val="A5A5A5"/>"#),
        ("accent4", r#"<a:srgbClr val="FFC000"/>"#),
        ("accent5", r#"<a:srgbClr val="5B9BD5"/>"#),
        ("accent6", r#"<a:srgbClr val="70AD47"/>"#),
        ("hlink", r#"<a:srgbClr val="0563C1"/>"#),
        ("folHlink", r#"<a:srgbClr val="954F72"/>"#),
    ];
    let color_scheme: String = colors
        .iter()
        .map(|(name, value)| format!("<a:{name}>{value}</a:{name}>"))
        .collect();

    let solid_fill = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let fills = solid_fill.repeat(3);
    let lines = format!(r#"<a:ln w="6350">{solid_fill}</a:ln>"#).repeat(3);
    let effects = "<a:effectStyle><a:effectLst/></a:effectStyle>".repeat(3);
    let fonts = |typeface: &str| {
        format!(r#"<a:latin typeface="{typeface}"/><a:ea typeface=""/><a:cs typeface=""/>"#)
    };

    format!(
        concat!(
            "{decl}<a:theme xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" name=\"Office Theme\">",
            "<a:themeElements>",
            "<a:clrScheme name=\"Office\">{colors}</a:clrScheme>",
            "<a:fontScheme name=\"Office\"><a:majorFont>{major}</a:majorFont><a:minorFont>{minor}</a:minorFont></a:fontScheme>",
            "<a:fmtScheme name=\"Office\">",
            "<a:fillStyleLst>{fills}</a:fillStyleLst>",
            "<a:lnStyleLst>{lines}</a:lnStyleLst>",
            "<a:effectStyleLst>{effects}</a:effectStyleLst>",
            "<a:bgFillStyleLst>{fills}</a:bgFillStyleLst>",
            "</a:fmtScheme></a:themeElements></a:theme>"
        ),
        decl = XML_DECLARATION,
        colors = color_scheme,
        major = fonts("Calibri Light"),
        minor = fonts("Calibri"),
        fills = fills,
        lines = lines,
        effects = effects,
    )
}

impl DocumentAssembler for SlideAssembler {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Slide
    }

    fn assemble(
        &self,
        images: &[DownloadedImage],
        output_dir: &Path,
        prefix: &str,
        sink: &dyn ProgressSink,
    ) -> Result<AssemblyOutcome, AssembleError> {
        if images.is_empty() {
            sink.status("No images available for the slide deck".to_string());
            return Ok(AssemblyOutcome::NothingToAssemble);
        }

        sink.status("Building slide deck...".to_string());
        let total = images.len();
        let mut slides = Vec::with_capacity(total);
        let mut placed_images = Vec::with_capacity(total);
        let mut skipped = 0;
        for (position, image) in images.iter().enumerate() {
            let name = display_name(image);
            sink.status(format!(
                "Adding image to slide deck ({}/{}): {}",
                position + 1,
                total,
                name
            ));
            match self.place(image, slides.len() + 1) {
                Ok(slide) => {
                    slides.push(slide);
                    placed_images.push(image.clone());
                }
                Err(reason) => {
                    skipped += 1;
                    sink.warn(format!("Skipping {name} in the slide deck: {reason}"));
                }
            }
        }

        if slides.is_empty() {
            sink.warn("None of the images could be placed; slide deck not written".to_string());
            return Ok(AssemblyOutcome::NothingToAssemble);
        }

        let bytes = self.build_package(prefix, slides)?;
        let filename = output_filename(prefix, DocumentKind::Slide);
        let output_path = AtomicFileWriter::new(output_dir.to_path_buf()).write(&filename, bytes)?;
        sink.status(format!("Slide deck saved to {}", output_path.display()));

        Ok(AssemblyOutcome::Saved(AssembledDocument {
            kind: DocumentKind::Slide,
            prefix: prefix.to_string(),
            output_path,
            images: placed_images,
            skipped,
        }))
    }
}
