//! Small in-memory `.pptx` files for tests.
//!
//! Available to other crates with the `fixtures` feature.

use crate::presentation::Presentation;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

pub const PNG_RED: &[u8] = b"\x89PNG\r\n\x1a\nred-pixel";
pub const PNG_BLUE: &[u8] = b"\x89PNG\r\n\x1a\nblue-pixel";
pub const WORKBOOK: &[u8] = b"PK\x03\x04chart-data";

const NAMESPACES: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const CHART_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";
const GROUP: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#;

/// One slide of a fixture deck.
#[derive(Debug, Clone, Default)]
pub struct FixtureSlide {
    text: String,
    image: Option<Vec<u8>>,
    link: Option<String>,
    slide_jump: bool,
    chart: bool,
    fill: Option<String>,
    background_image: Option<Vec<u8>>,
    layout: usize,
}

impl FixtureSlide {
    /// A slide with one text box.
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    /// Add a picture shape after the text box.
    pub fn with_image(mut self, bytes: &[u8]) -> Self {
        self.image = Some(bytes.to_vec());
        self
    }

    /// Make the text an external hyperlink.
    pub fn with_link(mut self, url: &str) -> Self {
        self.link = Some(url.to_string());
        self
    }

    /// Make the text jump to a slide (a relationship the copier cannot carry).
    pub fn with_slide_jump(mut self) -> Self {
        self.slide_jump = true;
        self
    }

    /// Add a chart frame whose chart part embeds a workbook.
    pub fn with_chart(mut self) -> Self {
        self.chart = true;
        self
    }

    pub fn with_fill(mut self, rgb: &str) -> Self {
        self.fill = Some(rgb.to_string());
        self
    }

    pub fn with_background_image(mut self, bytes: &[u8]) -> Self {
        self.background_image = Some(bytes.to_vec());
        self
    }

    /// Base the slide on the layout at this index (default 0).
    pub fn on_layout(mut self, layout: usize) -> Self {
        self.layout = layout;
        self
    }
}

/// Builds a minimal but complete presentation package.
#[derive(Debug, Clone)]
pub struct DeckBuilder {
    layout_names: Vec<String>,
    master_fill: Option<String>,
    slides: Vec<FixtureSlide>,
}

impl Default for DeckBuilder {
    fn default() -> Self {
        Self {
            layout_names: vec!["Title Only".to_string(), "Blank".to_string()],
            master_fill: None,
            slides: Vec::new(),
        }
    }
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the layout names (first layout carries a title placeholder).
    pub fn layout_names(mut self, names: &[&str]) -> Self {
        self.layout_names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn master_fill(mut self, rgb: &str) -> Self {
        self.master_fill = Some(rgb.to_string());
        self
    }

    pub fn slide(mut self, slide: FixtureSlide) -> Self {
        self.slides.push(slide);
        self
    }

    /// `count` slides titled "Slide 1", "Slide 2", ...
    pub fn numbered_slides(mut self, prefix: &str, count: usize) -> Self {
        for i in 1..=count {
            self.slides.push(FixtureSlide::text(&format!("{} {}", prefix, i)));
        }
        self
    }

    pub fn presentation(&self) -> Presentation {
        Presentation::from_bytes(&self.build()).unwrap()
    }

    pub fn build(&self) -> Vec<u8> {
        let mut files: Vec<(String, Vec<u8>)> = Vec::new();
        let mut add = |name: String, text: String| files.push((name, text.into_bytes()));
        let mut media: Vec<(String, Vec<u8>)> = Vec::new();

        add("[Content_Types].xml".to_string(), self.content_types());
        add(
            "_rels/.rels".to_string(),
            rels(&[("rId1", "officeDocument", "ppt/presentation.xml", false)]),
        );
        add("ppt/presentation.xml".to_string(), self.presentation_xml());
        add("ppt/_rels/presentation.xml.rels".to_string(), self.presentation_rels());
        add("ppt/theme/theme1.xml".to_string(), format!(
            r#"{}<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements/></a:theme>"#,
            DECL
        ));
        add("ppt/slideMasters/slideMaster1.xml".to_string(), self.master_xml());
        add("ppt/slideMasters/_rels/slideMaster1.xml.rels".to_string(), self.master_rels());

        for (i, name) in self.layout_names.iter().enumerate() {
            add(
                format!("ppt/slideLayouts/slideLayout{}.xml", i + 1),
                layout_xml(name, i == 0),
            );
            add(
                format!("ppt/slideLayouts/_rels/slideLayout{}.xml.rels", i + 1),
                rels(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml", false)]),
            );
        }

        for (i, slide) in self.slides.iter().enumerate() {
            let n = i + 1;
            let mut slide_rels = vec![(
                "rId1".to_string(),
                "slideLayout",
                format!("../slideLayouts/slideLayout{}.xml", slide.layout + 1),
                false,
            )];
            let mut push_rel = |kind: &'static str, target: String, external: bool| {
                let id = format!("rId{}", slide_rels.len() + 1);
                slide_rels.push((id.clone(), kind, target, external));
                id
            };

            let image_id = slide.image.as_ref().map(|bytes| {
                let part = format!("image{}.png", media.len() + 1);
                media.push((format!("ppt/media/{}", part), bytes.clone()));
                push_rel("image", format!("../media/{}", part), false)
            });
            let link_id = slide
                .link
                .as_ref()
                .map(|url| push_rel("hyperlink", url.clone(), true));
            let jump_id = slide
                .slide_jump
                .then(|| push_rel("slide", format!("slide{}.xml", n), false));
            let chart_id = slide.chart.then(|| {
                let k = media
                    .iter()
                    .filter(|(name, _)| name.starts_with("ppt/charts/chart"))
                    .count()
                    + 1;
                media.push((format!("ppt/charts/chart{}.xml", k), chart_xml().into_bytes()));
                let workbook = format!("../embeddings/Microsoft_Excel_Worksheet{}.xlsx", k);
                media.push((
                    format!("ppt/charts/_rels/chart{}.xml.rels", k),
                    rels(&[("rId1", "package", workbook.as_str(), false)]).into_bytes(),
                ));
                media.push((
                    format!("ppt/embeddings/Microsoft_Excel_Worksheet{}.xlsx", k),
                    WORKBOOK.to_vec(),
                ));
                push_rel("chart", format!("../charts/chart{}.xml", k), false)
            });
            let background_id = slide.background_image.as_ref().map(|bytes| {
                let part = format!("image{}.png", media.len() + 1);
                media.push((format!("ppt/media/{}", part), bytes.clone()));
                push_rel("image", format!("../media/{}", part), false)
            });

            let background = match (&background_id, &slide.fill) {
                (Some(id), _) => image_background(id),
                (None, Some(rgb)) => fill_background(rgb),
                (None, None) => String::new(),
            };

            let mut run_props = String::new();
            if let Some(id) = &link_id {
                run_props.push_str(&format!(r#"<a:hlinkClick r:id="{}"/>"#, id));
            }
            if let Some(id) = &jump_id {
                run_props.push_str(&format!(
                    r#"<a:hlinkClick r:id="{}" action="ppaction://hlinksldjump"/>"#,
                    id
                ));
            }

            let mut shapes = format!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="TextBox 1"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US">{}</a:rPr><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
                run_props,
                escape(&slide.text)
            );
            if let Some(id) = &image_id {
                shapes.push_str(&format!(
                    r#"<p:pic><p:nvPicPr><p:cNvPr id="3" name="Picture 2"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr/></p:pic>"#,
                    id
                ));
            }
            if let Some(id) = &chart_id {
                shapes.push_str(&format!(
                    r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="4" name="Chart 3"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm/><a:graphic><a:graphicData uri="{}"><c:chart xmlns:c="{}" r:id="{}"/></a:graphicData></a:graphic></p:graphicFrame>"#,
                    CHART_NS, CHART_NS, id
                ));
            }

            add(
                format!("ppt/slides/slide{}.xml", n),
                format!(
                    r#"{}<p:sld {}><p:cSld>{}<p:spTree>{}{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
                    DECL, NAMESPACES, background, GROUP, shapes
                ),
            );
            let entries: Vec<(&str, &str, &str, bool)> = slide_rels
                .iter()
                .map(|(id, kind, target, external)| (id.as_str(), *kind, target.as_str(), *external))
                .collect();
            add(format!("ppt/slides/_rels/slide{}.xml.rels", n), rels(&entries));
        }

        files.extend(media);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in files {
            zip.start_file(name, FileOptions::default()).unwrap();
            zip.write_all(&bytes).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn content_types(&self) -> String {
        let mut overrides = vec![
            ("/ppt/presentation.xml".to_string(), "presentationml.presentation.main+xml"),
            ("/ppt/slideMasters/slideMaster1.xml".to_string(), "presentationml.slideMaster+xml"),
            ("/ppt/theme/theme1.xml".to_string(), "theme+xml"),
        ];
        for i in 1..=self.layout_names.len() {
            overrides.push((
                format!("/ppt/slideLayouts/slideLayout{}.xml", i),
                "presentationml.slideLayout+xml",
            ));
        }
        for i in 1..=self.slides.len() {
            overrides.push((format!("/ppt/slides/slide{}.xml", i), "presentationml.slide+xml"));
        }
        for k in 1..=self.slides.iter().filter(|s| s.chart).count() {
            overrides.push((format!("/ppt/charts/chart{}.xml", k), "drawingml.chart+xml"));
        }

        let overrides: String = overrides
            .iter()
            .map(|(part, kind)| {
                format!(
                    r#"<Override PartName="{}" ContentType="application/vnd.openxmlformats-officedocument.{}"/>"#,
                    part, kind
                )
            })
            .collect();
        format!(
            r#"{}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="xlsx" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"/>{}</Types>"#,
            DECL, overrides
        )
    }

    fn presentation_xml(&self) -> String {
        let slides = if self.slides.is_empty() {
            String::new()
        } else {
            let ids: String = (0..self.slides.len())
                .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 3))
                .collect();
            format!("<p:sldIdLst>{}</p:sldIdLst>", ids)
        };
        format!(
            r#"{}<p:presentation {}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>{}<p:sldSz cx="12192000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
            DECL, NAMESPACES, slides
        )
    }

    fn presentation_rels(&self) -> String {
        let mut entries = vec![
            ("rId1".to_string(), "slideMaster", "slideMasters/slideMaster1.xml".to_string()),
            ("rId2".to_string(), "theme", "theme/theme1.xml".to_string()),
        ];
        for i in 0..self.slides.len() {
            entries.push((format!("rId{}", i + 3), "slide", format!("slides/slide{}.xml", i + 1)));
        }
        let entries: Vec<(&str, &str, &str, bool)> = entries
            .iter()
            .map(|(id, kind, target)| (id.as_str(), *kind, target.as_str(), false))
            .collect();
        rels(&entries)
    }

    fn master_xml(&self) -> String {
        let background = self
            .master_fill
            .as_deref()
            .map(fill_background)
            .unwrap_or_default();
        let layout_ids: String = (0..self.layout_names.len())
            .map(|i| format!(r#"<p:sldLayoutId id="{}" r:id="rId{}"/>"#, 2_147_483_649u64 + i as u64, i + 1))
            .collect();
        format!(
            r#"{}<p:sldMaster {}><p:cSld>{}<p:spTree>{}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst>{}</p:sldLayoutIdLst><p:txStyles/></p:sldMaster>"#,
            DECL, NAMESPACES, background, GROUP, layout_ids
        )
    }

    fn master_rels(&self) -> String {
        let mut entries: Vec<(String, &str, String)> = (0..self.layout_names.len())
            .map(|i| {
                (
                    format!("rId{}", i + 1),
                    "slideLayout",
                    format!("../slideLayouts/slideLayout{}.xml", i + 1),
                )
            })
            .collect();
        entries.push((
            format!("rId{}", self.layout_names.len() + 1),
            "theme",
            "../theme/theme1.xml".to_string(),
        ));
        let entries: Vec<(&str, &str, &str, bool)> = entries
            .iter()
            .map(|(id, kind, target)| (id.as_str(), *kind, target.as_str(), false))
            .collect();
        rels(&entries)
    }
}

fn layout_xml(name: &str, with_title: bool) -> String {
    let title = if with_title {
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>Click to edit title</a:t></a:r></a:p></p:txBody></p:sp>"#
    } else {
        ""
    };
    format!(
        r#"{}<p:sldLayout {} preserve="1"><p:cSld name="{}"><p:spTree>{}{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        DECL, NAMESPACES, escape(name), GROUP, title
    )
}

fn chart_xml() -> String {
    format!(
        r#"{}<c:chartSpace xmlns:c="{}" xmlns:r="{}"><c:chart><c:plotArea/></c:chart><c:externalData r:id="rId1"/></c:chartSpace>"#,
        DECL, CHART_NS, REL
    )
}

fn fill_background(rgb: &str) -> String {
    format!(
        r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#,
        rgb
    )
}

fn image_background(id: &str) -> String {
    format!(
        r#"<p:bg><p:bgPr><a:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></a:blipFill><a:effectLst/></p:bgPr></p:bg>"#,
        id
    )
}

fn rels(entries: &[(&str, &str, &str, bool)]) -> String {
    let body: String = entries
        .iter()
        .map(|(id, kind, target, external)| {
            let mode = if *external { r#" TargetMode="External""# } else { "" };
            let reltype = format!("{}/{}", REL, kind);
            format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                id,
                reltype,
                escape(target),
                mode
            )
        })
        .collect();
    format!(
        r#"{}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        DECL, body
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
