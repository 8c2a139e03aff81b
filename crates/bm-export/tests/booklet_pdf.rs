//! Integration tests: booklet export end to end (bm-export).
//!
//! Renders the four-page fixture, composes the PDF, and reads it back with
//! lopdf to check sheet order and geometry.

use bm_core::{CanvasConfig, Color, Page, ProjectDocument};
use bm_export::{
    BookletExporter, BookletRole, DataUrlLoader, ExportConfig, ExportError, PageRasterizer,
    RenderedPage, RoleAssignment, SoftwareRasterizer,
};
use futures::executor::block_on;
use futures::future::BoxFuture;
use lopdf::{Document, Object};
use pretty_assertions::assert_eq;

const FIXTURE: &str = include_str!("../../bm-core/tests/fixtures/boletim.json");

/// The fixture with a distinct, saturated background per page.
fn project() -> ProjectDocument {
    let mut project = ProjectDocument::from_json_str(FIXTURE).unwrap();
    let colors = [
        Color::from_rgb8(255, 0, 0),
        Color::from_rgb8(0, 255, 0),
        Color::from_rgb8(0, 0, 255),
        Color::from_rgb8(0, 0, 0),
    ];
    for (page, color) in project.pages.iter_mut().zip(colors) {
        page.background = color;
    }
    project
}

fn exporter() -> BookletExporter<SoftwareRasterizer<DataUrlLoader>> {
    BookletExporter::new(
        SoftwareRasterizer::new(DataUrlLoader),
        ExportConfig {
            final_multiplier: 0.5,
            ..ExportConfig::default()
        },
    )
}

fn number(obj: &Object) -> f64 {
    match obj {
        Object::Integer(i) => *i as f64,
        Object::Real(r) => *r as f64,
        other => panic!("not a number: {other:?}"),
    }
}

/// Center pixel of a sheet half's embedded JPEG.
fn half_color(doc: &Document, page_id: lopdf::ObjectId, name: &str) -> [u8; 3] {
    let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    let image_id = xobjects.get(name.as_bytes()).unwrap().as_reference().unwrap();
    let stream = doc.get_object(image_id).unwrap().as_stream().unwrap();
    let filter = stream.dict.get(b"Filter").unwrap().as_name().unwrap();
    assert_eq!(filter, b"DCTDecode");
    let img = image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
        .unwrap()
        .to_rgb8();
    img.get_pixel(img.width() / 2, img.height() / 2).0
}

fn dominant(rgb: [u8; 3]) -> &'static str {
    match rgb {
        [r, g, b] if r > 200 && g < 60 && b < 60 => "red",
        [r, g, b] if g > 200 && r < 60 && b < 60 => "green",
        [r, g, b] if b > 200 && r < 60 && g < 60 => "blue",
        [r, g, b] if r < 40 && g < 40 && b < 40 => "black",
        _ => "other",
    }
}

// ─── Happy path ─────────────────────────────────────────────────────────

#[test]
fn four_pages_become_two_landscape_a4_sheets() {
    let project = project();
    let roles = RoleAssignment::from_pages(&project.pages).unwrap();
    let bytes = block_on(exporter().export_pdf(&project, &roles)).unwrap();

    let doc = Document::load_mem(&bytes).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 2);

    for page_id in pages.values() {
        let page = doc.get_object(*page_id).unwrap().as_dict().unwrap();
        let media = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let (w, h) = (number(&media[2]), number(&media[3]));
        assert!((w - 841.89).abs() < 0.1, "width {w}");
        assert!((h - 595.28).abs() < 0.1, "height {h}");
        assert!(w > h);
    }

    // Pages in order: Cover=red, Back=green, Inner-L=blue, Inner-R=black.
    let sheet1 = pages[&1];
    let sheet2 = pages[&2];
    assert_eq!(dominant(half_color(&doc, sheet1, "Im1")), "green");
    assert_eq!(dominant(half_color(&doc, sheet1, "Im2")), "red");
    assert_eq!(dominant(half_color(&doc, sheet2, "Im1")), "blue");
    assert_eq!(dominant(half_color(&doc, sheet2, "Im2")), "black");
}

#[test]
fn reassigned_roles_change_the_sheets() {
    let project = project();
    let mut roles = RoleAssignment::from_pages(&project.pages).unwrap();
    // Print the last page as the cover and vice versa.
    roles.assign(BookletRole::Cover, project.pages[3].id);
    roles.assign(BookletRole::InnerRight, project.pages[0].id);

    let bytes = block_on(exporter().export_pdf(&project, &roles)).unwrap();
    let doc = Document::load_mem(&bytes).unwrap();
    let pages = doc.get_pages();
    assert_eq!(dominant(half_color(&doc, pages[&1], "Im2")), "black");
    assert_eq!(dominant(half_color(&doc, pages[&2], "Im2")), "red");
}

#[test]
fn preview_composes_both_sheets() {
    let project = project();
    let roles = RoleAssignment::from_pages(&project.pages).unwrap();
    let preview = block_on(exporter().preview(&project, &roles)).unwrap();

    // 400x565 at 0.6
    assert_eq!((preview.pages.cover.width, preview.pages.cover.height), (240, 339));
    let outer = preview.sheets.sheets[0].decode().unwrap();
    assert_eq!(outer.width(), 480);
    assert_eq!(dominant(outer.get_pixel(60, 170).0), "green");
    assert_eq!(dominant(outer.get_pixel(420, 170).0), "red");
}

// ─── Refusals ───────────────────────────────────────────────────────────

#[test]
fn export_refuses_other_page_counts() {
    let mut project = project();
    let roles = RoleAssignment::from_pages(&project.pages).unwrap();
    project.pages.pop();

    let exporter = exporter();
    match block_on(exporter.export_pdf(&project, &roles)) {
        Err(ExportError::PageCount { required, actual }) => assert_eq!((required, actual), (4, 3)),
        other => panic!("expected PageCount, got {other:?}"),
    }
    assert!(!exporter.is_busy());

    project.pages.push(Page::new(bm_core::PageId::generate(), "Extra 1"));
    project.pages.push(Page::new(bm_core::PageId::generate(), "Extra 2"));
    assert!(matches!(
        block_on(exporter.export_pdf(&project, &roles)),
        Err(ExportError::PageCount { actual: 5, .. })
    ));
}

/// Never finishes a page.
struct Stalled;

impl PageRasterizer for Stalled {
    fn rasterize<'a>(
        &'a self,
        _page: &'a Page,
        _config: &'a CanvasConfig,
        _multiplier: f32,
    ) -> BoxFuture<'a, Result<RenderedPage, ExportError>> {
        Box::pin(futures::future::pending())
    }
}

#[test]
fn second_export_while_running_is_refused() {
    let project = project();
    let roles = RoleAssignment::from_pages(&project.pages).unwrap();
    let exporter = BookletExporter::new(Stalled, ExportConfig::default());

    block_on(async {
        let mut first = Box::pin(exporter.export_pdf(&project, &roles));
        assert!(futures::poll!(&mut first).is_pending());
        assert!(exporter.is_busy());

        assert!(matches!(
            exporter.export_pdf(&project, &roles).await,
            Err(ExportError::Busy)
        ));
        drop(first);
    });
    assert!(!exporter.is_busy());
}
