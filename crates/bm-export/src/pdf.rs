//! Booklet PDF composition with `lopdf`.
//!
//! Two A4 landscape pages; every half holds one page image, embedded as-is
//! as a `DCTDecode` XObject.

use crate::error::ExportError;
use crate::raster::RenderedPage;
use crate::roles::RoleMap;
use crate::sheet::{A4_LANDSCAPE_HEIGHT_MM, A4_LANDSCAPE_WIDTH_MM, SHEETS, Sheet, Slot, mm_to_pt};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

/// Suggested download name.
pub const PDF_FILE_NAME: &str = "boletim-livreto.pdf";

/// Build the two-sheet booklet from the rendered role pages.
pub fn compose_booklet(pages: &RoleMap<RenderedPage>) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::with_version("1.4");
    let id_pages = doc.new_object_id();
    let media_box: Vec<Object> = vec![
        0.into(),
        0.into(),
        (mm_to_pt(A4_LANDSCAPE_WIDTH_MM) as f32).into(),
        (mm_to_pt(A4_LANDSCAPE_HEIGHT_MM) as f32).into(),
    ];

    let mut kids: Vec<Object> = Vec::new();
    for (n, sheet) in SHEETS.iter().enumerate() {
        let mut xobjects = lopdf::Dictionary::new();
        let mut ops = Vec::new();
        for (i, (role, slot)) in sheet.roles().into_iter().zip(Sheet::slots()).enumerate() {
            let name = format!("Im{}", i + 1);
            let image_id = add_jpeg(&mut doc, pages.get(role));
            xobjects.set(name.as_bytes().to_vec(), image_id);
            ops.extend(place_image(&name, slot));
        }

        let content = Content { operations: ops };
        let id_content = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let id_page = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => id_pages,
            "MediaBox" => media_box.clone(),
            "Contents" => id_content,
            "Resources" => dictionary! {
                "XObject" => xobjects,
            },
        });
        log::debug!("sheet {} composed: {:?} | {:?}", n + 1, sheet.left, sheet.right);
        kids.push(id_page.into());
    }

    doc.set_object(
        id_pages,
        dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
            "MediaBox" => media_box,
        },
    );
    let id_catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => id_pages,
    });
    doc.trailer.set("Root", id_catalog);
    let id_info = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Boletim"),
        "Producer" => Object::string_literal(concat!("bm-export ", env!("CARGO_PKG_VERSION"))),
    });
    doc.trailer.set("Info", id_info);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

fn add_jpeg(doc: &mut Document, page: &RenderedPage) -> ObjectId {
    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => page.width as i64,
            "Height" => page.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        page.jpeg.clone(),
    )
    // Already JPEG compressed.
    .with_compression(false);
    doc.add_object(stream)
}

/// Stretch the named image over `slot`.
fn place_image(name: &str, slot: Slot) -> [Operation; 4] {
    [
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                (slot.width as f32).into(),
                0.into(),
                0.into(),
                (slot.height as f32).into(),
                (slot.x as f32).into(),
                (slot.y as f32).into(),
            ],
        ),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}
