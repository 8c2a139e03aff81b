//! Print sheet layout.
//!
//! Each sheet is an A4 page in landscape, split into two A5-sized halves.

use crate::error::ExportError;
use crate::raster::RenderedPage;
use crate::roles::{BookletRole, RoleMap};
use image::{Rgb, RgbImage, imageops};

pub const A4_LANDSCAPE_WIDTH_MM: f64 = 297.0;
pub const A4_LANDSCAPE_HEIGHT_MM: f64 = 210.0;
pub const HALF_WIDTH_MM: f64 = A4_LANDSCAPE_WIDTH_MM / 2.0;

pub fn mm_to_pt(mm: f64) -> f64 {
    mm * 72.0 / 25.4
}

/// One printed sheet: the role shown on each half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sheet {
    pub left: BookletRole,
    pub right: BookletRole,
}

/// Folding the outer sheet puts the cover on the right half and the back
/// cover on the left.
pub const SHEETS: [Sheet; 2] = [
    Sheet {
        left: BookletRole::BackCover,
        right: BookletRole::Cover,
    },
    Sheet {
        left: BookletRole::InnerLeft,
        right: BookletRole::InnerRight,
    },
];

/// Half-page slot on a sheet, in PDF points from the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Sheet {
    pub fn roles(&self) -> [BookletRole; 2] {
        [self.left, self.right]
    }

    pub fn slots() -> [Slot; 2] {
        let width = mm_to_pt(HALF_WIDTH_MM);
        let height = mm_to_pt(A4_LANDSCAPE_HEIGHT_MM);
        [
            Slot {
                x: 0.0,
                y: 0.0,
                width,
                height,
            },
            Slot {
                x: width,
                y: 0.0,
                width,
                height,
            },
        ]
    }
}

/// Sheets side by side as the dialog previews them.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetPreview {
    pub sheets: [RenderedPage; 2],
}

/// Join the two halves of every sheet into one image each.
pub fn compose_sheets(pages: &RoleMap<RenderedPage>, quality: u8) -> Result<SheetPreview, ExportError> {
    let [a, b] = SHEETS;
    Ok(SheetPreview {
        sheets: [
            compose_sheet(pages.get(a.left), pages.get(a.right), quality)?,
            compose_sheet(pages.get(b.left), pages.get(b.right), quality)?,
        ],
    })
}

pub fn compose_sheet(
    left: &RenderedPage,
    right: &RenderedPage,
    quality: u8,
) -> Result<RenderedPage, ExportError> {
    let l = left.decode()?;
    let r = right.decode()?;
    let mut sheet = RgbImage::from_pixel(
        l.width() + r.width(),
        l.height().max(r.height()),
        Rgb([255, 255, 255]),
    );
    imageops::overlay(&mut sheet, &l, 0, 0);
    imageops::overlay(&mut sheet, &r, l.width() as i64, 0);
    RenderedPage::encode(&sheet, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn a4_landscape_in_points() {
        assert!((mm_to_pt(A4_LANDSCAPE_WIDTH_MM) - 841.89).abs() < 0.01);
        assert!((mm_to_pt(A4_LANDSCAPE_HEIGHT_MM) - 595.28).abs() < 0.01);
        let [left, right] = Sheet::slots();
        assert_eq!(left.width, right.width);
        assert_eq!(right.x, left.width);
    }

    #[test]
    fn outer_sheet_is_back_then_cover() {
        assert_eq!(SHEETS[0].roles(), [BookletRole::BackCover, BookletRole::Cover]);
        assert_eq!(SHEETS[1].roles(), [BookletRole::InnerLeft, BookletRole::InnerRight]);
    }

    #[test]
    fn composed_sheet_is_both_halves_wide() {
        let page = |v: u8| RenderedPage::encode(&RgbImage::from_pixel(8, 10, Rgb([v, v, v])), 90).unwrap();
        let sheet = compose_sheet(&page(0), &page(255), 90).unwrap();
        assert_eq!((sheet.width, sheet.height), (16, 10));
        let rgb = sheet.decode().unwrap();
        assert!(rgb.get_pixel(1, 5).0[0] < 40);
        assert!(rgb.get_pixel(14, 5).0[0] > 215);
    }
}
