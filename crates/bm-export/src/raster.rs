//! Off-screen page rasterization.
//!
//! A page is rebuilt from its model onto a fresh pixmap, never read back
//! from the live editor canvas, so margin guides and selection handles
//! cannot leak into the output. Image sources are all loaded before the
//! first pixel is painted.

use crate::error::ExportError;
use crate::paint::{PaintContext, paint_page};
use ab_glyph::FontArc;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bm_core::{CanvasConfig, Page, WidgetKind};
use futures::future::{BoxFuture, try_join_all};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use std::collections::HashMap;
use tiny_skia::Pixmap;

// ─── Rendered output ─────────────────────────────────────────────────────

/// A rasterized page, JPEG encoded.
#[derive(Clone, PartialEq)]
pub struct RenderedPage {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

impl std::fmt::Debug for RenderedPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedPage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("jpeg_bytes", &self.jpeg.len())
            .finish()
    }
}

impl RenderedPage {
    pub fn encode(rgb: &RgbImage, quality: u8) -> Result<Self, ExportError> {
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality).encode_image(rgb)?;
        Ok(Self {
            width: rgb.width(),
            height: rgb.height(),
            jpeg,
        })
    }

    pub fn decode(&self) -> Result<RgbImage, ExportError> {
        let img = image::load_from_memory_with_format(&self.jpeg, image::ImageFormat::Jpeg)?;
        Ok(img.to_rgb8())
    }

    /// `data:image/jpeg;base64,...` for preview `<img>` tags.
    pub fn to_data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", STANDARD.encode(&self.jpeg))
    }
}

// ─── Image sources ───────────────────────────────────────────────────────

/// Resolves an image widget's `src` into pixels.
pub trait ImageLoader: Send + Sync {
    fn load<'a>(&'a self, src: &'a str) -> BoxFuture<'a, Result<DynamicImage, ExportError>>;
}

/// Loads `data:` URLs, the form uploaded images are stored in.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUrlLoader;

impl DataUrlLoader {
    pub fn decode(src: &str) -> Result<DynamicImage, ExportError> {
        let rest = src
            .strip_prefix("data:")
            .ok_or_else(|| ExportError::image_load(src, "not a data: URL"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ExportError::image_load(src, "missing data: URL payload"))?;
        if !header.ends_with(";base64") {
            return Err(ExportError::image_load(src, "only base64 data: URLs are supported"));
        }
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| ExportError::image_load(src, e))?;
        Ok(image::load_from_memory(&bytes)?)
    }
}

impl ImageLoader for DataUrlLoader {
    fn load<'a>(&'a self, src: &'a str) -> BoxFuture<'a, Result<DynamicImage, ExportError>> {
        Box::pin(async move { Self::decode(src) })
    }
}

/// Loads `data:` URLs, and anything else as a file path relative to `base`.
#[cfg(feature = "runtime")]
#[derive(Debug, Clone)]
pub struct FileLoader {
    base: std::path::PathBuf,
}

#[cfg(feature = "runtime")]
impl FileLoader {
    pub fn new(base: impl Into<std::path::PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

#[cfg(feature = "runtime")]
impl ImageLoader for FileLoader {
    fn load<'a>(&'a self, src: &'a str) -> BoxFuture<'a, Result<DynamicImage, ExportError>> {
        Box::pin(async move {
            if src.starts_with("data:") {
                return DataUrlLoader::decode(src);
            }
            if src.contains("://") {
                return Err(ExportError::image_load(src, "remote images are not supported"));
            }
            let path = self.base.join(src);
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| ExportError::image_load(src, e))?;
            Ok(image::load_from_memory(&bytes)?)
        })
    }
}

// ─── Rasterizers ─────────────────────────────────────────────────────────

/// Renders one page at `multiplier` times its canvas size.
pub trait PageRasterizer: Send + Sync {
    fn rasterize<'a>(
        &'a self,
        page: &'a Page,
        config: &'a CanvasConfig,
        multiplier: f32,
    ) -> BoxFuture<'a, Result<RenderedPage, ExportError>>;
}

/// CPU rasterizer on `tiny-skia`.
///
/// Text is drawn only when a font has been supplied; without one, text
/// widgets are skipped.
pub struct SoftwareRasterizer<L> {
    loader: L,
    font: Option<FontArc>,
    jpeg_quality: u8,
}

impl<L: ImageLoader> SoftwareRasterizer<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            font: None,
            jpeg_quality: 80,
        }
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    /// Load a TrueType/OpenType font for text widgets.
    pub fn with_font_bytes(self, bytes: Vec<u8>) -> Result<Self, ExportError> {
        let font = FontArc::try_from_vec(bytes).map_err(|e| ExportError::Font(e.to_string()))?;
        Ok(self.with_font(font))
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    async fn load_images(&self, page: &Page) -> Result<HashMap<String, DynamicImage>, ExportError> {
        let mut sources: Vec<&str> = page
            .widgets
            .iter()
            .filter(|w| w.kind == WidgetKind::Image)
            .filter_map(|w| w.content.as_deref())
            .filter(|src| !src.is_empty())
            .collect();
        sources.sort_unstable();
        sources.dedup();

        let images = try_join_all(sources.iter().map(|src| self.loader.load(src))).await?;
        Ok(sources
            .into_iter()
            .map(str::to_string)
            .zip(images)
            .collect())
    }

    async fn render(
        &self,
        page: &Page,
        config: &CanvasConfig,
        multiplier: f32,
    ) -> Result<RenderedPage, ExportError> {
        let images = self.load_images(page).await?;

        let width = (config.width * multiplier as f64).round().max(0.0) as u32;
        let height = (config.height * multiplier as f64).round().max(0.0) as u32;
        let mut pixmap = Pixmap::new(width, height).ok_or(ExportError::Raster { width, height })?;

        let ctx = PaintContext {
            multiplier,
            images: &images,
            font: self.font.as_ref(),
        };
        paint_page(&mut pixmap, page, &ctx);
        log::debug!(
            "rasterized page {} at {}x{} ({} widgets)",
            page.id,
            width,
            height,
            page.widgets.len()
        );

        RenderedPage::encode(&flatten(&pixmap), self.jpeg_quality)
    }
}

impl<L: ImageLoader> PageRasterizer for SoftwareRasterizer<L> {
    fn rasterize<'a>(
        &'a self,
        page: &'a Page,
        config: &'a CanvasConfig,
        multiplier: f32,
    ) -> BoxFuture<'a, Result<RenderedPage, ExportError>> {
        Box::pin(self.render(page, config, multiplier))
    }
}

/// Composite a premultiplied pixmap over white into an RGB image.
fn flatten(pixmap: &Pixmap) -> RgbImage {
    let mut rgb = RgbImage::new(pixmap.width(), pixmap.height());
    for (dst, px) in rgb.pixels_mut().zip(pixmap.pixels()) {
        // Premultiplied: `c + 255 - a` composites over white.
        let inv = 255 - px.alpha();
        dst.0 = [
            px.red().saturating_add(inv),
            px.green().saturating_add(inv),
            px.blue().saturating_add(inv),
        ];
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;
    use bm_core::{Color, PageId, Widget, WidgetId};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn png_data_url(rgb: [u8; 3]) -> String {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, image::Rgb(rgb)));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(bytes))
    }

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[test]
    fn data_url_loader_decodes_png() {
        let img = DataUrlLoader::decode(&png_data_url([10, 20, 30])).unwrap();
        assert_eq!((img.width(), img.height()), (4, 4));
    }

    #[test]
    fn data_url_loader_rejects_plain_urls() {
        assert!(matches!(
            DataUrlLoader::decode("https://example.org/a.png"),
            Err(ExportError::ImageLoad { .. })
        ));
    }

    #[test]
    fn page_size_follows_multiplier() {
        let page = Page::new(PageId::intern("raster_blank"), "Blank");
        let config = CanvasConfig::default();
        let r = SoftwareRasterizer::new(DataUrlLoader);
        let out = block_on(r.rasterize(&page, &config, 0.5)).unwrap();
        assert_eq!((out.width, out.height), (200, 283));
        assert!(out.to_data_url().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn background_and_image_are_painted() {
        let mut page = Page::new(PageId::intern("raster_img"), "Image");
        page.background = Color::from_rgb8(0, 0, 255);
        let mut img = Widget::with_defaults(WidgetId::intern("raster_img_w"), WidgetKind::Image);
        img.transform = bm_core::Transform::new(0.0, 0.0, 100.0, 100.0);
        img.content = Some(png_data_url([255, 0, 0]));
        page.widgets.push(img);

        let r = SoftwareRasterizer::new(DataUrlLoader).with_jpeg_quality(100);
        let out = block_on(r.rasterize(&page, &CanvasConfig::default(), 1.0)).unwrap();
        let rgb = out.decode().unwrap();

        let inside = rgb.get_pixel(50, 50).0;
        assert!(inside[0] > 200 && inside[2] < 60, "expected red, got {inside:?}");
        let outside = rgb.get_pixel(300, 400).0;
        assert!(outside[2] > 200 && outside[0] < 60, "expected blue, got {outside:?}");
    }

    #[test]
    fn broken_image_fails_the_page() {
        let mut page = Page::new(PageId::intern("raster_broken"), "Broken");
        let mut img = Widget::with_defaults(WidgetId::intern("raster_broken_w"), WidgetKind::Image);
        img.content = Some("data:image/png;base64,AAAA".into());
        page.widgets.push(img);
        let r = SoftwareRasterizer::new(DataUrlLoader);
        assert!(block_on(r.rasterize(&page, &CanvasConfig::default(), 1.0)).is_err());
    }

    #[test]
    fn garbage_font_is_refused() {
        assert!(matches!(
            SoftwareRasterizer::new(DataUrlLoader).with_font_bytes(vec![0; 16]),
            Err(ExportError::Font(_))
        ));
    }
}
