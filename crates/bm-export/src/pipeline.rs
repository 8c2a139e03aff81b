//! Booklet export orchestration.

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::pdf::compose_booklet;
use crate::raster::{PageRasterizer, RenderedPage};
use crate::roles::{BookletRole, RoleAssignment, RoleMap};
use crate::sheet::{SheetPreview, compose_sheets};
use bm_core::ProjectDocument;
use std::sync::atomic::{AtomicBool, Ordering};

/// Preview images for the export dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct BookletPreview {
    pub pages: RoleMap<RenderedPage>,
    pub sheets: SheetPreview,
}

pub struct BookletExporter<R> {
    rasterizer: R,
    config: ExportConfig,
    busy: AtomicBool,
}

/// Clears the busy flag however the export ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<R: PageRasterizer> BookletExporter<R> {
    pub fn new(rasterizer: R, config: ExportConfig) -> Self {
        Self {
            rasterizer,
            config,
            busy: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Whether a final export is running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Rasterize the four role pages concurrently.
    pub async fn render_roles(
        &self,
        project: &ProjectDocument,
        roles: &RoleAssignment,
        multiplier: f32,
    ) -> Result<RoleMap<RenderedPage>, ExportError> {
        roles.validate(project)?;
        let render = |role: BookletRole| {
            let id = *roles.get(role);
            async move {
                let page = project.page(id).ok_or(ExportError::UnknownPage(id))?;
                self.rasterizer.rasterize(page, &project.config, multiplier).await
            }
        };
        let (cover, back_cover, inner_left, inner_right) = futures::try_join!(
            render(BookletRole::Cover),
            render(BookletRole::BackCover),
            render(BookletRole::InnerLeft),
            render(BookletRole::InnerRight),
        )?;
        Ok(RoleMap {
            cover,
            back_cover,
            inner_left,
            inner_right,
        })
    }

    /// Low-resolution pages and composed sheets for the dialog.
    pub async fn preview(
        &self,
        project: &ProjectDocument,
        roles: &RoleAssignment,
    ) -> Result<BookletPreview, ExportError> {
        let pages = self
            .render_roles(project, roles, self.config.preview_multiplier)
            .await?;
        let sheets = compose_sheets(&pages, self.config.jpeg_quality())?;
        Ok(BookletPreview { pages, sheets })
    }

    /// Render at print resolution and compose the two-sheet PDF.
    ///
    /// Refused with [`ExportError::Busy`] while another export runs.
    pub async fn export_pdf(
        &self,
        project: &ProjectDocument,
        roles: &RoleAssignment,
    ) -> Result<Vec<u8>, ExportError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("export requested while another is running");
            return Err(ExportError::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        let pages = self
            .render_roles(project, roles, self.config.final_multiplier)
            .await?;
        let pdf = compose_booklet(&pages)?;
        log::info!("booklet exported ({} bytes)", pdf.len());
        Ok(pdf)
    }
}
