use anyhow::{Context, bail};
use bm_core::model::WidgetKind;
use bm_core::ProjectDocument;
use bm_export::{
    BookletExporter, BookletRole, ExportConfig, FileLoader, PDF_FILE_NAME, RoleAssignment,
    SoftwareRasterizer,
};
use clap::Args;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct RoleArgs {
    /// Page number (1-based) printed as the cover
    #[arg(long, value_name = "N")]
    cover: Option<usize>,

    /// Page number printed as the back cover
    #[arg(long, value_name = "N")]
    back_cover: Option<usize>,

    /// Page number printed on the inner left half
    #[arg(long, value_name = "N")]
    inner_left: Option<usize>,

    /// Page number printed on the inner right half
    #[arg(long, value_name = "N")]
    inner_right: Option<usize>,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Saved project (`{ pages, config }` JSON)
    project: PathBuf,

    #[command(flatten)]
    roles: RoleArgs,

    /// TrueType/OpenType font for text widgets
    #[arg(long)]
    font: Option<PathBuf>,

    /// Export settings as JSON; missing keys keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    render: RenderArgs,

    /// Output PDF path
    #[arg(short, long, default_value = PDF_FILE_NAME)]
    output: PathBuf,
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    #[command(flatten)]
    render: RenderArgs,

    /// Directory the sheet images are written to
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Saved project (`{ pages, config }` JSON)
    project: PathBuf,
}

type Exporter = BookletExporter<SoftwareRasterizer<FileLoader>>;

pub async fn export(args: ExportArgs) -> anyhow::Result<()> {
    let (project, roles, exporter) = prepare(&args.render).await?;
    let pdf = exporter.export_pdf(&project, &roles).await?;
    tokio::fs::write(&args.output, &pdf)
        .await
        .with_context(|| format!("writing {}", args.output.display()))?;
    log::info!("wrote {} ({} bytes)", args.output.display(), pdf.len());
    Ok(())
}

pub async fn preview(args: PreviewArgs) -> anyhow::Result<()> {
    let (project, roles, exporter) = prepare(&args.render).await?;
    let preview = exporter.preview(&project, &roles).await?;
    tokio::fs::create_dir_all(&args.output).await?;
    for (i, sheet) in preview.sheets.sheets.iter().enumerate() {
        let path = args.output.join(format!("folha-{}.jpg", i + 1));
        tokio::fs::write(&path, &sheet.jpeg)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("wrote {} ({}x{})", path.display(), sheet.width, sheet.height);
    }
    Ok(())
}

pub fn inspect(args: InspectArgs) -> anyhow::Result<()> {
    let project = read_project(&args.project)?;
    println!(
        "{}: {} page(s), {}x{} canvas",
        args.project.display(),
        project.pages.len(),
        project.config.width,
        project.config.height
    );
    for (n, page) in project.pages.iter().enumerate() {
        let count = |kind| page.widgets.iter().filter(|w| w.kind == kind).count();
        println!(
            "  {:>2}. {:<20} {} text, {} image, {} line",
            n + 1,
            page.title,
            count(WidgetKind::Text),
            count(WidgetKind::Image),
            count(WidgetKind::Line)
        );
    }
    match RoleAssignment::from_pages(&project.pages) {
        Ok(_) => println!("ready for booklet export"),
        Err(e) => println!("not exportable: {e}"),
    }
    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────

async fn prepare(args: &RenderArgs) -> anyhow::Result<(ProjectDocument, RoleAssignment, Exporter)> {
    let project = read_project(&args.project)?;
    let roles = assign_roles(&project, &args.roles)?;

    let config = match &args.config {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<ExportConfig>(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => ExportConfig::default(),
    };

    // Relative image paths resolve next to the project file.
    let base = args.project.parent().unwrap_or(Path::new("."));
    let mut rasterizer =
        SoftwareRasterizer::new(FileLoader::new(base)).with_jpeg_quality(config.jpeg_quality());
    match &args.font {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            rasterizer = rasterizer.with_font_bytes(bytes)?;
        }
        None => log::warn!("no --font given; text widgets will be left out"),
    }
    Ok((project, roles, BookletExporter::new(rasterizer, config)))
}

fn read_project(path: &Path) -> anyhow::Result<ProjectDocument> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    ProjectDocument::from_json_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Default roles by page order, then the overrides.
fn assign_roles(project: &ProjectDocument, args: &RoleArgs) -> anyhow::Result<RoleAssignment> {
    let mut roles = RoleAssignment::from_pages(&project.pages)?;
    let overrides = [
        (BookletRole::Cover, args.cover),
        (BookletRole::BackCover, args.back_cover),
        (BookletRole::InnerLeft, args.inner_left),
        (BookletRole::InnerRight, args.inner_right),
    ];
    for (role, number) in overrides {
        let Some(n) = number else { continue };
        let Some(page) = n.checked_sub(1).and_then(|i| project.pages.get(i)) else {
            bail!("{role}: no page {n} (project has {})", project.pages.len());
        };
        roles.assign(role, page.id);
    }
    Ok(roles)
}
