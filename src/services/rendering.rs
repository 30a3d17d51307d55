use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use thiserror::Error;

use crate::core::config::Settings;
use crate::db::models::Material;
use crate::services::compiler::ExtractDescriptor;
use crate::services::regions::Rect;

#[derive(Debug, Error)]
pub(crate) enum RenderError {
    #[error("invalid file reference")]
    InvalidReference,
    #[error("path escapes configured root")]
    PathOutsideRoot,
    #[error("page {0} image not found")]
    MissingPage(u32),
    #[error("rectangle lies outside the page")]
    EmptyCrop,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("render task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Turns an extract into a displayable PNG.
#[async_trait]
pub(crate) trait PageRenderer: Send + Sync {
    async fn render(
        &self,
        material: &Material,
        extract: &ExtractDescriptor,
    ) -> Result<Vec<u8>, RenderError>;
}

/// Crops from pre-rasterized pages laid out as `<root>/<file_ref>/page-<n>.png`.
#[derive(Debug, Clone)]
pub(crate) struct PageImageRenderer {
    root: PathBuf,
}

impl PageImageRenderer {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub(crate) fn from_settings(settings: &Settings) -> Option<Self> {
        settings.rendering().page_images_root.as_ref().map(Self::new)
    }

    fn page_path(&self, file_ref: &str, page_number: u32) -> Result<PathBuf, RenderError> {
        let relative = sanitize_relative_path(file_ref)?;
        let root = std::fs::canonicalize(&self.root)?;
        let joined = root.join(relative).join(format!("page-{page_number}.png"));
        if !joined.exists() {
            return Err(RenderError::MissingPage(page_number));
        }
        let canonical = std::fs::canonicalize(joined)?;
        if !canonical.starts_with(&root) {
            return Err(RenderError::PathOutsideRoot);
        }
        Ok(canonical)
    }
}

#[async_trait]
impl PageRenderer for PageImageRenderer {
    async fn render(
        &self,
        material: &Material,
        extract: &ExtractDescriptor,
    ) -> Result<Vec<u8>, RenderError> {
        let renderer = self.clone();
        let file_ref = material.file_ref.clone();
        let page_number = extract.page_number;
        let rect = extract.rect;

        tokio::task::spawn_blocking(move || {
            let path = renderer.page_path(&file_ref, page_number)?;
            let page = image::open(path)?;
            crop_png(&page, &rect)
        })
        .await?
    }
}

pub(crate) fn sanitize_relative_path(raw: &str) -> Result<PathBuf, RenderError> {
    let normalized = raw.trim().replace('\\', "/").trim_start_matches('/').to_string();
    if normalized.is_empty() {
        return Err(RenderError::InvalidReference);
    }

    let path = Path::new(&normalized);
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(RenderError::InvalidReference);
            }
        }
    }

    Ok(path.to_path_buf())
}

/// Crops `rect` out of `page`, clamped to the page bounds, and encodes it as PNG.
pub(crate) fn crop_png(page: &DynamicImage, rect: &Rect) -> Result<Vec<u8>, RenderError> {
    let (width, height) = page.dimensions();
    let clamp = |value: f64, max: u32| value.max(0.0).min(f64::from(max)) as u32;

    let left = clamp(rect.x.floor(), width);
    let top = clamp(rect.y.floor(), height);
    let right = clamp((rect.x + rect.width).ceil(), width);
    let bottom = clamp((rect.y + rect.height).ceil(), height);
    if right <= left || bottom <= top {
        return Err(RenderError::EmptyCrop);
    }

    let cropped = page.crop_imm(left, top, right - left, bottom - top);
    let mut cursor = Cursor::new(Vec::new());
    cropped.write_to(&mut cursor, ImageOutputFormat::Png)?;
    Ok(cursor.into_inner())
}

pub(crate) fn png_data_url(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

#[derive(Debug, Clone)]
pub(crate) struct RenderedExtract {
    pub(crate) question_number: u32,
    pub(crate) page_number: u32,
    pub(crate) png: Vec<u8>,
}

/// Renders every extract in order. Failures are logged and reported back as
/// skipped question numbers so the rest of the note still shows.
pub(crate) async fn render_extracts(
    renderer: &dyn PageRenderer,
    material: &Material,
    extracts: &[ExtractDescriptor],
) -> (Vec<RenderedExtract>, Vec<u32>) {
    let mut rendered = Vec::with_capacity(extracts.len());
    let mut skipped = Vec::new();

    for extract in extracts {
        match renderer.render(material, extract).await {
            Ok(png) => rendered.push(RenderedExtract {
                question_number: extract.question_number,
                page_number: extract.page_number,
                png,
            }),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    material_id = %material.id,
                    question_number = extract.question_number,
                    page_number = extract.page_number,
                    "Failed to render extract"
                );
                skipped.push(extract.question_number);
            }
        }
    }

    (rendered, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;
    use image::{Rgb, RgbImage};

    fn page(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 0])
        }))
    }

    fn material(file_ref: &str) -> Material {
        Material {
            id: "doc-1".to_string(),
            class_name: "A1".to_string(),
            round_number: 1,
            title: None,
            page_count: 2,
            file_ref: file_ref.to_string(),
            is_active: true,
            regions_revision: 1,
            uploaded_at: primitive_now_utc(),
            superseded_at: None,
        }
    }

    fn extract(question_number: u32, page_number: u32, rect: Rect) -> ExtractDescriptor {
        ExtractDescriptor { question_number, material_id: "doc-1".to_string(), page_number, rect }
    }

    #[test]
    fn crop_returns_requested_area() {
        let png = crop_png(&page(100, 80), &Rect { x: 10.0, y: 20.0, width: 30.0, height: 15.0 })
            .expect("crop");
        let decoded = image::load_from_memory(&png).expect("decode");
        assert_eq!(decoded.dimensions(), (30, 15));
        assert_eq!(decoded.to_rgb8().get_pixel(0, 0), &Rgb([10, 20, 0]));
    }

    #[test]
    fn crop_is_clamped_to_page_bounds() {
        let png = crop_png(&page(50, 50), &Rect { x: 40.0, y: 45.0, width: 30.0, height: 30.0 })
            .expect("crop");
        let decoded = image::load_from_memory(&png).expect("decode");
        assert_eq!(decoded.dimensions(), (10, 5));

        let err = crop_png(&page(50, 50), &Rect { x: 60.0, y: 0.0, width: 5.0, height: 5.0 });
        assert!(matches!(err, Err(RenderError::EmptyCrop)));
    }

    #[test]
    fn sanitize_rejects_parent_components() {
        assert!(matches!(sanitize_relative_path("../etc"), Err(RenderError::InvalidReference)));
        assert!(matches!(sanitize_relative_path("  "), Err(RenderError::InvalidReference)));
        let path = sanitize_relative_path("/uploads\\round-3").expect("valid");
        assert_eq!(path.to_string_lossy(), "uploads/round-3");
    }

    #[test]
    fn data_url_has_png_prefix() {
        assert_eq!(png_data_url(b"abc"), "data:image/png;base64,YWJj");
    }

    #[tokio::test]
    async fn renderer_reads_page_images_from_root() {
        let root = std::env::temp_dir().join(format!("academy-notes-{}", uuid::Uuid::new_v4()));
        let doc_dir = root.join("round-1");
        std::fs::create_dir_all(&doc_dir).unwrap();
        page(60, 60).save(doc_dir.join("page-1.png")).unwrap();

        let renderer = PageImageRenderer::new(&root);
        let round_material = material("round-1");
        let extracts = vec![
            extract(2, 1, Rect { x: 0.0, y: 0.0, width: 20.0, height: 10.0 }),
            extract(5, 2, Rect { x: 0.0, y: 0.0, width: 20.0, height: 10.0 }),
        ];

        let (rendered, skipped) = render_extracts(&renderer, &round_material, &extracts).await;

        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].question_number, 2);
        assert_eq!(image::load_from_memory(&rendered[0].png).unwrap().dimensions(), (20, 10));
        assert_eq!(skipped, vec![5]);

        let escaped = renderer.render(&material("../outside"), &extracts[0]).await;
        assert!(matches!(escaped, Err(RenderError::InvalidReference)));

        std::fs::remove_dir_all(&root).ok();
    }
}
