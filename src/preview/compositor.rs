// compositor.rs - Preview Grid Compositor
// Draws the search preview: page title, thumbnails in a fixed grid and a
// three-line caption under each one, then saves the canvas as JPEG.
//
// All work here is CPU bound and synchronous. Callers on the async runtime
// run it through tokio::task::spawn_blocking (see preview/mod.rs).

use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::Local;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageOutputFormat, Rgb, RgbImage};
use log::{debug, info};
use uuid::Uuid;

use super::error::{CompositionError, PreviewError};
use super::layout::{GridLayout, GridPlan, LINE_SPACING};
use super::record::LoadedThumbnail;
use super::text::{CaptionFont, TEXT_COLOR};
use crate::config::PreviewConfig;

/// Sub-folder of the temp path that holds generated previews
pub const PREVIEW_FOLDER: &str = "pixiv_search_thumb";

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const JPEG_QUALITY: u8 = 90;

#[derive(Debug)]
pub struct GridCompositor {
    font: CaptionFont,
    layout: GridLayout,
    tmp_path: PathBuf,
}

impl GridCompositor {
    pub fn new(font: CaptionFont, layout: GridLayout, tmp_path: impl Into<PathBuf>) -> Self {
        Self {
            font,
            layout,
            tmp_path: tmp_path.into(),
        }
    }

    /// Build the compositor from configuration, loading the font up front
    pub fn from_config(config: &PreviewConfig) -> Result<Self, PreviewError> {
        let font = CaptionFont::load(&config.font_path)?;
        info!("Loaded preview font from {}", config.font_path.display());
        Ok(Self::new(font, config.layout(), config.tmp_path.clone()))
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn output_dir(&self) -> PathBuf {
        self.tmp_path.join(PREVIEW_FOLDER)
    }

    /// Draw the preview canvas in memory
    pub fn render(
        &self,
        title: &str,
        thumbnails: &[LoadedThumbnail],
        columns: u32,
    ) -> Result<RgbImage, CompositionError> {
        let layout = self.layout.with_columns(columns);
        if layout.encodable_canvas_size(thumbnails.len()).is_none() {
            return Err(CompositionError::CanvasTooLarge {
                cells: thumbnails.len(),
                columns,
            });
        }
        let plan = layout.plan(title, thumbnails.iter().map(|t| &t.record));
        debug!(
            "Rendering {}x{} preview with {} cells",
            plan.width,
            plan.height,
            plan.cells.len()
        );

        let mut canvas = RgbImage::from_pixel(plan.width, plan.height, BACKGROUND);
        self.draw_title(&mut canvas, &plan, &layout);

        for (cell, thumbnail) in plan.cells.iter().zip(thumbnails) {
            let decoded = image::load_from_memory(&thumbnail.bytes).map_err(|source| {
                CompositionError::Decode {
                    pid: thumbnail.record.id,
                    source,
                }
            })?;
            let tile = fit_to_cell(decoded, layout.cell_width, layout.cell_height);
            imageops::replace(&mut canvas, &tile, cell.origin.0 as i64, cell.origin.1 as i64);

            self.font.draw_multiline(
                &mut canvas,
                &cell.caption,
                cell.caption_anchor.0 as f32,
                cell.caption_anchor.1 as f32,
                layout.caption_font_px(),
                LINE_SPACING as f32,
                TEXT_COLOR,
            );
        }

        Ok(canvas)
    }

    /// Render, encode and save the preview. Returns the written file.
    pub fn compose(
        &self,
        title: &str,
        thumbnails: &[LoadedThumbnail],
        columns: u32,
    ) -> Result<PathBuf, CompositionError> {
        let canvas = self.render(title, thumbnails, columns)?;
        let encoded = encode_jpeg(canvas)?;

        let dir = self.output_dir();
        std::fs::create_dir_all(&dir).map_err(|source| CompositionError::Io {
            path: dir.clone(),
            source,
        })?;
        let path = dir.join(preview_file_name());
        write_atomically(&path, &encoded)?;

        info!("Saved search preview to {}", path.display());
        Ok(path)
    }

    fn draw_title(&self, canvas: &mut RgbImage, plan: &GridPlan, layout: &GridLayout) {
        self.font.draw_line(
            canvas,
            &plan.title,
            plan.title_anchor.0 as f32,
            plan.title_anchor.1 as f32,
            layout.title_font_px(),
            TEXT_COLOR,
        );
    }
}

/// Resize to exactly the cell box; aspect ratio is not kept
fn fit_to_cell(image: DynamicImage, width: u32, height: u32) -> RgbImage {
    if image.dimensions() == (width, height) {
        image.to_rgb8()
    } else {
        image.resize_exact(width, height, FilterType::Triangle).to_rgb8()
    }
}

fn encode_jpeg(canvas: RgbImage) -> Result<Vec<u8>, CompositionError> {
    let mut encoded = Vec::new();
    DynamicImage::ImageRgb8(canvas)
        .write_to(&mut Cursor::new(&mut encoded), ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .map_err(CompositionError::Encode)?;
    Ok(encoded)
}

fn preview_file_name() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!(
        "preview_search_{}_{}.jpg",
        Local::now().format("%Y-%m-%d-%H-%M-%S"),
        &id[..8]
    )
}

// Write to a sibling temp file and rename, so a failed write never leaves
// a truncated preview behind.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), CompositionError> {
    let partial = path.with_extension("jpg.part");
    let result = std::fs::write(&partial, bytes).and_then(|_| std::fs::rename(&partial, path));
    if let Err(source) = result {
        let _ = std::fs::remove_file(&partial);
        return Err(CompositionError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::record::ThumbnailRecord;
    use crate::preview::testing::{color_for, solid_png};
    use crate::preview::text::tests::test_font;

    fn loaded(ids: &[u64], size: (u32, u32)) -> Vec<LoadedThumbnail> {
        ids.iter()
            .map(|&id| LoadedThumbnail {
                record: ThumbnailRecord::new(id, "title", "author", "x.png"),
                bytes: solid_png(size.0, size.1, color_for(id)),
            })
            .collect()
    }

    fn compositor(tmp: &Path) -> GridCompositor {
        GridCompositor::new(test_font(), GridLayout::default(), tmp)
    }

    fn assert_close(actual: &Rgb<u8>, expected: Rgb<u8>) {
        for c in 0..3 {
            let diff = (actual.0[c] as i32 - expected.0[c] as i32).abs();
            assert!(diff <= 12, "pixel {:?} differs from {:?}", actual, expected);
        }
    }

    #[test]
    fn test_render_canvas_size() {
        let dir = tempfile::tempdir().unwrap();
        let compositor = compositor(dir.path());

        let canvas = compositor.render("Pixiv - test", &loaded(&[1, 2, 3, 4, 5, 6, 7], (250, 250)), 6).unwrap();
        assert_eq!(canvas.dimensions(), (1500, 100 + 2 * 350));

        let canvas = compositor.render("Pixiv - test", &loaded(&[1, 2, 3], (250, 250)), 3).unwrap();
        assert_eq!(canvas.dimensions(), (750, 450));
    }

    #[test]
    fn test_render_places_thumbnails_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let compositor = compositor(dir.path());
        let ids = [10, 11, 12, 13, 14];
        let canvas = compositor.render("grid", &loaded(&ids, (250, 250)), 2).unwrap();

        let layout = compositor.layout().with_columns(2);
        for (index, id) in ids.iter().enumerate() {
            let (x, y) = layout.thumbnail_origin(index);
            assert_close(canvas.get_pixel(x + 125, y + 125), color_for(*id));
        }
        // third row has only one cell; its right neighbour stays blank
        let (x, y) = layout.thumbnail_origin(5);
        assert_close(canvas.get_pixel(x + 125, y + 125), BACKGROUND);
    }

    #[test]
    fn test_render_resizes_odd_sized_thumbnails() {
        let dir = tempfile::tempdir().unwrap();
        let compositor = compositor(dir.path());
        let canvas = compositor.render("resize", &loaded(&[3], (100, 400)), 6).unwrap();

        // the tile covers the whole cell box, corners included
        assert_close(canvas.get_pixel(2, 102), color_for(3));
        assert_close(canvas.get_pixel(247, 347), color_for(3));
        assert_close(canvas.get_pixel(255, 200), BACKGROUND);
    }

    #[test]
    fn test_render_draws_title_and_captions() {
        let dir = tempfile::tempdir().unwrap();
        let compositor = compositor(dir.path());
        let canvas = compositor.render("Pixiv - cats", &loaded(&[1], (250, 250)), 1).unwrap();

        let dark_in = |y0: u32, y1: u32| {
            (y0..y1).any(|y| (0..canvas.width()).any(|x| canvas.get_pixel(x, y).0[0] < 100))
        };
        assert!(dark_in(0, 100), "title band is empty");
        assert!(dark_in(350, 450), "caption band is empty");
    }

    #[test]
    fn test_render_corrupt_thumbnail_fails() {
        let dir = tempfile::tempdir().unwrap();
        let compositor = compositor(dir.path());
        let mut thumbs = loaded(&[1, 2], (250, 250));
        thumbs[1].bytes = b"garbage".to_vec();

        match compositor.render("bad", &thumbs, 6) {
            Err(CompositionError::Decode { pid, .. }) => assert_eq!(pid, 2),
            other => panic!("expected decode error, got {:?}", other.map(|c| c.dimensions())),
        }
    }

    #[test]
    fn test_render_rejects_oversized_canvas() {
        let dir = tempfile::tempdir().unwrap();
        let tall = GridLayout {
            cell_height: 40_000,
            ..GridLayout::default()
        };
        let compositor = GridCompositor::new(test_font(), tall, dir.path());

        match compositor.render("tall", &loaded(&[1, 2], (8, 8)), 1) {
            Err(CompositionError::CanvasTooLarge { cells, columns }) => assert_eq!((cells, columns), (2, 1)),
            other => panic!("expected size error, got {:?}", other.map(|c| c.dimensions())),
        }
    }

    #[test]
    fn test_compose_writes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let compositor = compositor(dir.path());
        let path = compositor.compose("Pixiv - test", &loaded(&[1, 2, 3, 4, 5, 6, 7, 8], (250, 250)), 6).unwrap();

        assert!(path.starts_with(dir.path().join(PREVIEW_FOLDER)));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("preview_search_") && name.ends_with(".jpg"), "{}", name);

        let reopened = image::open(&path).unwrap();
        assert_eq!(reopened.dimensions(), (1500, 800));

        // no leftover partial files
        let leftovers = std::fs::read_dir(dir.path().join(PREVIEW_FOLDER))
            .unwrap()
            .filter(|e| e.as_ref().unwrap().path().extension().map_or(false, |x| x == "part"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_compose_io_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // tmp path is a regular file, so the preview folder cannot be created
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let compositor = compositor(&blocker);

        let result = compositor.compose("x", &loaded(&[1], (250, 250)), 6);
        assert!(matches!(result, Err(CompositionError::Io { .. })));
    }

    #[test]
    fn test_preview_file_names_are_unique() {
        assert_ne!(preview_file_name(), preview_file_name());
    }
}
