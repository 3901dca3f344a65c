// layout.rs - Preview Grid Layout
// Pure geometry for the search preview: canvas size, cell placement and the
// caption text drawn under each thumbnail. No pixels are touched here.
//
// Canvas layout (top to bottom):
//   title band  | page title, centred
//   row 0       | thumbnails (cell_height) + caption band (caption_height)
//   row 1 ...

use super::record::ThumbnailRecord;

/// Captions longer than this many characters are cut and get "..." appended
pub const CAPTION_LIMIT: usize = 13;

/// Vertical offset of the page title inside the title band
pub const TITLE_TOP_OFFSET: u32 = 20;

/// Gap between the bottom of a thumbnail and its first caption line
pub const CAPTION_TOP_OFFSET: u32 = 10;

/// Extra space between caption lines
pub const LINE_SPACING: u32 = 8;

/// Widest grid a request may ask for
pub const MAX_COLUMNS: u32 = 12;

/// Largest width or height a JPEG can store
pub const MAX_CANVAS_SIDE: u32 = 65535;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub cell_width: u32,
    pub cell_height: u32,
    pub caption_height: u32,
    pub title_height: u32,
    pub columns: u32,
}

/// Column/row of a cell in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPosition {
    pub column: u32,
    pub row: u32,
}

/// Everything needed to draw one cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellPlan {
    pub pid: u64,
    pub position: CellPosition,
    /// Top-left corner of the thumbnail
    pub origin: (u32, u32),
    /// Horizontal centre and top of the caption block
    pub caption_anchor: (u32, u32),
    pub caption: [String; 3],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridPlan {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub title_anchor: (u32, u32),
    pub cells: Vec<CellPlan>,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            cell_width: 250,
            cell_height: 250,
            caption_height: 100,
            title_height: 100,
            columns: 6,
        }
    }
}

impl GridLayout {
    pub fn with_columns(self, columns: u32) -> Self {
        Self { columns, ..self }
    }

    pub fn rows(&self, count: usize) -> u32 {
        u32::try_from(self.row_count(count)).unwrap_or(u32::MAX)
    }

    fn row_count(&self, count: usize) -> usize {
        let columns = self.columns.max(1) as usize;
        count / columns + usize::from(count % columns != 0)
    }

    /// Height of one grid row including its caption band
    pub fn row_stride(&self) -> u32 {
        self.cell_height.saturating_add(self.caption_height)
    }

    /// Canvas (width, height) for `count` thumbnails. Saturates at u32::MAX;
    /// use `encodable_canvas_size` to check a grid before drawing it.
    pub fn canvas_size(&self, count: usize) -> (u32, u32) {
        let width = self.cell_width.saturating_mul(self.columns);
        let height = self
            .title_height
            .saturating_add(self.rows(count).saturating_mul(self.row_stride()));
        (width, height)
    }

    /// Canvas (width, height), or None if it does not fit in a u32
    pub fn checked_canvas_size(&self, count: usize) -> Option<(u32, u32)> {
        let rows = u32::try_from(self.row_count(count)).ok()?;
        let stride = self.cell_height.checked_add(self.caption_height)?;
        let width = self.cell_width.checked_mul(self.columns)?;
        let height = rows.checked_mul(stride)?.checked_add(self.title_height)?;
        Some((width, height))
    }

    /// Canvas (width, height) if both sides stay within MAX_CANVAS_SIDE
    pub fn encodable_canvas_size(&self, count: usize) -> Option<(u32, u32)> {
        self.checked_canvas_size(count)
            .filter(|&(width, height)| width <= MAX_CANVAS_SIDE && height <= MAX_CANVAS_SIDE)
    }

    pub fn cell_position(&self, index: usize) -> CellPosition {
        let columns = self.columns.max(1) as usize;
        CellPosition {
            column: (index % columns) as u32,
            row: (index / columns) as u32,
        }
    }

    pub fn thumbnail_origin(&self, index: usize) -> (u32, u32) {
        let pos = self.cell_position(index);
        (
            pos.column * self.cell_width,
            self.title_height + pos.row * self.row_stride(),
        )
    }

    pub fn caption_anchor(&self, index: usize) -> (u32, u32) {
        let (x, y) = self.thumbnail_origin(index);
        (
            x + self.cell_width / 2,
            y + self.cell_height + CAPTION_TOP_OFFSET,
        )
    }

    pub fn caption_font_px(&self) -> f32 {
        (self.cell_width / 15) as f32
    }

    pub fn title_font_px(&self) -> f32 {
        (self.cell_width / 5) as f32
    }

    /// Lay out the given records in order. Records are expected to be the
    /// ones whose thumbnails actually loaded.
    pub fn plan<'a, I>(&self, title: &str, records: I) -> GridPlan
    where
        I: IntoIterator<Item = &'a ThumbnailRecord>,
    {
        let cells: Vec<CellPlan> = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| CellPlan {
                pid: record.id,
                position: self.cell_position(index),
                origin: self.thumbnail_origin(index),
                caption_anchor: self.caption_anchor(index),
                caption: caption_lines(record),
            })
            .collect();

        let (width, height) = self.canvas_size(cells.len());
        GridPlan {
            width,
            height,
            title: title.to_string(),
            title_anchor: (width / 2, TITLE_TOP_OFFSET),
            cells,
        }
    }
}

/// Cut text to CAPTION_LIMIT characters, appending "..." when it was longer
pub fn truncate_caption(text: &str) -> String {
    if text.chars().count() > CAPTION_LIMIT {
        let head: String = text.chars().take(CAPTION_LIMIT).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// The three caption lines drawn under a thumbnail
pub fn caption_lines(record: &ThumbnailRecord) -> [String; 3] {
    [
        format!("Pid: {}", record.id),
        truncate_caption(&record.title),
        truncate_caption(&record.author),
    ]
}
