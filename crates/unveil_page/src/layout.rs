//! Stacked document layout
//!
//! Sections are stacked top to bottom at full content width. Inside a section
//! the heading (if the section has one) comes first, then each block; grid
//! blocks place their items in rows of `columns` equal cells.

use crate::config::{BlockConfig, PageConfig};
use unveil_core::Rect;

/// Height of the image frame at the top of a grid item
pub const ITEM_IMAGE_HEIGHT: f32 = 192.0;

/// Height of the level bar track along the bottom of a grid item
pub const LEVEL_BAR_HEIGHT: f32 = 8.0;

#[derive(Clone, Debug, PartialEq)]
pub struct PageLayout {
    pub sections: Vec<SectionLayout>,
    pub height: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SectionLayout {
    pub rect: Rect,
    pub heading: Option<Rect>,
    pub blocks: Vec<BlockLayout>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlockLayout {
    pub rect: Rect,
    pub items: Vec<Rect>,
}

impl PageLayout {
    pub fn compute(config: &PageConfig) -> Self {
        let layout = &config.layout;
        let mut y = 0.0;

        let sections = config
            .sections
            .iter()
            .map(|section| {
                let top = y;
                let heading = section.has_heading().then(|| {
                    Rect::new(0.0, top + layout.section_padding, layout.width, layout.heading_height)
                });
                let mut cursor = match heading {
                    Some(heading) => heading.bottom() + layout.gap,
                    None => top + layout.section_padding,
                };

                let blocks = section
                    .blocks
                    .iter()
                    .map(|block| {
                        let placed = place_block(block, cursor, layout.width, layout.gap);
                        cursor = placed.rect.bottom() + layout.gap;
                        placed
                    })
                    .collect();

                let bottom = if section.blocks.is_empty() && heading.is_none() {
                    cursor + layout.section_padding
                } else {
                    cursor - layout.gap + layout.section_padding
                };
                y = bottom;
                SectionLayout {
                    rect: Rect::new(0.0, top, layout.width, bottom - top),
                    heading,
                    blocks,
                }
            })
            .collect();

        Self { sections, height: y }
    }

    /// Largest scroll offset that still fills the viewport
    pub fn max_scroll(&self, viewport_height: f32) -> f32 {
        (self.height - viewport_height).max(0.0)
    }
}

fn place_block(block: &BlockConfig, top: f32, width: f32, gap: f32) -> BlockLayout {
    if block.items.is_empty() {
        return BlockLayout {
            rect: Rect::new(0.0, top, width, block.height),
            items: Vec::new(),
        };
    }

    let columns = block.columns.max(1);
    let cell_width = ((width - gap * (columns - 1) as f32) / columns as f32).max(0.0);

    let mut items = Vec::with_capacity(block.items.len());
    let mut row_top = top;
    for row in block.items.chunks(columns) {
        let mut row_height: f32 = 0.0;
        for (column, item) in row.iter().enumerate() {
            let x = column as f32 * (cell_width + gap);
            items.push(Rect::new(x, row_top, cell_width, item.height));
            row_height = row_height.max(item.height);
        }
        row_top += row_height + gap;
    }

    let grid_height = row_top - gap - top;
    BlockLayout {
        rect: Rect::new(0.0, top, width, grid_height.max(block.height)),
        items,
    }
}

/// Image frame inside a grid item
pub fn item_image_rect(item: &Rect) -> Rect {
    Rect::new(item.x, item.y, item.width, item.height.min(ITEM_IMAGE_HEIGHT))
}

/// Level bar track inside a grid item
pub fn item_bar_rect(item: &Rect) -> Rect {
    let height = item.height.min(LEVEL_BAR_HEIGHT);
    Rect::new(item.x, item.bottom() - height, item.width, height)
}
