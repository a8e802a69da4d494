//! Page composition
//!
//! A [`Page`] mounts every section, block and grid item of a [`PageConfig`]
//! onto a [`Stage`], wraps each in a one-shot reveal, and gives every image
//! its own progressive loader. The page owns the stage so the components are
//! always torn down before it.

use crate::config::{BlockConfig, ImageConfig, PageConfig};
use crate::error::{PageError, Result};
use crate::layout::{item_bar_rect, item_image_rect, PageLayout};
use crate::scroll::{anchor_offset, ScrollToTop};
use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;
use unveil_animation::{
    Easing, RevealAnimator, RevealConfig, RevealPreset, RevealTransition, VisualState,
};
use unveil_core::{ElementId, Rect, Stage, StageHandle, Threshold};
use unveil_image::{LoadState, ProgressiveImageLoader};
use unveil_theme::{ColorScheme, ThemeState, ThemedAsset};

/// How long a loaded image takes to fade in
pub const IMAGE_FADE_MS: u32 = 500;

/// Level bars start filling this long after their track comes into view
pub const LEVEL_BAR_DELAY_MS: u64 = 200;

/// How long a level bar takes to fill
pub const LEVEL_BAR_DURATION_MS: u32 = 1000;

/// An image slot whose source follows the color scheme
struct LazyImage {
    asset: ThemedAsset,
    element: ElementId,
    threshold: Threshold,
    loader: ProgressiveImageLoader,
    ready_at: Rc<Cell<Option<u64>>>,
}

impl LazyImage {
    fn new(
        stage: &StageHandle,
        element: ElementId,
        config: &ImageConfig,
        scheme: ColorScheme,
        threshold: Threshold,
    ) -> Self {
        let asset = config.asset();
        let ready_at = Rc::new(Cell::new(None));
        let loader = Self::loader(stage, element, asset.select(scheme), threshold, &ready_at);
        Self {
            asset,
            element,
            threshold,
            loader,
            ready_at,
        }
    }

    fn loader(
        stage: &StageHandle,
        element: ElementId,
        url: &str,
        threshold: Threshold,
        ready_at: &Rc<Cell<Option<u64>>>,
    ) -> ProgressiveImageLoader {
        let loader = ProgressiveImageLoader::with_threshold(stage, Some(element), url, threshold);

        let clock = stage.clone();
        let ready_at = ready_at.clone();
        loader.on_change(move |state| {
            if state == LoadState::Ready {
                ready_at.set(clock.now_ms());
            }
        });
        loader
    }

    /// Swap to the variant for `scheme`. Returns whether the source changed.
    fn apply_scheme(&mut self, stage: &StageHandle, scheme: ColorScheme) -> bool {
        let url = self.asset.select(scheme);
        if url == self.loader.source_url() {
            return false;
        }

        // Release the old observation before the new loader watches the same element
        self.loader.dispose();
        self.ready_at.set(None);
        self.loader = Self::loader(stage, self.element, url, self.threshold, &self.ready_at);
        true
    }

    fn snapshot(&self, now_ms: u64) -> ImageSnapshot {
        let fade = RevealTransition::new(RevealPreset::Fade, IMAGE_FADE_MS);
        let elapsed = self.ready_at.get().map(|at| now_ms.saturating_sub(at));
        ImageSnapshot {
            state: self.loader.state().as_str(),
            source: self.loader.current_render_source().to_string(),
            blurred: self.loader.is_blurred(),
            opacity: fade.sample(elapsed).opacity,
        }
    }
}

/// A proficiency bar that fills from zero to its level, once
struct LevelBar {
    level: u8,
    element: ElementId,
    fill: RevealAnimator,
}

impl LevelBar {
    /// Filled width in percent of the track
    fn width_at(&self, now_ms: u64) -> f32 {
        f32::from(self.level) * self.fill.progress_at(now_ms)
    }
}

struct MountedItem {
    label: String,
    element: ElementId,
    reveal: RevealAnimator,
    image: Option<LazyImage>,
    bar: Option<LevelBar>,
}

struct MountedBlock {
    label: String,
    element: ElementId,
    reveal: RevealAnimator,
    image: Option<LazyImage>,
    items: Vec<MountedItem>,
}

struct MountedSection {
    id: String,
    rect: Rect,
    element: ElementId,
    heading: Option<(ElementId, RevealAnimator)>,
    blocks: Vec<MountedBlock>,
}

/// What kind of node a snapshot entry describes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Heading,
    Block,
    Item,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImageSnapshot {
    pub state: &'static str,
    pub source: String,
    pub blurred: bool,
    pub opacity: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntrySnapshot {
    /// `section/block/item` path
    pub path: String,
    pub kind: EntryKind,
    pub revealed: bool,
    pub revealed_at: Option<u64>,
    pub opacity: f32,
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSnapshot>,
    /// Level bar fill in percent of its track
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_width: Option<f32>,
}

impl EntrySnapshot {
    fn new(path: String, kind: EntryKind, reveal: &RevealAnimator, now_ms: u64) -> Self {
        let VisualState {
            opacity,
            translate_x,
            translate_y,
            scale,
        } = reveal.visual_at(now_ms);
        Self {
            path,
            kind,
            revealed: reveal.is_revealed(),
            revealed_at: reveal.revealed_at(),
            opacity,
            translate_x,
            translate_y,
            scale,
            image: None,
            bar_width: None,
        }
    }
}

/// Everything a renderer needs to draw the page at one instant
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageSnapshot {
    pub time_ms: u64,
    pub scroll_y: f32,
    pub scheme: ColorScheme,
    pub scroll_to_top_visible: bool,
    pub entries: Vec<EntrySnapshot>,
}

impl PageSnapshot {
    pub fn entry(&self, path: &str) -> Option<&EntrySnapshot> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn revealed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.revealed).count()
    }
}

/// A mounted page
pub struct Page {
    config: PageConfig,
    layout: PageLayout,
    scheme: ColorScheme,
    sections: Vec<MountedSection>,
    scroll_top: ScrollToTop,
    disposed: bool,
    // Last, so components detach before the stage goes away
    stage: Stage,
}

impl Page {
    /// Mount `config` on `stage` using the theme's current scheme
    ///
    /// Elements already in view are reported at the end of mounting.
    pub fn mount(stage: Stage, config: PageConfig, theme: &ThemeState) -> Result<Self> {
        config.validate()?;
        let threshold = config.threshold()?;
        let scheme = theme.scheme();
        let layout = PageLayout::compute(&config);

        stage.set_viewport(Rect::new(
            0.0,
            0.0,
            config.layout.width,
            config.layout.viewport_height,
        ));

        let handle = stage.handle();
        let reveal = &config.reveal;
        let base = RevealConfig::new()
            .threshold(threshold)
            .duration(reveal.duration_ms)
            .preset(RevealPreset::FadeUp {
                distance: reveal.distance,
            });

        let bar_fill = base
            .preset(RevealPreset::Fade)
            .delay(LEVEL_BAR_DELAY_MS)
            .duration(LEVEL_BAR_DURATION_MS)
            .easing(Easing::EaseOut);

        let mut sections = Vec::with_capacity(config.sections.len());
        for (section, placed) in config.sections.iter().zip(&layout.sections) {
            let element = stage.mount(placed.rect);
            let heading = placed.heading.map(|rect| {
                let heading_element = stage.mount(rect);
                (heading_element, base.build(&handle, Some(heading_element)))
            });

            let blocks = section
                .blocks
                .iter()
                .zip(&placed.blocks)
                .map(|(block, block_layout)| {
                    let element = stage.mount(block_layout.rect);
                    let block_reveal = block_reveal_config(base, block, reveal.distance);
                    let image = block.image.as_ref().map(|image| {
                        let frame = stage.mount(block_layout.rect);
                        LazyImage::new(&handle, frame, image, scheme, threshold)
                    });

                    let delays = block.stagger(reveal.stagger_interval_ms).delays(block.items.len());
                    let items = block
                        .items
                        .iter()
                        .zip(&block_layout.items)
                        .zip(delays)
                        .map(|((item, rect), delay)| {
                            let element = stage.mount(*rect);
                            let motion = item.motion.unwrap_or(block.motion);
                            let item_reveal = base.preset(motion.preset(reveal.distance)).delay(delay);
                            let image = item.image.as_ref().map(|image| {
                                let frame = stage.mount(item_image_rect(rect));
                                LazyImage::new(&handle, frame, image, scheme, threshold)
                            });
                            let bar = item.level.map(|level| {
                                let track = stage.mount(item_bar_rect(rect));
                                LevelBar {
                                    level,
                                    element: track,
                                    fill: bar_fill.build(&handle, Some(track)),
                                }
                            });
                            MountedItem {
                                label: item.label.clone(),
                                element,
                                reveal: item_reveal.build(&handle, Some(element)),
                                image,
                                bar,
                            }
                        })
                        .collect();

                    MountedBlock {
                        label: block.label.clone(),
                        element,
                        reveal: block_reveal.build(&handle, Some(element)),
                        image,
                        items,
                    }
                })
                .collect();

            sections.push(MountedSection {
                id: section.id.clone(),
                rect: placed.rect,
                element,
                heading,
                blocks,
            });
        }

        tracing::debug!(
            sections = sections.len(),
            height = layout.height,
            %scheme,
            "page mounted"
        );

        let page = Self {
            scroll_top: ScrollToTop::new(config.scroll.scroll_top_after),
            config,
            layout,
            scheme,
            sections,
            disposed: false,
            stage,
        };
        page.stage.flush();
        Ok(page)
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn scheme(&self) -> ColorScheme {
        self.scheme
    }

    pub fn scroll_y(&self) -> f32 {
        self.stage.scroll_y()
    }

    /// Scroll to `y`, clamped to the document
    pub fn scroll_to(&mut self, y: f32) {
        let max = self.layout.max_scroll(self.config.layout.viewport_height);
        let y = y.clamp(0.0, max);
        self.stage.scroll_to(y);
        self.scroll_top.update(y);
    }

    pub fn scroll_by(&mut self, dy: f32) {
        self.scroll_to(self.scroll_y() + dy);
    }

    /// What the scroll-to-top button does
    pub fn scroll_to_top(&mut self) {
        self.scroll_to(self.scroll_top.target());
    }

    pub fn scroll_to_top_visible(&self) -> bool {
        self.scroll_top.is_visible()
    }

    /// Scroll offset that lands a section just below the nav bar
    pub fn section_offset(&self, id: &str) -> Option<f32> {
        self.sections
            .iter()
            .find(|s| s.id == id)
            .map(|s| anchor_offset(s.rect.y, self.config.scroll.nav_height))
    }

    /// Follow an in-page anchor link. Returns the resulting scroll offset.
    pub fn scroll_to_section(&mut self, id: &str) -> Result<f32> {
        let offset = self
            .section_offset(id)
            .ok_or_else(|| PageError::UnknownSection(id.to_string()))?;
        self.scroll_to(offset);
        Ok(self.scroll_y())
    }

    pub fn advance(&self, ms: u64) {
        self.stage.advance(ms);
    }

    pub fn now_ms(&self) -> u64 {
        self.stage.now_ms()
    }

    /// Switch themed images to the variant for `scheme`
    ///
    /// Returns how many images changed source.
    pub fn apply_scheme(&mut self, scheme: ColorScheme) -> usize {
        if self.disposed || scheme == self.scheme {
            return 0;
        }
        self.scheme = scheme;

        let handle = self.stage.handle();
        let mut switched = 0;
        for image in self.images_mut() {
            if image.apply_scheme(&handle, scheme) {
                switched += 1;
            }
        }
        tracing::debug!(%scheme, switched, "page scheme applied");

        self.stage.flush();
        switched
    }

    fn images_mut(&mut self) -> impl Iterator<Item = &mut LazyImage> + '_ {
        self.sections.iter_mut().flat_map(|section| {
            section.blocks.iter_mut().flat_map(|block| {
                block
                    .image
                    .iter_mut()
                    .chain(block.items.iter_mut().filter_map(|item| item.image.as_mut()))
            })
        })
    }

    /// Collect the render state of every heading, block and item
    pub fn snapshot(&self, now_ms: u64) -> PageSnapshot {
        let mut entries = Vec::new();
        for section in &self.sections {
            if let Some((_, heading)) = &section.heading {
                entries.push(EntrySnapshot::new(
                    section.id.clone(),
                    EntryKind::Heading,
                    heading,
                    now_ms,
                ));
            }

            for block in &section.blocks {
                let path = format!("{}/{}", section.id, block.label);
                let mut entry = EntrySnapshot::new(path.clone(), EntryKind::Block, &block.reveal, now_ms);
                entry.image = block.image.as_ref().map(|image| image.snapshot(now_ms));
                entries.push(entry);

                for item in &block.items {
                    let mut entry = EntrySnapshot::new(
                        format!("{path}/{}", item.label),
                        EntryKind::Item,
                        &item.reveal,
                        now_ms,
                    );
                    entry.image = item.image.as_ref().map(|image| image.snapshot(now_ms));
                    entry.bar_width = item.bar.as_ref().map(|bar| bar.width_at(now_ms));
                    entries.push(entry);
                }
            }
        }

        PageSnapshot {
            time_ms: now_ms,
            scroll_y: self.scroll_y(),
            scheme: self.scheme,
            scroll_to_top_visible: self.scroll_top.is_visible(),
            entries,
        }
    }

    /// Cancel every pending reveal and image listener. Idempotent.
    pub fn dispose(&mut self) {
        if std::mem::replace(&mut self.disposed, true) {
            return;
        }
        for section in &mut self.sections {
            if let Some((_, heading)) = &mut section.heading {
                heading.dispose();
            }
            for block in &mut section.blocks {
                block.reveal.dispose();
                if let Some(image) = &mut block.image {
                    image.loader.dispose();
                }
                for item in &mut block.items {
                    item.reveal.dispose();
                    if let Some(image) = &mut item.image {
                        image.loader.dispose();
                    }
                    if let Some(bar) = &mut item.bar {
                        bar.fill.dispose();
                    }
                }
            }
        }
        tracing::debug!("page disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Dispose the page, remove its elements and hand the stage back
    pub fn unmount(mut self) -> Stage {
        self.dispose();

        let mut elements = Vec::new();
        for section in &self.sections {
            elements.push(section.element);
            elements.extend(section.heading.as_ref().map(|(element, _)| *element));
            for block in &section.blocks {
                elements.push(block.element);
                elements.extend(block.image.as_ref().map(|image| image.element));
                for item in &block.items {
                    elements.push(item.element);
                    elements.extend(item.image.as_ref().map(|image| image.element));
                    elements.extend(item.bar.as_ref().map(|bar| bar.element));
                }
            }
        }
        for element in elements {
            self.stage.unmount(element);
        }

        let Page { stage, .. } = self;
        stage
    }
}

fn block_reveal_config(base: RevealConfig, block: &BlockConfig, distance: f32) -> RevealConfig {
    let distance = block.distance.unwrap_or(distance);
    let config = base.preset(block.motion.preset(distance)).delay(block.delay_ms);
    match block.duration_ms {
        Some(duration) => config.duration(duration),
        None => config,
    }
}
