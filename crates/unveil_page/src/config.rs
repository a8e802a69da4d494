//! Page configuration (page.toml)
//!
//! Describes the sections of a long page, the blocks inside each section and
//! how they enter. Every numeric knob has a default, so a minimal file only
//! lists sections:
//!
//! ```toml
//! [[section]]
//! id = "about"
//! title = "About Me"
//!
//! [[section.block]]
//! label = "portrait"
//! delay_ms = 100
//! image = { url = "img/light.png", dark_url = "img/dark.png" }
//! ```

use crate::error::{PageError, Result};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use unveil_animation::{RevealPreset, StaggerGroup};
use unveil_core::Threshold;
use unveil_image::ImageSource;
use unveil_theme::ThemedAsset;

/// Top-level page configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PageConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub reveal: RevealSettings,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default, rename = "section")]
    pub sections: Vec<SectionConfig>,
}

fn default_title() -> String {
    "Portfolio".to_string()
}

/// Document geometry
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LayoutConfig {
    /// Content width in pixels
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f32,
    /// Space above and below each section's content
    #[serde(default = "default_section_padding")]
    pub section_padding: f32,
    #[serde(default = "default_heading_height")]
    pub heading_height: f32,
    /// Vertical space between blocks, and between grid cells
    #[serde(default = "default_gap")]
    pub gap: f32,
}

fn default_width() -> f32 {
    1280.0
}

fn default_viewport_height() -> f32 {
    720.0
}

fn default_section_padding() -> f32 {
    80.0
}

fn default_heading_height() -> f32 {
    64.0
}

fn default_gap() -> f32 {
    32.0
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            viewport_height: default_viewport_height(),
            section_padding: default_section_padding(),
            heading_height: default_heading_height(),
            gap: default_gap(),
        }
    }
}

/// Defaults shared by every reveal on the page
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RevealSettings {
    /// Visible fraction that counts as "entered"
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default = "default_duration")]
    pub duration_ms: u32,
    /// Offset of the default fade-up motion
    #[serde(default = "default_distance")]
    pub distance: f32,
    /// Delay between siblings in a grid
    #[serde(default = "default_stagger_interval")]
    pub stagger_interval_ms: u64,
}

fn default_threshold() -> f32 {
    0.1
}

fn default_duration() -> u32 {
    500
}

fn default_distance() -> f32 {
    20.0
}

fn default_stagger_interval() -> u64 {
    100
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            duration_ms: default_duration(),
            distance: default_distance(),
            stagger_interval_ms: default_stagger_interval(),
        }
    }
}

/// Navigation and scroll affordances
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScrollConfig {
    /// Height of the fixed navigation bar; anchors land just below it
    #[serde(default = "default_nav_height")]
    pub nav_height: f32,
    /// Scroll offset past which the scroll-to-top button shows
    #[serde(default = "default_scroll_top_after")]
    pub scroll_top_after: f32,
}

fn default_nav_height() -> f32 {
    64.0
}

fn default_scroll_top_after() -> f32 {
    300.0
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            nav_height: default_nav_height(),
            scroll_top_after: default_scroll_top_after(),
        }
    }
}

/// One anchored section of the page
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SectionConfig {
    pub id: String,
    /// Heading text; a section with an empty title has no heading
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "block")]
    pub blocks: Vec<BlockConfig>,
}

/// A revealed block of content inside a section
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BlockConfig {
    pub label: String,
    #[serde(default)]
    pub delay_ms: u64,
    /// Height when the block has no grid items
    #[serde(default = "default_block_height")]
    pub height: f32,
    #[serde(default)]
    pub motion: Motion,
    /// Overrides the page-wide reveal duration
    #[serde(default)]
    pub duration_ms: Option<u32>,
    /// Overrides the page-wide motion distance
    #[serde(default)]
    pub distance: Option<f32>,
    #[serde(default)]
    pub image: Option<ImageConfig>,
    /// Grid children, revealed with a stagger once the block enters
    #[serde(default, rename = "item")]
    pub items: Vec<ItemConfig>,
    #[serde(default = "default_columns")]
    pub columns: usize,
    /// Delay before the first grid child
    #[serde(default)]
    pub stagger_base_ms: u64,
}

fn default_block_height() -> f32 {
    160.0
}

fn default_columns() -> usize {
    1
}

/// A grid child of a block
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ItemConfig {
    pub label: String,
    #[serde(default = "default_item_height")]
    pub height: f32,
    #[serde(default)]
    pub motion: Option<Motion>,
    #[serde(default)]
    pub image: Option<ImageConfig>,
    /// Proficiency in percent, drawn as a bar that fills once in view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

fn default_item_height() -> f32 {
    120.0
}

/// An image with an optional dark-scheme variant
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_url: Option<String>,
}

impl ImageConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            dark_url: None,
        }
    }

    pub fn themed(url: impl Into<String>, dark_url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            dark_url: Some(dark_url.into()),
        }
    }

    pub fn asset(&self) -> ThemedAsset {
        let asset = ThemedAsset::new(self.url.clone());
        match &self.dark_url {
            Some(dark) => asset.with_dark(dark.clone()),
            None => asset,
        }
    }
}

/// Entrance motion of a block or item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Motion {
    #[default]
    FadeUp,
    Fade,
    SlideLeft,
    SlideRight,
    ScaleIn,
}

impl Motion {
    pub fn preset(self, distance: f32) -> RevealPreset {
        match self {
            Motion::FadeUp => RevealPreset::FadeUp { distance },
            Motion::Fade => RevealPreset::Fade,
            Motion::SlideLeft => RevealPreset::SlideFromLeft { distance },
            Motion::SlideRight => RevealPreset::SlideFromRight { distance },
            Motion::ScaleIn => RevealPreset::ScaleIn { from: 0.9 },
        }
    }
}

impl BlockConfig {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            delay_ms: 0,
            height: default_block_height(),
            motion: Motion::default(),
            duration_ms: None,
            distance: None,
            image: None,
            items: Vec::new(),
            columns: default_columns(),
            stagger_base_ms: 0,
        }
    }

    pub fn delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    pub fn motion(mut self, motion: Motion) -> Self {
        self.motion = motion;
        self
    }

    pub fn image(mut self, image: ImageConfig) -> Self {
        self.image = Some(image);
        self
    }

    pub fn grid(mut self, columns: usize, items: Vec<ItemConfig>) -> Self {
        self.columns = columns;
        self.items = items;
        self
    }

    /// Stagger schedule for this block's grid children
    pub fn stagger(&self, interval_ms: u64) -> StaggerGroup {
        StaggerGroup::new(self.stagger_base_ms, interval_ms)
    }
}

impl ItemConfig {
    pub fn new(label: impl Into<String>, height: f32) -> Self {
        Self {
            label: label.into(),
            height,
            motion: None,
            image: None,
            level: None,
        }
    }

    pub fn level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    pub fn image(mut self, image: ImageConfig) -> Self {
        self.image = Some(image);
        self
    }

    pub fn motion(mut self, motion: Motion) -> Self {
        self.motion = Some(motion);
        self
    }
}

impl SectionConfig {
    pub fn new(id: impl Into<String>, title: impl Into<String>, blocks: Vec<BlockConfig>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            blocks,
        }
    }

    pub fn has_heading(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

impl PageConfig {
    /// Parse and validate a TOML page description
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: PageConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn threshold(&self) -> Result<Threshold> {
        Ok(Threshold::new(self.reveal.threshold)?)
    }

    /// Check the configuration for mistakes that would make the page unusable
    pub fn validate(&self) -> Result<()> {
        if self.sections.is_empty() {
            return Err(PageError::NoSections);
        }
        self.threshold()?;

        let layout = &self.layout;
        for (name, value) in [
            ("layout.width", layout.width),
            ("layout.viewport_height", layout.viewport_height),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(PageError::InvalidSize { field: name.to_string(), value });
            }
        }

        let mut seen = FxHashSet::default();
        for section in &self.sections {
            if !seen.insert(section.id.as_str()) {
                return Err(PageError::DuplicateSection(section.id.clone()));
            }

            let mut blocks = FxHashSet::default();
            for block in &section.blocks {
                let path = format!("{}/{}", section.id, block.label);
                if !blocks.insert(block.label.as_str()) {
                    return Err(PageError::DuplicateLabel(path));
                }
                if block.columns == 0 {
                    return Err(PageError::InvalidSize {
                        field: format!("{path}.columns"),
                        value: 0.0,
                    });
                }
                if block.height < 0.0 {
                    return Err(PageError::InvalidSize {
                        field: format!("{path}.height"),
                        value: block.height,
                    });
                }
                check_image(&path, block.image.as_ref())?;

                let mut items = FxHashSet::default();
                for item in &block.items {
                    let item_path = format!("{path}/{}", item.label);
                    if !items.insert(item.label.as_str()) {
                        return Err(PageError::DuplicateLabel(item_path));
                    }
                    if let Some(level) = item.level.filter(|&level| level > 100) {
                        return Err(PageError::InvalidLevel { path: item_path, level });
                    }
                    check_image(&item_path, item.image.as_ref())?;
                }
            }
        }

        Ok(())
    }

    pub fn section(&self, id: &str) -> Option<&SectionConfig> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// The built-in portfolio page: hero, about, projects, skills, contact
    /// and a footer
    pub fn portfolio() -> Self {
        let fade_item = |label: &str, height: f32| ItemConfig::new(label, height);
        let chip = |label: &str| ItemConfig::new(label, 40.0).motion(Motion::SlideLeft);

        let hero = SectionConfig::new(
            "hero",
            "Hello, I'm a Full-Stack Developer",
            vec![BlockConfig {
                stagger_base_ms: 300,
                ..BlockConfig::new("intro").height(480.0).grid(
                    1,
                    vec![
                        fade_item("greeting", 48.0),
                        fade_item("headline", 96.0),
                        fade_item("tagline", 72.0),
                        fade_item("actions", 56.0),
                    ],
                )
            }],
        );

        let about_chips = ["React", "TypeScript", "Tailwind CSS", "Node.js", "PostgreSQL", "Docker"]
            .into_iter()
            .map(chip)
            .collect();
        let about = SectionConfig::new(
            "about",
            "About Me",
            vec![
                BlockConfig {
                    duration_ms: Some(800),
                    distance: Some(50.0),
                    ..BlockConfig::new("portrait")
                        .delay(100)
                        .height(560.0)
                        .motion(Motion::SlideLeft)
                        .image(ImageConfig::themed("img/mata.png", "img/piyong.png"))
                },
                BlockConfig::new("bio").delay(200).height(240.0).grid(3, about_chips),
            ],
        );

        let projects = [
            ("E-Commerce Platform", "photo-1515165562835-c3b8c7f1a3ec"),
            ("Task Management App", "photo-1553877522-43269d4ea984"),
            ("AI Content Generator", "photo-1498050108023-c5249f4df085"),
            ("Analytics Dashboard", "photo-1543286386-2e659306cd6c"),
            ("Social Media App", "photo-1496307042754-b4aa456c4a2d"),
            ("Weather App", "photo-1502303756783-c1f7b2d4b8c2"),
        ]
        .into_iter()
        .map(|(title, photo)| {
            ItemConfig::new(title, 420.0).image(ImageConfig::new(format!(
                "https://images.unsplash.com/{photo}?auto=format&fit=crop&w=1200&q=80"
            )))
        })
        .collect();
        let projects = SectionConfig::new(
            "projects",
            "Featured Projects",
            vec![BlockConfig::new("cards").grid(3, projects)],
        );

        let category = |name: &str, skills: [(&str, u8); 4]| {
            let items = skills
                .into_iter()
                .map(|(label, level)| {
                    ItemConfig::new(label, 44.0)
                        .motion(Motion::SlideLeft)
                        .level(level)
                })
                .collect();
            BlockConfig::new(name).delay(100).grid(2, items)
        };
        let skills = SectionConfig::new(
            "skills",
            "Skills & Technologies",
            vec![
                category(
                    "Frontend",
                    [("React", 95), ("TypeScript", 90), ("Tailwind CSS", 95), ("Next.js", 85)],
                ),
                category(
                    "Backend",
                    [("Node.js", 90), ("Express", 88), ("PostgreSQL", 85), ("MongoDB", 85)],
                ),
                category("Tools", [("Git", 90), ("Docker", 80), ("AWS", 75), ("CI/CD", 80)]),
                BlockConfig::new("stats").delay(300).height(180.0),
            ],
        );

        let contact = SectionConfig::new(
            "contact",
            "Get In Touch",
            vec![
                BlockConfig::new("details").delay(100).height(360.0),
                BlockConfig {
                    stagger_base_ms: 100,
                    ..BlockConfig::new("form").delay(200).grid(
                        1,
                        vec![
                            ItemConfig::new("name", 72.0).motion(Motion::Fade),
                            ItemConfig::new("email", 72.0).motion(Motion::Fade),
                            ItemConfig::new("message", 160.0).motion(Motion::Fade),
                        ],
                    )
                },
            ],
        );

        // Columns rise in turn; the credits line only fades
        let footer = SectionConfig::new(
            "footer",
            "",
            vec![
                BlockConfig::new("about").height(120.0),
                BlockConfig::new("links").delay(100).height(160.0),
                BlockConfig::new("connect").delay(200).height(80.0),
                BlockConfig::new("credits").height(48.0).motion(Motion::Fade),
            ],
        );

        Self {
            title: default_title(),
            layout: LayoutConfig::default(),
            reveal: RevealSettings::default(),
            scroll: ScrollConfig::default(),
            sections: vec![hero, about, projects, skills, contact, footer],
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self::portfolio()
    }
}

fn check_image(path: &str, image: Option<&ImageConfig>) -> Result<()> {
    let Some(image) = image else {
        return Ok(());
    };
    let urls = std::iter::once(image.url.as_str()).chain(image.dark_url.as_deref());
    for url in urls {
        ImageSource::parse(url).map_err(|source| PageError::Image {
            path: path.to_string(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portfolio_shape() {
        let config = PageConfig::portfolio();
        assert!(config.validate().is_ok());

        let ids: Vec<_> = config.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["hero", "about", "projects", "skills", "contact", "footer"]);
        assert!(!config.section("footer").unwrap().has_heading());
        assert!(config.section("contact").unwrap().has_heading());

        let frontend = &config.section("skills").unwrap().blocks[0];
        let levels: Vec<_> = frontend.items.iter().map(|item| item.level).collect();
        assert_eq!(levels, [Some(95), Some(90), Some(95), Some(85)]);

        let cards = &config.section("projects").unwrap().blocks[0];
        assert_eq!(cards.items.len(), 6);
        assert!(cards.items.iter().all(|item| item.image.is_some()));
        assert_eq!(config.reveal.stagger_interval_ms, 100);
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config = PageConfig::from_toml(
            r#"
            [[section]]
            id = "about"
            title = "About"

            [[section.block]]
            label = "portrait"
            delay_ms = 100
            motion = "slide-left"
            image = { url = "img/light.png", dark_url = "img/dark.png" }
            "#,
        )
        .unwrap();

        assert_eq!(config.layout, LayoutConfig::default());
        assert_eq!(config.scroll.nav_height, 64.0);
        let block = &config.sections[0].blocks[0];
        assert_eq!(block.motion, Motion::SlideLeft);
        assert_eq!(block.columns, 1);
        assert_eq!(
            block.image.as_ref().and_then(|i| i.dark_url.as_deref()),
            Some("img/dark.png")
        );
    }

    #[test]
    fn test_toml_round_trip_of_portfolio() {
        let config = PageConfig::portfolio();
        let text = config.to_toml().unwrap();
        assert_eq!(PageConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            PageConfig::from_toml("title = \"empty\""),
            Err(PageError::NoSections)
        ));

        let mut config = PageConfig::portfolio();
        config.sections[1].id = "hero".to_string();
        assert!(matches!(config.validate(), Err(PageError::DuplicateSection(id)) if id == "hero"));

        let mut config = PageConfig::portfolio();
        config.reveal.threshold = 1.5;
        assert!(matches!(config.validate(), Err(PageError::Threshold(_))));

        let mut config = PageConfig::portfolio();
        config.sections[2].blocks[0].items[0].image = Some(ImageConfig::new(" "));
        assert!(matches!(
            config.validate(),
            Err(PageError::Image { path, .. }) if path == "projects/cards/E-Commerce Platform"
        ));
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let mut config = PageConfig::portfolio();
        config.sections[1].blocks[1].label = "portrait".to_string();
        assert!(matches!(
            config.validate(),
            Err(PageError::DuplicateLabel(path)) if path == "about/portrait"
        ));

        let mut config = PageConfig::portfolio();
        config.sections[2].blocks[0].items[4].label = "Weather App".to_string();
        assert!(matches!(
            config.validate(),
            Err(PageError::DuplicateLabel(path)) if path == "projects/cards/Weather App"
        ));

        // The same label under different parents is fine
        let config = PageConfig::from_toml(
            r#"
            [[section]]
            id = "a"
            title = "A"
            [[section.block]]
            label = "intro"
            [[section.block.item]]
            label = "x"

            [[section]]
            id = "b"
            title = "B"
            [[section.block]]
            label = "intro"
            [[section.block.item]]
            label = "x"
            "#,
        );
        assert!(config.is_ok());
    }

    #[test]
    fn test_level_and_heading_from_toml() {
        let config = PageConfig::from_toml(
            r#"
            [[section]]
            id = "bottom"

            [[section.block]]
            label = "skills"
            [[section.block.item]]
            label = "Rust"
            level = 70
            "#,
        )
        .unwrap();
        assert!(!config.sections[0].has_heading());
        assert_eq!(config.sections[0].blocks[0].items[0].level, Some(70));

        let mut config = PageConfig::portfolio();
        config.sections[3].blocks[0].items[0].level = Some(101);
        assert!(matches!(
            config.validate(),
            Err(PageError::InvalidLevel { path, level: 101 }) if path == "skills/Frontend/React"
        ));
    }

    #[test]
    fn test_motion_presets() {
        assert_eq!(
            Motion::SlideLeft.preset(50.0),
            RevealPreset::SlideFromLeft { distance: 50.0 }
        );
        assert_eq!(
            serde_json::to_string(&Motion::ScaleIn).unwrap(),
            "\"scale-in\""
        );
    }
}
