//! Replaying a scroll script against a mounted page

use crate::script::{Script, Step};
use anyhow::{bail, Result};
use std::rc::Rc;
use std::time::Duration;
use tracing::{info, warn};
use unveil_core::{FetchError, Stage};
use unveil_page::{EntryKind, Page, PageConfig, PageSnapshot};
use unveil_theme::ThemeState;

/// A page plus the theme it follows, driven one step at a time
pub struct Simulation {
    theme: Rc<ThemeState>,
    page: Option<Page>,
    /// Last snapshot taken before the page went away
    last: Option<PageSnapshot>,
    /// Fetches complete on their own; sleep for real during waits
    live: bool,
}

impl Simulation {
    pub fn new(stage: Stage, config: PageConfig, theme: Rc<ThemeState>) -> Result<Self> {
        let page = Page::mount(stage, config, &theme)?;
        Ok(Self {
            theme,
            page: Some(page),
            last: None,
            live: false,
        })
    }

    /// Let a real fetch backend complete requests instead of `load`/`fail` steps
    pub fn live(mut self) -> Self {
        self.live = true;
        self
    }

    pub fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    pub fn run(&mut self, script: &Script) -> Result<()> {
        for (index, step) in script.steps.iter().enumerate() {
            tracing::debug!(index, ?step, "step");
            self.step(step)?;
        }
        Ok(())
    }

    pub fn step(&mut self, step: &Step) -> Result<()> {
        let Some(page) = self.page.as_mut() else {
            bail!("page already unmounted");
        };

        match step {
            Step::Scroll { to, by, section } => {
                if let Some(id) = section {
                    let y = page.scroll_to_section(id)?;
                    info!("scrolled to #{} at {:.0}px", id, y);
                } else if let Some(y) = to {
                    page.scroll_to(*y);
                } else if let Some(dy) = by {
                    page.scroll_by(*dy);
                }
            }
            Step::Wait { ms } => {
                if self.live {
                    // Poll the backend in slices so completions land near their real time
                    let mut left = *ms;
                    while left > 0 {
                        let slice = left.min(50);
                        std::thread::sleep(Duration::from_millis(slice));
                        page.stage().pump_backend();
                        page.advance(slice);
                        left -= slice;
                    }
                } else {
                    page.advance(*ms);
                }
            }
            Step::Load { url } => {
                if self.live {
                    warn!("ignoring load step in live mode");
                    return Ok(());
                }
                let urls = match url {
                    Some(url) => vec![url.clone()],
                    None => page.stage().requested_urls(),
                };
                for url in urls {
                    page.stage().complete_fetch(&url, Ok(()));
                }
            }
            Step::Fail { url, status } => {
                if self.live {
                    warn!("ignoring fail step in live mode");
                    return Ok(());
                }
                page.stage().complete_fetch(
                    url,
                    Err(FetchError::Status {
                        url: url.clone(),
                        status: *status,
                    }),
                );
            }
            Step::ToggleTheme => {
                let scheme = self.theme.toggle();
                let switched = page.apply_scheme(scheme);
                info!("switched {} image(s) to the {} variant", switched, scheme);
            }
            Step::Unmount => {
                if let Some(page) = self.page.take() {
                    self.last = Some(page.snapshot(page.now_ms()));
                    let stage = page.unmount();
                    info!(
                        "unmounted; {} subscription(s), {} timer(s) left",
                        stage.active_subscriptions(),
                        stage.pending_timers()
                    );
                }
            }
        }
        Ok(())
    }

    /// The page as it stands now, or as it was when unmounted
    pub fn snapshot(&self) -> Option<PageSnapshot> {
        match &self.page {
            Some(page) => Some(page.snapshot(page.now_ms())),
            None => self.last.clone(),
        }
    }
}

/// Render a snapshot as a plain-text table
pub fn report(snapshot: &PageSnapshot) -> String {
    let mut out = format!(
        "t={}ms scroll={:.0}px scheme={} top-button={}\n",
        snapshot.time_ms,
        snapshot.scroll_y,
        snapshot.scheme,
        if snapshot.scroll_to_top_visible { "shown" } else { "hidden" }
    );

    for entry in &snapshot.entries {
        let indent = match entry.kind {
            EntryKind::Heading => "",
            EntryKind::Block => "  ",
            EntryKind::Item => "    ",
        };
        let revealed = match entry.revealed_at {
            Some(at) => format!("revealed@{at}ms"),
            None => "hidden".to_string(),
        };
        out.push_str(&format!(
            "{indent}{:<40} {:<18} opacity={:.2}",
            entry.path, revealed, entry.opacity
        ));
        if let Some(image) = &entry.image {
            out.push_str(&format!(" image={}", image.state));
        }
        if let Some(width) = entry.bar_width {
            out.push_str(&format!(" bar={width:.0}%"));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "{}/{} revealed\n",
        snapshot.revealed_count(),
        snapshot.entries.len()
    ));
    out
}
