//! Scroll scripts (scroll.toml)
//!
//! A script is a list of `[[step]]` tables, each with an `action`:
//!
//! ```toml
//! [[step]]
//! action = "scroll"
//! section = "projects"
//!
//! [[step]]
//! action = "wait"
//! ms = 500
//!
//! [[step]]
//! action = "fail"
//! url = "img/mata.png"
//! status = 404
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ScriptError {
    #[error("step {index}: scroll needs exactly one of `to`, `by` or `section`")]
    AmbiguousScroll { index: usize },

    #[error("step {index}: unmount must be the last step")]
    StepsAfterUnmount { index: usize },
}

/// One thing the simulated reader does
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    /// Scroll to an offset, by a delta, or to a section anchor
    Scroll {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        by: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        section: Option<String>,
    },
    /// Let time pass
    Wait { ms: u64 },
    /// Complete a fetch successfully; every requested URL when `url` is omitted
    Load {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    /// Fail a fetch
    Fail {
        url: String,
        #[serde(default = "default_status")]
        status: u16,
    },
    ToggleTheme,
    Unmount,
}

fn default_status() -> u16 {
    404
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Script {
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_toml(content: &str) -> Result<Self> {
        let script: Script = toml::from_str(content)?;
        script.validate()?;
        Ok(script)
    }

    /// Load a script from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn validate(&self) -> std::result::Result<(), ScriptError> {
        let last = self.steps.len().saturating_sub(1);
        for (index, step) in self.steps.iter().enumerate() {
            match step {
                Step::Scroll { to, by, section } => {
                    let given = [to.is_some(), by.is_some(), section.is_some()]
                        .into_iter()
                        .filter(|&g| g)
                        .count();
                    if given != 1 {
                        return Err(ScriptError::AmbiguousScroll { index });
                    }
                }
                Step::Unmount if index != last => {
                    return Err(ScriptError::StepsAfterUnmount { index });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Scroll through every section of the page, pausing a second at each
    pub fn tour(section_ids: &[&str]) -> Self {
        let steps = section_ids
            .iter()
            .flat_map(|id| {
                [
                    Step::Scroll {
                        to: None,
                        by: None,
                        section: Some(id.to_string()),
                    },
                    Step::Wait { ms: 1000 },
                    Step::Load { url: None },
                ]
            })
            .collect();
        Self { steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_action() {
        let script = Script::from_toml(
            r#"
            [[step]]
            action = "scroll"
            to = 1200.0

            [[step]]
            action = "scroll"
            section = "about"

            [[step]]
            action = "wait"
            ms = 250

            [[step]]
            action = "load"

            [[step]]
            action = "fail"
            url = "img/mata.png"

            [[step]]
            action = "toggle-theme"

            [[step]]
            action = "unmount"
            "#,
        )
        .unwrap();

        assert_eq!(script.steps.len(), 7);
        assert_eq!(script.steps[2], Step::Wait { ms: 250 });
        assert_eq!(script.steps[3], Step::Load { url: None });
        assert_eq!(
            script.steps[4],
            Step::Fail {
                url: "img/mata.png".into(),
                status: 404
            }
        );
        assert_eq!(script.steps[5], Step::ToggleTheme);
    }

    #[test]
    fn test_scroll_needs_one_target() {
        let err = Script::from_toml(
            r#"
            [[step]]
            action = "scroll"
            to = 10.0
            section = "about"
            "#,
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ScriptError>(),
            Some(&ScriptError::AmbiguousScroll { index: 0 })
        );
    }

    #[test]
    fn test_unmount_must_be_last() {
        let script = Script {
            steps: vec![Step::Unmount, Step::Wait { ms: 10 }],
        };
        assert_eq!(
            script.validate(),
            Err(ScriptError::StepsAfterUnmount { index: 0 })
        );
    }

    #[test]
    fn test_unknown_action_rejected() {
        assert!(Script::from_toml("[[step]]\naction = \"jump\"\n").is_err());
    }

    #[test]
    fn test_tour_round_trips() {
        let tour = Script::tour(&["about", "contact"]);
        assert_eq!(tour.steps.len(), 6);

        let text = toml::to_string_pretty(&tour).unwrap();
        assert_eq!(Script::from_toml(&text).unwrap(), tour);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Script::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }
}
