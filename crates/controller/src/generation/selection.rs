//! Rule-based image selection.

use std::collections::HashSet;

use verdant_core::config::OrchestratorConfig;
use verdant_core::types::{Attachment, ImageSelectionPlan, ImageSource, RequestContext};

/// Bounds applied while selecting images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionLimits {
    /// Upper bound on the final selection.
    pub max_images: usize,
    /// Messages scanned for `historyRecent`.
    pub recent_window: usize,
    /// Images taken from `historyRecent`.
    pub recent_cap: usize,
}

impl Default for SelectionLimits {
    fn default() -> Self {
        Self {
            max_images: 5,
            recent_window: 5,
            recent_cap: 3,
        }
    }
}

impl From<&OrchestratorConfig> for SelectionLimits {
    fn from(config: &OrchestratorConfig) -> Self {
        Self {
            max_images: config.max_selected_images,
            recent_window: config.recent_message_window,
            recent_cap: config.recent_image_cap,
        }
    }
}

/// Choose the images a validated plan refers to.
///
/// Deterministic for a given plan and context. The result holds no duplicate
/// attachment ids and at most `limits.max_images` entries.
pub fn select_images<'a>(
    plan: &ImageSelectionPlan,
    context: &'a RequestContext,
    limits: SelectionLimits,
) -> Vec<&'a Attachment> {
    let candidates: Vec<&Attachment> = if plan.all_from_user_message {
        context.images()
    } else if let Some(indices) = &plan.indices {
        let flattened = flattened_images(context);
        // Out-of-range indices are skipped on purpose, not reported.
        indices.iter().filter_map(|&i| flattened.get(i).copied()).collect()
    } else {
        let mut acc = Vec::new();
        for source in &plan.sources {
            match source {
                ImageSource::UserCurrent => acc.extend(context.images()),
                ImageSource::HistoryRecent => acc.extend(
                    context
                        .recent_images_within(limits.recent_window)
                        .into_iter()
                        .take(limits.recent_cap),
                ),
                ImageSource::HistorySpecific => {}
            }
        }
        acc
    };

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|image| seen.insert(image.id.as_str()))
        .take(limits.max_images)
        .collect()
}

/// Every image in the conversation, oldest first: history, then the current
/// turn. An attachment repeated across messages appears once.
fn flattened_images(context: &RequestContext) -> Vec<&Attachment> {
    let mut seen = HashSet::new();
    context
        .history_images()
        .into_iter()
        .chain(context.images())
        .filter(|image| seen.insert(image.id.as_str()))
        .collect()
}
