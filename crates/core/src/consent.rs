//! Scroll-to-bottom gate over legal text plus the consent checkboxes it unlocks.

use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Scroll gate
// ---------------------------------------------------------------------------

/// Latches once a scrollable region has been read to its end.
///
/// The latch never reverts for the lifetime of the gate; scrolling back up
/// after reaching the bottom keeps it set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollGate {
    threshold_px: f64,
    reached_bottom: bool,
}

impl ScrollGate {
    pub fn new(threshold_px: f64) -> Self {
        Self {
            threshold_px,
            reached_bottom: false,
        }
    }

    pub fn threshold_px(&self) -> f64 {
        self.threshold_px
    }

    pub fn has_reached_bottom(&self) -> bool {
        self.reached_bottom
    }

    /// Record a scroll position. Returns the (possibly latched) state.
    ///
    /// The remaining unseen distance is `scroll_height - scroll_top -
    /// viewport_height`. The comparison is inclusive: `remaining <= threshold`
    /// counts as the bottom.
    pub fn on_scroll(&mut self, scroll_top: f64, scroll_height: f64, viewport_height: f64) -> bool {
        if !self.reached_bottom {
            let remaining = scroll_height - scroll_top - viewport_height;
            if remaining <= self.threshold_px {
                self.reached_bottom = true;
            }
        }
        self.reached_bottom
    }

    /// Content that fits its viewport has nothing to scroll and latches at once.
    pub fn check_initial_fit(&mut self, scroll_height: f64, viewport_height: f64) -> bool {
        if scroll_height <= viewport_height {
            self.reached_bottom = true;
        }
        self.reached_bottom
    }

    pub fn reset(&mut self) {
        self.reached_bottom = false;
    }
}

// ---------------------------------------------------------------------------
// Consent items
// ---------------------------------------------------------------------------

/// Static description of one consent checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConsentItem {
    pub id: &'static str,
    pub label: &'static str,
    /// Must be checked before submitting.
    pub required: bool,
    /// Only interactive once the legal text has been read.
    pub gated: bool,
}

/// The precondition a submission attempt is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "missing", rename_all = "snake_case")]
pub enum ConsentMissing {
    #[error("Please read the terms to the end before confirming")]
    TermsNotRead,

    #[error("Please confirm: {label}")]
    Unchecked { item: &'static str, label: &'static str },

    #[error("Please sign in the signature box")]
    SignatureMissing,
}

/// Per-checkbox state exposed to hosts.
#[derive(Debug, Clone, Serialize)]
pub struct ConsentItemView {
    pub id: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub checked: bool,
    pub interactive: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsentView {
    pub has_reached_bottom: bool,
    pub items: Vec<ConsentItemView>,
}

// ---------------------------------------------------------------------------
// Consent gate
// ---------------------------------------------------------------------------

/// Scroll gate plus checkbox state for a form's final step.
#[derive(Debug, Clone)]
pub struct ConsentGate {
    scroll: ScrollGate,
    items: &'static [ConsentItem],
    checked: Vec<bool>,
}

impl ConsentGate {
    pub fn new(items: &'static [ConsentItem], threshold_px: f64) -> Self {
        Self {
            scroll: ScrollGate::new(threshold_px),
            items,
            checked: vec![false; items.len()],
        }
    }

    pub fn has_reached_bottom(&self) -> bool {
        self.scroll.has_reached_bottom()
    }

    pub fn on_scroll(&mut self, scroll_top: f64, scroll_height: f64, viewport_height: f64) -> bool {
        self.scroll.on_scroll(scroll_top, scroll_height, viewport_height)
    }

    pub fn check_initial_fit(&mut self, scroll_height: f64, viewport_height: f64) -> bool {
        self.scroll.check_initial_fit(scroll_height, viewport_height)
    }

    fn position(&self, id: &str) -> Result<usize, CoreError> {
        self.items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "ConsentItem",
                id: id.to_string(),
            })
    }

    pub fn is_interactive(&self, id: &str) -> Result<bool, CoreError> {
        let idx = self.position(id)?;
        Ok(!self.items[idx].gated || self.has_reached_bottom())
    }

    pub fn is_checked(&self, id: &str) -> Result<bool, CoreError> {
        let idx = self.position(id)?;
        Ok(self.checked[idx])
    }

    /// Toggle a checkbox. Gated boxes refuse input until the text was read.
    pub fn set_checked(&mut self, id: &str, checked: bool) -> Result<(), CoreError> {
        let idx = self.position(id)?;
        if self.items[idx].gated && !self.has_reached_bottom() {
            return Err(ConsentMissing::TermsNotRead.into());
        }
        self.checked[idx] = checked;
        Ok(())
    }

    /// Every required box checked, reporting the first gap in display order.
    pub fn ensure_satisfied(&self) -> Result<(), ConsentMissing> {
        for (item, checked) in self.items.iter().zip(&self.checked) {
            if !item.required || *checked {
                continue;
            }
            if item.gated && !self.has_reached_bottom() {
                return Err(ConsentMissing::TermsNotRead);
            }
            return Err(ConsentMissing::Unchecked {
                item: item.id,
                label: item.label,
            });
        }
        Ok(())
    }

    /// Forget both the latch and every checkbox.
    pub fn reset(&mut self) {
        self.scroll.reset();
        self.checked.iter_mut().for_each(|c| *c = false);
    }

    pub fn view(&self) -> ConsentView {
        let reached = self.has_reached_bottom();
        ConsentView {
            has_reached_bottom: reached,
            items: self
                .items
                .iter()
                .zip(&self.checked)
                .map(|(item, checked)| ConsentItemView {
                    id: item.id,
                    label: item.label,
                    required: item.required,
                    checked: *checked,
                    interactive: !item.gated || reached,
                })
                .collect(),
        }
    }
}
