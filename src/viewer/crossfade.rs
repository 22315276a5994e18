//! Low-resolution to full-resolution crossfade.
//!
//! ```text
//! Scheduled ──deadline──▶ Loading ──decoded──▶ FadingIn ──fade end / fallback──▶ Done
//! ```
//!
//! The full image starts loading 260 ms after mount; any interaction while
//! still scheduled pushes the start to 650 ms after that interaction. The low
//! layer stays visible until the fade ends, or 320 ms after the fade started
//! when the shell never reports the end.

use std::time::{Duration, Instant};

pub const HIGH_RES_MOUNT_DELAY: Duration = Duration::from_millis(260);
pub const HIGH_RES_INTERACTION_DELAY: Duration = Duration::from_millis(650);
pub const FADE_FALLBACK: Duration = Duration::from_millis(320);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossfadePhase {
    Scheduled { start_at: Instant },
    Loading,
    FadingIn { hide_low_at: Instant },
    Done,
}

/// Something the shell must do now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossfadeAction {
    StartHighLoad,
    HideLow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Crossfade {
    phase: CrossfadePhase,
}

impl Crossfade {
    pub fn mount(now: Instant) -> Self {
        Self {
            phase: CrossfadePhase::Scheduled {
                start_at: now + HIGH_RES_MOUNT_DELAY,
            },
        }
    }

    pub fn phase(&self) -> CrossfadePhase {
        self.phase
    }

    /// A click or drag. Only reschedules a start that has not happened yet.
    pub fn on_interaction(&mut self, now: Instant) {
        if let CrossfadePhase::Scheduled { .. } = self.phase {
            self.phase = CrossfadePhase::Scheduled {
                start_at: now + HIGH_RES_INTERACTION_DELAY,
            };
        }
    }

    /// Advance timers.
    pub fn poll(&mut self, now: Instant) -> Option<CrossfadeAction> {
        match self.phase {
            CrossfadePhase::Scheduled { start_at } if now >= start_at => {
                self.phase = CrossfadePhase::Loading;
                Some(CrossfadeAction::StartHighLoad)
            }
            CrossfadePhase::FadingIn { hide_low_at } if now >= hide_low_at => {
                self.phase = CrossfadePhase::Done;
                Some(CrossfadeAction::HideLow)
            }
            _ => None,
        }
    }

    /// The full image decoded; the fade starts. Returns false for duplicates.
    pub fn on_high_loaded(&mut self, now: Instant) -> bool {
        match self.phase {
            CrossfadePhase::Scheduled { .. } | CrossfadePhase::Loading => {
                self.phase = CrossfadePhase::FadingIn {
                    hide_low_at: now + FADE_FALLBACK,
                };
                true
            }
            _ => false,
        }
    }

    /// The fade transition ended.
    pub fn on_fade_end(&mut self) -> Option<CrossfadeAction> {
        if let CrossfadePhase::FadingIn { .. } = self.phase {
            self.phase = CrossfadePhase::Done;
            return Some(CrossfadeAction::HideLow);
        }
        None
    }

    pub fn low_visible(&self) -> bool {
        self.phase != CrossfadePhase::Done
    }

    pub fn high_visible(&self) -> bool {
        matches!(self.phase, CrossfadePhase::FadingIn { .. } | CrossfadePhase::Done)
    }

    /// When [`poll`](Self::poll) next has something to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.phase {
            CrossfadePhase::Scheduled { start_at } => Some(start_at),
            CrossfadePhase::FadingIn { hide_low_at } => Some(hide_low_at),
            _ => None,
        }
    }
}
