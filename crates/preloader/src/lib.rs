use std::time::{Duration, Instant};

use lensconfig::PreloaderSection;
use rand::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum PreloaderError {
    #[error("invalid preloader settings: {0}")]
    InvalidSettings(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Hidden,
}

/// Decorative percentage counter shown while the background image decodes.
///
/// Progress creeps upward by random steps and parks at `hold_at` until
/// [`Preloader::finish`] is called, which jumps to 100 and hides the counter.
pub struct Preloader {
    interval: Duration,
    max_step: u8,
    hold_at: u8,
    progress: u8,
    phase: Phase,
    next_step_at: Instant,
    rng: StdRng,
}

impl Preloader {
    pub fn new(settings: &PreloaderSection, now: Instant) -> Result<Self, PreloaderError> {
        if settings.interval.is_zero() {
            return Err(PreloaderError::InvalidSettings(
                "interval must be greater than zero".into(),
            ));
        }
        if settings.max_step == 0 {
            return Err(PreloaderError::InvalidSettings(
                "max_step must be greater than zero".into(),
            ));
        }
        if !(1..=99).contains(&settings.hold_at) {
            return Err(PreloaderError::InvalidSettings(format!(
                "hold_at must lie in 1..=99; got {}",
                settings.hold_at
            )));
        }

        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            interval: settings.interval,
            max_step: settings.max_step,
            hold_at: settings.hold_at,
            progress: 0,
            phase: Phase::Loading,
            next_step_at: now + settings.interval,
            rng,
        })
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self.phase, Phase::Hidden)
    }

    /// Applies every increment that fell due up to `now`. Returns true when the
    /// displayed percentage changed.
    ///
    /// Work is bounded by `hold_at`: each step adds at least one, so later due
    /// steps are skipped arithmetically however small `interval` is.
    pub fn advance(&mut self, now: Instant) -> bool {
        if self.is_hidden() || now < self.next_step_at {
            return false;
        }

        let interval_nanos = self.interval.as_nanos();
        let overdue_nanos = (now - self.next_step_at).as_nanos();
        let due = overdue_nanos / interval_nanos + 1;

        let before = self.progress;
        for _ in 0..due.min(u128::from(self.hold_at)) {
            if self.progress >= self.hold_at {
                break;
            }
            let step = self.rng.gen_range(1..=self.max_step);
            self.progress = self.progress.saturating_add(step).min(self.hold_at);
        }

        let into_interval = overdue_nanos % interval_nanos;
        let into_interval = Duration::new(
            (into_interval / 1_000_000_000) as u64,
            (into_interval % 1_000_000_000) as u32,
        );
        self.next_step_at = now - into_interval + self.interval;
        self.progress != before
    }

    /// Completes the counter; used for both the ready and the failed image path.
    pub fn finish(&mut self) {
        self.progress = 100;
        self.phase = Phase::Hidden;
    }

    /// Text shown while loading, `None` once hidden.
    pub fn label(&self) -> Option<String> {
        match self.phase {
            Phase::Loading => Some(format!("loading {}%", self.progress)),
            Phase::Hidden => None,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Loading if self.progress < self.hold_at => Some(self.next_step_at),
            _ => None,
        }
    }
}
