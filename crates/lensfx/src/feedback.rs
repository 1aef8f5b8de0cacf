use std::io::{self, Write};
use std::time::Instant;

use preloader::Preloader;
use renderer::{AssetLoadError, FrameObserver, TextureInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Hover,
    Click,
}

#[derive(Debug, thiserror::Error)]
#[error("{cue:?} cue not played: {reason}")]
pub struct PlaybackBlocked {
    pub cue: Cue,
    pub reason: String,
}

/// Plays incidental sound cues. Failures are reported, never fatal.
pub trait CuePlayer {
    fn play(&mut self, cue: Cue) -> Result<(), PlaybackBlocked>;
}

/// Rings the terminal bell: once on hover, twice on click.
pub struct BellPlayer<W: Write> {
    out: W,
    enabled: bool,
}

impl BellPlayer<io::Stderr> {
    pub fn stderr(enabled: bool) -> Self {
        Self::new(io::stderr(), enabled)
    }
}

impl<W: Write> BellPlayer<W> {
    pub fn new(out: W, enabled: bool) -> Self {
        Self { out, enabled }
    }
}

impl<W: Write> CuePlayer for BellPlayer<W> {
    fn play(&mut self, cue: Cue) -> Result<(), PlaybackBlocked> {
        if !self.enabled {
            return Err(PlaybackBlocked {
                cue,
                reason: "audio disabled".into(),
            });
        }
        let pattern: &[u8] = match cue {
            Cue::Hover => b"\x07",
            Cue::Click => b"\x07\x07",
        };
        self.out
            .write_all(pattern)
            .and_then(|()| self.out.flush())
            .map_err(|err| PlaybackBlocked {
                cue,
                reason: err.to_string(),
            })
    }
}

/// Glue between the lens window and the decorative collaborators: the
/// preloader shown in the title and the hover/click cues.
pub struct LensObserver<P: CuePlayer> {
    preloader: Preloader,
    player: P,
}

impl<P: CuePlayer> LensObserver<P> {
    pub fn new(preloader: Preloader, player: P) -> Self {
        Self { preloader, player }
    }

    fn cue(&mut self, cue: Cue) {
        if let Err(err) = self.player.play(cue) {
            tracing::trace!(error = %err, "sound cue suppressed");
        }
    }
}

impl<P: CuePlayer> FrameObserver for LensObserver<P> {
    fn on_ready(&mut self, _info: &TextureInfo) {
        self.preloader.finish();
    }

    fn on_error(&mut self, _error: &AssetLoadError) {
        self.preloader.finish();
    }

    fn on_hover(&mut self) {
        self.cue(Cue::Hover);
    }

    fn on_click(&mut self) {
        self.cue(Cue::Click);
    }

    fn status(&mut self, now: Instant) -> Option<String> {
        self.preloader.advance(now);
        self.preloader.label()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use lensconfig::PreloaderSection;

    use super::*;

    #[derive(Default)]
    struct RecordingPlayer {
        played: Vec<Cue>,
        blocked: bool,
    }

    impl CuePlayer for RecordingPlayer {
        fn play(&mut self, cue: Cue) -> Result<(), PlaybackBlocked> {
            if self.blocked {
                return Err(PlaybackBlocked {
                    cue,
                    reason: "autoplay policy".into(),
                });
            }
            self.played.push(cue);
            Ok(())
        }
    }

    fn preloader(start: Instant) -> Preloader {
        let settings = PreloaderSection {
            interval: Duration::from_millis(50),
            max_step: 5,
            hold_at: 90,
            seed: Some(7),
        };
        Preloader::new(&settings, start).unwrap()
    }

    fn texture() -> TextureInfo {
        TextureInfo {
            path: PathBuf::from("bg.png"),
            width: 4,
            height: 4,
        }
    }

    #[test]
    fn status_tracks_preloader_until_ready() {
        let start = Instant::now();
        let mut observer = LensObserver::new(preloader(start), RecordingPlayer::default());

        assert_eq!(observer.status(start).as_deref(), Some("loading 0%"));
        let label = observer.status(start + Duration::from_millis(500)).unwrap();
        assert_ne!(label, "loading 0%");

        observer.on_ready(&texture());
        assert!(observer.status(start + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn asset_failure_also_hides_the_preloader() {
        let start = Instant::now();
        let mut observer = LensObserver::new(preloader(start), RecordingPlayer::default());
        observer.on_error(&AssetLoadError::WorkerLost);
        assert!(observer.status(start).is_none());
    }

    #[test]
    fn hover_and_click_play_cues() {
        let mut observer =
            LensObserver::new(preloader(Instant::now()), RecordingPlayer::default());
        observer.on_hover();
        observer.on_click();
        assert_eq!(observer.player.played, vec![Cue::Hover, Cue::Click]);
    }

    #[test]
    fn blocked_playback_is_swallowed() {
        let player = RecordingPlayer {
            blocked: true,
            ..Default::default()
        };
        let mut observer = LensObserver::new(preloader(Instant::now()), player);
        observer.on_hover();
        observer.on_click();
        assert!(observer.player.played.is_empty());
    }

    #[test]
    fn bell_player_writes_bell_characters() {
        let mut player = BellPlayer::new(Vec::new(), true);
        player.play(Cue::Hover).unwrap();
        player.play(Cue::Click).unwrap();
        assert_eq!(player.out, b"\x07\x07\x07".to_vec());
    }

    #[test]
    fn muted_bell_reports_blocked() {
        let mut player = BellPlayer::new(Vec::new(), false);
        let err = player.play(Cue::Click).unwrap_err();
        assert_eq!(err.cue, Cue::Click);
        assert!(player.out.is_empty());
    }
}
