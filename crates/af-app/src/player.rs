use std::io::Write;
use std::time::Duration;

use af_ascii::renderer::render_into;
use af_core::clock::{Clock, PlaybackClock, target_fps};
use af_core::config::PlayerConfig;
use af_core::frame::{AsciiGrid, FrameBuffer};
use af_core::traits::FrameSource;
use af_render::compositor::{CompositeMode, TerminalWriter};
use af_source::resize::Resizer;
use anyhow::Result;

use crate::pipeline::grid_size;

/// État du lecteur vidéo, tracé au niveau `debug`.
///
/// `Idle → Playing → Draining → Stopped`. Une erreur fatale passe
/// directement à `Stopped`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PlaybackState {
    /// Source ouverte, resampler créé, lecture pas encore commencée.
    Idle,
    /// Boucle principale : une frame décodée par tour.
    Playing,
    /// Fin des paquets : vidage des frames retenues par le décodeur.
    Draining,
    /// Lecture terminée, ressources libérées.
    Stopped,
}

/// Bilan d'une lecture terminée.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackSummary {
    /// Frames affichées, vidage compris.
    pub frames: u64,
    /// Frames issues du vidage du décodeur.
    pub drained: u64,
    /// Intervalle cible utilisé.
    pub frame_interval: Duration,
    /// Durée murale de la lecture.
    pub elapsed: Duration,
}

/// Étages resample → render → composite → pace, avec leurs buffers réutilisés.
struct Presenter<W: Write, C: Clock> {
    resizer: Resizer,
    scaled: FrameBuffer,
    grid: AsciiGrid,
    writer: TerminalWriter<W>,
    pacer: PlaybackClock<C>,
}

impl<W: Write, C: Clock> Presenter<W, C> {
    fn present(&mut self, frame: &FrameBuffer) -> Result<()> {
        if self.scaled.channels() != frame.channels() {
            self.scaled =
                FrameBuffer::try_new(self.scaled.width(), self.scaled.height(), frame.channels())?;
        }
        self.resizer.resize_into(frame, &mut self.scaled)?;
        render_into(&self.scaled, &mut self.grid);
        self.writer.write_frame(&self.grid)?;
        self.pacer.pace();
        Ok(())
    }
}

/// Lecteur vidéo : boucle séquentielle décodage → resample → rendu →
/// composition → cadence, sur un seul thread.
///
/// # Example
/// ```no_run
/// use af_app::player::Player;
/// use af_core::clock::SystemClock;
/// use af_core::config::PlayerConfig;
/// use af_source::video::FfmpegSource;
/// use std::path::Path;
///
/// let source = FfmpegSource::open(Path::new("clip.mp4")).unwrap();
/// let player = Player::new(source, std::io::stdout(), SystemClock, &PlayerConfig::default()).unwrap();
/// let summary = player.run().unwrap();
/// println!("{} frames", summary.frames);
/// ```
pub struct Player<S: FrameSource, W: Write, C: Clock> {
    source: S,
    presenter: Presenter<W, C>,
    state: PlaybackState,
}

impl<S: FrameSource, W: Write, C: Clock> Player<S, W, C> {
    /// Derive the grid size and cadence from the stream metadata and allocate
    /// every buffer. The player starts `Idle`.
    ///
    /// # Errors
    /// Degenerate stream dimensions or allocation failure.
    pub fn new(source: S, out: W, clock: C, config: &PlayerConfig) -> Result<Self> {
        let info = source.info();
        let (width, height) = grid_size(config.output_width, info.width, info.height)?;
        let fps = target_fps(info.fps, config.max_fps);
        log::info!(
            "Lecture {}x{} @ {:.3}fps (source {:.3}fps, plafond {:.1}) → grille {width}x{height}",
            info.width,
            info.height,
            fps,
            info.fps,
            config.max_fps
        );

        let presenter = Presenter {
            resizer: Resizer::new(),
            scaled: FrameBuffer::try_new(width, height, 3)?,
            grid: AsciiGrid::try_new(width, height)?,
            writer: TerminalWriter::new(out, CompositeMode::Overwrite),
            pacer: PlaybackClock::new(clock, fps),
        };
        Ok(Self {
            source,
            presenter,
            state: PlaybackState::Idle,
        })
    }

    /// Intervalle cible entre deux frames.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        self.presenter.pacer.frame_interval()
    }

    /// Play the stream to its end.
    ///
    /// Consumes the player: source, buffers and output are released on
    /// return, whether playback ended cleanly or not.
    ///
    /// # Errors
    /// The first decode, resize or write error; playback stops there.
    pub fn run(mut self) -> Result<PlaybackSummary> {
        let started = self.presenter.pacer.now();
        self.presenter.pacer.restart();
        self.transition(PlaybackState::Playing);

        let result = self.play();
        self.transition(PlaybackState::Stopped);

        let drained = result?;
        let summary = PlaybackSummary {
            frames: self.presenter.writer.frames_written(),
            drained,
            frame_interval: self.frame_interval(),
            elapsed: self.presenter.pacer.now().saturating_duration_since(started),
        };
        log::debug!("Lecture terminée : {summary:?}");
        Ok(summary)
    }

    /// Boucle principale puis vidage ; retourne le nombre de frames vidées.
    fn play(&mut self) -> Result<u64> {
        while let Some(frame) = self.source.read_frame()? {
            self.presenter.present(frame)?;
        }

        self.transition(PlaybackState::Draining);
        let mut drained = 0u64;
        while let Some(frame) = self.source.drain_frame()? {
            self.presenter.present(frame)?;
            drained += 1;
        }
        Ok(drained)
    }

    fn transition(&mut self, next: PlaybackState) {
        log::debug!("Lecteur : {:?} → {next:?}", self.state);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use af_core::traits::StreamInfo;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::time::Instant;

    const MS: Duration = Duration::from_millis(1);
    const HOME: &str = "\x1b[1;1H";

    /// Horloge simulée : le temps n'avance que via `advance` ou `sleep`.
    struct FakeClock {
        origin: Instant,
        offset: Cell<Duration>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset: Cell::new(Duration::ZERO),
            }
        }

        fn advance(&self, d: Duration) {
            self.offset.set(self.offset.get() + d);
        }

        fn elapsed(&self) -> Duration {
            self.offset.get()
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.origin + self.offset.get()
        }

        fn sleep(&self, duration: Duration) {
            self.advance(duration);
        }
    }

    /// Source en mémoire ; chaque décodage coûte `cost` sur l'horloge simulée.
    struct ScriptedSource<'a> {
        info: StreamInfo,
        frames: VecDeque<(FrameBuffer, Duration)>,
        buffered: VecDeque<FrameBuffer>,
        current: Option<FrameBuffer>,
        fail_after: Option<usize>,
        served: usize,
        clock: &'a FakeClock,
    }

    impl<'a> ScriptedSource<'a> {
        fn new(clock: &'a FakeClock, fps: f64, costs: &[u64], buffered: usize) -> Self {
            let frame = || FrameBuffer::from_raw([255u8, 0, 0].repeat(64 * 36), 64, 36, 3).unwrap();
            Self {
                info: StreamInfo {
                    width: 64,
                    height: 36,
                    fps,
                    pixel_format: "rgb24".into(),
                },
                frames: costs.iter().map(|&ms| (frame(), ms as u32 * MS)).collect(),
                buffered: (0..buffered).map(|_| frame()).collect(),
                current: None,
                fail_after: None,
                served: 0,
                clock,
            }
        }
    }

    impl FrameSource for ScriptedSource<'_> {
        fn info(&self) -> &StreamInfo {
            &self.info
        }

        fn read_frame(&mut self) -> Result<Option<&FrameBuffer>> {
            if self.fail_after == Some(self.served) {
                anyhow::bail!("paquet corrompu");
            }
            let Some((frame, cost)) = self.frames.pop_front() else {
                return Ok(None);
            };
            self.clock.advance(cost);
            self.served += 1;
            self.current = Some(frame);
            Ok(self.current.as_ref())
        }

        fn drain_frame(&mut self) -> Result<Option<&FrameBuffer>> {
            self.current = self.buffered.pop_front();
            Ok(self.current.as_ref())
        }
    }

    fn config(width: u32, max_fps: f64) -> PlayerConfig {
        PlayerConfig {
            output_width: width,
            max_fps,
        }
    }

    #[test]
    fn plays_then_drains_every_frame() {
        let clock = FakeClock::new();
        let source = ScriptedSource::new(&clock, 25.0, &[1, 1, 1], 2);
        let mut out = Vec::new();
        let player = Player::new(source, &mut out, &clock, &config(32, 144.0)).unwrap();
        let summary = player.run().unwrap();
        assert_eq!(summary.frames, 5);
        assert_eq!(summary.drained, 2);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(HOME).count(), 5);
        // floor(32 × 36/64 × 0.45) = 8 lignes par frame.
        assert_eq!(text.matches("\x1b[0m").count(), 5 * 8);
        assert_eq!(text.matches("\x1b[38;5;").count(), 5 * 8 * 32);
    }

    #[test]
    fn cadence_is_clamped_to_bounds() {
        let clock = FakeClock::new();
        let fast = ScriptedSource::new(&clock, 1000.0, &[], 0);
        let player = Player::new(fast, Vec::new(), &clock, &config(16, 50.0)).unwrap();
        assert_eq!(player.frame_interval(), 20 * MS);

        let broken = ScriptedSource::new(&clock, 0.0, &[], 0);
        let player = Player::new(broken, Vec::new(), &clock, &config(16, 144.0)).unwrap();
        assert_eq!(player.frame_interval(), Duration::from_secs(1));
    }

    #[test]
    fn slow_decodes_do_not_accumulate_lag() {
        let clock = FakeClock::new();
        // 10 fps : 100 ms par frame. Décodages de 30, 250, 30, 180 et 40 ms.
        let costs = [30, 250, 30, 180, 40];
        let source = ScriptedSource::new(&clock, 10.0, &costs, 1);
        let summary = Player::new(source, Vec::new(), &clock, &config(16, 144.0))
            .unwrap()
            .run()
            .unwrap();

        // Chaque frame dure max(décodage, intervalle) ; la frame vidée (coût nul)
        // prend un intervalle complet.
        let expected: u64 = costs.iter().map(|&ms| ms.max(100)).sum::<u64>() + 100;
        assert_eq!(clock.elapsed(), expected as u32 * MS);
        assert_eq!(summary.elapsed, clock.elapsed());
        assert_eq!(summary.frames, 6);
    }

    #[test]
    fn decode_error_stops_playback() {
        let clock = FakeClock::new();
        let mut source = ScriptedSource::new(&clock, 30.0, &[1, 1, 1], 1);
        source.fail_after = Some(2);
        let mut out = Vec::new();
        let err = Player::new(source, &mut out, &clock, &config(16, 144.0))
            .unwrap()
            .run()
            .unwrap_err();
        assert!(err.to_string().contains("paquet corrompu"));
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(HOME).count(), 2);
    }

    #[test]
    fn degenerate_stream_is_rejected_before_playing() {
        let clock = FakeClock::new();
        let mut source = ScriptedSource::new(&clock, 30.0, &[], 0);
        source.info.width = 100_000;
        assert!(Player::new(source, Vec::new(), &clock, &config(16, 144.0)).is_err());
    }

    #[test]
    fn oversized_grid_fails_to_allocate() {
        let clock = FakeClock::new();
        let source = ScriptedSource::new(&clock, 30.0, &[1], 0);
        let err = Player::new(source, Vec::new(), &clock, &config(u32::MAX, 144.0))
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<af_core::error::CoreError>(),
            Some(af_core::error::CoreError::Allocation(_))
        ));
    }
}
