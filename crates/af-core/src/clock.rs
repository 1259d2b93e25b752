use std::time::{Duration, Instant};

/// Plancher absolu de cadence : protège contre des métadonnées aberrantes
/// (0/0, NaN) qui donneraient un intervalle quasi infini.
pub const MIN_FPS: f64 = 1.0;

/// Source de temps du pipeline vidéo.
///
/// Abstrait `Instant::now` et `thread::sleep` pour pouvoir simuler des
/// frames lentes dans les tests.
///
/// # Example
/// ```
/// use af_core::clock::{Clock, SystemClock};
/// let clock = SystemClock;
/// let t0 = clock.now();
/// clock.sleep(std::time::Duration::ZERO);
/// assert!(clock.now() >= t0);
/// ```
pub trait Clock {
    /// Instant courant (monotone).
    fn now(&self) -> Instant;

    /// Bloque le thread courant pendant `duration`.
    fn sleep(&self, duration: Duration);
}

/// Horloge murale réelle.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Cadence cible : `clamp(source_fps, MIN_FPS, max_fps)`.
///
/// A non-finite or non-positive source rate falls back to `MIN_FPS`; a
/// ceiling below `MIN_FPS` is raised to it.
///
/// # Example
/// ```
/// use af_core::clock::target_fps;
/// assert_eq!(target_fps(29.97, 144.0), 29.97);
/// assert_eq!(target_fps(240.0, 144.0), 144.0);
/// assert_eq!(target_fps(0.0, 144.0), 1.0);
/// assert_eq!(target_fps(f64::NAN, 144.0), 1.0);
/// ```
#[must_use]
pub fn target_fps(source_fps: f64, max_fps: f64) -> f64 {
    let ceiling = if max_fps.is_nan() { MIN_FPS } else { max_fps.max(MIN_FPS) };
    if source_fps.is_nan() || source_fps <= 0.0 {
        return MIN_FPS;
    }
    source_fps.clamp(MIN_FPS, ceiling)
}

/// Horloge de lecture : intervalle cible + horodatage de la dernière frame affichée.
///
/// Chaque frame est jugée par rapport à la fin réelle de la précédente
/// (mesurée après le sommeil), jamais par rapport à un planning fixe : un
/// retard ponctuel n'est pas rattrapé et ne s'accumule pas.
///
/// # Example
/// ```
/// use af_core::clock::{PlaybackClock, SystemClock};
/// let mut clock = PlaybackClock::new(SystemClock, 1000.0);
/// assert_eq!(clock.frame_interval().as_millis(), 1);
/// let _slept = clock.pace();
/// ```
pub struct PlaybackClock<C: Clock> {
    clock: C,
    frame_interval: Duration,
    last_frame: Instant,
}

impl<C: Clock> PlaybackClock<C> {
    /// Start a clock at `fps` (already clamped, see [`target_fps`]).
    ///
    /// The first frame is measured from the moment the clock is created.
    #[must_use]
    pub fn new(clock: C, fps: f64) -> Self {
        let fps = if fps.is_finite() { fps.max(MIN_FPS) } else { MIN_FPS };
        let last_frame = clock.now();
        Self {
            clock,
            frame_interval: Duration::from_secs_f64(1.0 / fps),
            last_frame,
        }
    }

    /// Intervalle cible entre deux frames.
    #[inline]
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Instant courant de l'horloge sous-jacente.
    #[inline]
    #[must_use]
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Repart de maintenant : la prochaine frame dispose d'un intervalle complet.
    pub fn restart(&mut self) {
        self.last_frame = self.clock.now();
    }

    /// Durée de sommeil nécessaire pour respecter l'intervalle, zéro si la
    /// frame a déjà consommé tout son budget.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        let elapsed = self.clock.now().saturating_duration_since(self.last_frame);
        self.frame_interval.saturating_sub(elapsed)
    }

    /// Block until the current frame's budget is spent, then stamp the frame.
    ///
    /// Returns how long it slept.
    pub fn pace(&mut self) -> Duration {
        let remaining = self.remaining();
        if !remaining.is_zero() {
            self.clock.sleep(remaining);
        }
        self.last_frame = self.clock.now();
        remaining
    }
}
