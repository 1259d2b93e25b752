// Décodage vidéo via subprocess (std::process::Command) : `ffprobe` pour les
// métadonnées, `ffmpeg` pour un flux rawvideo rgb24 sur stdout.
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans PATH.
//
// Architecture :
//   - `probe_video`       : interroge ffprobe pour obtenir width/height/fps/pix_fmt
//   - `spawn_ffmpeg_pipe` : lance ffmpeg → flux raw RGB24 natif sur stdout,
//                           stderr journalisé dans un fichier temporaire
//   - `FfmpegSource`      : `FrameSource` qui lit une frame par appel, buffer réutilisé

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};

use af_core::error::CoreError;
use af_core::frame::FrameBuffer;
use af_core::traits::{FrameSource, StreamInfo};

/// Canaux du flux rawvideo (`-pix_fmt rgb24`).
const PIPE_CHANNELS: u8 = 3;

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable, échoue, ou si le fichier
/// ne contient aucun flux vidéo décodable.
///
/// # Example
/// ```no_run
/// use af_source::video::probe_video;
/// use std::path::Path;
/// let info = probe_video(Path::new("video.mkv")).unwrap();
/// println!("{}x{} @ {}", info.width, info.height, info.fps);
/// ```
pub fn probe_video(path: &Path) -> Result<StreamInfo> {
    let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate,pix_fmt",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            path_str,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| CoreError::Decode(format!("impossible de lancer ffprobe : {e}")))
        .context("Vérifiez que ffprobe est installé et dans le PATH.")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CoreError::Decode(format!(
            "ffprobe a échoué ({}) : {}",
            output.status,
            stderr.trim()
        ))
        .into());
    }

    let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("Flux vidéo illisible dans {}", path.display()))?;

    log::info!(
        "probe_video: {}x{} @ {:.3}fps ({}) : {}",
        info.width,
        info.height,
        info.fps,
        info.pixel_format,
        path.display()
    );

    Ok(info)
}

/// Parse `key=value` lines printed by ffprobe.
///
/// Width and height are mandatory; a missing or `0/0` frame rate yields
/// `fps == 0.0`, left for the player to floor.
///
/// # Errors
/// [`CoreError::Decode`] if no video stream dimensions are present.
///
/// # Example
/// ```
/// use af_source::video::parse_probe_output;
/// let info = parse_probe_output("width=640\nheight=360\nr_frame_rate=30000/1001\npix_fmt=yuv420p\n").unwrap();
/// assert_eq!((info.width, info.height), (640, 360));
/// assert!((info.fps - 29.97).abs() < 0.01);
/// ```
pub fn parse_probe_output(text: &str) -> Result<StreamInfo, CoreError> {
    let mut width: u32 = 0;
    let mut height: u32 = 0;
    let mut fps: f64 = 0.0;
    let mut pixel_format = String::from("unknown");

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // Format: "24/1" ou "30000/1001" ou "0/0"
            let mut parts = val.trim().splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            fps = if den > 0.0 { num / den } else { 0.0 };
        } else if let Some(val) = line.strip_prefix("pix_fmt=") {
            pixel_format = val.trim().to_string();
        }
    }

    if width == 0 || height == 0 {
        return Err(CoreError::Decode("aucun flux vidéo trouvé".into()));
    }

    Ok(StreamInfo {
        width,
        height,
        fps,
        pixel_format,
    })
}

/// Octets de stderr ffmpeg repris dans un message d'erreur.
const STDERR_TAIL: u64 = 2048;

/// Arguments `ffmpeg` pour un flux rawvideo rgb24 à la géométrie sondée.
///
/// `-noautorotate` garde l'orientation codée, celle que rapporte ffprobe, et
/// `scale` épingle la taille de sortie : chaque frame fait exactement
/// `width × height × 3` octets, quelles que soient les métadonnées du conteneur.
///
/// # Example
/// ```
/// use af_core::traits::StreamInfo;
/// use af_source::video::ffmpeg_args;
/// let info = StreamInfo { width: 640, height: 360, fps: 30.0, pixel_format: "yuv420p".into() };
/// let args = ffmpeg_args("clip.mp4", &info);
/// assert!(args.windows(2).any(|w| w == ["-vf", "scale=640:360"]));
/// ```
#[must_use]
pub fn ffmpeg_args(path: &str, info: &StreamInfo) -> Vec<String> {
    let scale_filter = format!("scale={}:{}", info.width, info.height);
    [
        "-nostdin",
        "-noautorotate", // orientation codée, comme ffprobe
        "-i",
        path, // fichier source
        "-map",
        "0:v:0", // premier flux vidéo uniquement
        "-vf",
        &scale_filter, // taille épinglée
        "-f",
        "rawvideo", // format raw
        "-pix_fmt",
        "rgb24", // RGB 3 bytes/pixel
        "-an",   // pas d'audio dans ce pipe
        "-hide_banner",
        "-loglevel",
        "error",
        "pipe:1", // stdout
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Lance un processus `ffmpeg` qui écrit des frames RGB24 brutes sur stdout.
///
/// Chaque frame = `w × h × 3` bytes (row-major, sans padding), à la
/// résolution native : la mise à l'échelle vers la grille est faite par le
/// `Resizer`. Le stderr de ffmpeg va dans `stderr_log`, un fichier plutôt
/// qu'un pipe : il ne peut pas se remplir et bloquer le décodeur.
///
/// # Errors
/// [`CoreError::Decode`] if `ffmpeg` cannot be spawned.
pub fn spawn_ffmpeg_pipe(path: &Path, info: &StreamInfo, stderr_log: File) -> Result<Child> {
    let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;

    let child = Command::new("ffmpeg")
        .args(ffmpeg_args(path_str, info))
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::from(stderr_log))
        .spawn()
        .map_err(|e| CoreError::Decode(format!("impossible de lancer ffmpeg : {e}")))?;

    log::debug!("ffmpeg spawné (pid {}) pour {}", child.id(), path.display());
    Ok(child)
}

/// Fin du journal stderr (au plus `STDERR_TAIL` octets), nettoyée des blancs.
///
/// # Errors
/// `Err` si le journal ne peut pas être relu.
pub fn stderr_tail<R: Read + Seek>(log: &mut R) -> Result<String> {
    let len = log.seek(SeekFrom::End(0))?;
    log.seek(SeekFrom::Start(len.saturating_sub(STDERR_TAIL)))?;
    let mut bytes = Vec::new();
    log.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).trim().to_string())
}

/// Lit jusqu'à `buf.len()` bytes depuis `reader`, en s'arrêtant à EOF.
///
/// Retourne le nombre d'octets lus : `buf.len()` pour une frame complète,
/// 0 sur EOF propre, une valeur intermédiaire pour une frame tronquée.
///
/// # Errors
/// `Err` sur erreur I/O fatale.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break, // EOF
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(total)
}

/// Source vidéo ffmpeg : une frame RGB24 native par `read_frame`.
///
/// Le processus est tué et réclamé au `Drop`, y compris sur les chemins
/// d'erreur.
///
/// # Example
/// ```no_run
/// use af_core::traits::FrameSource;
/// use af_source::video::FfmpegSource;
/// use std::path::Path;
/// let mut source = FfmpegSource::open(Path::new("video.mkv")).unwrap();
/// while let Some(frame) = source.read_frame().unwrap() {
///     println!("{}x{}", frame.width(), frame.height());
/// }
/// ```
pub struct FfmpegSource {
    info: StreamInfo,
    child: Child,
    stdout: ChildStdout,
    frame: FrameBuffer,
    /// Fin des données atteinte sur le pipe.
    eof: bool,
    /// Processus déjà attendu (statut de sortie lu).
    reaped: bool,
    frames_read: u64,
    /// Journal stderr de ffmpeg, relu si le décodeur échoue.
    stderr_log: File,
}

impl FfmpegSource {
    /// Probe `path`, spawn the decoder and allocate the frame buffer.
    ///
    /// # Errors
    /// Any probe, spawn or allocation failure.
    pub fn open(path: &Path) -> Result<Self> {
        let info = probe_video(path)?;
        let frame = FrameBuffer::try_new(info.width, info.height, PIPE_CHANNELS)?;
        let stderr_log = tempfile::tempfile().context("Journal stderr ffmpeg impossible à créer")?;
        let mut child = spawn_ffmpeg_pipe(path, &info, stderr_log.try_clone()?)?;
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CoreError::Decode("stdout ffmpeg indisponible".into()).into());
        };
        Ok(Self {
            info,
            child,
            stdout,
            frame,
            eof: false,
            reaped: false,
            frames_read: 0,
            stderr_log,
        })
    }

    fn decoder_failure(&mut self, status: ExitStatus) -> CoreError {
        let tail = stderr_tail(&mut self.stderr_log).unwrap_or_default();
        CoreError::Decode(decoder_failure_message(status, &tail))
    }
}

/// Message d'échec du décodeur : statut, puis la fin de son stderr s'il en a écrit.
fn decoder_failure_message(status: ExitStatus, stderr: &str) -> String {
    if stderr.is_empty() {
        format!("ffmpeg a terminé avec {status}")
    } else {
        format!("ffmpeg a terminé avec {status} : {stderr}")
    }
}

impl FrameSource for FfmpegSource {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn read_frame(&mut self) -> Result<Option<&FrameBuffer>> {
        if self.eof {
            return Ok(None);
        }
        let expected = self.frame.data().len();
        let n = read_exact_or_eof(&mut self.stdout, self.frame.data_mut())
            .context("Erreur de lecture du pipe ffmpeg")?;
        if n == expected {
            self.frames_read += 1;
            return Ok(Some(&self.frame));
        }
        if n > 0 {
            log::warn!("Dernière frame tronquée ({n}/{expected} octets), ignorée.");
        }
        log::info!("ffmpeg: fin du flux après {} frames.", self.frames_read);
        self.eof = true;
        Ok(None)
    }

    fn drain_frame(&mut self) -> Result<Option<&FrameBuffer>> {
        // Le pipe rawvideo ne retient rien : vider revient à réclamer le
        // processus et vérifier qu'il a décodé sans erreur.
        if !self.reaped {
            let status = self.child.wait().context("Attente de ffmpeg impossible")?;
            self.reaped = true;
            if !status.success() {
                return Err(self.decoder_failure(status).into());
            }
        }
        Ok(None)
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn probe_output_variants() {
        let info = parse_probe_output("width=1920\nheight=1080\nr_frame_rate=24/1\npix_fmt=yuv420p").unwrap();
        assert_eq!(info.width, 1920);
        assert!((info.fps - 24.0).abs() < f64::EPSILON);
        assert_eq!(info.pixel_format, "yuv420p");

        // Métadonnées corrompues : fps nul, plancher appliqué plus tard.
        let info = parse_probe_output("width=320\nheight=240\nr_frame_rate=0/0\n").unwrap();
        assert!(info.fps.abs() < f64::EPSILON);
        assert_eq!(info.pixel_format, "unknown");
    }

    #[test]
    fn probe_without_stream_is_a_decode_error() {
        assert!(matches!(parse_probe_output(""), Err(CoreError::Decode(_))));
        assert!(matches!(
            parse_probe_output("width=N/A\nheight=N/A\n"),
            Err(CoreError::Decode(_))
        ));
    }

    #[test]
    fn read_exact_or_eof_reports_partial_frames() {
        let mut full = Cursor::new(vec![7u8; 12]);
        let mut buf = [0u8; 6];
        assert_eq!(read_exact_or_eof(&mut full, &mut buf).unwrap(), 6);
        assert_eq!(read_exact_or_eof(&mut full, &mut buf).unwrap(), 6);
        assert_eq!(read_exact_or_eof(&mut full, &mut buf).unwrap(), 0);

        let mut short = Cursor::new(vec![1u8; 4]);
        assert_eq!(read_exact_or_eof(&mut short, &mut buf).unwrap(), 4);
    }

    fn portrait_clip() -> StreamInfo {
        // Géométrie codée d'un clip téléphone avec rotation -90 dans le conteneur.
        StreamInfo {
            width: 1920,
            height: 1080,
            fps: 30.0,
            pixel_format: "yuv420p".into(),
        }
    }

    #[test]
    fn decoder_output_is_pinned_to_probed_geometry() {
        let args = ffmpeg_args("/tmp/clip.mp4", &portrait_clip());
        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();

        assert!(pos("-noautorotate") < pos("-i"));
        assert_eq!(args[pos("-i") + 1], "/tmp/clip.mp4");
        assert_eq!(args[pos("-vf") + 1], "scale=1920:1080");
        assert_eq!(args[pos("-pix_fmt") + 1], "rgb24");
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
    }

    #[test]
    fn stderr_tail_keeps_the_last_bytes() {
        let mut short = Cursor::new(b"  Invalid data found when processing input\n".to_vec());
        assert_eq!(
            stderr_tail(&mut short).unwrap(),
            "Invalid data found when processing input"
        );

        let mut long = Cursor::new([b"x".repeat(5000), b"fin".to_vec()].concat());
        let tail = stderr_tail(&mut long).unwrap();
        assert_eq!(tail.len(), STDERR_TAIL as usize);
        assert!(tail.ends_with("fin"));

        assert_eq!(stderr_tail(&mut Cursor::new(Vec::new())).unwrap(), "");
    }

    #[cfg(unix)]
    #[test]
    fn decoder_failure_reports_stderr() {
        use std::os::unix::process::ExitStatusExt;
        let status = ExitStatus::from_raw(1 << 8);
        let msg = decoder_failure_message(status, "moov atom not found");
        assert!(msg.contains("exit status: 1"), "{msg}");
        assert!(msg.ends_with("moov atom not found"));
        assert!(!decoder_failure_message(status, "").contains(" : "));
    }

    #[test]
    fn open_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FfmpegSource::open(&dir.path().join("absent.mkv")).is_err());
    }
}
