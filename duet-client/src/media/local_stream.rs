use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// State shared between a stream and its sample pumps.
#[derive(Debug)]
pub struct MediaControls {
    muted: AtomicBool,
    camera_off: AtomicBool,
    speaking: watch::Sender<bool>,
    audio_frames: AtomicU64,
    video_frames: AtomicU64,
}

impl MediaControls {
    pub fn new() -> Self {
        let (speaking, _) = watch::channel(false);
        Self {
            muted: AtomicBool::new(false),
            camera_off: AtomicBool::new(false),
            speaking,
            audio_frames: AtomicU64::new(0),
            video_frames: AtomicU64::new(0),
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    pub fn is_camera_off(&self) -> bool {
        self.camera_off.load(Ordering::Relaxed)
    }

    pub fn is_speaking(&self) -> bool {
        *self.speaking.borrow()
    }

    /// Audio frames handed to the track so far.
    pub fn audio_frames(&self) -> u64 {
        self.audio_frames.load(Ordering::Relaxed)
    }

    /// Video frames handed to the track so far.
    pub fn video_frames(&self) -> u64 {
        self.video_frames.load(Ordering::Relaxed)
    }

    pub(crate) fn set_speaking(&self, speaking: bool) {
        self.speaking.send_if_modified(|current| {
            let changed = *current != speaking;
            *current = speaking;
            changed
        });
    }

    pub(crate) fn count_audio_frame(&self) {
        self.audio_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_video_frame(&self) {
        self.video_frames.fetch_add(1, Ordering::Relaxed);
    }

    fn toggle(flag: &AtomicBool) -> bool {
        !flag.fetch_xor(true, Ordering::Relaxed)
    }
}

impl Default for MediaControls {
    fn default() -> Self {
        Self::new()
    }
}

/// Local capture: one audio and one video track plus their controls.
pub struct LocalStream {
    audio: Arc<TrackLocalStaticSample>,
    video: Arc<TrackLocalStaticSample>,
    controls: Arc<MediaControls>,
    pumps: Vec<JoinHandle<()>>,
}

impl LocalStream {
    pub fn new(
        audio: Arc<TrackLocalStaticSample>,
        video: Arc<TrackLocalStaticSample>,
        controls: Arc<MediaControls>,
        pumps: Vec<JoinHandle<()>>,
    ) -> Self {
        Self {
            audio,
            video,
            controls,
            pumps,
        }
    }

    pub fn audio(&self) -> &Arc<TrackLocalStaticSample> {
        &self.audio
    }

    pub fn video(&self) -> &Arc<TrackLocalStaticSample> {
        &self.video
    }

    pub fn tracks(&self) -> Vec<Arc<dyn TrackLocal + Send + Sync>> {
        vec![
            Arc::clone(&self.audio) as Arc<dyn TrackLocal + Send + Sync>,
            Arc::clone(&self.video) as Arc<dyn TrackLocal + Send + Sync>,
        ]
    }

    pub fn controls(&self) -> &Arc<MediaControls> {
        &self.controls
    }

    /// Flips the audio enabled flag and returns the new muted state.
    pub fn toggle_mute(&self) -> bool {
        let muted = MediaControls::toggle(&self.controls.muted);
        info!("Microphone {}", if muted { "muted" } else { "unmuted" });
        if muted {
            self.controls.set_speaking(false);
        }
        muted
    }

    /// Flips the video enabled flag and returns the new camera-off state.
    pub fn toggle_camera(&self) -> bool {
        let off = MediaControls::toggle(&self.controls.camera_off);
        info!("Camera {}", if off { "off" } else { "on" });
        off
    }

    pub fn is_muted(&self) -> bool {
        self.controls.is_muted()
    }

    pub fn is_camera_off(&self) -> bool {
        self.controls.is_camera_off()
    }

    pub fn is_speaking(&self) -> bool {
        self.controls.is_speaking()
    }

    /// Yields the speaking indicator each time it flips.
    pub fn speaking_changes(&self) -> watch::Receiver<bool> {
        self.controls.speaking.subscribe()
    }
}

impl Drop for LocalStream {
    fn drop(&mut self) {
        for pump in self.pumps.drain(..) {
            pump.abort();
        }
    }
}
