use crate::MediaError;
use crate::media::{LocalStream, MediaControls, MediaSource, SpeakingDetector};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Opus frame that decodes to 20ms of silence.
const OPUS_SILENCE_FRAME: [u8; 3] = [0xf8, 0xff, 0xfe];
/// Header-only VP8 key frame for a 16x16 picture.
const VP8_BLANK_FRAME: [u8; 10] = [0x10, 0x02, 0x00, 0x9d, 0x01, 0x2a, 0x10, 0x00, 0x10, 0x00];
const VIDEO_FRAME_DURATION: Duration = Duration::from_millis(33);
const STREAM_ID: &str = "duet";

const SPECTRUM_BINS: usize = 128;
const VOICE_MAGNITUDE: u8 = 48;

/// Alternating voice activity reported alongside the silent audio.
#[derive(Debug, Clone, Copy)]
pub struct TalkSpurts {
    pub talk: Duration,
    pub pause: Duration,
}

impl TalkSpurts {
    fn is_talking(&self, elapsed: Duration) -> bool {
        let cycle = (self.talk + self.pause).as_millis();
        if cycle == 0 {
            return false;
        }
        elapsed.as_millis() % cycle < self.talk.as_millis()
    }
}

/// Capture without devices: silent opus audio and a blank VP8 picture.
#[derive(Debug, Clone)]
pub struct SyntheticCapture {
    frame_duration: Duration,
    talk_spurts: Option<TalkSpurts>,
    detector: SpeakingDetector,
}

impl SyntheticCapture {
    pub fn new(frame_duration: Duration) -> Self {
        Self {
            frame_duration,
            talk_spurts: None,
            detector: SpeakingDetector::default(),
        }
    }

    /// Makes the audio pump report voice activity in a talk/pause cycle.
    pub fn with_talk_spurts(mut self, talk: Duration, pause: Duration) -> Self {
        self.talk_spurts = Some(TalkSpurts { talk, pause });
        self
    }
}

impl Default for SyntheticCapture {
    fn default() -> Self {
        Self::new(Duration::from_millis(20))
    }
}

#[async_trait]
impl MediaSource for SyntheticCapture {
    async fn create_local_capture(&self) -> Result<LocalStream, MediaError> {
        if self.frame_duration.is_zero() {
            return Err(MediaError::Unavailable(
                "frame duration must be positive".to_owned(),
            ));
        }

        let audio = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                ..Default::default()
            },
            "audio".to_owned(),
            STREAM_ID.to_owned(),
        ));
        let video = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                ..Default::default()
            },
            "video".to_owned(),
            STREAM_ID.to_owned(),
        ));
        let controls = Arc::new(MediaControls::new());

        let pumps = vec![
            tokio::spawn(pump_audio(
                audio.clone(),
                controls.clone(),
                self.clone(),
            )),
            tokio::spawn(pump_video(video.clone(), controls.clone())),
        ];

        Ok(LocalStream::new(audio, video, controls, pumps))
    }
}

async fn pump_audio(
    track: Arc<TrackLocalStaticSample>,
    controls: Arc<MediaControls>,
    capture: SyntheticCapture,
) {
    let frame_duration = capture.frame_duration;
    let mut ticker = tokio::time::interval(frame_duration);
    let mut elapsed = Duration::ZERO;
    let mut spectrum = [0u8; SPECTRUM_BINS];

    loop {
        ticker.tick().await;

        let talking = capture
            .talk_spurts
            .is_some_and(|spurts| spurts.is_talking(elapsed));
        elapsed += frame_duration;
        spectrum.fill(if talking { VOICE_MAGNITUDE } else { 0 });

        let muted = controls.is_muted();
        controls.set_speaking(capture.detector.is_speaking(&spectrum, muted));
        if muted {
            continue;
        }

        controls.count_audio_frame();
        let sample = Sample {
            data: Bytes::from_static(&OPUS_SILENCE_FRAME),
            duration: frame_duration,
            ..Default::default()
        };
        if let Err(e) = track.write_sample(&sample).await {
            debug!("Dropping silence frame: {}", e);
        }
    }
}

async fn pump_video(track: Arc<TrackLocalStaticSample>, controls: Arc<MediaControls>) {
    let mut ticker = tokio::time::interval(VIDEO_FRAME_DURATION);
    loop {
        ticker.tick().await;
        if controls.is_camera_off() {
            continue;
        }

        controls.count_video_frame();
        let sample = Sample {
            data: Bytes::from_static(&VP8_BLANK_FRAME),
            duration: VIDEO_FRAME_DURATION,
            ..Default::default()
        };
        if let Err(e) = track.write_sample(&sample).await {
            debug!("Dropping video frame: {}", e);
        }
    }
}
