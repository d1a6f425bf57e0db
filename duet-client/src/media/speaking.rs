/// Average spectrum magnitude above which the speaker counts as talking.
pub const SPEAKING_THRESHOLD: f32 = 10.0;

#[derive(Debug, Clone, Copy)]
pub struct SpeakingDetector {
    threshold: f32,
}

impl SpeakingDetector {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// `spectrum` is one frame of byte frequency magnitudes.
    pub fn is_speaking(&self, spectrum: &[u8], muted: bool) -> bool {
        if muted || spectrum.is_empty() {
            return false;
        }
        let total: u64 = spectrum.iter().map(|&b| u64::from(b)).sum();
        let average = total as f32 / spectrum.len() as f32;
        average > self.threshold
    }
}

impl Default for SpeakingDetector {
    fn default() -> Self {
        Self::new(SPEAKING_THRESHOLD)
    }
}
