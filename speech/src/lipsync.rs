/// Fully open mouth on the 0..4 level scale.
pub const MAX_OPENNESS: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LipSyncState {
    Closed,
    Opening,
    Open,
    Closing,
}

/// Tunables for the openness state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LipSyncConfig {
    /// Envelope magnitude above which speech counts as active.
    pub threshold: f32,
    /// Consecutive silent frames tolerated before closing begins.
    pub hold_frames: u32,
    /// Frames a full open or close transition takes.
    pub transition_frames: u32,
}

impl Default for LipSyncConfig {
    fn default() -> Self {
        Self {
            threshold: 0.15,
            hold_frames: 8,
            transition_frames: 4,
        }
    }
}

/// Debounced mouth-openness machine, updated once per animation frame with
/// the current audio envelope. The observable level is the rounded openness.
#[derive(Debug, Clone)]
pub struct LipSync {
    state: LipSyncState,
    openness: f32,
    silent_frames: u32,
    threshold: f32,
    hold_frames: u32,
    step: f32,
}

impl LipSync {
    pub fn new(config: LipSyncConfig) -> Self {
        Self {
            state: LipSyncState::Closed,
            openness: 0.0,
            silent_frames: 0,
            threshold: config.threshold,
            hold_frames: config.hold_frames,
            step: MAX_OPENNESS / config.transition_frames.max(1) as f32,
        }
    }

    pub fn state(&self) -> LipSyncState {
        self.state
    }

    pub fn openness(&self) -> f32 {
        self.openness
    }

    /// Current discrete level 0..4, for indexing frame assignments.
    pub fn level(&self) -> u8 {
        self.openness.round().clamp(0.0, MAX_OPENNESS) as u8
    }

    /// Advance one frame with the current envelope magnitude.
    pub fn update(&mut self, envelope: f32) -> u8 {
        let speaking = envelope > self.threshold;
        match self.state {
            LipSyncState::Closed => {
                if speaking {
                    self.state = LipSyncState::Opening;
                }
            }
            LipSyncState::Opening => {
                self.openness = (self.openness + self.step).min(MAX_OPENNESS);
                if self.openness >= MAX_OPENNESS {
                    self.state = LipSyncState::Open;
                    self.silent_frames = 0;
                }
            }
            LipSyncState::Open => {
                if speaking {
                    self.silent_frames = 0;
                } else {
                    self.silent_frames += 1;
                    if self.silent_frames > self.hold_frames {
                        self.state = LipSyncState::Closing;
                        self.silent_frames = 0;
                    }
                }
            }
            LipSyncState::Closing => {
                if speaking {
                    // reopen right away, no need to fully close first
                    self.state = LipSyncState::Opening;
                } else {
                    self.openness = (self.openness - self.step).max(0.0);
                    if self.openness <= 0.0 {
                        self.state = LipSyncState::Closed;
                    }
                }
            }
        }
        self.level()
    }

    /// Back to closed, openness zero.
    pub fn reset(&mut self) {
        self.state = LipSyncState::Closed;
        self.openness = 0.0;
        self.silent_frames = 0;
    }
}

/// Root mean square amplitude of an audio buffer.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|v| v * v).sum();
    (sum / samples.len() as f32).sqrt()
}
