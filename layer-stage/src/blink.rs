use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Debug, Clone, Copy)]
enum BlinkState {
    Idle { frames_left: u32 },
    Closing { frame: u32 },
    Opening { frame: u32 },
}

/// Eye-blink driver, ticked once per animation frame. Waits a jittered
/// interval, ramps the eye level 0..4 over `speed` frames and back down,
/// then schedules the next blink.
pub struct BlinkDriver {
    interval_secs: f32,
    speed: u32,
    frame_rate: f32,
    enabled: bool,
    state: BlinkState,
    rng: StdRng,
}

impl BlinkDriver {
    pub fn new(interval_secs: f32, speed: u32, frame_rate: f32, enabled: bool) -> Self {
        Self::with_rng(
            interval_secs,
            speed,
            frame_rate,
            enabled,
            StdRng::from_entropy(),
        )
    }

    /// Deterministic driver for tests.
    pub fn seeded(interval_secs: f32, speed: u32, frame_rate: f32, enabled: bool, seed: u64) -> Self {
        Self::with_rng(
            interval_secs,
            speed,
            frame_rate,
            enabled,
            StdRng::seed_from_u64(seed),
        )
    }

    fn with_rng(interval_secs: f32, speed: u32, frame_rate: f32, enabled: bool, rng: StdRng) -> Self {
        let mut driver = Self {
            interval_secs,
            speed: speed.max(1),
            frame_rate,
            enabled,
            state: BlinkState::Idle { frames_left: 0 },
            rng,
        };
        driver.reset();
        driver
    }

    /// Cancel any in-flight ramp and schedule a fresh interval.
    pub fn reset(&mut self) {
        let frames_left = self.next_delay_frames();
        self.state = BlinkState::Idle { frames_left };
    }

    /// Advance one frame and return the current eye level.
    pub fn tick(&mut self) -> u8 {
        if !self.enabled {
            return 0;
        }
        match self.state {
            BlinkState::Idle { frames_left } => {
                if frames_left == 0 {
                    self.state = BlinkState::Closing { frame: 0 };
                } else {
                    self.state = BlinkState::Idle {
                        frames_left: frames_left - 1,
                    };
                }
                0
            }
            BlinkState::Closing { frame } => {
                let frame = frame + 1;
                let level = ramp_level(frame, self.speed);
                self.state = if frame >= self.speed {
                    BlinkState::Opening { frame: 0 }
                } else {
                    BlinkState::Closing { frame }
                };
                level
            }
            BlinkState::Opening { frame } => {
                let frame = frame + 1;
                let level = ramp_level(self.speed.saturating_sub(frame), self.speed);
                if frame >= self.speed {
                    let frames_left = self.next_delay_frames();
                    self.state = BlinkState::Idle { frames_left };
                    0
                } else {
                    self.state = BlinkState::Opening { frame };
                    level
                }
            }
        }
    }

    // interval +- 20% jitter, converted to frames
    fn next_delay_frames(&mut self) -> u32 {
        let jitter = self.rng.gen_range(-0.2..=0.2) * self.interval_secs;
        let secs = (self.interval_secs + jitter).max(0.0);
        ((secs * self.frame_rate) as u32).max(1)
    }
}

fn ramp_level(frame: u32, speed: u32) -> u8 {
    let ratio = frame as f32 / speed as f32;
    (ratio * 4.0).round().clamp(0.0, 4.0) as u8
}

#[cfg(test)]
mod tests {
    use crate::blink::BlinkDriver;

    #[test]
    fn disabled_driver_stays_at_zero() {
        let mut driver = BlinkDriver::seeded(3.0, 6, 60.0, false, 7);
        for _ in 0..1000 {
            assert_eq!(driver.tick(), 0);
        }
    }

    #[test]
    fn blink_ramps_to_closed_and_back() {
        let mut driver = BlinkDriver::seeded(0.05, 4, 60.0, true, 7);

        // run until a blink starts, bounded well past the jittered interval
        let mut levels = Vec::new();
        for _ in 0..600 {
            levels.push(driver.tick());
        }
        let peak = levels
            .iter()
            .position(|&l| l == 4)
            .expect("blink reaches fully closed");
        assert!(peak >= 4, "closing ramp takes speed frames");
        assert_eq!(levels[peak - 1], 3, "ramp climbs one step per frame");
        assert_eq!(levels[peak + 1], 3, "ramp descends after the peak");
        assert_eq!(levels[peak + 4], 0, "eyes reopen after speed frames");
    }

    #[test]
    fn reset_cancels_a_ramp_in_flight() {
        let mut driver = BlinkDriver::seeded(10.0, 6, 60.0, true, 1);
        for _ in 0..2000 {
            if driver.tick() > 0 {
                break;
            }
        }
        driver.reset();
        assert_eq!(driver.tick(), 0, "reset returns to idle");
    }
}
