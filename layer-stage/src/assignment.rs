/// Number of discrete mouth/eye openness levels.
pub const LEVELS: usize = 5;

/// Layer paths assigned to each openness level. A level may hold several
/// simultaneous layers, or none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameAssignment {
    levels: [Vec<String>; LEVELS],
}

impl FrameAssignment {
    pub fn new(levels: [Vec<String>; LEVELS]) -> Self {
        Self { levels }
    }

    pub fn assign(&mut self, level: usize, path: impl Into<String>) {
        if level < LEVELS {
            self.levels[level].push(path.into());
        }
    }

    pub fn assigned(&self, level: usize) -> &[String] {
        &self.levels[level]
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(|paths| paths.is_empty())
    }

    /// Whether any level assigns `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.levels
            .iter()
            .any(|paths| paths.iter().any(|p| p == path))
    }

    /// Fill unassigned levels from the nearest assigned level so gaps in the
    /// configuration degrade to the closest configured expression. The search
    /// prefers the closest lower index; equidistant ties also go lower.
    pub fn resolved(&self) -> ResolvedFrames {
        let mut levels: [Vec<String>; LEVELS] = Default::default();
        for (i, slot) in levels.iter_mut().enumerate() {
            if !self.levels[i].is_empty() {
                *slot = self.levels[i].clone();
                continue;
            }
            for distance in 1..LEVELS {
                if i >= distance && !self.levels[i - distance].is_empty() {
                    *slot = self.levels[i - distance].clone();
                    break;
                }
                let higher = i + distance;
                if higher < LEVELS && !self.levels[higher].is_empty() {
                    *slot = self.levels[higher].clone();
                    break;
                }
            }
        }
        ResolvedFrames { levels }
    }
}

/// A [`FrameAssignment`] with nearest-neighbor gaps already filled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFrames {
    levels: [Vec<String>; LEVELS],
}

impl ResolvedFrames {
    pub fn active(&self, level: u8) -> &[String] {
        &self.levels[(level as usize).min(LEVELS - 1)]
    }

    /// Whether `path` is active for `level`. `None` is the sentinel "no frame
    /// active" level, so nothing matches it.
    pub fn is_active(&self, level: Option<u8>, path: &str) -> bool {
        match level {
            Some(level) => self.active(level).iter().any(|p| p == path),
            None => false,
        }
    }
}
