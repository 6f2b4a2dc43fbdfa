/// Strict comparison a metric must pass for a tier to fire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    Above(f64),
    Below(f64),
}

impl Threshold {
    pub fn admits(self, metric: f64) -> bool {
        match self {
            Self::Above(limit) => metric > limit,
            Self::Below(limit) => metric < limit,
        }
    }
}

/// One rung of a ladder: the threshold, the score it adds and its factor label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    pub threshold: Threshold,
    pub delta: u32,
    pub label: &'static str,
}

impl Tier {
    pub const fn above(limit: f64, delta: u32, label: &'static str) -> Self {
        Self {
            threshold: Threshold::Above(limit),
            delta,
            label,
        }
    }

    pub const fn below(limit: f64, delta: u32, label: &'static str) -> Self {
        Self {
            threshold: Threshold::Below(limit),
            delta,
            label,
        }
    }
}

/// Tiers checked in declaration order; only the first admitted one fires.
#[derive(Debug, Clone, Copy)]
pub struct Ladder {
    tiers: &'static [Tier],
}

impl Ladder {
    pub const fn new(tiers: &'static [Tier]) -> Self {
        Self { tiers }
    }

    pub fn first_match(&self, metric: f64) -> Option<&'static Tier> {
        if !metric.is_finite() {
            return None;
        }
        self.tiers
            .iter()
            .find(|tier| tier.threshold.admits(metric))
    }

    pub fn tiers(&self) -> &'static [Tier] {
        self.tiers
    }

    /// Largest delta this ladder can contribute.
    pub fn max_delta(&self) -> u32 {
        self.tiers.iter().map(|tier| tier.delta).max().unwrap_or(0)
    }
}
