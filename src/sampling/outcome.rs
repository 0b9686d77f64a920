//! Verdicts and per-lifetime statistics

/// Sampling verdict for one item
///
/// Renders as the literal markers `Sampled` / `Not Sampled`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Decision {
    #[cfg_attr(feature = "serde", serde(rename = "Sampled"))]
    Sampled,
    #[cfg_attr(feature = "serde", serde(rename = "Not Sampled"))]
    NotSampled,
}

impl Decision {
    /// Output marker for this verdict
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Sampled => "Sampled",
            Decision::NotSampled => "Not Sampled",
        }
    }

    #[inline]
    pub fn is_sampled(self) -> bool {
        self == Decision::Sampled
    }
}

impl From<bool> for Decision {
    fn from(sampled: bool) -> Self {
        if sampled {
            Decision::Sampled
        } else {
            Decision::NotSampled
        }
    }
}

impl core::fmt::Display for Decision {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detailed result of processing one item
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    /// Hash landed in the untracked part of the space; state unchanged
    Virtual { bucket: usize },
    /// Bucket was already set this lifetime; state unchanged
    Duplicate { bucket: usize },
    /// Bucket went from unset to set
    FirstHit {
        bucket: usize,
        /// Probability used for this draw; `+inf` once the real part is full
        adjusted_probability: f64,
        decision: Decision,
    },
}

impl Outcome {
    pub fn decision(&self) -> Decision {
        match self {
            Outcome::Virtual { .. } | Outcome::Duplicate { .. } => Decision::NotSampled,
            Outcome::FirstHit { decision, .. } => *decision,
        }
    }

    pub fn bucket(&self) -> usize {
        match self {
            Outcome::Virtual { bucket }
            | Outcome::Duplicate { bucket }
            | Outcome::FirstHit { bucket, .. } => *bucket,
        }
    }

    pub fn is_first_hit(&self) -> bool {
        matches!(self, Outcome::FirstHit { .. })
    }
}

/// Counters for the current filter lifetime
///
/// `processed == virtual_hits + duplicates + first_hits` always holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterStats {
    /// Items passed to the filter
    pub processed: u64,
    /// Items rejected because they hashed into the virtual part
    pub virtual_hits: u64,
    /// Items rejected because their bucket was already set
    pub duplicates: u64,
    /// Items that set a previously unset bucket
    pub first_hits: u64,
    /// First hits that were sampled
    pub sampled: u64,
    /// Buckets of the real part still unset
    pub zero_count: usize,
    /// Buckets in the real part
    pub real_size: usize,
}

impl FilterStats {
    /// Fraction of first hits that were sampled
    pub fn sampled_fraction(&self) -> f64 {
        if self.first_hits == 0 {
            0.0
        } else {
            self.sampled as f64 / self.first_hits as f64
        }
    }

    /// Fraction of the real part already set
    pub fn fill_ratio(&self) -> f64 {
        if self.real_size == 0 {
            return 0.0;
        }
        (self.real_size - self.zero_count) as f64 / self.real_size as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers() {
        assert_eq!(Decision::Sampled.to_string(), "Sampled");
        assert_eq!(Decision::NotSampled.to_string(), "Not Sampled");
        assert_eq!(Decision::from(true), Decision::Sampled);
        assert!(!Decision::from(false).is_sampled());
    }

    #[test]
    fn test_outcome_decision() {
        assert_eq!(Outcome::Virtual { bucket: 9 }.decision(), Decision::NotSampled);
        assert_eq!(Outcome::Duplicate { bucket: 1 }.decision(), Decision::NotSampled);

        let hit = Outcome::FirstHit {
            bucket: 3,
            adjusted_probability: 0.4,
            decision: Decision::Sampled,
        };
        assert_eq!(hit.decision(), Decision::Sampled);
        assert_eq!(hit.bucket(), 3);
        assert!(hit.is_first_hit());
    }

    #[test]
    fn test_stats_ratios() {
        let stats = FilterStats {
            processed: 10,
            virtual_hits: 2,
            duplicates: 4,
            first_hits: 4,
            sampled: 1,
            zero_count: 6,
            real_size: 10,
        };
        assert!((stats.sampled_fraction() - 0.25).abs() < 1e-12);
        assert!((stats.fill_ratio() - 0.4).abs() < 1e-12);
        assert_eq!(FilterStats::default().sampled_fraction(), 0.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_decision_serde() {
        let json = serde_json::to_string(&Decision::NotSampled).unwrap();
        assert_eq!(json, "\"Not Sampled\"");
        let back: Decision = serde_json::from_str("\"Sampled\"").unwrap();
        assert_eq!(back, Decision::Sampled);
    }
}
