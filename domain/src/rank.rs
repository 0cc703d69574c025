use serde::Serialize;
use thiserror::Error;

use crate::Rating;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RankTableError {
    #[error("rank table has no tiers")]
    Empty,

    #[error("lowest tier {tier} must have an open lower bound")]
    BoundedBottom { tier: String },

    #[error("highest tier {tier} must have an open upper bound")]
    BoundedTop { tier: String },

    #[error("tier {tier} has an open bound in the middle of the table")]
    OpenInterior { tier: String },

    #[error("tier {tier} has a non-finite bound")]
    NonFiniteBound { tier: String },

    #[error("tier {tier} is empty: lower bound {min} is not below upper bound {max}")]
    EmptyInterval { tier: String, min: f64, max: f64 },

    #[error("tiers {lower} and {upper} do not meet: {lower} ends at {end}, {upper} starts at {start}")]
    Discontiguous {
        lower: String,
        upper: String,
        end: f64,
        start: f64,
    },

    #[error("tier name {0} is declared more than once")]
    DuplicateName(String),
}

/// A named rating interval `(min, max]`. `None` bounds are open (infinite).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankTier {
    name: String,
    min: Option<f64>,
    max: Option<f64>,
}

impl RankTier {
    pub fn new(
        name: impl Into<String>,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    pub fn contains(
        &self,
        rating: Rating,
    ) -> bool {
        let above_min = self.min.is_none_or(|min| rating.value() > min);
        let within_max = self.max.is_none_or(|max| rating.value() <= max);
        above_min && within_max
    }

    pub fn is_named(
        &self,
        name: &str,
    ) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Ascending tiers that partition the whole rating axis.
#[derive(Debug, Clone)]
pub struct RankTable {
    tiers: Vec<RankTier>,
}

impl RankTable {
    pub fn new(tiers: Vec<RankTier>) -> Result<Self, RankTableError> {
        validate(&tiers)?;
        Ok(Self { tiers })
    }

    /// The Starlight ranked ladder.
    pub fn standard() -> Result<Self, RankTableError> {
        Self::new(standard_tiers())
    }

    pub fn tiers(&self) -> &[RankTier] {
        &self.tiers
    }

    pub fn tier_for(
        &self,
        rating: Option<Rating>,
    ) -> Option<&RankTier> {
        let rating = rating?;
        self.tiers.iter().find(|tier| tier.contains(rating))
    }

    pub fn index_of(
        &self,
        tier: &RankTier,
    ) -> Option<usize> {
        self.tiers.iter().position(|t| t.is_named(tier.name()))
    }

    /// True if `name` matches any declared tier, ignoring ASCII case.
    pub fn is_rank_name(
        &self,
        name: &str,
    ) -> bool {
        self.tiers.iter().any(|t| t.is_named(name))
    }
}

pub fn standard_tiers() -> Vec<RankTier> {
    vec![
        RankTier::new("Earth", None, Some(500.0)),
        RankTier::new("Stardust", Some(500.0), Some(700.0)),
        RankTier::new("Meteor", Some(700.0), Some(900.0)),
        RankTier::new("Comet", Some(900.0), Some(1100.0)),
        RankTier::new("Moon", Some(1100.0), Some(1300.0)),
        RankTier::new("Star", Some(1300.0), Some(1500.0)),
        RankTier::new("Nebula", Some(1500.0), Some(1700.0)),
        RankTier::new("Pulsar", Some(1700.0), Some(1900.0)),
        RankTier::new("Quasar", Some(1900.0), Some(2200.0)),
        RankTier::new("Nova", Some(2200.0), Some(2500.0)),
        RankTier::new("Supernova", Some(2500.0), None),
    ]
}

fn validate(tiers: &[RankTier]) -> Result<(), RankTableError> {
    let (Some(first), Some(last)) = (tiers.first(), tiers.last()) else {
        return Err(RankTableError::Empty);
    };
    if first.min.is_some() {
        return Err(RankTableError::BoundedBottom {
            tier: first.name.clone(),
        });
    }
    if last.max.is_some() {
        return Err(RankTableError::BoundedTop {
            tier: last.name.clone(),
        });
    }

    for (i, tier) in tiers.iter().enumerate() {
        let bounds = [tier.min, tier.max];
        if bounds.iter().flatten().any(|b| !b.is_finite()) {
            return Err(RankTableError::NonFiniteBound {
                tier: tier.name.clone(),
            });
        }
        if (i > 0 && tier.min.is_none()) || (i + 1 < tiers.len() && tier.max.is_none()) {
            return Err(RankTableError::OpenInterior {
                tier: tier.name.clone(),
            });
        }
        if let (Some(min), Some(max)) = (tier.min, tier.max)
            && min >= max
        {
            return Err(RankTableError::EmptyInterval {
                tier: tier.name.clone(),
                min,
                max,
            });
        }
        if tiers[..i].iter().any(|earlier| earlier.is_named(&tier.name)) {
            return Err(RankTableError::DuplicateName(tier.name.clone()));
        }
    }

    for pair in tiers.windows(2) {
        let (lower, upper) = (&pair[0], &pair[1]);
        if let (Some(end), Some(start)) = (lower.max, upper.min)
            && end != start
        {
            return Err(RankTableError::Discontiguous {
                lower: lower.name.clone(),
                upper: upper.name.clone(),
                end,
                start,
            });
        }
    }
    Ok(())
}
