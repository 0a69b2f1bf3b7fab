/////////////////////////////////////////////////////////////////////////////////////
//
// Outbreak model
//
// policy module
//
// the optional behaviours of the daily transition, each selected by configuration:
//     fatality     - fixed or escalated when the health care system is overloaded
//     transmission - every susceptible contact infected, or only some of them
//     demographics - closed population, or births and background deaths
//
////////////////////////////////////////////////////////////////////////////////////

use super::error::OutbreakError;
use super::utilities;
use rand::Rng;

pub const DAYS_PER_YEAR: f64 = 365.0;

// Fatality -------------------------------------------------------------------------------------------
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FatalityPolicy {
    // percent of resolved cases that die
    Fixed { percent: u32 },
    // when infectious / living exceeds `threshold`, the fatality probability is
    // multiplied by `multiplier` (never above 1)
    Overload {
        percent: u32,
        threshold: f64,
        multiplier: f64,
    },
}

impl FatalityPolicy {
    pub fn fixed(percent: u32) -> FatalityPolicy {
        FatalityPolicy::Fixed { percent }
    }

    // 25% prevalence doubles the fatality rate
    pub fn overload(percent: u32) -> FatalityPolicy {
        FatalityPolicy::Overload {
            percent,
            threshold: 0.25,
            multiplier: 2.0,
        }
    }

    pub fn percent(&self) -> u32 {
        match *self {
            FatalityPolicy::Fixed { percent } => percent,
            FatalityPolicy::Overload { percent, .. } => percent,
        }
    }

    pub fn with_percent(self, new_percent: u32) -> FatalityPolicy {
        match self {
            FatalityPolicy::Fixed { .. } => FatalityPolicy::Fixed {
                percent: new_percent,
            },
            FatalityPolicy::Overload {
                threshold,
                multiplier,
                ..
            } => FatalityPolicy::Overload {
                percent: new_percent,
                threshold,
                multiplier,
            },
        }
    }

    pub fn base_probability(&self) -> f64 {
        f64::from(self.percent()) / 100.0
    }

    pub fn is_overloaded(&self, infectious: usize, living: usize) -> bool {
        match *self {
            FatalityPolicy::Fixed { .. } => false,
            FatalityPolicy::Overload { threshold, .. } => {
                living > 0 && infectious as f64 / living as f64 > threshold
            }
        }
    }

    // probability that a case resolving today dies, given the day's prevalence
    pub fn probability(&self, infectious: usize, living: usize) -> f64 {
        match *self {
            FatalityPolicy::Overload { multiplier, .. } if self.is_overloaded(infectious, living) => {
                (self.base_probability() * multiplier).min(1.0)
            }
            _ => self.base_probability(),
        }
    }

    pub fn validate(&self) -> Result<(), OutbreakError> {
        if self.percent() > 100 {
            return Err(OutbreakError::config(format!(
                "fatality rate must be between 0 and 100 percent, got {}",
                self.percent()
            )));
        }
        if let FatalityPolicy::Overload {
            threshold,
            multiplier,
            ..
        } = *self
        {
            if !(threshold > 0.0 && threshold <= 1.0) {
                return Err(OutbreakError::config(format!(
                    "overload threshold must be in (0, 1], got {}",
                    threshold
                )));
            }
            if !multiplier.is_finite() || multiplier < 1.0 {
                return Err(OutbreakError::config(format!(
                    "overload multiplier must be at least 1, got {}",
                    multiplier
                )));
            }
        }
        Ok(())
    }
}

// Transmission ---------------------------------------------------------------------------------------
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TransmissionPolicy {
    Certain,
    // each contact with a susceptible person infects with this percent chance
    Probabilistic { percent: u32 },
}

impl TransmissionPolicy {
    // 100 percent is the same as certain transmission
    pub fn from_percent(percent: u32) -> TransmissionPolicy {
        if percent >= 100 {
            TransmissionPolicy::Certain
        } else {
            TransmissionPolicy::Probabilistic { percent }
        }
    }

    pub fn percent(&self) -> u32 {
        match *self {
            TransmissionPolicy::Certain => 100,
            TransmissionPolicy::Probabilistic { percent } => percent,
        }
    }

    pub fn transmits<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        match *self {
            TransmissionPolicy::Certain => true,
            TransmissionPolicy::Probabilistic { percent } => utilities::percent_chance(percent, rng),
        }
    }

    pub fn validate(&self) -> Result<(), OutbreakError> {
        if self.percent() > 100 {
            return Err(OutbreakError::config(format!(
                "transmission rate must be between 0 and 100 percent, got {}",
                self.percent()
            )));
        }
        Ok(())
    }
}

// Demographics ---------------------------------------------------------------------------------------
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DemographicPolicy {
    Closed,
    // rates are per 1000 living people per year
    Open { birth_rate: f64, death_rate: f64 },
}

impl DemographicPolicy {
    pub fn is_open(&self) -> bool {
        matches!(self, DemographicPolicy::Open { .. })
    }

    pub fn validate(&self) -> Result<(), OutbreakError> {
        if let DemographicPolicy::Open {
            birth_rate,
            death_rate,
        } = *self
        {
            for (name, rate) in &[("birth", birth_rate), ("death", death_rate)] {
                if !rate.is_finite() || *rate < 0.0 {
                    return Err(OutbreakError::config(format!(
                        "{} rate must be a non-negative number, got {}",
                        name, rate
                    )));
                }
            }
        }
        Ok(())
    }
}

// Daily demographic quotas. The yearly rate is spread over the days of the year and
// fractional people are carried to the next day so that small populations still churn.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct ChurnQuota {
    birth_carry: f64,
    death_carry: f64,
}

impl ChurnQuota {
    // (births, background deaths) for today
    pub fn today(&mut self, policy: &DemographicPolicy, living: usize) -> (usize, usize) {
        match *policy {
            DemographicPolicy::Closed => (0, 0),
            DemographicPolicy::Open { .. } if living == 0 => (0, 0),
            DemographicPolicy::Open {
                birth_rate,
                death_rate,
            } => {
                let births = ChurnQuota::draw(&mut self.birth_carry, birth_rate, living);
                let deaths = ChurnQuota::draw(&mut self.death_carry, death_rate, living);
                (births, deaths)
            }
        }
    }

    fn draw(carry: &mut f64, rate: f64, living: usize) -> usize {
        let expected = rate * living as f64 / (1000.0 * DAYS_PER_YEAR) + *carry;
        let whole = expected.floor();
        *carry = expected - whole;
        whole as usize
    }
}

// Split background deaths evenly between the susceptible and the removed-but-alive,
// the odd one going to the susceptible. Each share is clamped to what is available.
pub fn apportion_deaths(deaths: usize, susceptible: usize, removed_alive: usize) -> (usize, usize) {
    let from_susceptible = deaths - deaths / 2;
    let from_removed = deaths / 2;
    (
        from_susceptible.min(susceptible),
        from_removed.min(removed_alive),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn fixed_fatality_ignores_prevalence() {
        let policy = FatalityPolicy::fixed(5);
        assert_eq!(policy.probability(900, 1000), 0.05);
        assert!(!policy.is_overloaded(900, 1000));
    }

    #[test]
    fn overload_doubles_above_threshold() {
        let policy = FatalityPolicy::overload(5);
        assert_eq!(policy.probability(250, 1000), 0.05);
        assert!(policy.is_overloaded(251, 1000));
        assert!((policy.probability(251, 1000) - 0.10).abs() < 1e-12);
    }

    #[test]
    fn overload_caps_at_certain_death() {
        let policy = FatalityPolicy::overload(70);
        assert_eq!(policy.probability(600, 1000), 1.0);
    }

    #[test]
    fn overload_with_no_living_population_is_not_triggered() {
        let policy = FatalityPolicy::overload(10);
        assert!(!policy.is_overloaded(0, 0));
        assert_eq!(policy.probability(0, 0), 0.1);
    }

    #[test]
    fn fatality_validation() {
        assert!(FatalityPolicy::fixed(101).validate().is_err());
        assert!(FatalityPolicy::fixed(100).validate().is_ok());
        let bad_threshold = FatalityPolicy::Overload {
            percent: 5,
            threshold: 0.0,
            multiplier: 2.0,
        };
        assert!(bad_threshold.validate().is_err());
        let bad_multiplier = FatalityPolicy::Overload {
            percent: 5,
            threshold: 0.25,
            multiplier: 0.5,
        };
        assert!(bad_multiplier.validate().is_err());
    }

    #[test]
    fn with_percent_keeps_the_policy_kind() {
        let policy = FatalityPolicy::overload(5).with_percent(20);
        assert_eq!(policy.percent(), 20);
        assert!(policy.is_overloaded(30, 100));
    }

    #[test]
    fn transmission_from_percent() {
        assert_eq!(TransmissionPolicy::from_percent(100), TransmissionPolicy::Certain);
        assert_eq!(
            TransmissionPolicy::from_percent(40),
            TransmissionPolicy::Probabilistic { percent: 40 }
        );
        assert!(TransmissionPolicy::Probabilistic { percent: 140 }
            .validate()
            .is_err());
    }

    #[test]
    fn zero_percent_transmission_never_transmits() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let policy = TransmissionPolicy::from_percent(0);
        assert!((0..1000).all(|_| !policy.transmits(&mut rng)));
        assert!((0..1000).all(|_| TransmissionPolicy::Certain.transmits(&mut rng)));
    }

    #[test]
    fn closed_population_has_no_churn() {
        let mut quota = ChurnQuota::default();
        assert_eq!(quota.today(&DemographicPolicy::Closed, 1000), (0, 0));
    }

    #[test]
    fn churn_carries_fractions_between_days() {
        let policy = DemographicPolicy::Open {
            birth_rate: 365.0,
            death_rate: 0.0,
        };
        // 365 per 1000 per year over 500 people is half a birth per day
        let mut quota = ChurnQuota::default();
        let first = quota.today(&policy, 500).0;
        let births: usize = first + (1..100).map(|_| quota.today(&policy, 500).0).sum::<usize>();
        assert_eq!(first, 0);
        assert_eq!(births, 50);
    }

    #[test]
    fn no_churn_without_living_people() {
        let policy = DemographicPolicy::Open {
            birth_rate: 1000.0,
            death_rate: 1000.0,
        };
        let mut quota = ChurnQuota::default();
        assert_eq!(quota.today(&policy, 0), (0, 0));
    }

    #[test]
    fn deaths_split_evenly_and_clamp() {
        assert_eq!(apportion_deaths(5, 10, 10), (3, 2));
        assert_eq!(apportion_deaths(6, 1, 10), (1, 3));
        assert_eq!(apportion_deaths(4, 0, 0), (0, 0));
    }

    #[test]
    fn negative_rates_are_rejected() {
        let policy = DemographicPolicy::Open {
            birth_rate: -1.0,
            death_rate: 0.0,
        };
        assert!(policy.validate().is_err());
    }
}
