use crate::error::AllocatorError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Running statistics for one strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyArm {
    pub name: String,
    pub pull_count: u64,
    pub cumulative_reward: Decimal,
}

impl StrategyArm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pull_count: 0,
            cumulative_reward: Decimal::ZERO,
        }
    }

    /// Mean reward per pull; zero before the first pull.
    pub fn average_reward(&self) -> Decimal {
        if self.pull_count == 0 {
            return Decimal::ZERO;
        }
        self.cumulative_reward / Decimal::from(self.pull_count)
    }

    fn record(&mut self, reward: Decimal) {
        self.pull_count += 1;
        self.cumulative_reward += reward;
    }
}

/// Serialisable state of every arm, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorSnapshot {
    pub arms: Vec<StrategyArm>,
}

impl AllocatorSnapshot {
    pub fn to_json_string(&self) -> Result<String, AllocatorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, AllocatorError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// UCB1 selection over a fixed, ordered set of arms.
#[derive(Debug, Clone)]
pub struct Ucb1Allocator {
    arms: Vec<StrategyArm>,
}

impl Ucb1Allocator {
    /// Creates an allocator with one fresh arm per name, keeping the given order.
    pub fn new<I, S>(names: I) -> Result<Self, AllocatorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_arms(names.into_iter().map(StrategyArm::new).collect())
    }

    pub fn from_snapshot(snapshot: AllocatorSnapshot) -> Result<Self, AllocatorError> {
        Self::from_arms(snapshot.arms)
    }

    fn from_arms(arms: Vec<StrategyArm>) -> Result<Self, AllocatorError> {
        for (i, arm) in arms.iter().enumerate() {
            if arms[..i].iter().any(|other| other.name == arm.name) {
                return Err(AllocatorError::DuplicateArm(arm.name.clone()));
            }
        }
        Ok(Self { arms })
    }

    pub fn arms(&self) -> &[StrategyArm] {
        &self.arms
    }

    pub fn total_pulls(&self) -> u64 {
        self.arms.iter().map(|arm| arm.pull_count).sum()
    }

    /// `average + sqrt(2 ln(total) / pulls)`, or `None` for an arm never pulled.
    pub fn ucb_score(&self, arm: &StrategyArm) -> Option<f64> {
        if arm.pull_count == 0 {
            return None;
        }
        let total = self.total_pulls() as f64;
        let pulls = arm.pull_count as f64;
        let average = arm.average_reward().to_f64().unwrap_or_default();
        Some(average + (2.0 * total.ln() / pulls).sqrt())
    }

    /// Picks the next arm to pull.
    ///
    /// Unpulled arms come first, in enumeration order. After that the highest
    /// UCB score wins, and on equal scores the earlier arm is kept.
    pub fn select_arm(&self) -> Result<&str, AllocatorError> {
        if let Some(fresh) = self.arms.iter().find(|arm| arm.pull_count == 0) {
            return Ok(fresh.name.as_str());
        }

        let mut best: Option<(&StrategyArm, f64)> = None;
        for arm in &self.arms {
            let Some(score) = self.ucb_score(arm) else { continue };
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((arm, score)),
            }
        }
        best.map(|(arm, _)| arm.name.as_str()).ok_or(AllocatorError::NoArms)
    }

    /// Adds one pull with `reward` to the named arm.
    pub fn update(&mut self, name: &str, reward: Decimal) -> Result<(), AllocatorError> {
        let arm = self
            .arms
            .iter_mut()
            .find(|arm| arm.name == name)
            .ok_or_else(|| AllocatorError::UnknownArm(name.to_string()))?;
        arm.record(reward);
        tracing::debug!(
            arm = name,
            %reward,
            pulls = arm.pull_count,
            cumulative = %arm.cumulative_reward,
            "Arm updated"
        );
        Ok(())
    }

    pub fn snapshot(&self) -> AllocatorSnapshot {
        AllocatorSnapshot { arms: self.arms.clone() }
    }

    /// Every arm sharing the highest cumulative reward, in enumeration order.
    pub fn winners(&self) -> Vec<&StrategyArm> {
        let Some(max) = self.arms.iter().map(|arm| arm.cumulative_reward).max() else {
            return Vec::new();
        };
        self.arms.iter().filter(|arm| arm.cumulative_reward == max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn allocator(names: &[&str]) -> Ucb1Allocator {
        Ucb1Allocator::new(names.iter().copied()).unwrap()
    }

    #[test]
    fn every_arm_is_pulled_before_any_scoring() {
        let mut bandit = allocator(&["A", "B", "C"]);
        let mut order = Vec::new();
        for reward in [dec!(100), dec!(-5), dec!(1)] {
            let name = bandit.select_arm().unwrap().to_string();
            bandit.update(&name, reward).unwrap();
            order.push(name);
        }
        assert_eq!(order, vec!["A", "B", "C"]);
        assert!(bandit.arms().iter().all(|arm| arm.pull_count == 1));
    }

    #[test]
    fn unpulled_arm_beats_a_rich_one() {
        let mut bandit = allocator(&["A", "B"]);
        bandit.update("B", dec!(10)).unwrap();
        assert_eq!(bandit.select_arm().unwrap(), "A");
    }

    #[test]
    fn higher_average_wins_with_equal_pulls() {
        let mut bandit = allocator(&["A", "B"]);
        bandit.update("A", dec!(1)).unwrap();
        bandit.update("A", dec!(1)).unwrap();
        bandit.update("B", dec!(3)).unwrap();
        bandit.update("B", dec!(3)).unwrap();
        assert_eq!(bandit.select_arm().unwrap(), "B");
    }

    #[test]
    fn fewer_pulls_score_higher_at_equal_average() {
        let mut bandit = allocator(&["A", "B"]);
        for _ in 0..3 {
            bandit.update("A", dec!(2)).unwrap();
        }
        bandit.update("B", dec!(2)).unwrap();

        let (a, b) = (&bandit.arms()[0], &bandit.arms()[1]);
        assert_eq!(a.average_reward(), b.average_reward());
        assert!(bandit.ucb_score(b).unwrap() > bandit.ucb_score(a).unwrap());
        assert_eq!(bandit.select_arm().unwrap(), "B");
    }

    #[test]
    fn ties_go_to_the_earlier_arm() {
        let mut bandit = allocator(&["A", "B"]);
        bandit.update("A", dec!(2)).unwrap();
        bandit.update("B", dec!(2)).unwrap();
        assert_eq!(bandit.select_arm().unwrap(), "A");
    }

    #[test]
    fn score_matches_ucb1_formula() {
        let mut bandit = allocator(&["A", "B"]);
        bandit.update("A", dec!(3)).unwrap();
        bandit.update("B", dec!(1)).unwrap();
        bandit.update("B", dec!(1)).unwrap();
        bandit.update("B", dec!(1)).unwrap();
        let a = &bandit.arms()[0];
        let expected = 3.0 + (2.0 * 4f64.ln() / 1.0).sqrt();
        assert!((bandit.ucb_score(a).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn empty_allocator_has_nothing_to_select() {
        let bandit = Ucb1Allocator::new(Vec::<String>::new()).unwrap();
        assert!(matches!(bandit.select_arm(), Err(AllocatorError::NoArms)));
        assert!(bandit.winners().is_empty());
    }

    #[test]
    fn unknown_and_duplicate_arms_are_rejected() {
        let mut bandit = allocator(&["A"]);
        assert!(matches!(bandit.update("Z", dec!(1)), Err(AllocatorError::UnknownArm(_))));
        assert!(matches!(Ucb1Allocator::new(["A", "A"]), Err(AllocatorError::DuplicateArm(_))));
    }

    #[test]
    fn snapshot_restores_state_and_winners_share_the_max() {
        let mut bandit = allocator(&["A", "B", "C"]);
        bandit.update("A", dec!(5)).unwrap();
        bandit.update("B", dec!(2)).unwrap();
        bandit.update("C", dec!(5)).unwrap();

        let json = bandit.snapshot().to_json_string().unwrap();
        let restored = Ucb1Allocator::from_snapshot(AllocatorSnapshot::from_json_str(&json).unwrap()).unwrap();
        assert_eq!(restored.arms(), bandit.arms());

        let winners: Vec<&str> = restored.winners().iter().map(|arm| arm.name.as_str()).collect();
        assert_eq!(winners, vec!["A", "C"]);
    }
}
