//! Deterministic random number generation.
//!
//! RULE: Nothing in the campaign may call any platform RNG.
//! All randomness flows through SubsystemRng instances derived
//! from the single master seed of the run.
//!
//! Each collaborator slot gets its own stream, seeded from
//! (master_seed, slot, stream sequence). The sequence counter advances
//! once per hook invocation and travels with snapshots, so a restored
//! campaign draws exactly the numbers the uninterrupted run would have.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

/// A named, deterministic RNG for a single hook invocation.
pub struct SubsystemRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SubsystemRng {
    /// Create an RNG from the master seed, a stable slot index and the
    /// stream sequence number. The slot index must never change once assigned.
    pub fn new(master_seed: u64, slot_index: u64, sequence: u64) -> Self {
        let derived_seed = master_seed
            ^ slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15)
            ^ sequence.wrapping_mul(0xc2b2_ae3d_27d4_eb4f);
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n). Returns 0 for an empty range.
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        debug_assert!(n > 0, "n must be > 0");
        if n == 0 {
            return 0;
        }
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick one element of `items`, or None when empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.next_u64_below(items.len() as u64) as usize;
        items.get(idx)
    }
}

/// Source of every RNG stream for a single run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RngBank {
    master_seed: u64,
    sequence: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed, sequence: 0 }
    }

    pub fn seed(&self) -> u64 {
        self.master_seed
    }

    /// Number of streams handed out so far.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Fresh stream for one invocation of the hook in `slot`.
    pub fn next_stream(&mut self, slot: SubsystemSlot) -> SubsystemRng {
        self.sequence = self.sequence.wrapping_add(1);
        SubsystemRng::new(self.master_seed, slot as u64, self.sequence).with_name(slot.name())
    }
}

/// Stable collaborator slot assignments.
/// NEVER reorder or remove entries; only append.
/// Reordering changes every slot's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u64)]
pub enum SubsystemSlot {
    UfoMovement = 0,
    AircraftMovement = 1,
    BaseDefence = 2,
    MissionDetection = 3,
    AlienInterest = 4,
    BaseStealth = 5,
    UfoEvents = 6,
    MissionSpawn = 7,
    Production = 8,
    Research = 9,
    UfoRecovery = 10,
    Installations = 11,
    AircraftRepair = 12,
    Transfers = 13,
    Bases = 14,
    Hospital = 15,
    Xvi = 16,
    BaseSearch = 17,
    Market = 18,
    CampaignEvents = 19,
    BaseAttacks = 20,
    Storage = 21,
    Budget = 22,
    Lifecycle = 23,
    // Add new slots here, append only.
}

impl SubsystemSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UfoMovement      => "ufo_movement",
            Self::AircraftMovement => "aircraft_movement",
            Self::BaseDefence      => "base_defence",
            Self::MissionDetection => "mission_detection",
            Self::AlienInterest    => "alien_interest",
            Self::BaseStealth      => "base_stealth",
            Self::UfoEvents        => "ufo_events",
            Self::MissionSpawn     => "mission_spawn",
            Self::Production       => "production",
            Self::Research         => "research",
            Self::UfoRecovery      => "ufo_recovery",
            Self::Installations    => "installations",
            Self::AircraftRepair   => "aircraft_repair",
            Self::Transfers        => "transfers",
            Self::Bases            => "bases",
            Self::Hospital         => "hospital",
            Self::Xvi              => "xvi",
            Self::BaseSearch       => "base_search",
            Self::Market           => "market",
            Self::CampaignEvents   => "campaign_events",
            Self::BaseAttacks      => "base_attacks",
            Self::Storage          => "storage",
            Self::Budget           => "budget",
            Self::Lifecycle        => "lifecycle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_are_reproducible_per_sequence() {
        let mut bank_a = RngBank::new(12345);
        let mut bank_b = RngBank::new(12345);

        for _ in 0..10 {
            let mut a = bank_a.next_stream(SubsystemSlot::MissionSpawn);
            let mut b = bank_b.next_stream(SubsystemSlot::MissionSpawn);
            assert_eq!(a.next_u64_below(1_000_000), b.next_u64_below(1_000_000));
        }
        assert_eq!(bank_a.sequence(), 10);
    }

    #[test]
    fn consecutive_streams_differ() {
        let mut bank = RngBank::new(7);
        let first: Vec<u64> = {
            let mut rng = bank.next_stream(SubsystemSlot::Xvi);
            (0..8).map(|_| rng.next_u64_below(u64::MAX)).collect()
        };
        let second: Vec<u64> = {
            let mut rng = bank.next_stream(SubsystemSlot::Xvi);
            (0..8).map(|_| rng.next_u64_below(u64::MAX)).collect()
        };
        assert_ne!(first, second, "each invocation must get a fresh stream");
    }

    #[test]
    fn floats_stay_in_unit_interval() {
        let mut rng = RngBank::new(99).next_stream(SubsystemSlot::Market);
        for _ in 0..1_000 {
            let x = rng.next_f64();
            assert!((0.0..1.0).contains(&x), "{x} outside [0, 1)");
        }
        assert!(rng.pick::<u8>(&[]).is_none());
    }
}
