use crate::board::Tile;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::collections::BTreeSet;

pub const NUM_CHAINS: usize = 7;

/// The seven hotel chains, in declaration order. The declaration order is the
/// deterministic tie-break wherever two chains are otherwise equal.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize_repr, Deserialize_repr,
)]
#[repr(u8)]
pub enum Chain {
    Tower = 0,
    Luxor = 1,
    American = 2,
    Worldwide = 3,
    Festival = 4,
    Imperial = 5,
    Continental = 6,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Budget,
    Midrange,
    Premium,
}
impl Tier {
    // Added on top of the budget price at every bracket.
    fn markup(self) -> u32 {
        match self {
            Tier::Budget => 0,
            Tier::Midrange => 100,
            Tier::Premium => 200,
        }
    }
    pub fn price(self, size: usize) -> u32 {
        let base = match size {
            0..=1 => return 0,
            2 => 200,
            3 => 300,
            4..=5 => 400,
            6..=10 => 500,
            11..=20 => 600,
            21..=30 => 700,
            31..=40 => 800,
            _ => 900,
        };
        base + self.markup()
    }
}

impl Chain {
    pub const ALL: [Chain; NUM_CHAINS] = [
        Chain::Tower,
        Chain::Luxor,
        Chain::American,
        Chain::Worldwide,
        Chain::Festival,
        Chain::Imperial,
        Chain::Continental,
    ];
    pub fn index(self) -> usize {
        self as usize
    }
    pub fn tier(self) -> Tier {
        match self {
            Chain::Tower | Chain::Luxor => Tier::Budget,
            Chain::American | Chain::Worldwide | Chain::Festival => Tier::Midrange,
            Chain::Imperial | Chain::Continental => Tier::Premium,
        }
    }
    pub fn name(self) -> &'static str {
        match self {
            Chain::Tower => "Tower",
            Chain::Luxor => "Luxor",
            Chain::American => "American",
            Chain::Worldwide => "Worldwide",
            Chain::Festival => "Festival",
            Chain::Imperial => "Imperial",
            Chain::Continental => "Continental",
        }
    }
    pub fn initial(self) -> char {
        self.name().chars().next().unwrap_or('?')
    }
}
impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
impl std::str::FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chain::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown chain: {}", s))
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct ChainState {
    pub active: bool,
    pub safe: bool,
    pub tiles: BTreeSet<Tile>,
}
impl ChainState {
    pub fn size(&self) -> usize {
        self.tiles.len()
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ChainRegistry {
    chains: [ChainState; NUM_CHAINS],
    safe_size: usize,
}
impl ChainRegistry {
    pub fn new(safe_size: usize) -> Self {
        Self {
            chains: Default::default(),
            safe_size,
        }
    }
    pub fn get(&self, chain: Chain) -> &ChainState {
        &self.chains[chain.index()]
    }
    pub fn size(&self, chain: Chain) -> usize {
        self.get(chain).size()
    }
    pub fn is_active(&self, chain: Chain) -> bool {
        self.get(chain).active
    }
    pub fn is_safe(&self, chain: Chain) -> bool {
        self.get(chain).safe
    }
    pub fn price(&self, chain: Chain) -> u32 {
        chain.tier().price(self.size(chain))
    }
    pub fn active(&self) -> impl Iterator<Item = Chain> + '_ {
        Chain::ALL.into_iter().filter(|&c| self.is_active(c))
    }
    pub fn inactive(&self) -> impl Iterator<Item = Chain> + '_ {
        Chain::ALL.into_iter().filter(|&c| !self.is_active(c))
    }
    pub fn all_active(&self) -> bool {
        self.inactive().next().is_none()
    }
    /// Marks the chain active and adds `tiles` to it. Safety is monotonic:
    /// once a chain reaches the safe size it stays safe until deactivated.
    pub(crate) fn absorb(&mut self, chain: Chain, tiles: impl IntoIterator<Item = Tile>) {
        let safe_size = self.safe_size;
        let state = &mut self.chains[chain.index()];
        state.active = true;
        state.tiles.extend(tiles);
        state.safe = state.safe || state.tiles.len() >= safe_size;
    }
    /// Clears the chain, returning the tiles it held.
    pub(crate) fn deactivate(&mut self, chain: Chain) -> BTreeSet<Tile> {
        std::mem::take(&mut self.chains[chain.index()]).tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tiers_are_split_two_three_two() {
        let count = |tier| Chain::ALL.iter().filter(|c| c.tier() == tier).count();
        assert_eq!(count(Tier::Budget), 2);
        assert_eq!(count(Tier::Midrange), 3);
        assert_eq!(count(Tier::Premium), 2);
    }

    #[test]
    fn computes_stock_price() {
        // Any chain of size 0 has a price of 0.
        assert_eq!(Tier::Budget.price(0), 0);
        assert_eq!(Tier::Premium.price(0), 0);
        // Founding size in the cheapest tier.
        assert_eq!(Tier::Budget.price(2), 200);
        assert_eq!(Tier::Midrange.price(3), 400);
        assert_eq!(Tier::Premium.price(5), 600);
        assert_eq!(Tier::Budget.price(10), 500);
        assert_eq!(Tier::Budget.price(11), 600);
        assert_eq!(Tier::Midrange.price(40), 900);
        assert_eq!(Tier::Premium.price(41), 1100);
        assert_eq!(Tier::Premium.price(108), 1100);
    }

    #[test]
    fn parses_chain_names() {
        assert_eq!("luxor".parse::<Chain>(), Ok(Chain::Luxor));
        assert_eq!(" Continental ".parse::<Chain>(), Ok(Chain::Continental));
        assert!("Sackson".parse::<Chain>().is_err());
        for chain in Chain::ALL {
            assert_eq!(chain.to_string().parse::<Chain>(), Ok(chain));
        }
    }

    #[test]
    fn chains_serialize_as_indices() {
        assert_eq!(serde_json::to_string(&Chain::Festival).unwrap(), "4");
        assert_eq!(serde_json::from_str::<Chain>("6").unwrap(), Chain::Continental);
    }

    #[test]
    fn safety_is_monotonic() {
        let mut registry = ChainRegistry::new(11);
        let tiles = crate::board::generate_all_tiles();
        registry.absorb(Chain::American, tiles[..10].iter().copied());
        assert!(!registry.is_safe(Chain::American));
        registry.absorb(Chain::American, tiles[10..11].iter().copied());
        assert!(registry.is_safe(Chain::American));
        // Re-adding known tiles does not shrink the chain or flip it back.
        registry.absorb(Chain::American, tiles[..3].iter().copied());
        assert!(registry.is_safe(Chain::American));
        assert_eq!(registry.size(Chain::American), 11);
        let cleared = registry.deactivate(Chain::American);
        assert_eq!(cleared.len(), 11);
        assert!(!registry.is_active(Chain::American));
        assert!(!registry.is_safe(Chain::American));
    }

    proptest! {
        #[test]
        fn price_is_monotonic_and_tiered(size in 0usize..120) {
            for tier in [Tier::Budget, Tier::Midrange, Tier::Premium] {
                prop_assert!(tier.price(size) <= tier.price(size + 1));
            }
            if size >= 2 {
                prop_assert!(Tier::Budget.price(size) < Tier::Midrange.price(size));
                prop_assert!(Tier::Midrange.price(size) < Tier::Premium.price(size));
            }
        }
    }
}
