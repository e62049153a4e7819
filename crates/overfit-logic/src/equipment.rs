//! Equipment upgrade tracks.
//!
//! Four independent tracks, each levelled 1–4. Higher levels carry a
//! larger bonus percentage:
//!
//! | Track | Bonus applies to |
//! |-------|------------------|
//! | GPU | model-metric gains from training |
//! | Storage | data capacity over the archetype base |
//! | Network | data acquired by data-acquisition operations |
//! | Cooling | entropy mitigated at every turn close |

use serde::{Deserialize, Serialize};

use crate::constants::equipment::{MAX_LEVEL, MIN_LEVEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentTrack {
    Gpu,
    Storage,
    Network,
    Cooling,
}

impl EquipmentTrack {
    pub const ALL: [EquipmentTrack; 4] = [
        EquipmentTrack::Gpu,
        EquipmentTrack::Storage,
        EquipmentTrack::Network,
        EquipmentTrack::Cooling,
    ];

    pub fn index(self) -> usize {
        match self {
            EquipmentTrack::Gpu => 0,
            EquipmentTrack::Storage => 1,
            EquipmentTrack::Network => 2,
            EquipmentTrack::Cooling => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EquipmentTrack::Gpu => "GPU",
            EquipmentTrack::Storage => "storage",
            EquipmentTrack::Network => "network",
            EquipmentTrack::Cooling => "cooling",
        }
    }
}

/// Level and current bonus of one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentSlot {
    pub level: u8,
    pub bonus_percent: u32,
}

impl Default for EquipmentSlot {
    fn default() -> Self {
        Self {
            level: MIN_LEVEL,
            bonus_percent: 0,
        }
    }
}

/// All four tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Equipment {
    pub gpu: EquipmentSlot,
    pub storage: EquipmentSlot,
    pub network: EquipmentSlot,
    pub cooling: EquipmentSlot,
}

impl Equipment {
    pub fn get(&self, track: EquipmentTrack) -> &EquipmentSlot {
        match track {
            EquipmentTrack::Gpu => &self.gpu,
            EquipmentTrack::Storage => &self.storage,
            EquipmentTrack::Network => &self.network,
            EquipmentTrack::Cooling => &self.cooling,
        }
    }

    pub fn get_mut(&mut self, track: EquipmentTrack) -> &mut EquipmentSlot {
        match track {
            EquipmentTrack::Gpu => &mut self.gpu,
            EquipmentTrack::Storage => &mut self.storage,
            EquipmentTrack::Network => &mut self.network,
            EquipmentTrack::Cooling => &mut self.cooling,
        }
    }

    /// Raise a track one level. Returns the new level, or `None` at max.
    pub fn upgrade(&mut self, config: &EquipmentConfig) -> Option<u8> {
        let slot = self.get_mut(config.track);
        if slot.level >= MAX_LEVEL {
            return None;
        }
        slot.level += 1;
        slot.bonus_percent = config.bonus_percent(slot.level);
        Some(slot.level)
    }
}

/// Static tuning for one track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentConfig {
    pub track: EquipmentTrack,
    /// Bonus percentage at levels 1 through 4.
    pub bonus_by_level: [u32; 4],
    /// Upgrade cost multiplied by the current level.
    pub base_upgrade_cost: u64,
}

impl EquipmentConfig {
    /// Bonus percentage at `level` (clamped into 1–4).
    pub fn bonus_percent(&self, level: u8) -> u32 {
        let idx = level.clamp(MIN_LEVEL, MAX_LEVEL) - MIN_LEVEL;
        self.bonus_by_level[idx as usize]
    }

    /// Budget needed to upgrade from `level`, or `None` at max level.
    pub fn upgrade_cost(&self, level: u8) -> Option<u64> {
        if level >= MAX_LEVEL {
            None
        } else {
            Some(self.base_upgrade_cost * level.max(MIN_LEVEL) as u64)
        }
    }
}

/// The four track presets, in [`EquipmentTrack::ALL`] order.
pub fn equipment_configs() -> [EquipmentConfig; 4] {
    [
        EquipmentConfig {
            track: EquipmentTrack::Gpu,
            bonus_by_level: [0, 10, 20, 35],
            base_upgrade_cost: 3000,
        },
        EquipmentConfig {
            track: EquipmentTrack::Storage,
            bonus_by_level: [0, 25, 50, 100],
            base_upgrade_cost: 2000,
        },
        EquipmentConfig {
            track: EquipmentTrack::Network,
            bonus_by_level: [0, 10, 20, 35],
            base_upgrade_cost: 2500,
        },
        EquipmentConfig {
            track: EquipmentTrack::Cooling,
            bonus_by_level: [0, 10, 20, 30],
            base_upgrade_cost: 2500,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_level_one() {
        let eq = Equipment::default();
        for track in EquipmentTrack::ALL {
            assert_eq!(eq.get(track).level, 1);
            assert_eq!(eq.get(track).bonus_percent, 0);
        }
    }

    #[test]
    fn test_upgrade_sets_bonus_and_stops_at_max() {
        let configs = equipment_configs();
        let gpu = &configs[EquipmentTrack::Gpu.index()];
        let mut eq = Equipment::default();
        assert_eq!(eq.upgrade(gpu), Some(2));
        assert_eq!(eq.gpu.bonus_percent, 10);
        assert_eq!(eq.upgrade(gpu), Some(3));
        assert_eq!(eq.upgrade(gpu), Some(4));
        assert_eq!(eq.gpu.bonus_percent, 35);
        assert_eq!(eq.upgrade(gpu), None);
        assert_eq!(eq.gpu.level, 4);
        assert_eq!(eq.storage.level, 1);
    }

    #[test]
    fn test_upgrade_cost_scales_with_level() {
        let configs = equipment_configs();
        let storage = &configs[EquipmentTrack::Storage.index()];
        assert_eq!(storage.upgrade_cost(1), Some(2000));
        assert_eq!(storage.upgrade_cost(3), Some(6000));
        assert_eq!(storage.upgrade_cost(4), None);
    }

    #[test]
    fn test_bonus_percent_clamps_level() {
        let configs = equipment_configs();
        let cooling = &configs[EquipmentTrack::Cooling.index()];
        assert_eq!(cooling.bonus_percent(0), 0);
        assert_eq!(cooling.bonus_percent(9), 30);
    }
}
