//! Typed records for each `game_data` file.
//!
//! `Raw*` structs mirror the JSON as the engine writes it. They are converted
//! into the validated `*Record` types before anything downstream sees them.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::components::{ComponentError, Components};
use super::keys::*;

/// Numeric stat block (`bases`, `growths`, ...) keyed by stat nid.
pub type StatMap = BTreeMap<String, i64>;

#[derive(Debug, Deserialize)]
pub(crate) struct RawSkill {
    nid: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    desc: Option<String>,
    #[serde(default)]
    icon_nid: Option<String>,
    #[serde(default)]
    components: Components,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillRecord {
    pub nid: String,
    pub name: String,
    pub desc: String,
    pub icon_nid: Option<String>,
    pub hidden: bool,
    pub active: bool,
    pub aura: bool,
}

impl TryFrom<RawSkill> for SkillRecord {
    type Error = ComponentError;

    fn try_from(raw: RawSkill) -> Result<Self, Self::Error> {
        Ok(SkillRecord {
            hidden: raw.components.has(COMP_HIDDEN),
            active: ACTIVE_SKILL_COMPONENTS.iter().any(|c| raw.components.has(c)),
            aura: SUPPORT_SKILL_COMPONENTS.iter().any(|c| raw.components.has(c)),
            name: raw.name.unwrap_or_else(|| raw.nid.clone()),
            nid: raw.nid,
            desc: raw.desc.unwrap_or_default(),
            icon_nid: raw.icon_nid.filter(|s| !s.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawItem {
    nid: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    desc: Option<String>,
    #[serde(default)]
    icon_nid: Option<String>,
    #[serde(default)]
    components: Components,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    pub nid: String,
    pub name: String,
    pub desc: String,
    pub icon_nid: Option<String>,
    pub weapon_type: Option<String>,
    pub weapon_rank: Option<String>,
    pub value: i64,
    pub damage: i64,
    pub hit: i64,
    pub crit: i64,
    pub weight: i64,
    pub min_range: i64,
    pub max_range: i64,
    /// Capitalized target of the first `target_*` component, e.g. `Enemy`.
    pub target: Option<String>,
    /// Status nids in component order, before any exclusion filtering.
    pub statuses: Vec<String>,
    pub sub_items: Vec<String>,
    pub prf_units: Vec<String>,
    pub item_tags: Vec<String>,
    pub equippable_accessory: bool,
    pub held_status: bool,
    pub usable: bool,
    pub has_uses: bool,
}

impl TryFrom<RawItem> for ItemRecord {
    type Error = ComponentError;

    fn try_from(raw: RawItem) -> Result<Self, Self::Error> {
        let comps = &raw.components;

        let mut statuses = Vec::new();
        for key in SINGLE_STATUS_COMPONENTS {
            if let Some(status) = comps.string(key)? {
                statuses.push(status.to_string());
            }
        }
        for key in MULTI_STATUS_COMPONENTS {
            statuses.extend(comps.string_list(key)?);
        }

        let target = comps
            .names()
            .find(|name| name.starts_with(TARGET_PREFIX))
            .and_then(|name| name.split('_').nth(1))
            .map(title_case);

        let held_status = comps.string(COMP_STATUS_ON_HOLD)?.is_some()
            || !comps.string_list(COMP_MULTI_STATUS_ON_HOLD)?.is_empty();

        Ok(ItemRecord {
            weapon_type: comps.string(COMP_WEAPON_TYPE)?.map(str::to_string),
            weapon_rank: comps.string(COMP_WEAPON_RANK)?.map(str::to_string),
            value: comps.int(COMP_VALUE)?,
            damage: comps.int(COMP_DAMAGE)?,
            hit: comps.int(COMP_HIT)?,
            crit: comps.int(COMP_CRIT)?,
            weight: comps.int(COMP_WEIGHT)?,
            min_range: comps.int(COMP_MIN_RANGE)?,
            max_range: comps.int(COMP_MAX_RANGE)?,
            target,
            statuses,
            sub_items: comps.string_list(COMP_MULTI_ITEM)?,
            prf_units: comps.string_list(COMP_PRF_UNIT)?,
            item_tags: comps.string_list(COMP_ITEM_TAGS)?,
            equippable_accessory: comps.has(COMP_EQUIPPABLE_ACCESSORY),
            held_status,
            usable: comps.has(COMP_USABLE),
            has_uses: comps.has(COMP_USES) || comps.has(COMP_CHAPTER_USES),
            name: raw.name.unwrap_or_else(|| raw.nid.clone()),
            nid: raw.nid,
            desc: raw.desc.unwrap_or_default(),
            icon_nid: raw.icon_nid.filter(|s| !s.is_empty()),
        })
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawClass {
    nid: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    desc: Option<String>,
    #[serde(default)]
    tier: i64,
    #[serde(default)]
    max_level: i64,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    turns_into: Vec<String>,
    #[serde(default)]
    bases: StatMap,
    #[serde(default)]
    growths: StatMap,
    #[serde(default)]
    growth_bonus: StatMap,
    #[serde(default)]
    max_stats: StatMap,
    #[serde(default)]
    promotion: StatMap,
    #[serde(default)]
    learned_skills: Vec<(i64, String)>,
    #[serde(default)]
    wexp_gain: BTreeMap<String, Value>,
    #[serde(default)]
    map_sprite_nid: Option<String>,
    #[serde(default)]
    icon_nid: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassRecord {
    pub nid: String,
    pub name: String,
    pub desc: String,
    pub tier: i64,
    pub max_level: i64,
    pub tags: Vec<String>,
    pub turns_into: Vec<String>,
    pub bases: StatMap,
    pub growths: StatMap,
    pub growth_bonus: StatMap,
    pub max_stats: StatMap,
    pub promotion: StatMap,
    pub learned_skills: Vec<(i64, String)>,
    /// Weapon types the class can wield, in `wexp_gain` key order.
    pub weapons: Vec<String>,
    pub map_sprite_nid: Option<String>,
    pub icon_nid: Option<String>,
}

impl TryFrom<RawClass> for ClassRecord {
    type Error = ComponentError;

    fn try_from(raw: RawClass) -> Result<Self, Self::Error> {
        let mut weapons = Vec::new();
        for (weapon, gain) in &raw.wexp_gain {
            // [usable, wexp_gain, cap]
            let usable = gain
                .as_array()
                .and_then(|gain| gain.first())
                .and_then(Value::as_bool)
                .ok_or_else(|| ComponentError {
                    key: format!("wexp_gain.{weapon}"),
                    expected: "a list starting with a bool",
                })?;
            if usable {
                weapons.push(weapon.clone());
            }
        }

        Ok(ClassRecord {
            name: raw.name.unwrap_or_else(|| raw.nid.clone()),
            nid: raw.nid,
            desc: raw.desc.unwrap_or_default(),
            tier: raw.tier,
            max_level: raw.max_level,
            tags: raw.tags,
            turns_into: raw.turns_into,
            bases: raw.bases,
            growths: raw.growths,
            growth_bonus: raw.growth_bonus,
            max_stats: raw.max_stats,
            promotion: raw.promotion,
            learned_skills: raw.learned_skills,
            weapons,
            map_sprite_nid: raw.map_sprite_nid.filter(|s| !s.is_empty()),
            icon_nid: raw.icon_nid.filter(|s| !s.is_empty()),
        })
    }
}

/// `starting_items` entries are `[item_nid, droppable]`; older projects
/// store a bare item nid.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawStartingItem {
    Bare(String),
    WithDrop(String, #[allow(dead_code)] bool),
}

impl RawStartingItem {
    fn into_nid(self) -> String {
        match self {
            RawStartingItem::Bare(nid) | RawStartingItem::WithDrop(nid, _) => nid,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawUnit {
    nid: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    desc: Option<String>,
    #[serde(default)]
    level: i64,
    #[serde(default)]
    klass: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    starting_items: Vec<RawStartingItem>,
    #[serde(default)]
    learned_skills: Vec<(i64, String)>,
    #[serde(default)]
    bases: StatMap,
    #[serde(default)]
    growths: StatMap,
    #[serde(default)]
    stat_cap_modifiers: StatMap,
    #[serde(default)]
    affinity: Option<String>,
    #[serde(default)]
    portrait_nid: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitRecord {
    pub nid: String,
    pub name: String,
    pub desc: String,
    pub level: i64,
    pub class: Option<String>,
    pub tags: Vec<String>,
    pub starting_items: Vec<String>,
    pub learned_skills: Vec<(i64, String)>,
    pub bases: StatMap,
    pub growths: StatMap,
    pub stat_cap_modifiers: StatMap,
    pub affinity: Option<String>,
    pub portrait_nid: Option<String>,
}

impl From<RawUnit> for UnitRecord {
    fn from(raw: RawUnit) -> Self {
        UnitRecord {
            name: raw.name.unwrap_or_else(|| raw.nid.clone()),
            nid: raw.nid,
            desc: raw.desc.unwrap_or_default(),
            level: raw.level,
            class: raw.klass.filter(|s| !s.is_empty()),
            tags: raw.tags,
            starting_items: raw
                .starting_items
                .into_iter()
                .map(RawStartingItem::into_nid)
                .collect(),
            learned_skills: raw.learned_skills,
            bases: raw.bases,
            growths: raw.growths,
            stat_cap_modifiers: raw.stat_cap_modifiers,
            affinity: raw.affinity.filter(|s| !s.is_empty()),
            portrait_nid: raw.portrait_nid.filter(|s| !s.is_empty()),
        }
    }
}

/// An event, reduced to what shop extraction needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventRecord {
    pub nid: String,
    /// Event script, one command per line.
    #[serde(default, rename = "_source")]
    pub source: Vec<String>,
}

impl EventRecord {
    /// Stock of the first `shop;<unit>;<items>` command, if the event has one.
    pub fn shop_stock(&self) -> Option<Vec<String>> {
        self.source.iter().find_map(|line| {
            let mut args = line.split(';');
            if args.next()?.trim() != SHOP_COMMAND {
                return None;
            }
            let items = args.nth(1)?;
            Some(
                items
                    .split(',')
                    .map(str::trim)
                    .filter(|nid| !nid.is_empty())
                    .map(str::to_string)
                    .collect(),
            )
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn item_components_become_typed_fields() {
        let raw: RawItem = serde_json::from_str(
            r#"{
                "nid": "Flametongue",
                "name": "Flametongue",
                "desc": null,
                "icon_nid": "Swords",
                "components": [
                    ["weapon_type", "Sword"],
                    ["weapon_rank", "B"],
                    ["damage", 9],
                    ["target_enemy", null],
                    ["status_on_equip", "Fire_Aura"],
                    ["multi_status_on_equip", ["Burn", "Fire_Aura_hide"]],
                    ["item_tags", ["Fire"]]
                ]
            }"#,
        )
        .unwrap();
        let item = ItemRecord::try_from(raw).unwrap();
        assert_eq!(item.weapon_type.as_deref(), Some("Sword"));
        assert_eq!(item.damage, 9);
        assert_eq!(item.target.as_deref(), Some("Enemy"));
        assert_eq!(item.statuses, vec!["Fire_Aura", "Burn", "Fire_Aura_hide"]);
        assert_eq!(item.desc, "");
    }

    #[test]
    fn class_weapons_come_from_usable_wexp_entries() {
        let raw: RawClass = serde_json::from_str(
            r#"{
                "nid": "T2_Paladin",
                "name": "Paladin",
                "tier": 2,
                "wexp_gain": {"Lance": [true, 1, 0], "Sword": [true, 1, 0], "Staff": [false, 0, 0]}
            }"#,
        )
        .unwrap();
        let class = ClassRecord::try_from(raw).unwrap();
        assert_eq!(class.weapons, vec!["Lance", "Sword"]);
    }

    #[test]
    fn malformed_wexp_gain_is_rejected() {
        let raw: RawClass =
            serde_json::from_str(r#"{"nid": "X", "wexp_gain": {"Sword": 3}}"#).unwrap();
        assert!(ClassRecord::try_from(raw).is_err());
    }

    #[test]
    fn starting_items_accept_both_shapes() {
        let raw: RawUnit = serde_json::from_str(
            r#"{"nid": "Seth", "klass": "Paladin", "starting_items": [["Silver_Lance", false], "Vulnerary"]}"#,
        )
        .unwrap();
        let unit = UnitRecord::from(raw);
        assert_eq!(unit.starting_items, vec!["Silver_Lance", "Vulnerary"]);
        assert_eq!(unit.class.as_deref(), Some("Paladin"));
    }

    #[test]
    fn shop_stock_reads_first_shop_command() {
        let event = EventRecord {
            nid: "5_Vendor".to_string(),
            source: vec![
                "speak;Vendor;Welcome!".to_string(),
                "shop;Vendor;Vulnerary, Iron_Sword,".to_string(),
                "shop;Vendor;Elixir".to_string(),
            ],
        };
        assert_eq!(
            event.shop_stock(),
            Some(vec!["Vulnerary".to_string(), "Iron_Sword".to_string()])
        );
    }
}
