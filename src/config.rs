//! Extraction rules that are specific to a particular project.
//!
//! Every field defaults to the rules of the FE8 Reforged project, so running
//! without a config file reproduces the stock guide. A TOML file passed with
//! `--config` overrides individual sections.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, IResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Status nids containing any of these are never linked from items.
    pub status_exclude: Vec<String>,
    /// Items with these nid suffixes exist in the dataset but stay out of listings.
    pub hidden_item_suffixes: Vec<String>,
    /// Sheets in `resources/icons16` cut into single icons by `extract --icons`.
    pub icon_sheets: Vec<String>,
    pub names: NameConfig,
    pub shops: ShopConfig,
    pub arsenals: ArsenalConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            status_exclude: strings(&[
                "_hide",
                "_Penalty",
                "_Gain",
                "_Proc",
                "_Weapon",
                "_AOE_Splash",
                "_Boss",
                "Avo_Ddg_",
                "_Buff",
            ]),
            hidden_item_suffixes: strings(&["_P", "_A", "_D", "_Test"]),
            icon_sheets: strings(&["skill_icons", "wexp_icons", "Affinity", "Monster WEP Icon"]),
            names: NameConfig::default(),
            shops: ShopConfig::default(),
            arsenals: ArsenalConfig::default(),
        }
    }
}

impl ExtractionConfig {
    pub fn from_toml_str(text: &str) -> IResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ErrorKind::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> IResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ErrorKind::load(path.display().to_string(), e))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> IResult<String> {
        toml::to_string_pretty(self).map_err(|e| ErrorKind::Config(e.to_string()))
    }

    fn validate(&self) -> IResult<()> {
        for route in &self.arsenals.routes {
            if route.prefix.is_none() && route.contains.is_empty() && !route.fallback {
                return Err(ErrorKind::Config(format!(
                    "arsenal route for `{}` -> `{}` matches nothing: set `prefix`, `contains` or `fallback`",
                    route.owner, route.arsenal
                )));
            }
        }
        for shop in &self.shops.extra {
            if shop.item_suffix.is_empty() {
                return Err(ErrorKind::Config(format!(
                    "extra shop `{}` needs a non-empty `item_suffix`",
                    shop.nid
                )));
            }
        }
        Ok(())
    }
}

/// Token vocabulary used when turning class identifiers into display names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameConfig {
    pub gender_tokens: Vec<String>,
    pub filler_tokens: Vec<String>,
    /// Base class names recognized even when no class record carries them.
    pub class_vocabulary: Vec<String>,
}

impl Default for NameConfig {
    fn default() -> Self {
        Self {
            gender_tokens: strings(&["Male", "Female", "M", "F"]),
            filler_tokens: strings(&["Leg"]),
            class_vocabulary: strings(&[
                "Archer",
                "Assassin",
                "Bard",
                "Berserker",
                "Bishop",
                "Brigand",
                "Cavalier",
                "Cleric",
                "Dancer",
                "Dark Druid",
                "Druid",
                "Fighter",
                "Falcon Knight",
                "General",
                "Great Knight",
                "Great Lord",
                "Hero",
                "Holy Knight",
                "Journeyman",
                "Knight",
                "Lord",
                "Mage",
                "Mage Knight",
                "Manakete",
                "Mercenary",
                "Monk",
                "Myrmidon",
                "Necromancer",
                "Paladin",
                "Pegasus Knight",
                "Pirate",
                "Priest",
                "Ranger",
                "Recruit",
                "Rogue",
                "Sage",
                "Shaman",
                "Sniper",
                "Soldier",
                "Summoner",
                "Swordmaster",
                "Thief",
                "Troubadour",
                "Valkyrie",
                "Warrior",
                "Wyvern Knight",
                "Wyvern Lord",
                "Wyvern Rider",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    /// Event nids containing any of these are not treated as shops.
    pub ignore_patterns: Vec<String>,
    /// Abbreviated names keyed by merged shop nid, overriding the derived ones.
    pub abbreviations: BTreeMap<String, String>,
    pub extra: Vec<ExtraShop>,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: strings(&["Dragons_Gate"]),
            abbreviations: BTreeMap::new(),
            extra: vec![ExtraShop {
                nid: "Dragon_Gate_Vendor".to_string(),
                name: "Dragon's Gate (Anna)".to_string(),
                abbr_name: "Dragon's Gate".to_string(),
                kind: "Vendor".to_string(),
                order_name: "Z_Dragon_Gate".to_string(),
                item_suffix: "_DG".to_string(),
            }],
        }
    }
}

/// A shop that has no event of its own and stocks every item with a nid suffix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraShop {
    pub nid: String,
    pub name: String,
    pub abbr_name: String,
    pub kind: String,
    pub order_name: String,
    pub item_suffix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArsenalConfig {
    /// Item nid endings that mark the item as an arsenal.
    pub marks: Vec<String>,
    pub exclude: Vec<String>,
    pub excluded_owners: Vec<String>,
    /// Owner names as written in `items.category.json`, mapped to unit nids.
    pub owner_aliases: BTreeMap<String, String>,
    pub item_end_exclude: Vec<String>,
    /// Items placed directly into an arsenal regardless of their category.
    pub special_items: BTreeMap<String, String>,
    pub routes: Vec<ArsenalRoute>,
    pub skip: Vec<OwnerSuffixSkip>,
    pub extra: Vec<ExtraArsenal>,
}

impl Default for ArsenalConfig {
    fn default() -> Self {
        let route = |owner: &str, arsenal: &str, prefix: Option<&str>, contains: &[&str]| {
            ArsenalRoute {
                owner: owner.to_string(),
                arsenal: arsenal.to_string(),
                prefix: prefix.map(str::to_string),
                contains: strings(contains),
                fallback: false,
            }
        };
        let mut tana_fallback = route("Tana", "Tanas_Arsenal", None, &[]);
        tana_fallback.fallback = true;

        Self {
            marks: strings(&["_Arsenal", "bending", "_Studies", "_Stash", "Shiro_Grimoire"]),
            exclude: strings(&["Davius_Arsenal_Old"]),
            excluded_owners: strings(&["_Plushie", "Orson", "Orson_Evil", "Davius_Old", "MyUnit"]),
            owner_aliases: BTreeMap::from([
                ("L'arachel".to_string(), "Larachel".to_string()),
                ("Pro".to_string(), "ProTagonist".to_string()),
                ("Davius Old".to_string(), "Davius_Old".to_string()),
            ]),
            item_end_exclude: strings(&["_Old", "_Multi", "_Warp_2", "_Warp"]),
            special_items: BTreeMap::from([
                ("Lunar_Brace".to_string(), "Eirikas_Arsenal".to_string()),
                ("Solar_Brace".to_string(), "Ephraims_Arsenal".to_string()),
                ("Dragonstone".to_string(), "Myrrh_Arsenal".to_string()),
            ]),
            routes: vec![
                route("ProTagonist", "Airbending", Some("Air"), &[]),
                route("ProTagonist", "Earthbending", Some("Earth"), &[]),
                route("ProTagonist", "Firebending", Some("Fire"), &[]),
                route("ProTagonist", "Waterbending", Some("Water"), &[]),
                route("Tana", "Tanas_Stash", None, &["_Buff", "_Heal"]),
                tana_fallback,
            ],
            skip: vec![
                OwnerSuffixSkip {
                    owner: "Lindsey".to_string(),
                    suffix: "_D".to_string(),
                },
                OwnerSuffixSkip {
                    owner: "Azuth".to_string(),
                    suffix: "_A".to_string(),
                },
            ],
            extra: vec![ExtraArsenal {
                nid: "Myrrh_Arsenal".to_string(),
                name: "Myrrh's Arsenal".to_string(),
                desc: "Arsenal of a Manakete.\n<red>Prof:</><icon>Monster</>".to_string(),
                owner: "Myrrh".to_string(),
                icon_class: "Dragonstone-item-icon Neutral-icon".to_string(),
            }],
        }
    }
}

/// Sends a multi-arsenal owner's item to `arsenal` when the item nid starts
/// with `prefix` or contains one of `contains`. A `fallback` route catches
/// whatever the owner's other routes did not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArsenalRoute {
    pub owner: String,
    pub arsenal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default)]
    pub contains: Vec<String>,
    #[serde(default)]
    pub fallback: bool,
}

impl ArsenalRoute {
    pub fn matches(&self, item_nid: &str) -> bool {
        let prefix_hit = self
            .prefix
            .as_deref()
            .is_some_and(|prefix| item_nid.starts_with(prefix));
        prefix_hit || self.contains.iter().any(|part| item_nid.contains(part.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerSuffixSkip {
    pub owner: String,
    pub suffix: String,
}

/// An arsenal that has no item of its own in `items.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraArsenal {
    pub nid: String,
    pub name: String,
    pub desc: String,
    pub owner: String,
    pub icon_class: String,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_config_survives_toml() {
        let config = ExtractionConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(ExtractionConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = ExtractionConfig::from_toml_str(
            r#"
            hidden_item_suffixes = ["_Debug"]

            [shops]
            extra = []
            "#,
        )
        .unwrap();
        assert_eq!(config.hidden_item_suffixes, vec!["_Debug".to_string()]);
        assert!(config.shops.extra.is_empty());
        assert_eq!(config.shops.ignore_patterns, vec!["Dragons_Gate".to_string()]);
        assert_eq!(config.arsenals, ArsenalConfig::default());
    }

    #[test]
    fn route_without_matcher_is_rejected() {
        let err = ExtractionConfig::from_toml_str(
            r#"
            [[arsenals.routes]]
            owner = "Tana"
            arsenal = "Tanas_Stash"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ErrorKind::Config(_)));
    }

    #[test]
    fn routes_match_prefix_or_substring() {
        let config = ArsenalConfig::default();
        let stash = config
            .routes
            .iter()
            .find(|r| r.arsenal == "Tanas_Stash")
            .unwrap();
        assert!(stash.matches("Javelin_Buff"));
        assert!(!stash.matches("Javelin"));
        let air = &config.routes[0];
        assert!(air.matches("Air_Slash"));
        assert!(!air.matches("Fire_Air"));
    }
}
