//! File names and component keys used by Lex Talionis `game_data`.

// Directories inside a project
pub const GAME_DATA_DIR: &str = "game_data";
pub const ICONS_16_DIR: &str = "resources/icons16";
pub const ICONS_16_MANIFEST: &str = "icons16.json";

// game_data files
pub const SKILLS_FILE: &str = "skills.json";
pub const ITEMS_FILE: &str = "items.json";
pub const CLASSES_FILE: &str = "classes.json";
pub const UNITS_FILE: &str = "units.json";
pub const EVENTS_FILE: &str = "events.json";
pub const SKILL_CATEGORIES_FILE: &str = "skills.category.json";
pub const ITEM_CATEGORIES_FILE: &str = "items.category.json";
pub const UNIT_CATEGORIES_FILE: &str = "units.category.json";

// Skill components
pub const COMP_HIDDEN: &str = "hidden";
/// Components that make a skill something the player triggers.
pub const ACTIVE_SKILL_COMPONENTS: &[&str] = &["combat_art", "ability", "activated_item"];
/// Components that make a skill affect nearby allies.
pub const SUPPORT_SKILL_COMPONENTS: &[&str] = &["aura"];

// Item components
pub const COMP_WEAPON_TYPE: &str = "weapon_type";
pub const COMP_WEAPON_RANK: &str = "weapon_rank";
pub const COMP_VALUE: &str = "value";
pub const COMP_DAMAGE: &str = "damage";
pub const COMP_HIT: &str = "hit";
pub const COMP_CRIT: &str = "crit";
pub const COMP_WEIGHT: &str = "weight";
pub const COMP_MIN_RANGE: &str = "min_range";
pub const COMP_MAX_RANGE: &str = "max_range";
pub const COMP_PRF_UNIT: &str = "prf_unit";
pub const COMP_ITEM_TAGS: &str = "item_tags";
pub const COMP_MULTI_ITEM: &str = "multi_item";
pub const COMP_EQUIPPABLE_ACCESSORY: &str = "equippable_accessory";
pub const COMP_STATUS_ON_HOLD: &str = "status_on_hold";
pub const COMP_MULTI_STATUS_ON_HOLD: &str = "multi_status_on_hold";
pub const COMP_USABLE: &str = "usable";
pub const COMP_USES: &str = "uses";
pub const COMP_CHAPTER_USES: &str = "c_uses";
pub const TARGET_PREFIX: &str = "target";

/// Components naming a single status granted by the item.
pub const SINGLE_STATUS_COMPONENTS: &[&str] = &["status_on_equip", "status_on_hit"];
/// Components naming a list of statuses granted by the item.
pub const MULTI_STATUS_COMPONENTS: &[&str] = &["multi_status_on_equip", "statuses_on_hit"];

// Event script commands
pub const SHOP_COMMAND: &str = "shop";
pub const SHOP_EVENT_SUFFIXES: &[&str] = &["Vendor", "SecretShop", "Armory"];
