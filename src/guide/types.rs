//! The linked data model written to `guide.json`.
//!
//! Every cross-reference is a typed `*Ref` holding the canonical nid of the
//! target. Reverse indexes (`Class::units`, `Item::shops`, ...) are filled in
//! by the assembler and are part of the serialized dataset.

use std::collections::HashMap;
use std::fmt;
use std::io::Read;

use bon::{Builder, bon};
use serde::{Deserialize, Serialize};
use variantly::Variantly;

use crate::error::{ErrorKind, IResult};
use crate::guide::index::normalize_identifier;
use crate::recognized::Recognized;
use crate::resources::records::StatMap;

#[derive(Clone, Copy, Debug, Variantly, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
pub enum RecordKind {
    Skill,
    Item,
    Class,
    Unit,
    Shop,
    Arsenal,
    Category,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Skill => "skill",
            RecordKind::Item => "item",
            RecordKind::Class => "class",
            RecordKind::Unit => "unit",
            RecordKind::Shop => "shop",
            RecordKind::Arsenal => "arsenal",
            RecordKind::Category => "category",
        };
        f.write_str(name)
    }
}

macro_rules! entity_ref {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(nid: impl Into<String>) -> Self {
                Self(nid.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(nid: &str) -> Self {
                Self(nid.to_string())
            }
        }
    };
}

entity_ref!(
    /// Canonical nid of a [`Skill`].
    SkillRef
);
entity_ref!(
    /// Canonical nid of an [`Item`].
    ItemRef
);
entity_ref!(
    /// Canonical nid of a [`Class`].
    ClassRef
);
entity_ref!(
    /// Canonical nid of a [`Unit`].
    UnitRef
);
entity_ref!(
    /// Canonical nid of a [`Shop`]: the location nids it was merged from, joined with `_`.
    ShopRef
);
entity_ref!(
    /// Canonical nid of an [`Arsenal`].
    ArsenalRef
);

/// Weapon ranks the engine ships with, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WeaponRank {
    Prf,
    E,
    D,
    C,
    B,
    A,
    S,
    SS,
    SSS,
    X,
}

/// Sort key of an item without a rank.
pub const UNRANKED_ORDER: i32 = -1;
/// Sort key of a rank outside [`WeaponRank`], placed after `X`.
pub const UNKNOWN_RANK_ORDER: i32 = 10;

impl WeaponRank {
    pub const ALL: [WeaponRank; 10] = [
        WeaponRank::Prf,
        WeaponRank::E,
        WeaponRank::D,
        WeaponRank::C,
        WeaponRank::B,
        WeaponRank::A,
        WeaponRank::S,
        WeaponRank::SS,
        WeaponRank::SSS,
        WeaponRank::X,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WeaponRank::Prf => "Prf",
            WeaponRank::E => "E",
            WeaponRank::D => "D",
            WeaponRank::C => "C",
            WeaponRank::B => "B",
            WeaponRank::A => "A",
            WeaponRank::S => "S",
            WeaponRank::SS => "SS",
            WeaponRank::SSS => "SSS",
            WeaponRank::X => "X",
        }
    }

    pub fn parse(rank: &str) -> Recognized<WeaponRank> {
        WeaponRank::ALL
            .into_iter()
            .find(|known| known.as_str() == rank)
            .map(Recognized::Known)
            .unwrap_or_else(|| Recognized::Unknown(rank.to_string()))
    }

    /// `Prf` is 0, `E` is 1, up to `X` at 9.
    pub fn order(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for WeaponRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn rank_order(rank: Option<&Recognized<WeaponRank>>) -> i32 {
    match rank {
        None => UNRANKED_ORDER,
        Some(rank) => rank.known().map_or(UNKNOWN_RANK_ORDER, |rank| rank.order()),
    }
}

#[derive(Clone, Copy, Debug, Variantly, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
pub enum SkillKind {
    Active,
    Support,
    Passive,
}

impl SkillKind {
    pub const ALL: [SkillKind; 3] = [SkillKind::Active, SkillKind::Support, SkillKind::Passive];

    pub fn name(self) -> &'static str {
        match self {
            SkillKind::Active => "Active",
            SkillKind::Support => "Support",
            SkillKind::Passive => "Passive",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        SkillKind::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

#[derive(Clone, Copy, Debug, Variantly, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
pub enum ShopKind {
    Armory,
    Vendor,
    #[serde(rename = "Secret Shop", alias = "SecretShop")]
    SecretShop,
}

impl ShopKind {
    /// Checked in this order, so `..._SecretShop` is never read as a vendor.
    pub const ALL: [ShopKind; 3] = [ShopKind::SecretShop, ShopKind::Armory, ShopKind::Vendor];

    /// The word the engine uses in event nids.
    pub fn nid_marker(self) -> &'static str {
        match self {
            ShopKind::Armory => "Armory",
            ShopKind::Vendor => "Vendor",
            ShopKind::SecretShop => "SecretShop",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ShopKind::Armory => "Armory",
            ShopKind::Vendor => "Vendor",
            ShopKind::SecretShop => "Secret Shop",
        }
    }

    pub fn from_nid(nid: &str) -> Option<Self> {
        ShopKind::ALL
            .into_iter()
            .find(|kind| nid.contains(kind.nid_marker()))
    }

    pub fn parse(kind: &str) -> Recognized<ShopKind> {
        ShopKind::ALL
            .into_iter()
            .find(|known| known.nid_marker() == kind || known.display_name() == kind)
            .map(Recognized::Known)
            .unwrap_or_else(|| Recognized::Unknown(kind.to_string()))
    }
}

impl fmt::Display for ShopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct LearnedSkill {
    pub level: i64,
    pub skill: SkillRef,
}

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct Skill {
    pub nid: SkillRef,
    pub name: String,
    /// Raw nids merged into this skill.
    #[builder(default)]
    pub aliases: Vec<String>,
    pub icon_class: String,
    /// Raw category path from `skills.category.json`, `Misc` when unassigned.
    pub category: String,
    pub category_name: String,
    pub kind: SkillKind,
    /// Description rendered to HTML.
    pub desc: String,
    pub hidden: bool,
    /// Items granting this skill.
    #[builder(default)]
    pub items: Vec<ItemRef>,
}

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct Item {
    pub nid: ItemRef,
    pub name: String,
    #[builder(default)]
    pub aliases: Vec<String>,
    pub rank: Option<Recognized<WeaponRank>>,
    /// Sort key of `rank`, see [`rank_order`].
    pub rank_order: i32,
    pub desc: String,
    pub weapon_type: Option<String>,
    pub target: Option<String>,
    pub damage: i64,
    pub hit: i64,
    pub crit: i64,
    pub weight: i64,
    pub min_range: i64,
    pub max_range: i64,
    pub value: i64,
    pub icon_class: String,
    #[builder(default)]
    pub categories: Vec<String>,
    pub consumable: bool,
    /// Whether the item shows up in category listings.
    pub listed: bool,
    #[builder(default)]
    pub skills: Vec<SkillRef>,
    #[builder(default)]
    pub sub_items: Vec<ItemRef>,
    #[builder(default)]
    pub super_items: Vec<ItemRef>,
    #[builder(default)]
    pub shops: Vec<ShopRef>,
    #[builder(default)]
    pub arsenals: Vec<ArsenalRef>,
}

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct Class {
    pub nid: ClassRef,
    pub name: String,
    /// Name shown in listings, e.g. `Holy Knight (Male Ewan)`.
    pub display_name: String,
    #[builder(default)]
    pub aliases: Vec<String>,
    pub desc: String,
    pub tier: i64,
    pub max_level: i64,
    pub weapons: Vec<String>,
    pub tags: Vec<String>,
    pub growths: StatMap,
    pub bases: StatMap,
    pub growth_bonus: StatMap,
    pub max_stats: StatMap,
    pub promotion: StatMap,
    pub turns_into: Vec<ClassRef>,
    #[builder(default)]
    pub promotes_from: Vec<ClassRef>,
    pub learned_skills: Vec<LearnedSkill>,
    pub map_sprite_nid: Option<String>,
    pub icon_nid: Option<String>,
    /// Units whose base class this is.
    #[builder(default)]
    pub units: Vec<UnitRef>,
    #[builder(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct Unit {
    pub nid: UnitRef,
    pub name: String,
    #[builder(default)]
    pub aliases: Vec<String>,
    pub desc: String,
    pub level: i64,
    pub class: Option<ClassRef>,
    pub growths: StatMap,
    pub bases: StatMap,
    pub stat_cap_modifiers: StatMap,
    pub starting_items: Vec<ItemRef>,
    pub learned_skills: Vec<LearnedSkill>,
    #[builder(default)]
    pub arsenals: Vec<ArsenalRef>,
    /// Items of every arsenal the unit owns, in arsenal order.
    #[builder(default)]
    pub arsenal: Vec<ItemRef>,
    #[builder(default)]
    pub categories: Vec<String>,
    pub portrait_nid: Option<String>,
    pub affinity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct Shop {
    pub nid: ShopRef,
    pub name: String,
    pub abbr_name: String,
    pub kind: Recognized<ShopKind>,
    /// Sort key with digit runs padded, e.g. `05_Vendor`.
    pub order_name: String,
    /// Event nids this shop was merged from.
    pub locations: Vec<String>,
    pub items: Vec<ItemRef>,
}

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct Arsenal {
    pub nid: ArsenalRef,
    pub name: String,
    pub desc: String,
    pub icon_class: String,
    pub owner: UnitRef,
    /// Sorted by weapon rank (unranked last), then name.
    #[builder(default)]
    pub items: Vec<ItemRef>,
}

/// A display group. `members` holds nids of the category's record kind.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct Category {
    pub nid: String,
    pub name: String,
    /// Heading the category is listed under, e.g. `Item Type` or `Tier`.
    pub group: String,
    pub order: usize,
    #[builder(default)]
    pub members: Vec<String>,
}

/// Ordering used by every listing: case-insensitive display name, then nid.
pub fn listing_key(name: &str, nid: &str) -> (String, String) {
    (name.to_lowercase(), nid.to_string())
}

pub trait GuideLookup {
    fn skill(&self, nid: &str) -> Option<&Skill>;
    fn item(&self, nid: &str) -> Option<&Item>;
    fn class(&self, nid: &str) -> Option<&Class>;
    fn unit(&self, nid: &str) -> Option<&Unit>;
    fn shop(&self, nid: &str) -> Option<&Shop>;
    fn arsenal(&self, nid: &str) -> Option<&Arsenal>;
}

/// The complete dataset produced by one extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Guide {
    skills: Vec<Skill>,
    items: Vec<Item>,
    classes: Vec<Class>,
    units: Vec<Unit>,
    shops: Vec<Shop>,
    arsenals: Vec<Arsenal>,
    skill_categories: Vec<Category>,
    item_categories: Vec<Category>,
    class_categories: Vec<Category>,
    unit_categories: Vec<Category>,
    #[serde(skip)]
    lookups: GuideLookups,
}

/// Normalized nid or alias to index in the matching entity list.
#[derive(Debug, Clone, Default)]
struct GuideLookups {
    skills: HashMap<String, usize>,
    items: HashMap<String, usize>,
    classes: HashMap<String, usize>,
    units: HashMap<String, usize>,
    shops: HashMap<String, usize>,
    arsenals: HashMap<String, usize>,
}

fn build_lookup<'a, I>(keys: I) -> HashMap<String, usize>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let mut lookup = HashMap::new();
    for (idx, key) in keys {
        lookup.entry(normalize_identifier(key)).or_insert(idx);
    }
    lookup
}

fn build_guide_lookups(guide: &Guide) -> GuideLookups {
    GuideLookups {
        skills: build_lookup(guide.skills.iter().enumerate().flat_map(|(idx, skill)| {
            std::iter::once(skill.nid.as_str())
                .chain(skill.aliases.iter().map(String::as_str))
                .map(move |key| (idx, key))
        })),
        items: build_lookup(guide.items.iter().enumerate().flat_map(|(idx, item)| {
            std::iter::once(item.nid.as_str())
                .chain(item.aliases.iter().map(String::as_str))
                .map(move |key| (idx, key))
        })),
        classes: build_lookup(guide.classes.iter().enumerate().flat_map(|(idx, class)| {
            std::iter::once(class.nid.as_str())
                .chain(class.aliases.iter().map(String::as_str))
                .map(move |key| (idx, key))
        })),
        units: build_lookup(guide.units.iter().enumerate().flat_map(|(idx, unit)| {
            std::iter::once(unit.nid.as_str())
                .chain(unit.aliases.iter().map(String::as_str))
                .map(move |key| (idx, key))
        })),
        shops: build_lookup(
            guide
                .shops
                .iter()
                .enumerate()
                .map(|(idx, shop)| (idx, shop.nid.as_str())),
        ),
        arsenals: build_lookup(
            guide
                .arsenals
                .iter()
                .enumerate()
                .map(|(idx, arsenal)| (idx, arsenal.nid.as_str())),
        ),
    }
}

#[bon]
impl Guide {
    #[builder]
    pub fn new(
        skills: Vec<Skill>,
        items: Vec<Item>,
        classes: Vec<Class>,
        units: Vec<Unit>,
        shops: Vec<Shop>,
        arsenals: Vec<Arsenal>,
        #[builder(default)] skill_categories: Vec<Category>,
        #[builder(default)] item_categories: Vec<Category>,
        #[builder(default)] class_categories: Vec<Category>,
        #[builder(default)] unit_categories: Vec<Category>,
    ) -> Self {
        let mut guide = Guide {
            skills,
            items,
            classes,
            units,
            shops,
            arsenals,
            skill_categories,
            item_categories,
            class_categories,
            unit_categories,
            lookups: GuideLookups::default(),
        };
        guide.lookups = build_guide_lookups(&guide);
        guide
    }
}

impl Guide {
    /// Reads a dataset previously written by [`crate::export::write_guide`].
    pub fn from_reader<R: Read>(reader: R) -> IResult<Self> {
        let mut guide: Guide = serde_json::from_reader(reader)?;
        guide.lookups = build_guide_lookups(&guide);
        Ok(guide)
    }

    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn shops(&self) -> &[Shop] {
        &self.shops
    }

    pub fn arsenals(&self) -> &[Arsenal] {
        &self.arsenals
    }

    pub fn skill_categories(&self) -> &[Category] {
        &self.skill_categories
    }

    pub fn item_categories(&self) -> &[Category] {
        &self.item_categories
    }

    pub fn class_categories(&self) -> &[Category] {
        &self.class_categories
    }

    pub fn unit_categories(&self) -> &[Category] {
        &self.unit_categories
    }

    /// Record counts per kind, in a fixed order.
    pub fn counts(&self) -> [(RecordKind, usize); 6] {
        [
            (RecordKind::Skill, self.skills.len()),
            (RecordKind::Item, self.items.len()),
            (RecordKind::Class, self.classes.len()),
            (RecordKind::Unit, self.units.len()),
            (RecordKind::Shop, self.shops.len()),
            (RecordKind::Arsenal, self.arsenals.len()),
        ]
    }

    fn contains(&self, kind: RecordKind, nid: &str) -> bool {
        match kind {
            RecordKind::Skill => self.skill(nid).is_some(),
            RecordKind::Item => self.item(nid).is_some(),
            RecordKind::Class => self.class(nid).is_some(),
            RecordKind::Unit => self.unit(nid).is_some(),
            RecordKind::Shop => self.shop(nid).is_some(),
            RecordKind::Arsenal => self.arsenal(nid).is_some(),
            RecordKind::Category => false,
        }
    }

    /// Every `(from_kind, from_nid, target_kind, target_nid)` edge in the
    /// dataset, reverse indexes and category members included.
    pub fn links(&self) -> Vec<(RecordKind, &str, RecordKind, &str)> {
        use RecordKind as K;

        let mut links = Vec::new();
        for skill in &self.skills {
            let from = skill.nid.as_str();
            links.extend(skill.items.iter().map(|i| (K::Skill, from, K::Item, i.as_str())));
        }
        for item in &self.items {
            let from = item.nid.as_str();
            links.extend(item.skills.iter().map(|s| (K::Item, from, K::Skill, s.as_str())));
            links.extend(
                item.sub_items
                    .iter()
                    .chain(&item.super_items)
                    .map(|i| (K::Item, from, K::Item, i.as_str())),
            );
            links.extend(item.shops.iter().map(|s| (K::Item, from, K::Shop, s.as_str())));
            links.extend(item.arsenals.iter().map(|a| (K::Item, from, K::Arsenal, a.as_str())));
        }
        for class in &self.classes {
            let from = class.nid.as_str();
            links.extend(
                class
                    .turns_into
                    .iter()
                    .chain(&class.promotes_from)
                    .map(|c| (K::Class, from, K::Class, c.as_str())),
            );
            links.extend(
                class
                    .learned_skills
                    .iter()
                    .map(|l| (K::Class, from, K::Skill, l.skill.as_str())),
            );
            links.extend(class.units.iter().map(|u| (K::Class, from, K::Unit, u.as_str())));
        }
        for unit in &self.units {
            let from = unit.nid.as_str();
            links.extend(unit.class.iter().map(|c| (K::Unit, from, K::Class, c.as_str())));
            links.extend(
                unit.starting_items
                    .iter()
                    .chain(&unit.arsenal)
                    .map(|i| (K::Unit, from, K::Item, i.as_str())),
            );
            links.extend(
                unit.learned_skills
                    .iter()
                    .map(|l| (K::Unit, from, K::Skill, l.skill.as_str())),
            );
            links.extend(unit.arsenals.iter().map(|a| (K::Unit, from, K::Arsenal, a.as_str())));
        }
        for shop in &self.shops {
            let from = shop.nid.as_str();
            links.extend(shop.items.iter().map(|i| (K::Shop, from, K::Item, i.as_str())));
        }
        for arsenal in &self.arsenals {
            let from = arsenal.nid.as_str();
            links.push((K::Arsenal, from, K::Unit, arsenal.owner.as_str()));
            links.extend(arsenal.items.iter().map(|i| (K::Arsenal, from, K::Item, i.as_str())));
        }
        for (categories, kind) in [
            (&self.skill_categories, K::Skill),
            (&self.item_categories, K::Item),
            (&self.class_categories, K::Class),
            (&self.unit_categories, K::Unit),
        ] {
            for category in categories {
                let from = category.nid.as_str();
                links.extend(category.members.iter().map(|m| (K::Category, from, kind, m.as_str())));
            }
        }
        links
    }

    /// Checks that every reference in the dataset points at an existing entity.
    pub fn verify_links(&self) -> IResult<()> {
        for (from_kind, from_nid, target_kind, target_nid) in self.links() {
            if !self.contains(target_kind, target_nid) {
                return Err(ErrorKind::unresolved(
                    from_kind,
                    from_nid,
                    target_kind,
                    target_nid,
                ));
            }
        }
        Ok(())
    }
}

impl GuideLookup for Guide {
    fn skill(&self, nid: &str) -> Option<&Skill> {
        self.lookups
            .skills
            .get(&normalize_identifier(nid))
            .map(|&idx| &self.skills[idx])
    }

    fn item(&self, nid: &str) -> Option<&Item> {
        self.lookups
            .items
            .get(&normalize_identifier(nid))
            .map(|&idx| &self.items[idx])
    }

    fn class(&self, nid: &str) -> Option<&Class> {
        self.lookups
            .classes
            .get(&normalize_identifier(nid))
            .map(|&idx| &self.classes[idx])
    }

    fn unit(&self, nid: &str) -> Option<&Unit> {
        self.lookups
            .units
            .get(&normalize_identifier(nid))
            .map(|&idx| &self.units[idx])
    }

    fn shop(&self, nid: &str) -> Option<&Shop> {
        self.lookups
            .shops
            .get(&normalize_identifier(nid))
            .map(|&idx| &self.shops[idx])
    }

    fn arsenal(&self, nid: &str) -> Option<&Arsenal> {
        self.lookups
            .arsenals
            .get(&normalize_identifier(nid))
            .map(|&idx| &self.arsenals[idx])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sword() -> Item {
        Item::builder()
            .nid(ItemRef::new("Iron_Sword"))
            .name("Iron Sword".to_string())
            .aliases(vec!["Iron Sword".to_string()])
            .maybe_rank(Some(WeaponRank::parse("E")))
            .rank_order(1)
            .desc(String::new())
            .maybe_weapon_type(Some("Sword".to_string()))
            .damage(5)
            .hit(90)
            .crit(0)
            .weight(5)
            .min_range(1)
            .max_range(1)
            .value(460)
            .icon_class(String::new())
            .consumable(false)
            .listed(true)
            .build()
    }

    #[test]
    fn ranks_order_like_the_game() {
        assert_eq!(rank_order(None), UNRANKED_ORDER);
        assert_eq!(rank_order(Some(&WeaponRank::parse("Prf"))), 0);
        assert_eq!(rank_order(Some(&WeaponRank::parse("E"))), 1);
        assert_eq!(rank_order(Some(&WeaponRank::parse("X"))), 9);
        assert_eq!(rank_order(Some(&WeaponRank::parse("Z"))), UNKNOWN_RANK_ORDER);
    }

    #[test]
    fn shop_kind_comes_from_nid() {
        assert_eq!(ShopKind::from_nid("14A_SecretShop"), Some(ShopKind::SecretShop));
        assert_eq!(ShopKind::from_nid("Global_IdeArmory"), Some(ShopKind::Armory));
        assert_eq!(ShopKind::from_nid("Prologue"), None);
        assert_eq!(ShopKind::parse("Secret Shop").known(), Some(&ShopKind::SecretShop));
    }

    #[test]
    fn lookups_accept_aliases_and_survive_reload() {
        let guide = Guide::builder()
            .skills(vec![])
            .items(vec![sword()])
            .classes(vec![])
            .units(vec![])
            .shops(vec![])
            .arsenals(vec![])
            .build();
        assert!(guide.item("Iron_Sword").is_some());
        assert!(guide.item("iron sword").is_some());
        assert!(guide.item("Steel_Sword").is_none());

        let json = serde_json::to_vec(&guide).unwrap();
        let reloaded = Guide::from_reader(json.as_slice()).unwrap();
        assert_eq!(reloaded.items(), guide.items());
        assert!(reloaded.item("IRON-SWORD").is_some());
    }

    #[test]
    fn verify_links_reports_dangling_reference() {
        let mut item = sword();
        item.sub_items.push(ItemRef::new("Missing_Blade"));
        let guide = Guide::builder()
            .skills(vec![])
            .items(vec![item])
            .classes(vec![])
            .units(vec![])
            .shops(vec![])
            .arsenals(vec![])
            .build();
        match guide.verify_links() {
            Err(ErrorKind::Resolution {
                from_kind,
                target_nid,
                ..
            }) => {
                assert_eq!(from_kind, RecordKind::Item);
                assert_eq!(target_nid, "Missing_Blade");
            }
            other => panic!("expected resolution error, got {other:?}"),
        }
    }
}
