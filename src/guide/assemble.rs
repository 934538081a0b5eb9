//! Final pass: display categories, reverse indexes and listing order.

use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use tracing::debug;

use crate::guide::naming::pad_digits;
use crate::guide::resolve::{ExtractionContext, MISC_SKILL_CATEGORY, category_of};
use crate::guide::types::*;
use crate::resources::records::ItemRecord;

/// `(nid, group, name)` of every item category, in display order.
const ITEM_CATEGORIES: &[(&str, &str, &str)] = &[
    ("wtype_Accessory", "Item Type", "Accessories"),
    ("wtype_HeldItem", "Item Type", "Held Items"),
    ("wtype_Sword", "Item Type", "Swords"),
    ("wtype_Axe", "Item Type", "Axes"),
    ("wtype_Lance", "Item Type", "Lances"),
    ("wtype_Bow", "Item Type", "Bows"),
    ("wtype_Staff", "Item Type", "Staves"),
    ("wtype_Anima", "Item Type", "Anima Tomes"),
    ("wtype_Dark", "Item Type", "Dark Tomes"),
    ("wtype_Light", "Item Type", "Light Tomes"),
    (CONSUMABLES, "Item Type", "Consumables"),
    (OTHER_ITEMS, "Item Type", "Other Items"),
    ("wstype_Dagger", "Weapon Subtype", "Daggers"),
    ("wstype_Blade", "Weapon Subtype", "Blades"),
    ("wstype_Warhammer", "Weapon Subtype", "Warhammers"),
    ("wstype_Greatlance", "Weapon Subtype", "Greatlances"),
    ("etype_Fire", "Element", "Fire"),
    ("etype_Wind", "Element", "Wind"),
    ("etype_Water", "Element", "Water"),
    ("etype_Thunder", "Element", "Thunder"),
    ("etype_Dark", "Element", "Dark"),
    ("etype_Light", "Element", "Light"),
    ("etype_Ice", "Element", "Ice"),
    ("etype_Earth", "Element", "Earth"),
];

const CONSUMABLES: &str = "consumables";
const OTHER_ITEMS: &str = "other_items";
const DAGGER_CATEGORY: &str = "wstype_Dagger";
/// Item tags that name a weapon subtype; every other tag is read as an element.
const WEAPON_SUBTYPES: &[&str] = &["Dagger", "Blade", "Warhammer", "Greatlance"];
/// Status that makes any weapon count as a dagger.
const DAGGER_STATUS: &str = "Quick_Knife";

pub const UNCATEGORIZED: &str = "Uncategorized";

/// Resolved entities waiting for [`assemble`].
#[derive(Debug, Default)]
pub struct Resolved {
    pub skills: Vec<Skill>,
    pub items: Vec<Item>,
    pub classes: Vec<Class>,
    pub units: Vec<Unit>,
    pub shops: Vec<Shop>,
    pub arsenals: Vec<Arsenal>,
}

type SortKeys = HashMap<String, (String, String)>;

fn sort_keys<'a>(entries: impl Iterator<Item = (&'a str, &'a str)>) -> SortKeys {
    entries
        .map(|(nid, name)| (nid.to_string(), listing_key(name, nid)))
        .collect()
}

/// Sorts references by the listing key of their target and drops repeats.
fn sort_listing<R: AsRef<str> + PartialEq>(list: &mut Vec<R>, keys: &SortKeys) {
    list.sort_by_cached_key(|r| {
        keys.get(r.as_ref())
            .cloned()
            .unwrap_or_else(|| listing_key(r.as_ref(), r.as_ref()))
    });
    list.dedup();
}

fn positions<T>(list: &[T], nid: impl Fn(&T) -> &str) -> HashMap<String, usize> {
    list.iter()
        .enumerate()
        .map(|(idx, entry)| (nid(entry).to_string(), idx))
        .collect()
}

/// Sorts members, drops empty categories and numbers the rest in order.
fn finish_categories(drafts: Vec<Category>, keys: &SortKeys) -> Vec<Category> {
    drafts
        .into_iter()
        .filter(|category| !category.members.is_empty())
        .enumerate()
        .map(|(order, mut category)| {
            sort_listing(&mut category.members, keys);
            category.order = order;
            category
        })
        .collect()
}

fn draft(nid: impl Into<String>, name: impl Into<String>, group: &str) -> Category {
    Category::builder()
        .nid(nid.into())
        .name(name.into())
        .group(group.to_string())
        .order(0)
        .build()
}

fn item_category_nids(record: &ItemRecord, consumable: bool) -> Vec<&'static str> {
    let known = |nid: String| {
        ITEM_CATEGORIES
            .iter()
            .map(|(candidate, _, _)| *candidate)
            .find(|candidate| *candidate == nid)
    };

    let mut nids = Vec::new();
    let primary = record
        .weapon_type
        .as_ref()
        .and_then(|weapon| known(format!("wtype_{weapon}")))
        .or_else(|| record.equippable_accessory.then_some("wtype_Accessory"))
        .or_else(|| record.held_status.then_some("wtype_HeldItem"));
    nids.extend(primary);

    let (subtypes, elements): (Vec<&String>, Vec<&String>) = record
        .item_tags
        .iter()
        .partition(|tag| WEAPON_SUBTYPES.contains(&tag.as_str()));
    nids.extend(elements.into_iter().filter_map(|tag| known(format!("etype_{tag}"))));
    nids.extend(subtypes.into_iter().filter_map(|tag| known(format!("wstype_{tag}"))));
    if record.statuses.iter().any(|status| status == DAGGER_STATUS) {
        nids.push(DAGGER_CATEGORY);
    }
    if consumable {
        nids.push(CONSUMABLES);
    }
    if nids.is_empty() {
        nids.push(OTHER_ITEMS);
    }

    ITEM_CATEGORIES
        .iter()
        .map(|(nid, _, _)| *nid)
        .filter(|nid| nids.contains(nid))
        .collect()
}

/// Items are still in index order here, so they line up with the records.
fn item_categories(ctx: &ExtractionContext<'_>, items: &mut [Item]) -> Vec<Category> {
    let mut drafts: Vec<Category> = ITEM_CATEGORIES
        .iter()
        .map(|(nid, group, name)| draft(*nid, *name, group))
        .collect();

    for (item, record) in items.iter_mut().zip(ctx.item_index().records()) {
        let nids = item_category_nids(record, item.consumable);
        if item.listed {
            for nid in &nids {
                if let Some(category) = drafts.iter_mut().find(|c| c.nid == *nid) {
                    category.members.push(item.nid.to_string());
                }
            }
        }
        item.categories = nids.into_iter().map(str::to_string).collect();
    }
    drafts
}

fn skill_categories(skills: &[Skill]) -> Vec<Category> {
    let mut by_category: BTreeMap<(bool, String, String), Category> = BTreeMap::new();
    let mut by_kind: BTreeMap<SkillKind, Category> = BTreeMap::new();

    for skill in skills.iter().filter(|skill| !skill.hidden) {
        let order = (
            skill.category == MISC_SKILL_CATEGORY,
            pad_digits(&skill.category_name, 2).to_lowercase(),
            skill.category.clone(),
        );
        by_category
            .entry(order)
            .or_insert_with(|| draft(skill.category.clone(), skill.category_name.clone(), "Category"))
            .members
            .push(skill.nid.to_string());
        by_kind
            .entry(skill.kind)
            .or_insert_with(|| draft(format!("kind_{}", skill.kind.name()), skill.kind.name(), "Kind"))
            .members
            .push(skill.nid.to_string());
    }

    by_category.into_values().chain(by_kind.into_values()).collect()
}

fn class_categories(classes: &mut [Class]) -> Vec<Category> {
    let mut tiers: BTreeMap<i64, Category> = BTreeMap::new();
    let mut weapons: BTreeMap<String, Category> = BTreeMap::new();
    let mut tags: BTreeMap<String, Category> = BTreeMap::new();

    for class in classes.iter_mut() {
        let nid = class.nid.to_string();
        let tier = tiers.entry(class.tier).or_insert_with(|| {
            draft(format!("tier_{}", class.tier), format!("Tier {}", class.tier), "Tier")
        });
        tier.members.push(nid.clone());
        class.categories.push(tier.nid.clone());

        for weapon in &class.weapons {
            let category = weapons
                .entry(weapon.clone())
                .or_insert_with(|| draft(format!("weapon_{weapon}"), weapon.clone(), "Weapon"));
            category.members.push(nid.clone());
            class.categories.push(category.nid.clone());
        }
        for tag in &class.tags {
            let category = tags
                .entry(tag.clone())
                .or_insert_with(|| draft(format!("tag_{tag}"), tag.clone(), "Unit Type"));
            category.members.push(nid.clone());
            class.categories.push(category.nid.clone());
        }
    }

    tiers
        .into_values()
        .chain(weapons.into_values())
        .chain(tags.into_values())
        .collect()
}

fn unit_categories(ctx: &ExtractionContext<'_>, units: &mut [Unit]) -> Vec<Category> {
    let mut by_path: BTreeMap<(bool, String), Category> = BTreeMap::new();
    for unit in units.iter_mut() {
        let path = category_of(ctx.unit_categories(), unit.nid.as_str(), &unit.aliases)
            .unwrap_or(UNCATEGORIZED);
        let category = by_path
            .entry((path == UNCATEGORIZED, path.to_lowercase()))
            .or_insert_with(|| draft(path, path.replace('/', " / "), "Unit Category"));
        category.members.push(unit.nid.to_string());
        unit.categories = vec![category.nid.clone()];
    }
    by_path.into_values().collect()
}

/// Arsenal items and arsenal members leave the listings; arsenals are
/// linked to their items and owners.
fn link_arsenals(items: &mut [Item], units: &mut [Unit], arsenals: &[Arsenal]) {
    let item_pos = positions(items, |item| item.nid.as_str());
    let unit_pos = positions(units, |unit| unit.nid.as_str());

    for arsenal in arsenals {
        if let Some(&idx) = item_pos.get(arsenal.nid.as_str()) {
            items[idx].listed = false;
        }
        for member in &arsenal.items {
            if let Some(&idx) = item_pos.get(member.as_str()) {
                items[idx].listed = false;
                items[idx].arsenals.push(arsenal.nid.clone());
            }
        }
        if let Some(&idx) = unit_pos.get(arsenal.owner.as_str()) {
            let unit = &mut units[idx];
            unit.arsenals.push(arsenal.nid.clone());
            unit.arsenal.extend(arsenal.items.iter().cloned());
        }
    }

    for unit in units.iter_mut() {
        unit.arsenal = unit.arsenal.drain(..).unique().collect();
    }
}

fn link_reverse_indexes(entities: &mut Resolved) {
    let Resolved {
        skills,
        items,
        classes,
        units,
        shops,
        ..
    } = entities;
    let skill_pos = positions(skills, |skill| skill.nid.as_str());
    let item_pos = positions(items, |item| item.nid.as_str());
    let class_pos = positions(classes, |class| class.nid.as_str());

    let mut granted: Vec<(usize, ItemRef)> = Vec::new();
    let mut containers: Vec<(usize, ItemRef)> = Vec::new();
    for item in items.iter() {
        for skill in &item.skills {
            if let Some(&idx) = skill_pos.get(skill.as_str()) {
                granted.push((idx, item.nid.clone()));
            }
        }
        for sub in &item.sub_items {
            if let Some(&idx) = item_pos.get(sub.as_str()) {
                containers.push((idx, item.nid.clone()));
            }
        }
    }
    for (idx, item) in granted {
        skills[idx].items.push(item);
    }
    for (idx, item) in containers {
        items[idx].super_items.push(item);
    }

    for shop in shops.iter() {
        for stock in &shop.items {
            if let Some(&idx) = item_pos.get(stock.as_str()) {
                items[idx].shops.push(shop.nid.clone());
            }
        }
    }

    for unit in units.iter() {
        if let Some(&idx) = unit.class.as_ref().and_then(|class| class_pos.get(class.as_str())) {
            classes[idx].units.push(unit.nid.clone());
        }
    }

    let mut promotions: Vec<(usize, ClassRef)> = Vec::new();
    for class in classes.iter() {
        for target in &class.turns_into {
            if let Some(&idx) = class_pos.get(target.as_str()) {
                promotions.push((idx, class.nid.clone()));
            }
        }
    }
    for (idx, class) in promotions {
        classes[idx].promotes_from.push(class);
    }
}

/// Groups the resolved entities into display categories, fills every
/// reverse index and puts all listings in display order.
pub fn assemble(ctx: &ExtractionContext<'_>, mut entities: Resolved) -> Guide {
    link_arsenals(&mut entities.items, &mut entities.units, &entities.arsenals);
    let item_drafts = item_categories(ctx, &mut entities.items);
    let skill_drafts = skill_categories(&entities.skills);
    let class_drafts = class_categories(&mut entities.classes);
    let unit_drafts = unit_categories(ctx, &mut entities.units);
    link_reverse_indexes(&mut entities);

    let Resolved {
        mut skills,
        mut items,
        mut classes,
        mut units,
        mut shops,
        mut arsenals,
    } = entities;

    let skill_keys = sort_keys(skills.iter().map(|s| (s.nid.as_str(), s.name.as_str())));
    let item_keys = sort_keys(items.iter().map(|i| (i.nid.as_str(), i.name.as_str())));
    let class_keys = sort_keys(classes.iter().map(|c| (c.nid.as_str(), c.display_name.as_str())));
    let unit_keys = sort_keys(units.iter().map(|u| (u.nid.as_str(), u.name.as_str())));
    let shop_keys = sort_keys(shops.iter().map(|s| (s.nid.as_str(), s.name.as_str())));
    let arsenal_keys = sort_keys(arsenals.iter().map(|a| (a.nid.as_str(), a.name.as_str())));

    for skill in &mut skills {
        sort_listing(&mut skill.items, &item_keys);
    }
    for item in &mut items {
        sort_listing(&mut item.super_items, &item_keys);
        sort_listing(&mut item.shops, &shop_keys);
        sort_listing(&mut item.arsenals, &arsenal_keys);
    }
    for class in &mut classes {
        sort_listing(&mut class.promotes_from, &class_keys);
        sort_listing(&mut class.units, &unit_keys);
    }
    for unit in &mut units {
        sort_listing(&mut unit.arsenals, &arsenal_keys);
    }

    let skill_categories = finish_categories(skill_drafts, &skill_keys);
    let item_categories = finish_categories(item_drafts, &item_keys);
    let class_categories = finish_categories(class_drafts, &class_keys);
    let unit_categories = finish_categories(unit_drafts, &unit_keys);

    skills.sort_by_cached_key(|s| listing_key(&s.name, s.nid.as_str()));
    items.sort_by_cached_key(|i| listing_key(&i.name, i.nid.as_str()));
    classes.sort_by_cached_key(|c| listing_key(&c.display_name, c.nid.as_str()));
    units.sort_by_cached_key(|u| listing_key(&u.name, u.nid.as_str()));
    shops.sort_by_cached_key(|s| listing_key(&s.name, s.nid.as_str()));
    arsenals.sort_by_cached_key(|a| listing_key(&a.name, a.nid.as_str()));

    debug!(
        skill_categories = skill_categories.len(),
        item_categories = item_categories.len(),
        class_categories = class_categories.len(),
        unit_categories = unit_categories.len(),
        "assembled categories"
    );

    Guide::builder()
        .skills(skills)
        .items(items)
        .classes(classes)
        .units(units)
        .shops(shops)
        .arsenals(arsenals)
        .skill_categories(skill_categories)
        .item_categories(item_categories)
        .class_categories(class_categories)
        .unit_categories(unit_categories)
        .build()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::ExtractionConfig;
    use crate::guide::arsenals::build_arsenals;
    use crate::guide::shops::merge_shops;
    use crate::resources::keys::*;
    use crate::resources::load_resources;
    use crate::resources::test::memory_source;

    fn guide_for(files: &[(&str, &str)]) -> Guide {
        let config = ExtractionConfig::default();
        let resources = load_resources(&memory_source(files)).unwrap();
        let ctx = ExtractionContext::new(resources, &config).unwrap();
        let items = ctx.resolve_items().unwrap();
        let arsenals = build_arsenals(&ctx, &items).unwrap();
        let entities = Resolved {
            skills: ctx.resolve_skills(),
            classes: ctx.resolve_classes().unwrap(),
            units: ctx.resolve_units().unwrap(),
            shops: merge_shops(&ctx).unwrap(),
            items,
            arsenals,
        };
        assemble(&ctx, entities)
    }

    fn category<'a>(categories: &'a [Category], nid: &str) -> &'a Category {
        categories.iter().find(|c| c.nid == nid).unwrap()
    }

    const SKILLS: &str = r#"[
        {"nid": "Quick_Knife", "name": "Quick Knife", "components": []},
        {"nid": "Canto", "name": "Canto", "components": []},
        {"nid": "Debug_Skill", "name": "Debug", "components": [["hidden", null]]}
    ]"#;

    const ITEMS: &str = r#"[
        {"nid": "Iron_Sword", "name": "Iron Sword", "components": [["weapon_type", "Sword"], ["item_tags", ["Fire", "Blade"]]]},
        {"nid": "kitchen_knife", "name": "kitchen knife", "components": [["weapon_type", "Sword"], ["status_on_equip", "Quick_Knife"]]},
        {"nid": "Ring", "name": "Ring", "components": [["equippable_accessory", null], ["status_on_equip", "Canto"]]},
        {"nid": "Vulnerary", "name": "Vulnerary", "components": [["usable", null]]},
        {"nid": "Rock", "name": "Rock", "components": [["multi_item", ["Iron_Sword", "Ring"]]]},
        {"nid": "Iron_Sword_P", "name": "Iron Sword", "components": [["weapon_type", "Sword"]]}
    ]"#;

    #[test]
    fn items_fall_into_fixed_categories() {
        let guide = guide_for(&[(SKILLS_FILE, SKILLS), (ITEMS_FILE, ITEMS)]);
        let categories = guide.item_categories();

        assert_eq!(
            categories.iter().map(|c| c.nid.as_str()).collect::<Vec<_>>(),
            vec![
                "wtype_Accessory",
                "wtype_Sword",
                CONSUMABLES,
                OTHER_ITEMS,
                "wstype_Dagger",
                "wstype_Blade",
                "etype_Fire"
            ]
        );
        assert!(categories.iter().enumerate().all(|(idx, c)| c.order == idx));

        // Sorted case-insensitively, hidden suffix left out.
        assert_eq!(
            category(categories, "wtype_Sword").members,
            vec!["Iron_Sword", "kitchen_knife"]
        );
        assert_eq!(category(categories, "wstype_Dagger").members, vec!["kitchen_knife"]);
        assert_eq!(category(categories, CONSUMABLES).members, vec!["Vulnerary"]);
        assert_eq!(category(categories, OTHER_ITEMS).members, vec!["Rock"]);

        let hidden = guide.item("Iron_Sword_P").unwrap();
        assert!(!hidden.listed);
        assert_eq!(hidden.categories, vec!["wtype_Sword"]);
        assert_eq!(
            guide.item("Iron_Sword").unwrap().categories,
            vec!["wtype_Sword", "wstype_Blade", "etype_Fire"]
        );
    }

    #[test]
    fn reverse_indexes_are_filled_and_sorted() {
        let classes = r#"[
            {"nid": "T1_Journeyman", "name": "Journeyman", "tier": 1, "turns_into": ["T2_Fighter"],
             "wexp_gain": {"Axe": [true, 1, 0]}},
            {"nid": "T1_Brigand", "name": "Brigand", "tier": 1, "turns_into": ["T2_Fighter"],
             "tags": ["Infantry"]},
            {"nid": "T2_Fighter", "name": "Fighter", "tier": 2}
        ]"#;
        let units = r#"[
            {"nid": "Ross", "name": "Ross", "klass": "T1_Journeyman"},
            {"nid": "Garcia", "name": "Garcia", "klass": "T2_Fighter"},
            {"nid": "Bandit", "name": "bandit", "klass": "T1_Journeyman"}
        ]"#;
        let events = r#"[{"nid": "3_Vendor", "_source": ["shop;Vendor;Ring,Vulnerary"]}]"#;
        let guide = guide_for(&[
            (SKILLS_FILE, SKILLS),
            (ITEMS_FILE, ITEMS),
            (CLASSES_FILE, classes),
            (UNITS_FILE, units),
            (EVENTS_FILE, events),
            (UNIT_CATEGORIES_FILE, r#"{"Ross": "Vanilla", "Garcia": "Vanilla"}"#),
        ]);
        guide.verify_links().unwrap();

        let fighter = guide.class("T2_Fighter").unwrap();
        assert_eq!(
            fighter.promotes_from,
            vec![ClassRef::new("T1_Brigand"), ClassRef::new("T1_Journeyman")]
        );
        assert_eq!(
            guide.class("T1_Journeyman").unwrap().units,
            vec![UnitRef::new("Bandit"), UnitRef::new("Ross")]
        );
        assert_eq!(
            guide.item("Ring").unwrap().super_items,
            vec![ItemRef::new("Rock")]
        );
        assert_eq!(guide.item("Ring").unwrap().shops, vec![ShopRef::new("3_Vendor")]);
        assert_eq!(guide.skill("Canto").unwrap().items, vec![ItemRef::new("Ring")]);

        assert_eq!(
            guide.classes().iter().map(|c| c.nid.as_str()).collect::<Vec<_>>(),
            vec!["T1_Brigand", "T2_Fighter", "T1_Journeyman"]
        );

        let class_categories = guide.class_categories();
        assert_eq!(
            class_categories.iter().map(|c| c.nid.as_str()).collect::<Vec<_>>(),
            vec!["tier_1", "tier_2", "weapon_Axe", "tag_Infantry"]
        );
        assert_eq!(category(class_categories, "tier_1").members, vec!["T1_Brigand", "T1_Journeyman"]);

        let unit_categories = guide.unit_categories();
        assert_eq!(unit_categories[0].nid, "Vanilla");
        assert_eq!(unit_categories[0].members, vec!["Garcia", "Ross"]);
        assert_eq!(unit_categories[1].nid, UNCATEGORIZED);
        assert_eq!(guide.unit("Bandit").unwrap().categories, vec![UNCATEGORIZED]);
    }

    #[test]
    fn hidden_skills_stay_out_of_listings() {
        let guide = guide_for(&[(SKILLS_FILE, SKILLS), (SKILL_CATEGORIES_FILE, r#"{"Canto": "MyUnit/T1"}"#)]);
        let categories = guide.skill_categories();
        assert_eq!(
            categories
                .iter()
                .map(|c| (c.nid.as_str(), c.name.as_str(), c.group.as_str()))
                .collect::<Vec<_>>(),
            vec![
                ("MyUnit/T1", "Feats (Tier 1)", "Category"),
                (MISC_SKILL_CATEGORY, MISC_SKILL_CATEGORY, "Category"),
                ("kind_Passive", "Passive", "Kind"),
            ]
        );
        assert_eq!(categories[1].members, vec!["Quick_Knife"]);
        assert!(guide.skill("Debug_Skill").is_some());
    }
}
