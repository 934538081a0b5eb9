//! Per-run state and the resolution pass from raw records to linked entities.

use std::collections::HashMap;

use tracing::debug;

use crate::config::ExtractionConfig;
use crate::error::{ErrorKind, IResult};
use crate::guide::index::EntityIndex;
use crate::guide::naming::{
    DisplayNameNormalizer, icon_class, render_styled_text, skill_category_name, strip_markup,
};
use crate::guide::types::*;
use crate::resources::records::{ClassRecord, EventRecord, ItemRecord, SkillRecord, UnitRecord};
use crate::resources::{CategoryMap, RawResources};

/// Category assigned to skills missing from `skills.category.json`.
pub const MISC_SKILL_CATEGORY: &str = "Misc";

/// Everything one extraction run works from. Built once from the loaded
/// resources and dropped when the run ends.
pub struct ExtractionContext<'a> {
    config: &'a ExtractionConfig,
    normalizer: DisplayNameNormalizer,
    skills: EntityIndex<SkillRecord>,
    items: EntityIndex<ItemRecord>,
    classes: EntityIndex<ClassRecord>,
    units: EntityIndex<UnitRecord>,
    events: Vec<EventRecord>,
    skill_categories: CategoryMap,
    item_categories: CategoryMap,
    unit_categories: CategoryMap,
}

fn learned_skills(
    index: &EntityIndex<SkillRecord>,
    from_kind: RecordKind,
    from_nid: &str,
    learned: &[(i64, String)],
) -> IResult<Vec<LearnedSkill>> {
    learned
        .iter()
        .map(|(level, skill)| {
            let skill = index.resolve(from_kind, from_nid, skill)?;
            Ok(LearnedSkill::builder()
                .level(*level)
                .skill(SkillRef::new(skill))
                .build())
        })
        .collect()
}

/// Looks a category up by raw nid, then by any alias merged into it.
pub(crate) fn category_of<'m>(map: &'m CategoryMap, nid: &str, aliases: &[String]) -> Option<&'m str> {
    std::iter::once(nid)
        .chain(aliases.iter().map(String::as_str))
        .find_map(|key| map.get(key))
        .map(String::as_str)
}

impl<'a> ExtractionContext<'a> {
    /// Indexes every record kind. Fails on the first conflicting duplicate.
    pub fn new(resources: RawResources, config: &'a ExtractionConfig) -> IResult<Self> {
        Ok(Self {
            config,
            normalizer: DisplayNameNormalizer::new(&config.names),
            skills: EntityIndex::build(resources.skills)?,
            items: EntityIndex::build(resources.items)?,
            classes: EntityIndex::build(resources.classes)?,
            units: EntityIndex::build(resources.units)?,
            events: resources.events,
            skill_categories: resources.skill_categories,
            item_categories: resources.item_categories,
            unit_categories: resources.unit_categories,
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        self.config
    }

    pub fn normalizer(&self) -> &DisplayNameNormalizer {
        &self.normalizer
    }

    pub fn item_index(&self) -> &EntityIndex<ItemRecord> {
        &self.items
    }

    pub fn unit_index(&self) -> &EntityIndex<UnitRecord> {
        &self.units
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn item_categories(&self) -> &CategoryMap {
        &self.item_categories
    }

    pub fn unit_categories(&self) -> &CategoryMap {
        &self.unit_categories
    }

    pub fn resolve_skills(&self) -> Vec<Skill> {
        self.skills
            .entries()
            .iter()
            .map(|entry| {
                let record = &entry.record;
                let category = category_of(&self.skill_categories, &record.nid, &entry.aliases)
                    .unwrap_or(MISC_SKILL_CATEGORY)
                    .to_string();

                let kind = category
                    .split('/')
                    .find_map(SkillKind::from_name)
                    .unwrap_or(if record.active {
                        SkillKind::Active
                    } else if record.aura {
                        SkillKind::Support
                    } else {
                        SkillKind::Passive
                    });

                Skill::builder()
                    .nid(SkillRef::new(record.nid.clone()))
                    .name(strip_markup(&record.name).trim().to_string())
                    .aliases(entry.aliases.clone())
                    .icon_class(icon_class(&record.nid, record.icon_nid.as_deref(), "skill"))
                    .category_name(skill_category_name(&category))
                    .category(category)
                    .kind(kind)
                    .desc(render_styled_text(&record.desc))
                    .hidden(record.hidden)
                    .build()
            })
            .collect()
    }

    /// Skills an item grants. Statuses matching an exclusion pattern are
    /// skipped, and skills sharing a name collapse to the one with the
    /// longest rendered description.
    fn item_skills(&self, item: &ItemRecord) -> IResult<Vec<SkillRef>> {
        let mut by_name: Vec<&SkillRecord> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for status in &item.statuses {
            if self
                .config
                .status_exclude
                .iter()
                .any(|pattern| status.contains(pattern.as_str()))
            {
                continue;
            }
            let skill = self
                .skills
                .get(status)
                .map(|entry| &entry.record)
                .ok_or_else(|| {
                    ErrorKind::unresolved(RecordKind::Item, &item.nid, RecordKind::Skill, status)
                })?;
            let name = strip_markup(&skill.name).trim().to_string();
            match positions.get(&name) {
                Some(&idx) => {
                    let rendered_len = |skill: &SkillRecord| render_styled_text(&skill.desc).len();
                    if rendered_len(skill) > rendered_len(by_name[idx]) {
                        by_name[idx] = skill;
                    }
                }
                None => {
                    positions.insert(name, by_name.len());
                    by_name.push(skill);
                }
            }
        }

        Ok(by_name
            .into_iter()
            .map(|skill| SkillRef::new(skill.nid.clone()))
            .collect())
    }

    pub fn resolve_items(&self) -> IResult<Vec<Item>> {
        let mut items = Vec::with_capacity(self.items.len());
        for entry in self.items.entries() {
            let record = &entry.record;

            let rank = match record.weapon_rank.as_deref() {
                Some(rank) => Some(WeaponRank::parse(rank)),
                None if record.weapon_type.is_some() && !record.prf_units.is_empty() => {
                    Some(WeaponRank::Prf.into())
                }
                None => None,
            };

            let sub_items = record
                .sub_items
                .iter()
                .map(|sub| {
                    self.items
                        .resolve(RecordKind::Item, &record.nid, sub)
                        .map(ItemRef::new)
                })
                .collect::<IResult<Vec<_>>>()?;

            let hidden = self
                .config
                .hidden_item_suffixes
                .iter()
                .any(|suffix| record.nid.ends_with(suffix.as_str()));

            let item = Item::builder()
                .nid(ItemRef::new(record.nid.clone()))
                .name(strip_markup(&record.name).trim().to_string())
                .aliases(entry.aliases.clone())
                .rank_order(rank_order(rank.as_ref()))
                .maybe_rank(rank)
                .desc(render_styled_text(&record.desc))
                .maybe_weapon_type(record.weapon_type.clone())
                .maybe_target(record.target.clone())
                .damage(record.damage)
                .hit(record.hit)
                .crit(record.crit)
                .weight(record.weight)
                .min_range(record.min_range)
                .max_range(record.max_range)
                .value(record.value)
                .icon_class(icon_class(&record.nid, record.icon_nid.as_deref(), "item"))
                .consumable(record.usable || (record.has_uses && record.weapon_type.is_none()))
                .listed(!hidden)
                .skills(self.item_skills(record)?)
                .sub_items(sub_items)
                .build();
            items.push(item);
        }
        debug!(items = items.len(), "resolved items");
        Ok(items)
    }

    pub fn resolve_classes(&self) -> IResult<Vec<Class>> {
        let mut classes = Vec::with_capacity(self.classes.len());
        for entry in self.classes.entries() {
            let record = &entry.record;
            let turns_into = record
                .turns_into
                .iter()
                .map(|target| {
                    self.classes
                        .resolve(RecordKind::Class, &record.nid, target)
                        .map(ClassRef::new)
                })
                .collect::<IResult<Vec<_>>>()?;

            let class = Class::builder()
                .nid(ClassRef::new(record.nid.clone()))
                .name(strip_markup(&record.name).trim().to_string())
                .display_name(
                    self.normalizer
                        .normalize_with_name(&record.nid, Some(record.name.as_str())),
                )
                .aliases(entry.aliases.clone())
                .desc(render_styled_text(&record.desc))
                .tier(record.tier)
                .max_level(record.max_level)
                .weapons(record.weapons.clone())
                .tags(record.tags.clone())
                .growths(record.growths.clone())
                .bases(record.bases.clone())
                .growth_bonus(record.growth_bonus.clone())
                .max_stats(record.max_stats.clone())
                .promotion(record.promotion.clone())
                .turns_into(turns_into)
                .learned_skills(learned_skills(
                    &self.skills,
                    RecordKind::Class,
                    &record.nid,
                    &record.learned_skills,
                )?)
                .maybe_map_sprite_nid(record.map_sprite_nid.clone())
                .maybe_icon_nid(record.icon_nid.clone())
                .build();
            classes.push(class);
        }
        debug!(classes = classes.len(), "resolved classes");
        Ok(classes)
    }

    pub fn resolve_units(&self) -> IResult<Vec<Unit>> {
        let mut units = Vec::with_capacity(self.units.len());
        for entry in self.units.entries() {
            let record = &entry.record;
            let class = record
                .class
                .as_deref()
                .map(|class| {
                    self.classes
                        .resolve(RecordKind::Unit, &record.nid, class)
                        .map(ClassRef::new)
                })
                .transpose()?;
            let starting_items = record
                .starting_items
                .iter()
                .map(|item| {
                    self.items
                        .resolve(RecordKind::Unit, &record.nid, item)
                        .map(ItemRef::new)
                })
                .collect::<IResult<Vec<_>>>()?;

            let unit = Unit::builder()
                .nid(UnitRef::new(record.nid.clone()))
                .name(strip_markup(&record.name).trim().to_string())
                .aliases(entry.aliases.clone())
                .desc(render_styled_text(&record.desc))
                .level(record.level)
                .maybe_class(class)
                .growths(record.growths.clone())
                .bases(record.bases.clone())
                .stat_cap_modifiers(record.stat_cap_modifiers.clone())
                .starting_items(starting_items)
                .learned_skills(learned_skills(
                    &self.skills,
                    RecordKind::Unit,
                    &record.nid,
                    &record.learned_skills,
                )?)
                .maybe_portrait_nid(record.portrait_nid.clone())
                .maybe_affinity(record.affinity.clone())
                .build();
            units.push(unit);
        }
        debug!(units = units.len(), "resolved units");
        Ok(units)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::resources::keys::*;
    use crate::resources::load_resources;
    use crate::resources::test::memory_source;

    fn context_for<'a>(
        files: &[(&str, &str)],
        config: &'a ExtractionConfig,
    ) -> IResult<ExtractionContext<'a>> {
        let resources = load_resources(&memory_source(files))?;
        ExtractionContext::new(resources, config)
    }

    const SKILLS: &str = r#"[
        {"nid": "Sol", "name": "Sol", "desc": "Heal.", "components": [["combat_art", null]]},
        {"nid": "Sol_Weapon", "name": "Sol", "desc": "Heal on hit.", "components": []},
        {"nid": "Sol_Long", "name": "Sol", "desc": "Heal half of damage dealt.", "components": []},
        {"nid": "Aura_Def", "name": "Guard Aura", "desc": "", "components": [["aura", null]]},
        {"nid": "Canto", "name": "Canto", "desc": "Move again.", "components": []}
    ]"#;

    #[test]
    fn skill_kind_and_category() {
        let config = ExtractionConfig::default();
        let ctx = context_for(
            &[
                (SKILLS_FILE, SKILLS),
                (SKILL_CATEGORIES_FILE, r#"{"Canto": "MyUnit/T1", "Sol": "Personal"}"#),
            ],
            &config,
        )
        .unwrap();
        let skills = ctx.resolve_skills();
        let find = |nid: &str| skills.iter().find(|s| s.nid.as_str() == nid).unwrap();

        assert_eq!(find("Sol").kind, SkillKind::Active);
        assert_eq!(find("Aura_Def").kind, SkillKind::Support);
        assert_eq!(find("Canto").kind, SkillKind::Passive);
        assert_eq!(find("Canto").category_name, "Feats (Tier 1)");
        assert_eq!(find("Aura_Def").category, MISC_SKILL_CATEGORY);
    }

    #[test]
    fn item_skills_skip_excluded_and_keep_longest_description() {
        let config = ExtractionConfig::default();
        let ctx = context_for(
            &[
                (SKILLS_FILE, SKILLS),
                (
                    ITEMS_FILE,
                    r#"[{"nid": "Sol_Katti", "name": "Sol Katti", "components": [
                        ["weapon_type", "Sword"],
                        ["prf_unit", ["Lyn"]],
                        ["multi_status_on_equip", ["Sol", "Sol_Long", "Sol_Weapon", "Canto"]]
                    ]}]"#,
                ),
            ],
            &config,
        )
        .unwrap();
        let items = ctx.resolve_items().unwrap();
        let item = &items[0];
        assert_eq!(item.skills, vec![SkillRef::new("Sol_Long"), SkillRef::new("Canto")]);
        assert_eq!(item.rank, Some(WeaponRank::Prf.into()));
        assert_eq!(item.rank_order, 0);
        assert!(!item.consumable);
    }

    #[test]
    fn longest_description_is_measured_after_rendering() {
        let config = ExtractionConfig::default();
        let ctx = context_for(
            &[
                (
                    SKILLS_FILE,
                    r#"[
                        {"nid": "Vantage", "name": "Vantage", "desc": "{e:unit.get_stat('SKL') * 2}Strike first.", "components": []},
                        {"nid": "Vantage_Low", "name": "Vantage", "desc": "Strikes first at low HP.", "components": []}
                    ]"#,
                ),
                (
                    ITEMS_FILE,
                    r#"[{"nid": "Wo_Dao", "name": "Wo Dao", "components": [
                        ["multi_status_on_equip", ["Vantage", "Vantage_Low"]]
                    ]}]"#,
                ),
            ],
            &config,
        )
        .unwrap();
        let items = ctx.resolve_items().unwrap();
        assert_eq!(items[0].skills, vec![SkillRef::new("Vantage_Low")]);
    }

    #[test]
    fn dangling_sub_item_is_a_resolution_error() {
        let config = ExtractionConfig::default();
        let ctx = context_for(
            &[(
                ITEMS_FILE,
                r#"[{"nid": "Twin_Blades", "components": [["multi_item", ["Blade_A"]]]}]"#,
            )],
            &config,
        )
        .unwrap();
        match ctx.resolve_items() {
            Err(ErrorKind::Resolution {
                from_kind,
                target_kind,
                target_nid,
                ..
            }) => {
                assert_eq!(from_kind, RecordKind::Item);
                assert_eq!(target_kind, RecordKind::Item);
                assert_eq!(target_nid, "Blade_A");
            }
            other => panic!("expected resolution error, got {other:?}"),
        }
    }

    #[test]
    fn units_and_classes_resolve_through_aliases() {
        let config = ExtractionConfig::default();
        let ctx = context_for(
            &[
                (SKILLS_FILE, SKILLS),
                (
                    CLASSES_FILE,
                    r#"[
                        {"nid": "T3_Male_Holy_Knight_Ewan", "name": "Holy Knight", "tier": 3,
                         "learned_skills": [[1, "canto"]]},
                        {"nid": "T1_Journeyman", "name": "Journeyman", "tier": 1,
                         "turns_into": ["t3 male holy knight ewan"]}
                    ]"#,
                ),
                (
                    ITEMS_FILE,
                    r#"[{"nid": "Vulnerary", "name": "Vulnerary", "components": [["usable", null], ["uses", 3]]}]"#,
                ),
                (
                    UNITS_FILE,
                    r#"[{"nid": "Ewan", "name": "Ewan", "klass": "T1_Journeyman", "starting_items": [["vulnerary", false]]}]"#,
                ),
            ],
            &config,
        )
        .unwrap();

        let classes = ctx.resolve_classes().unwrap();
        assert_eq!(classes[0].display_name, "Holy Knight (Male Ewan)");
        assert_eq!(classes[1].turns_into, vec![ClassRef::new("T3_Male_Holy_Knight_Ewan")]);
        assert_eq!(classes[0].learned_skills[0].skill, SkillRef::new("Canto"));

        let units = ctx.resolve_units().unwrap();
        assert_eq!(units[0].class, Some(ClassRef::new("T1_Journeyman")));
        assert_eq!(units[0].starting_items, vec![ItemRef::new("Vulnerary")]);

        let items = ctx.resolve_items().unwrap();
        assert!(items[0].consumable);
    }
}
