//! Personal arsenals: special items that stand for a unit's set of weapons.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::ArsenalConfig;
use crate::error::IResult;
use crate::guide::index::normalize_identifier;
use crate::guide::naming::{icon_class, render_styled_text, strip_markup};
use crate::guide::resolve::ExtractionContext;
use crate::guide::types::{Arsenal, ArsenalRef, Item, ItemRef, RecordKind, UnitRef, listing_key};

/// Category path prefix under which `items.category.json` files personal weapons.
const PERSONAL_WEAPONS: &str = "Personal Weapons";

fn is_excluded_owner(config: &ArsenalConfig, owner: &str) -> bool {
    config.excluded_owners.iter().any(|excluded| {
        owner == excluded || (excluded.starts_with('_') && owner.ends_with(excluded.as_str()))
    })
}

/// Arsenal records found among the items, plus configured extras whose
/// owner exists.
fn arsenal_shells(ctx: &ExtractionContext<'_>) -> IResult<Vec<Arsenal>> {
    let config = &ctx.config().arsenals;
    let mut arsenals = Vec::new();

    for item in ctx.item_index().records() {
        if config.exclude.contains(&item.nid)
            || !config.marks.iter().any(|mark| item.nid.ends_with(mark.as_str()))
        {
            continue;
        }
        let Some(owner) = item.prf_units.first() else {
            continue;
        };
        if is_excluded_owner(config, owner) {
            continue;
        }
        let owner = ctx
            .unit_index()
            .resolve(RecordKind::Arsenal, &item.nid, owner)?;
        arsenals.push(
            Arsenal::builder()
                .nid(ArsenalRef::new(item.nid.clone()))
                .name(strip_markup(&item.name).trim().to_string())
                .desc(render_styled_text(&item.desc))
                .icon_class(icon_class(&item.nid, item.icon_nid.as_deref(), "item"))
                .owner(UnitRef::new(owner))
                .build(),
        );
    }

    for extra in &config.extra {
        if arsenals.iter().any(|a| a.nid.as_str() == extra.nid) {
            continue;
        }
        let Some(owner) = ctx.unit_index().get(&extra.owner) else {
            warn!(arsenal = %extra.nid, owner = %extra.owner, "configured arsenal owner does not exist, skipping");
            continue;
        };
        let owner = owner.record.nid.as_str();
        arsenals.push(
            Arsenal::builder()
                .nid(ArsenalRef::new(extra.nid.clone()))
                .name(extra.name.clone())
                .desc(render_styled_text(&extra.desc))
                .icon_class(extra.icon_class.clone())
                .owner(UnitRef::new(owner))
                .build(),
        );
    }

    Ok(arsenals)
}

/// Index of the arsenal an owner's personal weapon belongs in, if any.
fn route(
    config: &ArsenalConfig,
    arsenals: &[Arsenal],
    owned: &[usize],
    owner: &str,
    item_nid: &str,
) -> Option<usize> {
    match owned {
        [] => None,
        [only] => Some(*only),
        _ => {
            let routes: Vec<_> = config
                .routes
                .iter()
                .filter(|route| normalize_identifier(&route.owner) == normalize_identifier(owner))
                .collect();
            let target = routes
                .iter()
                .find(|route| !route.fallback && route.matches(item_nid))
                .or_else(|| routes.iter().find(|route| route.fallback))?;
            owned
                .iter()
                .copied()
                .find(|&idx| arsenals[idx].nid.as_str() == target.arsenal)
        }
    }
}

/// Builds every arsenal and fills in its items, sorted by weapon rank
/// (unranked last) then name. `items` are the resolved items, used for
/// sort keys.
pub fn build_arsenals(ctx: &ExtractionContext<'_>, items: &[Item]) -> IResult<Vec<Arsenal>> {
    let config = &ctx.config().arsenals;
    let mut arsenals = arsenal_shells(ctx)?;

    let mut by_nid: HashMap<&str, usize> = HashMap::new();
    let mut by_owner: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, arsenal) in arsenals.iter().enumerate() {
        by_nid.insert(arsenal.nid.as_str(), idx);
        by_owner.entry(arsenal.owner.as_str()).or_default().push(idx);
    }

    let mut members: Vec<Vec<ItemRef>> = vec![Vec::new(); arsenals.len()];
    for (item_nid, category) in ctx.item_categories() {
        let Some(entry) = ctx.item_index().get(item_nid) else {
            debug!(item = %item_nid, "categorized item does not exist");
            continue;
        };
        let item = &entry.record;
        if by_nid.contains_key(item.nid.as_str()) {
            continue;
        }

        let special = config
            .special_items
            .get(&item.nid)
            .and_then(|arsenal| by_nid.get(arsenal.as_str()));
        if let Some(&idx) = special {
            members[idx].push(ItemRef::new(item.nid.clone()));
            continue;
        }

        let mut path = category.split('/');
        if path.next() != Some(PERSONAL_WEAPONS) {
            continue;
        }
        let Some(owner) = path.next() else {
            continue;
        };
        if config
            .item_end_exclude
            .iter()
            .any(|end| item.nid.ends_with(end.as_str()))
            || item.desc.trim().is_empty()
        {
            continue;
        }
        if config
            .skip
            .iter()
            .any(|skip| skip.owner == owner && item.nid.ends_with(skip.suffix.as_str()))
        {
            continue;
        }

        let owner = config
            .owner_aliases
            .get(owner)
            .map(String::as_str)
            .unwrap_or(owner);
        if is_excluded_owner(config, owner) {
            continue;
        }
        let Some(owner) = ctx.unit_index().get(owner).map(|unit| unit.record.nid.as_str()) else {
            debug!(item = %item.nid, owner, "personal weapon of an unknown unit");
            continue;
        };
        let owned = by_owner.get(owner).map(Vec::as_slice).unwrap_or_default();
        if let Some(idx) = route(config, &arsenals, owned, owner, &item.nid) {
            members[idx].push(ItemRef::new(item.nid.clone()));
        }
    }

    let sort_keys: HashMap<&str, (bool, i32, (String, String))> = items
        .iter()
        .map(|item| {
            (
                item.nid.as_str(),
                (
                    item.rank.is_none(),
                    item.rank_order,
                    listing_key(&item.name, item.nid.as_str()),
                ),
            )
        })
        .collect();

    for (arsenal, mut items) in arsenals.iter_mut().zip(members) {
        items.sort_by_cached_key(|item| sort_keys.get(item.as_str()).cloned());
        items.dedup();
        debug!(arsenal = %arsenal.nid, items = items.len(), "filled arsenal");
        arsenal.items = items;
    }

    arsenals.sort_by_cached_key(|arsenal| listing_key(&arsenal.name, arsenal.nid.as_str()));
    Ok(arsenals)
}
