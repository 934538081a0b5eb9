//! Shops read from event scripts, merged across locations with identical stock.

use std::collections::BTreeMap;

use itertools::Itertools;
use tracing::debug;

use crate::error::IResult;
use crate::guide::naming::{pad_digits, shop_abbreviation, shop_name};
use crate::guide::resolve::ExtractionContext;
use crate::guide::types::{ItemRef, RecordKind, Shop, ShopKind, ShopRef};
use crate::recognized::Recognized;
use crate::resources::keys::SHOP_EVENT_SUFFIXES;

/// Width digit runs are padded to in shop ordering keys.
const ORDER_DIGITS: usize = 2;

/// Stock of one shop event, resolved to canonical item nids.
struct Sighting<'e> {
    location: &'e str,
    stock: Vec<ItemRef>,
}

fn is_shop_event(nid: &str, ignore_patterns: &[String]) -> bool {
    SHOP_EVENT_SUFFIXES.iter().any(|suffix| nid.ends_with(suffix))
        && !ignore_patterns.iter().any(|pattern| nid.contains(pattern.as_str()))
}

fn sightings<'e>(ctx: &'e ExtractionContext<'_>) -> IResult<Vec<Sighting<'e>>> {
    let ignore = &ctx.config().shops.ignore_patterns;
    let mut sightings = Vec::new();
    for event in ctx.events().iter().sorted_by(|a, b| a.nid.cmp(&b.nid)) {
        if !is_shop_event(&event.nid, ignore) {
            continue;
        }
        let Some(stock) = event.shop_stock() else {
            debug!(event = %event.nid, "shop event without a shop command");
            continue;
        };
        let stock = stock
            .iter()
            .map(|item| {
                ctx.item_index()
                    .resolve(RecordKind::Shop, &event.nid, item)
                    .map(ItemRef::new)
            })
            .collect::<IResult<Vec<_>>>()?;
        sightings.push(Sighting {
            location: &event.nid,
            stock: stock.into_iter().unique().collect(),
        });
    }
    Ok(sightings)
}

/// Stock identity used for merging: order does not matter.
fn stock_key(stock: &[ItemRef]) -> Vec<ItemRef> {
    stock.iter().cloned().sorted().collect()
}

pub fn merge_shops(ctx: &ExtractionContext<'_>) -> IResult<Vec<Shop>> {
    let config = &ctx.config().shops;

    let mut groups: BTreeMap<Vec<ItemRef>, Vec<Sighting<'_>>> = BTreeMap::new();
    for sighting in sightings(ctx)? {
        groups
            .entry(stock_key(&sighting.stock))
            .or_default()
            .push(sighting);
    }

    let mut shops: Vec<Shop> = Vec::with_capacity(groups.len());
    for group in groups.into_values() {
        let locations: Vec<String> = group
            .iter()
            .map(|sighting| sighting.location.to_string())
            .sorted_by_key(|nid| pad_digits(nid, ORDER_DIGITS))
            .collect();
        let nid = locations.join("_").replace(' ', "_");
        let kind = ShopKind::from_nid(&locations[0])
            .map(Recognized::Known)
            .unwrap_or_else(|| Recognized::Unknown(locations[0].clone()));
        let kind_name = kind.to_string();
        let abbr_name = config
            .abbreviations
            .get(&nid)
            .cloned()
            .unwrap_or_else(|| shop_abbreviation(&locations));

        debug!(shop = %nid, locations = locations.len(), "merged shop");
        shops.push(
            Shop::builder()
                .nid(ShopRef::new(nid.clone()))
                .name(shop_name(&locations, &kind_name))
                .abbr_name(abbr_name)
                .kind(kind)
                .order_name(pad_digits(&nid, ORDER_DIGITS))
                .locations(locations)
                .items(group[0].stock.clone())
                .build(),
        );
    }

    for extra in &config.extra {
        let stock: Vec<ItemRef> = ctx
            .item_index()
            .records()
            .filter(|item| item.nid.ends_with(extra.item_suffix.as_str()))
            .map(|item| ItemRef::new(item.nid.clone()))
            .collect();
        if stock.is_empty() {
            debug!(shop = %extra.nid, suffix = %extra.item_suffix, "no items for extra shop");
            continue;
        }

        let key = stock_key(&stock);
        if let Some(shop) = shops.iter_mut().find(|shop| stock_key(&shop.items) == key) {
            shop.locations.push(extra.nid.clone());
            continue;
        }

        shops.push(
            Shop::builder()
                .nid(ShopRef::new(extra.nid.clone()))
                .name(extra.name.clone())
                .abbr_name(
                    config
                        .abbreviations
                        .get(&extra.nid)
                        .cloned()
                        .unwrap_or_else(|| extra.abbr_name.clone()),
                )
                .kind(ShopKind::parse(&extra.kind))
                .order_name(extra.order_name.clone())
                .locations(vec![extra.nid.clone()])
                .items(stock)
                .build(),
        );
    }

    shops.sort_by(|a, b| {
        a.order_name
            .cmp(&b.order_name)
            .then_with(|| a.nid.cmp(&b.nid))
    });
    Ok(shops)
}
