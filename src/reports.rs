//! Read-only aggregations over the stock listing: the dashboard figures and
//! the product catalog.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::types::{StockView, UNKNOWN_COMPANY};

const TOP_ITEMS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyShare {
    pub company_name: String,
    pub item_count: usize,
    pub total_value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopItem {
    pub id: i64,
    pub item: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jan: Option<String>,
    pub company_name: String,
    pub total_value: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub total_value: i64,
    pub lot_count: usize,
    pub total_qty: i64,
    /// Ordered by value, largest first.
    pub by_company: Vec<CompanyShare>,
    pub top_items: Vec<TopItem>,
    /// Known company holding the most lots, i.e. winning the most cheapest
    /// prices. Ties go to the alphabetically first name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cheapest_share_leader: Option<String>,
}

fn saturating_sum(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}

pub fn dashboard(lots: &[StockView]) -> Dashboard {
    let mut shares: HashMap<&str, CompanyShare> = HashMap::new();
    for lot in lots {
        let label = lot.company_label();
        let share = shares.entry(label).or_insert_with(|| CompanyShare {
            company_name: label.to_string(),
            item_count: 0,
            total_value: 0,
        });
        share.item_count += 1;
        share.total_value = share.total_value.saturating_add(lot.total_value());
    }

    let mut by_company: Vec<CompanyShare> = shares.into_values().collect();
    by_company.sort_by(|a, b| {
        b.total_value
            .cmp(&a.total_value)
            .then_with(|| a.company_name.cmp(&b.company_name))
    });

    let cheapest_share_leader = lots
        .iter()
        .filter_map(|l| l.company_name.as_deref())
        .fold(BTreeMap::<&str, usize>::new(), |mut counts, name| {
            *counts.entry(name).or_default() += 1;
            counts
        })
        .into_iter()
        // BTreeMap iterates by name, so max_by_key's last-wins becomes
        // first-name-wins once reversed.
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(name, _)| name.to_string());

    let mut ranked: Vec<&StockView> = lots.iter().collect();
    ranked.sort_by(|a, b| {
        b.total_value()
            .cmp(&a.total_value())
            .then_with(|| a.id.cmp(&b.id))
    });
    let top_items = ranked
        .into_iter()
        .take(TOP_ITEMS)
        .map(|l| TopItem {
            id: l.id,
            item: l.item.clone(),
            jan: l.jan.clone(),
            company_name: l.company_label().to_string(),
            total_value: l.total_value(),
        })
        .collect();

    Dashboard {
        total_value: saturating_sum(lots.iter().map(StockView::total_value)),
        lot_count: lots.len(),
        total_qty: saturating_sum(lots.iter().map(|l| l.qty)),
        by_company,
        top_items,
        cheapest_share_leader,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jan: Option<String>,
    pub item: String,
    pub min_price: i64,
    pub total_qty: i64,
    /// Lot whose image represents this entry, if any lot has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_lot_id: Option<i64>,
    pub in_stock: bool,
}

fn matches_query(lot: &StockView, needle: &str) -> bool {
    lot.item.to_lowercase().contains(needle)
        || lot
            .jan
            .as_deref()
            .is_some_and(|jan| jan.to_lowercase().contains(needle))
}

/// Groups lots by item name and JAN code. `query` filters case-insensitively
/// on either field; blank queries match everything.
pub fn catalog(lots: &[StockView], query: Option<&str>) -> Vec<CatalogEntry> {
    let needle = query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let mut groups: BTreeMap<(&str, Option<&str>), CatalogEntry> = BTreeMap::new();
    for lot in lots {
        if let Some(needle) = &needle {
            if !matches_query(lot, needle) {
                continue;
            }
        }

        let entry = groups
            .entry((lot.item.as_str(), lot.jan.as_deref()))
            .or_insert_with(|| CatalogEntry {
                jan: lot.jan.clone(),
                item: lot.item.clone(),
                min_price: lot.price,
                total_qty: 0,
                image_lot_id: None,
                in_stock: false,
            });
        entry.min_price = entry.min_price.min(lot.price);
        entry.total_qty = entry.total_qty.saturating_add(lot.qty);
        if entry.image_lot_id.is_none() && lot.has_image {
            entry.image_lot_id = Some(lot.id);
        }
    }

    groups
        .into_values()
        .map(|mut entry| {
            entry.in_stock = entry.total_qty > 0;
            entry
        })
        .collect()
}
