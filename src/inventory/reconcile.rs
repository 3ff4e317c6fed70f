use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{NewLot, StockLot};

/// Storage primitives the reconciliation engine needs. Implementations are
/// expected to run all calls of one `reconcile` inside a single transaction.
pub trait LotRepository {
    fn find_lot_by_jan(&self, jan: &str) -> Result<Option<StockLot>>;
    fn insert_lot(&self, lot: &NewLot) -> Result<i64>;
    fn delete_lot_by_jan(&self, jan: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Inserted,
    Replaced,
    Skipped,
}

impl Outcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Outcome::Inserted => "inserted",
            Outcome::Replaced => "replaced",
            Outcome::Skipped => "skipped",
        }
    }

    /// True when the candidate ended up in the store.
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(self, Outcome::Inserted | Outcome::Replaced)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applies the cheapest-lot-wins rule for one candidate.
///
/// Lots without a JAN code are always inserted. Otherwise the candidate
/// replaces the stored lot only when its price is strictly lower; an equal
/// price keeps the existing lot. A replacement carries the candidate's
/// quantity as-is, nothing is merged from the old lot.
pub fn reconcile<R: LotRepository + ?Sized>(repo: &R, candidate: &NewLot) -> Result<Outcome> {
    let Some(jan) = candidate.jan.as_deref() else {
        repo.insert_lot(candidate)?;
        return Ok(Outcome::Inserted);
    };

    match repo.find_lot_by_jan(jan)? {
        None => {
            repo.insert_lot(candidate)?;
            Ok(Outcome::Inserted)
        }
        Some(existing) if candidate.price < existing.price => {
            repo.delete_lot_by_jan(jan)?;
            repo.insert_lot(candidate)?;
            Ok(Outcome::Replaced)
        }
        Some(_) => Ok(Outcome::Skipped),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;

    use super::*;

    /// Vec-backed repository for exercising the engine without SQLite.
    #[derive(Default)]
    pub(crate) struct MemoryLots {
        pub lots: RefCell<Vec<StockLot>>,
        next_id: RefCell<i64>,
    }

    impl MemoryLots {
        pub(crate) fn lots_for(&self, jan: &str) -> Vec<StockLot> {
            self.lots
                .borrow()
                .iter()
                .filter(|l| l.jan.as_deref() == Some(jan))
                .cloned()
                .collect()
        }
    }

    impl LotRepository for MemoryLots {
        fn find_lot_by_jan(&self, jan: &str) -> Result<Option<StockLot>> {
            Ok(self.lots_for(jan).into_iter().next())
        }

        fn insert_lot(&self, lot: &NewLot) -> Result<i64> {
            let mut next = self.next_id.borrow_mut();
            *next += 1;
            self.lots.borrow_mut().push(lot.clone().into_lot(*next));
            Ok(*next)
        }

        fn delete_lot_by_jan(&self, jan: &str) -> Result<()> {
            self.lots
                .borrow_mut()
                .retain(|l| l.jan.as_deref() != Some(jan));
            Ok(())
        }
    }

    pub(crate) fn candidate(jan: Option<&str>, qty: i64, price: i64) -> NewLot {
        NewLot {
            jan: jan.map(str::to_string),
            item: "Widget".to_string(),
            qty,
            price,
            company_id: 1,
            image: None,
        }
    }

    #[test]
    fn test_first_submission_inserts() {
        let repo = MemoryLots::default();
        let outcome = reconcile(&repo, &candidate(Some("111"), 5, 100)).unwrap();

        assert_eq!(outcome, Outcome::Inserted);
        let lots = repo.lots_for("111");
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].price, 100);
    }

    #[test]
    fn test_cheaper_submission_replaces_and_takes_its_quantity() {
        let repo = MemoryLots::default();
        reconcile(&repo, &candidate(Some("111"), 5, 100)).unwrap();

        let outcome = reconcile(&repo, &candidate(Some("111"), 2, 80)).unwrap();

        assert_eq!(outcome, Outcome::Replaced);
        let lots = repo.lots_for("111");
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].price, 80);
        assert_eq!(lots[0].qty, 2);
    }

    #[test]
    fn test_more_expensive_submission_is_skipped() {
        let repo = MemoryLots::default();
        reconcile(&repo, &candidate(Some("111"), 5, 100)).unwrap();
        reconcile(&repo, &candidate(Some("111"), 5, 80)).unwrap();

        let outcome = reconcile(&repo, &candidate(Some("111"), 9, 90)).unwrap();

        assert_eq!(outcome, Outcome::Skipped);
        let lots = repo.lots_for("111");
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].price, 80);
        assert_eq!(lots[0].qty, 5);
    }

    #[test]
    fn test_equal_price_never_replaces() {
        let repo = MemoryLots::default();
        reconcile(&repo, &candidate(Some("111"), 5, 100)).unwrap();
        let original_id = repo.lots_for("111")[0].id;

        let outcome = reconcile(&repo, &candidate(Some("111"), 50, 100)).unwrap();

        assert_eq!(outcome, Outcome::Skipped);
        let lots = repo.lots_for("111");
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].id, original_id);
        assert_eq!(lots[0].qty, 5);
    }

    #[test]
    fn test_lots_without_jan_are_independent() {
        let repo = MemoryLots::default();
        for price in [30, 20, 40] {
            let outcome = reconcile(&repo, &candidate(None, 1, price)).unwrap();
            assert_eq!(outcome, Outcome::Inserted);
        }
        assert_eq!(repo.lots.borrow().len(), 3);
    }

    #[test]
    fn test_stored_price_tracks_running_minimum() {
        let repo = MemoryLots::default();
        let prices = [120, 95, 95, 130, 60, 61, 60, 10, 500];
        let mut min = i64::MAX;

        for price in prices {
            reconcile(&repo, &candidate(Some("4901234567890"), 1, price)).unwrap();
            min = min.min(price);

            let lots = repo.lots_for("4901234567890");
            assert_eq!(lots.len(), 1, "at most one lot per JAN after each call");
            assert_eq!(lots[0].price, min);
        }
    }
}
