use std::collections::{HashMap, HashSet};
use std::fmt;

use encoding_rs::{SHIFT_JIS, UTF_8};
use serde::Serialize;

use super::{Outcome, check_amount, check_jan};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Company, NewLot};

/// Text encodings a batch may arrive in, in the order they are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchEncoding {
    Utf8,
    ShiftJis,
}

impl BatchEncoding {
    pub const ATTEMPT_ORDER: [BatchEncoding; 2] = [BatchEncoding::Utf8, BatchEncoding::ShiftJis];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            BatchEncoding::Utf8 => "UTF-8",
            BatchEncoding::ShiftJis => "Shift_JIS",
        }
    }

    /// Strict decode: any malformed sequence fails instead of being replaced.
    fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            BatchEncoding::Utf8 => {
                let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                UTF_8
                    .decode_without_bom_handling_and_without_replacement(bytes)
                    .map(|s| s.into_owned())
            }
            BatchEncoding::ShiftJis => SHIFT_JIS
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|s| s.into_owned()),
        }
    }
}

impl fmt::Display for BatchEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One data row of a batch, before validation. Empty cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line in the source, header included.
    pub line: usize,
    pub jan: Option<String>,
    pub item: Option<String>,
    pub qty: Option<String>,
    pub price: Option<String>,
    pub supplier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRow {
    pub line: usize,
    pub jan: String,
    pub item: String,
    pub qty: i64,
    pub price: i64,
    pub supplier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jan: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub inserted_or_replaced: usize,
    pub skipped: usize,
    pub rejected: usize,
    /// Rows dropped because a cheaper row with the same JAN was in the batch.
    pub superseded: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejections: Vec<RowRejection>,
}

impl ImportReport {
    fn reject(&mut self, line: usize, jan: Option<String>, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!("Rejected import line {line}: {reason}");
        self.rejected += 1;
        self.rejections.push(RowRejection { line, jan, reason });
    }
}

#[derive(Clone, Copy)]
enum Column {
    Jan,
    Item,
    Qty,
    Price,
    Supplier,
}

impl Column {
    const ALL: [Column; 5] = [
        Column::Jan,
        Column::Item,
        Column::Qty,
        Column::Price,
        Column::Supplier,
    ];

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::Jan => &["jan", "jan code", "jan_code", "janコード"],
            Column::Item => &["商品名", "item", "name", "item name", "item_name"],
            Column::Qty => &["数量", "qty", "quantity"],
            Column::Price => &["単価", "price", "unit price", "unit_price"],
            Column::Supplier => &[
                "取引先名",
                "supplier",
                "company",
                "supplier name",
                "supplier_name",
            ],
        }
    }

    fn canonical(self) -> &'static str {
        match self {
            Column::Jan => "JAN",
            Column::Item => "商品名",
            Column::Qty => "数量",
            Column::Price => "単価",
            Column::Supplier => "取引先名",
        }
    }
}

fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Parses CSV text into raw rows. Fails when a required column is missing
/// from the header or the text is not CSV at all.
pub fn parse_batch(text: &str) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();

    let mut index = [0usize; 5];
    let mut missing = Vec::new();
    for (slot, column) in index.iter_mut().zip(Column::ALL) {
        match headers
            .iter()
            .position(|h| column.aliases().contains(&h.as_str()))
        {
            Some(i) => *slot = i,
            None => missing.push(column.canonical()),
        }
    }
    if !missing.is_empty() {
        return Err(Error::Validation(format!(
            "missing column(s): {}",
            missing.join(", ")
        )));
    }

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let cell = |column: Column| {
            record
                .get(index[column as usize])
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        rows.push(RawRow {
            line: record.position().map_or(i + 2, |p| p.line() as usize),
            jan: cell(Column::Jan),
            item: cell(Column::Item),
            qty: cell(Column::Qty),
            price: cell(Column::Price),
            supplier: cell(Column::Supplier),
        });
    }
    Ok(rows)
}

/// Decodes and parses an uploaded batch, trying each encoding in
/// [`BatchEncoding::ATTEMPT_ORDER`]. Errors only when every attempt fails:
/// with the parse error of the first encoding that decoded cleanly, or with
/// [`Error::Encoding`] when none did. A file with no content at all is an
/// empty batch.
pub fn decode_batch(bytes: &[u8]) -> Result<(Vec<RawRow>, BatchEncoding)> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok((Vec::new(), BatchEncoding::Utf8));
    }
    let mut parse_error = None;
    for encoding in BatchEncoding::ATTEMPT_ORDER {
        let Some(text) = encoding.decode(bytes) else {
            tracing::debug!("Batch is not valid {encoding}");
            continue;
        };
        match parse_batch(&text) {
            Ok(rows) => return Ok((rows, encoding)),
            Err(e) => {
                tracing::debug!("Batch decoded as {encoding} but did not parse: {e}");
                parse_error.get_or_insert(e);
            }
        }
    }
    Err(parse_error.unwrap_or(Error::Encoding {
        primary: BatchEncoding::ATTEMPT_ORDER[0].label(),
        fallback: BatchEncoding::ATTEMPT_ORDER[1].label(),
    }))
}

/// Parses a quantity or price cell. Accepts whole numbers, also when written
/// with a zero fraction ("5.0") as spreadsheet exports often do.
fn parse_amount(field: &str, value: Option<&str>) -> std::result::Result<i64, String> {
    let value = value.ok_or_else(|| format!("{field} is missing"))?;
    let whole = match value.split_once('.') {
        Some((whole, fraction)) if fraction.chars().all(|c| c == '0') => whole,
        _ => value,
    };
    let amount: i64 = whole
        .parse()
        .map_err(|_| format!("{field} '{value}' is not a whole number"))?;
    check_amount(amount, field)
}

impl RawRow {
    pub fn validate(&self) -> std::result::Result<ValidRow, String> {
        let jan = self.jan.clone().ok_or("JAN is missing")?;
        check_jan(&jan)?;
        let item = self.item.clone().ok_or("item name is missing")?;
        let supplier = self.supplier.clone().ok_or("supplier is missing")?;
        let qty = parse_amount("quantity", self.qty.as_deref())?;
        let price = parse_amount("price", self.price.as_deref())?;
        Ok(ValidRow {
            line: self.line,
            jan,
            item,
            qty,
            price,
            supplier,
        })
    }
}

/// Keeps the cheapest row per JAN code. Among rows sharing the minimum price
/// the one appearing first in the batch wins. Returns the survivors in source
/// order and the number of rows dropped.
pub fn reduce_batch(mut rows: Vec<ValidRow>) -> (Vec<ValidRow>, usize) {
    let total = rows.len();
    rows.sort_by_key(|r| (r.price, r.line));

    let mut seen = HashSet::new();
    let mut survivors: Vec<ValidRow> = rows
        .into_iter()
        .filter(|r| seen.insert(r.jan.clone()))
        .collect();
    survivors.sort_by_key(|r| r.line);

    let dropped = total - survivors.len();
    (survivors, dropped)
}

/// Runs a parsed batch through validation, intra-batch reduction, supplier
/// resolution and reconciliation.
///
/// Bad rows and unknown suppliers are counted and skipped. Stock writes and
/// their log entries commit together; a store error leaves both untouched.
pub fn import_batch(store: &dyn Store, rows: Vec<RawRow>, user: &str) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    let mut valid = Vec::with_capacity(rows.len());
    for raw in rows {
        match raw.validate() {
            Ok(row) => valid.push(row),
            Err(reason) => report.reject(raw.line, raw.jan.clone(), reason),
        }
    }

    let (survivors, superseded) = reduce_batch(valid);
    report.superseded = superseded;

    let mut companies: HashMap<String, Option<Company>> = HashMap::new();
    let mut resolved = Vec::with_capacity(survivors.len());
    for row in survivors {
        let company = match companies.get(&row.supplier) {
            Some(cached) => cached.clone(),
            None => {
                let found = store.find_company_by_name(&row.supplier)?;
                companies.insert(row.supplier.clone(), found.clone());
                found
            }
        };
        match company {
            Some(company) => resolved.push((row, company.id)),
            None => {
                let reason = Error::UnresolvedSupplier(row.supplier.clone()).to_string();
                report.reject(row.line, Some(row.jan), reason);
            }
        }
    }

    let lots: Vec<NewLot> = resolved
        .iter()
        .map(|(row, company_id)| NewLot {
            jan: Some(row.jan.clone()),
            item: row.item.clone(),
            qty: row.qty,
            price: row.price,
            company_id: *company_id,
            image: None,
        })
        .collect();
    let notes: Vec<String> = report
        .rejections
        .iter()
        .map(|r| format!("Import rejected line {}: {}", r.line, r.reason))
        .collect();
    let outcomes = store.reconcile_lots_logged(
        &lots,
        user,
        &|i, outcome| describe_import(&resolved[i].0, outcome),
        &notes,
    )?;

    for outcome in &outcomes {
        if outcome.is_write() {
            report.inserted_or_replaced += 1;
        } else {
            report.skipped += 1;
        }
    }

    tracing::info!(
        "Imported batch: {} inserted or replaced, {} skipped, {} rejected, {} superseded",
        report.inserted_or_replaced,
        report.skipped,
        report.rejected,
        report.superseded
    );

    Ok(report)
}

fn describe_import(row: &ValidRow, outcome: Outcome) -> String {
    match outcome {
        Outcome::Inserted => format!("Import inserted JAN {} ({}) at {}", row.jan, row.item, row.price),
        Outcome::Replaced => format!(
            "Import replaced JAN {} ({}) with cheaper price {}",
            row.jan, row.item, row.price
        ),
        Outcome::Skipped => format!(
            "Import skipped JAN {} ({}) at {}: stored price is not higher",
            row.jan, row.item, row.price
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(line: usize, jan: &str, price: i64) -> ValidRow {
        ValidRow {
            line,
            jan: jan.to_string(),
            item: format!("item-{line}"),
            qty: 1,
            price,
            supplier: "Acme".to_string(),
        }
    }

    #[test]
    fn test_parse_batch_japanese_headers() {
        let text = "JAN,商品名,数量,単価,取引先名\n4901,ボールペン,10,120,Acme\n";
        let rows = parse_batch(text).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].jan.as_deref(), Some("4901"));
        assert_eq!(rows[0].item.as_deref(), Some("ボールペン"));
        assert_eq!(rows[0].price.as_deref(), Some("120"));
        assert_eq!(rows[0].supplier.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_parse_batch_english_headers_in_any_order() {
        let text = "Supplier, Price ,Qty,Item,JAN\nAcme,50,3,Stapler,222\n";
        let rows = parse_batch(text).unwrap();

        assert_eq!(rows[0].jan.as_deref(), Some("222"));
        assert_eq!(rows[0].item.as_deref(), Some("Stapler"));
        assert_eq!(rows[0].qty.as_deref(), Some("3"));
        assert_eq!(rows[0].price.as_deref(), Some("50"));
    }

    #[test]
    fn test_parse_batch_missing_column() {
        let err = parse_batch("JAN,item,qty\n1,a,2\n").unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("単価")));
    }

    #[test]
    fn test_parse_batch_empty_cells_become_none() {
        let rows = parse_batch("jan,item,qty,price,supplier\n333,,1,,Acme\n").unwrap();
        assert_eq!(rows[0].item, None);
        assert_eq!(rows[0].price, None);
    }

    #[test]
    fn test_decode_batch_prefers_utf8() {
        let bytes = "\u{feff}JAN,商品名,数量,単価,取引先名\n1,鉛筆,1,10,Acme\n".as_bytes();
        let (rows, encoding) = decode_batch(bytes).unwrap();

        assert_eq!(encoding, BatchEncoding::Utf8);
        assert_eq!(rows[0].item.as_deref(), Some("鉛筆"));
    }

    #[test]
    fn test_decode_batch_falls_back_to_shift_jis() {
        let text = "JAN,商品名,数量,単価,取引先名\n1,鉛筆,1,10,株式会社テスト\n";
        let (bytes, _, had_errors) = SHIFT_JIS.encode(text);
        assert!(!had_errors);

        let (rows, encoding) = decode_batch(&bytes).unwrap();

        assert_eq!(encoding, BatchEncoding::ShiftJis);
        assert_eq!(rows[0].item.as_deref(), Some("鉛筆"));
        assert_eq!(rows[0].supplier.as_deref(), Some("株式会社テスト"));
    }

    #[test]
    fn test_decode_batch_fails_when_no_encoding_parses() {
        let err = decode_batch(&[0xff, 0xfe, 0x00, 0x81]).unwrap_err();
        assert!(matches!(err, Error::Encoding { .. }));
    }

    #[test]
    fn test_decode_batch_reports_missing_column() {
        let err = decode_batch(b"JAN,item,qty,supplier\n1,a,2,Acme\n").unwrap_err();
        assert!(matches!(&err, Error::Validation(msg) if msg.contains("単価")), "{err}");
    }

    #[test]
    fn test_decode_batch_blank_file_is_empty_batch() {
        let (rows, _) = decode_batch(b"").unwrap();
        assert!(rows.is_empty());
        let (rows, _) = decode_batch(b" \r\n").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_numbers() {
        let mut raw = RawRow {
            line: 2,
            jan: Some("1".into()),
            item: Some("a".into()),
            qty: Some("three".into()),
            price: Some("10".into()),
            supplier: Some("Acme".into()),
        };
        assert!(raw.validate().unwrap_err().contains("quantity"));

        raw.qty = Some("3".into());
        raw.price = Some("-1".into());
        assert!(raw.validate().unwrap_err().contains("negative"));

        raw.price = Some("12.0".into());
        assert_eq!(raw.validate().unwrap().price, 12);

        raw.price = Some("12.5".into());
        assert!(raw.validate().is_err());

        raw.price = Some("10".into());
        raw.qty = Some("4611686018427387903".into());
        assert!(raw.validate().unwrap_err().contains("exceed"));
    }

    #[test]
    fn test_validate_applies_jan_rule() {
        let mut raw = RawRow {
            line: 3,
            jan: Some("49-01".into()),
            item: Some("a".into()),
            qty: Some("1".into()),
            price: Some("1".into()),
            supplier: Some("Acme".into()),
        };
        assert!(raw.validate().unwrap_err().contains("letters and digits"));

        raw.jan = Some("4901".into());
        assert_eq!(raw.validate().unwrap().jan, "4901");
    }

    #[test]
    fn test_validate_requires_jan_item_and_supplier() {
        let raw = RawRow {
            line: 4,
            qty: Some("1".into()),
            price: Some("1".into()),
            ..RawRow::default()
        };
        assert_eq!(raw.validate().unwrap_err(), "JAN is missing");
    }

    #[test]
    fn test_reduce_batch_keeps_cheapest_per_jan() {
        let rows = vec![valid(2, "222", 50), valid(3, "222", 40), valid(4, "333", 30)];
        let (survivors, dropped) = reduce_batch(rows);

        assert_eq!(dropped, 1);
        assert_eq!(survivors.len(), 2);
        assert_eq!(survivors[0].line, 3);
        assert_eq!(survivors[0].price, 40);
        assert_eq!(survivors[1].jan, "333");
    }

    #[test]
    fn test_reduce_batch_tie_goes_to_first_row() {
        let rows = vec![valid(2, "9", 70), valid(3, "9", 40), valid(4, "9", 40)];
        let (survivors, dropped) = reduce_batch(rows);

        assert_eq!(dropped, 2);
        assert_eq!(survivors[0].line, 3);
    }

    #[test]
    fn test_reduce_batch_empty() {
        let (survivors, dropped) = reduce_batch(Vec::new());
        assert!(survivors.is_empty());
        assert_eq!(dropped, 0);
    }
}
