//! Snapshot diffing tests.

mod common;

use ceni_archive::compare::diff;
use ceni_archive::{Brand, PriceRecord};

fn rec(code: &str, price: &str) -> PriceRecord {
    common::record(code, &format!("Производ {}", code), price, "2025-04-20")
}

fn snap(day: &str, checksum: &str, records: Vec<PriceRecord>) -> ceni_archive::Snapshot {
    common::snapshot(
        common::market(Brand::Tinex, "4", "Тинекс Центар"),
        day,
        checksum,
        records,
    )
}

#[test]
fn diffing_a_snapshot_with_itself_is_empty() {
    let s = snap("2025-04-20", "abc", vec![rec("101", "39.00"), rec("102", "72.50")]);
    let result = diff(&s, &s);
    assert!(result.is_empty());
}

#[test]
fn added_removed_and_changed_are_split_by_product_code() {
    let from = snap(
        "2025-04-19",
        "aaa",
        vec![rec("101", "39.00"), rec("102", "72.50"), rec("103", "100.00")],
    );
    let to = snap(
        "2025-04-20",
        "bbb",
        vec![rec("101", "39.00"), rec("103", "110.00"), rec("104", "5.00")],
    );

    let result = diff(&from, &to);

    assert_eq!(result.added.len(), 1);
    assert_eq!(result.added[0].product_code, "104");
    assert_eq!(result.removed.len(), 1);
    assert_eq!(result.removed[0].product_code, "102");
    assert_eq!(result.changed.len(), 1);
    assert_eq!(result.changed[0].product_code, "103");
    assert_eq!(result.changed[0].old_price, common::dec("100.00"));
    assert_eq!(result.changed[0].new_price, common::dec("110.00"));
    assert_eq!(result.changed[0].delta_percent, common::dec("10.00"));
    assert_eq!(result.from_date, common::date("2025-04-19"));
    assert_eq!(result.to_date, common::date("2025-04-20"));
}

#[test]
fn diff_is_antisymmetric_on_add_remove() {
    let a = snap("2025-04-19", "aaa", vec![rec("101", "39.00"), rec("102", "72.50")]);
    let b = snap("2025-04-20", "bbb", vec![rec("102", "72.50"), rec("104", "5.00")]);

    let ab = diff(&a, &b);
    let ba = diff(&b, &a);
    assert_eq!(ab.added, ba.removed);
    assert_eq!(ab.removed, ba.added);
}

#[test]
fn delta_percent_rounds_half_to_even() {
    let from = snap("2025-04-19", "aaa", vec![rec("101", "800.00")]);
    let to = snap("2025-04-20", "bbb", vec![rec("101", "801.00")]);
    let result = diff(&from, &to);
    // (801 - 800) / 800 * 100 = 0.125 -> 0.12
    assert_eq!(result.changed[0].delta_percent, common::dec("0.12"));

    let from = snap("2025-04-19", "ccc", vec![rec("101", "800.00")]);
    let to = snap("2025-04-20", "ddd", vec![rec("101", "803.00")]);
    let result = diff(&from, &to);
    // 0.375 -> 0.38 (3/8 rounds up to the even neighbour)
    assert_eq!(result.changed[0].delta_percent, common::dec("0.38"));
}

#[test]
fn negative_deltas_are_reported() {
    let from = snap("2025-04-19", "aaa", vec![rec("101", "100.00")]);
    let to = snap("2025-04-20", "bbb", vec![rec("101", "75.00")]);
    let result = diff(&from, &to);
    assert_eq!(result.changed[0].delta_percent, common::dec("-25.00"));
}

#[test]
fn equal_checksums_short_circuit_to_the_empty_result() {
    // Record lists differ, but the raw payload hash says nothing changed:
    // the short-circuit wins without a per-record pass.
    let from = snap("2025-04-19", "same", vec![rec("101", "39.00")]);
    let to = snap("2025-04-20", "same", vec![rec("999", "1.00")]);
    let result = diff(&from, &to);
    assert!(result.is_empty());
    assert_eq!(result.from_date, common::date("2025-04-19"));
    assert_eq!(result.to_date, common::date("2025-04-20"));
}

#[test]
fn duplicate_codes_in_to_stay_visible_as_added() {
    // The same code at two shelf positions: the first matches, the second
    // surfaces as added so the audit trail keeps both.
    let from = snap("2025-04-19", "aaa", vec![rec("101", "39.00")]);
    let to = snap(
        "2025-04-20",
        "bbb",
        vec![rec("101", "39.00"), rec("101", "35.00")],
    );
    let result = diff(&from, &to);
    assert!(result.changed.is_empty());
    assert_eq!(result.added.len(), 1);
    assert_eq!(result.added[0].price, common::dec("35.00"));
}

#[test]
fn comparison_serializes_with_camel_case_keys() {
    let from = snap("2025-04-19", "aaa", vec![rec("101", "100.00")]);
    let to = snap("2025-04-20", "bbb", vec![rec("101", "110.00")]);
    let json = serde_json::to_value(diff(&from, &to)).unwrap();

    assert_eq!(json["fromDate"], "2025-04-19");
    assert_eq!(json["toDate"], "2025-04-20");
    assert_eq!(json["changed"][0]["productCode"], "101");
    assert!(json["changed"][0]["deltaPercent"].is_string() || json["changed"][0]["deltaPercent"].is_number());
}
