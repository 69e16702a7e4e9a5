//! Catalog resolution and drift detection tests.

mod common;

use ceni_archive::catalog::{self, MarketCatalog};
use ceni_archive::{ArchiveError, Brand, MarketIdentity};
use common::MockTransport;

// ---------------------------------------------------------------------------
// resolve
// ---------------------------------------------------------------------------

#[test]
fn resolve_tinex_from_org_select() {
    let transport = MockTransport::new().with_page(
        "http://ceni.tinex.mk/",
        common::org_select_page(&[("4", "Тинекс Центар"), ("7", "Тинекс Аеродром")]),
    );
    let markets = MarketCatalog::new(&transport).resolve(Brand::Tinex).unwrap();

    assert_eq!(markets.len(), 2);
    assert_eq!(markets[0].id, "4");
    assert_eq!(markets[0].name, "Тинекс Центар");
    assert_eq!(markets[0].url, "http://ceni.tinex.mk/?org=4&perPage=100");
    assert_eq!(markets[1].id, "7");
}

#[test]
fn resolve_stokomak_from_org_select() {
    let transport = MockTransport::new().with_page(
        "https://stokomak.proverkanaceni.mk/",
        common::org_select_page(&[("12", "Стокомак Бит Пазар")]),
    );
    let markets = MarketCatalog::new(&transport)
        .resolve(Brand::Stokomak)
        .unwrap();

    assert_eq!(markets.len(), 1);
    assert_eq!(markets[0].brand, Brand::Stokomak);
    assert_eq!(
        markets[0].url,
        "https://stokomak.proverkanaceni.mk/?org=12&perPage=100"
    );
}

#[test]
fn resolve_kam_from_store_cards() {
    let transport = MockTransport::new().with_page(
        "https://kam.com.mk/ceni-vo-marketi/",
        common::kam_markets_page(&[
            ("КАМ Маџари", "ул. Фјодор Достоевски 1", "https://kam.com.mk/markets/madzari/"),
            ("КАМ Центар", "бул. Македонија 5", "https://kam.com.mk/markets/centar/"),
        ]),
    );
    let markets = MarketCatalog::new(&transport).resolve(Brand::Kam).unwrap();

    assert_eq!(markets.len(), 2);
    assert_eq!(markets[0].id, "madzari");
    assert_eq!(markets[0].name, "КАМ Маџари");
    assert_eq!(markets[0].address.as_deref(), Some("ул. Фјодор Достоевски 1"));
    assert_eq!(markets[1].id, "centar");
}

#[test]
fn resolve_vero_from_page_links() {
    let transport = MockTransport::new().with_page(
        "https://pricelist.vero.com.mk/",
        "<html><body>\
         <a href=\"index.html\">Дома</a>\
         <a href=\"89_1.html\">ВЕРО 1</a>\
         <a href=\"90_1.html\">ВЕРО Џамбо</a>\
         </body></html>",
    );
    let markets = MarketCatalog::new(&transport).resolve(Brand::Vero).unwrap();

    assert_eq!(markets.len(), 2);
    assert_eq!(markets[0].id, "89_1");
    assert_eq!(markets[0].name, "ВЕРО 1");
    assert_eq!(markets[0].url, "https://pricelist.vero.com.mk/89_1.html");
}

#[test]
fn resolve_fails_when_discovery_page_unreachable() {
    let transport = MockTransport::new();
    let err = MarketCatalog::new(&transport)
        .resolve(Brand::Tinex)
        .unwrap_err();
    assert!(matches!(
        err,
        ArchiveError::CatalogUnavailable { brand: Brand::Tinex, .. }
    ));
}

#[test]
fn resolve_fails_when_select_is_missing() {
    // A page that loads fine but lost its market selector: the markup
    // changed upstream, and that must surface, not return zero markets.
    let transport = MockTransport::new()
        .with_page("http://ceni.tinex.mk/", "<html><body><p>renovated</p></body></html>");
    let err = MarketCatalog::new(&transport)
        .resolve(Brand::Tinex)
        .unwrap_err();
    assert!(matches!(err, ArchiveError::CatalogUnavailable { .. }));
}

#[test]
fn resolve_fails_when_kam_cards_are_missing() {
    let transport = MockTransport::new()
        .with_page("https://kam.com.mk/ceni-vo-marketi/", "<html><body></body></html>");
    let err = MarketCatalog::new(&transport).resolve(Brand::Kam).unwrap_err();
    assert!(matches!(
        err,
        ArchiveError::CatalogUnavailable { brand: Brand::Kam, .. }
    ));
}

// ---------------------------------------------------------------------------
// diff
// ---------------------------------------------------------------------------

fn kam(id: &str, name: &str) -> MarketIdentity {
    common::market(Brand::Kam, id, name)
}

#[test]
fn diff_reports_rename_not_add_remove() {
    let previous = vec![kam("madzari", "Маџари")];
    let current = vec![kam("madzari", "Маџари Нова"), kam("centar", "Центар")];

    let delta = MarketCatalog::diff(&previous, &current);

    assert_eq!(delta.added.len(), 1);
    assert_eq!(delta.added[0].id, "centar");
    assert!(delta.removed.is_empty());
    assert_eq!(delta.renamed.len(), 1);
    assert_eq!(delta.renamed[0].0.name, "Маџари");
    assert_eq!(delta.renamed[0].1.name, "Маџари Нова");
}

#[test]
fn diff_reports_removed_markets() {
    let previous = vec![kam("madzari", "Маџари"), kam("centar", "Центар")];
    let current = vec![kam("madzari", "Маџари")];

    let delta = MarketCatalog::diff(&previous, &current);

    assert!(delta.added.is_empty());
    assert_eq!(delta.removed.len(), 1);
    assert_eq!(delta.removed[0].id, "centar");
    assert!(delta.renamed.is_empty());
}

#[test]
fn diff_of_identical_catalogs_is_empty() {
    let markets = vec![kam("madzari", "Маџари")];
    assert!(MarketCatalog::diff(&markets, &markets).is_empty());
}

#[test]
fn diff_matches_by_brand_and_id() {
    // Same id under two brands is two different markets.
    let previous = vec![common::market(Brand::Tinex, "4", "Тинекс 4")];
    let current = vec![common::market(Brand::Stokomak, "4", "Стокомак 4")];

    let delta = MarketCatalog::diff(&previous, &current);
    assert_eq!(delta.added.len(), 1);
    assert_eq!(delta.removed.len(), 1);
    assert!(delta.renamed.is_empty());
}

// ---------------------------------------------------------------------------
// persistence
// ---------------------------------------------------------------------------

#[test]
fn catalog_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("markets.json");
    let markets = vec![
        kam("madzari", "Маџари"),
        common::market(Brand::Vero, "89_1", "ВЕРО 1"),
    ];

    catalog::save_catalog(&path, &markets).unwrap();
    let loaded = catalog::load_catalog(&path).unwrap();
    assert_eq!(loaded, markets);
}

#[test]
fn catalog_file_uses_public_field_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("markets.json");
    let mut m = kam("madzari", "Маџари");
    m.address = Some("ул. 1".to_string());
    catalog::save_catalog(&path, &[m]).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let entry = &raw.as_array().unwrap()[0];
    assert_eq!(entry["brand"], "KAM");
    assert_eq!(entry["id"], "madzari");
    assert_eq!(entry["name"], "Маџари");
    assert_eq!(entry["address"], "ул. 1");
    assert!(entry["url"].is_string());
}
