//! Manifest merge and persistence tests.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, SystemTime};

use chrono::NaiveDate;
use overlay_common::Product;
use pipeline::manifest::{LOCK_FILE, MANIFEST_FILE, STALE_LOCK_AGE};
use pipeline::{update_manifest, Manifest, ManifestError};
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(1);

fn doy(d: u32) -> NaiveDate {
    NaiveDate::from_yo_opt(2025, d).unwrap()
}

fn batch(entries: &[(Product, &[u32])]) -> BTreeMap<Product, BTreeSet<NaiveDate>> {
    entries
        .iter()
        .map(|(p, days)| (*p, days.iter().map(|d| doy(*d)).collect()))
        .collect()
}

fn merged(batches: &[BTreeMap<Product, BTreeSet<NaiveDate>>]) -> Manifest {
    let mut manifest = Manifest::default();
    for b in batches {
        for (product, dates) in b {
            manifest.merge(product.definition(), dates.iter().copied());
        }
    }
    manifest
}

fn dates_by_id(manifest: &Manifest) -> BTreeMap<String, BTreeSet<NaiveDate>> {
    manifest
        .overlays
        .iter()
        .map(|o| (o.id.clone(), o.dates.clone()))
        .collect()
}

#[test]
fn test_merge_is_commutative_and_associative() {
    let a = batch(&[(Product::ModisSnow, &[1, 2]), (Product::ModisLst, &[32])]);
    let b = batch(&[(Product::ModisSnow, &[2, 3])]);
    let c = batch(&[(Product::ModisLst, &[1]), (Product::ViirsNdvi, &[213])]);

    let abc = dates_by_id(&merged(&[a.clone(), b.clone(), c.clone()]));
    assert_eq!(abc, dates_by_id(&merged(&[c.clone(), b.clone(), a.clone()])));
    assert_eq!(abc, dates_by_id(&merged(&[b, c, a])));
    assert_eq!(abc["modis_snow"].len(), 3);
}

#[test]
fn test_merge_is_idempotent() {
    let a = batch(&[(Product::ModisAlbedo, &[100, 101])]);
    assert_eq!(merged(&[a.clone()]), merged(&[a.clone(), a]));
}

#[test]
fn test_update_creates_and_extends_manifest() {
    let out = TempDir::new().unwrap();
    update_manifest(out.path(), &batch(&[(Product::ModisNbar, &[269])]), WAIT).unwrap();
    let path = update_manifest(out.path(), &batch(&[(Product::ModisNbar, &[270, 269])]), WAIT).unwrap();

    let manifest = Manifest::load(&path).unwrap();
    let record = manifest.get("modis_nbar_band1").unwrap();
    assert_eq!(record.name, "MODIS NBAR Band1");
    assert_eq!(record.units, "reflectance (0–1)");
    assert!(record.legend.starts_with("data:image/png;base64,"));
    assert_eq!(record.dates.iter().copied().collect::<Vec<_>>(), vec![doy(269), doy(270)]);
    assert!(!out.path().join(LOCK_FILE).exists());
}

#[test]
fn test_empty_date_sets_are_not_recorded() {
    let out = TempDir::new().unwrap();
    let dates = BTreeMap::from([(Product::ModisLst, BTreeSet::new())]);
    let path = update_manifest(out.path(), &dates, WAIT).unwrap();
    assert!(Manifest::load(&path).unwrap().overlays.is_empty());
}

#[test]
fn test_unknown_fields_survive_rewrite() {
    let out = TempDir::new().unwrap();
    let path = out.path().join(MANIFEST_FILE);
    std::fs::write(
        &path,
        r#"{
  "generated_by": "hand",
  "overlays": [
    { "id": "modis_snow", "name": "Snow", "units": "%", "legend": "l.png",
      "dates": ["2025-01-05"], "opacity": 0.7 }
  ]
}"#,
    )
    .unwrap();

    update_manifest(out.path(), &batch(&[(Product::ModisSnow, &[1])]), WAIT).unwrap();

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["generated_by"], "hand");
    let snow = &json["overlays"][0];
    assert_eq!(snow["name"], "Snow");
    assert_eq!(snow["legend"], "l.png");
    assert_eq!(snow["opacity"], 0.7);
    assert_eq!(snow["dates"], serde_json::json!(["2025-01-01", "2025-01-05"]));
}

#[test]
fn test_corrupt_manifest_fails_and_is_untouched() {
    let out = TempDir::new().unwrap();
    let path = out.path().join(MANIFEST_FILE);
    std::fs::write(&path, "{ \"overlays\": [ oops").unwrap();

    let err = update_manifest(out.path(), &batch(&[(Product::ModisSnow, &[1])]), WAIT).unwrap_err();
    assert!(matches!(err, ManifestError::Parse { .. }));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ \"overlays\": [ oops");
    assert!(!out.path().join(LOCK_FILE).exists());
}

#[test]
fn test_held_lock_times_out() {
    let out = TempDir::new().unwrap();
    std::fs::write(out.path().join(LOCK_FILE), "other").unwrap();

    let err = update_manifest(
        out.path(),
        &batch(&[(Product::ModisSnow, &[1])]),
        Duration::from_millis(200),
    )
    .unwrap_err();
    assert!(matches!(err, ManifestError::LockTimeout { .. }));
    assert!(err.to_string().contains(LOCK_FILE));
    assert!(!out.path().join(MANIFEST_FILE).exists());
}

#[test]
fn test_stale_lock_is_reclaimed() {
    let out = TempDir::new().unwrap();
    let lock_path = out.path().join(LOCK_FILE);
    let lock = std::fs::File::create(&lock_path).unwrap();
    lock.set_modified(SystemTime::now() - STALE_LOCK_AGE * 2).unwrap();
    drop(lock);

    let path = update_manifest(
        out.path(),
        &batch(&[(Product::ModisSnow, &[1])]),
        Duration::from_millis(200),
    )
    .unwrap();
    assert!(path.exists());
    assert!(!lock_path.exists());
    assert!(Manifest::load(&path).unwrap().get("modis_snow").is_some());
}

#[cfg(unix)]
#[test]
fn test_manifest_is_world_readable() {
    use std::os::unix::fs::PermissionsExt;

    let out = TempDir::new().unwrap();
    let path = update_manifest(out.path(), &batch(&[(Product::ModisLst, &[5])]), WAIT).unwrap();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o644);

    // A rewrite keeps whatever mode the manifest already has.
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();
    update_manifest(out.path(), &batch(&[(Product::ModisLst, &[6])]), WAIT).unwrap();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o640);
}
