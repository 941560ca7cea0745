mod common;

use assert_matches::assert_matches;

use common::{DATASETS_JSON, client, data_root};
use kplr::cache::{CacheEntry, DataOptions, DataProduct};
use kplr::domain::{Cadence, KeplerId};
use kplr::error::KplrError;

#[test]
fn light_curves_map_cadence_to_suffix() {
    let temp = tempfile::tempdir().unwrap();
    let api = client(&temp);
    api.transport().respond(200, DATASETS_JSON);

    let files = api
        .light_curves(KeplerId::new(9787239), DataOptions::default())
        .unwrap();
    let names: Vec<&str> = files.iter().map(|file| file.entry.filename.as_str()).collect();
    assert_eq!(
        names,
        [
            "kplr009787239-2009166043257_llc.fits",
            "kplr009787239-2009231120729_slc.fits"
        ]
    );
    assert_eq!(api.transport().call_count(), 1);
    assert!(!api.file_cache().is_cached(&files[0].entry));
}

#[test]
fn target_pixel_files_are_gzipped() {
    let temp = tempfile::tempdir().unwrap();
    let api = client(&temp);
    api.transport().respond(200, DATASETS_JSON);

    let files = api
        .target_pixel_files(KeplerId::new(9787239), DataOptions::default())
        .unwrap();
    assert_eq!(files[0].product(), DataProduct::TargetPixelFile);
    assert_eq!(
        files[0].entry.filename,
        "kplr009787239-2009166043257_lpd-targ.fits.gz"
    );
    assert_eq!(
        api.file_cache().url(&files[1].entry),
        "https://archive.stsci.edu/pub/kepler/target_pixel_files/0097/009787239/kplr009787239-2009231120729_spd-targ.fits.gz"
    );
}

#[test]
fn fetch_downloads_once() {
    let temp = tempfile::tempdir().unwrap();
    let api = client(&temp);
    api.transport().respond(200, DATASETS_JSON);
    api.transport().respond(200, b"SIMPLE  =                    T".to_vec());
    api.transport().respond(200, b"SIMPLE  =                    T".to_vec());

    let options = DataOptions {
        fetch: true,
        ..DataOptions::default()
    };
    let files = api.light_curves(KeplerId::new(9787239), options).unwrap();
    assert_eq!(api.transport().call_count(), 3);

    let expected = data_root(&temp)
        .join("data/lightcurves/009787239/kplr009787239-2009166043257_llc.fits");
    assert_eq!(api.file_cache().path(&files[0].entry), expected);
    assert!(expected.as_std_path().exists());

    let path = api.fetch(&files[0], false).unwrap();
    assert_eq!(path, expected);
    assert_eq!(api.transport().call_count(), 3);
}

#[test]
fn present_file_makes_no_request() {
    let temp = tempfile::tempdir().unwrap();
    let api = client(&temp);
    let entry = CacheEntry::new(
        DataProduct::LightCurve,
        KeplerId::new(757450),
        "kplr000757450-2009166043257",
        Cadence::Long,
    );
    let cache = api.file_cache();
    let path = cache.path(&entry);
    std::fs::create_dir_all(path.parent().unwrap().as_std_path()).unwrap();
    std::fs::write(path.as_std_path(), b"local").unwrap();

    assert_eq!(cache.fetch(&entry, false).unwrap(), path);
    assert_eq!(api.transport().call_count(), 0);
    assert_eq!(std::fs::read(path.as_std_path()).unwrap(), b"local");
}

#[test]
fn overwrite_replaces_cached_file() {
    let temp = tempfile::tempdir().unwrap();
    let api = client(&temp);
    let entry = CacheEntry::new(
        DataProduct::LightCurve,
        KeplerId::new(757450),
        "kplr000757450-2009166043257",
        Cadence::Long,
    );
    let cache = api.file_cache();
    api.transport().respond(200, b"first".to_vec());
    api.transport().respond(200, b"second".to_vec());

    let path = cache.fetch(&entry, false).unwrap();
    cache.fetch(&entry, true).unwrap();

    assert_eq!(api.transport().call_count(), 2);
    assert_eq!(std::fs::read(path.as_std_path()).unwrap(), b"second");
    assert_eq!(api.transport().calls()[1].method, "GET");
}

#[test]
fn failed_download_leaves_no_file() {
    let temp = tempfile::tempdir().unwrap();
    let api = client(&temp);
    let entry = CacheEntry::new(
        DataProduct::LightCurve,
        KeplerId::new(757450),
        "kplr000757450-2009166043257",
        Cadence::Short,
    );
    api.transport().respond(404, "Not Found");

    let err = api.file_cache().fetch(&entry, false).unwrap_err();
    assert_matches!(err, KplrError::Status { status: 404, ref url, .. } => {
        assert!(url.ends_with("/lightcurves/0007/000757450/kplr000757450-2009166043257_slc.fits"));
    });
    assert!(!api.file_cache().is_cached(&entry));
    assert!(!data_root(&temp).join("data").as_std_path().exists());
}

#[test]
fn light_curves_for_a_planet_use_its_kepid() {
    let temp = tempfile::tempdir().unwrap();
    let api = client(&temp);
    api.transport().respond(
        200,
        r#"[{"Planet Name": "Kepler-145 b", "Kepler ID": "9787239", "KOI Number": "145.01"}]"#,
    );
    api.transport().respond(200, DATASETS_JSON);

    let planet = api.planet("145b").unwrap();
    let files = api
        .light_curves_for(&planet, DataOptions::default())
        .unwrap();
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|file| file.entry.kepid == KeplerId::new(9787239)));

    let calls = api.transport().calls();
    assert!(calls[1].url.ends_with("/data_search/search.php"));
    assert!(calls[1].body.as_deref().unwrap().contains("ktc_kepler_id=9787239"));
}

#[test]
fn target_pixel_files_for_a_koi_honour_long_only() {
    let temp = tempfile::tempdir().unwrap();
    let api = client(&temp);
    api.transport().respond(200, common::KOI_CSV);
    api.transport().respond(
        200,
        r#"[{"Kepler ID": "9787239", "Dataset Name": "KPLR009787239-2009166043257", "Target Type": "LC"}]"#,
    );

    let koi = api.koi("145.01".parse().unwrap()).unwrap();
    let options = DataOptions {
        short_cadence: false,
        ..DataOptions::default()
    };
    let files = api.target_pixel_files_for(&koi, options).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(
        files[0].entry.filename,
        "kplr009787239-2009166043257_lpd-targ.fits.gz"
    );
    let body = api.transport().calls()[1].body.clone().unwrap();
    assert!(body.contains("ktc_target_type=LC"));
}

#[test]
fn record_without_kepid_makes_no_request() {
    let temp = tempfile::tempdir().unwrap();
    let api = client(&temp);
    api.transport()
        .respond(200, r#"[{"Planet Name": "Kepler-145 b"}]"#);

    let planet = api.planet("145b").unwrap();
    let err = api
        .light_curves_for(&planet, DataOptions::default())
        .unwrap_err();
    assert_matches!(err, KplrError::MissingField { record: "Planet", field: "kepid" });
    assert_eq!(api.transport().call_count(), 1);
}
