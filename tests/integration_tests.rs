use chrono::NaiveDate;
use flate2::write::GzEncoder;
use flate2::Compression;
use gsod_processor::models::{Collection, GeoPoint};
use gsod_processor::processors::{
    BatchIngester, IngestMode, IngestSummary, NearestObservationResolver,
};
use gsod_processor::readers::fixed_width::render_line;
use gsod_processor::store::{MemoryStore, RetryPolicy, StoreGateway};
use gsod_processor::sync::{LocalMirror, SyncOrchestrator};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

// The last row has no position; it is left out without counting as skipped.
const STATIONS_CSV: &str = "\
\"USAF\",\"WBAN\",\"STATION NAME\",\"CTRY\",\"FIPS\",\"STATE\",\"CALL\",\"LAT\",\"LON\",\"ELEV(.1M)\",\"BEGIN\",\"END\"
\"010010\",\"99999\",\"JAN MAYEN\",\"NO\",\"NO\",\"\",\"ENJA\",\"+70933\",\"-008667\",\"+00090\",\"19310101\",\"20100131\"
\"010140\",\"99999\",\"SORSTOKKEN\",\"NO\",\"NO\",\"\",\"ENSO\",\"+59783\",\"+005350\",\"+00500\",\"19861120\",\"20100131\"
\"010200\",\"99999\",\"SORKAPPOYA\",\"SV\",\"SV\",\"\",\"\",\"+76483\",\"+016567\",\"+00120\",\"19850601\",\"20100131\"
\"999999\",\"00001\",\"NO POSITION\",\"US\",\"US\",\"\",\"\",\"-99999\",\"-999999\",\"-99999\",\"\",\"\"
";

fn observation_lines(station: &str, days: &[(&str, &str)]) -> String {
    let mut content = String::from(
        "STN--- WBAN   YEARMODA    TEMP       DEWP      SLP        STP       VISIB      WDSP     MXSPD   GUST    MAX     MIN   PRCP   SNDP   FRSHTT\n",
    );
    for (date, temp) in days {
        content.push_str(&render_line(&[
            ("station", station),
            ("wban", "99999"),
            ("date", date),
            ("temp", temp),
            ("temp_count", "24"),
            ("max_temp", "9999.9"),
            ("min_temp", "23.0"),
            ("frshtt", "010000"),
        ]));
        content.push('\n');
    }
    content
}

fn gzip(content: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

/// Mirror tree with a station list, three good observation files, one corrupt
/// one and a file that does not match the naming pattern.
fn build_mirror(root: &Path) {
    let base = root.join("pub/data/gsod");
    let year = base.join("2009");
    std::fs::create_dir_all(&year).unwrap();

    std::fs::write(base.join("ish-history.csv"), STATIONS_CSV).unwrap();
    std::fs::write(
        year.join("010010-99999-2009.op.gz"),
        gzip(&observation_lines("010010", &[("20090101", "32.0"), ("20090102", "98.6")])),
    )
    .unwrap();
    std::fs::write(
        year.join("010140-99999-2009.op.gz"),
        gzip(&observation_lines("010140", &[("20090101", "0.0"), ("20090102", "bogus")])),
    )
    .unwrap();
    std::fs::write(
        year.join("010200-99999-2009.op.gz"),
        gzip(&observation_lines("010200", &[("20090101", "14.0")])),
    )
    .unwrap();
    std::fs::write(year.join("010300-99999-2009.op.gz"), [0x1f, 0x8b, 0x00, 0xff, 0x13]).unwrap();
    std::fs::write(year.join("gsod_2009.tar"), b"not an observation file").unwrap();
}

struct Pipeline {
    _mirror_dir: TempDir,
    store: Arc<MemoryStore>,
    gateway: StoreGateway,
    sync: SyncOrchestrator<LocalMirror>,
}

fn pipeline() -> Pipeline {
    let mirror_dir = TempDir::new().unwrap();
    build_mirror(mirror_dir.path());

    let store = Arc::new(MemoryStore::new());
    let gateway = StoreGateway::new(store.clone(), RetryPolicy::new(1, Duration::ZERO));
    let sync = SyncOrchestrator::new(
        LocalMirror::new(mirror_dir.path()),
        BatchIngester::new(gateway.clone()),
    )
    .with_silent(true);

    Pipeline {
        _mirror_dir: mirror_dir,
        store,
        gateway,
        sync,
    }
}

#[test]
fn test_station_sync_from_mirror() {
    let mut p = pipeline();

    let report = p.sync.sync_stations().unwrap();

    assert_eq!(report.totals(), IngestSummary { inserted: 3, updated: 0, skipped: 0 });
    assert_eq!(p.store.count(Collection::Stations), 3);

    let stations = p.store.documents(Collection::Stations);
    assert_eq!(stations[0]["station_name"], "JAN MAYEN");
    let close = |value: &serde_json::Value, expected: f64| {
        (value.as_f64().unwrap() - expected).abs() < 1e-9
    };
    assert!(close(&stations[0]["loc"]["lat"], 70.933));
    assert!(close(&stations[0]["loc"]["long"], -8.667));
    assert!(close(&stations[0]["elevation"], 9.0));
}

#[test]
fn test_observation_sync_skips_bad_file_and_bad_lines() {
    let mut p = pipeline();

    let report = p.sync.sync_observations(2009).unwrap();

    assert_eq!(report.files.len(), 4);
    assert_eq!(report.failed_count(), 1);
    assert!(report.files[3].is_failure());
    assert_eq!(report.files[3].file, "010300-99999-2009.op.gz");
    assert_eq!(report.totals(), IngestSummary { inserted: 4, updated: 0, skipped: 1 });

    let observations = p.store.documents(Collection::Observations);
    assert_eq!(observations.len(), 4);
    assert_eq!(observations[0]["temp"], 0);
    assert_eq!(observations[0]["max_temp"], serde_json::Value::Null);
    assert_eq!(observations[0]["min_temp"], -5);
    assert_eq!(observations[0]["date"], "2009-01-01");
    assert_eq!(observations[1]["temp"], 37);
}

#[test]
fn test_resync_is_idempotent() {
    let mut p = pipeline();
    p.sync.sync_stations().unwrap();
    p.sync.sync_observations(2009).unwrap();

    let stations = p.sync.sync_stations().unwrap();
    let observations = p.sync.sync_observations(2009).unwrap();

    assert_eq!(stations.totals(), IngestSummary { inserted: 0, updated: 3, skipped: 0 });
    assert_eq!(observations.totals(), IngestSummary { inserted: 0, updated: 4, skipped: 1 });
    assert_eq!(p.store.count(Collection::Stations), 3);
    assert_eq!(p.store.count(Collection::Observations), 4);
}

#[test]
fn test_parallel_sync_stores_the_same_data() {
    let mut p = pipeline();
    let sequential = p.sync.sync_observations(2009).unwrap();

    let mut q = pipeline();
    q.sync = q.sync.with_max_workers(3);
    let parallel = q.sync.sync_observations(2009).unwrap();

    assert_eq!(sequential.totals(), parallel.totals());
    assert_eq!(
        sequential.files.iter().map(|f| &f.file).collect::<Vec<_>>(),
        parallel.files.iter().map(|f| &f.file).collect::<Vec<_>>()
    );
    assert_eq!(q.store.count(Collection::Observations), 4);
}

#[test]
fn test_query_after_sync() {
    let mut p = pipeline();
    p.sync.sync_stations().unwrap();
    p.sync.sync_observations(2009).unwrap();
    let resolver = NearestObservationResolver::new(p.gateway.clone());

    // Bergen is closest to SORSTOKKEN, which has a reading for Jan 1.
    let bergen = GeoPoint::new(60.39, 5.32);
    let reading = resolver
        .resolve(bergen, NaiveDate::from_ymd_opt(2009, 1, 1).unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(reading.usaf, "010140");
    assert_eq!(reading.temp, Some(-18));

    // Its Jan 2 line was malformed, so the next closest station answers.
    let reading = resolver
        .resolve(bergen, NaiveDate::from_ymd_opt(2009, 1, 2).unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(reading.usaf, "010010");
    assert_eq!(reading.temp, Some(37));

    assert!(resolver
        .resolve(bergen, NaiveDate::from_ymd_opt(2010, 1, 1).unwrap())
        .unwrap()
        .is_none());
}

#[test]
fn test_snapshot_survives_reopen() {
    let mut p = pipeline();
    p.sync.sync_stations().unwrap();
    let snapshot_dir = TempDir::new().unwrap();
    let path = snapshot_dir.path().join("store.json");

    p.store.persist(&path).unwrap();
    let reopened = Arc::new(MemoryStore::open(&path).unwrap());

    assert_eq!(reopened.count(Collection::Stations), 3);

    let gateway = StoreGateway::new(reopened.clone(), RetryPolicy::new(1, Duration::ZERO));
    let file = snapshot_dir.path().join("ish-history.csv");
    std::fs::write(&file, STATIONS_CSV).unwrap();
    let summary = BatchIngester::new(gateway)
        .ingest_station_file(&file, IngestMode::Upsert)
        .unwrap();

    assert_eq!(summary, IngestSummary { inserted: 0, updated: 3, skipped: 0 });
}

#[test]
fn test_dry_run_sync_writes_nothing() {
    let mirror_dir = TempDir::new().unwrap();
    build_mirror(mirror_dir.path());
    let store = Arc::new(MemoryStore::new());
    let gateway = StoreGateway::new(store.clone(), RetryPolicy::new(1, Duration::ZERO));
    let mut sync = SyncOrchestrator::new(
        LocalMirror::new(mirror_dir.path()),
        BatchIngester::new(gateway).with_dry_run(true),
    )
    .with_silent(true);

    let report = sync.sync_observations(2009).unwrap();

    assert_eq!(report.totals().inserted, 4);
    assert_eq!(store.count(Collection::Observations), 0);
}
