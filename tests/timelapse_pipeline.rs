use chrono::{Duration, NaiveDate, NaiveDateTime};
use hubway_timelapse::loader::{load_registry, load_trips};
use hubway_timelapse::{
    FrameFormat, FrameLine, FrameWriter, Snapshot, Station, StationId, StationRegistry, Timelapse,
    TimelapseConfig, Trip,
};
use std::fs;
use std::io::Write;
use tempfile::tempdir;

const STATIONS: &str = "\
\"id\",\"terminalName\",\"name\",\"installed\",\"locked\",\"temporary\",\"lat\",\"lng\"
1,\"B32006\",\"Colleges of the Fenway\",\"true\",\"false\",\"false\",42.340021,-71.100812
2,\"C32000\",\"Tremont St. at Northampton St.\",\"true\",\"false\",\"false\",42.339335,-71.080342
3,\"B32012\",\"Northeastern U / North Parking Lot\",\"true\",\"false\",\"false\",42.341814,-71.090179
";

// Deliberately out of order; the loader sorts by start time.
const TRIPS: &str = "\
\"id\",\"status\",\"duration\",\"start_date\",\"strt_statn\",\"end_date\",\"end_statn\",\"bike_nr\",\"subsc_type\",\"zip_code\",\"birth_date\",\"gender\"
4,\"Closed\",600,\"2011-07-28 03:20:00\",3,\"2011-07-28 03:30:00\",1,\"B00004\",\"Casual\",,,
1,\"Closed\",600,\"2011-07-28 00:00:00\",1,\"2011-07-28 00:10:00\",2,\"B00001\",\"Registered\",\"'02215\",1980,\"Female\"
2,\"Closed\",600,\"2011-07-28 00:30:00\",2,\"2011-07-28 00:40:00\",1,\"B00002\",\"Registered\",\"'02215\",1981,\"Male\"
3,\"Closed\",600,\"2011-07-28 01:15:00\",1,\"2011-07-28 01:25:00\",99,\"B00003\",\"Registered\",\"'02116\",1975,\"Male\"
5,\"Closed\",600,\"not a date\",3,\"2011-07-28 03:30:00\",1,\"B00005\",\"Casual\",,,
";

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2011, 7, 28)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn write_fixture(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    path
}

fn render(registry: &StationRegistry, trips: &[Trip], config: TimelapseConfig) -> String {
    let mut writer = FrameWriter::new(Vec::new(), FrameFormat::Compact);
    Timelapse::new(registry, config).run(trips, &mut writer).unwrap();
    String::from_utf8(writer.finish().unwrap()).unwrap()
}

#[test]
fn csv_to_frame_file_end_to_end() {
    let dir = tempdir().unwrap();
    let stations = write_fixture(dir.path(), "stations.csv", STATIONS);
    let trips = write_fixture(dir.path(), "trips.csv", TRIPS);

    let registry = load_registry(&stations).unwrap();
    let loaded = load_trips(&trips).unwrap();
    assert_eq!(registry.len(), 3);
    assert_eq!(loaded.rejected, 1);
    assert_eq!(loaded.records.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2, 3, 4]);

    let config = TimelapseConfig::from_units(3600.0, 1.0, 0.5).unwrap();
    let output = render(&registry, &loaded.records, config);
    let frames: Vec<Snapshot> = output.lines().map(|l| FrameLine::parse(l).unwrap()).collect();

    // Trip 3 (01:15) crosses 01:00, trip 4 (03:20) crosses 02:00 and 03:00.
    let times: Vec<_> = frames.iter().map(|f| f.frame_time).collect();
    assert_eq!(times, vec![at(1, 0), at(2, 0), at(3, 0)]);

    let first = &frames[0];
    let one = first.stations[&StationId(1)];
    let two = first.stations[&StationId(2)];
    assert_eq!((one.trend, one.capacity, one.usage), (0.5, 1, 1));
    assert_eq!((two.trend, two.capacity, two.usage), (0.5, 0, 0));

    // Trip 3 went to an unknown station; only its origin side counted.
    let last = &frames[2];
    assert_eq!(last.stations[&StationId(1)].trend, 1.5 * 0.25);
    assert_eq!(last.stations[&StationId(1)].usage, 0);
    // Trip 4's checkout lands before the frames it crosses, its trend after.
    let three = last.stations[&StationId(3)];
    assert_eq!((three.trend, three.capacity, three.usage), (0.0, 1, 1));
    assert!(output.starts_with(&format!("{},", at(1, 0).and_utc().timestamp_millis())));
}

#[test]
fn reruns_are_byte_identical() {
    let registry = hubway_timelapse::loader::read_stations(STATIONS.as_bytes())
        .unwrap()
        .records
        .into_iter()
        .collect::<StationRegistry>();
    let trips = hubway_timelapse::loader::read_trips(TRIPS.as_bytes()).unwrap().records;
    let config = TimelapseConfig::from_units(900.0, 0.25, 0.9).unwrap();

    let first = render(&registry, &trips, config);
    let second = render(&registry, &trips, config);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

fn station(id: u32) -> Station {
    Station {
        id: StationId(id),
        name: format!("dock {id}"),
        latitude: 42.35,
        longitude: -71.06,
    }
}

fn trip(id: u64, origin: u32, destination: u32, start: NaiveDateTime) -> Trip {
    Trip {
        id,
        origin: StationId(origin),
        destination: StationId(destination),
        start,
        end: start + Duration::minutes(15),
    }
}

#[test]
fn frame_times_are_evenly_spaced_regardless_of_density() {
    let registry: StationRegistry = (1..=4).map(station).collect();
    let first = at(0, 0);
    // A burst, a long gap, then a sparse tail.
    let offsets = [0, 1, 2, 3, 5, 8, 13, 400, 401, 1000, 1337];
    let trips: Vec<Trip> = offsets
        .iter()
        .enumerate()
        .map(|(i, &m)| trip(i as u64, (i % 4) as u32 + 1, ((i + 1) % 4) as u32 + 1, first + Duration::minutes(m)))
        .collect();

    let config = TimelapseConfig::from_units(600.0, 1.0, 0.99).unwrap();
    let mut frames: Vec<Snapshot> = Vec::new();
    Timelapse::new(&registry, config).run(&trips, &mut frames).unwrap();

    let last = first + Duration::minutes(1337);
    let expected: Vec<NaiveDateTime> = (1..)
        .map(|k| first + Duration::minutes(10 * k))
        .take_while(|t| *t < last)
        .collect();
    let times: Vec<NaiveDateTime> = frames.iter().map(|f| f.frame_time).collect();
    assert_eq!(times, expected);
}

#[test]
fn idle_station_trend_decays_geometrically() {
    let registry: StationRegistry = (1..=2).map(station).collect();
    let start = at(6, 0);
    let trips = vec![
        trip(1, 1, 2, start),
        trip(2, 1, 2, start + Duration::minutes(1)),
        // Station 2 keeps the clock moving; station 1 sits idle.
        trip(3, 2, 2, start + Duration::minutes(60 * 6 + 1)),
    ];
    let config = TimelapseConfig::from_units(3600.0, 1.0, 0.8).unwrap();
    let mut frames: Vec<Snapshot> = Vec::new();
    Timelapse::new(&registry, config).run(&trips, &mut frames).unwrap();

    assert_eq!(frames.len(), 6);
    for (n, frame) in frames.iter().enumerate() {
        let expected = 2.0 * 0.8f64.powi(n as i32 + 1);
        let trend = frame.stations[&StationId(1)].trend;
        assert!((trend - expected).abs() < 1e-12, "frame {n}: {trend} != {expected}");
    }
}

#[test]
fn capacity_is_the_running_peak_of_net_checkouts() {
    let registry: StationRegistry = (1..=2).map(station).collect();
    let start = at(8, 0);
    // Station 1: +1 +1 -1 -1 -1 +1 +1 -> peak of the prefix sums is 2.
    let moves = [(1, 2), (1, 2), (2, 1), (2, 1), (2, 1), (1, 2), (1, 2)];
    let trips: Vec<Trip> = moves
        .iter()
        .enumerate()
        .map(|(i, &(o, d))| trip(i as u64, o, d, start + Duration::minutes(i as i64)))
        .collect();

    let config = TimelapseConfig::from_units(3600.0, 1.0, 1.0).unwrap();
    let mut engine = Timelapse::new(&registry, config);
    let mut frames: Vec<Snapshot> = Vec::new();
    engine.run(&trips, &mut frames).unwrap();

    let one = engine.store().get(StationId(1)).copied().unwrap();
    assert_eq!(one.usage, 1);
    assert_eq!(one.capacity, 2);
    let two = engine.store().get(StationId(2)).copied().unwrap();
    assert_eq!(two.usage, -1);
    assert_eq!(two.capacity, 1);
}
