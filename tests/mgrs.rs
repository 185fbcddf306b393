use std::{sync::Arc, thread};

use gridref::{
    Ellipsoid, Error, ErrorKind, Hemisphere, LatLon, Mgrs, MgrsConverter, UpsCoord, UtmConverter, UtmCoord,
};

fn wgs84() -> MgrsConverter {
    MgrsConverter::wgs84().unwrap()
}

#[test]
fn equator_and_prime_meridian() {
    let mgrs = wgs84();
    let grid = mgrs.convert_from_geodetic(&LatLon::from_degrees(0.0, 0.0), 5).unwrap();
    assert_eq!(grid, "31NAA6602100000");
}

#[test]
fn decode_reference_point() {
    let mgrs = wgs84();
    let point = mgrs.convert_to_geodetic("16SGC3855124838").unwrap();
    assert!((point.latitude() - 33.6366624).abs() < 1e-6);
    assert!((point.longitude() + 84.4280571).abs() < 1e-6);
}

#[test]
fn latitude_out_of_range() {
    let mgrs = wgs84();

    let err = mgrs.convert_from_geodetic(&LatLon::from_degrees(95.0, 0.0), 5).unwrap_err();
    assert!(matches!(err, Error::InvalidLatitude(_)));
    let err = mgrs.convert_from_geodetic(&LatLon::from_degrees(0.0, 400.0), 5).unwrap_err();
    assert!(matches!(err, Error::InvalidLongitude(_)));
}

#[test]
fn precision_levels() {
    let mgrs = wgs84();
    let nyc = LatLon::from_degrees(40.748333, -73.985278);

    let expected = [
        "18TWL",
        "18TWL81",
        "18TWL8511",
        "18TWL856113",
        "18TWL85661131",
        "18TWL8566411315",
    ];
    for (precision, grid) in expected.iter().enumerate() {
        assert_eq!(mgrs.convert_from_geodetic(&nyc, precision as i32).unwrap(), *grid);
    }

    assert!(matches!(mgrs.convert_from_geodetic(&nyc, 6), Err(Error::InvalidPrecision(6))));
    assert!(matches!(mgrs.convert_from_geodetic(&nyc, -1), Err(Error::InvalidPrecision(-1))));
}

#[test]
fn truncation_is_idempotent() {
    let mgrs = wgs84();
    let nyc = LatLon::from_degrees(40.748333, -73.985278);
    let (easting, northing) = (585_664.121, 4_511_315.422);

    for precision in 0..=5 {
        let grid = mgrs.convert_from_geodetic(&nyc, precision).unwrap();
        let utm = mgrs.convert_to_utm(&grid).unwrap();

        let unit = 10_f64.powi(5 - precision);
        assert_eq!(utm.easting(), (easting / unit).trunc() * unit, "{grid}");
        assert_eq!(utm.northing(), (northing / unit).trunc() * unit, "{grid}");

        // Encoding the decoded point at the same precision gives the same string
        let point = mgrs.convert_to_geodetic(&grid).unwrap();
        assert_eq!(mgrs.convert_from_geodetic(&point, precision).unwrap(), grid);
    }
}

#[test]
fn malformed_strings() {
    let mgrs = wgs84();

    for bad in [
        "18TWL85664-11315",
        "18TWL#8566411315",
        "18TWLL8566411315",
        "18TW8566411315",
        "18TIL8566411315",
        "18TWO8566411315",
        "118TWL8566411315",
        "18TWL856641131",
        "18TWL856641131512",
        "18TWL85664113A15",
        "18TWL8566411315Z",
        "18TWL\u{e9}",
        "",
        "   ",
        "1234567890",
    ] {
        let err = mgrs.convert_to_geodetic(bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format, "{bad:?} gave {err}");
    }

    for zone in ["00NAA", "61NAA", "99NAA"] {
        assert!(matches!(mgrs.convert_to_geodetic(zone), Err(Error::InvalidZone { .. })));
    }
}

#[test]
fn letters_that_cannot_occur() {
    let mgrs = wgs84();

    for bad in [
        // No band Z outside the caps
        "31ZAA",
        // No N cap
        "NAA",
        // Zones removed from band X
        "32XMH",
        "34XEF",
        // Zone 31V stops at column D
        "31VEF",
        // Column letter outside the zone set
        "31NJA",
        // Row past V
        "31NAW",
        // Polar columns that are never used
        "ZDA",
        "AMA",
    ] {
        let err = mgrs.convert_to_geodetic(bad).unwrap_err();
        assert!(matches!(err, Error::InvalidMgrs(_)), "{bad} gave {err}");
    }
}

#[test]
fn parse_is_lenient_about_layout() {
    let mgrs = wgs84();

    let a = mgrs.convert_to_geodetic("18TWL8566411315").unwrap();
    let b = mgrs.convert_to_geodetic("18twl 85664 11315").unwrap();
    let c = mgrs.convert_to_geodetic(" 18 T W L\t85664\n11315 ").unwrap();
    assert_eq!(a, b);
    assert_eq!(a, c);
}

#[test]
fn display_round_trips_parse() {
    for (input, canonical) in [
        ("18twl8566411315", "18TWL8566411315"),
        ("4QFJ12346789", "04QFJ12346789"),
        ("zah", "ZAH"),
        ("bAn 00000 00000", "BAN0000000000"),
        ("31NAA", "31NAA"),
    ] {
        let parsed: Mgrs = input.parse().unwrap();
        assert_eq!(parsed.to_string(), canonical);
        assert_eq!(Mgrs::parse_str(canonical).unwrap(), parsed);
    }

    let polar = Mgrs::parse_str("ZAH").unwrap();
    assert!(polar.is_polar());
    assert_eq!(polar.zone(), 0);
    assert_eq!(polar.precision(), 0);
}

#[test]
fn band_edges() {
    let mgrs = wgs84();
    let band = |lat: f64| {
        let grid = mgrs.convert_from_geodetic(&LatLon::from_degrees(lat, 10.0), 3).unwrap();
        grid.parse::<Mgrs>().unwrap().band()
    };

    assert_eq!(band(84.0), 'X');
    assert_eq!(band(72.0), 'X');
    assert_eq!(band(71.999), 'W');
    assert_eq!(band(8.0), 'P');
    assert_eq!(band(0.0), 'N');
    assert_eq!(band(-0.001), 'M');
    assert_eq!(band(-80.0), 'C');

    // Just past the UTM latitudes the caps take over
    assert_eq!(band(84.001), 'Z');
    assert_eq!(band(-80.001), 'B');

    let top = mgrs.convert_from_geodetic(&LatLon::from_degrees(84.0, 10.0), 5).unwrap();
    let decoded = mgrs.decode(&top).unwrap();
    assert!((decoded.latlon().latitude() - 84.0).abs() < 1e-4);
}

#[test]
fn straddling_a_band_edge() {
    let mgrs = wgs84();

    let grid = mgrs.convert_from_geodetic(&LatLon::from_degrees(7.5, 3.0), 5).unwrap();
    assert_eq!(&grid[..3], "31N");

    // Same square labelled with the band to the north
    let relabelled = format!("31P{}", &grid[3..]);
    let decoded = mgrs.decode(&relabelled).unwrap();
    assert!(decoded.straddles_band_boundary());
    assert!((decoded.latlon().latitude() - 7.5).abs() < 1e-4);

    assert!(!mgrs.decode(&grid).unwrap().straddles_band_boundary());
}

#[test]
fn band_mismatch() {
    let mgrs = wgs84();

    let grid = mgrs.convert_from_geodetic(&LatLon::from_degrees(17.0, 3.0), 5).unwrap();
    assert_eq!(&grid[..3], "31Q");

    let relabelled = format!("31N{}", &grid[3..]);
    let err = mgrs.convert_to_geodetic(&relabelled).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Consistency);
    match err {
        Error::BandMismatch { band, latitude } => {
            assert_eq!(band, 'N');
            assert!((latitude - 17.0).abs() < 1e-4);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn norway_and_svalbard_squares() {
    let mgrs = wgs84();
    let zone = |lat: f64, lon: f64| {
        let grid = mgrs.convert_from_geodetic(&LatLon::from_degrees(lat, lon), 5).unwrap();
        grid.parse::<Mgrs>().unwrap().zone()
    };

    assert_eq!(zone(60.0, 4.0), 32);
    assert_eq!(zone(60.0, 2.0), 31);
    assert_eq!(zone(78.0, 8.0), 31);
    assert_eq!(zone(78.0, 10.0), 33);
    assert_eq!(zone(78.0, 20.0), 33);
    assert_eq!(zone(78.0, 22.0), 35);
    assert_eq!(zone(78.0, 32.0), 35);
    assert_eq!(zone(78.0, 34.0), 37);
}

#[test]
fn from_utm() {
    let mgrs = wgs84();

    let utm = UtmCoord::create(18, Hemisphere::North, 585_664.15, 4_511_315.45).unwrap();
    assert_eq!(mgrs.convert_from_utm(&utm, 5).unwrap(), "18TWL8566411315");
    assert_eq!(mgrs.convert_from_utm(&utm, 1).unwrap(), "18TWL81");

    // A neighbouring zone is moved back to the natural one
    let point = LatLon::from_degrees(40.7, -72.5);
    let overridden = UtmConverter::wgs84().unwrap().convert_from_geodetic(&point, 19).unwrap();
    assert_eq!(overridden.zone(), 19);
    let grid = mgrs.convert_from_utm(&overridden, 3).unwrap();
    assert!(grid.starts_with("18T"));
    assert_eq!(grid, mgrs.convert_from_geodetic(&point, 3).unwrap());

    let bad = UtmCoord::new(18, Hemisphere::North, 50_000.0, 4_511_315.45);
    assert!(matches!(mgrs.convert_from_utm(&bad, 5), Err(Error::InvalidEasting(_))));
}

#[test]
fn from_ups() {
    let mgrs = wgs84();

    let north = UpsCoord::create(Hemisphere::North, 2_000_000.0, 2_000_000.0).unwrap();
    assert_eq!(mgrs.convert_from_ups(&north, 0).unwrap(), "ZAH");
    let south = UpsCoord::create(Hemisphere::South, 2_000_000.0, 2_000_000.0).unwrap();
    assert_eq!(mgrs.convert_from_ups(&south, 5).unwrap(), "BAN0000000000");

    let west = UpsCoord::create(Hemisphere::North, 1_950_000.0, 2_000_000.0).unwrap();
    assert!(mgrs.convert_from_ups(&west, 5).unwrap().starts_with('Y'));

    let bad = UpsCoord::new(Hemisphere::North, 5_000_000.0, 2_000_000.0);
    assert!(mgrs.convert_from_ups(&bad, 5).is_err());
    assert!(matches!(mgrs.convert_from_ups(&north, 7), Err(Error::InvalidPrecision(7))));
}

#[test]
fn polar_decode() {
    let mgrs = wgs84();

    let ups = mgrs.convert_to_ups("ZAH0000000000").unwrap();
    assert_eq!(ups.hemisphere(), Hemisphere::North);
    assert_eq!((ups.easting(), ups.northing()), (2_000_000.0, 2_000_000.0));

    let pole = mgrs.convert_to_geodetic("BAN").unwrap();
    assert!((pole.latitude() + 90.0).abs() < 1e-9);

    assert!(matches!(mgrs.convert_to_ups("18TWL8566411315"), Err(Error::InvalidMgrs(_))));
    assert!(matches!(mgrs.convert_to_utm("ZAH"), Err(Error::InvalidMgrs(_))));
}

#[test]
fn older_lettering_pattern() {
    let clarke = Ellipsoid::new(6_378_206.4, 1.0 / 294.978_698_2, "CC");
    let mgrs = MgrsConverter::new(&clarke).unwrap();
    let origin = LatLon::from_degrees(0.0, 0.0);

    let grid = mgrs.convert_from_geodetic(&origin, 0).unwrap();
    assert_eq!(grid, "31NAL");
    assert_eq!(wgs84().convert_from_geodetic(&origin, 0).unwrap(), "31NAA");

    let back = mgrs.convert_to_geodetic(&mgrs.convert_from_geodetic(&origin, 5).unwrap()).unwrap();
    assert!(origin.haversine(&back) < 1.5);
}

#[test]
fn no_i_or_o_in_output() {
    let mgrs = wgs84();

    let mut lon = -180.0;
    while lon < 180.0 {
        let mut lat = -90.0;
        while lat <= 90.0 {
            let grid = mgrs.convert_from_geodetic(&LatLon::from_degrees(lat, lon), 0).unwrap();
            assert!(!grid.contains(|c| c == 'I' || c == 'O'), "{grid} at {lat} {lon}");
            lat += 0.25;
        }
        lon += 1.0;
    }
}

#[test]
fn round_trip_sweep() {
    let mgrs = wgs84();

    let mut converted = 0;
    let mut lon = -190.0;
    while lon < 190.0 {
        let mut lat = -100.0;
        while lat < 100.0 {
            let point = LatLon::from_degrees(lat, lon);
            if let Ok(grid) = mgrs.convert_from_geodetic(&point, 5) {
                let back = mgrs
                    .convert_to_geodetic(&grid)
                    .unwrap_or_else(|e| panic!("round trip failed at {point} ({grid}): {e}"));
                let dist = point.haversine(&back);
                assert!(dist < 1.5, "{point} ({grid}) came back as {back}, {dist} m away");
                converted += 1;
            }
            lat += 0.5;
        }
        lon += 0.5;
    }

    assert!(converted > 250_000);
}

/// Pads to two big-endian `f64` bit patterns, latitude then longitude, in
/// radians. Any point that encodes must decode.
fn fuzz(mgrs: &MgrsConverter, data: &[u8]) -> bool {
    let mut bytes = [0u8; 16];
    let n = data.len().min(16);
    bytes[..n].copy_from_slice(&data[..n]);

    let lat = f64::from_be_bytes(bytes[..8].try_into().unwrap());
    let lon = f64::from_be_bytes(bytes[8..].try_into().unwrap());
    let point = LatLon::new(lat, lon);

    let Ok(grid) = mgrs.convert_from_geodetic(&point, 5) else {
        return false;
    };
    let back = mgrs
        .convert_to_geodetic(&grid)
        .unwrap_or_else(|e| panic!("round trip failed at {lat} {lon} ({grid}): {e}"));
    assert!(point.haversine(&back) < 1.5, "{grid} came back as {back}");
    true
}

#[test]
fn fuzz_crashers() {
    let mgrs = wgs84();
    let crashers: [&[u8]; 4] = [b"00000000\xff\xff", b"\xff\xff", b"00000000\x7f\xff", b"\x7f\xff"];
    for data in crashers {
        assert!(!fuzz(&mgrs, data));
    }
}

struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    /// Uniform in `[low, high)`.
    fn range(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * ((self.next() >> 11) as f64 / (1u64 << 53) as f64)
    }
}

#[test]
fn fuzz_raw_bits() {
    let mgrs = wgs84();
    let mut rng = XorShift(0x2545_f491_4f6c_dd1d);

    for _ in 0..20_000 {
        let mut data = [0u8; 16];
        data[..8].copy_from_slice(&rng.next().to_be_bytes());
        data[8..].copy_from_slice(&rng.next().to_be_bytes());
        fuzz(&mgrs, &data);
    }
}

#[test]
fn fuzz_valid_points() {
    let mgrs = wgs84();
    let mut rng = XorShift(0x9e37_79b9_7f4a_7c15);

    let mut converted = 0;
    for _ in 0..20_000 {
        let lat = rng.range(-90.0, 90.0).to_radians();
        let lon = rng.range(-180.0, 180.0).to_radians();
        let mut data = [0u8; 16];
        data[..8].copy_from_slice(&lat.to_be_bytes());
        data[8..].copy_from_slice(&lon.to_be_bytes());
        if fuzz(&mgrs, &data) {
            converted += 1;
        }
    }

    assert_eq!(converted, 20_000);
}

#[test]
fn concurrent_use_matches_serial() {
    let mgrs = Arc::new(wgs84());

    let points: Vec<LatLon> = (0..400)
        .map(|i| {
            let i = f64::from(i);
            LatLon::from_degrees(-89.5 + (i * 7.3) % 179.0, -179.5 + (i * 13.7) % 359.0)
        })
        .collect();
    let serial: Vec<String> = points
        .iter()
        .map(|p| mgrs.convert_from_geodetic(p, 5).unwrap())
        .collect();

    let points = Arc::new(points);
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let mgrs = Arc::clone(&mgrs);
            let points = Arc::clone(&points);
            thread::spawn(move || {
                points
                    .iter()
                    .map(|p| {
                        let grid = mgrs.convert_from_geodetic(p, 5).unwrap();
                        mgrs.convert_to_geodetic(&grid).unwrap();
                        grid
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), serial);
    }
}
