use gridref::{Ellipsoid, Error, ErrorKind, Hemisphere, LatLon, UpsConverter, UpsCoord};

const FALSE_ORIGIN: f64 = 2_000_000.0;

#[test]
fn poles_map_to_false_origin() {
    let ups = UpsConverter::wgs84().unwrap();

    for (lat, hemisphere) in [(90.0, Hemisphere::North), (-90.0, Hemisphere::South)] {
        let coord = ups.convert_from_geodetic(&LatLon::from_degrees(lat, 45.0)).unwrap();
        assert_eq!(coord.hemisphere(), hemisphere);
        assert_eq!(coord.easting(), FALSE_ORIGIN);
        assert_eq!(coord.northing(), FALSE_ORIGIN);
    }
}

#[test]
fn cap_limits() {
    let ups = UpsConverter::wgs84().unwrap();
    let convert = |lat: f64| ups.convert_from_geodetic(&LatLon::from_degrees(lat, 0.0));

    assert!(convert(83.5).is_ok());
    assert!(convert(-79.5).is_ok());
    assert!(convert(-80.0).is_ok());
    assert!(matches!(convert(83.0), Err(Error::InvalidLatitude(_))));
    assert!(matches!(convert(-79.0), Err(Error::InvalidLatitude(_))));
    assert!(matches!(convert(0.0), Err(Error::InvalidLatitude(_))));

    let err = convert(91.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);
    assert!(convert(f64::NAN).is_err());
}

#[test]
fn longitude_limits() {
    let ups = UpsConverter::wgs84().unwrap();
    let convert = |lon: f64| ups.convert_from_geodetic(&LatLon::from_degrees(85.0, lon));

    assert!(convert(-180.0).is_ok());
    assert!(convert(360.0).is_ok());
    assert!(matches!(convert(-181.0), Err(Error::InvalidLongitude(_))));
    assert!(matches!(convert(361.0), Err(Error::InvalidLongitude(_))));
}

#[test]
fn north_aspect_orientation() {
    let ups = UpsConverter::wgs84().unwrap();
    let convert = |lon: f64| ups.convert_from_geodetic(&LatLon::from_degrees(85.0, lon)).unwrap();

    let prime = convert(0.0);
    let east = convert(90.0);
    let anti = convert(180.0);

    // Prime meridian points down the grid, 90E to the right
    let rho = FALSE_ORIGIN - prime.northing();
    assert!(rho > 500_000.0 && rho < 600_000.0);
    assert!((prime.easting() - FALSE_ORIGIN).abs() < 1e-6);
    assert!((east.easting() - (FALSE_ORIGIN + rho)).abs() < 1e-6);
    assert!((east.northing() - FALSE_ORIGIN).abs() < 1e-6);
    assert!((anti.easting() - FALSE_ORIGIN).abs() < 1e-6);
    assert!((anti.northing() - (FALSE_ORIGIN + rho)).abs() < 1e-6);
}

#[test]
fn south_aspect_orientation() {
    let ups = UpsConverter::wgs84().unwrap();
    let convert = |lon: f64| ups.convert_from_geodetic(&LatLon::from_degrees(-85.0, lon)).unwrap();

    let prime = convert(0.0);
    let east = convert(90.0);

    // Prime meridian points up the grid, 90E still to the right
    let rho = prime.northing() - FALSE_ORIGIN;
    assert!(rho > 500_000.0 && rho < 600_000.0);
    assert!((prime.easting() - FALSE_ORIGIN).abs() < 1e-6);
    assert!((east.easting() - (FALSE_ORIGIN + rho)).abs() < 1e-6);
    assert!((east.northing() - FALSE_ORIGIN).abs() < 1e-6);
}

#[test]
fn inverse_validates_input() {
    let ups = UpsConverter::wgs84().unwrap();

    let coord = UpsCoord::new(Hemisphere::North, -1.0, FALSE_ORIGIN);
    assert!(matches!(ups.convert_to_geodetic(&coord), Err(Error::InvalidEasting(_))));

    let coord = UpsCoord::new(Hemisphere::South, FALSE_ORIGIN, 4_000_001.0);
    assert!(matches!(ups.convert_to_geodetic(&coord), Err(Error::InvalidNorthing(_))));

    // Far corner of the grid is well outside the cap
    let coord = UpsCoord::new(Hemisphere::South, 0.0, 0.0);
    assert!(matches!(ups.convert_to_geodetic(&coord), Err(Error::InvalidLatitude(_))));
}

#[test]
fn rejects_bad_ellipsoids() {
    assert!(UpsConverter::new(&Ellipsoid::new(-1.0, 1.0 / 298.257223563, "WE")).is_err());
    assert!(UpsConverter::new(&Ellipsoid::new(6_378_137.0, 1.0 / 200.0, "ZZ")).is_err());
    assert!(UpsConverter::new(&Ellipsoid::new(6_378_206.4, 1.0 / 294.9786982, "CC")).is_ok());
}

#[test]
fn round_trip_sweep() {
    let ups = UpsConverter::wgs84().unwrap();

    let mut converted = 0;
    let mut lon = -190.0;
    while lon < 190.0 {
        let mut lat = -100.0;
        while lat < 100.0 {
            let point = LatLon::from_degrees(lat, lon);
            if let Ok(coord) = ups.convert_from_geodetic(&point) {
                let back = ups
                    .convert_to_geodetic(&coord)
                    .unwrap_or_else(|e| panic!("round trip failed at {point} ({coord}): {e}"));
                let dist = point.haversine(&back);
                assert!(dist < 1e-2, "{point} came back as {back}, {dist} m away");
                converted += 1;
            }
            lat += 0.5;
        }
        lon += 0.5;
    }

    assert!(converted > 20_000);
}
