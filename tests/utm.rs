use gridref::{Ellipsoid, Error, ErrorKind, Hemisphere, LatLon, UtmConverter, UtmCoord};

#[test]
fn new_york() {
    let utm = UtmConverter::wgs84().unwrap();
    let coord = utm
        .convert_from_geodetic(&LatLon::from_degrees(40.748333, -73.985278), 0)
        .unwrap();

    // Reference values from GeographicLib
    assert_eq!(coord.zone(), 18);
    assert_eq!(coord.hemisphere(), Hemisphere::North);
    assert!((coord.easting() - 585664.121).abs() < 1e-3);
    assert!((coord.northing() - 4511315.422).abs() < 1e-3);
}

#[test]
fn southern_hemisphere_has_false_northing() {
    let utm = UtmConverter::wgs84().unwrap();
    let sydney = utm
        .convert_from_geodetic(&LatLon::from_degrees(-33.8688, 151.2093), 0)
        .unwrap();

    assert_eq!(sydney.zone(), 56);
    assert_eq!(sydney.hemisphere(), Hemisphere::South);
    assert!((6_200_000.0..6_300_000.0).contains(&sydney.northing()));
    assert!(sydney.easting() < 500_000.0);
}

#[test]
fn just_below_equator_snaps_north() {
    let utm = UtmConverter::wgs84().unwrap();
    let coord = utm.convert_from_geodetic(&LatLon::new(-1.0e-10, 0.0), 0).unwrap();

    assert_eq!(coord.hemisphere(), Hemisphere::North);
    assert!(coord.northing().abs() < 1e-6);
}

#[test]
fn zone_edges() {
    let utm = UtmConverter::wgs84().unwrap();
    let zone = |lat: f64, lon: f64| {
        utm.convert_from_geodetic(&LatLon::from_degrees(lat, lon), 0)
            .unwrap()
            .zone()
    };

    assert_eq!(zone(0.0, 0.0), 31);
    assert_eq!(zone(0.0, 6.0), 32);
    assert_eq!(zone(0.0, 5.999), 31);
    assert_eq!(zone(0.0, -180.0), 1);
    assert_eq!(zone(0.0, 180.0), 1);
    assert_eq!(zone(0.0, 179.9), 60);
    assert_eq!(zone(0.0, 359.0), 30);
    assert_eq!(zone(10.0, -0.5), 30);
}

#[test]
fn norway_and_svalbard_exceptions() {
    let utm = UtmConverter::wgs84().unwrap();
    let zone = |lat: f64, lon: f64| {
        utm.convert_from_geodetic(&LatLon::from_degrees(lat, lon), 0)
            .unwrap()
            .zone()
    };

    // Bergen sits in the widened zone 32
    assert_eq!(zone(60.39, 5.32), 32);
    assert_eq!(zone(60.0, 2.5), 31);
    // South of the exception the grid is regular
    assert_eq!(zone(55.5, 5.32), 31);

    assert_eq!(zone(78.0, 8.5), 31);
    assert_eq!(zone(78.0, 9.5), 33);
    assert_eq!(zone(78.0, 20.5), 33);
    assert_eq!(zone(78.0, 21.5), 35);
    assert_eq!(zone(78.0, 32.5), 35);
    assert_eq!(zone(78.0, 33.5), 37);
    assert_eq!(zone(78.0, 41.5), 37);
    assert_eq!(zone(78.0, 42.5), 38);
}

#[test]
fn call_override_beats_instance_override() {
    let utm = UtmConverter::with_override(&Ellipsoid::wgs84(), 30).unwrap();
    let point = LatLon::from_degrees(70.0, 3.0);

    assert_eq!(utm.convert_from_geodetic(&point, 0).unwrap().zone(), 30);
    assert_eq!(utm.convert_from_geodetic(&point, 32).unwrap().zone(), 32);
}

#[test]
fn override_must_be_adjacent() {
    let utm = UtmConverter::wgs84().unwrap();
    let point = LatLon::from_degrees(70.0, 3.0);

    assert!(utm.convert_from_geodetic(&point, 30).is_ok());
    assert!(utm.convert_from_geodetic(&point, 31).is_ok());
    assert!(matches!(
        utm.convert_from_geodetic(&point, 33),
        Err(Error::InvalidZone { zone: 33, .. })
    ));
    assert!(matches!(
        utm.convert_from_geodetic(&point, 61),
        Err(Error::InvalidZone { zone: 61, .. })
    ));

    // Zones 1 and 60 are neighbours
    let antimeridian = LatLon::from_degrees(0.0, 179.9);
    let coord = utm.convert_from_geodetic(&antimeridian, 1).unwrap();
    assert_eq!(coord.zone(), 1);
    assert!(coord.easting() < 500_000.0);
}

#[test]
fn override_disables_exceptions() {
    let utm = UtmConverter::wgs84().unwrap();
    let bergen = LatLon::from_degrees(60.39, 5.32);

    assert_eq!(utm.convert_from_geodetic(&bergen, 31).unwrap().zone(), 31);
}

#[test]
fn latitude_limits() {
    let utm = UtmConverter::wgs84().unwrap();
    let convert = |lat: f64| utm.convert_from_geodetic(&LatLon::from_degrees(lat, 10.0), 0);

    assert!(convert(84.4).is_ok());
    assert!(convert(-80.4).is_ok());
    assert!(matches!(convert(84.6), Err(Error::InvalidLatitude(_))));
    assert!(matches!(convert(-80.6), Err(Error::InvalidLatitude(_))));

    let err = convert(95.0).unwrap_err();
    assert!(matches!(err, Error::InvalidLatitude(_)));
    assert_eq!(err.kind(), ErrorKind::Range);

    assert!(convert(f64::NAN).is_err());
}

#[test]
fn longitude_limits() {
    let utm = UtmConverter::wgs84().unwrap();
    let convert = |lon: f64| utm.convert_from_geodetic(&LatLon::from_degrees(10.0, lon), 0);

    assert!(convert(-180.0).is_ok());
    assert!(convert(360.0).is_ok());
    assert!(matches!(convert(-181.0), Err(Error::InvalidLongitude(_))));
    assert!(matches!(convert(361.0), Err(Error::InvalidLongitude(_))));
    assert!(convert(f64::NAN).is_err());
}

#[test]
fn inverse_validates_input() {
    let utm = UtmConverter::wgs84().unwrap();

    let bad_zone = UtmCoord::new(0, Hemisphere::North, 500_000.0, 0.0);
    assert!(matches!(utm.convert_to_geodetic(&bad_zone), Err(Error::InvalidZone { zone: 0, .. })));

    let bad_easting = UtmCoord::new(31, Hemisphere::North, 99_999.0, 0.0);
    assert!(matches!(utm.convert_to_geodetic(&bad_easting), Err(Error::InvalidEasting(_))));

    let bad_northing = UtmCoord::new(31, Hemisphere::South, 500_000.0, 10_000_001.0);
    assert!(matches!(utm.convert_to_geodetic(&bad_northing), Err(Error::InvalidNorthing(_))));

    // Close to the pole in a northern zone, beyond 84.5 degrees
    let too_far_north = UtmCoord::new(31, Hemisphere::North, 500_000.0, 9_500_000.0);
    assert!(matches!(utm.convert_to_geodetic(&too_far_north), Err(Error::InvalidLatitude(_))));
}

#[test]
fn rejects_bad_ellipsoids() {
    assert!(UtmConverter::new(&Ellipsoid::new(0.0, 1.0 / 298.257223563, "WE")).is_err());
    assert!(UtmConverter::new(&Ellipsoid::new(6_378_137.0, 1.0 / 249.0, "ZZ")).is_err());
    assert!(UtmConverter::new(&Ellipsoid::new(6_378_137.0, 1.0 / 351.0, "ZZ")).is_err());
    assert!(UtmConverter::with_override(&Ellipsoid::wgs84(), -1).is_err());
}

#[test]
fn projection_per_zone() {
    let utm = UtmConverter::wgs84().unwrap();

    let tm = utm.projection(31).unwrap();
    assert!((tm.central_meridian().to_degrees() - 3.0).abs() < 1e-12);
    assert_eq!(tm.scale_factor(), 0.9996);
    assert_eq!(tm.false_easting(), 500_000.0);

    assert!((utm.projection(1).unwrap().central_meridian().to_degrees() + 177.0).abs() < 1e-12);
    assert!(utm.projection(0).is_none());
    assert!(utm.projection(61).is_none());
}

#[test]
fn round_trip_sweep() {
    let utm = UtmConverter::wgs84().unwrap();

    let mut converted = 0;
    let mut lon = -190.0;
    while lon < 190.0 {
        let mut lat = -100.0;
        while lat < 100.0 {
            let point = LatLon::from_degrees(lat, lon);
            if let Ok(coord) = utm.convert_from_geodetic(&point, 0) {
                let back = utm
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

    assert!(converted > 200_000);
}
