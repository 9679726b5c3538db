use safrasphere::geo::{Coordinates, haversine_km};

const KARUR: Coordinates = Coordinates::new(10.9601, 78.0766);

#[test]
fn distance_is_symmetric_and_zero_at_origin() {
    let chennai = Coordinates::new(13.0827, 80.2707);
    assert_eq!(haversine_km(KARUR, KARUR), 0.0);
    let there = haversine_km(KARUR, chennai);
    let back = haversine_km(chennai, KARUR);
    assert!((there - back).abs() < 1e-9);
    // Roughly 335 km as the crow flies
    assert!((330.0..340.0).contains(&there), "got {there}");
}

#[test]
fn one_degree_of_latitude_is_about_111_km() {
    let north = Coordinates::new(KARUR.lat + 1.0, KARUR.lon);
    assert!((KARUR.distance_km(&north) - 111.19).abs() < 0.1);
}

#[test]
fn antipodes_do_not_produce_nan() {
    let a = Coordinates::new(0.0, 0.0);
    let b = Coordinates::new(0.0, 180.0);
    let d = haversine_km(a, b);
    assert!(d.is_finite());
    assert!((d - 20_015.1).abs() < 1.0);
}
