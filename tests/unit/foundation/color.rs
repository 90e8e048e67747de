use super::*;
use serde_json::json;

#[test]
fn parse_is_case_insensitive_and_canonical() {
    let a = Hex::parse("#FF8800").unwrap();
    let b = Hex::parse("ff8800").unwrap();
    let c: Hex = " #Ff8800 ".parse().unwrap();
    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_eq!(a.to_string(), "#ff8800");
}

#[test]
fn parse_rejects_bad_input() {
    assert!(Hex::parse("#fff").is_err());
    assert!(Hex::parse("#gg0000").is_err());
    assert!(Hex::parse("#ff00001").is_err());
    assert!(Hex::parse("#ff00é").is_err());
    assert!(Hex::parse("#+f+f+f").is_err());
    assert!(Hex::parse("+f+f+f").is_err());
}

#[test]
fn quantized_colors_survive_the_hex_trip() {
    for r in (0u8..=255).step_by(17) {
        for g in [0u8, 1, 127, 128, 254, 255] {
            let b = r.wrapping_mul(3);
            let rgba = Rgba::new(
                f64::from(r) / 255.0,
                f64::from(g) / 255.0,
                f64::from(b) / 255.0,
                1.0,
            );
            let back = rgba.to_hex().to_rgba().to_hex();
            assert_eq!(back.rgb8(), [r, g, b]);
        }
    }
}

#[test]
fn to_hex_rounds_and_clamps() {
    assert_eq!(Rgba::new(0.5, 0.0, 1.0, 1.0).to_hex().to_string(), "#8000ff");
    assert_eq!(Rgba::new(-0.2, 1.7, 0.0, 1.0).to_hex().to_string(), "#00ff00");
}

#[test]
fn recolored_keeps_alpha() {
    let c = Rgba::new(0.1, 0.2, 0.3, 0.25);
    let out = c.recolored(Hex::parse("#ffffff").unwrap());
    assert_eq!(out, Rgba::new(1.0, 1.0, 1.0, 0.25));
}

#[test]
fn distance_is_a_percentage_of_the_rgb_cube_diagonal() {
    let black = Hex::parse("#000000").unwrap();
    let white = Hex::parse("#ffffff").unwrap();
    let near = Hex::parse("#010101").unwrap();
    assert!((black.distance_percent(white) - 100.0).abs() < 0.01);
    assert!(black.is_similar(near, 1.0));
    assert!(!black.is_similar(white, 99.0));
}

#[test]
fn hex_serde_uses_canonical_string() {
    let h: Hex = serde_json::from_value(json!("#ABCDEF")).unwrap();
    assert_eq!(serde_json::to_value(h).unwrap(), json!("#abcdef"));
    assert!(serde_json::from_value::<Hex>(json!("nope")).is_err());
}

#[test]
fn rgba_deserializes_from_arrays_and_hex() {
    let c: Rgba = serde_json::from_value(json!([0.25, 0.5, 0.75])).unwrap();
    assert_eq!(c, Rgba::new(0.25, 0.5, 0.75, 1.0));

    let c: Rgba = serde_json::from_value(json!([0.25, 0.5, 0.75, 0.5])).unwrap();
    assert_eq!(c.alpha(), 0.5);

    let c: Rgba = serde_json::from_value(json!("#ff0000")).unwrap();
    assert_eq!(c, Rgba::new(1.0, 0.0, 0.0, 1.0));

    assert!(serde_json::from_value::<Rgba>(json!([1.0])).is_err());
}
