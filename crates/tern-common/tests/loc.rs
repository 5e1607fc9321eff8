use tern_common::{Diagnostic, Loc, Located, Position};

#[test]
fn loc_merge_covers_both() {
    let a = Loc::on_line(1, 0, 5);
    let b = Loc::on_line(1, 3, 9);
    let merged = a.merge(b);
    assert_eq!(merged, Loc::on_line(1, 0, 9));
}

#[test]
fn loc_merge_across_lines() {
    let a = Loc::new(Position::new(2, 4), Position::new(2, 10));
    let b = Loc::new(Position::new(1, 0), Position::new(1, 3));
    let merged = a.merge(b);
    assert_eq!(merged.start, Position::new(1, 0));
    assert_eq!(merged.end, Position::new(2, 10));
}

#[test]
fn loc_contains_position() {
    let loc = Loc::on_line(1, 2, 8);
    assert!(loc.contains(Position::new(1, 2)));
    assert!(loc.contains(Position::new(1, 7)));
    assert!(!loc.contains(Position::new(1, 8)));
    assert!(!loc.contains(Position::new(2, 0)));
}

#[test]
fn loc_contains_loc() {
    let outer = Loc::new(Position::new(1, 0), Position::new(3, 0));
    let inner = Loc::on_line(2, 1, 4);
    assert!(outer.contains_loc(inner));
    assert!(!inner.contains_loc(outer));
}

#[test]
fn dummy_loc_is_recognized() {
    assert!(Loc::dummy().is_dummy());
    assert!(!Loc::on_line(1, 0, 1).is_dummy());
}

#[test]
fn display_is_stable() {
    let loc = Loc::new(Position::new(1, 4), Position::new(2, 0));
    assert_eq!(loc.to_string(), "1:4..2:0");
}

#[test]
fn located_trait_exposes_endpoints() {
    let loc = Loc::on_line(5, 2, 9);
    assert_eq!(loc.start(), Position::new(5, 2));
    assert_eq!(loc.end(), Position::new(5, 9));
}

#[test]
fn loc_deserializes_from_parser_shape() {
    let loc: Loc = serde_json::from_str(
        r#"{"start": {"line": 1, "column": 6}, "end": {"line": 1, "column": 7}}"#,
    )
    .unwrap();
    assert_eq!(loc, Loc::on_line(1, 6, 7));
}

#[test]
fn diagnostic_display_includes_loc() {
    let d = Diagnostic::error("Variable \"x\" is not defined", Loc::on_line(1, 0, 1));
    assert_eq!(d.to_string(), "Variable \"x\" is not defined at 1:0..1:1");
}
