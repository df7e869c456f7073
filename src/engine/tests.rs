use crate::engine::{PerturbedSample, RuleTransformer, TransformDeriver, parse_text, produce_lines, resolve_format};
use crate::units::LengthUnit;
use crate::{Axis, MeshItem, Transformation};

const CUBE_OBJ: &str = "\
# Blender v2.79 OBJ File
mtllib cube.mtl
o Cube
g top
v 1.000000 1.000000 1.000000
v -1.000000 1.000000 1.000000
g bottom
v 1.000000 -1.000000 -1.000000
v -1.000000 -1.000000 -1.000000
vn 0.0000 1.0000 0.0000
usemtl Material
s off
f 1//1 2//1 \\
 3//1 4//1
";

const CUBE_STL: &str = "\
solid cube
  facet normal 0 0 1
    outer loop
      vertex 0 0 1
      vertex 1 0 1
      vertex 1 1 1
    endloop
  endfacet
endsolid cube
";

#[test]
fn unrecognized_lines_pass_through_verbatim() {
    // (format, physical line, expected pass-through text)
    let cases: Vec<(&str, &str, &str)> = vec![
        ("obj", "vn 0.0 1.0 0.0", "vn 0.0 1.0 0.0"),
        ("obj", "vt 0.5 0.5", "vt 0.5 0.5"),
        ("obj", "  f 1/1/1 2/2/2 3/3/3  ", "f 1/1/1 2/2/2 3/3/3"),
        ("obj", "# exported by hand", "# exported by hand"),
        ("obj", "usemtl wood", "usemtl wood"),
        ("obj", "o Table", "o Table"),
        ("obj", "vertex 1 2 3", "vertex 1 2 3"),
        ("obj", "groups are not g lines", "groups are not g lines"),
        ("stl", "solid table", "solid table"),
        ("stl", "\tfacet normal 0 0 -1\r", "facet normal 0 0 -1"),
        ("stl", "outer loop", "outer loop"),
        ("stl", "v 1 2 3", "v 1 2 3"),
        ("stl", "g legs", "g legs"),
        ("stl", "endsolid table", "endsolid table"),
    ];

    for (format, input, expected) in cases {
        let items = parse_text(input, resolve_format(format).unwrap(), "source").unwrap();
        assert_eq!(
            items,
            vec![MeshItem::Pass { line: expected.to_string() }],
            "line {input:?} in format {format} should pass through"
        );
    }
}

#[test]
fn every_logical_line_yields_one_item() {
    for (format, text) in [("obj", CUBE_OBJ), ("stl", CUBE_STL)] {
        let items = parse_text(text, resolve_format(format).unwrap(), "source").unwrap();
        assert_eq!(items.len(), produce_lines(text).count(), "item count for {format}");
    }
}

#[test]
fn cube_obj_structure() {
    let items = parse_text(CUBE_OBJ, resolve_format("obj").unwrap(), "source.obj").unwrap();

    let layers: Vec<Option<&str>> = items.iter().filter_map(|i| i.as_vertex()).map(|v| v.layer.as_deref()).collect();
    assert_eq!(layers, vec![Some("top"), Some("top"), Some("bottom"), Some("bottom")]);
    assert_eq!(items.last(), Some(&MeshItem::Pass { line: "f 1//1 2//1 3//1 4//1".into() }));
}

#[test]
fn identical_perturbed_mesh_adds_no_transforms() {
    for (format, text) in [("obj", CUBE_OBJ), ("stl", CUBE_STL)] {
        let mesh = resolve_format(format).unwrap();
        let baseline = parse_text(text, mesh, "source").unwrap();
        let sample =
            PerturbedSample::new("width", 50.0, 51.0, LengthUnit::Centimeter, LengthUnit::Centimeter, baseline.clone())
                .unwrap();
        let deriver = TransformDeriver::new(vec![sample]);

        let derived: Vec<MeshItem> =
            deriver.derive(baseline.clone().into_iter().map(Ok)).collect::<Result<_, _>>().unwrap();
        assert_eq!(derived, baseline, "no-op derivation for {format}");
    }
}

#[test]
fn derived_factors() {
    // (base, perturbed, initial, comparison, units, expected factor)
    let cases: Vec<(f64, f64, f64, f64, LengthUnit, f64)> = vec![
        (3.0, 6.0, 3.0, 6.0, LengthUnit::Centimeter, 1.0),
        (0.0, 1.0, 10.0, 12.0, LengthUnit::Centimeter, 0.5),
        (4.0, 2.0, 1.0, 2.0, LengthUnit::Centimeter, -2.0),
        (0.0, 2.0, 10.0, 30.0, LengthUnit::Millimeter, 1.0),
        (5.0, 5.5, 100.0, 90.0, LengthUnit::Millimeter, -0.5),
    ];

    for (base, moved, initial, comparison, units, expected) in cases {
        let text = |z: f64| format!("v 0 0 {z}\n");
        let obj = resolve_format("obj").unwrap();
        let perturbed = parse_text(&text(moved), obj, "p.obj").unwrap();
        let sample = PerturbedSample::new("p", initial, comparison, units, LengthUnit::Centimeter, perturbed).unwrap();
        let deriver = TransformDeriver::new(vec![sample]);

        let baseline = parse_text(&text(base), obj, "source.obj").unwrap();
        let item = deriver.annotate(0, baseline[0].clone()).unwrap();
        let Some(Transformation::Axis(op)) = item.as_vertex().unwrap().transformations.get("z_by_p") else {
            panic!("no z transform for base {base} -> {moved}");
        };
        assert_eq!(op.axis, Axis::Z);
        approx::assert_relative_eq!(op.factor, expected, max_relative = 1e-9);
    }
}

#[test]
fn rules_on_a_parsed_mesh() {
    let config = crate::Config::from_json(
        r#"{
            "parameters": {},
            "transformations": {
                "lift_top": {"match": {"layers": ["to*"]}, "properties": {"z": 1}},
                "right_side": {"match": {"bounds": {"x": [0.5, 2.0]}}, "properties": {"x": 1}}
            }
        }"#,
    )
    .unwrap();
    let rules = RuleTransformer::new(&config.transformations).unwrap();
    let items = parse_text(CUBE_OBJ, resolve_format("obj").unwrap(), "source.obj").unwrap();

    let keys: Vec<Vec<String>> = items
        .into_iter()
        .map(|item| rules.annotate(item))
        .filter_map(|item| item.as_vertex().map(|v| v.transformations.keys().cloned().collect()))
        .collect();

    assert_eq!(keys, vec![vec!["lift_top", "right_side"], vec!["lift_top"], vec!["right_side"], vec![]]);
}
