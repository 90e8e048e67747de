//! Shared project fixtures for unit tests.

use serde_json::{Value, json};

use crate::document::project::Project;

pub(crate) fn fill(name: &str, color: Value, extra: Value) -> Value {
    let mut prop = json!({
        "node": "property", "name": "Color", "matchName": "ADBE Vector Fill Color",
        "valueType": "color", "value": color
    });
    merge(&mut prop, extra);
    json!({
        "node": "group", "name": name, "matchName": "ADBE Vector Graphic - Fill",
        "children": [prop]
    })
}

pub(crate) fn stroke(name: &str, color: Value) -> Value {
    json!({
        "node": "group", "name": name, "matchName": "ADBE Vector Graphic - Stroke",
        "children": [{
            "node": "property", "name": "Color", "matchName": "ADBE Vector Stroke Color",
            "valueType": "color", "value": color
        }]
    })
}

pub(crate) fn shape_group(name: &str, children: Vec<Value>) -> Value {
    json!({
        "node": "group", "name": name, "matchName": "ADBE Vector Group",
        "children": children
    })
}

fn merge(target: &mut Value, extra: Value) {
    if let (Some(t), Value::Object(e)) = (target.as_object_mut(), extra) {
        t.extend(e);
    }
}

/// Two compositions exercising every color location.
///
/// Main (id 1):
/// 1. `BG` solid `#ff0000`, selected
/// 2. `Title` text, fill `#ffffff`, stroke `#000000`
/// 3. `Shapes` fill `#ff0000` (alpha 0.5), stroke `#000000`, nested fill `#010101`
/// 4. `Driven` expression-driven fill `#ff0000`
/// 5. `Animated` keyed fill `#ff0000 / #00ff00 / #ff0000` at `0, 1.005, 2`
/// 6. `FX` effect `Glow`: color `#00ff00`, nested group color `#0000ff`, a scalar
/// 7. `Nested` precomp of Inner, locked
///
/// Inner (id 2): `Badge` locked solid `#ff0000`.
pub(crate) fn studio() -> Project {
    let project = json!({
        "activeComp": 1,
        "items": [
            {
                "id": 1,
                "name": "Main",
                "layers": [
                    { "name": "BG", "selected": true,
                      "source": { "kind": "solid", "color": [1.0, 0.0, 0.0] } },
                    { "name": "Title",
                      "text": { "document": { "fillColor": "#ffffff", "strokeColor": "#000000" } } },
                    { "name": "Shapes", "contents": [
                        shape_group("Shape 1", vec![
                            fill("Fill 1", json!([1.0, 0.0, 0.0, 0.5]), json!({})),
                            stroke("Stroke 1", json!("#000000")),
                            shape_group("Inner", vec![
                                fill("Fill 2", json!("#010101"), json!({})),
                            ]),
                        ])
                    ] },
                    { "name": "Driven", "contents": [
                        fill("Fill 1", json!("#ff0000"), json!({ "expressionEnabled": true }))
                    ] },
                    { "name": "Animated", "contents": [
                        shape_group("Pulse", vec![
                            fill("Fill 1", json!("#ff0000"), json!({ "keys": [
                                { "time": 0.0, "value": [1.0, 0.0, 0.0, 0.8] },
                                { "time": 1.005, "value": "#00ff00" },
                                { "time": 2.0, "value": "#ff0000" }
                            ] })),
                        ])
                    ] },
                    { "name": "FX", "effects": [{
                        "node": "group", "name": "Glow", "matchName": "ADBE Glo2",
                        "children": [
                            { "node": "property", "name": "Color A", "matchName": "ADBE Glo2-0010",
                              "valueType": "color", "value": "#00ff00" },
                            { "node": "property", "name": "Radius", "matchName": "ADBE Glo2-0003",
                              "valueType": "oneD", "value": 10.0 },
                            { "node": "group", "name": "Advanced", "matchName": "ADBE Glo2-Adv",
                              "children": [
                                { "node": "property", "name": "Color B", "matchName": "ADBE Glo2-0011",
                                  "valueType": "color", "value": "#0000ff" }
                              ] }
                        ]
                    }] },
                    { "name": "Nested", "locked": true, "source": { "kind": "comp", "id": 2 } }
                ]
            },
            {
                "id": 2,
                "name": "Inner",
                "layers": [
                    { "name": "Badge", "locked": true,
                      "source": { "kind": "solid", "color": "#ff0000" } }
                ]
            }
        ]
    });
    let project: Project = serde_json::from_value(project).unwrap();
    project.validate().unwrap();
    project
}

/// Two comps nested inside each other; `validate` would reject it.
pub(crate) fn looped() -> Project {
    serde_json::from_value(json!({
        "activeComp": 1,
        "items": [
            { "id": 1, "name": "Outer", "layers": [
                { "name": "Top", "source": { "kind": "solid", "color": "#ff0000" } },
                { "name": "Loop", "source": { "kind": "comp", "id": 2 } }
            ] },
            { "id": 2, "name": "Inner", "layers": [
                { "name": "Deep", "source": { "kind": "solid", "color": "#ff0000" } },
                { "name": "Back", "source": { "kind": "comp", "id": 1 } }
            ] }
        ]
    }))
    .unwrap()
}

pub(crate) fn hex(s: &str) -> crate::foundation::color::Hex {
    crate::foundation::color::Hex::parse(s).unwrap()
}
