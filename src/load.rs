//! Reading scenario documents from JSON.
//!
//! Only the document's outer shape is checked strictly. Everything inside a
//! check degrades to a permissive default instead of failing, because the
//! player must always be able to produce a verdict.

use serde_json::Value as Json;
use tracing::{debug, warn};

use crate::{
    all_of, Aim, AimCheck, Anchor, Clause, Expression, ExpressionNode, LegacyClause, LoadError,
    Operator, Rules, Ruleset, RulesetAnswer, Scenario,
};

impl Scenario {
    /// Build a scenario from a parsed JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the root is not an object, if `stage`,
    /// `devicePool`, `anchors`, `aims` or `rules` is missing, if `anchors`
    /// or `aims` is not an array, if `rules.checks` is present but not an
    /// array, if `rulesets` or one of its entries is malformed, or if the
    /// `audio` manifest names a clip that is not an `.mp3` or `.wav` path.
    pub fn from_json(doc: &Json) -> Result<Self, LoadError> {
        let obj = doc.as_object().ok_or(LoadError::NotAnObject)?;

        for field in ["stage", "devicePool", "anchors", "aims", "rules"] {
            if obj.get(field).map_or(true, Json::is_null) {
                return Err(LoadError::MissingField { field });
            }
        }
        let anchors = require_array(doc, "anchors")?;
        let aims = require_array(doc, "aims")?;
        check_audio(doc)?;

        let title = doc
            .pointer("/meta/title")
            .and_then(Json::as_str)
            .map(str::to_owned);
        let allowed_device_ids = doc
            .pointer("/devicePool/allowedDeviceIds")
            .and_then(Json::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Json::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let scenario = Scenario {
            title,
            aims: aims.iter().filter_map(parse_aim).collect(),
            anchors: anchors.iter().filter_map(parse_anchor).collect(),
            allowed_device_ids,
            rulesets: parse_rulesets(doc)?,
            rules: Rules::from_json(&doc["rules"])?,
        };
        debug!(
            aims = scenario.aims.len(),
            anchors = scenario.anchors.len(),
            checks = scenario.rules.checks.len(),
            "scenario loaded"
        );
        Ok(scenario)
    }

    /// Parse JSON text and build a scenario.
    ///
    /// # Errors
    ///
    /// Returns [`AimcheckError`](crate::AimcheckError) on invalid JSON or an
    /// invalid document shape.
    pub fn from_json_str(input: &str) -> Result<Self, crate::AimcheckError> {
        let doc: Json = serde_json::from_str(input)?;
        Ok(Self::from_json(&doc)?)
    }

    /// Read a scenario file.
    ///
    /// # Errors
    ///
    /// Returns [`AimcheckError`](crate::AimcheckError) on I/O failure,
    /// invalid JSON or an invalid document shape.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::AimcheckError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_json_str(&input)
    }
}

impl Rules {
    /// Build a rules section from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the value is not an object or `checks` is
    /// present but not an array.
    pub fn from_json(value: &Json) -> Result<Self, LoadError> {
        if !value.is_object() {
            return Err(LoadError::WrongType {
                field: "rules",
                expected: "an object",
            });
        }
        let checks = match value.get("checks") {
            None | Some(Json::Null) => Vec::new(),
            Some(Json::Array(items)) => items.iter().map(parse_check).collect(),
            Some(_) => {
                return Err(LoadError::WrongType {
                    field: "rules.checks",
                    expected: "an array",
                })
            }
        };
        Ok(Rules {
            require_connect_button: is_true(value.get("requireConnectButton")),
            checks,
        })
    }
}

fn require_array<'a>(doc: &'a Json, field: &'static str) -> Result<&'a Vec<Json>, LoadError> {
    doc[field].as_array().ok_or(LoadError::WrongType {
        field,
        expected: "an array",
    })
}

fn is_true(value: Option<&Json>) -> bool {
    matches!(value, Some(Json::Bool(true)))
}

fn string_field(value: &Json, field: &str) -> String {
    value
        .get(field)
        .and_then(Json::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn parse_rulesets(doc: &Json) -> Result<Vec<Ruleset>, LoadError> {
    match doc.get("rulesets") {
        None | Some(Json::Null) => Ok(Vec::new()),
        Some(Json::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| parse_ruleset(index, item))
            .collect(),
        Some(_) => Err(LoadError::WrongType {
            field: "rulesets",
            expected: "an array",
        }),
    }
}

fn parse_ruleset(index: usize, value: &Json) -> Result<Ruleset, LoadError> {
    if !value.is_object() {
        return Err(LoadError::RulesetNotAnObject { index });
    }
    let optional_string = |field: &'static str| match value.get(field) {
        None | Some(Json::Null) => Ok(None),
        Some(Json::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(LoadError::RulesetField {
            index,
            field,
            expected: "a string",
        }),
    };
    let correct = match value.get("correct") {
        None | Some(Json::Null) => None,
        Some(Json::Bool(flag)) => Some(RulesetAnswer::Flag(*flag)),
        Some(Json::String(s)) => Some(RulesetAnswer::Text(s.clone())),
        Some(Json::Number(n)) => Some(RulesetAnswer::Number(n.as_f64().unwrap_or_default())),
        Some(_) => {
            return Err(LoadError::RulesetField {
                index,
                field: "correct",
                expected: "a boolean, string or number",
            })
        }
    };
    Ok(Ruleset {
        id: optional_string("id")?,
        text: optional_string("text")?,
        correct,
    })
}

/// Shape check of the optional audio manifest. Clips are not kept.
fn check_audio(doc: &Json) -> Result<(), LoadError> {
    let Some(audio) = doc.get("audio") else {
        return Ok(());
    };
    require_object(audio, "audio")?;
    check_clip(audio.get("placement"), "audio.placement")?;
    if let Some(aims) = audio.get("aims") {
        require_object(aims, "audio.aims")?;
        check_clip(aims.get("pass"), "audio.aims.pass")?;
        check_clip(aims.get("fail"), "audio.aims.fail")?;
    }
    if let Some(rulesets) = audio.get("rulesets") {
        require_object(rulesets, "audio.rulesets")?;
        check_clip(rulesets.get("pass"), "audio.rulesets.pass")?;
        check_clip(rulesets.get("fail"), "audio.rulesets.fail")?;
    }
    Ok(())
}

fn require_object(value: &Json, field: &'static str) -> Result<(), LoadError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(LoadError::WrongType {
            field,
            expected: "an object",
        })
    }
}

/// A clip is absent, `null`, or a path ending in `.mp3` or `.wav`.
fn check_clip(value: Option<&Json>, field: &'static str) -> Result<(), LoadError> {
    let ok = match value {
        None | Some(Json::Null) => true,
        Some(Json::String(path)) => {
            let path = path.trim().to_ascii_lowercase();
            path.ends_with(".mp3") || path.ends_with(".wav")
        }
        Some(_) => false,
    };
    if ok {
        Ok(())
    } else {
        Err(LoadError::AudioClip { field })
    }
}

fn parse_aim(value: &Json) -> Option<Aim> {
    let id = value.get("id")?.as_str()?;
    Some(Aim {
        id: id.to_owned(),
        text: string_field(value, "text"),
    })
}

fn parse_anchor(value: &Json) -> Option<Anchor> {
    let id = value.get("id")?.as_str()?;
    Some(Anchor {
        id: id.to_owned(),
        x: value.get("x").and_then(Json::as_f64).unwrap_or(0.0),
        y: value.get("y").and_then(Json::as_f64).unwrap_or(0.0),
    })
}

fn parse_check(value: &Json) -> AimCheck {
    if !value.is_object() {
        // Kept as an empty check so later checks keep their positions.
        warn!("rule check is not an object; it has no requirements");
        return AimCheck::default();
    }
    let required_placements = value
        .get("requiredPlacements")
        .and_then(Json::as_array)
        .map(|items| items.iter().map(parse_clause).collect())
        .unwrap_or_default();
    AimCheck {
        aim_id: string_field(value, "aimId"),
        connected_required: is_true(value.get("connectedRequired")),
        expression: value.get("expression").and_then(parse_expression),
        required_placements,
    }
}

fn parse_expression(value: &Json) -> Option<Expression> {
    match value {
        Json::Array(items) if !items.is_empty() => {
            let clauses: Vec<LegacyClause> = items
                .iter()
                .filter(|item| !item.is_null())
                .map(parse_legacy_clause)
                .collect();
            if clauses.is_empty() {
                // Only nulls: the fold sees no clause and passes, ignoring
                // requiredPlacements.
                return Some(Expression::Tree(all_of(Vec::new())));
            }
            Some(Expression::Legacy(clauses))
        }
        Json::Object(_) => Some(Expression::Tree(parse_node(value))),
        _ => None,
    }
}

fn parse_legacy_clause(value: &Json) -> LegacyClause {
    LegacyClause {
        operator: value
            .get("operator")
            .and_then(Json::as_str)
            .map(Operator::from_str_lossy),
        device_id: string_field(value, "deviceId"),
        anchor_id: string_field(value, "anchorId"),
    }
}

fn parse_clause(value: &Json) -> Clause {
    Clause::new(string_field(value, "deviceId"), string_field(value, "anchorId"))
}

fn parse_node(value: &Json) -> ExpressionNode {
    match value.get("type").and_then(Json::as_str) {
        Some("clause") => ExpressionNode::Clause(parse_clause(value)),
        Some("group") => {
            let operator = value
                .get("operator")
                .and_then(Json::as_str)
                .map(Operator::from_str_lossy)
                .unwrap_or_default();
            let children = value
                .get("children")
                .and_then(Json::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter(|item| !item.is_null())
                        .map(parse_node)
                        .collect()
                })
                .unwrap_or_default();
            ExpressionNode::Group { operator, children }
        }
        other => {
            warn!(node_type = ?other, "unrecognized expression node; it will never match");
            ExpressionNode::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{all_of, any_of, clause};

    fn minimal(rules: Json) -> Json {
        json!({
            "stage": {"background": "bg.png"},
            "devicePool": {"allowedDeviceIds": ["lamp", "fan"]},
            "anchors": [{"id": "desk", "x": 0.25, "y": 0.5}],
            "aims": [{"id": "light", "text": "Light the desk"}],
            "rules": rules,
        })
    }

    #[test]
    fn loads_scenario_outline() {
        let mut doc = minimal(json!({"requireConnectButton": true, "checks": []}));
        doc["meta"] = json!({"title": "Living room"});
        let scenario = Scenario::from_json(&doc).unwrap();
        assert_eq!(scenario.title.as_deref(), Some("Living room"));
        assert_eq!(scenario.allowed_device_ids, ["lamp", "fan"]);
        assert_eq!(scenario.anchors[0].id, "desk");
        assert!((scenario.anchors[0].x - 0.25).abs() < f64::EPSILON);
        assert_eq!(scenario.aims[0].text, "Light the desk");
        assert!(scenario.rules.require_connect_button);
    }

    #[test]
    fn rejects_non_object_root() {
        assert!(matches!(
            Scenario::from_json(&json!([1, 2])),
            Err(LoadError::NotAnObject)
        ));
    }

    #[test]
    fn rejects_missing_fields() {
        let mut doc = minimal(json!({"checks": []}));
        doc.as_object_mut().unwrap().remove("devicePool");
        assert!(matches!(
            Scenario::from_json(&doc),
            Err(LoadError::MissingField { field: "devicePool" })
        ));
    }

    #[test]
    fn rejects_non_array_checks() {
        let doc = minimal(json!({"checks": {"aimId": "x"}}));
        assert!(matches!(
            Scenario::from_json(&doc),
            Err(LoadError::WrongType {
                field: "rules.checks",
                ..
            })
        ));
    }

    #[test]
    fn absent_checks_means_none() {
        let rules = Rules::from_json(&json!({})).unwrap();
        assert!(rules.checks.is_empty());
        assert!(!rules.require_connect_button);
    }

    #[test]
    fn loads_tree_expression() {
        let rules = Rules::from_json(&json!({"checks": [{
            "aimId": "light",
            "connectedRequired": true,
            "expression": {
                "type": "group",
                "operator": "or",
                "children": [
                    {"type": "clause", "deviceId": "lamp", "anchorId": "desk"},
                    {"type": "group", "children": [
                        {"type": "clause", "deviceId": "lamp", "anchorId": "shelf"}
                    ]}
                ]
            }
        }]}))
        .unwrap();
        let check = &rules.checks[0];
        assert_eq!(check.aim_id, "light");
        assert!(check.connected_required);
        assert_eq!(
            check.tree_root(),
            Some(&any_of(vec![
                clause("lamp", "desk"),
                all_of(vec![clause("lamp", "shelf")]),
            ]))
        );
    }

    #[test]
    fn loads_legacy_array_skipping_nulls() {
        let rules = Rules::from_json(&json!({"checks": [{
            "aimId": "a",
            "expression": [
                {"operator": "and", "deviceId": "a", "anchorId": "x"},
                null,
                {"operator": "or", "deviceId": "b", "anchorId": "y"},
                {"operator": "XOR", "deviceId": "c"}
            ]
        }]}))
        .unwrap();
        assert_eq!(
            rules.checks[0].expression,
            Some(Expression::Legacy(vec![
                LegacyClause::new(Some(Operator::And), "a", "x"),
                LegacyClause::new(Some(Operator::Or), "b", "y"),
                LegacyClause::new(Some(Operator::And), "c", ""),
            ]))
        );
    }

    #[test]
    fn empty_array_and_scalars_are_absent() {
        let rules = Rules::from_json(&json!({"checks": [
            {"aimId": "a", "expression": []},
            {"aimId": "b", "expression": "lamp@desk"},
            {"aimId": "c", "expression": null}
        ]}))
        .unwrap();
        assert!(rules.checks.iter().all(|c| c.expression.is_none()));
    }

    #[test]
    fn malformed_fields_degrade() {
        let rules = Rules::from_json(&json!({"checks": [
            {
                "aimId": 7,
                "connectedRequired": "yes",
                "expression": {"type": "sensor", "deviceId": "a"},
                "requiredPlacements": [null, {"deviceId": "lamp", "anchorId": "desk"}]
            },
            "not a check",
            {"expression": {"type": "group", "operator": 3, "children": "none"}}
        ]}))
        .unwrap();
        assert_eq!(rules.checks.len(), 3);

        let first = &rules.checks[0];
        assert_eq!(first.aim_id, "");
        assert!(!first.connected_required);
        assert_eq!(first.tree_root(), Some(&ExpressionNode::Unknown));
        assert_eq!(
            first.required_placements,
            vec![Clause::new("", ""), Clause::new("lamp", "desk")]
        );

        assert_eq!(rules.checks[1], AimCheck::default());
        assert_eq!(rules.checks[2].tree_root(), Some(&all_of(vec![])));
    }

    #[test]
    fn non_object_checks_keep_their_position() {
        let rules = Rules::from_json(&json!({"checks": [
            {"aimId": "first", "requiredPlacements": [{"deviceId": "lamp", "anchorId": "desk"}]},
            42,
            {"aimId": "third", "requiredPlacements": [{"deviceId": "fan", "anchorId": "ceiling"}]}
        ]}))
        .unwrap();
        let ids: Vec<_> = rules.checks.iter().map(|c| c.aim_id.as_str()).collect();
        assert_eq!(ids, ["first", "", "third"]);
        assert!(rules.checks[1].expression.is_none());
        assert!(rules.checks[1].required_placements.is_empty());
    }

    #[test]
    fn all_null_legacy_array_loads_as_empty_group() {
        let rules = Rules::from_json(&json!({"checks": [{
            "aimId": "a",
            "expression": [null, null],
            "requiredPlacements": [{"deviceId": "lamp", "anchorId": "desk"}]
        }]}))
        .unwrap();
        assert_eq!(rules.checks[0].tree_root(), Some(&all_of(vec![])));
        assert_eq!(crate::evaluate_rules(&rules, &[], false).get("a"), Some(true));
    }

    #[test]
    fn loads_rulesets() {
        let mut doc = minimal(json!({}));
        doc["rulesets"] = json!([
            {"id": "r1", "text": "Lamp by the desk", "correct": true},
            {"id": "r2", "correct": "yes"},
            {"text": null, "correct": 0},
            {}
        ]);
        let scenario = Scenario::from_json(&doc).unwrap();
        assert_eq!(
            scenario.rulesets,
            vec![
                Ruleset {
                    id: Some("r1".into()),
                    text: Some("Lamp by the desk".into()),
                    correct: Some(RulesetAnswer::Flag(true)),
                },
                Ruleset {
                    id: Some("r2".into()),
                    text: None,
                    correct: Some(RulesetAnswer::Text("yes".into())),
                },
                Ruleset {
                    id: None,
                    text: None,
                    correct: Some(RulesetAnswer::Number(0.0)),
                },
                Ruleset::default(),
            ]
        );
    }

    #[test]
    fn null_or_absent_rulesets_are_empty() {
        let mut doc = minimal(json!({}));
        assert!(Scenario::from_json(&doc).unwrap().rulesets.is_empty());
        doc["rulesets"] = Json::Null;
        assert!(Scenario::from_json(&doc).unwrap().rulesets.is_empty());
    }

    #[test]
    fn rejects_malformed_rulesets() {
        let load = |rulesets: Json| {
            let mut doc = minimal(json!({}));
            doc["rulesets"] = rulesets;
            Scenario::from_json(&doc)
        };
        assert!(matches!(
            load(json!({"id": "r1"})),
            Err(LoadError::WrongType { field: "rulesets", .. })
        ));
        assert!(matches!(
            load(json!([{"id": "r1"}, "r2"])),
            Err(LoadError::RulesetNotAnObject { index: 1 })
        ));
        assert!(matches!(
            load(json!([[]])),
            Err(LoadError::RulesetNotAnObject { index: 0 })
        ));
        assert!(matches!(
            load(json!([{"id": 3}])),
            Err(LoadError::RulesetField { index: 0, field: "id", .. })
        ));
        assert!(matches!(
            load(json!([{"id": "r1"}, {"text": ["a"]}])),
            Err(LoadError::RulesetField { index: 1, field: "text", .. })
        ));
        assert!(matches!(
            load(json!([{"correct": {"value": true}}])),
            Err(LoadError::RulesetField { index: 0, field: "correct", .. })
        ));
    }

    #[test]
    fn accepts_audio_manifest() {
        let mut doc = minimal(json!({}));
        doc["audio"] = json!({
            "placement": "  sounds/Click.MP3 ",
            "aims": {"pass": "ok.wav", "fail": null},
            "rulesets": {"pass": null}
        });
        assert!(Scenario::from_json(&doc).is_ok());
        doc["audio"] = json!({});
        assert!(Scenario::from_json(&doc).is_ok());
    }

    #[test]
    fn rejects_malformed_audio_manifest() {
        let load = |audio: Json| {
            let mut doc = minimal(json!({}));
            doc["audio"] = audio;
            Scenario::from_json(&doc)
        };
        assert!(matches!(
            load(json!("click.mp3")),
            Err(LoadError::WrongType { field: "audio", .. })
        ));
        assert!(matches!(
            load(Json::Null),
            Err(LoadError::WrongType { field: "audio", .. })
        ));
        assert!(matches!(
            load(json!({"placement": "click.ogg"})),
            Err(LoadError::AudioClip { field: "audio.placement" })
        ));
        assert!(matches!(
            load(json!({"placement": 5})),
            Err(LoadError::AudioClip { field: "audio.placement" })
        ));
        assert!(matches!(
            load(json!({"aims": ["pass.mp3"]})),
            Err(LoadError::WrongType { field: "audio.aims", .. })
        ));
        assert!(matches!(
            load(json!({"aims": {"pass": "pass.mp3", "fail": "fail.mp3.txt"}})),
            Err(LoadError::AudioClip { field: "audio.aims.fail" })
        ));
        assert!(matches!(
            load(json!({"rulesets": null})),
            Err(LoadError::WrongType { field: "audio.rulesets", .. })
        ));
        assert!(matches!(
            load(json!({"rulesets": {"pass": "mp3"}})),
            Err(LoadError::AudioClip { field: "audio.rulesets.pass" })
        ));
    }

    #[test]
    fn from_json_str_reports_syntax_errors() {
        assert!(matches!(
            Scenario::from_json_str("{not json"),
            Err(crate::AimcheckError::Json(_))
        ));
    }
}
