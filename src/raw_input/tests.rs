use serde_json::json;

use super::literal::LiteralErrorKind;
use super::*;

fn interpreter() -> RawInputInterpreter {
    RawInputInterpreter::new().expect("brace span regex compiles")
}

fn structured(value: Value) -> RenderTarget {
    match value {
        Value::Object(map) => RenderTarget::Structured(map),
        other => panic!("fixture must be an object, got {other}"),
    }
}

#[test]
fn mapping_values_are_shown_structured() {
    let value = json!({"drug": "X", "dose": 5});
    let result = interpreter().interpret(&value);
    assert_eq!(result.target, structured(value));
    assert!(result.warning.is_none());
}

#[test]
fn prescription_prefix_is_stripped_from_literal() {
    let value = json!("Prescription: {'drug': 'X', 'dose': 5}");
    let result = interpreter().interpret(&value);
    assert_eq!(result.target, structured(json!({"drug": "X", "dose": 5})));
    assert!(result.warning.is_none());
}

#[test]
fn plain_text_without_braces_is_kept_verbatim() {
    let result = interpreter().interpret(&json!("no braces here"));
    assert_eq!(result.target, RenderTarget::Text("no braces here".to_string()));
    assert!(result.warning.is_none());
}

#[test]
fn empty_string_renders_as_empty_text() {
    let result = interpreter().interpret(&json!(""));
    assert_eq!(result.target, RenderTarget::Text(String::new()));
    assert!(result.warning.is_none());
}

#[test]
fn malformed_literal_falls_back_to_text_with_warning() {
    let result = interpreter().interpret(&json!("{drug: }"));
    assert_eq!(result.target, RenderTarget::Text("{drug: }".to_string()));
    let warning = result.warning.expect("parse failure should be reported");
    assert!(
        warning.to_string().contains("could not parse raw input"),
        "unexpected warning: {warning}"
    );
}

#[test]
fn greedy_span_over_captures_multiple_objects() {
    let text = "first {'a': 1} then {'b': 2}";
    let result = interpreter().interpret_text(text);
    assert_eq!(result.target, RenderTarget::Text(text.to_string()));
    assert!(result.warning.is_some());
}

#[test]
fn nested_braces_use_the_outermost_span() {
    let text = "Input:\n{'patient': {'age': 40, 'allergies': ['penicillin']},\n 'urgent': True}\nend";
    let result = interpreter().interpret_text(text);
    assert_eq!(
        result.target,
        structured(json!({
            "patient": {"age": 40, "allergies": ["penicillin"]},
            "urgent": true
        }))
    );
}

#[test]
fn set_literal_falls_back_to_text_without_warning() {
    let result = interpreter().interpret_text("tags {'a', 'b'}");
    assert_eq!(result.target, RenderTarget::Text("tags {'a', 'b'}".to_string()));
    assert!(result.warning.is_none());
}

#[test]
fn non_string_scalars_render_as_text() {
    let interpreter = interpreter();
    assert_eq!(
        interpreter.interpret(&Value::Null).target,
        RenderTarget::Text(String::new())
    );
    assert_eq!(
        interpreter.interpret(&json!(42)).target,
        RenderTarget::Text("42".to_string())
    );
    assert_eq!(
        interpreter.interpret(&json!(["a"])).target,
        RenderTarget::Text("[\"a\"]".to_string())
    );
}

#[test]
fn literal_parser_accepts_python_and_json_spellings() {
    let parsed = parse_literal(
        r#"{
            'flag': True, "other": false,  # trailing comment
            'missing': None, 'nil': null,
            'pair': (1, 2), 'single': (3,), 'grouped': (4),
            'neg': -7, 'float': 1.5e3, 'hex': 0x1F, 'big': 1_000,
            'joined': 'ab' "cd",
        }"#,
    )
    .expect("literal should parse");

    assert_eq!(
        parsed,
        json!({
            "flag": true, "other": false,
            "missing": null, "nil": null,
            "pair": [1, 2], "single": [3], "grouped": 4,
            "neg": -7, "float": 1500.0, "hex": 31, "big": 1000,
            "joined": "abcd"
        })
    );
}

#[test]
fn literal_parser_handles_string_escapes_and_prefixes() {
    let parsed = parse_literal(
        r#"{'esc': 'it\'s\n\x41é', 'raw': r'\d+', 'triple': '''a
b''', 'bytes': b"xy"}"#,
    )
    .expect("literal should parse");

    assert_eq!(
        parsed,
        json!({"esc": "it's\nAé", "raw": "\\d+", "triple": "a\nb", "bytes": "xy"})
    );
}

#[test]
fn literal_parser_stringifies_scalar_keys_and_keeps_last_duplicate() {
    let parsed = parse_literal("{1: 'a', True: 'b', None: 'c', 'k': 1, 'k': 2}")
        .expect("literal should parse");
    assert_eq!(
        parsed,
        json!({"1": "a", "true": "b", "null": "c", "k": 2})
    );
    let keys: Vec<&String> = parsed
        .as_object()
        .expect("parsed value is an object")
        .keys()
        .collect();
    assert_eq!(keys, vec!["1", "true", "null", "k"]);
}

#[test]
fn literal_parser_reports_error_kinds() {
    let unknown = parse_literal("{drug: 1}").expect_err("bare names are not literals");
    assert_eq!(unknown.kind, LiteralErrorKind::UnknownName("drug".to_string()));
    assert_eq!(unknown.offset, 1);

    let unterminated = parse_literal("{'a': 'b}").expect_err("string never closes");
    assert_eq!(unterminated.kind, LiteralErrorKind::UnterminatedString);

    let trailing = parse_literal("{} {}").expect_err("two literals are not one");
    assert_eq!(trailing.kind, LiteralErrorKind::TrailingInput);

    let unhashable = parse_literal("{(1, 2): 'x'}").expect_err("tuple keys are rejected");
    assert_eq!(unhashable.kind, LiteralErrorKind::UnhashableKey);

    let number = parse_literal("{'a': 012}").expect_err("leading zeros are rejected");
    assert_eq!(number.kind, LiteralErrorKind::InvalidNumber("012".to_string()));

    let end = parse_literal("{'a': ").expect_err("input ends early");
    assert_eq!(end.kind, LiteralErrorKind::UnexpectedEnd);
}

#[test]
fn deeply_nested_literal_falls_back_to_text_with_warning() {
    let text = format!("x {{'a': {}}}", "[".repeat(50_000));
    let result = interpreter().interpret_text(&text);
    assert_eq!(result.target, RenderTarget::Text(text.clone()));
    let warning = result.warning.expect("nesting limit should be reported");
    assert_eq!(warning.source.kind, LiteralErrorKind::TooDeep);
}

#[test]
fn literal_parser_accepts_nesting_up_to_the_limit() {
    let depth = 150;
    let source = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
    assert!(parse_literal(&source).is_ok());
}

#[test]
fn long_sign_runs_are_folded_without_recursion() {
    let value = parse_literal(&format!("{{'a': {}5}}", "-".repeat(200_001)))
        .expect("sign run before a number is a literal");
    assert_eq!(value, json!({"a": -5}));

    let value = parse_literal("{'a': - + -2.5}").expect("signs may be spaced");
    assert_eq!(value, json!({"a": 2.5}));
}
