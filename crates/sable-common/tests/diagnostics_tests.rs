use super::*;
use crate::Span;

#[test]
fn test_format_message_fills_placeholders() {
    let text = format_message("'{0}' expects {1} type argument(s)", &["Struct", "1"]);
    assert_eq!(text, "'Struct' expects 1 type argument(s)");
}

#[test]
fn test_from_code_uses_template_and_span() {
    let diag = Diagnostic::from_code(
        DiagnosticCode::UnresolvedReference,
        "unit.sb",
        Span::new(10, 15),
        &["missing"],
    );
    assert_eq!(diag.code, 1002);
    assert_eq!(diag.start, 10);
    assert_eq!(diag.length, 5);
    assert_eq!(diag.message_text, "Cannot find name 'missing'.");
    assert!(diag.is_error());
    assert_eq!(
        diag.diagnostic_code(),
        Some(DiagnosticCode::UnresolvedReference)
    );
}

#[test]
fn test_codes_round_trip_through_numbers() {
    for code in DiagnosticCode::ALL {
        assert_eq!(DiagnosticCode::from_code(code.code()), Some(code));
    }
    assert_eq!(DiagnosticCode::from_code(9999), None);
}

#[test]
fn test_related_information_is_serialized_only_when_present() {
    let plain = Diagnostic::error("a.sb".into(), 0, 1, "msg".into(), 1001);
    let json = serde_json::to_string(&plain).unwrap();
    assert!(!json.contains("related_information"));

    let related = plain.with_related("a.sb".into(), 4, 2, "first declared here".into());
    let json = serde_json::to_string(&related).unwrap();
    assert!(json.contains("first declared here"));
}
