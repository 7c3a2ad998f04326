//! Security-focused tests.
//!
//! Row values are untrusted. These tests check that pathological inputs are
//! refused by the parser limits and end up as reported, empty rows rather
//! than crashes or runaway resource use.

#![allow(clippy::unwrap_used)]

use std::fmt::Write;
use std::sync::Arc;

use xmlselect::config::{ExtractConfig, ParseSettings};
use xmlselect::extract::{CollectingReporter, XPathTransformer};
use xmlselect::parser::{parse_str, parse_str_with_options, ParseOptions};
use xmlselect::xpath::parser::MAX_NESTING_DEPTH;

fn nested(depth: usize) -> String {
    let open: String = (0..depth).map(|_| "<a>").collect();
    let close: String = (0..depth).map(|_| "</a>").collect();
    format!("{open}{close}")
}

fn with_attributes(count: usize) -> String {
    let mut xml = String::from("<root");
    for i in 0..count {
        let _ = write!(xml, " a{i}=\"{i}\"");
    }
    xml.push_str("/>");
    xml
}

// ---------------------------------------------------------------------------
// Depth limit
// ---------------------------------------------------------------------------

#[test]
fn test_deeply_nested_elements_rejected() {
    // 300 levels is beyond the default limit of 256. Run on a larger stack
    // so debug builds do not overflow before the limit is hit.
    let result = std::thread::Builder::new()
        .stack_size(8 * 1024 * 1024)
        .spawn(|| parse_str(&nested(300)))
        .unwrap()
        .join()
        .unwrap();
    let err = result.unwrap_err();
    assert!(
        err.message.contains("depth"),
        "error should mention depth: {}",
        err.message
    );
}

#[test]
fn test_depth_limit_exact_boundary() {
    let opts = ParseOptions::default().max_depth(3);
    assert!(parse_str_with_options(&nested(3), &opts).is_ok());
    assert!(parse_str_with_options(&nested(4), &opts).is_err());
}

#[test]
fn test_default_limits_allow_moderate_nesting() {
    let doc = parse_str(&nested(100)).unwrap();
    assert!(doc.root_element().is_some());
}

// ---------------------------------------------------------------------------
// Attribute limit
// ---------------------------------------------------------------------------

#[test]
fn test_too_many_attributes_rejected() {
    let err = parse_str(&with_attributes(300)).unwrap_err();
    assert!(err.message.contains("too many attributes"), "{}", err.message);
}

#[test]
fn test_attribute_limit_configurable() {
    let opts = ParseOptions::default().max_attributes(10);
    assert!(parse_str_with_options(&with_attributes(10), &opts).is_ok());
    assert!(parse_str_with_options(&with_attributes(11), &opts).is_err());
    assert!(parse_str(&with_attributes(200)).is_ok());
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Ten levels of ten references each: about 10^9 "lol"s if fully expanded.
fn billion_laughs() -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<!DOCTYPE lolz [\n  <!ENTITY lol \"lol\">\n");
    for level in 1..10 {
        let previous = if level == 1 { "lol".to_string() } else { format!("lol{level}") };
        let refs = format!("&{previous};").repeat(10);
        let _ = writeln!(xml, "  <!ENTITY lol{} \"{refs}\">", level + 1);
    }
    xml.push_str("]>\n<lolz>&lol10;</lolz>");
    xml
}

#[test]
fn test_entity_expansion_limit_stops_billion_laughs() {
    let err = parse_str(&billion_laughs()).unwrap_err();
    assert_eq!(err.message, "entity expansion limit exceeded (10000)");
}

#[test]
fn test_entity_expansion_limit_configurable() {
    // lol3 takes 1 + 10 + 100 expansions.
    let xml = r#"<!DOCTYPE lolz [
  <!ENTITY lol "lol">
  <!ENTITY lol2 "&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;">
  <!ENTITY lol3 "&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;">
]>
<lolz>&lol3;</lolz>"#;
    let doc = parse_str(xml).unwrap();
    assert_eq!(doc.text_content(doc.root_element().unwrap()), "lol".repeat(100));

    let opts = ParseOptions::default().max_entity_expansions(111);
    assert!(parse_str_with_options(xml, &opts).is_ok());
    let opts = ParseOptions::default().max_entity_expansions(110);
    let err = parse_str_with_options(xml, &opts).unwrap_err();
    assert!(err.message.contains("entity expansion limit"), "{}", err.message);
}

#[test]
fn test_self_referencing_entity_refused() {
    let xml = "<!DOCTYPE a [<!ENTITY loop \"x&loop;\">]><a>&loop;</a>";
    let err = parse_str(xml).unwrap_err();
    assert!(err.message.contains("recursive entity reference"), "{}", err.message);
}

#[test]
fn test_external_entity_refused() {
    let xml = r#"<?xml version="1.0"?>
<!DOCTYPE foo [ <!ENTITY xxe SYSTEM "file:///etc/passwd"> ]>
<foo>&xxe;</foo>"#;
    let err = parse_str(xml).unwrap_err();
    assert!(err.message.contains("external entity 'xxe'"), "{}", err.message);
}

#[test]
fn test_predefined_and_character_references_allowed() {
    let doc = parse_str("<a>&lt;&gt;&amp;&apos;&quot;&#65;&#x42;</a>").unwrap();
    let root = doc.root_element().unwrap();
    assert_eq!(doc.text_content(root), "<>&'\"AB");
}

// ---------------------------------------------------------------------------
// Through the transformer
// ---------------------------------------------------------------------------

#[test]
fn test_hostile_rows_become_reported_empty_rows() {
    let settings = ParseSettings {
        max_depth: 32,
        max_attributes: 16,
        ..ParseSettings::default()
    };
    let config = ExtractConfig::new("xml")
        .expressions(["//a", "/root/@*"])
        .parse_settings(settings);
    let reporter = Arc::new(CollectingReporter::new());
    let transformer = XPathTransformer::new(&config, reporter.clone());

    let hostile = [
        nested(33),
        with_attributes(17),
        "<!DOCTYPE r [<!ENTITY e SYSTEM \"file:///etc/passwd\">]><r>&e;</r>".to_string(),
        billion_laughs(),
    ];
    for xml in &hostile {
        assert_eq!(transformer.transform(Some(xml.as_str())), vec![Vec::<String>::new(); 2]);
    }
    let messages = reporter.take();
    assert_eq!(messages.len(), hostile.len());
    assert!(messages
        .iter()
        .all(|m| m.starts_with("Error occurred parsing string as xml document:\n")));

    let row = transformer.transform(Some(with_attributes(16).as_str()));
    assert_eq!(row[1].len(), 16);
    assert!(reporter.is_empty());
}

#[test]
fn test_declared_entities_are_extracted() {
    let config = ExtractConfig::new("xml").expressions(["/a/text()", "/a/@title"]);
    let reporter = Arc::new(CollectingReporter::new());
    let transformer = XPathTransformer::new(&config, reporter.clone());
    let row = transformer.transform(Some(
        "<!DOCTYPE a [<!ENTITY e 'boom'>]><a title='&e;!'>&e;</a>",
    ));
    assert_eq!(row, vec![vec!["boom".to_string()], vec!["boom!".to_string()]]);
    assert!(reporter.is_empty());
}

// ---------------------------------------------------------------------------
// Expression nesting
// ---------------------------------------------------------------------------

#[test]
fn test_deeply_nested_expression_is_a_compile_failure() {
    let deep = format!("{}/a{}", "(".repeat(10_000), ")".repeat(10_000));
    let config = ExtractConfig::new("xml").expressions([deep.as_str(), "/a/text()"]);
    let reporter = Arc::new(CollectingReporter::new());
    let transformer = XPathTransformer::new(&config, reporter.clone());

    let setup = reporter.take();
    assert_eq!(setup.len(), 1);
    assert!(setup[0].starts_with("Error occurred compiling XPath expression: "));
    assert!(setup[0].contains("expression nested too deeply"), "{}", setup[0]);

    assert_eq!(
        transformer.transform(Some("<a>x</a>")),
        vec![Vec::new(), vec!["x".to_string()]]
    );
    assert!(reporter.is_empty());
}

#[test]
fn test_expression_nesting_at_the_limit_still_compiles() {
    let expr = format!(
        "{}/a{}",
        "(".repeat(MAX_NESTING_DEPTH),
        ")".repeat(MAX_NESTING_DEPTH)
    );
    let config = ExtractConfig::new("xml").expression(expr);
    let reporter = Arc::new(CollectingReporter::new());
    let transformer = XPathTransformer::new(&config, reporter.clone());
    assert_eq!(transformer.transform(Some("<a/>")), vec![vec!["<a/>".to_string()]]);
    assert!(reporter.is_empty());
}
