//! Behaviour of the "Select values from XML" transformer as a host sees it:
//! configuration in, one row of cells out, failures on the reporter.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use pretty_assertions::assert_eq;

use xmlselect::config::ExtractConfig;
use xmlselect::extract::{
    output_columns, CollectingReporter, ColumnKind, NullReporter, XPathTransformer,
};

const BOOKS: &str =
    "<books><book>Robinson Crusoe</book><book>Gulliver's Travels</book></books>";

fn transformer(expressions: &[&str]) -> (XPathTransformer, Arc<CollectingReporter>) {
    let config = ExtractConfig::new("xml value").expressions(expressions.iter().copied());
    let reporter = Arc::new(CollectingReporter::new());
    (XPathTransformer::new(&config, reporter.clone()), reporter)
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

// ---------------------------------------------------------------------------
// Output columns
// ---------------------------------------------------------------------------

#[test]
fn test_output_column_names() {
    let (t, _) = transformer(&["/books/book[1]/text()", "/books/book/text()"]);
    let names: Vec<String> = t.output_columns().into_iter().map(|c| c.name).collect();
    assert_eq!(
        names,
        vec![
            "xml value (/books/book[1]/text())",
            "xml value (/books/book/text())",
        ]
    );
}

#[test]
fn test_output_columns_are_text_lists() {
    let columns = output_columns("xml", &["/a", "<abracadabra>", "count(/a)"]);
    assert_eq!(columns.len(), 3);
    assert!(columns.iter().all(|c| c.kind == ColumnKind::TextList));
    assert_eq!(columns[1].name, "xml (<abracadabra>)");
}

#[test]
fn test_output_columns_match_transformer() {
    let expressions = ["/a", "//b/@c", "<bad>"];
    let (t, _) = transformer(&expressions);
    assert_eq!(t.output_columns(), output_columns("xml value", &expressions));
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[test]
fn test_first_book_title() {
    let (t, reporter) = transformer(&["/books/book[1]/text()"]);
    assert_eq!(t.transform(Some(BOOKS)), vec![strings(&["Robinson Crusoe"])]);
    assert!(reporter.is_empty());
}

#[test]
fn test_all_book_titles() {
    let (t, reporter) = transformer(&["/books/book/text()"]);
    assert_eq!(
        t.transform(Some(BOOKS)),
        vec![strings(&["Robinson Crusoe", "Gulliver's Travels"])]
    );
    assert!(reporter.is_empty());
}

#[test]
fn test_element_nodes_serialize_as_markup() {
    let (t, _) = transformer(&["/books/book[2]", "/books"]);
    let row = t.transform(Some(BOOKS));
    assert_eq!(row[0], strings(&["<book>Gulliver's Travels</book>"]));
    assert_eq!(row[1], strings(&[BOOKS]));
}

#[test]
fn test_declaration_is_not_reproduced() {
    let (t, _) = transformer(&["/note", "/"]);
    let row = t.transform(Some("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<note a=\"1\">hi</note>"));
    assert_eq!(row[0], strings(&["<note a=\"1\">hi</note>"]));
    assert_eq!(row[1], strings(&["<note a=\"1\">hi</note>"]));
}

#[test]
fn test_attribute_and_cdata_values_are_raw() {
    let (t, _) = transformer(&["//item/@name", "//item/text()"]);
    let row = t.transform(Some(
        "<list><item name=\"a &amp; b\"><![CDATA[<x> & y]]></item><item name='c'/></list>",
    ));
    assert_eq!(row[0], strings(&["a & b", "c"]));
    assert_eq!(row[1], strings(&["<x> & y"]));
}

#[test]
fn test_empty_selection_is_an_empty_cell_without_report() {
    let (t, reporter) = transformer(&["/books/magazine"]);
    assert_eq!(t.transform(Some(BOOKS)), vec![Vec::<String>::new()]);
    assert!(reporter.is_empty());
}

#[test]
fn test_union_results_are_in_document_order() {
    let (t, _) = transformer(&["//c | //a | //b"]);
    let row = t.transform(Some("<r><a>1</a><b>2</b><c>3</c><a>4</a></r>"));
    assert_eq!(
        row[0],
        strings(&["<a>1</a>", "<b>2</b>", "<c>3</c>", "<a>4</a>"])
    );
}

#[test]
fn test_predicates_and_functions() {
    let (t, reporter) = transformer(&[
        "//book[contains(., 'Travels')]/text()",
        "//book[last()]/text()",
        "//book[string-length(.) > 15]/text()",
        "//book[position() mod 2 = 1]/text()",
    ]);
    let row = t.transform(Some(BOOKS));
    assert_eq!(row[0], strings(&["Gulliver's Travels"]));
    assert_eq!(row[1], strings(&["Gulliver's Travels"]));
    assert_eq!(row[2], strings(&["Gulliver's Travels"]));
    assert_eq!(row[3], strings(&["Robinson Crusoe"]));
    assert!(reporter.is_empty());
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn test_invalid_expression_reported_once_at_setup() {
    let (t, reporter) = transformer(&["<abracadabra>", "/books/book[1]/text()"]);
    let setup = reporter.take();
    assert_eq!(setup.len(), 1);
    assert!(setup[0].starts_with("Error occurred compiling XPath expression: \"<abracadabra>\"."));

    for _ in 0..3 {
        assert_eq!(
            t.transform(Some(BOOKS)),
            vec![Vec::new(), strings(&["Robinson Crusoe"])]
        );
    }
    assert!(reporter.is_empty());
}

#[test]
fn test_null_input_yields_empty_cells() {
    let (t, reporter) = transformer(&["/books/book/text()", "/books"]);
    assert_eq!(t.transform(None), vec![Vec::<String>::new(); 2]);
    let messages = reporter.messages();
    assert_eq!(
        messages,
        vec!["Error occurred parsing string as xml document:\n<null>".to_string()]
    );
}

#[test]
fn test_empty_input_yields_empty_cells() {
    let (t, reporter) = transformer(&["/books/book/text()"]);
    assert_eq!(t.transform(Some("")), vec![Vec::<String>::new()]);
    assert_eq!(reporter.messages().len(), 1);
}

#[test]
fn test_malformed_input_is_reported_with_parse_error() {
    let (t, reporter) = transformer(&["/books/book/text()", "/books"]);
    assert_eq!(
        t.transform(Some("<books><book>x</books>")),
        vec![Vec::<String>::new(); 2]
    );
    let messages = reporter.messages();
    assert_eq!(messages.len(), 1);
    let mut lines = messages[0].lines();
    assert_eq!(lines.next(), Some("Error occurred parsing string as xml document:"));
    assert_eq!(lines.next(), Some("<books><book>x</books>"));
    assert!(lines.next().unwrap().contains("mismatched end tag"));
}

#[test]
fn test_long_malformed_input_is_truncated_in_report() {
    let (t, reporter) = transformer(&["/a"]);
    let xml = format!("<a>{}", "x".repeat(2000));
    let _ = t.transform(Some(xml.as_str()));
    let message = &reporter.messages()[0];
    assert!(message.contains(&format!("<a>{}\u{2026}", "x".repeat(509))));
    assert!(!message.contains(&"x".repeat(510)));
}

#[test]
fn test_scalar_expression_is_an_evaluation_failure() {
    let (t, reporter) = transformer(&["count(/books/book)", "/books/book[1]/text()"]);
    assert!(reporter.is_empty());
    assert_eq!(
        t.transform(Some(BOOKS)),
        vec![Vec::new(), strings(&["Robinson Crusoe"])]
    );
    let messages = reporter.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with(
        "Error occurred applying XPath expression: \"count(/books/book)\" to xml.\n"
    ));
}

#[test]
fn test_unknown_function_fails_at_setup() {
    let (t, reporter) = transformer(&["upper-case(/books/book)"]);
    assert_eq!(reporter.take().len(), 1);
    assert_eq!(t.transform(Some(BOOKS)), vec![Vec::<String>::new()]);
    assert!(reporter.is_empty());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn test_row_length_matches_expression_count() {
    let expressions = [
        "/books/book/text()",
        "<abracadabra>",
        "count(//book)",
        "//nothing",
        "/books/book[1]",
    ];
    let (t, _) = transformer(&expressions);
    for xml in [Some(BOOKS), None, Some(""), Some("<broken"), Some("<other/>")] {
        let row = t.transform(xml);
        assert_eq!(row.len(), expressions.len(), "row for {xml:?}");
    }
    assert_eq!(t.output_columns().len(), expressions.len());
}

#[test]
fn test_results_stay_aligned_with_expressions() {
    let (t, _) = transformer(&["<bad>", "/books/book[2]/text()", "<worse", "/books/book[1]/text()"]);
    let row = t.transform(Some(BOOKS));
    assert_eq!(
        row,
        vec![
            Vec::new(),
            strings(&["Gulliver's Travels"]),
            Vec::new(),
            strings(&["Robinson Crusoe"]),
        ]
    );
}

#[test]
fn test_transform_is_idempotent() {
    let (t, _) = transformer(&["//book/text()", "/books/book[last()]", "//@*"]);
    let xml = "<books><book id='1'>A</book><book id='2'>B</book></books>";
    let first = t.transform(Some(xml));
    assert_eq!(t.transform(Some(xml)), first);
    assert_eq!(t.transform_batch(&[Some(xml), Some(xml)]), vec![first.clone(), first]);
}

#[test]
fn test_rows_are_independent() {
    let (t, _) = transformer(&["/r/text()"]);
    let rows = t.transform_batch(&[Some("<r>1</r>"), None, Some("<r>2</r>"), Some("<x/>")]);
    assert_eq!(
        rows,
        vec![
            vec![strings(&["1"])],
            vec![Vec::new()],
            vec![strings(&["2"])],
            vec![Vec::new()],
        ]
    );
}

#[test]
fn test_shared_across_threads() {
    let config = ExtractConfig::new("xml").expression("/n/text()");
    let t = Arc::new(XPathTransformer::new(&config, Arc::new(NullReporter)));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let t = Arc::clone(&t);
            std::thread::spawn(move || t.transform(Some(format!("<n>{i}</n>").as_str())))
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), vec![vec![i.to_string()]]);
    }
}

#[test]
fn test_config_from_json() {
    let config = ExtractConfig::from_json_str(
        r#"{
            "column": "payload",
            "expressions": ["/books/book[1]/text()", "//book/text()"],
            "parse": { "max_depth": 16 }
        }"#,
    )
    .unwrap();
    config.validate().unwrap();
    let t = XPathTransformer::new(&config, Arc::new(NullReporter));
    assert_eq!(t.output_columns()[0].name, "payload (/books/book[1]/text())");
    assert_eq!(t.transform(Some(BOOKS))[1].len(), 2);
}
