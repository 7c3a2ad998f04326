#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlselect::tree::Document;
use xmlselect::xpath::XPath;

const DOC: &str = "<root xmlns:p=\"urn:p\" xml:lang=\"en\"><child attr=\"val\" xml:id=\"c1\">text</child>\
                   <!-- note --><p:item n=\"2\"><![CDATA[raw]]></p:item><?pi data?></root>";

fuzz_target!(|data: &[u8]| {
    if let Ok(expr) = std::str::from_utf8(data) {
        // Compiling and evaluating any expression must never panic.
        if let Ok(xpath) = XPath::compile(expr) {
            if let Ok(doc) = Document::parse_str(DOC) {
                let _ = xpath.evaluate(&doc, doc.root());
                if let Some(root) = doc.root_element() {
                    let _ = xpath.evaluate(&doc, root);
                }
            }
        }
    }
});
