//! Visiting parsed items.

use abl::parser::{
    ImplementationItem, ParseResult, ParsedItem, ParserVisitor, ProcedureItem, PrototypeItem, RunItem,
};
use rustc_hash::FxHashMap;

use crate::helpers::resolvers::parse_source;
use crate::helpers::source_fixtures::PROCEDURE_FILE;

/// Counts every callback by name.
#[derive(Default)]
struct CountingVisitor {
    counts: FxHashMap<&'static str, usize>,
    procedures: Vec<String>,
    prototype_links: Vec<(String, bool)>,
    total: usize,
}

impl CountingVisitor {
    fn bump(&mut self, key: &'static str) {
        *self.counts.entry(key).or_default() += 1;
    }

    fn count(&self, key: &str) -> usize {
        self.counts.get(key).copied().unwrap_or_default()
    }
}

impl ParserVisitor for CountingVisitor {
    fn pre_visit(&mut self, result: &ParseResult) {
        self.bump("pre");
        self.total = result.items.len();
    }

    fn visit_procedure(&mut self, item: &ParsedItem, procedure: &ProcedureItem) {
        self.bump("procedure");
        let suffix = if procedure.private { " (private)" } else { "" };
        self.procedures.push(format!("{}{suffix}", item.name));
    }

    fn visit_prototype(&mut self, item: &ParsedItem, prototype: &PrototypeItem) {
        self.bump("prototype");
        self.prototype_links
            .push((item.name.to_string(), prototype.implementation.is_some()));
    }

    fn visit_implementation(&mut self, _item: &ParsedItem, _implementation: &ImplementationItem) {
        self.bump("implementation");
    }

    fn visit_run(&mut self, _item: &ParsedItem, _run: &RunItem) {
        self.bump("run");
    }

    fn post_visit(&mut self) {
        self.bump("post");
    }
}

#[test]
fn test_visitor_sees_each_variant() {
    let result = parse_source(PROCEDURE_FILE);
    let mut visitor = CountingVisitor::default();
    result.accept(&mut visitor);

    assert_eq!(visitor.count("pre"), 1);
    assert_eq!(visitor.count("post"), 1);
    assert_eq!(visitor.total, result.items.len());
    assert_eq!(visitor.count("procedure"), 2);
    assert_eq!(visitor.count("prototype"), 1);
    assert_eq!(visitor.count("implementation"), 1);
    assert_eq!(visitor.count("run"), 1);
    assert_eq!(visitor.procedures, vec!["loadOrders", "logCount (private)"]);
    assert_eq!(visitor.prototype_links, vec![("orderTotal".to_string(), true)]);
}

#[test]
fn test_single_item_dispatch() {
    let result = parse_source(PROCEDURE_FILE);
    let mut visitor = CountingVisitor::default();
    for item in result.items_of("procedure") {
        item.accept(&mut visitor);
    }
    assert_eq!(visitor.count("procedure"), 2);
    assert_eq!(visitor.count("pre"), 0);
}
