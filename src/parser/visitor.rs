//! Visitor over parsed items.
//!
//! [`ParseResult::accept`] calls `pre_visit`, then one `visit_*` method per
//! item in emission order, then `post_visit`. Default implementations are
//! no-ops, so a visitor only overrides what it consumes.

use super::items::{
    BufferItem, DefineItem, FileItem, FunctionCallItem, ImplementationItem, IncludeFileItem, ItemKind,
    LabelItem, MethodItem, OnItem, ParsedItem, PreprocBlockItem, PreprocVariableItem, PreprocVariableUseItem,
    ProcedureItem, PrototypeItem, RunItem, TableUseItem,
};
use super::parser::ParseResult;

pub trait ParserVisitor {
    fn pre_visit(&mut self, _result: &ParseResult) {}

    fn visit_file(&mut self, _item: &ParsedItem, _file: &FileItem) {}
    fn visit_preproc_block(&mut self, _item: &ParsedItem, _block: &PreprocBlockItem) {}
    fn visit_procedure(&mut self, _item: &ParsedItem, _procedure: &ProcedureItem) {}
    fn visit_prototype(&mut self, _item: &ParsedItem, _prototype: &PrototypeItem) {}
    fn visit_implementation(&mut self, _item: &ParsedItem, _implementation: &ImplementationItem) {}
    fn visit_method(&mut self, _item: &ParsedItem, _method: &MethodItem) {}
    fn visit_label(&mut self, _item: &ParsedItem, _label: &LabelItem) {}
    fn visit_run(&mut self, _item: &ParsedItem, _run: &RunItem) {}
    fn visit_on_statement(&mut self, _item: &ParsedItem, _on: &OnItem) {}
    fn visit_function_call(&mut self, _item: &ParsedItem, _call: &FunctionCallItem) {}
    fn visit_table_use(&mut self, _item: &ParsedItem, _table: &TableUseItem) {}
    fn visit_buffer(&mut self, _item: &ParsedItem, _buffer: &BufferItem) {}
    fn visit_define(&mut self, _item: &ParsedItem, _define: &DefineItem) {}
    fn visit_preproc_variable(&mut self, _item: &ParsedItem, _variable: &PreprocVariableItem) {}
    fn visit_preproc_variable_use(&mut self, _item: &ParsedItem, _usage: &PreprocVariableUseItem) {}
    fn visit_include_file(&mut self, _item: &ParsedItem, _include: &IncludeFileItem) {}
    fn visit_event(&mut self, _item: &ParsedItem) {}
    fn visit_word(&mut self, _item: &ParsedItem) {}
    fn visit_snippet(&mut self, _item: &ParsedItem) {}

    fn post_visit(&mut self) {}
}

impl ParsedItem {
    /// Dispatch to the visitor method for this item's variant.
    pub fn accept(&self, visitor: &mut dyn ParserVisitor) {
        match &self.kind {
            ItemKind::File(file) => visitor.visit_file(self, file),
            ItemKind::PreprocBlock(block) => visitor.visit_preproc_block(self, block),
            ItemKind::Procedure(procedure) => visitor.visit_procedure(self, procedure),
            ItemKind::Prototype(prototype) => visitor.visit_prototype(self, prototype),
            ItemKind::Implementation(implementation) => visitor.visit_implementation(self, implementation),
            ItemKind::Method(method) => visitor.visit_method(self, method),
            ItemKind::Label(label) => visitor.visit_label(self, label),
            ItemKind::Run(run) => visitor.visit_run(self, run),
            ItemKind::OnStatement(on) => visitor.visit_on_statement(self, on),
            ItemKind::FunctionCall(call) => visitor.visit_function_call(self, call),
            ItemKind::TableUse(table) => visitor.visit_table_use(self, table),
            ItemKind::Buffer(buffer) => visitor.visit_buffer(self, buffer),
            ItemKind::Define(define) => visitor.visit_define(self, define),
            ItemKind::PreprocVariable(variable) => visitor.visit_preproc_variable(self, variable),
            ItemKind::PreprocVariableUse(usage) => visitor.visit_preproc_variable_use(self, usage),
            ItemKind::IncludeFile(include) => visitor.visit_include_file(self, include),
            ItemKind::Event => visitor.visit_event(self),
            ItemKind::Word => visitor.visit_word(self),
            ItemKind::Snippet => visitor.visit_snippet(self),
        }
    }
}

impl ParseResult {
    /// Walk every item in emission order.
    pub fn accept(&self, visitor: &mut dyn ParserVisitor) {
        visitor.pre_visit(self);
        for item in &self.items {
            item.accept(visitor);
        }
        visitor.post_visit();
    }
}
