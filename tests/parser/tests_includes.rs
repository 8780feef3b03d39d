//! Include expansion: owners, root lines, caching, arguments.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use abl::parser::{parse, parse_file, ItemKind, ParseEnvironment, ParserOptions};
use abl::project::{IncludeCache, PropathResolver};
use tempfile::TempDir;

use crate::helpers::init_tracing;
use crate::helpers::resolvers::{env_with, MemoryResolver};

fn write(dir: &Path, name: &str, text: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

/// `main.p` including `inc/defs.i`, which includes its sibling `nested.i`.
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "inc/defs.i", "DEFINE VARIABLE shared-count AS INTEGER NO-UNDO.\n{nested.i}\n");
    write(dir.path(), "inc/nested.i", "PROCEDURE fromNested:\nEND PROCEDURE.\n");
    write(
        dir.path(),
        "main.p",
        "/* main */\n{inc/defs.i}\nPROCEDURE local:\nEND PROCEDURE.\n",
    );
    dir
}

fn propath_env(dir: &Path) -> ParseEnvironment {
    ParseEnvironment::new(Arc::new(PropathResolver::new([dir])))
}

#[test]
fn test_nested_includes_record_chain() {
    init_tracing();
    let dir = project();
    let env = propath_env(dir.path());
    let result = parse_file(&dir.path().join("main.p"), &env).unwrap();
    assert!(result.is_ok(), "{:?}", result.errors);

    assert_eq!(result.includes.len(), 3);
    assert_eq!(result.includes[1].name, "inc/defs.i");
    assert_eq!(result.includes[1].parent, Some(0));
    assert_eq!(result.includes[1].root_line, 1);
    assert_eq!(result.includes[2].name, "nested.i");
    assert_eq!(result.includes[2].parent, Some(1));
    assert_eq!(result.includes[2].path.as_deref(), Some(dir.path().join("inc/nested.i").as_path()));

    // Lines of included files never show up in the root's line table.
    assert_eq!(result.line_info.len(), 5);
}

#[test]
fn test_included_items_carry_owner_and_root_line() {
    let dir = project();
    let env = propath_env(dir.path());
    let result = parse_file(&dir.path().join("main.p"), &env).unwrap();

    let nested = result.items_of("procedure").find(|i| i.name == "fromNested").unwrap();
    assert_eq!(nested.owner(), 2);
    assert_eq!(nested.root_line, 1);
    assert_eq!(nested.token.line, 0);

    let variable = result.items_of("define").next().unwrap();
    assert_eq!(variable.name, "shared-count");
    assert_eq!(variable.owner(), 1);

    let local = result.items_of("procedure").find(|i| i.name == "local").unwrap();
    assert_eq!((local.owner(), local.root_line), (0, 2));

    let include_items: Vec<_> = result
        .items_of("include")
        .map(|i| match &i.kind {
            ItemKind::IncludeFile(include) => include.owner,
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(include_items, vec![Some(1), Some(2)]);
}

#[test]
fn test_reparse_is_deterministic_and_uses_cache() {
    let dir = project();
    let cache = Arc::new(IncludeCache::new());
    let env = propath_env(dir.path()).with_includes(cache.clone());
    let main = dir.path().join("main.p");

    let first = parse_file(&main, &env).unwrap();
    assert_eq!(cache.len(), 2);
    let second = parse_file(&main, &env).unwrap();
    assert_eq!(cache.len(), 2);

    assert_eq!(first.items, second.items);
    assert_eq!(first.line_info, second.line_info);
    assert_eq!(first.errors, second.errors);
}

#[test]
fn test_parsing_an_include_as_root_evicts_it() {
    let dir = project();
    let cache = Arc::new(IncludeCache::new());
    let env = propath_env(dir.path()).with_includes(cache.clone());
    parse_file(&dir.path().join("main.p"), &env).unwrap();

    let defs = dir.path().join("inc/defs.i");
    assert!(cache.get(&defs).is_some());
    parse_file(&defs, &env).unwrap();
    assert!(cache.get(&defs).is_none());
}

#[test]
fn test_unresolved_include_is_an_item_without_owner() {
    let result = parse("{missing.i}\nDISPLAY 1.\n", None, &ParseEnvironment::default());
    assert!(result.is_ok());
    assert_eq!(result.includes.len(), 1);
    let item = result.items_of("include").next().unwrap();
    assert_eq!(item.name, "missing.i");
    assert!(matches!(&item.kind, ItemKind::IncludeFile(i) if i.owner.is_none() && i.path.is_none()));
}

#[test]
fn test_include_arguments() {
    let resolver = MemoryResolver::new().with_file(
        "show.i",
        "&SCOPED-DEFINE first {1}\n&SCOPED-DEFINE named {&label}\n&SCOPED-DEFINE me {0}\n",
    );
    let env = env_with(resolver);
    let result = parse("{show.i alpha 'b c'}\n{show.i &label=Total}\n", None, &env);

    let values: Vec<(&str, &str)> = result
        .items_of("preproc-variable")
        .map(|i| match &i.kind {
            ItemKind::PreprocVariable(v) => (i.name.as_str(), v.value.as_str()),
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(
        values,
        vec![
            ("first", "alpha"),
            ("named", ""),
            ("me", "show.i"),
            ("first", ""),
            ("named", "Total"),
            ("me", "show.i"),
        ]
    );
}

#[test]
fn test_self_include_stops_at_max_depth() {
    init_tracing();
    let resolver = MemoryResolver::new().with_file("loop.i", "DISPLAY 1.\n{loop.i}\n");
    let env = env_with(resolver).with_options(ParserOptions::new().with_max_include_depth(3));
    let result = parse("{loop.i}\n", None, &env);
    assert_eq!(result.includes.len(), 4);
    assert_eq!(result.line_info.len(), 2);
}
