mod common;

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use indoc::indoc;
use tower_lsp::lsp_types::Range;

use clarion_language_server::config::{IndexConfig, ProjectConfig};
use clarion_language_server::project::{FsSourceIndex, InMemoryIndex, StaticProject};

use common::resolve_at;

#[test]
fn test_structure_field_beats_global_label() {
    let source = indoc! {"
        Name          STRING(20)
        CustomerQueue QUEUE
        Name            STRING(30)
                      END
        Main PROCEDURE
          CODE
          CustomerQueue.Name = 'x'
          Name = 'y'
    "};
    let index = Arc::new(InMemoryIndex::new().with_file("/app/Main.clw", source));

    let field = resolve_at(index.clone(), "/app/Main.clw", 6, ".Name", 1).expect("field");
    assert_eq!(field.range.start.line, 2);

    let global = resolve_at(index, "/app/Main.clw", 7, "Name", 0).expect("global");
    assert_eq!(global.range.start.line, 0);
}

#[test]
fn test_prefixed_field_reference() {
    let source = indoc! {"
        Invoice GROUP,PRE(Inv)
        Total     DECIMAL(9,2)
                END
        Total   LONG
          CODE
          Inv:Total = 0
    "};
    let index = Arc::new(InMemoryIndex::new().with_file("/app/Main.clw", source));
    let location = resolve_at(index, "/app/Main.clw", 5, "Total", 0).expect("field");
    assert_eq!(location.range.start.line, 1);
}

#[test]
fn test_mutual_includes_terminate() {
    let index = InMemoryIndex::new()
        .with_file("/app/Main.clw", "  INCLUDE('A.inc')\n  CODE\n  x = Missing\n")
        .with_file("/app/A.inc", "  INCLUDE('B.inc')\n")
        .with_file("/app/B.inc", "  INCLUDE('A.inc')\n");
    assert_eq!(resolve_at(Arc::new(index), "/app/Main.clw", 2, "Missing", 0), None);
}

#[test]
fn test_member_file_sees_program_globals() {
    let index = InMemoryIndex::new()
        .with_file("/app/Main.clw", "Total LONG\n  CODE\n")
        .with_file(
            "/app/Util.clw",
            indoc! {"
                  MEMBER('Main.clw')
                Helper PROCEDURE
                  CODE
                  Total = 1
            "},
        );
    let location = resolve_at(Arc::new(index), "/app/Util.clw", 3, "Total", 0).expect("global");
    assert_eq!(location.path, PathBuf::from("/app/Main.clw"));
    assert_eq!(location.range.start.line, 0);
}

#[test]
fn test_project_source_files_are_searched() {
    let index = InMemoryIndex::new()
        .with_file("/app/Main.clw", "  CODE\n  Shared = 2\n")
        .with_file("/app/Lib.clw", "  MEMBER()\nShared LONG\n")
        .with_project(StaticProject::new("App", "/app").with_source("Main.clw").with_source("Lib.clw"));
    let location = resolve_at(Arc::new(index), "/app/Main.clw", 1, "Shared", 0).expect("project global");
    assert_eq!(location.path, PathBuf::from("/app/Lib.clw"));
    assert_eq!(location.range.start.line, 1);
}

#[test]
fn test_filesystem_project_with_search_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("app");
    fs::create_dir_all(root.join("inc")).expect("mkdir");
    fs::write(
        root.join("Main.clw"),
        "  INCLUDE('Keys.inc'),ONCE\n  CODE\n  IF KEYCODE() = KeyEsc THEN RETURN.\n",
    )
    .expect("write");
    fs::write(root.join("inc").join("Keys.inc"), "KeyEsc EQUATE(27)\n").expect("write");

    let config = IndexConfig {
        projects: vec![ProjectConfig {
            name: "App".to_string(),
            root: root.clone(),
            source_files: None,
            search_paths: HashMap::from([(".inc".to_string(), vec![root.join("inc")])]),
        }],
        ..IndexConfig::default()
    };
    let index = Arc::new(FsSourceIndex::from_config(&config).expect("index"));
    let main = root.join("Main.clw");
    let main = main.to_str().expect("utf-8 path");

    let equate = resolve_at(index.clone(), main, 2, "KeyEsc", 0).expect("equate");
    assert!(equate.path.ends_with("inc/Keys.inc"));
    assert_eq!(equate.range.start.line, 0);

    let file = resolve_at(index, main, 0, "Keys", 1).expect("include target");
    assert!(file.path.ends_with("inc/Keys.inc"));
    assert_eq!(file.range, Range::default());
}
