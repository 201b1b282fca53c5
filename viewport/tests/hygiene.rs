//! Hygiene: source-level budgets for the viewport crate.
//!
//! Scans `src/` (excluding `*_test.rs`) for patterns that either crash the
//! host process or silently drop errors. The viewport runs inside every
//! session loop, so each budget is zero and stays zero.

use std::fs;
use std::path::Path;

struct SourceFile {
    path: String,
    content: String,
}

fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
        } else if path.extension().is_some_and(|e| e == "rs") {
            let path_str = path.to_string_lossy().to_string();
            if path_str.ends_with("_test.rs") {
                continue;
            }
            if let Ok(content) = fs::read_to_string(&path) {
                out.push(SourceFile { path: path_str, content });
            }
        }
    }
}

/// Fail with a per-file breakdown when `pattern` appears on more than `max` lines.
fn assert_budget(pattern: &str, max: usize) {
    let files = source_files();
    assert!(!files.is_empty(), "no sources found; run from the crate root");

    let hits: Vec<(String, usize)> = files
        .iter()
        .map(|f| (f.path.clone(), f.content.lines().filter(|l| l.contains(pattern)).count()))
        .filter(|(_, n)| *n > 0)
        .collect();
    let count: usize = hits.iter().map(|(_, n)| n).sum();
    let breakdown = hits.iter().map(|(p, n)| format!("  {p}: {n}")).collect::<Vec<_>>().join("\n");

    assert!(count <= max, "`{pattern}` budget exceeded: found {count}, max {max}.\n{breakdown}");
}

// Panics.

#[test]
fn unwrap_budget() {
    assert_budget(".unwrap()", 0);
}

#[test]
fn expect_budget() {
    assert_budget(".expect(", 0);
}

#[test]
fn panic_budget() {
    assert_budget("panic!(", 0);
}

#[test]
fn unreachable_budget() {
    assert_budget("unreachable!(", 0);
}

#[test]
fn todo_budget() {
    assert_budget("todo!(", 0);
}

#[test]
fn unimplemented_budget() {
    assert_budget("unimplemented!(", 0);
}

// Silent loss.

#[test]
fn silent_discard_budget() {
    assert_budget("let _ =", 0);
}

#[test]
fn dot_ok_budget() {
    assert_budget(".ok()", 0);
}

// Structure.

#[test]
fn allow_dead_code_budget() {
    assert_budget("#[allow(dead_code)]", 0);
}

/// Matches `max_width` in the workspace `rustfmt.toml`.
const MAX_LINE_WIDTH: usize = 120;

#[test]
fn line_width_budget() {
    let long: Vec<String> = source_files()
        .iter()
        .flat_map(|f| {
            f.content
                .lines()
                .enumerate()
                .filter(|(_, l)| l.chars().count() > MAX_LINE_WIDTH)
                .map(move |(i, _)| format!("  {}:{}", f.path, i + 1))
        })
        .collect();
    assert!(long.is_empty(), "lines wider than {MAX_LINE_WIDTH} columns:\n{}", long.join("\n"));
}
