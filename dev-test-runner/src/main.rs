//! Conformance runner over `fixtures/*.json`.
//!
//! Each fixture holds a JSON Schema `document` and either the expected
//! `declaration` or the expected `error` pointer. Every importable fixture is
//! also checked for emit → parse → emit idempotence, clone equality,
//! reference resolution and (unless `exportRoundTrip` is false) export →
//! import equality.
//!
//! Usage: `dev-test-runner [name-regex]`
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow, bail, ensure};
use colored::Colorize;
use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use schema_ir::{
    ReferenceRegistry, clone, emit_declaration, export_document, get_references, import_schema, is_equal,
    parse_declaration,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fixture {
    document: Value,
    #[serde(default)]
    declaration: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    references: IndexMap<String, Value>,
    #[serde(default = "default_true")]
    export_round_trip: bool,
}

fn default_true() -> bool {
    true
}

fn main() {
    let filter = match std::env::args().nth(1).map(|pattern| Regex::new(&pattern)) {
        None => None,
        Some(Ok(regex)) => Some(regex),
        Some(Err(error)) => {
            eprintln!("{} invalid filter: {error}", "error:".red().bold());
            std::process::exit(2);
        }
    };
    let fixtures = match fixture_paths() {
        Ok(paths) => paths,
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            std::process::exit(2);
        }
    };

    let mut failed = 0usize;
    let mut ran = 0usize;
    for path in fixtures {
        let name = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        if filter.as_ref().is_some_and(|f| !f.is_match(&name)) {
            continue;
        }
        ran += 1;
        match run_fixture(&path) {
            Ok(()) => eprintln!("{} {name}", "✅".green()),
            Err(error) => {
                failed += 1;
                eprintln!("{} {name}: {error:#}", "❌".red());
            }
        }
    }

    let summary = format!("{} passed, {failed} failed", ran - failed);
    if failed == 0 {
        eprintln!("{}", summary.green().bold());
    } else {
        eprintln!("{}", summary.red().bold());
        std::process::exit(1);
    }
}

fn fixture_paths() -> anyhow::Result<Vec<PathBuf>> {
    let pattern = format!("{}/fixtures/*.json", env!("CARGO_MANIFEST_DIR"));
    let mut paths = glob::glob(&pattern)?.collect::<Result<Vec<_>, _>>()?;
    paths.sort();
    Ok(paths)
}

fn run_fixture(path: &Path) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let fixture: Fixture = serde_json::from_str(&source).context("malformed fixture")?;

    let schema = match (import_schema(&fixture.document), &fixture.error) {
        (Err(error), Some(expected)) => {
            ensure!(&error.path == expected, "error at `{}`, expected `{expected}`", error.path);
            return Ok(());
        }
        (Ok(_), Some(expected)) => bail!("imported, expected an error at `{expected}`"),
        (Err(error), None) => return Err(error).context("import"),
        (Ok(schema), None) => schema,
    };

    // declaration
    let emitted = emit_declaration(&schema).context("emit")?;
    if let Some(expected) = &fixture.declaration {
        ensure!(&emitted == expected, "declaration differs\n  got:      {emitted}\n  expected: {expected}");
    }
    let parsed = parse_declaration(&emitted).context("parse")?;
    let re_emitted = emit_declaration(&parsed).context("re-emit")?;
    ensure!(re_emitted == emitted, "emission is not idempotent\n  first:  {emitted}\n  second: {re_emitted}");
    ensure!(is_equal(&parsed, &schema), "parsed declaration is not equal to the imported tree");

    // clone
    ensure!(is_equal(&clone(&schema), &schema), "clone is not equal to its source");

    // references
    let mut registry = ReferenceRegistry::new();
    for (uri, document) in &fixture.references {
        registry.register(uri.as_str(), import_schema(document).with_context(|| format!("reference {uri}"))?);
    }
    let uris = get_references(&schema);
    for uri in &uris {
        ensure!(fixture.references.contains_key(uri), "unexpected reference `{uri}`");
    }
    let resolved = registry.resolve(&schema).context("dereference")?;
    ensure!(get_references(&resolved).is_empty(), "references left after dereference");
    if uris.is_empty() {
        ensure!(is_equal(&resolved, &schema), "dereference changed a tree without references");
    }

    // export
    if fixture.export_round_trip {
        let exported = export_document(&schema).context("export")?;
        let reimported = import_schema(&exported).map_err(|e| anyhow!("{e}\n  exported: {exported}"))?;
        ensure!(
            is_equal(&reimported, &schema),
            "export → import is not equal\n  exported: {exported}\n  back: {}",
            emit_declaration(&reimported).unwrap_or_default()
        );
    }
    Ok(())
}
