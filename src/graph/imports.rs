// src/graph/imports.rs

//! Lightweight static import scanner for consumer modules.

use std::sync::LazyLock;

use regex::Regex;

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Static `import ... from "x"`, bare `import "x"`, `export ... from "x"`
    // and `import("x")` with a literal specifier.
    Regex::new(
        r#"(?m)(?:^|[;\s])(?:import\s+(?:[\w$*{}\s,]+?\s+from\s+)?|export\s+(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s+from\s+|import\s*\(\s*)["']([^"'\n]+)["']"#,
    )
    .expect("import scanner regex is valid")
});

/// Module specifiers referenced by `code`, in order of first appearance.
pub fn parse_imports(code: &str) -> Vec<String> {
    let mut specifiers: Vec<String> = Vec::new();
    for caps in IMPORT_RE.captures_iter(code) {
        if let Some(spec) = caps.get(1) {
            let spec = spec.as_str().to_string();
            if !specifiers.contains(&spec) {
                specifiers.push(spec);
            }
        }
    }
    specifiers
}

/// `.js`, `.jsx`, `.ts`, `.tsx`, `.mjs`, `.cjs`, ignoring any query or hash.
pub fn is_javascript_like(id: &str) -> bool {
    let clean = id.split(['?', '#']).next().unwrap_or(id);
    let Some((_, ext)) = clean.rsplit_once('.') else {
        return false;
    };
    matches!(ext, "js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs")
}
