//! Structural tests for architectural boundary enforcement.
//!
//! These tests scan source files to verify that the layer boundaries hold:
//! domain is pure, application talks only to ports, infra never prints.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    /// Process a line and return `true` if it's inside a `#[cfg(test)]` block.
    fn process_line(&mut self, line: &str) -> bool {
        if line.trim().contains("#[cfg(test)]") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

/// Non-comment lines outside `#[cfg(test)]` blocks, with 1-based line numbers.
fn production_lines(path: &Path) -> Vec<(usize, String)> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let mut tracker = CfgTestTracker::new();
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let in_test = tracker.process_line(line);
            let trimmed = line.trim();
            let comment = trimmed.starts_with("//") || trimmed.starts_with("/*");
            (!in_test && !comment).then(|| (i + 1, line.to_string()))
        })
        .collect()
}

fn src_dir(layer: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join(layer)
}

fn relative(file: &Path) -> String {
    file.strip_prefix(env!("CARGO_MANIFEST_DIR"))
        .unwrap_or(file)
        .display()
        .to_string()
}

/// Every production line in `layer` containing one of `forbidden`.
fn violations(layer: &str, forbidden: &[&str], skip_file: impl Fn(&Path) -> bool) -> Vec<String> {
    let mut found = Vec::new();
    for file in collect_rs_files(&src_dir(layer)) {
        if skip_file(&file) {
            continue;
        }
        for (lineno, line) in production_lines(&file) {
            for needle in forbidden {
                if line.contains(needle) {
                    found.push(format!("{}:{lineno}: `{needle}`: {}", relative(&file), line.trim()));
                }
            }
        }
    }
    found
}

fn is_test_support(path: &Path) -> bool {
    path.file_name().is_some_and(|n| n == "test_support.rs")
}

#[test]
fn domain_is_pure() {
    let found = violations(
        "domain",
        &[
            "tokio",
            "std::fs",
            "std::net",
            "std::process",
            "crate::infra",
            "crate::application",
            "crate::commands",
            "crate::output",
        ],
        |_| false,
    );
    assert!(found.is_empty(), "domain/ must not do I/O:\n{}", found.join("\n"));
}

#[test]
fn application_has_no_infra_or_output_imports() {
    let found = violations(
        "application",
        &["crate::infra", "crate::output", "crate::commands"],
        is_test_support,
    );
    assert!(
        found.is_empty(),
        "application/ must depend only on domain and ports:\n{}",
        found.join("\n")
    );
}

#[test]
fn application_has_no_blocking_io() {
    let found = violations(
        "application",
        &["std::fs::", "std::process::Command", "std::net::TcpStream"],
        is_test_support,
    );
    assert!(
        found.is_empty(),
        "application/ must reach the outside world through ports:\n{}",
        found.join("\n")
    );
}

#[test]
fn infra_has_no_print_macros_or_presentation_imports() {
    let found = violations(
        "infra",
        &["println!", "eprintln!", "print!(", "crate::output", "crate::commands"],
        |_| false,
    );
    assert!(
        found.is_empty(),
        "infra/ reports through tracing, never stdout:\n{}",
        found.join("\n")
    );
}

#[test]
fn no_inline_json_branching_in_commands() {
    let mut found = Vec::new();
    for file in collect_rs_files(&src_dir("commands")) {
        for (lineno, line) in production_lines(&file) {
            let trimmed = line.trim();
            if line.contains("json: bool")
                || trimmed.starts_with("if json")
                || trimmed.starts_with("if app.is_json()")
            {
                found.push(format!("{}:{lineno}: {trimmed}", relative(&file)));
            }
        }
    }
    assert!(
        found.is_empty(),
        "commands/ must render through app.renderer():\n{}",
        found.join("\n")
    );
}

#[test]
fn no_dead_code_allows_in_layers() {
    let mut found = Vec::new();
    for layer in ["domain", "application", "infra", "commands", "output"] {
        found.extend(violations(layer, &["allow(dead_code)"], |_| false));
    }
    assert!(found.is_empty(), "unused code should be removed:\n{}", found.join("\n"));
}

#[test]
fn services_take_ports_not_adapters() {
    let adapters = [
        "TokioCommandRunner",
        "HostFs",
        "FtpConnector",
        "FtpClient",
        "TelnetConnector",
        "JsonMetricsStore",
        "TerminalReporter",
    ];
    let found = violations("application", &adapters, is_test_support);
    assert!(
        found.is_empty(),
        "application services must be generic over port traits:\n{}",
        found.join("\n")
    );
}
