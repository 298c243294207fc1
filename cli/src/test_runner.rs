use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use viml_engine::{BufferEditor, Engine, ExecutionResult, VimEditor};

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Initial buffer text.
    #[serde(default)]
    pub buffer: String,

    /// Initial caret offset in characters.
    #[serde(default)]
    pub caret: usize,

    /// Expected buffer text after the script runs (trimmed comparison).
    #[serde(default)]
    pub expect_buffer: Option<String>,

    /// Expected status messages, in order; each entry is a substring of
    /// the corresponding message.
    #[serde(default)]
    pub expect_messages: Option<Vec<String>>,

    /// The script must fail and its last message must contain this.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// If true, the test expects parsing to fail.
    #[serde(default)]
    pub expect_parse_error: bool,
}

/// Parse a `.test.vim` file into its TOML frontmatter and script body.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}'); // strip BOM

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest_start = close_pos + 4; // skip \n---
    let source = after_open[rest_start..]
        .strip_prefix("\r\n")
        .or_else(|| after_open[rest_start..].strip_prefix('\n'))
        .unwrap_or(&after_open[rest_start..]);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };
    let description = config.description.clone();

    let parser = viml::parser::Parser::new(source.to_string(), 0);
    let parse_result = parser.parse();

    if config.expect_parse_error {
        return TestResult {
            path: path.to_path_buf(),
            description,
            outcome: match parse_result {
                Err(_) => TestOutcome::Pass,
                Ok(_) => TestOutcome::Fail("expected parse error, but parsing succeeded".into()),
            },
        };
    }

    let script = match parse_result {
        Ok(s) => s,
        Err(errors) => {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return fail(
                description,
                format!("unexpected parse error: {}", msgs.join("; ")),
            );
        }
    };

    let mut engine = Engine::new();
    let mut editor = BufferEditor::new(config.buffer.clone());
    editor.set_caret_offset(config.caret);

    let result = engine.execute_script(&script, &mut editor);
    let messages: Vec<String> = engine.messages.drain();

    // Error expectation
    match (&config.expect_error, result) {
        (Some(expected), ExecutionResult::Error) => {
            let last = messages.last().cloned().unwrap_or_default();
            if !last.contains(expected.as_str()) {
                return fail(
                    description,
                    format!("expected error containing \"{}\", got: {}", expected, last),
                );
            }
        }
        (Some(expected), _) => {
            return fail(
                description,
                format!(
                    "expected error containing \"{}\", but execution succeeded",
                    expected
                ),
            );
        }
        (None, ExecutionResult::Error) => {
            let last = messages.last().cloned().unwrap_or_default();
            return fail(description, format!("unexpected error: {}", last));
        }
        (None, _) => {}
    }

    // Buffer expectation
    if let Some(expected_buffer) = &config.expect_buffer {
        let actual = editor.text().trim_end();
        let expected = expected_buffer.trim_end();
        if actual != expected {
            return fail(
                description,
                format!(
                    "buffer mismatch\n  expected: {:?}\n  actual:   {:?}",
                    expected, actual
                ),
            );
        }
    }

    // Message expectations
    if let Some(expected_messages) = &config.expect_messages {
        if messages.len() != expected_messages.len() {
            return fail(
                description,
                format!(
                    "expected {} message(s), got {}: {:?}",
                    expected_messages.len(),
                    messages.len(),
                    messages
                ),
            );
        }
        for (i, (actual, expected)) in messages.iter().zip(expected_messages).enumerate() {
            if !actual.contains(expected.as_str()) {
                return fail(
                    description,
                    format!(
                        "message[{}]: expected substring \"{}\", got: {}",
                        i, expected, actual
                    ),
                );
            }
        }
    }

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Pass,
    }
}

/// Discover `.test.vim` files grouped by category (subfolder relative
/// to root). Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(".test.vim") {
                let category = path
                    .parent()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                out.entry(category).or_default().push(path);
            }
        }
    }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.vim files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        let label = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!("  {} ({} tests)", label, files.len());
    }
}

fn pass_label(no_color: bool) -> &'static str {
    if no_color { "PASS" } else { "\x1b[32mPASS\x1b[0m" }
}

fn fail_label(no_color: bool) -> &'static str {
    if no_color { "FAIL" } else { "\x1b[31mFAIL\x1b[0m" }
}

fn bold(s: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[1m{}\x1b[0m", s)
    }
}

/// Run all `.test.vim` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    // Single file mode — ignore categories
    if path.is_file() {
        let result = run_single_test(path);
        let label = result.description.as_deref().unwrap_or_else(|| {
            path.file_stem().and_then(|s| s.to_str()).unwrap_or("?")
        });
        return match &result.outcome {
            TestOutcome::Pass => {
                eprintln!("  {}  {}", pass_label(no_color), label);
                eprintln!();
                eprintln!(
                    "test result: {}. 1 passed, 0 failed",
                    if no_color { "ok" } else { "\x1b[32mok\x1b[0m" }
                );
                0
            }
            TestOutcome::Fail(reason) => {
                eprintln!("  {}  {}", fail_label(no_color), label);
                eprintln!();
                eprintln!("failures:");
                eprintln!();
                eprintln!("  --- {} ---", path.display());
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
                eprintln!();
                eprintln!(
                    "test result: {}. 0 passed, 1 failed (of 1)",
                    if no_color { "FAILED" } else { "\x1b[31mFAILED\x1b[0m" }
                );
                1
            }
        };
    }

    let all_categories = discover_categorized(path);

    if all_categories.is_empty() {
        eprintln!("no .test.vim files found in {}", path.display());
        return 1;
    }

    // Filter categories if specified
    let run_categories: BTreeMap<&str, &Vec<PathBuf>> = if categories.is_empty() {
        all_categories.iter().map(|(k, v)| (k.as_str(), v)).collect()
    } else {
        let mut filtered = BTreeMap::new();
        for requested in categories {
            let req = requested.trim_matches('/');
            let mut found = false;
            for (cat, files) in &all_categories {
                if cat == req || cat.starts_with(&format!("{}/", req)) {
                    filtered.insert(cat.as_str(), files);
                    found = true;
                }
            }
            if !found {
                eprintln!(
                    "warning: category '{}' not found (available: {})",
                    req,
                    all_categories
                        .keys()
                        .map(|k| if k.is_empty() { "(root)" } else { k.as_str() })
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        }
        filtered
    };

    if run_categories.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &run_categories {
        let header = if cat.is_empty() {
            "(root)".to_string()
        } else {
            cat.to_string()
        };
        eprintln!();
        eprintln!("{}", bold(&header, no_color));

        for file in *files {
            let result = run_single_test(file);
            let label = result.description.as_deref().unwrap_or_else(|| {
                file.file_stem().and_then(|s| s.to_str()).unwrap_or("?")
            });

            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", pass_label(no_color), label);
                }
                TestOutcome::Fail(_) => {
                    failed += 1;
                    eprintln!("  {}  {}", fail_label(no_color), label);
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let TestOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failed == 0 {
        if no_color {
            eprintln!("test result: ok. {} passed, 0 failed", passed);
        } else {
            eprintln!("test result: \x1b[32mok\x1b[0m. {} passed, 0 failed", passed);
        }
        0
    } else {
        let total = passed + failed;
        if no_color {
            eprintln!(
                "test result: FAILED. {} passed, {} failed (of {})",
                passed, failed, total
            );
        } else {
            eprintln!(
                "test result: \x1b[31mFAILED\x1b[0m. {} passed, {} failed (of {})",
                passed, failed, total
            );
        }
        1
    }
}
