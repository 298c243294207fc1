use viml_engine::regex::{self, CompiledPattern, MatchError};

fn compile(pattern: &str) -> CompiledPattern {
    regex::compile(pattern, false).expect("pattern should compile")
}

fn find(pattern: &str, text: &str) -> Option<(usize, usize)> {
    compile(pattern)
        .find_from(text, 0)
        .expect("match should not abort")
        .map(|m| (m.start, m.end))
}

fn match_at(pattern: &str, text: &str, offset: usize) -> Option<(usize, usize)> {
    compile(pattern)
        .match_at(text, offset)
        .expect("match should not abort")
        .map(|m| (m.start, m.end))
}

#[test]
fn greedy_star_spans_the_whole_string() {
    assert_eq!(match_at("a*b", "aaab", 0), Some((0, 4)));
}

#[test]
fn caret_only_matches_at_line_starts() {
    assert_eq!(match_at("^b", "ab", 0), None);
    assert_eq!(find("^b", "ab"), None);
    assert_eq!(match_at("^a", "ab", 0), Some((0, 1)));
    // After a newline, ^ matches again.
    assert_eq!(find("^bar", "foo\nbar"), Some((4, 7)));
}

#[test]
fn dollar_matches_line_ends() {
    assert_eq!(find("b$", "ab"), Some((1, 2)));
    // End of a line, not just end of text.
    assert_eq!(find("foo$", "foo\nbar"), Some((0, 3)));
    assert_eq!(find("ba$", "bar"), None);
}

#[test]
fn offset_at_or_past_the_end_is_no_match() {
    let pattern = compile("a");
    assert_eq!(pattern.match_at("abc", 3).expect("no abort"), None);
    assert_eq!(pattern.match_at("abc", 100).expect("no abort"), None);
}

#[test]
fn alternation_takes_the_leftmost_match() {
    assert_eq!(find("cat\\|dog", "hotdog"), Some((3, 6)));
    assert_eq!(find("aa\\|a", "baa"), Some((1, 3)));
}

#[test]
fn groups_record_capture_offsets() {
    let m = compile("\\(a\\+\\)\\(b\\)")
        .match_at("aab", 0)
        .expect("no abort")
        .expect("should match");
    assert_eq!((m.start, m.end), (0, 3));
    assert_eq!(m.group(1), Some((0, 2)));
    assert_eq!(m.group(2), Some((2, 3)));
    assert_eq!(m.group(3), None);
}

#[test]
fn backreference_repeats_the_captured_text() {
    assert_eq!(find("\\(ab\\)\\1", "xabab"), Some((1, 5)));
    assert_eq!(find("\\(ab\\)\\1", "xabac"), None);
}

#[test]
fn counted_repeats_greedy_and_lazy() {
    assert_eq!(match_at("a\\{1,3}", "aaaa", 0), Some((0, 3)));
    assert_eq!(match_at("a\\{-1,3}", "aaaa", 0), Some((0, 1)));
    assert_eq!(match_at("a\\{2}", "aaa", 0), Some((0, 2)));
    assert_eq!(match_at("a\\{4}", "aaa", 0), None);
}

#[test]
fn optional_atom() {
    let colour = compile("colou\\=r");
    assert!(colour.find_from("color", 0).expect("no abort").is_some());
    assert!(colour.find_from("colour", 0).expect("no abort").is_some());
}

#[test]
fn character_classes() {
    assert_eq!(find("\\d\\+", "ab123cd"), Some((2, 5)));
    assert_eq!(find("\\u", "abcDef"), Some((3, 4)));
    assert_eq!(find("[0-9a-f]\\+", "zz3fz"), Some((2, 4)));
    assert_eq!(find("[^a]\\+", "aaxy"), Some((2, 4)));
}

#[test]
fn any_char_does_not_cross_newlines() {
    assert_eq!(find("a.c", "abc"), Some((0, 3)));
    assert_eq!(find("a.c", "a\nc"), None);
}

#[test]
fn word_boundaries() {
    assert_eq!(find("\\<cat\\>", "a cat!"), Some((2, 5)));
    assert_eq!(find("\\<cat\\>", "concatenate"), None);
}

#[test]
fn case_mode_comes_from_the_flag_or_the_pattern() {
    assert!(regex::compile("abc", true)
        .expect("compiles")
        .find_from("xABC", 0)
        .expect("no abort")
        .is_some());
    // Embedded \c overrides a case-sensitive default.
    assert!(regex::compile("\\cabc", false)
        .expect("compiles")
        .find_from("ABC", 0)
        .expect("no abort")
        .is_some());
    // And \C wins over an ignore-case default.
    assert!(regex::compile("\\Cabc", true)
        .expect("compiles")
        .find_from("ABC", 0)
        .expect("no abort")
        .is_none());
}

#[test]
fn invalid_patterns_fail_to_compile() {
    assert!(regex::compile("\\(ab", false).is_err());
    assert!(regex::compile("a\\{2,1}", false).is_err());
    assert!(regex::compile("[abc", false).is_err());
    assert!(regex::compile("\\+", false).is_err());

    let err = regex::compile("\\(ab", false).expect_err("should fail");
    assert!(err.to_string().contains("E383"));
}

#[test]
fn escaped_metacharacters_are_literal() {
    assert_eq!(find("a\\.b", "a.b"), Some((0, 3)));
    assert_eq!(find("a\\.b", "axb"), None);
    assert_eq!(find("a\\*", "a*"), Some((0, 2)));
}

#[test]
fn star_at_pattern_start_is_literal() {
    assert_eq!(find("*x", "a*x"), Some((1, 3)));
}

#[test]
fn exhausting_the_budget_aborts_instead_of_hanging() {
    let pattern = compile("a\\+b");
    let text = "a".repeat(64);
    let mut budget = 5usize;
    let outcome = pattern.find_from_with_budget(&text, 0, &mut budget);
    assert_eq!(outcome, Err(MatchError::BudgetExhausted));
}

#[test]
fn matching_is_reentrant_over_one_compiled_pattern() {
    // The automaton is read-only shared state; every call owns its own
    // traversal state, so interleaved matches see consistent results.
    let pattern = compile("b\\+");
    let first = pattern.find_from("abbc", 0).expect("no abort").expect("match");
    let second = pattern.find_from("zzbb", 0).expect("no abort").expect("match");
    assert_eq!((first.start, first.end), (1, 3));
    assert_eq!((second.start, second.end), (2, 4));
}
