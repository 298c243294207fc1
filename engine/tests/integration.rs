use viml_engine::{
    BufferEditor, Engine, ExecutionResult, LocationInfo, VimEditor, VimValue,
};

fn run(source: &str) -> (Engine, BufferEditor) {
    let mut engine = Engine::new();
    let mut editor = BufferEditor::new("");
    let result = engine.execute(source, &mut editor);
    assert_eq!(
        result,
        ExecutionResult::Success,
        "script failed: {:?}",
        engine.messages.last()
    );
    (engine, editor)
}

fn run_in(buffer: &str, source: &str) -> (Engine, BufferEditor, ExecutionResult) {
    let mut engine = Engine::new();
    let mut editor = BufferEditor::new(buffer);
    let result = engine.execute(source, &mut editor);
    (engine, editor, result)
}

fn eval(source: &str) -> VimValue {
    let mut engine = Engine::new();
    let mut editor = BufferEditor::new("");
    engine
        .evaluate(source, &mut editor)
        .expect("evaluation failed")
}

fn eval_int(source: &str) -> i64 {
    match eval(source) {
        VimValue::Int(n) => n,
        other => panic!("expected Number, got {:?}", other),
    }
}

fn eval_str(source: &str) -> String {
    match eval(source) {
        VimValue::Str(s) => s,
        other => panic!("expected String, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Script execution
// ---------------------------------------------------------------------------

#[test]
fn empty_script_succeeds() {
    let (engine, _) = run("");
    assert!(engine.messages.is_empty());
    run("\" only a comment\n");
}

#[test]
fn units_after_the_first_error_never_run() {
    let (engine, _, result) = run_in(
        "",
        "let g:counter = 0\n\
         let g:counter += 1\n\
         call NoSuchFunction()\n\
         let g:counter += 1\n",
    );
    assert_eq!(result, ExecutionResult::Error);
    assert_eq!(engine.variables.get("counter"), Some(&VimValue::Int(1)));
    assert!(engine.messages.last().is_some_and(|m| m.contains("E117")));
}

#[test]
fn finish_stops_the_script_without_error() {
    let (engine, _, result) = run_in("", "let g:a = 1\nfinish\nlet g:a = 2\n");
    assert_eq!(result, ExecutionResult::Success);
    assert_eq!(engine.variables.get("a"), Some(&VimValue::Int(1)));
}

#[test]
fn break_outside_a_loop_is_an_error() {
    let (engine, _, result) = run_in("", "break\n");
    assert_eq!(result, ExecutionResult::Error);
    assert!(engine.messages.last().is_some_and(|m| m.contains("E587")));
}

// ---------------------------------------------------------------------------
// Operators & coercion
// ---------------------------------------------------------------------------

#[test]
fn case_insensitive_isnot_on_strings() {
    assert_eq!(eval_int("'AbC' isnot? 'abc'"), 0);
    assert_eq!(eval_int("'AbC' isnot? 'abd'"), 1);
}

#[test]
fn case_insensitive_isnot_falls_back_for_other_types() {
    assert_eq!(eval_int("1 isnot? 1"), 0);
    assert_eq!(eval_int("1 isnot? 2"), 1);
    // Distinct list instances are not the same value, whatever the case
    // mode says.
    assert_eq!(eval_int("[1] isnot? [1]"), 1);
}

#[test]
fn is_compares_container_identity() {
    let (engine, _) = run("let g:a = [1, 2]\nlet g:b = g:a\nlet g:same = g:b is g:a\nlet g:other = g:a is [1, 2]\n");
    assert_eq!(engine.variables.get("same"), Some(&VimValue::Int(1)));
    assert_eq!(engine.variables.get("other"), Some(&VimValue::Int(0)));
}

#[test]
fn equality_coerces_numbers_and_strings() {
    assert_eq!(eval_int("4 == '4'"), 1);
    assert_eq!(eval_int("4 == '5'"), 0);
    assert_eq!(eval_int("'abc' ==? 'ABC'"), 1);
    assert_eq!(eval_int("'abc' == 'ABC'"), 0);
    assert_eq!(eval_int("4 == 4.0"), 1);
}

#[test]
fn arithmetic_and_concat() {
    assert_eq!(eval_int("7 / 2"), 3);
    assert_eq!(eval_int("7 % 3"), 1);
    assert_eq!(eval_str("'a' . 'b' . 3"), "ab3");
    assert_eq!(eval_int("'12abc' + 1"), 13);
    assert!(matches!(eval("1.5 + 1"), VimValue::Float(x) if x == 2.5));
}

#[test]
fn division_by_zero_is_a_reported_error() {
    let mut engine = Engine::new();
    let mut editor = BufferEditor::new("");
    let err = engine.evaluate("1 / 0", &mut editor).expect_err("should fail");
    assert!(err.to_string().contains("E1154"));
}

#[test]
fn logic_short_circuits() {
    assert_eq!(eval_int("1 ? 2 : 3"), 2);
    assert_eq!(eval_int("0 || 2"), 1);
    // The right operand must not be evaluated at all.
    assert_eq!(eval_int("0 && undefined_variable"), 0);
    assert_eq!(eval_int("1 || undefined_variable"), 1);
}

#[test]
fn pattern_operators() {
    assert_eq!(eval_int("'foobar' =~ 'o\\+'"), 1);
    assert_eq!(eval_int("'foobar' !~ 'z'"), 1);
    assert_eq!(eval_int("'FOO' =~? 'foo'"), 1);
    assert_eq!(eval_int("'FOO' =~# 'foo'"), 0);
}

#[test]
fn comparing_a_list_with_a_number_is_an_error() {
    let mut engine = Engine::new();
    let mut editor = BufferEditor::new("");
    let err = engine.evaluate("[1] < 2", &mut editor).expect_err("should fail");
    assert!(err.to_string().contains("E691"));
}

// ---------------------------------------------------------------------------
// Values, lists, dictionaries
// ---------------------------------------------------------------------------

#[test]
fn list_indexing_and_slicing() {
    assert_eq!(eval_int("[1, 2, 3][1]"), 2);
    assert_eq!(eval_int("[1, 2, 3][-1]"), 3);
    assert_eq!(
        eval("[1, 2, 3, 4][1:2]"),
        VimValue::list(vec![VimValue::Int(2), VimValue::Int(3)])
    );
    assert_eq!(eval_str("'hello'[1]"), "e");
    assert_eq!(eval_str("'hello'[1:3]"), "ell");
}

#[test]
fn dict_access_and_builtins() {
    assert_eq!(eval_int("{'a': 1, 'b': 2}['b']"), 2);
    assert_eq!(eval_int("has_key({'a': 1}, 'a')"), 1);
    assert_eq!(eval_int("get({'a': 1}, 'missing', 42)"), 42);
    assert_eq!(eval_int("len({'a': 1, 'b': 2})"), 2);
}

#[test]
fn list_reference_semantics() {
    let (engine, _) = run("let g:a = [1]\nlet g:b = g:a\ncall add(g:b, 2)\nlet g:n = len(g:a)\n");
    assert_eq!(engine.variables.get("n"), Some(&VimValue::Int(2)));
}

#[test]
fn echo_formatting() {
    let (engine, _) = run("echo [1, 'two', [3]]");
    assert_eq!(engine.messages.last(), Some("[1, 'two', [3]]"));
    let (engine, _) = run("echo {'a': 1}");
    assert_eq!(engine.messages.last(), Some("{'a': 1}"));
    let (engine, _) = run("echo 'x' 42 1.5");
    assert_eq!(engine.messages.last(), Some("x 42 1.5"));
}

#[test]
fn string_builtins() {
    assert_eq!(eval_str("toupper('abc')"), "ABC");
    assert_eq!(eval_str("matchstr('foobar', 'o\\+')"), "oo");
    assert_eq!(eval_int("match('foobar', 'bar')"), 3);
    assert_eq!(eval_int("str2nr('42abc')"), 42);
    assert_eq!(eval_str("printf('%s=%d', 'n', 7)"), "n=7");
    assert_eq!(
        eval("split('a,b,,c', ',')"),
        VimValue::list(vec![
            VimValue::Str("a".into()),
            VimValue::Str("b".into()),
            VimValue::Str("c".into()),
        ])
    );
    assert_eq!(eval_int("type('x')"), 1);
    assert_eq!(eval_int("type([])"), 3);
}

// ---------------------------------------------------------------------------
// Scopes
// ---------------------------------------------------------------------------

#[test]
fn script_scope_is_private_to_one_execution() {
    let mut engine = Engine::new();
    let mut editor = BufferEditor::new("");

    let result = engine.execute("let s:x = 1\necho s:x", &mut editor);
    assert_eq!(result, ExecutionResult::Success);
    assert_eq!(engine.messages.last(), Some("1"));

    // A fresh script parsed from the same engine does not see s:x —
    // neither by prefix nor through the unprefixed chain.
    let result = engine.execute("echo s:x", &mut editor);
    assert_eq!(result, ExecutionResult::Error);
    let result = engine.execute("echo x", &mut editor);
    assert_eq!(result, ExecutionResult::Error);
    assert!(engine.messages.last().is_some_and(|m| m.contains("E121")));
}

#[test]
fn globals_persist_across_scripts() {
    let mut engine = Engine::new();
    let mut editor = BufferEditor::new("");
    assert_eq!(
        engine.execute("let g:v = 5", &mut editor),
        ExecutionResult::Success
    );
    assert_eq!(
        engine.execute("echo g:v", &mut editor),
        ExecutionResult::Success
    );
    assert_eq!(engine.messages.last(), Some("5"));
}

#[test]
fn function_locals_shadow_outer_scopes() {
    let (engine, _) = run(
        "let g:x = 'global'
function! Probe()
  let x = 'local'
  return x
endfunction
let g:seen = Probe()
let g:after = g:x
",
    );
    assert_eq!(
        engine.variables.get("seen"),
        Some(&VimValue::Str("local".to_string()))
    );
    assert_eq!(
        engine.variables.get("after"),
        Some(&VimValue::Str("global".to_string()))
    );
}

#[test]
fn unprefixed_lookup_walks_to_globals() {
    let (engine, _) = run(
        "let g:shared = 7
function! Read()
  return shared
endfunction
let g:got = Read()
",
    );
    assert_eq!(engine.variables.get("got"), Some(&VimValue::Int(7)));
}

#[test]
fn unlet_removes_a_binding() {
    let (engine, _, result) = run_in("", "let g:tmp = 1\nunlet g:tmp\necho g:tmp\n");
    assert_eq!(result, ExecutionResult::Error);
    assert!(engine.messages.last().is_some_and(|m| m.contains("E121")));

    let (engine, _, result) = run_in("", "unlet g:never\n");
    assert_eq!(result, ExecutionResult::Error);
    assert!(engine.messages.last().is_some_and(|m| m.contains("E108")));
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

#[test]
fn user_functions_take_arguments_and_return() {
    let (engine, _) = run(
        "function! Add(a, b)
  return a:a + a:b
endfunction
let g:sum = Add(40, 2)
",
    );
    assert_eq!(engine.variables.get("sum"), Some(&VimValue::Int(42)));
}

#[test]
fn script_local_functions_do_not_leak() {
    let mut engine = Engine::new();
    let mut editor = BufferEditor::new("");
    let result = engine.execute(
        "function! s:Helper(x)\n  return a:x + 1\nendfunction\necho s:Helper(41)",
        &mut editor,
    );
    assert_eq!(result, ExecutionResult::Success);
    assert_eq!(engine.messages.last(), Some("42"));

    let result = engine.execute("echo s:Helper(1)", &mut editor);
    assert_eq!(result, ExecutionResult::Error);
    assert!(engine.messages.last().is_some_and(|m| m.contains("E117")));
}

#[test]
fn wrong_arity_is_an_error() {
    let (engine, _, result) = run_in(
        "",
        "function! One(a)\n  return a:a\nendfunction\ncall One(1, 2)\n",
    );
    assert_eq!(result, ExecutionResult::Error);
    assert!(engine.messages.last().is_some_and(|m| m.contains("E118")));
}

#[test]
fn funcrefs_call_through_variables() {
    let (engine, _) = run(
        "function! Double(x)
  return a:x * 2
endfunction
let g:F = function('Double')
let g:out = F(21)
",
    );
    assert_eq!(engine.variables.get("out"), Some(&VimValue::Int(42)));
}

#[test]
fn runaway_recursion_is_cut_off() {
    let (engine, _, result) = run_in(
        "",
        "function! Loop()\n  return Loop()\nendfunction\ncall Loop()\n",
    );
    assert_eq!(result, ExecutionResult::Error);
    assert!(engine.messages.last().is_some_and(|m| m.contains("E132")));
}

// ---------------------------------------------------------------------------
// Control flow
// ---------------------------------------------------------------------------

#[test]
fn while_for_break_continue() {
    let (engine, _) = run(
        "let g:sum = 0
let g:i = 0
while g:i < 10
  let g:i += 1
  if g:i % 2
    continue
  endif
  if g:i > 6
    break
  endif
  let g:sum += g:i
endwhile
",
    );
    // 2 + 4 + 6
    assert_eq!(engine.variables.get("sum"), Some(&VimValue::Int(12)));

    let (engine, _) = run(
        "let g:total = 0\nfor n in [1, 2, 3]\n  let g:total += n\nendfor\n",
    );
    assert_eq!(engine.variables.get("total"), Some(&VimValue::Int(6)));
}

#[test]
fn elseif_chain_picks_the_first_truthy_branch() {
    let (engine, _) = run(
        "let g:x = 2
if g:x == 1
  let g:which = 'one'
elseif g:x == 2
  let g:which = 'two'
else
  let g:which = 'other'
endif
",
    );
    assert_eq!(
        engine.variables.get("which"),
        Some(&VimValue::Str("two".to_string()))
    );
}

#[test]
fn try_catch_by_error_code() {
    let (engine, _) = run(
        "let g:caught = ''
try
  call Missing()
catch /E117/
  let g:caught = 'yes'
endtry
",
    );
    assert_eq!(
        engine.variables.get("caught"),
        Some(&VimValue::Str("yes".to_string()))
    );
}

#[test]
fn uncaught_patterns_propagate_and_finally_runs() {
    let (engine, _, result) = run_in(
        "",
        "let g:cleanup = 0
try
  call Missing()
catch /E999/
  let g:never = 1
finally
  let g:cleanup = 1
endtry
",
    );
    assert_eq!(result, ExecutionResult::Error);
    assert_eq!(engine.variables.get("cleanup"), Some(&VimValue::Int(1)));
    assert_eq!(engine.variables.get("never"), None);
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[test]
fn delcommand_on_missing_alias_reports_e184() {
    let (engine, _, result) = run_in("", "delcommand nonexistent");
    assert_eq!(result, ExecutionResult::Error);
    assert_eq!(
        engine.messages.last(),
        Some("E184: No such user-defined command: nonexistent")
    );
}

#[test]
fn define_use_and_delete_an_alias() {
    let mut engine = Engine::new();
    let mut editor = BufferEditor::new("");

    assert_eq!(
        engine.execute("command Greet echo 'hi'", &mut editor),
        ExecutionResult::Success
    );
    assert!(engine.commands.aliases.has_alias("Greet"));

    assert_eq!(engine.execute("Greet", &mut editor), ExecutionResult::Success);
    assert_eq!(engine.messages.last(), Some("hi"));

    // Unambiguous prefixes of user commands dispatch too.
    assert_eq!(engine.execute("Gre", &mut editor), ExecutionResult::Success);

    assert_eq!(
        engine.execute("delcommand Greet", &mut editor),
        ExecutionResult::Success
    );
    assert!(!engine.commands.aliases.has_alias("Greet"));
}

#[test]
fn redefining_an_alias_requires_bang() {
    let mut engine = Engine::new();
    let mut editor = BufferEditor::new("");
    engine.execute("command Two echo 2", &mut editor);
    assert_eq!(
        engine.execute("command Two echo 3", &mut editor),
        ExecutionResult::Error
    );
    assert!(engine.messages.last().is_some_and(|m| m.contains("E174")));
    assert_eq!(
        engine.execute("command! Two echo 3", &mut editor),
        ExecutionResult::Success
    );
}

#[test]
fn builtin_abbreviations_follow_the_prefix_rule() {
    let (engine, _) = run("ec 'short'");
    assert_eq!(engine.messages.last(), Some("short"));

    // `:delc` is delcommand, not delete.
    let (engine, _, result) = run_in("x\n", "delc Gone");
    assert_eq!(result, ExecutionResult::Error);
    assert!(engine.messages.last().is_some_and(|m| m.contains("E184")));
}

#[test]
fn flag_validation_rejects_bad_invocations() {
    let (engine, _, result) = run_in("a\nb\n", "1,2echo 'x'");
    assert_eq!(result, ExecutionResult::Error);
    assert!(engine.messages.last().is_some_and(|m| m.contains("E481")));

    let (engine, _, result) = run_in("", "delcommand");
    assert_eq!(result, ExecutionResult::Error);
    assert!(engine.messages.last().is_some_and(|m| m.contains("E471")));

    let (engine, _, result) = run_in("", "nosuchcommand");
    assert_eq!(result, ExecutionResult::Error);
    assert!(engine.messages.last().is_some_and(|m| m.contains("E492")));
}

#[test]
fn write_commands_respect_read_only_buffers() {
    let mut engine = Engine::new();
    let mut editor = BufferEditor::read_only("keep me\n");
    let result = engine.execute("s/keep/lose/", &mut editor);
    assert_eq!(result, ExecutionResult::Error);
    assert!(engine.messages.last().is_some_and(|m| m.contains("E45")));
    assert_eq!(editor.text(), "keep me\n");
}

#[test]
fn delete_removes_range_lines() {
    let (_, editor, result) = run_in("one\ntwo\nthree\n", "2delete");
    assert_eq!(result, ExecutionResult::Success);
    assert_eq!(editor.text(), "one\nthree\n");

    let (_, editor, result) = run_in("one\ntwo\nthree\n", "1,2d");
    assert_eq!(result, ExecutionResult::Success);
    assert_eq!(editor.text(), "three\n");
}

#[test]
fn bare_range_moves_the_caret() {
    let (_, editor, result) = run_in("aa\nbb\ncc\n", "2");
    assert_eq!(result, ExecutionResult::Success);
    assert_eq!(editor.caret_offset(), 3);

    let (engine, _, result) = run_in("aa\n", "9");
    assert_eq!(result, ExecutionResult::Error);
    assert!(engine.messages.last().is_some_and(|m| m.contains("E16")));
}

#[test]
fn execute_runs_built_source_in_the_current_scope() {
    let (engine, _) = run("execute 'let g:from_exec = ' . 6 . ' + 1'");
    assert_eq!(engine.variables.get("from_exec"), Some(&VimValue::Int(7)));
}

// ---------------------------------------------------------------------------
// :substitute
// ---------------------------------------------------------------------------

#[test]
fn substitute_over_a_range() {
    let (_, editor, result) = run_in("alpha beta\ngamma beta\n", "%s/beta/B/");
    assert_eq!(result, ExecutionResult::Success);
    assert_eq!(editor.text(), "alpha B\ngamma B\n");
}

#[test]
fn substitute_global_flag_and_groups() {
    let (_, editor, result) = run_in("ab ab ab\n", "s/ab/x/g");
    assert_eq!(result, ExecutionResult::Success);
    assert_eq!(editor.text(), "x x x\n");

    let (_, editor, result) = run_in("ab\n", "s/\\(a\\)\\(b\\)/\\2\\1/");
    assert_eq!(result, ExecutionResult::Success);
    assert_eq!(editor.text(), "ba\n");

    let (_, editor, result) = run_in("word\n", "s/word/[&]/");
    assert_eq!(result, ExecutionResult::Success);
    assert_eq!(editor.text(), "[word]\n");
}

#[test]
fn substitute_case_flags() {
    let (_, editor, result) = run_in("ALPHA\n", "s/alpha/x/i");
    assert_eq!(result, ExecutionResult::Success);
    assert_eq!(editor.text(), "x\n");

    let (engine, _, result) = run_in("ALPHA\n", "s/alpha/x/I");
    assert_eq!(result, ExecutionResult::Error);
    assert!(engine.messages.last().is_some_and(|m| m.contains("E486")));
}

#[test]
fn substitute_reuses_the_last_pattern_when_empty() {
    let (_, editor, result) = run_in("beta beta\n", "s/beta/B/\ns//C/");
    assert_eq!(result, ExecutionResult::Success);
    assert_eq!(editor.text(), "B C\n");

    let (engine, _, result) = run_in("x\n", "s//y/");
    assert_eq!(result, ExecutionResult::Error);
    assert!(engine.messages.last().is_some_and(|m| m.contains("E35")));
}

#[test]
fn substitute_missing_match_reports_the_pattern() {
    let (engine, _, result) = run_in("hay\n", "s/needle/x/");
    assert_eq!(result, ExecutionResult::Error);
    assert_eq!(
        engine.messages.last(),
        Some("E486: Pattern not found: needle")
    );
}

// ---------------------------------------------------------------------------
// Search coordination
// ---------------------------------------------------------------------------

#[test]
fn repeat_search_wraps_around() {
    use viml_engine::search::{Direction, SearchState};

    // Matches at offsets 0, 3, and 6.
    let mut editor = BufferEditor::new("ab ab ab");
    editor.set_caret_offset(4);

    let mut search = SearchState::default();
    search.remember("ab", Direction::Forward);

    let m = search
        .search_next(&editor, false, 1, Direction::Forward)
        .expect("no abort")
        .expect("match");
    assert_eq!(m.start, 6);

    let m = search
        .search_next(&editor, false, 2, Direction::Forward)
        .expect("no abort")
        .expect("match");
    assert_eq!(m.start, 0);

    let m = search
        .search_next(&editor, false, 1, Direction::Backward)
        .expect("no abort")
        .expect("match");
    assert_eq!(m.start, 3);
}

// ---------------------------------------------------------------------------
// Position info
// ---------------------------------------------------------------------------

const DISCOVERY: &str = "A Discovery\n\nI found it in a legendary land\nall rocks and lavender and tufted grass,\nwhere it was settled on some sodden sand\nhard by the torrent of a mountain pass.";

#[test]
fn location_info_matches_the_discovery_fixture() {
    let info = LocationInfo::compute(DISCOVERY, 0);
    assert_eq!(
        info.to_message(),
        "Col 1 of 11; Line 1 of 6; Word 1 of 34; Character 1 of 165"
    );
}

#[test]
fn location_info_mid_buffer() {
    // Caret on the "and" in line 4.
    let info = LocationInfo::compute(DISCOVERY, 54);
    assert_eq!(info.column, 11);
    assert_eq!(info.line, 4);
    assert_eq!(info.word, 12);
    assert_eq!(info.character, 55);
}

#[test]
fn wordcount_builtin_reads_the_editor() {
    let mut engine = Engine::new();
    let mut editor = BufferEditor::new(DISCOVERY);
    let result = engine.execute("echo wordcount()['words']", &mut editor);
    assert_eq!(result, ExecutionResult::Success);
    assert_eq!(engine.messages.last(), Some("34"));

    engine.execute("echo wordcount()['chars']", &mut editor);
    assert_eq!(engine.messages.last(), Some("165"));
}

#[test]
fn file_command_reports_the_position_summary() {
    let (engine, _, result) = run_in(DISCOVERY, "file");
    assert_eq!(result, ExecutionResult::Success);
    assert_eq!(
        engine.messages.last(),
        Some("Col 1 of 11; Line 1 of 6; Word 1 of 34; Character 1 of 165")
    );
}
