use viml::command::Address;
use viml::parser::{self, Parser};
use viml::script::{LetOp, LetTarget, Statement};
use viml::{BinaryOp, CaseMode, Expr, ScopePrefix};

fn parse_cmd(line: &str) -> viml::ExCommand {
    parser::parse_command_line(line, 0).expect("command parse failed")
}

fn parse_expr(source: &str) -> Expr {
    parser::parse_expression(source, 0).expect("expression parse failed")
}

fn parse_script(source: &str) -> viml::Script {
    Parser::new(source.to_string(), 0)
        .parse()
        .expect("script parse failed")
}

// ---------------------------------------------------------------------------
// Ex command lines
// ---------------------------------------------------------------------------

#[test]
fn command_with_bang_and_argument() {
    let cmd = parse_cmd("command! Upper s/a/A/");
    assert_eq!(cmd.name, "command");
    assert!(cmd.bang);
    assert_eq!(cmd.argument, "Upper s/a/A/");
    assert!(cmd.range.is_empty());
}

#[test]
fn numeric_range() {
    let cmd = parse_cmd("1,5delete");
    assert_eq!(cmd.range.entries.len(), 2);
    assert_eq!(cmd.range.entries[0].address, Address::Line(1));
    assert_eq!(cmd.range.entries[1].address, Address::Line(5));
    assert_eq!(cmd.name, "delete");
}

#[test]
fn whole_file_range_attaches_pattern_argument() {
    let cmd = parse_cmd("%s/x/y/g");
    assert_eq!(cmd.range.entries[0].address, Address::WholeFile);
    assert_eq!(cmd.name, "s");
    assert_eq!(cmd.argument, "/x/y/g");
}

#[test]
fn pattern_range_with_offsets() {
    let cmd = parse_cmd("/begin/+1,/end/-1delete");
    assert_eq!(
        cmd.range.entries[0].address,
        Address::ForwardPattern("begin".to_string())
    );
    assert_eq!(cmd.range.entries[0].offset, 1);
    assert_eq!(
        cmd.range.entries[1].address,
        Address::ForwardPattern("end".to_string())
    );
    assert_eq!(cmd.range.entries[1].offset, -1);
}

#[test]
fn semicolon_separator_moves_caret() {
    let cmd = parse_cmd("3;7d");
    assert!(cmd.range.entries[0].moves_caret);
    assert!(!cmd.range.entries[1].moves_caret);
}

#[test]
fn leading_colons_are_ignored() {
    let cmd = parse_cmd("::echo 1");
    assert_eq!(cmd.name, "echo");
    assert_eq!(cmd.argument, "1");
}

#[test]
fn command_round_trip() {
    // Rendering range + name + argument back out reparses to the same
    // structure.
    for line in ["1,5delete", "%s/a/b/g", "echo 1 + 2", "3;7d", "delcommand Foo"] {
        let cmd = parse_cmd(line);
        let rendered = cmd.to_string();
        let reparsed = parse_cmd(&rendered);
        assert_eq!(cmd, reparsed, "round trip failed for {:?}", line);
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[test]
fn multiplication_binds_tighter_than_addition() {
    let Expr::Binary { op, right, .. } = parse_expr("1 + 2 * 3") else {
        panic!("expected binary expression");
    };
    assert_eq!(op, BinaryOp::Add);
    assert!(matches!(
        *right,
        Expr::Binary {
            op: BinaryOp::Multiply,
            ..
        }
    ));
}

#[test]
fn parentheses_override_precedence() {
    let Expr::Binary { op, left, .. } = parse_expr("(1 + 2) * 3") else {
        panic!("expected binary expression");
    };
    assert_eq!(op, BinaryOp::Multiply);
    assert!(matches!(
        *left,
        Expr::Binary {
            op: BinaryOp::Add,
            ..
        }
    ));
}

#[test]
fn comparison_case_suffixes() {
    let Expr::Binary { op, case, .. } = parse_expr("a ==? b") else {
        panic!("expected binary expression");
    };
    assert_eq!(op, BinaryOp::Equal);
    assert_eq!(case, CaseMode::IgnoreCase);

    let Expr::Binary { op, case, .. } = parse_expr("a isnot# b") else {
        panic!("expected binary expression");
    };
    assert_eq!(op, BinaryOp::IsNot);
    assert_eq!(case, CaseMode::MatchCase);
}

#[test]
fn ternary_is_right_associative() {
    let Expr::Ternary { else_branch, .. } = parse_expr("a ? 1 : b ? 2 : 3") else {
        panic!("expected ternary");
    };
    assert!(matches!(*else_branch, Expr::Ternary { .. }));
}

#[test]
fn list_and_dict_literals() {
    assert!(matches!(parse_expr("[1, 2, 'x']"), Expr::List(items) if items.len() == 3));
    assert!(matches!(parse_expr("{'a': 1, 'b': 2}"), Expr::Dict(entries) if entries.len() == 2));
}

#[test]
fn string_escape_rules_differ_by_quote() {
    assert_eq!(parse_expr("\"a\\nb\""), Expr::Str("a\nb".to_string()));
    // Single quotes are literal except for the doubled quote.
    assert_eq!(parse_expr("'a\\nb'"), Expr::Str("a\\nb".to_string()));
    assert_eq!(parse_expr("'it''s'"), Expr::Str("it's".to_string()));
}

#[test]
fn scoped_variable_reference() {
    let Expr::Var(name) = parse_expr("g:count") else {
        panic!("expected variable");
    };
    assert_eq!(name.scope, Some(ScopePrefix::Global));
    assert_eq!(name.name, "count");
}

#[test]
fn call_with_index_postfix() {
    let expr = parse_expr("wordcount()['words']");
    assert!(matches!(expr, Expr::Index { base, .. } if matches!(*base, Expr::Call { .. })));
}

#[test]
fn float_and_hex_literals() {
    assert_eq!(parse_expr("1.5"), Expr::Float(1.5));
    assert_eq!(parse_expr("0x1F"), Expr::Number(31));
}

#[test]
fn parse_error_names_the_offending_token() {
    let err = parser::parse_expression("1 + )", 0).expect_err("should fail");
    assert_eq!(err.token.as_deref(), Some(")"));
    assert_eq!(err.span, 4..5);
}

// ---------------------------------------------------------------------------
// Script structure
// ---------------------------------------------------------------------------

#[test]
fn blocks_nest() {
    let script = parse_script(
        "if 1\n  while x\n    echo 'tick'\n  endwhile\nelse\n  echo 'no'\nendif\n",
    );
    assert_eq!(script.units.len(), 1);
    let Statement::If { branches } = &script.units[0] else {
        panic!("expected :if");
    };
    assert_eq!(branches.len(), 2);
    assert!(branches[0].0.is_some());
    assert!(branches[1].0.is_none());
    assert!(matches!(branches[0].1[0], Statement::While { .. }));
}

#[test]
fn comments_and_continuations() {
    let script = parse_script("\" a comment\nlet x = [1,\n      \\ 2]\n");
    assert_eq!(script.units.len(), 1);
    let Statement::Let { target, op, value, .. } = &script.units[0] else {
        panic!("expected :let");
    };
    assert!(matches!(target, LetTarget::Var(name) if name.name == "x"));
    assert_eq!(*op, LetOp::Assign);
    assert!(matches!(value, Expr::List(items) if items.len() == 2));
}

#[test]
fn compound_let_forms() {
    let script = parse_script("let x += 2\nlet s .= 'tail'\nlet l[0] = 9\n");
    assert!(matches!(script.units[0], Statement::Let { op: LetOp::Add, .. }));
    assert!(matches!(script.units[1], Statement::Let { op: LetOp::Concat, .. }));
    assert!(matches!(
        script.units[2],
        Statement::Let {
            target: LetTarget::Index { .. },
            ..
        }
    ));
}

#[test]
fn function_definition_collects_params_and_body() {
    let script = parse_script("function! s:Add(a, b)\n  return a:a + a:b\nendfunction\n");
    let Statement::Function { name, params, bang, body, .. } = &script.units[0] else {
        panic!("expected :function");
    };
    assert_eq!(name.scope, Some(ScopePrefix::Script));
    assert_eq!(name.name, "Add");
    assert_eq!(params, &vec!["a".to_string(), "b".to_string()]);
    assert!(*bang);
    assert_eq!(body.len(), 1);
}

#[test]
fn try_catch_finally_structure() {
    let script = parse_script(
        "try\n  echo 1\ncatch /E117/\n  echo 2\ncatch\n  echo 3\nfinally\n  echo 4\nendtry\n",
    );
    let Statement::Try { catches, finally, .. } = &script.units[0] else {
        panic!("expected :try");
    };
    assert_eq!(catches.len(), 2);
    assert_eq!(catches[0].0.as_deref(), Some("E117"));
    assert_eq!(catches[1].0, None);
    assert!(finally.is_some());
}

#[test]
fn missing_block_terminator_is_an_error() {
    assert!(Parser::new("if 1\necho 2\n".to_string(), 0).parse().is_err());
    assert!(Parser::new("while 1\n".to_string(), 0).parse().is_err());
}

#[test]
fn every_bad_statement_is_reported() {
    let errors = Parser::new("let = 5\nlet 2 = 3\n".to_string(), 0)
        .parse()
        .expect_err("should fail");
    assert_eq!(errors.len(), 2);
}
