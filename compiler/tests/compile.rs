use compiler::error::{CompileError, LexError, SemanticError, SyntaxError};
use compiler::symbol_table::{DataType, Value};
use compiler::tac::{Instruction, Place};
use compiler::{compile, Compilation};
use std::collections::HashSet;

fn lines(compilation: &Compilation) -> Vec<String> {
    compilation
        .instructions
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn tac(source: &str) -> Vec<String> {
    lines(&compile(source).unwrap())
}

fn semantic(source: &str) -> SemanticError {
    match compile(source) {
        Err(CompileError::Semantic(err)) => err,
        other => panic!("expected a semantic error, got {other:?}"),
    }
}

fn position(lines: &[String], line: &str) -> usize {
    lines
        .iter()
        .position(|l| l == line)
        .unwrap_or_else(|| panic!("'{line}' not in {lines:?}"))
}

#[test]
fn scenario_arithmetic_precedence() {
    let compilation = compile("int sum; sum = 10 + 5 * 3;").unwrap();
    assert_eq!(
        compilation.symbols.lookup("sum", 0).unwrap().value,
        Some(Value::Int(25))
    );
    assert_eq!(
        lines(&compilation),
        vec!["t0 = 5 * 3", "t1 = 10 + t0", "sum = t1"]
    );
}

#[test]
fn scenario_string_concatenation() {
    let compilation = compile("string a = \"Hi\"; a = a + \" there\";").unwrap();
    let symbol = compilation.symbols.lookup("a", 0).unwrap();
    assert_eq!(symbol.ty, DataType::Str);
    assert_eq!(symbol.value, Some(Value::Str("Hi there".into())));
    assert_eq!(
        lines(&compilation),
        vec!["a = \"Hi\"", "t0 = a + \" there\"", "a = t0"]
    );
}

#[test]
fn scenario_if_else_emits_each_branch_once() {
    let out = tac("if (5 > 3) { return 1; } else { return 2; }");
    assert_eq!(
        out,
        vec![
            "t0 = 5 > 3",
            "if t0 goto L1",
            "goto L2",
            "L1:",
            "return 1",
            "goto L3",
            "L2:",
            "return 2",
            "L3:"
        ]
    );
    assert_eq!(out.iter().filter(|l| *l == "return 1").count(), 1);
    assert_eq!(out.iter().filter(|l| *l == "return 2").count(), 1);
}

#[test]
fn scenario_division_by_zero() {
    assert_eq!(
        compile("int x = 4 / 0;").unwrap_err(),
        CompileError::Semantic(SemanticError::DivisionByZero { line: 0 })
    );
}

#[test]
fn division_by_zero_through_a_variable() {
    assert!(matches!(
        semantic("int z = 0;\nint x = 8 / z;"),
        SemanticError::DivisionByZero { line: 1 }
    ));
}

#[test]
fn duplicate_declaration_for_any_type() {
    for source in [
        "int a; int a;",
        "int a; string a;",
        "string a = \"x\"; float a;",
        "for (int i = 0; 1 > i; i++) {} for (int i = 0; 1 > i; i++) {}",
    ] {
        assert!(
            matches!(
                semantic(source),
                SemanticError::DuplicateDeclaration { ref name, .. } if name == "a" || name == "i"
            ),
            "{source}"
        );
    }
}

#[test]
fn undeclared_names_fail_on_read_and_write() {
    for source in ["x = 1;", "int y = x;", "x++;", "return x;", "if (x) {}"] {
        assert!(
            matches!(
                semantic(source),
                SemanticError::UndeclaredVariable { ref name, .. } if name == "x"
            ),
            "{source}"
        );
    }
}

#[test]
fn reading_an_uninitialized_variable_fails() {
    assert_eq!(
        semantic("int x;\nint y = 1 + x;"),
        SemanticError::UndefinedValue {
            name: "x".into(),
            line: 1
        }
    );
}

#[test]
fn mismatched_operand_types_fail_for_every_operator() {
    for op in ["+", "-", "*", "/", ">"] {
        let source = format!("int n = 1; string s = \"a\"; int r = n {op} s;");
        assert_eq!(
            semantic(&source),
            SemanticError::TypeMismatch {
                operator: op.into(),
                left: DataType::Int,
                right: DataType::Str,
                line: 0,
            },
            "{source}"
        );
    }
}

#[test]
fn strings_reject_minus() {
    assert!(matches!(
        semantic("string s = \"ab\"; s = s - \"b\";"),
        SemanticError::TypeMismatch { ref operator, .. } if operator == "-"
    ));
    assert!(matches!(
        semantic("string s = \"ab\" - \"b\";"),
        SemanticError::TypeMismatch { ref operator, .. } if operator == "-"
    ));
}

#[test]
fn every_binary_operation_gets_a_fresh_temporary() {
    let compilation = compile(
        "int a = 1 + 2 * 3 - 4 / 2;\n\
         int b = (a + 1) * (a - 1);\n\
         while (b > a) { b = b - 1; }\n\
         for (int i = 0; 3 > i; i = i + 1) { a = a * 2; }",
    )
    .unwrap();
    let temps = compilation
        .instructions
        .iter()
        .filter_map(|instruction| match instruction {
            Instruction::Binary {
                dest: Place::Temp(temp),
                ..
            } => Some(temp.0),
            _ => None,
        })
        .collect::<Vec<_>>();
    let binary_count = compilation
        .instructions
        .iter()
        .filter(|instruction| matches!(instruction, Instruction::Binary { .. }))
        .count();
    assert_eq!(temps.len(), binary_count);
    let unique = temps.iter().collect::<HashSet<_>>();
    assert_eq!(unique.len(), temps.len());
    assert_eq!(temps, (0..temps.len() as u32).collect::<Vec<_>>());
    for instruction in &compilation.instructions {
        if let Instruction::Assign {
            dest: Place::Temp(_),
            ..
        } = instruction
        {
            panic!("temporaries are only written by binary operations");
        }
    }
}

#[test]
fn for_iterator_follows_the_body() {
    let out = tac("int s = 0;\nfor (int i = 0; 5 > i; i++) { s = s + i; int k = 2; }");
    let body_end = position(&out, "k = 2");
    let iterator = position(&out, "i = i + 1");
    let back = position(&out, "goto L1");
    assert_eq!(iterator, body_end + 1);
    assert_eq!(back, iterator + 1);
    assert!(position(&out, "L2:") < position(&out, "t1 = s + i"));
}

#[test]
fn for_iterator_temporaries_stay_in_order() {
    let out = tac("for (int i = 0; 10 > i; i = i + 2) { int j = i * 3; }");
    assert_eq!(
        out,
        vec![
            "i = 0",
            "L1:",
            "t0 = 10 > i",
            "if t0 goto L2",
            "goto L3",
            "L2:",
            "t1 = i + 2",
            "t2 = i * 3",
            "j = t2",
            "i = t1",
            "goto L1",
            "L3:"
        ]
    );
}

#[test]
fn if_without_else_has_no_join_label() {
    let out = tac("int x = 1; if (x > 0) { x = 2; } x = 3;");
    assert_eq!(
        out,
        vec![
            "x = 1",
            "t0 = x > 0",
            "if t0 goto L1",
            "goto L2",
            "L1:",
            "x = 2",
            "L2:",
            "x = 3"
        ]
    );
}

#[test]
fn bodies_are_emitted_even_when_condition_is_false() {
    let out = tac("int x = 0; if (0 > 1) { x = 7; } while (0 > 1) { x = 8; }");
    assert_eq!(out.iter().filter(|l| *l == "x = 7").count(), 1);
    assert_eq!(out.iter().filter(|l| *l == "x = 8").count(), 1);
}

#[test]
fn blocks_share_one_namespace() {
    let compilation = compile("{ int inner = 3; } int outer = inner + 1;").unwrap();
    assert_eq!(
        compilation.symbols.lookup("outer", 0).unwrap().value,
        Some(Value::Int(4))
    );
    assert!(matches!(
        semantic("if (1) { int v; } int v;"),
        SemanticError::DuplicateDeclaration { .. }
    ));
}

#[test]
fn lexical_errors_surface_through_compile() {
    assert_eq!(
        compile("int a = 1;\nint b = a % 2;").unwrap_err(),
        CompileError::Lex(LexError::UnexpectedCharacter {
            character: '%',
            line: 1
        })
    );
    assert!(matches!(
        compile("string s = \"open"),
        Err(CompileError::Lex(LexError::UnterminatedString { line: 0 }))
    ));
}

#[test]
fn statement_cannot_start_with_a_literal() {
    let err = compile("int a = 1;\n\n5;").unwrap_err();
    assert_eq!(
        err,
        CompileError::Syntax(SyntaxError::UnexpectedToken {
            expected: "statement".into(),
            found: "number 5".into(),
            line: 2,
        })
    );
    assert_eq!(err.line(), 2);
    assert_eq!(
        err.to_string(),
        "Syntax Error: Expected statement but found number 5 at line 2."
    );
}

#[test]
fn canonical_text_round_trips_through_the_parser() {
    let compilation = compile(
        "string g = \"a b\"; g = g + \" c\"; int n = 3; while (n > 0) { n--; } return g;",
    )
    .unwrap();
    let text = compilation.tac();
    assert_eq!(
        compiler::tac::parse(&text).unwrap(),
        compilation.instructions
    );
    assert_eq!(compiler::tac::parse(&compilation.pretty()).unwrap(), compilation.instructions);
}

#[test]
fn string_with_newline_keeps_tac_one_line_per_instruction() {
    let compilation = compile("string s = \"a\nb\";\nreturn s;").unwrap();
    let text = compilation.tac();
    assert_eq!(text, "s = \"a\\nb\"\nreturn s\n");
    assert_eq!(
        compiler::tac::parse(&text).unwrap(),
        compilation.instructions
    );
    assert_eq!(
        compiler::asm::generate(&text).unwrap(),
        vec!["MOV R1, \"a\\nb\"", "MOV s, R1", "MOV R0, s", "RET"]
    );
}

#[test]
fn empty_source_compiles_to_nothing() {
    let compilation = compile("  // nothing here\n").unwrap();
    assert!(compilation.instructions.is_empty());
    assert!(compilation.symbols.is_empty());
    assert_eq!(compilation.tac(), "");
}
