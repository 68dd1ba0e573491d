use minitac::{
    analyze,
    ast::{CmpOp, Node, Program},
    compile, generate,
    lex::{Literal, TokenKind},
    parse, scan_all,
    semantic::SemanticError,
};

fn program(source: &str) -> Program {
    let tokens = scan_all(source).expect("lexical error");
    parse(&tokens).expect("syntax error")
}

fn code(source: &str) -> Vec<String> {
    generate(&program(source))
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn scans_simple_assignment() {
    let tokens = scan_all("x = 5;").unwrap();
    let kinds: Vec<_> = tokens.iter().map(|token| token.kind()).collect();

    assert_eq!(
        kinds,
        [
            TokenKind::Identifier,
            TokenKind::Assign,
            TokenKind::Number,
            TokenKind::Semicolon,
            TokenKind::Eof
        ]
    );

    assert_eq!(tokens[0].lexeme(), "x");
    assert_eq!(tokens[2].literal(), Some(&Literal::Number(5.0)));
}

#[test]
fn parses_if_else() {
    let program = program("if (x > 3) { print(x); } else { x = 0; }");

    let expected = Node::If {
        condition: Box::new(Node::Comparison {
            op: CmpOp::Greater,
            left: Box::new(Node::Variable(String::from("x"))),
            right: Box::new(Node::Number(3.0)),
        }),
        then_branch: Box::new(Node::Block(vec![Node::Print(Box::new(Node::Variable(
            String::from("x"),
        )))])),
        else_branch: Some(Box::new(Node::Block(vec![Node::Assignment {
            variable: String::from("x"),
            value: Box::new(Node::Number(0.0)),
        }]))),
    };

    assert_eq!(program.declarations, [expected]);
}

#[test]
fn declared_program_is_accepted() {
    let source = "
        int i = 0;
        bool done;
        string name;
        read(name);
        while (i < 10) {
            i = i + 1;
            done = i == 10;
        }
        print(name);
    ";

    assert!(analyze(&program(source)).is_empty());
}

#[test]
fn undeclared_use_is_reported_once() {
    let errors = analyze(&program("int x; x = y + 1;"));
    assert_eq!(errors, [SemanticError::NotDeclared(String::from("y"))]);
    assert_eq!(errors[0].to_string(), "y not declared");
}

#[test]
fn duplicate_declaration_is_reported_once() {
    let errors = analyze(&program("int x; bool x; x = 1;"));
    assert_eq!(errors, [SemanticError::AlreadyDeclared(String::from("x"))]);
    assert_eq!(errors[0].to_string(), "x already declared");
}

#[test]
fn semantic_errors_keep_traversal_order() {
    let errors = analyze(&program("a = b; int a; int a;"));
    let messages: Vec<_> = errors.iter().map(ToString::to_string).collect();

    assert_eq!(
        messages,
        ["a not declared", "b not declared", "a already declared"]
    );
}

#[test]
fn generates_arithmetic() {
    assert_eq!(code("x = 1 + 2;"), ["t0 = 1 + 2", "x = t0"]);
}

#[test]
fn generates_while_layout() {
    assert_eq!(
        code("while (n > 0) { print(n); n = n - 1; }"),
        [
            "L0:",
            "t0 = n > 0",
            "if !t0 goto L1",
            "print n",
            "t1 = n - 1",
            "n = t1",
            "goto L0",
            "L1:"
        ]
    );
}

#[test]
fn numbering_restarts_per_generate() {
    let first = program("while (a) { a = a - 1; }");
    let second = program("if (b < 2) b = 2;");

    assert_eq!(generate(&first)[0].to_string(), "L0:");

    let second = generate(&second);
    assert_eq!(second[0].to_string(), "t0 = b < 2");
    assert_eq!(second[1].to_string(), "if !t0 goto L0");
}

#[test]
fn compile_runs_every_stage() {
    let compilation = compile("<test>", "int x = 4; print(x * 2);").unwrap();

    assert_eq!(compilation.tokens.last().map(|token| token.kind()), Some(TokenKind::Eof));
    assert_eq!(compilation.program.declarations.len(), 2);

    let code: Vec<_> = compilation.code.iter().map(ToString::to_string).collect();
    assert_eq!(code, ["x = 4", "t0 = x * 2", "print t0"]);
}

#[test]
fn compile_reports_lexical_errors() {
    let diagnostics = compile("bad.mini", "int x;\nx = #;").unwrap_err();

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.messages(), ["Unexpected character '#'"]);

    let report = diagnostics.to_string();
    assert!(report.starts_with("Lexical error: Unexpected character '#'\n --> bad.mini:2:5\n"));
    assert!(report.contains("2 | x = #;"));
}

#[test]
fn compile_reports_syntax_errors() {
    let diagnostics = compile("bad.mini", "print(1").unwrap_err();
    let report = diagnostics.to_string();

    assert!(report.starts_with("Syntax error: "));
    assert!(report.ends_with("Build failed with 1 error\n"));
}

#[test]
fn compile_withholds_code_on_semantic_errors() {
    let diagnostics = compile("bad.mini", "x = 1; y = 2;").unwrap_err();

    assert_eq!(diagnostics.messages(), ["x not declared", "y not declared"]);
    assert!(diagnostics.to_string().starts_with("Semantic error: x not declared\n"));
}

#[test]
fn dumps_tree() {
    let dump = program("int x; x = 1;").to_string();

    assert!(dump.starts_with("Program"));
    assert!(dump.contains("VarDecl"));
    assert!(dump.contains("Assignment"));
}

#[test]
fn deep_nesting_is_a_syntax_error() {
    let source = format!("int x; x = {}1{};", "(".repeat(400), ")".repeat(400));
    let diagnostics = compile("deep.mini", &source).unwrap_err();

    assert_eq!(diagnostics.messages(), ["Nesting exceeds 128 levels"]);
    assert!(diagnostics.to_string().starts_with("Syntax error: "));
}
