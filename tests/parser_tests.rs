// tests/parser_tests.rs

use cfn_script::ast::{
    AttributeKind, Declaration, Document, Expr, Literal, ResourceType, SectionKind, Statement,
};
use cfn_script::lexer::{Lexer, Position};
use cfn_script::parser::{ParseError, Parser, MAX_DEPTH};

fn parse(input: &str) -> Result<Document, ParseError> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    parser.parse()
}

fn expression(input: &str) -> Expr {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer).unwrap();
    parser.parse_expression().unwrap()
}

/// The declaration bound by the only statement of `input`.
fn declaration(input: &str) -> Declaration {
    let document = parse(input).unwrap();
    match document.statements.as_slice() {
        [Statement::Assignment(assignment)] => match &assignment.value {
            Expr::Declaration(declaration) => (**declaration).clone(),
            other => panic!("Expected a declaration, got {:?}", other),
        },
        other => panic!("Expected one assignment, got {:?}", other),
    }
}

fn id(name: &str) -> Expr {
    Expr::identifier(name)
}

// ============================================================================
// Operator precedence
// ============================================================================

#[test]
fn test_or_of_ands() {
    // Should be: Or(And(A, B), And(C, D))
    assert_eq!(
        expression("A && B || C && D"),
        Expr::call(
            "Or",
            vec![
                Expr::call("And", vec![id("A"), id("B")]),
                Expr::call("And", vec![id("C"), id("D")]),
            ]
        )
    );
}

#[test]
fn test_logical_chains_flatten() {
    assert_eq!(
        expression("A && B && C"),
        Expr::call("And", vec![id("A"), id("B"), id("C")])
    );
    assert_eq!(
        expression("A || B || C || D"),
        Expr::call("Or", vec![id("A"), id("B"), id("C"), id("D")])
    );
}

#[test]
fn test_parentheses_stop_flattening() {
    assert_eq!(
        expression("(A && B) && C"),
        Expr::call(
            "And",
            vec![Expr::call("And", vec![id("A"), id("B")]), id("C")]
        )
    );
    assert_eq!(
        expression("A && (B || C)"),
        Expr::call(
            "And",
            vec![id("A"), Expr::call("Or", vec![id("B"), id("C")])]
        )
    );
}

#[test]
fn test_equality_binds_tighter_than_and() {
    assert_eq!(
        expression("Env == \"prod\" && !IsTest"),
        Expr::call(
            "And",
            vec![
                Expr::call("Equals", vec![id("Env"), Expr::string("prod")]),
                Expr::call("Not", vec![id("IsTest")]),
            ]
        )
    );
}

#[test]
fn test_not_equal_desugars() {
    assert_eq!(
        expression("Env != \"prod\""),
        Expr::call(
            "Not",
            vec![Expr::call("Equals", vec![id("Env"), Expr::string("prod")])]
        )
    );
}

#[test]
fn test_unary_binds_tighter_than_equality() {
    // Should be: Equals(Not(A), B)
    assert_eq!(
        expression("!A == B"),
        Expr::call("Equals", vec![Expr::call("Not", vec![id("A")]), id("B")])
    );
    assert_eq!(
        expression("!!A"),
        Expr::call("Not", vec![Expr::call("Not", vec![id("A")])])
    );
}

#[test]
fn test_equality_does_not_chain() {
    let err = parse("C = Condition A == B == C").unwrap_err();
    assert!(matches!(err, ParseError::Unexpected { .. }), "{:?}", err);
}

// ============================================================================
// Postfix forms
// ============================================================================

#[test]
fn test_member_chain_is_flat() {
    assert_eq!(
        expression("Widget.Compliance.Type"),
        Expr::MemberAccess {
            object: Box::new(id("Widget")),
            path: vec!["Compliance".into(), "Type".into()],
        }
    );
}

#[test]
fn test_bracket_access() {
    assert_eq!(
        expression("Db[\"Endpoint.Address\",]"),
        Expr::BracketAccess {
            object: Box::new(id("Db")),
            names: vec!["Endpoint.Address".into()],
        }
    );
    assert_eq!(
        expression("Widget['Compliance', 'Type']"),
        Expr::BracketAccess {
            object: Box::new(id("Widget")),
            names: vec!["Compliance".into(), "Type".into()],
        }
    );
}

#[test]
fn test_bracket_names_must_be_strings() {
    let err = parse("O = Output { Value: Db[Name] }").unwrap_err();
    match err {
        ParseError::Unexpected { expected, .. } => {
            assert_eq!(expected, "a quoted attribute name")
        }
        other => panic!("Expected Unexpected, got {:?}", other),
    }
}

#[test]
fn test_pseudo_parameter() {
    assert_eq!(expression("AWS.Region"), id("AWS::Region"));
    assert_eq!(
        expression("AWS.StackName.Length"),
        Expr::MemberAccess {
            object: Box::new(id("AWS::StackName")),
            path: vec!["Length".into()],
        }
    );
}

// ============================================================================
// Literals and calls
// ============================================================================

#[test]
fn test_literals() {
    assert_eq!(expression("true"), Expr::Literal(Literal::Boolean(true)));
    assert_eq!(expression("false"), Expr::Literal(Literal::Boolean(false)));
    assert_eq!(expression("null"), Expr::Literal(Literal::Null));
    assert_eq!(expression("-1.5"), Expr::Literal(Literal::Number("-1.5".into())));
}

#[test]
fn test_object_and_array_literals() {
    assert_eq!(
        expression("{ Type: 'String', \"us-east-1\": [1, 2,], }"),
        Expr::Object(vec![
            ("Type".into(), Expr::string("String")),
            (
                "us-east-1".into(),
                Expr::Array(vec![
                    Expr::Literal(Literal::Number("1".into())),
                    Expr::Literal(Literal::Number("2".into())),
                ])
            ),
        ])
    );
    assert_eq!(expression("{}"), Expr::Object(vec![]));
    assert_eq!(expression("[]"), Expr::Array(vec![]));
}

#[test]
fn test_duplicate_object_key() {
    let err = parse("P = Parameter { Type: \"String\", Type: \"Number\" }").unwrap_err();
    assert_eq!(
        err,
        ParseError::Duplicate {
            what: "property `Type`".into(),
            position: Position::new(1, 33),
        }
    );
}

#[test]
fn test_function_call() {
    assert_eq!(
        expression("Join(\"-\", [AWS.StackName, Env],)"),
        Expr::call(
            "Join",
            vec![
                Expr::string("-"),
                Expr::Array(vec![id("AWS::StackName"), id("Env")]),
            ]
        )
    );
    assert_eq!(expression("GetAZs()"), Expr::call("GetAZs", vec![]));
}

#[test]
fn test_forbidden_calls() {
    for (source, name) in [
        ("O = Output { Value: Ref(Env) }", "Ref"),
        ("O = Output { Value: GetAtt(Bucket, \"Arn\") }", "GetAtt"),
    ] {
        match parse(source).unwrap_err() {
            ParseError::ForbiddenCall { name: found, hint, .. } => {
                assert_eq!(found, name);
                assert!(!hint.is_empty());
            }
            other => panic!("Expected ForbiddenCall, got {:?}", other),
        }
    }
}

#[test]
fn test_operator_functions_are_callable() {
    assert_eq!(
        expression("Equals(A, B)"),
        Expr::call("Equals", vec![id("A"), id("B")])
    );
}

// ============================================================================
// Declarations
// ============================================================================

#[test]
fn test_resource_with_everything() {
    let source = r#"Bucket = Resource AWS::S3::Bucket {
        BucketName: "logs",
    } DependsOn([Topic, Queue]) Condition(IsProd) DeletionPolicy("Retain")"#;

    let Declaration::Resource(resource) = declaration(source) else {
        panic!("Expected a resource");
    };
    assert_eq!(
        resource.resource_type,
        ResourceType::Path(vec!["AWS".into(), "S3".into(), "Bucket".into()])
    );
    assert_eq!(
        resource.properties,
        Some(Expr::Object(vec![("BucketName".into(), Expr::string("logs"))]))
    );
    let kinds: Vec<AttributeKind> = resource.attributes.iter().map(|a| a.kind).collect();
    assert_eq!(
        kinds,
        vec![
            AttributeKind::DependsOn,
            AttributeKind::Condition,
            AttributeKind::DeletionPolicy
        ]
    );
}

#[test]
fn test_resource_properties_absent_vs_empty() {
    let Declaration::Resource(absent) = declaration("T = Resource AWS::SNS::Topic") else {
        panic!("Expected a resource");
    };
    assert_eq!(absent.properties, None);

    let Declaration::Resource(empty) = declaration("T = Resource AWS::SNS::Topic {}") else {
        panic!("Expected a resource");
    };
    assert_eq!(empty.properties, Some(Expr::Object(vec![])));
}

#[test]
fn test_quoted_resource_type() {
    let Declaration::Resource(resource) = declaration("W = Resource \"Custom::odd-name\"") else {
        panic!("Expected a resource");
    };
    assert_eq!(resource.resource_type, ResourceType::Quoted("Custom::odd-name".into()));
}

#[test]
fn test_resource_type_needs_two_segments() {
    let err = parse("B = Resource Bucket").unwrap_err();
    assert!(matches!(err, ParseError::InvalidResourceType { .. }), "{:?}", err);

    let err = parse("B = Resource 42").unwrap_err();
    assert!(matches!(err, ParseError::InvalidResourceType { .. }), "{:?}", err);
}

#[test]
fn test_duplicate_resource_attribute() {
    let err = parse("B = Resource AWS::S3::Bucket DependsOn(A) DependsOn(B)").unwrap_err();
    match err {
        ParseError::Duplicate { what, position } => {
            assert_eq!(what, "resource attribute `DependsOn`");
            assert_eq!(position, Position::new(1, 43));
        }
        other => panic!("Expected Duplicate, got {:?}", other),
    }
}

#[test]
fn test_resource_followed_by_assignment_named_like_attribute() {
    let document = parse("T = Resource AWS::SNS::Topic\nCondition = Condition true").unwrap();
    assert_eq!(document.statements.len(), 2);
    let Statement::Assignment(second) = &document.statements[1] else {
        panic!("Expected an assignment");
    };
    assert_eq!(second.name, "Condition");
    assert_eq!(second.line, 2);
}

#[test]
fn test_condition_takes_an_expression() {
    assert_eq!(
        declaration("IsProd = Condition Env == \"production\""),
        Declaration::Condition(Expr::call(
            "Equals",
            vec![id("Env"), Expr::string("production")]
        ))
    );
}

#[test]
fn test_body_declarations_need_objects() {
    for source in [
        "P = Parameter \"String\"",
        "O = Output Bucket",
        "M = Mapping []",
        "R = Rule true",
    ] {
        let err = parse(source).unwrap_err();
        assert!(matches!(err, ParseError::Unexpected { .. }), "{}: {:?}", source, err);
    }
}

#[test]
fn test_quoted_assignment_name() {
    let document = parse("\"1Bucket\" = Resource AWS::S3::Bucket").unwrap();
    let Statement::Assignment(assignment) = &document.statements[0] else {
        panic!("Expected an assignment");
    };
    assert_eq!(assignment.name, "1Bucket");
}

// ============================================================================
// Sections
// ============================================================================

#[test]
fn test_sections() {
    let document = parse(
        "AWSTemplateFormatVersion \"2010-09-09\"\n\
         Description 'Example'\n\
         Transform [\"AWS::Serverless-2016-10-31\"]\n\
         Metadata { Owner: \"ops\" }\n\
         Globals {}",
    )
    .unwrap();

    let kinds: Vec<SectionKind> = document
        .statements
        .iter()
        .map(|statement| match statement {
            Statement::Section(section) => section.kind,
            other => panic!("Expected a section, got {:?}", other),
        })
        .collect();
    assert_eq!(kinds, SectionKind::ALL.to_vec());
}

#[test]
fn test_section_shapes_are_checked() {
    for (source, section) in [
        ("Description 42", "Description"),
        ("Transform [1]", "Transform"),
        ("Metadata \"text\"", "Metadata"),
        ("AWSTemplateFormatVersion {}", "AWSTemplateFormatVersion"),
    ] {
        match parse(source).unwrap_err() {
            ParseError::InvalidSection { section: found, .. } => assert_eq!(found, section),
            other => panic!("Expected InvalidSection for {}, got {:?}", source, other),
        }
    }
}

#[test]
fn test_section_keyword_as_assignment_name() {
    let document = parse("Description = Parameter { Type: \"String\" }").unwrap();
    assert!(matches!(
        &document.statements[0],
        Statement::Assignment(assignment) if assignment.name == "Description"
    ));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unexpected_token_message() {
    let err = parse("Env = Parameter { Type: }").unwrap_err();
    assert_eq!(err.to_string(), "Expected an expression, found `}` at 1:25");
}

#[test]
fn test_statement_must_start_with_name() {
    let err = parse("{ }").unwrap_err();
    assert!(matches!(err, ParseError::Unexpected { position, .. } if position == Position::new(1, 1)));
}

#[test]
fn test_lex_errors_propagate() {
    let err = parse("A = Condition B & C").unwrap_err();
    assert!(matches!(err, ParseError::Lex(_)), "{:?}", err);
}

#[test]
fn test_nesting_limit() {
    let deep = format!("C = Condition {}A{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
    assert!(matches!(parse(&deep), Err(ParseError::TooDeep { .. })));

    let bangs = format!("C = Condition {}A", "!".repeat(MAX_DEPTH + 1));
    assert!(matches!(parse(&bangs), Err(ParseError::TooDeep { .. })));

    // The assignment and the condition body take two levels.
    let deepest = MAX_DEPTH - 2;
    let shallow = format!("C = Condition {}A{}", "(".repeat(deepest), ")".repeat(deepest));
    assert!(parse(&shallow).is_ok());
}

/// Run `parse_expression` on a thread with the default 2 MiB stack.
fn expression_on_small_stack(input: String) -> Result<Expr, ParseError> {
    std::thread::Builder::new()
        .stack_size(2 << 20)
        .spawn(move || Parser::new(Lexer::new(&input))?.parse_expression())
        .unwrap()
        .join()
        .unwrap()
}

#[test]
fn test_nesting_limit_fits_small_stack() {
    let levels = MAX_DEPTH - 1;
    let cases = [
        ("[".repeat(levels), "]".repeat(levels)),
        ("{ a: ".repeat(levels), " }".repeat(levels)),
        ("(".repeat(levels), ")".repeat(levels)),
        ("Join(".repeat(levels), ")".repeat(levels)),
    ];

    for (open, close) in cases {
        let accepted = format!("{}1{}", open, close);
        assert!(expression_on_small_stack(accepted).is_ok(), "{}", open);

        let rejected = format!("[{}1{}]", open, close);
        assert!(
            matches!(expression_on_small_stack(rejected), Err(ParseError::TooDeep { .. })),
            "{}",
            open
        );
    }
}
