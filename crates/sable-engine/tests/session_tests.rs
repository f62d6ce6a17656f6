//! Integration tests for compilation sessions
//!
//! Tests cover:
//! - Options loaded from TOML shaping the lowered output
//! - Reporters created from the session options
//! - Attribute queries through the session
//! - Diagnostics rendering for compiled bodies
//! - Bodies compiled concurrently against one session

use pretty_assertions::assert_eq;
use sable_engine::compiler::{
    render_diagnostics, DefaultNamingConvention, ErrorReporter, Message, Severity, SharedErrorReporter,
    SourceFiles,
};
use sable_engine::metadata::{
    encode_attribute_blob, AttributeValue, CustomAttribute, MemberRefSig, MetadataModule, TypeDef, TypeSig,
};
use sable_engine::source::{
    AccessorRole, BlockStatement, Comment, CommentType, Entity, Expression, ExpressionKind, IfStatement,
    MemberDefinition, MemberId, MemberKind, ReturnStatement, SemanticModel, Span, Statement, TypeDefId,
    TypeDefinition, TypeKind, TypeRef, VariableDeclarationStatement, VariableDeclarator, VariableId,
};
use sable_engine::{CompilerOptions, LoadedMetadata, MethodBody, Session, TextErrorReporter, VariableData};
use std::sync::Arc;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

struct Fixture {
    session: Session,
    counter: TypeDefId,
    ghost: TypeDefId,
    size: MemberId,
    next: MemberId,
}

fn fixture(options: CompilerOptions) -> Fixture {
    let mut model = SemanticModel::new();
    let counter = model.add_type(TypeDefinition::new("Acme", "Counter", TypeKind::Class));
    let ghost = model.add_type(TypeDefinition::new("Acme", "Ghost", TypeKind::Class));
    let size = model.add_member(MemberDefinition::new(counter, MemberKind::Property, "Size", TypeRef::int32()));
    model.add_accessor(size, AccessorRole::Getter);
    model.add_accessor(size, AccessorRole::Setter);
    let next = model.add_member(MemberDefinition::new(counter, MemberKind::Method, "Next", TypeRef::int32()));
    let model = Arc::new(model);

    let parameters = vec![TypeSig::named("System.Int32")];
    let mut def = TypeDef::new("Acme", "Counter");
    def.custom_attributes.push(CustomAttribute {
        constructor: MemberRefSig {
            declaring_type: TypeSig::named("Acme.LimitAttribute"),
            name: ".ctor".to_string(),
            parameters: parameters.clone(),
            return_type: TypeSig::named("System.Void"),
        },
        blob: encode_attribute_blob(&parameters, &[AttributeValue::I32(10)], &[]).unwrap(),
    });
    let mut module = MetadataModule::new("acme");
    module.add_type(def);

    let session = Session::new(
        options,
        model.clone(),
        Arc::new(DefaultNamingConvention::new(model)),
        Arc::new(LoadedMetadata::new(module)),
    );
    Fixture {
        session,
        counter,
        ghost,
        size,
        next,
    }
}

fn expr(kind: ExpressionKind) -> Expression {
    Expression::new(kind, TypeRef::int32(), Span::default())
}

/// `return d.Size = Next();`
fn return_assigned_size(f: &Fixture) -> Statement {
    let value = expr(ExpressionKind::Assignment {
        op: None,
        target: Box::new(expr(ExpressionKind::Property {
            target: Some(Box::new(Expression::local(VariableId(3), TypeRef::int32()))),
            member: f.size,
        })),
        value: Box::new(expr(ExpressionKind::Invocation {
            target: None,
            method: f.next,
            arguments: vec![],
        })),
    });
    Statement::Return(ReturnStatement {
        value: Some(value),
        span: Span::default(),
    })
}

fn sample_body(f: &Fixture, file: &str) -> MethodBody {
    let statements = vec![
        Statement::VariableDeclaration(VariableDeclarationStatement {
            declarators: vec![VariableDeclarator {
                variable: VariableId(1),
                name: "b".to_string(),
                initializer: Some(Expression::int(2)),
                span: Span::default(),
            }],
            span: Span::default(),
        }),
        Statement::Comment(Comment {
            comment_type: CommentType::MultiLine,
            content: "\n  x\n  y\n".to_string(),
            span: Span::default(),
        }),
        Statement::If(IfStatement {
            condition: Expression::local(VariableId(0), TypeRef::boolean()),
            then_branch: Box::new(return_assigned_size(f)),
            else_branch: None,
            span: Span::default(),
        }),
        Statement::Lock(Span::new(40, 44, 9, 5)),
    ];
    MethodBody::new(
        file,
        Statement::Block(BlockStatement {
            statements,
            span: Span::default(),
        }),
    )
    .with_variable(VariableId(0), VariableData::new("a"))
    .with_variable(VariableId(1), VariableData::by_ref("b"))
    .with_variable(VariableId(3), VariableData::new("d"))
}

// =============================================================================
// OPTIONS
// =============================================================================

#[test]
fn test_options_file_shapes_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sable.toml");
    std::fs::write(
        &path,
        "[compiler]\nline_separator = \"crlf\"\nreference_field = \"ref\"\ntemporary_prefix = \"tmp\"\nindent = \"\\t\"\n",
    )
    .unwrap();
    let options = CompilerOptions::from_file(&path).unwrap();
    let f = fixture(options);

    let mut reporter = f.session.new_reporter();
    let block = f.session.compile_body(&sample_body(&f, "counter.cs"), &mut reporter);
    let text = f.session.formatter().format_block_body(&block);

    assert_eq!(
        text,
        "var b = { ref: 2 };\r\n\
         /*  x\r\n  y*/\r\n\
         if (a) {\r\n\
         \tvar tmp1 = this.next();\r\n\
         \td.set_Size(tmp1);\r\n\
         \treturn tmp1;\r\n\
         }\r\n"
    );
    assert_eq!(reporter.messages().len(), 1);
    assert_eq!(reporter.messages()[0].text, "Unsupported construct: lock.");
}

#[test]
fn test_reporter_follows_warnings_as_errors() {
    const ODD: Message = Message {
        severity: Severity::Warning,
        code: "SC9001",
        format: "odd {0}",
    };

    let strict = fixture(CompilerOptions {
        warnings_as_errors: true,
        ..Default::default()
    });
    let mut reporter = strict.session.new_reporter();
    reporter.message(&ODD, &["thing".to_string()]);
    assert_eq!(reporter.messages()[0].severity, Severity::Error);

    let lenient = fixture(CompilerOptions::default());
    let mut reporter = lenient.session.new_reporter();
    reporter.message(&ODD, &["thing".to_string()]);
    assert_eq!(reporter.messages()[0].severity, Severity::Warning);
    assert!(!reporter.has_errors());
}

// =============================================================================
// ATTRIBUTES
// =============================================================================

#[test]
fn test_attributes_through_session() {
    let f = fixture(CompilerOptions::default());
    let mut reporter = f.session.new_reporter();

    let records = f.session.attributes(Entity::Type(f.counter), &mut reporter);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].attribute_type, "Acme.LimitAttribute");
    assert_eq!(records[0].positional_arguments[0].as_i64(), Some(10));
    assert!(f.session.has_attribute(Entity::Type(f.counter), "Acme.LimitAttribute", &mut reporter));
    assert!(reporter.messages().is_empty());
}

#[test]
fn test_attribute_failure_is_an_internal_error() {
    let f = fixture(CompilerOptions::default());
    let mut reporter = f.session.new_reporter();

    let records = f.session.attributes(Entity::Type(f.ghost), &mut reporter);
    assert!(records.is_empty());
    assert!(reporter.has_internal_errors());
    assert_eq!(
        reporter.messages()[0].text,
        "Internal error: reading attributes of Acme.Ghost: Type 'Acme.Ghost' not found in metadata"
    );
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

#[test]
fn test_text_reporter_output() {
    let f = fixture(CompilerOptions::default());
    let mut reporter = TextErrorReporter::new(Vec::new());
    f.session.compile_body(&sample_body(&f, "src/Counter.cs"), &mut reporter);
    assert_eq!(reporter.error_count(), 1);

    let text = String::from_utf8(reporter.into_inner()).unwrap();
    assert_eq!(text, "src/Counter.cs(9,5): error SC7001: Unsupported construct: lock.\n");
}

#[test]
fn test_render_diagnostics_for_body() {
    let f = fixture(CompilerOptions::default());
    let mut reporter = f.session.new_reporter();
    f.session.compile_body(&sample_body(&f, "Counter.cs"), &mut reporter);

    let mut source = " ".repeat(40);
    source.push_str("lock (x) {}\n");
    let mut files = SourceFiles::new();
    files.add("Counter.cs", source);

    let text = render_diagnostics(reporter.messages(), &files).unwrap();
    assert!(text.contains("error[SC7001]: Unsupported construct: lock."));
    assert!(text.contains("Counter.cs"));
}

// =============================================================================
// CONCURRENCY
// =============================================================================

#[test]
fn test_bodies_compile_concurrently() {
    let f = fixture(CompilerOptions::default());
    let expected = {
        let mut reporter = f.session.new_reporter();
        let block = f.session.compile_body(&sample_body(&f, "main.cs"), &mut reporter);
        f.session.formatter().format_block_body(&block)
    };

    let shared = SharedErrorReporter::new();
    std::thread::scope(|scope| {
        for i in 0..4 {
            let mut reporter = shared.clone();
            let f = &f;
            let expected = &expected;
            scope.spawn(move || {
                let body = sample_body(f, &format!("body{}.cs", i));
                let block = f.session.compile_body(&body, &mut reporter);
                assert_eq!(&f.session.formatter().format_block_body(&block), expected);
                // Attribute lookups share the session caches
                assert_eq!(f.session.attributes(Entity::Type(f.counter), &mut reporter).len(), 1);
            });
        }
    });

    let messages = shared.messages();
    assert_eq!(messages.len(), 4);
    let mut files: Vec<&str> = messages.iter().map(|m| &*m.location.file).collect();
    files.sort_unstable();
    assert_eq!(files, vec!["body0.cs", "body1.cs", "body2.cs", "body3.cs"]);
}
