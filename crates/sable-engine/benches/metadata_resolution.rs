use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sable_engine::metadata::{
    decode_attribute_blob, encode_attribute_blob, AttributeValue, CustomAttribute, ElementType, LoadedMetadata, MemberRefSig,
    MetadataModule, MethodDef, NamedArgument, TypeDef, TypeSig,
};
use sable_engine::source::{
    Entity, MemberDefinition, MemberKind, Parameter, SemanticModel, TypeDefinition, TypeKind, TypeRef,
};
use sable_engine::MetadataWriteBackEngine;
use std::sync::Arc;

const PARAMETER_TYPES: [&str; 4] = ["System.Int32", "System.String", "System.Double", "System.Boolean"];

fn label(text: String) -> CustomAttribute {
    let parameters = vec![TypeSig::named("System.String")];
    let blob = encode_attribute_blob(&parameters, &[AttributeValue::String(text)], &[]).unwrap();
    CustomAttribute {
        constructor: MemberRefSig {
            declaring_type: TypeSig::named("Bench.LabelAttribute"),
            name: ".ctor".to_string(),
            parameters,
            return_type: TypeSig::named("System.Void"),
        },
        blob,
    }
}

/// `types` classes, each with one `Run` overload per parameter type
fn program(types: usize) -> (Arc<SemanticModel>, Arc<LoadedMetadata>, Vec<Entity>) {
    let mut model = SemanticModel::new();
    let mut module = MetadataModule::new("bench");
    let mut entities = Vec::new();

    for t in 0..types {
        let name = format!("Type{}", t);
        let ty = model.add_type(TypeDefinition::new("Bench", name.as_str(), TypeKind::Class));
        let mut def = TypeDef::new("Bench", name.as_str());
        entities.push(Entity::Type(ty));

        // Metadata lists the overloads in reverse
        for (i, parameter) in PARAMETER_TYPES.iter().enumerate().rev() {
            let mut method = MethodDef::new("Run", vec![TypeSig::named(*parameter)], TypeSig::named("System.Void"));
            method.custom_attributes.push(label(format!("{}.{}", t, i)));
            def.add_method(method);
        }
        for parameter in PARAMETER_TYPES {
            let member = model.add_member(
                MemberDefinition::new(ty, MemberKind::Method, "Run", TypeRef::void())
                    .with_parameters(vec![Parameter::new("value", TypeRef::named(parameter))]),
            );
            entities.push(Entity::Member(member));
        }
        module.add_type(def);
    }

    (Arc::new(model), Arc::new(LoadedMetadata::new(module)), entities)
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");

    for types in [10usize, 100, 1000] {
        let (model, metadata, entities) = program(types);
        group.throughput(Throughput::Elements(entities.len() as u64));

        group.bench_with_input(BenchmarkId::new("cold", types), &entities, |b, entities| {
            b.iter(|| {
                let engine = MetadataWriteBackEngine::new(model.clone(), metadata.clone());
                for &entity in entities {
                    black_box(engine.get_attributes(black_box(entity)).unwrap());
                }
            });
        });

        let engine = MetadataWriteBackEngine::new(model.clone(), metadata.clone());
        for &entity in &entities {
            engine.get_attributes(entity).unwrap();
        }
        group.bench_with_input(BenchmarkId::new("cached", types), &entities, |b, entities| {
            b.iter(|| {
                for &entity in entities {
                    black_box(engine.get_attributes(black_box(entity)).unwrap());
                }
            });
        });
    }

    group.finish();
}

fn bench_blob_decoding(c: &mut Criterion) {
    let parameters = vec![
        TypeSig::named("System.String"),
        TypeSig::named("System.Int32"),
        TypeSig::array(TypeSig::named("System.String")),
    ];
    let blob = encode_attribute_blob(
        &parameters,
        &[
            AttributeValue::String("widget".to_string()),
            AttributeValue::I32(42),
            AttributeValue::Array {
                element_type: ElementType::String,
                values: (0..16).map(|i| AttributeValue::String(format!("tag{}", i))).collect(),
            },
        ],
        &[
            NamedArgument::property("Enabled", AttributeValue::Boolean(true)),
            NamedArgument::field("Weight", AttributeValue::F64(0.5)),
        ],
    )
    .unwrap();

    c.bench_function("decode_attribute_blob", |b| {
        b.iter(|| decode_attribute_blob(black_box(&blob), black_box(&parameters)).unwrap());
    });
}

criterion_group!(benches, bench_resolution, bench_blob_decoding);
criterion_main!(benches);
