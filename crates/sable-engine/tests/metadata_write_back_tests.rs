//! Integration tests for attribute write-back
//!
//! Tests cover:
//! - Types, nested types, fields, methods and constructors
//! - Properties, accessors and events
//! - Indexers told apart by signature
//! - Operators and conversion operators
//! - Explicit interface implementations (plain, generic, properties, indexers, events)
//! - Named arguments and attribute constructor resolution
//! - Failures, caching and concurrent queries

use pretty_assertions::assert_eq;
use sable_engine::compiler::{MetadataWriteBackEngine, ResolveError, WriteBackError};
use sable_engine::metadata::{
    encode_attribute_blob, member_flags, AttributeValue, CustomAttribute, EntityHandle, EventDef,
    FieldDef, LoadedMetadata, MemberRefSig, MetadataModule, MethodDef, NamedArgument,
    NamedArgumentKind, PropertyDef, TypeDef, TypeSig,
};
use sable_engine::source::types::known;
use sable_engine::source::{
    AccessorRole, Entity, MemberDefinition, MemberId, MemberKind, Parameter, SemanticModel,
    TypeDefId, TypeDefinition, TypeKind, TypeRef,
};
use sable_engine::AttributeRecord;
use std::collections::HashMap;
use std::sync::Arc;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn sig(name: &str) -> TypeSig {
    TypeSig::named(name)
}

fn int() -> TypeSig {
    sig(known::INT32)
}

fn string() -> TypeSig {
    sig(known::STRING)
}

fn void() -> TypeSig {
    sig(known::VOID)
}

fn constructor_ref(attribute_type: &str, parameters: Vec<TypeSig>) -> MemberRefSig {
    MemberRefSig {
        declaring_type: sig(attribute_type),
        name: ".ctor".to_string(),
        parameters,
        return_type: void(),
    }
}

/// `[Name("value")]`
fn name_attribute(value: &str) -> CustomAttribute {
    let parameters = vec![string()];
    let blob = encode_attribute_blob(&parameters, &[AttributeValue::String(value.to_string())], &[]).unwrap();
    CustomAttribute {
        constructor: constructor_ref("Acme.NameAttribute", parameters),
        blob,
    }
}

/// `[Marker(Priority = ..., Tag = ...)]`
fn marker_attribute(named: Vec<NamedArgument>) -> CustomAttribute {
    CustomAttribute {
        constructor: constructor_ref("Acme.MarkerAttribute", vec![]),
        blob: encode_attribute_blob(&[], &[], &named).unwrap(),
    }
}

fn method(name: &str, parameters: Vec<TypeSig>, return_type: TypeSig, label: &str) -> MethodDef {
    let mut def = MethodDef::new(name, parameters, return_type);
    def.custom_attributes.push(name_attribute(label));
    def
}

fn implemented(interface: TypeSig, name: &str, parameters: Vec<TypeSig>, return_type: TypeSig) -> MemberRefSig {
    MemberRefSig {
        declaring_type: interface,
        name: name.to_string(),
        parameters,
        return_type,
    }
}

/// Text of every `[Name]` attribute in `records`
fn labels(records: &[AttributeRecord]) -> Vec<String> {
    records
        .iter()
        .filter(|record| record.attribute_type == "Acme.NameAttribute")
        .filter_map(|record| record.positional_arguments.first())
        .filter_map(|value| value.as_str().map(str::to_string))
        .collect()
}

struct Fixture {
    model: Arc<SemanticModel>,
    metadata: Arc<LoadedMetadata>,
    types: HashMap<&'static str, TypeDefId>,
    members: HashMap<&'static str, MemberId>,
}

impl Fixture {
    fn engine(&self) -> MetadataWriteBackEngine {
        MetadataWriteBackEngine::new(self.model.clone(), self.metadata.clone())
    }

    fn ty(&self, key: &str) -> Entity {
        Entity::Type(self.types[key])
    }

    fn member(&self, key: &str) -> Entity {
        Entity::Member(self.members[key])
    }

    fn labels_of(&self, engine: &MetadataWriteBackEngine, entity: Entity) -> Vec<String> {
        labels(&engine.get_attributes(entity).unwrap())
    }
}

/// The semantic model and the compiled metadata of one small program.
/// Metadata members are stored in a different order than they are declared
/// in the model.
fn fixture() -> Fixture {
    let mut model = SemanticModel::new();
    let mut types = HashMap::new();
    let mut members = HashMap::new();

    let int_ref = TypeRef::int32;
    let string_ref = TypeRef::string;
    let widget_ref = || TypeRef::named("Acme.Widget");

    // Attribute classes
    let name_attr = model.add_type(TypeDefinition::new("Acme", "NameAttribute", TypeKind::Class));
    model.add_member(MemberDefinition::new(name_attr, MemberKind::Constructor, ".ctor", TypeRef::void()));
    let name_ctor = model.add_member(
        MemberDefinition::new(name_attr, MemberKind::Constructor, ".ctor", TypeRef::void())
            .with_parameters(vec![Parameter::new("name", string_ref())]),
    );
    members.insert("name_ctor", name_ctor);
    let marker_attr = model.add_type(TypeDefinition::new("Acme", "MarkerAttribute", TypeKind::Class));
    members.insert(
        "marker_ctor",
        model.add_member(MemberDefinition::new(marker_attr, MemberKind::Constructor, ".ctor", TypeRef::void())),
    );

    // Widget
    let widget = model.add_type(TypeDefinition::new("Acme", "Widget", TypeKind::Class));
    types.insert("widget", widget);
    let outer = model.add_type(TypeDefinition::new("Acme", "Outer", TypeKind::Class).with_type_parameters(1));
    types.insert("outer", outer);
    types.insert(
        "inner",
        model.add_type(TypeDefinition::new("", "Inner", TypeKind::Class).nested_in(outer)),
    );
    types.insert(
        "ghost",
        model.add_type(TypeDefinition::new("Acme", "Ghost", TypeKind::Class)),
    );

    members.insert(
        "size_field",
        model.add_member(MemberDefinition::new(widget, MemberKind::Field, "size", int_ref())),
    );

    let size = model.add_member(MemberDefinition::new(widget, MemberKind::Property, "Size", int_ref()));
    members.insert("size", size);
    members.insert("get_size", model.add_accessor(size, AccessorRole::Getter));
    members.insert("set_size", model.add_accessor(size, AccessorRole::Setter));

    let item_int = model.add_member(
        MemberDefinition::new(widget, MemberKind::Indexer, "Item", string_ref())
            .with_parameters(vec![Parameter::new("i", int_ref())]),
    );
    members.insert("item_int", item_int);
    members.insert("get_item_int", model.add_accessor(item_int, AccessorRole::Getter));
    members.insert(
        "item_int_int",
        model.add_member(
            MemberDefinition::new(widget, MemberKind::Indexer, "Item", string_ref())
                .with_parameters(vec![Parameter::new("i", int_ref()), Parameter::new("j", int_ref())]),
        ),
    );
    members.insert(
        "item_int_string",
        model.add_member(
            MemberDefinition::new(widget, MemberKind::Indexer, "Item", string_ref())
                .with_parameters(vec![Parameter::new("i", int_ref()), Parameter::new("s", string_ref())]),
        ),
    );

    let changed = model.add_member(MemberDefinition::new(
        widget,
        MemberKind::Event,
        "Changed",
        TypeRef::named("Acme.Handler"),
    ));
    members.insert("changed", changed);
    members.insert("add_changed", model.add_accessor(changed, AccessorRole::Adder));
    members.insert("remove_changed", model.add_accessor(changed, AccessorRole::Remover));

    members.insert(
        "run_int",
        model.add_member(
            MemberDefinition::new(widget, MemberKind::Method, "Run", TypeRef::void())
                .with_parameters(vec![Parameter::new("count", int_ref())]),
        ),
    );
    members.insert(
        "run_string",
        model.add_member(
            MemberDefinition::new(widget, MemberKind::Method, "Run", TypeRef::void())
                .with_parameters(vec![Parameter::new("label", string_ref())]),
        ),
    );
    members.insert(
        "ctor",
        model.add_member(MemberDefinition::new(widget, MemberKind::Constructor, ".ctor", TypeRef::void())),
    );
    members.insert(
        "ctor_int",
        model.add_member(
            MemberDefinition::new(widget, MemberKind::Constructor, ".ctor", TypeRef::void())
                .with_parameters(vec![Parameter::new("size", int_ref())]),
        ),
    );
    members.insert(
        "cctor",
        model.add_member(MemberDefinition::new(widget, MemberKind::Constructor, ".cctor", TypeRef::void()).as_static()),
    );

    let operand = || vec![Parameter::new("w", widget_ref())];
    members.insert(
        "op_add",
        model.add_member(
            MemberDefinition::new(widget, MemberKind::Operator, "op_Addition", widget_ref())
                .with_parameters(vec![Parameter::new("a", widget_ref()), Parameter::new("b", widget_ref())])
                .as_static(),
        ),
    );
    members.insert(
        "to_int",
        model.add_member(
            MemberDefinition::new(widget, MemberKind::Operator, "op_Implicit", int_ref())
                .with_parameters(operand())
                .as_static(),
        ),
    );
    members.insert(
        "to_double",
        model.add_member(
            MemberDefinition::new(widget, MemberKind::Operator, "op_Implicit", TypeRef::named(known::DOUBLE))
                .with_parameters(operand())
                .as_static(),
        ),
    );
    members.insert(
        "to_string",
        model.add_member(
            MemberDefinition::new(widget, MemberKind::Operator, "op_Explicit", string_ref())
                .with_parameters(operand())
                .as_static(),
        ),
    );

    // Explicit implementations
    members.insert(
        "get",
        model.add_member(
            MemberDefinition::new(widget, MemberKind::Method, "Get", int_ref())
                .with_parameters(vec![Parameter::new("key", int_ref())]),
        ),
    );
    members.insert(
        "store_int_get",
        model.add_member(
            MemberDefinition::new(widget, MemberKind::Method, "Get", int_ref())
                .with_parameters(vec![Parameter::new("key", int_ref())])
                .implementing(TypeRef::generic("Acme.IStore`1", vec![int_ref()]), "Get"),
        ),
    );
    members.insert(
        "store_string_get",
        model.add_member(
            MemberDefinition::new(widget, MemberKind::Method, "Get", string_ref())
                .with_parameters(vec![Parameter::new("key", string_ref())])
                .implementing(TypeRef::generic("Acme.IStore`1", vec![string_ref()]), "Get"),
        ),
    );
    members.insert(
        "convert",
        model.add_member(
            MemberDefinition::new(widget, MemberKind::Method, "Convert", TypeRef::method_parameter(0))
                .with_parameters(vec![Parameter::new("value", TypeRef::method_parameter(0))])
                .with_type_parameters(1)
                .implementing(TypeRef::named("Acme.IConverter"), "Convert"),
        ),
    );
    let sized = model.add_member(
        MemberDefinition::new(widget, MemberKind::Property, "Size", int_ref())
            .implementing(TypeRef::named("Acme.ISized"), "Size"),
    );
    members.insert("sized_size", sized);
    members.insert("sized_get_size", model.add_accessor(sized, AccessorRole::Getter));
    members.insert("sized_set_size", model.add_accessor(sized, AccessorRole::Setter));
    let lookup = model.add_member(
        MemberDefinition::new(widget, MemberKind::Indexer, "Item", int_ref())
            .with_parameters(vec![Parameter::new("key", string_ref())])
            .implementing(TypeRef::named("Acme.ILookup"), "Item"),
    );
    members.insert("lookup_item", lookup);
    members.insert("lookup_get_item", model.add_accessor(lookup, AccessorRole::Getter));
    members.insert("lookup_set_item", model.add_accessor(lookup, AccessorRole::Setter));
    let notify_changed = model.add_member(
        MemberDefinition::new(widget, MemberKind::Event, "Changed", TypeRef::named("Acme.Handler"))
            .implementing(TypeRef::named("Acme.INotify"), "Changed"),
    );
    members.insert("notify_changed", notify_changed);
    members.insert("notify_add_changed", model.add_accessor(notify_changed, AccessorRole::Adder));
    members.insert("notify_remove_changed", model.add_accessor(notify_changed, AccessorRole::Remover));

    // Failure cases
    members.insert(
        "missing",
        model.add_member(MemberDefinition::new(widget, MemberKind::Method, "Missing", TypeRef::void())),
    );
    members.insert(
        "dup",
        model.add_member(
            MemberDefinition::new(widget, MemberKind::Method, "Dup", TypeRef::void())
                .with_parameters(vec![Parameter::new("x", int_ref())]),
        ),
    );

    // -------------------------------------------------------------------------
    // Metadata
    // -------------------------------------------------------------------------

    let mut module = MetadataModule::new("acme");
    module.add_type(TypeDef::new("Acme", "NameAttribute"));
    module.add_type(TypeDef::new("Acme", "MarkerAttribute"));

    let mut outer_def = TypeDef::new("Acme", "Outer`1");
    outer_def.generic_parameter_count = 1;
    let outer_index = module.add_type(outer_def);
    let mut inner_def = TypeDef::new("", "Inner");
    inner_def.enclosing_type = Some(outer_index);
    inner_def.custom_attributes.push(name_attribute("inner"));
    module.add_type(inner_def);

    let mut def = TypeDef::new("Acme", "Widget");
    def.custom_attributes.push(marker_attribute(vec![
        NamedArgument::property("Priority", AttributeValue::I32(5)),
        NamedArgument::field("Tag", AttributeValue::String("core".to_string())),
    ]));
    def.custom_attributes.push(name_attribute("widget"));

    def.fields.push(FieldDef::new("other", int()));
    let mut size_field = FieldDef::new("size", int());
    size_field.custom_attributes.push(name_attribute("size field"));
    def.fields.push(size_field);

    // Conversions first so overloads are found by signature, not position
    let static_method = |def: &mut TypeDef, mut m: MethodDef| {
        m.flags |= member_flags::STATIC | member_flags::SPECIAL_NAME;
        def.add_method(m)
    };
    static_method(&mut def, method("op_Explicit", vec![sig("Acme.Widget")], string(), "to string"));
    static_method(
        &mut def,
        method("op_Implicit", vec![sig("Acme.Widget")], sig(known::DOUBLE), "to double"),
    );
    static_method(&mut def, method("op_Implicit", vec![sig("Acme.Widget")], int(), "to int"));
    static_method(
        &mut def,
        method("op_Addition", vec![sig("Acme.Widget"), sig("Acme.Widget")], sig("Acme.Widget"), "add"),
    );
    static_method(&mut def, method(".cctor", vec![], void(), "static ctor"));

    def.add_method(method(".ctor", vec![int()], void(), "ctor int"));
    def.add_method(method(".ctor", vec![], void(), "ctor"));
    def.add_method(method("Run", vec![string()], void(), "run string"));
    def.add_method(method("Run", vec![int()], void(), "run int"));
    def.add_method(method("Dup", vec![int()], void(), "dup 1"));
    def.add_method(method("Dup", vec![int()], void(), "dup 2"));

    let mut store_string = method("Acme.IStore<System.String>.Get", vec![string()], string(), "store string");
    store_string.implements.push(implemented(
        TypeSig::generic("Acme.IStore`1", vec![string()]),
        "Get",
        vec![TypeSig::TypeParameter(0)],
        TypeSig::TypeParameter(0),
    ));
    def.add_method(store_string);
    let mut store_int = method("Acme.IStore<System.Int32>.Get", vec![int()], int(), "store int");
    store_int.implements.push(implemented(
        TypeSig::generic("Acme.IStore`1", vec![int()]),
        "Get",
        vec![TypeSig::TypeParameter(0)],
        TypeSig::TypeParameter(0),
    ));
    def.add_method(store_int);
    def.add_method(method("Get", vec![int()], int(), "get"));

    let mut convert = method(
        "Acme.IConverter.Convert",
        vec![TypeSig::MethodParameter(0)],
        TypeSig::MethodParameter(0),
        "convert",
    );
    convert.generic_parameter_count = 1;
    convert.implements.push(implemented(
        sig("Acme.IConverter"),
        "Convert",
        vec![TypeSig::MethodParameter(0)],
        TypeSig::MethodParameter(0),
    ));
    def.add_method(convert);

    // Properties and indexers
    let get_size = def.add_method(method("get_Size", vec![], int(), "get size"));
    let set_size = def.add_method(method("set_Size", vec![int()], void(), "set size"));
    let mut size_def = PropertyDef::new("Size", int(), vec![]);
    size_def.getter = Some(get_size);
    size_def.setter = Some(set_size);
    size_def.custom_attributes.push(name_attribute("size"));

    let mut sized_getter = method("Acme.ISized.get_Size", vec![], int(), "sized get size");
    sized_getter.implements.push(implemented(sig("Acme.ISized"), "get_Size", vec![], int()));
    let sized_getter = def.add_method(sized_getter);
    let mut sized_setter = method("Acme.ISized.set_Size", vec![int()], void(), "sized set size");
    sized_setter.implements.push(implemented(sig("Acme.ISized"), "set_Size", vec![int()], void()));
    let sized_setter = def.add_method(sized_setter);
    let mut sized_def = PropertyDef::new("Acme.ISized.Size", int(), vec![]);
    sized_def.getter = Some(sized_getter);
    sized_def.setter = Some(sized_setter);
    sized_def.custom_attributes.push(name_attribute("sized size"));

    let get_item = def.add_method(method("get_Item", vec![int()], string(), "get item int"));
    let mut item_int = PropertyDef::new("Item", string(), vec![int()]);
    item_int.getter = Some(get_item);
    item_int.custom_attributes.push(name_attribute("item int"));
    let mut item_int_int = PropertyDef::new("Item", string(), vec![int(), int()]);
    item_int_int.custom_attributes.push(name_attribute("item int int"));
    let mut item_int_string = PropertyDef::new("Item", string(), vec![int(), string()]);
    item_int_string.custom_attributes.push(name_attribute("item int string"));

    let mut lookup_getter = method("Acme.ILookup.get_Item", vec![string()], int(), "lookup get item");
    lookup_getter.implements.push(implemented(sig("Acme.ILookup"), "get_Item", vec![string()], int()));
    let lookup_getter = def.add_method(lookup_getter);
    let mut lookup_setter = method("Acme.ILookup.set_Item", vec![string(), int()], void(), "lookup set item");
    lookup_setter
        .implements
        .push(implemented(sig("Acme.ILookup"), "set_Item", vec![string(), int()], void()));
    let lookup_setter = def.add_method(lookup_setter);
    let mut lookup_def = PropertyDef::new("Acme.ILookup.Item", int(), vec![string()]);
    lookup_def.getter = Some(lookup_getter);
    lookup_def.setter = Some(lookup_setter);
    lookup_def.custom_attributes.push(name_attribute("lookup item"));

    def.properties.extend([item_int_string, lookup_def, item_int_int, sized_def, item_int, size_def]);

    // Events
    let adder = def.add_method(method("add_Changed", vec![sig("Acme.Handler")], void(), "add changed"));
    let remover = def.add_method(MethodDef::new("remove_Changed", vec![sig("Acme.Handler")], void()));
    let mut changed_def = EventDef::new("Changed", sig("Acme.Handler"));
    changed_def.adder = Some(adder);
    changed_def.remover = Some(remover);
    changed_def.custom_attributes.push(name_attribute("changed"));
    def.events.push(changed_def);

    let mut notify_adder = method("Acme.INotify.add_Changed", vec![sig("Acme.Handler")], void(), "notify add changed");
    notify_adder
        .implements
        .push(implemented(sig("Acme.INotify"), "add_Changed", vec![sig("Acme.Handler")], void()));
    let notify_adder = def.add_method(notify_adder);
    let mut notify_remover = method(
        "Acme.INotify.remove_Changed",
        vec![sig("Acme.Handler")],
        void(),
        "notify remove changed",
    );
    notify_remover
        .implements
        .push(implemented(sig("Acme.INotify"), "remove_Changed", vec![sig("Acme.Handler")], void()));
    let notify_remover = def.add_method(notify_remover);
    let mut notify_def = EventDef::new("Acme.INotify.Changed", sig("Acme.Handler"));
    notify_def.adder = Some(notify_adder);
    notify_def.remover = Some(notify_remover);
    notify_def.custom_attributes.push(name_attribute("notify changed"));
    // Listed ahead of the plain event so names, not positions, decide
    def.events.insert(0, notify_def);

    module.add_type(def);

    let metadata = LoadedMetadata::from_bytes(&module.encode()).unwrap();
    Fixture {
        model: Arc::new(model),
        metadata: Arc::new(metadata),
        types,
        members,
    }
}

// =============================================================================
// TYPES AND SIMPLE MEMBERS
// =============================================================================

#[test]
fn test_type_attributes_in_metadata_order() {
    let f = fixture();
    let engine = f.engine();
    let records = engine.get_attributes(f.ty("widget")).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].attribute_type, "Acme.MarkerAttribute");
    assert_eq!(records[1].attribute_type, "Acme.NameAttribute");
    assert_eq!(labels(&records), vec!["widget"]);
}

#[test]
fn test_nested_generic_type() {
    let f = fixture();
    let engine = f.engine();
    assert_eq!(f.labels_of(&engine, f.ty("inner")), vec!["inner"]);
    assert!(engine.get_attributes(f.ty("outer")).unwrap().is_empty());
}

#[test]
fn test_field_attributes() {
    let f = fixture();
    let engine = f.engine();
    assert_eq!(f.labels_of(&engine, f.member("size_field")), vec!["size field"]);
}

#[test]
fn test_method_overloads() {
    let f = fixture();
    let engine = f.engine();
    assert_eq!(f.labels_of(&engine, f.member("run_int")), vec!["run int"]);
    assert_eq!(f.labels_of(&engine, f.member("run_string")), vec!["run string"]);
}

#[test]
fn test_constructors() {
    let f = fixture();
    let engine = f.engine();
    assert_eq!(f.labels_of(&engine, f.member("ctor")), vec!["ctor"]);
    assert_eq!(f.labels_of(&engine, f.member("ctor_int")), vec!["ctor int"]);
    assert_eq!(f.labels_of(&engine, f.member("cctor")), vec!["static ctor"]);
}

// =============================================================================
// PROPERTIES, INDEXERS AND EVENTS
// =============================================================================

#[test]
fn test_property_and_accessors() {
    let f = fixture();
    let engine = f.engine();
    assert_eq!(f.labels_of(&engine, f.member("size")), vec!["size"]);
    assert_eq!(f.labels_of(&engine, f.member("get_size")), vec!["get size"]);
    assert_eq!(f.labels_of(&engine, f.member("set_size")), vec!["set size"]);
}

#[test]
fn test_indexers_by_signature() {
    let f = fixture();
    let engine = f.engine();
    assert_eq!(f.labels_of(&engine, f.member("item_int")), vec!["item int"]);
    assert_eq!(f.labels_of(&engine, f.member("item_int_int")), vec!["item int int"]);
    assert_eq!(f.labels_of(&engine, f.member("item_int_string")), vec!["item int string"]);
    assert_eq!(f.labels_of(&engine, f.member("get_item_int")), vec!["get item int"]);
}

#[test]
fn test_event_and_accessors() {
    let f = fixture();
    let engine = f.engine();
    assert_eq!(f.labels_of(&engine, f.member("changed")), vec!["changed"]);
    assert_eq!(f.labels_of(&engine, f.member("add_changed")), vec!["add changed"]);
    assert!(engine.get_attributes(f.member("remove_changed")).unwrap().is_empty());
}

#[test]
fn test_accessor_resolves_to_owner_method() {
    let f = fixture();
    let engine = f.engine();
    let setter = engine.resolver().resolve(f.member("set_size")).unwrap();
    let EntityHandle::Method(ty, index) = setter else {
        panic!("expected a method handle, got {:?}", setter);
    };
    let type_def = engine.resolver().reader().type_def(ty).unwrap();
    assert_eq!(type_def.methods[index as usize].name, "set_Size");
}

// =============================================================================
// OPERATORS
// =============================================================================

#[test]
fn test_operators() {
    let f = fixture();
    let engine = f.engine();
    assert_eq!(f.labels_of(&engine, f.member("op_add")), vec!["add"]);
}

#[test]
fn test_conversion_operators_by_return_type() {
    let f = fixture();
    let engine = f.engine();
    assert_eq!(f.labels_of(&engine, f.member("to_int")), vec!["to int"]);
    assert_eq!(f.labels_of(&engine, f.member("to_double")), vec!["to double"]);
    assert_eq!(f.labels_of(&engine, f.member("to_string")), vec!["to string"]);
}

// =============================================================================
// EXPLICIT IMPLEMENTATIONS
// =============================================================================

#[test]
fn test_explicit_methods_of_constructed_interfaces() {
    let f = fixture();
    let engine = f.engine();
    assert_eq!(f.labels_of(&engine, f.member("get")), vec!["get"]);
    assert_eq!(f.labels_of(&engine, f.member("store_int_get")), vec!["store int"]);
    assert_eq!(f.labels_of(&engine, f.member("store_string_get")), vec!["store string"]);
}

#[test]
fn test_explicit_generic_method() {
    let f = fixture();
    let engine = f.engine();
    assert_eq!(f.labels_of(&engine, f.member("convert")), vec!["convert"]);
}

#[test]
fn test_explicit_property_and_indexer() {
    let f = fixture();
    let engine = f.engine();
    assert_eq!(f.labels_of(&engine, f.member("sized_size")), vec!["sized size"]);
    assert_eq!(f.labels_of(&engine, f.member("sized_get_size")), vec!["sized get size"]);
    assert_eq!(f.labels_of(&engine, f.member("lookup_item")), vec!["lookup item"]);
    assert_eq!(f.labels_of(&engine, f.member("lookup_get_item")), vec!["lookup get item"]);
}

#[test]
fn test_explicit_property_and_indexer_setters() {
    let f = fixture();
    let engine = f.engine();
    assert_eq!(f.labels_of(&engine, f.member("sized_set_size")), vec!["sized set size"]);
    assert_eq!(f.labels_of(&engine, f.member("lookup_set_item")), vec!["lookup set item"]);
    // The implicit property keeps its own setter
    assert_eq!(f.labels_of(&engine, f.member("set_size")), vec!["set size"]);
}

#[test]
fn test_explicit_event_and_accessors() {
    let f = fixture();
    let engine = f.engine();
    assert_eq!(f.labels_of(&engine, f.member("notify_changed")), vec!["notify changed"]);
    assert_eq!(f.labels_of(&engine, f.member("notify_add_changed")), vec!["notify add changed"]);
    assert_eq!(
        f.labels_of(&engine, f.member("notify_remove_changed")),
        vec!["notify remove changed"]
    );
    assert_eq!(f.labels_of(&engine, f.member("changed")), vec!["changed"]);
}

// =============================================================================
// ARGUMENTS AND CONSTRUCTORS
// =============================================================================

#[test]
fn test_named_arguments() {
    let f = fixture();
    let engine = f.engine();
    let records = engine.get_attributes(f.ty("widget")).unwrap();
    let marker = &records[0];

    assert!(marker.positional_arguments.is_empty());
    assert_eq!(marker.named_arguments.len(), 2);
    assert_eq!(marker.named_arguments[0].kind, NamedArgumentKind::Property);
    assert_eq!(marker.named_argument("Priority").and_then(AttributeValue::as_i64), Some(5));
    assert_eq!(marker.named_arguments[1].kind, NamedArgumentKind::Field);
    assert_eq!(marker.named_argument("Tag").and_then(AttributeValue::as_str), Some("core"));
    assert_eq!(marker.named_argument("Missing"), None);
}

#[test]
fn test_resolve_attribute_constructor() {
    let f = fixture();
    let engine = f.engine();
    let records = engine.get_attributes(f.ty("widget")).unwrap();

    assert_eq!(engine.resolve_attribute_constructor(&records[0]), Ok(f.members["marker_ctor"]));
    assert_eq!(engine.resolve_attribute_constructor(&records[1]), Ok(f.members["name_ctor"]));
}

#[test]
fn test_has_attribute() {
    let f = fixture();
    let engine = f.engine();
    assert_eq!(engine.has_attribute(f.ty("widget"), "Acme.MarkerAttribute"), Ok(true));
    assert_eq!(engine.has_attribute(f.member("run_int"), "Acme.MarkerAttribute"), Ok(false));
}

// =============================================================================
// FAILURES AND CACHING
// =============================================================================

#[test]
fn test_type_not_found() {
    let f = fixture();
    let engine = f.engine();
    assert_eq!(
        engine.get_attributes(f.ty("ghost")).unwrap_err(),
        WriteBackError::Resolve(ResolveError::TypeNotFound {
            name: "Acme.Ghost".to_string()
        })
    );
}

#[test]
fn test_member_not_found() {
    let f = fixture();
    let engine = f.engine();
    let err = engine.get_attributes(f.member("missing")).unwrap_err();
    assert!(matches!(
        err,
        WriteBackError::Resolve(ResolveError::MemberNotFound { ref type_name, .. }) if type_name == "Acme.Widget"
    ));
}

#[test]
fn test_ambiguous_match_is_an_error() {
    let f = fixture();
    let engine = f.engine();
    let err = engine.get_attributes(f.member("dup")).unwrap_err();
    assert!(matches!(
        err,
        WriteBackError::Resolve(ResolveError::AmbiguousMatch { candidates: 2, .. })
    ));
}

#[test]
fn test_repeated_queries_share_results() {
    let f = fixture();
    let engine = f.engine();
    let first = engine.get_attributes(f.member("size")).unwrap();
    let second = engine.get_attributes(f.member("size")).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    engine.get_attributes(f.member("get_size")).unwrap();
    // Declaring type, property and getter
    assert_eq!(engine.resolver().cached_count(), 3);
}

#[test]
fn test_concurrent_queries() {
    let f = fixture();
    let engine = f.engine();
    let keys = [
        "size_field", "size", "get_size", "item_int", "item_int_int", "changed", "to_int", "to_double",
        "store_int_get", "convert", "lookup_item",
    ];
    let expected: Vec<Vec<String>> = {
        let reference = f.engine();
        keys.iter().map(|k| f.labels_of(&reference, f.member(k))).collect()
    };

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for (key, want) in keys.iter().zip(&expected) {
                    assert_eq!(&f.labels_of(&engine, f.member(key)), want);
                }
            });
        }
    });
}
