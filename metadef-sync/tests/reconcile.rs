//! End-to-end reconciliation against an in-memory schema service.

mod common;

use std::collections::BTreeMap;

use rstest::rstest;

use common::{remote_field, remote_record, FakeService};
use metadef_core::store::parse_definitions;
use metadef_core::types::{
    Access, AdminAccess, Capabilities, Definition, DefinitionMap, FieldDefinition,
    RenderableCapability, StorefrontAccess, TypeKey, ValidationValue,
};
use metadef_sync::denormalize::create_input;
use metadef_sync::normalize::normalize;
use metadef_sync::remote::{FieldOperation, RemoteValidation};
use metadef_sync::{
    diff, dry_run, pull, push, Outcome, PlannedAction, SchemaService, SyncError, SyncOptions,
};

fn options() -> SyncOptions {
    SyncOptions::default()
}

fn local(yaml: &str) -> DefinitionMap {
    parse_definitions(yaml).expect("valid declarations")
}

// ---------------------------------------------------------------------------
// Create pass
// ---------------------------------------------------------------------------

#[test]
fn new_type_is_created_with_defaulted_display_name_key() {
    let service = FakeService::new();
    let defs = local("color:\n  fieldDefinitions:\n    name:\n      type: single_line_text_field\n");

    let report = push(&service, &defs, &options()).expect("push");

    let creates = service.creates();
    assert_eq!(creates.len(), 1);
    let input = &creates[0];
    assert_eq!(input.type_key, "color");
    assert_eq!(input.name, "Color");
    assert_eq!(input.display_name_key.as_deref(), Some("name"));
    assert_eq!(input.field_definitions.len(), 1);
    assert_eq!(input.field_definitions[0].key, "name");
    assert_eq!(input.field_definitions[0].name, "Name");

    assert!(service.updates().is_empty(), "fresh type needs no update");
    assert_eq!(report.outcome(&TypeKey::from("color")), Some(Outcome::Created));
}

#[test]
fn dry_run_plans_the_same_create_without_mutating() {
    let service = FakeService::new();
    let defs = local("color:\n  fieldDefinitions:\n    name:\n      type: single_line_text_field\n");

    let plan = dry_run(&service, &defs, &options()).expect("plan");
    assert_eq!(plan.changes.len(), 1);
    assert_eq!(
        plan.changes[0].action,
        PlannedAction::Create {
            fields: vec!["name".to_string()],
            display_name_key: Some("name".to_string()),
        }
    );
    assert_eq!(service.mutation_count(), 0);
}

#[test]
fn remote_listing_is_refreshed_after_creates() {
    let service = FakeService::new();
    let defs = local("color:\n  fieldDefinitions:\n    name:\n      type: single_line_text_field\n");
    push(&service, &defs, &options()).expect("push");
    assert_eq!(service.list_calls(), 2);
}

// ---------------------------------------------------------------------------
// Update pass
// ---------------------------------------------------------------------------

#[test]
fn update_uses_field_set_difference() {
    let service = FakeService::with_records(vec![remote_record(
        "gid://7",
        "widget",
        vec![remote_field("b", "number_integer"), remote_field("c", "boolean")],
    )]);
    let defs = local(
        "widget:\n  fieldDefinitions:\n    a:\n      type: single_line_text_field\n    b:\n      type: number_integer\n",
    );

    let report = push(&service, &defs, &options()).expect("push");

    let updates = service.updates();
    assert_eq!(updates.len(), 1);
    let (id, input) = &updates[0];
    assert_eq!(id.as_str(), "gid://7");
    let ops: Vec<(&str, &str)> = input
        .field_definitions
        .iter()
        .map(|op| match op {
            FieldOperation::Create(f) => ("create", f.key.as_str()),
            FieldOperation::Update(f) => ("update", f.key.as_str()),
            FieldOperation::Delete(f) => ("delete", f.key.as_str()),
        })
        .collect();
    assert_eq!(ops, vec![("create", "a"), ("update", "b"), ("delete", "c")]);
    assert!(service.creates().is_empty());
    assert_eq!(report.outcome(&TypeKey::from("widget")), Some(Outcome::Updated));

    let stored = service.record("widget").expect("stored");
    let keys: Vec<&str> = stored.field_definitions.iter().map(|f| f.key.as_str()).collect();
    assert_eq!(keys, vec!["b", "a"]);
}

#[test]
fn unchanged_types_are_not_mutated() {
    let service = FakeService::with_records(vec![remote_record(
        "gid://1",
        "color",
        vec![remote_field("name", "single_line_text_field")],
    )]);
    // Spelled-out defaults canonicalize to the remote form.
    let defs = local(
        "color:\n  name: Color\n  displayNameKey: name\n  access:\n    admin: PUBLIC_READ_WRITE\n  fieldDefinitions:\n    name:\n      type: single_line_text_field\n      name: Name\n",
    );

    let report = push(&service, &defs, &options()).expect("push");
    assert_eq!(service.mutation_count(), 0);
    assert_eq!(report.outcome(&TypeKey::from("color")), Some(Outcome::Unchanged));
}

#[test]
fn remote_only_types_are_never_touched() {
    let service = FakeService::with_records(vec![
        remote_record("gid://1", "legacy", vec![remote_field("x", "boolean")]),
        remote_record("gid://2", "color", vec![]),
    ]);
    let defs = local("color:\n  description: Swatches\n  fieldDefinitions: {}\n");

    let report = push(&service, &defs, &options()).expect("push");
    for (id, _) in service.updates() {
        assert_ne!(id.as_str(), "gid://1");
    }
    assert!(report.outcome(&TypeKey::from("legacy")).is_none());
    assert!(service.record("legacy").is_some());

    let diff = diff(&service, &defs, &options()).expect("diff");
    assert_eq!(diff.unmanaged, vec![TypeKey::from("legacy")]);
}

#[test]
fn push_then_diff_is_clean() {
    let service = FakeService::new();
    let defs = local(
        r#"
color:
  description: Palette
  capabilities:
    translatable: true
  fieldDefinitions:
    hex:
      type: color
      required: true
    label:
      type: single_line_text_field
      validations:
        max: 40
hero_banner:
  name: Homepage hero
  access:
    storefront: NONE
  fieldDefinitions:
    swatch:
      type: metaobject_reference
      validations:
        metaobject_definition: color
"#,
    );
    push(&service, &defs, &options()).expect("push");
    let report = diff(&service, &defs, &options()).expect("diff");
    assert!(report.is_clean(), "unexpected diffs: {:?}", report.diffs);
}

#[test]
fn dropping_a_field_description_clears_it_remotely() {
    let mut name = remote_field("name", "single_line_text_field");
    name.description = Some("old help".to_string());
    let service = FakeService::with_records(vec![remote_record("gid://1", "color", vec![name])]);
    let defs = local("color:\n  fieldDefinitions:\n    name:\n      type: single_line_text_field\n");

    let report = push(&service, &defs, &options()).expect("push");
    assert_eq!(report.outcome(&TypeKey::from("color")), Some(Outcome::Updated));
    let updates = service.updates();
    assert_eq!(updates.len(), 1);
    match &updates[0].1.field_definitions[..] {
        [FieldOperation::Update(field)] => assert_eq!(field.description, ""),
        other => panic!("expected one field update, got {other:?}"),
    }
    assert_eq!(service.record("color").expect("color").field_definitions[0].description, None);

    assert!(diff(&service, &defs, &options()).expect("diff").is_clean());
    let again = push(&service, &defs, &options()).expect("second push");
    assert_eq!(again.outcome(&TypeKey::from("color")), Some(Outcome::Unchanged));
    assert_eq!(service.updates().len(), 1);
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

#[test]
fn reference_ids_become_type_keys_and_back() {
    let mut swatch = remote_field("swatch", "metaobject_reference");
    swatch.validations.push(RemoteValidation {
        name: "metaobject_definition_id".to_string(),
        value: "gid://1".to_string(),
    });
    let service = FakeService::with_records(vec![
        remote_record("gid://1", "color", vec![remote_field("name", "single_line_text_field")]),
        remote_record("gid://2", "hero_banner", vec![swatch]),
    ]);

    let pulled = pull(&service, &options()).expect("pull");
    assert!(pulled.unresolved.is_empty());
    let validations = &pulled.definitions[&TypeKey::from("hero_banner")].field_definitions
        ["swatch"]
        .validations;
    assert_eq!(validations.len(), 1);
    assert_eq!(validations["metaobject_definition"], ValidationValue::from("color"));

    // Touch the banner so it is pushed, then check the id form is restored.
    let mut defs = pulled.definitions.clone();
    if let Some(banner) = defs.get_mut(&TypeKey::from("hero_banner")) {
        banner.description = Some("changed".to_string());
    }
    push(&service, &defs, &options()).expect("push");
    let (_, input) = service.updates().pop().expect("one update");
    let FieldOperation::Update(field) = &input.field_definitions[0] else {
        panic!("expected field update");
    };
    assert_eq!(
        field.validations,
        vec![RemoteValidation {
            name: "metaobject_definition_id".to_string(),
            value: "gid://1".to_string(),
        }]
    );
}

#[test]
fn pull_reports_unknown_reference_ids() {
    let mut swatch = remote_field("swatch", "list.metaobject_reference");
    swatch.validations.push(RemoteValidation {
        name: "metaobject_definition_ids".to_string(),
        value: r#"["gid://1","gid://404"]"#.to_string(),
    });
    let service = FakeService::with_records(vec![
        remote_record("gid://1", "color", vec![]),
        remote_record("gid://2", "hero_banner", vec![swatch]),
    ]);

    let pulled = pull(&service, &options()).expect("pull");
    assert_eq!(pulled.unresolved.len(), 1);
    assert_eq!(pulled.unresolved[0].id, "gid://404");
    assert_eq!(
        pulled.definitions[&TypeKey::from("hero_banner")].field_definitions["swatch"]
            .validations["metaobject_definitions"],
        ValidationValue::List(vec!["color".into(), "".into()])
    );
}

#[test]
fn new_type_can_reference_type_created_earlier_in_same_push() {
    let service = FakeService::new();
    let defs = local(
        "color:\n  fieldDefinitions: {}\nhero_banner:\n  fieldDefinitions:\n    swatch:\n      type: metaobject_reference\n      validations:\n        metaobject_definition: color\n",
    );
    let report = push(&service, &defs, &options()).expect("push");
    assert_eq!(report.count(Outcome::Created), 2);

    let color_id = service.record("color").expect("color").id;
    let banner = &service.creates()[1];
    assert_eq!(
        banner.field_definitions[0].validations[0].value,
        color_id.as_str()
    );
}

#[test]
fn new_type_referencing_later_new_type_aborts_at_resolution() {
    let service = FakeService::new();
    let defs = local(
        "banner:\n  fieldDefinitions:\n    swatch:\n      type: metaobject_reference\n      validations:\n        metaobject_definition: zcolor\nzcolor:\n  fieldDefinitions: {}\n",
    );
    let err = push(&service, &defs, &options()).unwrap_err();
    match err {
        SyncError::Aborted {
            type_key,
            report,
            source,
        } => {
            assert_eq!(type_key, Some(TypeKey::from("banner")));
            assert_eq!(report.outcome(&TypeKey::from("banner")), Some(Outcome::Failed));
            assert!(matches!(*source, SyncError::UnresolvedType { .. }));
        }
        other => panic!("expected abort, got {other:?}"),
    }
    assert_eq!(service.mutation_count(), 0);
}

#[test]
fn unknown_reference_fails_before_any_mutation() {
    let service = FakeService::with_records(vec![remote_record("gid://1", "color", vec![])]);
    let defs = local(
        "color:\n  description: now changed\n  fieldDefinitions: {}\nhero_banner:\n  fieldDefinitions:\n    swatch:\n      type: metaobject_reference\n      validations:\n        metaobject_definition: palette\n",
    );
    let err = push(&service, &defs, &options()).unwrap_err();
    match err {
        SyncError::UnresolvedType {
            definition,
            field,
            type_key,
        } => {
            assert_eq!(definition.as_str(), "hero_banner");
            assert_eq!(field, "swatch");
            assert_eq!(type_key, "palette");
        }
        other => panic!("expected unresolved type, got {other:?}"),
    }
    assert_eq!(service.mutation_count(), 0);
}

#[test]
fn leftover_reference_id_from_another_shop_is_never_sent() {
    let service = FakeService::with_records(vec![remote_record("gid://1", "color", vec![])]);
    let defs = local(
        "color:\n  description: now changed\n  fieldDefinitions: {}\nhero:\n  fieldDefinitions:\n    swatch:\n      type: metaobject_reference\n      validations:\n        metaobject_definition_id: gid://shopify/MetaobjectDefinition/999\n",
    );

    let err = push(&service, &defs, &options()).unwrap_err();
    match err {
        SyncError::UnknownRemoteId {
            definition,
            field,
            id,
        } => {
            assert_eq!(definition.as_str(), "hero");
            assert_eq!(field, "swatch");
            assert_eq!(id, "gid://shopify/MetaobjectDefinition/999");
        }
        other => panic!("expected unknown remote id, got {other:?}"),
    }
    assert_eq!(service.mutation_count(), 0);

    let err = dry_run(&service, &defs, &options()).unwrap_err();
    assert!(matches!(err, SyncError::UnknownRemoteId { .. }));
}

// ---------------------------------------------------------------------------
// Failure handling
// ---------------------------------------------------------------------------

#[test]
fn user_errors_abort_the_run() {
    let service = FakeService::new().reject("b_type");
    let defs = local(
        "a_type:\n  fieldDefinitions: {}\nb_type:\n  fieldDefinitions: {}\nc_type:\n  fieldDefinitions: {}\n",
    );

    let err = push(&service, &defs, &options()).unwrap_err();
    let SyncError::Aborted {
        type_key,
        report,
        source,
    } = err
    else {
        panic!("expected abort");
    };
    assert_eq!(type_key, Some(TypeKey::from("b_type")));
    assert_eq!(report.outcome(&TypeKey::from("a_type")), Some(Outcome::Created));
    assert_eq!(report.outcome(&TypeKey::from("b_type")), Some(Outcome::Failed));
    assert_eq!(report.outcome(&TypeKey::from("c_type")), None);
    match *source {
        SyncError::Rejected { action, errors, .. } => {
            assert_eq!(action, "create");
            assert_eq!(errors.len(), 1);
        }
        other => panic!("expected rejection, got {other:?}"),
    }

    let created: Vec<String> = service.creates().into_iter().map(|c| c.type_key).collect();
    assert_eq!(created, vec!["a_type", "b_type"]);
}

#[test]
fn rejected_update_is_reported_with_service_message() {
    let service = FakeService::with_records(vec![remote_record("gid://1", "color", vec![])])
        .reject("color");
    let defs = local("color:\n  description: new\n  fieldDefinitions: {}\n");
    let err = push(&service, &defs, &options()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("color"), "{message}");
    assert!(message.contains("not allowed"), "{message}");
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[test]
fn listing_is_fully_drained() {
    let records = (1..=5)
        .map(|n| remote_record(&format!("gid://{n}"), &format!("type_{n}"), vec![]))
        .collect();
    let service = FakeService::with_records(records);

    let pulled = pull(&service, &SyncOptions { page_size: 2 }).expect("pull");
    assert_eq!(pulled.definitions.len(), 5);
    assert_eq!(service.list_calls(), 3);
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

fn bare() -> Definition {
    let mut def = Definition::default();
    def.field_definitions.insert(
        "name".to_string(),
        FieldDefinition::of_type("single_line_text_field"),
    );
    def
}

fn customised() -> Definition {
    let mut validations = BTreeMap::new();
    validations.insert("regex".to_string(), ValidationValue::from("^#[0-9a-f]{6}$"));
    validations.insert(
        "choices".to_string(),
        ValidationValue::List(vec!["red".into(), "blue".into()]),
    );
    let mut def = Definition {
        display_name: Some("Paint".to_string()),
        description: Some("Paint swatches".to_string()),
        access: Some(Access {
            admin: Some(AdminAccess::MerchantRead),
            storefront: Some(StorefrontAccess::None),
        }),
        capabilities: Some(Capabilities {
            publishable: true,
            renderable: Some(RenderableCapability {
                meta_description_key: Some("code".to_string()),
                meta_title_key: None,
            }),
            ..Capabilities::default()
        }),
        display_name_key: Some("title".to_string()),
        ..Definition::default()
    };
    def.field_definitions.insert(
        "code".to_string(),
        FieldDefinition {
            display_name: Some("Hex code".to_string()),
            description: Some("Six digit hex".to_string()),
            required: true,
            validations,
            ..FieldDefinition::of_type("single_line_text_field")
        },
    );
    def.field_definitions
        .insert("body".to_string(), FieldDefinition::of_type("multi_line_text_field"));
    def.field_definitions
        .insert("title".to_string(), FieldDefinition::of_type("single_line_text_field"));
    def
}

#[rstest]
#[case("bare", bare())]
#[case("customised", customised())]
#[case("empty", Definition::default())]
fn normalize_inverts_denormalize(#[case] label: &str, #[case] definition: Definition) {
    let service = FakeService::new();
    let type_key = TypeKey::from("paint_color");
    let input = create_input(&type_key, &definition).expect("input");
    service.create_definition(&input).expect("create");

    let record = service.record("paint_color").expect("stored");
    assert_eq!(normalize(&record), definition, "[{label}]");
}
