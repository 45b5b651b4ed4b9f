//! Field schema domain tests: hashes, projections, coercion and the
//! required-on-status gate.

use crate::schema::domain::{
    CompanyField, FieldDataType, FieldHash, FieldStyle, FieldValueError, FieldValueFilter,
    NewCompanyField, ProjectFieldView, RequiredFieldsCheck, SchemaDomainError, int_to_letters,
    is_empty_value, required_statuses,
};
use crate::shared::{CatalogId, CompanyId, Validator};
use chrono::Utc;
use rstest::rstest;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};

fn view(counter: u64, name: &str, data_type: FieldDataType, required: &[i32]) -> ProjectFieldView {
    let draft = NewCompanyField::new(CompanyId::new(), name, data_type, "owner@example.com");
    let hash = FieldHash::mint(counter).expect("counter should mint");
    ProjectFieldView {
        field: CompanyField::from_draft(draft, hash, Utc::now()),
        required_on_statuses: required.iter().copied().collect(),
        style: FieldStyle::Default,
    }
}

fn raw(entries: &[(&str, Value)]) -> BTreeMap<String, Value> {
    entries
        .iter()
        .map(|(key, value)| ((*key).to_owned(), value.clone()))
        .collect()
}

#[rstest]
#[case(1, "a")]
#[case(26, "z")]
#[case(27, "aa")]
#[case(52, "az")]
#[case(702, "zz")]
#[case(703, "aaa")]
fn int_to_letters_is_bijective_base_26(#[case] number: u64, #[case] expected: &str) {
    assert_eq!(int_to_letters(number), expected);
}

#[rstest]
fn minting_follows_the_counter() {
    let first = FieldHash::mint(0).expect("mint a");
    let second = FieldHash::mint(1).expect("mint b");
    assert_eq!(first.as_str(), "a");
    assert_eq!(second.as_str(), "b");
    assert!(first.mint_order() < second.mint_order());
    assert!(FieldHash::mint(26).expect("mint aa").mint_order() > FieldHash::mint(25).expect("mint z").mint_order());
}

#[rstest]
fn minting_rejects_counter_overflow() {
    assert_eq!(
        FieldHash::mint(u64::MAX),
        Err(SchemaDomainError::CounterOverflow(u64::MAX))
    );
}

#[rstest]
#[case("abc", true)]
#[case("phone_number", true)]
#[case("ab", false)]
#[case("ABC", false)]
#[case("abc1", false)]
#[case("abcdefghijklmnopqrstu", false)]
fn hand_supplied_hashes_follow_the_pattern(#[case] value: &str, #[case] valid: bool) {
    assert_eq!(FieldHash::parse(value).is_ok(), valid);
}

#[rstest]
fn data_type_codes_are_stable() {
    for data_type in FieldDataType::ALL {
        assert_eq!(FieldDataType::try_from(data_type.code()), Ok(data_type));
        assert_eq!(FieldDataType::try_from(data_type.as_str()), Ok(data_type));
    }
    assert!(FieldDataType::try_from(15).is_err());
    assert!(FieldDataType::try_from("money").is_err());
}

#[rstest]
fn company_field_draft_validates_text_lengths() {
    let validator = Validator::default();
    let draft = NewCompanyField::new(CompanyId::new(), "", FieldDataType::String, "a@b.io");
    let Err(SchemaDomainError::Validation(errors)) = draft.validate(&validator) else {
        panic!("empty name should be rejected");
    };
    assert!(errors.has_field("name"));

    let long_icon = NewCompanyField::new(CompanyId::new(), "Budget", FieldDataType::Float, "a@b.io")
        .with_icon("i".repeat(51));
    assert!(long_icon.validate(&validator).is_err());
}

#[rstest]
fn data_fields_need_a_foreign_catalog() {
    let validator = Validator::default();
    let catalog = CatalogId::new();
    let company = CompanyId::new();

    let missing = NewCompanyField::new(company, "Client", FieldDataType::Data, "a@b.io");
    assert_eq!(
        missing.validate(&validator),
        Err(SchemaDomainError::MissingCatalogReference)
    );

    let own = missing
        .clone()
        .with_data_catalog(catalog)
        .with_owner_catalog(catalog);
    assert_eq!(
        own.validate(&validator),
        Err(SchemaDomainError::SelfCatalogReference)
    );

    let foreign = missing.with_data_catalog(catalog);
    assert!(foreign.validate(&validator).is_ok());
}

#[rstest]
#[case("", FieldStyle::Default)]
#[case("hide_when_empty", FieldStyle::HideWhenEmpty)]
#[case("show_when_empty", FieldStyle::ShowWhenEmpty)]
fn styles_parse_from_storage_names(#[case] name: &str, #[case] expected: FieldStyle) {
    assert_eq!(FieldStyle::try_from(name), Ok(expected));
    assert_eq!(expected.as_str(), name);
}

#[rstest]
fn unknown_style_is_rejected() {
    assert!(matches!(
        FieldStyle::try_from("bold"),
        Err(SchemaDomainError::InvalidStyle(_))
    ));
}

#[rstest]
fn required_statuses_are_bounded() {
    assert_eq!(
        required_statuses([5, 1, 5]),
        Ok(BTreeSet::from([1, 5]))
    );
    assert_eq!(
        required_statuses([3, 11]),
        Err(SchemaDomainError::InvalidRequiredStatus(11))
    );
}

#[rstest]
#[case(None, true)]
#[case(Some(json!(null)), true)]
#[case(Some(json!("")), true)]
#[case(Some(json!([])), true)]
#[case(Some(json!({})), true)]
#[case(Some(json!(0)), false)]
#[case(Some(json!(false)), false)]
#[case(Some(json!("x")), false)]
fn emptiness_matches_required_semantics(#[case] value: Option<Value>, #[case] empty: bool) {
    assert_eq!(is_empty_value(value.as_ref()), empty);
}

#[rstest]
fn required_check_lists_every_missing_field() {
    let projection = vec![
        view(0, "Budget", FieldDataType::Float, &[5]),
        view(1, "Client", FieldDataType::String, &[5, 6]),
        view(2, "Notes", FieldDataType::Text, &[]),
    ];
    let fields = raw(&[("b", json!(""))]);

    let err = RequiredFieldsCheck::verify(&projection, &fields, 5)
        .expect_err("both required fields are empty");
    assert_eq!(err.hashes(), vec!["a", "b"]);
    assert_eq!(err.to_string(), "field 'a' required, field 'b' required");

    let filled = raw(&[("a", json!(10.5)), ("b", json!("ACME"))]);
    assert!(RequiredFieldsCheck::verify(&projection, &filled, 5).is_ok());
    assert!(RequiredFieldsCheck::verify(&projection, &fields, 3).is_ok());
}

#[rstest]
#[case(FieldDataType::Integer, json!(42), Some(json!(42)))]
#[case(FieldDataType::Integer, json!(4.2), None)]
#[case(FieldDataType::Integer, json!("42"), None)]
#[case(FieldDataType::Phone, json!(79_001_234_567_i64), Some(json!(79_001_234_567_i64)))]
#[case(FieldDataType::Float, json!(3), Some(json!(3.0)))]
#[case(FieldDataType::Bool, json!(true), Some(json!(true)))]
#[case(FieldDataType::Switch, json!(2), Some(json!(2)))]
#[case(FieldDataType::Switch, json!(3), None)]
#[case(FieldDataType::Array, json!(["x", 1]), Some(json!(["x", "1"])))]
#[case(FieldDataType::Link, json!("[docs](https://example.com/a)"), Some(json!("[docs](https://example.com/a)")))]
#[case(FieldDataType::Link, json!("https://example.com"), None)]
#[case(FieldDataType::Email, json!("ann@example.com"), Some(json!("ann@example.com")))]
#[case(FieldDataType::Email, json!("ann"), None)]
#[case(FieldDataType::Time, json!("2024-03-01T10:30:00Z"), Some(json!("10:30:00Z")))]
#[case(FieldDataType::DateTime, json!("2024-03-01T10:30:00+03:00"), Some(json!("2024-03-01T10:30:00+03:00")))]
#[case(FieldDataType::DateTime, json!("yesterday"), None)]
#[case(FieldDataType::People, json!(["ann@example.com"]), Some(json!(["ann@example.com"])))]
#[case(FieldDataType::People, json!(["ann"]), None)]
#[case(FieldDataType::Data, json!("not-a-uuid"), None)]
fn values_are_coerced_per_data_type(
    #[case] data_type: FieldDataType,
    #[case] input: Value,
    #[case] expected: Option<Value>,
) {
    let projection = vec![view(0, "Value", data_type, &[])];
    let result = FieldValueFilter::filter(&projection, &raw(&[("a", input)]));
    match expected {
        Some(value) => {
            let filtered = result.expect("value should coerce");
            assert_eq!(filtered.set.get("a"), Some(&value));
        }
        None => assert!(result.is_err()),
    }
}

#[rstest]
fn null_values_mark_removal() {
    let projection = vec![view(0, "Budget", FieldDataType::Float, &[])];
    let filtered = FieldValueFilter::filter(&projection, &raw(&[("a", Value::Null)]))
        .expect("null should be accepted");
    assert!(filtered.set.is_empty());
    assert!(filtered.removed.contains("a"));
}

#[rstest]
fn unprojected_keys_are_listed() {
    let projection = vec![view(0, "Budget", FieldDataType::Float, &[])];
    let err = FieldValueFilter::filter(&projection, &raw(&[("x", json!(1)), ("y", json!(2))]))
        .expect_err("unknown keys should fail");
    assert_eq!(err, FieldValueError::NotProjected(vec!["x".to_owned(), "y".to_owned()]));
    assert_eq!(err.to_string(), "cannot add: (x,y)");

    let none = FieldValueFilter::filter(&[], &raw(&[("a", json!(1))]))
        .expect_err("project without fields should fail");
    assert_eq!(none, FieldValueError::NoProjectFields);
}
