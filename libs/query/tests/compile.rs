use fedspend_query::{
    assemble, compile_filter, compile_search, ColumnAllowlist, FilterSpec, Pagination, TableName,
};
use serde_json::json;

fn opportunity_columns() -> ColumnAllowlist {
    ColumnAllowlist::new([
        "NOTICEID",
        "TITLE",
        "DESCRIPTION",
        "AMOUNT_K",
        "STATE",
        "PRIMARYCONTACTEMAIL",
        "POSTEDDATE",
    ])
}

#[test]
fn single_quotes_are_always_doubled() {
    let cols = opportunity_columns();
    let spec = FilterSpec::from_value(json!({
        "STATE": ["Hawai'i"],
        "AMOUNT_KMin": "1'0",
        "exact_values": {
            "TITLE": {"operator": "CONTAINS", "value": "Lockheed's"},
            "DESCRIPTION": "it's",
        }
    }));
    let clause = compile_filter(&spec, &cols);
    let text = clause.as_str();
    assert!(text.contains("'Hawai''i'"));
    assert!(text.contains("'1''0'"));
    assert!(text.contains("'%Lockheed''s%'"));
    assert!(text.contains("'it''s'"));

    // Strip doubled quotes; what remains must be balanced literal delimiters.
    let singles = text.replace("''", "").matches('\'').count();
    assert_eq!(singles % 2, 0, "unbalanced quote in {text}");

    let search = compile_search("o'hare,-d'arcy", Some(&cols));
    assert!(search.as_str().contains("'%o''hare%'"));
    assert!(search.as_str().contains("'%d''arcy%'"));
}

#[test]
fn unknown_fields_are_dropped_everywhere() {
    let cols = opportunity_columns();
    let spec = FilterSpec::from_value(json!({
        "password\"--Min": 1,
        "SSN": ["1"],
        "dataAvailability": ["SSN"],
        "exact_values": {"SSN": {"operator": "IS_NULL"}}
    }));
    let clause = compile_filter(&spec, &cols);
    assert!(clause.is_empty());
    assert!(!clause.as_str().contains("SSN"));
}

#[test]
fn range_pair_on_amount() {
    let clause = compile_filter(
        &FilterSpec::from_value(json!({"AMOUNT_KMin": 100, "AMOUNT_KMax": 200})),
        &ColumnAllowlist::new(["AMOUNT_K"]),
    );
    assert!(clause.as_str().contains("\"AMOUNT_K\" >= 100"));
    assert!(clause.as_str().contains("\"AMOUNT_K\" <= 200"));
    assert!(clause.as_str().contains(" AND "));
}

#[test]
fn exact_is_not_null_on_contact_email() {
    let clause = compile_filter(
        &FilterSpec::from_value(json!({
            "exact_values": {"PRIMARYCONTACTEMAIL": {"operator": "IS_NOT_NULL"}}
        })),
        &opportunity_columns(),
    );
    assert_eq!(clause.as_str(), "\"PRIMARYCONTACTEMAIL\" IS NOT NULL");
}

#[test]
fn search_terms_join_with_or() {
    let columns = ColumnAllowlist::new(["TITLE", "DESCRIPTION"]);
    let clause = compile_search("alpha,-beta", Some(&columns));
    let (positive, negative) = clause
        .as_str()
        .split_once(") OR ")
        .expect("term predicates joined by OR");
    assert!(positive.contains(
        "CAST(\"TITLE\" AS TEXT) ILIKE '%alpha%' OR CAST(\"DESCRIPTION\" AS TEXT) ILIKE '%alpha%'"
    ));
    assert_eq!(
        negative,
        "CAST(\"TITLE\" AS TEXT) NOT ILIKE '%beta%' \
         AND CAST(\"DESCRIPTION\" AS TEXT) NOT ILIKE '%beta%'"
    );
}

#[test]
fn text_predicates_cast_non_text_columns() {
    let cols = ColumnAllowlist::new(["ID", "AGENCY_NAME", "FISCAL_YEAR", "AMOUNT", "PROGRAM"]);

    let search = compile_search("water, -grant", Some(&cols));
    for col in ["AGENCY_NAME", "FISCAL_YEAR", "AMOUNT", "PROGRAM"] {
        assert!(search
            .as_str()
            .contains(&format!("CAST(\"{col}\" AS TEXT) ILIKE '%water%'")));
        assert!(search
            .as_str()
            .contains(&format!("CAST(\"{col}\" AS TEXT) NOT ILIKE '%grant%'")));
        assert!(!search.as_str().contains(&format!("\"{col}\" ILIKE")));
    }

    let filter = compile_filter(
        &FilterSpec::from_value(json!({
            "dataAvailability": ["AMOUNT"],
            "exact_values": {"FISCAL_YEAR": {"operator": "STARTS_WITH", "value": "202"}}
        })),
        &cols,
    );
    assert_eq!(
        filter.as_str(),
        "(\"AMOUNT\" IS NOT NULL AND CAST(\"AMOUNT\" AS TEXT) <> '') \
         AND CAST(\"FISCAL_YEAR\" AS TEXT) ILIKE '202%'"
    );
}

#[test]
fn compilation_is_idempotent() {
    let cols = opportunity_columns();
    let spec = FilterSpec::from_value(json!({
        "STATE": ["VA", "MD"],
        "AMOUNT_KMin": 10,
        "dataAvailability": ["PRIMARYCONTACTEMAIL", "TITLE"],
        "exact_values": {"TITLE": {"operator": "STARTS_WITH", "value": "UAS"}},
        "operator": "OR"
    }));
    assert_eq!(compile_filter(&spec, &cols), compile_filter(&spec, &cols));
    assert_eq!(
        compile_search("drone, -test ,sensor", Some(&cols)),
        compile_search("drone, -test ,sensor", Some(&cols))
    );
}

#[test]
fn plan_for_third_page() {
    let cols = opportunity_columns();
    let table = TableName::parse("FOUNDRY.SAM_CONTRACTS.RAW_CSV").unwrap();
    let filter = compile_filter(&FilterSpec::from_value(json!({"STATE": ["VA"]})), &cols);
    let search = compile_search("drone", Some(&cols));
    let plan = assemble(
        &table,
        &filter,
        &search,
        Pagination::new(3, 20).unwrap(),
        &cols,
        None,
    );

    assert!(plan.data_query.contains("LIMIT 20"));
    assert!(plan.data_query.contains("OFFSET 40"));
    assert!(plan.data_query.contains("ORDER BY \"NOTICEID\""));
    assert!(plan.count_query.starts_with("SELECT COUNT(*) AS total_count FROM"));
    assert!(!plan.count_query.contains("LIMIT"));
    assert!(!plan.count_query.contains("ORDER BY"));

    let data_where = &plan.data_query[plan.data_query.find("WHERE").unwrap()
        ..plan.data_query.find(" ORDER BY").unwrap()];
    let count_where = &plan.count_query[plan.count_query.find("WHERE").unwrap()..];
    assert_eq!(data_where, count_where);
}
