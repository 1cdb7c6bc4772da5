use feedback_tools::flatten::{
    Projected, Projection, attributes_to_record, build_table, flatten_element, project,
    table_records,
};
use feedback_tools::model::{FieldValue, Record, ScalarValue};
use feedback_tools::xml::{escape, parse_document};

fn record(fields: &[(&str, &str)]) -> Record {
    fields.iter().map(|(name, value)| (*name, *value)).collect()
}

#[test]
fn rows_flatten_into_records() {
    let payload = parse_document(
        r#"<GetSurveyDataPagedResult>
             <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" id="NewDataSet">
               <xs:element name="NewDataSet"/>
             </xs:schema>
             <diffgr:diffgram xmlns:diffgr="urn:schemas-microsoft-com:xml-diffgram-v1">
               <NewDataSet>
                 <Table1 diffgr:id="Table11">
                   <recordid>101</recordid>
                   <q1>Yes</q1>
                   <q2>4</q2>
                 </Table1>
                 <Table1 diffgr:id="Table12">
                   <recordid>102</recordid>
                   <q1>No</q1>
                 </Table1>
               </NewDataSet>
             </diffgr:diffgram>
           </GetSurveyDataPagedResult>"#,
    )
    .expect("payload parsed");

    let records = table_records(&payload).expect("row set present");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0], record(&[("recordid", "101"), ("q1", "Yes"), ("q2", "4")]));
    assert_eq!(records[1].text("q1").as_deref(), Some("No"));
    assert!(!records[1].contains("q2"));
}

#[test]
fn answers_keep_their_whitespace() {
    let payload = parse_document(
        "<NewDataSet>\n  <Table1>\n    <comment>  padded answer </comment>\n    <blank> </blank>\n    <empty></empty>\n  </Table1>\n</NewDataSet>",
    )
    .expect("payload parsed");

    let records = table_records(&payload).expect("row set present");

    assert_eq!(records[0].text("comment").as_deref(), Some("  padded answer "));
    assert_eq!(records[0].text("blank").as_deref(), Some(" "));
    assert_eq!(records[0].text("empty").as_deref(), Some(""));
    assert_eq!(
        records[0].field_names().collect::<Vec<_>>(),
        vec!["comment", "blank", "empty"]
    );
}

#[test]
fn payload_without_dataset_has_no_rows() {
    let payload = parse_document("<GetSurveyDataPagedResult><Message>none</Message></GetSurveyDataPagedResult>")
        .expect("payload parsed");
    assert_eq!(table_records(&payload), None);
}

#[test]
fn repeated_and_nested_elements_flatten_to_paths() {
    let row = parse_document(
        "<Table1><recordid>7</recordid><choice>a</choice><choice>b</choice><choice>c</choice>\
         <address><city>Oslo</city><zip>0150</zip></address></Table1>",
    )
    .expect("row parsed");

    let flat = flatten_element(&row);

    assert_eq!(
        flat.get("choice"),
        Some(&FieldValue::Repeated(vec![
            ScalarValue::Text("a".into()),
            ScalarValue::Text("b".into()),
            ScalarValue::Text("c".into()),
        ]))
    );
    assert_eq!(flat.text("address/city").as_deref(), Some("Oslo"));
    assert_eq!(flat.text("address/zip").as_deref(), Some("0150"));
    assert_eq!(
        flat.field_names().collect::<Vec<_>>(),
        vec!["recordid", "choice", "address/city", "address/zip"]
    );
}

#[test]
fn attributes_become_fields() {
    let element = parse_document(r#"<Participant recordid="12" email="a@example.com"/>"#)
        .expect("element parsed");
    let flat = attributes_to_record(&element);
    assert_eq!(flat, record(&[("recordid", "12"), ("email", "a@example.com")]));
}

#[test]
fn projection_selects_fields() {
    let source = record(&[("a", "1"), ("b", "2"), ("c", "3")]);

    assert_eq!(
        project(source.clone(), &Projection::Field("b".into())),
        Projected::Value(Some(FieldValue::text("2")))
    );
    assert_eq!(
        project(
            source.clone(),
            &Projection::Fields(vec!["a".into(), "c".into()])
        ),
        Projected::Record(record(&[("a", "1"), ("c", "3")]))
    );
    assert_eq!(
        project(source.clone(), &Projection::All),
        Projected::Record(source.clone())
    );
    assert_eq!(
        project(source, &Projection::Field("missing".into())),
        Projected::Value(None)
    );
}

#[test]
fn table_uses_first_record_for_header() {
    let mut repeated = record(&[("recordid", "2")]);
    repeated.insert(
        "choice",
        FieldValue::Repeated(vec!["x".into(), "y".into()]),
    );
    let records = vec![
        record(&[("recordid", "1"), ("choice", "a"), ("q1", "Yes")]),
        repeated,
    ];

    let table = build_table("Responses", &records);

    assert_eq!(table.columns, vec!["recordid", "choice", "q1"]);
    assert_eq!(table.rows[0], vec!["1", "a", "Yes"]);
    assert_eq!(table.rows[1], vec!["2", "x;y", ""]);
}

#[test]
fn escaping_is_single_pass() {
    assert_eq!(
        escape(r#"O'Brien & <Co>"x""#),
        "O&apos;Brien &amp; &lt;Co&gt;&quot;x&quot;"
    );
    assert_eq!(escape("&amp;"), "&amp;amp;");
    assert_eq!(escape("plain"), "plain");
}

#[test]
fn documents_serialize_back_to_xml() {
    let source = r#"<DataMap version="2"><Map heading="q1"><Value raw="1">Yes &amp; no</Value><Value raw="2"> </Value></Map><Empty/></DataMap>"#;
    let element = parse_document(source).expect("document parsed");
    assert_eq!(element.to_xml_string().expect("serialized"), source);
}

#[test]
fn malformed_documents_are_rejected() {
    assert!(parse_document("").is_err());
    assert!(parse_document("<open>").is_err());
    assert!(parse_document("<a></a><b></b>").is_err());
}
