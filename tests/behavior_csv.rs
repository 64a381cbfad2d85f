// tests/behavior_csv.rs
use market_pulse::behavior::{load_records, summarize, DataError};
use std::io::Write;

fn write_csv(body: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().expect("tmp");
    f.write_all(body.as_bytes()).expect("write");
    f
}

#[test]
fn loads_file_and_summarizes() {
    let f = write_csv(
        "user_id,item_id,timestamp\n\
         alice,widget,2024-05-01 09:00:00\n\
         alice,gadget,2024-05-01 13:30:00\n\
         bob,widget,2024-05-02 10:00:00\n\
         ,widget,2024-05-02 11:00:00\n",
    );
    let records = load_records(f.path()).unwrap();
    assert_eq!(records.len(), 3);

    let s = summarize(&records);
    assert_eq!(s.purchase_frequency["widget"], 2);
    assert_eq!(s.purchase_frequency["gadget"], 1);
    // alice 4.5h, bob 0h
    assert!((s.avg_session_hours.unwrap() - 2.25).abs() < 1e-9);

    let v = serde_json::to_value(&s).unwrap();
    assert_eq!(v["purchase_frequency"]["widget"], 2);
}

#[test]
fn missing_file_is_csv_error() {
    let err = load_records(std::path::Path::new("does/not/exist.csv")).unwrap_err();
    assert!(matches!(err, DataError::Csv(_)));
}
