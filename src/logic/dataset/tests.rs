use super::*;
use crate::logic::error::DataError;
use std::fs;
use tempfile::tempdir;

const SAMPLE: &str = "\
 Destination Port, Flow Duration, Flow Bytes/s, Label
80,100,Infinity,DDoS
443,-5,200,BENIGN
80,,NaN,DDoS
22,300,abc,BENIGN
";

#[test]
fn test_read_trims_headers_and_splits_label() {
    let table = read_csv(SAMPLE.as_bytes()).unwrap();

    assert_eq!(
        table.feature_names,
        vec!["Destination Port", "Flow Duration", "Flow Bytes/s"]
    );
    assert_eq!(table.label_name, "Label");
    assert_eq!(table.labels, vec!["DDoS", "BENIGN", "DDoS", "BENIGN"]);
    assert!(table.rows[0][2].is_infinite());
    assert!(table.rows[2][1].is_nan());
    assert!(table.rows[3][2].is_nan());
}

#[test]
fn test_clean_fills_means_and_clamps() {
    let (dataset, stats) = clean(read_csv(SAMPLE.as_bytes()).unwrap()).unwrap();
    let x = dataset.features();

    // Flow Duration: mean of 100, -5, 300 = 131.666..., negative clamped after fill
    assert!((x[[2, 1]] - 395.0 / 3.0).abs() < 1e-9);
    assert_eq!(x[[1, 1]], 0.0);

    // Flow Bytes/s: only 200 is finite and numeric
    assert_eq!(x[[0, 2]], 200.0);
    assert_eq!(x[[2, 2]], 200.0);
    assert_eq!(x[[3, 2]], 200.0);

    assert_eq!(stats.infinite_replaced, 1);
    assert_eq!(stats.missing_filled, 4);
    assert_eq!(stats.negatives_clamped, 1);
}

#[test]
fn test_clean_output_is_finite_and_non_negative() {
    let rows = vec![
        vec![f64::INFINITY, -1.0, f64::NAN],
        vec![f64::NEG_INFINITY, -7.5, 3.0],
        vec![2.0, f64::NAN, -3.0],
        vec![4.0, 1e300, f64::INFINITY],
    ];
    let raw = RawTable {
        feature_names: vec!["a".into(), "b".into(), "c".into()],
        label_name: "Label".into(),
        rows,
        labels: vec!["x".into(), "y".into(), "x".into(), "y".into()],
    };

    let (dataset, _) = clean(raw).unwrap();
    for &v in dataset.features().iter() {
        assert!(v.is_finite(), "value {} not finite", v);
        assert!(v >= 0.0, "value {} negative", v);
    }
}

#[test]
fn test_all_missing_column_is_rejected() {
    let csv = "a,b,Label\n1,x,DDoS\n2,,BENIGN\n";
    let err = clean(read_csv(csv.as_bytes()).unwrap()).unwrap_err();
    assert!(matches!(err, DataError::EmptyColumn(ref c) if c == "b"));
}

#[test]
fn test_structural_errors() {
    assert!(matches!(
        read_csv("Label\nDDoS\n".as_bytes()).unwrap_err(),
        DataError::TooFewColumns(1)
    ));
    assert!(matches!(
        read_csv("a,Label\n".as_bytes()).unwrap_err(),
        DataError::Empty
    ));
    assert!(matches!(
        read_csv("a,b,Label\n1,2\n".as_bytes()).unwrap_err(),
        DataError::RowWidth { row: 0, expected: 3, found: 2 }
    ));
    assert!(matches!(
        read_csv("a,Label\n1,\n".as_bytes()).unwrap_err(),
        DataError::EmptyLabel { row: 0 }
    ));
}

#[test]
fn test_load_csv_from_file_and_row_lookup() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("flows.csv");
    fs::write(&path, SAMPLE).unwrap();

    let (dataset, _) = load_csv(&path).unwrap();
    assert_eq!(dataset.n_rows(), 4);
    assert_eq!(dataset.n_features(), 3);
    assert_eq!(dataset.row(3).unwrap()[0], 22.0);
    assert!(matches!(
        dataset.row(4).unwrap_err(),
        DataError::RowOutOfRange { index: 4, rows: 4 }
    ));
}

#[test]
fn test_missing_file_reports_path() {
    let err = load_csv(std::path::Path::new("/nonexistent/flows.csv")).unwrap_err();
    match err {
        DataError::Io { path, .. } => assert!(path.contains("flows.csv")),
        other => panic!("unexpected error: {:?}", other),
    }
}
