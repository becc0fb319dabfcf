use super::{Employee, employees};
use structsheet::{SheetBackend, SheetError, SheetRecord, Workbook};

#[test]
fn bytes_round_trip_through_xlsx() {
    let mut book = Workbook::new("staff.xlsx");
    book.add_sheet("Staff").unwrap().write(&employees()).unwrap();
    let bytes = book.to_bytes().unwrap();

    let mut reopened = Workbook::open_bytes(bytes).unwrap();
    assert_eq!(reopened.sheet_names(), vec!["Staff".to_string()]);
    let mut sheet = reopened.open_sheet("Staff").unwrap();
    let rows = sheet.backend().rows().unwrap();
    assert_eq!(
        rows[0],
        vec!["Name", "Age", "Active", "Rate", "Teams", "2024-01", "2024-02", "2024-03"]
    );
    assert_eq!(rows[1][4], "core;infra");

    let back: Vec<Employee> = sheet.read().unwrap();
    assert_eq!(back, employees());
    assert_eq!(sheet.expand_header_len(), 3);
}

#[test]
fn styled_cells_keep_their_text() {
    let mut book = Workbook::new("staff.xlsx");
    book.add_sheet("Staff").unwrap().write(&employees()).unwrap();
    let ws = book
        .spreadsheet()
        .get_sheet_by_name("Staff")
        .expect("sheet exists");
    assert_eq!(ws.get_value((1, 1)), "Name");
    assert_eq!(ws.get_value((1, 2)), "ada");
    assert_eq!(ws.get_value((3, 3)), "FALSE");
}

#[test]
fn reading_an_empty_sheet_fails() {
    let mut book = Workbook::new("empty.xlsx");
    let err = book
        .add_sheet("Nothing")
        .unwrap()
        .read::<Employee>()
        .unwrap_err();
    assert!(matches!(err, SheetError::EmptySheet { ref sheet } if sheet == "Nothing"));
}

#[test]
fn garbage_bytes_are_a_backend_error() {
    assert!(matches!(
        Workbook::open_bytes(b"not a zip".to_vec()),
        Err(SheetError::Backend { backend: "umya", .. })
    ));
}

#[derive(Debug, Default, PartialEq, SheetRecord)]
struct Ledger {
    #[excel("Max")]
    max: i64,
    #[excel("Odd")]
    odd: i64,
    #[excel("Min")]
    min: i64,
    #[excel("Unsigned")]
    unsigned: u64,
    #[excel("Small")]
    small: i64,
}

#[test]
fn wide_integers_keep_every_digit() {
    let ledger = vec![Ledger {
        max: i64::MAX,
        odd: 9_007_199_254_740_993,
        min: i64::MIN,
        unsigned: u64::MAX,
        small: -42,
    }];
    let mut book = Workbook::new("ledger.xlsx");
    book.add_sheet("Ledger").unwrap().write(&ledger).unwrap();
    let bytes = book.to_bytes().unwrap();

    let mut reopened = Workbook::open_bytes(bytes).unwrap();
    let mut sheet = reopened.open_sheet("Ledger").unwrap();
    let rows = sheet.backend().rows().unwrap();
    assert_eq!(
        rows[1],
        vec![
            "9223372036854775807",
            "9007199254740993",
            "-9223372036854775808",
            "18446744073709551615",
            "-42",
        ]
    );

    let back: Vec<Ledger> = sheet.read().unwrap();
    assert_eq!(back, ledger);
}
