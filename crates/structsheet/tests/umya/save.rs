use super::{Employee, employees};
use structsheet::{SchemaError, SheetBackend, SheetError, Workbook, WorkbookConfig};

#[test]
fn saved_file_reopens_and_appends() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("staff.xlsx");

    let mut book = Workbook::with_config(WorkbookConfig {
        filename: path.to_string_lossy().into_owned(),
        ..WorkbookConfig::default()
    });
    book.add_sheet("Staff")
        .unwrap()
        .write(&employees()[..1])
        .unwrap();
    book.add_sheet("Archive").unwrap().write::<Employee>(&[]).unwrap();
    book.save().unwrap();
    assert!(path.exists());

    let mut reopened = Workbook::open_path(&path).unwrap();
    assert_eq!(reopened.filename(), "staff.xlsx");
    assert_eq!(
        reopened.sheet_names(),
        vec!["Staff".to_string(), "Archive".to_string()]
    );
    let mut late = employees()[1].clone();
    late.age = None;
    late.leave = [("2024-03".to_string(), 9)].into_iter().collect();
    {
        let mut sheet = reopened.open_sheet("Staff").unwrap();
        assert_eq!(sheet.current_row(), 2);
        sheet.write(std::slice::from_ref(&late)).unwrap();
        let rows = sheet.backend().rows().unwrap();
        assert_eq!(
            rows[0],
            vec!["Name", "Age", "Active", "Rate", "Teams", "2024-01", "2024-03"]
        );
        assert_eq!(rows[2], vec!["bo", "", "FALSE", "30", "web", "", "9"]);
    }

    let mut sheet = reopened.open_sheet_at(0).unwrap();
    let back: Vec<Employee> = sheet.read().unwrap();
    assert_eq!(back.len(), 2);
    assert_eq!(back[0], employees()[0]);
    assert_eq!(back[1].leave, late.leave);
    assert_eq!(back[1].age, Some(0));
    assert_eq!(back[1].rate, 30.0);
}

#[test]
fn appending_a_key_the_header_lacks_fails() {
    let mut book = Workbook::new("staff.xlsx");
    book.add_sheet("Staff")
        .unwrap()
        .write(&employees()[..1])
        .unwrap();

    let mut sheet = book.open_sheet("Staff").unwrap();
    let err = sheet.write(&employees()[1..]).unwrap_err();
    assert!(matches!(
        err,
        SheetError::Schema(SchemaError::UnplannedExpandKey { ref key, .. }) if key == "2024-02"
    ));
}

#[test]
fn delete_sheet_and_download() {
    let mut book = Workbook::new("report.xlsx");
    book.add_sheet("Keep").unwrap().write(&employees()).unwrap();
    book.add_sheet("Drop").unwrap().write(&employees()).unwrap();
    book.delete_sheet("Drop").unwrap();
    assert_eq!(book.sheet_names(), vec!["Keep".to_string()]);

    let download = book.download().unwrap();
    assert_eq!(download.filename(), "report.xlsx");
    assert!(download.body().starts_with(b"PK"));
    assert!(download.headers().contains(&(
        "Content-Disposition",
        "attachment; filename=\"report.xlsx\"".to_string()
    )));
}
