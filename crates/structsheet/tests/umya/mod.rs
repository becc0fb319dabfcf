mod roundtrip;
mod save;

use std::collections::HashMap;
use structsheet::SheetRecord;

#[derive(Debug, Default, Clone, PartialEq, SheetRecord)]
pub struct Employee {
    #[excel("Name,font{bold:true color:1F4E79}")]
    pub name: String,
    #[excel("Age,allowempty")]
    pub age: Option<u32>,
    #[excel("Active")]
    pub active: bool,
    #[excel("Rate")]
    pub rate: f64,
    #[excel("Teams,split:;")]
    pub teams: Vec<String>,
    #[excel("Leave,expand:month")]
    pub leave: HashMap<String, u8>,
}

pub fn employees() -> Vec<Employee> {
    vec![
        Employee {
            name: "ada".into(),
            age: Some(36),
            active: true,
            rate: 42.5,
            teams: vec!["core".into(), "infra".into()],
            leave: [("2024-01".to_string(), 2), ("2024-03".to_string(), 1)]
                .into_iter()
                .collect(),
        },
        Employee {
            name: "bo".into(),
            age: Some(51),
            active: false,
            rate: 30.0,
            teams: vec!["web".into()],
            leave: [("2024-02".to_string(), 5)].into_iter().collect(),
        },
    ]
}
