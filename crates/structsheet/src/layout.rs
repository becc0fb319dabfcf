//! Column layout planning.
//!
//! A [`ColumnModel`] is rebuilt for every write (allowempty and expand columns
//! depend on the dataset) and every read (expand columns depend on the file's
//! header row). Planning is two-pass for expand fields: every record's keys are
//! collected before the first cell is written.

use crate::error::{SchemaError, SheetError};
use crate::record::{FieldSchema, FieldShape, SheetRecord};
use crate::tag::{FieldDescriptor, Level};
use crate::value::FieldValue;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// Ordered descriptors for one bind operation.
#[derive(Clone, Debug, Default)]
pub struct ColumnModel {
    fields: Vec<FieldDescriptor>,
    /// Logical column → column actually used in the sheet (collapsed columns removed).
    output: FxHashMap<u32, u32>,
    /// Bound to an existing header row: descriptors write where they were found.
    physical: bool,
}

impl ColumnModel {
    fn from_descriptors(mut fields: Vec<FieldDescriptor>) -> Self {
        fields.sort_by_key(|d| d.column);
        let mut model = ColumnModel {
            fields,
            output: FxHashMap::default(),
            physical: false,
        };
        model.assign_output_columns();
        model
    }

    fn assign_output_columns(&mut self) {
        self.output.clear();
        let mut next = 1;
        for desc in &self.fields {
            if is_emitted(desc) {
                self.output.insert(desc.column, next);
                next += 1;
            }
        }
    }

    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The declared descriptor of `field`.
    pub fn declared(&self, field: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|d| d.level == Level::Declared && d.field_name == field)
    }

    /// The expand column for `key` of `field`.
    pub fn expanded(&self, field: &str, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|d| {
            d.level == Level::Expanded && d.field_name == field && d.header_name == key
        })
    }

    /// Expand keys of `field`, in column order.
    pub fn expand_keys(&self, field: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|d| d.level == Level::Expanded && d.field_name == field)
            .map(|d| d.header_name.as_str())
            .collect()
    }

    /// Number of level-2 columns.
    pub fn expand_len(&self) -> usize {
        self.fields
            .iter()
            .filter(|d| d.level == Level::Expanded)
            .count()
    }

    /// Descriptors that get a header cell, in sheet order.
    pub fn header_cells(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|d| is_emitted(d))
    }

    /// Sheet column for a descriptor, or `None` when it is collapsed, skipped
    /// or an expand parent. After [`reconcile`] this is the column the header
    /// was found in, and `None` for anything the row did not name.
    ///
    /// [`reconcile`]: ColumnModel::reconcile
    pub fn output_column(&self, desc: &FieldDescriptor) -> Option<u32> {
        if self.physical {
            return (desc.matched && desc.column > 0).then_some(desc.column);
        }
        if !is_emitted(desc) {
            return None;
        }
        self.output.get(&desc.column).copied()
    }

    /// Bind the skeleton to a physical header row.
    ///
    /// Declared columns match by exact (trimmed) header text, wherever they sit
    /// in the row; the first cell wins when a header repeats. Other cells are
    /// offered to the expand fields' patterns, and each match adds a level-2
    /// descriptor keyed by the header text; when several expand fields accept
    /// the same header, the first declared one takes it. Cells matching nothing
    /// are ignored. Declared fields missing from the row stay unbound
    /// (column 0), as do the expand parents themselves.
    pub fn reconcile(&mut self, header_row: &[String]) {
        self.fields.retain(|d| d.level == Level::Declared);
        for desc in &mut self.fields {
            desc.column = 0;
            desc.matched = false;
        }

        let by_header: FxHashMap<String, usize> = self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.skip && !d.expand)
            .map(|(i, d)| (d.header_name.clone(), i))
            .collect();

        let mut discovered = Vec::new();
        for (idx, cell) in header_row.iter().enumerate() {
            let text = cell.trim();
            if text.is_empty() {
                continue;
            }
            let col = idx as u32 + 1;
            if let Some(&i) = by_header.get(text) {
                let desc = &mut self.fields[i];
                if !desc.matched {
                    desc.column = col;
                    desc.matched = true;
                }
                continue;
            }
            if let Some(parent) = self.fields.iter().find(|d| d.matches_expand(text)) {
                let mut child = FieldDescriptor::expanded(parent, text, col);
                child.matched = true;
                discovered.push(child);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            matched = self.fields.iter().filter(|d| d.matched).count(),
            expanded = discovered.len(),
            "reconciled header row"
        );
        self.fields.extend(discovered);
        self.fields.sort_by_key(|d| d.column);
        self.output.clear();
        self.physical = true;
    }

    /// Whether the model was bound to a header row by [`reconcile`].
    ///
    /// [`reconcile`]: ColumnModel::reconcile
    pub fn is_physical(&self) -> bool {
        self.physical
    }

    /// Whether [`reconcile`] bound at least one column.
    ///
    /// [`reconcile`]: ColumnModel::reconcile
    pub fn any_bound(&self) -> bool {
        self.fields.iter().any(|d| d.matched && d.column > 0)
    }

    /// Physical column → descriptor, for descriptors bound by [`reconcile`].
    ///
    /// [`reconcile`]: ColumnModel::reconcile
    pub fn bound_columns(&self) -> FxHashMap<u32, &FieldDescriptor> {
        self.fields
            .iter()
            .filter(|d| d.matched && d.column > 0)
            .map(|d| (d.column, d))
            .collect()
    }
}

impl<'a> IntoIterator for &'a ColumnModel {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

fn is_emitted(desc: &FieldDescriptor) -> bool {
    match desc.level {
        Level::Declared => desc.has_header_cell(),
        Level::Expanded => true,
    }
}

/// Parse one schema entry into its declared descriptor, checking that the
/// annotation fits the field's shape. `None` for skipped fields.
fn declare(schema: &FieldSchema, column: u32) -> Result<Option<FieldDescriptor>, SchemaError> {
    let mut desc = FieldDescriptor::parse(schema.tag, column)?;
    if desc.is_skip() {
        return Ok(None);
    }
    desc.field_name = schema.name.to_string();
    if desc.header_name.is_empty() {
        desc.header_name = schema.name.to_string();
    }
    desc.kind = schema.kind.clone();

    match (desc.expand, schema.shape) {
        (true, FieldShape::Scalar) => {
            return Err(SchemaError::ExpandNotMap {
                field: desc.field_name,
            });
        }
        (false, FieldShape::Map) => {
            return Err(SchemaError::MapWithoutExpand {
                field: desc.field_name,
            });
        }
        _ => {}
    }
    if desc.kind.is_list() && desc.split.as_deref().is_none_or(str::is_empty) {
        return Err(SchemaError::ListWithoutSplit {
            field: desc.field_name,
        });
    }
    Ok(Some(desc))
}

/// Plan the columns for writing `records`.
///
/// `allowempty` collapses a column only when every record leaves the field
/// absent; an empty dataset keeps the tag's request. Expand fields get one
/// column per distinct key across all records, sorted lexicographically.
/// Collapsed columns still consume a logical column number. An expand parent
/// shares the logical column of its first key and never gets a cell of its own.
pub fn plan_for_write<T: SheetRecord>(records: &[T]) -> Result<ColumnModel, SheetError> {
    let mut fields = Vec::new();
    let mut col = 1u32;

    for schema in T::schema() {
        let Some(mut desc) = declare(&schema, col)? else {
            continue;
        };

        if desc.allow_empty && !records.is_empty() {
            desc.allow_empty = records.iter().all(|r| {
                r.field_value(schema.name)
                    .is_none_or(|value| value.is_absent())
            });
        }

        if desc.expand {
            let keys: BTreeSet<String> = records
                .iter()
                .filter_map(|r| match r.field_value(schema.name) {
                    Some(FieldValue::Map(entries)) => Some(entries),
                    _ => None,
                })
                .flatten()
                .map(|(key, _)| key)
                .collect();
            let children: Vec<FieldDescriptor> = keys
                .iter()
                .enumerate()
                .map(|(i, key)| FieldDescriptor::expanded(&desc, key, col + i as u32))
                .collect();
            col += children.len() as u32;
            fields.push(desc);
            fields.extend(children);
        } else {
            col += 1;
            fields.push(desc);
        }
    }

    let model = ColumnModel::from_descriptors(fields);
    #[cfg(feature = "tracing")]
    tracing::debug!(
        columns = model.header_cells().count(),
        expanded = model.expand_len(),
        "planned write layout"
    );
    Ok(model)
}

/// Declared skeleton of `T`; expand columns are discovered by
/// [`ColumnModel::reconcile`].
pub fn plan_for_read<T: SheetRecord>() -> Result<ColumnModel, SheetError> {
    plan_for_write::<T>(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SheetRecord;
    use std::collections::BTreeMap;

    #[derive(Debug, Default, Clone, PartialEq, SheetRecord)]
    struct Person {
        #[excel("Name")]
        name: String,
        #[excel("Age,allowempty")]
        age: Option<i32>,
        #[excel("Height")]
        height: i32,
        #[excel("Holiday,expand:date")]
        holiday: BTreeMap<String, bool>,
        #[excel("Nick")]
        nick: String,
        secret: u8,
    }

    fn person(name: &str, age: Option<i32>, keys: &[&str]) -> Person {
        Person {
            name: name.into(),
            age,
            height: 180,
            holiday: keys.iter().map(|k| (k.to_string(), true)).collect(),
            ..Person::default()
        }
    }

    fn headers(model: &ColumnModel) -> Vec<(String, u32)> {
        model
            .header_cells()
            .map(|d| (d.header_name.clone(), model.output_column(d).unwrap()))
            .collect()
    }

    #[test]
    fn expand_keys_are_the_sorted_union() {
        let data = vec![
            person("h", Some(28), &["2022-01-28", "2022-01-27"]),
            person("o", Some(28), &["2022-01-30", "2022-01-27"]),
        ];
        let model = plan_for_write(&data).unwrap();
        assert_eq!(
            model.expand_keys("holiday"),
            vec!["2022-01-27", "2022-01-28", "2022-01-30"]
        );
        assert_eq!(model.expand_len(), 3);
        let cols: Vec<u32> = model.iter().map(|d| d.column).collect();
        let mut sorted = cols.clone();
        sorted.sort();
        assert_eq!(cols, sorted);
        assert_eq!(model.declared("nick").unwrap().column, 7);
        assert_eq!(
            headers(&model),
            vec![
                ("Name".to_string(), 1),
                ("Age".to_string(), 2),
                ("Height".to_string(), 3),
                ("2022-01-27".to_string(), 4),
                ("2022-01-28".to_string(), 5),
                ("2022-01-30".to_string(), 6),
                ("Nick".to_string(), 7),
            ]
        );
    }

    #[test]
    fn allowempty_collapses_only_when_all_absent() {
        let all_none = vec![person("a", None, &[]), person("b", None, &[])];
        let model = plan_for_write(&all_none).unwrap();
        let age = model.declared("age").unwrap();
        assert!(age.allow_empty);
        assert_eq!(age.column, 2);
        assert_eq!(model.output_column(age), None);
        assert_eq!(
            headers(&model),
            vec![
                ("Name".to_string(), 1),
                ("Height".to_string(), 2),
                ("Nick".to_string(), 3),
            ]
        );

        let one_some = vec![person("a", None, &[]), person("b", Some(1), &[])];
        let model = plan_for_write(&one_some).unwrap();
        assert!(!model.declared("age").unwrap().allow_empty);
    }

    #[test]
    fn empty_dataset_honours_the_tag_and_adds_no_expand_columns() {
        let model = plan_for_write::<Person>(&[]).unwrap();
        assert!(model.declared("age").unwrap().allow_empty);
        assert_eq!(model.expand_len(), 0);
        assert!(model.declared("secret").is_none());
        assert_eq!(model.declared("holiday").unwrap().column, 4);
        assert_eq!(model.declared("nick").unwrap().column, 4);
    }

    #[test]
    fn reconcile_binds_by_name_not_position() {
        let mut model = plan_for_read::<Person>().unwrap();
        let row: Vec<String> = ["Height", "junk", "2022-02-01", "Name", "", "2022-01-01"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        model.reconcile(&row);

        assert_eq!(model.declared("height").unwrap().column, 1);
        assert_eq!(model.declared("name").unwrap().column, 4);
        let age = model.declared("age").unwrap();
        assert!(!age.matched);
        assert_eq!(age.column, 0);
        assert_eq!(model.expanded("holiday", "2022-02-01").unwrap().column, 3);
        assert_eq!(model.expanded("holiday", "2022-01-01").unwrap().column, 6);

        let bound = model.bound_columns();
        assert_eq!(bound.len(), 4);
        assert!(!bound.contains_key(&2));
        assert_eq!(bound[&3].level, Level::Expanded);
    }

    #[test]
    fn reconciled_model_writes_where_headers_were_found() {
        let mut model = plan_for_read::<Person>().unwrap();
        let row: Vec<String> = ["Name", "Age", "Height", "2022-01-27", "2022-01-30"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        model.reconcile(&row);
        assert!(model.is_physical());
        assert!(model.any_bound());

        // Age is allowempty by tag but the row names it, so it is writable.
        let age = model.declared("age").unwrap();
        assert_eq!(model.output_column(age), Some(2));
        assert_eq!(
            model.output_column(model.expanded("holiday", "2022-01-30").unwrap()),
            Some(5)
        );
        assert_eq!(model.output_column(model.declared("nick").unwrap()), None);
        assert_eq!(model.output_column(model.declared("holiday").unwrap()), None);

        let mut blank = plan_for_read::<Person>().unwrap();
        blank.reconcile(&["1".to_string(), "x".to_string()]);
        assert!(!blank.any_bound());
    }

    #[test]
    fn expand_parent_shares_its_first_key_column() {
        let data = vec![person("a", Some(1), &["2022-03-01", "2022-03-02"])];
        let model = plan_for_write(&data).unwrap();
        let parent = model.declared("holiday").unwrap();
        let first = model.expanded("holiday", "2022-03-01").unwrap();
        assert_eq!(parent.column, first.column);
        assert_eq!(model.output_column(parent), None);
        assert_eq!(model.output_column(first), Some(4));

        let mut read = plan_for_read::<Person>().unwrap();
        read.reconcile(&["2022-03-01".to_string()]);
        assert_eq!(read.declared("holiday").unwrap().column, 0);
    }

    #[derive(Debug, Default, SheetRecord)]
    struct Calendar {
        #[excel("Leave,expand:date")]
        leave: BTreeMap<String, u8>,
        #[excel("Other,expand:regexp(^\\d{4}-)")]
        other: BTreeMap<String, u8>,
    }

    #[test]
    fn overlapping_expand_patterns_go_to_the_first_declared_field() {
        let mut model = plan_for_read::<Calendar>().unwrap();
        model.reconcile(&["2022-05-01".to_string(), "2022-05".to_string()]);
        assert_eq!(model.expand_keys("leave"), vec!["2022-05-01"]);
        assert_eq!(model.expand_keys("other"), vec!["2022-05"]);
    }

    #[derive(Default, SheetRecord)]
    struct BadExpand {
        #[excel("X,expand:date")]
        x: i32,
    }

    #[derive(Default, SheetRecord)]
    struct BareMap {
        #[excel("X")]
        x: BTreeMap<String, i32>,
    }

    #[derive(Default, SheetRecord)]
    struct UnsplitList {
        #[excel("Tags")]
        tags: Vec<String>,
    }

    #[test]
    fn shape_mismatches_are_schema_errors() {
        assert!(matches!(
            plan_for_write::<BadExpand>(&[]),
            Err(SheetError::Schema(SchemaError::ExpandNotMap { .. }))
        ));
        assert!(matches!(
            plan_for_write::<BareMap>(&[]),
            Err(SheetError::Schema(SchemaError::MapWithoutExpand { .. }))
        ));
        assert!(matches!(
            plan_for_read::<UnsplitList>(),
            Err(SheetError::Schema(SchemaError::ListWithoutSplit { .. }))
        ));
    }
}
