//! Mapping header columns onto record fields.
//!
//! A record type describes its fields once with a [`RecordLayout`]: the
//! field name, an optional annotation, and an accessor returning a
//! [`Destination`] for that field. Resolving a layout against a header
//! produces a [`RecordBinding`], which scans rows into the record.
//!
//! Column names are matched in three passes, first match wins:
//!
//! 1. exact equality
//! 2. case-insensitive equality
//! 3. case-insensitive equality with `_` and space treated as equal
//!
//! # Example
//!
//! ```ignore
//! use csvx::{CsvRecord, Destination, RecordLayout};
//!
//! #[derive(Default)]
//! struct Person {
//!     id: i64,
//!     name: String,
//!     notes: String,
//! }
//!
//! impl CsvRecord for Person {
//!     fn layout() -> RecordLayout<Self> {
//!         RecordLayout::<Self>::new()
//!             .field("ID", |p| Destination::from(&mut p.id))
//!             .tagged("name", "full_name", |p| Destination::from(&mut p.name))
//!             .tagged("notes", "-", |p| Destination::from(&mut p.notes))
//!     }
//! }
//! ```

use std::fmt;

use tracing::trace;

use crate::error::{CsvxError, Result};
use crate::scan::{Cells, Destination, ScanContext, scan_cell, trimmed_cell};

/// Borrows one field of a record as a scan destination.
pub type FieldAccessor<T> = for<'a> fn(&'a mut T) -> Destination<'a>;

/// Annotation value that excludes a field from mapping.
pub const SKIP_ANNOTATION: &str = "-";

/// A record type that can be scanned from a row by column name.
pub trait CsvRecord: Sized {
    /// Declares the record's fields in declaration order.
    fn layout() -> RecordLayout<Self>;
}

/// Column a field maps to, after reading its annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnName<'a> {
    Named(&'a str),
    Skip,
}

/// Reads an annotation: comma-separated parts whose first part overrides the
/// column name. `-` skips the field; an empty first part keeps `field`.
pub fn parse_annotation<'a>(field: &'a str, annotation: &'a str) -> ColumnName<'a> {
    let first = annotation.split(',').next().unwrap_or_default().trim();
    match first {
        SKIP_ANNOTATION => ColumnName::Skip,
        "" => ColumnName::Named(field),
        name => ColumnName::Named(name),
    }
}

struct FieldSpec<T> {
    field: &'static str,
    annotation: &'static str,
    accessor: FieldAccessor<T>,
}

/// Declarative description of how a record's fields map to columns.
pub struct RecordLayout<T> {
    fields: Vec<FieldSpec<T>>,
}

impl<T> Default for RecordLayout<T> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<T> RecordLayout<T> {
    /// Starts an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a field matched by its own name.
    #[must_use]
    pub fn field(self, field: &'static str, accessor: FieldAccessor<T>) -> Self {
        self.tagged(field, "", accessor)
    }

    /// Registers a field with an annotation such as `"full_name"` or `"-"`.
    #[must_use]
    pub fn tagged(
        mut self,
        field: &'static str,
        annotation: &'static str,
        accessor: FieldAccessor<T>,
    ) -> Self {
        self.fields.push(FieldSpec {
            field,
            annotation,
            accessor,
        });
        self
    }

    /// Number of registered fields, including skipped ones.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Binds every non-skipped field to a header column.
    ///
    /// Fails on the first field that matches no column; nothing is bound in
    /// that case.
    pub fn resolve<S: AsRef<str>>(&self, header: &[S]) -> Result<RecordBinding<T>> {
        let mut slots: Vec<Option<Slot<T>>> = Vec::with_capacity(header.len());
        slots.resize_with(header.len(), || None);

        for spec in &self.fields {
            let name = match parse_annotation(spec.field, spec.annotation) {
                ColumnName::Skip => continue,
                ColumnName::Named(name) => name,
            };
            let index =
                resolve_column(header, name).ok_or_else(|| CsvxError::UnresolvedField {
                    field: spec.field.to_string(),
                    header: header.iter().map(|c| c.as_ref().to_string()).collect(),
                })?;
            trace!(field = spec.field, column = name, index, "bound field");
            slots[index] = Some(Slot {
                field: spec.field,
                accessor: spec.accessor,
            });
        }

        Ok(RecordBinding { slots })
    }
}

/// Finds the header column for `name` using the three matching passes.
pub fn resolve_column<S: AsRef<str>>(header: &[S], name: &str) -> Option<usize> {
    if let Some(index) = header.iter().position(|c| c.as_ref() == name) {
        return Some(index);
    }

    let lower = name.to_lowercase();
    if let Some(index) = header
        .iter()
        .position(|c| c.as_ref().to_lowercase() == lower)
    {
        return Some(index);
    }

    let loose = fold_separators(&lower);
    header
        .iter()
        .position(|c| fold_separators(&c.as_ref().to_lowercase()) == loose)
}

fn fold_separators(value: &str) -> String {
    value.replace('_', " ")
}

struct Slot<T> {
    field: &'static str,
    accessor: FieldAccessor<T>,
}

/// A record layout resolved against one header.
///
/// Holds one optional field per header column. When two fields resolve to
/// the same column the later one wins.
pub struct RecordBinding<T> {
    slots: Vec<Option<Slot<T>>>,
}

impl<T> RecordBinding<T> {
    /// Field bound to `column`, if any.
    pub fn field_for(&self, column: usize) -> Option<&'static str> {
        self.slots.get(column)?.as_ref().map(|slot| slot.field)
    }

    /// Number of header columns this binding was resolved against.
    pub fn width(&self) -> usize {
        self.slots.len()
    }

    /// Scans `row` into `record` in column order.
    ///
    /// Stops at the first conversion failure; fields of earlier columns keep
    /// their new values.
    pub fn scan<R: Cells + ?Sized>(
        &self,
        ctx: &ScanContext,
        row: &R,
        record: &mut T,
    ) -> Result<()> {
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(slot) = slot {
                scan_cell(ctx, index, trimmed_cell(row, index), (slot.accessor)(record))?;
            }
        }
        Ok(())
    }
}

impl<T> fmt::Debug for RecordBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.slots
                    .iter()
                    .enumerate()
                    .filter_map(|(index, slot)| slot.as_ref().map(|s| (index, s.field))),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Person {
        id: i64,
        name: String,
        age: Option<i64>,
        notes: String,
    }

    impl CsvRecord for Person {
        fn layout() -> RecordLayout<Self> {
            RecordLayout::<Self>::new()
                .field("ID", |p| Destination::from(&mut p.id))
                .tagged("name", "full_name,omitempty", |p| {
                    Destination::from(&mut p.name)
                })
                .field("age", |p| Destination::from(&mut p.age))
                .tagged("notes", "-", |p| Destination::from(&mut p.notes))
        }
    }

    #[test]
    fn test_parse_annotation() {
        assert_eq!(parse_annotation("Name", ""), ColumnName::Named("Name"));
        assert_eq!(parse_annotation("Name", "full_name"), ColumnName::Named("full_name"));
        assert_eq!(parse_annotation("Name", "full_name,extra"), ColumnName::Named("full_name"));
        assert_eq!(parse_annotation("Name", ",extra"), ColumnName::Named("Name"));
        assert_eq!(parse_annotation("Name", "-"), ColumnName::Skip);
    }

    #[test]
    fn test_resolve_column_pass_order() {
        let header = ["full name", "Full_Name", "FULL_NAME", "full_name"];
        // Exact match beats the earlier loose matches.
        assert_eq!(resolve_column(&header, "full_name"), Some(3));
        // Case-insensitive beats separator folding.
        assert_eq!(resolve_column(&header, "Full_name"), Some(1));
        // Separator folding only when nothing else matches.
        assert_eq!(resolve_column(&["Full Name"], "full_name"), Some(0));
        assert_eq!(resolve_column(&["Full Name"], "fullname"), None);
    }

    #[test]
    fn test_resolve_and_scan() {
        let header = ["age", "id", "Full Name", "notes"];
        let binding = Person::layout().resolve(&header).unwrap();
        assert_eq!(binding.width(), 4);
        assert_eq!(binding.field_for(0), Some("age"));
        assert_eq!(binding.field_for(1), Some("ID"));
        assert_eq!(binding.field_for(2), Some("name"));
        assert_eq!(binding.field_for(3), None);

        let mut person = Person {
            notes: "kept".to_string(),
            ..Person::default()
        };
        let row = vec!["", "7", "Ada Lovelace", "ignored"];
        binding
            .scan(&ScanContext::default(), &row, &mut person)
            .unwrap();

        assert_eq!(person.id, 7);
        assert_eq!(person.name, "Ada Lovelace");
        assert_eq!(person.age, None);
        assert_eq!(person.notes, "kept");
    }

    #[test]
    fn test_unresolved_field_fails_before_scan() {
        let header = ["id", "full_name"];
        let err = Person::layout().resolve(&header).unwrap_err();
        assert_eq!(
            err.to_string(),
            "couldn't find column in [\"id\", \"full_name\"] for field age"
        );
    }

    #[test]
    fn test_later_field_wins_shared_column() {
        #[derive(Default)]
        struct Twice {
            first: String,
            second: String,
        }

        let layout = RecordLayout::<Twice>::new()
            .tagged("first", "code", |t| Destination::from(&mut t.first))
            .tagged("second", "code", |t| Destination::from(&mut t.second));
        let binding = layout.resolve(&["code"]).unwrap();

        let mut record = Twice::default();
        binding
            .scan(&ScanContext::default(), &vec!["X1"], &mut record)
            .unwrap();
        assert_eq!(record.first, "");
        assert_eq!(record.second, "X1");
    }

    #[test]
    fn test_scan_stops_at_first_bad_column() {
        let header = ["id", "age", "full_name"];
        let binding = Person::layout().resolve(&header).unwrap();
        let mut person = Person::default();
        let row = vec!["3", "old", "Grace"];
        let err = binding
            .scan(&ScanContext::default(), &row, &mut person)
            .unwrap_err();
        assert_eq!(err.index(), Some(1));
        assert_eq!(person.id, 3);
        assert_eq!(person.name, "");
    }

    #[test]
    fn test_binding_debug_lists_bound_columns() {
        let binding = Person::layout()
            .resolve(&["id", "x", "full_name", "age"])
            .unwrap();
        assert_eq!(format!("{binding:?}"), r#"{0: "ID", 2: "name", 3: "age"}"#);
    }
}
