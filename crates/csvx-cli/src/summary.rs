use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use csvx::normalize_column_name;
use csvx_cli::types::{CheckResult, CountResult};

pub fn print_header(header: &[String]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Column"),
        header_cell("Normalized"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for (index, name) in header.iter().enumerate() {
        let normalized = normalize_column_name(name);
        let normalized_cell = if normalized == *name {
            dim_cell(normalized)
        } else {
            Cell::new(normalized)
        };
        table.add_row(vec![Cell::new(index), Cell::new(name), normalized_cell]);
    }
    println!("{table}");
}

pub fn print_count(result: &CountResult) {
    println!("{}", result.rows);
    if result.read_errors > 0 {
        eprintln!("{} rows could not be read", result.read_errors);
    }
}

pub fn print_columns(columns: &[(String, usize)]) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Name"), header_cell("Index")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (name, index) in columns {
        table.add_row(vec![Cell::new(name), Cell::new(index)]);
    }
    println!("{table}");
}

pub fn print_check(result: &CheckResult) {
    println!("Rows: {}  Failed: {}", result.rows, result.failed_rows);
    if result.failures.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Row"),
        header_cell("Line"),
        header_cell("Column"),
        header_cell("Error"),
    ]);
    apply_table_style(&mut table);
    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(5)),
        ColumnConstraint::LowerBoundary(Width::Fixed(5)),
        ColumnConstraint::UpperBoundary(Width::Percentage(25)),
        ColumnConstraint::LowerBoundary(Width::Percentage(50)),
    ]);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 1, CellAlignment::Right);
    for failure in &result.failures {
        table.add_row(vec![
            Cell::new(failure.row),
            failure.line.map_or_else(|| dim_cell("-"), Cell::new),
            failure
                .column
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
            Cell::new(&failure.message).fg(Color::Red),
        ]);
    }
    println!("{table}");

    let hidden = result.failed_rows - result.failures.len() as u64;
    if hidden > 0 {
        println!("... and {hidden} more failing rows");
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
