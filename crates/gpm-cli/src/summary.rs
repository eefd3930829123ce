//! Tables printed after each command.

use std::path::Path;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use gpm_migrate::IssueRow;
use gpm_model::{IdentifierMapping, IssueLinkMapping, ProjectSnapshot, Projects};

pub fn print_export_summary(snapshot: &ProjectSnapshot, path: &Path) {
    println!("Organization: {} ({})", snapshot.org, snapshot.project_type());
    println!("Snapshot: {}", path.display());
    println!("{}", project_table(snapshot));
}

/// What an import of `snapshot` would create, without calling GitHub.
pub fn print_plan(snapshot: &ProjectSnapshot, target_org: Option<&str>) {
    println!(
        "Dry run: {} {} project(s) from '{}' into '{}'",
        snapshot.project_count(),
        snapshot.project_type(),
        snapshot.org,
        target_org.unwrap_or("<target org>")
    );
    println!("{}", project_table(snapshot));
    println!("No changes were made.");
}

pub fn print_import_summary(mapping: &IdentifierMapping, path: &Path) {
    println!(
        "Imported {} project(s) from '{}' into '{}'",
        mapping.projects.len(),
        mapping.source_org,
        mapping.target_org
    );
    println!("Mapping: {}", path.display());

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Source"),
        header_cell("Name"),
        header_cell("Target"),
        header_cell("Columns"),
        header_cell("Fields"),
        header_cell("Items"),
        header_cell("URL"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 3..6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for project in &mapping.projects {
        table.add_row(vec![
            dim_cell(&project.source_id),
            Cell::new(&project.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&project.target_id),
            Cell::new(project.columns.len()),
            Cell::new(project.fields.len()),
            Cell::new(project.items.len()),
            project
                .target_url
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
        ]);
    }
    table.add_row(total_row(vec![
        Cell::new(mapping.projects.iter().map(|p| p.columns.len()).sum::<usize>()),
        Cell::new(mapping.projects.iter().map(|p| p.fields.len()).sum::<usize>()),
        Cell::new(mapping.item_count()),
        dim_cell("-"),
    ]));
    println!("{table}");
}

pub fn print_issue_export_summary(rows: &[IssueRow], path: &Path) {
    let open = rows
        .iter()
        .filter(|row| row.state.eq_ignore_ascii_case("open"))
        .count();
    println!(
        "Exported {} issue(s) ({} open, {} closed) to {}",
        rows.len(),
        open,
        rows.len() - open,
        path.display()
    );
}

pub fn print_link_summary(mapping: &IssueLinkMapping, path: &Path) {
    println!(
        "Linked {} issue(s) into project {}",
        mapping.links.len(),
        mapping.project_id
    );
    println!("Mapping: {}", path.display());
}

fn project_table(snapshot: &ProjectSnapshot) -> Table {
    let container_label = match snapshot.projects {
        Projects::Classic(_) => "Columns",
        Projects::V2(_) => "Fields",
    };
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("ID"),
        header_cell("Name"),
        header_cell("State"),
        header_cell(container_label),
        header_cell("Items"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);

    match &snapshot.projects {
        Projects::Classic(projects) => {
            for project in projects {
                table.add_row(vec![
                    dim_cell(project.id),
                    name_cell(&project.name),
                    state_cell(project.is_closed()),
                    Cell::new(project.columns.len()),
                    Cell::new(project.card_count()),
                ]);
            }
        }
        Projects::V2(projects) => {
            for project in projects {
                table.add_row(vec![
                    dim_cell(&project.id),
                    name_cell(&project.title),
                    state_cell(project.closed),
                    Cell::new(project.fields.len()),
                    Cell::new(project.items.len()),
                ]);
            }
        }
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} project(s)", snapshot.project_count()))
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(snapshot.container_count()).add_attribute(Attribute::Bold),
        Cell::new(snapshot.item_count()).add_attribute(Attribute::Bold),
    ]);
    table
}

fn total_row(counts: Vec<Cell>) -> Vec<Cell> {
    let mut row = vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
    ];
    row.extend(counts.into_iter().map(|cell| cell.add_attribute(Attribute::Bold)));
    row
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
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

fn name_cell(name: &str) -> Cell {
    Cell::new(name)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn state_cell(closed: bool) -> Cell {
    if closed {
        Cell::new("closed").fg(Color::DarkGrey)
    } else {
        Cell::new("open").fg(Color::Green)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
