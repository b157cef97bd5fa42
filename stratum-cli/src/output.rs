//! Output formatting utilities

use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};

/// Create a styled table carrying the given header row
pub fn table_with_header(columns: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(columns);
    table
}
