//! SQL statement builders.
//!
//! Generates statements for the `feedback_entries` table.
//! Execution is left to the host's database driver.

/// Table holding stored feedback entries.
pub const FEEDBACK_TABLE: &str = "feedback_entries";

/// Columns written on insert, with their parameter placeholders.
pub fn get_feedback_columns() -> Vec<(&'static str, &'static str)> {
    vec![
        ("content", "$1"),
        ("format_marker", "$2"),
        ("parent_id", "$3"),
        ("created_at", "$4"),
        ("status", "$5"),
        ("slug", "$6"),
        ("title", "$7"),
    ]
}

/// INSERT for a new entry, returning its id.
pub fn build_feedback_insert() -> String {
    let columns = get_feedback_columns();
    let col_names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    let placeholders: Vec<&str> = columns.iter().map(|(_, ph)| *ph).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING id",
        FEEDBACK_TABLE,
        col_names.join(", "),
        placeholders.join(", ")
    )
}

/// SELECT of one entry by id.
pub fn build_feedback_select() -> String {
    let columns = get_feedback_columns();
    let col_names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    format!(
        "SELECT id, {} FROM {} WHERE id = $1",
        col_names.join(", "),
        FEEDBACK_TABLE
    )
}

/// Status change of one entry.
pub fn build_status_update() -> String {
    format!("UPDATE {} SET status = $2 WHERE id = $1", FEEDBACK_TABLE)
}

/// Entries whose content is not yet in the canonical generation.
pub fn build_outdated_select() -> String {
    format!(
        "SELECT id FROM {} WHERE format_marker IS DISTINCT FROM 'v3' ORDER BY id",
        FEEDBACK_TABLE
    )
}
