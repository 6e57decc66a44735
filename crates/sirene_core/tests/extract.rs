use std::sync::Once;

use pretty_assertions::assert_eq;
use sirene_core::{extract_sirens, extract_sirens_from_cells, Siren};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(sirene_logging::initialize_for_tests);
}

#[test]
fn mixed_input_yields_first_seen_order_without_duplicates() {
    init_logging();
    let text = "481 986 446\n552100554\n481986446";
    assert_eq!(
        extract_sirens(text),
        vec![
            Siren::parse("481986446").unwrap(),
            Siren::parse("552100554").unwrap(),
        ]
    );
}

#[test]
fn ten_digit_runs_are_not_split_into_matches() {
    init_logging();
    assert_eq!(extract_sirens("1234567890"), vec![]);
}

#[test]
fn spaces_and_tabs_inside_a_number_are_ignored() {
    init_logging();
    // Grouped digits are common in copied text, so a space or tab does
    // not end a run. A grouped ten-digit number still yields nothing.
    assert_eq!(
        extract_sirens("481\t986 446"),
        vec![Siren::parse("481986446").unwrap()]
    );
    assert_eq!(extract_sirens("12345 67890"), vec![]);
}

#[test]
fn letters_and_punctuation_bound_digit_runs() {
    init_logging();
    assert_eq!(
        extract_sirens("ref=481986446;552100554,acme"),
        vec![
            Siren::parse("481986446").unwrap(),
            Siren::parse("552100554").unwrap(),
        ]
    );
    // Too-short runs never pad themselves out to nine.
    assert_eq!(extract_sirens("12345678"), vec![]);
}

#[test]
fn cells_are_scanned_as_separate_lines() {
    init_logging();
    let cells = [
        "company".to_string(),
        "481986446".to_string(),
        "notes 552100554 ok".to_string(),
        "481986446".to_string(),
    ];
    assert_eq!(
        extract_sirens_from_cells(cells),
        vec![
            Siren::parse("481986446").unwrap(),
            Siren::parse("552100554").unwrap(),
        ]
    );
}

#[test]
fn adjacent_cells_do_not_merge_digit_runs() {
    init_logging();
    // Two halves of a number split across cells must not combine into a
    // false nine-digit match.
    let cells = ["48198".to_string(), "6446".to_string()];
    assert_eq!(extract_sirens_from_cells(cells), vec![]);
}
