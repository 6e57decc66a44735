//! Normalized result rows and the dedup/ordering passes applied to them.

use std::collections::HashMap;

/// Column labels, in output order, for tabular renderings of [`ResultRow`].
pub const COLUMN_LABELS: [&str; 9] = [
    "SIRET",
    "SIREN",
    "Nom unité légale",
    "Nom établissement",
    "Siège",
    "État administratif",
    "Adresse",
    "Code postal",
    "Ville",
];

/// The flat projection of one establishment record. String fields default
/// to empty rather than being optional so ordering and rendering never
/// have to special-case missing values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultRow {
    pub siret: String,
    pub siren: String,
    pub nom_unite_legale: String,
    pub nom_etablissement: String,
    pub siege: bool,
    pub etat_administratif: String,
    pub adresse: String,
    pub code_postal: String,
    pub ville: String,
}

impl ResultRow {
    /// Whether the status label denotes an active establishment.
    pub fn is_active(&self) -> bool {
        self.etat_administratif.to_lowercase().contains("actif")
    }
}

/// Collapse rows sharing a SIRET, the last occurrence winning, and order
/// the survivors by SIRET. Applied to the rows of a single identifier's
/// fetch, where a record can reappear across pages.
pub fn finalize_fetch_rows(rows: Vec<ResultRow>) -> Vec<ResultRow> {
    let mut rows = dedupe_by_siret(rows);
    rows.sort_by(|a, b| a.siret.cmp(&b.siret));
    rows
}

/// Collapse rows sharing a SIRET across a whole batch, the last occurrence
/// winning, and order the survivors by (SIREN, SIRET). Overlap happens
/// when two input identifiers resolve to the same establishments.
pub fn finalize_batch_rows(rows: Vec<ResultRow>) -> Vec<ResultRow> {
    let mut rows = dedupe_by_siret(rows);
    rows.sort_by(|a, b| (&a.siren, &a.siret).cmp(&(&b.siren, &b.siret)));
    rows
}

fn dedupe_by_siret(rows: Vec<ResultRow>) -> Vec<ResultRow> {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<ResultRow> = Vec::with_capacity(rows.len());
    for row in rows {
        match position.get(&row.siret) {
            Some(&at) => out[at] = row,
            None => {
                position.insert(row.siret.clone(), out.len());
                out.push(row);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(siren: &str, siret: &str, ville: &str) -> ResultRow {
        ResultRow {
            siret: siret.to_string(),
            siren: siren.to_string(),
            ville: ville.to_string(),
            ..ResultRow::default()
        }
    }

    #[test]
    fn duplicate_sirets_keep_the_last_occurrence() {
        let rows = vec![
            row("481986446", "48198644600015", "Paris"),
            row("481986446", "48198644600015", "Lyon"),
        ];
        let out = finalize_fetch_rows(rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].ville, "Lyon");
    }

    #[test]
    fn fetch_rows_are_ordered_by_siret() {
        let rows = vec![
            row("481986446", "48198644600023", ""),
            row("481986446", "48198644600015", ""),
        ];
        let out = finalize_fetch_rows(rows);
        assert_eq!(out[0].siret, "48198644600015");
        assert_eq!(out[1].siret, "48198644600023");
    }

    #[test]
    fn batch_rows_are_ordered_by_siren_then_siret() {
        let rows = vec![
            row("552100554", "55210055400013", ""),
            row("481986446", "48198644600023", ""),
            row("481986446", "48198644600015", ""),
        ];
        let out = finalize_batch_rows(rows);
        let keys: Vec<(&str, &str)> = out
            .iter()
            .map(|r| (r.siren.as_str(), r.siret.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("481986446", "48198644600015"),
                ("481986446", "48198644600023"),
                ("552100554", "55210055400013"),
            ]
        );
    }

    #[test]
    fn finalize_is_idempotent() {
        let rows = vec![
            row("552100554", "55210055400013", "Paris"),
            row("481986446", "48198644600015", "Nantes"),
            row("481986446", "48198644600015", "Lyon"),
        ];
        let once = finalize_batch_rows(rows);
        let twice = finalize_batch_rows(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn rows_missing_fields_sort_as_empty_strings() {
        let rows = vec![
            row("481986446", "48198644600015", ""),
            row("", "", ""),
        ];
        let out = finalize_batch_rows(rows);
        assert_eq!(out[0].siren, "");
        assert_eq!(out[1].siren, "481986446");
    }

    #[test]
    fn active_detection_matches_on_the_label() {
        let mut r = row("481986446", "48198644600015", "");
        r.etat_administratif = "Actif".to_string();
        assert!(r.is_active());
        r.etat_administratif = "Fermé".to_string();
        assert!(!r.is_active());
        r.etat_administratif = String::new();
        assert!(!r.is_active());
    }
}
