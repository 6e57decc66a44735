//! Roll-up counts shown on the summary sheet of an exported workbook.

use std::collections::BTreeMap;

use crate::row::ResultRow;

/// Counts for one parent identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SirenSummary {
    pub siren: String,
    pub nb_siret: usize,
    pub nb_actifs: usize,
    pub nb_fermes: usize,
    pub nb_sieges: usize,
}

/// Whole-batch counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalSummary {
    pub nb_siren: usize,
    pub nb_siret: usize,
    pub nb_actifs: usize,
    pub nb_fermes: usize,
    pub nb_sieges: usize,
}

impl GlobalSummary {
    /// Label/value pairs in the order they appear on the summary sheet.
    pub fn indicators(&self) -> [(&'static str, usize); 5] {
        [
            ("Nb SIREN", self.nb_siren),
            ("Nb SIRET", self.nb_siret),
            ("Nb actifs", self.nb_actifs),
            ("Nb fermés", self.nb_fermes),
            ("Nb sièges", self.nb_sieges),
        ]
    }
}

/// Global counts plus one entry per parent identifier, ordered by
/// establishment count descending, then SIREN ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub global: GlobalSummary,
    pub per_siren: Vec<SirenSummary>,
}

/// Compute the roll-up over a finalized result set. Expects rows already
/// deduplicated by SIRET; counts are per row.
pub fn summarize(rows: &[ResultRow]) -> Summary {
    let mut groups: BTreeMap<&str, SirenSummary> = BTreeMap::new();

    for row in rows {
        let entry = groups.entry(row.siren.as_str()).or_insert_with(|| {
            SirenSummary {
                siren: row.siren.clone(),
                ..SirenSummary::default()
            }
        });
        entry.nb_siret += 1;
        if row.is_active() {
            entry.nb_actifs += 1;
        }
        if row.siege {
            entry.nb_sieges += 1;
        }
    }

    let mut per_siren: Vec<SirenSummary> = groups.into_values().collect();
    for group in &mut per_siren {
        group.nb_fermes = group.nb_siret.saturating_sub(group.nb_actifs);
    }
    per_siren.sort_by(|a, b| {
        b.nb_siret
            .cmp(&a.nb_siret)
            .then_with(|| a.siren.cmp(&b.siren))
    });

    let nb_actifs = rows.iter().filter(|r| r.is_active()).count();
    let global = GlobalSummary {
        nb_siren: per_siren.len(),
        nb_siret: rows.len(),
        nb_actifs,
        nb_fermes: rows.len() - nb_actifs,
        nb_sieges: rows.iter().filter(|r| r.siege).count(),
    };

    Summary { global, per_siren }
}
