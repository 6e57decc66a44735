//! Sirene core: identifier extraction, record normalization, and the
//! dedup/ordering and roll-up passes applied to result rows. Everything
//! here is pure; network and file concerns live in `sirene_engine`.
mod etablissement;
mod query;
mod row;
mod siren;
mod summary;

pub use etablissement::{
    status_label, Adresse, AdresseEtablissement, Etablissement, PeriodeEtablissement,
    ResponseHeader, SiretResponse, UniteLegale,
};
pub use query::{field_selection, siret_query, SELECTED_FIELDS};
pub use row::{finalize_batch_rows, finalize_fetch_rows, ResultRow, COLUMN_LABELS};
pub use siren::{extract_sirens, extract_sirens_from_cells, Siren, SirenParseError, SIREN_LEN};
pub use summary::{summarize, GlobalSummary, SirenSummary, Summary};
