//! Search-query construction for the registry's `/siret` endpoint.

use crate::siren::Siren;

/// Flattened fields requested through the `champs` parameter. Restricting
/// the selection keeps page payloads small without losing anything the
/// result rows need.
pub const SELECTED_FIELDS: &[&str] = &[
    // Identifiers.
    "siret",
    "siren",
    "etablissementSiege",
    // Legal-unit name.
    "denominationUniteLegale",
    "nomUniteLegale",
    "prenom1UniteLegale",
    // Establishment label and administrative status.
    "enseigne1Etablissement",
    "enseigne2Etablissement",
    "enseigne3Etablissement",
    "denominationUsuelleEtablissement",
    "etatAdministratifEtablissement",
    // Establishment address.
    "complementAdresseEtablissement",
    "numeroVoieEtablissement",
    "indiceRepetitionEtablissement",
    "typeVoieEtablissement",
    "libelleVoieEtablissement",
    "distributionSpecialeEtablissement",
    "codePostalEtablissement",
    "libelleCommuneEtablissement",
    "libelleCedexEtablissement",
];

/// The comma-joined value for the `champs` request parameter.
pub fn field_selection() -> String {
    SELECTED_FIELDS.join(",")
}

/// Search expression selecting every establishment of one legal unit,
/// optionally narrowed to periods where the establishment is active.
pub fn siret_query(siren: &Siren, only_active: bool) -> String {
    let mut q = format!("siren:\"{}\"", siren.as_str());
    if only_active {
        q.push_str(" AND periode(etatAdministratifEtablissement:A)");
    }
    q
}

#[cfg(test)]
mod tests {
    use super::*;

    fn siren() -> Siren {
        Siren::parse("552100554").unwrap()
    }

    #[test]
    fn query_quotes_the_siren() {
        assert_eq!(siret_query(&siren(), false), "siren:\"552100554\"");
    }

    #[test]
    fn query_narrows_to_active_periods_on_request() {
        assert_eq!(
            siret_query(&siren(), true),
            "siren:\"552100554\" AND periode(etatAdministratifEtablissement:A)"
        );
    }

    #[test]
    fn field_selection_is_comma_joined() {
        let champs = field_selection();
        assert!(champs.starts_with("siret,siren,"));
        assert!(champs.ends_with("libelleCedexEtablissement"));
        assert_eq!(champs.matches(',').count(), SELECTED_FIELDS.len() - 1);
    }
}
