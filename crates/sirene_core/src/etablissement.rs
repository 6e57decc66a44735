use serde::Deserialize;

use crate::row::ResultRow;

/// One raw establishment record as returned by the registry search
/// endpoint.
///
/// Every field is optional on purpose: depending on the `champs` selection
/// and the API version, a payload may carry the flattened convenience
/// snapshot, the nested objects, or both. Normalization prefers the nested
/// data and falls back to the flattened fields, field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Etablissement {
    pub siret: Option<String>,
    pub siren: Option<String>,
    pub etablissement_siege: Option<bool>,

    pub unite_legale: Option<UniteLegale>,
    pub adresse_etablissement: Option<AdresseEtablissement>,
    pub periodes_etablissement: Vec<PeriodeEtablissement>,

    // Flattened snapshot of the legal unit.
    pub denomination_unite_legale: Option<String>,
    pub nom_unite_legale: Option<String>,
    pub prenom1_unite_legale: Option<String>,

    // Flattened establishment labels and status.
    pub enseigne1_etablissement: Option<String>,
    pub enseigne2_etablissement: Option<String>,
    pub enseigne3_etablissement: Option<String>,
    pub denomination_usuelle_etablissement: Option<String>,
    pub etat_administratif_etablissement: Option<String>,

    // Flattened address fragments.
    pub complement_adresse_etablissement: Option<String>,
    pub numero_voie_etablissement: Option<String>,
    pub indice_repetition_etablissement: Option<String>,
    pub type_voie_etablissement: Option<String>,
    pub libelle_voie_etablissement: Option<String>,
    pub distribution_speciale_etablissement: Option<String>,
    pub code_postal_etablissement: Option<String>,
    pub libelle_commune_etablissement: Option<String>,
    pub libelle_cedex_etablissement: Option<String>,
}

/// Nested legal-unit block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UniteLegale {
    pub denomination_unite_legale: Option<String>,
    pub nom_unite_legale: Option<String>,
    pub prenom1_unite_legale: Option<String>,
}

/// Nested establishment address block. Field names shadow the flattened
/// top-level fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdresseEtablissement {
    pub complement_adresse_etablissement: Option<String>,
    pub numero_voie_etablissement: Option<String>,
    pub indice_repetition_etablissement: Option<String>,
    pub type_voie_etablissement: Option<String>,
    pub libelle_voie_etablissement: Option<String>,
    pub distribution_speciale_etablissement: Option<String>,
    pub code_postal_etablissement: Option<String>,
    pub libelle_commune_etablissement: Option<String>,
    pub libelle_cedex_etablissement: Option<String>,
}

/// One history entry: the registry stores establishment state per period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeriodeEtablissement {
    pub date_debut: Option<String>,
    pub date_fin: Option<String>,
    pub etat_administratif_etablissement: Option<String>,
    pub enseigne1_etablissement: Option<String>,
    pub enseigne2_etablissement: Option<String>,
    pub enseigne3_etablissement: Option<String>,
    pub denomination_usuelle_etablissement: Option<String>,
}

/// Response envelope of the `/siret` search endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SiretResponse {
    pub header: ResponseHeader,
    pub etablissements: Vec<Etablissement>,
}

/// Pagination header accompanying each page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseHeader {
    pub statut: Option<u16>,
    pub message: Option<String>,
    pub total: Option<u64>,
    pub curseur: Option<String>,
    pub curseur_suivant: Option<String>,
}

/// Structured address assembled from a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adresse {
    pub adresse: String,
    pub code_postal: String,
    pub ville: String,
}

/// Human label for an administrative-status code. Unknown codes pass
/// through verbatim so nothing is silently reinterpreted.
pub fn status_label(code: &str) -> &str {
    match code {
        "A" => "Actif",
        "F" => "Fermé",
        other => other,
    }
}

impl Etablissement {
    /// The period describing the record's current state: the entry with no
    /// end date, or failing that, the one with the latest start date.
    pub fn current_period(&self) -> Option<&PeriodeEtablissement> {
        let periods = &self.periodes_etablissement;
        if let Some(open) = periods.iter().find(|p| is_blank(&p.date_fin)) {
            return Some(open);
        }
        // Ties keep the earliest entry; ISO dates compare lexicographically.
        periods.iter().reduce(|best, p| {
            if start_date(p) > start_date(best) {
                p
            } else {
                best
            }
        })
    }

    /// Current administrative-status code ("A" active, "F" closed).
    /// The current period wins over the flattened snapshot.
    pub fn administrative_status(&self) -> Option<String> {
        if let Some(period) = self.current_period() {
            if let Some(code) = filled(&period.etat_administratif_etablissement) {
                return Some(code.to_string());
            }
        }
        filled(&self.etat_administratif_etablissement).map(str::to_string)
    }

    /// Whether the record may pass an active-only filter. A record with a
    /// status other than "A" is dropped; one with no status at all is kept
    /// rather than silently discarded.
    pub fn passes_active_filter(&self) -> bool {
        self.administrative_status()
            .map_or(true, |code| code == "A")
    }

    /// Legal-entity name. The nested `uniteLegale` block wins over the
    /// flattened snapshot; within each shape a registered denomination
    /// wins over the personal "prénom nom" form.
    pub fn legal_unit_name(&self) -> String {
        if let Some(ul) = &self.unite_legale {
            if let Some(denomination) = filled(&ul.denomination_unite_legale) {
                return denomination.to_string();
            }
            let full = join_person_name(&ul.prenom1_unite_legale, &ul.nom_unite_legale);
            if !full.is_empty() {
                return full;
            }
        }
        if let Some(denomination) = filled(&self.denomination_unite_legale) {
            return denomination.to_string();
        }
        join_person_name(&self.prenom1_unite_legale, &self.nom_unite_legale)
    }

    /// Establishment trade label: the current period's enseignes joined
    /// with " / ", else its denomination usuelle, else the flattened
    /// equivalents in the same order, else empty.
    pub fn establishment_label(&self) -> String {
        if let Some(period) = self.current_period() {
            let enseignes = join_enseignes(
                &period.enseigne1_etablissement,
                &period.enseigne2_etablissement,
                &period.enseigne3_etablissement,
            );
            if !enseignes.is_empty() {
                return enseignes;
            }
            if let Some(label) = filled(&period.denomination_usuelle_etablissement) {
                return label.to_string();
            }
        }

        let enseignes = join_enseignes(
            &self.enseigne1_etablissement,
            &self.enseigne2_etablissement,
            &self.enseigne3_etablissement,
        );
        if !enseignes.is_empty() {
            return enseignes;
        }
        filled(&self.denomination_usuelle_etablissement)
            .unwrap_or_default()
            .to_string()
    }

    /// Address fragments, preferring the nested address block over the
    /// flattened fields, field by field.
    pub fn address(&self) -> Adresse {
        let empty = AdresseEtablissement::default();
        let nested = self.adresse_etablissement.as_ref().unwrap_or(&empty);
        let pick = |from_nested: &Option<String>, from_flat: &Option<String>| -> String {
            filled(from_nested)
                .or_else(|| filled(from_flat))
                .unwrap_or_default()
                .to_string()
        };

        let voie = join_filled([
            pick(
                &nested.numero_voie_etablissement,
                &self.numero_voie_etablissement,
            ),
            pick(
                &nested.indice_repetition_etablissement,
                &self.indice_repetition_etablissement,
            ),
            pick(
                &nested.type_voie_etablissement,
                &self.type_voie_etablissement,
            ),
            pick(
                &nested.libelle_voie_etablissement,
                &self.libelle_voie_etablissement,
            ),
        ], " ");

        let complement = pick(
            &nested.complement_adresse_etablissement,
            &self.complement_adresse_etablissement,
        );
        let distribution = pick(
            &nested.distribution_speciale_etablissement,
            &self.distribution_speciale_etablissement,
        );
        let code_postal = pick(
            &nested.code_postal_etablissement,
            &self.code_postal_etablissement,
        );
        let commune = pick(
            &nested.libelle_commune_etablissement,
            &self.libelle_commune_etablissement,
        );
        let cedex = pick(
            &nested.libelle_cedex_etablissement,
            &self.libelle_cedex_etablissement,
        );

        let adresse = join_filled([complement, voie, distribution], ", ");
        let ville = if cedex.is_empty() { commune } else { cedex };

        Adresse {
            adresse,
            code_postal,
            ville,
        }
    }

    /// Normalized projection of this record, or `None` when it carries no
    /// SIRET.
    pub fn to_row(&self) -> Option<ResultRow> {
        let siret = filled(&self.siret)?.to_string();
        let status_code = self.administrative_status().unwrap_or_default();
        let Adresse {
            adresse,
            code_postal,
            ville,
        } = self.address();

        Some(ResultRow {
            siret,
            siren: filled(&self.siren).unwrap_or_default().to_string(),
            nom_unite_legale: self.legal_unit_name(),
            nom_etablissement: self.establishment_label(),
            siege: self.etablissement_siege.unwrap_or(false),
            etat_administratif: status_label(&status_code).to_string(),
            adresse,
            code_postal,
            ville,
        })
    }
}

/// Trimmed, non-empty view of an optional field.
fn filled(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

fn start_date(period: &PeriodeEtablissement) -> &str {
    period.date_debut.as_deref().unwrap_or("")
}

fn join_person_name(prenom: &Option<String>, nom: &Option<String>) -> String {
    join_filled(
        [
            filled(prenom).unwrap_or_default().to_string(),
            filled(nom).unwrap_or_default().to_string(),
        ],
        " ",
    )
}

fn join_enseignes(
    first: &Option<String>,
    second: &Option<String>,
    third: &Option<String>,
) -> String {
    join_filled(
        [
            filled(first).unwrap_or_default().to_string(),
            filled(second).unwrap_or_default().to_string(),
            filled(third).unwrap_or_default().to_string(),
        ],
        " / ",
    )
}

fn join_filled<const N: usize>(parts: [String; N], separator: &str) -> String {
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}
