//! Workbook rendering: a filterable detail sheet plus a summary sheet
//! with global indicators and per-identifier counts.

use rust_xlsxwriter::{Format, Table, TableColumn, TableStyle, Workbook, Worksheet, XlsxError};

use sirene_core::{summarize, ResultRow, Summary, COLUMN_LABELS};

pub const DETAIL_SHEET: &str = "SIRET";
pub const SUMMARY_SHEET: &str = "Résumé";

/// Column labels of the per-identifier block on the summary sheet.
pub const SUMMARY_LABELS: [&str; 5] = ["SIREN", "Nb SIRET", "Nb actifs", "Nb fermés", "Nb sièges"];

const INDICATOR_LABELS: [&str; 2] = ["Indicateur", "Valeur"];

/// Blank rows between the indicator block and the per-identifier table.
const SUMMARY_GAP_ROWS: u32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("workbook error: {0}")]
    Xlsx(#[from] XlsxError),
}

/// Render the rows into a finished two-sheet workbook, returned as the
/// bytes of the `.xlsx` file. Rows are expected deduplicated and sorted;
/// the summary sheet is derived from them on the spot.
pub fn build_workbook(rows: &[ResultRow]) -> Result<Vec<u8>, ExportError> {
    let summary = summarize(rows);
    let mut workbook = Workbook::new();

    let detail = workbook.add_worksheet();
    detail.set_name(DETAIL_SHEET)?;
    write_detail_sheet(detail, rows)?;

    let resume = workbook.add_worksheet();
    resume.set_name(SUMMARY_SHEET)?;
    write_summary_sheet(resume, &summary)?;

    Ok(workbook.save_to_buffer()?)
}

fn write_detail_sheet(sheet: &mut Worksheet, rows: &[ResultRow]) -> Result<(), ExportError> {
    let bold = Format::new().set_bold();
    for (col, label) in COLUMN_LABELS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *label, &bold)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, &row.siret)?;
        sheet.write_string(r, 1, &row.siren)?;
        sheet.write_string(r, 2, &row.nom_unite_legale)?;
        sheet.write_string(r, 3, &row.nom_etablissement)?;
        sheet.write_boolean(r, 4, row.siege)?;
        sheet.write_string(r, 5, &row.etat_administratif)?;
        sheet.write_string(r, 6, &row.adresse)?;
        sheet.write_string(r, 7, &row.code_postal)?;
        sheet.write_string(r, 8, &row.ville)?;
    }

    // A spreadsheet table needs at least one data row.
    if !rows.is_empty() {
        let table = styled_table("T_SIRET", TableStyle::Medium9, &COLUMN_LABELS);
        sheet.add_table(
            0,
            0,
            rows.len() as u32,
            (COLUMN_LABELS.len() - 1) as u16,
            &table,
        )?;
    }

    sheet.set_freeze_panes(1, 0)?;
    sheet.autofit();
    Ok(())
}

fn write_summary_sheet(sheet: &mut Worksheet, summary: &Summary) -> Result<(), ExportError> {
    let bold = Format::new().set_bold();

    sheet.write_string_with_format(0, 0, INDICATOR_LABELS[0], &bold)?;
    sheet.write_string_with_format(0, 1, INDICATOR_LABELS[1], &bold)?;
    let indicators = summary.global.indicators();
    for (i, (label, value)) in indicators.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, *label)?;
        sheet.write_number(r, 1, *value as f64)?;
    }

    if !summary.per_siren.is_empty() {
        let header_row = indicators.len() as u32 + 1 + SUMMARY_GAP_ROWS;
        for (col, label) in SUMMARY_LABELS.iter().enumerate() {
            sheet.write_string_with_format(header_row, col as u16, *label, &bold)?;
        }
        for (i, per) in summary.per_siren.iter().enumerate() {
            let r = header_row + 1 + i as u32;
            sheet.write_string(r, 0, &per.siren)?;
            sheet.write_number(r, 1, per.nb_siret as f64)?;
            sheet.write_number(r, 2, per.nb_actifs as f64)?;
            sheet.write_number(r, 3, per.nb_fermes as f64)?;
            sheet.write_number(r, 4, per.nb_sieges as f64)?;
        }

        let table = styled_table("T_RESUME", TableStyle::Light9, &SUMMARY_LABELS);
        sheet.add_table(
            header_row,
            0,
            header_row + summary.per_siren.len() as u32,
            (SUMMARY_LABELS.len() - 1) as u16,
            &table,
        )?;
    }

    sheet.set_freeze_panes(1, 0)?;
    sheet.autofit();
    Ok(())
}

fn styled_table(name: &str, style: TableStyle, headers: &[&str]) -> Table {
    let columns: Vec<TableColumn> = headers
        .iter()
        .map(|header| TableColumn::new().set_header(*header))
        .collect();
    Table::new()
        .set_name(name)
        .set_style(style)
        .set_columns(&columns)
}
