//! Hourly solar export (XLSX). The first sheet holds one row per hour:
//!
//! ```text
//! Timestamp | Production (kWh) | Consumption (kWh) | Export (kWh) | Import (kWh)
//! ```

use super::{parse_amount, store_bill, ImportError};
use crate::core::{round_dp, Address, Provider};
use crate::models::{BillBase, BillId, SolarBillData, TaxRelatedCost};
use crate::store::{BillRepository, RealEstateRepository};
use calamine::{open_workbook, Data, DataType, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::Path;

pub const HEADER: [&str; 5] = [
    "Timestamp",
    "Production (kWh)",
    "Consumption (kWh)",
    "Export (kWh)",
    "Import (kWh)",
];

const HOURS_PER_DAY: usize = 24;
static EMPTY: Data = Data::Empty;
const KWH_DP: u32 = 3;

/// One hour of solar production and grid exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySolar {
    pub timestamp: NaiveDateTime,
    pub production: Decimal,
    pub consumption: Decimal,
    pub export: Decimal,
    pub import: Decimal,
}

impl HourlySolar {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

fn timestamp(cell: &Data) -> Result<NaiveDateTime, ImportError> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];
    match cell {
        Data::String(text) | Data::DateTimeIso(text) => FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text.trim(), format).ok())
            .ok_or_else(|| ImportError::InvalidDate {
                value: text.clone(),
                format: "%Y-%m-%d %H:%M:%S",
            }),
        other => other.as_datetime().ok_or_else(|| ImportError::InvalidDate {
            value: other.to_string(),
            format: "%Y-%m-%d %H:%M:%S",
        }),
    }
}

fn kwh(cell: &Data, column: &'static str) -> Result<Decimal, ImportError> {
    let value = match cell {
        Data::Float(value) => {
            Decimal::try_from(*value).map_err(|_| ImportError::InvalidAmount(value.to_string()))?
        }
        Data::Int(value) => Decimal::from(*value),
        Data::String(text) => parse_amount(text)?.ok_or(ImportError::MissingValue(column))?,
        Data::Empty => return Err(ImportError::MissingValue(column)),
        other => return Err(ImportError::InvalidAmount(other.to_string())),
    };
    Ok(round_dp(value, KWH_DP))
}

fn check_header(row: &[Data]) -> Result<(), ImportError> {
    let found: Vec<String> = row.iter().map(|cell| cell.to_string().trim().to_string()).collect();
    if found.len() < HEADER.len() || found[..HEADER.len()] != HEADER {
        return Err(ImportError::UnexpectedHeader {
            expected: HEADER.join(", "),
            found: found.join(", "),
        });
    }
    Ok(())
}

/// Parse worksheet rows, header first. Every date must have exactly 24
/// hourly rows.
pub fn parse_rows<'a>(
    mut rows: impl Iterator<Item = &'a [Data]>,
) -> Result<Vec<HourlySolar>, ImportError> {
    let header = rows.next().ok_or(ImportError::MissingHeader("Timestamp"))?;
    check_header(header)?;

    let mut hourly = Vec::new();
    for row in rows {
        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let cell = |index: usize| row.get(index).unwrap_or(&EMPTY);
        hourly.push(HourlySolar {
            timestamp: timestamp(cell(0))?,
            production: kwh(cell(1), "Production (kWh)")?,
            consumption: kwh(cell(2), "Consumption (kWh)")?,
            export: kwh(cell(3), "Export (kWh)")?,
            import: kwh(cell(4), "Import (kWh)")?,
        });
    }
    check_complete_days(&hourly)?;
    Ok(hourly)
}

fn check_complete_days(hourly: &[HourlySolar]) -> Result<(), ImportError> {
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for hour in hourly {
        *per_day.entry(hour.date()).or_default() += 1;
    }
    match per_day.into_iter().find(|(_, count)| *count != HOURS_PER_DAY) {
        Some((date, count)) => Err(ImportError::IncompleteDay { date, count }),
        None => Ok(()),
    }
}

pub fn read_hourly(path: &Path) -> Result<Vec<HourlySolar>, ImportError> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e: calamine::XlsxError| {
        ImportError::Workbook(format!("{}: {e}", path.display()))
    })?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::Workbook(format!("{}: no worksheet", path.display())))?
        .map_err(|e| ImportError::Workbook(e.to_string()))?;
    let hourly = parse_rows(range.rows())?;
    log::debug!("read {} hourly rows from {}", hourly.len(), path.display());
    Ok(hourly)
}

/// Hours whose date falls within `start..=end`.
pub fn in_period(
    hourly: &[HourlySolar],
    start: NaiveDate,
    end: NaiveDate,
) -> impl Iterator<Item = &HourlySolar> {
    hourly
        .iter()
        .filter(move |hour| (start..=end).contains(&hour.date()))
}

/// A PPA bill for production within `start..=end`.
pub fn solar_bill(
    hourly: &[HourlySolar],
    real_estate: Address,
    start_date: NaiveDate,
    end_date: NaiveDate,
    ppa_rate: Decimal,
    source_file: &str,
) -> SolarBillData {
    let (production, export) = in_period(hourly, start_date, end_date)
        .fold((Decimal::ZERO, Decimal::ZERO), |(production, export), hour| {
            (production + hour.production, export + hour.export)
        });
    let mut bill = SolarBillData {
        base: BillBase {
            real_estate,
            service_provider: Provider::SunRun,
            start_date,
            end_date,
            total_cost: Decimal::ZERO,
            tax_related_cost: Decimal::ZERO,
            paid_date: None,
            notes: None,
            source_file: source_file.to_string(),
        },
        production_kwh: round_dp(production, 0),
        export_kwh: round_dp(export, 0),
        ppa_rate,
    };
    bill.base.total_cost = bill.expected_total();
    bill
}

#[allow(clippy::too_many_arguments)]
pub fn import<S>(
    store: &mut S,
    path: &Path,
    real_estate: Address,
    start_date: NaiveDate,
    end_date: NaiveDate,
    ppa_rate: Decimal,
    tax_related_cost: TaxRelatedCost,
) -> Result<BillId, ImportError>
where
    S: RealEstateRepository + BillRepository,
{
    let hourly = read_hourly(path)?;
    let bill = solar_bill(
        &hourly,
        real_estate,
        start_date,
        end_date,
        ppa_rate,
        &super::source_name(path),
    );
    let (id, _) = store_bill(store, bill, tax_related_cost)?;
    Ok(id)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use rust_xlsxwriter::Workbook;

    /// Two days of hours producing 1.5 kWh between 10:00 and 15:59 and
    /// exporting 0.5 kWh of it.
    pub(crate) fn write_export(path: &Path, skip_last_hour: bool) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, title) in HEADER.iter().enumerate() {
            sheet.write_string(0, col as u16, *title).unwrap();
        }
        let mut row = 1u32;
        for day in [1, 2] {
            for hour in 0..24 {
                if skip_last_hour && day == 2 && hour == 23 {
                    continue;
                }
                let sunny = (10..16).contains(&hour);
                let production = if sunny { 1.5 } else { 0.0 };
                let export = if sunny { 0.5 } else { 0.0 };
                let stamp = format!("2024-06-{day:02} {hour:02}:00:00");
                sheet.write_string(row, 0, &stamp).unwrap();
                sheet.write_number(row, 1, production).unwrap();
                sheet.write_number(row, 2, 0.8).unwrap();
                sheet.write_number(row, 3, export).unwrap();
                sheet.write_number(row, 4, 0.1).unwrap();
                row += 1;
            }
        }
        workbook.save(path).unwrap();
    }

    #[test]
    fn reads_complete_days() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solar.xlsx");
        write_export(&path, false);
        let hourly = read_hourly(&path).unwrap();
        assert_eq!(hourly.len(), 48);
        assert_eq!(hourly[10].production, dec!(1.5));

        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let bill = solar_bill(&hourly, Address::BirchLane, start, end, dec!(0.15), "solar.xlsx");
        assert_eq!(bill.production_kwh, dec!(18));
        assert_eq!(bill.export_kwh, dec!(6));
        assert_eq!(bill.base.total_cost, dec!(2.70));
    }

    #[test]
    fn missing_hour_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solar.xlsx");
        write_export(&path, true);
        match read_hourly(&path) {
            Err(ImportError::IncompleteDay { date, count }) => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
                assert_eq!(count, 23);
            }
            other => panic!("expected incomplete day, got {other:?}"),
        }
    }

    #[test]
    fn wrong_header_is_rejected() {
        let rows = vec![vec![
            Data::String("Time".to_string()),
            Data::String("Production".to_string()),
        ]];
        assert!(matches!(
            parse_rows(rows.iter().map(Vec::as_slice)),
            Err(ImportError::UnexpectedHeader { .. })
        ));
    }
}
