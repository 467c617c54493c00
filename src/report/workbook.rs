use super::{
    BillRow, IncomeTotal, MonthlyTotal, ProviderTotal, RealizedPnl, Report, TaxCategoryTotal,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;

pub const SHEET_NAMES: [&str; 6] = [
    "Tax Categories",
    "Monthly",
    "Providers",
    "Bills",
    "Realized PnL",
    "Income",
];

enum Cell {
    Text(String),
    Money(Decimal),
    Number(f64),
}

trait SheetRow {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<Cell>;
}

impl SheetRow for TaxCategoryTotal {
    const HEADERS: &'static [&'static str] =
        &["Real Estate", "Tax Category", "Total Cost", "Tax Related Cost"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.real_estate.to_string()),
            Cell::Text(self.tax_category.to_string()),
            Cell::Money(self.total_cost),
            Cell::Money(self.tax_related_cost),
        ]
    }
}

impl SheetRow for MonthlyTotal {
    const HEADERS: &'static [&'static str] = &["Month", "Provider", "Total Cost"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.month.to_string()),
            Cell::Text(self.provider.display_name().to_string()),
            Cell::Money(self.total_cost),
        ]
    }
}

impl SheetRow for ProviderTotal {
    const HEADERS: &'static [&'static str] =
        &["Provider", "Bills", "Total Cost", "Tax Related Cost"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.provider.display_name().to_string()),
            Cell::Number(self.bills as f64),
            Cell::Money(self.total_cost),
            Cell::Money(self.tax_related_cost),
        ]
    }
}

impl SheetRow for BillRow {
    const HEADERS: &'static [&'static str] = &[
        "Id",
        "Kind",
        "Real Estate",
        "Provider",
        "Start",
        "End",
        "Total Cost",
        "Tax Related Cost",
        "Paid",
        "Notes",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Number(self.id.0 as f64),
            Cell::Text(self.kind.to_string()),
            Cell::Text(self.real_estate.to_string()),
            Cell::Text(self.provider.display_name().to_string()),
            Cell::Text(self.start_date.to_string()),
            Cell::Text(self.end_date.to_string()),
            Cell::Money(self.total_cost),
            Cell::Money(self.tax_related_cost),
            Cell::Text(self.paid_date.map(|d| d.to_string()).unwrap_or_default()),
            Cell::Text(self.notes.clone().unwrap_or_default()),
        ]
    }
}

impl SheetRow for RealizedPnl {
    const HEADERS: &'static [&'static str] = &[
        "Account",
        "Year",
        "Short Term",
        "Long Term",
        "Total",
        "Short Term (unadj)",
        "Long Term (unadj)",
        "Wash Sale Disallowed",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.account.clone()),
            Cell::Number(self.year.into()),
            Cell::Money(self.short_term),
            Cell::Money(self.long_term),
            Cell::Money(self.total()),
            Cell::Money(self.short_term_unadj),
            Cell::Money(self.long_term_unadj),
            Cell::Money(self.wash_sale_disallowed),
        ]
    }
}

impl SheetRow for IncomeTotal {
    const HEADERS: &'static [&'static str] = &["Account", "Action", "Amount"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.account.clone()),
            Cell::Text(self.action_type.to_string()),
            Cell::Money(self.amount),
        ]
    }
}

fn write_sheet<R: SheetRow>(
    worksheet: &mut Worksheet,
    name: &str,
    rows: &[R],
) -> Result<(), XlsxError> {
    let header = Format::new().set_bold();
    let money = Format::new().set_num_format("#,##0.00");

    worksheet.set_name(name)?;
    for (col, title) in R::HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header)?;
    }
    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        for (col, cell) in row.cells().into_iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(text) => {
                    worksheet.write_string(r, col, text)?;
                }
                Cell::Money(value) => {
                    worksheet.write_number_with_format(
                        r,
                        col,
                        value.to_f64().unwrap_or_default(),
                        &money,
                    )?;
                }
                Cell::Number(value) => {
                    worksheet.write_number(r, col, value)?;
                }
            }
        }
    }
    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofit();
    Ok(())
}

/// Write every section of the report to its own sheet of an XLSX workbook.
pub fn write_workbook(report: &Report, path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    write_sheet(workbook.add_worksheet(), SHEET_NAMES[0], &report.tax_categories)?;
    write_sheet(workbook.add_worksheet(), SHEET_NAMES[1], &report.monthly)?;
    write_sheet(workbook.add_worksheet(), SHEET_NAMES[2], &report.providers)?;
    write_sheet(workbook.add_worksheet(), SHEET_NAMES[3], &report.bills)?;
    write_sheet(workbook.add_worksheet(), SHEET_NAMES[4], &report.realized_pnl)?;
    write_sheet(workbook.add_worksheet(), SHEET_NAMES[5], &report.income)?;
    workbook.save(path)?;
    log::info!("wrote report workbook {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_store;
    use calamine::{open_workbook, Data, Reader, Xlsx};

    #[test]
    fn writes_one_sheet_per_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let report = Report::build(&sample_store(), Some(2023));
        write_workbook(&report, &path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), SHEET_NAMES.map(String::from).to_vec());

        let pnl = workbook.worksheet_range("Realized PnL").unwrap();
        assert_eq!(pnl.height(), 2);
        assert_eq!(
            pnl.get_value((0, 0)),
            Some(&Data::String("Account".to_string()))
        );
        assert_eq!(
            pnl.get_value((1, 0)),
            Some(&Data::String("Z12345678".to_string()))
        );
        assert_eq!(pnl.get_value((1, 2)), Some(&Data::Float(-28.8)));
        assert_eq!(pnl.get_value((1, 4)), Some(&Data::Float(94.15)));

        let bills = workbook.worksheet_range("Bills").unwrap();
        assert_eq!(bills.height(), 1 + report.bills.len());
    }
}
