//! Schema command - print expected input formats of the CSV templates

use crate::importers::templates::{CsvField, DepreciationBillRecord, SimpleBillRecord};
use clap::{Args, ValueEnum};
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Template to describe
    #[arg(value_enum)]
    template: Template,

    /// Output format: json-schema, csv-header or csv-fields
    #[arg(value_enum, default_value = "csv-fields")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Template {
    /// Hand entered bills of any simple provider
    SimpleBills,
    /// Yearly depreciation bills per property item
    DepreciationBills,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for one template row
    JsonSchema,
    /// CSV header row with column names
    CsvHeader,
    /// CSV column descriptions
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => self.print_json_schema(),
            SchemaFormat::CsvHeader => {
                println!("{}", csv_header(self.fields()));
                Ok(())
            }
            SchemaFormat::CsvFields => {
                self.print_csv_fields();
                Ok(())
            }
        }
    }

    fn fields(&self) -> &'static [CsvField] {
        match self.template {
            Template::SimpleBills => SimpleBillRecord::csv_schema(),
            Template::DepreciationBills => DepreciationBillRecord::csv_schema(),
        }
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        let schema = match self.template {
            Template::SimpleBills => schema_for!(SimpleBillRecord),
            Template::DepreciationBills => schema_for!(DepreciationBillRecord),
        };
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn print_csv_fields(&self) {
        println!("CSV Input Format");
        println!("================");
        println!();
        for field in self.fields() {
            let req = if field.required { "required" } else { "optional" };
            println!("{:20} ({:8})  {}", field.name, req, field.description);
        }
        println!();
        println!("Dates are YYYY-MM-DD; an empty tax_related_cost uses the property's default");
    }
}

pub fn csv_header(fields: &[CsvField]) -> String {
    fields
        .iter()
        .map(|f| f.name)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_bill_header_matches_template_columns() {
        assert_eq!(
            csv_header(SimpleBillRecord::csv_schema()),
            "real_estate,provider,start_date,end_date,total_cost,tax_related_cost,paid_date,notes"
        );
        let required: Vec<_> = DepreciationBillRecord::csv_schema()
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();
        assert_eq!(
            required,
            [
                "real_estate",
                "item",
                "purchase_date",
                "tax_year",
                "total_cost",
                "period_usage_pct"
            ]
        );
    }
}
