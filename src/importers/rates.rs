//! Monthly tariff tables. One CSV row per property and month, with the
//! snapshot's field names as the header:
//!
//! ```text
//! real_estate,month,service_charge,first_kwh,dist_first_rate,...
//! BirchLane,2024-05,6.96,600,0.069711,...
//! ```

use super::ImportError;
use crate::core::RoundFields;
use crate::models::{ElectricData, NatGasData};
use crate::store::UtilityDataRepository;
use serde::de::DeserializeOwned;

fn read_rows<T: DeserializeOwned + RoundFields>(content: &str) -> Result<Vec<T>, ImportError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes())
        .deserialize()
        .map(|row| row.map(T::rounded).map_err(ImportError::from))
        .collect()
}

pub fn import_electric_rates<S: UtilityDataRepository>(
    store: &mut S,
    content: &str,
) -> Result<usize, ImportError> {
    let rows: Vec<ElectricData> = read_rows(content)?;
    let count = rows.len();
    for row in rows {
        log::debug!("electric rates for {} {}", row.real_estate, row.month);
        store.insert_electric_data(row)?;
    }
    log::info!("imported {count} electric rate snapshots");
    Ok(count)
}

pub fn import_natgas_rates<S: UtilityDataRepository>(
    store: &mut S,
    content: &str,
) -> Result<usize, ImportError> {
    let rows: Vec<NatGasData> = read_rows(content)?;
    let count = rows.len();
    for row in rows {
        log::debug!("gas rates for {} {}", row.real_estate, row.month);
        store.insert_natgas_data(row)?;
    }
    log::info!("imported {count} gas rate snapshots");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Address;
    use crate::models::{RealEstate, YearMonth};
    use crate::store::{MemoryStore, RealEstateRepository};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const ELECTRIC: &str = "\
real_estate,month,service_charge,first_kwh,dist_first_rate,dist_next_rate,eh_rate,sbc_rate,zec_rate,gpc_rate,tac_pct,supply_first_rate,supply_next_rate,transmission_rate
BirchLane,2024-05,6.96,600,0.069711,0.077381,0.0615,0.008913,0.004,0.00138,-0.01,0.10134,0.11022,0.022
BirchLane,2024-06,6.96,600,0.0712345678,0.079,0.0615,0.0091,0.004,0.0014,-0.01,0.1121,0.1212,0.0231
";

    fn store() -> MemoryStore {
        let mut store = MemoryStore::default();
        store
            .insert_real_estate(RealEstate {
                address: Address::BirchLane,
                units: 2,
                square_feet: 1800,
                purchase_date: NaiveDate::from_ymd_opt(2019, 4, 1).unwrap(),
                bill_tax_related: true,
            })
            .unwrap();
        store
    }

    #[test]
    fn rows_are_rounded_and_keyed_by_month() {
        let mut store = store();
        assert_eq!(import_electric_rates(&mut store, ELECTRIC).unwrap(), 2);
        let june = store
            .electric_data(Address::BirchLane, YearMonth::new(2024, 6).unwrap())
            .unwrap();
        assert_eq!(june.dist_first_rate, dec!(0.071235));

        // A second import of the same months violates the natural key.
        assert!(matches!(
            import_electric_rates(&mut store, ELECTRIC),
            Err(ImportError::Store(_))
        ));
    }

    #[test]
    fn rates_need_a_known_property() {
        let mut store = MemoryStore::default();
        assert!(matches!(
            import_electric_rates(&mut store, ELECTRIC),
            Err(ImportError::Store(_))
        ));
    }

    #[test]
    fn malformed_month_is_rejected() {
        let content = ELECTRIC.replace("2024-05", "2024-13");
        let mut store = store();
        assert!(matches!(
            import_electric_rates(&mut store, &content),
            Err(ImportError::Csv(_))
        ));
    }
}
