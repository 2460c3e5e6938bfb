//! Store methods for loan-level rows.

use crate::{
    demographics::LoanDemographics,
    error::FairLendResult,
    loan::LoanRecord,
    types::{Geoid5, Year},
};
use rusqlite::{params, Row};
use std::collections::BTreeSet;

use super::ReportStore;

const LOAN_COLUMNS: &str = "lender_id, activity_year, county_geoid5, census_tract,
     action_taken, loan_purpose, loan_amount, income,
     tract_to_msa_income_pct, tract_minority_population_pct, ffiec_msa_median_family_income,
     ethnicity_1, ethnicity_2, ethnicity_3, ethnicity_4, ethnicity_5,
     race_1, race_2, race_3, race_4, race_5";

impl ReportStore {
    pub fn insert_loans(&self, loans: &[LoanRecord]) -> FairLendResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO loan_record ({LOAN_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                         ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)"
            ))?;
            for loan in loans {
                let e = &loan.demographics.ethnicity;
                let r = &loan.demographics.race;
                stmt.execute(params![
                    loan.lender_id,
                    loan.activity_year,
                    loan.county_geoid5,
                    loan.census_tract,
                    loan.action_taken,
                    loan.loan_purpose,
                    loan.loan_amount,
                    loan.income,
                    loan.tract_to_msa_income_pct,
                    loan.tract_minority_population_pct,
                    loan.ffiec_msa_median_family_income,
                    e[0], e[1], e[2], e[3], e[4],
                    r[0], r[1], r[2], r[3], r[4],
                ])?;
            }
        }
        tx.commit()?;
        Ok(loans.len())
    }

    /// Loans in any of `geoids`, restricted to `years` (empty = every year).
    /// Repeated years are fetched once.
    pub fn loans_for_geoids(
        &self,
        geoids: &BTreeSet<Geoid5>,
        years:  &[Year],
    ) -> FairLendResult<Vec<LoanRecord>> {
        let years: BTreeSet<Year> = years.iter().copied().collect();
        let mut loans = Vec::new();
        if years.is_empty() {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT {LOAN_COLUMNS} FROM loan_record
                 WHERE county_geoid5 = ?1 ORDER BY id ASC"
            ))?;
            for geoid in geoids {
                let rows = stmt
                    .query_map(params![geoid], loan_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                loans.extend(rows);
            }
        } else {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT {LOAN_COLUMNS} FROM loan_record
                 WHERE county_geoid5 = ?1 AND activity_year = ?2 ORDER BY id ASC"
            ))?;
            for geoid in geoids {
                for year in &years {
                    let rows = stmt
                        .query_map(params![geoid, year], loan_from_row)?
                        .collect::<Result<Vec<_>, _>>()?;
                    loans.extend(rows);
                }
            }
        }
        Ok(loans)
    }

    pub fn loan_count(&self) -> FairLendResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM loan_record", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn loan_from_row(row: &Row<'_>) -> rusqlite::Result<LoanRecord> {
    Ok(LoanRecord {
        lender_id:     row.get(0)?,
        activity_year: row.get(1)?,
        county_geoid5: row.get(2)?,
        census_tract:  row.get(3)?,
        action_taken:  row.get(4)?,
        loan_purpose:  row.get(5)?,
        loan_amount:   row.get(6)?,
        income:        row.get(7)?,
        tract_to_msa_income_pct:        row.get(8)?,
        tract_minority_population_pct:  row.get(9)?,
        ffiec_msa_median_family_income: row.get(10)?,
        demographics: LoanDemographics {
            ethnicity: [row.get(11)?, row.get(12)?, row.get(13)?, row.get(14)?, row.get(15)?],
            race:      [row.get(16)?, row.get(17)?, row.get(18)?, row.get(19)?, row.get(20)?],
        },
    })
}
