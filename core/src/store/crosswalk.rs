//! Store methods for the county crosswalk reference rows.

use crate::{crosswalk::CrosswalkRow, error::FairLendResult};
use rusqlite::params;

use super::ReportStore;

impl ReportStore {
    /// Replace the stored crosswalk with `rows`, keeping their order.
    pub fn insert_crosswalk_rows(&self, rows: &[CrosswalkRow]) -> FairLendResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM county_crosswalk", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO county_crosswalk
                 (line, county_state, state_code, county_code, cbsa_code, cbsa_name)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (idx, row) in rows.iter().enumerate() {
                stmt.execute(params![
                    (idx + 1) as i64,
                    row.county_state,
                    row.state_code,
                    row.county_code,
                    row.cbsa_code,
                    row.cbsa_name,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Stored rows in their original order.
    pub fn load_crosswalk_rows(&self) -> FairLendResult<Vec<CrosswalkRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT county_state, state_code, county_code, cbsa_code, cbsa_name
             FROM county_crosswalk ORDER BY line ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CrosswalkRow {
                    county_state: row.get(0)?,
                    state_code:   row.get(1)?,
                    county_code:  row.get(2)?,
                    cbsa_code:    row.get(3)?,
                    cbsa_name:    row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
