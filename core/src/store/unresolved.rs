//! Store methods for ticket counties that could not be resolved.

use crate::{error::FairLendResult, resolver::UnresolvedCounty};
use rusqlite::params;

use super::ReportStore;

/// (county_name, state_name, reason) as persisted.
pub type UnresolvedRow = (String, String, String);

impl ReportStore {
    pub fn record_unresolved(&self, run_id: &str, county: &UnresolvedCounty) -> FairLendResult<()> {
        self.conn.execute(
            "INSERT INTO unresolved_county (run_id, county_name, state_name, reason)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                run_id,
                county.county_name,
                county.state_name,
                county.reason.to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn unresolved_for_run(&self, run_id: &str) -> FairLendResult<Vec<UnresolvedRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT county_name, state_name, reason FROM unresolved_county
             WHERE run_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
