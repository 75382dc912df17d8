//! Statement service
//!
//! The statement store: bank statements enter here, either one at a time or
//! from a CSV file, and are read back by reconciliation. Statements are
//! never updated or deleted.

use chrono::NaiveDate;
use csv::StringRecord;

use crate::audit::EntityType;
use crate::error::{TallyError, TallyResult};
use crate::models::{AccountId, Money, Statement, StatementId};
use crate::storage::Storage;

/// Columns a statement CSV must provide, in any order
pub const CSV_COLUMNS: [&str; 4] = [
    "period_start",
    "period_end",
    "starting_balance",
    "ending_balance",
];

const CSV_DATE_FORMAT: &str = "%Y-%m-%d";

/// Service for the statement store
pub struct StatementService<'a> {
    storage: &'a Storage,
}

impl<'a> StatementService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Store a new statement for an account
    pub fn create_statement(
        &self,
        account_id: AccountId,
        period_start: NaiveDate,
        period_end: NaiveDate,
        starting_balance: Money,
        ending_balance: Money,
    ) -> TallyResult<Statement> {
        self.require_account(account_id)?;

        let statement = Statement::new(
            account_id,
            period_start,
            period_end,
            starting_balance,
            ending_balance,
        );
        statement
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.store(vec![statement.clone()])?;
        Ok(statement)
    }

    /// Get a statement by ID
    pub fn get_statement(&self, id: StatementId) -> TallyResult<Statement> {
        self.storage
            .statements
            .get(id)?
            .ok_or_else(|| TallyError::statement_not_found(id.to_string()))
    }

    /// Find a statement by full or short ID
    pub fn find(&self, reference: &str) -> TallyResult<Statement> {
        let found = match reference.parse::<StatementId>() {
            Ok(id) => self.storage.statements.get(id)?,
            Err(_) => self.storage.statements.find_by_short_id(reference)?,
        };
        found.ok_or_else(|| TallyError::statement_not_found(reference))
    }

    /// Statements for an account, ordered by period start
    pub fn list_statements(&self, account_id: AccountId) -> TallyResult<Vec<Statement>> {
        self.storage.statements.get_by_account(account_id)
    }

    /// Most recent statement for an account, by period start
    pub fn latest(&self, account_id: AccountId) -> TallyResult<Option<Statement>> {
        Ok(self.list_statements(account_id)?.pop())
    }

    /// Import statements from CSV
    ///
    /// The header row must name every column in `CSV_COLUMNS`. A bad row
    /// fails the whole import and nothing is stored.
    pub fn import_csv<R: std::io::Read>(
        &self,
        account_id: AccountId,
        reader: R,
    ) -> TallyResult<Vec<Statement>> {
        self.require_account(account_id)?;

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let columns = column_positions(reader.headers()?)?;

        let mut statements = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            // Header is line 1
            let line = idx + 2;
            let statement = parse_record(account_id, &record, &columns)
                .map_err(|e| TallyError::Csv(format!("line {}: {}", line, e)))?;
            statement
                .validate()
                .map_err(|e| TallyError::Validation(format!("line {}: {}", line, e)))?;
            statements.push(statement);
        }

        if statements.is_empty() {
            return Err(TallyError::Csv("no statements found".into()));
        }

        self.store(statements.clone())?;
        tracing::info!(account = %account_id, count = statements.len(), "imported statements");
        Ok(statements)
    }

    fn require_account(&self, account_id: AccountId) -> TallyResult<()> {
        self.storage
            .accounts
            .get(account_id)?
            .map(|_| ())
            .ok_or_else(|| TallyError::account_not_found(account_id.to_string()))
    }

    fn store(&self, statements: Vec<Statement>) -> TallyResult<()> {
        self.storage.statements.insert_all(statements.clone())?;
        self.storage.statements.save()?;

        for statement in &statements {
            self.storage.log_create(
                EntityType::Statement,
                statement.id.to_string(),
                Some(format!("{} to {}", statement.period_start, statement.period_end)),
                statement,
            )?;
            tracing::debug!(statement = %statement.id, "stored statement");
        }
        Ok(())
    }
}

/// Index of each required column in the header row
fn column_positions(headers: &StringRecord) -> TallyResult<[usize; 4]> {
    let mut positions = [0usize; 4];
    for (slot, name) in positions.iter_mut().zip(CSV_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| TallyError::Csv(format!("missing column '{}'", name)))?;
    }
    Ok(positions)
}

fn parse_record(
    account_id: AccountId,
    record: &StringRecord,
    columns: &[usize; 4],
) -> Result<Statement, String> {
    let field = |i: usize| {
        record
            .get(columns[i])
            .ok_or_else(|| format!("missing value for '{}'", CSV_COLUMNS[i]))
    };
    let date = |i: usize| {
        let raw = field(i)?;
        NaiveDate::parse_from_str(raw, CSV_DATE_FORMAT)
            .map_err(|_| format!("invalid date '{}' for '{}'", raw, CSV_COLUMNS[i]))
    };
    let money = |i: usize| {
        let raw = field(i)?;
        Money::parse(raw).map_err(|e| format!("{} for '{}'", e, CSV_COLUMNS[i]))
    };

    Ok(Statement::new(account_id, date(0)?, date(1)?, money(2)?, money(3)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::models::Account;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage, AccountId) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();

        let account = Account::new("Checking", "USD");
        let account_id = account.id;
        storage.accounts.upsert(account).unwrap();
        (temp_dir, storage, account_id)
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn test_create_and_get() {
        let (_temp_dir, storage, account_id) = create_test_storage();
        let service = StatementService::new(&storage);

        let statement = service
            .create_statement(
                account_id,
                date(1, 1),
                date(1, 31),
                Money::from_cents(50000),
                Money::from_cents(46500),
            )
            .unwrap();

        assert_eq!(service.get_statement(statement.id).unwrap(), statement);
        assert_eq!(
            service.find(&statement.id.to_string()).unwrap().id,
            statement.id
        );
        assert!(service
            .get_statement(StatementId::new())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_create_validates() {
        let (_temp_dir, storage, account_id) = create_test_storage();
        let service = StatementService::new(&storage);

        let inverted =
            service.create_statement(account_id, date(2, 1), date(1, 1), Money::zero(), Money::zero());
        assert!(inverted.unwrap_err().is_validation());

        let orphan = service.create_statement(
            AccountId::new(),
            date(1, 1),
            date(1, 31),
            Money::zero(),
            Money::zero(),
        );
        assert!(orphan.unwrap_err().is_not_found());
        assert_eq!(storage.statements.count().unwrap(), 0);
    }

    #[test]
    fn test_single_day_period_is_allowed() {
        let (_temp_dir, storage, account_id) = create_test_storage();
        let service = StatementService::new(&storage);

        service
            .create_statement(account_id, date(3, 1), date(3, 1), Money::zero(), Money::zero())
            .unwrap();
    }

    #[test]
    fn test_list_ordered_by_period() {
        let (_temp_dir, storage, account_id) = create_test_storage();
        let service = StatementService::new(&storage);

        for month in [3, 1, 2] {
            service
                .create_statement(
                    account_id,
                    date(month, 1),
                    date(month, 28),
                    Money::zero(),
                    Money::zero(),
                )
                .unwrap();
        }

        let starts: Vec<NaiveDate> = service
            .list_statements(account_id)
            .unwrap()
            .iter()
            .map(|s| s.period_start)
            .collect();
        assert_eq!(starts, vec![date(1, 1), date(2, 1), date(3, 1)]);
        assert_eq!(
            service.latest(account_id).unwrap().unwrap().period_start,
            date(3, 1)
        );
    }

    #[test]
    fn test_import_csv() {
        let (_temp_dir, storage, account_id) = create_test_storage();
        let service = StatementService::new(&storage);

        let csv_data = "\
ending_balance,period_start,period_end,starting_balance
465.00,2025-01-01,2025-01-31,500.00
-$12.50, 2025-02-01 ,2025-02-28,465.00
";
        let imported = service.import_csv(account_id, csv_data.as_bytes()).unwrap();

        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].ending_balance.cents(), 46500);
        assert_eq!(imported[1].ending_balance.cents(), -1250);
        assert_eq!(imported[1].period_start, date(2, 1));
        assert_eq!(service.list_statements(account_id).unwrap().len(), 2);
    }

    #[test]
    fn test_import_csv_is_all_or_none() {
        let (_temp_dir, storage, account_id) = create_test_storage();
        let service = StatementService::new(&storage);

        let csv_data = "\
period_start,period_end,starting_balance,ending_balance
2025-01-01,2025-01-31,500.00,465.00
2025-02-01,2025-02-30,465.00,400.00
";
        let err = service.import_csv(account_id, csv_data.as_bytes()).unwrap_err();

        assert!(matches!(err, TallyError::Csv(ref msg) if msg.contains("line 3")));
        assert!(service.list_statements(account_id).unwrap().is_empty());
    }

    #[test]
    fn test_import_csv_rejects_malformed_amounts() {
        let (_temp_dir, storage, account_id) = create_test_storage();
        let service = StatementService::new(&storage);

        for bad in ["465.001", "4.6€", "1.-5", "465.00abc"] {
            let csv_data = format!(
                "period_start,period_end,starting_balance,ending_balance\n\
                 2025-01-01,2025-01-31,500.00,{}\n",
                bad
            );
            let err = service.import_csv(account_id, csv_data.as_bytes()).unwrap_err();
            assert!(
                matches!(err, TallyError::Csv(ref msg) if msg.contains("ending_balance")),
                "{} was accepted or misreported: {}",
                bad,
                err
            );
        }
        assert!(service.list_statements(account_id).unwrap().is_empty());
    }

    #[test]
    fn test_import_csv_requires_columns() {
        let (_temp_dir, storage, account_id) = create_test_storage();
        let service = StatementService::new(&storage);

        let csv_data = "start,end,balance\n2025-01-01,2025-01-31,1.00\n";
        let err = service.import_csv(account_id, csv_data.as_bytes()).unwrap_err();
        assert!(matches!(err, TallyError::Csv(ref msg) if msg.contains("period_start")));
    }
}
