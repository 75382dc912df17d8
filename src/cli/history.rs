//! History and summary CLI commands

use std::collections::HashMap;

use chrono::Utc;

use crate::config::Settings;
use crate::display::reconcile::{format_history, format_summary_table};
use crate::error::TallyResult;
use crate::services::{AccountService, ReconciliationService};
use crate::storage::Storage;

/// Show finalized sessions, optionally for one account
pub fn handle_history_command(
    storage: &Storage,
    settings: &Settings,
    account: Option<String>,
) -> TallyResult<()> {
    let service = ReconciliationService::new(storage);
    let account_service = AccountService::new(storage);

    let sessions = match account {
        Some(reference) => service.history(account_service.require(&reference)?.id)?,
        None => service.history_all()?,
    };

    let names: HashMap<_, _> = account_service
        .list(true)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();

    print!(
        "{}",
        format_history(
            &sessions,
            |id| names.get(&id).cloned().unwrap_or_else(|| id.to_string()),
            &settings.currency_symbol,
        )
    );
    Ok(())
}

/// Show reconciliation freshness for every active account
pub fn handle_summary_command(storage: &Storage) -> TallyResult<()> {
    let rows = ReconciliationService::new(storage).summaries(Utc::now())?;
    print!("{}", format_summary_table(&rows));
    Ok(())
}
