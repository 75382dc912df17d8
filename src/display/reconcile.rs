//! Statement, session, history and staleness formatting

use crate::models::{Account, AccountId, ReconciliationSession, SessionStatus, Statement, Transaction};
use crate::reconcile::ReconciliationSummary;

use super::transaction::truncate;

/// Format an account's statements, oldest period first
pub fn format_statement_list(statements: &[Statement], symbol: &str) -> String {
    if statements.is_empty() {
        return "No statements found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12}  {:<10}  {:<10}  {:>12}  {:>12}\n",
        "ID", "Start", "End", "Opening", "Closing"
    ));
    output.push_str(&"-".repeat(64));
    output.push('\n');

    for statement in statements {
        output.push_str(&format!(
            "{:<12}  {:<10}  {:<10}  {:>12}  {:>12}\n",
            statement.id,
            statement.period_start,
            statement.period_end,
            statement.starting_balance.format_with_symbol(symbol),
            statement.ending_balance.format_with_symbol(symbol),
        ));
    }

    output
}

pub fn format_statement_details(statement: &Statement, symbol: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!("Statement: {}\n", statement.id));
    output.push_str(&format!(
        "  Period:           {} to {}\n",
        statement.period_start, statement.period_end
    ));
    output.push_str(&format!(
        "  Starting Balance: {}\n",
        statement.starting_balance.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "  Ending Balance:   {}\n",
        statement.ending_balance.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "  Net Change:       {}\n",
        statement.net_change().format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "  Imported:         {}\n",
        statement.imported_at.format("%Y-%m-%d %H:%M UTC")
    ));
    output
}

/// Format an open or finished session with the transactions it can clear
pub fn format_session_status(
    session: &ReconciliationSession,
    candidates: &[Transaction],
    symbol: &str,
) -> String {
    let mut output = String::new();
    output.push_str(&format!("Reconciliation {} ({})\n", session.id, session.status));
    output.push_str(&format!("  Statement:        {}\n", session.statement_id));
    output.push_str(&format!(
        "  Starting Balance: {}\n",
        session.starting_balance.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "  Statement Ending: {}\n",
        session.ending_balance.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "  Actual Ending:    {}\n",
        session
            .actual_ending_balance
            .map(|m| m.format_with_symbol(symbol))
            .unwrap_or_else(|| "(not set)".to_string())
    ));
    output.push_str(&format!(
        "  Cleared Balance:  {}\n",
        session.computed_balance.format_with_symbol(symbol)
    ));

    let difference = match session.difference {
        Some(difference) => difference,
        None => session.live_resolution().difference,
    };
    output.push_str(&format!(
        "  Difference:       {}{}\n",
        difference.format_with_symbol(symbol),
        if difference.is_zero() { "  (balanced)" } else { "" }
    ));

    if session.is_in_progress() {
        output.push('\n');
        if candidates.is_empty() {
            output.push_str("No transactions to clear.\n");
        } else {
            output.push_str(&format!(
                "{:<3} {:<12} {:<10} {:<20} {:>12}\n",
                "", "ID", "Date", "Payee", "Amount"
            ));
            for txn in candidates {
                let mark = if session.is_cleared(txn.id) { "[x]" } else { "[ ]" };
                output.push_str(&format!(
                    "{:<3} {:<12} {} {:<20} {:>12}\n",
                    mark,
                    txn.id,
                    txn.date.format("%Y-%m-%d"),
                    truncate(&txn.payee_name, 20),
                    txn.amount.format_with_symbol(symbol),
                ));
            }
        }
    }

    output
}

/// Format finalized sessions, most recent first
pub fn format_history(
    sessions: &[ReconciliationSession],
    account_name: impl Fn(AccountId) -> String,
    symbol: &str,
) -> String {
    if sessions.is_empty() {
        return "No reconciliation history.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12}  {:<20}  {:<10}  {:<16}  {:>12}  {:>7}\n",
        "Session", "Account", "Status", "Finished", "Difference", "Cleared"
    ));
    output.push_str(&"-".repeat(86));
    output.push('\n');

    for session in sessions {
        let difference = match (session.status, session.difference) {
            (SessionStatus::Completed, Some(d)) => d.format_with_symbol(symbol),
            _ => "-".to_string(),
        };
        output.push_str(&format!(
            "{:<12}  {:<20}  {:<10}  {:<16}  {:>12}  {:>7}\n",
            session.id,
            truncate(&account_name(session.account_id), 20),
            session.status.to_string(),
            session.sort_key().format("%Y-%m-%d %H:%M"),
            difference,
            session.cleared.len(),
        ));
    }

    output
}

/// Format the staleness table shown for all accounts
pub fn format_summary_table(rows: &[(Account, ReconciliationSummary)]) -> String {
    if rows.is_empty() {
        return "No accounts found.\n".to_string();
    }

    let name_width = rows
        .iter()
        .map(|(a, _)| a.name.chars().count())
        .max()
        .unwrap_or(7)
        .max(7);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<10}  {:>6}  {:>11}  {}\n",
        "Account",
        "Last",
        "Days",
        "Unreconciled",
        "Status",
        name_width = name_width,
    ));
    output.push_str(&"-".repeat(name_width + 45));
    output.push('\n');

    for (account, summary) in rows {
        let last = summary
            .last_reconciled
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "never".to_string());
        let days = summary
            .days_since_last_reconciliation
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let open = if summary.open_session.is_some() {
            " (in progress)"
        } else {
            ""
        };

        output.push_str(&format!(
            "{:<name_width$}  {:<10}  {:>6}  {:>11}  {}{}\n",
            account.name,
            last,
            days,
            summary.unreconciled_transaction_count,
            summary.staleness,
            open,
            name_width = name_width,
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, TransactionId};
    use crate::reconcile::summarize;
    use chrono::{Duration, NaiveDate, Utc};

    fn statement() -> Statement {
        Statement::new(
            AccountId::new(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            Money::from_cents(50000),
            Money::from_cents(46500),
        )
    }

    #[test]
    fn test_statement_views() {
        let s = statement();
        let list = format_statement_list(&[s.clone()], "$");
        assert!(list.contains("2025-01-01"));
        assert!(list.contains("$465.00"));

        let details = format_statement_details(&s, "$");
        assert!(details.contains("Net Change:       -$35.00"));
        assert!(format_statement_list(&[], "$").contains("No statements"));
    }

    #[test]
    fn test_session_status_shows_live_difference() {
        let s = statement();
        let mut session = ReconciliationSession::start(&s, Money::from_cents(50000), Utc::now());
        let txn = Transaction::new(
            s.account_id,
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            Money::from_cents(-3500),
        );
        session.toggle(txn.id, txn.amount).unwrap();
        session.toggle(TransactionId::new(), Money::zero()).unwrap();

        let output = format_session_status(&session, &[txn], "$");
        assert!(output.contains("In Progress"));
        assert!(output.contains("Actual Ending:    (not set)"));
        assert!(output.contains("Difference:       $0.00  (balanced)"));
        assert!(output.contains("[x]"));
    }

    #[test]
    fn test_history_table() {
        let s = statement();
        let mut session = ReconciliationSession::start(&s, Money::zero(), Utc::now());
        session.abandon(Utc::now()).unwrap();

        let output = format_history(&[session], |_| "Checking".to_string(), "$");
        assert!(output.contains("Checking"));
        assert!(output.contains("Abandoned"));
        assert!(format_history(&[], |_| String::new(), "$").contains("No reconciliation"));
    }

    #[test]
    fn test_summary_table() {
        let account = Account::new("Checking", "USD");
        let summary = summarize(&account, &[], &[], Utc::now() + Duration::days(1));
        let output = format_summary_table(&[(account, summary)]);
        assert!(output.contains("never"));
        assert!(output.contains("critical"));
    }
}
