//! Account display formatting
//!
//! Formats accounts for terminal output in table and detail views.

use crate::models::Money;
use crate::reconcile::ReconciliationSummary;
use crate::services::account::AccountSummary;

/// Format a list of accounts with balances as a table
pub fn format_account_list(summaries: &[AccountSummary], symbol: &str) -> String {
    if summaries.is_empty() {
        return "No accounts found.\n".to_string();
    }

    let name_width = summaries
        .iter()
        .map(|s| s.account.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<3}  {:>12}  {:>12}  {:>12}  {}\n",
        "Name",
        "Cur",
        "Balance",
        "Cleared",
        "Reconciled",
        "Status",
        name_width = name_width,
    ));
    output.push_str(&separator(name_width));

    for summary in summaries {
        let status = if summary.account.archived {
            "Archived".to_string()
        } else if summary.uncleared_count > 0 {
            format!("{} uncleared", summary.uncleared_count)
        } else {
            String::new()
        };

        output.push_str(&format!(
            "{:<name_width$}  {:<3}  {:>12}  {:>12}  {:>12}  {}\n",
            summary.account.name,
            summary.account.currency,
            summary.balance.format_with_symbol(symbol),
            summary.cleared_balance.format_with_symbol(symbol),
            summary.reconciled_balance.format_with_symbol(symbol),
            status,
            name_width = name_width,
        ));
    }

    let total_balance: Money = summaries.iter().map(|s| s.balance).sum();
    let total_cleared: Money = summaries.iter().map(|s| s.cleared_balance).sum();
    let total_reconciled: Money = summaries.iter().map(|s| s.reconciled_balance).sum();

    output.push_str(&separator(name_width));
    output.push_str(&format!(
        "{:<name_width$}  {:<3}  {:>12}  {:>12}  {:>12}\n",
        "TOTAL",
        "",
        total_balance.format_with_symbol(symbol),
        total_cleared.format_with_symbol(symbol),
        total_reconciled.format_with_symbol(symbol),
        name_width = name_width,
    ));

    output
}

fn separator(name_width: usize) -> String {
    format!(
        "{:-<name_width$}  {:-<3}  {:->12}  {:->12}  {:->12}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    )
}

/// Format a single account's details, with its reconciliation status
pub fn format_account_details(
    summary: &AccountSummary,
    reconciliation: &ReconciliationSummary,
    symbol: &str,
) -> String {
    let account = &summary.account;

    let mut output = String::new();
    output.push_str(&format!("Account: {}\n", account.name));
    output.push_str(&format!("  ID:             {}\n", account.id));
    output.push_str(&format!("  Currency:       {}\n", account.currency));
    output.push_str(&format!(
        "  Archived:       {}\n",
        if account.archived { "Yes" } else { "No" }
    ));
    output.push('\n');
    output.push_str(&format!(
        "  Opening Balance:    {}\n",
        account.opening_balance.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "  Current Balance:    {}\n",
        summary.balance.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "  Cleared Balance:    {}\n",
        summary.cleared_balance.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "  Reconciled Balance: {}\n",
        summary.reconciled_balance.format_with_symbol(symbol)
    ));
    output.push_str(&format!("  Uncleared Count:    {}\n", summary.uncleared_count));

    output.push('\n');
    match (reconciliation.last_reconciled, reconciliation.days_since_last_reconciliation) {
        (Some(last), Some(days)) => output.push_str(&format!(
            "  Last Reconciled:  {} ({} days ago, {})\n",
            last.format("%Y-%m-%d"),
            days,
            reconciliation.staleness
        )),
        _ => output.push_str(&format!(
            "  Last Reconciled:  never ({})\n",
            reconciliation.staleness
        )),
    }
    if let Some(open) = reconciliation.open_session {
        output.push_str(&format!("  Open Session:     {}\n", open));
    }

    output.push('\n');
    output.push_str(&format!(
        "  Created:  {}\n",
        account.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    output.push_str(&format!(
        "  Modified: {}\n",
        account.updated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    output
}
