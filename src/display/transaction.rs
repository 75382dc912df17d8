//! Transaction display formatting
//!
//! Register views with a status column: blank for uncleared, `✓` for
//! cleared, `🔒` for reconciled.

use crate::models::Transaction;

fn status_icon(txn: &Transaction) -> &'static str {
    if txn.reconciled {
        "🔒"
    } else if txn.cleared {
        "✓"
    } else {
        " "
    }
}

/// Format a single transaction as a register row
pub fn format_transaction_row(txn: &Transaction, symbol: &str) -> String {
    let payee_display = if txn.payee_name.is_empty() {
        "(no payee)".to_string()
    } else {
        txn.payee_name.clone()
    };

    format!(
        "{:<2} {:<12} {} {:<20} {:>12}",
        status_icon(txn),
        txn.id,
        txn.date.format("%Y-%m-%d"),
        truncate(&payee_display, 20),
        txn.amount.format_with_symbol(symbol),
    )
}

/// Format a list of transactions as a register
pub fn format_transaction_register(transactions: &[Transaction], symbol: &str) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<2} {:<12} {:<10} {:<20} {:>12}\n",
        "St", "ID", "Date", "Payee", "Amount"
    ));
    output.push_str(&"-".repeat(61));
    output.push('\n');

    for txn in transactions {
        output.push_str(&format_transaction_row(txn, symbol));
        output.push('\n');
    }

    output
}

/// Truncate to at most `max_len` characters, marking the cut with `...`
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
