use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One balance movement. The journal is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    /// Time of the quote that caused the movement.
    pub time: Option<DateTime<Utc>>,
    pub description: String,
    pub amount: f64,
    /// Account balance after the movement.
    pub balance: f64,
}

impl Transaction {
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        balance: f64,
        time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            time,
            description: description.into(),
            amount,
            balance,
        }
    }
}

/// Append-only record of every balance movement of an account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Journal {
    transactions: Vec<Transaction>,
}

impl Journal {
    pub fn record(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Sum of every recorded amount.
    pub fn total(&self) -> f64 {
        self.transactions.iter().map(|t| t.amount).sum()
    }

    /// Checks that each recorded balance follows from the previous one.
    pub fn is_consistent(&self, initial_balance: f64) -> bool {
        let mut balance = initial_balance;
        self.transactions.iter().all(|t| {
            balance += t.amount;
            (balance - t.balance).abs() < 1e-6
        })
    }
}
