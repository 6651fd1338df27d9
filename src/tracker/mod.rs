//! Loan and expense tracking over a flat append-only log.
//!
//! Deliberately simple: one CSV line per month under fixed loan terms.
//! Ad-hoc questions are answered by handing the whole history to the LLM.

use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

pub const LOAN_AMOUNT: f64 = 10_000.0;
pub const ANNUAL_RATE: f64 = 0.05;
pub const MONTHLY_RATE: f64 = ANNUAL_RATE / 12.0;
pub const TENURE_MONTHS: u32 = 24;
/// Pre-calculated monthly installment for the fixed loan terms.
pub const EMI: f64 = 439.0;

pub const DEFAULT_EXPENSE_FILE: &str = "expense_history.txt";

const HEADER: &str = "Date,Income,Rent,Groceries,Entertainment,EMI,Prepayment,Principal,Interest";

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseEntry {
    pub date: String,
    pub income: f64,
    pub rent: f64,
    pub groceries: f64,
    pub entertainment: f64,
    pub emi: f64,
    pub prepayment: f64,
    pub principal: f64,
    pub interest: f64,
}

impl ExpenseEntry {
    fn to_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{}",
            self.date,
            self.income,
            self.rent,
            self.groceries,
            self.entertainment,
            self.emi,
            self.prepayment,
            self.principal,
            self.interest
        )
    }

    fn parse(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 9 {
            return None;
        }
        Some(ExpenseEntry {
            date: fields[0].to_string(),
            income: fields[1].parse().ok()?,
            rent: fields[2].parse().ok()?,
            groceries: fields[3].parse().ok()?,
            entertainment: fields[4].parse().ok()?,
            emi: fields[5].parse().ok()?,
            prepayment: fields[6].parse().ok()?,
            principal: fields[7].parse().ok()?,
            interest: fields[8].parse().ok()?,
        })
    }
}

/// Append-only CSV ledger.
pub struct ExpenseLog {
    path: PathBuf,
}

impl ExpenseLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with its header line if it does not exist yet.
    pub fn initialize(&self) -> Result<()> {
        if !self.path.exists() {
            fs::write(&self.path, format!("{}\n", HEADER))
                .with_context(|| format!("Failed to create {}", self.path.display()))?;
        }
        Ok(())
    }

    /// Load all entries, skipping the header and unparseable lines.
    pub fn load(&self) -> Result<Vec<ExpenseEntry>> {
        self.initialize()?;
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(contents
            .lines()
            .skip(1)
            .filter_map(ExpenseEntry::parse)
            .collect())
    }

    pub fn append(&self, entry: &ExpenseEntry) -> Result<()> {
        self.initialize()?;
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        writeln!(file, "{}", entry.to_line())
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        Ok(())
    }

    /// The raw history lines (header excluded), for dumping into a prompt.
    pub fn raw_history(&self) -> Result<String> {
        self.initialize()?;
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(contents
            .lines()
            .skip(1)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Update loan state after one EMI payment plus an optional prepayment.
///
/// Returns the new outstanding principal and the interest portion of the
/// installment.
pub fn calculate_loan(principal: f64, prepayment: f64) -> (f64, f64) {
    let interest = principal * MONTHLY_RATE;
    let principal_paid = EMI - interest;
    (principal - principal_paid - prepayment, interest)
}

/// Compose the LLM prompt: full history, loan terms, then the question.
pub fn query_context(history: &str, query: &str) -> String {
    format!(
        "Expense History:\n{}\nLoan Details: Initial $10,000, {}% interest, {} months, EMI ${}\nQuery: {}",
        history,
        (ANNUAL_RATE * 100.0) as u32,
        TENURE_MONTHS,
        EMI as u32,
        query
    )
}

pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}
