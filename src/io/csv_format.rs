//! CSV format handling for operation rows, account tables and the ledger
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to operation rows
//! - Account and ledger output serialization
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::types::{
    AccountView, AdminError, Operation, OperationRecord, Role, TransactionRecord,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Raw CSV row as read from the operations file
///
/// Every column except `op` may be empty or missing; which ones are required
/// depends on the operation and is checked by [`convert_csv_record`].
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct CsvRecord {
    pub op: String,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Convert a raw CSV row into an [`OperationRecord`]
///
/// # Errors
///
/// - `InvalidOperation` for an unknown `op`
/// - `InvalidAmount` for an amount that is not a decimal
/// - `UnknownRole` for a role outside the hierarchy
/// - `MissingField` when a column the operation requires is empty
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<OperationRecord, AdminError> {
    let op = match csv_record.op.trim().to_lowercase().as_str() {
        "signup" => Operation::Signup,
        "login" => Operation::Login,
        "credit" => Operation::Credit,
        "add" => Operation::Add,
        "minus" => Operation::Minus,
        "activate" => Operation::Activate,
        "deactivate" => Operation::Deactivate,
        "ban" => Operation::Ban,
        "update" => Operation::Update,
        _ => return Err(AdminError::invalid_operation(&csv_record.op)),
    };

    let amount = match present(csv_record.amount) {
        Some(amount) => Some(
            Decimal::from_str(&amount).map_err(|_| AdminError::invalid_amount(&amount))?,
        ),
        None => None,
    };
    let role = present(csv_record.role)
        .map(|role| Role::from_str(&role))
        .transpose()?;

    let record = OperationRecord {
        op,
        actor: present(csv_record.actor),
        target: present(csv_record.target).ok_or_else(|| AdminError::missing_field("target"))?,
        amount,
        role,
        email: present(csv_record.email),
        fullname: present(csv_record.fullname),
        password: present(csv_record.password),
    };

    // Validate column presence based on operation
    match op {
        Operation::Signup => {
            require(&record.email, "email")?;
            require(&record.password, "password")?;
            if record.role.is_none() {
                return Err(AdminError::missing_field("role"));
            }
        }
        Operation::Login => require(&record.password, "password")?,
        Operation::Credit | Operation::Add | Operation::Minus => {
            require(&record.actor, "actor")?;
            if record.amount.is_none() {
                return Err(AdminError::missing_field("amount"));
            }
        }
        Operation::Activate | Operation::Deactivate | Operation::Ban => {
            require(&record.actor, "actor")?;
        }
        Operation::Update => {
            // A missing editor is reported by the service as unauthorized
        }
    }

    Ok(record)
}

/// Trimmed value, or `None` if missing or blank
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn require(value: &Option<String>, field: &str) -> Result<(), AdminError> {
    match value {
        Some(_) => Ok(()),
        None => Err(AdminError::missing_field(field)),
    }
}

/// Write the account table as CSV
///
/// Columns are `username,role,status,balance`, one row per account sorted by
/// username, balances with four decimal places.
pub fn write_accounts_csv(
    accounts: &[AccountView],
    output: &mut dyn Write,
) -> Result<(), AdminError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["username", "role", "status", "balance"])?;

    // Sort by username for deterministic output
    let mut sorted: Vec<&AccountView> = accounts.iter().collect();
    sorted.sort_by(|a, b| a.username.cmp(&b.username));

    for account in sorted {
        writer.write_record(&[
            account.username.clone(),
            account.role.to_string(),
            account.status.to_string(),
            format!("{:.4}", account.balance),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write ledger records as CSV, oldest first
///
/// Columns are `id,from,to,amount,type`; `from` and `to` are the usernames
/// captured when the record was written.
pub fn write_ledger_csv(
    records: &[TransactionRecord],
    output: &mut dyn Write,
) -> Result<(), AdminError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["id", "from", "to", "amount", "type"])?;

    let mut sorted: Vec<&TransactionRecord> = records.iter().collect();
    sorted.sort_by_key(|record| record.id);

    for record in sorted {
        writer.write_record(&[
            record.id.to_string(),
            record.from.username.clone(),
            record.to.username.clone(),
            format!("{:.4}", record.amount),
            record.direction.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountSnapshot, AccountStatus, Direction, ErrorKind};
    use chrono::Utc;
    use rstest::rstest;
    use uuid::Uuid;

    fn csv_record(op: &str, actor: &str, target: &str, amount: &str) -> CsvRecord {
        let field = |value: &str| (!value.is_empty()).then(|| value.to_string());
        CsvRecord {
            op: op.to_string(),
            actor: field(actor),
            target: field(target),
            amount: field(amount),
            ..Default::default()
        }
    }

    fn view(username: &str, role: Role, status: AccountStatus, balance: Decimal) -> AccountView {
        AccountView {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            fullname: String::new(),
            role,
            balance,
            status,
            joined_at: Utc::now(),
            last_login: None,
        }
    }

    #[rstest]
    #[case("add", Operation::Add)]
    #[case("MINUS", Operation::Minus)] // case insensitive
    #[case(" credit ", Operation::Credit)]
    fn test_convert_money_rows(#[case] op: &str, #[case] expected: Operation) {
        let record = convert_csv_record(csv_record(op, "root", "agent", " 12.5 ")).unwrap();

        assert_eq!(record.op, expected);
        assert_eq!(record.actor.as_deref(), Some("root"));
        assert_eq!(record.target, "agent");
        assert_eq!(record.amount, Some(Decimal::new(125, 1)));
    }

    #[test]
    fn test_convert_signup_row() {
        let record = convert_csv_record(CsvRecord {
            op: "signup".to_string(),
            target: Some("alice".to_string()),
            role: Some("sub-agent".to_string()),
            email: Some("alice@example.com".to_string()),
            fullname: Some("  ".to_string()),
            password: Some("pw".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(record.op, Operation::Signup);
        assert_eq!(record.role, Some(Role::SubAgent));
        assert_eq!(record.fullname, None);
        assert_eq!(record.actor, None);
    }

    #[test]
    fn test_convert_update_without_actor_is_accepted() {
        let mut raw = csv_record("update", "", "agent", "");
        raw.fullname = Some("New".to_string());

        let record = convert_csv_record(raw).unwrap();

        assert_eq!(record.actor, None);
    }

    #[rstest]
    #[case::invalid_op(csv_record("refund", "root", "agent", "1"), "Invalid operation")]
    #[case::missing_target(csv_record("ban", "root", "", ""), "'target'")]
    #[case::missing_amount(csv_record("add", "root", "agent", ""), "'amount'")]
    #[case::missing_actor(csv_record("deactivate", "", "agent", ""), "'actor'")]
    #[case::invalid_amount(csv_record("add", "root", "agent", "ten"), "Invalid amount")]
    #[case::signup_missing_email(csv_record("signup", "", "alice", ""), "'email'")]
    #[case::login_missing_password(csv_record("login", "", "alice", ""), "'password'")]
    fn test_convert_errors(#[case] raw: CsvRecord, #[case] expected: &str) {
        let err = convert_csv_record(raw).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains(expected), "{}", err);
    }

    #[test]
    fn test_convert_unknown_role() {
        let mut raw = csv_record("update", "root", "agent", "");
        raw.role = Some("Emperor".to_string());

        let err = convert_csv_record(raw).unwrap_err();

        assert_eq!(err, AdminError::unknown_role("Emperor"));
    }

    #[rstest]
    #[case::single_account(
        vec![view("root", Role::MotherAdmin, AccountStatus::Activated, Decimal::new(100, 0))],
        "username,role,status,balance\nroot,Mother Admin,Activated,100.0000\n"
    )]
    #[case::sorted_by_username(
        vec![
            view("zoe", Role::User, AccountStatus::Banned, Decimal::new(-5, 1)),
            view("adam", Role::SubAgent, AccountStatus::Deactivated, Decimal::ZERO),
        ],
        "username,role,status,balance\nadam,Sub Agent,Deactivated,0.0000\nzoe,User,Banned,-0.5000\n"
    )]
    #[case::no_accounts(vec![], "username,role,status,balance\n")]
    fn test_write_accounts_csv(#[case] accounts: Vec<AccountView>, #[case] expected: &str) {
        let mut output = Vec::new();

        write_accounts_csv(&accounts, &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), expected);
    }

    #[test]
    fn test_write_ledger_csv_oldest_first() {
        let snapshot = |username: &str| AccountSnapshot {
            id: Uuid::new_v4(),
            username: username.to_string(),
            role: Role::Agent,
        };
        let record = |id, direction| TransactionRecord {
            id,
            from: snapshot("root"),
            to: snapshot("agent"),
            amount: Decimal::new(25, 1),
            direction,
            created_at: Utc::now(),
        };
        let records = vec![record(2, Direction::Minus), record(1, Direction::Add)];
        let mut output = Vec::new();

        write_ledger_csv(&records, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "id,from,to,amount,type\n1,root,agent,2.5000,add\n2,root,agent,2.5000,minus\n"
        );
    }
}
