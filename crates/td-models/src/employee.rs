//! Employee model
//!
//! Table: employees. Employees are plain CRUD records; they do not own
//! attachments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use td_core::time::flexible;
use td_core::RecordId;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(with = "flexible")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmployeeDraft {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validated_when_present() {
        let good: EmployeeDraft =
            serde_json::from_str(r#"{"name": "Dana", "email": "dana@example.com"}"#).unwrap();
        assert!(good.validate().is_ok());

        let bad: EmployeeDraft =
            serde_json::from_str(r#"{"name": "Dana", "email": "not-an-email"}"#).unwrap();
        assert!(bad.validate().is_err());
    }
}
