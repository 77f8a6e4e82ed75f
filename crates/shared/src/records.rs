use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    columns::{Column, Projection},
    domain::{CandidateId, ComplianceId, CustomerId, EmployeeId, ProjectId, SowId},
};

// Records mirror what the backend returns for each list/detail endpoint.
// Statuses and stages stay plain strings: the backend owns the vocabulary
// and the console passes the values through unmodified.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementOfWork {
    pub id: SowId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub title: String,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub value: f64,
    pub currency: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub sow_id: SowId,
    pub customer_name: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub email_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub date_of_joining: NaiveDate,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceItem {
    pub id: ComplianceId,
    pub name: String,
    pub authority: String,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub email_id: String,
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub applied_on: NaiveDate,
    pub stage: String,
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

impl Projection for Customer {
    const COLUMNS: &'static [Column] = &[
        Column::new("name", "Name"),
        Column::new("contact_name", "Contact"),
        Column::new("email_id", "Email"),
        Column::new("phone", "Phone"),
        Column::new("city", "City"),
        Column::new("status", "Status"),
    ];

    fn id(&self) -> i64 {
        self.id.0
    }

    fn cell(&self, key: &str) -> String {
        match key {
            "name" => self.name.clone(),
            "contact_name" => opt(&self.contact_name),
            "email_id" => opt(&self.email_id),
            "phone" => opt(&self.phone),
            "city" => opt(&self.city),
            "status" => self.status.clone(),
            _ => String::new(),
        }
    }
}

impl Projection for StatementOfWork {
    const COLUMNS: &'static [Column] = &[
        Column::new("title", "Title"),
        Column::new("customer_name", "Customer"),
        Column::new("start_date", "Start"),
        Column::new("end_date", "End"),
        Column::new("value", "Value"),
        Column::new("status", "Status"),
    ];

    fn id(&self) -> i64 {
        self.id.0
    }

    fn cell(&self, key: &str) -> String {
        match key {
            "title" => self.title.clone(),
            "customer_name" => self.customer_name.clone(),
            "start_date" => self.start_date.to_string(),
            "end_date" => self
                .end_date
                .map(|date| date.to_string())
                .unwrap_or_default(),
            "value" => format!("{} {:.2}", self.currency, self.value),
            "status" => self.status.clone(),
            _ => String::new(),
        }
    }
}

impl Projection for Project {
    const COLUMNS: &'static [Column] = &[
        Column::new("name", "Project"),
        Column::new("customer_name", "Customer"),
        Column::new("lead", "Lead"),
        Column::new("status", "Status"),
    ];

    fn id(&self) -> i64 {
        self.id.0
    }

    fn cell(&self, key: &str) -> String {
        match key {
            "name" => self.name.clone(),
            "customer_name" => self.customer_name.clone(),
            "lead" => opt(&self.lead),
            "status" => self.status.clone(),
            _ => String::new(),
        }
    }
}

impl Projection for Employee {
    const COLUMNS: &'static [Column] = &[
        Column::new("name", "Name"),
        Column::new("email_id", "Email"),
        Column::new("designation", "Designation"),
        Column::new("department", "Department"),
        Column::new("date_of_joining", "Joined"),
        Column::new("status", "Status"),
    ];

    fn id(&self) -> i64 {
        self.id.0
    }

    fn cell(&self, key: &str) -> String {
        match key {
            "name" => self.name.clone(),
            "email_id" => self.email_id.clone(),
            "designation" => opt(&self.designation),
            "department" => opt(&self.department),
            "date_of_joining" => self.date_of_joining.to_string(),
            "status" => self.status.clone(),
            _ => String::new(),
        }
    }
}

impl Projection for ComplianceItem {
    const COLUMNS: &'static [Column] = &[
        Column::new("name", "Requirement"),
        Column::new("authority", "Authority"),
        Column::new("due_date", "Due"),
        Column::new("owner", "Owner"),
        Column::new("status", "Status"),
    ];

    fn id(&self) -> i64 {
        self.id.0
    }

    fn cell(&self, key: &str) -> String {
        match key {
            "name" => self.name.clone(),
            "authority" => self.authority.clone(),
            "due_date" => self.due_date.to_string(),
            "owner" => opt(&self.owner),
            "status" => self.status.clone(),
            _ => String::new(),
        }
    }
}

impl Projection for Candidate {
    const COLUMNS: &'static [Column] = &[
        Column::new("name", "Name"),
        Column::new("email_id", "Email"),
        Column::new("position", "Position"),
        Column::new("source", "Source"),
        Column::new("applied_on", "Applied"),
        Column::new("stage", "Stage"),
    ];

    fn id(&self) -> i64 {
        self.id.0
    }

    fn cell(&self, key: &str) -> String {
        match key {
            "name" => self.name.clone(),
            "email_id" => self.email_id.clone(),
            "position" => self.position.clone(),
            "source" => opt(&self.source),
            "applied_on" => self.applied_on.to_string(),
            "stage" => self.stage.clone(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_customer_with_missing_optional_fields() {
        let raw = r#"{"id": 7, "name": "Acme Consulting", "status": "Active"}"#;
        let customer: Customer = serde_json::from_str(raw).expect("customer");
        assert_eq!(customer.id, CustomerId(7));
        assert_eq!(customer.name, "Acme Consulting");
        assert_eq!(customer.email_id, None);
        assert_eq!(customer.status, "Active");
    }

    #[test]
    fn decodes_compliance_due_date() {
        let raw = r#"{
            "id": 3,
            "name": "GST filing",
            "authority": "Tax office",
            "due_date": "2026-09-30",
            "status": "Open"
        }"#;
        let item: ComplianceItem = serde_json::from_str(raw).expect("compliance item");
        assert_eq!(item.due_date.to_string(), "2026-09-30");
        assert_eq!(item.cell("owner"), "");
    }
}
