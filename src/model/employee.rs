//! Employee resource.

use super::{Audit, Column, Model, AUDIT_COLUMNS};
use crate::validation::{self, FieldType, Rule, Rules};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobTitle {
    Manager,
    Supervisor,
    Accountant,
    Storekeeper,
    Receptionist,
    Housekeeper,
    Laundry,
    Chef,
    Waiter,
    Cleaner,
    Security,
    Maintenance,
    It,
    System,
    Unknown,
}

impl JobTitle {
    pub const ALL: [JobTitle; 15] = [
        JobTitle::Manager,
        JobTitle::Supervisor,
        JobTitle::Accountant,
        JobTitle::Storekeeper,
        JobTitle::Receptionist,
        JobTitle::Housekeeper,
        JobTitle::Laundry,
        JobTitle::Chef,
        JobTitle::Waiter,
        JobTitle::Cleaner,
        JobTitle::Security,
        JobTitle::Maintenance,
        JobTitle::It,
        JobTitle::System,
        JobTitle::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobTitle::Manager => "manager",
            JobTitle::Supervisor => "supervisor",
            JobTitle::Accountant => "accountant",
            JobTitle::Storekeeper => "storekeeper",
            JobTitle::Receptionist => "receptionist",
            JobTitle::Housekeeper => "housekeeper",
            JobTitle::Laundry => "laundry",
            JobTitle::Chef => "chef",
            JobTitle::Waiter => "waiter",
            JobTitle::Cleaner => "cleaner",
            JobTitle::Security => "security",
            JobTitle::Maintenance => "maintenance",
            JobTitle::It => "it",
            JobTitle::System => "system",
            JobTitle::Unknown => "unknown",
        }
    }
}

const COLUMNS: [Column; 14] = [
    Column::new("id", "id", "uuid"),
    Column::new("firstName", "first_name", "text"),
    Column::new("lastName", "last_name", "text"),
    Column::new("middleName", "middle_name", "text"),
    Column::new("email", "email", "text"),
    Column::new("phone", "phone", "text"),
    Column::new("address", "address", "text"),
    Column::new("jobTitle", "job_title", "text"),
    AUDIT_COLUMNS[0],
    AUDIT_COLUMNS[1],
    AUDIT_COLUMNS[2],
    AUDIT_COLUMNS[3],
    AUDIT_COLUMNS[4],
    AUDIT_COLUMNS[5],
];

/// Employee as sent by the client. Values stay raw JSON so the validator can
/// report exactly what was sent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Employee {
    pub id: Option<Value>,
    pub first_name: Option<Value>,
    pub last_name: Option<Value>,
    pub middle_name: Option<Value>,
    pub email: Option<Value>,
    pub phone: Option<Value>,
    pub address: Option<Value>,
    pub job_title: Option<Value>,
    pub audit: Audit,
}

impl Model for Employee {
    const TABLE: &'static str = "employees";
    const NAME: &'static str = "employees";

    fn columns() -> &'static [Column] {
        &COLUMNS
    }

    fn from_request(body: &Map<String, Value>) -> Self {
        let take = |key: &str| body.get(key).cloned();
        Employee {
            id: None,
            first_name: take("firstName"),
            last_name: take("lastName"),
            middle_name: take("middleName"),
            email: take("email"),
            phone: take("phone"),
            address: take("address"),
            job_title: take("jobTitle"),
            audit: Audit::default(),
        }
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn rules(&self) -> Rules {
        let text = || Rule::new().of_type(FieldType::String);
        let mut rules = Rules::new()
            .field("firstName", text().min_len(2).max_len(255))
            .field("lastName", text().min_len(2).max_len(255))
            .field("middleName", text().optional().max_len(255))
            .field("email", text().optional().max_len(255))
            .field("phone", text().min_len(9).max_len(15).custom(validation::phone_number))
            .field("address", text().min_len(10).max_len(255))
            .field("jobTitle", Rule::new().one_of(JobTitle::ALL.iter().map(|t| t.as_str())));
        rules.extend(Self::default_rules());
        rules
    }

    fn all_fields(&self) -> Map<String, Value> {
        let mut out = Map::new();
        let fields = [
            ("id", &self.id),
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("middleName", &self.middle_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("jobTitle", &self.job_title),
        ];
        for (field, value) in fields {
            if let Some(v) = value {
                out.insert(field.to_string(), v.clone());
            }
        }
        self.audit.write_fields(&mut out);
        out
    }

    fn insert_exclude_fields(&self) -> &'static [&'static str] {
        &["id", "updatedAt", "deletedAt", "updatedBy", "deletedBy"]
    }

    fn update_exclude_fields(&self) -> &'static [&'static str] {
        &["id", "createdAt", "deletedAt", "createdBy", "deletedBy"]
    }
}
