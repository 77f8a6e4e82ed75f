use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(CustomerId);
id_newtype!(SowId);
id_newtype!(ProjectId);
id_newtype!(EmployeeId);
id_newtype!(ComplianceId);
id_newtype!(CandidateId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Customers,
    Sows,
    Projects,
    Employees,
    Compliances,
    Candidates,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Customers,
        EntityKind::Sows,
        EntityKind::Projects,
        EntityKind::Employees,
        EntityKind::Compliances,
        EntityKind::Candidates,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Customers => "Customers",
            EntityKind::Sows => "Statements of Work",
            EntityKind::Projects => "Projects",
            EntityKind::Employees => "Employees",
            EntityKind::Compliances => "Compliances",
            EntityKind::Candidates => "Recruitment",
        }
    }
}
