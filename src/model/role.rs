use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Employee = 1,
    Manager = 2,
    Admin = 3,
}

impl Role {
    /// Numeric role ids used by the `roles` lookup table.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Employee),
            2 => Some(Role::Manager),
            3 => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn can_decide_leave(self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }
}
