use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// What happened to a request row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A change notification pushed to staff dashboards. Only the identity of
/// the row travels; subscribers fetch the record itself when they need it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RequestChange {
    pub kind: ChangeKind,
    pub id: Uuid,
    pub table_id: Uuid,
}

impl RequestChange {
    pub fn insert(id: Uuid, table_id: Uuid) -> Self {
        Self {
            kind: ChangeKind::Insert,
            id,
            table_id,
        }
    }

    pub fn update(id: Uuid, table_id: Uuid) -> Self {
        Self {
            kind: ChangeKind::Update,
            id,
            table_id,
        }
    }

    pub fn delete(id: Uuid, table_id: Uuid) -> Self {
        Self {
            kind: ChangeKind::Delete,
            id,
            table_id,
        }
    }
}

impl Display for RequestChange {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let kind = match self.kind {
            ChangeKind::Insert => "INSERT",
            ChangeKind::Update => "UPDATE",
            ChangeKind::Delete => "DELETE",
        };
        write!(f, "{kind} request {} (table {})", self.id, self.table_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_json_shape() {
        let id = Uuid::new_v4();
        let table_id = Uuid::new_v4();
        let json = serde_json::to_value(RequestChange::delete(id, table_id)).unwrap();

        assert_eq!(json["kind"], "DELETE");
        assert_eq!(json["id"], id.to_string());
        assert_eq!(json["table_id"], table_id.to_string());

        let parsed: RequestChange = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.kind, ChangeKind::Delete);
    }
}
