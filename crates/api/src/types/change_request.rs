//! Order change requests.

use chrono::{DateTime, Utc};
use printloom_core::{ChangeRequestId, ChangeRequestKind, ChangeRequestStatus, OrderId, UserId};
use serde::{Deserialize, Serialize};

use super::OrderCustomer;

/// A customer's request to modify or cancel an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderChangeRequest {
    pub id: ChangeRequestId,
    pub order_id: OrderId,
    pub user_id: UserId,
    #[serde(default)]
    pub user: Option<OrderCustomer>,
    #[serde(rename = "type", default)]
    pub kind: ChangeRequestKind,
    pub message: String,
    #[serde(default)]
    pub status: ChangeRequestStatus,
    #[serde(default)]
    pub admin_response: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// `POST /api/order-change-requests` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChangeRequest {
    pub order_id: OrderId,
    #[serde(rename = "type")]
    pub kind: ChangeRequestKind,
    pub message: String,
}

/// `PUT /api/order-change-requests/:id` body.
///
/// Only the decision is sent; what it implies for the order is up to the
/// backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequestResolution {
    pub status: ChangeRequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_response: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_type_field_is_renamed() {
        let request: OrderChangeRequest = serde_json::from_str(
            r#"{"id":3,"orderId":12,"userId":4,"type":"CANCEL","message":"Wrong size","status":"PENDING"}"#,
        )
        .unwrap();
        assert_eq!(request.kind, ChangeRequestKind::Cancel);
        assert!(request.admin_response.is_none());

        let body = serde_json::to_value(NewChangeRequest {
            order_id: OrderId::new(12),
            kind: ChangeRequestKind::Modify,
            message: "Use blue ink".to_string(),
        })
        .unwrap();
        assert_eq!(body["type"], "MODIFY");
        assert_eq!(body["orderId"], 12);
    }

    #[test]
    fn test_resolution_body() {
        let body = serde_json::to_value(ChangeRequestResolution {
            status: ChangeRequestStatus::Approved,
            admin_response: Some("Done".to_string()),
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"status": "APPROVED", "adminResponse": "Done"})
        );
    }
}
