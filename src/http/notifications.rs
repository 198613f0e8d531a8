//! Staff notification history replay.

use axum::extract::State;
use axum::Json;

use crate::auth::Staff;
use crate::http::AppState;
use crate::notify::StaffNotification;

/// Recent fulfilment notifications, oldest first, for newly connecting
/// staff displays to catch up before the live feed takes over.
pub async fn recent(State(state): State<AppState>, _staff: Staff) -> Json<Vec<StaffNotification>> {
    Json(state.notifier.recent())
}
