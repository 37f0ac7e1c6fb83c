//! Rooms. Occupancy is never stored here: a room is occupied exactly while an `allocated` row
//! references it.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Deserialize;

use crate::error::{HospitalError, HospitalResult};
use crate::schema::{allocated, room};

/// Room creation payload. Fields are optional so missing ones can be reported together.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewRoom {
    pub room_id: Option<String>,
    pub room_type: Option<String>,
    pub room_cost: Option<f64>,
}

#[derive(Insertable)]
#[diesel(table_name = room)]
struct RoomRow<'a> {
    room_id: &'a str,
    room_type: &'a str,
    room_cost: f64,
}

#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[serde(default)]
#[diesel(table_name = room)]
pub struct RoomChanges {
    pub room_type: Option<String>,
    pub room_cost: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomUpdate {
    pub room_id: String,
    #[serde(flatten)]
    pub changes: RoomChanges,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn create_room(conn: &mut SqliteConnection, new: &NewRoom) -> HospitalResult<String> {
    let (Some(room_id), Some(room_type), Some(room_cost)) =
        (non_blank(&new.room_id), non_blank(&new.room_type), new.room_cost)
    else {
        return Err(HospitalError::InvalidInput(
            "room_id, room_type, and room_cost are required".into(),
        ));
    };
    if !room_cost.is_finite() || room_cost < 0.0 {
        return Err(HospitalError::InvalidInput("room_cost must be a non-negative amount".into()));
    }

    diesel::insert_into(room::table)
        .values(&RoomRow {
            room_id,
            room_type,
            room_cost,
        })
        .execute(conn)?;
    tracing::info!(room_id, "room created");
    Ok(room_id.to_string())
}

pub fn update_room(conn: &mut SqliteConnection, update: &RoomUpdate) -> HospitalResult<()> {
    let changes = RoomChanges {
        room_type: non_blank(&update.changes.room_type).map(str::to_string),
        room_cost: update.changes.room_cost,
    };
    if changes.room_type.is_none() && changes.room_cost.is_none() {
        return Err(HospitalError::InvalidInput("no valid fields to update".into()));
    }
    if changes.room_cost.is_some_and(|c| !c.is_finite() || c < 0.0) {
        return Err(HospitalError::InvalidInput("room_cost must be a non-negative amount".into()));
    }

    let updated = diesel::update(room::table.find(&update.room_id))
        .set(&changes)
        .execute(conn)?;
    if updated == 0 {
        return Err(HospitalError::NotFound(format!("room {}", update.room_id)));
    }
    Ok(())
}

pub fn is_occupied(conn: &mut SqliteConnection, room_id: &str) -> HospitalResult<bool> {
    Ok(diesel::select(diesel::dsl::exists(
        allocated::table.filter(allocated::room_id.eq(room_id)),
    ))
    .get_result(conn)?)
}

/// Delete a room unless it is currently allocated to an admission.
pub fn delete_room(conn: &mut SqliteConnection, room_id: &str) -> HospitalResult<()> {
    conn.immediate_transaction::<_, HospitalError, _>(|conn| {
        if is_occupied(conn, room_id)? {
            return Err(HospitalError::Conflict(
                "Cannot delete room that is currently allocated. Please discharge patients first."
                    .into(),
            ));
        }
        let deleted = diesel::delete(room::table.find(room_id)).execute(conn)?;
        if deleted == 0 {
            return Err(HospitalError::NotFound(format!("room {room_id}")));
        }
        Ok(())
    })?;
    tracing::info!(room_id, "room deleted");
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::testing::temp_store;

    pub(crate) fn ward(room_id: &str, cost: f64) -> NewRoom {
        NewRoom {
            room_id: Some(room_id.into()),
            room_type: Some("General".into()),
            room_cost: Some(cost),
        }
    }

    #[test]
    fn missing_fields_are_a_validation_error() {
        let (_dir, store) = temp_store();
        let mut conn = store.conn().unwrap();

        let err = create_room(
            &mut conn,
            &NewRoom {
                room_cost: None,
                ..ward("R1", 0.0)
            },
        )
        .unwrap_err();
        assert!(matches!(err, HospitalError::InvalidInput(_)));

        let err = create_room(
            &mut conn,
            &NewRoom {
                room_id: Some(" ".into()),
                ..ward("R1", 10.0)
            },
        )
        .unwrap_err();
        assert!(matches!(err, HospitalError::InvalidInput(_)));
    }

    #[test]
    fn duplicate_room_id_conflicts() {
        let (_dir, store) = temp_store();
        let mut conn = store.conn().unwrap();
        create_room(&mut conn, &ward("R1", 120.0)).unwrap();
        assert!(matches!(
            create_room(&mut conn, &ward("R1", 80.0)),
            Err(HospitalError::Conflict(_))
        ));
    }

    #[test]
    fn update_changes_cost_only() {
        let (_dir, store) = temp_store();
        let mut conn = store.conn().unwrap();
        create_room(&mut conn, &ward("R1", 120.0)).unwrap();

        let update = RoomUpdate {
            room_id: "R1".into(),
            changes: RoomChanges {
                room_type: Some("".into()),
                room_cost: Some(150.0),
            },
        };
        update_room(&mut conn, &update).unwrap();
        let (kind, cost): (String, f64) = room::table
            .find("R1")
            .select((room::room_type, room::room_cost))
            .first(&mut conn)
            .unwrap();
        assert_eq!((kind.as_str(), cost), ("General", 150.0));
    }

    #[test]
    fn unallocated_room_can_be_deleted_once() {
        let (_dir, store) = temp_store();
        let mut conn = store.conn().unwrap();
        create_room(&mut conn, &ward("R2", 60.0)).unwrap();

        assert!(!is_occupied(&mut conn, "R2").unwrap());
        delete_room(&mut conn, "R2").unwrap();
        assert!(matches!(delete_room(&mut conn, "R2"), Err(HospitalError::NotFound(_))));
    }
}
