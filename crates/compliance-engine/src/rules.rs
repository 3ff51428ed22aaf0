//! Room rules: every room needs at least one door and the minimum area

use shared_types::{BlockInstance, Room, RoomResult};

use crate::config::CheckConfig;
use crate::containment::{contains, Tolerance};
use crate::patterns::matches_any;

pub const NOTE_PASSED: &str = "OK: has a door and sufficient area";
pub const NOTE_NO_DOOR: &str = "No door found";

/// True if the block name or its layer carries a door keyword
pub fn is_door(instance: &BlockInstance, config: &CheckConfig) -> bool {
    matches_any(&instance.name, &config.door_name_keywords)
        || matches_any(&instance.layer, &config.door_layer_keywords)
}

/// Door instances with at least one test point contained in the room
pub fn count_doors_in_room(room: &Room, doors: &[&BlockInstance], tolerance: Tolerance) -> usize {
    doors
        .iter()
        .filter(|door| {
            door.test_points
                .iter()
                .any(|p| contains(*p, &room.polygon, tolerance))
        })
        .count()
}

/// Apply both rules to one room
///
/// The area comparison uses the unrounded area; the result carries it
/// rounded to 3 decimals.
pub fn evaluate_room(room: &Room, doors: &[&BlockInstance], config: &CheckConfig) -> RoomResult {
    let tolerance = Tolerance {
        eps: config.eps,
        edge_eps: config.edge_eps,
    };
    let doors_count = count_doors_in_room(room, doors, tolerance);
    let has_door = doors_count >= 1;
    let area_ok = room.area >= config.min_area_m2;

    RoomResult {
        room_index: room.index,
        layer: room.layer.clone(),
        area_m2: crate::round3(room.area),
        doors_count,
        passed: has_door && area_ok,
        notes: room_notes(has_door, area_ok, room.area, config.min_area_m2),
        outline: room.polygon.clone(),
    }
}

/// Human-readable verdict, failures joined with "; "
pub fn room_notes(has_door: bool, area_ok: bool, area: f64, min_area: f64) -> String {
    if has_door && area_ok {
        return NOTE_PASSED.to_string();
    }
    let mut notes = Vec::new();
    if !has_door {
        notes.push(NOTE_NO_DOOR.to_string());
    }
    if !area_ok {
        // Threshold printed at its shortest exact form: 2.0, 2.25
        notes.push(format!("Area below {:?} m² (area={:.3})", min_area, area));
    }
    notes.join("; ")
}
