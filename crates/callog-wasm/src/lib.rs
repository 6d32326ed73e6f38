//! WASM bindings for callog-engine.
//!
//! Exposes conflict detection, recurrence expansion and project progress to
//! the browser client via `wasm-bindgen`. All complex types cross the
//! boundary as JSON strings.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p callog-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir web/src/wasm/ \
//!   target/wasm32-unknown-unknown/release/callog_wasm.wasm
//! ```

use callog_engine::expander::ExpansionOptions;
use callog_engine::ids::{IdSource, UuidIds};
use callog_engine::project::{monthly_stats, Project};
use callog_engine::schedule::{ScheduleId, ScheduleInstance, TimeSlot};
use callog_engine::time;
use callog_engine::validation::validate_schedule;
use callog_engine::wire::{
    CalendarEvent, ScheduleCreateRequest, ScheduleCreateResponse, ScheduleResponse,
};
use callog_engine::{detect_conflict, expand_with_options, CallogError};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Schedules arrive either as backend responses (`start`/`end`, plus
/// `recurrenceId`) or in engine form (`date`/`startTime`/`endTime` only).
/// Anything carrying `start`/`end` goes through the backend conversion.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScheduleInput {
    Response(ScheduleResponse),
    Instance(ScheduleInstance),
}

impl ScheduleInput {
    fn into_instance(self) -> Result<ScheduleInstance, CallogError> {
        match self {
            ScheduleInput::Instance(s) => Ok(s),
            ScheduleInput::Response(r) => ScheduleInstance::try_from(r),
        }
    }
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_schedules_json(json: &str) -> Result<Vec<ScheduleInstance>, JsValue> {
    let inputs: Vec<ScheduleInput> = serde_json::from_str(json)
        .map_err(|e| JsValue::from_str(&format!("Invalid schedules JSON: {}", e)))?;

    inputs
        .into_iter()
        .map(|input| input.into_instance().map_err(js_err))
        .collect()
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Check a candidate slot against existing schedules.
///
/// `candidate_json` is `{date, startTime, endTime}`; `existing_json` is an
/// array of schedules. Returns `{hasConflict, conflictingInstances,
/// errorKind}` as a JSON string.
#[wasm_bindgen(js_name = "detectConflict")]
pub fn detect_conflict_js(
    candidate_json: &str,
    existing_json: &str,
    exclude_id: Option<String>,
) -> Result<String, JsValue> {
    let candidate: TimeSlot = serde_json::from_str(candidate_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid candidate JSON: {}", e)))?;
    let existing = parse_schedules_json(existing_json)?;
    let exclude = exclude_id.map(ScheduleId::new);

    to_json(&detect_conflict(&candidate, &existing, exclude.as_ref()))
}

/// Expand a schedule create request (`POST /schedules` body, including its
/// `repeat` block) into concrete instances with fresh UUIDs.
///
/// Returns `{mainSchedule, schedules}` as a JSON string.
#[wasm_bindgen(js_name = "expandRecurrence")]
pub fn expand_recurrence(request_json: &str, safety_cap: Option<u32>) -> Result<String, JsValue> {
    let request: ScheduleCreateRequest = serde_json::from_str(request_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid request JSON: {}", e)))?;
    validate_schedule(&request.schedule).map_err(js_err)?;

    let options = safety_cap
        .map(ExpansionOptions::with_safety_cap)
        .unwrap_or_default();
    let rule = request.rule();
    let mut ids = UuidIds;
    let base = request.schedule.into_instance(ids.schedule_id());

    let instances = expand_with_options(&base, &rule, &options, &mut ids);
    let response = ScheduleCreateResponse::from_instances(&instances)
        .ok_or_else(|| JsValue::from_str("Expansion produced no schedules"))?;
    to_json(&response)
}

/// Project progress for one month. `project_json` is a single project.
#[wasm_bindgen(js_name = "monthlyStats")]
pub fn monthly_stats_js(
    project_json: &str,
    schedules_json: &str,
    year: i32,
    month: u32,
) -> Result<String, JsValue> {
    let project: Project = serde_json::from_str(project_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid project JSON: {}", e)))?;
    let schedules = parse_schedules_json(schedules_json)?;

    to_json(&monthly_stats(&project, &schedules, year, month))
}

/// Calendar display events (`start`/`end` as `YYYY-MM-DDTHH:MM`).
#[wasm_bindgen(js_name = "calendarEvents")]
pub fn calendar_events(schedules_json: &str) -> Result<String, JsValue> {
    let schedules = parse_schedules_json(schedules_json)?;
    let events: Vec<CalendarEvent> = schedules.iter().map(CalendarEvent::from).collect();
    to_json(&events)
}

/// `0 = Sunday` weekday index to ISO numbering (`7 = Sunday`).
#[wasm_bindgen(js_name = "jsToIsoWeekday")]
pub fn js_to_iso_weekday(day: u8) -> Result<u8, JsValue> {
    time::js_to_iso_weekday(day).map_err(js_err)
}

/// ISO weekday (`7 = Sunday`) to the `0 = Sunday` index.
#[wasm_bindgen(js_name = "isoToJsWeekday")]
pub fn iso_to_js_weekday(day: u8) -> Result<u8, JsValue> {
    time::iso_to_js_weekday(day).map_err(js_err)
}

/// `90` -> `"1h 30m"`.
#[wasm_bindgen(js_name = "formatDuration")]
pub fn format_duration(minutes: i32) -> String {
    time::format_duration(minutes as i64)
}
