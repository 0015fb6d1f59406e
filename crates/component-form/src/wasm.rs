//! Browser bindings. Each export forwards to the native function of the same
//! name so the public form and the submission endpoint evaluate rules with one
//! implementation.

use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

#[wasm_bindgen(js_name = "visibleFields")]
pub fn visible_fields(form_id: &str, config_json: &str, responses_json: &str) -> String {
    crate::visible_fields(form_id, config_json, responses_json)
}

#[wasm_bindgen(js_name = "checkForm")]
pub fn check_form(form_id: &str, config_json: &str) -> String {
    crate::check_form(form_id, config_json)
}

#[wasm_bindgen(js_name = "checkFieldRule")]
pub fn check_field_rule(form_id: &str, config_json: &str, field_json: &str) -> String {
    crate::check_field_rule(form_id, config_json, field_json)
}

#[wasm_bindgen(js_name = "triggerCandidates")]
pub fn trigger_candidates(form_id: &str, config_json: &str, field_id: &str) -> String {
    crate::trigger_candidates(form_id, config_json, field_id)
}

#[wasm_bindgen(js_name = "renderForm")]
pub fn render_form(form_id: &str, config_json: &str, responses_json: &str) -> String {
    crate::render_json_ui(form_id, config_json, responses_json)
}

#[wasm_bindgen(js_name = "filterResponses")]
pub fn filter_responses(form_id: &str, config_json: &str, responses_json: &str) -> String {
    crate::filter_responses(form_id, config_json, responses_json)
}

#[wasm_bindgen(js_name = "withResponse")]
pub fn with_response(responses_json: &str, field_id: &str, value_json: &str) -> String {
    crate::with_response(responses_json, field_id, value_json)
}
