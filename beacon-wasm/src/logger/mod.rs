use wasm_bindgen::JsValue;
use web_sys::console;

pub struct Logger;

impl Logger {
    pub fn info(msg: &str) {
        console::log_1(&format!("[beacon] {}", msg).into());
    }

    pub fn warn(msg: &str) {
        console::warn_1(&format!("[beacon] {}", msg).into());
    }

    pub fn error(context: &str, err: &JsValue) {
        console::error_2(&format!("[beacon] {}", context).into(), err);
    }

    pub fn debug(msg: &str) {
        console::debug_1(&format!("[beacon] {}", msg).into());
    }
}
