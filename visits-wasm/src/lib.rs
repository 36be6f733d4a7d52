//! Bridge WASM <-> JavaScript cho dashboard phòng khám.

use serde_wasm_bindgen::{from_value, to_value};
use visits_core::{ClassifierConfig, VisitRecord};
use wasm_bindgen::prelude::*;

/// Phân loại lượt khám và trả về `{ classified, monthly }`.
///
/// `config` có thể chỉ chứa một phần các trường; phần còn lại dùng mặc định.
#[wasm_bindgen(js_name = analyzeVisits)]
pub fn analyze_visits(records: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    init_panic_hook();

    let records = read_records(records)?;
    let cfg = read_config(config)?;
    let report = visits_engine::analyze_records(&records, &cfg);

    to_value(&report)
        .map_err(|err| JsValue::from_str(&format!("Không serialize báo cáo: {err}")))
}

/// Phân bố nhóm tuổi trên toàn bộ lượt khám.
#[wasm_bindgen(js_name = ageBandDistribution)]
pub fn age_band_distribution(
    records: JsValue,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    init_panic_hook();

    let records = read_records(records)?;
    let cfg = read_config(config)?;
    let bands = visits_engine::age_band_distribution(&records, &cfg);

    to_value(&bands)
        .map_err(|err| JsValue::from_str(&format!("Không serialize nhóm tuổi: {err}")))
}

/// Khóa cache cho bộ dữ liệu và cấu hình hiện tại.
#[wasm_bindgen(js_name = datasetFingerprint)]
pub fn dataset_fingerprint(records: JsValue, config: Option<JsValue>) -> Result<String, JsValue> {
    init_panic_hook();

    let records = read_records(records)?;
    let cfg = read_config(config)?;
    Ok(visits_engine::dataset_fingerprint(&records, &cfg))
}

fn init_panic_hook() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn read_records(records: JsValue) -> Result<Vec<VisitRecord>, JsValue> {
    let value = from_value::<serde_json::Value>(records).map_err(|err| {
        JsValue::from_str(&format!("Không đọc được danh sách lượt khám: {err}"))
    })?;
    visits_engine::records_from_value(&value).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn read_config(config: Option<JsValue>) -> Result<ClassifierConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => from_value(js_cfg)
            .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}"))),
        _ => Ok(ClassifierConfig::default()),
    }
}
