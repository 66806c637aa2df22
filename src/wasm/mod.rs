//! WASM bindings for the exam core

mod console;

use crate::layout::{HeightOracle, MeasureError, Measurements, TextMetricOracle};
use crate::{
    DisplayList, Error, Exam, ExamConfig, HeaderVariant, LayoutConfig, PaginationResult,
    Question, QuestionId, Unit, Variant,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    console::init(log::LevelFilter::Info);
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn js_error(error: Error) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Reply of the host's measure callback
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsMeasurements {
    unit_sub_heights: Vec<Vec<f32>>,
    #[serde(default)]
    first_page_header_height: f32,
    #[serde(default)]
    other_page_header_height: f32,
}

/// Height oracle backed by a JS function `(units, config) => measurements`
/// that renders into an off-screen surface
struct JsHeightOracle<'a> {
    measure_fn: &'a js_sys::Function,
}

impl HeightOracle for JsHeightOracle<'_> {
    fn measure(&self, units: &[Unit], config: &LayoutConfig) -> Result<Measurements, MeasureError> {
        let backend = |e: JsValue| {
            MeasureError::Backend(e.as_string().unwrap_or_else(|| "measure callback failed".into()))
        };
        let js_units = to_js(units).map_err(backend)?;
        let js_config = to_js(config).map_err(backend)?;

        let reply = self
            .measure_fn
            .call2(&JsValue::NULL, &js_units, &js_config)
            .map_err(backend)?;
        let reply: JsMeasurements = serde_wasm_bindgen::from_value(reply)
            .map_err(|e| MeasureError::Backend(e.to_string()))?;

        let measurements = Measurements::from_sub_heights(
            units,
            reply.unit_sub_heights,
            reply.first_page_header_height,
            reply.other_page_header_height,
            config,
        );
        measurements.validate(units)?;
        Ok(measurements)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaginateReply<'a> {
    #[serde(flatten)]
    result: &'a PaginationResult,
    page_count: usize,
    display_list: DisplayList,
}

/// WASM-exposed exam wrapper
#[wasm_bindgen]
pub struct WasmExam {
    exam: Exam,
    variants: Vec<Variant>,
}

#[wasm_bindgen]
impl WasmExam {
    /// Create an exam; `config` may be omitted for A4 two-column defaults
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmExam, JsValue> {
        let config: ExamConfig = if config.is_undefined() || config.is_null() {
            ExamConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        Ok(Self {
            exam: Exam::new(config),
            variants: vec![Variant::identity()],
        })
    }

    /// Replace the question list
    #[wasm_bindgen(js_name = setQuestions)]
    pub fn set_questions(&mut self, questions: JsValue) -> Result<(), JsValue> {
        let questions: Vec<Question> = serde_wasm_bindgen::from_value(questions)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.exam.set_questions(questions);
        self.variants.truncate(1);
        Ok(())
    }

    /// Choose the printed items of a set (1-based, in print order)
    #[wasm_bindgen(js_name = selectItems)]
    pub fn select_items(&mut self, set_id: &str, items: Vec<u32>) {
        let items = items.into_iter().map(|i| i as usize).collect();
        self.exam.select_items(QuestionId::new(set_id), items);
        self.variants.truncate(1);
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&mut self, set_id: &str) {
        self.exam.clear_selection(&QuestionId::new(set_id));
        self.variants.truncate(1);
    }

    /// Commit a spacer after a unit once the drag ends
    #[wasm_bindgen(js_name = commitSpacer)]
    pub fn commit_spacer(&mut self, unit_id: &str, height: f32) {
        self.exam.commit_spacer(QuestionId::new(unit_id), height);
    }

    /// Commit an image width once the resize ends
    #[wasm_bindgen(js_name = commitImageWidth)]
    pub fn commit_image_width(&mut self, src: &str, width: f32) {
        self.exam.commit_image_width(src, width);
    }

    #[wasm_bindgen(js_name = setColumns)]
    pub fn set_columns(&mut self, columns: u8) -> Result<(), JsValue> {
        self.exam.set_columns(columns).map_err(js_error)
    }

    /// `"full"`, `"compact"` or `"hidden"`
    #[wasm_bindgen(js_name = setHeader)]
    pub fn set_header(&mut self, header: &str) -> Result<(), JsValue> {
        let header: HeaderVariant =
            serde_json::from_value(serde_json::Value::String(header.to_string()))
                .map_err(|e| js_error(e.into()))?;
        self.exam.set_header(header);
        Ok(())
    }

    #[wasm_bindgen(js_name = setOptimizeLayout)]
    pub fn set_optimize_layout(&mut self, optimize: bool) {
        self.exam.set_optimize_layout(optimize);
    }

    /// Paginate with heights measured by the host
    pub fn paginate(
        &self,
        measure_fn: &js_sys::Function,
        variant_index: Option<u32>,
    ) -> Result<JsValue, JsValue> {
        self.paginate_with(&JsHeightOracle { measure_fn }, variant_index)
    }

    /// Paginate with headless text metrics
    #[wasm_bindgen(js_name = paginateHeadless)]
    pub fn paginate_headless(&self, variant_index: Option<u32>) -> Result<JsValue, JsValue> {
        self.paginate_with(&TextMetricOracle::default(), variant_index)
    }

    /// Generate variants and keep them for `paginate` and `answerKey`
    #[wasm_bindgen(js_name = variants)]
    pub fn generate_variants(&mut self, count: u32, user_id: Option<String>) -> Result<JsValue, JsValue> {
        self.variants = self.exam.variants(count, user_id.as_deref());
        to_js(&self.variants)
    }

    /// Answer sheet of a variant
    #[wasm_bindgen(js_name = answerKey)]
    pub fn answer_key(&self, variant_index: u32) -> Result<JsValue, JsValue> {
        let variant = self.variant(variant_index).map_err(js_error)?;
        let sheet = self.exam.answer_sheet(variant).map_err(js_error)?;
        to_js(&sheet)
    }

    #[wasm_bindgen(js_name = getUnits)]
    pub fn get_units(&self) -> Result<JsValue, JsValue> {
        to_js(self.exam.units())
    }

    #[wasm_bindgen(js_name = getVersion)]
    pub fn get_version(&self) -> f64 {
        self.exam.version() as f64
    }
}

impl WasmExam {
    fn variant(&self, index: u32) -> Result<&Variant, Error> {
        self.variants
            .iter()
            .find(|v| v.index == index)
            .ok_or(Error::UnknownVariant(index))
    }

    fn paginate_with(
        &self,
        oracle: &dyn HeightOracle,
        variant_index: Option<u32>,
    ) -> Result<JsValue, JsValue> {
        let variant = variant_index
            .map(|index| self.variant(index))
            .transpose()
            .map_err(js_error)?;
        let result = self.exam.paginate(oracle, variant).map_err(js_error)?;

        to_js(&PaginateReply {
            result: &result,
            page_count: result.page_count(),
            display_list: result.display_list(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_lookup() {
        let mut exam = WasmExam {
            exam: Exam::new(ExamConfig::default()),
            variants: vec![Variant::identity()],
        };
        assert!(exam.variant(1).is_ok());
        assert!(matches!(exam.variant(2), Err(Error::UnknownVariant(2))));

        exam.variants = exam.exam.variants(3, None);
        assert_eq!(exam.variant(3).map(|v| v.index).ok(), Some(3));
    }
}
