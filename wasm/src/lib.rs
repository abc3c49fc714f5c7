use wasm_bindgen::prelude::*;
use wifi_dsss_core::stream::packet_stream;
use wifi_dsss_core::{checked_chip_count, ChipMapper, ChipMapperConfig, Rate, StreamRunner};

fn to_js(e: impl ToString) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct WasmChipMapper {
    inner: ChipMapper,
    runner: StreamRunner,
}

#[wasm_bindgen]
impl WasmChipMapper {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmChipMapper, JsValue> {
        ChipMapper::new(ChipMapperConfig::default())
            .map(|mapper| WasmChipMapper {
                inner: mapper,
                runner: StreamRunner::default(),
            })
            .map_err(to_js)
    }

    /// Encode one PPDU into chips
    /// Takes the rate selector (0-6) and a Uint8Array, returns a Float32Array
    /// of interleaved I/Q chips
    #[wasm_bindgen]
    pub fn encode(&mut self, rate: u8, ppdu: &[u8]) -> Result<Vec<f32>, JsValue> {
        let rate = Rate::try_from(rate).map_err(to_js)?;
        if ppdu.is_empty() {
            return Err(JsValue::from_str("PPDU must not be empty"));
        }

        let (bytes, tags) = packet_stream(&[(rate, ppdu)], &self.inner.config().length_tag_key);
        let output = self
            .runner
            .run(&mut self.inner, &bytes, &tags)
            .map_err(to_js)?;

        Ok(output
            .items
            .iter()
            .flat_map(|chip| [chip.re, chip.im])
            .collect())
    }

    /// Chips emitted so far by this mapper
    #[wasm_bindgen(getter)]
    pub fn chips_written(&self) -> f64 {
        self.inner.nitems_written() as f64
    }
}

/// Chips produced for a PPDU of `bytes` bytes at rate selector `rate`
#[wasm_bindgen]
pub fn expected_chips(rate: u8, bytes: usize) -> Result<usize, JsValue> {
    let rate = Rate::try_from(rate).map_err(to_js)?;
    checked_chip_count(rate, bytes).ok_or_else(|| JsValue::from_str("Packet too large"))
}

/// Display name of a rate selector
#[wasm_bindgen]
pub fn rate_name(rate: u8) -> Result<String, JsValue> {
    Rate::try_from(rate).map(|r| r.to_string()).map_err(to_js)
}
