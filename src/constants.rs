/// Web host wiring constants.
///
/// Element ids are provided by the hosting page; nothing here creates DOM
/// other than the offscreen canvas that backs the XR layer.
// Page elements
pub const ENTER_AR_BUTTON_ID: &str = "enter-ar";
pub const STATUS_ELEMENT_ID: &str = "ar-status";
pub const CONFIG_SCRIPT_ID: &str = "spiral-config";

// Query parameter overriding the placement strategy
pub const PLACEMENT_QUERY_KEY: &str = "placement";

// WebXR session features
pub const XR_REQUIRED_FEATURES: &[&str] = &["local"];
pub const XR_OPTIONAL_FEATURES: &[&str] = &["hit-test", "dom-overlay"];

// Milliseconds -> seconds for XR frame timestamps
pub const MS_TO_SEC: f64 = 0.001;

// Offscreen canvas backing the XR layer
pub const CANVAS_ID: &str = "xr-canvas";

// Near/far planes handed to the XR render state
pub const DEPTH_NEAR: f64 = 0.01;
pub const DEPTH_FAR: f64 = 20.0;

