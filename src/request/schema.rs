use jsonschema::JSONSchema;
use serde_json::Value;

/// included parameter file schema
static SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/schemas/qadapter.json"));

/// Compile the bundled schema
///
/// The schema ships inside the binary, so failing to parse or compile it is a packaging defect
/// and not something a caller can recover from.
pub fn load_schema() -> JSONSchema {
    let schema_json: Value = serde_json::from_str(SCHEMA).expect("Valid bundled JSON");
    compile_schema(&schema_json)
}

fn compile_schema(schema: &Value) -> JSONSchema {
    JSONSchema::options()
        .compile(schema)
        .expect("Valid schema")
}
