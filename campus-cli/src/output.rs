use campus_sync::{DynamicRecord, ResourceKind};
use serde_json::Value;
use tabled::builder::Builder;

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) if s.is_empty() => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Render rows with the resource's list columns.
pub fn table(kind: ResourceKind, rows: &[DynamicRecord]) -> String {
    let columns = kind.columns();
    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.to_uppercase()));
    for row in rows {
        builder.push_record(columns.iter().map(|c| cell(row.get(c))));
    }
    builder.build().to_string()
}

/// Render every known resource with its endpoint and toggle field.
pub fn resources() -> String {
    let mut builder = Builder::default();
    builder.push_record(["NAME", "PATH", "TOGGLE"].map(String::from));
    for kind in ResourceKind::ALL {
        builder.push_record([
            kind.name().to_string(),
            kind.path().to_string(),
            kind.toggle_field().unwrap_or("-").to_string(),
        ]);
    }
    builder.build().to_string()
}
