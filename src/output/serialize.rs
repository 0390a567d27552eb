//
//  schematics-cli
//  output/serialize.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! JSON and YAML rendering for `--json` and `--yaml`.

use std::io::Write;

use serde::Serialize;

use super::OutputFormat;

pub fn write_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    write_json_to(&mut std::io::stdout().lock(), value)
}

pub fn write_json_to<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

pub fn write_yaml<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    write_yaml_to(&mut std::io::stdout().lock(), value)
}

pub fn write_yaml_to<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(value)?;
    writer.write_all(yaml.as_bytes())?;
    Ok(())
}

/// Writes `value` as JSON or YAML. Table format is written as JSON.
pub fn write_structured<T: Serialize + ?Sized>(format: OutputFormat, value: &T) -> anyhow::Result<()> {
    match format {
        OutputFormat::Yaml => write_yaml(value),
        OutputFormat::Json | OutputFormat::Table => write_json(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        id: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<&'static str>,
    }

    #[test]
    fn test_json_skips_unset_fields() {
        let mut buf = Vec::new();
        write_json_to(&mut buf, &Row { id: "ws-1", name: None }).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "{\n  \"id\": \"ws-1\"\n}\n");
    }

    #[test]
    fn test_yaml_output() {
        let mut buf = Vec::new();
        write_yaml_to(&mut buf, &[Row { id: "job-1", name: Some("apply") }]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("- id: job-1"));
        assert!(text.contains("name: apply"));
    }
}
