use camino::Utf8PathBuf;
use simtoc::config::GeneratorConfig;
use simtoc::convert::{convert_path, convert_upload};
use simtoc::error::{ConvertError, ImportError};
use std::io::{Cursor, Write};

fn zip_bytes(members: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in members {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn leftover_uploads() -> usize {
    std::fs::read_dir(std::env::temp_dir())
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.file_name().to_string_lossy().starts_with("simtoc-"))
                .count()
        })
        .unwrap_or(0)
}

const MDL: &str = r#"
Model {
  System {
    Block {
      BlockType Step
      Name "u"
      Position [10, 20, 30, 40]
    }
    Block {
      BlockType Outport
      Name "y"
    }
    Line {
      SrcBlock "u"
      DstBlock "y"
    }
  }
}
"#;

// Every upload scenario lives in one test so the temp-dir census is not
// disturbed by uploads running in parallel.
#[test]
fn uploads_are_converted_and_always_removed() {
    let before = leftover_uploads();
    let config = GeneratorConfig::default();

    let ok = convert_upload("model.mdl", MDL.as_bytes(), &config).unwrap();
    assert!(ok.success);
    assert_eq!(ok.block_count, 2);
    assert_eq!(ok.connection_count, 1);
    assert!(ok.c_code.contains("void model_step(Signal* out_y)"));
    assert_eq!(leftover_uploads(), before);

    let err = convert_upload("broken.slx", b"PK but not really", &config).unwrap_err();
    assert!(matches!(err, ConvertError::Import(ImportError::Archive { .. })));
    assert!(!err.is_client_error());
    assert_eq!(leftover_uploads(), before);

    let demo = zip_bytes(&[("metadata/coreProperties.xml", "<coreProperties/>")]);
    let fallback = convert_upload("Empty.SLX", &demo, &config).unwrap();
    assert_eq!(fallback.block_count, 4);
    assert_eq!(fallback.connection_count, 3);
    assert!(fallback.c_code.contains("void model_step(Signal in_Input, Signal* out_Output)"));
    assert_eq!(leftover_uploads(), before);

    let err = convert_upload("whitespace.mdl", b"   \n", &config).unwrap_err();
    assert!(matches!(err, ConvertError::Import(ImportError::Empty { .. })));
    assert_eq!(leftover_uploads(), before);
}

#[test]
fn rejects_bad_requests_before_touching_disk() {
    let config = GeneratorConfig::default();

    let err = convert_upload("", b"data", &config).unwrap_err();
    assert!(err.is_client_error());
    assert_eq!(err.to_string(), "Empty filename");

    let err = convert_upload("diagram.png", b"\x89PNG", &config).unwrap_err();
    assert!(err.is_client_error());
    assert_eq!(err.to_string(), "Unsupported file type: .png");

    let err = convert_upload("model.mdl", b"", &config).unwrap_err();
    assert!(err.is_client_error());
}

#[test]
fn conversion_serializes_to_the_service_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join("chain.mdl")).unwrap();
    std::fs::write(&path, MDL).unwrap();

    let conversion = convert_path(&path, &GeneratorConfig::default()).unwrap();
    let json = serde_json::to_value(&conversion).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["block_count"], 2);
    assert_eq!(json["connection_count"], 1);
    assert_eq!(json["diagram"]["blocks"][0]["id"], "1");
    assert_eq!(json["diagram"]["blocks"][0]["type"], "Step");
    assert_eq!(json["diagram"]["blocks"][0]["name"], "u");
    assert_eq!(json["diagram"]["blocks"][0]["x"], 10.0);
    assert_eq!(json["diagram"]["blocks"][0]["y"], 20.0);
    assert_eq!(json["diagram"]["connections"][0]["from"], "1");
    assert_eq!(json["diagram"]["connections"][0]["to"], "2");
    assert!(json["c_code"].as_str().unwrap().starts_with("/* ===="));
}

#[test]
fn reported_connections_match_the_generated_program() {
    let xml = r#"<System>
  <Block BlockType="Constant" Name="c"/>
  <Block BlockType="Scope" Name="s"/>
  <Line Src="1" Dst="2"/>
  <Line Src="1" Dst="2"/>
  <Line Src="2" Dst="2"/>
  <Line Src="1" Dst="9"/>
</System>"#;
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join("messy.slx")).unwrap();
    std::fs::write(&path, zip_bytes(&[("simulink/blockdiagram.xml", xml)])).unwrap();

    let conversion = convert_path(&path, &GeneratorConfig::default()).unwrap();
    assert_eq!(conversion.block_count, 2);
    assert_eq!(conversion.connection_count, 1);
    assert_eq!(conversion.diagram.connections.len(), 1);
    assert!(conversion.c_code.contains("Blocks: 2  Connections: 1"));
}

#[test]
fn error_messages_do_not_repeat_their_cause() {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join("broken.slx")).unwrap();
    std::fs::write(&path, b"not a zip").unwrap();
    let err = convert_path(&path, &GeneratorConfig::default()).unwrap_err();
    let cause = std::error::Error::source(&err)
        .expect("archive error has a cause")
        .to_string();
    assert!(!err.to_string().contains(&cause));

    let chain = format!("{:#}", anyhow::Error::from(err));
    assert_eq!(chain.matches(&cause).count(), 1, "{chain}");
}
