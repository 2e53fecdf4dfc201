use camino::Utf8PathBuf;
use simtoc::error::ImportError;
use simtoc::parser::{Importer, SourceFormat, import_text_file, normalize_block_type, parse_text};

const NESTED: &str = r#"
Model {
  Name "nested"
  BlockParameterDefaults {
    Block {
      BlockType Gain
      Gain "1"
    }
  }
  System {
    Name "nested"
    Block {
      BlockType Inport
      Name "u"
      Position [15, 25, 45, 40]
    }
    Block {
      BlockType SubSystem
      Name "Sub"
      System {
        Block {
          BlockType "Transfer Fcn"
          Name "Plant"
          Denominator "[1 2]"
        }
      }
    }
    Block {
      BlockType Scope
      Name "scope"
    }
    Line {
      SrcBlock "u"
      SrcPort 1
      DstBlock "Sub"
      DstPort 1
    }
    Line {
      SrcBlock "Sub"
      SrcPort 1
      Branch {
        DstBlock "scope"
        DstPort 1
      }
      Branch {
        DstBlock "Plant"
        DstPort 1
      }
    }
  }
}
"#;

#[test]
fn flattens_nested_blocks_in_textual_order() {
    let model = parse_text(NESTED);
    let summary: Vec<(&str, &str, &str)> = model
        .blocks
        .iter()
        .map(|b| (b.id.as_str(), b.block_type.as_str(), b.name.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("1", "Inport", "u"),
            ("2", "SubSystem", "Sub"),
            ("3", "TransferFcn", "Plant"),
            ("4", "Scope", "scope"),
        ]
    );
    assert_eq!((model.blocks[0].x, model.blocks[0].y), (15.0, 25.0));
    assert_eq!(model.blocks[2].param("Denominator"), Some("[1 2]"));
    // Header keys are not parameters, and nested content never leaks.
    assert!(model.blocks[0].param("Name").is_none());
    assert!(model.blocks[1].params.is_empty());
}

#[test]
fn branches_fan_out_from_the_line_source() {
    let model = parse_text(NESTED);
    let pairs: Vec<(&str, &str)> = model
        .connections
        .iter()
        .map(|c| (c.from.as_str(), c.to.as_str()))
        .collect();
    assert_eq!(pairs, vec![("1", "2"), ("2", "4"), ("2", "3")]);
}

#[test]
fn unresolved_duplicate_and_self_connections_are_dropped() {
    let text = r#"
System {
  Block {
    BlockType Gain
    Name "a"
  }
  Block {
    BlockType Gain
    Name "b"
  }
  Line {
    SrcBlock "a"
    DstBlock "ghost"
  }
  Line {
    SrcBlock "a"
    DstBlock "b"
  }
  Line {
    SrcBlock "a"
    DstBlock "b"
  }
  Line {
    SrcBlock "b"
    DstBlock "b"
  }
}
"#;
    let model = parse_text(text);
    assert_eq!(model.connections.len(), 1);
    assert_eq!(model.connections[0].from, "1");
    assert_eq!(model.connections[0].to, "2");
}

#[test]
fn last_declared_name_wins() {
    let text = r#"
Block {
  BlockType Constant
  Name "dup"
}
Block {
  BlockType Gain
  Name "dup"
}
Block {
  BlockType Scope
  Name "s"
}
Line {
  SrcBlock "dup"
  DstBlock "s"
}
"#;
    let model = parse_text(text);
    assert_eq!(model.blocks.len(), 3);
    assert_eq!(model.connections.len(), 1);
    assert_eq!(model.connections[0].from, "2");
    assert_eq!(model.connections[0].to, "3");
}

#[test]
fn blocks_without_type_are_skipped() {
    let text = "Block {\n  Name \"orphan\"\n}\nBlock {\n  BlockType Abs\n}\n";
    let model = parse_text(text);
    assert_eq!(model.blocks.len(), 1);
    assert_eq!(model.blocks[0].id, "1");
    assert_eq!(model.blocks[0].name, "Block_1");
}

#[test]
fn sum_signs_keep_their_text() {
    let text = "Block {\n  BlockType Sum\n  Name \"err\"\n  Inputs \"+-+\"\n}\n";
    let model = parse_text(text);
    assert_eq!(model.blocks[0].param("Inputs"), Some("+-+"));
}

#[test]
fn alias_spellings_are_normalized() {
    assert_eq!(normalize_block_type("S-Function"), "SFunction");
    assert_eq!(normalize_block_type("Zero-Order Hold"), "ZeroOrderHold");
    assert_eq!(normalize_block_type(" PID Controller "), "PIDController");
    assert_eq!(normalize_block_type("Gain"), "Gain");
    assert_eq!(normalize_block_type("MyCustomBlock"), "MyCustomBlock");
}

#[test]
fn no_blocks_gives_an_empty_model() {
    let model = parse_text("Model {\n  Name \"empty\"\n}\n");
    assert!(model.is_empty());
    assert!(model.connections.is_empty());
}

#[test]
fn empty_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join("empty.mdl")).unwrap();
    std::fs::write(&path, "  \n\t\n").unwrap();
    let err = import_text_file(&path).unwrap_err();
    assert!(matches!(err, ImportError::Empty { .. }));
}

#[test]
fn importer_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join("nested.MDL")).unwrap();
    std::fs::write(&path, NESTED).unwrap();
    let format = SourceFormat::from_extension(path.extension().unwrap()).unwrap();
    assert_eq!(format, SourceFormat::Text);
    let model = format.importer().import(&path).unwrap();
    assert_eq!(model.blocks.len(), 4);
}
