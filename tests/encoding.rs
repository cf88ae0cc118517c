//! Encoding tests.

use assert_fs::prelude::*;
use css_optimizer::{Config, CssAsset, CssOptimizer};

fn optimize(dir: &assert_fs::TempDir, path: &str) -> css_optimizer::Result<String> {
    let config = Config {
        root_dir: dir.path().to_owned(),
        ..Config::default()
    };
    CssOptimizer::new(config, |uri: &str| format!("/{uri}")).optimize(&CssAsset::file(path))
}

#[test]
fn utf8_bom() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;

    let content = [
        b"\xEF\xBB\xBF".as_slice(),
        b".caf\xC3\xA9 { content: \"\xE2\x82\xAC\" }".as_slice(),
    ]
    .concat();
    dir.child("style.css").write_binary(&content)?;

    assert_eq!(optimize(&dir, "style.css")?, ".café{content:\"€\"}");

    Ok(())
}

#[test]
fn utf16_bom() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;

    let mut content = vec![0xFF, 0xFE];
    for unit in "@charset \"UTF-16\";\n.café { }".encode_utf16() {
        content.extend_from_slice(&unit.to_le_bytes());
    }
    dir.child("style.css").write_binary(&content)?;

    assert_eq!(optimize(&dir, "style.css")?, ".café{}");

    Ok(())
}

#[test]
fn charset() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;

    dir.child("style.css")
        .write_binary(b"@charset \"ISO-8859-15\";\n.caf\xE9::after { content: \"\xA4\" }")?;

    assert_eq!(optimize(&dir, "style.css")?, ".café::after{content:\"€\"}");

    Ok(())
}

#[test]
fn charset_imports() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;

    dir.child("style.css")
        .write_str("@charset \"UTF-8\";\n@import 'latin1.css';\n.b { content: \"é\" }")?;
    dir.child("latin1.css")
        .write_binary(b"@charset \"windows-1252\";\r\n.a { content: \"\xE9\x80\" }")?;

    let result = optimize(&dir, "style.css")?;

    assert_eq!(result, ".a{content:\"é€\"}.b{content:\"é\"}");
    assert!(!result.contains("@charset"));

    Ok(())
}
