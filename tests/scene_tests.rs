//! End-to-end loading tests
//!
//! Every encoding of the same document must produce the same scene.

mod common;

use common::{
    binary_document, binary_document_f64, header, mszip_document, text_document,
    triangle_binary_body, triangle_binary_body_f64, BinaryWriter, TRIANGLE_TEXT_BODY,
};
use xof::{
    decompress_bytes, load_bytes, load_file, load_with_options, DrawFlags, HeaderInfo,
    LoadOptions, SceneModel, SphereMode, XofError, XofHeader,
};

fn check_triangle(scene: &SceneModel) {
    assert_eq!(
        scene.positions,
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
    );
    assert_eq!(scene.faces, vec![[0, 1, 2]]);
    assert_eq!(scene.face_materials, vec![0]);
    assert_eq!(scene.materials.len(), 1);
    assert!(scene.textures.is_empty());
    assert_eq!(
        scene.header,
        Some(HeaderInfo {
            major: 1,
            minor: 0,
            flags: 1
        })
    );

    let material = &scene.materials[0];
    assert_eq!(material.name.as_deref(), Some("red"));
    assert_eq!(material.diffuse, [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(material.specular_power, 5.0);
    assert_eq!(material.specular, [1.0, 1.0, 1.0]);
    assert_eq!(material.ambient, [0.0, 0.0, 0.0]);
    assert!(material.flags.contains(DrawFlags::CAST_SHADOW));
}

#[test]
fn test_binary_triangle() -> Result<(), Box<dyn std::error::Error>> {
    let scene = load_bytes(&binary_document(&triangle_binary_body()))?;
    check_triangle(&scene);
    Ok(())
}

#[test]
fn test_double_width_binary_triangle() -> Result<(), Box<dyn std::error::Error>> {
    let document = binary_document_f64(&triangle_binary_body_f64());
    assert_eq!(XofHeader::parse(&document)?.float_width.bytes(), 8);
    let scene = load_bytes(&document)?;
    check_triangle(&scene);
    assert_eq!(scene, load_bytes(&text_document(TRIANGLE_TEXT_BODY))?);
    Ok(())
}

#[test]
fn test_text_triangle() -> Result<(), Box<dyn std::error::Error>> {
    let scene = load_bytes(&text_document(TRIANGLE_TEXT_BODY))?;
    check_triangle(&scene);
    Ok(())
}

#[test]
fn test_text_and_binary_agree() -> Result<(), Box<dyn std::error::Error>> {
    let text = load_bytes(&text_document(TRIANGLE_TEXT_BODY))?;
    let binary = load_bytes(&binary_document(&triangle_binary_body()))?;
    assert_eq!(text, binary);
    Ok(())
}

#[test]
fn test_compressed_encodings_agree() -> Result<(), Box<dyn std::error::Error>> {
    let expected = load_bytes(&text_document(TRIANGLE_TEXT_BODY))?;

    // Small frames force the document across several of them
    let bzip = mszip_document(b"bzip", &triangle_binary_body(), 64);
    let tzip = mszip_document(b"tzip", TRIANGLE_TEXT_BODY.as_bytes(), 100);
    assert_eq!(load_bytes(&bzip)?, expected);
    assert_eq!(load_bytes(&tzip)?, expected);
    Ok(())
}

#[test]
fn test_decompress_rewrites_format() -> Result<(), Box<dyn std::error::Error>> {
    let body = triangle_binary_body();
    let document = decompress_bytes(&mszip_document(b"bzip", &body, 4096))?;

    let parsed = XofHeader::parse(&document)?;
    assert_eq!(&document[8..12], b"bin ");
    assert!(parsed.encoding.is_binary());
    assert!(!parsed.encoding.is_compressed());
    assert_eq!(&document[16..], &body[..]);
    Ok(())
}

#[test]
fn test_frame_size_mismatch() {
    let mut document = mszip_document(b"tzip", TRIANGLE_TEXT_BODY.as_bytes(), 4096);
    // Declare one byte more than the frames produce
    let declared = u32::from_le_bytes([document[16], document[17], document[18], document[19]]);
    document[16..20].copy_from_slice(&(declared + 1).to_le_bytes());

    let err = load_bytes(&document).unwrap_err();
    assert!(matches!(err, XofError::FrameSizeMismatch { .. } | XofError::TruncatedStream { .. }));
}

#[test]
fn test_unbalanced_braces() {
    let err = load_bytes(&text_document("Unknown { Inner { 1; 2; }")).unwrap_err();
    assert!(matches!(err, XofError::TruncatedStream { .. }));

    let mut writer = BinaryWriter::new();
    writer.name("Unknown").open().integers(&[1, 2, 3]).open();
    let err = load_bytes(&binary_document(&writer.finish())).unwrap_err();
    assert!(matches!(err, XofError::TruncatedStream { .. }));
}

#[test]
fn test_truncated_header() {
    let err = load_bytes(b"xof 0302").unwrap_err();
    assert!(matches!(err, XofError::TruncatedStream { .. }));
}

#[test]
fn test_unknown_format() {
    let err = load_bytes(&header(b"zzzz")).unwrap_err();
    assert!(matches!(err, XofError::Format { offset: 8, .. }));
}

#[test]
fn test_binary_texture_names_in_shift_jis() -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = BinaryWriter::new();
    writer
        .name("Mesh")
        .open()
        .integers(&[3])
        .floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
        .integers(&[1, 3, 0, 1, 2])
        .name("MeshMaterialList")
        .open()
        .integers(&[1, 1, 0])
        .name("Material")
        .open()
        .floats(&[1.0, 1.0, 1.0, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
        .name("TextureFilename")
        .open()
        // "顔.bmp*顔.spa"
        .string(&[0x8A, 0xE7, b'.', b'b', b'm', b'p', b'*', 0x8A, 0xE7, b'.', b's', b'p', b'a'])
        .close()
        .close()
        .close()
        .close();

    let scene = load_bytes(&binary_document(&writer.finish()))?;
    assert_eq!(scene.textures, vec!["顔.bmp", "顔.spa"]);
    let material = &scene.materials[0];
    assert_eq!(material.texture_index, Some(0));
    assert_eq!(material.sphere_texture_index, Some(1));
    assert_eq!(material.sphere_mode, SphereMode::Add);
    assert!(material.flags.contains(DrawFlags::DOUBLE_SIDED));
    Ok(())
}

#[test]
fn test_utf8_option() -> Result<(), Box<dyn std::error::Error>> {
    let body = "Mesh {
        3; 0;0;0;, 1;0;0;, 0;1;0;;
        1; 3; 0, 1, 2;;
        MeshMaterialList { 1; 1; 0;; Material { 1;1;1;1;; 0; 0;0;0;; 0;0;0;; TextureFilename { \"näh.png\"; } } }
    }";
    let options = LoadOptions::default()
        .with_encoding_label("utf-8")
        .ok_or("utf-8 label")?;
    let scene = load_with_options(&text_document(body), &options)?;
    assert_eq!(scene.textures, vec!["näh.png"]);
    Ok(())
}

#[test]
fn test_load_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("triangle.x");
    std::fs::write(&path, text_document(TRIANGLE_TEXT_BODY))?;
    check_triangle(&load_file(&path)?);

    let missing = load_file(dir.path().join("missing.x")).unwrap_err();
    assert!(matches!(missing, XofError::Io(_)));
    Ok(())
}

#[test]
fn test_full_text_document() -> Result<(), Box<dyn std::error::Error>> {
    let body = r#"
template Header {
 <3D82AB43-62DA-11cf-AB39-0020AF71E433>
 WORD major;
 WORD minor;
 DWORD flags;
}

Material shared {
 0.5;0.5;0.5;1.0;;
 10.0;
 0.2;0.2;0.2;;
 0.1;0.1;0.1;;
 TextureFilename { "body.png"; }
}

Frame Root {
 FrameTransformMatrix {
  1.0,0.0,0.0,0.0,
  0.0,1.0,0.0,0.0,
  0.0,0.0,1.0,0.0,
  0.0,0.0,0.0,1.0;;
 }

 Mesh Quad {
  4;
  -1.0;-1.0;0.0;,
  1.0;-1.0;0.0;,
  1.0;1.0;0.0;,
  -1.0;1.0;0.0;;
  1;
  4;0,1,2,3;;

  MeshNormals {
   1;
   0.0;0.0;1.0;;
   1;
   4;0,0,0,0;;
  }

  MeshTextureCoords {
   4;
   0.0;1.0;,
   1.0;1.0;,
   1.0;0.0;,
   0.0;0.0;;
  }

  MeshMaterialList {
   1;
   1;
   0;;
   { shared }
  }
 }
}

AnimationSet Idle {
 Animation { { Quad } AnimationKey { 0; 1; 0; 3; 0.0,0.0,0.0;;; } }
}
"#;

    let scene = load_bytes(&text_document(body))?;
    assert_eq!(scene.positions.len(), 4);
    assert_eq!(scene.faces, vec![[0, 1, 2], [0, 2, 3]]);
    assert_eq!(scene.normals, vec![[0.0, 0.0, 1.0]; 4]);
    assert_eq!(scene.uvs[2], [1.0, 0.0]);
    assert_eq!(scene.textures, vec!["body.png"]);
    assert_eq!(scene.materials[0].name.as_deref(), Some("shared"));
    assert_eq!(scene.materials[0].texture_index, Some(0));
    assert_eq!(scene.face_materials, vec![0, 0]);
    assert!(scene.header.is_none());
    Ok(())
}
