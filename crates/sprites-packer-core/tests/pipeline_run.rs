use std::fs;
use std::path::Path;

use image::{Rgba, RgbaImage};
use sprites_packer_core::prelude::*;

fn write_sprite(dir: &Path, file: &str, w: u32, h: u32) {
    let img = RgbaImage::from_pixel(w, h, Rgba([120, 30, 200, 255]));
    img.save(dir.join(file)).unwrap();
}

fn sorted_file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn png_run_writes_texture_and_manifest() {
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("ui");
    fs::create_dir(&input).unwrap();
    write_sprite(&input, "button.png", 64, 24);
    write_sprite(&input, "icon.png", 32, 32);
    fs::write(input.join("readme.txt"), "not a sprite").unwrap();
    let output = root.path().join("out");

    let written = run(&PipelineOptions::new(&input, &output)).unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!(
        sorted_file_names(&output),
        vec!["ui_atlas-0.json", "ui_atlas-0.png"]
    );

    let texture = image::open(&written[0].texture_path).unwrap();
    assert_eq!((texture.width(), texture.height()), (written[0].width, written[0].height));

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&written[0].manifest_path).unwrap()).unwrap();
    assert_eq!(manifest["meta"]["image"], "ui_atlas-0.png");
    assert_eq!(manifest["meta"]["format"], "RGBA8888");
    assert_eq!(manifest["frames"]["button"]["sourceSize"]["w"], 64);
    assert_eq!(manifest["frames"]["icon"]["frame"]["h"], 32);
}

#[test]
fn webp_run_uses_webp_extension() {
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("fx");
    fs::create_dir(&input).unwrap();
    write_sprite(&input, "spark.png", 16, 16);
    let output = root.path().join("out");
    let cfg = PackerConfig::builder()
        .texture_format(TextureFormat::Webp)
        .build();

    let written = run(&PipelineOptions::new(&input, &output).with_config(cfg)).unwrap();
    assert_eq!(
        sorted_file_names(&output),
        vec!["fx_atlas-0.json", "fx_atlas-0.webp"]
    );
    let texture = image::open(&written[0].texture_path).unwrap();
    assert_eq!(texture.width(), written[0].width);
}

#[test]
fn empty_directory_writes_nothing() {
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("empty");
    fs::create_dir(&input).unwrap();
    let output = root.path().join("out");

    let err = run(&PipelineOptions::new(&input, &output)).unwrap_err();
    assert!(matches!(err, SpritePackerError::NoImages(_)));
    assert!(!output.exists());
}

#[test]
fn missing_input_directory_is_configuration_error() {
    let root = tempfile::tempdir().unwrap();
    let err = run(&PipelineOptions::new(
        root.path().join("nope"),
        root.path().join("out"),
    ))
    .unwrap_err();
    assert!(matches!(err, SpritePackerError::InputDirNotFound(_)));
    assert!(err.is_configuration());
}

#[test]
fn unsupported_format_name_is_rejected() {
    let err = "tiff".parse::<TextureFormat>().unwrap_err();
    assert!(matches!(err, SpritePackerError::UnsupportedTextureFormat(ref f) if f == "tiff"));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!("WEBP".parse::<TextureFormat>().ok(), Some(TextureFormat::Webp));
}

#[test]
fn same_sprite_name_in_two_files_fails() {
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("dups");
    fs::create_dir(&input).unwrap();
    write_sprite(&input, "hero.png", 8, 8);
    write_sprite(&input, "hero.idle.png", 8, 8);
    let output = root.path().join("out");

    let err = run(&PipelineOptions::new(&input, &output)).unwrap_err();
    assert!(matches!(err, SpritePackerError::DuplicateSpriteName(ref n) if n == "hero"));
    assert!(!output.exists());
}

#[test]
fn oversized_sprite_aborts_before_writing() {
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("big");
    fs::create_dir(&input).unwrap();
    write_sprite(&input, "huge.png", 300, 20);
    let output = root.path().join("out");
    let cfg = PackerConfig::builder().with_max_dimensions(256, 256).build();

    let err = run(&PipelineOptions::new(&input, &output).with_config(cfg)).unwrap_err();
    assert!(matches!(err, SpritePackerError::RectTooLarge { .. }));
    assert!(!output.exists());
}

#[test]
fn corrupt_png_is_a_collaborator_error() {
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("bad");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("broken.png"), b"definitely not a png").unwrap();

    let err = run(&PipelineOptions::new(&input, root.path().join("out"))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Collaborator);
}

#[test]
fn repeated_runs_produce_identical_output() {
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("set");
    fs::create_dir(&input).unwrap();
    for (i, (w, h)) in [(40, 12), (12, 40), (33, 33), (90, 8), (8, 8)].iter().enumerate() {
        write_sprite(&input, &format!("s{i}.png"), *w, *h);
    }
    let first = root.path().join("a");
    let second = root.path().join("b");
    run(&PipelineOptions::new(&input, &first)).unwrap();
    run(&PipelineOptions::new(&input, &second)).unwrap();

    for name in ["set_atlas-0.json", "set_atlas-0.png"] {
        assert_eq!(
            fs::read(first.join(name)).unwrap(),
            fs::read(second.join(name)).unwrap(),
            "{name}"
        );
    }
}

#[test]
fn padding_beyond_atlas_limit_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("pad");
    fs::create_dir(&input).unwrap();
    write_sprite(&input, "a.png", 8, 8);
    let cfg = PackerConfig::builder().padding(u32::MAX).build();

    let err = run(&PipelineOptions::new(&input, root.path().join("out")).with_config(cfg))
        .unwrap_err();
    assert!(matches!(err, SpritePackerError::InvalidConfig(_)));
    assert!(err.is_configuration());
}
