extern crate image;
use std::{env, fs};
use std::path::PathBuf;
use image::{Rgba, RgbaImage};
use serde_json::{json, Value};

#[allow(dead_code)]
#[path = "src/manifest.rs"]
mod manifest;

fn out_dir() -> String {
    env::var("OUT_DIR").expect("No OUT_DIR env var")
}

// a blue disc with a white ring, drawn here so that no binary assets need to be checked in
fn build_window_icon() {
    let out_path: PathBuf = [out_dir().as_str(), "icon-32-rgba"].iter().collect();

    let img = RgbaImage::from_fn(32, 32, |x, y| {
        let dx = x as f32 - 15.5;
        let dy = y as f32 - 15.5;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance > 15.5 {
            Rgba([0, 0, 0, 0])
        } else if (9.0..11.5).contains(&distance) {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 120, 215, 255])
        }
    });

    println!("DEBUG: writing window icon to {}", out_path.to_string_lossy());
    fs::write(&out_path, img.into_raw()).expect("Failed to write icon-32-rgba");
}

fn build_info_plist() {
    let out_path: PathBuf = [out_dir().as_str(), "Info.plist"].iter().collect();

    let base = json!({
        "CFBundleDisplayName": "E-Cleaning Connect",
        "CFBundleExecutable": "ecleaning-connect",
        "CFBundleIdentifier": "com.ecleaning.ecleaning-connect",
        "CFBundleName": "E-Cleaning Connect",
        "CFBundlePackageType": "APPL",
        "CFBundleShortVersionString": env!("CARGO_PKG_VERSION"),
        "CFBundleVersion": env!("CARGO_PKG_VERSION"),
        "NSHighResolutionCapable": true,
    });

    let mut info_plist = match base {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    manifest::patch_manifest(&mut info_plist);

    println!("DEBUG: writing Info.plist to {}", out_path.to_string_lossy());
    fs::write(&out_path, manifest::render_plist(&info_plist)).expect("Failed to write Info.plist");
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/manifest.rs");

    build_window_icon();
    build_info_plist();
}
