//! Build script that looks for the native libraries the validator links
//! against and prints installation hints when they are missing.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");
    println!("cargo:rerun-if-env-changed=OPENCV_LINK_PATHS");
    println!("cargo:rerun-if-env-changed=OPENCV_INCLUDE_PATHS");
    println!("cargo:rerun-if-env-changed=ORT_LIB_LOCATION");

    if pkg_config_version(&["--version"]).is_none() {
        println!("cargo:warning=pkg-config not found. This is required to find system libraries.");
        println!("cargo:warning=On Ubuntu: sudo apt-get install pkg-config");
        println!("cargo:warning=On macOS: brew install pkg-config");
    }

    let opencv = ["opencv4", "opencv"]
        .iter()
        .find_map(|name| pkg_config_version(&["--modversion", name]));
    match opencv {
        Some(version) => println!("cargo:rustc-env=OPENCV_VERSION={version}"),
        None => {
            println!("cargo:warning=OpenCV not found via pkg-config. Video input and display need it.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install libopencv-dev clang libclang-dev");
            println!("cargo:warning=On macOS: brew install opencv");
        }
    }

    if let Ok(location) = env::var("ORT_LIB_LOCATION") {
        println!("cargo:warning=Using ONNX Runtime from {location}");
    }

    println!("cargo:rustc-env=BUILD_TARGET={}", env::var("TARGET").unwrap_or_default());
}

fn pkg_config_version(args: &[&str]) -> Option<String> {
    let output = Command::new("pkg-config").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}
