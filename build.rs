use std::{env, path::Path};

use cc::Build;

fn main() {
    // skip building native resources during docs.rs builds
    if env::var_os("DOCS_RS").is_some() {
        return;
    }

    let src_dir = Path::new("src");
    let src_format_dir = src_dir.join("format");

    println!("cargo:rerun-if-changed={}", src_dir.display());

    let mut build = Build::new();

    build.include(src_dir);

    for dir in ac_ffmpeg_build::ffmpeg_include_dirs(true) {
        build.include(dir);
    }

    build
        .file(src_dir.join("error.c"))
        .file(src_dir.join("logger.c"))
        .file(src_dir.join("time.c"))
        .file(src_dir.join("packet.c"))
        .file(src_dir.join("codec.c"))
        .file(src_format_dir.join("io.c"))
        .file(src_format_dir.join("stream.c"))
        .file(src_format_dir.join("demuxer.c"))
        .file(src_format_dir.join("muxer.c"))
        .compile("ffwrapper");

    for dir in ac_ffmpeg_build::ffmpeg_lib_dirs(true) {
        println!("cargo:rustc-link-search=native={}", dir.display());
    }

    let ffmpeg_link_mode = link_mode();

    for lib in ["avformat", "avcodec", "avutil"] {
        link(lib, ffmpeg_link_mode);
    }
}

/// Get the FFmpeg link mode.
fn link_mode() -> &'static str {
    println!("cargo:rerun-if-env-changed=FFMPEG_STATIC");

    env::var("FFMPEG_STATIC")
        .map(|v| match v.as_str() {
            "0" => "dylib",
            _ => "static",
        })
        .unwrap_or("dylib")
}

/// Link a given library.
fn link(lib: &str, mode: &str) {
    println!("cargo:rustc-link-lib={}={}", mode, lib);
}
